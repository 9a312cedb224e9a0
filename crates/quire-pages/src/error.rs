//! Page loading errors.

/// Why a descriptor file could not become a page.
///
/// Never escapes [`PageLoader::load`](crate::PageLoader::load): it is logged
/// with the offending file and the file is left out of the index.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON syntax error.
    #[error("invalid JSON: {0}")]
    Json(serde_json::Error),
    /// YAML syntax error.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// TOML syntax error.
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    /// Computed descriptor failed to compile or render.
    #[error("computed descriptor failed: {0}")]
    Compute(#[from] minijinja::Error),
    /// Front-matter block missing or malformed.
    #[error("missing or malformed front-matter block: {0}")]
    FrontMatter(String),
    /// Descriptor evaluated to something other than a key/value mapping.
    #[error("descriptor is not a mapping")]
    NotAMapping,
    /// A known field has the wrong type or value.
    #[error("invalid descriptor: field `{field}` {message}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}
