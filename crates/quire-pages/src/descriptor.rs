//! Descriptor formats.
//!
//! Every format is parsed into a `serde_json` mapping so the loader can treat
//! them uniformly:
//!
//! - structured data: `.json`, `.yaml`/`.yml`, `.toml`
//! - computed: `.j2`, a minijinja template whose output is YAML
//! - front-matter documents: `.md`/`.markdown`, YAML front-matter plus a
//!   markdown body stored as HTML under `body`

use std::path::Path;
use std::sync::LazyLock;

use minijinja::{Environment, Value as TemplateValue, context};
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::LoadError;
use crate::markdown::MarkdownRenderer;

/// `---\n<front-matter>\n---\n<body>`, tolerating CRLF and an empty block.
static FRONT_MATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A---\r?\n(?:([\s\S]*?)\r?\n)?---(?:\r?\n|\z)([\s\S]*)\z").unwrap()
});

/// Kind of page descriptor, chosen by file suffix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DescriptorKind {
    Json,
    Yaml,
    Toml,
    Computed,
    FrontMatter,
}

impl DescriptorKind {
    /// Pick the kind from a file name. Returns `None` for non-descriptor files.
    pub(crate) fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let (_, ext) = name.rsplit_once('.')?;
        match ext {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "j2" => Some(Self::Computed),
            "md" | "markdown" => Some(Self::FrontMatter),
            _ => None,
        }
    }
}

/// Parse descriptor source into a mapping.
///
/// Returns `Ok(None)` for empty descriptors (empty file, `null`, `{}`).
pub(crate) fn parse(
    kind: DescriptorKind,
    source: &str,
    file: &Path,
    markdown: &dyn MarkdownRenderer,
) -> Result<Option<Map<String, Value>>, LoadError> {
    match kind {
        DescriptorKind::Json => {
            if source.trim().is_empty() {
                return Ok(None);
            }
            into_mapping(serde_json::from_str(source).map_err(LoadError::Json)?)
        }
        DescriptorKind::Yaml => into_mapping(parse_yaml(source)?),
        DescriptorKind::Toml => into_mapping(toml::from_str(source)?),
        DescriptorKind::Computed => into_mapping(parse_yaml(&compute(source, file)?)?),
        DescriptorKind::FrontMatter => parse_front_matter(source, markdown),
    }
}

fn parse_yaml(source: &str) -> Result<Value, LoadError> {
    if source.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_yaml::from_str(source)?)
}

/// Render a computed descriptor.
///
/// The template sees `file` (absolute path), `name` (file stem) and an
/// `env(name, default)` function for reading environment variables.
fn compute(source: &str, file: &Path) -> Result<String, LoadError> {
    let mut env = Environment::new();
    env.add_function("env", env_var);

    let name = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let template_name = file.display().to_string();

    Ok(env.render_named_str(
        &template_name,
        source,
        context! { file => template_name.clone(), name => name },
    )?)
}

fn env_var(name: String, default: Option<String>) -> TemplateValue {
    std::env::var(&name)
        .ok()
        .or(default)
        .map_or(TemplateValue::from(()), TemplateValue::from)
}

fn parse_front_matter(
    source: &str,
    markdown: &dyn MarkdownRenderer,
) -> Result<Option<Map<String, Value>>, LoadError> {
    let captures = FRONT_MATTER
        .captures(source)
        .ok_or_else(|| LoadError::FrontMatter("missing front-matter block".to_owned()))?;

    let front_matter = captures.get(1).map_or("", |m| m.as_str());
    let body = captures.get(2).map_or("", |m| m.as_str());

    let value = parse_yaml(front_matter).map_err(|e| LoadError::FrontMatter(e.to_string()))?;
    let Some(mut mapping) = into_mapping(value)? else {
        return Ok(None);
    };

    mapping.insert("body".to_owned(), Value::String(markdown.render(body)));
    Ok(Some(mapping))
}

fn into_mapping(value: Value) -> Result<Option<Map<String, Value>>, LoadError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) if map.is_empty() => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        _ => Err(LoadError::NotAMapping),
    }
}
