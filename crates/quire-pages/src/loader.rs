//! Page Loader: one descriptor file in, one page record (or nothing) out.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::descriptor::{self, DescriptorKind};
use crate::error::LoadError;
use crate::markdown::{CommonMarkRenderer, MarkdownRenderer};
use crate::normalize::normalize;
use crate::record::PageRecord;

/// Loads descriptor files into [`PageRecord`]s.
///
/// Holds the pages and views roots (made absolute on construction) and the
/// markdown renderer used for front-matter bodies. Loading one file never
/// touches shared mutable state, so a loader can be used from many threads.
#[derive(Clone)]
pub struct PageLoader {
    pages_root: PathBuf,
    views_root: PathBuf,
    markdown: Arc<dyn MarkdownRenderer>,
}

impl PageLoader {
    /// Create a loader with the default markdown renderer.
    pub fn new(pages_root: impl Into<PathBuf>, views_root: impl Into<PathBuf>) -> Self {
        Self {
            pages_root: absolute(pages_root.into()),
            views_root: absolute(views_root.into()),
            markdown: Arc::new(CommonMarkRenderer::new()),
        }
    }

    /// Replace the markdown renderer.
    #[must_use]
    pub fn with_markdown(mut self, markdown: Arc<dyn MarkdownRenderer>) -> Self {
        self.markdown = markdown;
        self
    }

    /// Absolute pages root.
    pub fn pages_root(&self) -> &Path {
        &self.pages_root
    }

    /// Absolute views root.
    pub fn views_root(&self) -> &Path {
        &self.views_root
    }

    /// Load one descriptor, logging a warning on failure.
    ///
    /// `file_name` is relative to the pages root (an absolute path below the
    /// root is accepted too). Returns `None` for broken descriptors, empty
    /// descriptors and files that are not descriptors at all.
    pub fn load(&self, file_name: &Path) -> Option<PageRecord> {
        match self.try_load(file_name) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(
                    file = %self.pages_root.join(self.relative(file_name)).display(),
                    error = %err,
                    "Skipping page: descriptor could not be loaded"
                );
                None
            }
        }
    }

    /// Load one descriptor, reporting failures to the caller.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] when the file cannot be read or parsed, or when
    /// a known field has the wrong type.
    pub fn try_load(&self, file_name: &Path) -> Result<Option<PageRecord>, LoadError> {
        let relative = self.relative(file_name);
        let Some(kind) = DescriptorKind::from_path(relative) else {
            return Ok(None);
        };

        let file = self.pages_root.join(relative);
        let source = fs::read_to_string(&file)?;
        let Some(mut data) = descriptor::parse(kind, &source, &file, self.markdown.as_ref())?
        else {
            tracing::debug!(file = %file.display(), "Empty descriptor skipped");
            return Ok(None);
        };

        let explicit_path = take_string(&mut data, "path")?;
        let status = take_status(&mut data)?;
        let view = take_string(&mut data, "view")?.map(|v| self.view_file(&v));
        let redirect = take_string(&mut data, "redirect")?;
        if redirect.as_deref().is_some_and(str::is_empty) {
            return Err(LoadError::InvalidField {
                field: "redirect",
                message: "must not be empty".to_owned(),
            });
        }

        let path = normalize(explicit_path.as_deref().unwrap_or(&url_name(relative)));

        Ok(Some(PageRecord {
            file,
            path,
            status,
            view,
            redirect,
            data,
        }))
    }

    /// Place a view name under the views root, even when written as `/name`.
    fn view_file(&self, view: &str) -> PathBuf {
        let mut file = self.views_root.clone();
        for component in Path::new(view).components() {
            match component {
                Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
                other => file.push(other),
            }
        }
        file
    }

    fn relative<'a>(&self, file_name: &'a Path) -> &'a Path {
        file_name.strip_prefix(&self.pages_root).unwrap_or(file_name)
    }
}

/// Join the normal components of a relative path with `/`.
fn url_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

fn take_string(data: &mut Map<String, Value>, field: &'static str) -> Result<Option<String>, LoadError> {
    match data.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(LoadError::InvalidField {
            field,
            message: format!("must be a string, found {}", type_name(&other)),
        }),
    }
}

fn take_status(data: &mut Map<String, Value>) -> Result<Option<u16>, LoadError> {
    let invalid = |message: String| LoadError::InvalidField {
        field: "status",
        message,
    };

    match data.remove("status") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .filter(|code| (100..=599).contains(code))
            .and_then(|code| u16::try_from(code).ok())
            .map(Some)
            .ok_or_else(|| invalid(format!("must be an HTTP status code, found {n}"))),
        Some(other) => Err(invalid(format!(
            "must be an integer, found {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}
