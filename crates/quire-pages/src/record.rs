//! In-memory page records and the ordered page list.

use std::ops::Deref;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

/// A loaded page.
///
/// Known descriptor fields are typed; every other key from the descriptor is
/// kept verbatim in [`data`](Self::data) and serialized flat next to them, so
/// views see the descriptor as authored.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageRecord {
    /// Absolute path of the descriptor file.
    pub file: PathBuf,
    /// Normalized route pattern, always starting with `/`.
    pub path: String,
    /// HTTP status applied to responses for this page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Absolute path of the view (views root joined with the descriptor's `view`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<PathBuf>,
    /// Redirect destination. Redirect pages never resolve a view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// Pass-through descriptor data.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl PageRecord {
    /// Look up a pass-through field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Whether this page redirects instead of rendering a view.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        self.redirect.is_some()
    }
}

/// Ordered page records of one index build.
///
/// Order is route registration order: deeper files first, then by descending
/// absolute file path. Immutable once built.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PageList(Vec<PageRecord>);

impl PageList {
    /// Sort records into registration order and wrap them.
    #[must_use]
    pub fn from_unordered(mut records: Vec<PageRecord>, pages_root: &Path) -> Self {
        records.sort_by(|a, b| {
            depth(&b.file, pages_root)
                .cmp(&depth(&a.file, pages_root))
                .then_with(|| b.file.cmp(&a.file))
        });
        Self(records)
    }
}

impl Deref for PageList {
    type Target = [PageRecord];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for &'a PageList {
    type Item = &'a PageRecord;
    type IntoIter = std::slice::Iter<'a, PageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Number of path components below the pages root.
fn depth(file: &Path, pages_root: &Path) -> usize {
    file.strip_prefix(pages_root)
        .unwrap_or(file)
        .components()
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(file: &str, path: &str) -> PageRecord {
        PageRecord {
            file: PathBuf::from(file),
            path: path.to_owned(),
            status: None,
            view: None,
            redirect: None,
            data: Map::new(),
        }
    }

    #[test]
    fn test_deeper_files_first() {
        let list = PageList::from_unordered(
            vec![
                record("/site/pages/a.json", "/a"),
                record("/site/pages/blog/post/x.json", "/blog/post/x"),
                record("/site/pages/blog/y.json", "/blog/y"),
            ],
            Path::new("/site/pages"),
        );

        let paths: Vec<_> = list.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/blog/post/x", "/blog/y", "/a"]);
    }

    #[test]
    fn test_equal_depth_descending_file() {
        let list = PageList::from_unordered(
            vec![
                record("/site/pages/catchall.json", "/*"),
                record("/site/pages/test.json", "/test"),
                record("/site/pages/about.json", "/about"),
            ],
            Path::new("/site/pages"),
        );

        let paths: Vec<_> = list.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/test", "/*", "/about"]);
    }

    #[test]
    fn test_order_independent_of_input_order() {
        let root = Path::new("/p");
        let records = vec![
            record("/p/b.json", "/b"),
            record("/p/x/a.json", "/x/a"),
            record("/p/a.json", "/a"),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        assert_eq!(
            PageList::from_unordered(records, root),
            PageList::from_unordered(reversed, root)
        );
    }

    #[test]
    fn test_serialize_flattens_data() {
        let mut page = record("/p/a.json", "/a");
        page.status = Some(404);
        page.data.insert("title".to_owned(), json!("Missing"));

        let value = serde_json::to_value(&page).unwrap();

        assert_eq!(
            value,
            json!({"file": "/p/a.json", "path": "/a", "status": 404, "title": "Missing"})
        );
    }
}
