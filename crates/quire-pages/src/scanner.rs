//! Descriptor discovery by filesystem walking.
//!
//! Discovery is separate from loading: the scanner only finds candidate files,
//! the [`PageLoader`](crate::PageLoader) reads them.

use std::fs;
use std::path::{Path, PathBuf};

use crate::descriptor::DescriptorKind;

/// Finds descriptor files below a pages root.
pub(crate) struct Scanner {
    pages_root: PathBuf,
}

impl Scanner {
    pub(crate) fn new(pages_root: PathBuf) -> Self {
        Self { pages_root }
    }

    /// Scan the tree and return descriptor paths relative to the pages root.
    ///
    /// Returns an empty Vec if the root doesn't exist. Hidden files and
    /// directories are skipped, as are files with no descriptor suffix.
    pub(crate) fn scan(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        if self.pages_root.is_dir() {
            self.scan_directory(&self.pages_root, Path::new(""), &mut files);
        }
        files
    }

    fn scan_directory(&self, dir_path: &Path, relative: &Path, files: &mut Vec<PathBuf>) {
        let Ok(entries) = fs::read_dir(dir_path) else {
            tracing::debug!(dir = %dir_path.display(), "Unreadable directory skipped");
            return;
        };

        for entry in entries.filter_map(Result::ok) {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') {
                continue;
            }

            let child = relative.join(&name);
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            if is_dir {
                self.scan_directory(&entry.path(), &child, files);
            } else if DescriptorKind::from_path(&child).is_some() {
                files.push(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_sorted(root: &Path) -> Vec<String> {
        let mut files: Vec<_> = Scanner::new(root.to_path_buf())
            .scan()
            .into_iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_scan_nested_structure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("index.json"), "{}").unwrap();
        fs::create_dir_all(root.join("blog/index")).unwrap();
        fs::write(root.join("blog/01-uno.md"), "---\n---\n").unwrap();
        fs::write(root.join("blog/index/index.yaml"), "").unwrap();

        assert_eq!(
            scan_sorted(root),
            vec!["blog/01-uno.md", "blog/index/index.yaml", "index.json"]
        );
    }

    #[test]
    fn test_scan_skips_hidden_and_foreign_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        fs::write(root.join(".draft.json"), "{}").unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".git/config.json"), "{}").unwrap();
        fs::write(root.join("logo.png"), "png").unwrap();
        fs::write(root.join("visible.toml"), "").unwrap();

        assert_eq!(scan_sorted(root), vec!["visible.toml"]);
    }

    #[test]
    fn test_scan_missing_dir() {
        let scanner = Scanner::new(PathBuf::from("/nonexistent/pages"));
        assert!(scanner.scan().is_empty());
    }
}
