//! Page Index Builder.

use rayon::prelude::*;

use crate::loader::PageLoader;
use crate::record::PageList;
use crate::scanner::Scanner;

/// Walk the pages root and load every descriptor into an ordered [`PageList`].
///
/// A missing pages root yields an empty list. Files are loaded in parallel;
/// broken files are logged by the loader and left out. The final sort makes
/// the result independent of load order.
pub fn build_index(loader: &PageLoader) -> PageList {
    let pages_root = loader.pages_root();
    if !pages_root.is_dir() {
        tracing::debug!(dir = %pages_root.display(), "Pages directory missing, index is empty");
        return PageList::default();
    }

    let files = Scanner::new(pages_root.to_path_buf()).scan();
    let records: Vec<_> = files
        .par_iter()
        .filter_map(|file| loader.load(file))
        .collect();

    tracing::debug!(
        dir = %pages_root.display(),
        files = files.len(),
        pages = records.len(),
        "Page index built"
    );

    PageList::from_unordered(records, pages_root)
}
