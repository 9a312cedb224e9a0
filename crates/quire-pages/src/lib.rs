//! Page discovery for quire.
//!
//! Turns a directory of page descriptors into an ordered [`PageList`]:
//!
//! - [`normalize`] maps file names and explicit routes to canonical URL paths
//! - [`PageLoader`] reads one descriptor (JSON, YAML, TOML, computed `.j2`
//!   template, or markdown with front-matter) into a [`PageRecord`]
//! - [`build_index`] walks the pages root and orders the records for route
//!   registration
//!
//! Broken descriptors never abort a build. They are logged with their file
//! path and left out of the index.
//!
//! # Example
//!
//! ```ignore
//! use quire_pages::{PageLoader, build_index};
//!
//! let loader = PageLoader::new("pages", "views");
//! for page in &build_index(&loader) {
//!     println!("{} <- {}", page.path, page.file.display());
//! }
//! ```

mod descriptor;
mod error;
mod index;
mod loader;
mod markdown;
mod normalize;
mod record;
mod scanner;

pub use error::LoadError;
pub use index::build_index;
pub use loader::PageLoader;
pub use markdown::{CommonMarkRenderer, MarkdownRenderer};
pub use normalize::{PAGE_SUFFIXES, normalize};
pub use record::{PageList, PageRecord};
