//! File path to URL path normalization.

/// Suffixes of files that describe a page.
///
/// Shared by the normalizer (which strips them) and the loader (which picks a
/// parser by them).
pub const PAGE_SUFFIXES: &[&str] = &[".json", ".yaml", ".yml", ".toml", ".md", ".markdown", ".j2"];

/// Strip one recognized page suffix from `segment`, if present.
fn strip_page_suffix(segment: &str) -> Option<&str> {
    PAGE_SUFFIXES
        .iter()
        .find_map(|suffix| segment.strip_suffix(suffix))
}

/// Convert a file name or explicit route into a canonical URL path.
///
/// Strips page suffixes, drops every segment literally named `index`,
/// collapses repeated separators and guarantees exactly one leading `/`.
/// Stripping and collapsing repeat until nothing changes, which keeps the
/// function idempotent for inputs like `a.md.md` or `index.md/index`.
///
/// Examples:
/// - `index.md` -> `/`
/// - `blog/index/index.json` -> `/blog`
/// - `//about//` -> `/about`
/// - `/blog/:slug` -> `/blog/:slug`
pub fn normalize(raw: &str) -> String {
    let mut segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();

    loop {
        segments.retain(|s| *s != "index");
        let Some(last) = segments.last_mut() else {
            break;
        };
        let Some(stripped) = strip_page_suffix(last) else {
            break;
        };
        if stripped.is_empty() {
            segments.pop();
        } else {
            *last = stripped;
        }
    }

    if segments.is_empty() {
        "/".to_owned()
    } else {
        format!("/{}", segments.join("/"))
    }
}
