//! Markdown rendering capability used for front-matter document bodies.

use pulldown_cmark::{Options, Parser, html};

/// Converts markdown text to an HTML string.
///
/// Injected into the [`PageLoader`](crate::PageLoader) so hosts can swap in
/// their own renderer.
pub trait MarkdownRenderer: Send + Sync {
    /// Render markdown to HTML.
    fn render(&self, markdown: &str) -> String;
}

/// Default renderer backed by `pulldown-cmark`.
#[derive(Clone, Copy, Debug)]
pub struct CommonMarkRenderer {
    gfm: bool,
}

impl CommonMarkRenderer {
    /// Create a renderer with GitHub Flavored Markdown enabled.
    #[must_use]
    pub fn new() -> Self {
        Self { gfm: true }
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// GFM is enabled by default. When enabled, the parser supports:
    /// - Tables
    /// - Strikethrough (`~~text~~`)
    /// - Task lists (`- [ ] item`)
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    fn parser_options(self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }
}

impl Default for CommonMarkRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer for CommonMarkRenderer {
    fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.parser_options());
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}
