//! Native views registered in code.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::view::View;

/// Named native views.
///
/// A page whose `view` (relative to the views root) matches a registered name
/// uses the registered view; no file needs to exist. Names are matched with
/// and without their extension, so a view registered as `home` also answers
/// `view: home.rs`.
#[derive(Clone, Default)]
pub struct ViewRegistry {
    views: HashMap<String, Arc<dyn View>>,
}

impl ViewRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, view: impl View + 'static) -> &mut Self {
        self.views.insert(clean_name(&name.into()), Arc::new(view));
        self
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, view: impl View + 'static) -> Self {
        self.register(name, view);
        self
    }

    /// Look up a view by its identifier relative to the views root.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn View>> {
        let id = clean_name(id);
        self.views
            .get(&id)
            .or_else(|| {
                let (stem, _) = id.rsplit_once('.')?;
                self.views.get(stem)
            })
            .map(Arc::clone)
    }

    /// Number of registered views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Whether no views are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.views.keys().collect();
        names.sort();
        f.debug_struct("ViewRegistry").field("views", &names).finish()
    }
}

fn clean_name(name: &str) -> String {
    name.trim_start_matches("./").trim_start_matches('/').to_owned()
}
