//! Watch mode: rebuild the site on file changes and swap it in.

mod debouncer;

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::app::SiteHandle;
use crate::site::SiteBuilder;
use debouncer::{ChangeKind, Debouncer};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Watch settings.
#[derive(Clone, Debug)]
pub struct WatchOptions {
    /// Directory watched recursively.
    pub root: PathBuf,
    /// Quiet period before a rebuild.
    pub debounce: Duration,
    /// Globs, relative to `root`, whose changes are ignored.
    pub ignore: Vec<String>,
}

/// Keeps the filesystem watcher alive. Dropping it stops watching.
pub struct SiteWatcher {
    _watcher: RecommendedWatcher,
}

/// Start watching `options.root`, rebuilding with `builder` and storing each
/// new build in `handle`.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns an error if the watcher cannot be created or the root cannot be
/// watched.
pub fn watch(builder: SiteBuilder, handle: SiteHandle, options: WatchOptions) -> Result<SiteWatcher, notify::Error> {
    let (tx, mut rx) = mpsc::channel::<Event>(100);

    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
        Ok(event) => {
            let _ = tx.blocking_send(event);
        }
        Err(err) => tracing::warn!(error = %err, "File watcher error"),
    })?;
    watcher.watch(&options.root, RecursiveMode::Recursive)?;

    let filter = ChangeFilter::new(&options.root, &options.ignore);
    let debouncer = Arc::new(Debouncer::new(options.debounce));

    let recorder = Arc::clone(&debouncer);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let kind = match event.kind {
                EventKind::Create(_) => ChangeKind::Created,
                EventKind::Modify(_) => ChangeKind::Modified,
                EventKind::Remove(_) => ChangeKind::Removed,
                _ => continue,
            };
            for path in event.paths {
                if filter.accepts(&path) {
                    tracing::debug!(path = %path.display(), ?kind, "Change recorded");
                    recorder.record(path, kind);
                }
            }
        }
    });

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        loop {
            interval.tick().await;
            if debouncer.is_idle() {
                continue;
            }
            let changes = debouncer.drain_ready();
            if changes.is_empty() {
                continue;
            }

            tracing::info!(
                changes = changes.len(),
                first = %changes[0].path.display(),
                "Source changed, rebuilding site"
            );
            let builder = builder.clone();
            match tokio::task::spawn_blocking(move || builder.build()).await {
                Ok(site) => handle.store(Arc::new(site)),
                Err(err) => tracing::error!(error = %err, "Rebuild failed, keeping previous site"),
            }
        }
    });

    tracing::info!(
        root = %options.root.display(),
        debounce_ms = options.debounce.as_millis(),
        "Watching for changes"
    );
    Ok(SiteWatcher { _watcher: watcher })
}

/// Decides which changed paths trigger a rebuild.
struct ChangeFilter {
    root: PathBuf,
    ignore: Vec<glob::Pattern>,
}

impl ChangeFilter {
    fn new(root: &Path, ignore: &[String]) -> Self {
        let ignore = ignore
            .iter()
            .filter_map(|pattern| match glob::Pattern::new(pattern) {
                Ok(compiled) => Some(compiled),
                Err(err) => {
                    tracing::warn!(pattern = %pattern, error = %err, "Invalid ignore pattern, skipped");
                    None
                }
            })
            .collect();
        Self {
            root: std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf()),
            ignore,
        }
    }

    /// Hidden paths and ignored globs are rejected.
    fn accepts(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let hidden = relative.components().any(|c| match c {
            Component::Normal(name) => name.to_string_lossy().starts_with('.'),
            _ => false,
        });
        !hidden && !self.ignore.iter().any(|p| p.matches_path(relative))
    }
}
