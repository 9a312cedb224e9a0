//! Change coalescing for watch mode.
//!
//! Editors emit bursts of events per save. The debouncer folds them into one
//! pending change per path and only releases it once the path has been quiet
//! for the debounce window.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Kind of filesystem change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// A settled change to one path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Change {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

struct Pending {
    kind: ChangeKind,
    deadline: Instant,
}

/// Thread-safe change debouncer.
pub(crate) struct Debouncer {
    pending: Mutex<HashMap<PathBuf, Pending>>,
    window: Duration,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            window,
        }
    }

    /// Record a raw change, pushing the path's deadline back.
    pub fn record(&self, path: PathBuf, kind: ChangeKind) {
        use std::collections::hash_map::Entry;

        let deadline = Instant::now() + self.window;
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());

        match pending.entry(path) {
            Entry::Vacant(entry) => {
                entry.insert(Pending { kind, deadline });
            }
            Entry::Occupied(mut entry) => match fold(entry.get().kind, kind) {
                Some(kind) => {
                    *entry.get_mut() = Pending { kind, deadline };
                }
                None => {
                    entry.remove();
                }
            },
        }
    }

    /// Take every change whose deadline has passed.
    pub fn drain_ready(&self) -> Vec<Change> {
        let now = Instant::now();
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());

        pending
            .extract_if(|_, p| p.deadline <= now)
            .map(|(path, p)| Change { path, kind: p.kind })
            .collect()
    }

    /// Whether any change is still waiting.
    pub fn is_idle(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }
}

/// Fold a new change into an earlier one. `None` means the two cancel out.
fn fold(earlier: ChangeKind, later: ChangeKind) -> Option<ChangeKind> {
    use ChangeKind::{Created, Modified, Removed};

    match (earlier, later) {
        (Created, Removed) => None,
        (Created, _) => Some(Created),
        (Modified, later) => Some(later),
        (Removed, Created) => Some(Modified),
        (Removed, _) => Some(Removed),
    }
}
