//! Filesystem notifications reduced to [`PathEvent`]s.
//!
//! # Design
//! - [`PathEventSource`] is the seam between the service and the OS watcher;
//!   tests can drive the pipeline without one.
//! - Only the workplace itself is watched (non-recursive).
//! - Renames report their target path; removals, accesses, and rename
//!   sources are ignored.

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::model::{PathEvent, PathEventKind};

/// Callback receiving translated notifications.
pub type PathEventSink = Arc<dyn Fn(PathEvent) + Send + Sync>;

/// Something that can watch a directory and report file changes.
pub trait PathEventSource: Send + Sync {
    /// Start watching `dir`, delivering events to `sink` until the handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Watch`] when the watch cannot be established.
    fn watch(&self, dir: &Path, sink: PathEventSink) -> PipelineResult<WatchHandle>;
}

/// Keeps a watch alive; dropping it stops notifications.
pub struct WatchHandle {
    path: PathBuf,
    resource: Option<Box<dyn Any + Send>>,
}

impl WatchHandle {
    /// Wrap `resource`, whose drop ends the watch on `path`.
    pub fn new(path: impl Into<PathBuf>, resource: impl Any + Send) -> Self {
        Self {
            path: path.into(),
            resource: Some(Box::new(resource)),
        }
    }

    /// Directory being watched.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop watching now.
    pub fn stop(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.resource.take().is_some() {
            debug!(path = %self.path.display(), "filesystem watch stopped");
        }
    }
}

impl fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchHandle")
            .field("path", &self.path)
            .field("active", &self.resource.is_some())
            .finish()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// [`PathEventSource`] backed by the platform's recommended `notify` watcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyWatchSource;

impl PathEventSource for NotifyWatchSource {
    fn watch(&self, dir: &Path, sink: PathEventSink) -> PipelineResult<WatchHandle> {
        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| match result {
                Ok(event) => {
                    if let Some(path_event) = translate(&event) {
                        sink(path_event);
                    }
                }
                Err(err) => warn!(error = %err, "filesystem watch error"),
            },
            Config::default(),
        )
        .map_err(|source| PipelineError::Watch {
            path: dir.to_path_buf(),
            source,
        })?;
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|source| PipelineError::Watch {
                path: dir.to_path_buf(),
                source,
            })?;
        info!(path = %dir.display(), "watching directory");
        Ok(WatchHandle::new(dir, watcher))
    }
}

/// Reduce a `notify` event to the one path intake cares about.
#[must_use]
pub fn translate(event: &Event) -> Option<PathEvent> {
    let (kind, path, known_folder) = match event.kind {
        EventKind::Create(create) => (
            PathEventKind::Created,
            event.paths.first()?,
            create == CreateKind::Folder,
        ),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            (PathEventKind::Moved, event.paths.first()?, false)
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            (PathEventKind::Moved, event.paths.get(1)?, false)
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => return None,
        EventKind::Modify(_) => (PathEventKind::Modified, event.paths.first()?, false),
        EventKind::Remove(_) | EventKind::Access(_) | EventKind::Any | EventKind::Other => {
            return None;
        }
    };
    Some(PathEvent::new(path, kind).directory(known_folder || path.is_dir()))
}
