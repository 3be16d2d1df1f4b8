//! Collision-safe relocation into the classified destination tree.
//!
//! # Design
//! - Destination layout is `root/doc/client/date/status/<source filename>`,
//!   every segment passed through [`normalize_segment`].
//! - An existing target gets a single `_<unix seconds>` suffix before the
//!   extension. The suffixed name is not re-suffixed: if it is taken too,
//!   the move fails and the source stays put.
//! - Rename first; copy then remove only when the rename crosses devices.
//! - All calls are blocking and meant to run on a blocking thread.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use tracing::{info, warn};

use crate::classify::normalize_segment;
use crate::error::{PipelineError, PipelineResult};
use crate::model::FilenameMetadata;
use crate::stability::{Clock, SystemClock};

/// Moves classified documents under a destination root.
#[derive(Debug, Clone)]
pub struct DestinationMover {
    root: PathBuf,
    dry_run: bool,
    clock: Arc<dyn Clock>,
}

impl DestinationMover {
    /// Mover rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self::with_clock(root, dry_run, Arc::new(SystemClock))
    }

    /// Mover with a caller-supplied clock for collision suffixes.
    #[must_use]
    pub fn with_clock(root: impl Into<PathBuf>, dry_run: bool, clock: Arc<dyn Clock>) -> Self {
        Self {
            root: root.into(),
            dry_run,
            clock,
        }
    }

    /// Whether moves are only simulated.
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Directory a document with `metadata` belongs in.
    #[must_use]
    pub fn destination_dir(&self, metadata: &FilenameMetadata) -> PathBuf {
        self.root
            .join(normalize_segment(&metadata.doc))
            .join(normalize_segment(&metadata.client))
            .join(normalize_segment(&metadata.date))
            .join(normalize_segment(&metadata.status))
    }

    /// Compute the final destination for `source`, applying the collision suffix.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] when `source` has no file name.
    pub fn plan(&self, source: &Path, metadata: &FilenameMetadata) -> PipelineResult<PathBuf> {
        let file_name = source.file_name().ok_or_else(|| {
            PipelineError::io(
                "mover.plan",
                source,
                io::Error::new(io::ErrorKind::InvalidInput, "source has no file name"),
            )
        })?;
        let target = self.destination_dir(metadata).join(file_name);
        if target.exists() {
            return Ok(self.suffixed(&target));
        }
        Ok(target)
    }

    /// Move `source` into place and return where it landed.
    ///
    /// In dry-run mode nothing on disk changes and the planned path is returned.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] when a directory cannot be created or
    /// the file cannot be moved.
    pub fn relocate(&self, source: &Path, metadata: &FilenameMetadata) -> PipelineResult<PathBuf> {
        let target = self.plan(source, metadata)?;
        if self.dry_run {
            info!(
                source = %source.display(),
                destination = %target.display(),
                "dry run: would move document"
            );
            return Ok(target);
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| PipelineError::io("mover.create_dir", parent, err))?;
        }
        move_file(source, &target)?;
        info!(
            source = %source.display(),
            destination = %target.display(),
            "moved document"
        );
        Ok(target)
    }

    fn suffixed(&self, target: &Path) -> PathBuf {
        let seconds = self
            .clock
            .now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        let mut name = OsString::from(target.file_stem().unwrap_or_default());
        name.push(format!("_{seconds}"));
        if let Some(ext) = target.extension() {
            name.push(".");
            name.push(ext);
        }
        target.with_file_name(name)
    }
}

fn move_file(source: &Path, target: &Path) -> PipelineResult<()> {
    // `rename` replaces an existing target on unix; never clobber.
    if fs::symlink_metadata(target).is_ok() {
        return Err(PipelineError::io(
            "mover.rename",
            target,
            io::Error::new(io::ErrorKind::AlreadyExists, "destination already exists"),
        ));
    }
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            warn!(
                source = %source.display(),
                destination = %target.display(),
                "rename crosses devices; copying instead"
            );
            if let Err(copy_err) = copy_new(source, target) {
                if copy_err.kind() != io::ErrorKind::AlreadyExists {
                    let _ = fs::remove_file(target);
                }
                return Err(PipelineError::io("mover.copy", source, copy_err));
            }
            fs::remove_file(source).map_err(|err| PipelineError::io("mover.cleanup", source, err))
        }
        Err(err) => Err(PipelineError::io("mover.rename", source, err)),
    }
}

fn copy_new(source: &Path, target: &Path) -> io::Result<u64> {
    let mut reader = fs::File::open(source)?;
    let mut writer = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)?;
    let copied = io::copy(&mut reader, &mut writer)?;
    writer.sync_all()?;
    Ok(copied)
}
