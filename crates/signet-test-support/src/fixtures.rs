//! Temporary directory trees shaped like a watcher deployment.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::Result;
use signet_config::WatchConfig;
use tempfile::TempDir;

/// Minimal bytes that look like a PDF header.
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n% signet test document\n";

/// A temporary root holding `workplace/` and `destination/`.
pub struct WatchFixture {
    root: TempDir,
    workplace: PathBuf,
    destination: PathBuf,
}

impl WatchFixture {
    /// Create the tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directories cannot be created.
    pub fn new() -> Result<Self> {
        let root = tempfile::tempdir()?;
        let workplace = root.path().join("workplace");
        let destination = root.path().join("destination");
        fs::create_dir_all(&workplace)?;
        fs::create_dir_all(&destination)?;
        Ok(Self {
            root,
            workplace,
            destination,
        })
    }

    /// Root of the temporary tree.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Watched directory.
    #[must_use]
    pub fn workplace(&self) -> &Path {
        &self.workplace
    }

    /// Destination root.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Watcher settings pointing at this tree with fast polling.
    #[must_use]
    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig {
            workplace_path: self.workplace.clone(),
            destination_root: self.destination.clone(),
            stability_timeout_secs: 2.0,
            poll_interval_ms: 20,
            error_backoff_ms: 10,
            ..WatchConfig::default()
        }
    }

    /// Write a small PDF named `name` into the workplace.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_pdf(&self, name: &str) -> Result<PathBuf> {
        let path = self.workplace.join(name);
        fs::write(&path, PDF_BYTES)?;
        Ok(path)
    }

    /// Write a PDF whose modification time lies `age` in the past.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or its mtime set.
    pub fn write_settled_pdf(&self, name: &str, age: Duration) -> Result<PathBuf> {
        let path = self.write_pdf(name)?;
        let file = fs::File::options().write(true).open(&path)?;
        let modified = SystemTime::now()
            .checked_sub(age)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        file.set_modified(modified)?;
        Ok(path)
    }

    /// Path a classified document is expected to land at.
    #[must_use]
    pub fn expected_destination(&self, segments: [&str; 4], file_name: &str) -> PathBuf {
        segments
            .iter()
            .fold(self.destination.clone(), |path, segment| path.join(segment))
            .join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_creates_both_directories() -> Result<()> {
        let fixture = WatchFixture::new()?;
        assert!(fixture.workplace().is_dir());
        assert!(fixture.destination().is_dir());
        assert!(fixture.workplace().starts_with(fixture.root()));
        Ok(())
    }

    #[test]
    fn settled_pdf_has_old_mtime() -> Result<()> {
        let fixture = WatchFixture::new()?;
        let path = fixture.write_settled_pdf("a.pdf", Duration::from_secs(60))?;
        let age = SystemTime::now().duration_since(fs::metadata(&path)?.modified()?)?;
        assert!(age >= Duration::from_secs(59));
        Ok(())
    }

    #[test]
    fn expected_destination_joins_segments() -> Result<()> {
        let fixture = WatchFixture::new()?;
        let path = fixture.expected_destination(["c", "Acme", "2024-01-15", "signed"], "x.pdf");
        assert!(path.ends_with("c/Acme/2024-01-15/signed/x.pdf"));
        Ok(())
    }
}
