//! Detects when a file has stopped changing.
//!
//! # Design
//! - Polls size and modification time; either a repeated non-zero size or an
//!   mtime older than the grace window counts as a stable observation.
//! - Short timeouts need two consecutive stable observations, long ones one.
//! - Wall-clock reads go through [`Clock`] so mtime ageing is testable;
//!   sleeping and the deadline use `tokio::time`.

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::time::{Instant, sleep};
use tracing::debug;

const MAX_POLL_INTERVAL: Duration = Duration::from_millis(500);
const MIN_MTIME_GRACE: Duration = Duration::from_secs(1);
const SINGLE_OBSERVATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of wall-clock time.
pub trait Clock: Debug + Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> SystemTime;
}

/// [`Clock`] backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Waits for a file's content to settle.
#[derive(Debug, Clone)]
pub struct StabilityDetector {
    timeout: Duration,
    poll_interval: Duration,
    clock: Arc<dyn Clock>,
}

impl StabilityDetector {
    /// Detector using the system clock.
    #[must_use]
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self::with_clock(timeout, poll_interval, Arc::new(SystemClock))
    }

    /// Detector using a caller-supplied clock.
    #[must_use]
    pub fn with_clock(timeout: Duration, poll_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            timeout,
            poll_interval,
            clock,
        }
    }

    /// Interval actually slept between polls.
    #[must_use]
    pub fn effective_interval(&self) -> Duration {
        self.poll_interval.min(MAX_POLL_INTERVAL)
    }

    /// Consecutive stable observations needed before returning `true`.
    #[must_use]
    pub fn required_observations(&self) -> u32 {
        if self.timeout >= SINGLE_OBSERVATION_TIMEOUT {
            1
        } else {
            2
        }
    }

    /// Minimum mtime age that counts as stable on its own.
    #[must_use]
    pub fn mtime_grace(&self) -> Duration {
        MIN_MTIME_GRACE.max(self.effective_interval().saturating_mul(2))
    }

    /// Poll `path` until it is stable or the timeout elapses.
    ///
    /// Returns `false` straight away when the path does not exist. Stat
    /// failures while polling reset the observation counter.
    pub async fn wait_for_stability(&self, path: &Path) -> bool {
        if tokio::fs::metadata(path).await.is_err() {
            return false;
        }

        let deadline = Instant::now() + self.timeout;
        let interval = self.effective_interval();
        let required = self.required_observations();
        let grace = self.mtime_grace();
        let mut last_size: Option<u64> = None;
        let mut stable = 0_u32;

        while Instant::now() < deadline {
            match tokio::fs::metadata(path).await {
                Ok(metadata) => {
                    let size = metadata.len();
                    let size_stable = size > 0 && last_size == Some(size);
                    let mtime_stable = size > 0
                        && metadata
                            .modified()
                            .ok()
                            .and_then(|modified| self.clock.now().duration_since(modified).ok())
                            .is_some_and(|age| age >= grace);
                    if size_stable || mtime_stable {
                        stable += 1;
                    } else {
                        stable = 0;
                    }
                    if stable >= required {
                        return true;
                    }
                    last_size = Some(size);
                }
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "stat failed during stability wait");
                    stable = 0;
                }
            }
            sleep(interval).await;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, OpenOptions};
    use std::io::Write;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug)]
    struct OffsetClock(Duration);

    impl Clock for OffsetClock {
        fn now(&self) -> SystemTime {
            SystemTime::now() + self.0
        }
    }

    #[test]
    fn thresholds_follow_timeout_and_interval() {
        let short = StabilityDetector::new(Duration::from_secs(2), Duration::from_secs(1));
        assert_eq!(short.effective_interval(), Duration::from_millis(500));
        assert_eq!(short.required_observations(), 2);
        assert_eq!(short.mtime_grace(), Duration::from_secs(1));

        let long = StabilityDetector::new(Duration::from_secs(10), Duration::from_millis(100));
        assert_eq!(long.effective_interval(), Duration::from_millis(100));
        assert_eq!(long.required_observations(), 1);
    }

    #[tokio::test]
    async fn constant_file_is_stable() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("doc.pdf");
        fs::write(&path, b"%PDF-1.4 settled")?;

        let detector = StabilityDetector::new(Duration::from_secs(2), Duration::from_millis(20));
        let started = std::time::Instant::now();
        assert!(detector.wait_for_stability(&path).await);
        assert!(started.elapsed() < Duration::from_secs(2));
        Ok(())
    }

    #[tokio::test]
    async fn growing_file_is_not_stable() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("growing.pdf");
        fs::write(&path, b"%PDF")?;

        let running = Arc::new(AtomicBool::new(true));
        let writer = {
            let running = Arc::clone(&running);
            let path = path.clone();
            std::thread::spawn(move || -> std::io::Result<()> {
                let mut file = OpenOptions::new().append(true).open(&path)?;
                while running.load(Ordering::SeqCst) {
                    file.write_all(b"more bytes")?;
                    file.flush()?;
                    std::thread::sleep(Duration::from_millis(2));
                }
                Ok(())
            })
        };

        let detector =
            StabilityDetector::new(Duration::from_millis(400), Duration::from_millis(50));
        let stable = detector.wait_for_stability(&path).await;
        running.store(false, Ordering::SeqCst);
        let _ = writer.join();
        assert!(!stable);
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_not_stable() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let detector = StabilityDetector::new(Duration::from_secs(5), Duration::from_millis(10));
        let started = std::time::Instant::now();
        assert!(!detector.wait_for_stability(&dir.path().join("absent.pdf")).await);
        assert!(started.elapsed() < Duration::from_secs(1));
        Ok(())
    }

    #[tokio::test]
    async fn empty_file_never_stabilises() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("empty.pdf");
        fs::write(&path, b"")?;
        let detector =
            StabilityDetector::new(Duration::from_millis(200), Duration::from_millis(20));
        assert!(!detector.wait_for_stability(&path).await);
        Ok(())
    }

    #[tokio::test]
    async fn short_timeout_needs_two_matching_polls() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("fresh.pdf");
        fs::write(&path, b"%PDF-1.4 fresh")?;

        let interval = Duration::from_millis(100);
        let detector = StabilityDetector::new(Duration::from_secs(3), interval);
        let started = std::time::Instant::now();
        assert!(detector.wait_for_stability(&path).await);
        assert!(started.elapsed() >= interval * 2);
        Ok(())
    }

    #[tokio::test]
    async fn vanishing_file_resets_and_keeps_polling() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("flaky.pdf");
        fs::write(&path, b"%PDF-1.4 flaky")?;

        let churn = {
            let path = path.clone();
            std::thread::spawn(move || -> std::io::Result<()> {
                std::thread::sleep(Duration::from_millis(100));
                fs::remove_file(&path)?;
                std::thread::sleep(Duration::from_millis(350));
                fs::write(&path, b"%PDF-1.4 flaky")
            })
        };

        let detector =
            StabilityDetector::new(Duration::from_secs(3), Duration::from_millis(300));
        let started = std::time::Instant::now();
        let stable = detector.wait_for_stability(&path).await;
        let elapsed = started.elapsed();
        assert!(churn.join().is_ok_and(|result| result.is_ok()));

        assert!(stable);
        // Without the reset this would settle on the third poll (~600ms).
        assert!(elapsed >= Duration::from_millis(800));
        assert!(elapsed < Duration::from_secs(3));
        Ok(())
    }

    #[tokio::test]
    async fn old_mtime_is_stable_on_first_poll() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("old.pdf");
        fs::write(&path, b"%PDF-1.4 archived")?;

        let clock: Arc<dyn Clock> = Arc::new(OffsetClock(Duration::from_secs(3_600)));
        let detector =
            StabilityDetector::with_clock(Duration::from_secs(5), Duration::from_millis(400), clock);
        let started = std::time::Instant::now();
        assert!(detector.wait_for_stability(&path).await);
        assert!(started.elapsed() < Duration::from_millis(300));
        Ok(())
    }
}
