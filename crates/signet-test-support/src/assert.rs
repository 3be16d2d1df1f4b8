//! Polling assertions for asynchronous behaviour.

use std::time::Duration;

use tokio::time::{Instant, sleep};

const POLL_STEP: Duration = Duration::from_millis(10);

/// Poll `check` until it returns `true` or `timeout` elapses.
///
/// Returns the final result of `check`.
pub async fn wait_until<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if Instant::now() >= deadline {
            return check();
        }
        sleep(POLL_STEP).await;
    }
}
