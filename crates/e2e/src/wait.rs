//! Bounded polling

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::error::E2eResult;

/// Poll `condition` every `interval` until it holds or `timeout` elapses.
///
/// The condition is evaluated at least once. Returns `Ok(false)` on timeout;
/// an error from the condition ends the wait immediately.
pub async fn wait_until<F, Fut>(timeout: Duration, interval: Duration, mut condition: F) -> E2eResult<bool>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = E2eResult<bool>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if condition().await? {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        sleep(interval.min(deadline.saturating_duration_since(Instant::now()))).await;
    }
}
