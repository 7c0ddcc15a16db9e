use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Run `f` up to `attempts` times with a fixed `delay` between tries.
///
/// Errors for which `is_retryable` is false are returned immediately. After
/// the last attempt the final error is returned.
pub async fn retry_fixed<T, E, F, Fut>(
    attempts: u32,
    delay: Duration,
    label: &str,
    is_retryable: fn(&E) -> bool,
    mut f: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts && is_retryable(&e) => {
                warn!(
                    stage = label,
                    attempt,
                    delay_ms = %delay.as_millis(),
                    error = %e,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
