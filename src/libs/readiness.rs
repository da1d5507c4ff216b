// Readiness polling for installers whose side effects settle asynchronously.
// Instead of sleeping a fixed amount of time after such an installer, the
// presence check is re-run with exponential backoff until it passes or the
// attempt budget is exhausted.

use std::thread;
use std::time::Duration;

use crate::errors::{Result, SetupError};
use crate::schemas::setup_config::ReadinessConfig;
use crate::{log_debug, log_info};

/// Delay before attempt `attempt` (0-based), doubling from `initial_delay_ms`
/// and capped at `max_delay_ms`. The first attempt never waits.
pub fn backoff_delay(config: &ReadinessConfig, attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }
    let factor = 1u64.checked_shl(attempt - 1).unwrap_or(u64::MAX);
    let millis = config
        .initial_delay_ms
        .saturating_mul(factor)
        .min(config.max_delay_ms);
    Duration::from_millis(millis)
}

/// Polls `check` until it returns `true`.
///
/// # Arguments
/// * `what`: Human-readable name of the awaited thing, for logs and errors.
/// * `config`: Attempt budget and backoff bounds. At least one attempt is made.
/// * `check`: The presence check; called once per attempt.
///
/// # Returns
/// * `Ok(attempts_used)` once the check passes.
/// * `Err(SetupError::NotReady)` when every attempt failed.
pub fn wait_until_ready<F>(what: &str, config: &ReadinessConfig, mut check: F) -> Result<u32>
where
    F: FnMut() -> bool,
{
    let attempts = config.attempts.max(1);
    for attempt in 0..attempts {
        let delay = backoff_delay(config, attempt);
        if !delay.is_zero() {
            log_debug!(
                "[Readiness] {} not ready yet; retrying in {:?} ({}/{})",
                what,
                delay,
                attempt + 1,
                attempts
            );
            thread::sleep(delay);
        }
        if check() {
            if attempt > 0 {
                log_info!("[Readiness] {} became ready after {} checks", what, attempt + 1);
            }
            return Ok(attempt + 1);
        }
    }

    Err(SetupError::NotReady {
        what: what.to_string(),
        attempts,
    })
}
