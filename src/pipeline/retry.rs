use crate::config::RetryPolicy;
use crate::error::ExternalError;
use std::future::Future;
use std::time::Duration;

/// Runs `op` until it succeeds, fails with a non-retryable error, or `policy.max_attempts`
/// attempts have been made. Sleeps a jittered, exponentially growing delay between attempts.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, ExternalError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ExternalError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let delay = jittered(policy.ceiling(attempt));
                tracing::warn!(
                    label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::debug!(label, attempt, error = %err, "giving up");
                return Err(err);
            }
        }
    }
}

fn jittered(ceiling: Duration) -> Duration {
    let millis = ceiling.as_millis() as u64;
    if millis == 0 {
        return Duration::ZERO;
    }
    // Half fixed, half random, so consecutive retries keep growing.
    let half = millis / 2;
    Duration::from_millis(half + fastrand::u64(0..=millis - half))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(40),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry(&fast_policy(3), "test", || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ExternalError::Transient("flaky".into()))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.expect("third attempt succeeds"), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_retry(&fast_policy(4), "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ExternalError::Quota("429".into()))
        })
        .await;
        assert!(matches!(result, Err(ExternalError::Quota(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_retry(&fast_policy(5), "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ExternalError::Permanent("401".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn jitter_stays_within_ceiling() {
        let ceiling = Duration::from_millis(200);
        for _ in 0..100 {
            let d = jittered(ceiling);
            assert!(d >= Duration::from_millis(100) && d <= ceiling);
        }
    }
}
