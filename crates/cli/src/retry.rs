//! Retry with exponential backoff and jitter
//!
//! The library never retries on its own. Commands wrap the calls they want
//! retried in [`retry_with_backoff`], using the profile's [`RetryConfig`].

use std::future::Future;
use std::time::Duration;

use bfs_core::{Error, Result, RetryConfig};

/// Retry a fallible async operation with exponential backoff
///
/// # Example
/// ```ignore
/// let reader = retry_with_backoff(
///     &config,
///     || fs.open_reader(path),
///     is_retryable_error,
/// ).await?;
/// ```
pub async fn retry_with_backoff<T, F, Fut, R>(
    config: &RetryConfig,
    mut operation: F,
    is_retryable: R,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    R: Fn(&Error) -> bool,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt >= config.max_attempts || !is_retryable(&e) {
                    return Err(e);
                }

                let backoff = calculate_backoff(config, attempt);
                tracing::debug!(
                    attempt = attempt,
                    backoff_ms = backoff.as_millis(),
                    error = %e,
                    "Retrying after transient error"
                );

                tokio::time::sleep(backoff).await;
            }
        }
    }
}

/// Calculate backoff duration with jitter
fn calculate_backoff(config: &RetryConfig, attempt: u32) -> Duration {
    // Exponential backoff: initial * 2^(attempt-1)
    let base_ms = config.initial_backoff_ms * (1u64 << (attempt - 1).min(10));
    let capped_ms = base_ms.min(config.max_backoff_ms);

    let jitter_ms = rand_jitter(capped_ms);
    Duration::from_millis(capped_ms + jitter_ms)
}

/// Pseudo-random jitter in `0..max`
fn rand_jitter(max: u64) -> u64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as u64;
    nanos % max.max(1)
}

/// Check if an error is transient
///
/// Only backend I/O failures qualify, and only when the service reported
/// throttling or unavailability or the request never got an answer.
pub fn is_retryable_error(error: &Error) -> bool {
    match error {
        Error::BackendIo(msg) => {
            let msg_lower = msg.to_lowercase();
            msg_lower.contains("timed out")
                || msg_lower.contains("timeout")
                || msg_lower.contains("connection reset")
                || msg_lower.contains("connection refused")
                || msg_lower.contains("error sending request")
                || msg_lower.contains("503")
                || msg_lower.contains("service unavailable")
                || msg_lower.contains("serverbusy")
                || msg_lower.contains("429")
                || msg_lower.contains("too many requests")
                || msg_lower.contains("500 internal server error")
        }
        Error::Io(e) => matches!(
            e.kind(),
            std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionRefused
                | std::io::ErrorKind::TimedOut
                | std::io::ErrorKind::Interrupted
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_backoff_ms: 1,
            max_backoff_ms: 10,
        }
    }

    #[test]
    fn test_calculate_backoff() {
        let config = RetryConfig::default();

        let b1 = calculate_backoff(&config, 1);
        assert!(b1.as_millis() >= 100 && b1.as_millis() < 200);

        let b2 = calculate_backoff(&config, 2);
        assert!(b2.as_millis() >= 200 && b2.as_millis() < 400);

        let b3 = calculate_backoff(&config, 3);
        assert!(b3.as_millis() >= 400 && b3.as_millis() < 800);
    }

    #[test]
    fn test_backoff_cap() {
        let config = RetryConfig {
            max_attempts: 10,
            initial_backoff_ms: 1000,
            max_backoff_ms: 5000,
        };

        let b = calculate_backoff(&config, 10);
        assert!(b.as_millis() < 10000); // max + jitter
    }

    #[test]
    fn test_is_retryable_error() {
        assert!(is_retryable_error(&Error::BackendIo(
            "When fetching properties for 'x': Azure Error: ServerBusy (503 Service Unavailable)"
                .to_string()
        )));
        assert!(is_retryable_error(&Error::BackendIo(
            "Azure Error: Request failed: error sending request for url".to_string()
        )));
        assert!(!is_retryable_error(&Error::BackendIo(
            "Azure Error: AuthorizationFailure (403 Forbidden)".to_string()
        )));

        // Argument errors and missing paths never succeed on retry
        assert!(!is_retryable_error(&Error::path_not_found("c/b")));
        assert!(!is_retryable_error(&Error::InvalidArgument(
            "negative position".to_string()
        )));
    }

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let config = RetryConfig::default();
        let mut calls = 0;

        let result = retry_with_backoff(
            &config,
            || {
                calls += 1;
                async { Ok::<_, Error>(42) }
            },
            |_| true,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_retry_success_after_failure() {
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let result = retry_with_backoff(
            &fast_config(3),
            || {
                let cc = call_count_clone.clone();
                async move {
                    if cc.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(Error::BackendIo("operation timed out".to_string()))
                    } else {
                        Ok(42)
                    }
                }
            },
            is_retryable_error,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhausted() {
        let mut calls = 0;

        let result: Result<()> = retry_with_backoff(
            &fast_config(2),
            || {
                calls += 1;
                async { Err(Error::BackendIo("503".to_string())) }
            },
            |_| true,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_retry_non_retryable() {
        let mut calls = 0;

        let result: Result<()> = retry_with_backoff(
            &fast_config(3),
            || {
                calls += 1;
                async { Err(Error::path_not_found("c/b")) }
            },
            is_retryable_error,
        )
        .await;

        assert!(matches!(result, Err(Error::PathNotFound(_))));
        assert_eq!(calls, 1);
    }
}
