//! Deadline wrappers for side-channel deliveries that have no client-level
//! timeout of their own.

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{error, instrument};

use responder_core::config::{BackendConfig, NotifierConfig};
use responder_core::{ResponderError, ResponderResult};

#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Backend report posts.
    pub report_timeout: Duration,
    /// Outbound voice calls.
    pub notification_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            report_timeout: Duration::from_secs(10),
            notification_timeout: Duration::from_secs(10),
        }
    }
}

impl TimeoutConfig {
    pub fn from_config(backend: &BackendConfig, notifier: &NotifierConfig) -> Self {
        Self {
            report_timeout: Duration::from_secs(backend.timeout_seconds),
            notification_timeout: Duration::from_secs(notifier.timeout_seconds),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimeoutHandler {
    config: TimeoutConfig,
}

impl TimeoutHandler {
    pub fn new(config: TimeoutConfig) -> Self {
        Self { config }
    }

    #[instrument(skip(self, operation))]
    pub async fn report_operation<F, T>(&self, operation: F, operation_name: &str) -> ResponderResult<T>
    where
        F: Future<Output = ResponderResult<T>>,
    {
        self.execute_with_timeout(operation, self.config.report_timeout, "report", operation_name)
            .await
    }

    #[instrument(skip(self, operation))]
    pub async fn notification_operation<F, T>(
        &self,
        operation: F,
        operation_name: &str,
    ) -> ResponderResult<T>
    where
        F: Future<Output = ResponderResult<T>>,
    {
        self.execute_with_timeout(
            operation,
            self.config.notification_timeout,
            "notification",
            operation_name,
        )
        .await
    }

    async fn execute_with_timeout<F, T>(
        &self,
        operation: F,
        timeout_duration: Duration,
        operation_type: &str,
        operation_name: &str,
    ) -> ResponderResult<T>
    where
        F: Future<Output = ResponderResult<T>>,
    {
        match timeout(timeout_duration, operation).await {
            Ok(result) => result,
            Err(_) => {
                let message = format!(
                    "{operation_type} operation '{operation_name}' timed out after {timeout_duration:?}"
                );
                error!("{}", message);
                Err(ResponderError::Timeout(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn short() -> TimeoutHandler {
        TimeoutHandler::new(TimeoutConfig {
            report_timeout: Duration::from_millis(50),
            notification_timeout: Duration::from_millis(50),
        })
    }

    #[tokio::test]
    async fn test_operation_completes_in_time() {
        let result = short().report_operation(async { Ok("posted") }, "dispatch").await;
        assert_eq!(result.unwrap(), "posted");
    }

    #[tokio::test]
    async fn test_operation_times_out() {
        let result = short()
            .notification_operation(
                async {
                    sleep(Duration::from_millis(200)).await;
                    Ok(())
                },
                "call",
            )
            .await;
        assert!(matches!(result, Err(ResponderError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_operation_error_passes_through() {
        let result: ResponderResult<()> = short()
            .report_operation(async { Err(ResponderError::Network("reset".into())) }, "dispatch")
            .await;
        assert!(matches!(result, Err(ResponderError::Network(_))));
    }
}
