use thiserror::Error;

/// The five error categories of the pricing-intelligence pipeline.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// Missing or invalid configuration values, unresolvable at startup.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Malformed, missing, or out-of-range ingested data.
    #[error("data error: {message}")]
    Data { message: String },

    /// A component (forecast engine, rule generator, recommendation
    /// engine) failed to produce a result it is required to produce.
    #[error("component error in {component}: {message}")]
    Component { component: String, message: String },

    /// A phase or the overall run exceeded its configured deadline.
    #[error("timeout after {elapsed_ms}ms in {phase} (limit {limit_ms}ms)")]
    Timeout {
        phase: String,
        elapsed_ms: u64,
        limit_ms: u64,
    },

    /// The repository layer failed to read or write durable state.
    #[error("persistence error: {message}")]
    Persistence { message: String },
}

impl PipelineError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn data<S: Into<String>>(message: S) -> Self {
        Self::Data {
            message: message.into(),
        }
    }

    pub fn component<C: Into<String>, S: Into<String>>(component: C, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn timeout<S: Into<String>>(phase: S, elapsed_ms: u64, limit_ms: u64) -> Self {
        Self::Timeout {
            phase: phase.into(),
            elapsed_ms,
            limit_ms,
        }
    }

    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Category label used in logs and in `RunRecord` diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Data { .. } => "data",
            Self::Component { .. } => "component",
            Self::Timeout { .. } => "timeout",
            Self::Persistence { .. } => "persistence",
        }
    }

    /// Persistence failures and timeouts are transient by nature and
    /// worth a bounded retry; config and data errors are not, since
    /// retrying without a fix reproduces the same failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence { .. } | Self::Timeout { .. })
    }
}

impl From<crate::repository::RepositoryError> for PipelineError {
    fn from(err: crate::repository::RepositoryError) -> Self {
        Self::persistence(err.to_string())
    }
}

/// Result type alias used throughout the pipeline core.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Runs `op`, retrying up to `max_attempts` times with a fixed
/// `backoff` between attempts, but only for retryable errors.
pub async fn retry_with_backoff<F, Fut, T>(
    mut op: F,
    max_attempts: u32,
    backoff: std::time::Duration,
) -> PipelineResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = PipelineResult<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    error = %err,
                    "retrying after transient pipeline error"
                );
                tokio::time::sleep(backoff).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_match_error_kind() {
        assert_eq!(PipelineError::config("x").category(), "config");
        assert_eq!(PipelineError::data("x").category(), "data");
        assert_eq!(PipelineError::component("c", "x").category(), "component");
        assert_eq!(PipelineError::timeout("p", 1, 2).category(), "timeout");
        assert_eq!(PipelineError::persistence("x").category(), "persistence");
    }

    #[test]
    fn only_timeout_and_persistence_are_retryable() {
        assert!(!PipelineError::config("x").is_retryable());
        assert!(!PipelineError::data("x").is_retryable());
        assert!(!PipelineError::component("c", "x").is_retryable());
        assert!(PipelineError::timeout("p", 1, 2).is_retryable());
        assert!(PipelineError::persistence("x").is_retryable());
    }
}

