//! Error types for the PTP daemon probe.

use thiserror::Error;

/// Underlying cause carried by transport failures.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for probe operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No pod matching the prefix exists in the namespace
    #[error("no pod with prefix {prefix:?} found in namespace {namespace:?}")]
    PodNotFound {
        /// Namespace that was searched
        namespace: String,
        /// Pod name prefix that was searched for
        prefix: String,
    },

    /// More than one pod matched the prefix; never disambiguated silently
    #[error("too many ({count}) pods with prefix {prefix:?} found in namespace {namespace:?}")]
    AmbiguousPods {
        /// Number of matching pods
        count: usize,
        /// Namespace that was searched
        namespace: String,
        /// Pod name prefix that was searched for
        prefix: String,
    },

    /// Cluster call or stream failure, preserving the underlying cause
    #[error("{context}")]
    Transport {
        /// What was being attempted when the failure occurred
        context: String,
        /// The underlying failure
        #[source]
        source: BoxedCause,
    },

    /// Pattern never appeared in the output within the step timeout
    #[error("timed out after {waited_ms}ms waiting for {pattern:?} at step {step}")]
    ExpectTimeout {
        /// Index of the failing script step
        step: usize,
        /// Pattern that was never seen
        pattern: String,
        /// How long the step waited before giving up
        waited_ms: u64,
    },

    /// Output stream closed before the pattern appeared
    #[error("stream closed while waiting for {pattern:?} at step {step}")]
    StreamClosed {
        /// Index of the failing script step
        step: usize,
        /// Pattern that was still outstanding
        pattern: String,
    },

    /// Exec session wiring failure
    #[error("session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap an underlying failure with transport context.
    pub fn transport(context: impl Into<String>, source: impl Into<BoxedCause>) -> Self {
        Self::Transport {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pod_not_found_error() {
        let err = Error::PodNotFound {
            namespace: "openshift-ptp".to_string(),
            prefix: "linuxptp-daemon-".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no pod with prefix \"linuxptp-daemon-\" found in namespace \"openshift-ptp\""
        );
    }

    #[test]
    fn test_ambiguous_pods_error() {
        let err = Error::AmbiguousPods {
            count: 2,
            namespace: "openshift-ptp".to_string(),
            prefix: "linuxptp-daemon-".to_string(),
        };
        let display = err.to_string();
        assert!(display.starts_with("too many (2) pods"));
        assert!(display.contains("openshift-ptp"));
    }

    #[test]
    fn test_transport_error_preserves_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = Error::transport("failed to list pods", cause);

        assert_eq!(err.to_string(), "failed to list pods");

        // The cause stays reachable through the source chain
        let source = std::error::Error::source(&err).expect("source must be set");
        assert!(source.to_string().contains("reset by peer"));
    }

    #[test]
    fn test_expect_timeout_error() {
        let err = Error::ExpectTimeout {
            step: 4,
            pattern: "extension FWVER=TIM".to_string(),
            waited_ms: 120_000,
        };
        assert_eq!(
            err.to_string(),
            "timed out after 120000ms waiting for \"extension FWVER=TIM\" at step 4"
        );
    }

    #[test]
    fn test_stream_closed_error() {
        let err = Error::StreamClosed {
            step: 2,
            pattern: "sh-4.4#".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "stream closed while waiting for \"sh-4.4#\" at step 2"
        );
    }

    #[test]
    fn test_session_error() {
        let err = Error::Session("exec stream opened without stdin".to_string());
        assert_eq!(
            err.to_string(),
            "session error: exec stream opened without stdin"
        );
    }

    #[test]
    fn test_config_error() {
        let err = Error::Config("shell prompt cannot be empty".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: shell prompt cannot be empty"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("broken pipe"));
    }

    #[test]
    fn test_result_type() {
        let success: Result<&str> = Ok("linuxptp-daemon-abcde");
        assert!(success.is_ok());

        let failure: Result<&str> = Err(Error::Config("bad".to_string()));
        assert!(failure.is_err());
    }

    #[test]
    fn test_error_debug() {
        let err = Error::Session("test".to_string());
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("Session"));
    }
}
