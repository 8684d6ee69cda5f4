//! Error types for the dashboard runtime.

use thiserror::Error;

pub use incubator_dashboard_model::PayloadError;

/// Errors that can occur while setting up or running a telemetry source.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file could not be read.
    #[error("cannot read config file {path}: {source}")]
    ConfigFile {
        path: String,
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON for [`crate::BrokerConfig`].
    #[error("invalid config file {path}: {source}")]
    ConfigFormat {
        path: String,
        source: serde_json::Error,
    },

    /// An environment override holds a value of the wrong type.
    #[error("invalid value {value:?} for {variable}")]
    ConfigValue {
        variable: &'static str,
        value: String,
    },

    /// A telemetry message could not be decoded.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// The MQTT client refused a request (subscribe, disconnect).
    #[error("MQTT client request failed: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// The connection thread could not be started.
    #[error("cannot spawn connection thread: {0}")]
    Spawn(std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ConfigValue {
            variable: "INCUBATOR_BROKER_PORT",
            value: "eighteen".to_string(),
        };
        assert!(err.to_string().contains("INCUBATOR_BROKER_PORT"));
        assert!(err.to_string().contains("eighteen"));

        let err = Error::from(PayloadError::NotAnObject("a number"));
        assert_eq!(err.to_string(), "payload must be a JSON object, got a number");
    }
}
