//! Broker connection settings.
//!
//! Built from defaults, then an optional JSON file named by
//! `INCUBATOR_CONFIG`, then individual environment overrides.

use serde::Deserialize;

use crate::error::Error;

/// Names of the environment variables read by [`BrokerConfig::from_env`].
pub mod env {
    pub const CONFIG_FILE: &str = "INCUBATOR_CONFIG";
    pub const HOST: &str = "INCUBATOR_BROKER_HOST";
    pub const PORT: &str = "INCUBATOR_BROKER_PORT";
    pub const TOPIC: &str = "INCUBATOR_TOPIC";
    pub const CLIENT_PREFIX: &str = "INCUBATOR_CLIENT_PREFIX";
    pub const DEMO: &str = "INCUBATOR_DEMO";
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,

    /// Topic the incubator publishes its JSON telemetry on.
    pub topic: String,

    /// The client id is this prefix followed by the current Unix time in
    /// milliseconds, so that several dashboards can share a broker.
    pub client_id_prefix: String,

    pub keep_alive_secs: u64,

    /// Replay built-in sample data instead of connecting to the broker.
    pub demo: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "mqtt-dashboard.com".into(),
            port: 1883,
            topic: "projeto_chocadeira/dados".into(),
            client_id_prefix: "incubator_dashboard_".into(),
            keep_alive_secs: 30,
            demo: false,
        }
    }
}

impl BrokerConfig {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = match lookup(env::CONFIG_FILE) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_overrides(lookup)?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path).map_err(|source| Error::ConfigFile {
            path: path.into(),
            source,
        })?;

        serde_json::from_str(&json).map_err(|source| Error::ConfigFormat {
            path: path.into(),
            source,
        })
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), Error> {
        if let Some(host) = lookup(env::HOST) {
            self.host = host;
        }

        if let Some(port) = lookup(env::PORT) {
            self.port = port.trim().parse().map_err(|_| Error::ConfigValue {
                variable: env::PORT,
                value: port,
            })?;
        }

        if let Some(topic) = lookup(env::TOPIC) {
            self.topic = topic;
        }

        if let Some(prefix) = lookup(env::CLIENT_PREFIX) {
            self.client_id_prefix = prefix;
        }

        if let Some(demo) = lookup(env::DEMO) {
            self.demo = match demo.trim().to_ascii_lowercase().as_str() {
                "" | "0" | "false" | "no" | "off" => false,
                "1" | "true" | "yes" | "on" => true,
                _ => {
                    return Err(Error::ConfigValue {
                        variable: env::DEMO,
                        value: demo,
                    })
                }
            };
        }

        Ok(())
    }

    pub fn client_id(&self) -> String {
        format!(
            "{}{}",
            self.client_id_prefix,
            chrono::Utc::now().timestamp_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults_point_at_public_broker() {
        let config = BrokerConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.host, "mqtt-dashboard.com");
        assert_eq!(config.port, 1883);
        assert_eq!(config.topic, "projeto_chocadeira/dados");
        assert!(!config.demo);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = BrokerConfig::from_lookup(lookup(&[
            (env::HOST, "localhost"),
            (env::PORT, "1884"),
            (env::TOPIC, "barn/incubator"),
            (env::DEMO, "yes"),
        ]))
        .unwrap();

        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 1884);
        assert_eq!(config.topic, "barn/incubator");
        assert!(config.demo);
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = BrokerConfig::from_lookup(lookup(&[(env::PORT, "70000")])).unwrap_err();
        assert!(matches!(err, Error::ConfigValue { variable: env::PORT, .. }));
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config: BrokerConfig = serde_json::from_str(r#"{"host": "10.0.0.2"}"#).unwrap();

        assert_eq!(config.host, "10.0.0.2");
        assert_eq!(config.port, 1883);
        assert_eq!(config.keep_alive_secs, 30);
    }

    fn write_config(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir().join(format!("incubator-{}-{name}.json", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn environment_overrides_config_file() {
        let path = write_config(
            "layered",
            r#"{"host": "broker.local", "port": 1885, "topic": "farm/incubator", "keep_alive_secs": 60}"#,
        );

        let config = BrokerConfig::from_lookup(lookup(&[
            (env::CONFIG_FILE, path.as_str()),
            (env::PORT, "1886"),
        ]))
        .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.host, "broker.local");
        assert_eq!(config.topic, "farm/incubator");
        assert_eq!(config.keep_alive_secs, 60);
        assert_eq!(config.port, 1886);
        assert_eq!(config.client_id_prefix, "incubator_dashboard_");
    }

    #[test]
    fn malformed_config_file_is_reported() {
        let path = write_config("malformed", r#"{"host": "broker.local""#);

        let err = BrokerConfig::from_lookup(lookup(&[(env::CONFIG_FILE, path.as_str())])).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(err, Error::ConfigFormat { .. }));
    }

    #[test]
    fn unknown_config_key_is_reported() {
        let path = write_config("unknown", r#"{"hostname": "broker.local"}"#);

        let err = BrokerConfig::from_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(err, Error::ConfigFormat { .. }));
        assert!(err.to_string().contains("hostname"));
    }

    #[test]
    fn bad_demo_flag_is_rejected() {
        let err = BrokerConfig::from_lookup(lookup(&[(env::DEMO, "maybe")])).unwrap_err();

        assert!(matches!(
            err,
            Error::ConfigValue { variable: env::DEMO, ref value } if value == "maybe"
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = BrokerConfig::from_lookup(lookup(&[(env::CONFIG_FILE, "/nonexistent/incubator.json")]))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigFile { .. }));
    }

    #[test]
    fn client_id_uses_prefix() {
        let config = BrokerConfig::default();
        let id = config.client_id();

        assert!(id.starts_with("incubator_dashboard_"));
        assert!(id["incubator_dashboard_".len()..].parse::<i64>().is_ok());
    }
}
