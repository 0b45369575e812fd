use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_refresh_interval() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP listener binds to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the dhcpd.leases(5) file to watch.
    ///
    /// Optional in the config file because it can also arrive via the CLI
    /// or the `DHCPD_LEASES_FILE` environment variable; [`Config::validate`]
    /// rejects a configuration where no source supplied it.
    #[serde(default)]
    pub leases_file: Option<PathBuf>,

    /// Hardware address to display name, e.g. `"aa:bb:cc:dd:ee:ff": "printer"`.
    ///
    /// When absent, records carry no alias field at all.
    #[serde(default)]
    pub aliases: Option<HashMap<String, String>>,

    /// Seconds between lease file re-reads.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            leases_file: None,
            aliases: None,
            refresh_interval_seconds: default_refresh_interval(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::InvalidConfig("port must be non-zero".to_string()));
        }

        if self.refresh_interval_seconds == 0 {
            return Err(Error::InvalidConfig(
                "refresh_interval_seconds must be greater than 0".to_string(),
            ));
        }

        match &self.leases_file {
            None => {
                return Err(Error::InvalidConfig(
                    "a dhcpd.leases(5) file must be specified".to_string(),
                ));
            }
            Some(path) if path.as_os_str().is_empty() => {
                return Err(Error::InvalidConfig(
                    "leases_file must not be empty".to_string(),
                ));
            }
            Some(_) => {}
        }

        Ok(())
    }

    /// The lease file path. Present on any configuration that passed
    /// [`Config::validate`].
    pub fn leases_path(&self) -> Result<&Path> {
        self.leases_file
            .as_deref()
            .ok_or_else(|| Error::InvalidConfig("a dhcpd.leases(5) file must be specified".to_string()))
    }

    pub fn aliases_enabled(&self) -> bool {
        self.aliases.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestGuard(String);
    impl Drop for TestGuard {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn valid_config() -> Config {
        Config {
            leases_file: Some(PathBuf::from("dhcpd.leases")),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_default_config_has_no_lease_file() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn test_empty_lease_path_rejected() {
        let config = Config {
            leases_file: Some(PathBuf::new()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_port_rejected() {
        let config = Config {
            port: 0,
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_refresh_interval_rejected() {
        let config = Config {
            refresh_interval_seconds: 0,
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let path = "test_config_partial.json".to_string();
        let _guard = TestGuard(path.clone());
        std::fs::write(
            &path,
            r#"{"leases":null,"aliases":{"aa:bb:cc:dd:ee:ff":"printer"},"leases_file":"/var/db/dhcpd.leases"}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.refresh_interval_seconds, 10);
        assert!(config.aliases_enabled());
        assert_eq!(
            config.leases_path().unwrap(),
            Path::new("/var/db/dhcpd.leases")
        );
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(Config::load("test_config_does_not_exist.json").is_err());
    }

    #[test]
    fn test_load_invalid_json_errors() {
        let path = "test_config_invalid.json".to_string();
        let _guard = TestGuard(path.clone());
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Json(_))));
    }
}
