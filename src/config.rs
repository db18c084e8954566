use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;

use crate::selector::SelectorConfig;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub selector: SelectorSettings,
    pub data: DataConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            selector: SelectorSettings::from_env(),
            data: DataConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;

    fn from_env() -> Self {
        let host_value =
            env_string("BOX_SIZER_API_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, display_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                tracing::warn!(
                    "⚠️ Could not parse BOX_SIZER_API_HOST ('{}'): {}. Using {}.",
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = env_string("BOX_SIZER_API_PORT")
            .map(|raw| parse_port(&raw, "BOX_SIZER_API_PORT").unwrap_or(Self::DEFAULT_PORT))
            .unwrap_or(Self::DEFAULT_PORT);

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

/// Configuration for the box search.
#[derive(Clone, Debug)]
pub struct SelectorSettings {
    selector: SelectorConfig,
}

impl SelectorSettings {
    const SLACK_FACTOR_VAR: &'static str = "BOX_SIZER_SLACK_FACTOR";
    const PARALLEL_VAR: &'static str = "BOX_SIZER_PARALLEL_SELECTION";

    fn from_env() -> Self {
        let slack_factor = load_f64_with_warning(
            Self::SLACK_FACTOR_VAR,
            SelectorConfig::DEFAULT_SLACK_FACTOR,
            SelectorConfig::is_valid_slack_factor,
            "must be a finite number of at least 0",
            "Warning: Adjusted slack factor changes every box recommendation",
        );

        let parallel_evaluation = env_string(Self::PARALLEL_VAR)
            .and_then(|raw| parse_bool(&raw, Self::PARALLEL_VAR))
            .unwrap_or(SelectorConfig::DEFAULT_PARALLEL_EVALUATION);

        let selector = SelectorConfig::builder()
            .slack_factor(slack_factor)
            .parallel_evaluation(parallel_evaluation)
            .build();

        Self { selector }
    }

    /// Returns the configured SelectorConfig.
    pub fn selector_config(&self) -> SelectorConfig {
        self.selector
    }
}

/// Locations of the reference data loaded at startup.
#[derive(Clone, Debug)]
pub struct DataConfig {
    boxes_path: PathBuf,
    catalog_path: Option<PathBuf>,
}

impl DataConfig {
    const DEFAULT_BOXES_PATH: &'static str = "data/boxes.json";

    fn from_env() -> Self {
        Self {
            boxes_path: env_string("BOX_SIZER_BOXES_PATH")
                .unwrap_or_else(|| Self::DEFAULT_BOXES_PATH.to_string())
                .into(),
            catalog_path: env_string("BOX_SIZER_CATALOG_PATH").map(PathBuf::from),
        }
    }

    /// JSON export of the box inventory.
    pub fn boxes_path(&self) -> &PathBuf {
        &self.boxes_path
    }

    /// Catalog override; `None` means the built-in catalog.
    pub fn catalog_path(&self) -> Option<&PathBuf> {
        self.catalog_path.as_ref()
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            tracing::warn!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name,
                err
            );
            None
        }
    }
}

fn parse_port(raw: &str, var_name: &str) -> Option<u16> {
    match raw.trim().parse::<u16>() {
        Ok(0) => {
            tracing::warn!("⚠️ {} must not be 0. Using default port.", var_name);
            None
        }
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                "⚠️ Could not parse {} ('{}'): {}. Using default port.",
                var_name,
                raw,
                err
            );
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            tracing::warn!(
                "⚠️ Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name,
                other
            );
            None
        }
    }
}

fn parse_f64_with_warning(
    var_name: &str,
    raw: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) => {
            if !validator(value) {
                tracing::warn!(
                    "⚠️ {} contains invalid value '{}': {}. Using {}.",
                    var_name,
                    raw,
                    invalid_hint,
                    default
                );
                default
            } else {
                let tolerance = (default.abs().max(1.0)) * 1e-9;
                if (value - default).abs() > tolerance {
                    tracing::info!("⚠️ {} ({} = {}).", warning, var_name, value);
                }
                value
            }
        }
        Err(err) => {
            tracing::warn!(
                "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                var_name,
                raw,
                err,
                default
            );
            default
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => {
            parse_f64_with_warning(var_name, &raw, default, validator, invalid_hint, warning)
        }
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_true_values() {
        assert_eq!(parse_bool("1", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("true", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("yes", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("y", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("on", "TEST_VAR"), Some(true));

        // Test case insensitivity
        assert_eq!(parse_bool("TRUE", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("On", "TEST_VAR"), Some(true));

        // Test with whitespace
        assert_eq!(parse_bool(" true ", "TEST_VAR"), Some(true));
    }

    #[test]
    fn test_parse_bool_false_values() {
        assert_eq!(parse_bool("0", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("false", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("no", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("n", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("OFF", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("  0  ", "TEST_VAR"), Some(false));
    }

    #[test]
    fn test_parse_bool_invalid_values() {
        assert_eq!(parse_bool("maybe", "TEST_VAR"), None);
        assert_eq!(parse_bool("2", "TEST_VAR"), None);
        assert_eq!(parse_bool("", "TEST_VAR"), None);
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("8081", "TEST_PORT"), Some(8081));
        assert_eq!(parse_port(" 3000 ", "TEST_PORT"), Some(3000));
        assert_eq!(parse_port("0", "TEST_PORT"), None);
        assert_eq!(parse_port("70000", "TEST_PORT"), None);
        assert_eq!(parse_port("http", "TEST_PORT"), None);
    }

    #[test]
    fn test_slack_factor_parsing_falls_back_on_invalid_values() {
        let parse = |raw: &str| {
            parse_f64_with_warning(
                "TEST_SLACK",
                raw,
                SelectorConfig::DEFAULT_SLACK_FACTOR,
                SelectorConfig::is_valid_slack_factor,
                "must be at least 0",
                "Adjusted",
            )
        };

        assert_eq!(parse("0.2"), 0.2);
        assert_eq!(parse("0"), 0.0);
        assert_eq!(parse("-0.5"), SelectorConfig::DEFAULT_SLACK_FACTOR);
        assert_eq!(parse("inf"), SelectorConfig::DEFAULT_SLACK_FACTOR);
        assert_eq!(parse("fifteen"), SelectorConfig::DEFAULT_SLACK_FACTOR);
    }
}
