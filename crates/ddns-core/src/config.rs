//! Configuration types for the DDNS system
//!
//! The configuration is a JSON document read once at startup:
//!
//! ```json
//! {
//!   "zones": "023e105f4ecef8ad9ca31a8372d0c353",
//!   "api_token": "...",
//!   "A": ["home.example.com"],
//!   "AAAA": ["v6.example.com"],
//!   "subnet6": {
//!     "prefix": 56,
//!     "targets": [{ "domain": "host1.example.com", "suffix": "::10/64" }]
//!   },
//!   "engine": { "max_attempts": 5, "interval_secs": 600 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::subnet::PrefixLength;

/// Timeout applied to every outbound request
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Main DDNS configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Zone ID holding every watched record
    #[serde(rename = "zones")]
    pub zone_id: String,

    /// Account email (global API key authentication)
    #[serde(default)]
    pub email: Option<String>,

    /// Global API key
    #[serde(rename = "apikey", default)]
    pub api_key: Option<String>,

    /// Scoped API token; preferred over email + key
    #[serde(default)]
    pub api_token: Option<String>,

    /// Names whose A record tracks the public IPv4 address
    #[serde(rename = "A", default)]
    pub a: Vec<String>,

    /// Names whose AAAA record tracks the public IPv6 address
    #[serde(rename = "AAAA", default)]
    pub aaaa: Vec<String>,

    /// Names whose AAAA record is synthesized from the IPv6 prefix
    #[serde(rename = "subnet6", default)]
    pub subnet6: Option<SubnetConfig>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

// Custom Debug implementation that hides the credentials
impl fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("zone_id", &self.zone_id)
            .field("email", &self.email)
            .field("api_key", &self.api_key.as_ref().map(|_| "<REDACTED>"))
            .field("api_token", &self.api_token.as_ref().map(|_| "<REDACTED>"))
            .field("a", &self.a)
            .field("aaaa", &self.aaaa)
            .field("subnet6", &self.subnet6)
            .field("engine", &self.engine)
            .finish()
    }
}

impl DdnsConfig {
    /// Create an empty configuration for a zone
    pub fn new(zone_id: impl Into<String>, credentials: Credentials) -> Self {
        let (email, api_key, api_token) = match credentials {
            Credentials::ApiToken(token) => (None, None, Some(token)),
            Credentials::GlobalKey { email, key } => (Some(email), Some(key), None),
        };
        Self {
            zone_id: zone_id.into(),
            email,
            api_key,
            api_token,
            a: Vec::new(),
            aaaa: Vec::new(),
            subnet6: None,
            engine: EngineConfig::default(),
        }
    }

    /// Read and parse a configuration file
    ///
    /// The result is not validated; call [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse a configuration document
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.zone_id.trim().is_empty() {
            return Err(Error::config("zone id ('zones') cannot be empty"));
        }

        self.credentials()?;

        if self.a.is_empty() && self.aaaa.is_empty() && self.subnet_targets().is_empty() {
            return Err(Error::config("No domain configured"));
        }

        for name in self.a.iter().chain(self.aaaa.iter()) {
            validate_domain_name(name)?;
        }
        for target in self.subnet_targets() {
            validate_domain_name(&target.domain)?;
        }

        self.subnet_prefix()?;
        self.engine.validate()?;

        Ok(())
    }

    /// Credentials to authenticate with
    ///
    /// An API token wins over email + global key.
    pub fn credentials(&self) -> Result<Credentials> {
        if let Some(token) = self.api_token.as_ref().filter(|t| !t.is_empty()) {
            return Ok(Credentials::ApiToken(token.clone()));
        }

        match (&self.email, &self.api_key) {
            (Some(email), Some(key)) if !email.is_empty() && !key.is_empty() => {
                Ok(Credentials::GlobalKey {
                    email: email.clone(),
                    key: key.clone(),
                })
            }
            _ => Err(Error::config(
                "credentials missing: set 'api_token', or both 'email' and 'apikey'",
            )),
        }
    }

    /// Configured subnet targets (empty without a `subnet6` section)
    pub fn subnet_targets(&self) -> &[SubnetTargetConfig] {
        self.subnet6
            .as_ref()
            .map(|s| s.targets.as_slice())
            .unwrap_or(&[])
    }

    /// The validated global prefix length, if any subnet target needs one
    pub fn subnet_prefix(&self) -> Result<Option<PrefixLength>> {
        match &self.subnet6 {
            Some(subnet) if !subnet.targets.is_empty() => PrefixLength::new(subnet.prefix).map(Some),
            _ => Ok(None),
        }
    }
}

/// Provider credentials
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Scoped API token (Bearer authentication)
    ApiToken(String),

    /// Account email plus global API key
    GlobalKey {
        /// Account email
        email: String,
        /// Global API key
        key: String,
    },
}

// Custom Debug implementation that hides the secrets
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ApiToken(_) => f.debug_tuple("ApiToken").field(&"<REDACTED>").finish(),
            Credentials::GlobalKey { email, .. } => f
                .debug_struct("GlobalKey")
                .field("email", email)
                .field("key", &"<REDACTED>")
                .finish(),
        }
    }
}

/// IPv6 subnet section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubnetConfig {
    /// Global prefix length shared by every target
    #[serde(default)]
    pub prefix: u8,

    /// Targets under that prefix
    #[serde(default)]
    pub targets: Vec<SubnetTargetConfig>,
}

/// One subnet target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubnetTargetConfig {
    /// Domain whose AAAA record is synthesized
    pub domain: String,

    /// Host suffix, `"<address>/<length>"`
    pub suffix: String,
}

/// Where the engine reads a record's current value from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordLookup {
    /// Ask the DNS provider API
    #[default]
    Provider,
    /// Resolve the name through the system resolver
    Dns,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Attempts per retried operation
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Delay between retry attempts (in seconds); 0 retries immediately
    #[serde(default)]
    pub retry_delay_secs: u64,

    /// Pause between cycles when running forever (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Source of the current record value
    #[serde(default)]
    pub lookup: RecordLookup,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine settings
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::config("engine.max_attempts must be >= 1"));
        }
        if self.interval_secs == 0 {
            return Err(Error::config("engine.interval_secs must be >= 1"));
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::config("engine.event_channel_capacity must be >= 1"));
        }
        Ok(())
    }

    /// Pause between cycles
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_secs: 0,
            interval_secs: default_interval_secs(),
            lookup: RecordLookup::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_max_attempts() -> usize {
    crate::retry::DEFAULT_MAX_ATTEMPTS
}

fn default_interval_secs() -> u64 {
    600
}

fn default_event_channel_capacity() -> usize {
    1000
}

/// Validate that a string is a valid domain name
///
/// This implements basic DNS domain name validation per RFC 1035.
/// It's not comprehensive but catches common errors.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::config("Domain name cannot be empty"));
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        return Err(Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(Error::config(format!("Domain name has empty label: '{}'", domain)));
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        // Wildcard records are managed like any other name
        if label == "*" {
            continue;
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
            return Err(Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric, hyphen and underscore only.",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "zones": "zone-123",
        "email": "admin@example.com",
        "apikey": "global-key",
        "A": ["home.example.com"],
        "AAAA": ["v6.example.com"],
        "subnet6": {
            "prefix": 56,
            "targets": [{ "domain": "host1.example.com", "suffix": "::10/64" }]
        }
    }"#;

    #[test]
    fn test_parse_reference_format() {
        let config = DdnsConfig::from_json(SAMPLE).unwrap();

        assert_eq!(config.zone_id, "zone-123");
        assert_eq!(config.a, vec!["home.example.com"]);
        assert_eq!(config.aaaa, vec!["v6.example.com"]);
        assert_eq!(config.subnet_targets().len(), 1);
        assert_eq!(config.subnet_targets()[0].suffix, "::10/64");
        assert_eq!(config.subnet_prefix().unwrap().map(|p| p.get()), Some(56));
        assert_eq!(config.engine.max_attempts, 5);
        assert_eq!(config.engine.interval(), Duration::from_secs(600));
        assert_eq!(config.engine.lookup, RecordLookup::Provider);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_credentials_prefer_token() {
        let mut config = DdnsConfig::from_json(SAMPLE).unwrap();
        assert!(matches!(config.credentials().unwrap(), Credentials::GlobalKey { .. }));

        config.api_token = Some("scoped-token".to_string());
        assert_eq!(
            config.credentials().unwrap(),
            Credentials::ApiToken("scoped-token".to_string())
        );
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let mut config = DdnsConfig::from_json(SAMPLE).unwrap();
        config.api_key = None;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_no_domains_rejected() {
        let config = DdnsConfig::new("zone", Credentials::ApiToken("t".into()));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("No domain configured"));
    }

    #[test]
    fn test_subnet_prefix_checked_only_with_targets() {
        let mut config = DdnsConfig::new("zone", Credentials::ApiToken("t".into()));
        config.a.push("home.example.com".to_string());
        config.subnet6 = Some(SubnetConfig {
            prefix: 0,
            targets: Vec::new(),
        });
        assert!(config.validate().is_ok());

        config.subnet6 = Some(SubnetConfig {
            prefix: 72,
            targets: vec![SubnetTargetConfig {
                domain: "host1.example.com".into(),
                suffix: "::1/48".into(),
            }],
        });
        assert!(matches!(config.validate(), Err(Error::InvalidPrefixLength(_))));
    }

    #[test]
    fn test_engine_section() {
        let config = DdnsConfig::from_json(
            r#"{
                "zones": "z", "api_token": "t", "A": ["a.example.com"],
                "engine": { "max_attempts": 3, "interval_secs": 60, "lookup": "dns" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.engine.max_attempts, 3);
        assert_eq!(config.engine.lookup, RecordLookup::Dns);
        assert_eq!(config.engine.event_channel_capacity, 1000);

        let mut zero = config.clone();
        zero.engine.max_attempts = 0;
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_invalid_domain_rejected() {
        let mut config = DdnsConfig::new("zone", Credentials::ApiToken("t".into()));
        config.a.push("bad..example.com".to_string());
        assert!(config.validate().is_err());

        assert!(validate_domain_name("-bad.example.com").is_err());
        assert!(validate_domain_name("ok_srv.example.com").is_ok());
        assert!(validate_domain_name("*.example.com").is_ok());
        assert!(validate_domain_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = DdnsConfig::load(file.path()).unwrap();
        assert_eq!(config.zone_id, "zone-123");

        assert!(matches!(
            DdnsConfig::load(file.path().with_extension("missing")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(DdnsConfig::from_json("{ not json"), Err(Error::Json(_))));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = DdnsConfig::from_json(SAMPLE).unwrap();
        let debug = format!("{:?} {:?}", config, config.credentials().unwrap());

        assert!(!debug.contains("global-key"));
        assert!(debug.contains("<REDACTED>"));
    }
}
