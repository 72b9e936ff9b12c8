// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare DNS provider implementation for the DDNS system.
//
// ## Behaviour
//
// - ✅ One HTTP request per trait call (GET for lookup, PUT for update)
// - ✅ Full error propagation to the engine (the engine owns retries)
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - ✅ Dry-run mode for safe testing
// - ✅ API token or email + global key authentication
// - ❌ NO retry logic (owned by RetryPolicy)
// - ❌ NO caching (every cycle re-reads the zone)
// - ❌ NO background tasks
//
// ## Security Requirements
//
// - Credentials NEVER appear in logs or `Debug` output
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=...&name=...`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_core::config::{Credentials, DEFAULT_HTTP_TIMEOUT, DdnsConfig};
use ddns_core::records::WatchedRecord;
use ddns_core::traits::{AddressFamily, DnsProvider, ProviderRecord, RECORD_PROXIED, RECORD_TTL};
use ddns_core::{Error, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

const PROVIDER: &str = "cloudflare";

/// Cloudflare DNS provider
///
/// # Trust Level: Untrusted
///
/// This provider is isolated, stateless, and single-shot. All coordination
/// (retries, scheduling, deciding whether to update) is owned by the engine.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests
/// - Log the intended PUT payload
/// - **NOT** actually modify DNS records
pub struct CloudflareProvider {
    /// API credentials
    /// ⚠️ NEVER log this value
    credentials: Credentials,

    /// Zone holding every watched record
    zone_id: String,

    /// API base URL (overridable for tests)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("credentials", &self.credentials)
            .field("zone_id", &self.zone_id)
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Errors
    ///
    /// `Error::Config` when the zone ID or a credential is empty.
    pub fn new(credentials: Credentials, zone_id: impl Into<String>, dry_run: bool) -> Result<Self> {
        let zone_id = zone_id.into();
        if zone_id.is_empty() {
            return Err(Error::config("Cloudflare zone ID is required"));
        }

        let empty = match &credentials {
            Credentials::ApiToken(token) => token.is_empty(),
            Credentials::GlobalKey { email, key } => email.is_empty() || key.is_empty(),
        };
        if empty {
            return Err(Error::config("Cloudflare credentials cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::network(format!("Failed to build HTTP client: {}", e)))?;

        if dry_run {
            tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self {
            credentials,
            zone_id,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Create a provider from the zone and credentials of a configuration
    pub fn from_config(config: &DdnsConfig, dry_run: bool) -> Result<Self> {
        Self::new(config.credentials()?, config.zone_id.clone(), dry_run)
    }

    /// Point the provider at another API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether updates are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, self.zone_id)
    }

    /// Attach authentication and caching headers
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header("Cache-Control", "no-cache");
        match &self.credentials {
            Credentials::ApiToken(token) => request.bearer_auth(token),
            Credentials::GlobalKey { email, key } => {
                request.header("X-Auth-Email", email).header("X-Auth-Key", key)
            }
        }
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// Find the record `name` of the family's type
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&name=home.example.com
    /// ```
    async fn lookup(&self, name: &str, family: AddressFamily) -> Result<ProviderRecord> {
        let record_type = family.record_type();
        tracing::debug!("Looking up record: {} (type: {})", name, record_type);

        let response = self
            .authorize(self.client.get(self.records_url()))
            .query(&[("type", record_type), ("name", name)])
            .send()
            .await
            .map_err(|e| Error::network(format!("HTTP request failed: {}", e)))?;

        let response = check_status(response, &format!("{} (type: {})", name, record_type)).await?;

        let body: ListResponse = response
            .json()
            .await
            .map_err(|e| Error::parse(format!("Failed to parse response: {}", e)))?;

        if !body.success {
            return Err(Error::provider(
                PROVIDER,
                format!("Record lookup failed: {}", describe(&body.errors)),
            ));
        }

        let record = body
            .result
            .unwrap_or_default()
            .into_iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::not_found(format!("DNS record not found: {} (type: {})", name, record_type)))?;

        tracing::debug!("Found record ID: {}", record.id);
        Ok(ProviderRecord {
            record_id: record.id,
            name: record.name,
            content: record.content,
        })
    }

    /// Overwrite the record with `value`
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// {
    ///   "type": "A",
    ///   "name": "home.example.com",
    ///   "content": "198.51.100.2",
    ///   "ttl": 60,
    ///   "proxied": false
    /// }
    /// ```
    async fn update_record(&self, record: &WatchedRecord, value: &str) -> Result<()> {
        let url = format!("{}/{}", self.records_url(), record.record_id);
        let payload = UpdateRequest {
            record_type: record.record_type(),
            name: &record.name,
            content: value,
            ttl: RECORD_TTL,
            proxied: RECORD_PROXIED,
        };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {:?}",
                url,
                payload
            );
            return Ok(());
        }

        let response = self
            .authorize(self.client.put(&url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::network(format!("HTTP request failed: {}", e)))?;

        let response = check_status(response, &record.to_string()).await?;

        let body: UpdateResponse = response
            .json()
            .await
            .map_err(|e| Error::parse(format!("Failed to parse response: {}", e)))?;

        if !body.success {
            return Err(Error::provider(
                PROVIDER,
                format!("Failed to update {}: {}", record, describe(&body.errors)),
            ));
        }

        tracing::debug!("DNS record updated: {} -> {}", record, value);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Map a non-success HTTP status to an error
async fn check_status(response: reqwest::Response, subject: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    Err(status_error(status, subject, &error_text))
}

fn status_error(status: StatusCode, subject: &str, error_text: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::provider(
            PROVIDER,
            format!(
                "Authentication failed: Invalid credentials or insufficient permissions. Status: {}",
                status
            ),
        ),
        404 => Error::not_found(format!("DNS record not found: {}", subject)),
        409 => Error::provider(
            PROVIDER,
            format!("Conflict: Record is being updated by another process. Status: {}", status),
        ),
        429 => Error::provider(
            PROVIDER,
            format!("Rate limit exceeded. Please retry later. Status: {}", status),
        ),
        500..=599 => Error::provider(
            PROVIDER,
            format!("Cloudflare server error (transient): {} - {}", status, error_text),
        ),
        _ => Error::provider(
            PROVIDER,
            format!("Request for {} failed: {} - {}", subject, status, error_text),
        ),
    }
}

fn describe(messages: &[ApiMessage]) -> String {
    if messages.is_empty() {
        return "no error details".to_string();
    }
    messages
        .iter()
        .map(|m| format!("{} ({})", m.message, m.code))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct DnsRecord {
    id: String,
    name: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    #[serde(default)]
    result: Option<Vec<DnsRecord>>,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
    proxied: bool,
}
