//! End-to-end: ReconcileEngine driving the Cloudflare provider against a mock API
//!
//! Verifies the wire-level outcome of a cycle: which PUT requests reach the
//! API and what they carry.

use ddns_core::traits::{AddressFamily, AddressSource};
use ddns_core::{AddressSourcePool, Credentials, DdnsConfig, ReconcileEngine, SubnetConfig, SubnetTargetConfig};
use ddns_provider_cloudflare::CloudflareProvider;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A source that always answers the same address
struct FixedSource {
    family: AddressFamily,
    address: &'static str,
}

impl std::fmt::Display for FixedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<fixed source; address={}>", self.address)
    }
}

#[async_trait::async_trait]
impl AddressSource for FixedSource {
    async fn fetch(&self) -> ddns_core::Result<String> {
        Ok(self.address.to_string())
    }

    fn family(&self) -> AddressFamily {
        self.family
    }
}

fn pool(family: AddressFamily, address: &'static str) -> AddressSourcePool {
    AddressSourcePool::new().with_source(Box::new(FixedSource { family, address }))
}

fn config() -> DdnsConfig {
    DdnsConfig::new("zone-1", Credentials::ApiToken("token".to_string()))
}

async fn mount_record(server: &MockServer, record_type: &str, name: &str, id: &str, content: &str) {
    Mock::given(method("GET"))
        .and(path("/zones/zone-1/dns_records"))
        .and(query_param("type", record_type))
        .and(query_param("name", name))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "errors": [],
            "result": [{ "id": id, "name": name, "content": content, "ttl": 60, "proxied": false }],
        })))
        .mount(server)
        .await;
}

fn put_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({ "success": true, "errors": [] }))
}

#[tokio::test]
async fn changed_a_record_gets_one_put() {
    let server = MockServer::start().await;
    mount_record(&server, "A", "home.example.com", "rec-a", "198.51.100.1").await;
    Mock::given(method("PUT"))
        .and(path("/zones/zone-1/dns_records/rec-a"))
        .and(body_json(serde_json::json!({
            "type": "A",
            "name": "home.example.com",
            "content": "198.51.100.2",
            "ttl": 60,
            "proxied": false,
        })))
        .respond_with(put_ok())
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config();
    config.a.push("home.example.com".to_string());
    let provider = CloudflareProvider::from_config(&config, false)
        .unwrap()
        .with_base_url(server.uri());

    let (engine, _events) = ReconcileEngine::bootstrap(
        Box::new(provider),
        pool(AddressFamily::V4, "198.51.100.2"),
        &config,
    )
    .await
    .unwrap();

    let report = engine.run_cycle().await;
    assert_eq!(report.updated, vec!["home.example.com"]);
}

#[tokio::test]
async fn identical_value_sends_no_put() {
    let server = MockServer::start().await;
    mount_record(&server, "A", "home.example.com", "rec-a", "198.51.100.2").await;
    Mock::given(method("PUT"))
        .respond_with(put_ok())
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config();
    config.a.push("home.example.com".to_string());
    let provider = CloudflareProvider::from_config(&config, false)
        .unwrap()
        .with_base_url(server.uri());

    let (engine, _events) = ReconcileEngine::bootstrap(
        Box::new(provider),
        pool(AddressFamily::V4, "198.51.100.2"),
        &config,
    )
    .await
    .unwrap();

    let report = engine.run_cycle().await;
    assert_eq!(report.unchanged, vec!["home.example.com"]);
}

#[tokio::test]
async fn subnet_target_is_written_with_synthesized_address() {
    let server = MockServer::start().await;
    mount_record(&server, "AAAA", "host1.example.com", "rec-h", "2001:db8:ffff::10").await;
    Mock::given(method("PUT"))
        .and(path("/zones/zone-1/dns_records/rec-h"))
        .and(body_json(serde_json::json!({
            "type": "AAAA",
            "name": "host1.example.com",
            "content": "2001:db8:abcd::10",
            "ttl": 60,
            "proxied": false,
        })))
        .respond_with(put_ok())
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config();
    config.subnet6 = Some(SubnetConfig {
        prefix: 56,
        targets: vec![SubnetTargetConfig {
            domain: "host1.example.com".to_string(),
            suffix: "::10/64".to_string(),
        }],
    });
    let provider = CloudflareProvider::from_config(&config, false)
        .unwrap()
        .with_base_url(server.uri());

    let (engine, _events) = ReconcileEngine::bootstrap(
        Box::new(provider),
        pool(AddressFamily::V6, "2001:db8:abcd::1"),
        &config,
    )
    .await
    .unwrap();

    let report = engine.run_cycle().await;
    assert_eq!(report.updated, vec!["host1.example.com"]);
}

#[tokio::test]
async fn unknown_record_fails_startup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true, "errors": [], "result": []
        })))
        .expect(5)
        .mount(&server)
        .await;

    let mut config = config();
    config.a.push("missing.example.com".to_string());
    let provider = CloudflareProvider::from_config(&config, false)
        .unwrap()
        .with_base_url(server.uri());

    let result = ReconcileEngine::bootstrap(
        Box::new(provider),
        pool(AddressFamily::V4, "198.51.100.2"),
        &config,
    )
    .await;

    assert!(result.is_err());
}
