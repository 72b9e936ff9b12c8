// # HTTP Address Sources
//
// This crate provides the HTTP-based address sources for the DDNS system.
//
// ## Sources
//
// - `DirectBodySource`: the endpoint answers with the bare address
//   (e.g. `https://api4.ipify.org/`)
// - `TraceSource`: the endpoint answers with `key=value` lines, one of them
//   `ip=<address>` (e.g. `https://1.1.1.1/cdn-cgi/trace`)
//
// ## Address Families
//
// Each source talks through a client bound to one address family, so a
// dual-stack endpoint reports the address of the family being asked for.
// `FamilyClients` holds one client per family; build it once and share it.

use ddns_core::config::DEFAULT_HTTP_TIMEOUT;
use ddns_core::traits::{AddressFamily, AddressSource};
use ddns_core::{AddressSourcePool, Error, Result};

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::debug;

/// Default IPv4 sources, in trial order
pub const DEFAULT_V4_SOURCES: &[DefaultSource] = &[
    DefaultSource::Trace("cf-ns.com"),
    DefaultSource::Trace("162.159.36.1"),
    DefaultSource::Direct("https://v4.ident.me/"),
    DefaultSource::Trace("1.1.1.1"),
    DefaultSource::Direct("https://api4.ipify.org/"),
];

/// Default IPv6 sources, in trial order
pub const DEFAULT_V6_SOURCES: &[DefaultSource] = &[
    DefaultSource::Trace("cf-ns.com"),
    DefaultSource::Trace("[2606:4700:4700::1111]"),
    DefaultSource::Direct("https://v6.ident.me/"),
    DefaultSource::Trace("[2606:4700:4700::64]"),
    DefaultSource::Direct("https://api6.ipify.org/"),
];

/// One entry of the default source lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultSource {
    /// Trace endpoint on this host
    Trace(&'static str),
    /// Direct endpoint at this URL
    Direct(&'static str),
}

/// One HTTP client per address family
#[derive(Debug, Clone)]
pub struct FamilyClients {
    v4: reqwest::Client,
    v6: reqwest::Client,
}

impl FamilyClients {
    /// Build both clients
    ///
    /// Each client binds its sockets to the unspecified address of its
    /// family, so it can only reach endpoints over that family.
    pub fn new() -> Result<Self> {
        Ok(Self {
            v4: build_client(IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
            v6: build_client(IpAddr::V6(Ipv6Addr::UNSPECIFIED))?,
        })
    }

    /// The client for `family`
    pub fn client(&self, family: AddressFamily) -> &reqwest::Client {
        match family {
            AddressFamily::V4 => &self.v4,
            AddressFamily::V6 => &self.v6,
        }
    }
}

fn build_client(local: IpAddr) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .local_address(local)
        .timeout(DEFAULT_HTTP_TIMEOUT)
        .build()
        .map_err(|e| Error::network(format!("Failed to build HTTP client bound to {}: {}", local, e)))
}

/// Build the default pool: every entry of both default lists
pub fn default_pool(clients: &FamilyClients) -> AddressSourcePool {
    let mut pool = AddressSourcePool::new();

    let lists = [
        (AddressFamily::V4, DEFAULT_V4_SOURCES),
        (AddressFamily::V6, DEFAULT_V6_SOURCES),
    ];
    for (family, list) in lists {
        let client = clients.client(family);
        for entry in list {
            let source: Box<dyn AddressSource> = match *entry {
                DefaultSource::Trace(host) => Box::new(TraceSource::cloudflare(host, family, client.clone())),
                DefaultSource::Direct(url) => Box::new(DirectBodySource::new(url, family, client.clone())),
            };
            pool.push(source);
        }
    }

    pool
}

/// Source whose endpoint answers with the bare address
pub struct DirectBodySource {
    url: String,
    family: AddressFamily,
    client: reqwest::Client,
}

impl DirectBodySource {
    /// Create a direct source
    ///
    /// `client` should be the one of `family` from [`FamilyClients`].
    pub fn new(url: impl Into<String>, family: AddressFamily, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            family,
            client,
        }
    }
}

impl fmt::Display for DirectBodySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<direct source; endpoint={}, family={}>", self.url, self.family)
    }
}

#[async_trait::async_trait]
impl AddressSource for DirectBodySource {
    async fn fetch(&self) -> Result<String> {
        let body = fetch_body(&self.client, &self.url).await?;
        let address = body.trim();

        check_family(address, self.family)?;
        Ok(address.to_string())
    }

    fn family(&self) -> AddressFamily {
        self.family
    }
}

/// Source whose endpoint answers with `key=value` lines including `ip=`
pub struct TraceSource {
    url: String,
    family: AddressFamily,
    client: reqwest::Client,
}

impl TraceSource {
    /// Create a trace source for a full URL
    pub fn new(url: impl Into<String>, family: AddressFamily, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            family,
            client,
        }
    }

    /// Create a trace source for `https://<host>/cdn-cgi/trace`
    pub fn cloudflare(host: &str, family: AddressFamily, client: reqwest::Client) -> Self {
        Self::new(format!("https://{}/cdn-cgi/trace", host), family, client)
    }
}

impl fmt::Display for TraceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<trace source; endpoint={}, family={}>", self.url, self.family)
    }
}

#[async_trait::async_trait]
impl AddressSource for TraceSource {
    async fn fetch(&self) -> Result<String> {
        let body = fetch_body(&self.client, &self.url).await?;
        let address = parse_trace(&body)
            .ok_or_else(|| Error::parse(format!("no 'ip' field in trace from {}", self.url)))?;

        check_family(address, self.family)?;
        Ok(address.to_string())
    }

    fn family(&self) -> AddressFamily {
        self.family
    }
}

/// Extract the `ip` field of a trace body
pub fn parse_trace(body: &str) -> Option<&str> {
    body.lines()
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| key.trim() == "ip")
        .map(|(_, value)| value.trim())
}

/// GET `url` and return the body of a successful response
async fn fetch_body(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::network(format!("Request to {} failed: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(Error::network(format!("{} answered HTTP {}", url, response.status())));
    }

    let body = response
        .text()
        .await
        .map_err(|e| Error::network(format!("Failed to read response from {}: {}", url, e)))?;

    debug!("{} answered {} bytes", url, body.len());
    Ok(body)
}

/// Reject text that is not an address of `family`
fn check_family(text: &str, family: AddressFamily) -> Result<()> {
    let ip: IpAddr = text
        .parse()
        .map_err(|_| Error::parse(format!("Invalid IP address: '{}'", text)))?;

    let actual = AddressFamily::of(&ip);
    if actual != family {
        return Err(Error::parse(format!("Expected {} address, got {} address {}", family, actual, ip)));
    }

    Ok(())
}
