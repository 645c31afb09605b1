pub mod error;

pub use error::{ReaderError, Result};

use std::net::IpAddr;
use std::time::Duration;

use tracing::debug;
use url::{Host, Url};

pub const JINA_READER_URL: &str = "https://r.jina.ai";
pub const MAX_URL_LENGTH: usize = 2048;

/// Text of a page as returned by the reader.
#[derive(Debug, Clone)]
pub struct ReaderPage {
    /// The reader endpoint that produced `text`.
    pub reader_url: String,
    pub text: String,
}

/// Reads web pages as plain text through the Jina reader proxy
/// (`GET <reader>/<target url>`).
pub struct ReaderClient {
    client: reqwest::Client,
    base_url: String,
}

impl ReaderClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Endpoint that proxies `target`.
    pub fn reader_url(&self, target: &Url) -> String {
        format!("{}/{}", self.base_url, target)
    }

    /// Fetch the text content of a public web page.
    pub async fn fetch(&self, url: &str) -> Result<ReaderPage> {
        let target = validate_url(url)?;
        let endpoint = self.reader_url(&target);
        debug!(url = %target, "Fetching page through reader");

        let resp = self.client.get(&endpoint).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ReaderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = resp.text().await?;
        Ok(ReaderPage {
            reader_url: endpoint,
            text,
        })
    }
}

/// Parse a user-supplied URL and reject anything that is not a public
/// http(s) address.
pub fn validate_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ReaderError::InvalidUrl("URL is required".into()));
    }
    if raw.len() > MAX_URL_LENGTH {
        return Err(ReaderError::InvalidUrl(format!(
            "URL too long (max {MAX_URL_LENGTH} characters)"
        )));
    }

    let parsed = Url::parse(raw).map_err(|_| ReaderError::InvalidUrl("Invalid URL".into()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ReaderError::InvalidUrl(
            "URL must use http or https scheme".into(),
        ));
    }

    match parsed.host() {
        None => return Err(ReaderError::InvalidUrl("Invalid URL".into())),
        Some(Host::Ipv4(v4)) if is_private_ip(IpAddr::V4(v4)) => return Err(private_address()),
        Some(Host::Ipv6(v6)) if is_private_ip(IpAddr::V6(v6)) => return Err(private_address()),
        Some(Host::Domain(domain)) => {
            let lower = domain.to_lowercase();
            if lower == "localhost" || lower.ends_with(".local") || lower.ends_with(".internal") {
                return Err(ReaderError::InvalidUrl(
                    "URLs pointing to internal hosts are not allowed".into(),
                ));
            }
        }
        Some(_) => {}
    }

    Ok(parsed)
}

fn private_address() -> ReaderError {
    ReaderError::InvalidUrl("URLs pointing to private/loopback addresses are not allowed".into())
}

/// Loopback, link-local, RFC 1918, unspecified and IPv6 unique-local addresses.
fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_link_local()
                || v4.is_private()
                || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
                || v6.to_ipv4_mapped().is_some_and(|v4| is_private_ip(IpAddr::V4(v4)))
        }
    }
}
