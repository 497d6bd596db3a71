//! Bounded content retrieval with gateway fallback.

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::{normalize_gateway, Limits};
use crate::error::{VerifyError, VerifyResult};

const MAX_CID_LEN: usize = 128;

/// Retrieves raw bytes for a fully-formed URL.
///
/// Implementations should stop reading once `max_bytes` is exceeded; the
/// caller re-checks the length regardless.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str, max_bytes: usize) -> VerifyResult<Vec<u8>>;
}

/// `reqwest`-backed fetcher that streams the body and aborts early when it
/// grows past the limit.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> VerifyResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("data-verifier/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, max_bytes: usize) -> VerifyResult<Vec<u8>> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if let Some(len) = response.content_length() {
            if len > max_bytes as u64 {
                return Err(VerifyError::ResponseTooLarge { limit: max_bytes });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > max_bytes {
                return Err(VerifyError::ResponseTooLarge { limit: max_bytes });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

/// Content identifiers are plain alphanumeric (CIDv0/v1 base58/base32), so
/// nothing can escape the gateway path.
pub fn validate_cid(cid: &str) -> VerifyResult<()> {
    let well_formed = !cid.is_empty()
        && cid.len() <= MAX_CID_LEN
        && cid.chars().all(|c| c.is_ascii_alphanumeric());
    if !well_formed {
        return Err(VerifyError::InvalidContentId(cid.to_string()));
    }
    Ok(())
}

/// One verification run's view of the network: an ordered gateway list and
/// a fetch budget shared by every document the run retrieves.
pub struct FetchSession<'a, F: ContentFetcher + ?Sized> {
    fetcher: &'a F,
    gateways: Vec<String>,
    limits: &'a Limits,
    fetches: usize,
}

impl<'a, F: ContentFetcher + ?Sized> FetchSession<'a, F> {
    /// `gateway_override`, when given, is tried before the configured list.
    pub fn new(
        fetcher: &'a F,
        configured: &[String],
        gateway_override: Option<&str>,
        limits: &'a Limits,
    ) -> Self {
        let mut gateways: Vec<String> = Vec::with_capacity(configured.len() + 1);
        for gateway in gateway_override
            .into_iter()
            .chain(configured.iter().map(String::as_str))
            .map(normalize_gateway)
        {
            if !gateways.contains(&gateway) {
                gateways.push(gateway);
            }
        }
        Self {
            fetcher,
            gateways,
            limits,
            fetches: 0,
        }
    }

    pub fn gateways(&self) -> &[String] {
        &self.gateways
    }

    pub fn fetches_used(&self) -> usize {
        self.fetches
    }

    /// Fetch `cid` and parse it as JSON, falling through the gateway list.
    ///
    /// A gateway that errors, times out, returns an oversized body or a body
    /// that is not JSON counts as failed. Fails once every gateway failed or
    /// the fetch budget ran out.
    pub async fn fetch_json(&mut self, cid: &str) -> VerifyResult<Value> {
        validate_cid(cid)?;

        let mut attempts = 0;
        for gateway in self.gateways.clone() {
            if self.fetches >= self.limits.max_fetches {
                warn!(cid, budget = self.limits.max_fetches, "fetch budget exhausted");
                return Err(VerifyError::FetchBudgetExhausted(self.limits.max_fetches));
            }
            self.fetches += 1;
            attempts += 1;

            let url = format!("{gateway}{cid}");
            match self.fetch_once(&url).await {
                Ok(value) => {
                    debug!(%url, "fetched");
                    return Ok(value);
                }
                Err(err) => warn!(%url, error = %err, "gateway failed, trying next"),
            }
        }

        Err(VerifyError::AllGatewaysFailed {
            cid: cid.to_string(),
            attempts,
        })
    }

    async fn fetch_once(&self, url: &str) -> VerifyResult<Value> {
        let max_bytes = self.limits.max_response_bytes;
        let body = timeout(self.limits.fetch_timeout, self.fetcher.fetch(url, max_bytes))
            .await
            .map_err(|_| VerifyError::FetchTimeout(url.to_string()))??;
        if body.len() > max_bytes {
            return Err(VerifyError::ResponseTooLarge { limit: max_bytes });
        }
        serde_json::from_slice(&body).map_err(|e| VerifyError::InvalidJson(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverFetcher;

    #[async_trait]
    impl ContentFetcher for NeverFetcher {
        async fn fetch(&self, _url: &str, _max_bytes: usize) -> VerifyResult<Vec<u8>> {
            Err(VerifyError::Transport("offline".into()))
        }
    }

    #[test]
    fn test_validate_cid() {
        assert!(validate_cid("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG").is_ok());
        let v1 = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";
        assert!(validate_cid(v1).is_ok());
        assert!(validate_cid("").is_err());
        assert!(validate_cid("../etc/passwd").is_err());
        assert!(validate_cid("Qm?x=1").is_err());
        assert!(validate_cid(&"a".repeat(MAX_CID_LEN + 1)).is_err());
    }

    #[test]
    fn test_override_goes_first_without_duplicates() {
        let limits = Limits::default();
        let configured = vec![
            "https://a.example/ipfs/".to_string(),
            "https://b.example/ipfs/".to_string(),
        ];
        let session = FetchSession::new(
            &NeverFetcher,
            &configured,
            Some("https://b.example/ipfs"),
            &limits,
        );
        assert_eq!(
            session.gateways(),
            &[
                "https://b.example/ipfs/".to_string(),
                "https://a.example/ipfs/".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_cid_costs_no_fetch() {
        let limits = Limits::default();
        let configured = vec!["https://a.example/ipfs/".to_string()];
        let mut session = FetchSession::new(&NeverFetcher, &configured, None, &limits);
        let err = session.fetch_json("bad/cid").await.unwrap_err();
        assert!(matches!(err, VerifyError::InvalidContentId(_)));
        assert_eq!(session.fetches_used(), 0);
    }
}
