use async_trait::async_trait;
use data_verifier::{
    ContentFetcher, Limits, Verdict, Verifier, VerifierConfig, VerifyError, VerifyResult,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const GATEWAY_A: &str = "https://a.example/ipfs/";
const GATEWAY_B: &str = "https://b.example/ipfs/";
const SCHEMA_CID: &str = "bafyschema";
const DATA_CID: &str = "bafydata";

/// In-memory gateway network. URLs missing from the map fail; URLs listed
/// in `slow` sleep before answering.
#[derive(Default, Clone)]
struct MapFetcher {
    bodies: HashMap<String, Vec<u8>>,
    slow: HashMap<String, Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MapFetcher {
    fn serve(mut self, gateway: &str, cid: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(format!("{gateway}{cid}"), body.into());
        self
    }

    fn delay(mut self, gateway: &str, cid: &str, delay: Duration) -> Self {
        self.slow.insert(format!("{gateway}{cid}"), delay);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentFetcher for MapFetcher {
    async fn fetch(&self, url: &str, _max_bytes: usize) -> VerifyResult<Vec<u8>> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.slow.get(url) {
            tokio::time::sleep(*delay).await;
        }
        self.bodies.get(url).cloned().ok_or_else(|| VerifyError::Http {
            url: url.to_string(),
            status: 404,
        })
    }
}

fn config(gateways: &[&str]) -> VerifierConfig {
    VerifierConfig {
        gateways: gateways.iter().map(|g| g.to_string()).collect(),
        limits: Limits::default(),
    }
}

fn schema() -> Vec<u8> {
    json!({
        "type": "object",
        "required": ["species", "diameter_cm"],
        "properties": {
            "species": { "type": "string", "minLength": 1 },
            "diameter_cm": { "type": "number", "minimum": 0 }
        }
    })
    .to_string()
    .into_bytes()
}

fn good_data() -> Vec<u8> {
    json!({ "species": "Quercus robur", "diameter_cm": 41.5 })
        .to_string()
        .into_bytes()
}

#[tokio::test]
async fn test_conforming_submission_is_verified() {
    let fetcher = MapFetcher::default()
        .serve(GATEWAY_A, SCHEMA_CID, schema())
        .serve(GATEWAY_A, DATA_CID, good_data());
    let verifier = Verifier::new(fetcher.clone(), config(&[GATEWAY_A]));

    let verdict = verifier.verify(DATA_CID, SCHEMA_CID, None).await;
    assert_eq!(verdict, Verdict::Verified);
    // Schema is fetched before the data.
    assert_eq!(
        fetcher.calls(),
        vec![format!("{GATEWAY_A}{SCHEMA_CID}"), format!("{GATEWAY_A}{DATA_CID}")]
    );
}

#[tokio::test]
async fn test_violating_submission_is_rejected() {
    let bad = json!({ "species": "", "diameter_cm": 41.5 }).to_string();
    let fetcher = MapFetcher::default()
        .serve(GATEWAY_A, SCHEMA_CID, schema())
        .serve(GATEWAY_A, DATA_CID, bad);
    let verifier = Verifier::new(fetcher, config(&[GATEWAY_A]));

    let err = verifier.evaluate(DATA_CID, SCHEMA_CID, None).await.unwrap_err();
    assert!(err.is_violation());
    assert_eq!(verifier.verify(DATA_CID, SCHEMA_CID, None).await, Verdict::Rejected);
}

#[tokio::test]
async fn test_unreachable_schema_rejects_without_fetching_data() {
    let fetcher = MapFetcher::default().serve(GATEWAY_A, DATA_CID, good_data());
    let verifier = Verifier::new(fetcher.clone(), config(&[GATEWAY_A, GATEWAY_B]));

    let err = verifier.evaluate(DATA_CID, SCHEMA_CID, None).await.unwrap_err();
    assert!(matches!(err, VerifyError::AllGatewaysFailed { attempts: 2, .. }));
    assert!(fetcher.calls().iter().all(|url| url.ends_with(SCHEMA_CID)));
}

#[tokio::test]
async fn test_falls_through_to_next_gateway() {
    let fetcher = MapFetcher::default()
        .serve(GATEWAY_B, SCHEMA_CID, schema())
        .serve(GATEWAY_A, DATA_CID, good_data());
    let verifier = Verifier::new(fetcher.clone(), config(&[GATEWAY_A, GATEWAY_B]));

    assert_eq!(verifier.verify(DATA_CID, SCHEMA_CID, None).await, Verdict::Verified);
    assert_eq!(fetcher.calls().len(), 3);
}

#[tokio::test]
async fn test_gateway_override_is_tried_first() {
    let custom = "https://sponsor.example/ipfs/";
    let fetcher = MapFetcher::default()
        .serve(custom, SCHEMA_CID, schema())
        .serve(custom, DATA_CID, good_data());
    let verifier = Verifier::new(fetcher.clone(), config(&[GATEWAY_A]));

    assert_eq!(
        verifier.verify(DATA_CID, SCHEMA_CID, Some(custom)).await,
        Verdict::Verified
    );
    assert!(fetcher.calls().iter().all(|url| url.starts_with(custom)));
}

#[tokio::test]
async fn test_fetch_budget_is_shared_across_documents() {
    let fetcher = MapFetcher::default()
        .serve(GATEWAY_B, SCHEMA_CID, schema())
        .serve(GATEWAY_B, DATA_CID, good_data());
    let mut config = config(&[GATEWAY_A, GATEWAY_B]);
    config.limits.max_fetches = 3;
    let verifier = Verifier::new(fetcher.clone(), config);

    // Schema costs two fetches, data would need two more.
    let err = verifier.evaluate(DATA_CID, SCHEMA_CID, None).await.unwrap_err();
    assert!(matches!(err, VerifyError::FetchBudgetExhausted(3)));
    assert_eq!(fetcher.calls().len(), 3);
}

#[tokio::test]
async fn test_oversized_body_is_a_failed_fetch() {
    let mut big = b"{\"species\":\"".to_vec();
    big.extend(std::iter::repeat(b'x').take(4096));
    big.extend_from_slice(b"\",\"diameter_cm\":1}");

    let fetcher = MapFetcher::default()
        .serve(GATEWAY_A, SCHEMA_CID, schema())
        .serve(GATEWAY_A, DATA_CID, big);
    let mut config = config(&[GATEWAY_A]);
    config.limits.max_response_bytes = 1024;
    let verifier = Verifier::new(fetcher, config);

    assert_eq!(verifier.verify(DATA_CID, SCHEMA_CID, None).await, Verdict::Rejected);
}

#[tokio::test]
async fn test_non_json_body_falls_through() {
    let fetcher = MapFetcher::default()
        .serve(GATEWAY_A, SCHEMA_CID, "<html>gateway error</html>")
        .serve(GATEWAY_B, SCHEMA_CID, schema())
        .serve(GATEWAY_A, DATA_CID, good_data());
    let verifier = Verifier::new(fetcher, config(&[GATEWAY_A, GATEWAY_B]));
    assert_eq!(verifier.verify(DATA_CID, SCHEMA_CID, None).await, Verdict::Verified);

    let garbage = MapFetcher::default()
        .serve(GATEWAY_A, SCHEMA_CID, schema())
        .serve(GATEWAY_A, DATA_CID, "not json");
    let verifier = Verifier::new(garbage, config(&[GATEWAY_A]));
    assert_eq!(verifier.verify(DATA_CID, SCHEMA_CID, None).await, Verdict::Rejected);
}

#[tokio::test]
async fn test_malformed_content_id_is_rejected() {
    let fetcher = MapFetcher::default().serve(GATEWAY_A, SCHEMA_CID, schema());
    let verifier = Verifier::new(fetcher.clone(), config(&[GATEWAY_A]));

    let err = verifier
        .evaluate(DATA_CID, "bafy/../../secret", None)
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::InvalidContentId(_)));
    assert!(fetcher.calls().is_empty());

    let err = verifier
        .evaluate("../../etc/passwd", SCHEMA_CID, None)
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::InvalidContentId(_)));
    // Only the schema was requested.
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_gateway_times_out_and_next_is_used() {
    let fetcher = MapFetcher::default()
        .serve(GATEWAY_A, SCHEMA_CID, schema())
        .delay(GATEWAY_A, SCHEMA_CID, Duration::from_secs(30))
        .serve(GATEWAY_B, SCHEMA_CID, schema())
        .serve(GATEWAY_A, DATA_CID, good_data());
    let verifier = Verifier::new(fetcher.clone(), config(&[GATEWAY_A, GATEWAY_B]));

    assert_eq!(verifier.verify(DATA_CID, SCHEMA_CID, None).await, Verdict::Verified);
    assert_eq!(fetcher.calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_total_budget_is_enforced() {
    let fetcher = MapFetcher::default()
        .serve(GATEWAY_A, SCHEMA_CID, schema())
        .delay(GATEWAY_A, SCHEMA_CID, Duration::from_secs(2))
        .serve(GATEWAY_A, DATA_CID, good_data())
        .delay(GATEWAY_A, DATA_CID, Duration::from_secs(2));
    let mut config = config(&[GATEWAY_A]);
    config.limits.total_timeout = Duration::from_secs(3);
    let verifier = Verifier::new(fetcher, config);

    let err = verifier.evaluate(DATA_CID, SCHEMA_CID, None).await.unwrap_err();
    assert!(matches!(err, VerifyError::TotalTimeout));
}

#[tokio::test(start_paused = true)]
async fn test_documents_arriving_at_the_ceiling_are_not_validated() {
    let fetcher = MapFetcher::default()
        .serve(GATEWAY_A, SCHEMA_CID, schema())
        .delay(GATEWAY_A, SCHEMA_CID, Duration::from_secs(1))
        .serve(GATEWAY_A, DATA_CID, good_data())
        .delay(GATEWAY_A, DATA_CID, Duration::from_secs(2));
    let mut config = config(&[GATEWAY_A]);
    config.limits.total_timeout = Duration::from_secs(3);
    let verifier = Verifier::new(fetcher.clone(), config);

    // Both fetches succeed, but the budget is spent once the data lands.
    let err = verifier.evaluate(DATA_CID, SCHEMA_CID, None).await.unwrap_err();
    assert!(matches!(err, VerifyError::TotalTimeout));
    assert_eq!(fetcher.calls().len(), 2);
}

#[test]
fn test_verdict_encoding() {
    let verified = Verdict::Verified.encode();
    assert_eq!(verified[31], 1);
    assert!(verified[..31].iter().all(|b| *b == 0));
    assert_eq!(Verdict::Rejected.encode(), [0u8; 32]);
}
