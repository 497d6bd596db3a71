use serde::Serialize;
use tokio::time::{timeout, Instant};
use tracing::{info, instrument, warn};

use crate::config::VerifierConfig;
use crate::error::{VerifyError, VerifyResult};
use crate::fetch::{ContentFetcher, FetchSession};
use crate::schema::SchemaValidator;

/// Binary outcome handed back to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Verified,
    Rejected,
}

impl Verdict {
    pub fn is_verified(self) -> bool {
        self == Verdict::Verified
    }

    /// 32-byte big-endian unsigned word: 1 for verified, 0 for rejected.
    pub fn encode(self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[31] = self.is_verified() as u8;
        word
    }
}

/// Fetches a schema and a data document and checks one against the other,
/// under the configured ceilings. Every failure is a rejection.
pub struct Verifier<F: ContentFetcher> {
    fetcher: F,
    config: VerifierConfig,
    validator: SchemaValidator,
}

impl<F: ContentFetcher> Verifier<F> {
    pub fn new(fetcher: F, config: VerifierConfig) -> Self {
        let validator = SchemaValidator::new(config.limits.max_depth);
        Self {
            fetcher,
            config,
            validator,
        }
    }

    /// Run the routine and fold any failure into [`Verdict::Rejected`].
    pub async fn verify(
        &self,
        data_cid: &str,
        schema_cid: &str,
        gateway_override: Option<&str>,
    ) -> Verdict {
        match self.evaluate(data_cid, schema_cid, gateway_override).await {
            Ok(()) => Verdict::Verified,
            Err(_) => Verdict::Rejected,
        }
    }

    /// Run the routine and keep the reason for a rejection.
    ///
    /// The total ceiling covers both fetches and schema validation.
    #[instrument(skip(self))]
    pub async fn evaluate(
        &self,
        data_cid: &str,
        schema_cid: &str,
        gateway_override: Option<&str>,
    ) -> VerifyResult<()> {
        let total = self.config.limits.total_timeout;
        let deadline = Instant::now() + total;
        let outcome = match timeout(
            total,
            self.run(data_cid, schema_cid, gateway_override, deadline),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(VerifyError::TotalTimeout),
        };

        match &outcome {
            Ok(()) => info!("verified"),
            Err(err) if err.is_violation() => info!(reason = %err, "rejected"),
            Err(err) => warn!(reason = %err, "rejected"),
        }
        outcome
    }

    async fn run(
        &self,
        data_cid: &str,
        schema_cid: &str,
        gateway_override: Option<&str>,
        deadline: Instant,
    ) -> VerifyResult<()> {
        let mut session = FetchSession::new(
            &self.fetcher,
            &self.config.gateways,
            gateway_override,
            &self.config.limits,
        );

        // Schema first: an unreachable schema can never produce acceptance.
        let schema = session.fetch_json(schema_cid).await?;
        let data = session.fetch_json(data_cid).await?;
        self.validator.validate_until(&schema, &data, deadline)
    }
}
