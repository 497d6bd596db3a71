//! Data verification routine
//!
//! Runs inside the oracle network's sandbox on behalf of the verification
//! dispatcher contract:
//!
//! 1. fetch the bounty's schema by content identifier, falling through an
//!    ordered gateway list,
//! 2. fetch the submitted data the same way,
//! 3. validate the data against the schema.
//!
//! Every step is bounded (total wall-clock, per-fetch timeout, fetch count,
//! response size, schema depth) and fails closed: anything short of a clean
//! pass is [`Verdict::Rejected`]. [`Verdict::encode`] produces the 32-byte
//! response word the dispatcher decodes.

pub mod config;
pub mod error;
pub mod fetch;
pub mod routine;
pub mod schema;

pub use config::{Limits, VerifierConfig, DEFAULT_GATEWAYS};
pub use error::{VerifyError, VerifyResult};
pub use fetch::{ContentFetcher, FetchSession, HttpFetcher};
pub use routine::{Verdict, Verifier};
pub use schema::SchemaValidator;
