//! # Marketplace Core
//!
//! Shared building blocks for the verified data bounty contracts.
//!
//! ```text
//!   BountyRegistry ──deposit/refund──────────────► EscrowCustodian
//!        ▲                                             ▲
//!        │ increment/complete                          │ release
//!        │                                             │
//!   SubmissionCoordinator ──request_verification──► VerificationDispatcher
//!        ▲                                             │
//!        └──────────── handle_verification_result ─────┘
//! ```
//!
//! Every contract in the workspace links this crate for:
//!
//! - the shared [`Error`] codes (stable across contracts, so indexers can
//!   decode a failure regardless of which contract raised it),
//! - the record types that cross contract boundaries ([`Bounty`],
//!   [`Escrow`], [`Submission`]),
//! - the capability table ([`access`]) guarding privileged entry points,
//! - the reentrancy guard,
//! - `#[contractclient]` interfaces used for cross-contract calls, so no
//!   contract crate has to link another contract crate into its WASM.

#![no_std]

pub mod access;
mod error;
pub mod interfaces;
pub mod reentrancy_guard;
mod types;

pub use access::Capability;
pub use error::Error;
pub use types::{
    Bounty, BountyStatus, CustodianStats, Escrow, EscrowStatus, Submission, SubmissionStatus,
};

/// Version stamped on every event payload published by the marketplace contracts.
pub const EVENT_VERSION_V1: u32 = 1;

#[cfg(test)]
mod test;
