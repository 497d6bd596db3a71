use soroban_sdk::contracterror;

/// Error codes shared by every marketplace contract.
///
/// Codes are part of the public interface: append new variants, never
/// renumber existing ones.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    /// Caller is not the owner / admin, or lacks the required capability
    Unauthorized = 3,
    /// Amount is zero, negative, or would overflow
    InvalidAmount = 4,
    /// Address cannot be used as a counterparty (e.g. the custodian itself)
    InvalidAddress = 5,
    EscrowAlreadyExists = 6,
    EscrowNotFound = 7,
    /// Escrow is not in the status the operation requires
    InvalidEscrowStatus = 8,
    /// Token movement could not complete; the whole call is rolled back
    TransferFailed = 9,
    /// Reward is below the registry's configured minimum
    InsufficientReward = 10,
    InvalidDeadline = 11,
    /// Bounty or submission is not in the status the operation requires,
    /// also returned for a zero submission cap
    InvalidStatus = 12,
    EscrowManagerNotSet = 13,
    BountyNotFound = 14,
    MaxSubmissionsReached = 15,
    DeadlineNotPassed = 16,
    BountyNotActive = 17,
    /// Content identifier is empty
    InvalidContentRef = 18,
    SubmissionNotFound = 19,
    DispatcherNotSet = 20,
    /// Verification request arguments are empty
    InvalidArguments = 21,
    /// Callback token is unknown, already consumed, or forged
    UnexpectedRequestToken = 22,
    /// A cross-contract call failed without a marketplace error code
    CrossContractCallFailed = 23,
}
