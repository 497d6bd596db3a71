use soroban_sdk::{contracttype, Address, Bytes, BytesN, String};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BountyStatus {
    Draft,
    Active,
    Completed,
    Cancelled,
    Expired,
}

impl BountyStatus {
    /// Completed, Cancelled and Expired never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BountyStatus::Completed | BountyStatus::Cancelled | BountyStatus::Expired
        )
    }
}

/// A sponsor's funded request for data meeting a published schema.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bounty {
    pub id: u64,
    pub owner: Address,
    pub title: String,
    pub description: String,
    /// Content identifier of the validation schema.
    pub schema_ref: String,
    pub reward_amount: i128,
    pub deadline: u64,
    pub status: BountyStatus,
    pub max_submissions: u32,
    pub submission_count: u32,
    pub created_at: u64,
    pub winner: Option<Address>,
    pub winning_data_ref: Option<String>,
    /// Set when the bounty reaches a terminal status.
    pub closed_at: Option<u64>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EscrowStatus {
    None,
    Funded,
    Released,
    Refunded,
}

/// Custodial balance backing a single bounty's reward.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Escrow {
    pub bounty_id: u64,
    pub depositor: Address,
    /// Amount currently held. Zero once settled.
    pub amount: i128,
    /// Sum of the initial deposit and every top-up.
    pub total_deposited: i128,
    pub status: EscrowStatus,
    pub created_at: u64,
    pub settled_at: Option<u64>,
    pub settled_to: Option<Address>,
}

/// Running totals kept by the custodian.
///
/// Conservation: `total_deposited == total_released + total_refunded + total_funded`.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CustodianStats {
    pub total_deposited: i128,
    pub total_released: i128,
    pub total_refunded: i128,
    pub total_funded: i128,
    pub count_funded: u32,
    pub count_released: u32,
    pub count_refunded: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubmissionStatus {
    Pending,
    Verifying,
    Verified,
    Rejected,
}

/// A contributor's claim against a bounty, referencing externally stored content.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Submission {
    pub id: u64,
    pub bounty_id: u64,
    pub contributor: Address,
    pub data_ref: String,
    pub metadata: String,
    pub status: SubmissionStatus,
    pub submitted_at: u64,
    pub verified_at: Option<u64>,
    /// Token returned by the dispatcher for the outstanding verification.
    /// All zero until the request is filed.
    pub request_token: BytesN<32>,
    /// Raw oracle response (or error) delivered with the verdict.
    pub aux_data: Bytes,
}
