use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Env, String, Symbol};

#[contracttype]
#[derive(Clone, Debug)]
pub struct CoordinatorInitialized {
    pub version: u32,
    pub admin: Address,
    pub registry: Address,
    pub escrow: Address,
    pub timestamp: u64,
}

pub fn emit_coordinator_initialized(env: &Env, event: CoordinatorInitialized) {
    let topics = (symbol_short!("init"),);
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct CollaboratorWired {
    pub version: u32,
    /// `registry`, `escrow` or `dispatch`
    pub role: Symbol,
    pub address: Address,
    pub timestamp: u64,
}

pub fn emit_collaborator_wired(env: &Env, event: CollaboratorWired) {
    let topics = (symbol_short!("wired"), event.role.clone());
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct SubmissionReceived {
    pub version: u32,
    pub submission_id: u64,
    pub bounty_id: u64,
    pub contributor: Address,
    pub data_ref: String,
    pub request_token: BytesN<32>,
    pub timestamp: u64,
}

pub fn emit_submission_received(env: &Env, event: SubmissionReceived) {
    let topics = (symbol_short!("s_submit"), event.bounty_id);
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct SubmissionResolved {
    pub version: u32,
    pub submission_id: u64,
    pub bounty_id: u64,
    pub contributor: Address,
    pub verified: bool,
    /// Positive verdict that arrived after the bounty left Active.
    pub late: bool,
    /// Reward released to the contributor; zero unless verified.
    pub paid: i128,
    pub timestamp: u64,
}

pub fn emit_submission_resolved(env: &Env, event: SubmissionResolved) {
    let topics = (symbol_short!("s_resolve"), event.bounty_id);
    env.events().publish(topics, event.clone());
}
