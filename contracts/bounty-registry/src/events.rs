use soroban_sdk::{contracttype, symbol_short, Address, Env, String};

#[contracttype]
#[derive(Clone, Debug)]
pub struct RegistryInitialized {
    pub version: u32,
    pub admin: Address,
    pub min_reward: i128,
    pub timestamp: u64,
}

pub fn emit_registry_initialized(env: &Env, event: RegistryInitialized) {
    let topics = (symbol_short!("init"),);
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct EscrowWired {
    pub version: u32,
    pub escrow: Address,
    pub timestamp: u64,
}

pub fn emit_escrow_wired(env: &Env, event: EscrowWired) {
    let topics = (symbol_short!("escrow"),);
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct MinRewardUpdated {
    pub version: u32,
    pub old_min_reward: i128,
    pub new_min_reward: i128,
    pub timestamp: u64,
}

pub fn emit_min_reward_updated(env: &Env, event: MinRewardUpdated) {
    let topics = (symbol_short!("min_rwd"),);
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct BountyCreated {
    pub version: u32,
    pub bounty_id: u64,
    pub owner: Address,
    pub reward_amount: i128,
    pub deadline: u64,
    pub max_submissions: u32,
    pub schema_ref: String,
    pub timestamp: u64,
}

pub fn emit_bounty_created(env: &Env, event: BountyCreated) {
    let topics = (symbol_short!("b_create"), event.bounty_id);
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct BountyCancelled {
    pub version: u32,
    pub bounty_id: u64,
    pub owner: Address,
    pub refunded: i128,
    pub timestamp: u64,
}

pub fn emit_bounty_cancelled(env: &Env, event: BountyCancelled) {
    let topics = (symbol_short!("b_cancel"), event.bounty_id);
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct BountyExpired {
    pub version: u32,
    pub bounty_id: u64,
    pub refunded: i128,
    pub timestamp: u64,
}

pub fn emit_bounty_expired(env: &Env, event: BountyExpired) {
    let topics = (symbol_short!("b_expire"), event.bounty_id);
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct RewardIncreased {
    pub version: u32,
    pub bounty_id: u64,
    pub added: i128,
    pub reward_amount: i128,
    pub timestamp: u64,
}

pub fn emit_reward_increased(env: &Env, event: RewardIncreased) {
    let topics = (symbol_short!("b_reward"), event.bounty_id);
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct DeadlineExtended {
    pub version: u32,
    pub bounty_id: u64,
    pub old_deadline: u64,
    pub new_deadline: u64,
    pub timestamp: u64,
}

pub fn emit_deadline_extended(env: &Env, event: DeadlineExtended) {
    let topics = (symbol_short!("b_extend"), event.bounty_id);
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct SubmissionCounted {
    pub version: u32,
    pub bounty_id: u64,
    pub submission_count: u32,
    pub max_submissions: u32,
    pub timestamp: u64,
}

pub fn emit_submission_counted(env: &Env, event: SubmissionCounted) {
    let topics = (symbol_short!("b_count"), event.bounty_id);
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct BountyCompleted {
    pub version: u32,
    pub bounty_id: u64,
    pub winner: Address,
    pub data_ref: String,
    pub timestamp: u64,
}

pub fn emit_bounty_completed(env: &Env, event: BountyCompleted) {
    let topics = (symbol_short!("b_done"), event.bounty_id);
    env.events().publish(topics, event.clone());
}
