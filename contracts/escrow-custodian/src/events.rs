use soroban_sdk::{contracttype, symbol_short, Address, Env};

#[contracttype]
#[derive(Clone, Debug)]
pub struct CustodianInitialized {
    pub version: u32,
    pub admin: Address,
    pub token: Address,
    pub timestamp: u64,
}

pub fn emit_custodian_initialized(env: &Env, event: CustodianInitialized) {
    let topics = (symbol_short!("init"),);
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct FundsDeposited {
    pub version: u32,
    pub bounty_id: u64,
    pub depositor: Address,
    pub amount: i128,
    pub timestamp: u64,
}

pub fn emit_funds_deposited(env: &Env, event: FundsDeposited) {
    let topics = (symbol_short!("f_dep"), event.bounty_id);
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct DepositIncreased {
    pub version: u32,
    pub bounty_id: u64,
    pub added: i128,
    /// Escrowed amount after the top-up.
    pub amount: i128,
    pub timestamp: u64,
}

pub fn emit_deposit_increased(env: &Env, event: DepositIncreased) {
    let topics = (symbol_short!("f_topup"), event.bounty_id);
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct FundsReleased {
    pub version: u32,
    pub bounty_id: u64,
    pub amount: i128,
    pub recipient: Address,
    pub timestamp: u64,
}

pub fn emit_funds_released(env: &Env, event: FundsReleased) {
    let topics = (symbol_short!("f_rel"), event.bounty_id);
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct FundsRefunded {
    pub version: u32,
    pub bounty_id: u64,
    pub amount: i128,
    pub refund_to: Address,
    pub timestamp: u64,
}

pub fn emit_funds_refunded(env: &Env, event: FundsRefunded) {
    let topics = (symbol_short!("f_ref"), event.bounty_id);
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct EmergencyWithdrawal {
    pub version: u32,
    pub bounty_id: u64,
    pub admin: Address,
    pub recipient: Address,
    pub amount: i128,
    pub timestamp: u64,
}

pub fn emit_emergency_withdrawal(env: &Env, event: EmergencyWithdrawal) {
    let topics = (symbol_short!("f_emerg"), event.bounty_id);
    env.events().publish(topics, event.clone());
}
