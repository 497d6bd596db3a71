use soroban_sdk::{contracttype, symbol_short, Address, Bytes, BytesN, Env, String, Symbol, Vec};

use crate::OracleConfig;

#[contracttype]
#[derive(Clone, Debug)]
pub struct DispatcherInitialized {
    pub version: u32,
    pub admin: Address,
    pub coordinator: Address,
    pub timestamp: u64,
}

pub fn emit_dispatcher_initialized(env: &Env, event: DispatcherInitialized) {
    let topics = (symbol_short!("init"),);
    env.events().publish(topics, event.clone());
}

/// Everything the oracle network needs to run the routine for one request.
#[contracttype]
#[derive(Clone, Debug)]
pub struct VerificationRequested {
    pub version: u32,
    pub token: BytesN<32>,
    pub submission_id: u64,
    pub source: String,
    pub config: OracleConfig,
    /// `[data_ref, schema_ref]`
    pub args: Vec<String>,
    pub timestamp: u64,
}

pub fn emit_verification_requested(env: &Env, event: VerificationRequested) {
    let topics = (symbol_short!("v_req"), event.submission_id);
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct VerificationFulfilled {
    pub version: u32,
    pub token: BytesN<32>,
    pub submission_id: u64,
    pub verified: bool,
    pub response: Bytes,
    pub error: Bytes,
    pub timestamp: u64,
}

pub fn emit_verification_fulfilled(env: &Env, event: VerificationFulfilled) {
    let topics = (symbol_short!("v_done"), event.submission_id);
    env.events().publish(topics, event.clone());
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct DispatcherConfigUpdated {
    pub version: u32,
    /// `source`, `config` or `coord`
    pub field: Symbol,
    pub timestamp: u64,
}

pub fn emit_config_updated(env: &Env, event: DispatcherConfigUpdated) {
    let topics = (symbol_short!("cfg"), event.field.clone());
    env.events().publish(topics, event.clone());
}
