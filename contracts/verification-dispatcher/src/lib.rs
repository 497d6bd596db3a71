//! # Verification Dispatcher
//!
//! Mailbox between the submission coordinator and the oracle network.
//!
//! `request_verification` publishes a request event carrying the routine
//! source, the oracle configuration and `[data_ref, schema_ref]`, and files
//! the request under a fresh 32-byte token. The oracle router answers through
//! `on_callback`; the token is consumed exactly once and the decoded verdict
//! is forwarded to the coordinator.
//!
//! A verdict is positive only when the oracle reported no error and the
//! response is a big-endian unsigned integer equal to one (the encoding the
//! `data-verifier` routine emits).

#![no_std]

mod events;

use events::{
    emit_config_updated, emit_dispatcher_initialized, emit_verification_fulfilled,
    emit_verification_requested, DispatcherConfigUpdated, DispatcherInitialized,
    VerificationFulfilled, VerificationRequested,
};
use marketplace_core::{
    access,
    interfaces::{settle, CoordinatorClient},
    reentrancy_guard, Capability, Error, EVENT_VERSION_V1,
};
use soroban_sdk::{
    contract, contractimpl, contracttype, symbol_short, vec, Address, Bytes, BytesN, Env, String,
    Symbol,
};

/// Oracle subscription parameters, passed through to the request event.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OracleConfig {
    pub subscription_id: u64,
    pub callback_gas_limit: u32,
    pub don_id: BytesN<32>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingRequest {
    pub submission_id: u64,
    pub data_ref: String,
    pub schema_ref: String,
    pub requested_at: u64,
}

/// Most recent oracle answer, kept for inspection.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Fulfillment {
    pub token: BytesN<32>,
    pub submission_id: u64,
    pub verified: bool,
    pub response: Bytes,
    pub error: Bytes,
    pub at: u64,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Coordinator,
    Source,
    Config,
    Nonce,
    PendingCount,
    LastFulfillment,
    Request(BytesN<32>),
}

#[contract]
pub struct VerificationDispatcherContract;

#[contractimpl]
impl VerificationDispatcherContract {
    pub fn init(
        env: Env,
        admin: Address,
        coordinator: Address,
        source: String,
        config: OracleConfig,
    ) -> Result<(), Error> {
        access::init_admin(&env, &admin)?;
        let storage = env.storage().instance();
        storage.set(&DataKey::Coordinator, &coordinator);
        storage.set(&DataKey::Source, &source);
        storage.set(&DataKey::Config, &config);
        storage.set(&DataKey::Nonce, &0u64);
        storage.set(&DataKey::PendingCount, &0u32);

        emit_dispatcher_initialized(
            &env,
            DispatcherInitialized {
                version: EVENT_VERSION_V1,
                admin,
                coordinator,
                timestamp: env.ledger().timestamp(),
            },
        );
        Ok(())
    }

    pub fn grant_capability(
        env: Env,
        principal: Address,
        capability: Capability,
    ) -> Result<(), Error> {
        access::grant(&env, &principal, capability)
    }

    pub fn revoke_capability(
        env: Env,
        principal: Address,
        capability: Capability,
    ) -> Result<(), Error> {
        access::revoke(&env, &principal, capability)
    }

    pub fn has_capability(env: Env, principal: Address, capability: Capability) -> bool {
        access::has_capability(&env, &principal, capability)
    }

    /// File a verification request and return its token.
    pub fn request_verification(
        env: Env,
        caller: Address,
        submission_id: u64,
        data_ref: String,
        schema_ref: String,
    ) -> Result<BytesN<32>, Error> {
        access::require_capability(&env, &caller, Capability::RequestVerification)?;
        if data_ref.is_empty() || schema_ref.is_empty() {
            return Err(Error::InvalidArguments);
        }

        let token = Self::next_token(&env, submission_id);
        let now = env.ledger().timestamp();
        env.storage().persistent().set(
            &DataKey::Request(token.clone()),
            &PendingRequest {
                submission_id,
                data_ref: data_ref.clone(),
                schema_ref: schema_ref.clone(),
                requested_at: now,
            },
        );
        let pending = Self::get_pending_count(env.clone());
        env.storage()
            .instance()
            .set(&DataKey::PendingCount, &(pending + 1));

        emit_verification_requested(
            &env,
            VerificationRequested {
                version: EVENT_VERSION_V1,
                token: token.clone(),
                submission_id,
                source: Self::get_source(env.clone())?,
                config: Self::get_config(env.clone())?,
                args: vec![&env, data_ref, schema_ref],
                timestamp: now,
            },
        );
        Ok(token)
    }

    /// Oracle router delivers the routine's output for `token`.
    ///
    /// Returns the decoded verdict. Fails with `UnexpectedRequestToken` for
    /// an unknown or already-consumed token; any coordinator error fails the
    /// whole callback and leaves the request pending.
    pub fn on_callback(
        env: Env,
        caller: Address,
        token: BytesN<32>,
        response: Bytes,
        error: Bytes,
    ) -> Result<bool, Error> {
        reentrancy_guard::acquire(&env);
        access::require_capability(&env, &caller, Capability::FulfillRequest)?;

        let key = DataKey::Request(token.clone());
        let request: PendingRequest = env
            .storage()
            .persistent()
            .get(&key)
            .ok_or(Error::UnexpectedRequestToken)?;
        let coordinator = Self::get_coordinator(env.clone())?;

        let verified = decode_verdict(&response, &error);
        let now = env.ledger().timestamp();

        // EFFECTS: consume the token before handing off.
        env.storage().persistent().remove(&key);
        let pending = Self::get_pending_count(env.clone());
        env.storage()
            .instance()
            .set(&DataKey::PendingCount, &pending.saturating_sub(1));
        env.storage().instance().set(
            &DataKey::LastFulfillment,
            &Fulfillment {
                token: token.clone(),
                submission_id: request.submission_id,
                verified,
                response: response.clone(),
                error: error.clone(),
                at: now,
            },
        );

        // INTERACTION
        let aux_data = if error.is_empty() { response.clone() } else { error.clone() };
        let client = CoordinatorClient::new(&env, &coordinator);
        settle(
            client.try_handle_verification_result(
                &env.current_contract_address(),
                &request.submission_id,
                &verified,
                &aux_data,
            ),
            Error::CrossContractCallFailed,
        )?;

        emit_verification_fulfilled(
            &env,
            VerificationFulfilled {
                version: EVENT_VERSION_V1,
                token,
                submission_id: request.submission_id,
                verified,
                response,
                error,
                timestamp: now,
            },
        );

        reentrancy_guard::release(&env);
        Ok(verified)
    }

    pub fn set_source(env: Env, source: String) -> Result<(), Error> {
        access::require_admin(&env)?;
        env.storage().instance().set(&DataKey::Source, &source);
        Self::config_updated(&env, symbol_short!("source"));
        Ok(())
    }

    pub fn set_config(env: Env, config: OracleConfig) -> Result<(), Error> {
        access::require_admin(&env)?;
        env.storage().instance().set(&DataKey::Config, &config);
        Self::config_updated(&env, symbol_short!("config"));
        Ok(())
    }

    pub fn set_coordinator(env: Env, coordinator: Address) -> Result<(), Error> {
        access::require_admin(&env)?;
        env.storage()
            .instance()
            .set(&DataKey::Coordinator, &coordinator);
        Self::config_updated(&env, symbol_short!("coord"));
        Ok(())
    }

    // ---- views ----

    pub fn get_request(env: Env, token: BytesN<32>) -> Option<PendingRequest> {
        env.storage().persistent().get(&DataKey::Request(token))
    }

    pub fn get_source(env: Env) -> Result<String, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Source)
            .ok_or(Error::NotInitialized)
    }

    pub fn get_config(env: Env) -> Result<OracleConfig, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Config)
            .ok_or(Error::NotInitialized)
    }

    pub fn get_coordinator(env: Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Coordinator)
            .ok_or(Error::NotInitialized)
    }

    pub fn get_pending_count(env: Env) -> u32 {
        env.storage()
            .instance()
            .get(&DataKey::PendingCount)
            .unwrap_or(0)
    }

    pub fn get_last_fulfillment(env: Env) -> Option<Fulfillment> {
        env.storage().instance().get(&DataKey::LastFulfillment)
    }
}

impl VerificationDispatcherContract {
    /// sha256(nonce ‖ submission_id ‖ ledger sequence). The nonce alone makes
    /// tokens unique within this contract.
    fn next_token(env: &Env, submission_id: u64) -> BytesN<32> {
        let nonce: u64 = env
            .storage()
            .instance()
            .get(&DataKey::Nonce)
            .unwrap_or(0)
            + 1;
        env.storage().instance().set(&DataKey::Nonce, &nonce);

        let mut preimage = Bytes::new(env);
        preimage.extend_from_array(&nonce.to_be_bytes());
        preimage.extend_from_array(&submission_id.to_be_bytes());
        preimage.extend_from_array(&env.ledger().sequence().to_be_bytes());
        env.crypto().sha256(&preimage).into()
    }

    fn config_updated(env: &Env, field: Symbol) {
        emit_config_updated(
            env,
            DispatcherConfigUpdated {
                version: EVENT_VERSION_V1,
                field,
                timestamp: env.ledger().timestamp(),
            },
        );
    }
}

/// Positive iff `error` is empty and `response` is a 1..=32 byte big-endian
/// unsigned integer equal to 1.
pub fn decode_verdict(response: &Bytes, error: &Bytes) -> bool {
    let len = response.len();
    if !error.is_empty() || len == 0 || len > 32 {
        return false;
    }
    for i in 0..len - 1 {
        if response.get(i) != Some(0) {
            return false;
        }
    }
    response.get(len - 1) == Some(1)
}
