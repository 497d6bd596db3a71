//! # Capability Table
//!
//! Each marketplace contract keeps one top-level admin plus a table of
//! `principal → capability` grants. Privileged entry points take the calling
//! principal explicitly and run [`require_capability`] before touching state:
//!
//! ```text
//! caller ──► has Grant(caller, cap)? ──no──► Error::Unauthorized
//!                     │
//!                    yes
//!                     ▼
//!            caller.require_auth()
//! ```
//!
//! A contract calling another contract authorizes as its own address
//! automatically, so wiring the registry to the custodian is just
//! `grant_capability(registry_address, Capability::Deposit)` on the custodian.

use crate::{Error, EVENT_VERSION_V1};
use soroban_sdk::{contracttype, symbol_short, Address, Env};

/// Privileged operations a principal may be granted.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Capability {
    /// Custodian: `deposit` / `increase_deposit`
    Deposit = 1,
    /// Custodian: `release`
    Release = 2,
    /// Custodian: `refund`
    Refund = 3,
    /// Registry: `increment_submissions`
    IncrementSubmissions = 4,
    /// Registry: `complete_bounty`
    CompleteBounty = 5,
    /// Dispatcher: `request_verification`
    RequestVerification = 6,
    /// Coordinator: `handle_verification_result`
    DeliverVerification = 7,
    /// Dispatcher: `on_callback`
    FulfillRequest = 8,
}

#[contracttype]
#[derive(Clone)]
enum AccessKey {
    Admin,
    Grant(Address, Capability),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CapabilityChanged {
    pub version: u32,
    pub principal: Address,
    pub capability: Capability,
    pub granted: bool,
    pub timestamp: u64,
}

/// Store the admin. Fails if one is already set.
pub fn init_admin(env: &Env, admin: &Address) -> Result<(), Error> {
    if env.storage().instance().has(&AccessKey::Admin) {
        return Err(Error::AlreadyInitialized);
    }
    env.storage().instance().set(&AccessKey::Admin, admin);
    Ok(())
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&AccessKey::Admin)
}

pub fn admin(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&AccessKey::Admin)
        .ok_or(Error::NotInitialized)
}

/// Load the admin and require its signature.
pub fn require_admin(env: &Env) -> Result<Address, Error> {
    let admin = admin(env)?;
    admin.require_auth();
    Ok(admin)
}

pub fn has_capability(env: &Env, principal: &Address, capability: Capability) -> bool {
    env.storage()
        .instance()
        .get(&AccessKey::Grant(principal.clone(), capability))
        .unwrap_or(false)
}

/// Check the table first, then the signature.
pub fn require_capability(
    env: &Env,
    caller: &Address,
    capability: Capability,
) -> Result<(), Error> {
    if !is_initialized(env) {
        return Err(Error::NotInitialized);
    }
    if !has_capability(env, caller, capability) {
        return Err(Error::Unauthorized);
    }
    caller.require_auth();
    Ok(())
}

/// Admin only.
pub fn grant(env: &Env, principal: &Address, capability: Capability) -> Result<(), Error> {
    require_admin(env)?;
    env.storage()
        .instance()
        .set(&AccessKey::Grant(principal.clone(), capability), &true);
    emit_capability_changed(env, principal, capability, true);
    Ok(())
}

/// Admin only. Revoking an absent grant is a no-op.
pub fn revoke(env: &Env, principal: &Address, capability: Capability) -> Result<(), Error> {
    require_admin(env)?;
    env.storage()
        .instance()
        .remove(&AccessKey::Grant(principal.clone(), capability));
    emit_capability_changed(env, principal, capability, false);
    Ok(())
}

fn emit_capability_changed(env: &Env, principal: &Address, capability: Capability, granted: bool) {
    let topic = if granted {
        symbol_short!("cap_grant")
    } else {
        symbol_short!("cap_rvk")
    };
    env.events().publish(
        (topic, principal.clone()),
        CapabilityChanged {
            version: EVENT_VERSION_V1,
            principal: principal.clone(),
            capability,
            granted,
            timestamp: env.ledger().timestamp(),
        },
    );
}
