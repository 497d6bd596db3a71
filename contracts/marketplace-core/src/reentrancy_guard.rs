//! # Reentrancy Guard
//!
//! Boolean flag in the calling contract's instance storage, held for the
//! duration of every state-changing entry point. Each contract has its own
//! flag, so the registry → custodian call chain does not trip it; only a
//! second entry into the *same* contract does.
//!
//! On `panic!` or an `Err` return Soroban rolls back every write of the
//! invocation, so early error returns after [`acquire`] cannot leave the
//! flag stuck.

use soroban_sdk::{contracttype, Env};

#[contracttype]
#[derive(Clone)]
enum GuardKey {
    ReentrancyGuard,
}

/// Acquire the reentrancy guard.
///
/// # Panics
/// Panics with `"Reentrancy detected"` if the guard is already held.
pub fn acquire(env: &Env) {
    if env.storage().instance().has(&GuardKey::ReentrancyGuard) {
        panic!("Reentrancy detected");
    }
    env.storage()
        .instance()
        .set(&GuardKey::ReentrancyGuard, &true);
}

/// Release the reentrancy guard. Call on every success path.
pub fn release(env: &Env) {
    env.storage().instance().remove(&GuardKey::ReentrancyGuard);
}

#[cfg(test)]
pub fn is_active(env: &Env) -> bool {
    env.storage().instance().has(&GuardKey::ReentrancyGuard)
}
