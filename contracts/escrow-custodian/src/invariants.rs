use crate::DataKey;
use marketplace_core::{CustodianStats, Escrow, EscrowStatus};
use soroban_sdk::{token, Address, Env};

pub(crate) fn assert_escrow(escrow: &Escrow) {
    if !verify_escrow_invariants(escrow) {
        panic!("Invariant violated: escrow record is inconsistent");
    }
}

pub(crate) fn verify_escrow_invariants(escrow: &Escrow) -> bool {
    if escrow.amount < 0 || escrow.total_deposited <= 0 {
        return false;
    }
    match escrow.status {
        EscrowStatus::Funded => {
            escrow.amount == escrow.total_deposited && escrow.settled_at.is_none()
        }
        EscrowStatus::Released | EscrowStatus::Refunded => {
            escrow.amount == 0 && escrow.settled_at.is_some() && escrow.settled_to.is_some()
        }
        EscrowStatus::None => false,
    }
}

pub(crate) fn conservation_holds(stats: &CustodianStats) -> bool {
    if stats.total_released < 0 || stats.total_refunded < 0 || stats.total_funded < 0 {
        return false;
    }
    let accounted = stats
        .total_released
        .checked_add(stats.total_refunded)
        .and_then(|sum| sum.checked_add(stats.total_funded));
    accounted == Some(stats.total_deposited)
}

/// Ledger totals balance, and the token balance actually covers every
/// funded escrow.
pub(crate) fn assert_conservation(env: &Env) {
    let stats: CustodianStats = env
        .storage()
        .instance()
        .get(&DataKey::Stats)
        .unwrap_or_default();
    if !conservation_holds(&stats) {
        panic!("Invariant violated: deposited != released + refunded + funded");
    }
    if let Some(token_addr) = env.storage().instance().get::<DataKey, Address>(&DataKey::Token) {
        let balance = token::Client::new(env, &token_addr).balance(&env.current_contract_address());
        if balance < stats.total_funded {
            panic!("Invariant violated: token balance below funded total");
        }
    }
}
