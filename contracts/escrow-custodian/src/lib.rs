//! # Escrow Custodian
//!
//! Holds bounty rewards in custody, keyed by bounty id. Tokens move only
//! through capability-gated entry points; the registry is normally the sole
//! holder of `Deposit` and `Refund`, and the submission coordinator the sole
//! holder of `Release`.
//!
//! ```text
//!            deposit                release
//!   None ─────────────► Funded ──────────────► Released
//!                         │  ▲
//!          increase_deposit  │ refund / emergency_withdraw
//!                         └──┴──────────────► Refunded
//! ```
//!
//! Every mutating entry point follows checks → effects → interaction and
//! runs under the reentrancy guard. The escrow record is settled *before*
//! the token transfer so a re-entrant call observes the terminal status.
//!
//! Running totals satisfy
//! `total_deposited == total_released + total_refunded + total_funded`,
//! checked after every mutation (see `invariants`).

#![no_std]

mod events;
mod invariants;

use events::{
    emit_custodian_initialized, emit_deposit_increased, emit_emergency_withdrawal,
    emit_funds_deposited, emit_funds_refunded, emit_funds_released, CustodianInitialized,
    DepositIncreased, EmergencyWithdrawal, FundsDeposited, FundsRefunded, FundsReleased,
};
use marketplace_core::{
    access, reentrancy_guard, Capability, CustodianStats, Error, Escrow, EscrowStatus,
    EVENT_VERSION_V1,
};
use soroban_sdk::{contract, contractimpl, contracttype, token, vec, Address, Env, Vec};

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Token,
    Escrow(u64),
    DepositorIndex(Address),
    Stats,
}

#[contract]
pub struct EscrowCustodianContract;

#[contractimpl]
impl EscrowCustodianContract {
    /// One-time setup. `token` is the asset every escrow is denominated in.
    pub fn init(env: Env, admin: Address, token: Address) -> Result<(), Error> {
        access::init_admin(&env, &admin)?;
        env.storage().instance().set(&DataKey::Token, &token);
        env.storage()
            .instance()
            .set(&DataKey::Stats, &CustodianStats::default());

        emit_custodian_initialized(
            &env,
            CustodianInitialized {
                version: EVENT_VERSION_V1,
                admin,
                token,
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

    /// Pull `amount` from `depositor` into a new escrow for `bounty_id`.
    ///
    /// # Errors
    /// * `Unauthorized` - `caller` lacks `Capability::Deposit`
    /// * `InvalidAmount` - `amount <= 0`
    /// * `InvalidAddress` - `depositor` is the custodian itself
    /// * `EscrowAlreadyExists` - an escrow for `bounty_id` was created before,
    ///   whatever its current status
    /// * `TransferFailed` - the token contract rejected the transfer
    pub fn deposit(
        env: Env,
        caller: Address,
        bounty_id: u64,
        depositor: Address,
        amount: i128,
    ) -> Result<(), Error> {
        reentrancy_guard::acquire(&env);
        access::require_capability(&env, &caller, Capability::Deposit)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        if depositor == env.current_contract_address() {
            return Err(Error::InvalidAddress);
        }
        if env.storage().persistent().has(&DataKey::Escrow(bounty_id)) {
            return Err(Error::EscrowAlreadyExists);
        }
        depositor.require_auth();

        // EFFECTS
        let now = env.ledger().timestamp();
        let escrow = Escrow {
            bounty_id,
            depositor: depositor.clone(),
            amount,
            total_deposited: amount,
            status: EscrowStatus::Funded,
            created_at: now,
            settled_at: None,
            settled_to: None,
        };
        invariants::assert_escrow(&escrow);
        env.storage()
            .persistent()
            .set(&DataKey::Escrow(bounty_id), &escrow);

        let index_key = DataKey::DepositorIndex(depositor.clone());
        let mut index: Vec<u64> = env
            .storage()
            .persistent()
            .get(&index_key)
            .unwrap_or(vec![&env]);
        index.push_back(bounty_id);
        env.storage().persistent().set(&index_key, &index);

        let mut stats = Self::stats(&env);
        stats.total_deposited = stats
            .total_deposited
            .checked_add(amount)
            .ok_or(Error::InvalidAmount)?;
        stats.total_funded = stats
            .total_funded
            .checked_add(amount)
            .ok_or(Error::InvalidAmount)?;
        stats.count_funded += 1;
        env.storage().instance().set(&DataKey::Stats, &stats);

        // INTERACTION
        Self::transfer(&env, &depositor, &env.current_contract_address(), amount)?;

        emit_funds_deposited(
            &env,
            FundsDeposited {
                version: EVENT_VERSION_V1,
                bounty_id,
                depositor,
                amount,
                timestamp: now,
            },
        );

        invariants::assert_conservation(&env);
        reentrancy_guard::release(&env);
        Ok(())
    }

    /// Top up a funded escrow from its original depositor, who must sign.
    /// Returns the new escrowed amount.
    pub fn increase_deposit(
        env: Env,
        caller: Address,
        bounty_id: u64,
        amount: i128,
    ) -> Result<i128, Error> {
        reentrancy_guard::acquire(&env);
        access::require_capability(&env, &caller, Capability::Deposit)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        let mut escrow = Self::load(&env, bounty_id)?;
        if escrow.status != EscrowStatus::Funded {
            return Err(Error::InvalidEscrowStatus);
        }
        escrow.depositor.require_auth();

        escrow.amount = escrow.amount.checked_add(amount).ok_or(Error::InvalidAmount)?;
        escrow.total_deposited = escrow
            .total_deposited
            .checked_add(amount)
            .ok_or(Error::InvalidAmount)?;
        invariants::assert_escrow(&escrow);
        env.storage()
            .persistent()
            .set(&DataKey::Escrow(bounty_id), &escrow);

        let mut stats = Self::stats(&env);
        stats.total_deposited = stats
            .total_deposited
            .checked_add(amount)
            .ok_or(Error::InvalidAmount)?;
        stats.total_funded = stats
            .total_funded
            .checked_add(amount)
            .ok_or(Error::InvalidAmount)?;
        env.storage().instance().set(&DataKey::Stats, &stats);

        Self::transfer(&env, &escrow.depositor, &env.current_contract_address(), amount)?;

        emit_deposit_increased(
            &env,
            DepositIncreased {
                version: EVENT_VERSION_V1,
                bounty_id,
                added: amount,
                amount: escrow.amount,
                timestamp: env.ledger().timestamp(),
            },
        );

        invariants::assert_conservation(&env);
        reentrancy_guard::release(&env);
        Ok(escrow.amount)
    }

    /// Pay the full escrowed amount to `recipient`. Returns the amount paid.
    ///
    /// # Errors
    /// * `Unauthorized` - `caller` lacks `Capability::Release`
    /// * `InvalidAddress` - `recipient` is the custodian itself
    /// * `EscrowNotFound` / `InvalidEscrowStatus` - nothing funded to release
    /// * `TransferFailed` - the token contract rejected the transfer
    pub fn release(
        env: Env,
        caller: Address,
        bounty_id: u64,
        recipient: Address,
    ) -> Result<i128, Error> {
        reentrancy_guard::acquire(&env);
        access::require_capability(&env, &caller, Capability::Release)?;

        if recipient == env.current_contract_address() {
            return Err(Error::InvalidAddress);
        }
        let amount = Self::settle(&env, bounty_id, &recipient, EscrowStatus::Released)?;

        emit_funds_released(
            &env,
            FundsReleased {
                version: EVENT_VERSION_V1,
                bounty_id,
                amount,
                recipient,
                timestamp: env.ledger().timestamp(),
            },
        );

        invariants::assert_conservation(&env);
        reentrancy_guard::release(&env);
        Ok(amount)
    }

    /// Return the full escrowed amount to the depositor. Returns the amount refunded.
    pub fn refund(env: Env, caller: Address, bounty_id: u64) -> Result<i128, Error> {
        reentrancy_guard::acquire(&env);
        access::require_capability(&env, &caller, Capability::Refund)?;

        let depositor = Self::load(&env, bounty_id)?.depositor;
        let amount = Self::settle(&env, bounty_id, &depositor, EscrowStatus::Refunded)?;

        emit_funds_refunded(
            &env,
            FundsRefunded {
                version: EVENT_VERSION_V1,
                bounty_id,
                amount,
                refund_to: depositor,
                timestamp: env.ledger().timestamp(),
            },
        );

        invariants::assert_conservation(&env);
        reentrancy_guard::release(&env);
        Ok(amount)
    }

    /// Admin-only recovery of a single funded escrow to an arbitrary
    /// recipient. Recorded as a refund in the running totals.
    pub fn emergency_withdraw(env: Env, bounty_id: u64, recipient: Address) -> Result<i128, Error> {
        reentrancy_guard::acquire(&env);
        let admin = access::require_admin(&env)?;

        if recipient == env.current_contract_address() {
            return Err(Error::InvalidAddress);
        }
        let amount = Self::settle(&env, bounty_id, &recipient, EscrowStatus::Refunded)?;

        emit_emergency_withdrawal(
            &env,
            EmergencyWithdrawal {
                version: EVENT_VERSION_V1,
                bounty_id,
                admin,
                recipient,
                amount,
                timestamp: env.ledger().timestamp(),
            },
        );

        invariants::assert_conservation(&env);
        reentrancy_guard::release(&env);
        Ok(amount)
    }

    // ---- views ----

    pub fn get_escrow(env: Env, bounty_id: u64) -> Result<Escrow, Error> {
        Self::load(&env, bounty_id)
    }

    /// `EscrowStatus::None` for a bounty id that was never funded.
    pub fn get_escrow_status(env: Env, bounty_id: u64) -> EscrowStatus {
        env.storage()
            .persistent()
            .get::<DataKey, Escrow>(&DataKey::Escrow(bounty_id))
            .map(|escrow| escrow.status)
            .unwrap_or(EscrowStatus::None)
    }

    pub fn is_funded(env: Env, bounty_id: u64) -> bool {
        Self::get_escrow_status(env, bounty_id) == EscrowStatus::Funded
    }

    /// Amount currently held for `bounty_id`; zero when settled or unknown.
    pub fn amount_of(env: Env, bounty_id: u64) -> i128 {
        env.storage()
            .persistent()
            .get::<DataKey, Escrow>(&DataKey::Escrow(bounty_id))
            .map(|escrow| escrow.amount)
            .unwrap_or(0)
    }

    /// Token balance actually held by the custodian.
    pub fn total_balance(env: Env) -> Result<i128, Error> {
        let token_addr = Self::token(&env)?;
        Ok(token::Client::new(&env, &token_addr).balance(&env.current_contract_address()))
    }

    pub fn get_stats(env: Env) -> CustodianStats {
        Self::stats(&env)
    }

    pub fn verify_conservation(env: Env) -> bool {
        invariants::conservation_holds(&Self::stats(&env))
    }

    pub fn get_depositor_escrows(env: Env, depositor: Address) -> Vec<u64> {
        env.storage()
            .persistent()
            .get(&DataKey::DepositorIndex(depositor))
            .unwrap_or(vec![&env])
    }

    pub fn get_token(env: Env) -> Result<Address, Error> {
        Self::token(&env)
    }

    pub fn get_admin(env: Env) -> Result<Address, Error> {
        access::admin(&env)
    }
}

impl EscrowCustodianContract {
    fn token(env: &Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Token)
            .ok_or(Error::NotInitialized)
    }

    fn stats(env: &Env) -> CustodianStats {
        env.storage()
            .instance()
            .get(&DataKey::Stats)
            .unwrap_or_default()
    }

    fn load(env: &Env, bounty_id: u64) -> Result<Escrow, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Escrow(bounty_id))
            .ok_or(Error::EscrowNotFound)
    }

    /// Close a funded escrow into `outcome` and pay `recipient`.
    fn settle(
        env: &Env,
        bounty_id: u64,
        recipient: &Address,
        outcome: EscrowStatus,
    ) -> Result<i128, Error> {
        let mut escrow = Self::load(env, bounty_id)?;
        if escrow.status != EscrowStatus::Funded {
            return Err(Error::InvalidEscrowStatus);
        }

        // EFFECTS
        let amount = escrow.amount;
        escrow.amount = 0;
        escrow.status = outcome.clone();
        escrow.settled_at = Some(env.ledger().timestamp());
        escrow.settled_to = Some(recipient.clone());
        invariants::assert_escrow(&escrow);
        env.storage()
            .persistent()
            .set(&DataKey::Escrow(bounty_id), &escrow);

        let mut stats = Self::stats(env);
        stats.total_funded -= amount;
        stats.count_funded = stats.count_funded.saturating_sub(1);
        match outcome {
            EscrowStatus::Released => {
                stats.total_released += amount;
                stats.count_released += 1;
            }
            _ => {
                stats.total_refunded += amount;
                stats.count_refunded += 1;
            }
        }
        env.storage().instance().set(&DataKey::Stats, &stats);

        // INTERACTION
        Self::transfer(env, &env.current_contract_address(), recipient, amount)?;
        Ok(amount)
    }

    fn transfer(env: &Env, from: &Address, to: &Address, amount: i128) -> Result<(), Error> {
        let token_addr = Self::token(env)?;
        let client = token::Client::new(env, &token_addr);
        match client.try_transfer(from, to, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => Err(Error::TransferFailed),
        }
    }
}
