//! # Bounty Registry
//!
//! Owns the bounty lifecycle:
//!
//! ```text
//!                ┌──► Completed   (complete_bounty, coordinator only)
//!   Active ──────┼──► Cancelled   (cancel_bounty, owner only, refunds)
//!                └──► Expired     (expire_bounty, anyone after deadline, refunds)
//! ```
//!
//! Creating a bounty forwards the reward to the escrow custodian in the same
//! invocation, so a bounty exists if and only if its escrow was funded.
//! The registry must hold `Deposit` and `Refund` on the custodian.

#![no_std]

mod events;

use events::{
    emit_bounty_cancelled, emit_bounty_completed, emit_bounty_created, emit_bounty_expired,
    emit_deadline_extended, emit_escrow_wired, emit_min_reward_updated, emit_registry_initialized,
    emit_reward_increased, emit_submission_counted, BountyCancelled, BountyCompleted,
    BountyCreated, BountyExpired, DeadlineExtended, EscrowWired, MinRewardUpdated,
    RegistryInitialized, RewardIncreased, SubmissionCounted,
};
use marketplace_core::{
    access,
    interfaces::{settle, CustodianClient},
    reentrancy_guard, Bounty, BountyStatus, Capability, Error, EVENT_VERSION_V1,
};
use soroban_sdk::{contract, contractimpl, contracttype, vec, Address, Env, String, Vec};

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Escrow,
    MinReward,
    BountyCounter,
    Bounty(u64),
    OwnerIndex(Address),
}

#[contract]
pub struct BountyRegistryContract;

#[contractimpl]
impl BountyRegistryContract {
    pub fn init(env: Env, admin: Address, min_reward: i128) -> Result<(), Error> {
        if min_reward < 0 {
            return Err(Error::InvalidAmount);
        }
        access::init_admin(&env, &admin)?;
        env.storage().instance().set(&DataKey::MinReward, &min_reward);
        env.storage().instance().set(&DataKey::BountyCounter, &0u64);

        emit_registry_initialized(
            &env,
            RegistryInitialized {
                version: EVENT_VERSION_V1,
                admin,
                min_reward,
                timestamp: env.ledger().timestamp(),
            },
        );
        Ok(())
    }

    /// Wire the escrow custodian. Admin only; may be re-pointed.
    pub fn set_escrow(env: Env, escrow: Address) -> Result<(), Error> {
        access::require_admin(&env)?;
        env.storage().instance().set(&DataKey::Escrow, &escrow);
        emit_escrow_wired(
            &env,
            EscrowWired {
                version: EVENT_VERSION_V1,
                escrow,
                timestamp: env.ledger().timestamp(),
            },
        );
        Ok(())
    }

    pub fn set_min_reward(env: Env, min_reward: i128) -> Result<(), Error> {
        access::require_admin(&env)?;
        if min_reward < 0 {
            return Err(Error::InvalidAmount);
        }
        let old_min_reward = Self::min_reward(&env);
        env.storage().instance().set(&DataKey::MinReward, &min_reward);
        emit_min_reward_updated(
            &env,
            MinRewardUpdated {
                version: EVENT_VERSION_V1,
                old_min_reward,
                new_min_reward: min_reward,
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

    /// Create an Active bounty and escrow its reward from `owner`.
    ///
    /// # Errors
    /// * `InsufficientReward` - reward below the configured minimum (or not positive)
    /// * `InvalidDeadline` - deadline not in the future
    /// * `InvalidStatus` - `max_submissions` is zero
    /// * `EscrowManagerNotSet` - custodian not wired
    /// * `InvalidContentRef` - empty `schema_ref`
    /// * any custodian error, e.g. `TransferFailed`
    pub fn create_bounty(
        env: Env,
        owner: Address,
        title: String,
        description: String,
        schema_ref: String,
        deadline: u64,
        max_submissions: u32,
        reward_amount: i128,
    ) -> Result<u64, Error> {
        reentrancy_guard::acquire(&env);
        if !access::is_initialized(&env) {
            return Err(Error::NotInitialized);
        }
        owner.require_auth();

        let now = env.ledger().timestamp();
        if reward_amount <= 0 || reward_amount < Self::min_reward(&env) {
            return Err(Error::InsufficientReward);
        }
        if deadline <= now {
            return Err(Error::InvalidDeadline);
        }
        if max_submissions == 0 {
            return Err(Error::InvalidStatus);
        }
        let escrow = Self::escrow(&env)?;
        if schema_ref.is_empty() {
            return Err(Error::InvalidContentRef);
        }

        // EFFECTS
        let bounty_id = Self::next_bounty_id(&env);
        let bounty = Bounty {
            id: bounty_id,
            owner: owner.clone(),
            title,
            description,
            schema_ref: schema_ref.clone(),
            reward_amount,
            deadline,
            status: BountyStatus::Active,
            max_submissions,
            submission_count: 0,
            created_at: now,
            winner: None,
            winning_data_ref: None,
            closed_at: None,
        };
        Self::save(&env, &bounty);

        let index_key = DataKey::OwnerIndex(owner.clone());
        let mut index: Vec<u64> = env
            .storage()
            .persistent()
            .get(&index_key)
            .unwrap_or(vec![&env]);
        index.push_back(bounty_id);
        env.storage().persistent().set(&index_key, &index);

        // INTERACTION
        let custodian = CustodianClient::new(&env, &escrow);
        settle(
            custodian.try_deposit(
                &env.current_contract_address(),
                &bounty_id,
                &owner,
                &reward_amount,
            ),
            Error::CrossContractCallFailed,
        )?;

        emit_bounty_created(
            &env,
            BountyCreated {
                version: EVENT_VERSION_V1,
                bounty_id,
                owner,
                reward_amount,
                deadline,
                max_submissions,
                schema_ref,
                timestamp: now,
            },
        );

        reentrancy_guard::release(&env);
        Ok(bounty_id)
    }

    /// Owner withdraws an Active bounty; the escrow is refunded to them.
    pub fn cancel_bounty(env: Env, caller: Address, bounty_id: u64) -> Result<(), Error> {
        reentrancy_guard::acquire(&env);
        let mut bounty = Self::load(&env, bounty_id)?;
        if bounty.owner != caller {
            return Err(Error::Unauthorized);
        }
        caller.require_auth();
        if bounty.status != BountyStatus::Active {
            return Err(Error::InvalidStatus);
        }
        let escrow = Self::escrow(&env)?;

        let now = env.ledger().timestamp();
        bounty.status = BountyStatus::Cancelled;
        bounty.closed_at = Some(now);
        Self::save(&env, &bounty);

        let refunded = Self::refund_escrow(&env, &escrow, bounty_id)?;

        emit_bounty_cancelled(
            &env,
            BountyCancelled {
                version: EVENT_VERSION_V1,
                bounty_id,
                owner: caller,
                refunded,
                timestamp: now,
            },
        );

        reentrancy_guard::release(&env);
        Ok(())
    }

    /// Owner adds `amount` to the reward of an Active bounty.
    pub fn increase_reward(
        env: Env,
        caller: Address,
        bounty_id: u64,
        amount: i128,
    ) -> Result<i128, Error> {
        reentrancy_guard::acquire(&env);
        let mut bounty = Self::load(&env, bounty_id)?;
        if bounty.owner != caller {
            return Err(Error::Unauthorized);
        }
        caller.require_auth();
        if bounty.status != BountyStatus::Active {
            return Err(Error::InvalidStatus);
        }
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        let escrow = Self::escrow(&env)?;

        bounty.reward_amount = bounty
            .reward_amount
            .checked_add(amount)
            .ok_or(Error::InvalidAmount)?;
        Self::save(&env, &bounty);

        let custodian = CustodianClient::new(&env, &escrow);
        settle(
            custodian.try_increase_deposit(&env.current_contract_address(), &bounty_id, &amount),
            Error::CrossContractCallFailed,
        )?;

        emit_reward_increased(
            &env,
            RewardIncreased {
                version: EVENT_VERSION_V1,
                bounty_id,
                added: amount,
                reward_amount: bounty.reward_amount,
                timestamp: env.ledger().timestamp(),
            },
        );

        reentrancy_guard::release(&env);
        Ok(bounty.reward_amount)
    }

    /// Owner pushes the deadline of an Active bounty later.
    pub fn extend_deadline(
        env: Env,
        caller: Address,
        bounty_id: u64,
        new_deadline: u64,
    ) -> Result<(), Error> {
        let mut bounty = Self::load(&env, bounty_id)?;
        if bounty.owner != caller {
            return Err(Error::Unauthorized);
        }
        caller.require_auth();
        if bounty.status != BountyStatus::Active {
            return Err(Error::InvalidStatus);
        }
        let now = env.ledger().timestamp();
        if new_deadline <= bounty.deadline || new_deadline <= now {
            return Err(Error::InvalidDeadline);
        }

        let old_deadline = bounty.deadline;
        bounty.deadline = new_deadline;
        Self::save(&env, &bounty);

        emit_deadline_extended(
            &env,
            DeadlineExtended {
                version: EVENT_VERSION_V1,
                bounty_id,
                old_deadline,
                new_deadline,
                timestamp: now,
            },
        );
        Ok(())
    }

    /// Permissionless: close an Active bounty whose deadline has passed and
    /// refund the owner.
    pub fn expire_bounty(env: Env, bounty_id: u64) -> Result<(), Error> {
        reentrancy_guard::acquire(&env);
        let mut bounty = Self::load(&env, bounty_id)?;
        if bounty.status != BountyStatus::Active {
            return Err(Error::InvalidStatus);
        }
        let now = env.ledger().timestamp();
        if now <= bounty.deadline {
            return Err(Error::DeadlineNotPassed);
        }
        let escrow = Self::escrow(&env)?;

        bounty.status = BountyStatus::Expired;
        bounty.closed_at = Some(now);
        Self::save(&env, &bounty);

        let refunded = Self::refund_escrow(&env, &escrow, bounty_id)?;

        emit_bounty_expired(
            &env,
            BountyExpired {
                version: EVENT_VERSION_V1,
                bounty_id,
                refunded,
                timestamp: now,
            },
        );

        reentrancy_guard::release(&env);
        Ok(())
    }

    /// Mark an Active bounty as won. Moves no funds; the caller releases the
    /// escrow separately.
    pub fn complete_bounty(
        env: Env,
        caller: Address,
        bounty_id: u64,
        winner: Address,
        data_ref: String,
    ) -> Result<(), Error> {
        access::require_capability(&env, &caller, Capability::CompleteBounty)?;
        let mut bounty = Self::load(&env, bounty_id)?;
        if bounty.status != BountyStatus::Active {
            return Err(Error::InvalidStatus);
        }

        let now = env.ledger().timestamp();
        bounty.status = BountyStatus::Completed;
        bounty.winner = Some(winner.clone());
        bounty.winning_data_ref = Some(data_ref.clone());
        bounty.closed_at = Some(now);
        Self::save(&env, &bounty);

        emit_bounty_completed(
            &env,
            BountyCompleted {
                version: EVENT_VERSION_V1,
                bounty_id,
                winner,
                data_ref,
                timestamp: now,
            },
        );
        Ok(())
    }

    /// Count one more submission against the cap. Returns the new count.
    pub fn increment_submissions(env: Env, caller: Address, bounty_id: u64) -> Result<u32, Error> {
        access::require_capability(&env, &caller, Capability::IncrementSubmissions)?;
        let mut bounty = Self::load(&env, bounty_id)?;
        if bounty.status != BountyStatus::Active {
            return Err(Error::BountyNotActive);
        }
        if bounty.submission_count >= bounty.max_submissions {
            return Err(Error::MaxSubmissionsReached);
        }

        bounty.submission_count += 1;
        Self::save(&env, &bounty);

        emit_submission_counted(
            &env,
            SubmissionCounted {
                version: EVENT_VERSION_V1,
                bounty_id,
                submission_count: bounty.submission_count,
                max_submissions: bounty.max_submissions,
                timestamp: env.ledger().timestamp(),
            },
        );
        Ok(bounty.submission_count)
    }

    // ---- views ----

    pub fn get_bounty(env: Env, bounty_id: u64) -> Result<Bounty, Error> {
        Self::load(&env, bounty_id)
    }

    /// Accepting submissions: Active, deadline not passed, cap not reached.
    /// False for unknown ids.
    pub fn is_bounty_active(env: Env, bounty_id: u64) -> bool {
        match env
            .storage()
            .persistent()
            .get::<DataKey, Bounty>(&DataKey::Bounty(bounty_id))
        {
            Some(bounty) => {
                bounty.status == BountyStatus::Active
                    && env.ledger().timestamp() <= bounty.deadline
                    && bounty.submission_count < bounty.max_submissions
            }
            None => false,
        }
    }

    pub fn get_bounties_by_owner(env: Env, owner: Address) -> Vec<u64> {
        env.storage()
            .persistent()
            .get(&DataKey::OwnerIndex(owner))
            .unwrap_or(vec![&env])
    }

    pub fn get_total_bounties(env: Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::BountyCounter)
            .unwrap_or(0)
    }

    pub fn get_min_reward(env: Env) -> i128 {
        Self::min_reward(&env)
    }

    pub fn get_escrow(env: Env) -> Option<Address> {
        env.storage().instance().get(&DataKey::Escrow)
    }

    pub fn get_admin(env: Env) -> Result<Address, Error> {
        access::admin(&env)
    }
}

impl BountyRegistryContract {
    fn min_reward(env: &Env) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::MinReward)
            .unwrap_or(0)
    }

    fn escrow(env: &Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Escrow)
            .ok_or(Error::EscrowManagerNotSet)
    }

    fn next_bounty_id(env: &Env) -> u64 {
        let id = Self::get_total_bounties(env.clone()) + 1;
        env.storage().instance().set(&DataKey::BountyCounter, &id);
        id
    }

    fn load(env: &Env, bounty_id: u64) -> Result<Bounty, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Bounty(bounty_id))
            .ok_or(Error::BountyNotFound)
    }

    fn save(env: &Env, bounty: &Bounty) {
        env.storage()
            .persistent()
            .set(&DataKey::Bounty(bounty.id), bounty);
    }

    fn refund_escrow(env: &Env, escrow: &Address, bounty_id: u64) -> Result<i128, Error> {
        let custodian = CustodianClient::new(env, escrow);
        settle(
            custodian.try_refund(&env.current_contract_address(), &bounty_id),
            Error::CrossContractCallFailed,
        )
    }
}
