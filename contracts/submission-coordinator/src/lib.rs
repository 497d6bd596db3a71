//! # Submission Coordinator
//!
//! Accepts contributor submissions and drives each one through
//!
//! ```text
//!   Pending ──► Verifying ──┬──► Verified   (bounty completed, escrow released)
//!                           └──► Rejected   (nothing moves)
//! ```
//!
//! `submit_data` counts the submission against the bounty cap and asks the
//! dispatcher for a verification; the dispatcher later calls
//! `handle_verification_result`. Only a submission that is still Verifying
//! can be resolved, so a duplicated or replayed verdict fails with
//! `InvalidStatus` and can never pay twice.
//!
//! The coordinator must hold `IncrementSubmissions` and `CompleteBounty` on
//! the registry, `Release` on the custodian and `RequestVerification` on the
//! dispatcher; the dispatcher must hold `DeliverVerification` here.

#![no_std]

mod events;

use events::{
    emit_collaborator_wired, emit_coordinator_initialized, emit_submission_received,
    emit_submission_resolved, CollaboratorWired, CoordinatorInitialized, SubmissionReceived,
    SubmissionResolved,
};
use marketplace_core::{
    access,
    interfaces::{settle, CustodianClient, DispatcherClient, RegistryClient},
    reentrancy_guard, BountyStatus, Capability, Error, Submission, SubmissionStatus,
    EVENT_VERSION_V1,
};
use soroban_sdk::{
    contract, contractimpl, contracttype, symbol_short, vec, Address, Bytes, BytesN, Env, String,
    Symbol, Vec,
};

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Registry,
    Escrow,
    Dispatcher,
    SubmissionCounter,
    Submission(u64),
    BountySubmissions(u64),
    ContributorSubmissions(Address),
}

#[contract]
pub struct SubmissionCoordinatorContract;

#[contractimpl]
impl SubmissionCoordinatorContract {
    pub fn init(env: Env, admin: Address, registry: Address, escrow: Address) -> Result<(), Error> {
        access::init_admin(&env, &admin)?;
        env.storage().instance().set(&DataKey::Registry, &registry);
        env.storage().instance().set(&DataKey::Escrow, &escrow);
        env.storage()
            .instance()
            .set(&DataKey::SubmissionCounter, &0u64);

        emit_coordinator_initialized(
            &env,
            CoordinatorInitialized {
                version: EVENT_VERSION_V1,
                admin,
                registry,
                escrow,
                timestamp: env.ledger().timestamp(),
            },
        );
        Ok(())
    }

    pub fn set_dispatcher(env: Env, dispatcher: Address) -> Result<(), Error> {
        Self::wire(&env, DataKey::Dispatcher, symbol_short!("dispatch"), dispatcher)
    }

    pub fn set_registry(env: Env, registry: Address) -> Result<(), Error> {
        Self::wire(&env, DataKey::Registry, symbol_short!("registry"), registry)
    }

    pub fn set_escrow(env: Env, escrow: Address) -> Result<(), Error> {
        Self::wire(&env, DataKey::Escrow, symbol_short!("escrow"), escrow)
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

    /// Submit content against an open bounty and request its verification.
    ///
    /// # Errors
    /// * `BountyNotActive` - bounty unknown, closed or past its deadline
    /// * `InvalidContentRef` - empty `data_ref`
    /// * `DispatcherNotSet` - no dispatcher wired
    /// * `MaxSubmissionsReached` - cap already reached, surfaced from the registry
    pub fn submit_data(
        env: Env,
        contributor: Address,
        bounty_id: u64,
        data_ref: String,
        metadata: String,
    ) -> Result<u64, Error> {
        reentrancy_guard::acquire(&env);
        if !access::is_initialized(&env) {
            return Err(Error::NotInitialized);
        }
        contributor.require_auth();

        // Open means Active and not past the deadline. A full bounty is left
        // to the registry so the cap surfaces as MaxSubmissionsReached.
        let now = env.ledger().timestamp();
        let registry = RegistryClient::new(&env, &Self::registry(&env)?);
        let lookup = settle(registry.try_get_bounty(&bounty_id), Error::CrossContractCallFailed);
        let bounty = match lookup {
            Ok(bounty) if bounty.status == BountyStatus::Active && now <= bounty.deadline => bounty,
            Ok(_) | Err(Error::BountyNotFound) => return Err(Error::BountyNotActive),
            Err(err) => return Err(err),
        };
        if data_ref.is_empty() {
            return Err(Error::InvalidContentRef);
        }
        let dispatcher_addr: Address = env
            .storage()
            .instance()
            .get(&DataKey::Dispatcher)
            .ok_or(Error::DispatcherNotSet)?;

        let submission_id = Self::next_submission_id(&env);
        let mut submission = Submission {
            id: submission_id,
            bounty_id,
            contributor: contributor.clone(),
            data_ref: data_ref.clone(),
            metadata,
            status: SubmissionStatus::Pending,
            submitted_at: now,
            verified_at: None,
            request_token: BytesN::from_array(&env, &[0u8; 32]),
            aux_data: Bytes::new(&env),
        };
        Self::save(&env, &submission);
        Self::index(&env, DataKey::BountySubmissions(bounty_id), submission_id);
        Self::index(
            &env,
            DataKey::ContributorSubmissions(contributor.clone()),
            submission_id,
        );

        let self_addr = env.current_contract_address();
        settle(
            registry.try_increment_submissions(&self_addr, &bounty_id),
            Error::CrossContractCallFailed,
        )?;

        submission.status = SubmissionStatus::Verifying;
        Self::save(&env, &submission);

        let dispatcher = DispatcherClient::new(&env, &dispatcher_addr);
        let token = settle(
            dispatcher.try_request_verification(
                &self_addr,
                &submission_id,
                &data_ref,
                &bounty.schema_ref,
            ),
            Error::CrossContractCallFailed,
        )?;
        submission.request_token = token.clone();
        Self::save(&env, &submission);

        emit_submission_received(
            &env,
            SubmissionReceived {
                version: EVENT_VERSION_V1,
                submission_id,
                bounty_id,
                contributor,
                data_ref,
                request_token: token,
                timestamp: now,
            },
        );

        reentrancy_guard::release(&env);
        Ok(submission_id)
    }

    /// Apply a verdict delivered by the dispatcher.
    ///
    /// A positive verdict for a bounty that is still Active completes the
    /// bounty and releases its escrow to the contributor; if either call
    /// fails the whole delivery fails and the submission stays Verifying.
    /// A positive verdict for a bounty that already left Active resolves
    /// the submission as Rejected (flagged `late`) without moving funds.
    pub fn handle_verification_result(
        env: Env,
        caller: Address,
        submission_id: u64,
        verified: bool,
        aux_data: Bytes,
    ) -> Result<(), Error> {
        reentrancy_guard::acquire(&env);
        access::require_capability(&env, &caller, Capability::DeliverVerification)?;

        let mut submission = Self::load(&env, submission_id)?;
        if submission.status != SubmissionStatus::Verifying {
            return Err(Error::InvalidStatus);
        }

        let now = env.ledger().timestamp();
        submission.verified_at = Some(now);
        submission.aux_data = aux_data;

        let mut late = false;
        let mut paid = 0i128;
        if verified {
            let registry = RegistryClient::new(&env, &Self::registry(&env)?);
            let bounty = settle(
                registry.try_get_bounty(&submission.bounty_id),
                Error::CrossContractCallFailed,
            )?;
            if bounty.status == BountyStatus::Active {
                submission.status = SubmissionStatus::Verified;
                Self::save(&env, &submission);

                let self_addr = env.current_contract_address();
                settle(
                    registry.try_complete_bounty(
                        &self_addr,
                        &submission.bounty_id,
                        &submission.contributor,
                        &submission.data_ref,
                    ),
                    Error::CrossContractCallFailed,
                )?;
                let custodian = CustodianClient::new(&env, &Self::escrow(&env)?);
                let release = custodian.try_release(
                    &self_addr,
                    &submission.bounty_id,
                    &submission.contributor,
                );
                paid = settle(release, Error::CrossContractCallFailed)?;
            } else {
                late = true;
                submission.status = SubmissionStatus::Rejected;
                Self::save(&env, &submission);
            }
        } else {
            submission.status = SubmissionStatus::Rejected;
            Self::save(&env, &submission);
        }

        emit_submission_resolved(
            &env,
            SubmissionResolved {
                version: EVENT_VERSION_V1,
                submission_id,
                bounty_id: submission.bounty_id,
                contributor: submission.contributor,
                verified: submission.status == SubmissionStatus::Verified,
                late,
                paid,
                timestamp: now,
            },
        );

        reentrancy_guard::release(&env);
        Ok(())
    }

    // ---- views ----

    pub fn get_submission(env: Env, submission_id: u64) -> Result<Submission, Error> {
        Self::load(&env, submission_id)
    }

    pub fn get_bounty_submissions(env: Env, bounty_id: u64) -> Vec<u64> {
        env.storage()
            .persistent()
            .get(&DataKey::BountySubmissions(bounty_id))
            .unwrap_or(vec![&env])
    }

    pub fn get_contributor_submissions(env: Env, contributor: Address) -> Vec<u64> {
        env.storage()
            .persistent()
            .get(&DataKey::ContributorSubmissions(contributor))
            .unwrap_or(vec![&env])
    }

    pub fn get_total_submissions(env: Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::SubmissionCounter)
            .unwrap_or(0)
    }

    pub fn get_registry(env: Env) -> Option<Address> {
        env.storage().instance().get(&DataKey::Registry)
    }

    pub fn get_escrow(env: Env) -> Option<Address> {
        env.storage().instance().get(&DataKey::Escrow)
    }

    pub fn get_dispatcher(env: Env) -> Option<Address> {
        env.storage().instance().get(&DataKey::Dispatcher)
    }
}

impl SubmissionCoordinatorContract {
    fn wire(env: &Env, key: DataKey, role: Symbol, address: Address) -> Result<(), Error> {
        access::require_admin(env)?;
        env.storage().instance().set(&key, &address);
        emit_collaborator_wired(
            env,
            CollaboratorWired {
                version: EVENT_VERSION_V1,
                role,
                address,
                timestamp: env.ledger().timestamp(),
            },
        );
        Ok(())
    }

    fn registry(env: &Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Registry)
            .ok_or(Error::NotInitialized)
    }

    fn escrow(env: &Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Escrow)
            .ok_or(Error::EscrowManagerNotSet)
    }

    fn next_submission_id(env: &Env) -> u64 {
        let id = Self::get_total_submissions(env.clone()) + 1;
        env.storage()
            .instance()
            .set(&DataKey::SubmissionCounter, &id);
        id
    }

    fn load(env: &Env, submission_id: u64) -> Result<Submission, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Submission(submission_id))
            .ok_or(Error::SubmissionNotFound)
    }

    fn save(env: &Env, submission: &Submission) {
        env.storage()
            .persistent()
            .set(&DataKey::Submission(submission.id), submission);
    }

    fn index(env: &Env, key: DataKey, submission_id: u64) {
        let mut ids: Vec<u64> = env
            .storage()
            .persistent()
            .get(&key)
            .unwrap_or(vec![env]);
        ids.push_back(submission_id);
        env.storage().persistent().set(&key, &ids);
    }
}
