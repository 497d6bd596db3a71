use crate::access::{self, Capability};
use crate::interfaces::settle;
use crate::{reentrancy_guard, BountyStatus, Error};
use soroban_sdk::{contract, contractimpl, testutils::Address as _, Address, Env};

#[contract]
pub struct GuardedHarness;

#[contractimpl]
impl GuardedHarness {
    pub fn init(env: Env, admin: Address) -> Result<(), Error> {
        access::init_admin(&env, &admin)
    }

    pub fn grant(env: Env, principal: Address, capability: Capability) -> Result<(), Error> {
        access::grant(&env, &principal, capability)
    }

    pub fn revoke(env: Env, principal: Address, capability: Capability) -> Result<(), Error> {
        access::revoke(&env, &principal, capability)
    }

    pub fn guarded(env: Env, caller: Address) -> Result<(), Error> {
        access::require_capability(&env, &caller, Capability::Release)
    }
}

fn setup(env: &Env) -> (GuardedHarnessClient<'_>, Address, Address) {
    env.mock_all_auths();
    let contract_id = env.register_contract(None, GuardedHarness);
    let client = GuardedHarnessClient::new(env, &contract_id);
    let admin = Address::generate(env);
    client.init(&admin);
    (client, contract_id, admin)
}

#[test]
fn test_init_twice_fails() {
    let env = Env::default();
    let (client, _, admin) = setup(&env);
    assert_eq!(client.try_init(&admin), Err(Ok(Error::AlreadyInitialized)));
}

#[test]
fn test_capability_must_be_granted() {
    let env = Env::default();
    let (client, _, _) = setup(&env);
    let principal = Address::generate(&env);

    assert_eq!(client.try_guarded(&principal), Err(Ok(Error::Unauthorized)));

    client.grant(&principal, &Capability::Release);
    client.guarded(&principal);
}

#[test]
fn test_capability_is_not_transferable_between_operations() {
    let env = Env::default();
    let (client, _, _) = setup(&env);
    let principal = Address::generate(&env);

    client.grant(&principal, &Capability::Refund);
    assert_eq!(client.try_guarded(&principal), Err(Ok(Error::Unauthorized)));
}

#[test]
fn test_revoke_removes_capability() {
    let env = Env::default();
    let (client, contract_id, _) = setup(&env);
    let principal = Address::generate(&env);

    client.grant(&principal, &Capability::Release);
    client.revoke(&principal, &Capability::Release);

    assert_eq!(client.try_guarded(&principal), Err(Ok(Error::Unauthorized)));
    let still_granted = env.as_contract(&contract_id, || {
        access::has_capability(&env, &principal, Capability::Release)
    });
    assert!(!still_granted);
}

#[test]
fn test_uninitialized_contract_rejects_privileged_call() {
    let env = Env::default();
    env.mock_all_auths();
    let contract_id = env.register_contract(None, GuardedHarness);
    let client = GuardedHarnessClient::new(&env, &contract_id);
    let caller = Address::generate(&env);

    assert_eq!(client.try_guarded(&caller), Err(Ok(Error::NotInitialized)));
}

#[test]
fn test_reentrancy_guard_acquire_release() {
    let env = Env::default();
    let contract_id = env.register_contract(None, GuardedHarness);
    env.as_contract(&contract_id, || {
        assert!(!reentrancy_guard::is_active(&env));
        reentrancy_guard::acquire(&env);
        assert!(reentrancy_guard::is_active(&env));
        reentrancy_guard::release(&env);
        assert!(!reentrancy_guard::is_active(&env));
    });
}

#[test]
#[should_panic(expected = "Reentrancy detected")]
fn test_reentrancy_guard_detects_reentry() {
    let env = Env::default();
    let contract_id = env.register_contract(None, GuardedHarness);
    env.as_contract(&contract_id, || {
        reentrancy_guard::acquire(&env);
        reentrancy_guard::acquire(&env);
    });
}

#[test]
fn test_settle_passes_callee_error_through() {
    let ok: Result<Result<u32, ()>, Result<Error, ()>> = Ok(Ok(7));
    assert_eq!(settle(ok, Error::CrossContractCallFailed), Ok(7));

    let callee: Result<Result<u32, ()>, Result<Error, ()>> = Err(Ok(Error::InvalidStatus));
    assert_eq!(
        settle(callee, Error::CrossContractCallFailed),
        Err(Error::InvalidStatus)
    );

    let trap: Result<Result<u32, ()>, Result<Error, ()>> = Err(Err(()));
    assert_eq!(
        settle(trap, Error::TransferFailed),
        Err(Error::TransferFailed)
    );
}

#[test]
fn test_terminal_bounty_statuses() {
    assert!(!BountyStatus::Draft.is_terminal());
    assert!(!BountyStatus::Active.is_terminal());
    assert!(BountyStatus::Completed.is_terminal());
    assert!(BountyStatus::Cancelled.is_terminal());
    assert!(BountyStatus::Expired.is_terminal());
}
