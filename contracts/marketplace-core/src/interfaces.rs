//! Cross-contract interfaces.
//!
//! Only the entry points one marketplace contract calls on another are
//! declared here. The generated clients are used with their `try_*` variants
//! and [`settle`] so a failing callee surfaces its own error code instead of
//! a host trap.

use crate::{Bounty, Error};
use soroban_sdk::{contractclient, Address, Bytes, BytesN, Env, String};

#[allow(dead_code)]
#[contractclient(name = "CustodianClient")]
pub trait CustodianInterface {
    fn deposit(
        env: Env,
        caller: Address,
        bounty_id: u64,
        depositor: Address,
        amount: i128,
    ) -> Result<(), Error>;

    fn increase_deposit(env: Env, caller: Address, bounty_id: u64, amount: i128)
        -> Result<i128, Error>;

    fn release(env: Env, caller: Address, bounty_id: u64, recipient: Address)
        -> Result<i128, Error>;

    fn refund(env: Env, caller: Address, bounty_id: u64) -> Result<i128, Error>;
}

#[allow(dead_code)]
#[contractclient(name = "RegistryClient")]
pub trait RegistryInterface {
    fn get_bounty(env: Env, bounty_id: u64) -> Result<Bounty, Error>;

    fn increment_submissions(env: Env, caller: Address, bounty_id: u64) -> Result<u32, Error>;

    fn complete_bounty(
        env: Env,
        caller: Address,
        bounty_id: u64,
        winner: Address,
        data_ref: String,
    ) -> Result<(), Error>;
}

#[allow(dead_code)]
#[contractclient(name = "DispatcherClient")]
pub trait DispatcherInterface {
    fn request_verification(
        env: Env,
        caller: Address,
        submission_id: u64,
        data_ref: String,
        schema_ref: String,
    ) -> Result<BytesN<32>, Error>;
}

#[allow(dead_code)]
#[contractclient(name = "CoordinatorClient")]
pub trait CoordinatorInterface {
    fn handle_verification_result(
        env: Env,
        caller: Address,
        submission_id: u64,
        verified: bool,
        aux_data: Bytes,
    ) -> Result<(), Error>;
}

/// Collapse the nested result of a `try_*` client call.
///
/// A marketplace error from the callee is passed through unchanged; anything
/// else (host trap, conversion failure) becomes `fallback`.
pub fn settle<T, C, I>(
    result: Result<Result<T, C>, Result<Error, I>>,
    fallback: Error,
) -> Result<T, Error> {
    match result {
        Ok(Ok(value)) => Ok(value),
        Err(Ok(err)) => Err(err),
        _ => Err(fallback),
    }
}
