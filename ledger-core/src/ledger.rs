//! Account ledger
//!
//! Balances, sequence counters and keys. Every function operates on a
//! [`State`] or an already-loaded [`Account`]; nothing here touches the store
//! directly or keeps state between calls.
//!
//! # Invariants
//!
//! - Balances never go negative in any denom
//! - A sequence only moves by exactly 1, and only after the signature verified

use crate::coins::Coins;
use crate::state::State;
use crate::types::{Account, AccountName, BlockContext, PubKey, Signature};
use crate::{Error, Result};
use tracing::debug;

/// Account, if registered
pub fn get_account(state: &State<'_>, name: &AccountName) -> Result<Option<Account>> {
    state.account(name)
}

/// Account, or `UnknownAccount`
pub fn must_get_account(state: &State<'_>, name: &AccountName) -> Result<Account> {
    state
        .account(name)?
        .ok_or_else(|| Error::UnknownAccount(name.to_string()))
}

/// Write an account back
pub fn set_account(state: &mut State<'_>, account: &Account) -> Result<()> {
    state.set_account(account)
}

/// Register a new account with an empty balance
pub fn create_account(
    state: &mut State<'_>,
    ctx: &BlockContext,
    name: &AccountName,
    pub_key: PubKey,
) -> Result<Account> {
    if state.has_account(name) {
        return Err(Error::AccountAlreadyExists(name.to_string()));
    }

    let account = Account::new(name.clone(), pub_key, ctx);
    state.set_account(&account)?;

    debug!(account = %name, height = ctx.height, "account created");
    Ok(account)
}

/// Credit coins
pub fn add_coin(account: &mut Account, coins: &Coins) {
    account.balance = account.balance.plus(coins);
}

/// Debit coins, failing without mutation if any denom would go negative
pub fn minus_coin(account: &mut Account, coins: &Coins) -> Result<()> {
    let remaining = account.balance.checked_minus(coins).ok_or_else(|| {
        Error::InsufficientFunds(format!(
            "{} holds {}, needs {}",
            account.username, account.balance, coins
        ))
    })?;
    account.balance = remaining;
    Ok(())
}

fn check_signature(account: &Account, signature: &Signature, sign_bytes: &[u8]) -> Result<()> {
    if signature.verify(sign_bytes, &account.pub_key) {
        Ok(())
    } else {
        Err(Error::InvalidSignature(format!(
            "signature does not match key of {}",
            account.username
        )))
    }
}

/// Check `provided == sequence + 1`, then the signature, then bump
pub fn verify_and_bump_sequence(
    account: &mut Account,
    provided: u64,
    signature: &Signature,
    sign_bytes: &[u8],
) -> Result<()> {
    let expected = account.sequence + 1;
    if provided != expected {
        return Err(Error::InvalidSequence {
            expected,
            got: provided,
        });
    }
    check_signature(account, signature, sign_bytes)?;
    account.sequence = expected;
    Ok(())
}

/// Same discipline as [`verify_and_bump_sequence`] on the post counter
pub fn verify_and_bump_post_sequence(
    account: &mut Account,
    provided: u64,
    signature: &Signature,
    sign_bytes: &[u8],
) -> Result<()> {
    let expected = account.post_sequence + 1;
    if provided != expected {
        return Err(Error::InvalidSequence {
            expected,
            got: provided,
        });
    }
    check_signature(account, signature, sign_bytes)?;
    account.post_sequence = expected;
    Ok(())
}

/// Verify a self-signed registration against the key it registers
pub fn verify_registration(
    pub_key: &PubKey,
    signature: &Signature,
    sign_bytes: &[u8],
) -> Result<()> {
    if signature.verify(sign_bytes, pub_key) {
        Ok(())
    } else {
        Err(Error::InvalidSignature(
            "registration must be signed by the registered key".to_string(),
        ))
    }
}

/// Bump last activity
pub fn touch(account: &mut Account, ctx: &BlockContext) {
    account.last_activity = ctx.time;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coins::Coin;
    use crate::crypto::KeyPair;
    use crate::store::MemStore;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn ctx() -> BlockContext {
        BlockContext::new(1, Utc::now())
    }

    fn funded(keypair: &KeyPair, amount: i64) -> Account {
        let mut account = Account::new(AccountName::new("alice"), keypair.public_key(), &ctx());
        add_coin(&mut account, &Coins::from(Coin::new("mycoin", amount)));
        account
    }

    #[test]
    fn test_create_account_twice_fails() {
        let mut store = MemStore::new();
        let mut state = State::new(&mut store);
        let name = AccountName::new("alice");
        let key = KeyPair::generate().public_key();

        create_account(&mut state, &ctx(), &name, key).unwrap();
        let err = create_account(&mut state, &ctx(), &name, key).unwrap_err();
        assert!(matches!(err, Error::AccountAlreadyExists(_)));
    }

    #[test]
    fn test_must_get_unknown() {
        let mut store = MemStore::new();
        let state = State::new(&mut store);
        let err = must_get_account(&state, &AccountName::new("ghost")).unwrap_err();
        assert!(matches!(err, Error::UnknownAccount(_)));
    }

    #[test]
    fn test_minus_coin_insufficient_leaves_balance() {
        let keypair = KeyPair::generate();
        let mut account = funded(&keypair, 7);

        let err = minus_coin(&mut account, &Coins::from(Coin::new("mycoin", 8))).unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds(_)));
        assert_eq!(account.balance.amount_of("mycoin"), Decimal::from(7));

        minus_coin(&mut account, &Coins::from(Coin::new("mycoin", 5))).unwrap();
        assert_eq!(account.balance.amount_of("mycoin"), Decimal::from(2));
    }

    #[test]
    fn test_sequence_checked_before_signature() {
        let keypair = KeyPair::generate();
        let mut account = funded(&keypair, 1);

        // Bad signature and bad sequence: sequence wins
        let err = verify_and_bump_sequence(&mut account, 5, &Signature::empty(), b"x").unwrap_err();
        assert!(matches!(err, Error::InvalidSequence { expected: 1, got: 5 }));

        let err = verify_and_bump_sequence(&mut account, 1, &Signature::empty(), b"x").unwrap_err();
        assert!(matches!(err, Error::InvalidSignature(_)));
        assert_eq!(account.sequence, 0);

        let sig = keypair.sign(b"x");
        verify_and_bump_sequence(&mut account, 1, &sig, b"x").unwrap();
        assert_eq!(account.sequence, 1);
    }

    #[test]
    fn test_post_sequence_is_independent() {
        let keypair = KeyPair::generate();
        let mut account = funded(&keypair, 1);
        let sig = keypair.sign(b"p");

        verify_and_bump_post_sequence(&mut account, 1, &sig, b"p").unwrap();
        assert_eq!(account.post_sequence, 1);
        assert_eq!(account.sequence, 0);
    }

    #[test]
    fn test_registration_signed_by_other_key() {
        let owner = KeyPair::generate();
        let other = KeyPair::generate();
        let sig = other.sign(b"reg");
        assert!(verify_registration(&owner.public_key(), &sig, b"reg").is_err());
        assert!(verify_registration(&other.public_key(), &sig, b"reg").is_ok());
    }
}
