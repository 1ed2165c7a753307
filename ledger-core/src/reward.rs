//! Reward economy
//!
//! Donations accrue on posts; authors are paid only when the post matures.
//! The platform fee goes to the fee pool, so
//! `Σ balances + Σ pending post rewards + fee pool` is unchanged by every
//! donation and every sweep.

use crate::coins::Coins;
use crate::ledger;
use crate::post::must_get_post;
use crate::state::State;
use crate::types::{AccountName, BlockContext, Donation, Permlink, Post};
use crate::{Error, Result};
use tracing::{debug, info};

fn accrue(post: &mut Post, share: &Coins, ctx: &BlockContext) {
    if share.is_zero() {
        return;
    }
    post.reward = post.reward.plus(share);
    post.total_reward = post.total_reward.plus(share);
    post.last_activity = ctx.time;
}

/// Preconditions of `donate`, without mutation
pub fn check_donate(
    state: &State<'_>,
    donator: &AccountName,
    permlink: &Permlink,
    amount: &Coins,
    fee: &Coins,
) -> Result<()> {
    let account = ledger::must_get_account(state, donator)?;
    must_get_post(state, permlink)?;
    if !amount.is_gte(fee) {
        return Err(Error::InvalidInput(format!(
            "fee {} exceeds donation {}",
            fee, amount
        )));
    }
    if !account.balance.is_gte(amount) {
        return Err(Error::InsufficientFunds(format!(
            "{} holds {}, donates {}",
            donator, account.balance, amount
        )));
    }
    Ok(())
}

/// Debit `amount` from the donator and accrue `amount - fee` on the target
///
/// A repost keeps `net × split_rate`; the rest goes to its root source.
pub fn donate(
    state: &mut State<'_>,
    ctx: &BlockContext,
    donator: &AccountName,
    permlink: &Permlink,
    amount: &Coins,
    fee: &Coins,
) -> Result<()> {
    check_donate(state, donator, permlink, amount, fee)?;

    let mut account = ledger::must_get_account(state, donator)?;
    ledger::minus_coin(&mut account, amount)?;
    ledger::touch(&mut account, ctx);
    state.set_account(&account)?;

    let net = amount
        .checked_minus(fee)
        .ok_or_else(|| Error::InvariantViolation("fee exceeds checked donation".to_string()))?;
    state.add_to_fee_pool(fee)?;

    let mut target = must_get_post(state, permlink)?;
    target.donate_count += 1;
    target.last_activity = ctx.time;

    match target.source.clone() {
        Some(root_link) if root_link != target.permlink => {
            let target_share = net.mul_rate(target.split_rate);
            let root_share = net.checked_minus(&target_share).ok_or_else(|| {
                Error::InvariantViolation(format!(
                    "split rate {} of {} exceeds 1",
                    target.split_rate, target.permlink
                ))
            })?;
            accrue(&mut target, &target_share, ctx);
            state.set_post(&target)?;

            let mut root = must_get_post(state, &root_link)?;
            accrue(&mut root, &root_share, ctx);
            state.set_post(&root)?;

            debug!(
                permlink = %permlink,
                root = %root_link,
                target_share = %target_share,
                root_share = %root_share,
                "donation split"
            );
        }
        _ => {
            accrue(&mut target, &net, ctx);
            state.set_post(&target)?;
        }
    }

    state.append_donation(
        permlink,
        Donation {
            donator: donator.clone(),
            amount: amount.clone(),
            fee: fee.clone(),
            created_at: ctx.time,
            height: ctx.height,
        },
    )?;

    debug!(account = %donator, permlink = %permlink, amount = %amount, "donation applied");
    Ok(())
}

/// Pay every post maturing at `height` to its author, then consume the bucket
///
/// Returns the number of posts paid. Running it again for the same height
/// pays nothing.
pub fn issue_matured_rewards(state: &mut State<'_>, height: u64) -> Result<u64> {
    let bucket = state.reward_bucket(height)?;
    if bucket.is_empty() {
        return Ok(0);
    }

    let mut paid = 0;
    for permlink in &bucket {
        let mut post = state.post(permlink)?.ok_or_else(|| {
            Error::InvariantViolation(format!("scheduled post {} is missing", permlink))
        })?;
        if post.reward_issued_height.is_some() {
            continue;
        }

        let mut author = state.account(&post.author)?.ok_or_else(|| {
            Error::InvariantViolation(format!(
                "author {} of scheduled post {} is missing",
                post.author, permlink
            ))
        })?;
        ledger::add_coin(&mut author, &post.reward);
        state.set_account(&author)?;

        debug!(permlink = %permlink, account = %post.author, reward = %post.reward, "reward issued");
        post.reward = Coins::empty();
        post.reward_issued_height = Some(height);
        state.set_post(&post)?;
        paid += 1;
    }

    state.clear_reward_bucket(height);
    info!(height, paid, "matured rewards issued");
    Ok(paid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coins::Coin;
    use crate::post::{create_post, NewPost};
    use crate::store::MemStore;
    use crate::types::{Account, PubKey};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn ctx(height: u64) -> BlockContext {
        BlockContext::new(height, Utc::now())
    }

    fn coins(amount: i64) -> Coins {
        Coins::from(Coin::new("mycoin", amount))
    }

    fn seed_account(state: &mut State<'_>, name: &str, amount: i64) {
        let mut account = Account::new(AccountName::new(name), PubKey::from_bytes([0; 32]), &ctx(0));
        ledger::add_coin(&mut account, &coins(amount));
        state.set_account(&account).unwrap();
    }

    fn seed_post(state: &mut State<'_>, author: &str, id: &str, source: Option<Permlink>, rate: Decimal) {
        let new = NewPost {
            author: AccountName::new(author),
            post_id: id.to_string(),
            sequence: 1,
            title: "t".to_string(),
            content: "c".to_string(),
            parent: None,
            source,
            split_rate: rate,
        };
        create_post(state, &ctx(1), 100, new).unwrap();
    }

    fn link(author: &str, id: &str) -> Permlink {
        Permlink::new(&AccountName::new(author), id)
    }

    #[test]
    fn test_donation_split_to_root() {
        let mut store = MemStore::new();
        let mut state = State::new(&mut store);
        seed_account(&mut state, "dave", 100);
        seed_account(&mut state, "alice", 0);
        seed_account(&mut state, "bob", 0);
        seed_post(&mut state, "alice", "root", None, Decimal::ZERO);
        seed_post(&mut state, "bob", "repost", Some(link("alice", "root")), Decimal::new(15, 2));

        let dave = AccountName::new("dave");
        donate(&mut state, &ctx(2), &dave, &link("bob", "repost"), &coins(100), &coins(1)).unwrap();

        let repost = must_get_post(&state, &link("bob", "repost")).unwrap();
        let root = must_get_post(&state, &link("alice", "root")).unwrap();
        assert_eq!(repost.reward.amount_of("mycoin"), Decimal::new(1485, 2));
        assert_eq!(root.reward.amount_of("mycoin"), Decimal::new(8415, 2));
        assert_eq!(repost.donate_count, 1);
        assert_eq!(root.donate_count, 0);

        let account = ledger::must_get_account(&state, &dave).unwrap();
        assert!(account.balance.is_zero());
        assert_eq!(state.fee_pool().unwrap(), coins(1));
        assert_eq!(state.donations(&dave, &link("bob", "repost")).unwrap().len(), 1);
    }

    #[test]
    fn test_donation_to_original_keeps_net() {
        let mut store = MemStore::new();
        let mut state = State::new(&mut store);
        seed_account(&mut state, "dave", 10);
        seed_post(&mut state, "alice", "p", None, Decimal::ZERO);

        donate(&mut state, &ctx(2), &AccountName::new("dave"), &link("alice", "p"), &coins(10), &coins(2))
            .unwrap();
        let post = must_get_post(&state, &link("alice", "p")).unwrap();
        assert_eq!(post.reward, coins(8));
    }

    #[test]
    fn test_donation_insufficient_funds() {
        let mut store = MemStore::new();
        let mut state = State::new(&mut store);
        seed_account(&mut state, "dave", 5);
        seed_post(&mut state, "alice", "p", None, Decimal::ZERO);

        let err = donate(&mut state, &ctx(2), &AccountName::new("dave"), &link("alice", "p"), &coins(6), &coins(0))
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds(_)));
    }

    #[test]
    fn test_reward_paid_once_at_maturity() {
        let mut store = MemStore::new();
        let mut state = State::new(&mut store);
        seed_account(&mut state, "dave", 50);
        seed_account(&mut state, "alice", 0);
        seed_post(&mut state, "alice", "p", None, Decimal::ZERO);
        donate(&mut state, &ctx(2), &AccountName::new("dave"), &link("alice", "p"), &coins(50), &Coins::empty())
            .unwrap();

        let alice = AccountName::new("alice");
        assert_eq!(issue_matured_rewards(&mut state, 100).unwrap(), 0);
        assert!(ledger::must_get_account(&state, &alice).unwrap().balance.is_zero());

        assert_eq!(issue_matured_rewards(&mut state, 101).unwrap(), 1);
        assert_eq!(ledger::must_get_account(&state, &alice).unwrap().balance, coins(50));

        assert_eq!(issue_matured_rewards(&mut state, 101).unwrap(), 0);
        assert_eq!(ledger::must_get_account(&state, &alice).unwrap().balance, coins(50));

        let post = must_get_post(&state, &link("alice", "p")).unwrap();
        assert!(post.reward.is_zero());
        assert_eq!(post.total_reward, coins(50));
        assert_eq!(post.reward_issued_height, Some(101));
    }

    #[test]
    fn test_missing_author_is_fatal() {
        let mut store = MemStore::new();
        let mut state = State::new(&mut store);
        seed_post(&mut state, "ghost", "p", None, Decimal::ZERO);

        let err = issue_matured_rewards(&mut state, 101).unwrap_err();
        assert!(err.is_fatal());
    }
}
