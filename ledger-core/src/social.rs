//! Follow graph
//!
//! Both operations are idempotent; the follower's last activity moves either way.

use crate::ledger::{must_get_account, touch};
use crate::state::State;
use crate::types::{AccountName, BlockContext};
use crate::{Error, Result};
use tracing::debug;

fn distinct(follower: &AccountName, followee: &AccountName) -> Result<()> {
    if follower == followee {
        return Err(Error::InvalidInput(format!("{} cannot follow itself", follower)));
    }
    Ok(())
}

/// `follower` starts following `followee`
pub fn follow(
    state: &mut State<'_>,
    ctx: &BlockContext,
    follower: &AccountName,
    followee: &AccountName,
) -> Result<()> {
    distinct(follower, followee)?;
    let mut a = must_get_account(state, follower)?;
    let mut b = must_get_account(state, followee)?;

    let added = a.following.insert(followee.clone());
    b.followers.insert(follower.clone());
    touch(&mut a, ctx);

    state.set_account(&a)?;
    state.set_account(&b)?;
    debug!(account = %follower, followee = %followee, added, "follow");
    Ok(())
}

/// `follower` stops following `followee`; no-op if it was not following
pub fn unfollow(
    state: &mut State<'_>,
    ctx: &BlockContext,
    follower: &AccountName,
    followee: &AccountName,
) -> Result<()> {
    distinct(follower, followee)?;
    let mut a = must_get_account(state, follower)?;
    let mut b = must_get_account(state, followee)?;

    let removed = a.following.remove(followee);
    b.followers.remove(follower);
    touch(&mut a, ctx);

    state.set_account(&a)?;
    state.set_account(&b)?;
    debug!(account = %follower, followee = %followee, removed, "unfollow");
    Ok(())
}
