//! Typed view over a key/value store
//!
//! [`State`] is what every manager reads and writes through. It owns no data;
//! it decodes and encodes records against whatever store (usually a
//! [`crate::cache::CacheLayer`]) it was opened on.

use crate::coins::Coins;
use crate::codec::{decode, encode};
use crate::keys;
use crate::store::KvStore;
use crate::types::{Account, AccountName, Donation, Like, Permlink, Post, View};
use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};

/// Typed accessor over a store
pub struct State<'a> {
    store: &'a mut dyn KvStore,
}

impl<'a> State<'a> {
    /// Open on a store
    pub fn new(store: &'a mut dyn KvStore) -> Self {
        Self { store }
    }

    fn load<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        self.store.get(key).map(|bytes| decode(&bytes)).transpose()
    }

    fn save<T: Serialize>(&mut self, key: Vec<u8>, value: &T) -> Result<()> {
        let bytes = encode(value)?;
        self.store.set(key, bytes);
        Ok(())
    }

    /// Chain id, empty before genesis
    pub fn chain_id(&self) -> Result<String> {
        match self.store.get(keys::CHAIN_ID_KEY) {
            Some(bytes) => String::from_utf8(bytes)
                .map_err(|e| Error::InvariantViolation(format!("chain id is not UTF-8: {}", e))),
            None => Ok(String::new()),
        }
    }

    /// Store the chain id (raw UTF-8)
    pub fn set_chain_id(&mut self, chain_id: &str) {
        self.store
            .set(keys::CHAIN_ID_KEY.to_vec(), chain_id.as_bytes().to_vec());
    }

    /// Account, if registered
    pub fn account(&self, name: &AccountName) -> Result<Option<Account>> {
        self.load(&keys::account_key(name))
    }

    /// Write an account
    pub fn set_account(&mut self, account: &Account) -> Result<()> {
        self.save(keys::account_key(&account.username), account)
    }

    /// Whether an account exists
    pub fn has_account(&self, name: &AccountName) -> bool {
        self.store.has(&keys::account_key(name))
    }

    /// Post, if created
    pub fn post(&self, permlink: &Permlink) -> Result<Option<Post>> {
        self.load(&keys::post_key(permlink))
    }

    /// Write a post
    pub fn set_post(&mut self, post: &Post) -> Result<()> {
        self.save(keys::post_key(&post.permlink), post)
    }

    /// Whether a post exists
    pub fn has_post(&self, permlink: &Permlink) -> bool {
        self.store.has(&keys::post_key(permlink))
    }

    /// Like by `liker` on `permlink`
    pub fn like(&self, liker: &AccountName, permlink: &Permlink) -> Result<Option<Like>> {
        let like: Option<Like> = self.load(&keys::like_key(liker, permlink))?;
        match like {
            Some(like) if like.liker != *liker || like.permlink != *permlink => {
                Err(Error::InvariantViolation(format!(
                    "like of {} on {} stored under {} on {}",
                    like.liker, like.permlink, liker, permlink
                )))
            }
            like => Ok(like),
        }
    }

    /// Write a like
    pub fn set_like(&mut self, like: &Like) -> Result<()> {
        self.save(keys::like_key(&like.liker, &like.permlink), like)
    }

    /// View record of `viewer` on `permlink`
    pub fn view(&self, viewer: &AccountName, permlink: &Permlink) -> Result<Option<View>> {
        let view: Option<View> = self.load(&keys::view_key(viewer, permlink))?;
        match view {
            Some(view) if view.viewer != *viewer || view.permlink != *permlink => {
                Err(Error::InvariantViolation(format!(
                    "view of {} on {} stored under {} on {}",
                    view.viewer, view.permlink, viewer, permlink
                )))
            }
            view => Ok(view),
        }
    }

    /// Write a view record
    pub fn set_view(&mut self, view: &View) -> Result<()> {
        self.save(keys::view_key(&view.viewer, &view.permlink), view)
    }

    /// Donations by `donator` to `permlink`, oldest first
    pub fn donations(&self, donator: &AccountName, permlink: &Permlink) -> Result<Vec<Donation>> {
        Ok(self
            .load(&keys::donation_key(donator, permlink))?
            .unwrap_or_default())
    }

    /// Append a donation record
    pub fn append_donation(&mut self, permlink: &Permlink, donation: Donation) -> Result<()> {
        let key = keys::donation_key(&donation.donator, permlink);
        let mut list: Vec<Donation> = self.load(&key)?.unwrap_or_default();
        list.push(donation);
        self.save(key, &list)
    }

    /// Posts maturing at `height`, in scheduling order
    pub fn reward_bucket(&self, height: u64) -> Result<Vec<Permlink>> {
        Ok(self.load(&keys::reward_key(height))?.unwrap_or_default())
    }

    /// Append a post to the bucket at `height`
    pub fn push_reward_bucket(&mut self, height: u64, permlink: Permlink) -> Result<()> {
        let mut bucket = self.reward_bucket(height)?;
        bucket.push(permlink);
        self.save(keys::reward_key(height), &bucket)
    }

    /// Consume the bucket at `height`
    pub fn clear_reward_bucket(&mut self, height: u64) {
        self.store.delete(&keys::reward_key(height));
    }

    /// Accumulated platform fees
    pub fn fee_pool(&self) -> Result<Coins> {
        Ok(self.load(keys::FEE_POOL_KEY)?.unwrap_or_default())
    }

    /// Add to the fee pool
    pub fn add_to_fee_pool(&mut self, fee: &Coins) -> Result<()> {
        if fee.is_zero() {
            return Ok(());
        }
        let pool = self.fee_pool()?.plus(fee);
        self.save(keys::FEE_POOL_KEY.to_vec(), &pool)
    }
}

impl std::fmt::Debug for State<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State").finish_non_exhaustive()
    }
}
