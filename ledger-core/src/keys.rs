//! Store key-space
//!
//! Prefixes are part of the persisted format and must not change.
//!
//! Keys naming an (account, post) pair put [`PAIR_SEPARATOR`] between the
//! two parts. `/` never occurs in a username, so no two pairs share a key.

use crate::types::{AccountName, Permlink};

/// Account prefix
pub const ACCOUNT_PREFIX: &[u8] = b"account/";
/// Post prefix
pub const POST_PREFIX: &[u8] = b"post/";
/// Like prefix
pub const LIKE_PREFIX: &[u8] = b"like/";
/// View prefix
pub const VIEW_PREFIX: &[u8] = b"view/";
/// Donation list prefix
pub const DONATION_PREFIX: &[u8] = b"donation/";
/// Reward schedule prefix
pub const REWARD_PREFIX: &[u8] = b"APP/REWARD/";
/// Chain identifier
pub const CHAIN_ID_KEY: &[u8] = b"base/chain_id";
/// Accumulated platform fees
pub const FEE_POOL_KEY: &[u8] = b"base/fee_pool";
/// Between the account and the permlink of a pair key
pub const PAIR_SEPARATOR: &[u8] = b"/";

fn join(prefix: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    let len = prefix.len() + parts.iter().map(|p| p.len()).sum::<usize>();
    let mut key = Vec::with_capacity(len);
    key.extend_from_slice(prefix);
    for part in parts {
        key.extend_from_slice(part);
    }
    key
}

/// `account/<username>`
pub fn account_key(name: &AccountName) -> Vec<u8> {
    join(ACCOUNT_PREFIX, &[name.as_bytes()])
}

/// `post/<permlink>`
pub fn post_key(permlink: &Permlink) -> Vec<u8> {
    join(POST_PREFIX, &[permlink.as_bytes()])
}

/// `like/<liker>/<permlink>`
pub fn like_key(liker: &AccountName, permlink: &Permlink) -> Vec<u8> {
    join(
        LIKE_PREFIX,
        &[liker.as_bytes(), PAIR_SEPARATOR, permlink.as_bytes()],
    )
}

/// `view/<viewer>/<permlink>`
pub fn view_key(viewer: &AccountName, permlink: &Permlink) -> Vec<u8> {
    join(
        VIEW_PREFIX,
        &[viewer.as_bytes(), PAIR_SEPARATOR, permlink.as_bytes()],
    )
}

/// `donation/<donator>/<permlink>`
pub fn donation_key(donator: &AccountName, permlink: &Permlink) -> Vec<u8> {
    join(
        DONATION_PREFIX,
        &[donator.as_bytes(), PAIR_SEPARATOR, permlink.as_bytes()],
    )
}

/// `APP/REWARD/<height>` with the height as 8 big-endian bytes
pub fn reward_key(height: u64) -> Vec<u8> {
    join(REWARD_PREFIX, &[&height.to_be_bytes()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let alice = AccountName::new("alice");
        let bob = AccountName::new("bob");
        let permlink = Permlink::new(&alice, "p1");

        assert_eq!(account_key(&alice), b"account/alice".to_vec());
        assert_eq!(post_key(&permlink), b"post/alice#p1".to_vec());
        assert_eq!(like_key(&bob, &permlink), b"like/bob/alice#p1".to_vec());
        assert_eq!(view_key(&bob, &permlink), b"view/bob/alice#p1".to_vec());
        assert_eq!(donation_key(&bob, &permlink), b"donation/bob/alice#p1".to_vec());
    }

    #[test]
    fn test_pair_keys_do_not_collide() {
        let alice = AccountName::new("alice");
        let aliceb = AccountName::new("aliceb");
        let bobby_p = Permlink::new(&AccountName::new("bobby"), "p");
        let obby_p = Permlink::new(&AccountName::new("obby"), "p");

        assert_ne!(like_key(&alice, &bobby_p), like_key(&aliceb, &obby_p));
        assert_ne!(view_key(&alice, &bobby_p), view_key(&aliceb, &obby_p));
        assert_ne!(
            donation_key(&alice, &bobby_p),
            donation_key(&aliceb, &obby_p)
        );
    }

    #[test]
    fn test_reward_keys_sort_by_height() {
        let low = reward_key(255);
        let high = reward_key(256);
        assert!(low < high);
        assert!(low.starts_with(REWARD_PREFIX));
        assert_eq!(low.len(), REWARD_PREFIX.len() + 8);
    }
}
