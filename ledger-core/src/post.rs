//! Content graph: posts, comments, reposts, likes and views
//!
//! Parent and source links must point at posts that already exist, so the
//! graph is append-only and acyclic. A repost always stores the *root* of its
//! source chain, which keeps donation splits two-party no matter how deep the
//! chain gets.

use crate::coins::Coins;
use crate::state::State;
use crate::types::{AccountName, BlockContext, Donation, Like, Permlink, Post, View};
use crate::{Error, Result};
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Largest like weight magnitude
pub const MAX_LIKE_WEIGHT: i64 = 10_000;

/// Fields of a post about to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    /// Author
    pub author: AccountName,
    /// Human-chosen id
    pub post_id: String,
    /// Author's post sequence for this post
    pub sequence: u64,
    /// Title
    pub title: String,
    /// Content
    pub content: String,
    /// Commented post
    pub parent: Option<Permlink>,
    /// Reposted post (any depth; resolved to its root)
    pub source: Option<Permlink>,
    /// Fraction of donations the repost keeps
    pub split_rate: Decimal,
}

impl NewPost {
    /// Permlink the post will be stored under
    pub fn permlink(&self) -> Permlink {
        Permlink::new(&self.author, &self.post_id)
    }
}

/// Post, if created
pub fn get_post(state: &State<'_>, permlink: &Permlink) -> Result<Option<Post>> {
    state.post(permlink)
}

/// Post, or `UnknownPost`
pub fn must_get_post(state: &State<'_>, permlink: &Permlink) -> Result<Post> {
    state
        .post(permlink)?
        .ok_or_else(|| Error::UnknownPost(permlink.to_string()))
}

/// Like by `liker`, if any
pub fn get_like(state: &State<'_>, liker: &AccountName, permlink: &Permlink) -> Result<Option<Like>> {
    state.like(liker, permlink)
}

/// View record of `viewer`, if any
pub fn get_view(state: &State<'_>, viewer: &AccountName, permlink: &Permlink) -> Result<Option<View>> {
    state.view(viewer, permlink)
}

/// Donations by `donator` to `permlink`, oldest first
pub fn get_donations(
    state: &State<'_>,
    donator: &AccountName,
    permlink: &Permlink,
) -> Result<Vec<Donation>> {
    state.donations(donator, permlink)
}

/// Root of the repost chain `permlink` belongs to (itself for an original)
pub fn root_source(state: &State<'_>, permlink: &Permlink) -> Result<Permlink> {
    let mut current = must_get_post(state, permlink)?;
    // Stored sources are already roots, so this takes at most one step for
    // anything written by `create_post`.
    while let Some(source) = current.source.clone() {
        if source == current.permlink {
            return Err(Error::InvariantViolation(format!(
                "post {} is its own source",
                source
            )));
        }
        current = must_get_post(state, &source)?;
    }
    Ok(current.permlink)
}

/// Preconditions of `create_post`, without mutation
pub fn check_create(state: &State<'_>, new: &NewPost) -> Result<()> {
    let permlink = new.permlink();
    if state.has_post(&permlink) {
        return Err(Error::PostAlreadyExists(permlink.to_string()));
    }
    if let Some(parent) = &new.parent {
        let parent = must_get_post(state, parent)?;
        if !parent.allow_replies {
            return Err(Error::InvalidInput(format!(
                "post {} does not accept replies",
                parent.permlink
            )));
        }
    }
    if let Some(source) = &new.source {
        if !state.has_post(source) {
            return Err(Error::UnknownPost(source.to_string()));
        }
    }
    Ok(())
}

/// Create a post and schedule its reward payout at `height + maturity_interval`
pub fn create_post(
    state: &mut State<'_>,
    ctx: &BlockContext,
    maturity_interval: u64,
    new: NewPost,
) -> Result<Post> {
    check_create(state, &new)?;
    let permlink = new.permlink();

    let source = match &new.source {
        Some(source) => {
            let root = root_source(state, source)?;
            let mut root_post = must_get_post(state, &root)?;
            root_post.last_activity = ctx.time;
            state.set_post(&root_post)?;
            Some(root)
        }
        None => None,
    };

    if let Some(parent_link) = &new.parent {
        let mut parent = must_get_post(state, parent_link)?;
        parent.comments.push(permlink.clone());
        parent.last_activity = ctx.time;
        state.set_post(&parent)?;
    }

    let maturity_height = ctx.height.checked_add(maturity_interval).ok_or_else(|| {
        Error::InvalidInput(format!("maturity height overflows at {}", ctx.height))
    })?;

    let post = Post {
        permlink: permlink.clone(),
        author: new.author,
        post_id: new.post_id,
        sequence: new.sequence,
        title: new.title,
        content: new.content,
        parent: new.parent,
        source,
        created_at: ctx.time,
        last_update: ctx.time,
        last_activity: ctx.time,
        created_height: ctx.height,
        allow_replies: true,
        is_deleted: false,
        reward: Coins::empty(),
        total_reward: Coins::empty(),
        reward_issued_height: None,
        comments: Vec::new(),
        total_like_weight: 0,
        total_dislike_weight: 0,
        like_count: 0,
        donate_count: 0,
        view_count: 0,
        split_rate: new.split_rate,
    };
    state.set_post(&post)?;
    state.push_reward_bucket(maturity_height, permlink.clone())?;

    debug!(
        permlink = %permlink,
        height = ctx.height,
        maturity_height,
        "post created"
    );
    Ok(post)
}

/// Like, dislike, or change an earlier vote
///
/// Afterwards `total_like_weight` is the sum of every positive weight and
/// `total_dislike_weight` the magnitude of every negative one.
pub fn like_or_update(
    state: &mut State<'_>,
    ctx: &BlockContext,
    permlink: &Permlink,
    liker: &AccountName,
    weight: i64,
) -> Result<()> {
    if !(-MAX_LIKE_WEIGHT..=MAX_LIKE_WEIGHT).contains(&weight) {
        return Err(Error::InvalidInput(format!("invalid like weight {}", weight)));
    }
    let mut post = must_get_post(state, permlink)?;

    let like = match state.like(liker, permlink)? {
        Some(mut prior) => {
            if prior.weight > 0 {
                post.total_like_weight -= prior.weight;
            } else if prior.weight < 0 {
                post.total_dislike_weight += prior.weight;
            }
            prior.weight = weight;
            prior.updated_at = ctx.time;
            prior
        }
        None => {
            post.like_count += 1;
            Like {
                liker: liker.clone(),
                permlink: permlink.clone(),
                weight,
                created_at: ctx.time,
                updated_at: ctx.time,
            }
        }
    };

    if weight > 0 {
        post.total_like_weight += weight;
    } else if weight < 0 {
        post.total_dislike_weight -= weight;
    }

    if post.total_like_weight < 0 || post.total_dislike_weight < 0 {
        return Err(Error::InvariantViolation(format!(
            "like aggregates of {} went negative",
            permlink
        )));
    }

    state.set_like(&like)?;
    state.set_post(&post)?;
    debug!(permlink = %permlink, account = %liker, weight, "like recorded");
    Ok(())
}

/// Record a view; every call counts
pub fn view(
    state: &mut State<'_>,
    ctx: &BlockContext,
    permlink: &Permlink,
    viewer: &AccountName,
) -> Result<()> {
    let mut post = must_get_post(state, permlink)?;
    post.view_count += 1;

    let record = match state.view(viewer, permlink)? {
        Some(mut prior) => {
            prior.times += 1;
            prior.last_view_at = ctx.time;
            prior
        }
        None => View {
            viewer: viewer.clone(),
            permlink: permlink.clone(),
            times: 1,
            last_view_at: ctx.time,
        },
    };

    state.set_view(&record)?;
    state.set_post(&post)?;
    Ok(())
}

/// Governance removal: content wiped, replies closed, id and rewards kept
pub fn delete_post(state: &mut State<'_>, ctx: &BlockContext, permlink: &Permlink) -> Result<()> {
    let mut post = must_get_post(state, permlink)?;
    post.title.clear();
    post.content.clear();
    post.is_deleted = true;
    post.allow_replies = false;
    post.last_update = ctx.time;
    state.set_post(&post)?;
    info!(permlink = %permlink, height = ctx.height, "post deleted by governance");
    Ok(())
}
