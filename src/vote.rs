//! Vote state machine.
//!
//! The per-(post, user) state is the stored vote value: absent or 0 means
//! no active vote, +1/-1 means an active vote in that direction. A stored 0
//! (the author seed, or a retracted vote) does not lock the holder out; a
//! cast from 0 is a first vote.
//!
//! The transition is a pure function so both backends share one decision
//! table; the Redis Lua unit mirrors it operation for operation.

use crate::interfaces::{Direction, StoreError, VoteOutcome};

/// Deltas an accepted cast applies, in vote units (callers multiply the
/// score units by the configured vote weight).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteDelta {
    pub outcome: VoteOutcome,
    /// Net change to the stored vote value sum.
    pub score_units: i64,
    /// Change to the active up-vote count.
    pub votes_delta: i64,
}

/// Decide what a cast does given the previously stored value.
///
/// `previous` is the stored vote value in {-1, 0, +1}; pass 0 when no
/// record exists. Re-casting the identical direction is rejected.
pub fn transition(
    post: &str,
    user: &str,
    previous: i64,
    cast: Direction,
) -> Result<VoteDelta, StoreError> {
    let v = cast.value();
    if previous == v {
        return Err(StoreError::AlreadyVoted {
            post: post.to_string(),
            user: user.to_string(),
        });
    }

    Ok(VoteDelta {
        outcome: if previous == 0 {
            VoteOutcome::First
        } else {
            VoteOutcome::Reversed
        },
        score_units: v - previous,
        // votes counts active up-votes: +1 when a vote becomes Up,
        // -1 when an Up vote stops being Up.
        votes_delta: (v == 1) as i64 - (previous == 1) as i64,
    })
}
