pub mod routes;

use std::fmt;

use serde::Serialize;

use crate::store::{StoreError, VoteStore};

pub use crate::blog::models::vote::Vote;

/// Writes that lose a race are retried this many times.
const MAX_CAST_ATTEMPTS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Article,
    Comment,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Article => "article",
            SubjectKind::Comment => "comment",
        }
    }
}

/// Anything that can be voted on, as a (kind, id) reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subject {
    pub kind: SubjectKind,
    pub id: i32,
}

impl Subject {
    pub fn article(id: i32) -> Self {
        Subject {
            kind: SubjectKind::Article,
            id,
        }
    }

    pub fn comment(id: i32) -> Self {
        Subject {
            kind: SubjectKind::Comment,
            id,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Like,
    Dislike,
}

impl Direction {
    pub fn from_is_like(is_like: bool) -> Self {
        if is_like {
            Direction::Like
        } else {
            Direction::Dislike
        }
    }

    pub fn is_like(&self) -> bool {
        matches!(self, Direction::Like)
    }
}

impl From<&Vote> for Direction {
    fn from(vote: &Vote) -> Self {
        Direction::from_is_like(vote.is_like)
    }
}

/// The caller's resulting vote state as shown to clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserVote {
    Liked,
    Disliked,
    #[default]
    None,
}

impl From<Option<Direction>> for UserVote {
    fn from(direction: Option<Direction>) -> Self {
        match direction {
            Some(Direction::Like) => UserVote::Liked,
            Some(Direction::Dislike) => UserVote::Disliked,
            None => UserVote::None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
pub struct Tally {
    pub likes: i64,
    pub dislikes: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastOutcome {
    Recorded(Direction),
    Removed,
    Flipped(Direction),
}

impl CastOutcome {
    pub fn net_direction(&self) -> Option<Direction> {
        match self {
            CastOutcome::Recorded(d) | CastOutcome::Flipped(d) => Some(*d),
            CastOutcome::Removed => None,
        }
    }
}

/// Casts `direction` on `subject` for `voter_id`.
///
/// Repeating the current direction removes the vote, the opposite direction
/// flips it in place. When the insert races another writer for the same pair,
/// the constraint violation sends us back through the update/delete path.
pub async fn cast<S>(
    store: &S,
    subject: Subject,
    voter_id: i32,
    direction: Direction,
) -> Result<CastOutcome, StoreError>
where
    S: VoteStore + ?Sized,
{
    for attempt in 1..=MAX_CAST_ATTEMPTS {
        let result = match store.find_vote(subject, voter_id).await? {
            None => store
                .insert_vote(subject, voter_id, direction)
                .await
                .map(|_| CastOutcome::Recorded(direction)),
            Some(vote) if Direction::from(&vote) == direction => store
                .delete_vote(vote.id)
                .await
                .map(|_| CastOutcome::Removed),
            Some(vote) => store
                .update_vote(vote.id, direction)
                .await
                .map(|_| CastOutcome::Flipped(direction)),
        };

        match result {
            Ok(outcome) => return Ok(outcome),
            Err(e @ (StoreError::Conflict | StoreError::NotFound)) => {
                tracing::debug!(%subject, voter_id, attempt, error = %e, "Vote raced another write, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    tracing::warn!(%subject, voter_id, "Giving up on vote after repeated races");
    Err(StoreError::Contended)
}

pub async fn tally<S>(store: &S, subject: Subject) -> Result<Tally, StoreError>
where
    S: VoteStore + ?Sized,
{
    store.tally(subject).await
}

pub async fn likes_count<S>(store: &S, subject: Subject) -> Result<i64, StoreError>
where
    S: VoteStore + ?Sized,
{
    Ok(store.tally(subject).await?.likes)
}

pub async fn dislikes_count<S>(store: &S, subject: Subject) -> Result<i64, StoreError>
where
    S: VoteStore + ?Sized,
{
    Ok(store.tally(subject).await?.dislikes)
}

/// The voter's current direction on `subject`, if any.
pub async fn current_vote<S>(
    store: &S,
    subject: Subject,
    voter_id: i32,
) -> Result<Option<Direction>, StoreError>
where
    S: VoteStore + ?Sized,
{
    Ok(store
        .find_vote(subject, voter_id)
        .await?
        .map(|vote| Direction::from(&vote)))
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;

    use super::*;
    use crate::store::memory::MemoryStore;

    const USER_A: i32 = 1;
    const USER_B: i32 = 2;

    #[tokio::test]
    async fn like_twice_clears_the_vote() {
        let store = MemoryStore::default();
        let subject = Subject::article(1);

        let first = cast(&store, subject, USER_A, Direction::Like).await.unwrap();
        assert_eq!(first, CastOutcome::Recorded(Direction::Like));
        assert_eq!(likes_count(&store, subject).await.unwrap(), 1);

        let second = cast(&store, subject, USER_A, Direction::Like).await.unwrap();
        assert_eq!(second, CastOutcome::Removed);
        assert_eq!(tally(&store, subject).await.unwrap(), Tally::default());
        assert_eq!(store.vote_rows(subject).await, 0);
    }

    #[tokio::test]
    async fn like_then_dislike_flips_in_place() {
        let store = MemoryStore::default();
        let subject = Subject::article(1);

        cast(&store, subject, USER_A, Direction::Like).await.unwrap();
        let outcome = cast(&store, subject, USER_A, Direction::Dislike)
            .await
            .unwrap();

        assert_eq!(outcome, CastOutcome::Flipped(Direction::Dislike));
        assert_eq!(
            tally(&store, subject).await.unwrap(),
            Tally {
                likes: 0,
                dislikes: 1
            }
        );
        assert_eq!(store.vote_rows(subject).await, 1);
    }

    #[tokio::test]
    async fn comment_vote_scenario() {
        let store = MemoryStore::default();
        let comment = Subject::comment(10);

        cast(&store, comment, USER_A, Direction::Like).await.unwrap();
        assert_eq!(
            tally(&store, comment).await.unwrap(),
            Tally {
                likes: 1,
                dislikes: 0
            }
        );

        cast(&store, comment, USER_A, Direction::Dislike)
            .await
            .unwrap();
        assert_eq!(
            tally(&store, comment).await.unwrap(),
            Tally {
                likes: 0,
                dislikes: 1
            }
        );

        let outcome = cast(&store, comment, USER_A, Direction::Dislike)
            .await
            .unwrap();
        assert_eq!(outcome.net_direction(), None);
        assert_eq!(tally(&store, comment).await.unwrap(), Tally::default());
    }

    #[tokio::test]
    async fn voters_and_subjects_are_independent() {
        let store = MemoryStore::default();
        let article = Subject::article(5);
        let comment = Subject::comment(5);

        cast(&store, article, USER_A, Direction::Like).await.unwrap();
        cast(&store, article, USER_B, Direction::Dislike)
            .await
            .unwrap();
        cast(&store, comment, USER_A, Direction::Dislike)
            .await
            .unwrap();

        assert_eq!(
            tally(&store, article).await.unwrap(),
            Tally {
                likes: 1,
                dislikes: 1
            }
        );
        assert_eq!(dislikes_count(&store, comment).await.unwrap(), 1);
        assert_eq!(
            current_vote(&store, article, USER_B).await.unwrap(),
            Some(Direction::Dislike)
        );
        assert_eq!(current_vote(&store, comment, USER_B).await.unwrap(), None);
    }

    /// Answers the first `remaining` lookups as if no vote existed yet, like a
    /// request that read just before a concurrent double-submit committed.
    struct StaleReads {
        inner: MemoryStore,
        remaining: AtomicUsize,
    }

    impl StaleReads {
        fn new(inner: MemoryStore, stale_reads: usize) -> Self {
            StaleReads {
                inner,
                remaining: AtomicUsize::new(stale_reads),
            }
        }
    }

    #[async_trait]
    impl VoteStore for StaleReads {
        async fn find_vote(
            &self,
            subject: Subject,
            voter_id: i32,
        ) -> Result<Option<Vote>, StoreError> {
            let stale = self
                .remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if stale {
                return Ok(None);
            }
            self.inner.find_vote(subject, voter_id).await
        }

        async fn insert_vote(
            &self,
            subject: Subject,
            voter_id: i32,
            direction: Direction,
        ) -> Result<Vote, StoreError> {
            self.inner.insert_vote(subject, voter_id, direction).await
        }

        async fn update_vote(&self, vote_id: i32, direction: Direction) -> Result<(), StoreError> {
            self.inner.update_vote(vote_id, direction).await
        }

        async fn delete_vote(&self, vote_id: i32) -> Result<(), StoreError> {
            self.inner.delete_vote(vote_id).await
        }

        async fn tally(&self, subject: Subject) -> Result<Tally, StoreError> {
            self.inner.tally(subject).await
        }

        async fn tallies(
            &self,
            kind: SubjectKind,
            subject_ids: &[i32],
        ) -> Result<HashMap<i32, Tally>, StoreError> {
            self.inner.tallies(kind, subject_ids).await
        }

        async fn directions_of(
            &self,
            voter_id: i32,
            kind: SubjectKind,
            subject_ids: &[i32],
        ) -> Result<HashMap<i32, Direction>, StoreError> {
            self.inner.directions_of(voter_id, kind, subject_ids).await
        }
    }

    #[tokio::test]
    async fn racing_insert_falls_back_to_existing_vote() {
        let inner = MemoryStore::default();
        let subject = Subject::comment(3);
        cast(&inner, subject, USER_A, Direction::Like).await.unwrap();

        let store = StaleReads::new(inner, 1);

        // The stale read leads to an insert, the constraint rejects it and the
        // retry sees the committed like, so repeating it removes the vote.
        let outcome = cast(&store, subject, USER_A, Direction::Like).await.unwrap();

        assert_eq!(outcome, CastOutcome::Removed);
        assert_eq!(store.inner.vote_rows(subject).await, 0);
    }

    #[tokio::test]
    async fn racing_insert_with_opposite_direction_flips() {
        let inner = MemoryStore::default();
        let subject = Subject::article(3);
        cast(&inner, subject, USER_A, Direction::Like).await.unwrap();

        let store = StaleReads::new(inner, 1);

        let outcome = cast(&store, subject, USER_A, Direction::Dislike)
            .await
            .unwrap();

        assert_eq!(outcome, CastOutcome::Flipped(Direction::Dislike));
        assert_eq!(store.inner.vote_rows(subject).await, 1);
    }

    #[tokio::test]
    async fn endless_races_give_up() {
        let inner = MemoryStore::default();
        let subject = Subject::article(4);
        cast(&inner, subject, USER_A, Direction::Like).await.unwrap();

        let store = StaleReads::new(inner, usize::MAX);
        let err = cast(&store, subject, USER_A, Direction::Like)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Contended));
        assert_eq!(store.inner.vote_rows(subject).await, 1);
    }

    #[test]
    fn user_vote_serializes_as_state_names() {
        assert_eq!(
            serde_json::to_string(&UserVote::from(Some(Direction::Like))).unwrap(),
            "\"liked\""
        );
        assert_eq!(
            serde_json::to_string(&UserVote::from(None)).unwrap(),
            "\"none\""
        );
    }
}
