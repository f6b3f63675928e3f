//! Persistence seams for the comment, vote and slug logic.
//!
//! The algorithms in [`crate::slug`], [`crate::blog::comment`] and
//! [`crate::blog::vote`] only talk to these traits. Postgres backs them in the
//! running service; tests use the in-memory store.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::result::DatabaseErrorKind;
use diesel_async::pooled_connection::deadpool::PoolError;

use crate::{
    blog::{
        models::comment::{Comment, NewComment},
        vote::{Direction, Subject, SubjectKind, Tally, Vote},
    },
    slug::ContentKind,
};

#[cfg(test)]
pub mod memory;
pub mod pg;

pub use pg::PgStore;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("record already exists")]
    Conflict,

    #[error("record not found")]
    NotFound,

    /// Retries kept losing races against concurrent writers.
    #[error("write kept conflicting with concurrent writers")]
    Contended,

    #[error("database error: {0}")]
    Database(diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => StoreError::NotFound,
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                StoreError::Conflict
            }
            e => StoreError::Database(e),
        }
    }
}

impl From<PoolError> for StoreError {
    fn from(e: PoolError) -> Self {
        StoreError::Pool(e.to_string())
    }
}

/// A comment joined with its author's display name.
#[derive(Debug, Clone)]
pub struct AuthoredComment {
    pub comment: Comment,
    pub author_name: String,
}

#[async_trait]
pub trait SlugStore: Send + Sync {
    /// Whether `slug` is used by a record of `kind` other than `exclude_id`.
    async fn slug_taken(
        &self,
        kind: ContentKind,
        slug: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Parent of an existing comment. `NotFound` when the comment is missing.
    async fn parent_of(&self, comment_id: i32) -> Result<Option<i32>, StoreError>;

    /// Article the comment belongs to, if the comment exists.
    async fn article_of(&self, comment_id: i32) -> Result<Option<i32>, StoreError>;

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError>;

    /// Approved comments of an article, oldest first.
    async fn approved_comments(&self, article_id: i32)
    -> Result<Vec<AuthoredComment>, StoreError>;

    /// Whether the comment is approved and its article published. `NotFound`
    /// when the comment is missing.
    async fn is_visible(&self, comment_id: i32) -> Result<bool, StoreError>;

    async fn set_approval(&self, comment_ids: &[i32], approved: bool)
    -> Result<usize, StoreError>;
}

#[async_trait]
pub trait VoteStore: Send + Sync {
    async fn find_vote(&self, subject: Subject, voter_id: i32)
    -> Result<Option<Vote>, StoreError>;

    /// Fails with `Conflict` when the (subject, voter) pair already has a vote.
    async fn insert_vote(
        &self,
        subject: Subject,
        voter_id: i32,
        direction: Direction,
    ) -> Result<Vote, StoreError>;

    /// Fails with `NotFound` when the vote disappeared in the meantime.
    async fn update_vote(&self, vote_id: i32, direction: Direction) -> Result<(), StoreError>;

    /// Fails with `NotFound` when the vote disappeared in the meantime.
    async fn delete_vote(&self, vote_id: i32) -> Result<(), StoreError>;

    async fn tally(&self, subject: Subject) -> Result<Tally, StoreError>;

    /// Tallies for many subjects of one kind. Subjects without votes are absent.
    async fn tallies(
        &self,
        kind: SubjectKind,
        subject_ids: &[i32],
    ) -> Result<HashMap<i32, Tally>, StoreError>;

    /// The voter's directions on many subjects of one kind.
    async fn directions_of(
        &self,
        voter_id: i32,
        kind: SubjectKind,
        subject_ids: &[i32],
    ) -> Result<HashMap<i32, Direction>, StoreError>;
}
