use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use tokio::sync::Mutex;

use super::{AuthoredComment, CommentStore, SlugStore, StoreError, VoteStore};
use crate::{
    blog::{
        models::comment::{Comment, NewComment},
        vote::{Direction, Subject, SubjectKind, Tally, Vote},
    },
    slug::ContentKind,
};

/// Store kept entirely in process memory for unit tests. Rows get increasing
/// ids and `created_at` advances one second per id, so orderings are stable.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i32,
    slugs: Vec<(ContentKind, i32, String)>,
    authors: HashMap<i32, String>,
    comments: Vec<Comment>,
    votes: Vec<Vote>,
    /// Articles are published unless listed here.
    drafts: HashSet<i32>,
}

impl Inner {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

fn timestamp(id: i32) -> NaiveDateTime {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    base + TimeDelta::seconds(id as i64)
}

impl MemoryStore {
    pub async fn add_slug(&self, kind: ContentKind, id: i32, slug: &str) {
        self.inner
            .lock()
            .await
            .slugs
            .push((kind, id, slug.to_string()));
    }

    pub async fn unpublish_article(&self, article_id: i32) {
        self.inner.lock().await.drafts.insert(article_id);
    }

    pub async fn add_author(&self, identity_id: i32, name: &str) {
        self.inner
            .lock()
            .await
            .authors
            .insert(identity_id, name.to_string());
    }

    /// Number of rows held for `subject`, regardless of direction.
    pub async fn vote_rows(&self, subject: Subject) -> usize {
        self.inner
            .lock()
            .await
            .votes
            .iter()
            .filter(|v| v.subject_kind == subject.kind.as_str() && v.subject_id == subject.id)
            .count()
    }

    pub async fn comment(&self, comment_id: i32) -> Option<Comment> {
        self.inner
            .lock()
            .await
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .cloned()
    }
}

#[async_trait]
impl SlugStore for MemoryStore {
    async fn slug_taken(
        &self,
        kind: ContentKind,
        slug: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .slugs
            .iter()
            .any(|(k, id, s)| *k == kind && s == slug && Some(*id) != exclude_id))
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn parent_of(&self, comment_id: i32) -> Result<Option<i32>, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .map(|c| c.parent_id)
            .ok_or(StoreError::NotFound)
    }

    async fn article_of(&self, comment_id: i32) -> Result<Option<i32>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .map(|c| c.article_id))
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let mut inner = self.inner.lock().await;
        let id = inner.next_id();
        let created = Comment {
            id,
            article_id: comment.article_id,
            identity_id: comment.identity_id,
            parent_id: comment.parent_id,
            content: comment.content,
            is_approved: comment.is_approved,
            created_at: timestamp(id),
            updated_at: timestamp(id),
        };
        inner.comments.push(created.clone());
        Ok(created)
    }

    async fn approved_comments(
        &self,
        article_id: i32,
    ) -> Result<Vec<AuthoredComment>, StoreError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<_> = inner
            .comments
            .iter()
            .filter(|c| c.article_id == article_id && c.is_approved)
            .map(|c| AuthoredComment {
                comment: c.clone(),
                author_name: inner
                    .authors
                    .get(&c.identity_id)
                    .cloned()
                    .unwrap_or_else(|| "Anonymous".to_string()),
            })
            .collect();
        rows.sort_by_key(|r| (r.comment.created_at, r.comment.id));
        Ok(rows)
    }

    async fn is_visible(&self, comment_id: i32) -> Result<bool, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .map(|c| c.is_approved && !inner.drafts.contains(&c.article_id))
            .ok_or(StoreError::NotFound)
    }

    async fn set_approval(&self, comment_ids: &[i32], approved: bool) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().await;
        let mut changed = 0;
        for comment in inner
            .comments
            .iter_mut()
            .filter(|c| comment_ids.contains(&c.id))
        {
            comment.is_approved = approved;
            changed += 1;
        }
        Ok(changed)
    }
}

#[async_trait]
impl VoteStore for MemoryStore {
    async fn find_vote(
        &self,
        subject: Subject,
        voter_id: i32,
    ) -> Result<Option<Vote>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .votes
            .iter()
            .find(|v| {
                v.subject_kind == subject.kind.as_str()
                    && v.subject_id == subject.id
                    && v.voter_id == voter_id
            })
            .cloned())
    }

    async fn insert_vote(
        &self,
        subject: Subject,
        voter_id: i32,
        direction: Direction,
    ) -> Result<Vote, StoreError> {
        let mut inner = self.inner.lock().await;
        let exists = inner.votes.iter().any(|v| {
            v.subject_kind == subject.kind.as_str()
                && v.subject_id == subject.id
                && v.voter_id == voter_id
        });
        if exists {
            return Err(StoreError::Conflict);
        }

        let id = inner.next_id();
        let vote = Vote {
            id,
            subject_kind: subject.kind.as_str().to_string(),
            subject_id: subject.id,
            voter_id,
            is_like: direction.is_like(),
            created_at: timestamp(id),
        };
        inner.votes.push(vote.clone());
        Ok(vote)
    }

    async fn update_vote(&self, vote_id: i32, direction: Direction) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let vote = inner
            .votes
            .iter_mut()
            .find(|v| v.id == vote_id)
            .ok_or(StoreError::NotFound)?;
        vote.is_like = direction.is_like();
        Ok(())
    }

    async fn delete_vote(&self, vote_id: i32) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.votes.len();
        inner.votes.retain(|v| v.id != vote_id);
        if inner.votes.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn tally(&self, subject: Subject) -> Result<Tally, StoreError> {
        let tallies = self.tallies(subject.kind, &[subject.id]).await?;
        Ok(tallies.get(&subject.id).copied().unwrap_or_default())
    }

    async fn tallies(
        &self,
        kind: SubjectKind,
        subject_ids: &[i32],
    ) -> Result<HashMap<i32, Tally>, StoreError> {
        let inner = self.inner.lock().await;
        let mut tallies: HashMap<i32, Tally> = HashMap::new();
        for vote in inner
            .votes
            .iter()
            .filter(|v| v.subject_kind == kind.as_str() && subject_ids.contains(&v.subject_id))
        {
            let tally = tallies.entry(vote.subject_id).or_default();
            if vote.is_like {
                tally.likes += 1;
            } else {
                tally.dislikes += 1;
            }
        }
        Ok(tallies)
    }

    async fn directions_of(
        &self,
        voter_id: i32,
        kind: SubjectKind,
        subject_ids: &[i32],
    ) -> Result<HashMap<i32, Direction>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .votes
            .iter()
            .filter(|v| {
                v.voter_id == voter_id
                    && v.subject_kind == kind.as_str()
                    && subject_ids.contains(&v.subject_id)
            })
            .map(|v| (v.subject_id, Direction::from(v)))
            .collect())
    }
}
