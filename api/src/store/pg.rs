use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::{AuthoredComment, CommentStore, SlugStore, StoreError, VoteStore};
use crate::{
    DieselPool,
    blog::{
        models::{
            comment::{Comment, NewComment},
            vote::NewVote,
        },
        vote::{Direction, Subject, SubjectKind, Tally, Vote},
    },
    identity::models::identity::display_name,
    schema::{articles, categories, comments, identities, projects, votes},
    slug::ContentKind,
};

/// Postgres backed store, sharing the service's connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DieselPool,
}

impl PgStore {
    pub fn new(pool: DieselPool) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl SlugStore for PgStore {
    async fn slug_taken(
        &self,
        kind: ContentKind,
        slug: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await?;
        let other = exclude_id.unwrap_or(0);

        let found = match kind {
            ContentKind::Article => articles::table
                .filter(articles::slug.eq(slug))
                .filter(articles::id.ne(other))
                .select(articles::id)
                .first::<i32>(&mut conn)
                .await
                .optional()?,
            ContentKind::Project => projects::table
                .filter(projects::slug.eq(slug))
                .filter(projects::id.ne(other))
                .select(projects::id)
                .first::<i32>(&mut conn)
                .await
                .optional()?,
            ContentKind::Category => categories::table
                .filter(categories::slug.eq(slug))
                .filter(categories::id.ne(other))
                .select(categories::id)
                .first::<i32>(&mut conn)
                .await
                .optional()?,
        };

        Ok(found.is_some())
    }
}

#[async_trait]
impl CommentStore for PgStore {
    async fn parent_of(&self, comment_id: i32) -> Result<Option<i32>, StoreError> {
        let mut conn = self.pool.get().await?;

        let parent = comments::table
            .find(comment_id)
            .select(comments::parent_id)
            .first::<Option<i32>>(&mut conn)
            .await?;

        Ok(parent)
    }

    async fn article_of(&self, comment_id: i32) -> Result<Option<i32>, StoreError> {
        let mut conn = self.pool.get().await?;

        let article_id = comments::table
            .find(comment_id)
            .select(comments::article_id)
            .first::<i32>(&mut conn)
            .await
            .optional()?;

        Ok(article_id)
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let mut conn = self.pool.get().await?;

        let created = diesel::insert_into(comments::table)
            .values(&comment)
            .returning(Comment::as_returning())
            .get_result(&mut conn)
            .await?;

        Ok(created)
    }

    async fn approved_comments(
        &self,
        article_id: i32,
    ) -> Result<Vec<AuthoredComment>, StoreError> {
        let mut conn = self.pool.get().await?;

        let rows = comments::table
            .inner_join(identities::table)
            .filter(comments::article_id.eq(article_id))
            .filter(comments::is_approved.eq(true))
            .order((comments::created_at.asc(), comments::id.asc()))
            .select((Comment::as_select(), identities::traits))
            .load::<(Comment, serde_json::Value)>(&mut conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(comment, traits)| AuthoredComment {
                comment,
                author_name: display_name(&traits),
            })
            .collect())
    }

    async fn is_visible(&self, comment_id: i32) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await?;

        let (approved, published) = comments::table
            .inner_join(articles::table)
            .filter(comments::id.eq(comment_id))
            .select((comments::is_approved, articles::is_published))
            .first::<(bool, bool)>(&mut conn)
            .await?;

        Ok(approved && published)
    }

    async fn set_approval(&self, comment_ids: &[i32], approved: bool) -> Result<usize, StoreError> {
        let mut conn = self.pool.get().await?;

        let changed = diesel::update(comments::table.filter(comments::id.eq_any(comment_ids)))
            .set((
                comments::is_approved.eq(approved),
                comments::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await?;

        Ok(changed)
    }
}

#[async_trait]
impl VoteStore for PgStore {
    async fn find_vote(
        &self,
        subject: Subject,
        voter_id: i32,
    ) -> Result<Option<Vote>, StoreError> {
        let mut conn = self.pool.get().await?;

        let vote = votes::table
            .filter(votes::subject_kind.eq(subject.kind.as_str()))
            .filter(votes::subject_id.eq(subject.id))
            .filter(votes::voter_id.eq(voter_id))
            .select(Vote::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        Ok(vote)
    }

    async fn insert_vote(
        &self,
        subject: Subject,
        voter_id: i32,
        direction: Direction,
    ) -> Result<Vote, StoreError> {
        let mut conn = self.pool.get().await?;

        let vote = diesel::insert_into(votes::table)
            .values(&NewVote {
                subject_kind: subject.kind.as_str(),
                subject_id: subject.id,
                voter_id,
                is_like: direction.is_like(),
            })
            .returning(Vote::as_returning())
            .get_result(&mut conn)
            .await?;

        Ok(vote)
    }

    async fn update_vote(&self, vote_id: i32, direction: Direction) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;

        let updated = diesel::update(votes::table.find(vote_id))
            .set(votes::is_like.eq(direction.is_like()))
            .execute(&mut conn)
            .await?;

        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_vote(&self, vote_id: i32) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;

        let deleted = diesel::delete(votes::table.find(vote_id))
            .execute(&mut conn)
            .await?;

        if deleted == 0 {
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
        if subject_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut conn = self.pool.get().await?;

        let rows = votes::table
            .filter(votes::subject_kind.eq(kind.as_str()))
            .filter(votes::subject_id.eq_any(subject_ids))
            .group_by((votes::subject_id, votes::is_like))
            .select((votes::subject_id, votes::is_like, diesel::dsl::count_star()))
            .load::<(i32, bool, i64)>(&mut conn)
            .await?;

        let mut tallies: HashMap<i32, Tally> = HashMap::new();
        for (subject_id, is_like, count) in rows {
            let tally = tallies.entry(subject_id).or_default();
            if is_like {
                tally.likes = count;
            } else {
                tally.dislikes = count;
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
        if subject_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut conn = self.pool.get().await?;

        let rows = votes::table
            .filter(votes::voter_id.eq(voter_id))
            .filter(votes::subject_kind.eq(kind.as_str()))
            .filter(votes::subject_id.eq_any(subject_ids))
            .select((votes::subject_id, votes::is_like))
            .load::<(i32, bool)>(&mut conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, is_like)| (id, Direction::from_is_like(is_like)))
            .collect())
    }
}
