pub mod create;
pub mod get;
pub mod moderate;
pub mod sanitize;
pub mod tree;

use axum::http::StatusCode;

use crate::{
    blog::models::comment::{Comment, NewComment},
    error::AppError,
    store::{CommentStore, StoreError},
};

/// Maximum number of parent hops from any comment to its thread root.
pub const MAX_DEPTH: usize = 3;

#[derive(thiserror::Error, Debug)]
pub enum CommentError {
    #[error("No content provided")]
    EmptyContent,

    #[error("Content too long (max {max} characters)")]
    ContentTooLong { max: usize },

    #[error("You're replying to a comment that does not belong to this article")]
    ParentNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CommentError> for AppError {
    fn from(e: CommentError) -> Self {
        match e {
            CommentError::EmptyContent | CommentError::ContentTooLong { .. } => {
                (e.to_string(), StatusCode::BAD_REQUEST).into()
            }
            CommentError::ParentNotFound => (e.to_string(), StatusCode::NOT_FOUND).into(),
            CommentError::Store(e) => e.into(),
        }
    }
}

/// A freshly stored comment and its nesting depth.
#[derive(Debug, Clone)]
pub struct CreatedComment {
    pub comment: Comment,
    pub depth: usize,
}

/// Number of parent hops from `comment_id` to its root. The walk stops once it
/// reaches [`MAX_DEPTH`], so it never reads more than that many ancestors.
pub async fn nesting_level<S>(store: &S, comment_id: i32) -> Result<usize, StoreError>
where
    S: CommentStore + ?Sized,
{
    let mut level = 0;
    let mut current = store.parent_of(comment_id).await?;

    while let Some(ancestor) = current {
        level += 1;
        if level >= MAX_DEPTH {
            break;
        }
        current = store.parent_of(ancestor).await?;
    }

    Ok(level)
}

/// Stores a new approved comment on `article_id`.
///
/// A reply to a comment already at [`MAX_DEPTH`] is stored as a top-level
/// comment instead of being rejected.
pub async fn create_comment<S>(
    store: &S,
    article_id: i32,
    author_id: i32,
    content: String,
    parent_id: Option<i32>,
) -> Result<CreatedComment, CommentError>
where
    S: CommentStore + ?Sized,
{
    let (parent_id, depth) = match parent_id {
        Some(parent_id) => {
            if store.article_of(parent_id).await? != Some(article_id) {
                return Err(CommentError::ParentNotFound);
            }

            let parent_level = nesting_level(store, parent_id).await?;
            if parent_level < MAX_DEPTH {
                (Some(parent_id), parent_level + 1)
            } else {
                tracing::info!(
                    article_id,
                    parent_id,
                    "Reply exceeds max nesting depth, attaching at top level"
                );
                (None, 0)
            }
        }
        None => (None, 0),
    };

    let comment = store
        .insert_comment(NewComment {
            article_id,
            identity_id: author_id,
            parent_id,
            content,
            is_approved: true,
        })
        .await?;

    Ok(CreatedComment { comment, depth })
}

/// Only comments readers can see take votes: approved ones on published
/// articles. Anything else is reported as missing.
pub async fn ensure_votable<S>(store: &S, comment_id: i32) -> Result<(), AppError>
where
    S: CommentStore + ?Sized,
{
    match store.is_visible(comment_id).await {
        Ok(true) => Ok(()),
        Ok(false) | Err(StoreError::NotFound) => Err(AppError::not_found("Comment")),
        Err(e) => Err(e.into()),
    }
}

/// Approves or hides comments in bulk, returning the number of rows changed.
pub async fn set_approval<S>(
    store: &S,
    comment_ids: &[i32],
    approved: bool,
) -> Result<usize, StoreError>
where
    S: CommentStore + ?Sized,
{
    if comment_ids.is_empty() {
        return Ok(0);
    }

    let changed = store.set_approval(comment_ids, approved).await?;
    tracing::info!(changed, approved, "Comment approval updated");
    Ok(changed)
}
