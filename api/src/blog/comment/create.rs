use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::{
    App,
    blog::article::ensure_published,
    error::AppError,
    identity::AuthUser,
    store::AuthoredComment,
};

use super::{create_comment as store_comment, sanitize::sanitize_comment, tree::CommentTree};

#[derive(Deserialize, Debug)]
pub struct CommentSubmission {
    content: String,
    parent_id: Option<i32>,
}

#[debug_handler]
pub async fn create_comment(
    State(ctx): State<App>,
    Path(article_id): Path<i32>,
    AuthUser(auth_user): AuthUser,
    crate::json::Json(submission): crate::json::Json<CommentSubmission>,
) -> Result<Json<CommentTree>, AppError> {
    ensure_published(&ctx, article_id).await?;

    let content = sanitize_comment(&submission.content)?;

    let created = store_comment(
        &ctx.store,
        article_id,
        auth_user.id,
        content,
        submission.parent_id,
    )
    .await?;

    tracing::info!(
        comment_id = created.comment.id,
        article_id,
        identity_id = auth_user.id,
        "Comment created"
    );

    Ok(Json(CommentTree::leaf(
        AuthoredComment {
            comment: created.comment,
            author_name: auth_user.display_name(),
        },
        created.depth,
        Some(auth_user.id),
        ctx.config.owner_identity_id,
    )))
}
