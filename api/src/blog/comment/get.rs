use axum::{
    Json,
    extract::{Path, State},
};

use crate::{App, blog::article::ensure_published, error::AppError, identity::MaybeAuthUser};

use super::tree::{CommentTree, list_for_entity};

pub async fn get_comments(
    State(ctx): State<App>,
    Path(article_id): Path<i32>,
    auth_user: MaybeAuthUser,
) -> Result<Json<Vec<CommentTree>>, AppError> {
    ensure_published(&ctx, article_id).await?;

    let comments = list_for_entity(
        &ctx.store,
        article_id,
        auth_user.id(),
        ctx.config.owner_identity_id,
    )
    .await?;

    Ok(Json(comments))
}
