use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::{
    App,
    blog::{article::ensure_published, comment::ensure_votable},
    error::AppError,
    identity::AuthUser,
};

use super::{Direction, Subject, UserVote, cast, tally};

#[derive(Deserialize, Debug)]
pub struct VoteSubmission {
    #[serde(default = "default_like")]
    is_like: bool,
}

fn default_like() -> bool {
    true
}

#[derive(Serialize, Debug, PartialEq)]
pub struct VoteState {
    pub likes: i64,
    pub dislikes: i64,
    pub user_vote: UserVote,
}

#[debug_handler]
pub async fn vote_article(
    State(ctx): State<App>,
    Path(article_id): Path<i32>,
    AuthUser(auth_user): AuthUser,
    crate::json::Json(submission): crate::json::Json<VoteSubmission>,
) -> Result<Json<VoteState>, AppError> {
    ensure_published(&ctx, article_id).await?;

    record(&ctx, Subject::article(article_id), auth_user.id, submission).await
}

#[debug_handler]
pub async fn vote_comment(
    State(ctx): State<App>,
    Path(comment_id): Path<i32>,
    AuthUser(auth_user): AuthUser,
    crate::json::Json(submission): crate::json::Json<VoteSubmission>,
) -> Result<Json<VoteState>, AppError> {
    ensure_votable(&ctx.store, comment_id).await?;

    record(&ctx, Subject::comment(comment_id), auth_user.id, submission).await
}

async fn record(
    ctx: &App,
    subject: Subject,
    voter_id: i32,
    submission: VoteSubmission,
) -> Result<Json<VoteState>, AppError> {
    let outcome = cast(
        &ctx.store,
        subject,
        voter_id,
        Direction::from_is_like(submission.is_like),
    )
    .await?;
    let counts = tally(&ctx.store, subject).await?;

    tracing::debug!(%subject, voter_id, ?outcome, "Vote cast");

    Ok(Json(VoteState {
        likes: counts.likes,
        dislikes: counts.dislikes,
        user_vote: UserVote::from(outcome.net_direction()),
    }))
}
