use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::{App, error::AppError, identity::AdminUser};

#[derive(Deserialize, Debug)]
pub struct ApprovalChange {
    ids: Vec<i32>,
    is_approved: bool,
}

#[derive(Serialize, Debug)]
pub struct ApprovalResult {
    updated: usize,
}

pub async fn set_approval(
    State(ctx): State<App>,
    AdminUser(admin): AdminUser,
    crate::json::Json(change): crate::json::Json<ApprovalChange>,
) -> Result<Json<ApprovalResult>, AppError> {
    if change.ids.is_empty() {
        return Err(("No comment ids provided", StatusCode::BAD_REQUEST).into());
    }

    let updated = super::set_approval(&ctx.store, &change.ids, change.is_approved).await?;

    tracing::info!(
        identity_id = admin.id,
        updated,
        is_approved = change.is_approved,
        "Comments moderated"
    );

    Ok(Json(ApprovalResult { updated }))
}
