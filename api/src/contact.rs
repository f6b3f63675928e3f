use std::collections::HashSet;

use axum::{Json, extract::State, http::StatusCode};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};

use crate::{
    App,
    error::{ApiRequestError, AppError},
    identity::AdminUser,
    models::contact::{ContactMessage, NewContactMessage},
    schema::contact_messages,
};

const NAME_MAX_CHARS: usize = 100;
const EMAIL_MAX_CHARS: usize = 254;
const SUBJECT_MAX_CHARS: usize = 200;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ContactError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} is too long (max {max} characters)")]
    TooLong { field: &'static str, max: usize },

    #[error("Enter a valid email address")]
    InvalidEmail,
}

impl ApiRequestError for ContactError {}

#[derive(Deserialize, Debug)]
pub struct ContactSubmission {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    captcha_token: String,
}

fn required(field: &'static str, value: &str, max: usize) -> Result<String, ContactError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ContactError::Missing(field));
    }
    if value.chars().count() > max {
        return Err(ContactError::TooLong { field, max });
    }
    Ok(value.to_string())
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Removes every tag, dropping script and style bodies entirely.
pub fn strip_tags(text: &str) -> String {
    ammonia::Builder::empty()
        .clean_content_tags(HashSet::from(["script", "style"]))
        .clean(text)
        .to_string()
}

impl ContactSubmission {
    pub fn validate(&self) -> Result<NewContactMessage, ContactError> {
        let name = required("Name", &self.name, NAME_MAX_CHARS)?;
        let email = required("Email", &self.email, EMAIL_MAX_CHARS)?;
        if !looks_like_email(&email) {
            return Err(ContactError::InvalidEmail);
        }
        let subject = required("Subject", &self.subject, SUBJECT_MAX_CHARS)?;
        let message = strip_tags(self.message.trim()).trim().to_string();
        if message.is_empty() {
            return Err(ContactError::Missing("Message"));
        }

        Ok(NewContactMessage {
            name,
            email,
            subject,
            message,
        })
    }
}

#[derive(Serialize, Debug)]
pub struct ContactResponse {
    success: bool,
    message: &'static str,
}

pub async fn submit_contact(
    State(ctx): State<App>,
    crate::json::Json(submission): crate::json::Json<ContactSubmission>,
) -> Result<(StatusCode, Json<ContactResponse>), AppError> {
    let message = submission.validate()?;
    ctx.captcha.verify(&submission.captcha_token).await?;

    let mut conn = ctx.diesel.get().await?;
    let id: i32 = diesel::insert_into(contact_messages::table)
        .values(&message)
        .returning(contact_messages::id)
        .get_result(&mut conn)
        .await?;

    tracing::info!(contact_message_id = id, email = %message.email, "Contact message received");

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            message: "Thanks! Your message has been sent.",
        }),
    ))
}

/// The inbox, newest first.
pub async fn list_messages(
    State(ctx): State<App>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<ContactMessage>>, AppError> {
    let mut conn = ctx.diesel.get().await?;

    let messages = contact_messages::table
        .order(contact_messages::created_at.desc())
        .select(ContactMessage::as_select())
        .load(&mut conn)
        .await?;

    Ok(Json(messages))
}
