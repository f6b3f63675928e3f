use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::App;

use super::{
    article::{
        admin::{create_article, create_category, update_article},
        get_article, list_achievements, list_articles, list_categories,
    },
    comment::{create::create_comment, get::get_comments, moderate::set_approval},
    vote::routes::{vote_article, vote_comment},
};

pub fn route() -> Router<App> {
    // TODO rate limit comment and vote submissions
    Router::<App>::new()
        .route("/articles", get(list_articles))
        .route("/articles/{article}", get(get_article))
        .route(
            "/articles/{article}/comments",
            get(get_comments).post(create_comment),
        )
        .route("/articles/{article}/vote", post(vote_article))
        .route("/comments/{comment}/vote", post(vote_comment))
        .route("/categories", get(list_categories))
        .route("/achievements", get(list_achievements))
}

pub fn admin_route() -> Router<App> {
    Router::<App>::new()
        .route("/articles", post(create_article))
        .route("/articles/{article}", patch(update_article))
        .route("/categories", post(create_category))
        .route("/comments/approval", patch(set_approval))
}
