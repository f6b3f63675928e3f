use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::{
    App,
    blog::models::{
        article::{
            Article, ArticleChanges, ArticleSubmission, NewArticle, UpdateArticle, derive_excerpt,
        },
        category::{Category, NewCategory},
    },
    error::AppError,
    identity::AdminUser,
    notify::Notifier,
    schema::{articles, categories},
    slug::{ContentKind, assign_slug, insert_with_slug},
    store::StoreError,
    utils::{FieldTooLong, check_len},
};

const TITLE_MAX_CHARS: usize = 200;
const SUB_TITLE_MAX_CHARS: usize = 300;
const EXCERPT_MAX_CHARS: usize = 500;
const AUTHOR_MAX_CHARS: usize = 100;
const ICON_MAX_CHARS: usize = 50;
const CATEGORY_NAME_MAX_CHARS: usize = 100;

fn check_title(title: &str) -> Result<(), AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(("No title provided", StatusCode::BAD_REQUEST).into());
    }
    Ok(check_len("Title", title, TITLE_MAX_CHARS)?)
}

fn check_optional(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), FieldTooLong> {
    value.map_or(Ok(()), |value| check_len(field, value, max))
}

/// Length checks shared by create and update. An empty slug is a request for
/// a derived one and always fits.
fn check_fields(
    slug: Option<&str>,
    sub_title: Option<&str>,
    author: Option<&str>,
    achievement_icon: Option<&str>,
) -> Result<(), FieldTooLong> {
    check_optional("Slug", slug, ContentKind::Article.slug_max_len())?;
    check_optional("Subtitle", sub_title, SUB_TITLE_MAX_CHARS)?;
    check_optional("Author", author, AUTHOR_MAX_CHARS)?;
    check_optional("Achievement icon", achievement_icon, ICON_MAX_CHARS)
}

fn check_submission(submission: &ArticleSubmission) -> Result<(), AppError> {
    check_title(&submission.title)?;
    check_fields(
        submission.slug.as_deref(),
        Some(&submission.sub_title),
        submission.author.as_deref(),
        submission.achievement_icon.as_deref(),
    )?;
    Ok(())
}

fn check_changes(changes: &ArticleChanges) -> Result<(), AppError> {
    if let Some(title) = &changes.title {
        check_title(title)?;
    }
    check_fields(
        changes.slug.as_deref(),
        changes.sub_title.as_deref(),
        None,
        changes.achievement_icon.as_deref(),
    )?;
    Ok(())
}

pub async fn create_article(
    State(ctx): State<App>,
    AdminUser(admin): AdminUser,
    crate::json::Json(submission): crate::json::Json<ArticleSubmission>,
) -> Result<(StatusCode, Json<Article>), AppError> {
    check_submission(&submission)?;
    let title = submission.title.trim().to_string();
    let excerpt = derive_excerpt(&submission.excerpt, &submission.body);
    check_len("Excerpt", &excerpt, EXCERPT_MAX_CHARS)?;

    let draft = NewArticle {
        title: title.clone(),
        slug: String::new(),
        sub_title: submission.sub_title,
        excerpt,
        body: submission.body,
        img: submission.img.filter(|img| !img.is_empty()),
        category_id: submission.category_id,
        author: submission
            .author
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| {
                admin
                    .display_name()
                    .chars()
                    .take(AUTHOR_MAX_CHARS)
                    .collect()
            }),
        is_published: submission.is_published,
        is_achievement: submission.is_achievement,
        achievement_icon: submission
            .achievement_icon
            .unwrap_or_else(|| "fas fa-trophy".to_string()),
        achievement_date: submission.achievement_date,
    };

    let article = insert_with_slug(
        &ctx.store,
        ContentKind::Article,
        submission.slug.as_deref(),
        &title,
        |slug| {
            let pool = ctx.diesel.clone();
            let new_article = NewArticle {
                slug,
                ..draft.clone()
            };
            async move {
                let mut conn = pool.get().await?;
                let article = diesel::insert_into(articles::table)
                    .values(&new_article)
                    .returning(Article::as_returning())
                    .get_result(&mut conn)
                    .await?;
                Ok::<_, StoreError>(article)
            }
        },
    )
    .await?;

    tracing::info!(article_id = article.id, slug = %article.slug, "Article created");

    Ok(created(&ctx.notifier, &ctx.config.site_url, article))
}

/// The announcement runs detached: a slow or failing channel neither delays
/// nor changes the response.
fn created(
    notifier: &Notifier,
    site_url: &str,
    article: Article,
) -> (StatusCode, Json<Article>) {
    notifier.announce(&article, site_url);
    (StatusCode::CREATED, Json(article))
}

pub async fn update_article(
    State(ctx): State<App>,
    Path(article_id): Path<i32>,
    AdminUser(_admin): AdminUser,
    crate::json::Json(changes): crate::json::Json<ArticleChanges>,
) -> Result<Json<Article>, AppError> {
    check_changes(&changes)?;
    let mut conn = ctx.diesel.get().await?;

    let current = articles::table
        .find(article_id)
        .select(Article::as_select())
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found("Article"))?;

    let title = changes.title.as_deref().map(str::trim);

    let slug = match changes.slug.as_deref() {
        Some("") => Some(
            assign_slug(
                &ctx.store,
                ContentKind::Article,
                None,
                title.unwrap_or(&current.title),
                Some(article_id),
            )
            .await?,
        ),
        Some(slug) => Some(slug.to_string()),
        None => None,
    };

    let excerpt = match (&changes.excerpt, &changes.body) {
        (Some(excerpt), body) => Some(derive_excerpt(
            excerpt,
            body.as_deref().unwrap_or(&current.body),
        )),
        (None, Some(body)) if current.excerpt.is_empty() => Some(derive_excerpt("", body)),
        (None, _) => None,
    };
    if let Some(excerpt) = &excerpt {
        check_len("Excerpt", excerpt, EXCERPT_MAX_CHARS)?;
    }

    let update = UpdateArticle {
        title: title.map(str::to_string),
        slug,
        sub_title: changes.sub_title,
        excerpt,
        body: changes.body,
        img: changes.img,
        category_id: changes.category_id,
        is_published: changes.is_published,
        is_achievement: changes.is_achievement,
        achievement_icon: changes.achievement_icon,
        achievement_date: changes.achievement_date,
        updated_at: Some(chrono::Utc::now().naive_utc()),
    };

    let article = diesel::update(articles::table.find(article_id))
        .set(&update)
        .returning(Article::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(StoreError::from)?;

    tracing::info!(article_id, slug = %article.slug, "Article updated");

    Ok(Json(article))
}

pub async fn create_category(
    State(ctx): State<App>,
    AdminUser(_admin): AdminUser,
    crate::json::Json(submission): crate::json::Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let name = submission.name.trim().to_string();
    if name.is_empty() {
        return Err(("No name provided", StatusCode::BAD_REQUEST).into());
    }
    check_len("Name", &name, CATEGORY_NAME_MAX_CHARS)?;
    check_len("Slug", &submission.slug, ContentKind::Category.slug_max_len())?;
    check_len("Icon", &submission.icon, ICON_MAX_CHARS)?;

    let requested = Some(submission.slug.clone());
    let category = insert_with_slug(
        &ctx.store,
        ContentKind::Category,
        requested.as_deref(),
        &name,
        |slug| {
            let pool = ctx.diesel.clone();
            let new_category = NewCategory {
                name: name.clone(),
                slug,
                description: submission.description.clone(),
                icon: submission.icon.clone(),
                sort_order: submission.sort_order,
            };
            async move {
                let mut conn = pool.get().await?;
                let category = diesel::insert_into(categories::table)
                    .values(&new_category)
                    .returning(Category::as_returning())
                    .get_result(&mut conn)
                    .await?;
                Ok::<_, StoreError>(category)
            }
        },
    )
    .await?;

    tracing::info!(category_id = category.id, slug = %category.slug, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}
