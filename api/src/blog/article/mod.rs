pub mod admin;

use std::{collections::HashMap, time::Duration};

use axum::{
    Json,
    extract::{Path, Query, State},
};
use diesel::{pg::Pg, prelude::*};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};

use crate::{
    App,
    blog::{
        models::{
            article::{Article, ArticleCard},
            category::Category,
        },
        vote::{Subject, UserVote, current_vote, tally},
    },
    error::AppError,
    identity::MaybeAuthUser,
    real_ip::ClientIp,
    schema::{articles, categories, comments},
    utils::escape_like,
};

pub const PAGE_SIZE: i64 = 9;
const RELATED_COUNT: i64 = 3;
/// A client's repeated visits within this window count as one view.
const VIEW_DEDUP_TTL: Duration = Duration::from_secs(60 * 60);

/// 404 unless the article exists and is published.
pub async fn ensure_published(ctx: &App, article_id: i32) -> Result<(), AppError> {
    let mut conn = ctx.diesel.get().await?;

    articles::table
        .filter(articles::id.eq(article_id))
        .filter(articles::is_published.eq(true))
        .select(articles::id)
        .first::<i32>(&mut conn)
        .await
        .optional()?
        .map(|_| ())
        .ok_or_else(|| AppError::not_found("Article"))
}

/// Page count for `total` rows, at least one so an empty listing has a page.
pub fn total_pages(total: i64) -> i64 {
    ((total + PAGE_SIZE - 1) / PAGE_SIZE).max(1)
}

/// Published regular articles, optionally narrowed by a search term and a
/// category.
pub(crate) fn listed_articles(
    search: Option<&str>,
    category_id: Option<i32>,
) -> articles::BoxedQuery<'static, Pg> {
    let mut query = articles::table
        .filter(articles::is_published.eq(true))
        .filter(articles::is_achievement.eq(false))
        .into_boxed();

    if let Some(category_id) = category_id {
        query = query.filter(articles::category_id.eq(category_id));
    }

    if let Some(search) = search {
        let pattern = format!("%{}%", escape_like(search));
        query = query.filter(
            articles::title
                .ilike(pattern.clone())
                .or(articles::excerpt.ilike(pattern.clone()))
                .or(articles::body.ilike(pattern)),
        );
    }

    query
}

#[derive(Deserialize, Debug, Default)]
pub struct ArticleQuery {
    q: Option<String>,
    category: Option<String>,
    page: Option<i64>,
}

#[derive(Serialize, Debug)]
pub struct ArticleListItem {
    #[serde(flatten)]
    pub article: ArticleCard,
    pub category: Option<Category>,
}

#[derive(Serialize, Debug)]
pub struct ArticlePage {
    articles: Vec<ArticleListItem>,
    page: i64,
    total_pages: i64,
    total: i64,
    category: Option<Category>,
    search_query: String,
}

pub async fn list_articles(
    State(ctx): State<App>,
    Query(query): Query<ArticleQuery>,
) -> Result<Json<ArticlePage>, AppError> {
    let mut conn = ctx.diesel.get().await?;

    let search = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());

    let category = match query.category.as_deref().filter(|c| !c.is_empty()) {
        Some(slug) => Some(
            categories::table
                .filter(categories::slug.eq(slug))
                .select(Category::as_select())
                .first(&mut conn)
                .await
                .optional()?
                .ok_or_else(|| AppError::not_found("Category"))?,
        ),
        None => None,
    };
    let category_id = category.as_ref().map(|c| c.id);

    let total = listed_articles(search, category_id)
        .count()
        .get_result::<i64>(&mut conn)
        .await?;
    let total_pages = total_pages(total);
    let page = query.page.unwrap_or(1).clamp(1, total_pages);

    let cards = listed_articles(search, category_id)
        .order((articles::created_at.desc(), articles::id.desc()))
        .limit(PAGE_SIZE)
        .offset((page - 1) * PAGE_SIZE)
        .select(ArticleCard::as_select())
        .load(&mut conn)
        .await?;

    let articles = with_categories(&mut conn, cards).await?;

    Ok(Json(ArticlePage {
        articles,
        page,
        total_pages,
        total,
        category,
        search_query: search.unwrap_or_default().to_string(),
    }))
}

pub(crate) async fn with_categories(
    conn: &mut diesel_async::AsyncPgConnection,
    cards: Vec<ArticleCard>,
) -> QueryResult<Vec<ArticleListItem>> {
    let ids: Vec<i32> = cards.iter().filter_map(|c| c.category_id).collect();

    let by_id: HashMap<i32, Category> = categories::table
        .filter(categories::id.eq_any(ids))
        .select(Category::as_select())
        .load(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    Ok(cards
        .into_iter()
        .map(|article| ArticleListItem {
            category: article.category_id.and_then(|id| by_id.get(&id).cloned()),
            article,
        })
        .collect())
}

#[derive(Serialize, Debug)]
pub struct ArticleDetail {
    #[serde(flatten)]
    article: Article,
    category: Option<Category>,
    likes: i64,
    dislikes: i64,
    user_vote: UserVote,
    comment_count: i64,
    related: Vec<ArticleCard>,
}

pub async fn get_article(
    State(ctx): State<App>,
    Path(slug): Path<String>,
    ClientIp(ip): ClientIp,
    auth_user: MaybeAuthUser,
) -> Result<Json<ArticleDetail>, AppError> {
    let mut conn = ctx.diesel.get().await?;

    let mut article = articles::table
        .filter(articles::slug.eq(&slug))
        .filter(articles::is_published.eq(true))
        .select(Article::as_select())
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found("Article"))?;

    let view_key = format!("{ip}:{}", article.id);
    if ctx.views_cache.get(&view_key).await.is_none() {
        ctx.views_cache.insert(view_key, (), VIEW_DEDUP_TTL).await;

        article.views = diesel::update(articles::table.find(article.id))
            .set(articles::views.eq(articles::views + 1))
            .returning(articles::views)
            .get_result(&mut conn)
            .await?;
    }

    let category = match article.category_id {
        Some(category_id) => categories::table
            .find(category_id)
            .select(Category::as_select())
            .first(&mut conn)
            .await
            .optional()?,
        None => None,
    };

    let comment_count = comments::table
        .filter(comments::article_id.eq(article.id))
        .filter(comments::is_approved.eq(true))
        .count()
        .get_result::<i64>(&mut conn)
        .await?;

    let related = match article.category_id {
        Some(category_id) => {
            articles::table
                .filter(articles::is_published.eq(true))
                .filter(articles::is_achievement.eq(false))
                .filter(articles::category_id.eq(category_id))
                .filter(articles::id.ne(article.id))
                .order(articles::created_at.desc())
                .limit(RELATED_COUNT)
                .select(ArticleCard::as_select())
                .load(&mut conn)
                .await?
        }
        None => vec![],
    };

    // release it before the store checks out its own
    drop(conn);

    let subject = Subject::article(article.id);
    let counts = tally(&ctx.store, subject).await?;
    let user_vote = match auth_user.id() {
        Some(voter_id) => UserVote::from(current_vote(&ctx.store, subject, voter_id).await?),
        None => UserVote::None,
    };

    Ok(Json(ArticleDetail {
        article,
        category,
        likes: counts.likes,
        dislikes: counts.dislikes,
        user_vote,
        comment_count,
        related,
    }))
}

pub async fn list_achievements(State(ctx): State<App>) -> Result<Json<Vec<Article>>, AppError> {
    let mut conn = ctx.diesel.get().await?;

    let achievements = articles::table
        .filter(articles::is_published.eq(true))
        .filter(articles::is_achievement.eq(true))
        .order((
            articles::achievement_date.desc().nulls_last(),
            articles::created_at.desc(),
        ))
        .select(Article::as_select())
        .load(&mut conn)
        .await?;

    Ok(Json(achievements))
}

#[derive(Serialize, Debug)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    category: Category,
    article_count: i64,
}

/// Categories that have at least one listed article.
pub async fn list_categories(
    State(ctx): State<App>,
) -> Result<Json<Vec<CategoryWithCount>>, AppError> {
    let mut conn = ctx.diesel.get().await?;

    let counts: HashMap<i32, i64> = articles::table
        .filter(articles::is_published.eq(true))
        .filter(articles::is_achievement.eq(false))
        .filter(articles::category_id.is_not_null())
        .group_by(articles::category_id)
        .select((articles::category_id, diesel::dsl::count_star()))
        .load::<(Option<i32>, i64)>(&mut conn)
        .await?
        .into_iter()
        .filter_map(|(id, count)| id.map(|id| (id, count)))
        .collect();

    let categories = categories::table
        .order((categories::sort_order.asc(), categories::name.asc()))
        .select(Category::as_select())
        .load(&mut conn)
        .await?
        .into_iter()
        .filter_map(|category| {
            let article_count = counts.get(&category.id).copied().unwrap_or(0);
            (article_count > 0).then_some(CategoryWithCount {
                category,
                article_count,
            })
        })
        .collect();

    Ok(Json(categories))
}
