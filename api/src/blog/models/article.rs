use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

use crate::utils::truncate_with_ellipsis;

/// Length of an excerpt derived from the article body.
pub const EXCERPT_CHARS: usize = 300;

#[derive(Queryable, Selectable, Identifiable, Debug, Serialize, Clone)]
#[diesel(table_name = crate::schema::articles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Article {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub sub_title: String,
    pub excerpt: String,
    pub body: String,
    pub img: Option<String>,
    pub category_id: Option<i32>,
    pub author: String,
    pub views: i32,
    pub is_published: bool,
    pub is_achievement: bool,
    pub achievement_icon: String,
    pub achievement_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// The listing view of an article, without its body.
#[derive(Queryable, Selectable, Debug, Serialize, Clone)]
#[diesel(table_name = crate::schema::articles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ArticleCard {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub sub_title: String,
    pub excerpt: String,
    pub img: Option<String>,
    pub category_id: Option<i32>,
    pub author: String,
    pub views: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::articles)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub sub_title: String,
    pub excerpt: String,
    pub body: String,
    pub img: Option<String>,
    pub category_id: Option<i32>,
    pub author: String,
    pub is_published: bool,
    pub is_achievement: bool,
    pub achievement_icon: String,
    pub achievement_date: Option<NaiveDate>,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = crate::schema::articles)]
pub struct UpdateArticle {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub sub_title: Option<String>,
    pub excerpt: Option<String>,
    pub body: Option<String>,
    pub img: Option<Option<String>>,
    pub category_id: Option<Option<i32>>,
    pub is_published: Option<bool>,
    pub is_achievement: Option<bool>,
    pub achievement_icon: Option<String>,
    pub achievement_date: Option<Option<NaiveDate>>,
    pub updated_at: Option<NaiveDateTime>,
}

/// The editor's input for creating an article.
#[derive(Deserialize, Debug)]
pub struct ArticleSubmission {
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub sub_title: String,
    #[serde(default)]
    pub excerpt: String,
    pub body: String,
    pub img: Option<String>,
    pub category_id: Option<i32>,
    pub author: Option<String>,
    #[serde(default = "default_true")]
    pub is_published: bool,
    #[serde(default)]
    pub is_achievement: bool,
    pub achievement_icon: Option<String>,
    pub achievement_date: Option<NaiveDate>,
}

fn default_true() -> bool {
    true
}

/// The editor's partial update. Absent fields stay untouched, `null` clears
/// the nullable ones and an empty slug asks for a fresh one.
#[derive(Deserialize, Debug, Default)]
pub struct ArticleChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub sub_title: Option<String>,
    pub excerpt: Option<String>,
    pub body: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub img: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i32>>,
    pub is_published: Option<bool>,
    pub is_achievement: Option<bool>,
    pub achievement_icon: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub achievement_date: Option<Option<NaiveDate>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// An explicit excerpt wins; otherwise the start of the body is used.
pub fn derive_excerpt(excerpt: &str, body: &str) -> String {
    let excerpt = excerpt.trim();
    if !excerpt.is_empty() || body.is_empty() {
        return excerpt.to_string();
    }

    truncate_with_ellipsis(body, EXCERPT_CHARS)
}
