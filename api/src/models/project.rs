use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

pub const STATUSES: &[&str] = &["completed", "in_development", "beta"];
pub const CARD_SIZES: &[&str] = &["featured", "regular", "small"];

#[derive(Queryable, Selectable, Identifiable, Debug, Serialize, Clone)]
#[diesel(table_name = crate::schema::projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Project {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub description: String,
    pub features: String,
    pub img_main: Option<String>,
    pub technologies: String,
    pub github_url: String,
    pub demo_url: String,
    pub status: String,
    pub card_size: String,
    pub sort_order: i32,
    pub is_visible: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::projects)]
pub struct NewProject {
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub description: String,
    pub features: String,
    pub img_main: Option<String>,
    pub technologies: String,
    pub github_url: String,
    pub demo_url: String,
    pub status: String,
    pub card_size: String,
    pub sort_order: i32,
    pub is_visible: bool,
}

#[derive(Deserialize, Debug)]
pub struct ProjectSubmission {
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: String,
    pub img_main: Option<String>,
    #[serde(default)]
    pub technologies: String,
    #[serde(default)]
    pub github_url: String,
    #[serde(default)]
    pub demo_url: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_card_size")]
    pub card_size: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

fn default_status() -> String {
    "completed".to_string()
}

fn default_card_size() -> String {
    "regular".to_string()
}

fn default_visible() -> bool {
    true
}
