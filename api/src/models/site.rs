use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

/// Key of the only settings row.
pub const SETTINGS_KEY: &str = "site";

#[derive(Queryable, Selectable, Debug, Serialize, Clone)]
#[diesel(table_name = crate::schema::site_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SiteSettings {
    #[serde(skip)]
    pub id: i32,
    #[serde(skip)]
    pub key: String,
    pub site_name: String,
    pub site_description: String,
    pub owner_name: String,
    pub owner_title: String,
    pub owner_bio: String,
    pub owner_email: String,
    pub owner_city: String,
    pub telegram_url: String,
    pub github_url: String,
    pub vk_url: String,
    pub linkedin_url: String,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::site_settings)]
pub struct NewSiteSettings<'a> {
    pub key: &'a str,
}
