use axum::{Json, extract::State};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Serialize;

use crate::{
    App,
    error::AppError,
    schema::{articles, projects},
};

/// Fixed sections of the site, relative to its root.
const SECTIONS: &[&str] = &[
    "/",
    "/about/",
    "/projects/",
    "/blog/",
    "/achievements/",
    "/contacts/",
];

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Weekly,
    Monthly,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<NaiveDateTime>,
    pub changefreq: ChangeFreq,
    pub priority: f64,
}

/// Sections first, then every published article (with its last edit), then
/// every visible project as an anchor on the projects page.
pub fn sitemap_entries(
    site_url: &str,
    articles: Vec<(String, NaiveDateTime)>,
    projects: Vec<String>,
) -> Vec<SitemapEntry> {
    let sections = SECTIONS.iter().map(|path| SitemapEntry {
        loc: format!("{site_url}{path}"),
        lastmod: None,
        changefreq: ChangeFreq::Monthly,
        priority: 0.5,
    });

    let articles = articles.into_iter().map(|(slug, updated_at)| SitemapEntry {
        loc: format!("{site_url}/blog/{slug}/"),
        lastmod: Some(updated_at),
        changefreq: ChangeFreq::Weekly,
        priority: 0.8,
    });

    let projects = projects.into_iter().map(|slug| SitemapEntry {
        loc: format!("{site_url}/projects/#{slug}"),
        lastmod: None,
        changefreq: ChangeFreq::Monthly,
        priority: 0.7,
    });

    sections.chain(articles).chain(projects).collect()
}

pub async fn get_sitemap(State(ctx): State<App>) -> Result<Json<Vec<SitemapEntry>>, AppError> {
    let mut conn = ctx.diesel.get().await?;

    let published = articles::table
        .filter(articles::is_published.eq(true))
        .order(articles::updated_at.desc())
        .select((articles::slug, articles::updated_at))
        .load::<(String, NaiveDateTime)>(&mut conn)
        .await?;

    let visible = projects::table
        .filter(projects::is_visible.eq(true))
        .order((projects::sort_order.asc(), projects::created_at.desc()))
        .select(projects::slug)
        .load::<String>(&mut conn)
        .await?;

    Ok(Json(sitemap_entries(
        &ctx.config.site_url,
        published,
        visible,
    )))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn articles_carry_their_last_edit() {
        let edited = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        let entries = sitemap_entries(
            "https://deev.space",
            vec![("hello".into(), edited)],
            vec!["space-api".into()],
        );

        assert_eq!(entries.len(), SECTIONS.len() + 2);
        assert_eq!(entries[0].loc, "https://deev.space/");

        let article = &entries[SECTIONS.len()];
        assert_eq!(article.loc, "https://deev.space/blog/hello/");
        assert_eq!(article.lastmod, Some(edited));
        assert_eq!(article.changefreq, ChangeFreq::Weekly);

        let project = &entries[SECTIONS.len() + 1];
        assert_eq!(project.loc, "https://deev.space/projects/#space-api");
        assert_eq!(project.lastmod, None);
    }

    #[test]
    fn entries_serialize_without_missing_dates() {
        let entries = sitemap_entries("https://deev.space", vec![], vec!["cli".into()]);

        assert_eq!(
            serde_json::to_value(entries.last().unwrap()).unwrap(),
            serde_json::json!({
                "loc": "https://deev.space/projects/#cli",
                "changefreq": "monthly",
                "priority": 0.7,
            })
        );
    }
}
