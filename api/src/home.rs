use axum::{Json, extract::State};
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Serialize;

use crate::{
    App,
    blog::{
        article::{ArticleListItem, listed_articles, with_categories},
        models::article::ArticleCard,
    },
    error::AppError,
    models::{
        profile::{Experience, Skill},
        project::Project,
        site::SiteSettings,
    },
    profile::{
        ExperienceView, SkillGroup, group_skills, load_experiences, load_settings, load_skills,
    },
    projects::ProjectView,
    schema::{articles, projects},
};

const RECENT_ARTICLES: i64 = 3;
const FEATURED_PROJECTS: i64 = 6;
const HOME_EXPERIENCES: i64 = 2;

/// Everything the landing page shows.
#[derive(Serialize, Debug)]
pub struct Home {
    pub settings: SiteSettings,
    pub recent_articles: Vec<ArticleListItem>,
    pub featured_projects: Vec<ProjectView>,
    pub experiences: Vec<ExperienceView>,
    pub skills: Vec<SkillGroup>,
}

impl Home {
    pub fn new(
        settings: SiteSettings,
        recent_articles: Vec<ArticleListItem>,
        projects: Vec<Project>,
        experiences: Vec<Experience>,
        skills: Vec<Skill>,
        today: NaiveDate,
    ) -> Self {
        Home {
            settings,
            recent_articles: recent_articles
                .into_iter()
                .take(RECENT_ARTICLES as usize)
                .collect(),
            featured_projects: projects
                .into_iter()
                .take(FEATURED_PROJECTS as usize)
                .map(ProjectView::from)
                .collect(),
            experiences: experiences
                .into_iter()
                .take(HOME_EXPERIENCES as usize)
                .map(|e| ExperienceView::new(e, today))
                .collect(),
            skills: group_skills(skills),
        }
    }
}

pub async fn get_home(State(ctx): State<App>) -> Result<Json<Home>, AppError> {
    let mut conn = ctx.diesel.get().await?;

    let settings = load_settings(&mut conn).await?;

    let cards = listed_articles(None, None)
        .order((articles::created_at.desc(), articles::id.desc()))
        .limit(RECENT_ARTICLES)
        .select(ArticleCard::as_select())
        .load(&mut conn)
        .await?;
    let recent_articles = with_categories(&mut conn, cards).await?;

    let featured = projects::table
        .filter(projects::is_visible.eq(true))
        .order((projects::sort_order.asc(), projects::created_at.desc()))
        .limit(FEATURED_PROJECTS)
        .select(Project::as_select())
        .load(&mut conn)
        .await?;

    let experiences = load_experiences(&mut conn, Some(HOME_EXPERIENCES)).await?;
    let skills = load_skills(&mut conn).await?;

    Ok(Json(Home::new(
        settings,
        recent_articles,
        featured,
        experiences,
        skills,
        Utc::now().date_naive(),
    )))
}
