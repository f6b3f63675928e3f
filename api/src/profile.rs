use axum::{Json, extract::State};
use chrono::{Datelike, NaiveDate, Utc};
use diesel::{pg::Pg, prelude::*};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;

use crate::{
    App,
    error::AppError,
    models::{
        profile::{Education, Experience, SKILL_CATEGORIES, Skill, skill_category_label},
        site::{NewSiteSettings, SETTINGS_KEY, SiteSettings},
    },
    schema::{educations, experiences, site_settings, skills},
    utils::split_list,
};

/// Loads the settings row, creating it with column defaults on first use.
pub async fn load_settings(conn: &mut AsyncPgConnection) -> QueryResult<SiteSettings> {
    diesel::insert_into(site_settings::table)
        .values(NewSiteSettings { key: SETTINGS_KEY })
        .on_conflict(site_settings::key)
        .do_nothing()
        .execute(conn)
        .await?;

    site_settings::table
        .filter(site_settings::key.eq(SETTINGS_KEY))
        .select(SiteSettings::as_select())
        .first(conn)
        .await
}

pub async fn get_site(State(ctx): State<App>) -> Result<Json<SiteSettings>, AppError> {
    let mut conn = ctx.diesel.get().await?;
    Ok(Json(load_settings(&mut conn).await?))
}

fn plural(count: i32, one: &str, many: &str) -> String {
    if count == 1 {
        format!("1 {one}")
    } else {
        format!("{count} {many}")
    }
}

/// Human readable length of a job, counting whole calendar months.
///
/// An open-ended job runs until `today`.
pub fn experience_duration(start: NaiveDate, end: Option<NaiveDate>, today: NaiveDate) -> String {
    let end = end.unwrap_or(today);
    let months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    let (years, months) = (months / 12, months % 12);

    match (years, months) {
        (y, m) if y <= 0 && m <= 0 => "Less than a month".to_string(),
        (0, m) => plural(m, "month", "months"),
        (y, 0) => plural(y, "year", "years"),
        (y, m) => format!(
            "{} {}",
            plural(y, "year", "years"),
            plural(m, "month", "months")
        ),
    }
}

#[derive(Serialize, Debug)]
pub struct ExperienceView {
    #[serde(flatten)]
    pub experience: Experience,
    pub duration: String,
    pub responsibilities_list: Vec<String>,
    pub technologies_list: Vec<String>,
}

impl ExperienceView {
    pub fn new(experience: Experience, today: NaiveDate) -> Self {
        ExperienceView {
            duration: experience_duration(experience.start_date, experience.end_date, today),
            responsibilities_list: split_list(&experience.responsibilities, '\n'),
            technologies_list: split_list(&experience.technologies, ','),
            experience,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct EducationView {
    #[serde(flatten)]
    pub education: Education,
    pub achievements_list: Vec<String>,
}

#[derive(Serialize, Debug)]
pub struct SkillGroup {
    pub category: String,
    pub label: String,
    pub skills: Vec<Skill>,
}

/// Groups skills by category in display order, dropping empty groups.
pub fn group_skills(skills: Vec<Skill>) -> Vec<SkillGroup> {
    let mut groups: Vec<SkillGroup> = SKILL_CATEGORIES
        .iter()
        .map(|(category, label)| SkillGroup {
            category: category.to_string(),
            label: label.to_string(),
            skills: vec![],
        })
        .collect();

    for skill in skills {
        match groups.iter_mut().find(|g| g.category == skill.category) {
            Some(group) => group.skills.push(skill),
            None => groups.push(SkillGroup {
                label: skill_category_label(&skill.category).to_string(),
                category: skill.category.clone(),
                skills: vec![skill],
            }),
        }
    }

    groups.retain(|g| !g.skills.is_empty());
    groups
}

/// Jobs in display order, optionally only the first `limit`.
pub async fn load_experiences(
    conn: &mut AsyncPgConnection,
    limit: Option<i64>,
) -> QueryResult<Vec<Experience>> {
    let mut query = experiences::table
        .order((experiences::sort_order.asc(), experiences::start_date.desc()))
        .select(Experience::as_select())
        .into_boxed::<Pg>();
    if let Some(limit) = limit {
        query = query.limit(limit);
    }

    query.load(conn).await
}

pub async fn load_skills(conn: &mut AsyncPgConnection) -> QueryResult<Vec<Skill>> {
    skills::table
        .order((
            skills::category.asc(),
            skills::sort_order.asc(),
            skills::name.asc(),
        ))
        .select(Skill::as_select())
        .load(conn)
        .await
}

#[derive(Serialize, Debug)]
pub struct About {
    settings: SiteSettings,
    experiences: Vec<ExperienceView>,
    educations: Vec<EducationView>,
    skills: Vec<SkillGroup>,
}

pub async fn get_about(State(ctx): State<App>) -> Result<Json<About>, AppError> {
    let mut conn = ctx.diesel.get().await?;

    let settings = load_settings(&mut conn).await?;

    let today = Utc::now().date_naive();
    let experiences = load_experiences(&mut conn, None)
        .await?
        .into_iter()
        .map(|e| ExperienceView::new(e, today))
        .collect();

    let educations = educations::table
        .order((educations::sort_order.asc(), educations::start_year.desc()))
        .select(Education::as_select())
        .load(&mut conn)
        .await?
        .into_iter()
        .map(|education| EducationView {
            achievements_list: split_list(&education.achievements, '\n'),
            education,
        })
        .collect();

    let skills = load_skills(&mut conn).await?;

    Ok(Json(About {
        settings,
        experiences,
        educations,
        skills: group_skills(skills),
    }))
}
