use std::collections::BTreeSet;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};

use crate::{
    App,
    error::AppError,
    identity::AdminUser,
    models::project::{CARD_SIZES, NewProject, Project, ProjectSubmission, STATUSES},
    schema::projects,
    slug::{ContentKind, insert_with_slug},
    store::StoreError,
    utils::{check_len, split_list},
};

const TITLE_MAX_CHARS: usize = 200;
const SHORT_DESCRIPTION_MAX_CHARS: usize = 300;
const TECHNOLOGIES_MAX_CHARS: usize = 500;

#[derive(Serialize, Debug, Clone)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub technologies_list: Vec<String>,
    pub features_list: Vec<String>,
}

impl From<Project> for ProjectView {
    fn from(project: Project) -> Self {
        ProjectView {
            technologies_list: split_list(&project.technologies, ','),
            features_list: split_list(&project.features, '\n'),
            project,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct ProjectQuery {
    tech: Option<String>,
    status: Option<String>,
}

#[derive(Serialize, Debug, Default)]
pub struct ProjectListing {
    pub completed: Vec<ProjectView>,
    pub in_development: Vec<ProjectView>,
    /// Every technology used by a visible project, whatever the filters.
    pub technologies: Vec<String>,
    pub current_tech: String,
    pub current_status: String,
}

/// Splits visible projects by status, keeping their order.
///
/// `tech` matches case-insensitively anywhere in the technologies field.
/// `status` narrows the result to one side: `completed` keeps only completed
/// projects, `in_development` keeps both unfinished statuses.
pub fn partition_projects(
    projects: Vec<Project>,
    tech: Option<&str>,
    status: Option<&str>,
) -> ProjectListing {
    let technologies: BTreeSet<String> = projects
        .iter()
        .flat_map(|p| split_list(&p.technologies, ','))
        .collect();

    let tech = tech.map(str::trim).filter(|t| !t.is_empty());
    let status = status.map(str::trim).filter(|s| !s.is_empty());
    let needle = tech.map(str::to_lowercase);

    let mut listing = ProjectListing {
        technologies: technologies.into_iter().collect(),
        current_tech: tech.unwrap_or_default().to_string(),
        current_status: status.unwrap_or_default().to_string(),
        ..Default::default()
    };

    let matching = projects.into_iter().filter(|p| match &needle {
        Some(needle) => p.technologies.to_lowercase().contains(needle.as_str()),
        None => true,
    });

    for project in matching {
        match project.status.as_str() {
            "completed" if status != Some("in_development") => {
                listing.completed.push(project.into())
            }
            "in_development" | "beta" if status != Some("completed") => {
                listing.in_development.push(project.into())
            }
            _ => {}
        }
    }

    listing
}

pub async fn list_projects(
    State(ctx): State<App>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<ProjectListing>, AppError> {
    let mut conn = ctx.diesel.get().await?;

    let visible = projects::table
        .filter(projects::is_visible.eq(true))
        .order((projects::sort_order.asc(), projects::created_at.desc()))
        .select(Project::as_select())
        .load(&mut conn)
        .await?;

    Ok(Json(partition_projects(
        visible,
        query.tech.as_deref(),
        query.status.as_deref(),
    )))
}

/// Validates a submission and returns its trimmed title.
fn check_submission(submission: &ProjectSubmission) -> Result<String, AppError> {
    let title = submission.title.trim().to_string();
    if title.is_empty() {
        return Err(("No title provided", StatusCode::BAD_REQUEST).into());
    }
    check_len("Title", &title, TITLE_MAX_CHARS)?;
    if let Some(slug) = &submission.slug {
        check_len("Slug", slug, ContentKind::Project.slug_max_len())?;
    }
    check_len(
        "Short description",
        &submission.short_description,
        SHORT_DESCRIPTION_MAX_CHARS,
    )?;
    check_len(
        "Technologies",
        &submission.technologies,
        TECHNOLOGIES_MAX_CHARS,
    )?;
    if !STATUSES.contains(&submission.status.as_str()) {
        return Err((
            format!("Unknown project status: {}", submission.status),
            StatusCode::BAD_REQUEST,
        )
            .into());
    }
    if !CARD_SIZES.contains(&submission.card_size.as_str()) {
        return Err((
            format!("Unknown card size: {}", submission.card_size),
            StatusCode::BAD_REQUEST,
        )
            .into());
    }

    Ok(title)
}

pub async fn create_project(
    State(ctx): State<App>,
    AdminUser(_admin): AdminUser,
    crate::json::Json(submission): crate::json::Json<ProjectSubmission>,
) -> Result<(StatusCode, Json<ProjectView>), AppError> {
    let title = check_submission(&submission)?;

    let draft = NewProject {
        title: title.clone(),
        slug: String::new(),
        short_description: submission.short_description,
        description: submission.description,
        features: submission.features,
        img_main: submission.img_main.filter(|img| !img.is_empty()),
        technologies: submission.technologies,
        github_url: submission.github_url,
        demo_url: submission.demo_url,
        status: submission.status,
        card_size: submission.card_size,
        sort_order: submission.sort_order,
        is_visible: submission.is_visible,
    };

    let project = insert_with_slug(
        &ctx.store,
        ContentKind::Project,
        submission.slug.as_deref(),
        &title,
        |slug| {
            let pool = ctx.diesel.clone();
            let new_project = NewProject {
                slug,
                ..draft.clone()
            };
            async move {
                let mut conn = pool.get().await?;
                let project = diesel::insert_into(projects::table)
                    .values(&new_project)
                    .returning(Project::as_returning())
                    .get_result(&mut conn)
                    .await?;
                Ok::<_, StoreError>(project)
            }
        },
    )
    .await?;

    tracing::info!(project_id = project.id, slug = %project.slug, "Project created");

    Ok((StatusCode::CREATED, Json(project.into())))
}
