use chrono::NaiveDate;
use diesel::prelude::*;
use serde::Serialize;

/// Skill categories in display order, with their labels.
pub const SKILL_CATEGORIES: &[(&str, &str)] = &[
    ("backend", "Backend"),
    ("frontend", "Frontend"),
    ("devops", "DevOps"),
    ("database", "Database"),
    ("tools", "Tools"),
];

pub fn skill_category_label(category: &str) -> &str {
    SKILL_CATEGORIES
        .iter()
        .find(|(key, _)| *key == category)
        .map(|(_, label)| *label)
        .unwrap_or(category)
}

#[derive(Queryable, Selectable, Debug, Serialize, Clone)]
#[diesel(table_name = crate::schema::skills)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Skill {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub icon: String,
    pub sort_order: i32,
}

#[derive(Queryable, Selectable, Debug, Serialize, Clone)]
#[diesel(table_name = crate::schema::experiences)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Experience {
    pub id: i32,
    pub title: String,
    pub company: String,
    pub company_url: String,
    pub description: String,
    pub responsibilities: String,
    pub technologies: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub sort_order: i32,
}

#[derive(Queryable, Selectable, Debug, Serialize, Clone)]
#[diesel(table_name = crate::schema::educations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Education {
    pub id: i32,
    pub institution: String,
    pub institution_short: String,
    pub degree: String,
    pub education_type: String,
    pub description: String,
    pub achievements: String,
    pub start_year: i32,
    pub end_year: Option<i32>,
    pub is_current: bool,
    pub certificate_number: String,
    pub certificate_url: String,
    pub sort_order: i32,
}
