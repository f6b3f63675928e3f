use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

#[derive(Queryable, Selectable, Debug, Serialize, Clone, PartialEq)]
#[diesel(table_name = crate::schema::votes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Vote {
    pub id: i32,
    pub subject_kind: String,
    pub subject_id: i32,
    pub voter_id: i32,
    pub is_like: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::votes)]
pub struct NewVote<'a> {
    pub subject_kind: &'a str,
    pub subject_id: i32,
    pub voter_id: i32,
    pub is_like: bool,
}
