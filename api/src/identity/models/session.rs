use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use super::identity::Identity;
use crate::schema::{identities, sessions};

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Session {
    pub id: i32,
    pub token: String,
    pub active: bool,
    pub issued_at: chrono::NaiveDateTime,
    pub expires_at: chrono::NaiveDateTime,
    pub identity_id: i32,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

/// Resolves a session token to its identity. Only active sessions inside their
/// validity window count.
pub async fn find_identity_by_token(
    conn: &mut AsyncPgConnection,
    token: &str,
) -> QueryResult<Option<(Session, Identity)>> {
    let now = chrono::Utc::now().naive_utc();

    sessions::table
        .inner_join(identities::table)
        .filter(sessions::token.eq(token))
        .filter(sessions::active.eq(true))
        .filter(sessions::expires_at.gt(now))
        .filter(sessions::issued_at.le(now))
        .select((Session::as_select(), Identity::as_select()))
        .first(conn)
        .await
        .optional()
}
