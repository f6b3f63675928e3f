use diesel::prelude::*;
use serde_json::Value as JsonValue;

/// Shown for identities whose traits carry no name.
pub const ANONYMOUS_NAME: &str = "Anonymous";

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::identities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Identity {
    pub id: i32,
    pub traits: JsonValue,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl Identity {
    pub fn get_traits(&self) -> Traits {
        Traits::from(&self.traits)
    }

    pub fn display_name(&self) -> String {
        display_name(&self.traits)
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Traits {
    pub email: Option<String>,
    pub name: Option<String>,
}

impl From<&JsonValue> for Traits {
    fn from(value: &JsonValue) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Identity traits are malformed");
            Traits::default()
        })
    }
}

/// Name of the identity owning `traits`, falling back to [`ANONYMOUS_NAME`].
pub fn display_name(traits: &JsonValue) -> String {
    Traits::from(traits)
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| ANONYMOUS_NAME.to_string())
}
