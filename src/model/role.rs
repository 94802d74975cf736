use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Role {
    #[default]
    Employee,
    Admin,
}

impl Role {
    /// Unknown values stored in the database fall back to the least privileged role.
    pub fn from_db(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}
