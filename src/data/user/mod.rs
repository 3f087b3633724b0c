use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::util::uuid_str;

use crate::role::Role;

pub mod db;

/// A person known to the school. Rosters and attendance reference users by id.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", with = "uuid_str")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

impl User {
    pub fn new(
        username: impl ToString,
        email: impl ToString,
        name: impl ToString,
        role: Role,
    ) -> User {
        let id = Uuid::new_v4();
        tracing::info!("Creating a new user with UUID: {}", id);

        User {
            id,
            username: username.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            role,
            created: Utc::now(),
        }
    }
}
