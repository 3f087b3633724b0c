use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::util::uuid_str;

pub mod db;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id", with = "uuid_str")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

impl Course {
    pub fn new(name: impl ToString, description: impl ToString) -> Course {
        Course {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.to_string(),
            created: Utc::now(),
        }
    }
}
