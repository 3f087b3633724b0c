use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::util::uuid_str;

pub mod db;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    #[serde(rename = "_id", with = "uuid_str")]
    pub id: Uuid,
    #[serde(with = "uuid_str")]
    pub class_id: Uuid,
    #[serde(with = "uuid_str")]
    pub student_id: Uuid,
    pub title: String,
    pub score: f64,
    pub max_score: f64,
    #[serde(with = "uuid_str")]
    pub recorded_by: Uuid,
    #[serde(default = "Utc::now")]
    pub recorded: DateTime<Utc>,
}
