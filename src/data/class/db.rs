use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::ClassStatus;

pub static CLASS_COLLECTION_NAME: &str = "classes";

/// One line of the requested weekly schedule.
///
/// Everything is optional so missing fields are reported by validation
/// rather than by the body parser.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ScheduleEntryData {
    #[schema(example = "Monday")]
    pub weekday: Option<String>,
    pub slot: Option<Uuid>,
    pub room: Option<Uuid>,
}

/// Class creation request body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassCreateData {
    pub name: Option<String>,
    pub course_id: Option<Uuid>,
    #[schema(example = "2024-09-02")]
    pub start_date: Option<String>,
    #[schema(example = "2025-01-31")]
    pub end_date: Option<String>,
    pub capacity: Option<u32>,
    pub schedule: Option<Vec<ScheduleEntryData>>,
    pub status: Option<ClassStatus>,
    #[serde(default)]
    pub teachers: Vec<Uuid>,
    #[serde(default)]
    pub students: Vec<Uuid>,
}
