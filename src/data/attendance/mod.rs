use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::util::uuid_str;

pub mod db;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

/// Whether one student attended one session. At most one per pair.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    #[serde(rename = "_id", with = "uuid_str")]
    pub id: Uuid,
    #[serde(with = "uuid_str")]
    pub session_id: Uuid,
    #[serde(with = "uuid_str")]
    pub class_id: Uuid,
    #[serde(with = "uuid_str")]
    pub student_id: Uuid,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(with = "uuid_str")]
    pub recorded_by: Uuid,
    #[serde(default = "Utc::now")]
    pub recorded: DateTime<Utc>,
}
