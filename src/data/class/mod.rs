use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::schedule::calendar::Weekday;
use crate::util::uuid_str;

pub mod db;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ClassStatus {
    Active,
    Inactive,
    Archived,
}

impl Default for ClassStatus {
    fn default() -> Self {
        ClassStatus::Active
    }
}

/// One line of a class's weekly template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPattern {
    pub weekday: Weekday,
    #[serde(with = "uuid_str")]
    pub slot_id: Uuid,
    #[serde(with = "uuid_str")]
    pub room_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    #[serde(rename = "_id", with = "uuid_str")]
    pub id: Uuid,
    pub name: String,
    #[serde(with = "uuid_str")]
    pub course_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub capacity: u32,
    #[serde(default, with = "uuid_str::vec")]
    pub teachers: Vec<Uuid>,
    #[serde(default, with = "uuid_str::vec")]
    pub students: Vec<Uuid>,
    #[serde(default)]
    pub status: ClassStatus,
    #[serde(default)]
    pub schedule: Vec<RecurringPattern>,

    #[serde(with = "uuid_str")]
    pub created_by: Uuid,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated: DateTime<Utc>,
}

impl Class {
    pub fn has_teacher(&self, user: Uuid) -> bool {
        self.teachers.contains(&user)
    }

    pub fn has_student(&self, user: Uuid) -> bool {
        self.students.contains(&user)
    }

    pub fn has_member(&self, user: Uuid) -> bool {
        self.has_teacher(user) || self.has_student(user)
    }
}
