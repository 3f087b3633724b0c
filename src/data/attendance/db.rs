use bson::doc;
use mongodb::options::{FindOptions, ReplaceOptions};
use mongodb::Database;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::class::Class;
use crate::data::collect_cursor;
use crate::data::session::Session;
use crate::resp::problem::{problems, Problem};

use super::{Attendance, AttendanceStatus};

pub static ATTENDANCE_COLLECTION_NAME: &str = "attendance";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AttendanceRecordData {
    pub student: Uuid,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub note: Option<String>,
}

impl AttendanceRecordData {
    /// Turns the request into a record, provided the student is on the
    /// roster of the class owning the session.
    pub fn into_attendance(
        self,
        session: &Session,
        class: &Class,
        recorded_by: Uuid,
    ) -> Result<Attendance, Problem> {
        if !class.has_student(self.student) {
            return Err(problems::bad_request(format!(
                "User {} isn't a student of class '{}'.",
                self.student, class.name
            )));
        }

        Ok(Attendance {
            id: Uuid::new_v4(),
            session_id: session.id,
            class_id: session.class_id,
            student_id: self.student,
            status: self.status,
            note: self.note.filter(|it| !it.trim().is_empty()),
            recorded_by,
            recorded: chrono::Utc::now(),
        })
    }
}

pub trait AttendanceDbExt {
    async fn record_attendance(&self, attendance: Attendance) -> Result<Attendance, Problem>;
    async fn session_attendance(&self, session: Uuid) -> Result<Vec<Attendance>, Problem>;
}

impl AttendanceDbExt for Database {
    async fn record_attendance(&self, mut attendance: Attendance) -> Result<Attendance, Problem> {
        let collection = self.collection::<Attendance>(ATTENDANCE_COLLECTION_NAME);
        let filter = doc! {
            "sessionId": attendance.session_id.to_string(),
            "studentId": attendance.student_id.to_string(),
        };

        // Re-marking keeps the original record id.
        if let Some(existing) = collection.find_one(filter.clone(), None).await? {
            attendance.id = existing.id;
        }

        collection
            .replace_one(
                filter,
                &attendance,
                ReplaceOptions::builder().upsert(true).build(),
            )
            .await?;

        Ok(attendance)
    }

    async fn session_attendance(&self, session: Uuid) -> Result<Vec<Attendance>, Problem> {
        let cursor = self
            .collection::<Attendance>(ATTENDANCE_COLLECTION_NAME)
            .find(
                doc! { "sessionId": session.to_string() },
                FindOptions::builder().sort(doc! { "studentId": 1 }).build(),
            )
            .await?;

        Ok(collect_cursor(cursor).await?)
    }
}
