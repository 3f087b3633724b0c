use bson::doc;
use mongodb::options::FindOptions;
use mongodb::Database;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::class::Class;
use crate::data::collect_cursor;
use crate::resp::problem::{problems, Problem};

use super::Grade;

pub static GRADE_COLLECTION_NAME: &str = "grades";

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GradeRecordData {
    pub student: Uuid,
    pub title: String,
    pub score: f64,
    pub max_score: f64,
}

impl GradeRecordData {
    pub fn into_grade(self, class: &Class, recorded_by: Uuid) -> Result<Grade, Problem> {
        if self.title.trim().is_empty() {
            return Err(problems::bad_request("Grade title can't be empty."));
        }
        if !(self.max_score > 0.0) {
            return Err(problems::bad_request("Maximum score must be positive."));
        }
        if !(0.0..=self.max_score).contains(&self.score) {
            return Err(problems::bad_request(format!(
                "Score must be between 0 and {}.",
                self.max_score
            )));
        }
        if !class.has_student(self.student) {
            return Err(problems::bad_request(format!(
                "User {} isn't a student of class '{}'.",
                self.student, class.name
            )));
        }

        Ok(Grade {
            id: Uuid::new_v4(),
            class_id: class.id,
            student_id: self.student,
            title: self.title.trim().to_string(),
            score: self.score,
            max_score: self.max_score,
            recorded_by,
            recorded: chrono::Utc::now(),
        })
    }
}

pub trait GradeDbExt {
    async fn record_grade(&self, grade: Grade) -> Result<Grade, Problem>;
    async fn class_grades(&self, class: Uuid, student: Option<Uuid>) -> Result<Vec<Grade>, Problem>;
}

impl GradeDbExt for Database {
    async fn record_grade(&self, grade: Grade) -> Result<Grade, Problem> {
        self.collection::<Grade>(GRADE_COLLECTION_NAME)
            .insert_one(&grade, None)
            .await?;
        Ok(grade)
    }

    async fn class_grades(&self, class: Uuid, student: Option<Uuid>) -> Result<Vec<Grade>, Problem> {
        let mut filter = doc! { "classId": class.to_string() };
        if let Some(student) = student {
            filter.insert("studentId", student.to_string());
        }

        let cursor = self
            .collection::<Grade>(GRADE_COLLECTION_NAME)
            .find(
                filter,
                FindOptions::builder().sort(doc! { "recorded": 1 }).build(),
            )
            .await?;

        Ok(collect_cursor(cursor).await?)
    }
}
