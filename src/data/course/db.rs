use bson::doc;
use mongodb::options::FindOptions;
use mongodb::Database;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::{collect_cursor, filter};
use crate::resp::problem::{problems, Problem};

use super::Course;

pub static COURSE_COLLECTION_NAME: &str = "courses";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CourseCreateData {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CourseCreateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.name.trim().is_empty() {
            return Err(problems::bad_request("Course name can't be empty."));
        }
        Ok(())
    }
}

pub trait CourseDbExt {
    async fn create_course(&self, data: CourseCreateData) -> Result<Course, Problem>;
    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, mongodb::error::Error>;
    async fn list_courses(&self) -> Result<Vec<Course>, Problem>;
}

impl CourseDbExt for Database {
    async fn create_course(&self, data: CourseCreateData) -> Result<Course, Problem> {
        let course = Course::new(data.name.trim(), data.description);

        self.collection::<Course>(COURSE_COLLECTION_NAME)
            .insert_one(&course, None)
            .await?;

        Ok(course)
    }

    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, mongodb::error::Error> {
        self.collection(COURSE_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
    }

    async fn list_courses(&self) -> Result<Vec<Course>, Problem> {
        let cursor = self
            .collection::<Course>(COURSE_COLLECTION_NAME)
            .find(None, FindOptions::builder().sort(doc! { "name": 1 }).build())
            .await?;

        Ok(collect_cursor(cursor).await?)
    }
}
