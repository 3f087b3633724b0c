use std::sync::Arc;

use bson::{doc, Document};
use chrono::NaiveDate;
use mongodb::options::{FindOptions, InsertManyOptions};
use mongodb::Database;
use thiserror::Error;
use uuid::Uuid;

use crate::data::attendance::db::ATTENDANCE_COLLECTION_NAME;
use crate::data::class::db::CLASS_COLLECTION_NAME;
use crate::data::class::Class;
use crate::data::course::db::CourseDbExt;
use crate::data::course::Course;
use crate::data::grade::db::GRADE_COLLECTION_NAME;
use crate::data::room::db::ROOM_COLLECTION_NAME;
use crate::data::room::Room;
use crate::data::session::db::{self as session_db, SESSION_COLLECTION_NAME};
use crate::data::session::{Session, SessionKey};
use crate::data::slot::db::SLOT_COLLECTION_NAME;
use crate::data::slot::Slot;
use crate::data::{collect_cursor, filter};
use crate::middleware::paging::PageState;

#[cfg(test)]
pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A write collided with the unique `(slot, room, date)` session key.
    #[error("unique session key violated")]
    Duplicate,
    #[error(transparent)]
    Database(mongodb::error::Error),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(e: mongodb::error::Error) -> Self {
        if session_db::is_duplicate_key(&e) {
            StoreError::Duplicate
        } else {
            StoreError::Database(e)
        }
    }
}

/// Which roster a lookup is matching users against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterRole {
    Teacher,
    Student,
}

impl RosterRole {
    pub fn field(self) -> &'static str {
        match self {
            RosterRole::Teacher => "teachers",
            RosterRole::Student => "students",
        }
    }

    pub fn roster(self, class: &Class) -> &[Uuid] {
        match self {
            RosterRole::Teacher => &class.teachers,
            RosterRole::Student => &class.students,
        }
    }
}

/// Persistence the scheduler works against.
///
/// Implementations must reject a session whose `(slot, room, date)` key is
/// already taken with [`StoreError::Duplicate`]; application level checks
/// alone can't see writes made by concurrent requests.
#[rocket::async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn course(&self, id: Uuid) -> Result<Option<Course>, StoreError>;
    async fn slots(&self, ids: &[Uuid]) -> Result<Vec<Slot>, StoreError>;
    async fn rooms(&self, ids: &[Uuid]) -> Result<Vec<Room>, StoreError>;

    /// Session occupying exactly `key`, if any.
    async fn session_at(&self, key: &SessionKey) -> Result<Option<Session>, StoreError>;
    /// Every session held in `slot` on `date`, in any room.
    async fn sessions_in_slot(
        &self,
        slot: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Session>, StoreError>;
    /// Classes among `classes` whose `role` roster contains any of `users`.
    async fn rostered_classes(
        &self,
        classes: &[Uuid],
        users: &[Uuid],
        role: RosterRole,
    ) -> Result<Vec<Class>, StoreError>;

    async fn insert_class(&self, class: &Class) -> Result<(), StoreError>;
    /// Inserts sessions in order, stopping at the first rejected one.
    async fn insert_sessions(&self, sessions: &[Session]) -> Result<(), StoreError>;
    /// Deletes a class together with everything hanging off it.
    async fn delete_class(&self, id: Uuid) -> Result<Option<Class>, StoreError>;

    async fn class(&self, id: Uuid) -> Result<Option<Class>, StoreError>;
    async fn list_classes(&self, page: PageState) -> Result<Vec<Class>, StoreError>;
    async fn class_sessions(&self, id: Uuid) -> Result<Vec<Session>, StoreError>;
    /// Sessions of every class `user` teaches or attends.
    async fn user_sessions(&self, user: Uuid) -> Result<Vec<Session>, StoreError>;
}

pub type Store = Arc<dyn ScheduleStore>;

fn session_order() -> Document {
    doc! { "date": 1, "slotId": 1 }
}

async fn find_sessions(db: &Database, filter: Document) -> Result<Vec<Session>, StoreError> {
    let cursor = db
        .collection::<Session>(SESSION_COLLECTION_NAME)
        .find(filter, FindOptions::builder().sort(session_order()).build())
        .await?;
    Ok(collect_cursor(cursor).await?)
}

#[rocket::async_trait]
impl ScheduleStore for Database {
    async fn course(&self, id: Uuid) -> Result<Option<Course>, StoreError> {
        Ok(self.get_course(id).await?)
    }

    async fn slots(&self, ids: &[Uuid]) -> Result<Vec<Slot>, StoreError> {
        let cursor = self
            .collection::<Slot>(SLOT_COLLECTION_NAME)
            .find(filter::by_ids(ids), None)
            .await?;
        Ok(collect_cursor(cursor).await?)
    }

    async fn rooms(&self, ids: &[Uuid]) -> Result<Vec<Room>, StoreError> {
        let cursor = self
            .collection::<Room>(ROOM_COLLECTION_NAME)
            .find(filter::by_ids(ids), None)
            .await?;
        Ok(collect_cursor(cursor).await?)
    }

    async fn session_at(&self, key: &SessionKey) -> Result<Option<Session>, StoreError> {
        Ok(self
            .collection::<Session>(SESSION_COLLECTION_NAME)
            .find_one(session_db::by_key(key), None)
            .await?)
    }

    async fn sessions_in_slot(
        &self,
        slot: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Session>, StoreError> {
        find_sessions(self, session_db::by_slot_and_date(slot, date)).await
    }

    async fn rostered_classes(
        &self,
        classes: &[Uuid],
        users: &[Uuid],
        role: RosterRole,
    ) -> Result<Vec<Class>, StoreError> {
        if classes.is_empty() || users.is_empty() {
            return Ok(vec![]);
        }

        let mut query = filter::by_ids(classes);
        query.insert(role.field(), doc! { "$in": filter::strings(users) });

        let cursor = self
            .collection::<Class>(CLASS_COLLECTION_NAME)
            .find(query, FindOptions::builder().sort(doc! { "name": 1 }).build())
            .await?;
        Ok(collect_cursor(cursor).await?)
    }

    async fn insert_class(&self, class: &Class) -> Result<(), StoreError> {
        self.collection::<Class>(CLASS_COLLECTION_NAME)
            .insert_one(class, None)
            .await?;
        Ok(())
    }

    async fn insert_sessions(&self, sessions: &[Session]) -> Result<(), StoreError> {
        if sessions.is_empty() {
            return Ok(());
        }

        self.collection::<Session>(SESSION_COLLECTION_NAME)
            .insert_many(sessions, InsertManyOptions::builder().ordered(true).build())
            .await?;
        Ok(())
    }

    async fn delete_class(&self, id: Uuid) -> Result<Option<Class>, StoreError> {
        let by_class = session_db::by_class(id);

        self.collection::<Session>(SESSION_COLLECTION_NAME)
            .delete_many(by_class.clone(), None)
            .await?;
        self.collection::<Document>(ATTENDANCE_COLLECTION_NAME)
            .delete_many(by_class.clone(), None)
            .await?;
        self.collection::<Document>(GRADE_COLLECTION_NAME)
            .delete_many(by_class, None)
            .await?;

        Ok(self
            .collection::<Class>(CLASS_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await?)
    }

    async fn class(&self, id: Uuid) -> Result<Option<Class>, StoreError> {
        Ok(self
            .collection::<Class>(CLASS_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await?)
    }

    async fn list_classes(&self, page: PageState) -> Result<Vec<Class>, StoreError> {
        let options = FindOptions::builder()
            .sort(doc! { "startDate": 1, "name": 1 })
            .skip(page.skip())
            .limit(page.limit())
            .build();

        let cursor = self
            .collection::<Class>(CLASS_COLLECTION_NAME)
            .find(None, options)
            .await?;
        Ok(collect_cursor(cursor).await?)
    }

    async fn class_sessions(&self, id: Uuid) -> Result<Vec<Session>, StoreError> {
        find_sessions(self, session_db::by_class(id)).await
    }

    async fn user_sessions(&self, user: Uuid) -> Result<Vec<Session>, StoreError> {
        let user = user.to_string();
        let cursor = self
            .collection::<Document>(CLASS_COLLECTION_NAME)
            .find(
                doc! { "$or": [ { "teachers": user.as_str() }, { "students": user.as_str() } ] },
                FindOptions::builder()
                    .projection(doc! { "_id": 1 })
                    .build(),
            )
            .await?;

        let classes: Vec<Uuid> = collect_cursor(cursor)
            .await?
            .iter()
            .filter_map(|it| it.get_str("_id").ok())
            .filter_map(|it| Uuid::parse_str(it).ok())
            .collect();

        if classes.is_empty() {
            return Ok(vec![]);
        }

        find_sessions(self, session_db::by_classes(&classes)).await
    }
}
