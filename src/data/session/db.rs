use bson::{doc, Document};
use chrono::NaiveDate;
use mongodb::options::IndexOptions;
use mongodb::{Database, IndexModel};
use uuid::Uuid;

use crate::data::attendance::db::ATTENDANCE_COLLECTION_NAME;
use crate::data::class::db::CLASS_COLLECTION_NAME;
use crate::data::filter;
use crate::data::grade::db::GRADE_COLLECTION_NAME;

use super::{Session, SessionKey};

pub static SESSION_COLLECTION_NAME: &str = "sessions";

/// MongoDB error code for unique index violations.
pub const DUPLICATE_KEY_CODE: i32 = 11000;

#[inline]
pub fn date_value(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[inline]
pub fn by_key(key: &SessionKey) -> Document {
    doc! {
        "slotId": key.slot_id.to_string(),
        "roomId": key.room_id.to_string(),
        "date": date_value(key.date),
    }
}

#[inline]
pub fn by_slot_and_date(slot: Uuid, date: NaiveDate) -> Document {
    doc! {
        "slotId": slot.to_string(),
        "date": date_value(date),
    }
}

#[inline]
pub fn by_class(class: Uuid) -> Document {
    doc! { "classId": class.to_string() }
}

#[inline]
pub fn by_classes(classes: &[Uuid]) -> Document {
    doc! { "classId": { "$in": filter::strings(classes) } }
}

pub fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(err)) => err.code == DUPLICATE_KEY_CODE,
        ErrorKind::BulkWrite(failure) => failure
            .write_errors
            .as_ref()
            .map_or(false, |errors| {
                errors.iter().any(|it| it.code == DUPLICATE_KEY_CODE)
            }),
        _ => false,
    }
}

fn index(keys: Document, unique: bool) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(unique).build())
        .build()
}

/// Creates the indexes scheduling relies on.
///
/// The unique session index is what keeps rooms from being double booked
/// when two class creations race each other.
pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    db.collection::<Session>(SESSION_COLLECTION_NAME)
        .create_indexes(
            vec![
                index(doc! { "slotId": 1, "roomId": 1, "date": 1 }, true),
                index(doc! { "slotId": 1, "date": 1 }, false),
                index(doc! { "classId": 1 }, false),
            ],
            None,
        )
        .await?;

    db.collection::<Document>(CLASS_COLLECTION_NAME)
        .create_indexes(
            vec![
                index(doc! { "teachers": 1 }, false),
                index(doc! { "students": 1 }, false),
            ],
            None,
        )
        .await?;

    db.collection::<Document>(ATTENDANCE_COLLECTION_NAME)
        .create_index(index(doc! { "sessionId": 1, "studentId": 1 }, true), None)
        .await?;

    db.collection::<Document>(GRADE_COLLECTION_NAME)
        .create_index(index(doc! { "classId": 1, "studentId": 1 }, false), None)
        .await?;

    tracing::info!("MongoDB indexes are in place.");
    Ok(())
}

pub trait SessionDbExt {
    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, mongodb::error::Error>;
}

impl SessionDbExt for Database {
    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, mongodb::error::Error> {
        self.collection(SESSION_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
    }
}
