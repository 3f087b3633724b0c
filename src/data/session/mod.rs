use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::util::uuid_str;

pub mod db;

/// Identity of a physical session: one room, in one slot, on one day.
///
/// No two persisted sessions share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionKey {
    #[serde(with = "uuid_str")]
    pub slot_id: Uuid,
    #[serde(with = "uuid_str")]
    pub room_id: Uuid,
    pub date: NaiveDate,
}

/// One dated meeting of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "_id", with = "uuid_str")]
    pub id: Uuid,
    #[serde(with = "uuid_str")]
    pub class_id: Uuid,
    #[serde(with = "uuid_str")]
    pub slot_id: Uuid,
    #[serde(with = "uuid_str")]
    pub room_id: Uuid,
    pub date: NaiveDate,
}

impl Session {
    pub fn new(class_id: Uuid, key: SessionKey) -> Session {
        Session {
            id: Uuid::new_v4(),
            class_id,
            slot_id: key.slot_id,
            room_id: key.room_id,
            date: key.date,
        }
    }

    pub fn key(&self) -> SessionKey {
        SessionKey {
            slot_id: self.slot_id,
            room_id: self.room_id,
            date: self.date,
        }
    }
}
