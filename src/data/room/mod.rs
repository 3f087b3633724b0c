use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::util::uuid_str;

pub mod db;

/// Physical or virtual place a session is held in. Hosts at most one
/// session per date and slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[serde(rename = "_id", with = "uuid_str")]
    pub id: Uuid,
    pub name: String,
    pub capacity: u32,
}

impl Room {
    pub fn new(name: impl ToString, capacity: u32) -> Room {
        Room {
            id: Uuid::new_v4(),
            name: name.to_string(),
            capacity,
        }
    }
}
