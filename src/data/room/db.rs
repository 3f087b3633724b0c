use bson::doc;
use mongodb::options::FindOptions;
use mongodb::Database;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::data::collect_cursor;
use crate::resp::problem::{problems, Problem};

use super::Room;

pub static ROOM_COLLECTION_NAME: &str = "rooms";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RoomCreateData {
    pub name: String,
    pub capacity: u32,
}

impl RoomCreateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.name.trim().is_empty() {
            return Err(problems::bad_request("Room name can't be empty."));
        }
        if self.capacity == 0 {
            return Err(problems::bad_request("Room capacity must be positive."));
        }
        Ok(())
    }
}

pub trait RoomDbExt {
    async fn create_room(&self, data: RoomCreateData) -> Result<Room, Problem>;
    async fn list_rooms(&self) -> Result<Vec<Room>, Problem>;
}

impl RoomDbExt for Database {
    async fn create_room(&self, data: RoomCreateData) -> Result<Room, Problem> {
        data.validate()?;
        let rooms = self.collection::<Room>(ROOM_COLLECTION_NAME);

        let name = data.name.trim();
        if rooms.find_one(doc! { "name": name }, None).await?.is_some() {
            return Err(problems::bad_request(format!(
                "Room '{}' already exists.",
                name
            )));
        }

        let room = Room::new(name, data.capacity);
        rooms.insert_one(&room, None).await?;

        Ok(room)
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, Problem> {
        let cursor = self
            .collection::<Room>(ROOM_COLLECTION_NAME)
            .find(None, FindOptions::builder().sort(doc! { "name": 1 }).build())
            .await?;

        Ok(collect_cursor(cursor).await?)
    }
}
