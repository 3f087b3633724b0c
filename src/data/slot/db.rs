use bson::doc;
use mongodb::options::FindOptions;
use mongodb::Database;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::data::collect_cursor;
use crate::resp::problem::{problems, Problem};
use crate::util::hh_mm;

use super::Slot;

pub static SLOT_COLLECTION_NAME: &str = "slots";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SlotCreateData {
    #[serde(default)]
    pub name: String,
    #[serde(with = "hh_mm")]
    #[schema(value_type = String, example = "08:00")]
    pub from: chrono::NaiveTime,
    #[serde(with = "hh_mm")]
    #[schema(value_type = String, example = "09:30")]
    pub to: chrono::NaiveTime,
}

impl SlotCreateData {
    pub fn into_slot(self) -> Result<Slot, Problem> {
        Slot::new(self.name, self.from, self.to)
            .ok_or_else(|| problems::bad_request("Slot must end after it starts."))
    }
}

pub trait SlotDbExt {
    async fn create_slot(&self, data: SlotCreateData) -> Result<Slot, Problem>;
    async fn list_slots(&self) -> Result<Vec<Slot>, Problem>;
}

impl SlotDbExt for Database {
    async fn create_slot(&self, data: SlotCreateData) -> Result<Slot, Problem> {
        let slot = data.into_slot()?;

        self.collection::<Slot>(SLOT_COLLECTION_NAME)
            .insert_one(&slot, None)
            .await?;

        Ok(slot)
    }

    async fn list_slots(&self) -> Result<Vec<Slot>, Problem> {
        let cursor = self
            .collection::<Slot>(SLOT_COLLECTION_NAME)
            .find(None, FindOptions::builder().sort(doc! { "from": 1 }).build())
            .await?;

        Ok(collect_cursor(cursor).await?)
    }
}
