use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::util::{hh_mm, uuid_str};

pub mod db;

/// A named time-of-day interval shared by every class that meets in it.
///
/// Sessions only ever reference a slot, they never carry times themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[serde(rename = "_id", with = "uuid_str")]
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(with = "hh_mm")]
    #[schema(value_type = String, example = "08:00")]
    pub from: NaiveTime,
    #[serde(with = "hh_mm")]
    #[schema(value_type = String, example = "09:30")]
    pub to: NaiveTime,
}

impl Slot {
    /// Builds a slot, refusing empty or inverted intervals.
    pub fn new(name: impl ToString, from: NaiveTime, to: NaiveTime) -> Option<Slot> {
        if from >= to {
            return None;
        }

        Some(Slot {
            id: Uuid::new_v4(),
            name: name.to_string(),
            from,
            to,
        })
    }

    /// `HH:MM-HH:MM`, as shown in conflict messages.
    pub fn time_range(&self) -> String {
        format!("{}-{}", self.from.format("%H:%M"), self.to.format("%H:%M"))
    }
}
