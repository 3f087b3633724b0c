use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use uuid::Uuid;

use crate::data::room::Room;
use crate::data::session::SessionKey;
use crate::data::slot::Slot;

use super::store::{RosterRole, ScheduleStore, StoreError};

/// First collision found between a candidate session and persisted ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Conflict {
    #[serde(rename_all = "camelCase")]
    RoomConflict {
        date: NaiveDate,
        slot_time: String,
        room_name: String,
    },
    #[serde(rename_all = "camelCase")]
    TeacherConflict {
        date: NaiveDate,
        slot_time: String,
        conflicting_class_names: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    StudentConflict {
        date: NaiveDate,
        slot_time: String,
        conflicting_class_names: Vec<String>,
    },
}

impl Conflict {
    pub fn kind(&self) -> &'static str {
        match self {
            Conflict::RoomConflict { .. } => "room_conflict",
            Conflict::TeacherConflict { .. } => "teacher_conflict",
            Conflict::StudentConflict { .. } => "student_conflict",
        }
    }
}

impl Display for Conflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Conflict::RoomConflict {
                date,
                slot_time,
                room_name,
            } => write!(
                f,
                "Room '{}' is already booked on {} at {}.",
                room_name, date, slot_time
            ),
            Conflict::TeacherConflict {
                date,
                slot_time,
                conflicting_class_names,
            } => write!(
                f,
                "A teacher of this class already teaches {} on {} at {}.",
                conflicting_class_names.join(", "),
                date,
                slot_time
            ),
            Conflict::StudentConflict {
                date,
                slot_time,
                conflicting_class_names,
            } => write!(
                f,
                "A student of this class already attends {} on {} at {}.",
                conflicting_class_names.join(", "),
                date,
                slot_time
            ),
        }
    }
}

/// Checks candidate sessions against everything already persisted.
///
/// A candidate fails on the first of, in order: its room being taken, a
/// class sharing its slot and date having one of `teachers`, or such a class
/// having one of `students`.
pub struct ConflictDetector<'a> {
    store: &'a dyn ScheduleStore,
    slots: &'a HashMap<Uuid, Slot>,
    rooms: &'a HashMap<Uuid, Room>,
    concurrency: usize,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(
        store: &'a dyn ScheduleStore,
        slots: &'a HashMap<Uuid, Slot>,
        rooms: &'a HashMap<Uuid, Room>,
        concurrency: usize,
    ) -> ConflictDetector<'a> {
        ConflictDetector {
            store,
            slots,
            rooms,
            concurrency: concurrency.max(1),
        }
    }

    /// Returns the conflict of the earliest failing candidate, or `None` when
    /// every candidate is free.
    ///
    /// Candidates are checked concurrently but reported in input order.
    pub async fn check(
        &self,
        candidates: &[SessionKey],
        teachers: &[Uuid],
        students: &[Uuid],
    ) -> Result<Option<Conflict>, StoreError> {
        let mut results = stream::iter(candidates.iter().copied())
            .map(|key| self.check_one(key, teachers, students))
            .buffered(self.concurrency);

        while let Some(result) = results.next().await {
            if let Some(conflict) = result? {
                return Ok(Some(conflict));
            }
        }

        Ok(None)
    }

    async fn check_one(
        &self,
        key: SessionKey,
        teachers: &[Uuid],
        students: &[Uuid],
    ) -> Result<Option<Conflict>, StoreError> {
        if self.store.session_at(&key).await?.is_some() {
            return Ok(Some(Conflict::RoomConflict {
                date: key.date,
                slot_time: self.slot_time(key.slot_id),
                room_name: self.room_name(key.room_id),
            }));
        }

        if teachers.is_empty() && students.is_empty() {
            return Ok(None);
        }

        let mut sharing: Vec<Uuid> = self
            .store
            .sessions_in_slot(key.slot_id, key.date)
            .await?
            .into_iter()
            .map(|it| it.class_id)
            .collect();
        sharing.sort();
        sharing.dedup();

        if sharing.is_empty() {
            return Ok(None);
        }

        let teaching = self
            .store
            .rostered_classes(&sharing, teachers, RosterRole::Teacher)
            .await?;
        if !teaching.is_empty() {
            return Ok(Some(Conflict::TeacherConflict {
                date: key.date,
                slot_time: self.slot_time(key.slot_id),
                conflicting_class_names: teaching.into_iter().map(|it| it.name).collect(),
            }));
        }

        let attending = self
            .store
            .rostered_classes(&sharing, students, RosterRole::Student)
            .await?;
        if !attending.is_empty() {
            return Ok(Some(Conflict::StudentConflict {
                date: key.date,
                slot_time: self.slot_time(key.slot_id),
                conflicting_class_names: attending.into_iter().map(|it| it.name).collect(),
            }));
        }

        Ok(None)
    }

    fn slot_time(&self, slot: Uuid) -> String {
        self.slots
            .get(&slot)
            .map(Slot::time_range)
            .unwrap_or_else(|| slot.to_string())
    }

    fn room_name(&self, room: Uuid) -> String {
        self.rooms
            .get(&room)
            .map(|it| it.name.clone())
            .unwrap_or_else(|| room.to_string())
    }
}
