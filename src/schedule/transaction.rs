use std::collections::HashMap;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use rocket::http::Status;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::data::class::db::ClassCreateData;
use crate::data::class::{Class, ClassStatus, RecurringPattern};
use crate::data::room::Room;
use crate::data::session::{Session, SessionKey};
use crate::data::slot::Slot;
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::{problems, Problem};
use crate::util::parse_calendar_date;

use super::calendar::{self, CalendarError, Weekday};
use super::conflict::{Conflict, ConflictDetector};
use super::store::{ScheduleStore, StoreError};

#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Malformed or incomplete request, or a schedule producing no sessions.
    #[error("{0}")]
    Validation(String),
    /// Collision with an already persisted session.
    #[error("{0}")]
    Conflict(Conflict),
    /// Another request took one of the sessions between checking and committing.
    #[error("a conflicting session was committed concurrently")]
    ConcurrentConflict,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CalendarError> for ScheduleError {
    fn from(e: CalendarError) -> Self {
        ScheduleError::Validation(e.to_string())
    }
}

fn invalid(message: impl ToString) -> ScheduleError {
    ScheduleError::Validation(message.to_string())
}

fn missing(field: &str) -> ScheduleError {
    invalid(format!("Missing required field '{}'.", field))
}

/// Keeps the first occurrence of every id.
fn unique_ids(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut result = Vec::with_capacity(ids.len());
    for id in ids {
        if !result.contains(&id) {
            result.push(id);
        }
    }
    result
}

/// A request whose fields are all present and well formed and whose
/// references resolve.
#[derive(Debug)]
struct ValidatedClass {
    name: String,
    course_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    capacity: u32,
    schedule: Vec<RecurringPattern>,
    status: ClassStatus,
    teachers: Vec<Uuid>,
    students: Vec<Uuid>,
    slots: HashMap<Uuid, Slot>,
    rooms: HashMap<Uuid, Room>,
}

#[derive(Debug)]
struct ExpandedClass {
    class: ValidatedClass,
    candidates: Vec<SessionKey>,
}

#[derive(Debug)]
struct CheckedClass(ExpandedClass);

impl ValidatedClass {
    async fn validate(
        request: ClassCreateData,
        config: &Config,
        store: &dyn ScheduleStore,
    ) -> Result<ValidatedClass, ScheduleError> {
        let name = request
            .name
            .map(|it| it.trim().to_string())
            .filter(|it| !it.is_empty())
            .ok_or_else(|| missing("name"))?;
        let course_id = request.course_id.ok_or_else(|| missing("courseId"))?;
        let start_date = request.start_date.ok_or_else(|| missing("startDate"))?;
        let end_date = request.end_date.ok_or_else(|| missing("endDate"))?;
        let capacity = request.capacity.ok_or_else(|| missing("capacity"))?;
        let entries = request
            .schedule
            .filter(|it| !it.is_empty())
            .ok_or_else(|| missing("schedule"))?;

        let teachers = unique_ids(request.teachers);
        let students = unique_ids(request.students);
        if students.len() > capacity as usize {
            return Err(invalid(format!(
                "Class has {} students but its capacity is {}.",
                students.len(),
                capacity
            )));
        }

        let start_date = parse_calendar_date(&start_date, config.time_zone)
            .ok_or_else(|| invalid(format!("Invalid startDate '{}'.", start_date)))?;
        let end_date = parse_calendar_date(&end_date, config.time_zone)
            .ok_or_else(|| invalid(format!("Invalid endDate '{}'.", end_date)))?;
        calendar::check_range(start_date, end_date, config.max_schedule_days)?;

        let mut schedule = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let weekday = entry
                .weekday
                .ok_or_else(|| missing(&format!("schedule[{}].weekday", index)))?;
            let weekday = Weekday::from_str(weekday.trim()).map_err(|_| {
                invalid(format!(
                    "Unknown weekday '{}' in schedule[{}].",
                    weekday, index
                ))
            })?;
            schedule.push(RecurringPattern {
                weekday,
                slot_id: entry
                    .slot
                    .ok_or_else(|| missing(&format!("schedule[{}].slot", index)))?,
                room_id: entry
                    .room
                    .ok_or_else(|| missing(&format!("schedule[{}].room", index)))?,
            });
        }

        if store.course(course_id).await?.is_none() {
            return Err(invalid(format!("Unknown course {}.", course_id)));
        }

        let slot_ids = unique_ids(schedule.iter().map(|it| it.slot_id).collect());
        let slots: HashMap<Uuid, Slot> = store
            .slots(&slot_ids)
            .await?
            .into_iter()
            .map(|it| (it.id, it))
            .collect();
        if let Some(unknown) = slot_ids.iter().find(|it| !slots.contains_key(it)) {
            return Err(invalid(format!("Unknown slot {}.", unknown)));
        }

        let room_ids = unique_ids(schedule.iter().map(|it| it.room_id).collect());
        let rooms: HashMap<Uuid, Room> = store
            .rooms(&room_ids)
            .await?
            .into_iter()
            .map(|it| (it.id, it))
            .collect();
        if let Some(unknown) = room_ids.iter().find(|it| !rooms.contains_key(it)) {
            return Err(invalid(format!("Unknown room {}.", unknown)));
        }

        Ok(ValidatedClass {
            name,
            course_id,
            start_date,
            end_date,
            capacity,
            schedule,
            status: request.status.unwrap_or_default(),
            teachers,
            students,
            slots,
            rooms,
        })
    }

    fn expand(self) -> Result<ExpandedClass, ScheduleError> {
        let candidates = calendar::expand(self.start_date, self.end_date, &self.schedule)?;
        let candidates = calendar::dedup(candidates);

        Ok(ExpandedClass {
            class: self,
            candidates,
        })
    }
}

impl ExpandedClass {
    async fn check(
        self,
        store: &dyn ScheduleStore,
        concurrency: usize,
    ) -> Result<CheckedClass, ScheduleError> {
        let class = &self.class;
        let detector = ConflictDetector::new(store, &class.slots, &class.rooms, concurrency);

        match detector
            .check(&self.candidates, &class.teachers, &class.students)
            .await?
        {
            Some(conflict) => Err(ScheduleError::Conflict(conflict)),
            None => Ok(CheckedClass(self)),
        }
    }
}

impl CheckedClass {
    async fn commit(
        self,
        store: &dyn ScheduleStore,
        actor: &UserRoleToken,
    ) -> Result<Class, ScheduleError> {
        let ExpandedClass { class, candidates } = self.0;
        let now = Utc::now();

        let class = Class {
            id: Uuid::new_v4(),
            name: class.name,
            course_id: class.course_id,
            start_date: class.start_date,
            end_date: class.end_date,
            capacity: class.capacity,
            teachers: class.teachers,
            students: class.students,
            status: class.status,
            schedule: class.schedule,
            created_by: actor.user,
            created: now,
            updated: now,
        };
        let sessions: Vec<Session> = candidates
            .into_iter()
            .map(|key| Session::new(class.id, key))
            .collect();

        store.insert_class(&class).await?;

        match store.insert_sessions(&sessions).await {
            Ok(()) => Ok(class),
            Err(e) => {
                if !matches!(e, StoreError::Duplicate) {
                    tracing::error!("Unable to store sessions of class '{}': {}", class.name, e);
                }
                rollback(store, class.id).await?;
                match e {
                    StoreError::Duplicate => {
                        tracing::warn!(
                            "Class '{}' lost a session to a concurrent request; rolled back.",
                            class.name
                        );
                        Err(ScheduleError::ConcurrentConflict)
                    }
                    other => Err(other.into()),
                }
            }
        }
    }
}

/// Undoes a partially committed class. A class is never left without its
/// sessions.
async fn rollback(store: &dyn ScheduleStore, class: Uuid) -> Result<(), ScheduleError> {
    store.delete_class(class).await.map(|_| ()).map_err(|e| {
        tracing::error!("Unable to roll back class {}: {}", class, e);
        ScheduleError::Store(e)
    })
}

/// Creates a class and all of its sessions, or nothing at all.
///
/// Validation, expansion and the conflict check don't write. Only the final
/// commit does, and it is undone when the store rejects a session.
#[tracing::instrument(skip(store, config, actor, request), fields(actor = %actor.user))]
pub async fn create_class(
    store: &dyn ScheduleStore,
    config: &Config,
    actor: &UserRoleToken,
    request: ClassCreateData,
) -> Result<Class, ScheduleError> {
    let validated = ValidatedClass::validate(request, config, store).await?;
    let expanded = validated.expand()?;
    tracing::debug!(
        "Class '{}' expands into {} sessions.",
        expanded.class.name,
        expanded.candidates.len()
    );

    let checked = expanded
        .check(store, config.conflict_check_concurrency)
        .await?;
    let class = checked.commit(store, actor).await?;

    tracing::info!("Created class '{}' ({}).", class.name, class.id);
    Ok(class)
}

impl From<ScheduleError> for Problem {
    fn from(e: ScheduleError) -> Self {
        match e {
            ScheduleError::Validation(message) => {
                tracing::info!("Rejected class: {}", message);
                problems::bad_request(message)
            }
            ScheduleError::Conflict(conflict) => {
                tracing::info!("Rejected class: {}", conflict);
                Problem::new(Status::Conflict, "schedule_conflict", "Schedule conflict.")
                    .insert_str("message", &conflict)
                    .insert_str("conflict", conflict.kind())
                    .insert("details", &conflict)
                    .clone()
            }
            ScheduleError::ConcurrentConflict => Problem::new(
                Status::Conflict,
                "schedule_conflict",
                "Concurrent schedule change.",
            )
            .insert_str(
                "message",
                "Another class took one of these sessions while this one was being created. Please retry.",
            )
            .insert_str("conflict", "concurrent_write")
            .insert("retry", true)
            .clone(),
            ScheduleError::Store(e) => Problem::from(e),
        }
    }
}

impl From<StoreError> for Problem {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Database(e) => Problem::from(e),
            StoreError::Duplicate => {
                tracing::error!("Unexpected unique key violation outside of class creation.");
                problems::internal()
            }
        }
    }
}
