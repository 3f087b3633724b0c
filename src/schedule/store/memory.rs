//! In-process [`ScheduleStore`] used by tests.
//!
//! Enforces the same unique session key as the MongoDB index and yields to
//! the runtime before every operation, so concurrent class creations
//! interleave the way they would against a real server.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use uuid::Uuid;

use super::{RosterRole, ScheduleStore, StoreError};
use crate::data::class::Class;
use crate::data::course::Course;
use crate::data::room::Room;
use crate::data::session::{Session, SessionKey};
use crate::data::slot::Slot;
use crate::middleware::paging::PageState;

#[derive(Default)]
struct Tables {
    courses: HashMap<Uuid, Course>,
    slots: HashMap<Uuid, Slot>,
    rooms: HashMap<Uuid, Room>,
    classes: Vec<Class>,
    sessions: Vec<Session>,
    interleaved: Option<Session>,
    fail_sessions: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store lock poisoned")
    }

    pub fn add_course(&self, course: Course) -> Course {
        self.tables().courses.insert(course.id, course.clone());
        course
    }

    pub fn add_slot(&self, slot: Slot) -> Slot {
        self.tables().slots.insert(slot.id, slot.clone());
        slot
    }

    pub fn add_room(&self, room: Room) -> Room {
        self.tables().rooms.insert(room.id, room.clone());
        room
    }

    /// Makes the next `insert_class` also store `session` first, as if a
    /// concurrent request committed it right after this one's conflict check.
    pub fn interleave_on_next_class(&self, session: Session) {
        self.tables().interleaved = Some(session);
    }

    /// Makes the next `insert_sessions` fail as if the server went away.
    pub fn fail_next_session_insert(&self) {
        self.tables().fail_sessions = true;
    }

    /// Every stored session, in insertion order.
    pub fn all_sessions(&self) -> Vec<Session> {
        self.tables().sessions.clone()
    }

    pub fn all_classes(&self) -> Vec<Class> {
        self.tables().classes.clone()
    }
}

fn sorted(mut sessions: Vec<Session>) -> Vec<Session> {
    sessions.sort_by_key(|it| (it.date, it.slot_id));
    sessions
}

#[rocket::async_trait]
impl ScheduleStore for MemoryStore {
    async fn course(&self, id: Uuid) -> Result<Option<Course>, StoreError> {
        tokio::task::yield_now().await;
        Ok(self.tables().courses.get(&id).cloned())
    }

    async fn slots(&self, ids: &[Uuid]) -> Result<Vec<Slot>, StoreError> {
        tokio::task::yield_now().await;
        let tables = self.tables();
        Ok(ids.iter().filter_map(|id| tables.slots.get(id).cloned()).collect())
    }

    async fn rooms(&self, ids: &[Uuid]) -> Result<Vec<Room>, StoreError> {
        tokio::task::yield_now().await;
        let tables = self.tables();
        Ok(ids.iter().filter_map(|id| tables.rooms.get(id).cloned()).collect())
    }

    async fn session_at(&self, key: &SessionKey) -> Result<Option<Session>, StoreError> {
        tokio::task::yield_now().await;
        Ok(self
            .tables()
            .sessions
            .iter()
            .find(|it| it.key() == *key)
            .cloned())
    }

    async fn sessions_in_slot(
        &self,
        slot: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Session>, StoreError> {
        tokio::task::yield_now().await;
        Ok(self
            .tables()
            .sessions
            .iter()
            .filter(|it| it.slot_id == slot && it.date == date)
            .cloned()
            .collect())
    }

    async fn rostered_classes(
        &self,
        classes: &[Uuid],
        users: &[Uuid],
        role: RosterRole,
    ) -> Result<Vec<Class>, StoreError> {
        tokio::task::yield_now().await;
        let mut found: Vec<Class> = self
            .tables()
            .classes
            .iter()
            .filter(|class| classes.contains(&class.id))
            .filter(|class| role.roster(class).iter().any(|it| users.contains(it)))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn insert_class(&self, class: &Class) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        let mut tables = self.tables();
        if let Some(rival) = tables.interleaved.take() {
            tables.sessions.push(rival);
        }
        tables.classes.push(class.clone());
        Ok(())
    }

    async fn insert_sessions(&self, sessions: &[Session]) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        let mut tables = self.tables();
        if std::mem::take(&mut tables.fail_sessions) {
            let lost = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
            return Err(StoreError::Database(mongodb::error::Error::from(lost)));
        }
        let mut taken: HashSet<SessionKey> = tables.sessions.iter().map(Session::key).collect();

        for session in sessions {
            if !taken.insert(session.key()) {
                return Err(StoreError::Duplicate);
            }
            tables.sessions.push(session.clone());
        }
        Ok(())
    }

    async fn delete_class(&self, id: Uuid) -> Result<Option<Class>, StoreError> {
        tokio::task::yield_now().await;
        let mut tables = self.tables();
        tables.sessions.retain(|it| it.class_id != id);

        let position = tables.classes.iter().position(|it| it.id == id);
        Ok(position.map(|it| tables.classes.remove(it)))
    }

    async fn class(&self, id: Uuid) -> Result<Option<Class>, StoreError> {
        tokio::task::yield_now().await;
        Ok(self.tables().classes.iter().find(|it| it.id == id).cloned())
    }

    async fn list_classes(&self, page: PageState) -> Result<Vec<Class>, StoreError> {
        tokio::task::yield_now().await;
        let mut classes = self.tables().classes.clone();
        classes.sort_by(|a, b| (a.start_date, &a.name).cmp(&(b.start_date, &b.name)));
        Ok(page.apply(classes))
    }

    async fn class_sessions(&self, id: Uuid) -> Result<Vec<Session>, StoreError> {
        tokio::task::yield_now().await;
        let sessions = self
            .tables()
            .sessions
            .iter()
            .filter(|it| it.class_id == id)
            .cloned()
            .collect();
        Ok(sorted(sessions))
    }

    async fn user_sessions(&self, user: Uuid) -> Result<Vec<Session>, StoreError> {
        tokio::task::yield_now().await;
        let tables = self.tables();
        let classes: HashSet<Uuid> = tables
            .classes
            .iter()
            .filter(|it| it.has_member(user))
            .map(|it| it.id)
            .collect();

        let sessions = tables
            .sessions
            .iter()
            .filter(|it| classes.contains(&it.class_id))
            .cloned()
            .collect();
        Ok(sorted(sessions))
    }
}
