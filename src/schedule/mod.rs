//! Class scheduling: materializing weekly patterns into dated sessions and
//! making sure no room, teacher or student ends up double booked.

pub mod calendar;
pub mod conflict;
pub mod store;
pub mod transaction;

pub use store::{ScheduleStore, Store, StoreError};
pub use transaction::{create_class, ScheduleError};
