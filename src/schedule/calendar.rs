use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::data::class::RecurringPattern;
use crate::data::session::SessionKey;

/// Day of the week, numbered from Sunday (1) to Saturday (7).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub fn number(self) -> u32 {
        match self {
            Weekday::Sunday => 1,
            Weekday::Monday => 2,
            Weekday::Tuesday => 3,
            Weekday::Wednesday => 4,
            Weekday::Thursday => 5,
            Weekday::Friday => 6,
            Weekday::Saturday => 7,
        }
    }

    /// Number of the weekday `date` falls on.
    pub fn number_of(date: NaiveDate) -> u32 {
        date.weekday().number_from_sunday()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("End date {end} is before start date {start}.")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
    #[error("Date range spans {days} days; at most {max} are allowed.")]
    RangeTooLong { days: i64, max: u32 },
    #[error("Schedule doesn't produce any session between {start} and {end}.")]
    NoSessions { start: NaiveDate, end: NaiveDate },
}

/// Materializes weekly patterns into candidate sessions for every day in
/// `start..=end`.
///
/// Candidates come out by ascending date, then in pattern order. Redundant
/// patterns produce repeated keys; see [`dedup`].
pub fn expand(
    start: NaiveDate,
    end: NaiveDate,
    patterns: &[RecurringPattern],
) -> Result<Vec<SessionKey>, CalendarError> {
    if end < start {
        return Err(CalendarError::InvertedRange { start, end });
    }

    let candidates: Vec<SessionKey> = start
        .iter_days()
        .take_while(|day| *day <= end)
        .flat_map(|day| {
            let weekday = Weekday::number_of(day);
            patterns
                .iter()
                .filter(move |pattern| pattern.weekday.number() == weekday)
                .map(move |pattern| SessionKey {
                    slot_id: pattern.slot_id,
                    room_id: pattern.room_id,
                    date: day,
                })
        })
        .collect();

    if candidates.is_empty() {
        return Err(CalendarError::NoSessions { start, end });
    }

    Ok(candidates)
}

/// Drops repeated keys, keeping the first occurrence of each.
pub fn dedup(candidates: Vec<SessionKey>) -> Vec<SessionKey> {
    let mut seen = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|key| seen.insert(*key))
        .collect()
}

/// Checks the inclusive range length against `max_days`.
pub fn check_range(start: NaiveDate, end: NaiveDate, max_days: u32) -> Result<(), CalendarError> {
    if end < start {
        return Err(CalendarError::InvertedRange { start, end });
    }
    let days = (end - start).num_days() + 1;
    if days > max_days as i64 {
        return Err(CalendarError::RangeTooLong {
            days,
            max: max_days,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pattern(weekday: Weekday, slot_id: Uuid, room_id: Uuid) -> RecurringPattern {
        RecurringPattern {
            weekday,
            slot_id,
            room_id,
        }
    }

    #[test]
    fn weekday_numbers_start_on_sunday() {
        let numbers: Vec<u32> = Weekday::iter().map(Weekday::number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6, 7]);

        // 2024-09-01 was a Sunday.
        for (offset, weekday) in Weekday::iter().enumerate() {
            let day = date(2024, 9, 1 + offset as u32);
            assert_eq!(Weekday::number_of(day), weekday.number(), "{}", day);
        }
    }

    #[test]
    fn weekday_names_parse_case_insensitively() {
        assert_eq!(Weekday::from_str("Monday"), Ok(Weekday::Monday));
        assert_eq!(Weekday::from_str("saturday"), Ok(Weekday::Saturday));
        assert!(Weekday::from_str("Mon").is_err());
        assert_eq!(Weekday::Thursday.to_string(), "Thursday");
    }

    #[test]
    fn three_mondays_yield_three_sessions() {
        let (slot, room) = (Uuid::new_v4(), Uuid::new_v4());
        let candidates = expand(
            date(2024, 9, 2),
            date(2024, 9, 20),
            &[pattern(Weekday::Monday, slot, room)],
        )
        .expect("range contains Mondays");

        let dates: Vec<NaiveDate> = candidates.iter().map(|it| it.date).collect();
        assert_eq!(
            dates,
            vec![date(2024, 9, 2), date(2024, 9, 9), date(2024, 9, 16)]
        );
        assert!(candidates
            .iter()
            .all(|it| it.slot_id == slot && it.room_id == room));
    }

    #[test]
    fn order_is_day_then_pattern() {
        let (first, second, room) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let candidates = expand(
            date(2024, 9, 2),
            date(2024, 9, 4),
            &[
                pattern(Weekday::Wednesday, first, room),
                pattern(Weekday::Monday, second, room),
                pattern(Weekday::Monday, first, room),
            ],
        )
        .unwrap();

        let got: Vec<(NaiveDate, Uuid)> = candidates.iter().map(|it| (it.date, it.slot_id)).collect();
        assert_eq!(
            got,
            vec![
                (date(2024, 9, 2), second),
                (date(2024, 9, 2), first),
                (date(2024, 9, 4), first),
            ]
        );
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let (slot, room) = (Uuid::new_v4(), Uuid::new_v4());
        let candidates = expand(
            date(2024, 9, 2),
            date(2024, 9, 2),
            &[pattern(Weekday::Monday, slot, room)],
        )
        .unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn missing_weekday_is_an_error() {
        let result = expand(
            date(2024, 9, 2),
            date(2024, 9, 6),
            &[pattern(Weekday::Saturday, Uuid::new_v4(), Uuid::new_v4())],
        );
        assert!(matches!(result, Err(CalendarError::NoSessions { .. })));
    }

    #[test]
    fn inverted_range_is_an_error() {
        let result = expand(
            date(2024, 9, 9),
            date(2024, 9, 2),
            &[pattern(Weekday::Monday, Uuid::new_v4(), Uuid::new_v4())],
        );
        assert!(matches!(result, Err(CalendarError::InvertedRange { .. })));
    }

    #[test]
    fn dedup_collapses_redundant_patterns() {
        let (slot, room) = (Uuid::new_v4(), Uuid::new_v4());
        let monday = pattern(Weekday::Monday, slot, room);
        let candidates = expand(date(2024, 9, 2), date(2024, 9, 9), &[monday, monday]).unwrap();
        assert_eq!(candidates.len(), 4);

        let unique = dedup(candidates);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].date, date(2024, 9, 2));
        assert_eq!(unique[1].date, date(2024, 9, 9));
    }

    #[test]
    fn range_length_is_limited() {
        assert!(check_range(date(2024, 1, 1), date(2024, 12, 31), 366).is_ok());
        assert!(matches!(
            check_range(date(2024, 1, 1), date(2025, 1, 1), 366),
            Err(CalendarError::RangeTooLong { days: 367, max: 366 })
        ));
    }
}
