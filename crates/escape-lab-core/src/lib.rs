//! Attempt records and leaderboard ranking for the escape room.
//!
//! This crate is storage-agnostic: it defines what an attempt looks like, how
//! a new attempt is validated, and how a full record set is projected into a
//! ranked leaderboard.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Status label that admits an attempt onto the public leaderboard.
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_FAILED: &str = "failed";

/// Column labels of the persisted table, in write and read order.
pub const TABLE_HEADER: [&str; 9] = [
    "ID",
    "Name",
    "Time Spent (sec)",
    "Time Remaining (sec)",
    "Money Lost",
    "Hints Used",
    "Grade",
    "Status",
    "Completed At",
];

/// Grade labels in leaderboard order, best first.
const GRADE_ORDER: [&str; 6] = ["A+", "A", "B", "C", "D", "F"];
const UNKNOWN_GRADE_RANK: usize = 99;

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum AttemptError {
    #[error("validation error: {0}")]
    Validation(String),
}

/// One persisted play-through outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub id: i64,
    pub name: String,
    #[serde(rename = "timeSpent")]
    pub time_spent_sec: u64,
    #[serde(rename = "timeRemaining")]
    pub time_remaining_sec: u64,
    pub money_lost: f64,
    pub hints_used: u64,
    pub grade: String,
    pub status: String,
    pub completed_at: String,
}

impl AttemptRecord {
    /// Attaches a store-assigned identifier to a validated attempt.
    #[must_use]
    pub fn from_new(id: i64, attempt: NewAttempt) -> Self {
        Self {
            id,
            name: attempt.name,
            time_spent_sec: attempt.time_spent_sec,
            time_remaining_sec: attempt.time_remaining_sec,
            money_lost: attempt.money_lost,
            hints_used: attempt.hints_used,
            grade: attempt.grade,
            status: attempt.status,
            completed_at: attempt.completed_at,
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }
}

/// Every attempt field except the identifier, which only the store assigns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAttempt {
    pub name: String,
    pub time_spent_sec: u64,
    pub time_remaining_sec: u64,
    pub money_lost: f64,
    pub hints_used: u64,
    pub grade: String,
    pub status: String,
    pub completed_at: String,
}

impl NewAttempt {
    /// Validates an attempt before it is appended.
    ///
    /// # Errors
    /// Returns [`AttemptError::Validation`] when the name is blank or the
    /// penalty is negative or not a finite number.
    pub fn validate(&self) -> Result<(), AttemptError> {
        if self.name.trim().is_empty() {
            return Err(AttemptError::Validation("name MUST be provided".to_string()));
        }

        if !self.money_lost.is_finite() {
            return Err(AttemptError::Validation(
                "money_lost MUST be a finite number".to_string(),
            ));
        }

        if self.money_lost < 0.0 {
            return Err(AttemptError::Validation("money_lost MUST be >= 0".to_string()));
        }

        Ok(())
    }
}

/// Ordering key applied to completed attempts.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum LeaderboardSort {
    #[default]
    TimeSpent,
    MoneyLost,
    Grade,
}

impl LeaderboardSort {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TimeSpent => "timeSpent",
            Self::MoneyLost => "moneyLost",
            Self::Grade => "grade",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "timeSpent" => Some(Self::TimeSpent),
            "moneyLost" => Some(Self::MoneyLost),
            "grade" => Some(Self::Grade),
            _ => None,
        }
    }
}

impl Display for LeaderboardSort {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a grade label in leaderboard order; unknown labels rank last.
#[must_use]
pub fn grade_rank(grade: &str) -> usize {
    GRADE_ORDER
        .iter()
        .position(|known| *known == grade)
        .unwrap_or(UNKNOWN_GRADE_RANK)
}

/// Keeps only completed attempts and orders them by `sort`, ascending.
///
/// Sorting is stable, so attempts with equal keys keep their read order.
#[must_use]
pub fn rank_leaderboard(records: Vec<AttemptRecord>, sort: LeaderboardSort) -> Vec<AttemptRecord> {
    let mut completed: Vec<AttemptRecord> =
        records.into_iter().filter(AttemptRecord::is_completed).collect();

    match sort {
        LeaderboardSort::TimeSpent => completed.sort_by_key(|record| record.time_spent_sec),
        LeaderboardSort::MoneyLost => {
            completed.sort_by(|lhs, rhs| lhs.money_lost.total_cmp(&rhs.money_lost));
        }
        LeaderboardSort::Grade => completed.sort_by_key(|record| grade_rank(&record.grade)),
    }

    completed
}

/// Milliseconds since the Unix epoch, in UTC.
#[must_use]
pub fn now_epoch_millis() -> i64 {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    i64::try_from(millis).unwrap_or(i64::MAX)
}
