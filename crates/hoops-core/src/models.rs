use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::amount_field;

/// Seasons covered by every salary table, in column order.
pub const SEASONS: [u16; 5] = [2025, 2026, 2027, 2028, 2029];

/// Number of per-season amount columns on a record.
pub const SEASON_COUNT: usize = SEASONS.len();

/// Which salary table a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Player,
    Team,
}

impl RecordKind {
    pub const ALL: [RecordKind; 2] = [RecordKind::Player, RecordKind::Team];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Player => "player",
            RecordKind::Team => "team",
        }
    }

    /// Destination table in the relational store.
    pub fn table_name(&self) -> &'static str {
        match self {
            RecordKind::Player => "nba_player_salaries",
            RecordKind::Team => "nba_team_salaries",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "player" | "players" => Ok(RecordKind::Player),
            "team" | "teams" => Ok(RecordKind::Team),
            _ => Err(format!("Unknown record kind: {}", s)),
        }
    }
}

/// One normalized row of a salary table: a name plus one optional amount per season.
///
/// Amounts are already cleaned. A blank cell is `None`, never `Some("")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRecord {
    name: String,
    amounts: [Option<String>; SEASON_COUNT],
}

impl SalaryRecord {
    /// Build a record from raw cell text. Amounts go through [`amount_field`].
    pub fn from_cells<S: AsRef<str>>(name: &str, cells: &[S]) -> Self {
        let mut amounts: [Option<String>; SEASON_COUNT] = Default::default();
        for (slot, cell) in amounts.iter_mut().zip(cells) {
            *slot = amount_field(cell.as_ref());
        }
        Self {
            name: name.trim().to_string(),
            amounts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amounts(&self) -> &[Option<String>; SEASON_COUNT] {
        &self.amounts
    }

    /// Amount for a given season, if the season is tracked and the cell was filled.
    pub fn amount_for(&self, season: u16) -> Option<&str> {
        let idx = SEASONS.iter().position(|s| *s == season)?;
        self.amounts[idx].as_deref()
    }
}

/// All records produced by one extraction pass, in document order.
pub type Batch = Vec<SalaryRecord>;

/// A salary row as read back from the store.
#[derive(Debug, Clone, Serialize)]
pub struct StoredSalary {
    pub id: i32,
    pub name: String,
    pub amounts: [Option<String>; SEASON_COUNT],
    pub created_at: DateTime<Utc>,
}
