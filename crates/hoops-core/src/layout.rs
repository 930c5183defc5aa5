use serde::{Deserialize, Serialize};

use crate::models::{RecordKind, SEASON_COUNT};

/// Where the fields of a salary table live in the source document.
///
/// All selectors are CSS. `name` and `amounts` are evaluated relative to a
/// row matched by `row`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLayout {
    pub row: String,
    pub name: String,
    /// One sub-selector per season, in [`SEASONS`](crate::models::SEASONS) order.
    pub amounts: [String; SEASON_COUNT],
}

/// A page to scrape and how to read its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalarySource {
    pub kind: RecordKind,
    pub url: String,
    pub layout: TableLayout,
}

impl SalarySource {
    /// Preset for the given kind.
    pub fn for_kind(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Player => Self::players(),
            RecordKind::Team => Self::teams(),
        }
    }

    /// HoopsHype player salary rankings.
    pub fn players() -> Self {
        Self {
            kind: RecordKind::Player,
            url: "https://hoopshype.com/salaries/players/".to_string(),
            layout: TableLayout {
                row: "table.hh-salaries-ranking-table.hh-salaries-table-sortable.responsive tbody tr"
                    .to_string(),
                name: "td.name".to_string(),
                amounts: std::array::from_fn(|i| format!("td:nth-of-type({})", i + 4)),
            },
        }
    }

    /// Basketball-Reference team payroll summary.
    pub fn teams() -> Self {
        Self {
            kind: RecordKind::Team,
            url: "https://www.basketball-reference.com/contracts/".to_string(),
            layout: TableLayout {
                row: "table#team_summary tbody tr".to_string(),
                name: "td[data-stat='team_name']".to_string(),
                amounts: std::array::from_fn(|i| format!("td[data-stat='y{}']", i + 1)),
            },
        }
    }
}
