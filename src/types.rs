use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{LottoError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    MegaMillions,
    Powerball,
}

impl GameKind {
    pub const ALL: [GameKind; 2] = [GameKind::MegaMillions, GameKind::Powerball];

    /// Tag used on the command line and in the `tickets` table.
    pub fn tag(self) -> &'static str {
        match self {
            GameKind::MegaMillions => "mega_millions",
            GameKind::Powerball => "powerball",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for GameKind {
    type Err = LottoError;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_ascii_lowercase();
        GameKind::ALL
            .into_iter()
            .find(|game| game.tag() == tag)
            .ok_or_else(|| {
                LottoError::validation("game", s, "expected one of: mega_millions, powerball")
            })
    }
}

/// A tracked ticket. The last number is the bonus ball, every number before
/// it is a regular pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticket {
    id: Option<i64>,
    game: GameKind,
    start_date: NaiveDate,
    end_date: NaiveDate,
    numbers: Vec<u32>,
}

impl Ticket {
    pub fn new(
        id: Option<i64>,
        game: GameKind,
        start_date: NaiveDate,
        end_date: NaiveDate,
        numbers: Vec<u32>,
    ) -> Result<Self> {
        if numbers.is_empty() {
            return Err(LottoError::validation(
                "numbers",
                "",
                "a ticket needs at least one number",
            ));
        }
        if end_date < start_date {
            return Err(LottoError::validation(
                "end date",
                end_date.to_string(),
                format!("ends before its start date {}", start_date),
            ));
        }

        Ok(Self {
            id,
            game,
            start_date,
            end_date,
            numbers,
        })
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn game(&self) -> GameKind {
        self.game
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn numbers(&self) -> &[u32] {
        &self.numbers
    }

    /// Inclusive overlap with a query window: the ticket starts inside it,
    /// ends inside it, or spans all of it.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        (start <= self.start_date && self.start_date <= end)
            || (start <= self.end_date && self.end_date <= end)
            || (self.start_date <= start && self.end_date >= end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drawing {
    pub game: GameKind,
    pub date: NaiveDate,
    pub numbers: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckRecord {
    pub ticket_id: i64,
    pub draw_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinningsResult {
    pub draw_date: NaiveDate,
    pub game: GameKind,
    pub ticket_numbers: Vec<u32>,
    pub winning_numbers: Vec<u32>,
    pub matches: usize,
    pub bonus_match: bool,
    pub payout: u64,
    pub message: String,
}

/// One row of the New York open-data lottery datasets. Columns we don't use,
/// such as `multiplier`, are ignored.
///
/// Mega Millions rows carry the bonus ball in `mega_ball`:
/// `{"draw_date":"2022-11-22T00:00:00.000","winning_numbers":"13 23 24 25 43","mega_ball":"02"}`
///
/// Powerball rows end `winning_numbers` with it:
/// `{"draw_date":"2022-11-21T00:00:00.000","winning_numbers":"01 06 40 51 67 02"}`
#[derive(Deserialize, Debug)]
pub struct OpenDataRow {
    pub draw_date: String,
    pub winning_numbers: String,
    #[serde(default)]
    pub mega_ball: Option<String>,
}
