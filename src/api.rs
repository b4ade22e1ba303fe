use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{LottoError, Result};
use crate::types::{GameKind, OpenDataRow};
use crate::utils::{parse_draw_date, parse_numbers};

/// Winning numbers keyed by draw date, bonus ball last.
pub type Drawings = BTreeMap<NaiveDate, Vec<u32>>;

#[async_trait]
pub trait DrawingSource: Send + Sync {
    async fn fetch_drawings(
        &self,
        game: GameKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Drawings>;
}

/// Reads drawings from the New York State open-data portal.
pub struct OpenDataSource {
    client: reqwest::Client,
}

impl OpenDataSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DrawingSource for OpenDataSource {
    async fn fetch_drawings(
        &self,
        game: GameKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Drawings> {
        let profile = game.profile();
        let where_clause = format!(
            "draw_date between '{}T00:00:00' and '{}T00:00:00'",
            start, end
        );
        info!("Fetching {} drawings {}..={}", profile.name, start, end);

        let response = self
            .client
            .get(profile.dataset_url)
            .query(&[
                ("$where", where_clause.as_str()),
                ("$order", "draw_date ASC"),
                ("$limit", "5000"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let rows: Vec<OpenDataRow> = response.json().await?;
        let drawings = parse_rows(game, &rows, start, end)?;
        debug!("{} {} drawings in window", drawings.len(), profile.name);
        Ok(drawings)
    }
}

/// Normalizes raw rows so the bonus ball is always the last number, and
/// keeps only drawings inside the inclusive window.
pub fn parse_rows(
    game: GameKind,
    rows: &[OpenDataRow],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Drawings> {
    let mut drawings = Drawings::new();
    for row in rows {
        let date = parse_draw_date(&row.draw_date)?;
        if date < start || date > end {
            continue;
        }
        drawings.insert(date, parse_row_numbers(game, row)?);
    }
    Ok(drawings)
}

fn parse_row_numbers(game: GameKind, row: &OpenDataRow) -> Result<Vec<u32>> {
    let malformed = |e: LottoError| {
        LottoError::fetch(format!(
            "malformed {} row for {}: {}",
            game.profile().name,
            row.draw_date,
            e
        ))
    };

    let mut numbers = parse_numbers(&[&row.winning_numbers]).map_err(malformed)?;
    match game {
        // The Mega Ball is published in its own field.
        GameKind::MegaMillions => {
            let mega_ball = row.mega_ball.as_deref().ok_or_else(|| {
                LottoError::fetch(format!(
                    "Mega Millions row for {} has no mega_ball",
                    row.draw_date
                ))
            })?;
            numbers.extend(parse_numbers(&[mega_ball]).map_err(malformed)?);
        }
        // The Powerball is already the last entry of winning_numbers.
        GameKind::Powerball => {}
    }

    if numbers.len() < 2 {
        return Err(LottoError::fetch(format!(
            "{} row for {} has too few numbers: {:?}",
            game.profile().name,
            row.draw_date,
            row.winning_numbers
        )));
    }
    Ok(numbers)
}
