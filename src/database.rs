use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::error::{LottoError, Result};
use crate::types::{CheckRecord, GameKind, Ticket};
use crate::utils::{format_numbers, parse_date, parse_numbers};

pub const TICKETS_TABLE: &str = "tickets";
pub const CHECK_RECORDS_TABLE: &str = "check_records";

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tickets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            game TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            numbers TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS check_records (
            ticket_id INTEGER NOT NULL,
            draw_date TEXT NOT NULL,
            checked_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (ticket_id, draw_date),
            FOREIGN KEY (ticket_id) REFERENCES tickets (id)
        )",
        [],
    )?;

    info!("Schema ready: {}, {}", TICKETS_TABLE, CHECK_RECORDS_TABLE);
    Ok(())
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn schema_exists(conn: &Connection) -> Result<bool> {
    Ok(table_exists(conn, TICKETS_TABLE)? && table_exists(conn, CHECK_RECORDS_TABLE)?)
}

/// Validates the ticket before touching the database and returns its new id.
pub fn add_ticket(
    conn: &Connection,
    game: GameKind,
    start_date: NaiveDate,
    end_date: NaiveDate,
    numbers: &[u32],
) -> Result<i64> {
    let ticket = Ticket::new(None, game, start_date, end_date, numbers.to_vec())?;
    insert_ticket(conn, &ticket)
}

pub fn insert_ticket(conn: &Connection, ticket: &Ticket) -> Result<i64> {
    let numbers_str = format_numbers(ticket.numbers());
    conn.execute(
        "INSERT INTO tickets (game, start_date, end_date, numbers) VALUES (?1, ?2, ?3, ?4)",
        params![
            ticket.game().tag(),
            ticket.start_date().to_string(),
            ticket.end_date().to_string(),
            numbers_str,
        ],
    )?;

    let id = conn.last_insert_rowid();
    info!("Added {} ticket {} [{}]", ticket.game(), id, numbers_str);
    Ok(id)
}

fn ticket_from_row(
    id: i64,
    game: String,
    start_date: String,
    end_date: String,
    numbers: String,
) -> Result<Ticket> {
    Ticket::new(
        Some(id),
        game.parse()?,
        parse_date(&start_date)?,
        parse_date(&end_date)?,
        parse_numbers(&[numbers])?,
    )
}

pub fn list_tickets(conn: &Connection) -> Result<Vec<Ticket>> {
    let mut stmt =
        conn.prepare("SELECT id, game, start_date, end_date, numbers FROM tickets ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut tickets = Vec::new();
    for row in rows {
        let (id, game, start_date, end_date, numbers) = row?;
        tickets.push(ticket_from_row(id, game, start_date, end_date, numbers)?);
    }
    Ok(tickets)
}

pub fn tickets_overlapping(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Ticket>> {
    let tickets: Vec<Ticket> = list_tickets(conn)?
        .into_iter()
        .filter(|ticket| ticket.overlaps(start, end))
        .collect();
    debug!("{} tickets overlap {}..={}", tickets.len(), start, end);
    Ok(tickets)
}

pub fn has_check_record(conn: &Connection, ticket_id: i64, draw_date: NaiveDate) -> Result<bool> {
    let mut stmt = conn
        .prepare("SELECT COUNT(*) FROM check_records WHERE ticket_id = ?1 AND draw_date = ?2")?;
    let count: i64 =
        stmt.query_row(params![ticket_id, draw_date.to_string()], |row| row.get(0))?;
    Ok(count > 0)
}

/// Records that `ticket_id` was checked against the drawing on `draw_date`.
/// Returns false when the record already existed.
pub fn add_check_record(conn: &Connection, ticket_id: i64, draw_date: NaiveDate) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO check_records (ticket_id, draw_date) VALUES (?1, ?2)",
        params![ticket_id, draw_date.to_string()],
    )?;
    Ok(inserted > 0)
}

/// Writes every record in one transaction. Nothing is kept if any insert
/// fails. Returns how many records were new.
pub fn save_check_records(conn: &Connection, records: &[CheckRecord]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut created = 0;
    for record in records {
        if add_check_record(&tx, record.ticket_id, record.draw_date)? {
            created += 1;
        }
    }
    tx.commit()?;

    debug!("Saved {} of {} check records", created, records.len());
    Ok(created)
}

pub fn list_check_records(conn: &Connection) -> Result<Vec<CheckRecord>> {
    let mut stmt = conn.prepare(
        "SELECT ticket_id, draw_date FROM check_records ORDER BY ticket_id, draw_date",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (ticket_id, draw_date) = row?;
        records.push(CheckRecord {
            ticket_id,
            draw_date: parse_date(&draw_date)?,
        });
    }
    Ok(records)
}

pub fn require_schema(conn: &Connection, location: &str) -> Result<()> {
    if schema_exists(conn)? {
        Ok(())
    } else {
        Err(LottoError::SetupRequired(location.to_string()))
    }
}
