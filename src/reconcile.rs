use chrono::NaiveDate;
use rusqlite::Connection;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::api::{DrawingSource, Drawings};
use crate::database::{has_check_record, require_schema, save_check_records, tickets_overlapping};
use crate::error::{LottoError, Result};
use crate::evaluator::evaluate_ticket;
use crate::notify::{Notifier, validate_destination};
use crate::types::{CheckRecord, Drawing, GameKind, WinningsResult};

/// Everything one `check` run talks to. Built once per invocation.
pub struct CheckContext<'a> {
    pub conn: &'a Connection,
    /// Shown in the setup hint when the schema is missing.
    pub db_location: String,
    pub source: &'a dyn DrawingSource,
    pub notifier: Option<&'a dyn Notifier>,
}

#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Re-display drawings that were already checked on an earlier run.
    pub show_all: bool,
    pub notify_email: bool,
    pub destinations: Vec<String>,
}

#[derive(Debug, Default)]
pub struct CheckReport {
    pub results: Vec<WinningsResult>,
    pub records_created: usize,
    pub notifications_sent: usize,
}

impl CheckReport {
    pub fn body(&self) -> String {
        self.results.iter().map(|r| r.message.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

pub fn report_subject(start: NaiveDate, end: NaiveDate) -> String {
    format!("lottery results {} to {}", start, end)
}

pub async fn run_check(ctx: &CheckContext<'_>, opts: &CheckOptions) -> Result<CheckReport> {
    if opts.end < opts.start {
        return Err(LottoError::validation(
            "end date",
            opts.end.to_string(),
            format!("before start date {}", opts.start),
        ));
    }

    // Email problems must surface before any querying happens.
    let notifier = if opts.notify_email {
        let notifier = ctx.notifier.ok_or_else(|| {
            LottoError::config("email notification requested without credentials")
        })?;
        if opts.destinations.is_empty() {
            return Err(LottoError::config(
                "email notification requested without a destination",
            ));
        }
        for destination in &opts.destinations {
            validate_destination(destination)?;
        }
        Some(notifier)
    } else {
        None
    };

    require_schema(ctx.conn, &ctx.db_location)?;

    let tickets = tickets_overlapping(ctx.conn, opts.start, opts.end)?;
    info!(
        "Checking {} tickets against drawings {}..={}",
        tickets.len(),
        opts.start,
        opts.end
    );

    let mut drawings_by_game: HashMap<GameKind, Drawings> = HashMap::new();
    let mut report = CheckReport::default();
    // Saved only after every fetch and send has succeeded.
    let mut pending: Vec<CheckRecord> = Vec::new();

    for ticket in &tickets {
        let Some(ticket_id) = ticket.id() else {
            continue;
        };

        if !drawings_by_game.contains_key(&ticket.game()) {
            let fetched = ctx
                .source
                .fetch_drawings(ticket.game(), opts.start, opts.end)
                .await?;
            drawings_by_game.insert(ticket.game(), fetched);
        }
        let drawings = &drawings_by_game[&ticket.game()];

        for (date, numbers) in drawings {
            let already_checked = has_check_record(ctx.conn, ticket_id, *date)?;
            if already_checked && !opts.show_all {
                debug!("Ticket {} already checked for {}", ticket_id, date);
                continue;
            }

            let drawing = Drawing {
                game: ticket.game(),
                date: *date,
                numbers: numbers.clone(),
            };
            let result = evaluate_ticket(ticket, &drawing)?;

            if !already_checked {
                pending.push(CheckRecord {
                    ticket_id,
                    draw_date: *date,
                });
            }
            report.results.push(result);
        }
    }

    let body = report.body();
    if let Some(notifier) = notifier {
        if !report.is_empty() {
            let subject = report_subject(opts.start, opts.end);
            for destination in &opts.destinations {
                notifier.send(&subject, &body, destination).await?;
                report.notifications_sent += 1;
            }
        }
    }

    report.records_created = save_check_records(ctx.conn, &pending)?;

    if body.is_empty() {
        info!("No new results for {}..={}", opts.start, opts.end);
    } else {
        info!("Results:\n{}", body);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{add_ticket, init_schema, list_check_records};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[derive(Default)]
    struct FakeSource {
        drawings: HashMap<GameKind, Drawings>,
        calls: AtomicUsize,
        fail: bool,
        fail_game: Option<GameKind>,
    }

    #[async_trait]
    impl DrawingSource for FakeSource {
        async fn fetch_drawings(
            &self,
            game: GameKind,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Drawings> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail || self.fail_game == Some(game) {
                return Err(LottoError::fetch("connection refused"));
            }
            Ok(self
                .drawings
                .get(&game)
                .map(|all| {
                    all.range(start..=end)
                        .map(|(d, n)| (*d, n.clone()))
                        .collect()
                })
                .unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, subject: &str, body: &str, to: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((subject.to_string(), body.to_string(), to.to_string()));
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _subject: &str, _body: &str, to: &str) -> Result<()> {
            Err(LottoError::notify(format!("sending to {}: 535 bad credentials", to)))
        }
    }

    fn powerball_source() -> FakeSource {
        let mut drawings = Drawings::new();
        drawings.insert(date("2022-11-21"), vec![6, 11, 13, 9, 9, 25]);
        drawings.insert(date("2022-11-23"), vec![1, 2, 3, 4, 5, 6]);
        let mut by_game = HashMap::new();
        by_game.insert(GameKind::Powerball, drawings);
        FakeSource {
            drawings: by_game,
            ..Default::default()
        }
    }

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        add_ticket(
            &conn,
            GameKind::Powerball,
            date("2022-11-01"),
            date("2022-11-30"),
            &[6, 11, 13, 28, 47, 25],
        )
        .unwrap();
        conn
    }

    fn options(show_all: bool) -> CheckOptions {
        CheckOptions {
            start: date("2022-11-15"),
            end: date("2022-12-15"),
            show_all,
            notify_email: false,
            destinations: Vec::new(),
        }
    }

    fn context<'a>(
        conn: &'a Connection,
        source: &'a FakeSource,
        notifier: Option<&'a dyn Notifier>,
    ) -> CheckContext<'a> {
        CheckContext {
            conn,
            db_location: ":memory:".to_string(),
            source,
            notifier,
        }
    }

    #[tokio::test]
    async fn test_check_evaluates_each_drawing() {
        let conn = setup();
        let source = powerball_source();

        let report = run_check(&context(&conn, &source, None), &options(false))
            .await
            .unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.records_created, 2);
        let first = &report.results[0];
        assert_eq!(first.draw_date, date("2022-11-21"));
        assert_eq!(first.matches, 3);
        assert!(first.bonus_match);
        assert_eq!(first.payout, 100);
    }

    #[tokio::test]
    async fn test_second_run_is_deduplicated() {
        let conn = setup();
        let source = powerball_source();
        let ctx = context(&conn, &source, None);

        run_check(&ctx, &options(false)).await.unwrap();
        let again = run_check(&ctx, &options(false)).await.unwrap();
        assert!(again.is_empty());
        assert_eq!(again.body(), "");

        let shown = run_check(&ctx, &options(true)).await.unwrap();
        assert_eq!(shown.results.len(), 2);
        assert_eq!(shown.records_created, 0);
        assert_eq!(list_check_records(&conn).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_schema_requires_setup() {
        let conn = Connection::open_in_memory().unwrap();
        let source = powerball_source();

        let err = run_check(&context(&conn, &source, None), &options(false))
            .await
            .unwrap_err();
        assert!(matches!(err, LottoError::SetupRequired(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_notify_without_credentials_fails_before_fetch() {
        let conn = setup();
        let source = powerball_source();
        let mut opts = options(false);
        opts.notify_email = true;
        opts.destinations = vec!["player@gmail.com".to_string()];

        let err = run_check(&context(&conn, &source, None), &opts)
            .await
            .unwrap_err();
        assert!(matches!(err, LottoError::Config(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(list_check_records(&conn).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_one_email_per_destination_with_full_report() {
        let conn = setup();
        add_ticket(
            &conn,
            GameKind::Powerball,
            date("2022-01-01"),
            date("2022-12-31"),
            &[1, 2, 3, 4, 5, 6],
        )
        .unwrap();
        let source = powerball_source();
        let notifier = RecordingNotifier::default();
        let mut opts = options(false);
        opts.notify_email = true;
        opts.destinations = vec!["a@gmail.com".to_string(), "b@example.org".to_string()];

        let report = run_check(&context(&conn, &source, Some(&notifier)), &opts)
            .await
            .unwrap();

        assert_eq!(report.results.len(), 4);
        assert_eq!(report.notifications_sent, 2);
        // Both tickets share a game, so the drawings are fetched once.
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].2, "a@gmail.com");
        assert_eq!(sent[1].2, "b@example.org");
        assert_eq!(sent[0].1, report.body());
        assert_eq!(sent[0].0, report_subject(date("2022-11-15"), date("2022-12-15")));
    }

    #[tokio::test]
    async fn test_nothing_sent_when_report_is_empty() {
        let conn = setup();
        let source = FakeSource::default();
        let notifier = RecordingNotifier::default();
        let mut opts = options(false);
        opts.notify_email = true;
        opts.destinations = vec!["a@gmail.com".to_string()];

        let report = run_check(&context(&conn, &source, Some(&notifier)), &opts)
            .await
            .unwrap();
        assert!(report.is_empty());
        assert_eq!(report.notifications_sent, 0);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_run() {
        let conn = setup();
        let source = FakeSource {
            fail: true,
            ..Default::default()
        };

        let err = run_check(&context(&conn, &source, None), &options(false))
            .await
            .unwrap_err();
        assert!(matches!(err, LottoError::Fetch(_)));
        assert_eq!(list_check_records(&conn).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_later_fetch_failure_saves_no_records() {
        let conn = setup();
        add_ticket(
            &conn,
            GameKind::MegaMillions,
            date("2022-11-01"),
            date("2022-11-30"),
            &[13, 23, 24, 25, 43, 2],
        )
        .unwrap();
        let mut source = powerball_source();
        let mut mega = Drawings::new();
        mega.insert(date("2022-11-22"), vec![13, 23, 24, 25, 43, 2]);
        source.drawings.insert(GameKind::MegaMillions, mega);
        source.fail_game = Some(GameKind::MegaMillions);

        let err = run_check(&context(&conn, &source, None), &options(false))
            .await
            .unwrap_err();
        assert!(matches!(err, LottoError::Fetch(_)));
        // Powerball was fetched and evaluated before Mega Millions failed.
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(list_check_records(&conn).unwrap().len(), 0);

        source.fail_game = None;
        let retry = run_check(&context(&conn, &source, None), &options(false))
            .await
            .unwrap();
        assert_eq!(retry.results.len(), 3);
        assert_eq!(retry.records_created, 3);
        assert!(retry.results.iter().any(|r| r.game == GameKind::MegaMillions));
    }

    #[tokio::test]
    async fn test_send_failure_keeps_results_for_next_run() {
        let conn = setup();
        let mut source = powerball_source();
        if let Some(powerball) = source.drawings.get_mut(&GameKind::Powerball) {
            powerball.insert(date("2022-11-26"), vec![6, 11, 13, 28, 47, 25]);
        }
        let mut opts = options(false);
        opts.notify_email = true;
        opts.destinations = vec!["a@gmail.com".to_string()];

        let err = run_check(&context(&conn, &source, Some(&FailingNotifier)), &opts)
            .await
            .unwrap_err();
        assert!(matches!(err, LottoError::Notify(_)));
        assert_eq!(list_check_records(&conn).unwrap().len(), 0);

        let retry = run_check(&context(&conn, &source, None), &options(false))
            .await
            .unwrap();
        assert_eq!(retry.results.len(), 3);
        let jackpot = retry
            .results
            .iter()
            .find(|r| r.draw_date == date("2022-11-26"))
            .unwrap();
        assert_eq!(jackpot.matches, 5);
        assert!(jackpot.bonus_match);
        assert_eq!(jackpot.payout, 1_000_000);
        assert_eq!(list_check_records(&conn).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_tickets_outside_window_are_ignored() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        add_ticket(
            &conn,
            GameKind::Powerball,
            date("2021-01-01"),
            date("2021-01-31"),
            &[6, 11, 13, 28, 47, 25],
        )
        .unwrap();
        let source = powerball_source();

        let report = run_check(&context(&conn, &source, None), &options(false))
            .await
            .unwrap();
        assert!(report.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}
