use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use lotto_lib::config::{self, Config};
use lotto_lib::connection::conn;
use lotto_lib::database::{add_ticket, init_schema, list_tickets, require_schema};
use lotto_lib::notify::Notifier;
use lotto_lib::utils::{format_numbers, parse_date, parse_numbers};
use lotto_lib::{
    CheckContext, CheckOptions, EmailCredentials, GameKind, LottoError, OpenDataSource,
    SmtpNotifier, run_check,
};

#[derive(Parser)]
#[command(name = "lotto")]
#[command(about = "Track lottery tickets and check them against official drawings")]
#[command(version)]
struct Cli {
    /// Path to the ticket database (overrides LOTTO_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the ticket and check-record tables
    Setup,

    /// Store a ticket; the last number is the bonus ball
    Add {
        /// mega_millions or powerball
        #[arg(short, long)]
        game: String,
        /// First drawing date the ticket is valid for
        #[arg(short, long)]
        start: String,
        /// Last drawing date the ticket is valid for
        #[arg(short, long)]
        end: String,
        /// Numbers, e.g. `6 11 13 28 47 25` or `6,11,13,28,47,25`
        #[arg(required = true, num_args = 1..)]
        numbers: Vec<String>,
    },

    /// List stored tickets
    List,

    /// Check tickets against drawings in a date window
    Check {
        #[arg(short, long)]
        start: String,
        #[arg(short, long)]
        end: String,
        /// Show drawings that were already checked on earlier runs
        #[arg(long)]
        show_all: bool,
        /// Email the report
        #[arg(long)]
        notify_email: bool,
        /// Report recipient, repeatable (defaults to the sender)
        #[arg(long)]
        to: Vec<String>,
        /// Sender address (overrides EMAIL_SEND_ADDRESS)
        #[arg(long)]
        from: Option<String>,
        /// Sender password (overrides EMAIL_SEND_PASSWORD)
        #[arg(long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let mut config = config::load()?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }

    if let Err(e) = execute(cli.command, &config).await {
        match &e {
            LottoError::SetupRequired(_) | LottoError::Config(_) => {
                eprintln!("Configuration error: {}", e);
            }
            LottoError::Validation { .. } => {
                eprintln!("Invalid input: {}", e);
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        tracing::error!("lotto failed: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn execute(command: Commands, config: &Config) -> lotto_lib::Result<()> {
    let location = config.database_path.display().to_string();

    match command {
        Commands::Setup => {
            let db = conn(&config.database_path)?;
            init_schema(&db)?;
            println!("Database ready at {}", location);
        }
        Commands::Add {
            game,
            start,
            end,
            numbers,
        } => {
            let game: GameKind = game.parse()?;
            let start = parse_date(&start)?;
            let end = parse_date(&end)?;
            let numbers = parse_numbers(&numbers)?;

            let db = conn(&config.database_path)?;
            require_schema(&db, &location)?;
            let id = add_ticket(&db, game, start, end, &numbers)?;
            println!("Added {} ticket #{}: {}", game.profile().name, id, format_numbers(&numbers));
        }
        Commands::List => {
            let db = conn(&config.database_path)?;
            require_schema(&db, &location)?;
            for ticket in list_tickets(&db)? {
                println!(
                    "#{:<4} {:<14} {} .. {}  {}",
                    ticket.id().unwrap_or_default(),
                    ticket.game().profile().name,
                    ticket.start_date(),
                    ticket.end_date(),
                    format_numbers(ticket.numbers())
                );
            }
        }
        Commands::Check {
            start,
            end,
            show_all,
            notify_email,
            to,
            from,
            password,
        } => {
            let start = parse_date(&start)?;
            let end = parse_date(&end)?;

            // Credentials are verified before the database or network is touched.
            let notifier = if notify_email {
                let credentials = EmailCredentials::verify(
                    from.or_else(|| config.email_address.clone()),
                    password.or_else(|| config.email_password.clone()),
                )?;
                Some(SmtpNotifier::new(credentials)?)
            } else {
                None
            };
            let destinations = match (&notifier, to.is_empty()) {
                (Some(notifier), true) => vec![notifier.sender().to_string()],
                _ => to,
            };

            let db = conn(&config.database_path)?;
            let source = OpenDataSource::new(config.http_timeout)?;
            let ctx = CheckContext {
                conn: &db,
                db_location: location,
                source: &source,
                notifier: notifier.as_ref().map(|n| n as &dyn Notifier),
            };
            let opts = CheckOptions {
                start,
                end,
                show_all,
                notify_email,
                destinations,
            };

            let report = run_check(&ctx, &opts).await?;
            if report.is_empty() {
                println!("No new results between {} and {}", start, end);
            } else {
                print!("{}", report.body());
            }
        }
    }

    Ok(())
}
