pub mod api;
pub mod config;
pub mod connection;
pub mod database;
pub mod error;
pub mod evaluator;
pub mod notify;
pub mod prizes;
pub mod reconcile;
pub mod types;
pub mod utils;

pub use api::{DrawingSource, Drawings, OpenDataSource};
pub use error::{LottoError, Result};
pub use evaluator::{evaluate, evaluate_ticket};
pub use notify::{EmailCredentials, Notifier, SmtpNotifier};
pub use reconcile::{CheckContext, CheckOptions, CheckReport, run_check};
pub use types::*;
