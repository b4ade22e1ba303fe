use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use regex::Regex;
use std::sync::LazyLock;
use tracing::info;

use crate::error::{LottoError, Result};

pub const SUBJECT_PREFIX: &str = "[lotto] : ";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]+([._+-][A-Za-z0-9]+)*@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("static email pattern")
});

/// Sender domains we know how to relay through, with their SMTP host.
const PROVIDERS: [(&str, &str); 1] = [("gmail.com", "smtp.gmail.com")];

pub fn is_valid_address(address: &str) -> bool {
    EMAIL_RE.is_match(address)
}

pub fn validate_destination(address: &str) -> Result<()> {
    if is_valid_address(address) {
        Ok(())
    } else {
        Err(LottoError::validation("email address", address, "not a valid address"))
    }
}

#[derive(Clone)]
pub struct EmailCredentials {
    address: String,
    password: String,
    smtp_host: &'static str,
}

impl std::fmt::Debug for EmailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailCredentials")
            .field("address", &self.address)
            .field("smtp_host", &self.smtp_host)
            .finish_non_exhaustive()
    }
}

impl EmailCredentials {
    /// Checks that both values are present, the address is well formed and
    /// its domain is a known provider.
    pub fn verify(address: Option<String>, password: Option<String>) -> Result<Self> {
        let (Some(address), Some(password)) = (address, password) else {
            return Err(LottoError::config(
                "email notification needs EMAIL_SEND_ADDRESS and EMAIL_SEND_PASSWORD",
            ));
        };
        if password.is_empty() {
            return Err(LottoError::config("EMAIL_SEND_PASSWORD is empty"));
        }
        if !is_valid_address(&address) {
            return Err(LottoError::config(format!("invalid sender address {:?}", address)));
        }

        let domain = address
            .rsplit('@')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let smtp_host = PROVIDERS
            .iter()
            .find(|(provider, _)| *provider == domain)
            .map(|(_, host)| *host)
            .ok_or_else(|| {
                LottoError::config(format!(
                    "sender {:?} is not on a supported provider (gmail.com)",
                    address
                ))
            })?;

        Ok(Self {
            address,
            password,
            smtp_host,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str, to: &str) -> Result<()>;
}

pub struct SmtpNotifier {
    credentials: EmailCredentials,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    pub fn new(credentials: EmailCredentials) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(credentials.smtp_host)
            .map_err(|e| LottoError::notify(e.to_string()))?
            .credentials(Credentials::new(
                credentials.address.clone(),
                credentials.password.clone(),
            ))
            .build();
        Ok(Self {
            credentials,
            transport,
        })
    }

    pub fn sender(&self) -> &str {
        self.credentials.address()
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, subject: &str, body: &str, to: &str) -> Result<()> {
        validate_destination(to)?;

        let sender = self.credentials.address();
        let from: Mailbox = sender
            .parse()
            .map_err(|e| LottoError::notify(format!("sender {}: {}", sender, e)))?;
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| LottoError::notify(format!("recipient {}: {}", to, e)))?;

        let message = Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(format!("{}{}", SUBJECT_PREFIX, subject))
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| LottoError::notify(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| LottoError::notify(format!("sending to {}: {}", to, e)))?;

        info!("Sent report to {}", to);
        Ok(())
    }
}
