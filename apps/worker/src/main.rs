//! Planner notification worker: drains the invitation outbox and sends emails.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use planner_application::{EmailService, InvitationMailer};
use planner_core::{AppError, AppResult};
use planner_infrastructure::{
    ConsoleEmailService, PostgresInvitationOutbox, SmtpEmailConfig, SmtpEmailService,
};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
enum EmailProvider {
    Console,
    Smtp(SmtpEmailConfig),
}

impl EmailProvider {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Smtp(_) => "smtp",
        }
    }
}

#[derive(Clone)]
struct WorkerConfig {
    database_url: String,
    frontend_url: String,
    email_provider: EmailProvider,
    batch_size: usize,
    poll_interval_ms: u64,
    max_attempts: i32,
    lease_seconds: u32,
}

#[derive(Debug, Default, Clone, Copy)]
struct DrainReport {
    claimed: usize,
    delivered: usize,
    failed: usize,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let config = WorkerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let email_service = build_email_service(&config.email_provider)?;
    let mailer = InvitationMailer::new(email_service, config.frontend_url.clone());
    let outbox = PostgresInvitationOutbox::new(pool, config.lease_seconds);

    info!(
        email_provider = config.email_provider.as_str(),
        frontend_url = %config.frontend_url,
        batch_size = config.batch_size,
        poll_interval_ms = config.poll_interval_ms,
        max_attempts = config.max_attempts,
        "planner-worker started"
    );

    loop {
        match drain_once(&outbox, &mailer, &config).await {
            Ok(report) if report.claimed == 0 => {
                tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)).await;
            }
            Ok(report) => {
                info!(
                    claimed = report.claimed,
                    delivered = report.delivered,
                    failed = report.failed,
                    "invitation outbox batch processed"
                );
            }
            Err(error) => {
                warn!(error = %error, "failed to claim invitation outbox rows");
                tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)).await;
            }
        }
    }
}

async fn drain_once(
    outbox: &PostgresInvitationOutbox,
    mailer: &InvitationMailer,
    config: &WorkerConfig,
) -> AppResult<DrainReport> {
    let messages = outbox.claim_pending(config.batch_size).await?;
    let mut report = DrainReport {
        claimed: messages.len(),
        ..DrainReport::default()
    };

    for message in messages {
        match mailer.deliver(&message.notice).await {
            Ok(()) => {
                report.delivered += 1;
                if let Err(error) = outbox.mark_delivered(message.id).await {
                    warn!(
                        outbox_id = message.id,
                        error = %error,
                        "invitation sent but outbox row not updated"
                    );
                }
            }
            Err(error) => {
                report.failed += 1;
                warn!(
                    outbox_id = message.id,
                    principal_id = %message.notice.principal_id,
                    attempts = message.attempts,
                    error = %error,
                    "failed to deliver invitation email"
                );
                if let Err(mark_error) = outbox
                    .mark_failed(message.id, &error.to_string(), config.max_attempts)
                    .await
                {
                    warn!(
                        outbox_id = message.id,
                        error = %mark_error,
                        "failed to record outbox delivery failure"
                    );
                }
            }
        }
    }

    Ok(report)
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn build_email_service(provider: &EmailProvider) -> AppResult<Arc<dyn EmailService>> {
    match provider {
        EmailProvider::Console => Ok(Arc::new(ConsoleEmailService::new())),
        EmailProvider::Smtp(config) => Ok(Arc::new(SmtpEmailService::new(config.clone())?)),
    }
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let frontend_url = env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_owned())
            .trim_end_matches('/')
            .to_owned();
        let email_provider = load_email_provider()?;
        let batch_size = parse_env_usize("OUTBOX_BATCH_SIZE", 20)?;
        let poll_interval_ms = parse_env_u64("OUTBOX_POLL_INTERVAL_MS", 2000)?;
        let max_attempts = parse_env_u32("OUTBOX_MAX_ATTEMPTS", 5)?;
        let lease_seconds = parse_env_u32("OUTBOX_LEASE_SECONDS", 60)?;

        if batch_size == 0 {
            return Err(AppError::Validation(
                "OUTBOX_BATCH_SIZE must be greater than zero".to_owned(),
            ));
        }

        if poll_interval_ms == 0 {
            return Err(AppError::Validation(
                "OUTBOX_POLL_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }

        if lease_seconds == 0 {
            return Err(AppError::Validation(
                "OUTBOX_LEASE_SECONDS must be greater than zero".to_owned(),
            ));
        }

        let max_attempts = i32::try_from(max_attempts)
            .ok()
            .filter(|value| *value > 0)
            .ok_or_else(|| {
                AppError::Validation(
                    "OUTBOX_MAX_ATTEMPTS must be between 1 and 2147483647".to_owned(),
                )
            })?;

        Ok(Self {
            database_url,
            frontend_url,
            email_provider,
            batch_size,
            poll_interval_ms,
            max_attempts,
            lease_seconds,
        })
    }
}

fn load_email_provider() -> AppResult<EmailProvider> {
    let email_provider = env::var("EMAIL_PROVIDER").unwrap_or_else(|_| "console".to_owned());

    match email_provider.as_str() {
        "console" => Ok(EmailProvider::Console),
        "smtp" => {
            let port = required_non_empty_env("SMTP_PORT")?
                .parse::<u16>()
                .map_err(|error| AppError::Validation(format!("invalid SMTP_PORT: {error}")))?;

            Ok(EmailProvider::Smtp(SmtpEmailConfig {
                host: required_non_empty_env("SMTP_HOST")?,
                port,
                username: required_non_empty_env("SMTP_USERNAME")?,
                password: required_non_empty_env("SMTP_PASSWORD")?,
                from_address: required_non_empty_env("SMTP_FROM_ADDRESS")?,
            }))
        }
        _ => Err(AppError::Validation(format!(
            "EMAIL_PROVIDER must be either 'console' or 'smtp', got '{email_provider}'"
        ))),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> AppResult<String> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parse_env_usize(name: &str, default: usize) -> AppResult<usize> {
    match env::var(name) {
        Ok(value) => value.parse::<usize>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> AppResult<u32> {
    match env::var(name) {
        Ok(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
