//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::Database;
use crate::mail::{LogMailer, Mailer, SmtpMailer, SmtpSettings, SmtpTls};
use crate::password::hash_password;
use crate::validation::{MIN_PASSWORD_LEN, is_valid_email};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;
use uuid::Uuid;

const MIN_JWT_SECRET_LENGTH: usize = 32;

const ACCESS_SECRET_ENV: &str = "ACCESS_TOKEN_SECRET";
const REFRESH_SECRET_ENV: &str = "REFRESH_TOKEN_SECRET";
const SUPERADMIN_PASS_ENV: &str = "SUPERADMIN_PASS";
const SMTP_PASS_ENV: &str = "SMTP_PASS";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SmtpSecurity {
    #[default]
    Starttls,
    Tls,
    None,
}

impl From<SmtpSecurity> for SmtpTls {
    fn from(security: SmtpSecurity) -> Self {
        match security {
            SmtpSecurity::Starttls => SmtpTls::StartTls,
            SmtpSecurity::Tls => SmtpTls::Tls,
            SmtpSecurity::None => SmtpTls::None,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rolegate",
    about = "User management with role-based access control"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "5000")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "rolegate.db")]
    pub database: String,

    /// Base URL of the frontend, used in activation and password reset links
    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:3000")]
    pub frontend_url: String,

    /// Path to file containing the access token secret. Prefer ACCESS_TOKEN_SECRET
    #[arg(long)]
    pub access_secret_file: Option<String>,

    /// Path to file containing the refresh token secret. Prefer REFRESH_TOKEN_SECRET
    #[arg(long)]
    pub refresh_secret_file: Option<String>,

    /// Seed the default permissions and roles on startup
    #[arg(long)]
    pub seed_roles: bool,

    /// Create an active superadmin with this email (password from SUPERADMIN_PASS)
    #[arg(long, value_name = "EMAIL")]
    pub create_superadmin: Option<String>,

    /// SMTP relay host. Without it emails are only written to the log
    #[arg(long, env = "SMTP_HOST")]
    pub smtp_host: Option<String>,

    /// SMTP relay port
    #[arg(long, env = "SMTP_PORT", default_value = "587")]
    pub smtp_port: u16,

    /// SMTP username (password from SMTP_PASS)
    #[arg(long, env = "SMTP_USER")]
    pub smtp_user: Option<String>,

    /// Sender address for outgoing email
    #[arg(long, env = "SMTP_FROM")]
    pub smtp_from: Option<String>,

    /// SMTP transport security
    #[arg(long, env = "SMTP_TLS", default_value = "starttls")]
    pub smtp_tls: SmtpSecurity,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Read a value from the environment and remove it so it cannot leak to
/// child processes.
fn take_env(name: &str) -> Option<String> {
    let value = std::env::var(name).ok()?;
    // SAFETY: We're single-threaded at this point during startup,
    // and no other code is reading this environment variable.
    unsafe { std::env::remove_var(name) };
    Some(value)
}

/// Load one signing secret from its environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
fn load_secret(env_name: &str, file: Option<&str>, flag: &str) -> Option<String> {
    let secret = if let Some(secret) = take_env(env_name) {
        secret
    } else if let Some(path) = file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read secret file");
                return None;
            }
        }
    } else {
        error!(
            "Secret is required. Set {} environment variable (recommended) or use {}",
            env_name, flag
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "{} is shorter than {} characters. Use a longer secret",
            env_name, MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Load the access and refresh secrets. They must differ.
pub fn load_jwt_secrets(
    access_file: Option<&str>,
    refresh_file: Option<&str>,
) -> Option<(String, String)> {
    let access = load_secret(ACCESS_SECRET_ENV, access_file, "--access-secret-file")?;
    let refresh = load_secret(REFRESH_SECRET_ENV, refresh_file, "--refresh-secret-file")?;

    if access == refresh {
        error!("Access and refresh token secrets must be different");
        return None;
    }

    Some((access, refresh))
}

/// Parse and validate the frontend URL.
/// Returns None and logs an error if validation fails.
pub fn validate_frontend_url(frontend_url: &str) -> Option<Url> {
    let url = match Url::parse(frontend_url) {
        Ok(url) => url,
        Err(e) => {
            error!(url = %frontend_url, error = %e, "Invalid frontend URL");
            return None;
        }
    };

    if !matches!(url.scheme(), "http" | "https") {
        error!(url = %frontend_url, "Frontend URL must use http or https");
        return None;
    }

    let is_localhost = url.host_str() == Some("localhost");
    if url.scheme() == "http" && !is_localhost {
        warn!(url = %frontend_url, "Frontend URL is not HTTPS; emailed links will be sent in clear");
    }

    Some(url)
}

/// Handle the --seed-roles flag. Returns false if seeding failed.
pub async fn handle_seed_roles(db: &Database) -> bool {
    match db.seed_defaults().await {
        Ok(()) => {
            info!("Seeded default permissions and roles");
            true
        }
        Err(e) => {
            error!(error = %e, "Failed to seed roles");
            false
        }
    }
}

/// Handle the --create-superadmin flag. Returns false on failure.
/// An existing account with the same email is left untouched.
pub async fn handle_create_superadmin(db: &Database, email: &str) -> bool {
    if !is_valid_email(email) {
        error!(email = %email, "Invalid superadmin email");
        return false;
    }

    let role = match db.roles().get_by_name("superadmin").await {
        Ok(Some(role)) => role,
        Ok(None) => {
            error!("superadmin role not found. Run with --seed-roles first");
            return false;
        }
        Err(e) => {
            error!(error = %e, "Failed to look up superadmin role");
            return false;
        }
    };

    match db.users().get_by_email(email).await {
        Ok(Some(existing)) => {
            info!(email = %existing.email, "Superadmin email already exists");
            return true;
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Failed to check for existing user");
            return false;
        }
    }

    let Some(password) = take_env(SUPERADMIN_PASS_ENV) else {
        error!("Set {} to create a superadmin", SUPERADMIN_PASS_ENV);
        return false;
    };
    if password.chars().count() < MIN_PASSWORD_LEN {
        error!(
            "{} must be at least {} characters",
            SUPERADMIN_PASS_ENV, MIN_PASSWORD_LEN
        );
        return false;
    }

    let hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "Failed to hash superadmin password");
            return false;
        }
    };

    let uuid = Uuid::new_v4().to_string();
    match db
        .users()
        .create_active(&uuid, email, "superadmin", &hash, role.id)
        .await
    {
        Ok(_) => {
            info!(email = %email, username = "superadmin", "Superadmin created");
            true
        }
        Err(e) => {
            error!(error = %e, "Failed to create superadmin");
            false
        }
    }
}

/// Pick the outgoing mailer: SMTP when a host is configured, otherwise the
/// log. Returns None and logs an error if the SMTP settings are unusable.
pub fn build_mailer(args: &Args) -> Option<Arc<dyn Mailer>> {
    let Some(host) = args.smtp_host.clone() else {
        warn!("SMTP_HOST not set; emails will only be logged");
        return Some(Arc::new(LogMailer));
    };

    let Some(from) = args.smtp_from.clone() else {
        error!("SMTP_FROM is required when SMTP_HOST is set");
        return None;
    };

    let settings = SmtpSettings {
        host,
        port: args.smtp_port,
        tls: args.smtp_tls.into(),
        username: args.smtp_user.clone(),
        password: take_env(SMTP_PASS_ENV),
        from,
    };
    let (host, port) = (settings.host.clone(), settings.port);

    match SmtpMailer::new(settings) {
        Ok(mailer) => {
            info!(host = %host, port, "Sending email through SMTP");
            Some(Arc::new(mailer))
        }
        Err(e) => {
            error!(error = %e, "Invalid SMTP configuration");
            None
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    access_secret: String,
    refresh_secret: String,
    frontend_url: Url,
    mailer: Arc<dyn Mailer>,
) -> ServerConfig {
    ServerConfig {
        db,
        access_secret: access_secret.into_bytes(),
        refresh_secret: refresh_secret.into_bytes(),
        frontend_url,
        mailer,
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
