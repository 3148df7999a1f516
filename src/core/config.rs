use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub mail: MailConfig,
    pub notifications: NotificationConfig,
    pub reconciler: ReconcilerConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// HTTP mail relay used for best-effort e-mail notifications.
/// E-mail is disabled entirely when `api_url` is not configured.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from_address: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// Total delivery attempts per e-mail, first attempt included
    pub email_max_attempts: u32,
    pub email_retry_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Postgres NOTIFY channel carrying capability-loss events
    pub channel: String,
    pub sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            database: DatabaseConfig::from_env()?,
            mail: MailConfig::from_env()?,
            notifications: NotificationConfig::from_env()?,
            reconciler: ReconcilerConfig::from_env()?,
        })
    }
}

impl DatabaseConfig {
    // Default values for database connection pool (conservative defaults for small-medium apps)
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl MailConfig {
    const DEFAULT_TIMEOUT_SECS: u64 = 10;

    pub fn from_env() -> Result<Self, String> {
        // Only use relay settings if they are non-empty
        let api_url = env::var("MAIL_API_URL").ok().filter(|s| !s.is_empty());
        let api_key = env::var("MAIL_API_KEY").ok().filter(|s| !s.is_empty());
        let from_address = env::var("MAIL_FROM_ADDRESS")
            .unwrap_or_else(|_| "no-reply@civic-reports.local".to_string());

        let timeout_secs = env::var("MAIL_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "MAIL_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            api_url,
            api_key,
            from_address,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_url.is_some()
    }
}

impl NotificationConfig {
    const DEFAULT_EMAIL_MAX_ATTEMPTS: u32 = 3;
    const DEFAULT_EMAIL_RETRY_DELAY_MS: u64 = 500;

    pub fn from_env() -> Result<Self, String> {
        let email_max_attempts = env::var("EMAIL_MAX_ATTEMPTS")
            .unwrap_or_else(|_| Self::DEFAULT_EMAIL_MAX_ATTEMPTS.to_string())
            .parse::<u32>()
            .map_err(|_| "EMAIL_MAX_ATTEMPTS must be a valid number".to_string())?;

        if email_max_attempts == 0 {
            return Err("EMAIL_MAX_ATTEMPTS must be at least 1".to_string());
        }

        let email_retry_delay_ms = env::var("EMAIL_RETRY_DELAY_MS")
            .unwrap_or_else(|_| Self::DEFAULT_EMAIL_RETRY_DELAY_MS.to_string())
            .parse::<u64>()
            .map_err(|_| "EMAIL_RETRY_DELAY_MS must be a valid number".to_string())?;

        Ok(Self {
            email_max_attempts,
            email_retry_delay: Duration::from_millis(email_retry_delay_ms),
        })
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            email_max_attempts: Self::DEFAULT_EMAIL_MAX_ATTEMPTS,
            email_retry_delay: Duration::from_millis(Self::DEFAULT_EMAIL_RETRY_DELAY_MS),
        }
    }
}

impl ReconcilerConfig {
    const DEFAULT_CHANNEL: &'static str = "staff_capability_lost";
    const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300; // 5 minutes

    pub fn from_env() -> Result<Self, String> {
        let channel = env::var("RECONCILER_CHANNEL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_CHANNEL.to_string());

        let sweep_interval_secs = env::var("RECONCILER_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_SWEEP_INTERVAL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "RECONCILER_SWEEP_INTERVAL_SECS must be a valid number".to_string())?;

        if sweep_interval_secs == 0 {
            return Err("RECONCILER_SWEEP_INTERVAL_SECS must be greater than zero".to_string());
        }

        Ok(Self {
            channel,
            sweep_interval: Duration::from_secs(sweep_interval_secs),
        })
    }
}
