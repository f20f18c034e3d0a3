use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use jobwatch_notify::{NotifyError, SmtpConfig, WebhookConfig};
use jobwatch_storage::HttpClientConfig;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::SeenPolicy;

const DEFAULT_USER_AGENT: &str = concat!("jobwatch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("source list {}: {reason}", .path.display())]
    SourceList { path: PathBuf, reason: String },
    #[error("building http client: {0}")]
    Http(String),
    #[error(transparent)]
    Notifier(#[from] NotifyError),
}

impl ConfigError {
    pub(crate) fn source_list(path: &Path, err: anyhow::Error) -> Self {
        Self::SourceList {
            path: path.to_path_buf(),
            reason: format!("{err:#}"),
        }
    }
}

/// Process-wide settings read from `JOBWATCH_*` variables.
#[derive(Debug)]
pub struct WatchConfig {
    pub state_dir: PathBuf,
    pub boards_file: PathBuf,
    pub companies_file: PathBuf,
    pub board_interval: Duration,
    pub company_interval: Duration,
    pub send_delay: Duration,
    pub seen_policy: SeenPolicy,
    pub entry_level_only: bool,
    pub user_agent: String,
    pub http_timeout: Duration,
    pub fetch_spacing: Duration,
    pub simplify_api_key: Option<SecretString>,
    pub discord_webhook_url: Option<SecretString>,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_starttls: bool,
    pub email_address: Option<String>,
    pub email_password: Option<SecretString>,
    pub email_to: Option<String>,
}

impl WatchConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let secs = |key: &'static str, default: u64| {
            parse_or(get(key), key, default).map(Duration::from_secs)
        };
        let millis = |key: &'static str, default: u64| {
            parse_or(get(key), key, default).map(Duration::from_millis)
        };

        let board_interval = secs("JOBWATCH_BOARD_INTERVAL_SECS", 1800)?;
        let company_interval = secs("JOBWATCH_COMPANY_INTERVAL_SECS", 30)?;
        for (key, interval) in [
            ("JOBWATCH_BOARD_INTERVAL_SECS", board_interval),
            ("JOBWATCH_COMPANY_INTERVAL_SECS", company_interval),
        ] {
            if interval.is_zero() {
                return Err(ConfigError::Invalid {
                    key,
                    value: "0".into(),
                    reason: "interval must be positive".into(),
                });
            }
        }

        let email_address = get("JOBWATCH_EMAIL_ADDRESS");
        Ok(Self {
            state_dir: get("JOBWATCH_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./state")),
            boards_file: get("JOBWATCH_BOARDS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./boards.yaml")),
            companies_file: get("JOBWATCH_COMPANIES_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./companies.csv")),
            board_interval,
            company_interval,
            send_delay: millis("JOBWATCH_SEND_DELAY_MS", 2000)?,
            seen_policy: parse_or(get("JOBWATCH_SEEN_POLICY"), "JOBWATCH_SEEN_POLICY", SeenPolicy::default())?,
            entry_level_only: parse_bool(get("JOBWATCH_ENTRY_LEVEL_ONLY"), "JOBWATCH_ENTRY_LEVEL_ONLY", true)?,
            user_agent: get("JOBWATCH_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            http_timeout: secs("JOBWATCH_HTTP_TIMEOUT_SECS", 30)?,
            fetch_spacing: millis("JOBWATCH_FETCH_SPACING_MS", 1000)?,
            simplify_api_key: get("JOBWATCH_SIMPLIFY_API_KEY").map(SecretString::from),
            discord_webhook_url: get("JOBWATCH_DISCORD_WEBHOOK_URL").map(SecretString::from),
            smtp_host: get("JOBWATCH_SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            smtp_port: parse_or(get("JOBWATCH_SMTP_PORT"), "JOBWATCH_SMTP_PORT", 465)?,
            smtp_starttls: parse_bool(get("JOBWATCH_SMTP_STARTTLS"), "JOBWATCH_SMTP_STARTTLS", false)?,
            email_to: get("JOBWATCH_EMAIL_TO").or_else(|| email_address.clone()),
            email_address,
            email_password: get("JOBWATCH_EMAIL_APP_PASSWORD").map(SecretString::from),
        })
    }

    pub fn boards_seen_path(&self) -> PathBuf {
        self.state_dir.join("boards_seen.json")
    }

    pub fn companies_seen_path(&self) -> PathBuf {
        self.state_dir.join("companies_seen.json")
    }

    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout: self.http_timeout,
            user_agent: Some(self.user_agent.clone()),
            request_spacing: (!self.fetch_spacing.is_zero()).then_some(self.fetch_spacing),
        }
    }

    pub fn webhook_config(&self) -> Result<WebhookConfig, ConfigError> {
        let url = self
            .discord_webhook_url
            .as_ref()
            .ok_or(ConfigError::Missing("JOBWATCH_DISCORD_WEBHOOK_URL"))?;
        Ok(WebhookConfig {
            url: SecretString::from(url.expose_secret().to_string()),
            timeout: self.http_timeout,
        })
    }

    pub fn smtp_config(&self) -> Result<SmtpConfig, ConfigError> {
        let address = self
            .email_address
            .clone()
            .ok_or(ConfigError::Missing("JOBWATCH_EMAIL_ADDRESS"))?;
        let password = self
            .email_password
            .as_ref()
            .ok_or(ConfigError::Missing("JOBWATCH_EMAIL_APP_PASSWORD"))?;
        Ok(SmtpConfig {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            username: address.clone(),
            password: SecretString::from(password.expose_secret().to_string()),
            to_address: self.email_to.clone().unwrap_or_else(|| address.clone()),
            from_address: address,
            starttls: self.smtp_starttls,
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = raw else {
        return Ok(default);
    };
    match value.parse::<T>() {
        Ok(parsed) => Ok(parsed),
        Err(e) => Err(ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_bool(raw: Option<String>, key: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value,
            reason: "expected a boolean".into(),
        }),
    }
}
