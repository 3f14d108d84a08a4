use std::time::Duration;

use axum_extra::extract::cookie::SameSite;

/// Fixed page size for paginated listings.
pub const PER_PAGE: i64 = 5;

/// Upload size ceiling for user files, in megabytes.
pub const FILE_SIZE_BASE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub user: String,
    pub pass: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub public_url: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
}

/// Attributes applied to the session cookie. Development relaxes them so the
/// cookie survives plain-http localhost; production requires secure
/// cross-site delivery.
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    pub secure: bool,
    pub same_site: SameSite,
    pub domain: Option<String>,
    pub max_age: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_env: AppEnv,
    pub api_version: String,
    pub host: String,
    pub port: u16,
    pub app_secret: String,
    pub allowed_origins: Vec<String>,
    pub client_base_domain: String,
    pub domain_url: String,
    pub database_url: String,
    pub redis_host: String,
    pub redis_port: u16,
    pub hash_cost: u32,
    pub token_life: Duration,
    pub otp_ttl: Duration,
    pub super_admin_email: String,
    pub smtp: SmtpConfig,
    pub google: OAuthClientConfig,
    pub figma: OAuthClientConfig,
    pub storage: StorageConfig,
    pub cookie: CookiePolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let app_env = match std::env::var("APP_ENV").as_deref() {
            Ok("production") => AppEnv::Production,
            _ => AppEnv::Development,
        };

        let port = std::env::var("APP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);

        let token_life =
            parse_duration(&std::env::var("TOKEN_LIFE").unwrap_or_else(|_| "1d".into()))?;
        let otp_ttl =
            parse_duration(&std::env::var("OTP_TIME_TO_LIFE").unwrap_or_else(|_| "10m".into()))?;

        let domain_url = std::env::var("DOMAIN_URL").unwrap_or_else(|_| match app_env {
            AppEnv::Development => format!("http://localhost:{}", port),
            AppEnv::Production => "https://moospire.app".into(),
        });

        let cookie = match app_env {
            AppEnv::Development => CookiePolicy {
                secure: false,
                same_site: SameSite::Lax,
                domain: Some("localhost".into()),
                max_age: token_life,
            },
            AppEnv::Production => CookiePolicy {
                secure: true,
                same_site: SameSite::None,
                domain: None,
                max_age: token_life,
            },
        };

        Ok(Self {
            app_env,
            api_version: std::env::var("API_VERSION").unwrap_or_else(|_| "v1".into()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            app_secret: std::env::var("APP_SECRET")?,
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            client_base_domain: std::env::var("APP_CLIENT_BASE_DOMAIN")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            domain_url,
            database_url: std::env::var("DATABASE_URL")?,
            redis_host: std::env::var("REDIS_HOST").unwrap_or_else(|_| "redis".into()),
            redis_port: std::env::var("REDIS_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(6379),
            hash_cost: std::env::var("HASH_COST")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(2),
            token_life,
            otp_ttl,
            super_admin_email: std::env::var("SUPER_ADMIN_EMAIL").unwrap_or_default(),
            smtp: SmtpConfig {
                host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".into()),
                user: std::env::var("SMTP_USER").unwrap_or_default(),
                pass: std::env::var("SMTP_PASS").unwrap_or_default(),
                from: std::env::var("EMAIL_FROM")
                    .unwrap_or_else(|_| "no-reply@moospire.app".into()),
            },
            google: OAuthClientConfig {
                client_id: std::env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
                client_secret: std::env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            },
            figma: OAuthClientConfig {
                client_id: std::env::var("FIGMA_CLIENT_ID").unwrap_or_default(),
                client_secret: std::env::var("FIGMA_CLIENT_SECRET").unwrap_or_default(),
            },
            storage: StorageConfig {
                endpoint: std::env::var("MINIO_ENDPOINT")
                    .unwrap_or_else(|_| "http://localhost:9000".into()),
                public_url: std::env::var("MINIO_PUBLIC_URL")
                    .unwrap_or_else(|_| "http://localhost:9000".into()),
                bucket: std::env::var("MINIO_BUCKET").unwrap_or_else(|_| "moospire".into()),
                access_key: std::env::var("MINIO_ACCESS_KEY").unwrap_or_default(),
                secret_key: std::env::var("MINIO_SECRET_KEY").unwrap_or_default(),
            },
            cookie,
        })
    }
}

/// Parses lifetimes written as `45s`, `10m`, `2h` or `1d`.
pub fn parse_duration(input: &str) -> anyhow::Result<Duration> {
    let input = input.trim();
    if input.len() < 2 {
        anyhow::bail!(r#"invalid time format, use "d", "h", "m" or "s""#);
    }
    let (value, unit) = input.split_at(input.len() - 1);
    let value: u64 = value
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid time value {:?}", input))?;

    let secs = match unit {
        "d" => value * 24 * 60 * 60,
        "h" => value * 60 * 60,
        "m" => value * 60,
        "s" => value,
        _ => anyhow::bail!(r#"invalid time format, use "d", "h", "m" or "s""#),
    };
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_supports_all_units() {
        assert_eq!(parse_duration("45s").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("10m").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("1d").unwrap(), Duration::from_secs(86400));
    }

    #[test]
    fn parse_duration_rejects_unknown_units() {
        assert!(parse_duration("10w").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("ms").is_err());
    }
}
