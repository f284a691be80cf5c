use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Argon2 cost settings. Tests override these with the cheapest legal values.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub enum MailTransportConfig {
    Smtp {
        host: String,
        port: u16,
        username: String,
        password: String,
    },
    /// Writes outgoing mail to files, for development and local testing.
    File { dir: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub transport: MailTransportConfig,
    pub from_email: String,
    pub from_name: String,
    /// Base URL embedded in activation and password-reset links.
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub hashing: HashingConfig,
    pub mail: MailConfig,
    pub reset_ttl_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "microgram".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "microgram-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        let hashing = HashingConfig {
            memory_kib: std::env::var("HASH_MEMORY_KIB")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(19_456),
            iterations: std::env::var("HASH_ITERATIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(2),
            parallelism: std::env::var("HASH_PARALLELISM")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(1),
        };
        let transport = match std::env::var("MAIL_TRANSPORT").as_deref() {
            Ok("smtp") => MailTransportConfig::Smtp {
                host: std::env::var("SMTP_HOST")?,
                port: std::env::var("SMTP_PORT")
                    .ok()
                    .and_then(|v| v.parse::<u16>().ok())
                    .unwrap_or(587),
                username: std::env::var("SMTP_USERNAME")?,
                password: std::env::var("SMTP_PASSWORD")?,
            },
            _ => MailTransportConfig::File {
                dir: std::env::var("MAIL_DIR").unwrap_or_else(|_| "./tmp/mail".into()),
            },
        };
        let mail = MailConfig {
            transport,
            from_email: std::env::var("MAIL_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@microgram.local".into()),
            from_name: std::env::var("MAIL_FROM_NAME").unwrap_or_else(|_| "Microgram".into()),
            base_url: std::env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
        };
        let reset_ttl_minutes = std::env::var("RESET_TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(120);
        Ok(Self {
            database_url,
            jwt,
            hashing,
            mail,
            reset_ttl_minutes,
        })
    }
}
