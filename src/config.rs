use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    /// Slot grid step in minutes. When unset, the grid steps by the
    /// service's own duration.
    pub slot_granularity_minutes: Option<i64>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "salonbook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            slot_granularity_minutes: env::var("SLOT_GRANULARITY_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|m| *m > 0),
        }
    }
}
