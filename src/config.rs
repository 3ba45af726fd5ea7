use std::env;
use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveTime;
use dotenvy::dotenv;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => f.write_str("development"),
            Environment::Production => f.write_str("production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    /// `None` keeps everything in memory.
    pub database_url: Option<String>,
    pub environment: Environment,
    pub late_cutoff: NaiveTime,
    pub api_prefix: String,
    pub log_dir: String,
    pub student_cache_capacity: u64,
    /// Browser origins allowed to call the API; `*` allows any.
    pub cors_origins: Vec<String>,

    // Rate limiting, 0 disables
    pub rate_mark_per_min: u32,
    pub rate_api_per_min: u32,

    /// Values that failed to parse and fell back to defaults. Logged by the
    /// caller once tracing is installed.
    pub warnings: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "0.0.0.0:3000".to_string(),
            database_url: None,
            environment: Environment::Development,
            late_cutoff: default_late_cutoff(),
            api_prefix: "/api".to_string(),
            log_dir: "logs".to_string(),
            student_cache_capacity: 10_000,
            cors_origins: ["https://localhost:3001", "http://localhost:3000", "https://localhost:3000"]
                .map(String::from)
                .to_vec(),
            rate_mark_per_min: 120,
            rate_api_per_min: 1000,
            warnings: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let mut loader = Loader {
            lookup,
            warnings: Vec::new(),
        };

        let late_cutoff = match loader.raw("LATE_CUTOFF") {
            Some(raw) => match NaiveTime::parse_from_str(raw.trim(), "%H:%M") {
                Ok(time) => time,
                Err(e) => {
                    let default = defaults.late_cutoff.format("%H:%M");
                    loader
                        .warnings
                        .push(format!("Invalid LATE_CUTOFF '{raw}': {e}, using default: {default}"));
                    defaults.late_cutoff
                }
            },
            None => defaults.late_cutoff,
        };
        let cors_origins = loader
            .raw("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().trim_end_matches('/').to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        Self {
            server_addr: loader.raw("SERVER_ADDR").unwrap_or(defaults.server_addr),
            database_url: loader.raw("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            environment: loader.parse("APP_ENV", defaults.environment),
            late_cutoff,
            api_prefix: loader.raw("API_PREFIX").unwrap_or(defaults.api_prefix),
            log_dir: loader.raw("LOG_DIR").unwrap_or(defaults.log_dir),
            student_cache_capacity: loader.parse("STUDENT_CACHE_CAPACITY", defaults.student_cache_capacity),
            cors_origins,
            rate_mark_per_min: loader.parse("RATE_MARK_PER_MIN", defaults.rate_mark_per_min),
            rate_api_per_min: loader.parse("RATE_API_PER_MIN", defaults.rate_api_per_min),
            warnings: loader.warnings,
        }
    }

    /// Full storage error text goes into responses only outside production.
    pub fn expose_error_details(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn default_late_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 15, 0).unwrap_or(NaiveTime::MIN)
}

struct Loader<F> {
    lookup: F,
    warnings: Vec<String>,
}

impl<F: Fn(&str) -> Option<String>> Loader<F> {
    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }

    fn parse<T>(&mut self, key: &str, default: T) -> T
    where
        T: FromStr + Display,
        T::Err: Display,
    {
        match self.raw(key) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
                self.warnings
                    .push(format!("Invalid {key} value '{raw}': {e}, using default: {default}"));
                default
            }),
            None => default,
        }
    }
}
