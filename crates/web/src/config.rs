use std::{env, net::SocketAddr, str::FromStr, time::Duration};

/// Where the queue data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Postgres,
    /// Nothing survives a restart. Meant for demos and local development.
    Memory,
}

impl FromStr for Storage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown queue storage `{}`", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub storage: Storage,
    pub bind_address: SocketAddr,
    /// How often the event stream pushes a fresh snapshot.
    pub poll_interval: Duration,
    pub archive_interval: Duration,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            storage: Storage::Postgres,
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            poll_interval: Duration::from_secs(30),
            archive_interval: Duration::from_secs(3600),
        }
    }
}

impl WebConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            storage: parse_or(&lookup, "QUEUE_STORAGE", defaults.storage)?,
            bind_address: parse_or(&lookup, "WEB_BIND_ADDRESS", defaults.bind_address)?,
            poll_interval: seconds_or(&lookup, "QUEUE_POLL_INTERVAL_SECS", defaults.poll_interval)?,
            archive_interval: seconds_or(
                &lookup,
                "QUEUE_ARCHIVE_INTERVAL_SECS",
                defaults.archive_interval,
            )?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, String>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: ToString,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|why: T::Err| format!("{}: {}", key, why.to_string())),
        None => Ok(default),
    }
}

fn seconds_or<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, String>
where
    F: Fn(&str) -> Option<String>,
{
    let seconds: u64 = parse_or(lookup, key, default.as_secs())?;
    if seconds == 0 {
        return Err(format!("{}: must be at least one second", key));
    }
    Ok(Duration::from_secs(seconds))
}
