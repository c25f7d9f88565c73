//! Clock: the current date and/or time.

use chrono::{DateTime, Local, TimeZone, Utc};
use chrono_tz::Tz;
use symposium_config::TimeConfig;
use symposium_core::error::ToolError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Local,
    Utc,
    Named(Tz),
}

/// Formats the current instant in the configured timezone.
#[derive(Debug, Clone)]
pub struct Clock {
    zone: Zone,
    format: String,
}

impl Clock {
    pub fn from_config(config: &TimeConfig) -> Result<Self, ToolError> {
        let zone = match config.timezone.to_ascii_lowercase().as_str() {
            "local" => Zone::Local,
            "utc" => Zone::Utc,
            _ => Zone::Named(
                config
                    .timezone
                    .parse::<Tz>()
                    .map_err(|_| ToolError::Unavailable(format!("unknown timezone '{}'", config.timezone)))?,
            ),
        };
        Ok(Self {
            zone,
            format: config.format.clone(),
        })
    }

    /// `date`, `time`, or anything else for the full configured format.
    pub fn now(&self, query: &str) -> String {
        self.format_at(Utc::now(), query)
    }

    fn format_at(&self, instant: DateTime<Utc>, query: &str) -> String {
        let fmt = match query.trim().to_ascii_lowercase().as_str() {
            "date" => DATE_FORMAT,
            "time" => TIME_FORMAT,
            _ => self.format.as_str(),
        };
        match self.zone {
            Zone::Local => render(&Local, instant, fmt),
            Zone::Utc => render(&Utc, instant, fmt),
            Zone::Named(tz) => render(&tz, instant, fmt),
        }
    }
}

fn render<Z: TimeZone>(zone: &Z, instant: DateTime<Utc>, fmt: &str) -> String
where
    Z::Offset: std::fmt::Display,
{
    use std::fmt::Write;

    let mut out = String::new();
    // An invalid user format must not panic the turn
    if write!(out, "{}", instant.with_timezone(zone).format(fmt)).is_err() {
        out = instant.with_timezone(zone).format("%Y-%m-%d %H:%M:%S").to_string();
    }
    out
}
