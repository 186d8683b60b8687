use std::fmt::{self, Write as _};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, Locale, NaiveDateTime, Offset, TimeZone, Utc};
use tracing::warn;

use crate::errors::FormatError;
use crate::policy::FeedPolicyView;

/// `yyyy-MM-dd'T'HH:mm:ssZ`
pub const WIRE_PATTERN: &str = "%Y-%m-%dT%H:%M:%S%z";
/// Medium date followed by medium time.
pub const MEDIUM_DATE_TIME: &str = "%b %-d, %Y, %-I:%M:%S %p";
pub const DEFAULT_PLACEHOLDER: &str = "—";

/// Strict parse of the wire timestamp. A trailing `Z` is read as UTC.
pub fn parse_wire_timestamp(input: &str) -> Result<DateTime<FixedOffset>, FormatError> {
    if let Ok(parsed) = DateTime::parse_from_str(input, WIRE_PATTERN) {
        return Ok(parsed);
    }
    if let Some(naive) = input.strip_suffix('Z') {
        if let Ok(naive) = NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S") {
            return Ok(Utc.from_utc_datetime(&naive).into());
        }
    }
    Err(FormatError::malformed(input))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayZone {
    Local,
    Fixed(FixedOffset),
}

#[derive(Debug, Clone)]
pub struct TimestampFormatter {
    pattern: String,
    locale: Locale,
    zone: DisplayZone,
    placeholder: String,
}

impl Default for TimestampFormatter {
    fn default() -> Self {
        Self {
            pattern: MEDIUM_DATE_TIME.to_string(),
            locale: Locale::en_US,
            zone: DisplayZone::Local,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl TimestampFormatter {
    pub fn new(pattern: &str, locale: Locale, zone: DisplayZone) -> Self {
        let pattern = if pattern_is_valid(pattern) {
            pattern.to_string()
        } else {
            warn!(pattern, "invalid display pattern; using medium date/time");
            MEDIUM_DATE_TIME.to_string()
        };
        Self {
            pattern,
            locale,
            zone,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    pub fn utc() -> Self {
        Self::new(MEDIUM_DATE_TIME, Locale::en_US, DisplayZone::Fixed(utc_offset()))
    }

    pub fn from_policy(policy: &FeedPolicyView) -> Self {
        let locale = Locale::try_from(policy.locale.as_str()).unwrap_or_else(|_| {
            warn!(locale = %policy.locale, "unknown locale; using en_US");
            Locale::en_US
        });
        let zone = match policy.display_utc_offset_secs {
            Some(secs) => match FixedOffset::east_opt(secs) {
                Some(offset) => DisplayZone::Fixed(offset),
                None => {
                    warn!(secs, "display offset out of range; using local zone");
                    DisplayZone::Local
                }
            },
            None => DisplayZone::Local,
        };
        Self::new(&policy.timestamp_pattern, locale, zone).with_placeholder(&policy.placeholder)
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.to_string();
        self
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn format(&self, wire: &str) -> Result<String, FormatError> {
        let parsed = parse_wire_timestamp(wire)?;
        let rendered = match self.zone {
            DisplayZone::Local => self.render(parsed.with_timezone(&Local)),
            DisplayZone::Fixed(offset) => self.render(parsed.with_timezone(&offset)),
        };
        rendered.map_err(|_| FormatError::malformed(wire))
    }

    /// Per-row rendering: a bad timestamp costs one label, not the feed.
    pub fn format_or_placeholder(&self, wire: &str) -> String {
        match self.format(wire) {
            Ok(label) => label,
            Err(err) => {
                warn!(%err, "rendering placeholder for event timestamp");
                self.placeholder.clone()
            }
        }
    }

    fn render<Tz>(&self, date: DateTime<Tz>) -> Result<String, fmt::Error>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut out = String::new();
        write!(out, "{}", date.format_localized(&self.pattern, self.locale))?;
        Ok(out)
    }
}

fn pattern_is_valid(pattern: &str) -> bool {
    !pattern.is_empty() && !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}
