//! Parsing of time-machine specifiers.
//!
//! A specifier is either a bare Unix timestamp (`255657600`) or a list of
//! signed offsets relative to now (`+3y +5M`, `-4y -5M -3m`).

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Months, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeSpecError {
    #[error("Time specifier is empty; pass a Unix timestamp or offsets like \"+3y -2d\"")]
    Empty,

    #[error("Malformed time offset '{0}': expected <signed integer><unit>, e.g. \"-5M\"")]
    MalformedToken(String),

    #[error("Unknown unit '{unit}' in time offset '{token}'. Supported units: y, M, d, h, m, s")]
    UnknownUnit { token: String, unit: char },

    #[error("Time specifier '{0}' is outside the representable range")]
    OutOfRange(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Years,
    Months,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'y' => Some(TimeUnit::Years),
            'M' => Some(TimeUnit::Months),
            'd' => Some(TimeUnit::Days),
            'h' => Some(TimeUnit::Hours),
            'm' => Some(TimeUnit::Minutes),
            's' => Some(TimeUnit::Seconds),
            _ => None,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            TimeUnit::Years => 'y',
            TimeUnit::Months => 'M',
            TimeUnit::Days => 'd',
            TimeUnit::Hours => 'h',
            TimeUnit::Minutes => 'm',
            TimeUnit::Seconds => 's',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    pub amount: i64,
    pub unit: TimeUnit,
}

impl Offset {
    fn parse(token: &str) -> Result<Self, TimeSpecError> {
        let malformed = || TimeSpecError::MalformedToken(token.to_string());

        let letter = token.chars().last().ok_or_else(malformed)?;
        if !letter.is_ascii_alphabetic() {
            return Err(malformed());
        }

        let number = &token[..token.len() - letter.len_utf8()];
        let digits = number.strip_prefix(['+', '-']).unwrap_or(number);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let unit = TimeUnit::from_letter(letter).ok_or_else(|| TimeSpecError::UnknownUnit {
            token: token.to_string(),
            unit: letter,
        })?;
        let amount = number
            .parse::<i64>()
            .map_err(|_| TimeSpecError::OutOfRange(token.to_string()))?;

        Ok(Offset { amount, unit })
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}{}", self.amount, self.unit.letter())
    }
}

/// The instant a time-machine query is anchored to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeSpec {
    Timestamp(i64),
    Relative(Vec<Offset>),
}

impl TimeSpec {
    /// Resolve against `now`.
    ///
    /// An empty offset list is rejected rather than treated as `now`.
    ///
    /// Offsets are summed per class and applied calendar months first, then
    /// fixed seconds, so `"+5M +3y"` and `"+3y +5M"` land on the same instant.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, TimeSpecError> {
        let out_of_range = || TimeSpecError::OutOfRange(self.to_string());

        match self {
            TimeSpec::Timestamp(ts) => DateTime::from_timestamp(*ts, 0).ok_or_else(out_of_range),
            TimeSpec::Relative(offsets) if offsets.is_empty() => Err(TimeSpecError::Empty),
            TimeSpec::Relative(offsets) => {
                let mut months: i64 = 0;
                let mut seconds: i64 = 0;

                for offset in offsets {
                    let (bucket, scale) = match offset.unit {
                        TimeUnit::Years => (&mut months, 12),
                        TimeUnit::Months => (&mut months, 1),
                        TimeUnit::Days => (&mut seconds, 86_400),
                        TimeUnit::Hours => (&mut seconds, 3_600),
                        TimeUnit::Minutes => (&mut seconds, 60),
                        TimeUnit::Seconds => (&mut seconds, 1),
                    };
                    let current = *bucket;
                    *bucket = offset
                        .amount
                        .checked_mul(scale)
                        .and_then(|v| current.checked_add(v))
                        .ok_or_else(out_of_range)?;
                }

                let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| out_of_range())?;
                let shifted = if months >= 0 {
                    now.checked_add_months(Months::new(magnitude))
                } else {
                    now.checked_sub_months(Months::new(magnitude))
                }
                .ok_or_else(out_of_range)?;

                Duration::try_seconds(seconds)
                    .and_then(|d| shifted.checked_add_signed(d))
                    .ok_or_else(out_of_range)
            }
        }
    }

    pub fn resolve_now(&self) -> Result<DateTime<Utc>, TimeSpecError> {
        self.resolve(Utc::now())
    }
}

impl From<i64> for TimeSpec {
    fn from(ts: i64) -> Self {
        TimeSpec::Timestamp(ts)
    }
}

impl FromStr for TimeSpec {
    type Err = TimeSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TimeSpecError::Empty);
        }

        if let Ok(ts) = s.parse::<i64>() {
            return Ok(TimeSpec::Timestamp(ts));
        }

        s.split_whitespace()
            .map(Offset::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(TimeSpec::Relative)
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeSpec::Timestamp(ts) => write!(f, "{ts}"),
            TimeSpec::Relative(offsets) => {
                for (i, offset) in offsets.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{offset}")?;
                }
                Ok(())
            }
        }
    }
}
