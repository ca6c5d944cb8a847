//! Timestamp tokens and day progress.
//!
//! A timestamp token is a 14-digit `YYYYMMDDHHmmss` string, optionally wrapped
//! in a single pair of square brackets:
//!
//! ```text
//! 20240101120000     -> 2024-01-01 12:00:00, 50.00% of the day
//! [20240101180000]   -> 2024-01-01 18:00:00, 75.00% of the day
//! ```
//!
//! [`compute_progress`] turns a token into a [`DayProgress`], the fraction of
//! the calendar day elapsed at the token's wall-clock time of day.
//!
//! # Example
//!
//! ```
//! use dayprog_core::timestamp::compute_progress;
//!
//! let progress = compute_progress("[20240101120000]").unwrap();
//! assert_eq!(progress.label(), "50.00%");
//! assert_eq!(progress.display_timestamp(), "2024-01-01 12:00:00");
//! ```
//!
//! # Error Handling
//!
//! Parsing returns [`Result<T, FormatError>`]:
//!
//! - **Length** - Not exactly 14 characters once brackets are stripped
//! - **NonNumeric** - Contains something other than ASCII digits
//! - **InvalidDateTime** - Digits do not name an existing date and time

use chrono::{
  Local,
  NaiveDateTime,
  Timelike,
};
use thiserror::Error;

/// Width of a timestamp token without brackets.
pub const TOKEN_DIGITS: usize = 14;

pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// `chrono` pattern of the bare 14-digit token.
pub const TOKEN_FORMAT: &str = "%Y%m%d%H%M%S";

/// `chrono` pattern of the human-readable form shown in tooltips.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub type Result<T> = std::result::Result<T, FormatError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatError {
  #[error("timestamp {token:?} has {len} characters, expected {TOKEN_DIGITS}")]
  Length { token: String, len: usize },
  #[error("timestamp {token:?} contains non-digit characters")]
  NonNumeric { token: String },
  #[error("timestamp {token:?} is not a valid date and time")]
  InvalidDateTime { token: String },
}

/// How far through its day a parsed timestamp falls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayProgress {
  moment:  NaiveDateTime,
  seconds: u32,
}

impl DayProgress {
  pub fn new(moment: NaiveDateTime) -> Self {
    Self {
      moment,
      seconds: moment.time().num_seconds_from_midnight(),
    }
  }

  pub fn moment(&self) -> NaiveDateTime {
    self.moment
  }

  /// Wall-clock seconds elapsed since local midnight.
  pub fn seconds_since_midnight(&self) -> u32 {
    self.seconds
  }

  /// Full precision percentage, always in `[0, 100)`.
  pub fn percentage(&self) -> f64 {
    f64::from(self.seconds) / f64::from(SECONDS_PER_DAY) * 100.0
  }

  /// Percentage in hundredths of a percent, truncated.
  pub fn hundredths(&self) -> u32 {
    (u64::from(self.seconds) * 10_000 / u64::from(SECONDS_PER_DAY)) as u32
  }

  /// Two-decimal label such as `"99.99%"`.
  ///
  /// The value is truncated, so the last second of a day never reads as
  /// `100.00%`.
  pub fn label(&self) -> String {
    let hundredths = self.hundredths();
    format!("{}.{:02}%", hundredths / 100, hundredths % 100)
  }

  /// The moment formatted as `YYYY-MM-DD HH:mm:ss`.
  pub fn display_timestamp(&self) -> String {
    self.moment.format(DISPLAY_FORMAT).to_string()
  }
}

/// Removes at most one leading `[` and at most one trailing `]`.
pub fn strip_brackets(token: &str) -> &str {
  let token = token.strip_prefix('[').unwrap_or(token);
  token.strip_suffix(']').unwrap_or(token)
}

/// Parses a (possibly bracketed) token strictly as `YYYYMMDDHHmmss`.
pub fn parse_timestamp(token: &str) -> Result<NaiveDateTime> {
  let digits = strip_brackets(token);

  let len = digits.chars().count();
  if len != TOKEN_DIGITS {
    return Err(FormatError::Length {
      token: token.to_string(),
      len,
    });
  }
  if !digits.bytes().all(|b| b.is_ascii_digit()) {
    return Err(FormatError::NonNumeric {
      token: token.to_string(),
    });
  }

  // chrono rejects out-of-range fields such as month 13 or February 30.
  NaiveDateTime::parse_from_str(digits, TOKEN_FORMAT).map_err(|_| {
    FormatError::InvalidDateTime {
      token: token.to_string(),
    }
  })
}

/// Computes the day progress of a timestamp token.
pub fn compute_progress(token: &str) -> Result<DayProgress> {
  parse_timestamp(token).map(DayProgress::new)
}

/// Formats a moment as a bare 14-digit token.
pub fn format_timestamp(moment: &NaiveDateTime) -> String {
  moment.format(TOKEN_FORMAT).to_string()
}

/// The current local time as a bare 14-digit token.
pub fn now_timestamp() -> String {
  format_timestamp(&Local::now().naive_local())
}
