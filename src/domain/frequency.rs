//! Frequency-scoped key derivation.
//!
//! Every counter and renderer is addressed by a key name built from an entity
//! root, an aggregation frequency and the calendar bucket the date falls in:
//!
//! ```text
//! root|daily|2024-01-15
//! root|weekly|2024|3        (ISO year, ISO week)
//! root|monthly|2024|1
//! ```
//!
//! The frequency is embedded in the key, so daily, weekly and monthly records
//! for the same root never collide.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between key segments. Must never appear in an entity root.
pub const KEY_DELIMITER: char = '|';

/// Errors raised while building or parsing key names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("Invalid frequency given for key name: {0}")]
    InvalidFrequency(String),

    #[error("Key root {0:?} contains the reserved delimiter '|'")]
    DelimiterInRoot(String),

    #[error("Malformed key name: {0:?}")]
    Malformed(String),
}

/// Aggregation granularity of a counter or renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub const ALL: [Frequency; 3] = [Frequency::Daily, Frequency::Weekly, Frequency::Monthly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }

    /// The two other frequencies in the order renderers are searched as a
    /// fallback source.
    pub fn siblings(&self) -> [Frequency; 2] {
        match self {
            Frequency::Daily => [Frequency::Monthly, Frequency::Weekly],
            Frequency::Weekly => [Frequency::Daily, Frequency::Monthly],
            Frequency::Monthly => [Frequency::Daily, Frequency::Weekly],
        }
    }

    /// Maps a date onto the bucket this frequency aggregates it into.
    pub fn bucket(&self, date: NaiveDate) -> DateBucket {
        match self {
            Frequency::Daily => DateBucket::Day(date),
            Frequency::Weekly => {
                let iso = date.iso_week();
                DateBucket::Week {
                    year: iso.year(),
                    week: iso.week(),
                }
            }
            Frequency::Monthly => DateBucket::Month {
                year: date.year(),
                month: date.month(),
            },
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(KeyError::InvalidFrequency(other.to_string())),
        }
    }
}

/// Calendar bucket a record aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateBucket {
    Day(NaiveDate),
    Week { year: i32, week: u32 },
    Month { year: i32, month: u32 },
}

impl DateBucket {
    fn segments(&self) -> Vec<String> {
        match self {
            DateBucket::Day(day) => vec![day.to_string()],
            DateBucket::Week { year, week } => vec![year.to_string(), week.to_string()],
            DateBucket::Month { year, month } => vec![year.to_string(), month.to_string()],
        }
    }
}

/// Identity shared by every frequency-scoped record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrequencyKey {
    root: String,
    frequency: Frequency,
    bucket: DateBucket,
}

impl FrequencyKey {
    /// Builds a key for `root` at the bucket of `date`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::DelimiterInRoot`] if the root contains `|`.
    pub fn new(root: &str, frequency: Frequency, date: NaiveDate) -> Result<Self, KeyError> {
        if root.contains(KEY_DELIMITER) {
            return Err(KeyError::DelimiterInRoot(root.to_string()));
        }

        Ok(Self {
            root: root.to_string(),
            frequency,
            bucket: frequency.bucket(date),
        })
    }

    /// Reconstructs a key from its key name.
    pub fn parse(key_name: &str) -> Result<Self, KeyError> {
        let malformed = || KeyError::Malformed(key_name.to_string());
        let parts: Vec<&str> = key_name.split(KEY_DELIMITER).collect();

        let (root, frequency) = match parts.as_slice() {
            [root, frequency, ..] if !root.is_empty() => (*root, frequency.parse::<Frequency>()?),
            _ => return Err(malformed()),
        };

        let bucket = match (frequency, &parts[2..]) {
            (Frequency::Daily, [day]) => {
                DateBucket::Day(day.parse::<NaiveDate>().map_err(|_| malformed())?)
            }
            (Frequency::Weekly, [year, week]) => DateBucket::Week {
                year: year.parse().map_err(|_| malformed())?,
                week: week.parse().map_err(|_| malformed())?,
            },
            (Frequency::Monthly, [year, month]) => DateBucket::Month {
                year: year.parse().map_err(|_| malformed())?,
                month: month.parse().map_err(|_| malformed())?,
            },
            _ => return Err(malformed()),
        };

        Ok(Self {
            root: root.to_string(),
            frequency,
            bucket,
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn bucket(&self) -> DateBucket {
        self.bucket
    }

    pub fn key_name(&self) -> String {
        let mut segments = vec![self.root.clone(), self.frequency.to_string()];
        segments.extend(self.bucket.segments());
        segments.join(&KEY_DELIMITER.to_string())
    }

    pub fn day(&self) -> Option<NaiveDate> {
        match self.bucket {
            DateBucket::Day(day) => Some(day),
            _ => None,
        }
    }

    pub fn week(&self) -> Option<u32> {
        match self.bucket {
            DateBucket::Week { week, .. } => Some(week),
            _ => None,
        }
    }

    pub fn month(&self) -> Option<u32> {
        match self.bucket {
            DateBucket::Month { month, .. } => Some(month),
            _ => None,
        }
    }

    /// Year of a weekly (ISO year) or monthly bucket.
    pub fn year(&self) -> Option<i32> {
        match self.bucket {
            DateBucket::Week { year, .. } | DateBucket::Month { year, .. } => Some(year),
            DateBucket::Day(_) => None,
        }
    }
}

impl fmt::Display for FrequencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key_name())
    }
}

/// Derives the key name for `root` at `frequency` and `date`.
///
/// # Errors
///
/// Returns [`KeyError::InvalidFrequency`] if `frequency` is not one of
/// `daily`, `weekly` or `monthly`, and [`KeyError::DelimiterInRoot`] if the
/// root contains the delimiter.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use mention_tracker::domain::frequency::build_key_name;
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// assert_eq!(build_key_name("B00X", "weekly", date).unwrap(), "B00X|weekly|2024|3");
/// ```
pub fn build_key_name(root: &str, frequency: &str, date: NaiveDate) -> Result<String, KeyError> {
    let frequency = frequency.parse::<Frequency>()?;
    Ok(FrequencyKey::new(root, frequency, date)?.key_name())
}

/// Extracts the frequency segment of a key name.
pub fn frequency_from_key_name(key_name: &str) -> Result<Frequency, KeyError> {
    key_name
        .split(KEY_DELIMITER)
        .nth(1)
        .ok_or_else(|| KeyError::Malformed(key_name.to_string()))?
        .parse()
}

/// Extracts the root segment of a key name.
pub fn key_root(key_name: &str) -> Result<&str, KeyError> {
    match key_name.split(KEY_DELIMITER).next() {
        Some(root) if !root.is_empty() && key_name.contains(KEY_DELIMITER) => Ok(root),
        _ => Err(KeyError::Malformed(key_name.to_string())),
    }
}
