use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// One repository action as served on `GET /events`.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub action: Action,
    pub author: String,
    pub to_branch: String,
    #[serde(default)]
    pub from_branch: Option<String>,
    pub timestamp: Timestamp,
}

#[derive(
    Serialize, Deserialize, Debug, Eq, PartialEq, Clone, Hash, strum::EnumString,
)]
#[serde(from = "String", into = "String")]
pub enum Action {
    #[strum(serialize = "PUSH")]
    Push,
    #[strum(serialize = "PULL_REQUEST")]
    PullRequest,
    #[strum(serialize = "MERGE")]
    Merge,
    /// Anything else the server sends, kept as-is.
    #[strum(default)]
    Unknown(String),
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::Push => "PUSH",
            Action::PullRequest => "PULL_REQUEST",
            Action::Merge => "MERGE",
            Action::Unknown(raw) => raw,
        }
    }
}

impl From<String> for Action {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(Action::Unknown(value))
    }
}

impl From<Action> for String {
    fn from(value: Action) -> Self {
        match value {
            Action::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instant as it was transmitted: epoch millis or a date string.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(#[serde(deserialize_with = "deserialize_millis")] i64),
    Text(String),
}

/// Fractional and exponent-form numbers are truncated toward zero.
fn deserialize_millis<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<i64, D::Error> {
    struct MillisVisitor;

    impl de::Visitor<'_> for MillisVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("epoch milliseconds")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::custom("epoch millis out of range"))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            let millis = v.trunc();
            if millis.is_finite()
                && millis >= i64::MIN as f64
                && millis < i64::MAX as f64
            {
                Ok(millis as i64)
            } else {
                Err(E::custom("epoch millis out of range"))
            }
        }
    }

    deserializer.deserialize_any(MillisVisitor)
}

impl Timestamp {
    /// `None` when the value is out of range or the text is in no known
    /// format.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Millis(millis) => DateTime::from_timestamp_millis(*millis),
            Timestamp::Text(text) => parse_text(text),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Timestamp::Text(value.to_rfc3339())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Millis(millis) => write!(f, "{}", millis),
            Timestamp::Text(text) => f.write_str(text),
        }
    }
}

fn parse_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }
    if let Ok(instant) = DateTime::parse_from_rfc2822(text) {
        return Some(instant.with_timezone(&Utc));
    }

    // zone-less values are UTC
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}
