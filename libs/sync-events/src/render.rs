use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, Utc};
use entity::prelude::*;

/// `11/14/2023, 10:13:20 PM`
pub const TIMESTAMP_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Zone the viewer reads timestamps in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Zone {
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl Zone {
    pub fn format(&self, instant: DateTime<Utc>) -> String {
        match self {
            Zone::Local => instant.with_timezone(&Local).format(TIMESTAMP_FORMAT),
            Zone::Utc => instant.format(TIMESTAMP_FORMAT),
            Zone::Fixed(offset) => {
                instant.with_timezone(offset).format(TIMESTAMP_FORMAT)
            }
        }
        .to_string()
    }
}

impl FromStr for Zone {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Zone::Local),
            "utc" | "z" => Ok(Zone::Utc),
            offset => offset.parse::<FixedOffset>().map(Zone::Fixed),
        }
    }
}

/// Why an event produced no description.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Skipped {
    #[error("unrecognized action {0}")]
    UnknownAction(String),

    #[error("{0} event without from_branch")]
    MissingFromBranch(EventAction),
}

/// Text that can't be read as an instant is shown as sent.
pub fn format_timestamp(timestamp: &Timestamp, zone: Zone) -> String {
    match timestamp.instant() {
        Some(instant) => zone.format(instant),
        None => timestamp.to_string(),
    }
}

pub fn describe(event: &EventEntity, zone: Zone) -> Result<String, Skipped> {
    let when = || format_timestamp(&event.timestamp, zone);

    match &event.action {
        EventAction::Push => Ok(format!(
            "{} pushed to {} on {}",
            event.author,
            event.to_branch,
            when()
        )),
        EventAction::PullRequest => Ok(format!(
            "{} submitted a pull request from {} to {} on {}",
            event.author,
            from_branch(event)?,
            event.to_branch,
            when()
        )),
        EventAction::Merge => Ok(format!(
            "{} merged branch {} to {} on {}",
            event.author,
            from_branch(event)?,
            event.to_branch,
            when()
        )),
        EventAction::Unknown(raw) => Err(Skipped::UnknownAction(raw.clone())),
    }
}

fn from_branch(event: &EventEntity) -> Result<&str, Skipped> {
    event
        .from_branch
        .as_deref()
        .ok_or_else(|| Skipped::MissingFromBranch(event.action.clone()))
}

#[cfg(test)]
mod test {
    use chrono::{FixedOffset, TimeZone, Utc};
    use entity::prelude::*;

    use super::{describe, format_timestamp, Skipped, Zone};

    fn event(
        action: EventAction,
        author: &str,
        from_branch: Option<&str>,
    ) -> EventEntity {
        EventEntity {
            request_id: None,
            action,
            author: author.to_string(),
            to_branch: "main".to_string(),
            from_branch: from_branch.map(str::to_string),
            timestamp: Timestamp::Millis(1700000000000),
        }
    }

    #[test]
    fn test_describe_push() {
        let text = describe(&event(EventAction::Push, "alice", None), Zone::Utc);

        assert_eq!(
            text.unwrap(),
            "alice pushed to main on 11/14/2023, 10:13:20 PM"
        );
    }

    #[test]
    fn test_describe_pull_request() {
        let text = describe(
            &event(EventAction::PullRequest, "bob", Some("feature")),
            Zone::Utc,
        );

        assert_eq!(
            text.unwrap(),
            "bob submitted a pull request from feature to main on 11/14/2023, 10:13:20 PM"
        );
    }

    #[test]
    fn test_describe_merge() {
        let text = describe(
            &event(EventAction::Merge, "carol", Some("feature")),
            Zone::Utc,
        );

        assert_eq!(
            text.unwrap(),
            "carol merged branch feature to main on 11/14/2023, 10:13:20 PM"
        );
    }

    #[test]
    fn test_describe_push_ignores_from_branch() {
        let text = describe(
            &event(EventAction::Push, "alice", Some("feature")),
            Zone::Utc,
        );

        assert_eq!(
            text.unwrap(),
            "alice pushed to main on 11/14/2023, 10:13:20 PM"
        );
    }

    #[test]
    fn test_describe_skips() {
        let unknown = describe(
            &event(EventAction::Unknown("DELETE".to_string()), "dave", None),
            Zone::Utc,
        );
        let missing = describe(&event(EventAction::Merge, "carol", None), Zone::Utc);

        assert_eq!(unknown, Err(Skipped::UnknownAction("DELETE".to_string())));
        assert_eq!(missing, Err(Skipped::MissingFromBranch(EventAction::Merge)));
    }

    #[test]
    fn test_format_timestamp_in_fixed_zone() {
        let tokyo = Zone::Fixed(FixedOffset::east_opt(9 * 3600).unwrap());
        let instant: Timestamp =
            Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap().into();

        assert_eq!(format_timestamp(&instant, tokyo), "11/15/2023, 7:13:20 AM");
        assert_eq!(
            format_timestamp(&instant, Zone::Utc),
            "11/14/2023, 10:13:20 PM"
        );
    }

    #[test]
    fn test_format_timestamp_local_matches_chrono_local() {
        let instant = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        let expected = instant
            .with_timezone(&chrono::Local)
            .format(super::TIMESTAMP_FORMAT)
            .to_string();

        assert_eq!(
            format_timestamp(&Timestamp::from(instant), Zone::Local),
            expected
        );
    }

    #[test]
    fn test_format_unreadable_timestamp_verbatim() {
        let timestamp = Timestamp::Text("sometime last week".to_string());

        assert_eq!(format_timestamp(&timestamp, Zone::Utc), "sometime last week");
    }

    #[test]
    fn test_zone_from_str() {
        assert_eq!("local".parse::<Zone>().unwrap(), Zone::Local);
        assert_eq!("UTC".parse::<Zone>().unwrap(), Zone::Utc);
        assert_eq!(
            "-05:00".parse::<Zone>().unwrap(),
            Zone::Fixed(FixedOffset::west_opt(5 * 3600).unwrap())
        );
        assert!("somewhere".parse::<Zone>().is_err());
    }
}
