//! Typed content models stored in the CMS
//!
//! Field names follow the data shape of the CMS models (`camelCase`).
//! Dates may arrive as RFC 3339 strings or epoch milliseconds.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

pub const MODEL_NEWS: &str = "nieuws";
pub const MODEL_ACTIVITY: &str = "activiteit";
pub const MODEL_ANNOUNCEMENT: &str = "aankondiging";
pub const MODEL_PAGE: &str = "page";

/// A record of any model as returned by the content API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry<T> {
    pub id: String,
    pub model: String,
    pub name: String,
    pub published: bool,
    pub data: T,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ContentEntry<Value> {
    /// Decode `data` into a typed model
    pub fn decode<T: serde::de::DeserializeOwned>(self) -> serde_json::Result<ContentEntry<T>> {
        let data = serde_json::from_value(self.data)?;
        Ok(ContentEntry {
            id: self.id,
            model: self.model,
            name: self.name,
            published: self.published,
            data,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, with = "flexible_datetime::option")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "flexible_datetime")]
    pub start: DateTime<Utc>,
    #[serde(default, with = "flexible_datetime::option")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl Activity {
    /// End of the activity, or its start when no end is set
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.end.unwrap_or(self.start)
    }

    /// First and last calendar day of the activity in the site timezone
    ///
    /// Date pickers store local midnight, which is the previous day in UTC.
    pub fn local_days(&self, tz: Tz) -> (NaiveDate, NaiveDate) {
        let first = self.start.with_timezone(&tz).date_naive();
        let last = self.effective_end().with_timezone(&tz).date_naive();
        (first, last.max(first))
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>, tz: Tz) -> bool {
        if self.all_day {
            self.local_days(tz).1 >= now.with_timezone(&tz).date_naive()
        } else {
            self.effective_end() >= now
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AnnouncementKind {
    #[default]
    Info,
    Warning,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub kind: AnnouncementKind,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, with = "flexible_datetime::option")]
    pub active_from: Option<DateTime<Utc>>,
    #[serde(default, with = "flexible_datetime::option")]
    pub active_until: Option<DateTime<Utc>>,
}

impl Announcement {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.active_from.is_none_or(|from| from <= now)
            && self.active_until.is_none_or(|until| now <= until)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub blocks: Value,
}

/// Accepts RFC 3339 strings and epoch milliseconds, writes RFC 3339
pub mod flexible_datetime {
    use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn parse(value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|d| d.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|d| d.and_utc())
                }),
            _ => None,
        }
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let value = Value::deserialize(d)?;
        parse(&value).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", value)))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => s.serialize_str(&v.to_rfc3339()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let value = Option::<Value>::deserialize(d)?;
            match value {
                None | Some(Value::Null) => Ok(None),
                Some(Value::String(s)) if s.is_empty() => Ok(None),
                Some(v) => parse(&v)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", v))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Brussels;
    use serde_json::json;

    #[test]
    fn test_activity_accepts_millis_and_strings() {
        let a: Activity = serde_json::from_value(json!({
            "title": "Spaghetti-avond",
            "start": 1728736800000i64,
            "end": "2024-10-12T16:00:00Z",
            "location": "Refter"
        }))
        .unwrap();
        assert_eq!(a.start, Utc.with_ymd_and_hms(2024, 10, 12, 12, 40, 0).unwrap());
        assert_eq!(a.end.unwrap(), Utc.with_ymd_and_hms(2024, 10, 12, 16, 0, 0).unwrap());
        assert!(!a.all_day);
    }

    #[test]
    fn test_date_only_string() {
        let a: Activity = serde_json::from_value(json!({
            "title": "Schoolfeest",
            "start": "2025-06-14",
            "allDay": true
        }))
        .unwrap();
        assert_eq!(a.start, Utc.with_ymd_and_hms(2025, 6, 14, 0, 0, 0).unwrap());
        assert!(a.is_upcoming(Utc.with_ymd_and_hms(2025, 6, 14, 20, 0, 0).unwrap(), Brussels));
        assert!(!a.is_upcoming(Utc.with_ymd_and_hms(2025, 6, 15, 0, 1, 0).unwrap(), Brussels));
    }

    #[test]
    fn test_local_midnight_stays_on_its_day() {
        // 12 Oct 2024 00:00 in Brussels is 11 Oct 22:00 UTC
        let a: Activity = serde_json::from_value(json!({
            "title": "Eetfestijn",
            "start": 1728684000000i64,
            "allDay": true
        }))
        .unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 10, 12).unwrap();
        assert_eq!(a.local_days(Brussels), (day, day));

        // 22:00 local on the 12th, still the day of the event
        assert!(a.is_upcoming(Utc.with_ymd_and_hms(2024, 10, 12, 20, 0, 0).unwrap(), Brussels));
        // 00:30 local on the 13th
        assert!(!a.is_upcoming(Utc.with_ymd_and_hms(2024, 10, 12, 22, 30, 0).unwrap(), Brussels));
    }

    #[test]
    fn test_announcement_window() {
        let ann: Announcement = serde_json::from_value(json!({
            "title": "Staking",
            "message": "Geen opvang",
            "kind": "urgent",
            "activeFrom": "2025-01-10T00:00:00Z",
            "activeUntil": "2025-01-11T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(ann.kind, AnnouncementKind::Urgent);
        assert!(ann.is_active(Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap()));
        assert!(!ann.is_active(Utc.with_ymd_and_hms(2025, 1, 12, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_decode_entry() {
        let entry = ContentEntry {
            id: "abc".into(),
            model: MODEL_NEWS.into(),
            name: "Nieuws".into(),
            published: true,
            data: json!({"title": "Welkom", "tags": ["school"]}),
            created_at: None,
            updated_at: None,
        };
        let typed: ContentEntry<NewsItem> = entry.decode().unwrap();
        assert_eq!(typed.data.title, "Welkom");
        assert_eq!(typed.data.tags, vec!["school"]);
        assert!(typed.data.published_at.is_none());
    }
}
