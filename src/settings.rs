//! Site settings and feature flags
//!
//! Settings live in `site_settings` as JSON values and are cached in memory
//! after start-up. Well known keys:
//!
//! - `decorations`: `{ "enabled": bool, "season": "auto" | <season> }`
//! - `feature.<name>`: bool feature flags, exposed to the public site

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Datelike, Days, NaiveDate};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{Display, EnumIter, EnumString};
use tracing::{info, warn};

use crate::errors::{Result, TalentenraadError};
use crate::storage::{NewAuditEntry, SeaOrmStorage, SiteSettingRecord};

pub const DECORATIONS_KEY: &str = "decorations";
pub const FEATURE_PREFIX: &str = "feature.";
const MAX_KEY_LEN: usize = 64;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Season {
    None,
    Winter,
    Spring,
    Summer,
    Autumn,
    Sinterklaas,
    Christmas,
    Carnival,
    Easter,
}

/// Easter Sunday (anonymous Gregorian algorithm)
fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

impl Season {
    /// Season shown automatically on `date`
    pub fn for_date(date: NaiveDate) -> Season {
        let (month, day) = (date.month(), date.day());

        if (month == 11 && day >= 15) || (month == 12 && day <= 6) {
            return Season::Sinterklaas;
        }
        if (month == 12 && day >= 7) || (month == 1 && day <= 6) {
            return Season::Christmas;
        }

        if let Some(easter) = easter_sunday(date.year()) {
            // Thursday before Carnival Sunday up to Ash Wednesday
            let carnival_start = easter.checked_sub_days(Days::new(52));
            let ash_wednesday = easter.checked_sub_days(Days::new(46));
            if let (Some(start), Some(end)) = (carnival_start, ash_wednesday)
                && date >= start
                && date <= end
            {
                return Season::Carnival;
            }
            // Palm Sunday up to Easter Monday
            let palm_sunday = easter.checked_sub_days(Days::new(7));
            let easter_monday = easter.checked_add_days(Days::new(1));
            if let (Some(start), Some(end)) = (palm_sunday, easter_monday)
                && date >= start
                && date <= end
            {
                return Season::Easter;
            }
        }

        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Autumn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalDecorations {
    pub enabled: bool,
    /// Effective season for the requested date
    pub season: Season,
    /// Whether the season follows the calendar
    pub automatic: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicSettings {
    pub decorations: SeasonalDecorations,
    pub features: BTreeMap<String, bool>,
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(TalentenraadError::validation(format!(
            "Invalid setting key '{}': use a-z, 0-9, '.', '_' or '-' (max {})",
            key, MAX_KEY_LEN
        )))
    }
}

/// Values of well known keys must have the right shape
fn validate_value(key: &str, value: &Value) -> Result<()> {
    if key.starts_with(FEATURE_PREFIX) && !value.is_boolean() {
        return Err(TalentenraadError::validation(format!(
            "Feature flag '{}' must be a boolean",
            key
        )));
    }
    if key == DECORATIONS_KEY {
        let season = value.get("season").and_then(Value::as_str).unwrap_or("auto");
        if season != "auto" && season.parse::<Season>().is_err() {
            return Err(TalentenraadError::validation(format!(
                "Unknown season '{}'",
                season
            )));
        }
        if value.get("enabled").is_some_and(|v| !v.is_boolean()) {
            return Err(TalentenraadError::validation(
                "decorations.enabled must be a boolean".to_string(),
            ));
        }
    }
    Ok(())
}

pub struct SiteSettings {
    storage: Arc<SeaOrmStorage>,
    cache: RwLock<HashMap<String, Value>>,
}

impl SiteSettings {
    /// Load all settings into memory
    pub async fn load(storage: Arc<SeaOrmStorage>) -> Result<Self> {
        let records = storage.load_settings().await?;
        let cache: HashMap<String, Value> =
            records.into_iter().map(|r| (r.key, r.value)).collect();
        info!("Loaded {} site setting(s)", cache.len());
        Ok(Self {
            storage,
            cache: RwLock::new(cache),
        })
    }

    pub async fn reload(&self) -> Result<()> {
        let records = self.storage.load_settings().await?;
        *self.cache.write() = records.into_iter().map(|r| (r.key, r.value)).collect();
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.cache.read().get(key).cloned()
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.cache
            .read()
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    pub fn all(&self) -> BTreeMap<String, Value> {
        self.cache
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Persist, update the cache and audit
    pub async fn set(&self, key: &str, value: Value, actor: &str) -> Result<SiteSettingRecord> {
        validate_key(key)?;
        validate_value(key, &value)?;

        let previous = self.get(key);
        let record = self
            .storage
            .upsert_setting(key, value.clone(), Some(actor.to_string()))
            .await?;
        self.cache.write().insert(key.to_string(), value.clone());

        if let Err(e) = self
            .storage
            .record_audit(
                NewAuditEntry::new(actor, "settings.update", "setting")
                    .resource(key)
                    .details(json!({ "from": previous, "to": value })),
            )
            .await
        {
            warn!("Failed to write audit entry for setting '{}': {}", key, e);
        }
        info!("Setting '{}' updated by {}", key, actor);
        Ok(record)
    }

    pub fn feature_enabled(&self, flag: &str) -> bool {
        self.get_bool_or(&format!("{}{}", FEATURE_PREFIX, flag), false)
    }

    pub fn features(&self) -> BTreeMap<String, bool> {
        self.cache
            .read()
            .iter()
            .filter_map(|(k, v)| {
                let flag = k.strip_prefix(FEATURE_PREFIX)?;
                Some((flag.to_string(), v.as_bool()?))
            })
            .collect()
    }

    pub fn decorations(&self, today: NaiveDate) -> SeasonalDecorations {
        decorations_from(self.get(DECORATIONS_KEY).as_ref(), today)
    }

    pub fn public_view(&self, today: NaiveDate) -> PublicSettings {
        PublicSettings {
            decorations: self.decorations(today),
            features: self.features(),
        }
    }
}

fn decorations_from(value: Option<&Value>, today: NaiveDate) -> SeasonalDecorations {
    let enabled = value
        .and_then(|v| v.get("enabled"))
        .and_then(Value::as_bool)
        .unwrap_or(true);
    let fixed = value
        .and_then(|v| v.get("season"))
        .and_then(Value::as_str)
        .filter(|s| *s != "auto")
        .and_then(|s| s.parse::<Season>().ok());

    match (enabled, fixed) {
        (false, _) => SeasonalDecorations {
            enabled: false,
            season: Season::None,
            automatic: fixed.is_none(),
        },
        (true, Some(season)) => SeasonalDecorations {
            enabled: true,
            season,
            automatic: false,
        },
        (true, None) => SeasonalDecorations {
            enabled: true,
            season: Season::for_date(today),
            automatic: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_easter() {
        assert_eq!(easter_sunday(2024), Some(d(2024, 3, 31)));
        assert_eq!(easter_sunday(2025), Some(d(2025, 4, 20)));
        assert_eq!(easter_sunday(2026), Some(d(2026, 4, 5)));
    }

    #[test]
    fn test_season_for_date() {
        assert_eq!(Season::for_date(d(2024, 11, 20)), Season::Sinterklaas);
        assert_eq!(Season::for_date(d(2024, 12, 6)), Season::Sinterklaas);
        assert_eq!(Season::for_date(d(2024, 12, 24)), Season::Christmas);
        assert_eq!(Season::for_date(d(2025, 1, 3)), Season::Christmas);
        // carnival 2025: Easter 20/4 -> 27/2 .. 5/3
        assert_eq!(Season::for_date(d(2025, 3, 2)), Season::Carnival);
        assert_eq!(Season::for_date(d(2025, 4, 21)), Season::Easter);
        assert_eq!(Season::for_date(d(2025, 1, 20)), Season::Winter);
        assert_eq!(Season::for_date(d(2025, 5, 1)), Season::Spring);
        assert_eq!(Season::for_date(d(2025, 7, 14)), Season::Summer);
        assert_eq!(Season::for_date(d(2025, 10, 1)), Season::Autumn);
    }

    #[test]
    fn test_decorations_from_setting() {
        let today = d(2024, 12, 24);
        assert_eq!(decorations_from(None, today).season, Season::Christmas);

        let fixed = json!({"enabled": true, "season": "summer"});
        let deco = decorations_from(Some(&fixed), today);
        assert_eq!(deco.season, Season::Summer);
        assert!(!deco.automatic);

        let off = json!({"enabled": false});
        assert_eq!(decorations_from(Some(&off), today).season, Season::None);
    }

    #[test]
    fn test_key_and_value_validation() {
        assert!(validate_key("feature.volunteer_form").is_ok());
        assert!(validate_key("Feature").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_value("feature.x", &json!("yes")).is_err());
        assert!(validate_value("decorations", &json!({"season": "halloween"})).is_err());
        assert!(validate_value("decorations", &json!({"season": "auto", "enabled": true})).is_ok());
    }
}
