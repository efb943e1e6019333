//! User-facing timer settings.
//!
//! Settings travel inside the persisted record under `state.settings`, so the
//! field names follow that record's camelCase schema. Every field carries its
//! own default: a record written before a field existed loads with that
//! field's default instead of failing.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const MAX_DURATION_MIN: u32 = 180;
pub const MAX_LONG_BREAK_INTERVAL: u32 = 12;
pub const MAX_VOLUME: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_work_duration")]
    pub work_duration: u32,
    #[serde(default = "default_short_break")]
    pub short_break_duration: u32,
    #[serde(default = "default_long_break")]
    pub long_break_duration: u32,
    /// Completed work sessions between long breaks.
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
    #[serde(default = "default_true")]
    pub enable_notifications: bool,
    #[serde(default = "default_true")]
    pub enable_sounds: bool,
    #[serde(default = "default_volume")]
    pub sound_volume: u32,
    #[serde(default)]
    pub auto_start_breaks: bool,
    #[serde(default)]
    pub auto_start_pomodoros: bool,
}

fn default_work_duration() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_long_break_interval() -> u32 {
    4
}
fn default_true() -> bool {
    true
}
fn default_volume() -> u32 {
    50
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_duration: default_work_duration(),
            short_break_duration: default_short_break(),
            long_break_duration: default_long_break(),
            long_break_interval: default_long_break_interval(),
            enable_notifications: true,
            enable_sounds: true,
            sound_volume: default_volume(),
            auto_start_breaks: false,
            auto_start_pomodoros: false,
        }
    }
}

impl Settings {
    /// Check every numeric field against its allowed range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("workDuration", self.work_duration),
            ("shortBreakDuration", self.short_break_duration),
            ("longBreakDuration", self.long_break_duration),
        ] {
            check_range(field, value, 1, MAX_DURATION_MIN)?;
        }
        check_range(
            "longBreakInterval",
            self.long_break_interval,
            1,
            MAX_LONG_BREAK_INTERVAL,
        )?;
        check_range("soundVolume", self.sound_volume, 0, MAX_VOLUME)?;
        Ok(())
    }

    /// Replace every out-of-range field with its default, keeping the rest.
    pub fn sanitized(self) -> Settings {
        let d = Settings::default();
        let within = |v: u32, min: u32, max: u32, fallback: u32| {
            if (min..=max).contains(&v) {
                v
            } else {
                fallback
            }
        };
        Settings {
            work_duration: within(self.work_duration, 1, MAX_DURATION_MIN, d.work_duration),
            short_break_duration: within(
                self.short_break_duration,
                1,
                MAX_DURATION_MIN,
                d.short_break_duration,
            ),
            long_break_duration: within(
                self.long_break_duration,
                1,
                MAX_DURATION_MIN,
                d.long_break_duration,
            ),
            long_break_interval: within(
                self.long_break_interval,
                1,
                MAX_LONG_BREAK_INTERVAL,
                d.long_break_interval,
            ),
            sound_volume: within(self.sound_volume, 0, MAX_VOLUME, d.sound_volume),
            ..self
        }
    }

    /// Get a setting as a string by its record key (e.g. `workDuration`).
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        json.get(key).map(|v| v.to_string())
    }

    /// Return a copy with `key` set to `value`, parsed according to the
    /// field's current type and validated.
    pub fn with_value(&self, key: &str, value: &str) -> Result<Settings, ValidationError> {
        let mut json = serde_json::to_value(self).map_err(|e| invalid(key, e.to_string()))?;
        let obj = json
            .as_object_mut()
            .ok_or_else(|| ValidationError::UnknownSetting(key.to_string()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| ValidationError::UnknownSetting(key.to_string()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => value
                .trim()
                .parse::<bool>()
                .map(serde_json::Value::Bool)
                .map_err(|_| invalid(key, format!("expected true or false, got '{value}'")))?,
            serde_json::Value::Number(_) => value
                .trim()
                .parse::<u32>()
                .map(|n| serde_json::Value::Number(n.into()))
                .map_err(|_| invalid(key, format!("expected a whole number, got '{value}'")))?,
            _ => return Err(ValidationError::UnknownSetting(key.to_string())),
        };
        obj.insert(key.to_string(), new_value);

        let updated: Settings =
            serde_json::from_value(json).map_err(|e| invalid(key, e.to_string()))?;
        updated.validate()?;
        Ok(updated)
    }

    /// Record keys accepted by [`Settings::with_value`].
    pub fn keys() -> Vec<String> {
        match serde_json::to_value(Settings::default()) {
            Ok(serde_json::Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

fn check_range(field: &str, value: u32, min: u32, max: u32) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(invalid(field, format!("must be between {min} and {max}, got {value}")));
    }
    Ok(())
}

fn invalid(field: &str, message: String) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_pomodoro() {
        let s = Settings::default();
        assert_eq!(s.work_duration, 25);
        assert_eq!(s.short_break_duration, 5);
        assert_eq!(s.long_break_duration, 15);
        assert_eq!(s.long_break_interval, 4);
        assert_eq!(s.sound_volume, 50);
        assert!(s.enable_notifications);
        assert!(!s.auto_start_breaks);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let s: Settings = serde_json::from_str(r#"{"workDuration": 50}"#).unwrap();
        assert_eq!(s.work_duration, 50);
        assert_eq!(s.long_break_interval, 4);
        assert!(s.enable_sounds);
        assert!(!s.auto_start_pomodoros);
    }

    #[test]
    fn with_value_parses_by_field_type() {
        let s = Settings::default()
            .with_value("autoStartBreaks", "true")
            .unwrap()
            .with_value("workDuration", "45")
            .unwrap();
        assert!(s.auto_start_breaks);
        assert_eq!(s.work_duration, 45);
    }

    #[test]
    fn with_value_rejects_unknown_and_bad_input() {
        let s = Settings::default();
        assert_eq!(
            s.with_value("theme", "dark"),
            Err(ValidationError::UnknownSetting("theme".into()))
        );
        assert!(s.with_value("enableSounds", "loud").is_err());
        assert!(s.with_value("workDuration", "-3").is_err());
    }

    #[test]
    fn with_value_enforces_ranges() {
        let s = Settings::default();
        assert!(s.with_value("longBreakInterval", "0").is_err());
        assert!(s.with_value("soundVolume", "101").is_err());
        assert!(s.with_value("workDuration", "0").is_err());
        assert!(s.with_value("soundVolume", "0").is_ok());
    }

    #[test]
    fn sanitized_replaces_only_bad_fields() {
        let s = Settings {
            work_duration: 50,
            long_break_interval: 0,
            sound_volume: 400,
            auto_start_breaks: true,
            ..Settings::default()
        }
        .sanitized();
        assert_eq!(s.work_duration, 50);
        assert_eq!(s.long_break_interval, 4);
        assert_eq!(s.sound_volume, 50);
        assert!(s.auto_start_breaks);
    }

    #[test]
    fn get_reads_record_keys() {
        let s = Settings::default();
        assert_eq!(s.get("shortBreakDuration").as_deref(), Some("5"));
        assert_eq!(s.get("enableNotifications").as_deref(), Some("true"));
        assert!(s.get("nope").is_none());
        assert_eq!(Settings::keys().len(), 9);
    }
}
