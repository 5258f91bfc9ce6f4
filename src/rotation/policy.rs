//! Grandfather-father-son retention policy

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::{StashError, StashResult};

/// How many daily/weekly/monthly/yearly backups to keep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationPolicy {
    #[serde(default)]
    pub days: u32,
    #[serde(default)]
    pub weeks: u32,
    #[serde(default)]
    pub months: u32,
    #[serde(default)]
    pub years: u32,
    /// Day weekly buckets start on
    #[serde(default = "default_first_week_day")]
    pub first_week_day: Weekday,
}

fn default_first_week_day() -> Weekday {
    Weekday::Sat
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            days: 0,
            weeks: 0,
            months: 0,
            years: 0,
            first_week_day: default_first_week_day(),
        }
    }
}

impl RotationPolicy {
    pub fn new(days: u32, weeks: u32, months: u32, years: u32) -> Self {
        Self {
            days,
            weeks,
            months,
            years,
            ..Self::default()
        }
    }

    pub fn with_first_week_day(mut self, day: Weekday) -> Self {
        self.first_week_day = day;
        self
    }

    /// True when every count is zero
    pub fn is_empty(&self) -> bool {
        self.days == 0 && self.weeks == 0 && self.months == 0 && self.years == 0
    }

    /// A policy that keeps nothing would expire every backup
    pub fn validate(&self) -> StashResult<()> {
        if self.is_empty() {
            return Err(StashError::PolicyViolation(
                "all retention counts are zero; refusing to expire every backup".into(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for RotationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} daily, {} weekly, {} monthly, {} yearly (weeks start {})",
            self.days, self.weeks, self.months, self.years, self.first_week_day
        )
    }
}
