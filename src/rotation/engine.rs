//! Grandfather-father-son classification
//!
//! For each period with a non-zero count `n`, the window starts at the
//! period containing `now` moved back `n - 1` periods. Within
//! `[window start, now]` the oldest backup of every period bucket is kept.
//! Backups dated after `now` are always kept. Everything not kept by some
//! period expires.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::Serialize;

use super::policy::RotationPolicy;
use crate::error::StashResult;
use crate::models::BackupRecord;

/// Why a backup survived rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeepReason {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Dated after the rotation time
    Future,
}

impl fmt::Display for KeepReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Yearly => write!(f, "yearly"),
            Self::Future => write!(f, "future"),
        }
    }
}

/// A backup kept by the plan and the periods that kept it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeptRecord {
    pub record: BackupRecord,
    pub reasons: Vec<KeepReason>,
}

/// Outcome of classifying a set of backups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationPlan {
    pub keep: Vec<KeptRecord>,
    pub expire: Vec<BackupRecord>,
}

impl RotationPlan {
    pub fn is_noop(&self) -> bool {
        self.expire.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum Period {
    Day,
    Week(Weekday),
    Month,
    Year,
}

impl Period {
    fn reason(&self) -> KeepReason {
        match self {
            Self::Day => KeepReason::Daily,
            Self::Week(_) => KeepReason::Weekly,
            Self::Month => KeepReason::Monthly,
            Self::Year => KeepReason::Yearly,
        }
    }

    /// First day of the bucket containing `date`
    fn bucket(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week(first) => {
                let offset = (date.weekday().num_days_from_monday() + 7
                    - first.num_days_from_monday())
                    % 7;
                date - Duration::days(offset as i64)
            }
            Self::Month => date.with_day(1).unwrap_or(date),
            Self::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        }
    }

    /// First day of the window keeping `count` buckets, ending at `today`'s
    /// bucket; `None` when the window reaches past the calendar
    fn window_start(&self, today: NaiveDate, count: u32) -> Option<NaiveDate> {
        let back = count.saturating_sub(1) as i64;
        let current = self.bucket(today);
        match self {
            Self::Day => current.checked_sub_signed(Duration::try_days(back)?),
            Self::Week(_) => current.checked_sub_signed(Duration::try_weeks(back)?),
            Self::Month => {
                let index = current.year() as i64 * 12 + current.month0() as i64 - back;
                let year = i32::try_from(index.div_euclid(12)).ok()?;
                NaiveDate::from_ymd_opt(year, index.rem_euclid(12) as u32 + 1, 1)
            }
            Self::Year => {
                let year = i32::try_from(current.year() as i64 - back).ok()?;
                NaiveDate::from_ymd_opt(year, 1, 1)
            }
        }
    }
}

/// Classify `records` against `policy` as of `now`
pub fn plan(
    policy: &RotationPolicy,
    records: &[BackupRecord],
    now: DateTime<Utc>,
) -> StashResult<RotationPlan> {
    policy.validate()?;

    let mut ordered: Vec<&BackupRecord> = records.iter().collect();
    ordered.sort_by(|a, b| a.order(b));

    let mut reasons: HashMap<&str, Vec<KeepReason>> = HashMap::new();
    for &record in &ordered {
        if record.created_at > now {
            reasons
                .entry(record.stored_name.as_str())
                .or_default()
                .push(KeepReason::Future);
        }
    }

    let periods = [
        (Period::Day, policy.days),
        (Period::Week(policy.first_week_day), policy.weeks),
        (Period::Month, policy.months),
        (Period::Year, policy.years),
    ];

    let today = now.date_naive();
    for (period, count) in periods {
        if count == 0 {
            continue;
        }
        let start = period.window_start(today, count);

        let mut oldest_per_bucket: BTreeMap<NaiveDate, &BackupRecord> = BTreeMap::new();
        for &record in &ordered {
            if record.created_at > now {
                continue;
            }
            let date = record.created_at.date_naive();
            if start.is_some_and(|start| date < start) {
                continue;
            }
            oldest_per_bucket.entry(period.bucket(date)).or_insert(record);
        }

        for &record in oldest_per_bucket.values() {
            reasons
                .entry(record.stored_name.as_str())
                .or_default()
                .push(period.reason());
        }
    }

    let mut result = RotationPlan::default();
    for record in ordered {
        match reasons.remove(record.stored_name.as_str()) {
            Some(mut why) => {
                why.sort();
                why.dedup();
                result.keep.push(KeptRecord {
                    record: record.clone(),
                    reasons: why,
                });
            }
            None => result.expire.push(record.clone()),
        }
    }
    Ok(result)
}
