//! Calendar-day keys for the daily quota counters.
//!
//! All day keys are derived here so that every component agrees on the
//! format (`YYYY-MM-DD`, UTC). The basis is chosen by the caller: quota
//! accounting keys a job by its scheduled time, not by wall-clock now.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;
use crate::job::VideoJob;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Which timestamp of a job a day key is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBasis {
    /// The instant the job is meant to post.
    ScheduledAt,
    /// The instant the job was admitted.
    CreatedAt,
}

/// A UTC calendar date in `YYYY-MM-DD` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(String);

impl DayKey {
    /// Day key of an arbitrary instant.
    pub fn from_timestamp(ts: DateTime<Utc>) -> Self {
        Self(ts.format(DAY_FORMAT).to_string())
    }

    /// Day key of a job, using the requested basis.
    pub fn for_job(job: &VideoJob, basis: DayBasis) -> Self {
        match basis {
            DayBasis::ScheduledAt => Self::from_timestamp(job.scheduled_at),
            DayBasis::CreatedAt => Self::from_timestamp(job.created_at),
        }
    }

    /// Day key of the current UTC date.
    pub fn today() -> Self {
        Self::from_timestamp(Utc::now())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DayKey {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = NaiveDate::parse_from_str(s, DAY_FORMAT)
            .map_err(|_| ModelError::InvalidDayKey(s.to_string()))?;
        Ok(Self(date.format(DAY_FORMAT).to_string()))
    }
}
