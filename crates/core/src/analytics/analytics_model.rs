//! Analytics domain models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::STATISTIC_PLACEHOLDERS;
use crate::errors::{Error, Result, ValidationError};

/// Requested output granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    #[default]
    Daily,
    Monthly,
    #[serde(alias = "seasonally")]
    Seasonal,
    Yearly,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "daily",
            Interval::Monthly => "monthly",
            Interval::Seasonal => "seasonal",
            Interval::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "daily" => Ok(Interval::Daily),
            "monthly" => Ok(Interval::Monthly),
            "seasonal" | "seasonally" => Ok(Interval::Seasonal),
            "yearly" => Ok(Interval::Yearly),
            other => Err(ValidationError::InvalidInput(format!("Unknown interval '{}'", other)).into()),
        }
    }
}

/// Descriptive statistic the engine can compute per column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatisticKind {
    Average,
    Sum,
    Maximum,
    Minimum,
    #[serde(rename = "Standard Deviation")]
    StandardDeviation,
}

impl StatisticKind {
    /// Output order of the statistics table.
    pub const ALL: [StatisticKind; 5] = [
        StatisticKind::Average,
        StatisticKind::Sum,
        StatisticKind::Maximum,
        StatisticKind::Minimum,
        StatisticKind::StandardDeviation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticKind::Average => "Average",
            StatisticKind::Sum => "Sum",
            StatisticKind::Maximum => "Maximum",
            StatisticKind::Minimum => "Minimum",
            StatisticKind::StandardDeviation => "Standard Deviation",
        }
    }

    /// Whether the statistic carries the date at which it was observed.
    pub fn is_extreme(&self) -> bool {
        matches!(self, StatisticKind::Maximum | StatisticKind::Minimum)
    }

    /// Parses a client-supplied list, ignoring the "no statistics"
    /// placeholders and duplicates.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<StatisticKind>> {
        let mut kinds = Vec::new();
        for name in names {
            let name = name.as_ref();
            if STATISTIC_PLACEHOLDERS.contains(&name) {
                continue;
            }
            let kind: StatisticKind = name.parse()?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }
}

impl fmt::Display for StatisticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatisticKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        StatisticKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                ValidationError::InvalidInput(format!("Unknown statistic '{}'", s)).into()
            })
    }
}
