//! Observation and time types

use crate::error::{Error, Result};
use crate::mask::Masked;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Milliseconds since 1970-01-01T00:00:00Z
pub type Timestamp = i64;

/// Milliseconds in one day
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Grid location as (row, col)
pub type Location = (usize, usize);

/// Orbit direction of the acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Pass {
    Ascending,
    Descending,
}

impl FromStr for Pass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ascending" | "asc" => Ok(Pass::Ascending),
            "descending" | "desc" => Ok(Pass::Descending),
            _ => Err(Error::invalid_parameter(
                "pass",
                s,
                "expected ASCENDING or DESCENDING",
            )),
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Ascending => f.write_str("ASCENDING"),
            Pass::Descending => f.write_str("DESCENDING"),
        }
    }
}

/// Polarization channel of a scene band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Polarization {
    #[default]
    VV,
    VH,
}

impl FromStr for Polarization {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "VV" => Ok(Polarization::VV),
            "VH" => Ok(Polarization::VH),
            _ => Err(Error::invalid_parameter("polarization", s, "expected VV or VH")),
        }
    }
}

impl fmt::Display for Polarization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarization::VV => f.write_str("VV"),
            Polarization::VH => f.write_str("VH"),
        }
    }
}

/// One backscatter measurement at one location.
///
/// `value` is sigma0 in decibels. A masked value marks the observation as
/// invalid at this location without removing it from the series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub timestamp: Timestamp,
    pub value: Masked,
    pub pass: Pass,
}

impl Observation {
    /// A valid observation (masked if `value` is not finite)
    pub fn new(timestamp: Timestamp, value: f64, pass: Pass) -> Self {
        Self {
            timestamp,
            value: Masked::new(value),
            pass,
        }
    }

    /// Whether the value is valid
    pub fn is_valid(&self) -> bool {
        self.value.is_valid()
    }

    /// Same observation with its value masked
    pub fn masked(self) -> Self {
        Self {
            value: Masked::MASKED,
            ..self
        }
    }

    /// Same observation with a replaced value
    pub fn with_value(self, value: Masked) -> Self {
        Self { value, ..self }
    }
}

/// Half-open time range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl DateRange {
    /// Create a range; `start` must precede `end`
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self> {
        if start >= end {
            return Err(Error::invalid_parameter(
                "date_range",
                format!("[{start}, {end})"),
                "start must precede end",
            ));
        }
        Ok(Self { start, end })
    }

    /// Whether `t` lies in the range
    pub fn contains(&self, t: Timestamp) -> bool {
        t >= self.start && t < self.end
    }

    /// Length in milliseconds
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }
}
