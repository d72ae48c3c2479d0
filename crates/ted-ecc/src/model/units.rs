// ── Units and quantities ──
//
// The ECC reports everything in scaled integers: cost in hundredths of a
// currency unit, voltage in tenths of a volt, CT gain in a folded unsigned
// encoding. These helpers are the single place that scaling lives.

use chrono::{DateTime, NaiveDate, Utc};

/// Decode a CT multiplier from its wire encoding.
///
/// The device stores the gain as an unsigned value where anything above 4
/// folds into the negative range: `5` means `-1`, `6` means `-2`, and so on.
/// Values `0..=4` pass through unchanged.
pub fn multiplier_from_wire(raw: u32) -> i32 {
    #[allow(clippy::cast_possible_wrap)]
    let raw = raw as i32;
    if raw > 4 { -(raw - 4) } else { raw }
}

/// Inverse of [`multiplier_from_wire`] for the representable domain
/// (`multiplier <= 4`).
pub fn multiplier_to_wire(multiplier: i32) -> u32 {
    let folded = if multiplier < 0 { 4 - multiplier } else { multiplier };
    #[allow(clippy::cast_sign_loss)]
    let folded = folded as u32;
    folded
}

/// Cost fields arrive in hundredths of a currency unit.
pub fn cost_from_hundredths(raw: i32) -> f64 {
    f64::from(raw) / 100.0
}

/// Voltage fields arrive in tenths of a volt.
pub fn voltage_from_tenths(raw: u16) -> f64 {
    f64::from(raw) / 10.0
}

/// A history timestamp.
///
/// Seconds/minutes/hours records carry a full instant; days/months records
/// are calendar dates with no meaningful time component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

impl Timestamp {
    /// The calendar date, regardless of granularity.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::DateTime(dt) => dt.date_naive(),
            Self::Date(d) => *d,
        }
    }

    /// The full instant, if this timestamp carries one.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            Self::Date(_) => None,
        }
    }
}

/// The quantity carried by a history record.
///
/// Seconds/minutes granularity reports instantaneous power in watts;
/// hours/days/months granularity reports accumulated energy in watt-hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    Power(i64),
    Energy(i64),
}

impl Reading {
    /// Instantaneous power in watts, for seconds/minutes records.
    pub fn power(&self) -> Option<i64> {
        match self {
            Self::Power(w) => Some(*w),
            Self::Energy(_) => None,
        }
    }

    /// Accumulated energy in watt-hours, for hours/days/months records.
    pub fn energy(&self) -> Option<i64> {
        match self {
            Self::Energy(wh) => Some(*wh),
            Self::Power(_) => None,
        }
    }

    /// The raw quantity, whichever kind it is.
    pub fn value(&self) -> i64 {
        match self {
            Self::Power(v) | Self::Energy(v) => *v,
        }
    }
}

/// A live dashboard reading: watts right now, watt-hours so far today,
/// and watt-hours month-to-date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub now: i64,
    pub today: i64,
    pub mtd: i64,
}
