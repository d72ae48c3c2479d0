//! Historical telemetry: interval handling, query-parameter construction,
//! and the two wire codecs (the multi-channel CSV export and the
//! single-channel raw Base64/binary export).

use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::model::{Group, Mtu, Reading, Timestamp};

pub(crate) mod export;
pub(crate) mod raw;

/// History granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Seconds,
    Minutes,
    Hours,
    Days,
    Months,
}

impl Interval {
    /// The wire code for MTU history (`T` parameter). Groups use this
    /// code minus one; the gateway's group enumeration starts at minutes.
    pub(crate) fn mtu_code(self) -> u8 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 2,
            Self::Hours => 3,
            Self::Days => 4,
            Self::Months => 5,
        }
    }

    pub(crate) fn code_for(self, kind: SourceKind) -> Result<u8, Error> {
        match kind {
            SourceKind::Mtu => Ok(self.mtu_code()),
            SourceKind::Spyder => {
                if self == Self::Seconds {
                    return Err(Error::SecondsNotSupportedForGroups);
                }
                Ok(self.mtu_code() - 1)
            }
        }
    }

    /// Seconds/minutes history reports instantaneous power; coarser
    /// granularities report accumulated energy.
    pub(crate) fn is_instantaneous(self) -> bool {
        matches!(self, Self::Seconds | Self::Minutes)
    }

    /// Days/months records carry a calendar date, not an instant.
    pub(crate) fn date_only(self) -> bool {
        matches!(self, Self::Days | Self::Months)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Months => "months",
        };
        f.write_str(token)
    }
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seconds" => Ok(Self::Seconds),
            "minutes" => Ok(Self::Minutes),
            "hours" => Ok(Self::Hours),
            "days" => Ok(Self::Days),
            "months" => Ok(Self::Months),
            other => Err(Error::InvalidInterval {
                token: other.to_owned(),
            }),
        }
    }
}

/// Which side of the `D` parameter a history request addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SourceKind {
    Mtu,
    Spyder,
}

impl SourceKind {
    pub(crate) fn wire_code(self) -> u8 {
        match self {
            Self::Mtu => 0,
            Self::Spyder => 1,
        }
    }
}

/// One decoded history record.
///
/// `reading` is power for seconds/minutes granularity and energy
/// otherwise; `voltage` is present only in MTU seconds/minutes records.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub timestamp: Timestamp,
    pub reading: Reading,
    /// Cost in currency units.
    pub cost: f64,
    /// Line voltage in volts, when the record layout carries it.
    pub voltage: Option<f64>,
}

/// A channel resolved from the multi-channel export: either an MTU or a
/// spyder group.
#[derive(Debug, Clone)]
pub enum HistoryChannel {
    Mtu(Arc<Mtu>),
    Group(Arc<Group>),
}

impl HistoryChannel {
    pub fn description(&self) -> &str {
        match self {
            Self::Mtu(mtu) => &mtu.description,
            Self::Group(group) => &group.description,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Mtu(mtu) => mtu.index,
            Self::Group(group) => group.index,
        }
    }
}

/// Options for a single-channel history request.
///
/// The record window and the date filter are independent. Within each,
/// the two spellings are mutually exclusive: a record [`records`] range
/// conflicts with [`offset`]/[`limit`], and a [`timespan`] conflicts with
/// [`since`]/[`until`]. Ranges are half-open.
///
/// [`records`]: Self::records
/// [`offset`]: Self::offset
/// [`limit`]: Self::limit
/// [`timespan`]: Self::timespan
/// [`since`]: Self::since
/// [`until`]: Self::until
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    interval: Interval,
    records: Option<Range<u64>>,
    offset: Option<u64>,
    limit: Option<u64>,
    timespan: Option<Range<DateTime<Utc>>>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
}

impl HistoryQuery {
    pub fn new(interval: Interval) -> Self {
        Self {
            interval,
            records: None,
            offset: None,
            limit: None,
            timespan: None,
            since: None,
            until: None,
        }
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Request an explicit half-open window of record positions.
    pub fn records(mut self, range: Range<u64>) -> Self {
        self.records = Some(range);
        self
    }

    /// Start the window at record position `offset`. Only meaningful at
    /// seconds granularity when nonzero.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Cap the window at `limit` records.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Filter to records within a half-open time range.
    pub fn timespan(mut self, span: Range<DateTime<Utc>>) -> Self {
        self.timespan = Some(span);
        self
    }

    /// Filter to records at or after `start` (inclusive).
    pub fn since(mut self, start: DateTime<Utc>) -> Self {
        self.since = Some(start);
        self
    }

    /// Filter to records before `end` (exclusive).
    pub fn until(mut self, end: DateTime<Utc>) -> Self {
        self.until = Some(end);
        self
    }

    /// Resolve the record window to `(start, exclusive end)`.
    fn record_window(&self) -> Result<Option<(u64, Option<u64>)>, Error> {
        if let Some(range) = &self.records {
            if self.offset.is_some() || self.limit.is_some() {
                return Err(Error::ConflictingOptions {
                    message: "a record range cannot be combined with offset or limit",
                });
            }
            return Ok(Some((range.start, Some(range.end))));
        }
        match (self.offset, self.limit) {
            (Some(offset), Some(limit)) => Ok(Some((offset, Some(offset.saturating_add(limit))))),
            (Some(offset), None) => Ok(Some((offset, None))),
            (None, Some(limit)) => Ok(Some((0, Some(limit)))),
            (None, None) => Ok(None),
        }
    }

    /// Resolve the date filter to `(start, exclusive end)` instants.
    fn date_window(
        &self,
    ) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), Error> {
        if let Some(span) = &self.timespan {
            if self.since.is_some() || self.until.is_some() {
                return Err(Error::ConflictingOptions {
                    message: "a timespan cannot be combined with since or until",
                });
            }
            return Ok((Some(span.start), Some(span.end)));
        }
        Ok((self.since, self.until))
    }

    /// Assemble the flat `k=v` parameter list for `history/export.raw`.
    ///
    /// Validation happens here, before any I/O: conflicting options,
    /// nonzero offsets at coarse granularity, and seconds-for-groups are
    /// all rejected without touching the network.
    pub(crate) fn wire_params(
        &self,
        kind: SourceKind,
        source_index: usize,
    ) -> Result<Vec<(&'static str, String)>, Error> {
        let code = self.interval.code_for(kind)?;

        let mut params = vec![
            ("D", kind.wire_code().to_string()),
            ("M", source_index.to_string()),
            ("T", code.to_string()),
        ];

        if let Some((start, end)) = self.record_window()? {
            if start != 0 && self.interval != Interval::Seconds {
                return Err(Error::OffsetRequiresSeconds);
            }
            if let Some(end) = end {
                params.push(("C", end.saturating_sub(start).to_string()));
            }
            if start != 0 {
                params.push(("I", start.to_string()));
            }
        }

        let (since, until) = self.date_window()?;
        if let Some(start) = since {
            params.push(("S", start.timestamp().to_string()));
        }
        if let Some(end) = until {
            params.push(("E", (end.timestamp() - 1).to_string()));
        }

        Ok(params)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn interval_tokens_round_trip() {
        for token in ["seconds", "minutes", "hours", "days", "months"] {
            let interval: Interval = token.parse().unwrap();
            assert_eq!(interval.to_string(), token);
        }
        let err = "fortnights".parse::<Interval>().unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn group_codes_are_offset_by_one() {
        assert_eq!(Interval::Hours.code_for(SourceKind::Mtu).unwrap(), 3);
        assert_eq!(Interval::Hours.code_for(SourceKind::Spyder).unwrap(), 2);
        assert_eq!(Interval::Months.code_for(SourceKind::Spyder).unwrap(), 4);
    }

    #[test]
    fn seconds_rejected_for_groups_before_io() {
        let err = Interval::Seconds.code_for(SourceKind::Spyder).unwrap_err();
        assert!(matches!(err, Error::SecondsNotSupportedForGroups));
    }

    #[test]
    fn group_hourly_limit_window() {
        // Group history at hourly granularity, first 24 records:
        // T drops to 2, C carries the count, no I/S/E.
        let params = HistoryQuery::new(Interval::Hours)
            .offset(0)
            .limit(24)
            .wire_params(SourceKind::Spyder, 3)
            .unwrap();

        assert_eq!(param(&params, "T"), Some("2"));
        assert_eq!(param(&params, "D"), Some("1"));
        assert_eq!(param(&params, "M"), Some("3"));
        assert_eq!(param(&params, "C"), Some("24"));
        assert_eq!(param(&params, "I"), None);
        assert_eq!(param(&params, "S"), None);
        assert_eq!(param(&params, "E"), None);
    }

    #[test]
    fn seconds_offset_subtracts_from_count() {
        let params = HistoryQuery::new(Interval::Seconds)
            .records(10..30)
            .wire_params(SourceKind::Mtu, 0)
            .unwrap();

        assert_eq!(param(&params, "T"), Some("1"));
        assert_eq!(param(&params, "D"), Some("0"));
        assert_eq!(param(&params, "C"), Some("20"));
        assert_eq!(param(&params, "I"), Some("10"));
    }

    #[test]
    fn lone_offset_requests_open_window() {
        let params = HistoryQuery::new(Interval::Seconds)
            .offset(5)
            .wire_params(SourceKind::Mtu, 0)
            .unwrap();

        assert_eq!(param(&params, "I"), Some("5"));
        assert_eq!(param(&params, "C"), None);
    }

    #[test]
    fn range_conflicts_with_offset_and_limit() {
        let err = HistoryQuery::new(Interval::Seconds)
            .records(0..10)
            .limit(5)
            .wire_params(SourceKind::Mtu, 0)
            .unwrap_err();
        assert!(matches!(err, Error::ConflictingOptions { .. }));
    }

    #[test]
    fn nonzero_offset_requires_seconds() {
        let err = HistoryQuery::new(Interval::Hours)
            .offset(10)
            .limit(5)
            .wire_params(SourceKind::Mtu, 0)
            .unwrap_err();
        assert!(matches!(err, Error::OffsetRequiresSeconds));
    }

    #[test]
    fn date_window_emits_half_open_epochs() {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let end = DateTime::from_timestamp(1_700_086_400, 0).unwrap();
        let params = HistoryQuery::new(Interval::Hours)
            .timespan(start..end)
            .wire_params(SourceKind::Mtu, 1)
            .unwrap();

        assert_eq!(param(&params, "S"), Some("1700000000"));
        assert_eq!(param(&params, "E"), Some("1700086399"));
    }

    #[test]
    fn timespan_conflicts_with_since() {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let err = HistoryQuery::new(Interval::Hours)
            .timespan(start..start)
            .since(start)
            .wire_params(SourceKind::Mtu, 0)
            .unwrap_err();
        assert!(matches!(err, Error::ConflictingOptions { .. }));
    }

    #[test]
    fn unbounded_ends_emit_no_date_params() {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let params = HistoryQuery::new(Interval::Days)
            .since(start)
            .wire_params(SourceKind::Mtu, 0)
            .unwrap();

        assert_eq!(param(&params, "S"), Some("1700000000"));
        assert_eq!(param(&params, "E"), None);
        assert_eq!(param(&params, "C"), None);
    }
}
