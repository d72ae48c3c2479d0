// Single-channel raw export codec (`history/export.raw`).
//
// The gateway answers with one Base64 line per record. Decoded, each
// record is a fixed little-endian layout selected by (source kind x
// interval): a 0xA4 marker byte, the fields, and a trailing checksum
// equal to the sum of all preceding bytes mod 256. A bad marker or
// checksum fails the whole request -- the stream has no per-record
// recovery story.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::DateTime;

use crate::error::Error;
use crate::history::{HistoryRecord, Interval, SourceKind};
use crate::model::{Reading, Timestamp, cost_from_hundredths, voltage_from_tenths};

pub(crate) const MARKER: u8 = 0xa4;

/// The fixed record layout for one (source kind, interval) pairing,
/// resolved once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecordLayout {
    /// marker, u32 ts, i32 power, i32 cost, u16 voltage, checksum.
    MtuSeconds,
    /// Seconds layout plus a u16 power factor before the checksum.
    MtuMinutes,
    /// marker, u32 ts, i32 energy, i32 cost, checksum.
    MtuHoursDays,
    /// Hours layout plus five demand-charge fields and a TOU byte;
    /// those are validated but not surfaced.
    MtuMonths,
    /// Groups share one layout for every granularity they support.
    Spyder,
}

impl RecordLayout {
    pub(crate) fn resolve(kind: SourceKind, interval: Interval) -> Result<Self, Error> {
        match kind {
            SourceKind::Mtu => Ok(match interval {
                Interval::Seconds => Self::MtuSeconds,
                Interval::Minutes => Self::MtuMinutes,
                Interval::Hours | Interval::Days => Self::MtuHoursDays,
                Interval::Months => Self::MtuMonths,
            }),
            SourceKind::Spyder => {
                if interval == Interval::Seconds {
                    return Err(Error::SecondsNotSupportedForGroups);
                }
                Ok(Self::Spyder)
            }
        }
    }

    /// Total encoded length, marker and checksum included.
    pub(crate) fn encoded_len(self) -> usize {
        match self {
            Self::MtuSeconds => 16,
            Self::MtuMinutes => 18,
            Self::MtuHoursDays | Self::Spyder => 14,
            Self::MtuMonths => 35,
        }
    }

    fn has_voltage(self) -> bool {
        matches!(self, Self::MtuSeconds | Self::MtuMinutes)
    }
}

/// Decode the whole response body, one record per non-empty line.
pub(crate) fn decode(
    layout: RecordLayout,
    interval: Interval,
    body: &str,
) -> Result<Vec<HistoryRecord>, Error> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| decode_line(layout, interval, line))
        .collect()
}

fn decode_line(
    layout: RecordLayout,
    interval: Interval,
    line: &str,
) -> Result<HistoryRecord, Error> {
    let bytes = BASE64.decode(line)?;

    if bytes.len() != layout.encoded_len() {
        return Err(Error::BadRecordLength {
            expected: layout.encoded_len(),
            found: bytes.len(),
        });
    }
    if bytes[0] != MARKER {
        return Err(Error::BadMarker { found: bytes[0] });
    }

    let (payload, checksum) = (&bytes[..bytes.len() - 1], bytes[bytes.len() - 1]);
    let computed = payload.iter().fold(0u8, |sum, b| sum.wrapping_add(*b));
    if checksum != computed {
        return Err(Error::ChecksumMismatch {
            computed,
            found: checksum,
        });
    }

    let mut fields = Fields::after_marker(payload);
    let epoch = i64::from(fields.u32());
    let quantity = i64::from(fields.i32());
    let cost = cost_from_hundredths(fields.i32());
    let voltage = layout.has_voltage().then(|| voltage_from_tenths(fields.u16()));

    if layout == RecordLayout::MtuMonths {
        // Demand-charge block: decoded for layout validation only.
        let _minimum_charge = fields.u32();
        let _fixed_charge = fields.u32();
        let _demand_charge = fields.i32();
        let _demand_peak_average = fields.i32();
        let _demand_peak_time = fields.u32();
    }

    let instant = DateTime::from_timestamp(epoch, 0).ok_or(Error::BadTimestamp {
        value: epoch.to_string(),
    })?;
    let timestamp = if interval.date_only() {
        Timestamp::Date(instant.date_naive())
    } else {
        Timestamp::DateTime(instant)
    };

    let reading = if interval.is_instantaneous() {
        Reading::Power(quantity)
    } else {
        Reading::Energy(quantity)
    };

    Ok(HistoryRecord {
        timestamp,
        reading,
        cost,
        voltage,
    })
}

/// Little-endian field cursor over a length-checked record payload.
struct Fields<'a> {
    bytes: &'a [u8],
    at: usize,
}

impl<'a> Fields<'a> {
    fn after_marker(payload: &'a [u8]) -> Self {
        Self { bytes: payload, at: 1 }
    }

    fn u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.bytes[self.at..self.at + 4]);
        self.at += 4;
        u32::from_le_bytes(buf)
    }

    fn i32(&mut self) -> i32 {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.bytes[self.at..self.at + 4]);
        self.at += 4;
        i32::from_le_bytes(buf)
    }

    fn u16(&mut self) -> u16 {
        let mut buf = [0u8; 2];
        buf.copy_from_slice(&self.bytes[self.at..self.at + 2]);
        self.at += 2;
        u16::from_le_bytes(buf)
    }
}
