// Multi-channel aggregate export codec (`history/exportAll.csv`).
//
// Each row is `(channel name, timestamp, kWh, cost)`. Channel names are
// resolved against both registries; rows for names the topology doesn't
// know are skipped rather than failing the whole export -- the gateway
// emits rows for channels that were deleted but still have stored data.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::debug;

use crate::error::Error;
use crate::history::{HistoryChannel, HistoryRecord, Interval};
use crate::model::{Reading, Timestamp};
use crate::topology::Topology;

const DATETIME_FORMAT: &str = "%m/%d/%Y %H:%M:%S";
const DATE_FORMAT: &str = "%m/%d/%Y";

/// Decode the export body into per-channel record sequences, in
/// first-appearance order.
pub(crate) fn decode(
    topology: &Topology,
    interval: Interval,
    body: &str,
) -> Result<Vec<(HistoryChannel, Vec<HistoryRecord>)>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.trim().as_bytes());

    let mut channels: Vec<(HistoryChannel, Vec<HistoryRecord>)> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for row in reader.records() {
        let row = row?;
        let name = field(&row, 0)?;

        let Some(channel) = resolve(topology, name) else {
            debug!(channel = name, "skipping export row for unknown channel");
            continue;
        };

        let record = decode_row(&row, interval)?;
        match slots.get(name) {
            Some(&slot) => channels[slot].1.push(record),
            None => {
                slots.insert(name.to_owned(), channels.len());
                channels.push((channel, vec![record]));
            }
        }
    }

    Ok(channels)
}

/// MTUs take precedence over groups on a name collision, matching the
/// lookup order the gateway itself uses for the export.
fn resolve(topology: &Topology, name: &str) -> Option<HistoryChannel> {
    topology
        .mtus
        .get_by_name(name)
        .map(HistoryChannel::Mtu)
        .or_else(|| topology.groups.get_by_name(name).map(HistoryChannel::Group))
}

fn decode_row(row: &StringRecord, interval: Interval) -> Result<HistoryRecord, Error> {
    let timestamp = parse_timestamp(field(row, 1)?, interval)?;

    let kwh: f64 = parse_field(row, 2)?;
    let quantity = (kwh * 1000.0).trunc();
    #[allow(clippy::cast_possible_truncation)]
    let quantity = quantity as i64;
    let reading = if interval.is_instantaneous() {
        Reading::Power(quantity)
    } else {
        Reading::Energy(quantity)
    };

    let cost: f64 = parse_field(row, 3)?;

    Ok(HistoryRecord {
        timestamp,
        reading,
        cost,
        voltage: None,
    })
}

fn parse_timestamp(text: &str, interval: Interval) -> Result<Timestamp, Error> {
    if interval.date_only() {
        let date = NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| Error::BadTimestamp {
            value: text.to_owned(),
        })?;
        return Ok(Timestamp::Date(date));
    }
    // The gateway emits naive local-less timestamps; they are taken as UTC.
    let datetime =
        NaiveDateTime::parse_from_str(text, DATETIME_FORMAT).map_err(|_| Error::BadTimestamp {
            value: text.to_owned(),
        })?;
    Ok(Timestamp::DateTime(datetime.and_utc()))
}

fn field<'r>(row: &'r StringRecord, position: usize) -> Result<&'r str, Error> {
    row.get(position).ok_or(Error::ShortExportRow {
        found: row.len(),
    })
}

fn parse_field<T: std::str::FromStr>(row: &StringRecord, position: usize) -> Result<T, Error> {
    let text = field(row, position)?;
    text.parse().map_err(|_| Error::InvalidField {
        element: "exportAll.csv",
        value: text.to_owned(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn sample_topology() -> Topology {
        Topology::parse(
            "<SystemSettings>\
               <MTUs><MTU><MTUDescription>Main Panel</MTUDescription></MTU></MTUs>\
               <Spyders><Spyder><Enabled>1</Enabled>\
                 <CT><Type>0</Type><Mult>1</Mult><Description>Heat pump</Description></CT>\
                 <Group><Description>HVAC</Description><UseCT>1</UseCT></Group>\
                 <MTUParent>0</MTUParent>\
               </Spyder></Spyders>\
             </SystemSettings>",
        )
        .unwrap()
    }

    #[test]
    fn seconds_rows_decode_as_power() {
        let topology = sample_topology();
        let body = "\"Main Panel\",10/05/2024 14:30:00,1.5,0.25\n\
                    \"Main Panel\",10/05/2024 14:30:01,1.502,0.25\n";
        let channels = decode(&topology, Interval::Seconds, body).unwrap();

        assert_eq!(channels.len(), 1);
        let (channel, records) = &channels[0];
        assert_eq!(channel.description(), "Main Panel");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].reading, Reading::Power(1500));
        assert_eq!(records[1].reading, Reading::Power(1502));
        assert!((records[0].cost - 0.25).abs() < f64::EPSILON);
        let dt = records[0].timestamp.datetime().unwrap();
        assert_eq!(dt.timestamp(), 1_728_138_600);
    }

    #[test]
    fn daily_rows_decode_as_energy_with_date_only() {
        let topology = sample_topology();
        let body = "HVAC,10/05/2024,12.345,1.87\n";
        let channels = decode(&topology, Interval::Days, body).unwrap();

        let (channel, records) = &channels[0];
        assert!(matches!(channel, HistoryChannel::Group(_)));
        assert_eq!(records[0].reading, Reading::Energy(12345));
        assert_eq!(records[0].timestamp.datetime(), None);
        assert_eq!(records[0].timestamp.date().year(), 2024);
        assert_eq!(records[0].timestamp.date().day(), 5);
    }

    #[test]
    fn unknown_channels_are_omitted() {
        let topology = sample_topology();
        let body = "Deleted Channel,10/05/2024 14:30:00,1.0,0.10\n\
                    HVAC,10/05/2024 14:30:00,0.5,0.05\n";
        let channels = decode(&topology, Interval::Minutes, body).unwrap();

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].0.description(), "HVAC");
    }

    #[test]
    fn interleaved_rows_group_by_channel() {
        let topology = sample_topology();
        let body = "Main Panel,10/05/2024 14:00:00,1.0,0.10\n\
                    HVAC,10/05/2024 14:00:00,0.2,0.02\n\
                    Main Panel,10/05/2024 15:00:00,1.1,0.11\n";
        let channels = decode(&topology, Interval::Hours, body).unwrap();

        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].0.description(), "Main Panel");
        assert_eq!(channels[0].1.len(), 2);
        assert_eq!(channels[0].1[1].reading, Reading::Energy(1100));
        assert_eq!(channels[1].1.len(), 1);
    }

    #[test]
    fn malformed_quantity_is_a_format_error() {
        let topology = sample_topology();
        let body = "HVAC,10/05/2024 14:00:00,not-a-number,0.02\n";
        let err = decode(&topology, Interval::Hours, body).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn short_row_is_a_format_error() {
        let topology = sample_topology();
        let body = "HVAC,10/05/2024 14:00:00\n";
        let err = decode(&topology, Interval::Hours, body).unwrap_err();
        assert!(matches!(err, Error::ShortExportRow { found: 2 }));
    }
}
