//! NMEA 0183 sentence parsing for the two receivers.
//!
//! Only GGA ("GPS fix data") and RMC ("recommended minimum") sentences from the
//! GP and GN talkers are recognised. Every sentence must carry a valid `*hh`
//! checksum; anything else comes back as a [`ParseFailure`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseFailure;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentenceKind {
    Gga,
    Rmc,
}

impl SentenceKind {
    fn from_id(id: &str) -> Result<Self, ParseFailure> {
        match id {
            "GPGGA" | "GNGGA" => Ok(SentenceKind::Gga),
            "GPRMC" | "GNRMC" => Ok(SentenceKind::Rmc),
            other => Err(ParseFailure::UnsupportedSentence(other.to_string())),
        }
    }
}

/// Position payload of one sentence.
#[derive(Clone, Debug, PartialEq)]
pub struct SentenceFix {
    pub kind: SentenceKind,
    pub latitude: f64,
    pub longitude: f64,
    /// Only GGA carries HDOP.
    pub horizontal_dilution: Option<f64>,
}

/// XOR of every byte between `$` and `*`.
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// Parse a raw line as read from the serial port.
pub fn parse_line(raw: &[u8]) -> Result<SentenceFix, ParseFailure> {
    if !raw.is_ascii() {
        return Err(ParseFailure::NonAscii);
    }
    let line = std::str::from_utf8(raw).map_err(|_| ParseFailure::NonAscii)?;
    parse_sentence(line)
}

pub fn parse_sentence(line: &str) -> Result<SentenceFix, ParseFailure> {
    if !line.is_ascii() {
        return Err(ParseFailure::NonAscii);
    }

    let line = line.trim();
    let framed = line.strip_prefix('$').ok_or(ParseFailure::MissingStart)?;
    let (body, sum) = framed
        .rsplit_once('*')
        .ok_or(ParseFailure::MissingChecksum)?;

    let expected = checksum(body.as_bytes());
    let found = if sum.len() == 2 {
        u8::from_str_radix(sum, 16).ok()
    } else {
        None
    };
    if found != Some(expected) {
        return Err(ParseFailure::ChecksumMismatch {
            expected,
            found: sum.to_string(),
        });
    }

    let fields: Vec<&str> = body.split(',').collect();
    match SentenceKind::from_id(fields[0])? {
        SentenceKind::Gga => parse_gga(&fields),
        SentenceKind::Rmc => parse_rmc(&fields),
    }
}

// $GPGGA,time,lat,N,lon,E,quality,sats,hdop,alt,M,geoid,M,age,station
fn parse_gga(fields: &[&str]) -> Result<SentenceFix, ParseFailure> {
    if fields.len() < 9 {
        return Err(ParseFailure::MalformedField {
            field: "sentence",
            value: fields.join(","),
        });
    }

    match fields[6] {
        "" | "0" => return Err(ParseFailure::NoFix),
        q if q.parse::<u8>().is_err() => {
            return Err(ParseFailure::MalformedField {
                field: "fix quality",
                value: q.to_string(),
            })
        }
        _ => {}
    }

    let latitude = parse_coordinate(fields[2], fields[3], Axis::Latitude)?;
    let longitude = parse_coordinate(fields[4], fields[5], Axis::Longitude)?;

    let horizontal_dilution = match fields[8] {
        "" => None,
        raw => {
            let hdop = raw
                .parse::<f64>()
                .ok()
                .filter(|h| h.is_finite() && *h >= 0.0)
                .ok_or_else(|| ParseFailure::MalformedField {
                    field: "hdop",
                    value: raw.to_string(),
                })?;
            Some(hdop)
        }
    };

    Ok(SentenceFix {
        kind: SentenceKind::Gga,
        latitude,
        longitude,
        horizontal_dilution,
    })
}

// $GPRMC,time,status,lat,N,lon,E,speed,course,date,magvar,E
fn parse_rmc(fields: &[&str]) -> Result<SentenceFix, ParseFailure> {
    if fields.len() < 7 {
        return Err(ParseFailure::MalformedField {
            field: "sentence",
            value: fields.join(","),
        });
    }

    match fields[2] {
        "A" => {}
        "V" | "" => return Err(ParseFailure::NoFix),
        other => {
            return Err(ParseFailure::MalformedField {
                field: "status",
                value: other.to_string(),
            })
        }
    }

    Ok(SentenceFix {
        kind: SentenceKind::Rmc,
        latitude: parse_coordinate(fields[3], fields[4], Axis::Latitude)?,
        longitude: parse_coordinate(fields[5], fields[6], Axis::Longitude)?,
        horizontal_dilution: None,
    })
}

#[derive(Clone, Copy)]
enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn name(self) -> &'static str {
        match self {
            Axis::Latitude => "latitude",
            Axis::Longitude => "longitude",
        }
    }

    fn limit(self) -> f64 {
        match self {
            Axis::Latitude => 90.0,
            Axis::Longitude => 180.0,
        }
    }
}

/// `ddmm.mmmm` (or `dddmm.mmmm`) plus hemisphere letter to signed decimal degrees.
fn parse_coordinate(value: &str, hemisphere: &str, axis: Axis) -> Result<f64, ParseFailure> {
    if value.is_empty() || hemisphere.is_empty() {
        return Err(ParseFailure::NoFix);
    }

    let malformed = || ParseFailure::MalformedField {
        field: axis.name(),
        value: format!("{},{}", value, hemisphere),
    };

    let raw = value.parse::<f64>().map_err(|_| malformed())?;
    if !raw.is_finite() || raw < 0.0 {
        return Err(malformed());
    }

    let degrees = (raw / 100.0).floor();
    let minutes = raw - degrees * 100.0;
    if minutes >= 60.0 {
        return Err(malformed());
    }

    let decimal = degrees + minutes / 60.0;
    if decimal > axis.limit() {
        return Err(malformed());
    }

    match (axis, hemisphere) {
        (Axis::Latitude, "N") | (Axis::Longitude, "E") => Ok(decimal),
        (Axis::Latitude, "S") | (Axis::Longitude, "W") => Ok(-decimal),
        _ => Err(malformed()),
    }
}

fn format_coordinate(value: f64, degree_width: usize) -> String {
    let abs = value.abs();
    let mut degrees = abs.floor();
    let mut minutes = ((abs - degrees) * 60.0 * 100_000.0).round() / 100_000.0;
    if minutes >= 60.0 {
        degrees += 1.0;
        minutes = 0.0;
    }
    format!(
        "{:0width$}{:08.5}",
        degrees as u32,
        minutes,
        width = degree_width
    )
}

/// Build a checksummed GGA sentence (fix quality 1) without the line terminator.
pub fn format_gga(at: DateTime<Utc>, latitude: f64, longitude: f64, hdop: f64) -> String {
    let body = format!(
        "GPGGA,{},{},{},{},{},1,08,{:.1},40.0,M,39.0,M,,",
        at.format("%H%M%S%.3f"),
        format_coordinate(latitude, 2),
        if latitude < 0.0 { 'S' } else { 'N' },
        format_coordinate(longitude, 3),
        if longitude < 0.0 { 'W' } else { 'E' },
        hdop,
    );
    format!("${}*{:02X}", body, checksum(body.as_bytes()))
}
