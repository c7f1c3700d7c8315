// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed IPP attribute values and their payload encodings (RFC 8010 §3.9).
//
// Every value knows its own syntax tag. Scalar payloads encode/decode here;
// collection framing (begCollection / memberAttrName / endCollection) is
// multi-unit on the wire and lives in the message encoder and parser.

use std::fmt;

use chrono::{DateTime, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};

use druckwerk_core::error::ProtocolError;

use crate::tag::ValueTag;

/// Units for the `resolution` syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionUnit {
    /// Dots per inch (wire value 3).
    Dpi,
    /// Dots per centimetre (wire value 4).
    Dpcm,
}

impl ResolutionUnit {
    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            3 => Some(Self::Dpi),
            4 => Some(Self::Dpcm),
            _ => None,
        }
    }

    pub fn as_wire(&self) -> u8 {
        match self {
            Self::Dpi => 3,
            Self::Dpcm => 4,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Dpi => "dpi",
            Self::Dpcm => "dpc",
        }
    }
}

/// The 11-byte dateTime form of RFC 1903 / RFC 2579.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IppDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub deciseconds: u8,
    /// Direction from UTC: `b'+'` or `b'-'`.
    pub utc_direction: u8,
    pub utc_hours: u8,
    pub utc_minutes: u8,
}

impl IppDateTime {
    /// Decode the 11-byte wire form, `None` when any field is out of range.
    pub fn from_wire(bytes: &[u8; 11]) -> Option<Self> {
        let dt = Self {
            year: u16::from_be_bytes([bytes[0], bytes[1]]),
            month: bytes[2],
            day: bytes[3],
            hour: bytes[4],
            minute: bytes[5],
            second: bytes[6],
            deciseconds: bytes[7],
            utc_direction: bytes[8],
            utc_hours: bytes[9],
            utc_minutes: bytes[10],
        };
        dt.is_valid().then_some(dt)
    }

    fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
            && (1..=31).contains(&self.day)
            && self.hour <= 23
            && self.minute <= 59
            && self.second <= 60
            && self.deciseconds <= 9
            && (self.utc_direction == b'+' || self.utc_direction == b'-')
            && self.utc_hours <= 23
            && self.utc_minutes <= 59
    }

    pub fn to_wire(&self) -> [u8; 11] {
        let year = self.year.to_be_bytes();
        [
            year[0],
            year[1],
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.deciseconds,
            self.utc_direction,
            self.utc_hours,
            self.utc_minutes,
        ]
    }

    /// Convert to a chrono timestamp, `None` when the calendar date does not
    /// exist (e.g. February 30th).
    pub fn to_chrono(&self) -> Option<DateTime<FixedOffset>> {
        let offset_secs =
            (i32::from(self.utc_hours) * 3600 + i32::from(self.utc_minutes) * 60)
                * if self.utc_direction == b'-' { -1 } else { 1 };
        let offset = FixedOffset::east_opt(offset_secs)?;
        offset
            .with_ymd_and_hms(
                i32::from(self.year),
                u32::from(self.month),
                u32::from(self.day),
                u32::from(self.hour),
                u32::from(self.minute),
                u32::from(self.second).min(59),
            )
            .single()
    }
}

/// One member of a collection value: a named, value-tagged entry.
pub type CollectionMember = (String, IppValue);

/// A single IPP attribute value with its syntax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IppValue {
    Integer(i32),
    Boolean(bool),
    Enum(i32),
    OctetString(Vec<u8>),
    DateTime(IppDateTime),
    Resolution {
        x: u32,
        y: u32,
        unit: ResolutionUnit,
    },
    RangeOfInteger {
        lower: i32,
        upper: i32,
    },
    Collection(Vec<CollectionMember>),
    Text(String),
    Name(String),
    Keyword(String),
    Uri(String),
    UriScheme(String),
    Charset(String),
    NaturalLanguage(String),
    MimeMediaType(String),
    NoValue,
    Unknown,
    Unsupported,
}

impl IppValue {
    /// The wire syntax tag for this value.
    pub fn tag(&self) -> ValueTag {
        match self {
            Self::Integer(_) => ValueTag::Integer,
            Self::Boolean(_) => ValueTag::Boolean,
            Self::Enum(_) => ValueTag::Enum,
            Self::OctetString(_) => ValueTag::OctetString,
            Self::DateTime(_) => ValueTag::DateTime,
            Self::Resolution { .. } => ValueTag::Resolution,
            Self::RangeOfInteger { .. } => ValueTag::RangeOfInteger,
            Self::Collection(_) => ValueTag::BegCollection,
            Self::Text(_) => ValueTag::TextWithoutLanguage,
            Self::Name(_) => ValueTag::NameWithoutLanguage,
            Self::Keyword(_) => ValueTag::Keyword,
            Self::Uri(_) => ValueTag::Uri,
            Self::UriScheme(_) => ValueTag::UriScheme,
            Self::Charset(_) => ValueTag::Charset,
            Self::NaturalLanguage(_) => ValueTag::NaturalLanguage,
            Self::MimeMediaType(_) => ValueTag::MimeMediaType,
            Self::NoValue => ValueTag::NoValue,
            Self::Unknown => ValueTag::Unknown,
            Self::Unsupported => ValueTag::Unsupported,
        }
    }

    /// Append this value's payload bytes (everything after the value-length
    /// field) to `buf`. Collections are framed by the message encoder and
    /// contribute no payload of their own here.
    pub(crate) fn write_payload(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Integer(v) | Self::Enum(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Self::Boolean(v) => buf.push(u8::from(*v)),
            Self::OctetString(bytes) => buf.extend_from_slice(bytes),
            Self::DateTime(dt) => buf.extend_from_slice(&dt.to_wire()),
            Self::Resolution { x, y, unit } => {
                buf.extend_from_slice(&x.to_be_bytes());
                buf.extend_from_slice(&y.to_be_bytes());
                buf.push(unit.as_wire());
            }
            Self::RangeOfInteger { lower, upper } => {
                buf.extend_from_slice(&lower.to_be_bytes());
                buf.extend_from_slice(&upper.to_be_bytes());
            }
            Self::Text(s)
            | Self::Name(s)
            | Self::Keyword(s)
            | Self::Uri(s)
            | Self::UriScheme(s)
            | Self::Charset(s)
            | Self::NaturalLanguage(s)
            | Self::MimeMediaType(s) => buf.extend_from_slice(s.as_bytes()),
            Self::Collection(_) | Self::NoValue | Self::Unknown | Self::Unsupported => {}
        }
    }

    /// Decode a scalar payload for the given tag.
    ///
    /// Fixed-width syntaxes reject mismatched lengths as `BadLength`. A
    /// dateTime or resolution whose bytes do not form a valid value falls
    /// back to raw octet preservation rather than failing the message.
    pub(crate) fn parse(tag: ValueTag, payload: &[u8]) -> Result<Self, ProtocolError> {
        match tag {
            ValueTag::Integer | ValueTag::Enum => {
                let bytes: [u8; 4] = payload.try_into().map_err(|_| {
                    ProtocolError::BadLength(format!(
                        "integer value of {} bytes (expected 4)",
                        payload.len()
                    ))
                })?;
                let v = i32::from_be_bytes(bytes);
                Ok(if tag == ValueTag::Integer {
                    Self::Integer(v)
                } else {
                    Self::Enum(v)
                })
            }
            ValueTag::Boolean => match payload {
                [b] => Ok(Self::Boolean(*b != 0)),
                _ => Err(ProtocolError::BadLength(format!(
                    "boolean value of {} bytes (expected 1)",
                    payload.len()
                ))),
            },
            ValueTag::OctetString => Ok(Self::OctetString(payload.to_vec())),
            ValueTag::DateTime => {
                let bytes: [u8; 11] = payload.try_into().map_err(|_| {
                    ProtocolError::BadLength(format!(
                        "dateTime value of {} bytes (expected 11)",
                        payload.len()
                    ))
                })?;
                Ok(match IppDateTime::from_wire(&bytes) {
                    Some(dt) => Self::DateTime(dt),
                    None => Self::OctetString(payload.to_vec()),
                })
            }
            ValueTag::Resolution => {
                if payload.len() != 9 {
                    return Err(ProtocolError::BadLength(format!(
                        "resolution value of {} bytes (expected 9)",
                        payload.len()
                    )));
                }
                let x = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
                let y = u32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]);
                Ok(match ResolutionUnit::from_wire(payload[8]) {
                    Some(unit) => Self::Resolution { x, y, unit },
                    None => Self::OctetString(payload.to_vec()),
                })
            }
            ValueTag::RangeOfInteger => {
                if payload.len() != 8 {
                    return Err(ProtocolError::BadLength(format!(
                        "rangeOfInteger value of {} bytes (expected 8)",
                        payload.len()
                    )));
                }
                let lower = i32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
                let upper = i32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]);
                if lower > upper {
                    return Err(ProtocolError::BadLength(format!(
                        "rangeOfInteger with lower {lower} above upper {upper}"
                    )));
                }
                Ok(Self::RangeOfInteger { lower, upper })
            }
            ValueTag::TextWithoutLanguage => Ok(Self::Text(lossy(payload))),
            ValueTag::NameWithoutLanguage => Ok(Self::Name(lossy(payload))),
            ValueTag::Keyword => Ok(Self::Keyword(lossy(payload))),
            ValueTag::Uri => Ok(Self::Uri(lossy(payload))),
            ValueTag::UriScheme => Ok(Self::UriScheme(lossy(payload))),
            ValueTag::Charset => Ok(Self::Charset(lossy(payload))),
            ValueTag::NaturalLanguage => Ok(Self::NaturalLanguage(lossy(payload))),
            ValueTag::MimeMediaType => Ok(Self::MimeMediaType(lossy(payload))),
            ValueTag::NoValue => Ok(Self::NoValue),
            ValueTag::Unknown => Ok(Self::Unknown),
            ValueTag::Unsupported => Ok(Self::Unsupported),
            // Multi-unit framing, never a scalar payload.
            ValueTag::BegCollection | ValueTag::EndCollection | ValueTag::MemberAttrName => {
                Err(ProtocolError::BadOrder(format!(
                    "collection tag 0x{:02x} outside collection framing",
                    tag.as_u8()
                )))
            }
        }
    }

    /// Integer or enum payload.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Integer(v) | Self::Enum(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Borrow any character-string payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s)
            | Self::Name(s)
            | Self::Keyword(s)
            | Self::Uri(s)
            | Self::UriScheme(s)
            | Self::Charset(s)
            | Self::NaturalLanguage(s)
            | Self::MimeMediaType(s) => Some(s),
            _ => None,
        }
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

impl fmt::Display for IppValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) | Self::Enum(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::OctetString(bytes) => write!(f, "({} octets)", bytes.len()),
            Self::DateTime(dt) => write!(
                f,
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}{}{:02}:{:02}",
                dt.year,
                dt.month,
                dt.day,
                dt.hour,
                dt.minute,
                dt.second,
                dt.utc_direction as char,
                dt.utc_hours,
                dt.utc_minutes
            ),
            Self::Resolution { x, y, unit } => write!(f, "{x}x{y}{}", unit.suffix()),
            Self::RangeOfInteger { lower, upper } => write!(f, "{lower}-{upper}"),
            Self::Collection(members) => {
                write!(f, "{{")?;
                for (i, (name, value)) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{name}={value}")?;
                }
                write!(f, "}}")
            }
            Self::Text(s)
            | Self::Name(s)
            | Self::Keyword(s)
            | Self::Uri(s)
            | Self::UriScheme(s)
            | Self::Charset(s)
            | Self::NaturalLanguage(s)
            | Self::MimeMediaType(s) => f.write_str(s),
            Self::NoValue => f.write_str("no-value"),
            Self::Unknown => f.write_str("unknown"),
            Self::Unsupported => f.write_str("unsupported"),
        }
    }
}
