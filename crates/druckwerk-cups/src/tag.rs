// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPP tag tables (RFC 8010 §3.5).
//
// Delimiter tags introduce attribute groups; value tags describe the syntax
// of a single attribute value. Both are one byte on the wire. Delimiter
// tags occupy 0x00..=0x0f, value tags 0x10 and above.

use druckwerk_core::error::ProtocolError;

/// Group delimiter tags (RFC 8010 §3.5.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelimiterTag {
    OperationAttributes,
    JobAttributes,
    EndOfAttributes,
    PrinterAttributes,
    UnsupportedAttributes,
    Subscription,
    EventNotification,
}

impl DelimiterTag {
    pub fn from_u8(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            0x01 => Ok(Self::OperationAttributes),
            0x02 => Ok(Self::JobAttributes),
            0x03 => Ok(Self::EndOfAttributes),
            0x04 => Ok(Self::PrinterAttributes),
            0x05 => Ok(Self::UnsupportedAttributes),
            0x06 => Ok(Self::Subscription),
            0x07 => Ok(Self::EventNotification),
            _ => Err(ProtocolError::BadTag(byte)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Self::OperationAttributes => 0x01,
            Self::JobAttributes => 0x02,
            Self::EndOfAttributes => 0x03,
            Self::PrinterAttributes => 0x04,
            Self::UnsupportedAttributes => 0x05,
            Self::Subscription => 0x06,
            Self::EventNotification => 0x07,
        }
    }
}

/// Value syntax tags (RFC 8010 §3.5.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTag {
    // Out-of-band
    Unsupported,
    Unknown,
    NoValue,
    // Integer family
    Integer,
    Boolean,
    Enum,
    // Octet family
    OctetString,
    DateTime,
    Resolution,
    RangeOfInteger,
    BegCollection,
    EndCollection,
    MemberAttrName,
    // Character strings
    TextWithoutLanguage,
    NameWithoutLanguage,
    Keyword,
    Uri,
    UriScheme,
    Charset,
    NaturalLanguage,
    MimeMediaType,
}

impl ValueTag {
    pub fn from_u8(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            0x10 => Ok(Self::Unsupported),
            0x12 => Ok(Self::Unknown),
            0x13 => Ok(Self::NoValue),
            0x21 => Ok(Self::Integer),
            0x22 => Ok(Self::Boolean),
            0x23 => Ok(Self::Enum),
            0x30 => Ok(Self::OctetString),
            0x31 => Ok(Self::DateTime),
            0x32 => Ok(Self::Resolution),
            0x33 => Ok(Self::RangeOfInteger),
            0x34 => Ok(Self::BegCollection),
            0x37 => Ok(Self::EndCollection),
            0x38 => Ok(Self::MemberAttrName),
            0x41 => Ok(Self::TextWithoutLanguage),
            0x42 => Ok(Self::NameWithoutLanguage),
            0x44 => Ok(Self::Keyword),
            0x45 => Ok(Self::Uri),
            0x46 => Ok(Self::UriScheme),
            0x47 => Ok(Self::Charset),
            0x48 => Ok(Self::NaturalLanguage),
            0x49 => Ok(Self::MimeMediaType),
            _ => Err(ProtocolError::BadTag(byte)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Unsupported => 0x10,
            Self::Unknown => 0x12,
            Self::NoValue => 0x13,
            Self::Integer => 0x21,
            Self::Boolean => 0x22,
            Self::Enum => 0x23,
            Self::OctetString => 0x30,
            Self::DateTime => 0x31,
            Self::Resolution => 0x32,
            Self::RangeOfInteger => 0x33,
            Self::BegCollection => 0x34,
            Self::EndCollection => 0x37,
            Self::MemberAttrName => 0x38,
            Self::TextWithoutLanguage => 0x41,
            Self::NameWithoutLanguage => 0x42,
            Self::Keyword => 0x44,
            Self::Uri => 0x45,
            Self::UriScheme => 0x46,
            Self::Charset => 0x47,
            Self::NaturalLanguage => 0x48,
            Self::MimeMediaType => 0x49,
        }
    }

    /// Out-of-band tags carry no value payload of their own.
    pub fn is_out_of_band(&self) -> bool {
        matches!(self, Self::Unsupported | Self::Unknown | Self::NoValue)
    }
}

/// Whether a raw byte is in the delimiter range (RFC 8010 §3.5.1).
pub fn is_delimiter(byte: u8) -> bool {
    byte <= 0x0f
}
