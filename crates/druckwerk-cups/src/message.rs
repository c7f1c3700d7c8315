// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPP message model and binary encoder (RFC 8010 §3).
//
// A message is an 8-byte header followed by delimiter-introduced attribute
// groups and a final end-of-attributes tag:
//
// ```text
// version-number:  2 bytes (major, minor)
// operation-id or status-code: 2 bytes (big-endian u16)
// request-id:      4 bytes (big-endian u32)
// attribute-groups: variable
//   delimiter-tag: 1 byte
//   attributes:    variable
//     value-tag:    1 byte
//     name-length:  2 bytes (big-endian u16)
//     name:         name-length bytes
//     value-length: 2 bytes (big-endian u16)
//     value:        value-length bytes
// end-of-attributes-tag: 1 byte (0x03)
// ```
//
// Additional values of a multi-valued attribute repeat with name-length = 0.
// Collection values expand into begCollection / memberAttrName /
// endCollection framing.

use crate::tag::{DelimiterTag, ValueTag};
use crate::value::IppValue;

/// IPP version 1.1 major byte.
pub const IPP_VERSION_MAJOR: u8 = 0x01;

/// IPP version 1.1 minor byte.
pub const IPP_VERSION_MINOR: u8 = 0x01;

/// Operation identifiers (RFC 8011 §4; CUPS operations are 0x4000+).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    PrintJob,
    CancelJob,
    GetJobAttributes,
    GetJobs,
    GetPrinterAttributes,
    HoldJob,
    ReleaseJob,
    CupsGetDefault,
    CupsGetPrinters,
    CupsMoveJob,
}

impl Operation {
    pub fn code(&self) -> u16 {
        match self {
            Self::PrintJob => 0x0002,
            Self::CancelJob => 0x0008,
            Self::GetJobAttributes => 0x0009,
            Self::GetJobs => 0x000a,
            Self::GetPrinterAttributes => 0x000b,
            Self::HoldJob => 0x000c,
            Self::ReleaseJob => 0x000d,
            Self::CupsGetDefault => 0x4001,
            Self::CupsGetPrinters => 0x4002,
            Self::CupsMoveJob => 0x400d,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PrintJob => "Print-Job",
            Self::CancelJob => "Cancel-Job",
            Self::GetJobAttributes => "Get-Job-Attributes",
            Self::GetJobs => "Get-Jobs",
            Self::GetPrinterAttributes => "Get-Printer-Attributes",
            Self::HoldJob => "Hold-Job",
            Self::ReleaseJob => "Release-Job",
            Self::CupsGetDefault => "CUPS-Get-Default",
            Self::CupsGetPrinters => "CUPS-Get-Printers",
            Self::CupsMoveJob => "CUPS-Move-Job",
        }
    }
}

/// IPP response status codes (RFC 8011 §4.1.8). Anything below 0x0100 is
/// success.
pub mod status {
    pub const SUCCESSFUL_OK: u16 = 0x0000;
    pub const CLIENT_ERROR_BAD_REQUEST: u16 = 0x0400;
    pub const CLIENT_ERROR_FORBIDDEN: u16 = 0x0401;
    pub const CLIENT_ERROR_NOT_AUTHENTICATED: u16 = 0x0402;
    pub const CLIENT_ERROR_NOT_AUTHORIZED: u16 = 0x0403;
    pub const CLIENT_ERROR_NOT_FOUND: u16 = 0x0406;
    pub const CLIENT_ERROR_GONE: u16 = 0x0407;
    pub const CLIENT_ERROR_NOT_POSSIBLE: u16 = 0x040c;
    pub const SERVER_ERROR_INTERNAL: u16 = 0x0500;
    pub const SERVER_ERROR_OPERATION_NOT_SUPPORTED: u16 = 0x0501;
    pub const SERVER_ERROR_SERVICE_UNAVAILABLE: u16 = 0x0502;
    pub const SERVER_ERROR_DEVICE_ERROR: u16 = 0x0504;
    pub const SERVER_ERROR_TEMPORARY_ERROR: u16 = 0x0505;
    pub const SERVER_ERROR_NOT_ACCEPTING_JOBS: u16 = 0x0506;
    pub const SERVER_ERROR_BUSY: u16 = 0x0507;
    pub const SERVER_ERROR_JOB_CANCELED: u16 = 0x0508;
}

/// Whether an IPP status code is in the success families.
pub fn is_success(status: u16) -> bool {
    status < 0x0100
}

/// One named attribute with one or more values.
///
/// All values of a multi-valued attribute stay contiguous; the first is
/// encoded with the attribute name, the rest with an empty name.
#[derive(Debug, Clone, PartialEq)]
pub struct IppAttribute {
    pub name: String,
    pub values: Vec<IppValue>,
}

impl IppAttribute {
    pub fn new(name: impl Into<String>, value: IppValue) -> Self {
        Self {
            name: name.into(),
            values: vec![value],
        }
    }

    pub fn multi(name: impl Into<String>, values: Vec<IppValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// The first (often only) value.
    pub fn value(&self) -> &IppValue {
        &self.values[0]
    }
}

/// A delimiter-introduced group of attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeGroup {
    pub tag: DelimiterTag,
    pub attributes: Vec<IppAttribute>,
}

impl AttributeGroup {
    pub fn new(tag: DelimiterTag) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
        }
    }

    /// Find the first attribute with the given name.
    pub fn get(&self, name: &str) -> Option<&IppAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// First value of the named attribute as a string, if it is one.
    pub fn str_value(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|a| a.value().as_str())
    }

    /// First value of the named attribute as an integer or enum.
    pub fn i32_value(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(|a| a.value().as_i32())
    }

    pub fn bool_value(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(|a| a.value().as_bool())
    }

    /// All values of the named attribute rendered as strings.
    pub fn strings(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|a| a.values.iter().map(|v| v.to_string()).collect())
            .unwrap_or_default()
    }

    // -- Fluent construction ------------------------------------------------

    /// Append an attribute with a single value.
    pub fn attr(&mut self, name: &str, value: IppValue) -> &mut Self {
        self.attributes.push(IppAttribute::new(name, value));
        self
    }

    /// Append an additional value to the most recent attribute.
    pub fn additional(&mut self, value: IppValue) -> &mut Self {
        if let Some(last) = self.attributes.last_mut() {
            last.values.push(value);
        }
        self
    }

    pub fn charset(&mut self, name: &str, value: &str) -> &mut Self {
        self.attr(name, IppValue::Charset(value.into()))
    }

    pub fn natural_language(&mut self, name: &str, value: &str) -> &mut Self {
        self.attr(name, IppValue::NaturalLanguage(value.into()))
    }

    pub fn keyword(&mut self, name: &str, value: &str) -> &mut Self {
        self.attr(name, IppValue::Keyword(value.into()))
    }

    pub fn uri(&mut self, name: &str, value: &str) -> &mut Self {
        self.attr(name, IppValue::Uri(value.into()))
    }

    pub fn text(&mut self, name: &str, value: &str) -> &mut Self {
        self.attr(name, IppValue::Text(value.into()))
    }

    pub fn name_attr(&mut self, name: &str, value: &str) -> &mut Self {
        self.attr(name, IppValue::Name(value.into()))
    }

    pub fn mime_media_type(&mut self, name: &str, value: &str) -> &mut Self {
        self.attr(name, IppValue::MimeMediaType(value.into()))
    }

    pub fn integer(&mut self, name: &str, value: i32) -> &mut Self {
        self.attr(name, IppValue::Integer(value))
    }

    pub fn enum_attr(&mut self, name: &str, value: i32) -> &mut Self {
        self.attr(name, IppValue::Enum(value))
    }

    pub fn boolean(&mut self, name: &str, value: bool) -> &mut Self {
        self.attr(name, IppValue::Boolean(value))
    }
}

/// A complete IPP message: header plus ordered attribute groups.
///
/// `code` holds the operation id on requests and the status code on
/// responses; the framing is otherwise identical in both directions.
#[derive(Debug, Clone, PartialEq)]
pub struct IppMessage {
    pub version_major: u8,
    pub version_minor: u8,
    pub code: u16,
    pub request_id: u32,
    pub groups: Vec<AttributeGroup>,
}

impl IppMessage {
    /// A new IPP/1.1 request for the given operation.
    pub fn request(operation: Operation, request_id: u32) -> Self {
        Self {
            version_major: IPP_VERSION_MAJOR,
            version_minor: IPP_VERSION_MINOR,
            code: operation.code(),
            request_id,
            groups: Vec::new(),
        }
    }

    /// A new IPP/1.1 response with the given status code.
    pub fn response(status: u16, request_id: u32) -> Self {
        Self {
            version_major: IPP_VERSION_MAJOR,
            version_minor: IPP_VERSION_MINOR,
            code: status,
            request_id,
            groups: Vec::new(),
        }
    }

    /// Start a new attribute group and return it for fluent population.
    pub fn add_group(&mut self, tag: DelimiterTag) -> &mut AttributeGroup {
        self.groups.push(AttributeGroup::new(tag));
        self.groups.last_mut().expect("group just pushed")
    }

    /// The first group with the given delimiter tag.
    pub fn group(&self, tag: DelimiterTag) -> Option<&AttributeGroup> {
        self.groups.iter().find(|g| g.tag == tag)
    }

    /// All groups with the given delimiter tag, in message order.
    pub fn groups_of(&self, tag: DelimiterTag) -> impl Iterator<Item = &AttributeGroup> {
        self.groups.iter().filter(move |g| g.tag == tag)
    }

    /// The `status-message` operation attribute of a response, if present.
    pub fn status_message(&self) -> Option<&str> {
        self.group(DelimiterTag::OperationAttributes)
            .and_then(|g| g.str_value("status-message"))
    }

    /// Serialize to the binary wire form, ending with the
    /// end-of-attributes tag.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);
        buf.push(self.version_major);
        buf.push(self.version_minor);
        buf.extend_from_slice(&self.code.to_be_bytes());
        buf.extend_from_slice(&self.request_id.to_be_bytes());

        for group in &self.groups {
            buf.push(group.tag.as_u8());
            for attribute in &group.attributes {
                for (i, value) in attribute.values.iter().enumerate() {
                    let name = if i == 0 { attribute.name.as_str() } else { "" };
                    write_value(&mut buf, name, value);
                }
            }
        }

        buf.push(DelimiterTag::EndOfAttributes.as_u8());
        buf
    }
}

/// Encode one value, expanding collections into their multi-unit framing.
fn write_value(buf: &mut Vec<u8>, name: &str, value: &IppValue) {
    match value {
        IppValue::Collection(members) => {
            write_unit(buf, ValueTag::BegCollection.as_u8(), name, &[]);
            for (member_name, member_value) in members {
                write_unit(
                    buf,
                    ValueTag::MemberAttrName.as_u8(),
                    "",
                    member_name.as_bytes(),
                );
                write_value(buf, "", member_value);
            }
            write_unit(buf, ValueTag::EndCollection.as_u8(), "", &[]);
        }
        _ => {
            let mut payload = Vec::new();
            value.write_payload(&mut payload);
            write_unit(buf, value.tag().as_u8(), name, &payload);
        }
    }
}

/// Write a single `value-tag, name-length, name, value-length, value` unit.
fn write_unit(buf: &mut Vec<u8>, value_tag: u8, name: &str, value: &[u8]) {
    buf.push(value_tag);
    let name_bytes = name.as_bytes();
    buf.extend_from_slice(&(name_bytes.len() as u16).to_be_bytes());
    buf.extend_from_slice(name_bytes);
    buf.extend_from_slice(&(value.len() as u16).to_be_bytes());
    buf.extend_from_slice(value);
}
