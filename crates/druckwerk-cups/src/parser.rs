// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPP binary decoder (RFC 8010 §3).
//
// The inverse of `IppMessage::encode`: attribute order within a group and
// the grouping of multi-valued attributes are preserved exactly, so
// `decode(encode(m)) == m` for any well-formed message. Malformed input
// fails with a classified `ProtocolError`, never silently.

use druckwerk_core::error::ProtocolError;

use crate::message::{AttributeGroup, IppAttribute, IppMessage};
use crate::tag::{DelimiterTag, ValueTag, is_delimiter};
use crate::value::{CollectionMember, IppValue};

/// Collections nested deeper than this are rejected as `BadOrder`.
const MAX_COLLECTION_DEPTH: usize = 16;

/// One raw `value-tag, name, value` unit as read off the wire.
struct ValueUnit<'a> {
    tag: ValueTag,
    name: &'a [u8],
    payload: &'a [u8],
}

/// An in-progress collection value.
struct CollectionFrame {
    /// Name of this collection inside its parent collection; `None` at the
    /// outermost level, where the decoder's pending attribute name applies.
    member_name: Option<String>,
    members: Vec<CollectionMember>,
    /// A `memberAttrName` was read and its value unit is still pending.
    pending_member: Option<String>,
}

/// Decode a binary IPP message.
///
/// Bytes after the end-of-attributes tag (a Print-Job document, if the
/// message is a request) are not part of the attribute structure and are
/// ignored here.
pub fn decode(data: &[u8]) -> Result<IppMessage, ProtocolError> {
    if data.len() < 8 {
        return Err(ProtocolError::Truncated(format!(
            "{} bytes is below the 8-byte header",
            data.len()
        )));
    }

    let version_major = data[0];
    let version_minor = data[1];
    let code = u16::from_be_bytes([data[2], data[3]]);
    let request_id = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);

    let mut message = IppMessage {
        version_major,
        version_minor,
        code,
        request_id,
        groups: Vec::new(),
    };

    let mut pos = 8;
    let mut current: Option<AttributeGroup> = None;
    // Collection state: the name the finished collection will be stored
    // under (None = additional value of the previous attribute), plus the
    // stack of open collections.
    let mut collection_attr: Option<Option<String>> = None;
    let mut stack: Vec<CollectionFrame> = Vec::new();
    let mut saw_end = false;

    while pos < data.len() {
        let byte = data[pos];

        if is_delimiter(byte) {
            if !stack.is_empty() {
                return Err(ProtocolError::BadOrder(
                    "group delimiter inside an open collection".into(),
                ));
            }
            let tag = DelimiterTag::from_u8(byte)?;
            pos += 1;
            if let Some(group) = current.take() {
                message.groups.push(group);
            }
            if tag == DelimiterTag::EndOfAttributes {
                saw_end = true;
                break;
            }
            current = Some(AttributeGroup::new(tag));
            continue;
        }

        let unit = read_unit(data, &mut pos)?;

        let group = match current.as_mut() {
            Some(group) => group,
            None => {
                return Err(ProtocolError::BadOrder(
                    "attribute before any group delimiter".into(),
                ));
            }
        };

        match unit.tag {
            ValueTag::BegCollection => {
                let member_name = if stack.is_empty() {
                    // Outermost collection: the unit name decides whether
                    // this is a new attribute or an additional value.
                    collection_attr = Some(if unit.name.is_empty() {
                        None
                    } else {
                        Some(lossy(unit.name))
                    });
                    None
                } else {
                    let frame = stack.last_mut().expect("non-empty stack");
                    match frame.pending_member.take() {
                        Some(name) => Some(name),
                        None => {
                            return Err(ProtocolError::BadOrder(
                                "nested collection without a member name".into(),
                            ));
                        }
                    }
                };
                if stack.len() >= MAX_COLLECTION_DEPTH {
                    return Err(ProtocolError::BadOrder(format!(
                        "collection nesting beyond {MAX_COLLECTION_DEPTH} levels"
                    )));
                }
                stack.push(CollectionFrame {
                    member_name,
                    members: Vec::new(),
                    pending_member: None,
                });
            }
            ValueTag::MemberAttrName => {
                let frame = stack.last_mut().ok_or_else(|| {
                    ProtocolError::BadOrder("memberAttrName outside a collection".into())
                })?;
                if frame.pending_member.is_some() {
                    return Err(ProtocolError::BadOrder(
                        "member name with no value before the next member".into(),
                    ));
                }
                frame.pending_member = Some(lossy(unit.payload));
            }
            ValueTag::EndCollection => {
                let frame = stack.pop().ok_or_else(|| {
                    ProtocolError::BadOrder("endCollection without begCollection".into())
                })?;
                if frame.pending_member.is_some() {
                    return Err(ProtocolError::BadOrder(
                        "collection closed with a member name still pending".into(),
                    ));
                }
                let value = IppValue::Collection(frame.members);
                match stack.last_mut() {
                    Some(parent) => {
                        let name = frame.member_name.expect("nested frame has member name");
                        parent.members.push((name, value));
                    }
                    None => {
                        let name = collection_attr.take().expect("outer collection has a target");
                        push_value(group, name, value)?;
                    }
                }
            }
            _ => {
                let value = IppValue::parse(unit.tag, unit.payload)?;
                match stack.last_mut() {
                    Some(frame) => match frame.pending_member.take() {
                        Some(name) => frame.members.push((name, value)),
                        None => {
                            return Err(ProtocolError::BadOrder(
                                "collection value without a member name".into(),
                            ));
                        }
                    },
                    None => {
                        let name = if unit.name.is_empty() {
                            None
                        } else {
                            Some(lossy(unit.name))
                        };
                        push_value(group, name, value)?;
                    }
                }
            }
        }
    }

    if !stack.is_empty() {
        return Err(ProtocolError::Truncated("collection left open".into()));
    }
    if !saw_end {
        if let Some(group) = current.take() {
            message.groups.push(group);
        }
        return Err(ProtocolError::Truncated(
            "missing end-of-attributes tag".into(),
        ));
    }

    Ok(message)
}

/// Append a decoded value to the group: named values start a new attribute,
/// unnamed ones extend the previous attribute.
fn push_value(
    group: &mut AttributeGroup,
    name: Option<String>,
    value: IppValue,
) -> Result<(), ProtocolError> {
    match name {
        Some(name) => {
            group.attributes.push(IppAttribute::new(name, value));
            Ok(())
        }
        None => match group.attributes.last_mut() {
            Some(last) => {
                last.values.push(value);
                Ok(())
            }
            None => Err(ProtocolError::BadOrder(
                "additional value with no preceding attribute".into(),
            )),
        },
    }
}

/// Read one `value-tag, name-length, name, value-length, value` unit.
fn read_unit<'a>(data: &'a [u8], pos: &mut usize) -> Result<ValueUnit<'a>, ProtocolError> {
    let tag = ValueTag::from_u8(data[*pos])?;
    *pos += 1;

    let name = read_field(data, pos, "attribute name")?;
    let payload = read_field(data, pos, "attribute value")?;

    Ok(ValueUnit { tag, name, payload })
}

/// Read a 2-byte big-endian length followed by that many bytes.
fn read_field<'a>(
    data: &'a [u8],
    pos: &mut usize,
    what: &str,
) -> Result<&'a [u8], ProtocolError> {
    if *pos + 2 > data.len() {
        return Err(ProtocolError::Truncated(format!("{what} length field")));
    }
    let len = u16::from_be_bytes([data[*pos], data[*pos + 1]]) as usize;
    *pos += 2;

    if *pos + len > data.len() {
        return Err(ProtocolError::Truncated(format!(
            "{what} of {len} bytes with {} remaining",
            data.len() - *pos
        )));
    }
    let field = &data[*pos..*pos + len];
    *pos += len;
    Ok(field)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
