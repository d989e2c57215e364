//! Permission set decoding.

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use widestring::U16String;

use crate::{
    metadata::{
        customattributes::{
            CustomAttributeArgument, CustomAttributeNamedArgument, CustomAttributeParser, Decoded,
            EnumLookup,
        },
        security::{Permission, PermissionSet, PermissionSetFormat},
    },
    Result,
};

/// Decode a `DeclSecurity` permission set blob.
///
/// Binary sets resolve enum-typed settings through `lookup`; a failed lookup yields
/// [`Decoded::Unresolved`]. XML sets never consult `lookup`.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for empty or truncated blobs, unknown format markers and
/// invalid XML.
pub fn parse_permission_set(
    data: &[u8],
    lookup: &mut dyn EnumLookup,
) -> Result<Decoded<PermissionSet>> {
    match data {
        [] => Err(malformed_error!("Permission set blob is empty")),
        [b'.', ..] => {
            let mut parser = CustomAttributeParser::new(data, lookup);
            parser.finish(parse_binary_format)
        }
        [b'<', ..] | [0xFF, 0xFE, ..] => Ok(Decoded::Complete(parse_xml_format(data)?)),
        [marker, ..] => Err(malformed_error!(
            "Unknown permission set format marker - 0x{:02X}",
            marker
        )),
    }
}

/// `.`, permission count, then per permission its attribute type name and a length-prefixed
/// blob holding the named arguments.
fn parse_binary_format(parser: &mut CustomAttributeParser<'_, '_>) -> Result<PermissionSet> {
    parser.parser().advance_by(1)?;

    let count = parser.parser().read_compressed_uint()?;
    let mut permissions = Vec::with_capacity(count.min(64) as usize);
    for _ in 0..count {
        let Some(class_name) = parser.parser().read_ser_string()? else {
            return Err(malformed_error!("Permission without a class name"));
        };

        let blob_length = parser.parser().read_compressed_uint()? as usize;
        let blob_start = parser.parser().pos();
        let Some(blob_end) = blob_start.checked_add(blob_length) else {
            return Err(malformed_error!(
                "Blob end overflow - {} + {}",
                blob_start,
                blob_length
            ));
        };
        if blob_end > parser.parser().len() {
            return Err(malformed_error!(
                "Blob end position {} exceeds data length {}",
                blob_end,
                parser.parser().len()
            ));
        }

        let named_args = if blob_length > 0 {
            let arg_count = parser.parser().read_compressed_uint()?;
            parser.parse_named_arguments(arg_count)?
        } else {
            Vec::new()
        };

        if parser.parser().pos() > blob_end {
            return Err(malformed_error!(
                "Arguments of {} overrun their blob by {} bytes",
                class_name,
                parser.parser().pos() - blob_end
            ));
        }
        parser.parser().seek(blob_end)?;

        permissions.push(Permission {
            class_name,
            named_args,
        });
    }

    Ok(PermissionSet {
        format: PermissionSetFormat::Binary,
        permissions,
        unrestricted: false,
    })
}

fn parse_xml_format(data: &[u8]) -> Result<PermissionSet> {
    let text = decode_xml_text(data)?;

    let mut reader = Reader::from_str(&text);
    reader.config_mut().trim_text(true);

    let mut root_seen = false;
    let mut unrestricted = false;
    let mut permissions = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(element) | Event::Empty(element)) => {
                match element.local_name().as_ref() {
                    b"PermissionSet" => {
                        root_seen = true;
                        unrestricted = read_attributes(&element)?
                            .iter()
                            .any(|(key, value)| {
                                key == "Unrestricted" && value.eq_ignore_ascii_case("true")
                            });
                    }
                    b"IPermission" | b"Permission" => {
                        let mut class_name = None;
                        let mut named_args = Vec::new();
                        for (key, value) in read_attributes(&element)? {
                            if key == "class" {
                                class_name = Some(value);
                            } else {
                                named_args.push(CustomAttributeNamedArgument {
                                    is_field: false,
                                    name: key,
                                    arg_type: "String".to_string(),
                                    value: CustomAttributeArgument::String(Some(value)),
                                });
                            }
                        }

                        let Some(class_name) = class_name else {
                            return Err(malformed_error!("XML permission without a class"));
                        };
                        permissions.push(Permission {
                            class_name,
                            named_args,
                        });
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => {
                return Err(malformed_error!(
                    "Invalid XML permission set at {} - {}",
                    reader.buffer_position(),
                    error
                ))
            }
        }
    }

    if !root_seen {
        return Err(malformed_error!("XML permission set has no PermissionSet element"));
    }

    Ok(PermissionSet {
        format: PermissionSetFormat::Xml,
        permissions,
        unrestricted,
    })
}

/// XML sets are stored as UTF-16LE; tolerate a byte order mark, a trailing NUL and UTF-8 text.
fn decode_xml_text(data: &[u8]) -> Result<String> {
    let is_utf16 = data.starts_with(&[0xFF, 0xFE]) || data.get(1) == Some(&0x00);
    let text = if is_utf16 {
        if data.len() % 2 != 0 {
            return Err(malformed_error!(
                "UTF-16 permission set has odd length {}",
                data.len()
            ));
        }

        let units: Vec<u16> = data
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        U16String::from_vec(units)
            .to_string()
            .map_err(|error| malformed_error!("Invalid UTF-16 permission set - {}", error))?
    } else {
        String::from_utf8(data.to_vec())
            .map_err(|error| malformed_error!("Invalid UTF-8 permission set - {}", error))?
    };

    Ok(text
        .trim_start_matches('\u{FEFF}')
        .trim_end_matches('\0')
        .to_string())
}

fn read_attributes(element: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut attributes = Vec::new();
    for attribute in element.attributes() {
        let attribute =
            attribute.map_err(|error| malformed_error!("Invalid XML attribute - {}", error))?;
        let value = attribute
            .unescape_value()
            .map_err(|error| malformed_error!("Invalid XML attribute value - {}", error))?;
        attributes.push((
            String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
            value.into_owned(),
        ));
    }
    Ok(attributes)
}
