//! Method bodies in the tiny and fat header formats.
//!
//! # References
//! - ECMA-335 6th Edition, Partition II, Section 25.4 - Common Intermediate Language Physical Layout

use crate::{
    file::io::{read_le, read_le_at, write_le_into},
    metadata::{
        method::{ExceptionHandler, ExceptionHandlerFlags, MethodBodyFlags, SectionFlags},
        tables::TableId,
        token::{decode_one_based, one_based_or_null, TableIndex, Token},
    },
    Error::OutOfBounds,
    Result,
};

/// The CIL body of one method.
///
/// `max_stack` is the value recorded in the header. After the instruction stream is modified it
/// must be recomputed with [`crate::assembly::StackDepthAnalyzer`] before the body is emitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodBody {
    /// The instruction stream
    pub code: Vec<u8>,
    /// Maximum operand stack depth recorded for the body
    pub max_stack: u16,
    /// Zero-initialize locals on entry
    pub init_locals: bool,
    /// `StandAloneSig` row describing the locals
    pub local_var_sig: Option<TableIndex>,
    /// Exception handling clauses
    pub exception_handlers: Vec<ExceptionHandler>,
}

impl MethodBody {
    /// A body with the given instruction stream and no locals or handlers.
    #[must_use]
    pub fn new(code: Vec<u8>) -> Self {
        MethodBody {
            code,
            ..Default::default()
        }
    }

    /// Append an exception handling clause.
    #[must_use]
    pub fn with_handler(mut self, handler: ExceptionHandler) -> Self {
        self.exception_handlers.push(handler);
        self
    }

    /// Parse a method body starting with its header.
    ///
    /// # Errors
    /// Returns an error if the data is empty, truncated, or the header format is unknown.
    pub fn parse(data: &[u8]) -> Result<MethodBody> {
        if data.is_empty() {
            return Err(malformed_error!("Provided data for body parsing is empty"));
        }

        let first_byte = read_le::<u8>(data)?;
        match MethodBodyFlags::from_bits_truncate(u16::from(first_byte & 0b_0000_0011_u8)) {
            MethodBodyFlags::TINY_FORMAT => {
                let size_code = (first_byte >> 2) as usize;
                if size_code + 1 > data.len() {
                    return Err(OutOfBounds);
                }

                Ok(MethodBody {
                    code: data[1..=size_code].to_vec(),
                    max_stack: 8,
                    ..Default::default()
                })
            }
            MethodBodyFlags::FAT_FORMAT => {
                if data.len() < 12 {
                    return Err(OutOfBounds);
                }

                let first_duo = read_le::<u16>(data)?;
                let size_header = ((first_duo >> 12) * 4) as usize;
                let size_code = read_le::<u32>(&data[4..])? as usize;
                let Some(code_end) = size_header.checked_add(size_code) else {
                    return Err(OutOfBounds);
                };
                if size_header < 12 || data.len() < code_end {
                    return Err(OutOfBounds);
                }

                let flags = MethodBodyFlags::from_bits_truncate(first_duo & 0x0FFF);
                let local_var_sig = match decode_one_based(Token::new(read_le::<u32>(&data[8..])?))? {
                    Some(index) if index.table != TableId::StandAloneSig => {
                        return Err(malformed_error!(
                            "Local variable signature token points into {:?}",
                            index.table
                        ))
                    }
                    other => other,
                };

                let exception_handlers = if flags.contains(MethodBodyFlags::MORE_SECTS) {
                    parse_sections(data, (code_end + 3) & !3)?
                } else {
                    Vec::new()
                };

                Ok(MethodBody {
                    code: data[size_header..code_end].to_vec(),
                    max_stack: read_le::<u16>(&data[2..])?,
                    init_locals: flags.contains(MethodBodyFlags::INIT_LOCALS),
                    local_var_sig,
                    exception_handlers,
                })
            }
            _ => Err(malformed_error!(
                "MethodHeader is neither FAT nor TINY - {}",
                first_byte
            )),
        }
    }

    /// Serialize the body with a fat header and, if present, one fat exception section.
    ///
    /// # Errors
    /// Returns an error if the local signature row cannot be encoded as a token.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut flags = MethodBodyFlags::FAT_FORMAT;
        if self.init_locals {
            flags |= MethodBodyFlags::INIT_LOCALS;
        }
        if !self.exception_handlers.is_empty() {
            flags |= MethodBodyFlags::MORE_SECTS;
        }

        let mut data = Vec::with_capacity(12 + self.code.len());
        write_le_into(&mut data, (3_u16 << 12) | flags.bits());
        write_le_into(&mut data, self.max_stack);
        write_le_into(&mut data, self.code.len() as u32);
        write_le_into(&mut data, one_based_or_null(self.local_var_sig)?.value());
        data.extend_from_slice(&self.code);

        if !self.exception_handlers.is_empty() {
            while data.len() % 4 != 0 {
                data.push(0);
            }

            let section_size = 4 + 24 * self.exception_handlers.len() as u32;
            write_le_into(
                &mut data,
                u32::from((SectionFlags::EHTABLE | SectionFlags::FAT_FORMAT).bits())
                    | (section_size << 8),
            );
            for handler in &self.exception_handlers {
                let last = if handler.is_filter() {
                    handler.filter_offset
                } else {
                    handler.class_token
                };
                write_le_into(&mut data, u32::from(handler.flags.bits()));
                write_le_into(&mut data, handler.try_offset);
                write_le_into(&mut data, handler.try_length);
                write_le_into(&mut data, handler.handler_offset);
                write_le_into(&mut data, handler.handler_length);
                write_le_into(&mut data, last);
            }
        }

        Ok(data)
    }
}

fn parse_sections(data: &[u8], start: usize) -> Result<Vec<ExceptionHandler>> {
    let mut handlers = Vec::new();
    let mut cursor = start;

    while data.len() > cursor + 4 {
        let section_flags = SectionFlags::from_bits_truncate(read_le::<u8>(&data[cursor..])?);
        if !section_flags.contains(SectionFlags::EHTABLE) {
            break;
        }

        if section_flags.contains(SectionFlags::FAT_FORMAT) {
            let section_size = read_le::<u32>(&data[cursor..])? >> 8;
            if section_size < 4 || data.len() < cursor + section_size as usize {
                return Err(OutOfBounds);
            }

            cursor += 4;
            for _ in 0..(section_size - 4) / 24 {
                #[allow(clippy::cast_possible_truncation)]
                let flags = ExceptionHandlerFlags::from_bits_truncate(
                    read_le_at::<u32>(data, &mut cursor)? as u16,
                );
                handlers.push(ExceptionHandler::from_raw(
                    flags,
                    read_le_at::<u32>(data, &mut cursor)?,
                    read_le_at::<u32>(data, &mut cursor)?,
                    read_le_at::<u32>(data, &mut cursor)?,
                    read_le_at::<u32>(data, &mut cursor)?,
                    read_le_at::<u32>(data, &mut cursor)?,
                ));
            }
        } else {
            let section_size = u32::from(read_le::<u8>(&data[cursor + 1..])?);
            if section_size < 4 || data.len() < cursor + section_size as usize {
                return Err(OutOfBounds);
            }

            cursor += 4;
            for _ in 0..(section_size - 4) / 12 {
                let flags =
                    ExceptionHandlerFlags::from_bits_truncate(read_le_at::<u16>(data, &mut cursor)?);
                handlers.push(ExceptionHandler::from_raw(
                    flags,
                    u32::from(read_le_at::<u16>(data, &mut cursor)?),
                    u32::from(read_le_at::<u8>(data, &mut cursor)?),
                    u32::from(read_le_at::<u16>(data, &mut cursor)?),
                    u32::from(read_le_at::<u8>(data, &mut cursor)?),
                    read_le_at::<u32>(data, &mut cursor)?,
                ));
            }
        }

        if !section_flags.contains(SectionFlags::MORE_SECTS) {
            break;
        }
        cursor = (cursor + 3) & !3;
    }

    Ok(handlers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiny() {
        // ldc.i4.1; ldc.i4.2; add; ret
        let data = [0x12, 0x17, 0x18, 0x58, 0x2A];
        let body = MethodBody::parse(&data).unwrap();

        assert_eq!(body.code, vec![0x17, 0x18, 0x58, 0x2A]);
        assert_eq!(body.max_stack, 8);
        assert!(!body.init_locals);
        assert!(body.local_var_sig.is_none());
        assert!(body.exception_handlers.is_empty());
    }

    #[test]
    fn tiny_truncated() {
        assert!(matches!(MethodBody::parse(&[0x12, 0x17]), Err(OutOfBounds)));
        assert!(MethodBody::parse(&[]).is_err());
    }

    #[test]
    fn fat_with_small_eh_section() {
        let mut data = vec![
            0x1B, 0x30, // fat, more sections, init locals, header size 3
            0x02, 0x00, // max stack
            0x04, 0x00, 0x00, 0x00, // code size
            0x01, 0x00, 0x00, 0x11, // StandAloneSig row 1
            0x00, 0x00, 0xDE, 0x00, // nop; nop; leave.s 0
        ];
        data.extend_from_slice(&[
            0x01, 0x10, 0x00, 0x00, // small EH table, 16 bytes
            0x00, 0x00, // catch
            0x00, 0x00, 0x02, // try 0..2
            0x02, 0x00, 0x02, // handler 2..4
            0x05, 0x00, 0x00, 0x01, // TypeDef row 5
        ]);

        let body = MethodBody::parse(&data).unwrap();
        assert_eq!(body.max_stack, 2);
        assert!(body.init_locals);
        assert_eq!(
            body.local_var_sig,
            Some(TableIndex::new(TableId::StandAloneSig, 0))
        );
        assert_eq!(body.code.len(), 4);
        assert_eq!(body.exception_handlers.len(), 1);

        let handler = &body.exception_handlers[0];
        assert!(handler.is_catch());
        assert_eq!(handler.handler_offset, 2);
        assert_eq!(handler.class_token, 0x0100_0005);
    }

    #[test]
    fn fat_rejects_foreign_local_signature() {
        let data = [
            0x03, 0x30, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x02, 0x2A,
        ];
        assert!(matches!(
            MethodBody::parse(&data),
            Err(crate::Error::Malformed { .. })
        ));
    }

    #[test]
    fn serialized_body_parses_back() {
        let body = MethodBody {
            code: vec![0x00, 0x00, 0xDD, 0x00, 0x2A],
            max_stack: 3,
            init_locals: true,
            local_var_sig: Some(TableIndex::new(TableId::StandAloneSig, 4)),
            exception_handlers: vec![ExceptionHandler::from_raw(
                ExceptionHandlerFlags::FILTER,
                0,
                2,
                3,
                1,
                2,
            )],
        };

        let parsed = MethodBody::parse(&body.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, body);
        assert_eq!(parsed.exception_handlers[0].filter_offset, 2);
    }
}
