//! Coded indices (ECMA-335 II.24.2.6).
//!
//! A coded index packs a reference to one of several possible tables into a single value: the
//! low bits select the table out of a fixed tag list, the remaining bits carry the one-based
//! row. Inside the logical model every reference is already a [`TableIndex`]; the coded form is
//! still needed for the sort order of the sorted tables (which the persisted format defines in
//! terms of the coded value) and for the compressed `TypeDefOrRef` tokens of signatures.

use strum::{EnumCount, EnumIter};

use crate::{
    metadata::{tables::TableId, token::TableIndex},
    Result,
};

/// All coded index combinations defined in ECMA-335.
///
/// The order of the slice returned by [`CodedIndexType::tables`] is the tag order of the
/// persisted format.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy, EnumIter, EnumCount)]
pub enum CodedIndexType {
    /// `TypeDef`, `TypeRef` or `TypeSpec`.
    TypeDefOrRef,
    /// `Field`, `Param` or `Property`.
    HasConstant,
    /// Anything that can carry a custom attribute.
    HasCustomAttribute,
    /// `Field` or `Param`.
    HasFieldMarshal,
    /// `TypeDef`, `MethodDef` or `Assembly`.
    HasDeclSecurity,
    /// Parent of a `MemberRef`.
    MemberRefParent,
    /// `Event` or `Property`.
    HasSemantics,
    /// `MethodDef` or `MemberRef`.
    MethodDefOrRef,
    /// `Field` or `MethodDef`.
    MemberForwarded,
    /// `File`, `AssemblyRef` or `ExportedType`.
    Implementation,
    /// Constructor of a custom attribute. Tags 0, 1 and 4 are reserved.
    CustomAttributeType,
    /// `Module`, `ModuleRef`, `AssemblyRef` or `TypeRef`.
    ResolutionScope,
    /// `TypeDef` or `MethodDef`.
    TypeOrMethodDef,
}

impl CodedIndexType {
    /// The tables reachable through this coded index, in tag order.
    ///
    /// `None` marks a reserved tag.
    #[must_use]
    pub fn tables(&self) -> &'static [Option<TableId>] {
        match self {
            CodedIndexType::TypeDefOrRef => &[
                Some(TableId::TypeDef),
                Some(TableId::TypeRef),
                Some(TableId::TypeSpec),
            ],
            CodedIndexType::HasConstant => &[
                Some(TableId::Field),
                Some(TableId::Param),
                Some(TableId::Property),
            ],
            CodedIndexType::HasCustomAttribute => &[
                Some(TableId::MethodDef),
                Some(TableId::Field),
                Some(TableId::TypeRef),
                Some(TableId::TypeDef),
                Some(TableId::Param),
                Some(TableId::InterfaceImpl),
                Some(TableId::MemberRef),
                Some(TableId::Module),
                // Labeled 'Permission' in the standard; no such table exists
                Some(TableId::DeclSecurity),
                Some(TableId::Property),
                Some(TableId::Event),
                Some(TableId::StandAloneSig),
                Some(TableId::ModuleRef),
                Some(TableId::TypeSpec),
                Some(TableId::Assembly),
                Some(TableId::AssemblyRef),
                Some(TableId::File),
                Some(TableId::ExportedType),
                Some(TableId::ManifestResource),
                Some(TableId::GenericParam),
                Some(TableId::GenericParamConstraint),
                Some(TableId::MethodSpec),
            ],
            CodedIndexType::HasFieldMarshal => &[Some(TableId::Field), Some(TableId::Param)],
            CodedIndexType::HasDeclSecurity => &[
                Some(TableId::TypeDef),
                Some(TableId::MethodDef),
                Some(TableId::Assembly),
            ],
            CodedIndexType::MemberRefParent => &[
                Some(TableId::TypeDef),
                Some(TableId::TypeRef),
                Some(TableId::ModuleRef),
                Some(TableId::MethodDef),
                Some(TableId::TypeSpec),
            ],
            CodedIndexType::HasSemantics => &[Some(TableId::Event), Some(TableId::Property)],
            CodedIndexType::MethodDefOrRef => &[Some(TableId::MethodDef), Some(TableId::MemberRef)],
            CodedIndexType::MemberForwarded => &[Some(TableId::Field), Some(TableId::MethodDef)],
            CodedIndexType::Implementation => &[
                Some(TableId::File),
                Some(TableId::AssemblyRef),
                Some(TableId::ExportedType),
            ],
            CodedIndexType::CustomAttributeType => &[
                None,
                None,
                Some(TableId::MethodDef),
                Some(TableId::MemberRef),
                None,
            ],
            CodedIndexType::ResolutionScope => &[
                Some(TableId::Module),
                Some(TableId::ModuleRef),
                Some(TableId::AssemblyRef),
                Some(TableId::TypeRef),
            ],
            CodedIndexType::TypeOrMethodDef => &[Some(TableId::TypeDef), Some(TableId::MethodDef)],
        }
    }

    /// Number of low bits holding the tag.
    #[must_use]
    pub fn tag_bits(&self) -> u32 {
        let tags = self.tables().len() as u32;
        u32::BITS - (tags - 1).leading_zeros()
    }

    /// Returns `true` if `table` is reachable through this coded index.
    #[must_use]
    pub fn contains(&self, table: TableId) -> bool {
        self.tables().contains(&Some(table))
    }

    /// Encode a row address as a coded index (one-based row).
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the table is not part of this coded index or the
    /// row does not fit.
    pub fn encode(&self, index: TableIndex) -> Result<u32> {
        let Some(tag) = self
            .tables()
            .iter()
            .position(|table| *table == Some(index.table))
        else {
            return Err(malformed_error!(
                "{:?} cannot be encoded as {:?}",
                index.table,
                self
            ));
        };

        let bits = self.tag_bits();
        let row = index.row.checked_add(1).filter(|row| *row < (1 << (32 - bits)));
        let Some(row) = row else {
            return Err(malformed_error!("Row {} does not fit {:?}", index.row, self));
        };

        Ok((row << bits) | tag as u32)
    }

    /// Encode an optional reference; `None` encodes as `0`.
    ///
    /// # Errors
    /// Same as [`CodedIndexType::encode`].
    pub fn encode_optional(&self, index: Option<TableIndex>) -> Result<u32> {
        match index {
            Some(index) => self.encode(index),
            None => Ok(0),
        }
    }

    /// Decode a coded index. A zero row is the null reference and yields `None`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an out-of-range or reserved tag.
    pub fn decode(&self, value: u32) -> Result<Option<TableIndex>> {
        let bits = self.tag_bits();
        let tag = (value & ((1 << bits) - 1)) as usize;
        let row = value >> bits;

        let Some(Some(table)) = self.tables().get(tag) else {
            return Err(malformed_error!("Invalid tag {} for {:?}", tag, self));
        };

        if row == 0 {
            return Ok(None);
        }

        Ok(Some(TableIndex::new(*table, row - 1)))
    }

    /// The coded value of `index` for ordering purposes.
    ///
    /// References the coded index cannot express sort after every valid value.
    #[must_use]
    pub fn sort_key(&self, index: TableIndex) -> u64 {
        match self.encode(index) {
            Ok(value) => u64::from(value),
            Err(_) => u64::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use strum::IntoEnumIterator;

    #[test]
    fn tag_widths() {
        assert_eq!(CodedIndexType::TypeDefOrRef.tag_bits(), 2);
        assert_eq!(CodedIndexType::HasConstant.tag_bits(), 2);
        assert_eq!(CodedIndexType::HasCustomAttribute.tag_bits(), 5);
        assert_eq!(CodedIndexType::HasFieldMarshal.tag_bits(), 1);
        assert_eq!(CodedIndexType::MemberRefParent.tag_bits(), 3);
        assert_eq!(CodedIndexType::CustomAttributeType.tag_bits(), 3);
        assert_eq!(CodedIndexType::ResolutionScope.tag_bits(), 2);
    }

    #[test]
    fn encode_decode_every_member() {
        for coded in CodedIndexType::iter() {
            for table in coded.tables().iter().flatten() {
                let index = TableIndex::new(*table, 41);
                let value = coded.encode(index).unwrap();
                assert_eq!(coded.decode(value).unwrap(), Some(index));
            }
        }
    }

    #[test]
    fn known_values() {
        // TypeRef row 1 (one-based) as TypeDefOrRef: (1 << 2) | 1
        let value = CodedIndexType::TypeDefOrRef
            .encode(TableIndex::new(TableId::TypeRef, 0))
            .unwrap();
        assert_eq!(value, 0x05);

        // MemberRef row 3 (one-based) as CustomAttributeType: (3 << 3) | 3
        let value = CodedIndexType::CustomAttributeType
            .encode(TableIndex::new(TableId::MemberRef, 2))
            .unwrap();
        assert_eq!(value, 0x1B);
    }

    #[test]
    fn foreign_table_and_reserved_tag() {
        assert!(matches!(
            CodedIndexType::HasSemantics.encode(TableIndex::new(TableId::Field, 0)),
            Err(Error::Malformed { .. })
        ));
        assert!(CodedIndexType::CustomAttributeType.decode(0x09).is_err());
        assert_eq!(CodedIndexType::CustomAttributeType.decode(0x02).unwrap(), None);
    }

    #[test]
    fn sort_key_orders_by_coded_value() {
        let coded = CodedIndexType::HasCustomAttribute;
        let method = coded.sort_key(TableIndex::new(TableId::MethodDef, 0));
        let field = coded.sort_key(TableIndex::new(TableId::Field, 0));
        let later_method = coded.sort_key(TableIndex::new(TableId::MethodDef, 1));
        assert!(method < field);
        assert!(field < later_method);
        assert_eq!(coded.sort_key(TableIndex::new(TableId::EncLog, 0)), u64::MAX);
    }
}
