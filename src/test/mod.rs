//! Shared fixtures for unit tests: hand-built modules and key blobs.


use std::sync::{Arc, OnceLock};

use crate::metadata::{
    customattributes::AttributeBlob,
    method::MethodBody,
    security::SecurityBlob,
    tables::{
        AssemblyRefRow, AssemblyRow, CustomAttributeRow, DeclSecurityRow, ExportedTypeRow,
        FieldRow, FileRow, MemberRefRow, MethodDefRow, MethodSpecRow, ModuleRefRow, ModuleRow,
        ModuleTables, NestedClassRow, SchemaProvider, StandAloneSigRow, TableId, TableRow,
        TypeDefRow, TypeRefRow,
    },
    token::TableIndex,
};

/// Field signature prolog
const FIELD_SIG: u8 = 0x06;

/// `public` member access
const PUBLIC: u16 = 0x0006;

fn provider() -> Arc<SchemaProvider> {
    static PROVIDER: OnceLock<Arc<SchemaProvider>> = OnceLock::new();
    PROVIDER
        .get_or_init(|| Arc::new(SchemaProvider::standard().expect("standard schemas")))
        .clone()
}

/// Builds a [`ModuleTables`] row by row, keeping `TypeDef` field and method runs consistent.
///
/// Fields are declared together with their type; methods always belong to the most recently
/// added type.
pub struct ModuleBuilder {
    module: ModuleTables,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        let mut module = ModuleTables::new(&provider()).expect("module tables");
        module
            .add_row(ModuleRow {
                name: "App.dll".to_string(),
                ..Default::default()
            })
            .expect("module row");
        ModuleBuilder { module }
    }

    fn add<R: TableRow>(&mut self, row: R) -> TableIndex {
        self.module.add_row(row).expect("row added")
    }

    /// A type with `(name, flags, element type)` fields.
    pub fn type_def(&mut self, namespace: &str, name: &str, fields: &[(&str, u16, u8)]) -> TableIndex {
        let index = self.add(TypeDefRow {
            flags: 0x0001,
            type_name: name.to_string(),
            type_namespace: namespace.to_string(),
            extends: None,
            field_list: self.module.row_count(TableId::Field),
            method_list: self.module.row_count(TableId::MethodDef),
        });

        for &(field_name, flags, element_type) in fields {
            self.add(FieldRow {
                flags,
                name: field_name.to_string(),
                signature: vec![FIELD_SIG, element_type],
            });
        }

        index
    }

    /// Declare `nested` as nested inside `enclosing`.
    pub fn nest(&mut self, nested: TableIndex, enclosing: TableIndex) -> TableIndex {
        self.add(NestedClassRow {
            nested_class: nested,
            enclosing_class: enclosing,
        })
    }

    /// A body-less method of `owner`, which must be the last type added.
    pub fn method(&mut self, owner: TableIndex, name: &str, signature: Vec<u8>) -> TableIndex {
        self.method_row(owner, name, signature, None)
    }

    /// A method of `owner` with `body`; `owner` must be the last type added.
    pub fn method_with_body(
        &mut self,
        owner: TableIndex,
        name: &str,
        signature: Vec<u8>,
        body: MethodBody,
    ) -> TableIndex {
        self.method_row(owner, name, signature, Some(body))
    }

    fn method_row(
        &mut self,
        owner: TableIndex,
        name: &str,
        signature: Vec<u8>,
        body: Option<MethodBody>,
    ) -> TableIndex {
        assert_eq!(owner.table, TableId::TypeDef);
        assert_eq!(
            owner.row + 1,
            self.module.row_count(TableId::TypeDef),
            "methods go to the last type"
        );

        self.add(MethodDefRow {
            rva: 0,
            impl_flags: 0,
            flags: PUBLIC,
            name: name.to_string(),
            signature,
            param_list: 0,
            body,
        })
    }

    pub fn member_ref(&mut self, class: TableIndex, name: &str, signature: Vec<u8>) -> TableIndex {
        self.add(MemberRefRow {
            class,
            name: name.to_string(),
            signature,
        })
    }

    /// A generic instantiation of `method` with one `int32` argument.
    pub fn method_spec(&mut self, method: TableIndex) -> TableIndex {
        self.add(MethodSpecRow {
            method,
            instantiation: vec![0x0A, 0x01, 0x08],
        })
    }

    pub fn stand_alone_sig(&mut self, signature: Vec<u8>) -> TableIndex {
        self.add(StandAloneSigRow { signature })
    }

    /// The `Assembly` row of this module.
    pub fn assembly(&mut self, name: &str, version: (u16, u16, u16, u16)) -> TableIndex {
        self.add(AssemblyRow {
            hash_alg_id: 0x8004,
            major_version: version.0,
            minor_version: version.1,
            build_number: version.2,
            revision_number: version.3,
            name: name.to_string(),
            ..Default::default()
        })
    }

    /// A reference to version 1.0.0.0 of `name`, neutral culture, no key.
    pub fn assembly_ref(&mut self, name: &str) -> TableIndex {
        self.add(AssemblyRefRow {
            major_version: 1,
            name: name.to_string(),
            ..Default::default()
        })
    }

    pub fn module_ref(&mut self, name: &str) -> TableIndex {
        self.add(ModuleRefRow {
            name: name.to_string(),
        })
    }

    /// A `File` row for a module file without metadata hash.
    pub fn file(&mut self, name: &str) -> TableIndex {
        self.add(FileRow {
            flags: 0,
            name: name.to_string(),
            hash_value: Vec::new(),
        })
    }

    pub fn type_ref(&mut self, scope: Option<TableIndex>, namespace: &str, name: &str) -> TableIndex {
        self.add(TypeRefRow {
            resolution_scope: scope,
            type_name: name.to_string(),
            type_namespace: namespace.to_string(),
        })
    }

    pub fn exported_type(&mut self, namespace: &str, name: &str, implementation: TableIndex) -> TableIndex {
        self.add(ExportedTypeRow {
            flags: 0x0020_0000,
            type_def_id: 0,
            type_name: name.to_string(),
            type_namespace: namespace.to_string(),
            implementation,
        })
    }

    pub fn custom_attribute(&mut self, parent: TableIndex, constructor: TableIndex, blob: Vec<u8>) -> TableIndex {
        self.add(CustomAttributeRow {
            parent,
            constructor,
            value: AttributeBlob::Raw(blob),
        })
    }

    pub fn decl_security(&mut self, action: u16, parent: TableIndex, blob: Vec<u8>) -> TableIndex {
        self.add(DeclSecurityRow {
            action,
            parent,
            permission_set: SecurityBlob::Raw(blob),
        })
    }

    /// A `TargetFrameworkAttribute` on the assembly, naming `moniker`.
    pub fn target_framework(&mut self, moniker: &str) -> TableIndex {
        let mscorlib = self.assembly_ref("mscorlib");
        let attribute = self.type_ref(
            Some(mscorlib),
            "System.Runtime.Versioning",
            "TargetFrameworkAttribute",
        );
        // instance void (string)
        let ctor = self.member_ref(attribute, ".ctor", vec![0x20, 0x01, 0x01, 0x0E]);

        let mut blob = vec![0x01, 0x00];
        let length = u8::try_from(moniker.len()).expect("short moniker");
        assert!(length < 0x80);
        blob.push(length);
        blob.extend_from_slice(moniker.as_bytes());
        blob.extend_from_slice(&[0x00, 0x00]);

        self.custom_attribute(TableIndex::new(TableId::Assembly, 0), ctor, blob)
    }

    pub fn build(self) -> ModuleTables {
        self.module
    }
}

impl Default for ModuleBuilder {
    fn default() -> Self {
        ModuleBuilder::new()
    }
}
