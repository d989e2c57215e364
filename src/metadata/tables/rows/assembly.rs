//! Rows of the manifest tables, `Assembly` (0x20) through `ManifestResource` (0x28).

use crate::metadata::token::TableIndex;

metadata_row! {
    /// The `Assembly` table (0x20), at most one row.
    pub struct AssemblyRow: Assembly {
        /// `AssemblyHashAlgorithm` of the file hashes
        hash_alg_id: u32,
        /// Version major component
        major_version: u16,
        /// Version minor component
        minor_version: u16,
        /// Version build component
        build_number: u16,
        /// Version revision component
        revision_number: u16,
        /// `AssemblyFlags`
        flags: u32,
        /// Full strong-name public key, empty for unsigned assemblies
        public_key: Vec<u8>,
        /// Simple name
        name: String,
        /// Culture, empty for neutral
        culture: String,
    }
}

metadata_row! {
    /// The `AssemblyProcessor` table (0x21).
    pub struct AssemblyProcessorRow: AssemblyProcessor {
        /// Processor id
        processor: u32,
    }
}

metadata_row! {
    /// The `AssemblyOS` table (0x22).
    pub struct AssemblyOsRow: AssemblyOS {
        /// Platform id
        os_platform_id: u32,
        /// OS major version
        os_major_version: u32,
        /// OS minor version
        os_minor_version: u32,
    }
}

metadata_row! {
    /// The `AssemblyRef` table (0x23).
    pub struct AssemblyRefRow: AssemblyRef {
        /// Version major component
        major_version: u16,
        /// Version minor component
        minor_version: u16,
        /// Version build component
        build_number: u16,
        /// Version revision component
        revision_number: u16,
        /// `AssemblyFlags`; bit `0x0001` marks a full public key
        flags: u32,
        /// Full public key or 8-byte public key token
        public_key_or_token: Vec<u8>,
        /// Simple name
        name: String,
        /// Culture, empty for neutral
        culture: String,
        /// Hash of the referenced file
        hash_value: Vec<u8>,
    }
}

metadata_row! {
    /// The `AssemblyRefProcessor` table (0x24).
    pub struct AssemblyRefProcessorRow: AssemblyRefProcessor {
        /// Processor id
        processor: u32,
        /// The `AssemblyRef`
        assembly_ref: TableIndex,
    }
}

metadata_row! {
    /// The `AssemblyRefOS` table (0x25).
    pub struct AssemblyRefOsRow: AssemblyRefOS {
        /// Platform id
        os_platform_id: u32,
        /// OS major version
        os_major_version: u32,
        /// OS minor version
        os_minor_version: u32,
        /// The `AssemblyRef`
        assembly_ref: TableIndex,
    }
}

metadata_row! {
    /// The `File` table (0x26).
    pub struct FileRow: File {
        /// `FileAttributes`
        flags: u32,
        /// File name
        name: String,
        /// Hash of the file
        hash_value: Vec<u8>,
    }
}

metadata_row! {
    /// The `ExportedType` table (0x27).
    pub struct ExportedTypeRow: ExportedType {
        /// `TypeAttributes`
        flags: u32,
        /// `TypeDef` token hint in the defining module
        type_def_id: u32,
        /// Simple type name
        type_name: String,
        /// Namespace
        type_namespace: String,
        /// `Implementation`: `File`, `AssemblyRef` or enclosing `ExportedType`
        implementation: TableIndex,
    }
}

metadata_row! {
    /// The `ManifestResource` table (0x28).
    pub struct ManifestResourceRow: ManifestResource {
        /// Offset of the resource data
        offset: u32,
        /// `ManifestResourceAttributes`
        flags: u32,
        /// Resource name
        name: String,
        /// `Implementation`, absent for resources embedded in this module
        implementation: Option<TableIndex>,
    }
}
