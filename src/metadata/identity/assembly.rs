//! Assembly display names and the identity they describe.
//!
//! A display name is the simple name followed by optional `Key=Value` components:
//!
//! ```text
//! mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089
//! ```

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use crate::{
    metadata::{
        identity::derive_identity_token,
        tables::{AssemblyRefRow, AssemblyRow},
    },
    Result,
};

/// `AssemblyFlags.PublicKey`: the key column holds a full public key instead of a token
const ASSEMBLY_FLAGS_PUBLIC_KEY: u32 = 0x0001;

/// Four-part assembly version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AssemblyVersion {
    /// Major component
    pub major: u16,
    /// Minor component
    pub minor: u16,
    /// Build component
    pub build: u16,
    /// Revision component
    pub revision: u16,
}

impl AssemblyVersion {
    /// Create a version from its components.
    #[must_use]
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        AssemblyVersion {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Parse a version of one to four dot-separated components; missing ones are zero.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for empty components, more than four components or
    /// components that do not fit into 16 bits.
    pub fn parse(version: &str) -> Result<Self> {
        let parts: Vec<&str> = version.trim().split('.').collect();
        if parts.len() > 4 {
            return Err(malformed_error!("Invalid version format: {}", version));
        }

        let mut components = [0u16; 4];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = part
                .parse::<u16>()
                .map_err(|_| malformed_error!("Invalid version component: '{}'", part))?;
        }

        Ok(AssemblyVersion::new(
            components[0],
            components[1],
            components[2],
            components[3],
        ))
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

impl FromStr for AssemblyVersion {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        AssemblyVersion::parse(s)
    }
}

/// Processor architecture component of a display name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorArchitecture {
    /// Architecture neutral
    MSIL,
    /// 32-bit x86
    X86,
    /// Itanium
    IA64,
    /// x86-64
    AMD64,
    /// 32-bit ARM
    ARM,
    /// 64-bit ARM
    ARM64,
}

impl ProcessorArchitecture {
    /// Parse an architecture name, ignoring case.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for unknown names.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "msil" => Ok(ProcessorArchitecture::MSIL),
            "x86" => Ok(ProcessorArchitecture::X86),
            "ia64" => Ok(ProcessorArchitecture::IA64),
            "amd64" | "x64" => Ok(ProcessorArchitecture::AMD64),
            "arm" => Ok(ProcessorArchitecture::ARM),
            "arm64" => Ok(ProcessorArchitecture::ARM64),
            _ => Err(malformed_error!("Unknown processor architecture: {}", name)),
        }
    }
}

impl fmt::Display for ProcessorArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProcessorArchitecture::MSIL => "MSIL",
            ProcessorArchitecture::X86 => "x86",
            ProcessorArchitecture::IA64 => "IA64",
            ProcessorArchitecture::AMD64 => "AMD64",
            ProcessorArchitecture::ARM => "ARM",
            ProcessorArchitecture::ARM64 => "ARM64",
        })
    }
}

/// The strong-name part of an identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrongName {
    /// Full public key, as stored in the `Assembly` table
    PublicKey(Vec<u8>),
    /// Public key token
    Token([u8; 8]),
}

impl StrongName {
    /// The public key token, derived for full keys.
    #[must_use]
    pub fn token(&self) -> [u8; 8] {
        match self {
            StrongName::PublicKey(key) => derive_identity_token(key),
            StrongName::Token(token) => *token,
        }
    }
}

/// Name, version, culture and strong name of an assembly.
///
/// Two identities are equal when their names match ignoring ASCII case and their versions,
/// cultures and public key tokens match. A full public key and its token compare equal.
#[derive(Debug, Clone)]
pub struct AssemblyIdentity {
    /// Simple name
    pub name: String,
    /// Version
    pub version: AssemblyVersion,
    /// Culture, `None` for neutral
    pub culture: Option<String>,
    /// Strong name, `None` for unsigned assemblies
    pub strong_name: Option<StrongName>,
    /// Processor architecture, only ever set from display names
    pub processor_architecture: Option<ProcessorArchitecture>,
}

impl AssemblyIdentity {
    /// Create a culture neutral identity without strong name.
    #[must_use]
    pub fn new(name: impl Into<String>, version: AssemblyVersion) -> Self {
        AssemblyIdentity {
            name: name.into(),
            version,
            culture: None,
            strong_name: None,
            processor_architecture: None,
        }
    }

    /// Parse a display name.
    ///
    /// ```rust
    /// use cilweave::metadata::identity::{AssemblyIdentity, AssemblyVersion};
    ///
    /// let identity = AssemblyIdentity::parse(
    ///     "mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089",
    /// )?;
    /// assert_eq!(identity.name, "mscorlib");
    /// assert_eq!(identity.version, AssemblyVersion::new(4, 0, 0, 0));
    /// assert_eq!(identity.culture, None);
    /// # Ok::<(), cilweave::Error>(())
    /// ```
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an empty name or malformed components.
    /// Unknown components are ignored.
    pub fn parse(display_name: &str) -> Result<Self> {
        let mut parts = display_name.split(',').map(str::trim);
        let name = parts.next().unwrap_or_default();
        if name.is_empty() {
            return Err(malformed_error!("Assembly name cannot be empty"));
        }

        let mut identity = AssemblyIdentity::new(name, AssemblyVersion::default());
        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "version" => identity.version = AssemblyVersion::parse(value)?,
                "culture" => {
                    identity.culture = (!value.eq_ignore_ascii_case("neutral") && !value.is_empty())
                        .then(|| value.to_string());
                }
                "publickeytoken" => {
                    if !value.eq_ignore_ascii_case("null") && !value.is_empty() {
                        let bytes = hex::decode(value).map_err(|error| {
                            malformed_error!("Invalid PublicKeyToken '{}': {}", value, error)
                        })?;
                        let token: [u8; 8] = bytes.try_into().map_err(|bytes: Vec<u8>| {
                            malformed_error!(
                                "PublicKeyToken must be 8 bytes, got {}",
                                bytes.len()
                            )
                        })?;
                        identity.strong_name = Some(StrongName::Token(token));
                    }
                }
                "publickey" => {
                    if !value.eq_ignore_ascii_case("null") && !value.is_empty() {
                        let key = hex::decode(value).map_err(|error| {
                            malformed_error!("Invalid PublicKey '{}': {}", value, error)
                        })?;
                        identity.strong_name = Some(StrongName::PublicKey(key));
                    }
                }
                "processorarchitecture" => {
                    identity.processor_architecture = Some(ProcessorArchitecture::parse(value)?);
                }
                _ => {}
            }
        }

        Ok(identity)
    }

    /// The identity an `AssemblyRef` row refers to.
    #[must_use]
    pub fn from_assembly_ref(row: &AssemblyRefRow) -> Self {
        let strong_name = if row.public_key_or_token.is_empty() {
            None
        } else if row.flags & ASSEMBLY_FLAGS_PUBLIC_KEY != 0 {
            Some(StrongName::PublicKey(row.public_key_or_token.clone()))
        } else {
            <[u8; 8]>::try_from(row.public_key_or_token.as_slice())
                .ok()
                .map(StrongName::Token)
        };

        AssemblyIdentity {
            name: row.name.clone(),
            version: AssemblyVersion::new(
                row.major_version,
                row.minor_version,
                row.build_number,
                row.revision_number,
            ),
            culture: (!row.culture.is_empty()).then(|| row.culture.clone()),
            strong_name,
            processor_architecture: None,
        }
    }

    /// The identity an `Assembly` row defines.
    #[must_use]
    pub fn from_assembly(row: &AssemblyRow) -> Self {
        AssemblyIdentity {
            name: row.name.clone(),
            version: AssemblyVersion::new(
                row.major_version,
                row.minor_version,
                row.build_number,
                row.revision_number,
            ),
            culture: (!row.culture.is_empty()).then(|| row.culture.clone()),
            strong_name: (!row.public_key.is_empty())
                .then(|| StrongName::PublicKey(row.public_key.clone())),
            processor_architecture: None,
        }
    }

    /// The public key token, if strong-named.
    #[must_use]
    pub fn public_key_token(&self) -> Option<[u8; 8]> {
        self.strong_name.as_ref().map(StrongName::token)
    }

    /// Canonical display name with version, culture and public key token.
    #[must_use]
    pub fn display_name(&self) -> String {
        let token = self
            .public_key_token()
            .map_or_else(|| "null".to_string(), hex::encode);
        let mut name = format!(
            "{}, Version={}, Culture={}, PublicKeyToken={}",
            self.name,
            self.version,
            self.culture.as_deref().unwrap_or("neutral"),
            token
        );
        if let Some(architecture) = self.processor_architecture {
            name.push_str(&format!(", ProcessorArchitecture={architecture}"));
        }
        name
    }

    /// Returns `true` if an assembly with this identity can stand in for `requested`.
    ///
    /// Names, cultures and tokens must match where `requested` states them; the version must
    /// be at least the requested one.
    #[must_use]
    pub fn satisfies(&self, requested: &AssemblyIdentity) -> bool {
        self.name.eq_ignore_ascii_case(&requested.name)
            && self.version >= requested.version
            && culture_eq(self.culture.as_deref(), requested.culture.as_deref())
            && requested
                .public_key_token()
                .map_or(true, |token| self.public_key_token() == Some(token))
    }
}

fn culture_eq(left: Option<&str>, right: Option<&str>) -> bool {
    match (left, right) {
        (Some(left), Some(right)) => left.eq_ignore_ascii_case(right),
        (None, None) => true,
        _ => false,
    }
}

impl PartialEq for AssemblyIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self.version == other.version
            && culture_eq(self.culture.as_deref(), other.culture.as_deref())
            && self.public_key_token() == other.public_key_token()
    }
}

impl Eq for AssemblyIdentity {}

impl Hash for AssemblyIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_ascii_lowercase().hash(state);
        self.version.hash(state);
        self.culture
            .as_ref()
            .map(|culture| culture.to_ascii_lowercase())
            .hash(state);
        self.public_key_token().hash(state);
    }
}

impl fmt::Display for AssemblyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl FromStr for AssemblyIdentity {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        AssemblyIdentity::parse(s)
    }
}
