use std::{fmt, path::{Path, PathBuf}};

use crate::metadata::{
    customattributes::{AttributeBlob, CustomAttributeArgument},
    resolution::{attribute_type_name, TypeResolver},
    tables::{ColumnValue, CustomAttributeRow, ModuleTables, TableId},
};

/// Full name of the attribute recording the framework a module was compiled against
pub const TARGET_FRAMEWORK_ATTRIBUTE: &str = "System.Runtime.Versioning.TargetFrameworkAttribute";

/// Position of the value column of `CustomAttribute`
const VALUE_COLUMN: usize = 2;

/// Identifier, version and optional profile of a target framework.
///
/// ```rust
/// use cilweave::metadata::locator::TargetFrameworkInfo;
///
/// let info = TargetFrameworkInfo::parse(".NETFramework,Version=v4.0,Profile=Client").unwrap();
/// assert_eq!(info.identifier, ".NETFramework");
/// assert_eq!(info.version, "v4.0");
/// assert_eq!(info.profile.as_deref(), Some("Client"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetFrameworkInfo {
    /// Framework identifier, e.g. `.NETFramework`
    pub identifier: String,
    /// Version as written, e.g. `v4.5`
    pub version: String,
    /// Profile, e.g. `Client`
    pub profile: Option<String>,
}

impl TargetFrameworkInfo {
    /// Parse a framework moniker such as `.NETFramework,Version=v4.5`.
    ///
    /// Returns `None` if the identifier or the version is missing.
    #[must_use]
    pub fn parse(moniker: &str) -> Option<Self> {
        let mut parts = moniker.split(',').map(str::trim);
        let identifier = parts.next().filter(|identifier| !identifier.is_empty())?;

        let mut version = None;
        let mut profile = None;
        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if key.trim().eq_ignore_ascii_case("version") {
                version = Some(value.to_string());
            } else if key.trim().eq_ignore_ascii_case("profile") {
                profile = Some(value.to_string());
            }
        }

        Some(TargetFrameworkInfo {
            identifier: identifier.to_string(),
            version: version?,
            profile,
        })
    }

    /// Directory holding the reference assemblies of this framework below `base`.
    #[must_use]
    pub fn reference_directory(&self, base: &Path) -> PathBuf {
        let mut path = base.join(&self.identifier).join(&self.version);
        if let Some(profile) = &self.profile {
            path = path.join("Profile").join(profile);
        }
        path
    }
}

impl fmt::Display for TargetFrameworkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},Version={}", self.identifier, self.version)?;
        if let Some(profile) = &self.profile {
            write!(f, ",Profile={profile}")?;
        }
        Ok(())
    }
}

/// Read the target framework from the module's `TargetFrameworkAttribute`.
///
/// Raw attribute values are decoded on the fly with `resolver`; the module is not modified.
pub(crate) fn detect_target_framework(
    module: &ModuleTables,
    resolver: &dyn TypeResolver,
) -> Option<TargetFrameworkInfo> {
    let attributes = module.table::<CustomAttributeRow>()?;
    for (row, attribute) in attributes.rows().iter().enumerate() {
        if attribute_type_name(module, attribute.constructor).as_deref()
            != Some(TARGET_FRAMEWORK_ATTRIBUTE)
        {
            continue;
        }

        let computed;
        let value = match &attribute.value {
            AttributeBlob::Resolved(value) => value,
            AttributeBlob::Raw(_) => {
                computed = module.compute_resolution(
                    resolver,
                    TableId::CustomAttribute,
                    row as u32,
                    VALUE_COLUMN,
                );
                match &computed {
                    Some(ColumnValue::Attribute(AttributeBlob::Resolved(value))) => value,
                    _ => continue,
                }
            }
        };

        if let Some(CustomAttributeArgument::String(Some(moniker))) = value.fixed_args.first() {
            let info = TargetFrameworkInfo::parse(moniker);
            tracing::debug!(module = module.id().value(), moniker, found = info.is_some(), "target framework");
            return info;
        }
    }
    None
}
