use std::fmt;

use crate::metadata::customattributes::{CustomAttributeArgument, CustomAttributeNamedArgument};

/// The value column of a `DeclSecurity` row.
#[derive(Debug, Clone, PartialEq)]
pub enum SecurityBlob {
    /// The undecoded blob
    Raw(Vec<u8>),
    /// The decoded permission set
    Resolved(PermissionSet),
}

impl SecurityBlob {
    /// Returns `true` once the blob has been decoded.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, SecurityBlob::Resolved(_))
    }

    /// The decoded permission set, if resolved.
    #[must_use]
    pub fn value(&self) -> Option<&PermissionSet> {
        match self {
            SecurityBlob::Resolved(set) => Some(set),
            SecurityBlob::Raw(_) => None,
        }
    }
}

impl Default for SecurityBlob {
    fn default() -> Self {
        SecurityBlob::Raw(Vec::new())
    }
}

/// Encoding a permission set was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionSetFormat {
    /// `.`-prefixed attribute list
    Binary,
    /// UTF-16 `<PermissionSet>` document
    Xml,
}

/// A decoded permission set
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionSet {
    /// Encoding of the source blob
    pub format: PermissionSetFormat,
    /// The listed permissions, in blob order
    pub permissions: Vec<Permission>,
    /// The XML set carried `Unrestricted="true"`
    pub unrestricted: bool,
}

/// One permission of a set.
///
/// Settings of binary permissions keep the type they were serialized with; settings read from
/// XML are string-typed properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Permission {
    /// Type name of the permission attribute, possibly assembly-qualified
    pub class_name: String,
    /// Property and field settings
    pub named_args: Vec<CustomAttributeNamedArgument>,
}

impl Permission {
    /// Value of the setting `name`.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&CustomAttributeArgument> {
        self.named_args
            .iter()
            .find(|arg| arg.name == name)
            .map(|arg| &arg.value)
    }

    /// The class name without its assembly qualification.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.class_name
            .split_once(',')
            .map_or(self.class_name.as_str(), |(name, _)| name)
            .trim()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())?;
        if !self.named_args.is_empty() {
            let names: Vec<&str> = self.named_args.iter().map(|arg| arg.name.as_str()).collect();
            write!(f, "({})", names.join(", "))?;
        }
        Ok(())
    }
}

/// Security actions (ECMA-335 II.23.1.3)
///
/// Stored in the `action` column of `DeclSecurity`; controls when and how the permission set
/// is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityAction {
    /// Refuse demands for the permissions
    Deny,
    /// All callers in the call chain must hold the permissions
    Demand,
    /// Satisfy demands for the permissions without further checks
    Assert,
    /// Non-CAS demand
    NonCasDemand,
    /// The immediate caller must hold the permissions
    LinkDemand,
    /// Derived types and overriding methods must hold the permissions
    InheritanceDemand,
    /// Minimum permissions required to run
    RequestMinimum,
    /// Optional permissions
    RequestOptional,
    /// Permissions that must not be granted
    RequestRefuse,
    /// Reserved for precompilation
    PrejitGrant,
    /// Reserved for precompilation
    PrejitDeny,
    /// Non-CAS link demand
    NonCasLinkDemand,
    /// Non-CAS inheritance demand
    NonCasInheritance,
    /// Link demand with a choice of permissions
    LinkDemandChoice,
    /// Inheritance demand with a choice of permissions
    InheritanceDemandChoice,
    /// Demand with a choice of permissions
    DemandChoice,
    /// Refuse demands for everything but the permissions
    PermitOnly,
    /// Value outside the defined range
    Unknown(u16),
}

impl From<u16> for SecurityAction {
    fn from(value: u16) -> Self {
        match value {
            0x0001 => SecurityAction::Deny,
            0x0002 => SecurityAction::Demand,
            0x0003 => SecurityAction::Assert,
            0x0004 => SecurityAction::NonCasDemand,
            0x0005 => SecurityAction::LinkDemand,
            0x0006 => SecurityAction::InheritanceDemand,
            0x0007 => SecurityAction::RequestMinimum,
            0x0008 => SecurityAction::RequestOptional,
            0x0009 => SecurityAction::RequestRefuse,
            0x000A => SecurityAction::PrejitGrant,
            0x000B => SecurityAction::PrejitDeny,
            0x000C => SecurityAction::NonCasLinkDemand,
            0x000D => SecurityAction::NonCasInheritance,
            0x000E => SecurityAction::LinkDemandChoice,
            0x000F => SecurityAction::InheritanceDemandChoice,
            0x0010 => SecurityAction::DemandChoice,
            0x0011 => SecurityAction::PermitOnly,
            _ => SecurityAction::Unknown(value),
        }
    }
}

impl From<SecurityAction> for u16 {
    fn from(action: SecurityAction) -> Self {
        match action {
            SecurityAction::Deny => 0x0001,
            SecurityAction::Demand => 0x0002,
            SecurityAction::Assert => 0x0003,
            SecurityAction::NonCasDemand => 0x0004,
            SecurityAction::LinkDemand => 0x0005,
            SecurityAction::InheritanceDemand => 0x0006,
            SecurityAction::RequestMinimum => 0x0007,
            SecurityAction::RequestOptional => 0x0008,
            SecurityAction::RequestRefuse => 0x0009,
            SecurityAction::PrejitGrant => 0x000A,
            SecurityAction::PrejitDeny => 0x000B,
            SecurityAction::NonCasLinkDemand => 0x000C,
            SecurityAction::NonCasInheritance => 0x000D,
            SecurityAction::LinkDemandChoice => 0x000E,
            SecurityAction::InheritanceDemandChoice => 0x000F,
            SecurityAction::DemandChoice => 0x0010,
            SecurityAction::PermitOnly => 0x0011,
            SecurityAction::Unknown(value) => value,
        }
    }
}

impl fmt::Display for SecurityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityAction::Unknown(value) => write!(f, "Unknown(0x{value:04X})"),
            known => fmt::Debug::fmt(known, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_values() {
        for value in 0..=0x0013u16 {
            assert_eq!(u16::from(SecurityAction::from(value)), value);
        }
        assert_eq!(SecurityAction::from(2), SecurityAction::Demand);
        assert_eq!(SecurityAction::from(0x40).to_string(), "Unknown(0x0040)");
    }

    #[test]
    fn permission_names() {
        let permission = Permission {
            class_name: "System.Security.Permissions.SecurityPermissionAttribute, mscorlib".into(),
            named_args: vec![CustomAttributeNamedArgument {
                is_field: false,
                name: "Flags".into(),
                arg_type: "String".into(),
                value: CustomAttributeArgument::String(Some("Execution".into())),
            }],
        };
        assert_eq!(
            permission.type_name(),
            "System.Security.Permissions.SecurityPermissionAttribute"
        );
        assert!(permission.argument("Flags").is_some());
        assert!(permission.argument("Unrestricted").is_none());
        assert_eq!(
            permission.to_string(),
            "System.Security.Permissions.SecurityPermissionAttribute(Flags)"
        );
    }
}
