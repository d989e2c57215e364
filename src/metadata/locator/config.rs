use std::path::PathBuf;

/// Environment variable naming the 32-bit program files directory
const PROGRAM_FILES_X86: &str = "ProgramFiles(x86)";

/// Where and under which extensions referenced modules are searched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorConfig {
    /// Root of the reference assembly tree, `None` disables framework probing
    pub framework_base: Option<PathBuf>,
    /// Extension appended to module reference names without an extension
    pub module_extension: String,
    /// Extensions tried, in order, for assembly references
    pub assembly_extensions: Vec<String>,
}

impl LocatorConfig {
    /// A configuration without framework probing.
    #[must_use]
    pub fn new() -> Self {
        LocatorConfig {
            framework_base: None,
            module_extension: ".dll".to_string(),
            assembly_extensions: vec![".dll".to_string(), ".exe".to_string()],
        }
    }

    /// Set the root of the reference assembly tree.
    #[must_use]
    pub fn with_framework_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.framework_base = Some(base.into());
        self
    }

    /// Disable framework probing.
    #[must_use]
    pub fn without_framework_base(mut self) -> Self {
        self.framework_base = None;
        self
    }

    /// Set the fallback module extension, including the leading dot.
    #[must_use]
    pub fn with_module_extension(mut self, extension: impl Into<String>) -> Self {
        self.module_extension = extension.into();
        self
    }

    /// Set the assembly extensions, including the leading dots.
    #[must_use]
    pub fn with_assembly_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assembly_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for LocatorConfig {
    /// Framework probing below `%ProgramFiles(x86)%/Reference Assemblies/Microsoft/Framework`
    /// when that variable is set.
    fn default() -> Self {
        let mut config = LocatorConfig::new();
        config.framework_base = std::env::var_os(PROGRAM_FILES_X86).map(|root| {
            PathBuf::from(root)
                .join("Reference Assemblies")
                .join("Microsoft")
                .join("Framework")
        });
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders() {
        let config = LocatorConfig::new()
            .with_framework_base("/ref")
            .with_module_extension(".netmodule")
            .with_assembly_extensions([".dll"]);
        assert_eq!(config.framework_base, Some(PathBuf::from("/ref")));
        assert_eq!(config.module_extension, ".netmodule");
        assert_eq!(config.assembly_extensions, vec![".dll".to_string()]);
        assert_eq!(config.without_framework_base().framework_base, None);
    }
}
