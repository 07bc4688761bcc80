//! Pipeline stages, used to label log fields and errors.

/// One step of the build pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Map descriptors to entries and assign aliases.
    Generate,
    /// Render and write the plugin-registration source file.
    WriteRegistry,
    /// Render and write the dependency manifest.
    WriteManifest,
    /// Fetch each non-replaced module at its pinned version.
    Resolve,
    /// Normalize the manifest under the legacy baseline.
    NormalizeLegacy,
    /// Normalize the manifest under the current baseline.
    NormalizeCurrent,
    /// Compile the final binary.
    Compile,
}

impl Stage {
    /// Every stage, in the order the pipeline runs them.
    pub const ALL: [Stage; 7] = [
        Stage::Generate,
        Stage::WriteRegistry,
        Stage::WriteManifest,
        Stage::Resolve,
        Stage::NormalizeLegacy,
        Stage::NormalizeCurrent,
        Stage::Compile,
    ];

    /// Short lowercase label used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::WriteRegistry => "write-registry",
            Self::WriteManifest => "write-manifest",
            Self::Resolve => "resolve",
            Self::NormalizeLegacy => "normalize-legacy",
            Self::NormalizeCurrent => "normalize-current",
            Self::Compile => "compile",
        }
    }

}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_ordered() {
        let mut sorted = Stage::ALL;
        sorted.sort();
        assert_eq!(sorted, Stage::ALL);
    }
}
