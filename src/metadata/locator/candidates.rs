use std::path::{Path, PathBuf};

use crate::file::normalize_path;

/// Paths a referenced module may be loaded from, in probing order.
///
/// The sequence is finite and can be walked any number of times; consumers usually stop at the
/// first path that loads. The referencing module's own path is never yielded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidatePaths {
    referencing: PathBuf,
    candidates: Vec<PathBuf>,
}

impl CandidatePaths {
    /// Candidates for a reference made by the module at `referencing`.
    #[must_use]
    pub fn new(referencing: &Path, candidates: Vec<PathBuf>) -> Self {
        CandidatePaths {
            referencing: normalize_path(referencing),
            candidates,
        }
    }

    /// Walk the candidates from the start.
    #[must_use]
    pub fn iter(&self) -> CandidateIter<'_> {
        CandidateIter {
            referencing: &self.referencing,
            inner: self.candidates.iter(),
        }
    }

    /// Returns `true` if no candidate remains after excluding the referencing module.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl<'a> IntoIterator for &'a CandidatePaths {
    type Item = &'a Path;
    type IntoIter = CandidateIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over [`CandidatePaths`].
#[derive(Debug, Clone)]
pub struct CandidateIter<'a> {
    referencing: &'a Path,
    inner: std::slice::Iter<'a, PathBuf>,
}

impl<'a> Iterator for CandidateIter<'a> {
    type Item = &'a Path;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .by_ref()
            .map(PathBuf::as_path)
            .find(|candidate| normalize_path(candidate) != self.referencing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_reference_is_skipped() {
        let paths = CandidatePaths::new(
            Path::new("/app/./App.dll"),
            vec![
                PathBuf::from("/app/App.dll"),
                PathBuf::from("/app/Lib.dll"),
                PathBuf::from("/app/sub/../App.dll"),
                PathBuf::from("/fw/App.dll"),
            ],
        );

        let first: Vec<&Path> = paths.iter().collect();
        assert_eq!(first, vec![Path::new("/app/Lib.dll"), Path::new("/fw/App.dll")]);
        // restartable
        let second: Vec<&Path> = (&paths).into_iter().collect();
        assert_eq!(first, second);
        assert!(!paths.is_empty());

        let only_self = CandidatePaths::new(Path::new("/a/A.dll"), vec![PathBuf::from("/a/A.dll")]);
        assert!(only_self.is_empty());
    }
}
