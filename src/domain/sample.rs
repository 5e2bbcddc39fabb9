// ============================================================
// Layer 3 — Sample and Split Domain Types
// ============================================================
// A Sample is one image file with the integer label of the
// class folder it was found in. A Split is the partition of
// every sample into train / test / validation lists.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One labelled image on disk. Immutable once listed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sample {
    pub path:  PathBuf,
    pub label: usize,
}

impl Sample {
    pub fn new(path: impl Into<PathBuf>, label: usize) -> Self {
        Self { path: path.into(), label }
    }
}

/// Class names in label order: `names[label]` is the folder name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassIndex {
    pub names: Vec<String>,
}

impl ClassIndex {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of the class with the given label, if it exists
    pub fn name(&self, label: usize) -> Option<&str> {
        self.names.get(label).map(String::as_str)
    }
}

/// Three disjoint sample lists. Training gets whatever the test
/// and validation ratios leave over.
#[derive(Debug, Clone, Default)]
pub struct Split {
    pub train:      Vec<Sample>,
    pub test:       Vec<Sample>,
    pub validation: Vec<Sample>,
}

impl Split {
    pub fn total(&self) -> usize {
        self.train.len() + self.test.len() + self.validation.len()
    }

    /// True when no sample path appears in more than one list
    pub fn is_disjoint(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.total());
        self.train
            .iter()
            .chain(&self.test)
            .chain(&self.validation)
            .all(|s| seen.insert(&s.path))
    }

    /// Name of the first list a run needs but did not get
    pub fn empty_part(&self, validation: bool) -> Option<&'static str> {
        if self.train.is_empty() {
            Some("train")
        } else if self.test.is_empty() {
            Some("test")
        } else if validation && self.validation.is_empty() {
            Some("validation")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_total_and_disjoint() {
        let split = Split {
            train:      vec![Sample::new("a.png", 0), Sample::new("b.png", 1)],
            test:       vec![Sample::new("c.png", 0)],
            validation: vec![Sample::new("d.png", 1)],
        };
        assert_eq!(split.total(), 4);
        assert!(split.is_disjoint());
    }

    #[test]
    fn test_split_detects_overlap() {
        let split = Split {
            train:      vec![Sample::new("a.png", 0)],
            test:       vec![Sample::new("a.png", 0)],
            validation: Vec::new(),
        };
        assert!(!split.is_disjoint());
    }

    #[test]
    fn test_class_index_lookup() {
        let classes = ClassIndex::new(vec!["cat".into(), "dog".into()]);
        assert_eq!(classes.name(1), Some("dog"));
        assert_eq!(classes.name(2), None);
    }

    #[test]
    fn test_empty_part() {
        let mut split = Split {
            train:      vec![Sample::new("a.png", 0)],
            test:       vec![Sample::new("b.png", 1)],
            validation: Vec::new(),
        };
        assert_eq!(split.empty_part(false), None);
        assert_eq!(split.empty_part(true), Some("validation"));

        split.train.clear();
        assert_eq!(split.empty_part(false), Some("train"));
    }
}
