// ============================================================
// Layer 4 — Image Folder Loader
// ============================================================
// Lists the labelled images under a root data directory laid
// out one folder per class:
//
//   data/
//     ├── cat/
//     │     ├── 0001.jpg
//     │     └── 0002.jpg
//     └── dog/
//           └── 0001.png
//
// Class folders are sorted by name; a class's label is its
// position in that order. Only files with an image extension
// are listed, and files inside a class folder are sorted so the
// listing is identical on every run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::domain::error::DataError;
use crate::domain::sample::{ClassIndex, Sample};
use crate::domain::traits::SampleSource;

/// File extensions treated as images (compared case-insensitively)
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Lists samples from a class-per-folder image directory.
pub struct ImageFolderLoader {
    root: PathBuf,
}

impl ImageFolderLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn class_dirs(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("Cannot read directory '{}'", self.root.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                let name = entry
                    .file_name()
                    .into_string()
                    .map_err(|_| DataError::ClassNameNotUtf8(entry.path()))?;
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

/// True when the path carries one of the known image extensions
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl SampleSource for ImageFolderLoader {
    fn load_all(&self) -> Result<(ClassIndex, Vec<Sample>)> {
        if !self.root.is_dir() {
            return Err(DataError::MissingDirectory(self.root.clone()).into());
        }

        let class_names = self.class_dirs()?;
        if class_names.is_empty() {
            return Err(DataError::NoClasses(self.root.clone()).into());
        }

        let mut samples = Vec::new();
        for (label, class_name) in class_names.iter().enumerate() {
            let mut files: Vec<PathBuf> = WalkDir::new(self.root.join(class_name))
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| is_image_file(p))
                .collect();
            files.sort();

            tracing::debug!("Class {} '{}': {} images", label, class_name, files.len());
            samples.extend(files.into_iter().map(|path| Sample::new(path, label)));
        }

        if samples.is_empty() {
            return Err(DataError::NoImages(self.root.clone()).into());
        }

        tracing::info!(
            "Found {} images in {} classes under '{}'",
            samples.len(),
            class_names.len(),
            self.root.display()
        );
        Ok((ClassIndex::new(class_names), samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, b"not really an image").unwrap();
    }

    #[test]
    fn test_labels_follow_sorted_class_folders() {
        let dir = TempDir::new().unwrap();
        for class in ["zebra", "ant"] {
            fs::create_dir(dir.path().join(class)).unwrap();
        }
        touch(&dir.path().join("ant/b.JPG"));
        touch(&dir.path().join("ant/a.png"));
        touch(&dir.path().join("ant/notes.txt"));
        touch(&dir.path().join("zebra/z.jpeg"));

        let (classes, samples) = ImageFolderLoader::new(dir.path()).load_all().unwrap();
        assert_eq!(classes.names, vec!["ant".to_string(), "zebra".to_string()]);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].path, dir.path().join("ant/a.png"));
        assert_eq!(samples[0].label, 0);
        assert_eq!(samples[2].label, 1);
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = ImageFolderLoader::new(dir.path().join("nope")).load_all().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::MissingDirectory(_))
        ));
    }

    #[test]
    fn test_empty_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = ImageFolderLoader::new(dir.path()).load_all().unwrap_err();
        assert!(matches!(err.downcast_ref::<DataError>(), Some(DataError::NoClasses(_))));

        fs::create_dir(dir.path().join("empty_class")).unwrap();
        let err = ImageFolderLoader::new(dir.path()).load_all().unwrap_err();
        assert!(matches!(err.downcast_ref::<DataError>(), Some(DataError::NoImages(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_class_folder_fails() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("ant")).unwrap();
        touch(&dir.path().join("ant/a.png"));
        fs::create_dir(dir.path().join(OsStr::from_bytes(b"b\xffd"))).unwrap();

        let err = ImageFolderLoader::new(dir.path()).load_all().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::ClassNameNotUtf8(_))
        ));
    }
}
