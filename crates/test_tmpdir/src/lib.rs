//! Throwaway on-disk projects for tests.
//!
//! Paths handed to [TmpDir] are `/`-separated and relative to the temp root.
//! The root is canonicalized so paths reported by code under test can be
//! compared against [TmpDir::root_join] directly.

extern crate path_slash;

use path_slash::PathBufExt;
use std::{
    collections::BTreeMap,
    fs::File,
    io::{Error, Write},
    path::{Path, PathBuf},
};

pub struct TmpDir {
    // removes the directory on drop
    _tmp_root: tempfile::TempDir,
    canonical_root: PathBuf,
}

/// Creates a [TmpDir] populated with `"relative/path" => "contents"` pairs.
#[macro_export]
macro_rules! test_tmpdir(
    { $($key:expr => $value:expr),+ $(,)? } => {
        {
            use test_tmpdir::TmpDir;
            let mut m = ::std::collections::BTreeMap::new();
            $(
                m.insert(String::from($key), $value);
            )+

            TmpDir::new_with_content(&m)
        }
    };
);

impl Default for TmpDir {
    fn default() -> Self {
        Self::new()
    }
}

impl TmpDir {
    pub fn new() -> TmpDir {
        let root = tempfile::tempdir().unwrap();
        let canonical_root = std::fs::canonicalize(&root).unwrap();
        TmpDir {
            _tmp_root: root,
            canonical_root,
        }
    }

    pub fn new_with_content(content: &BTreeMap<String, &str>) -> TmpDir {
        let out = Self::new();
        out.write_batch(content).unwrap();
        out
    }

    pub fn write_batch(&self, content: &BTreeMap<String, &str>) -> Result<(), Error> {
        for (path, content) in content {
            self.write(path, content)?;
        }
        Ok(())
    }

    pub fn write(&self, path: &str, content: &str) -> Result<(), Error> {
        let target = self.root_join(path);
        // mkdir -p
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(target)?;
        file.write_all(content.as_bytes())
    }

    /// Reads a file back, e.g. after code under test rewrote it.
    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.root_join(path)).unwrap()
    }

    pub fn root(&self) -> &Path {
        &self.canonical_root
    }

    pub fn root_join<S: AsRef<str>>(&self, other: S) -> PathBuf {
        self.canonical_root.join(PathBuf::from_slash(other))
    }
}
