//! Test helpers for writing CLI inputs into a scratch directory.

use camino::{Utf8Path, Utf8PathBuf};
use geo::Coord;
use serde::Serialize;
use tempfile::TempDir;

/// Scratch directory holding the input files for one test.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    /// Serialise `value` as JSON into `name` and return the full path.
    pub(super) fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Utf8PathBuf {
        let path = self.path(name);
        let payload = serde_json::to_string_pretty(value).expect("serialise input");
        write_utf8(&path, payload.as_bytes());
        path
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write test input");
}

/// A mid-latitude reference point for zone centres and routes.
pub(super) const ORIGIN: Coord<f64> = Coord { x: -0.1, y: 51.5 };
