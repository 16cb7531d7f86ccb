// Copyright 2024 SSL Object Cache Contributors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! PATH-kind freshness capture: the `mtime` + device/inode `uniq` pair
//! spec sections 3 and 4.4/4.5 use to decide whether a cached file needs
//! reparsing. Captured at load time and compared against a fresh `stat` on
//! validity re-check.

use std::fs;
use std::path::Path;

/// A filesystem freshness stamp for a PATH-kind entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    pub mtime: u64,
    pub uniq: (u64, u64),
}

/// `stat` the file at `path`. A missing file is not an error here (spec
/// section 4.4 step b): the caller surfaces that later, when `create`
/// actually tries to open it.
pub fn stat_path(path: &Path) -> Option<FileStamp> {
    let metadata = fs::metadata(path).ok()?;
    Some(stamp_from_metadata(&metadata))
}

#[cfg(unix)]
fn stamp_from_metadata(metadata: &fs::Metadata) -> FileStamp {
    use std::os::unix::fs::MetadataExt;
    FileStamp {
        mtime: u64::try_from(metadata.mtime()).unwrap_or(0),
        uniq: (metadata.dev(), metadata.ino()),
    }
}

#[cfg(not(unix))]
fn stamp_from_metadata(metadata: &fs::Metadata) -> FileStamp {
    let mtime = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0);
    FileStamp {
        mtime,
        uniq: (metadata.len(), 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_stats_to_none() {
        assert!(stat_path(Path::new("/no/such/file")).is_none());
    }

    #[test]
    fn existing_file_has_a_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"hi").unwrap();
        let stamp = stat_path(&path).unwrap();
        assert!(stamp.uniq.0 != 0 || stamp.uniq.1 != 0);
    }

    #[test]
    fn touching_a_file_changes_its_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"hi").unwrap();
        let before = stat_path(&path).unwrap();

        filetime::set_file_mtime(&path, filetime::FileTime::from_unix_time(before.mtime as i64 + 100, 0)).unwrap();
        let after = stat_path(&path).unwrap();
        assert_ne!(before.mtime, after.mtime);
        assert_eq!(before.uniq, after.uniq);
    }
}
