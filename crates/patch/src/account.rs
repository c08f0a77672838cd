//! Rewriting the account id field of save files in place.

use std::fs::Metadata;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::PatchError;
use crate::rules::AccountPatch;

/// Width of the little-endian account id field.
pub const ACCOUNT_ID_LEN: u64 = 8;

/// Writes `account_id` into one save file at the offset `patch` picks
/// for its name.
pub fn patch_account_id(
    path: &Path,
    patch: &AccountPatch,
    account_id: u64,
) -> Result<(), PatchError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    write_account_id(path, patch.offset_for(&name), account_id)
}

/// Writes `account_id` as 8 little-endian bytes at `offset`.
///
/// The patched content goes to a temp file beside `path` which then
/// replaces it, so readers never observe a half-written save. A file
/// shorter than `offset + 8` is left untouched.
pub fn write_account_id(path: &Path, offset: u64, account_id: u64) -> Result<(), PatchError> {
    let file_error = |source| PatchError::File {
        file: path.display().to_string(),
        source,
    };
    let metadata = std::fs::metadata(path).map_err(file_error)?;
    let len = metadata.len();
    if len < offset + ACCOUNT_ID_LEN {
        return Err(PatchError::TooShort {
            file: path.display().to_string(),
            len,
            offset,
        });
    }

    replace_with_patched(path, &metadata, offset, account_id).map_err(file_error)?;
    debug!(file = %path.display(), offset, "account id written");
    Ok(())
}

fn replace_with_patched(
    path: &Path,
    metadata: &Metadata,
    offset: u64,
    account_id: u64,
) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut src = std::fs::File::open(path)?;
        std::io::copy(&mut src, tmp.as_file_mut())?;
    }
    let file = tmp.as_file_mut();
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(&account_id.to_le_bytes())?;
    file.sync_all()?;
    std::fs::set_permissions(tmp.path(), metadata.permissions())?;

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Patches every file directly inside `dir` using `patch`'s offsets.
///
/// A file that cannot be patched does not stop the others. Returns the
/// names of the patched files, or [`PatchError::Incomplete`] naming every
/// file that failed.
pub fn patch_directory(
    dir: &Path,
    patch: &AccountPatch,
    account_id: u64,
) -> Result<Vec<String>, PatchError> {
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    let mut patched = Vec::with_capacity(files.len());
    let mut failures = Vec::new();
    for path in files {
        match patch_account_id(&path, patch, account_id) {
            Ok(()) => {
                if let Some(name) = path.file_name() {
                    patched.push(name.to_string_lossy().into_owned());
                }
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "save file not patched");
                failures.push(e);
            }
        }
    }
    info!(
        dir = %dir.display(),
        files = patched.len(),
        failed = failures.len(),
        "save files patched"
    );

    if failures.is_empty() {
        Ok(patched)
    } else {
        Err(PatchError::Incomplete { patched, failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{NIER_AUTOMATA_TITLE_ID, rule_for};

    const STEAM_ID: u64 = 76561198000000001;

    fn nier_patch() -> AccountPatch {
        rule_for(NIER_AUTOMATA_TITLE_ID)
            .unwrap()
            .account_patch
            .unwrap()
    }

    fn read_id(path: &Path, offset: usize) -> u64 {
        let data = std::fs::read(path).unwrap();
        u64::from_le_bytes(data[offset..offset + 8].try_into().unwrap())
    }

    #[test]
    fn writes_id_at_offset() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("SlotData_0.dat");
        std::fs::write(&path, vec![0xAAu8; 32]).unwrap();

        write_account_id(&path, 4, STEAM_ID).unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len(), 32);
        assert_eq!(&data[..4], &[0xAA; 4]);
        assert_eq!(read_id(&path, 4), STEAM_ID);
        assert_eq!(&data[12..], &[0xAA; 20]);
    }

    #[test]
    fn patch_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("GameData.dat");
        std::fs::write(&path, vec![0x11u8; 16]).unwrap();

        let patch = nier_patch();
        patch_account_id(&path, &patch, STEAM_ID).unwrap();
        let first = std::fs::read(&path).unwrap();
        patch_account_id(&path, &patch, STEAM_ID).unwrap();
        assert_eq!(read_id(&path, 0), STEAM_ID);
        assert_eq!(std::fs::read(&path).unwrap(), first);
    }

    #[test]
    fn exact_length_file_is_patched() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("f");
        std::fs::write(&path, [0u8; 12]).unwrap();
        write_account_id(&path, 4, 7).unwrap();
        assert_eq!(read_id(&path, 4), 7);
    }

    #[test]
    fn short_file_left_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("SlotData_1.dat");
        std::fs::write(&path, [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]).unwrap();

        let err = patch_account_id(&path, &nier_patch(), STEAM_ID).unwrap_err();
        assert!(matches!(err, PatchError::TooShort { len: 11, offset: 4, .. }));
        assert_eq!(
            std::fs::read(&path).unwrap(),
            vec![1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]
        );
        // No stray temp files.
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn directory_uses_marker_offsets() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("SlotData_0.dat"), [0u8; 16]).unwrap();
        std::fs::write(tmp.path().join("GameData.dat"), [0u8; 16]).unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();

        let patched = patch_directory(tmp.path(), &nier_patch(), STEAM_ID).unwrap();

        assert_eq!(patched, vec!["GameData.dat", "SlotData_0.dat"]);
        assert_eq!(read_id(&tmp.path().join("SlotData_0.dat"), 4), STEAM_ID);
        assert_eq!(read_id(&tmp.path().join("GameData.dat"), 0), STEAM_ID);
    }

    #[test]
    fn directory_keeps_going_past_short_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("GameData"), [9u8; 3]).unwrap();
        std::fs::write(tmp.path().join("SlotData_0"), [0xFFu8; 24]).unwrap();

        let err = patch_directory(tmp.path(), &nier_patch(), 42).unwrap_err();

        match &err {
            PatchError::Incomplete { patched, failures } => {
                assert_eq!(patched, &vec!["SlotData_0".to_string()]);
                assert_eq!(failures.len(), 1);
                assert!(matches!(failures[0], PatchError::TooShort { len: 3, .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().contains("GameData"));
        assert_eq!(read_id(&tmp.path().join("SlotData_0"), 4), 42);
        assert_eq!(std::fs::read(tmp.path().join("GameData")).unwrap(), vec![9u8; 3]);
    }

    #[test]
    fn missing_file_error_names_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = write_account_id(&tmp.path().join("gone"), 0, 1).unwrap_err();
        assert!(matches!(err, PatchError::File { .. }));
        assert!(err.to_string().contains("gone"));
    }
}
