//! Title-specific save handling.
//!
//! Some titles need their save files reshaped when crossing between the
//! Switch and the PC release: file names lose an extension on the device,
//! and PC saves embed the owning Steam account.

mod account;
mod rules;

pub use account::{ACCOUNT_ID_LEN, patch_account_id, patch_directory, write_account_id};
pub use rules::{AccountPatch, NIER_AUTOMATA_TITLE_ID, TitleRule, rule_for};

#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{file}: {source}")]
    File {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{file} is {len} bytes, too short for an account id at offset {offset}")]
    TooShort { file: String, len: u64, offset: u64 },

    /// Some files of a directory could not be patched. The others were.
    #[error(
        "{} file(s) not patched: {}",
        .failures.len(),
        .failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )]
    Incomplete {
        patched: Vec<String>,
        failures: Vec<PatchError>,
    },
}
