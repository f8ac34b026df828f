use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::settings::IndexSettings;
use crate::index::inverted::InvertedIndex;
use crate::storage::document_store::DocumentStore;

pub const SETTINGS_FILE: &str = "settings";
pub const INVERTED_INDEX_FILE: &str = "inverted_index";
pub const DOCUMENT_STORE_FILE: &str = "document_store";

/// Frame header magic for binary snapshot files.
const MAGIC: [u8; 4] = *b"FDX1";

/// On-disk layout: `{data_dir}/{index_name}/` holding a JSON `settings`
/// file and two crc-framed files: the inverted index as bincode, the
/// document store as JSON (schemaless documents need a self-describing
/// payload). Each file is written to a temporary path and renamed;
/// atomicity across the three files is not guaranteed.
pub fn index_dir(data_dir: &Path, index_name: &str) -> PathBuf {
    data_dir.join(index_name)
}

/// Write a full snapshot of one index.
pub fn save_index(
    data_dir: &Path,
    settings: &IndexSettings,
    index: &InvertedIndex,
    store: &DocumentStore,
) -> Result<()> {
    let dir = index_dir(data_dir, &settings.name);
    fs::create_dir_all(&dir)?;

    let settings_json = serde_json::to_vec_pretty(settings)?;
    write_atomic(&dir.join(SETTINGS_FILE), &settings_json)?;

    write_framed(&dir.join(INVERTED_INDEX_FILE), &bincode::serialize(index)?)?;
    write_framed(&dir.join(DOCUMENT_STORE_FILE), &serde_json::to_vec(store)?)?;
    Ok(())
}

/// Load one index from its directory. Any missing or corrupted file is
/// an error; the caller decides whether to fall back to an empty index.
pub fn load_index(dir: &Path) -> Result<(IndexSettings, InvertedIndex, DocumentStore)> {
    let settings_bytes = fs::read(dir.join(SETTINGS_FILE))?;
    let settings: IndexSettings = serde_json::from_slice(&settings_bytes)?;

    let index: InvertedIndex = bincode::deserialize(&read_framed(&dir.join(INVERTED_INDEX_FILE))?)?;
    let store: DocumentStore = serde_json::from_slice(&read_framed(&dir.join(DOCUMENT_STORE_FILE))?)?;
    Ok((settings, index, store))
}

pub fn remove_index_dir(data_dir: &Path, index_name: &str) -> Result<()> {
    let dir = index_dir(data_dir, index_name);
    if dir.exists() {
        fs::remove_dir_all(&dir)?;
    }
    Ok(())
}

/// Frame: magic | payload length (u64 LE) | crc32 (u32 LE) | payload.
fn write_framed(path: &Path, payload: &[u8]) -> Result<()> {
    let mut framed = Vec::with_capacity(16 + payload.len());
    framed.extend_from_slice(&MAGIC);
    framed.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    framed.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());
    framed.extend_from_slice(payload);
    write_atomic(path, &framed)
}

fn read_framed(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path)?;
    if bytes.len() < 16 || bytes[..4] != MAGIC {
        return Err(Error::new(
            ErrorKind::Parse,
            format!("{}: bad snapshot header", path.display()),
        ));
    }

    let len = u64::from_le_bytes(bytes[4..12].try_into().unwrap()) as usize;
    let crc = u32::from_le_bytes(bytes[12..16].try_into().unwrap());
    let payload = &bytes[16..];
    if payload.len() != len || crc32fast::hash(payload) != crc {
        return Err(Error::new(
            ErrorKind::Parse,
            format!("{}: snapshot checksum mismatch", path.display()),
        ));
    }
    Ok(payload.to_vec())
}

/// Write to `<path>.tmp`, then rename into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
