//! Atomic publishing of run artifacts.
//!
//! Bytes are staged in a temporary file next to the destination and renamed
//! over it, so readers only ever see a complete file or the previous one.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

pub fn publish_bytes(dest: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;

    let mut staged = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("stage file in {}", parent.display()))?;
    staged
        .write_all(bytes)
        .with_context(|| format!("write staged {}", dest.display()))?;
    staged
        .as_file()
        .sync_all()
        .with_context(|| format!("sync staged {}", dest.display()))?;
    staged
        .persist(dest)
        .with_context(|| format!("publish {}", dest.display()))?;
    Ok(())
}

pub fn publish_json<T: serde::Serialize>(dest: &Path, value: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value).context("serialize JSON artifact")?;
    bytes.push(b'\n');
    publish_bytes(dest, &bytes)
}
