//! Write-to-temp-then-rename file replacement.

use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;
use tokio::fs;

/// Replaces `path` with `content` so readers see either the old or the new
/// bytes, never a partial file.
///
/// The temporary file lives beside the target so the rename stays on one
/// filesystem. It is removed if the rename fails.
///
/// # Errors
///
/// Returns the underlying I/O error from writing or renaming.
pub(crate) async fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let tmp_path = temp_path_for(path)?;

    if let Err(error) = fs::write(&tmp_path, content).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(error);
    }

    if let Err(error) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> io::Result<PathBuf> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::other("no parent directory"))?;
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other("no file name"))?
        .to_string_lossy();
    let nonce: u32 = rand::thread_rng().r#gen();
    Ok(parent.join(format!(".{name}.{}.{nonce:08x}.tmp", std::process::id())))
}
