use std::io::Write;
use std::path::Path;

/// Write content atomically: write to a sibling temp file, fsync, rename.
///
/// Readers see either the old payload or the new one, never a torn write.
/// Concurrent writers are not coordinated; the last rename wins.
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let stem = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp_path = dir.join(format!(".{stem}.{}.tmp", temp_suffix()));

    let mut file = std::fs::File::create(&temp_path)?;
    let written = file.write_all(content).and_then(|_| file.sync_all());
    drop(file);
    if let Err(e) = written {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }

    std::fs::rename(&temp_path, path).inspect_err(|_| {
        let _ = std::fs::remove_file(&temp_path);
    })
}

fn temp_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{}-{nanos:x}", std::process::id())
}
