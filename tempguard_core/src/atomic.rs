use std::{fs, io::Write, path::Path};

/// Replace `path` with `bytes` via a sibling temp file and rename, so readers
/// see either the old or the new content.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut name = path.as_os_str().to_owned();
    name.push(".new");
    let tmp = std::path::PathBuf::from(name);
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}
