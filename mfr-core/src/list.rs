use crate::error::{MfrError, Result};
use std::path::Path;
use walkdir::WalkDir;

/// Regular files under `root` as `/`-separated relative paths, in walk order
/// with siblings sorted by name. Symlinks are not followed.
pub fn collect_entries(root: &Path) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for ent in WalkDir::new(root).sort_by_file_name() {
        let ent = ent.map_err(std::io::Error::from)?;
        if !ent.file_type().is_file() {
            continue;
        }
        let rel = ent
            .path()
            .strip_prefix(root)
            .map_err(|e| MfrError::invalid(format!("walk escaped root: {e}")))?;
        let parts = rel
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| MfrError::invalid(format!("non-UTF-8 path: {}", rel.display())))?;
        out.push(parts.join("/"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn walks_files_only_sorted() {
        let td = tempfile::tempdir().unwrap();
        fs::create_dir_all(td.path().join("sub/deeper")).unwrap();
        fs::write(td.path().join("b.txt"), "b").unwrap();
        fs::write(td.path().join("a.txt"), "a").unwrap();
        fs::write(td.path().join("sub/c.txt"), "c").unwrap();
        fs::write(td.path().join("sub/deeper/d.txt"), "d").unwrap();

        let got = collect_entries(td.path()).unwrap();
        assert_eq!(got, ["a.txt", "b.txt", "sub/c.txt", "sub/deeper/d.txt"]);
    }
}
