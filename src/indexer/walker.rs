use std::path::{Path, PathBuf};

use walkdir::WalkDir;

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// PDF files directly inside `dir`. Subdirectories and other files are
/// skipped. Order follows directory enumeration and is not stable.
pub fn list_pdfs(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_pdf(path))
        .collect()
}
