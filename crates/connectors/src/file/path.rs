use std::path::{Component, Path, PathBuf};

/// Resolve `src` as a child of `base`, dropping any `.`/`..`/root
/// components so a query can never name a file outside the source's
/// directory.
pub fn safe_child(base: &Path, src: &str) -> PathBuf {
    let mut path = base.to_path_buf();
    for component in Path::new(src).components() {
        if let Component::Normal(part) = component {
            path.push(part);
        }
    }
    path
}
