use std::path::Path;

/// File name suffixes the mounting tool understands, matched case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    ".7z",
    ".7zip",
    ".a",
    ".apk",
    ".appimage",
    ".ar",
    ".cab",
    ".cpio",
    ".deb",
    ".iso",
    ".jar",
    ".lib",
    ".rar",
    ".rpm",
    ".sqsh",
    ".squashfs",
    ".tar.bz2",
    ".tar.gz",
    ".tar.xz",
    ".tar.zst",
    ".tar",
    ".tbz2",
    ".tgz",
    ".txz",
    ".tzst",
    ".whl",
    ".xar",
    ".zip",
];

pub fn is_archive(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    SUPPORTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Checks the final path component only; directories named `x.zip` still match.
pub fn is_archive_path(path: &Path) -> bool {
    path.file_name()
        .map(|name| is_archive(&name.to_string_lossy()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_suffixes_case_insensitively() {
        assert!(is_archive("photos.ZIP"));
        assert!(is_archive("backup.tar.zst"));
        assert!(is_archive("image.SquashFS"));
        assert!(is_archive("tool.AppImage"));
    }

    #[test]
    fn rejects_plain_files() {
        assert!(!is_archive("notes.txt"));
        assert!(!is_archive("zip"));
        assert!(!is_archive(""));
    }

    #[test]
    fn path_check_uses_file_name() {
        assert!(is_archive_path(Path::new("/home/user/Downloads/a.tgz")));
        assert!(!is_archive_path(Path::new("/srv/archive.zip/readme")));
        assert!(!is_archive_path(Path::new("/")));
    }
}
