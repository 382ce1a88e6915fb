//! Formatting and writing of generated files.
//!
//! Files are written to a temporary file in the output directory and then
//! persisted over the final path, so an existing file is either left as it
//! was or fully replaced.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::EmitError;

pub type EmitResult<T> = std::result::Result<T, EmitError>;

/// Suffix every generated file stem ends with.
pub const TEST_SUFFIX: &str = "_test";

pub const HEADER: &str = "// Code generated by atgen. DO NOT EDIT.";

/// `{version}_{stem}_test.rs` for the spec at `spec_path`.
///
/// The suffix is not doubled when the spec stem already carries it.
pub fn output_file_name(version: &str, spec_path: &Path) -> String {
    let stem = spec_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = if stem.ends_with(TEST_SUFFIX) {
        stem
    } else {
        format!("{stem}{TEST_SUFFIX}")
    };
    format!("{version}_{stem}.rs")
}

/// Render a file with the generated-code header.
pub fn format_file(file: &syn::File) -> String {
    format!("{HEADER}\n\n{}", prettyplease::unparse(file))
}

/// Atomically write `content` to `dir/name`, creating `dir` if needed.
pub fn write_atomic(dir: &Path, name: &str, content: &str) -> EmitResult<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| EmitError::CreateDir {
        path: dir.display().to_string(),
        source: e,
    })?;

    let target = dir.join(name);
    let write_err = |source: std::io::Error| EmitError::Write {
        path: target.display().to_string(),
        source,
    };

    // Dropping the temp file on any early return removes it.
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(&target).map_err(|e| write_err(e.error))?;

    tracing::info!(path = %target.display(), bytes = content.len(), "wrote generated file");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_name_combines_version_and_spec_stem() {
        assert_eq!(output_file_name("v1", Path::new("specs/login.yaml")), "v1_login_test.rs");
        assert_eq!(output_file_name("v2", Path::new("users_test.yml")), "v2_users_test.rs");
    }

    #[test]
    fn formatted_file_starts_with_header() {
        let file: syn::File = syn::parse_quote! {
            fn generated() {}
        };
        let out = format_file(&file);
        assert!(out.starts_with(HEADER));
        assert!(out.contains("fn generated() {}"));
    }

    #[test]
    fn write_creates_directory_and_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("tests");

        let path = write_atomic(&dir, "v1_login_test.rs", "first").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");

        write_atomic(&dir, "v1_login_test.rs", "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");

        // No temporary files are left behind.
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);
    }
}
