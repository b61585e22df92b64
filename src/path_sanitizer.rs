//! Path Sanitizer
//!
//! Validates a caller-supplied relative path against a fixed policy before it is ever handed
//! to a subprocess. Mirrors the layered approach of the teacher codebase's
//! `tools::filesystem::FileSystemTool::validate_path` (cheap textual guards first, an
//! authoritative prefix check last) but with the exact policy this gateway's spec requires:
//! reject `..` anywhere, reject a fixed set of sensitive absolute prefixes, then resolve
//! against the process working directory and confirm confinement.
//!
//! # Example
//!
//! ```rust
//! use llmgate::path_sanitizer::sanitize;
//!
//! assert!(sanitize("src").is_ok());
//! assert!(sanitize("../../etc/passwd").is_err());
//! assert!(sanitize("/etc/passwd").is_err());
//! ```

use crate::error::PathError;
use std::path::{Path, PathBuf};

/// Absolute prefixes that are always rejected, regardless of what the working directory
/// happens to be mounted under.
const SENSITIVE_PREFIXES: &[&str] = &[
    "/etc", "/root", "/var", "/usr", "/bin", "/sbin", "/sys", "/proc",
];

/// Validate `input` and resolve it to an absolute path confined to the process working
/// directory.
///
/// Policy, applied in order:
/// 1. Trim surrounding whitespace.
/// 2. Reject if the string contains `..` anywhere.
/// 3. Reject if the string begins with any [`SENSITIVE_PREFIXES`] entry.
/// 4. Resolve against the process working directory, normalizing `.`/`..` components.
/// 5. Reject if the resolved path does not have the working directory as a prefix.
pub fn sanitize(input: &str) -> Result<PathBuf, PathError> {
    let trimmed = input.trim();

    if trimmed.contains("..") {
        return Err(PathError::Traversal);
    }

    for prefix in SENSITIVE_PREFIXES {
        if trimmed.starts_with(prefix) {
            return Err(PathError::SensitivePrefix((*prefix).to_string()));
        }
    }

    let cwd = std::env::current_dir()
        .map_err(|_| PathError::EscapesWorkingDirectory)?;
    let resolved = normalize(&cwd.join(trimmed));

    if !resolved.starts_with(&cwd) {
        return Err(PathError::EscapesWorkingDirectory);
    }

    Ok(resolved)
}

/// Collapse `.`/`..` components purely lexically (no filesystem access), the same way the
/// teacher's `FileSystemTool::validate_path` walks `Path::components()` to build a normalized
/// path without requiring the target to already exist.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}
