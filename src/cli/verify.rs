use crate::error::Result;
use crate::reader::verify_file;
use std::path::Path;

/// Check a container's authentication tag
///
/// Decryption alone never detects tampering or a wrong password; this is the
/// explicit second pass that does. Returns `Ok(false)` on mismatch so the
/// caller can map the verdict to an exit code; errors are reserved for files
/// that cannot be read at all.
pub fn verify_container(path: &Path, password: &str) -> Result<bool> {
    verify_file(path, password)
}
