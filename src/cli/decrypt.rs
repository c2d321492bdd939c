use crate::error::Result;
use crate::reader::{Integrity, Reader};
use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

/// Options for the decrypt command
#[derive(Debug, Clone)]
pub struct DecryptOptions {
    pub password: String,
    /// Plaintext offset to start from.
    pub start: u64,
    /// Run the whole-file authentication pass before emitting anything.
    pub checked: bool,
}

/// Unseal a container into a plaintext file, or to stdout when `output`
/// is `None`. Returns the number of plaintext bytes recovered.
pub fn decrypt_file(input: &Path, output: Option<&Path>, options: &DecryptOptions) -> Result<u64> {
    let source = File::open(input)?;
    let integrity = if options.checked {
        Integrity::VerifyFirst
    } else {
        Integrity::Deferred
    };

    let mut reader = Reader::open(source, &options.password, integrity)?;
    if options.start > 0 {
        reader.seek(SeekFrom::Start(options.start))?;
    }

    let copied = match output {
        Some(path) => {
            let mut out = File::create(path)?;
            io::copy(&mut reader, &mut out)?
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let copied = io::copy(&mut reader, &mut out)?;
            out.flush()?;
            copied
        }
    };
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::encrypt::{encrypt_file, EncryptOptions};
    use tempfile::tempdir;

    fn sealed_fixture(dir: &Path, payload: &[u8]) -> std::path::PathBuf {
        let input = dir.join("input.bin");
        let container = dir.join("input.joye");
        std::fs::write(&input, payload).unwrap();
        let options = EncryptOptions {
            password: "s3cret".into(),
            tags: Vec::new(),
        };
        encrypt_file(&input, &container, &options).unwrap();
        container
    }

    #[test]
    fn test_decrypt_roundtrip() {
        let dir = tempdir().unwrap();
        let container = sealed_fixture(dir.path(), b"round trip payload");
        let recovered = dir.path().join("recovered.bin");

        let options = DecryptOptions {
            password: "s3cret".into(),
            start: 0,
            checked: true,
        };
        let copied = decrypt_file(&container, Some(&recovered), &options).unwrap();

        assert_eq!(copied, 18);
        assert_eq!(std::fs::read(&recovered).unwrap(), b"round trip payload");
    }

    #[test]
    fn test_decrypt_from_offset() {
        let dir = tempdir().unwrap();
        let container = sealed_fixture(dir.path(), b"skip me, keep me");
        let recovered = dir.path().join("tail.bin");

        let options = DecryptOptions {
            password: "s3cret".into(),
            start: 9,
            checked: false,
        };
        decrypt_file(&container, Some(&recovered), &options).unwrap();

        assert_eq!(std::fs::read(&recovered).unwrap(), b"keep me");
    }

    #[test]
    fn test_checked_decrypt_refuses_tampered_file() {
        let dir = tempdir().unwrap();
        let container = sealed_fixture(dir.path(), b"tamper target");

        let mut bytes = std::fs::read(&container).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        std::fs::write(&container, bytes).unwrap();

        let checked = DecryptOptions {
            password: "s3cret".into(),
            start: 0,
            checked: true,
        };
        assert!(decrypt_file(&container, Some(&dir.path().join("out.bin")), &checked).is_err());

        // Unchecked decryption still succeeds, by design.
        let unchecked = DecryptOptions {
            checked: false,
            ..checked
        };
        assert!(decrypt_file(&container, Some(&dir.path().join("out.bin")), &unchecked).is_ok());
    }
}
