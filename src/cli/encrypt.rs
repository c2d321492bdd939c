use crate::error::Result;
use crate::writer::Writer;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Options for the encrypt command
#[derive(Debug, Clone, Default)]
pub struct EncryptOptions {
    pub password: String,
    /// Opaque metadata stored unencrypted in the header, authenticated.
    pub tags: Vec<u8>,
}

/// Seal a plaintext file into a container
/// Returns the number of plaintext bytes sealed
pub fn encrypt_file(input: &Path, output: &Path, options: &EncryptOptions) -> Result<u64> {
    let mut source = File::open(input)?;

    // The sink must be readable as well: finalization re-reads the whole
    // ciphertext region to compute the authentication tag.
    let sink = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(output)?;

    let mut writer = Writer::new(sink, &options.password, &options.tags)?;
    io::copy(&mut source, &mut writer)?;
    writer.finish()?;
    Ok(writer.total())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::is_container_file;
    use tempfile::tempdir;

    #[test]
    fn test_encrypt_creates_container() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.txt");
        let output = dir.path().join("output.joye");
        std::fs::write(&input, b"plain payload").unwrap();

        let options = EncryptOptions {
            password: "s3cret".into(),
            tags: b"demo".to_vec(),
        };
        let sealed = encrypt_file(&input, &output, &options).unwrap();

        assert_eq!(sealed, 13);
        assert!(is_container_file(&output));
    }

    #[test]
    fn test_encrypt_rejects_empty_password() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.txt");
        let output = dir.path().join("output.joye");
        std::fs::write(&input, b"data").unwrap();

        let options = EncryptOptions::default();
        assert!(encrypt_file(&input, &output, &options).is_err());
    }
}
