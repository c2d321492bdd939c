use crate::error::Result;
use crate::header::{self, HeaderSummary};
use std::fs::File;
use std::path::Path;

/// Display information about a container file
///
/// Reads only the header; no password is required and nothing is decrypted.
pub fn show_info(path: &Path, json: bool) -> Result<String> {
    let mut file = File::open(path)?;
    let header = header::read(&mut file)?;
    let file_size = file.metadata()?.len();
    let summary = HeaderSummary::from(&header);

    if json {
        let mut out = serde_json::to_string_pretty(&summary)?;
        out.push('\n');
        return Ok(out);
    }

    let mut output = String::new();

    output.push_str("Joyebox Container Information\n");
    output.push_str("=============================\n\n");

    output.push_str(&format!("File: {}\n", path.display()));
    output.push_str(&format!("Actual size: {}\n", format_size(file_size)));
    output.push_str(&format!("Version: {}\n", summary.version));
    output.push_str(&format!("Suite: {}\n", summary.suite));
    output.push_str(&format!("Nonce: {}\n", summary.nonce));
    if summary.size_backpatched {
        output.push_str(&format!(
            "Payload size: {} ({} bytes)\n",
            format_size(summary.size),
            summary.size
        ));
    } else {
        // Writer never backpatched the slot; readers recover the size
        // from the file length instead.
        let recovered = file_size.saturating_sub(summary.data_offset);
        output.push_str(&format!(
            "Payload size: unrecorded, recovered as {} bytes\n",
            recovered
        ));
    }
    output.push_str(&format!("Auth tag: {}\n", summary.auth_tag));
    output.push_str(&format!("Data offset: {}\n", summary.data_offset));

    match (&summary.tags, summary.tags_len) {
        (_, 0) => output.push_str("Tags: none\n"),
        (Some(text), len) => output.push_str(&format!("Tags: {} bytes ({:?})\n", len, text)),
        (None, len) => output.push_str(&format!("Tags: {} bytes (binary)\n", len)),
    }

    Ok(output)
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::encrypt::{encrypt_file, EncryptOptions};
    use tempfile::tempdir;

    #[test]
    fn test_show_info() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.txt");
        let container = dir.path().join("test.joye");
        std::fs::write(&input, b"Test data").unwrap();

        let options = EncryptOptions {
            password: "secret".into(),
            tags: b"demo".to_vec(),
        };
        encrypt_file(&input, &container, &options).unwrap();

        let info = show_info(&container, false).unwrap();
        assert!(info.contains("Version: 1"));
        assert!(info.contains("Suite: AES-256-CTR + HMAC-SHA-256"));
        assert!(info.contains("Payload size: 9 B (9 bytes)"));
        assert!(info.contains("Tags: 4 bytes (\"demo\")"));
    }

    #[test]
    fn test_show_info_json() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.txt");
        let container = dir.path().join("test.joye");
        std::fs::write(&input, b"payload").unwrap();

        let options = EncryptOptions {
            password: "secret".into(),
            tags: Vec::new(),
        };
        encrypt_file(&input, &container, &options).unwrap();

        let info = show_info(&container, true).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&info).unwrap();
        assert_eq!(parsed["version"], 1);
        assert_eq!(parsed["size"], 7);
        assert_eq!(parsed["tags_len"], 0);
    }

    #[test]
    fn test_info_rejects_foreign_file() {
        let dir = tempdir().unwrap();
        let other = dir.path().join("not-a-container.bin");
        std::fs::write(&other, b"RIFF junk data").unwrap();
        assert!(show_info(&other, false).is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1048576), "1.0 MB");
    }
}
