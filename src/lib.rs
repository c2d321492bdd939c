//! Joyebox - Seekable Password-Encrypted Container
//!
//! A file format that stores an arbitrary byte stream encrypted under
//! AES-256-CTR, keyed from a password, with a whole-file HMAC-SHA256
//! authentication tag and an opaque caller-supplied tag blob. Counter mode
//! makes the keystream a pure function of the byte offset, so both sessions
//! support random access: the reader seeks anywhere, and the writer may seek
//! backward to overwrite ciphertext it already emitted (consumers use this to
//! backpatch box and frame headers after the fact).
//!
//! ## On-disk layout
//!
//! ```text
//! magic (4) | version (1) | nonce (16) | size (8) | auth_tag (32) |
//! tags_len (2) | tags | ciphertext ...
//! ```
//!
//! The size and auth_tag slots are written zeroed and backpatched when the
//! writer finishes: authentication is deliberately delayed to a full second
//! pass over the ciphertext, because an incremental hash would be invalidated
//! by backward-seek rewrites.
//!
//! ## Example
//!
//! ```no_run
//! use joyebox::{Integrity, Reader, Writer};
//! use std::fs::{File, OpenOptions};
//! use std::io::{Read, Write};
//!
//! let sink = OpenOptions::new()
//!     .read(true)
//!     .write(true)
//!     .create(true)
//!     .truncate(true)
//!     .open("clip.joye")
//!     .unwrap();
//! let mut writer = Writer::new(sink, "s3cret", b"demo").unwrap();
//! writer.write_all(b"hello world").unwrap();
//! writer.finish().unwrap();
//!
//! let source = File::open("clip.joye").unwrap();
//! let mut reader = Reader::open(source, "s3cret", Integrity::Deferred).unwrap();
//! let mut payload = Vec::new();
//! reader.read_to_end(&mut payload).unwrap();
//! assert!(reader.verify().unwrap());
//! ```
//!
//! Both sessions implement the standard `Read`/`Write`/`Seek` traits, so a
//! container can stand in as a virtual file behind any component that accepts
//! those, e.g. a multimedia demuxer's custom I/O layer.

pub mod cipher;
pub mod cli;
pub mod error;
pub mod header;
pub mod kdf;
pub mod reader;
pub mod writer;

pub use error::{JoyeError, Result};
pub use header::{is_container_file, Header, AUTH_TAG_SIZE, MAGIC, NONCE_SIZE, VERSION};
pub use reader::{verify_file, Integrity, Reader};
pub use writer::Writer;
