//! Parse and load `.env` files.
//!
//! The parser is permissive and total: lines that do not match the
//! `KEY=VALUE` grammar are skipped, never reported as errors. Parsed
//! entries are merged into an explicit [`TargetEnv`] by [`populate`], which
//! preserves existing values unless overriding is requested.
//!
//! [`EnvLoader::load`] is the safe default and works against a
//! process-isolated in-memory map. Convenience loaders (`dotenv`,
//! `from_path`, `from_paths`, `from_filename`) mutate the process
//! environment and are `unsafe`, because callers must guarantee no
//! concurrent process-environment access.
//!
//! Encrypted vault blobs are supported through [`decrypt`] and the
//! loader's `decryption_key` option; recovered plaintext is fed to the
//! parser like any other file content.

mod env;
mod error;
mod loader;
mod model;
mod parser;
mod populate;
mod vault;

pub use env::TargetEnv;
pub use error::{
    DecryptError, DecryptErrorKind, Error, PopulateError, PopulateErrorKind,
};
pub use loader::{EnvLoader, dotenv, from_filename, from_path, from_paths};
pub use model::{Encoding, Entry, LoadReport, PathError};
pub use parser::{parse_bytes, parse_reader, parse_str};
pub use populate::{PopulateOptions, populate};
pub use vault::decrypt;
