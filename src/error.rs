use std::error::Error as StdError;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    InvalidEncoding(std::str::Utf8Error),
    Populate(PopulateError),
    Decrypt(DecryptError),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::InvalidEncoding(err) => write!(f, "invalid UTF-8 input: {err}"),
            Self::Populate(err) => write!(f, "{err}"),
            Self::Decrypt(err) => write!(f, "{err}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::InvalidEncoding(err) => Some(err),
            Self::Populate(err) => Some(err),
            Self::Decrypt(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(value: std::str::Utf8Error) -> Self {
        Self::InvalidEncoding(value)
    }
}

impl From<PopulateError> for Error {
    fn from(value: PopulateError) -> Self {
        Self::Populate(value)
    }
}

impl From<DecryptError> for Error {
    fn from(value: DecryptError) -> Self {
        Self::Decrypt(value)
    }
}

/// The populate source could not be applied as an environment mapping.
///
/// Raised before any target mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulateError {
    pub key: String,
    pub kind: PopulateErrorKind,
}

impl PopulateError {
    pub(crate) fn new(key: impl Into<String>, kind: PopulateErrorKind) -> Self {
        Self {
            key: key.into(),
            kind,
        }
    }
}

impl Display for PopulateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "populate source is not a usable mapping: {} (key `{}`)",
            self.kind, self.key
        )
    }
}

impl StdError for PopulateError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulateErrorKind {
    /// Key contains `=` or NUL and cannot name an environment variable.
    InvalidKey,
    /// Value contains NUL and cannot be stored in an environment.
    InvalidValue,
}

impl Display for PopulateErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey => write!(f, "invalid key"),
            Self::InvalidValue => write!(f, "invalid value"),
        }
    }
}

/// Vault ciphertext could not be decrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptError {
    pub kind: DecryptErrorKind,
}

impl DecryptError {
    pub(crate) fn new(kind: DecryptErrorKind) -> Self {
        Self { kind }
    }
}

impl Display for DecryptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "decryption failed: {}", self.kind)
    }
}

impl StdError for DecryptError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptErrorKind {
    /// Key material did not end in 64 hex characters (32 bytes).
    InvalidKeyMaterial,
    /// Ciphertext was not base64, or too short to hold nonce and tag.
    MalformedCiphertext,
    /// The authentication tag did not verify.
    AuthenticationFailed,
}

impl Display for DecryptErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKeyMaterial => write!(f, "invalid key material"),
            Self::MalformedCiphertext => write!(f, "malformed ciphertext"),
            Self::AuthenticationFailed => write!(f, "authentication tag mismatch"),
        }
    }
}
