//! Content fingerprints for cache keys.
//!
//! A [`Fingerprint`] is the lowercase hex MD5 digest of an upload's raw
//! bytes. It identifies content for deduplication only and makes no
//! security claim.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    io::Read,
};

use crate::error::KeyReelError;

/// Deterministic hash of raw content bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint an in-memory upload.
    ///
    /// # Example
    ///
    /// ```
    /// use keyreel::Fingerprint;
    ///
    /// let fingerprint = Fingerprint::of(b"abc");
    /// assert_eq!(fingerprint.as_str(), "900150983cd24fb0d6963f7d28e17f72");
    /// ```
    pub fn of(bytes: &[u8]) -> Self {
        Self(format!("{:x}", md5::compute(bytes)))
    }

    /// Fingerprint a stream without loading it into memory.
    ///
    /// # Errors
    ///
    /// Returns [`KeyReelError::Io`] if reading fails.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, KeyReelError> {
        let mut context = md5::Context::new();
        let mut buffer = [0u8; 64 * 1024];
        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            context.consume(&buffer[..read]);
        }
        Ok(Self(format!("{:x}", context.compute())))
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
