//! Class byte encoding and the redefinable program image.
//!
//! A class travels as an immutable byte sequence: the deterministic bincode
//! encoding of its [`ClassFile`]. The [`ProgramImage`] is the executor-side
//! class registry; redefinition decodes, verifies, and swaps a class in
//! place so subsequent invocations see the mutated code.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::insn::ClassFile;
use super::stack::{VerifyError, verify_method};

/// Errors raised while encoding or decoding class bytes.
#[derive(Debug, Error)]
pub enum ClassBytesError {
    /// The byte sequence is not a valid class encoding.
    #[error("malformed class bytes: {0}")]
    Malformed(String),
}

/// Encode a class into its canonical byte sequence.
pub fn encode_class(class: &ClassFile) -> Vec<u8> {
    bincode::serialize(class).expect("class encoding is infallible for well-formed classes")
}

/// Decode a class from its byte sequence.
pub fn decode_class(bytes: &[u8]) -> Result<ClassFile, ClassBytesError> {
    bincode::deserialize(bytes).map_err(|e| ClassBytesError::Malformed(e.to_string()))
}

/// Capability handed to the catalog and the executor: latest *unmutated*
/// bytes for a class.
pub trait ByteSource {
    /// Bytes of the named class, or `None` when unknown.
    fn class_bytes(&self, name: &str) -> Option<Vec<u8>>;
}

/// Redefinition failure; any of these makes the mutant non-viable.
#[derive(Debug, Error)]
pub enum RedefineError {
    /// Bytes did not decode to a class.
    #[error(transparent)]
    Bytes(#[from] ClassBytesError),
    /// The decoded class names a different class than the redefined one.
    #[error("class name mismatch: expected {expected}, got {got}")]
    NameMismatch {
        /// Name under redefinition.
        expected: String,
        /// Name found in the supplied bytes.
        got: String,
    },
    /// The class is not present in the image.
    #[error("unknown class: {0}")]
    UnknownClass(String),
    /// A method failed verification.
    #[error("verification of {class}.{method} failed: {source}")]
    Rejected {
        /// Class name.
        class: String,
        /// Method name.
        method: String,
        /// Underlying verifier error.
        source: VerifyError,
    },
}

/// The set of classes an executor runs tests against.
///
/// Classes are loaded once at executor start; mutants are applied through
/// [`ProgramImage::redefine`] and reverted by redefining the original bytes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramImage {
    classes: BTreeMap<String, ClassFile>,
}

impl ProgramImage {
    /// Build an image from classes; later duplicates replace earlier ones.
    pub fn new(classes: impl IntoIterator<Item = ClassFile>) -> Self {
        let mut map = BTreeMap::new();
        for c in classes {
            map.insert(c.name.clone(), c);
        }
        Self { classes: map }
    }

    /// Class names in sorted order.
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Look up a class by name.
    pub fn class(&self, name: &str) -> Option<&ClassFile> {
        self.classes.get(name)
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True when the image holds no classes.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Verify every method of `class`, mapping the first failure.
    fn verify_class(class: &ClassFile) -> Result<(), RedefineError> {
        for method in &class.methods {
            verify_method(method).map_err(|source| RedefineError::Rejected {
                class: class.name.clone(),
                method: method.name.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Replace the definition of `name` with the supplied bytes.
    ///
    /// The bytes are decoded and every method verified before the swap; on
    /// any failure the image is left untouched and the caller treats the
    /// mutant as non-viable.
    pub fn redefine(&mut self, name: &str, bytes: &[u8]) -> Result<(), RedefineError> {
        if !self.classes.contains_key(name) {
            return Err(RedefineError::UnknownClass(name.to_string()));
        }
        let class = decode_class(bytes)?;
        if class.name != name {
            return Err(RedefineError::NameMismatch {
                expected: name.to_string(),
                got: class.name,
            });
        }
        Self::verify_class(&class)?;
        self.classes.insert(name.to_string(), class);
        Ok(())
    }

    /// Serialize the whole image (used to ship classes to the minion).
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("image encoding is infallible")
    }

    /// Deserialize an image previously written with [`ProgramImage::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ClassBytesError> {
        bincode::deserialize(bytes).map_err(|e| ClassBytesError::Malformed(e.to_string()))
    }
}

impl ByteSource for ProgramImage {
    fn class_bytes(&self, name: &str) -> Option<Vec<u8>> {
        self.classes.get(name).map(encode_class)
    }
}
