/*!
Opaque identifiers.

Used for instance identity and for default element names when the caller
does not supply one. Not used for arena indexing inside a compiled model;
see `definition::types` for the `RegionId`/`VertexId`/`TransitionId` newtypes
that do that job.
*/

use crate::error::Result;
use lazy_static::lazy_static;
use std::fmt;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// An opaque, randomly generated identifier.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Id(String);

/// Generates the string values backing new [`Id`]s. Pluggable so that tests
/// can swap in a deterministic generator.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
    fn generate_with_prefix(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.generate())
    }
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Id {
    /// A new random identifier, via the globally configured [`IdGenerator`].
    pub fn random() -> Self {
        Self(GENERATOR.generate())
    }

    /// A new random identifier with a human-readable prefix, e.g. `state-x7f2`.
    pub fn random_with_prefix<S>(prefix: S) -> Self
    where
        S: AsRef<str>,
    {
        Self(GENERATOR.generate_with_prefix(prefix.as_ref()))
    }

    /// Wrap an externally supplied string as an identifier, validating it is
    /// non-empty.
    pub fn new_unchecked<S>(value: S) -> Self
    where
        S: Into<String>,
    {
        Self(value.into())
    }

    pub fn validate<S>(value: S) -> Result<Self>
    where
        S: Into<String>,
    {
        let value = value.into();
        if value.is_empty() {
            Err(crate::error::ErrorKind::EmptyIdentifier.into())
        } else {
            Ok(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        id.0
    }
}

// ------------------------------------------------------------------------------------------------
// Private Types
// ------------------------------------------------------------------------------------------------

struct BlobUuidGenerator;

impl IdGenerator for BlobUuidGenerator {
    fn generate(&self) -> String {
        blob_uuid::random_blob()
    }
}

lazy_static! {
    static ref GENERATOR: Box<dyn IdGenerator> = Box::new(BlobUuidGenerator);
}

// ------------------------------------------------------------------------------------------------
// Modules
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_are_distinct() {
        assert_ne!(Id::random(), Id::random());
    }

    #[test]
    fn prefix_is_retained() {
        let id = Id::random_with_prefix("state");
        assert!(id.as_str().starts_with("state-"));
    }

    #[test]
    fn empty_identifier_rejected() {
        assert!(Id::validate("").is_err());
        assert!(Id::validate("ok").is_ok());
    }
}
