//! Validated primitive types shared across medview crates.
//!
//! These wrappers guarantee their invariants once constructed, so the rest of the
//! workspace can pass them around without re-checking:
//! - [`NonEmptyText`]: trimmed, non-empty text (search filters, credentials)
//! - [`ResourceId`]: a FHIR logical id (`[A-Za-z0-9\-\.]{1,64}`)
//! - [`Reference`]: a parsed `"ResourceType/id"` pointer

use std::fmt;

/// Maximum length of a FHIR logical id.
pub const MAX_RESOURCE_ID_LEN: usize = 64;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// The input is not a valid FHIR logical id
    #[error("invalid resource id: {0}")]
    InvalidResourceId(String),
}

// ============================================================================
// NonEmptyText
// ============================================================================

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`NonEmptyText::new`], but maps blank input to `None`.
    ///
    /// Useful for optional filters where an empty box means "no filter".
    pub fn optional(input: impl AsRef<str>) -> Option<Self> {
        Self::new(input).ok()
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// ResourceId
// ============================================================================

/// A FHIR logical resource id.
///
/// Ids are 1 to 64 characters drawn from ASCII letters, digits, `-` and `.`.
/// Anything else (slashes, query characters, whitespace) is rejected so an id can
/// be safely interpolated into a request path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(String);

impl ResourceId {
    /// Parse and validate a resource id.
    ///
    /// Surrounding whitespace is trimmed first.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::InvalidResourceId`] if the id is empty, too long, or contains
    /// characters outside the FHIR id alphabet.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        let valid = !trimmed.is_empty()
            && trimmed.len() <= MAX_RESOURCE_ID_LEN
            && trimmed
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.');
        if !valid {
            return Err(TextError::InvalidResourceId(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for ResourceId {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for ResourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ResourceId::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Reference
// ============================================================================

/// A relative `Type/id` reference, as sent in search parameters such as `subject`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    resource_type: String,
    id: ResourceId,
}

impl Reference {
    pub fn new(resource_type: impl Into<String>, id: ResourceId) -> Self {
        Self {
            resource_type: resource_type.into(),
            id,
        }
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }
}

/// Return the text after the last `/` of a reference string.
///
/// This is the lenient comparison used to join resources: it does not require the
/// reference to be well formed, only that it ends in an id segment.
pub fn trailing_segment(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_and_rejects_blank() {
        assert_eq!(NonEmptyText::new("  Mary ").unwrap().as_str(), "Mary");
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
        assert!(NonEmptyText::optional("").is_none());
    }

    #[test]
    fn non_empty_text_deserialize_rejects_blank() {
        let err = serde_json::from_str::<NonEmptyText>("\"  \"").expect_err("blank");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn resource_id_accepts_fhir_alphabet() {
        let id = ResourceId::parse("0195b69b-f52e-7209.b8d1").expect("valid id");
        assert_eq!(id.as_str(), "0195b69b-f52e-7209.b8d1");
    }

    #[test]
    fn resource_id_rejects_path_characters() {
        for bad in ["", "a/b", "a b", "x?y=1", &"a".repeat(65)] {
            assert!(ResourceId::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn reference_displays_type_and_id() {
        let reference = Reference::new("Patient", ResourceId::parse("p1").unwrap());
        assert_eq!(reference.to_string(), "Patient/p1");
        assert_eq!(reference.resource_type(), "Patient");
        assert_eq!(reference.id().as_str(), "p1");
    }

    #[test]
    fn trailing_segment_returns_last_path_part() {
        assert_eq!(trailing_segment("Observation/5"), "5");
        assert_eq!(trailing_segment("5"), "5");
        assert_eq!(trailing_segment("a/b/"), "");
    }
}
