//! Query value object

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A validated query to be adjudicated by the council (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Query {
    text: String,
}

impl Query {
    /// Create a query, rejecting empty or whitespace-only text
    pub fn new(text: impl Into<String>) -> Result<Self, DomainError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(DomainError::EmptyQuery);
        }
        Ok(Self { text })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lowercase hex SHA-256 of the query text, used for deduplication
    pub fn hash(&self) -> String {
        hex::encode(Sha256::digest(self.text.as_bytes()))
    }
}

impl TryFrom<String> for Query {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Query::new(value)
    }
}

impl From<Query> for String {
    fn from(query: Query) -> Self {
        query.text
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_creation() {
        let q = Query::new("Total revenue last quarter?").unwrap();
        assert_eq!(q.text(), "Total revenue last quarter?");
    }

    #[test]
    fn test_empty_query_rejected() {
        assert_eq!(Query::new(""), Err(DomainError::EmptyQuery));
        assert_eq!(Query::new("   \n"), Err(DomainError::EmptyQuery));
    }

    #[test]
    fn test_hash_is_stable_sha256() {
        let q = Query::new("abc").unwrap();
        assert_eq!(
            q.hash(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_deserialize_rejects_empty() {
        let result: Result<Query, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }
}
