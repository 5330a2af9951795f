//! Resource types and validated identifiers

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

use crate::exec::ExecError;

static QUICKSIGHT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,512}$").expect("static regex is valid"));

static INSTANCE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^i-[0-9a-f]{8,17}$").expect("static regex is valid"));

/// Kind of externally managed resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Analysis,
    Dataset,
    Instance,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Analysis => "analysis",
            ResourceType::Dataset => "dataset",
            ResourceType::Instance => "instance",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            ResourceType::Analysis | ResourceType::Dataset => &QUICKSIGHT_ID,
            ResourceType::Instance => &INSTANCE_ID,
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            ResourceType::Analysis | ResourceType::Dataset => {
                "1-512 letters, digits, hyphens or underscores"
            }
            ResourceType::Instance => "i- followed by 8-17 lowercase hex digits",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque resource id, validated for its resource type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn parse(resource_type: ResourceType, raw: &str) -> Result<Self, ExecError> {
        if raw.is_empty() {
            return Err(ExecError::InvalidParameter(format!(
                "{resource_type} id is required"
            )));
        }
        if !resource_type.pattern().is_match(raw) {
            return Err(ExecError::InvalidParameter(format!(
                "invalid {resource_type} id '{raw}' (expected {})",
                resource_type.shape()
            )));
        }
        Ok(Self(raw.to_string()))
    }

    /// Validate many ids, failing on the first bad one
    pub fn parse_all(resource_type: ResourceType, raw: &[String]) -> Result<Vec<Self>, ExecError> {
        raw.iter()
            .map(|id| Self::parse(resource_type, id))
            .collect()
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quicksight_ids_accept_word_characters() {
        for id in ["abc", "a-b_c", "0f3c1b2a-5d6e-4f70-8a9b-0c1d2e3f4a5b", "X"] {
            assert!(ResourceId::parse(ResourceType::Analysis, id).is_ok(), "{id}");
            assert!(ResourceId::parse(ResourceType::Dataset, id).is_ok(), "{id}");
        }
    }

    #[test]
    fn quicksight_ids_reject_other_characters() {
        for id in ["a b", "a/b", "a.b", "ä", "id:1"] {
            let err = ResourceId::parse(ResourceType::Analysis, id).unwrap_err();
            assert!(matches!(err, ExecError::InvalidParameter(_)), "{id}");
        }
    }

    #[test]
    fn quicksight_id_length_bound() {
        let ok = "a".repeat(512);
        let too_long = "a".repeat(513);
        assert!(ResourceId::parse(ResourceType::Dataset, &ok).is_ok());
        assert!(ResourceId::parse(ResourceType::Dataset, &too_long).is_err());
    }

    #[test]
    fn empty_id_is_required() {
        let err = ResourceId::parse(ResourceType::Instance, "").unwrap_err();
        assert_eq!(
            err,
            ExecError::InvalidParameter("instance id is required".to_string())
        );
    }

    #[test]
    fn instance_ids() {
        assert!(ResourceId::parse(ResourceType::Instance, "i-0123abcd").is_ok());
        assert!(ResourceId::parse(ResourceType::Instance, "i-0123456789abcdef0").is_ok());
        assert!(ResourceId::parse(ResourceType::Instance, "i-0123abc").is_err());
        assert!(ResourceId::parse(ResourceType::Instance, "i-0123456789abcdef01").is_err());
        assert!(ResourceId::parse(ResourceType::Instance, "i-0123ABCD").is_err());
        assert!(ResourceId::parse(ResourceType::Instance, "0123abcd").is_err());
    }

    #[test]
    fn parse_all_stops_at_first_invalid() {
        let ids = vec!["i-0123abcd".to_string(), "bogus".to_string()];
        let err = ResourceId::parse_all(ResourceType::Instance, &ids).unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn display_is_raw_id() {
        let id = ResourceId::parse(ResourceType::Analysis, "sales-2024").unwrap();
        assert_eq!(id.to_string(), "sales-2024");
        assert_eq!(id.as_str(), "sales-2024");
        assert_eq!(ResourceType::Dataset.to_string(), "dataset");
    }
}
