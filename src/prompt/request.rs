//! The closed set of generation request types.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::prompt::error::PromptError;

/// What kind of text is being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestType {
    Discussion,
    Paper,
    Response,
    /// A `response` issued once per batch entry.
    BatchItem,
}

impl RequestType {
    pub const ALL: [RequestType; 4] = [
        RequestType::Discussion,
        RequestType::Paper,
        RequestType::Response,
        RequestType::BatchItem,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discussion => "discussion",
            Self::Paper => "paper",
            Self::Response => "response",
            Self::BatchItem => "batch-item",
        }
    }

    /// Whether this type answers a reply-target post.
    pub fn is_reply(&self) -> bool {
        matches!(self, Self::Response | Self::BatchItem)
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = PromptError;

    /// Exact match only. Unknown values are a caller error, never a default.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PromptError::UnknownRequestType {
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_type() {
        for t in RequestType::ALL {
            assert_eq!(t.as_str().parse::<RequestType>().unwrap(), t);
        }
    }

    #[test]
    fn rejects_unknown_and_near_misses() {
        for bad in ["essay", "", "Paper", " paper", "batch_item"] {
            let err = bad.parse::<RequestType>().unwrap_err();
            assert!(matches!(err, PromptError::UnknownRequestType { .. }), "{bad}");
        }
    }

    #[test]
    fn reply_types() {
        assert!(RequestType::Response.is_reply());
        assert!(RequestType::BatchItem.is_reply());
        assert!(!RequestType::Paper.is_reply());
    }
}
