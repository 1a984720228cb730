//! Style policies: per-request-type wording kept as data.
//!
//! A [`PolicyTable`] maps every [`RequestType`] to a [`StylePolicy`] plus one
//! shared persona preamble. The bundled table is compiled in from
//! `data/policies/default.toml`; a deployment can swap it wholesale with
//! [`PolicyTable::from_path`]. The assembler only looks policies up and fills
//! placeholders, so rewording never touches code.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::prompt::error::{PromptError, PromptResult};
use crate::prompt::request::RequestType;

const DEFAULT_POLICIES_TOML: &str = include_str!("../../data/policies/default.toml");

/// Length target for a request type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LengthPolicy {
    /// A fixed, human-readable target such as `"250-400"`.
    Fixed { words: String },
    /// Word target computed from a caller-supplied page count.
    PerPage { words_per_page: u32, default_pages: u32 },
}

/// Wording and length rules for one request type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StylePolicy {
    pub length: LengthPolicy,
    pub banned_terms: Vec<String>,
    #[serde(default)]
    pub banned_patterns: Vec<String>,
    #[serde(default)]
    pub style_examples: Vec<String>,
    /// Type-specific block appended to the persona in the system prompt.
    pub system_block: String,
    /// The task itself, closing the user content.
    pub task_directive: String,
    /// Prefix for the user's additional instructions.
    #[serde(default = "default_instructions_label")]
    pub instructions_label: String,
    /// Short reminder appended to the task directive when citations are active.
    #[serde(default)]
    pub citation_note: String,
}

fn default_instructions_label() -> String {
    "INSTRUCTIONS".into()
}

#[derive(Debug, Serialize, Deserialize)]
struct PolicyFile {
    persona: String,
    policies: BTreeMap<String, StylePolicy>,
}

/// Complete lookup table from request type to style policy.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    persona: String,
    policies: BTreeMap<RequestType, StylePolicy>,
}

impl PolicyTable {
    /// The table compiled into the binary.
    pub fn bundled() -> PromptResult<Self> {
        Self::from_toml_str(DEFAULT_POLICIES_TOML, "bundled policies")
    }

    /// Load a replacement table from disk.
    pub fn from_path(path: &Path) -> PromptResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PromptError::PolicyRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Parse a table. Unknown type keys and missing types are both rejected.
    pub fn from_toml_str(content: &str, origin: &str) -> PromptResult<Self> {
        let file: PolicyFile = toml::from_str(content).map_err(|e| PromptError::PolicyParse {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;

        let mut policies = BTreeMap::new();
        for (key, policy) in file.policies {
            let request_type =
                RequestType::from_str(&key).map_err(|_| PromptError::PolicyParse {
                    origin: origin.to_string(),
                    message: format!("unknown request type key \"{key}\""),
                })?;
            policies.insert(request_type, policy);
        }

        for request_type in RequestType::ALL {
            if !policies.contains_key(&request_type) {
                return Err(PromptError::MissingPolicy {
                    request_type: request_type.to_string(),
                });
            }
        }

        Ok(Self {
            persona: file.persona,
            policies,
        })
    }

    /// Shared persona preamble, identical for every request type.
    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn get(&self, request_type: RequestType) -> PromptResult<&StylePolicy> {
        self.policies
            .get(&request_type)
            .ok_or_else(|| PromptError::MissingPolicy {
                request_type: request_type.to_string(),
            })
    }

    /// Render the table back to TOML.
    pub fn to_toml(&self) -> PromptResult<String> {
        let file = PolicyFile {
            persona: self.persona.clone(),
            policies: self
                .policies
                .iter()
                .map(|(t, p)| (t.to_string(), p.clone()))
                .collect(),
        };
        toml::to_string_pretty(&file).map_err(|e| PromptError::PolicyParse {
            origin: "policy table".into(),
            message: e.to_string(),
        })
    }
}
