//! The LLM model catalog.
//!
//! Each supported model is a variant carrying its own vendor, API version
//! string, context-window limit, and availability flag. Lookup by version
//! string fails explicitly on a miss - callers never get a silent default.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown model version \"{version}\"; available versions are {known:?}")]
    UnknownVersion { version: String, known: Vec<&'static str> },
}

/// Which company hosts the model API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vendor {
    OpenAi,
    Anthropic,
}

/// A hosted model the bots can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LlmModel {
    Gpt4o,
    Claude35Sonnet,
}

impl LlmModel {
    pub const ALL: [LlmModel; 2] = [LlmModel::Gpt4o, LlmModel::Claude35Sonnet];

    pub const fn vendor(self) -> Vendor {
        match self {
            LlmModel::Gpt4o => Vendor::OpenAi,
            LlmModel::Claude35Sonnet => Vendor::Anthropic,
        }
    }

    /// The version identifier the vendor API expects.
    pub const fn version(self) -> &'static str {
        match self {
            LlmModel::Gpt4o => "gpt-4o",
            LlmModel::Claude35Sonnet => "claude-3-5-sonnet-20240620",
        }
    }

    /// Total context window in tokens.
    pub const fn token_limit(self) -> usize {
        match self {
            LlmModel::Gpt4o => 128_000,
            LlmModel::Claude35Sonnet => 200_000,
        }
    }

    /// Whether the model is offered in the bot UI.
    pub const fn is_available(self) -> bool {
        match self {
            LlmModel::Gpt4o => true,
            LlmModel::Claude35Sonnet => true,
        }
    }

    /// Look up a model by its API version string.
    pub fn from_version(version: &str) -> Result<Self, ModelError> {
        Self::ALL
            .iter()
            .copied()
            .find(|model| model.version() == version)
            .ok_or_else(|| ModelError::UnknownVersion {
                version: version.to_string(),
                known: Self::ALL.map(LlmModel::version).to_vec(),
            })
    }
}

impl std::fmt::Display for LlmModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.version())
    }
}

/// Model used when a session does not pick one.
pub const DEFAULT_MODEL: LlmModel = LlmModel::Claude35Sonnet;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_version() {
        let model = LlmModel::from_version("gpt-4o").unwrap();
        assert_eq!(model, LlmModel::Gpt4o);
        assert_eq!(model.vendor(), Vendor::OpenAi);
        assert_eq!(model.token_limit(), 128_000);
    }

    #[test]
    fn lookup_miss_is_explicit() {
        let err = LlmModel::from_version("unknown-model-v1").unwrap_err();
        let ModelError::UnknownVersion { version, known } = err;
        assert_eq!(version, "unknown-model-v1");
        assert!(known.contains(&"claude-3-5-sonnet-20240620"));
    }

    #[test]
    fn catalog_is_fully_described() {
        for model in LlmModel::ALL {
            assert!(!model.version().is_empty());
            assert!(model.token_limit() > 0);
        }
    }
}
