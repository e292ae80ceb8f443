//! Tiered text-generation clients.
//!
//! Consumers never construct clients directly: they ask the [`LlmRegistry`]
//! for a handle at a quality tier and branch on availability. An unavailable
//! tier is an expected state, not an error condition — every caller has a
//! deterministic fallback.

mod extract;
mod openai_compatible;
mod provider;

pub use extract::extract_json_object;
pub use openai_compatible::OpenAiCompatibleGenerator;
pub use provider::{
    ChatMessage, GenerationRequest, GenerationResponse, Role, TextGenerator, TokenUsage,
};

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::config::{LlmConfig, TierConfig};
use crate::error::LlmUnavailable;

/// Quality/latency tier for text generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmTier {
    /// Low-latency model for classification and casual replies.
    Fast,
    /// Mid-tier model for structured problem-solving.
    Balanced,
    /// Highest-quality model, reserved for deep research.
    Deep,
}

impl LlmTier {
    /// Tier name as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmTier::Fast => "fast",
            LlmTier::Balanced => "balanced",
            LlmTier::Deep => "deep",
        }
    }
}

impl std::fmt::Display for LlmTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolver for per-tier client handles.
///
/// Handles are constructed lazily and cached; beyond that cache the registry
/// holds no state, so it can be shared freely across request cycles.
pub struct LlmRegistry {
    config: LlmConfig,
    handles: RwLock<HashMap<LlmTier, Arc<dyn TextGenerator>>>,
}

impl LlmRegistry {
    /// Create a registry over the given tier configuration.
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a client handle for `tier`.
    ///
    /// Performs no I/O: an unconfigured tier fails immediately, and a
    /// configured one returns a cached or freshly constructed handle whose
    /// first network contact happens in `initialize()`.
    pub fn resolve(&self, tier: LlmTier) -> Result<Arc<dyn TextGenerator>, LlmUnavailable> {
        if let Some(handle) = self
            .handles
            .read()
            .expect("handle cache lock poisoned")
            .get(&tier)
        {
            return Ok(handle.clone());
        }

        let tier_config = self
            .tier_config(tier)
            .ok_or_else(|| LlmUnavailable::new(tier, "tier not configured"))?;

        let generator = OpenAiCompatibleGenerator::new(tier_config.clone())
            .map_err(|e| LlmUnavailable::new(tier, e.to_string()))?;
        let handle: Arc<dyn TextGenerator> = Arc::new(generator);

        self.handles
            .write()
            .expect("handle cache lock poisoned")
            .insert(tier, handle.clone());

        Ok(handle)
    }

    fn tier_config(&self, tier: LlmTier) -> Option<&TierConfig> {
        match tier {
            LlmTier::Fast => self.config.fast.as_ref(),
            LlmTier::Balanced => self.config.balanced.as_ref(),
            LlmTier::Deep => self.config.deep.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_tier_is_unavailable() {
        let registry = LlmRegistry::new(LlmConfig::default());
        let err = registry.resolve(LlmTier::Fast).unwrap_err();
        assert_eq!(err.tier, LlmTier::Fast);
        assert!(err.reason.contains("not configured"));
    }

    #[test]
    fn configured_tier_resolves_and_caches() {
        let config = LlmConfig {
            fast: Some(TierConfig {
                base_url: "https://api.example.com".to_string(),
                model: "small-model".to_string(),
                api_key: None,
                max_tokens: None,
            }),
            ..Default::default()
        };
        let registry = LlmRegistry::new(config);

        let first = registry.resolve(LlmTier::Fast).unwrap();
        let second = registry.resolve(LlmTier::Fast).unwrap();
        assert_eq!(first.model_name(), "small-model");
        assert!(Arc::ptr_eq(&first, &second));

        assert!(registry.resolve(LlmTier::Deep).is_err());
    }

    #[test]
    fn tier_display() {
        assert_eq!(LlmTier::Fast.as_str(), "fast");
        assert_eq!(LlmTier::Deep.to_string(), "deep");
    }
}
