//! Response routing and strategies.
//!
//! A classification result is the only transition trigger: the router picks
//! exactly one strategy, the strategy produces the reply, and nothing is
//! carried between cycles. Strategies degrade to fixed canned replies when
//! their generation tier is unavailable or fails — a reply always comes back.

mod brainstorm;
mod chat;
mod deep_dive;
mod deep_research;
mod empathy;
mod knowledge;

pub use brainstorm::BrainstormStrategy;
pub use chat::ChatStrategy;
pub use deep_dive::DeepDiveStrategy;
pub use deep_research::DeepResearchStrategy;
pub use empathy::EmpathyStrategy;
pub use knowledge::KnowledgeStrategy;

use std::sync::Arc;

use crate::error::LlmError;
use crate::intent::{ClassificationResult, Intent};
use crate::llm::{ChatMessage, GenerationRequest, LlmRegistry, LlmTier, TextGenerator};

/// Input assembled by the router for a single strategy invocation.
#[derive(Debug, Clone)]
pub struct StrategyRequest {
    pub input_text: String,
    /// Profile context summary, injected into the system prompt when present.
    pub profile_summary: Option<String>,
}

impl StrategyRequest {
    pub fn new(input_text: impl Into<String>) -> Self {
        Self {
            input_text: input_text.into(),
            profile_summary: None,
        }
    }

    pub fn with_profile_summary(mut self, summary: impl Into<String>) -> Self {
        self.profile_summary = Some(summary.into());
        self
    }
}

/// Terminal output of a response cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyReply {
    pub response: String,
}

/// Explicit follow-up that escalates a prior reply to deep research.
/// This is the only path into [`DeepResearchStrategy`]; primary
/// classification never reaches it.
#[derive(Debug, Clone)]
pub struct FollowUpRequest {
    pub original_query: String,
    pub prior_response: Option<String>,
}

/// Acknowledgment for state entries, which bypass the generation strategies.
const STATE_ACK_REPLY: &str = "状態を記録しました。話したくなったら、いつでも声をかけてくださいね。";

/// Dispatches a classified input to exactly one response strategy.
pub struct ResponseRouter {
    chat: ChatStrategy,
    empathy: EmpathyStrategy,
    knowledge: KnowledgeStrategy,
    deep_dive: DeepDiveStrategy,
    brainstorm: BrainstormStrategy,
    deep_research: DeepResearchStrategy,
}

impl ResponseRouter {
    pub fn new(llm: Arc<LlmRegistry>) -> Self {
        Self {
            chat: ChatStrategy::new(llm.clone()),
            empathy: EmpathyStrategy::new(llm.clone()),
            knowledge: KnowledgeStrategy::new(llm.clone()),
            deep_dive: DeepDiveStrategy::new(llm.clone()),
            brainstorm: BrainstormStrategy::new(llm.clone()),
            deep_research: DeepResearchStrategy::new(llm),
        }
    }

    /// Produce a reply for a classified input.
    pub async fn respond(
        &self,
        classification: ClassificationResult,
        request: StrategyRequest,
    ) -> StrategyReply {
        tracing::debug!(
            intent = %classification.intent,
            confidence = classification.confidence,
            "dispatching response strategy"
        );

        match classification.intent {
            Intent::Chat => self.chat.respond(&request).await,
            Intent::Empathy => self.empathy.respond(&request).await,
            Intent::Knowledge => self.knowledge.respond(&request).await,
            Intent::DeepDive => self.deep_dive.respond(&request).await,
            Intent::Brainstorm => self.brainstorm.respond(&request).await,
            // State entries are self-reports; acknowledge without generation.
            Intent::State => StrategyReply {
                response: STATE_ACK_REPLY.to_string(),
            },
        }
    }

    /// Run deep research for an explicit follow-up, bypassing classification.
    pub async fn deepen(&self, follow_up: FollowUpRequest) -> StrategyReply {
        self.deep_research.respond(&follow_up).await
    }
}

/// Shared generation path for the prompt-driven strategies: resolve the tier,
/// degrade to `fallback_reply` on unavailability or any generation failure.
pub(crate) async fn generate_or_fallback(
    llm: &LlmRegistry,
    tier: LlmTier,
    temperature: f32,
    system_prompt: &str,
    fallback_reply: &str,
    request: &StrategyRequest,
) -> StrategyReply {
    let generator = match llm.resolve(tier) {
        Ok(generator) => generator,
        Err(unavailable) => {
            tracing::debug!(%unavailable, "strategy falling back to canned reply");
            return StrategyReply {
                response: fallback_reply.to_string(),
            };
        }
    };

    match generate(generator.as_ref(), temperature, system_prompt, request).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(%tier, error = %e, "strategy generation failed");
            StrategyReply {
                response: fallback_reply.to_string(),
            }
        }
    }
}

async fn generate(
    generator: &dyn TextGenerator,
    temperature: f32,
    system_prompt: &str,
    request: &StrategyRequest,
) -> Result<StrategyReply, LlmError> {
    generator.initialize().await?;

    let system = compose_system_prompt(system_prompt, request.profile_summary.as_deref());
    let response = generator
        .generate_text(
            GenerationRequest::new(vec![
                ChatMessage::system(system),
                ChatMessage::user(request.input_text.clone()),
            ])
            .with_temperature(temperature),
        )
        .await?;

    Ok(StrategyReply {
        response: response.content,
    })
}

/// Append the profile summary as background context when available.
fn compose_system_prompt(base: &str, summary: Option<&str>) -> String {
    match summary {
        Some(summary) => {
            format!("{base}\n\n# ユーザーの背景情報（プロファイル要約）\n{summary}")
        }
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_router() -> ResponseRouter {
        ResponseRouter::new(Arc::new(LlmRegistry::new(Default::default())))
    }

    #[test]
    fn system_prompt_carries_summary() {
        let composed = compose_system_prompt("base prompt", Some("最近は疲れ気味"));
        assert!(composed.starts_with("base prompt"));
        assert!(composed.contains("最近は疲れ気味"));

        assert_eq!(compose_system_prompt("base prompt", None), "base prompt");
    }

    #[tokio::test]
    async fn state_intent_is_acknowledged_without_generation() {
        let router = empty_router();
        let reply = router
            .respond(
                ClassificationResult {
                    intent: Intent::State,
                    confidence: 1.0,
                },
                StrategyRequest::new("体調は普通"),
            )
            .await;
        assert_eq!(reply.response, STATE_ACK_REPLY);
    }

    #[tokio::test]
    async fn every_intent_yields_a_reply_without_clients() {
        let router = empty_router();
        for intent in [
            Intent::Chat,
            Intent::Empathy,
            Intent::Knowledge,
            Intent::DeepDive,
            Intent::Brainstorm,
            Intent::State,
        ] {
            let reply = router
                .respond(
                    ClassificationResult {
                        intent,
                        confidence: 0.5,
                    },
                    StrategyRequest::new("テスト入力"),
                )
                .await;
            assert!(!reply.response.is_empty(), "no reply for {intent}");
        }
    }

    #[tokio::test]
    async fn deepen_without_client_returns_canned_reply() {
        let router = empty_router();
        let reply = router
            .deepen(FollowUpRequest {
                original_query: "リモートワークの生産性".to_string(),
                prior_response: Some("初回の回答".to_string()),
            })
            .await;
        assert!(reply.response.contains("Deep Research"));
    }
}
