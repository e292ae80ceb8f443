//! End-to-end behavior with no text-generation clients configured.
//!
//! Every classification and response cycle must complete without a client:
//! classification lands on the keyword scorer and each strategy returns its
//! canned reply.

use std::sync::Arc;

use mindvane::config::LlmConfig;
use mindvane::intent::{Intent, IntentClassifier};
use mindvane::llm::{LlmRegistry, LlmTier};
use mindvane::respond::{FollowUpRequest, ResponseRouter, StrategyRequest};

fn empty_registry() -> Arc<LlmRegistry> {
    Arc::new(LlmRegistry::new(LlmConfig::default()))
}

#[test]
fn unconfigured_tiers_resolve_to_unavailable() {
    let registry = empty_registry();
    for tier in [LlmTier::Fast, LlmTier::Balanced, LlmTier::Deep] {
        assert!(registry.resolve(tier).is_err(), "{tier} should be unavailable");
    }
}

#[tokio::test]
async fn knowledge_question_reaches_the_knowledge_canned_reply() {
    let registry = empty_registry();
    let classifier = IntentClassifier::new(registry.clone());
    let router = ResponseRouter::new(registry);

    let classification = classifier.classify("教えて、とは何ですか").await;
    assert_eq!(classification.intent, Intent::Knowledge);
    assert!(classification.confidence > 0.0 && classification.confidence <= 0.7);

    let reply = router
        .respond(classification, StrategyRequest::new("教えて、とは何ですか"))
        .await;
    assert_eq!(
        reply.response,
        "その質問にお答えできる情報をうまく取得できませんでした。少し言い方を変えて、もう一度聞いてもらえますか？"
    );
}

#[tokio::test]
async fn unmatched_text_classifies_as_chat_with_floor_confidence() {
    let registry = empty_registry();
    let classifier = IntentClassifier::new(registry);

    let classification = classifier.classify("こんにちは！").await;
    assert_eq!(classification.intent, Intent::Chat);
    assert_eq!(classification.confidence, 0.3);
}

#[tokio::test]
async fn empathy_canned_reply_acknowledges_without_advice() {
    let registry = empty_registry();
    let classifier = IntentClassifier::new(registry.clone());
    let router = ResponseRouter::new(registry);

    let classification = classifier.classify("最近ずっとつらい。愚痴を聞いて").await;
    assert_eq!(classification.intent, Intent::Empathy);

    let reply = router
        .respond(
            classification,
            StrategyRequest::new("最近ずっとつらい。愚痴を聞いて"),
        )
        .await;
    assert_eq!(
        reply.response,
        "お気持ち、受け止めました。話してくれてありがとうございます。"
    );
}

#[tokio::test]
async fn deep_research_follow_up_degrades_to_canned_unavailable() {
    let router = ResponseRouter::new(empty_registry());

    let reply = router
        .deepen(FollowUpRequest {
            original_query: "リモートワークの生産性について".to_string(),
            prior_response: Some("集中時間の確保が鍵です".to_string()),
        })
        .await;

    assert_eq!(
        reply.response,
        "申し訳ありません。Deep Research サービスが現在利用できません。\n通常の回答をご参照ください。"
    );
}

#[tokio::test]
async fn profile_summary_does_not_change_the_canned_path() {
    let router = ResponseRouter::new(empty_registry());

    let request = StrategyRequest::new("今日はいい天気")
        .with_profile_summary("直近14日間の感情傾向: calm(4回)");
    let reply = router
        .respond(
            mindvane::intent::ClassificationResult {
                intent: Intent::Chat,
                confidence: 0.3,
            },
            request,
        )
        .await;
    assert_eq!(reply.response, "なるほど！いいですね。");
}
