//! Responder Tests
//!
//! Full request flow: website registration, knowledge edits and widget
//! questions answered through the in-memory store.

use crate::brain::{MatchKind, PersonalityOverrides, PhrasePicker, Tone};
use crate::config::AppConfig;
use crate::error::{AppError, ErrorBody};
use crate::models::NewWebsite;
use crate::responder::{ChatRequest, ChatResponder, MatchType};
use crate::store::InMemoryWebsiteStore;
use crate::websites::WebsiteService;
use serde_json::json;
use std::sync::Arc;

/// Always picks the first phrase.
struct FirstPicker;

impl PhrasePicker for FirstPicker {
    fn pick_index(&mut self, _len: usize) -> usize {
        0
    }
}

struct Fixture {
    service: WebsiteService<InMemoryWebsiteStore>,
    responder: ChatResponder<InMemoryWebsiteStore>,
    api_key: String,
}

async fn fixture(config: AppConfig) -> Fixture {
    let store = Arc::new(InMemoryWebsiteStore::new());
    let service = WebsiteService::new(Arc::clone(&store));
    let site = service
        .create_website(NewWebsite {
            website_name: "Pixel Studio".into(),
            website_url: Some("https://pixel.example.com".into()),
            category: vec!["Web Design".into()],
            aifuture: json!([{"title": "Services", "value": ["Web Design", "SEO"]}]),
            ..Default::default()
        })
        .await
        .unwrap();

    Fixture {
        service,
        responder: ChatResponder::new(store, config).with_picker(FirstPicker),
        api_key: site.api_key,
    }
}

/// Registers a second website carrying only `knowledge` and returns its key.
async fn add_site(fx: &Fixture, knowledge: serde_json::Value) -> String {
    fx.service
        .create_website(NewWebsite {
            website_name: "Side Project".into(),
            aifuture: knowledge,
            ..Default::default()
        })
        .await
        .unwrap()
        .api_key
}

fn unlimited() -> AppConfig {
    AppConfig {
        rate_limit: 0,
        ..AppConfig::default()
    }
}

#[cfg(test)]
mod chat_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_question_enumerates_services() {
        let fx = fixture(unlimited()).await;
        let reply = fx
            .responder
            .generate_response(&ChatRequest::new("What services do you offer?", fx.api_key.as_str()))
            .await
            .unwrap();

        assert!(reply.success);
        assert_eq!(reply.match_kind, Some(MatchKind::TitleExact));
        assert_eq!(reply.matched_title.as_deref(), Some("Services"));
        assert_eq!(
            reply.response,
            "We provide the following Services:\n\n✅ Web Design\n✅ SEO\n\nWhich services are you interested in?"
        );
    }

    #[tokio::test]
    async fn test_specific_question_pitches_value() {
        let fx = fixture(unlimited()).await;
        let reply = fx
            .responder
            .generate_response(&ChatRequest::new("do you offer SEO", fx.api_key.as_str()))
            .await
            .unwrap();

        assert_eq!(reply.match_kind, Some(MatchKind::ValueSubstring));
        assert_eq!(
            reply.response,
            "We offer SEO services to boost your online business! Would you like me to start the SEO process?"
        );
    }

    #[tokio::test]
    async fn test_unrelated_question_is_refused() {
        let fx = fixture(unlimited()).await;
        let reply = fx
            .responder
            .generate_response(&ChatRequest::new("what is the weather today", fx.api_key.as_str()))
            .await
            .unwrap();

        assert!(reply.match_kind.is_none());
        assert_eq!(
            reply.response,
            "I can only help with questions about our Web Design. Please ask something related to our services or products."
        );
    }

    #[tokio::test]
    async fn test_personality_overrides_apply_pass() {
        let fx = fixture(unlimited()).await;
        let overrides = PersonalityOverrides {
            tone: Some(json!("professional")),
            emoji_level: Some(json!("minimal")),
            use_markdown: Some(json!(false)),
            ..Default::default()
        };
        let request =
            ChatRequest::new("do you offer SEO", fx.api_key.as_str()).with_personality(overrides);

        let reply = fx.responder.generate_response(&request).await.unwrap();
        let opener = Tone::Professional.openers()[0];
        assert!(reply.response.starts_with(opener));
        assert!(reply.response.contains("We offer SEO services"));
    }

    #[tokio::test]
    async fn test_personality_enabled_by_config() {
        let config = AppConfig {
            personality_enabled: true,
            ..unlimited()
        };
        let fx = fixture(config).await;
        let reply = fx
            .responder
            .generate_response(&ChatRequest::new("do you offer SEO", fx.api_key.as_str()))
            .await
            .unwrap();

        assert!(reply.response.starts_with(Tone::Friendly.openers()[0]));
    }

    #[tokio::test]
    async fn test_unknown_key_maps_to_404_body() {
        let fx = fixture(unlimited()).await;
        let err = fx
            .responder
            .generate_response(&ChatRequest::new("hello", "nope"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 404);
        let body = serde_json::to_value(ErrorBody::from(&err)).unwrap();
        assert_eq!(
            body,
            json!({"success": false, "message": "Invalid API key or website not found"})
        );
    }

    #[tokio::test]
    async fn test_symbol_only_value_yields_to_title_match() {
        let fx = fixture(unlimited()).await;
        let key = add_site(&fx, json!([{"title": "Services", "value": ["🚀🚀"]}])).await;

        let reply = fx
            .responder
            .generate_response(&ChatRequest::new("services 🚀🚀", key.as_str()))
            .await
            .unwrap();

        assert_eq!(reply.match_kind, Some(MatchKind::TitleExact));
        assert_eq!(reply.matched_title.as_deref(), Some("Services"));
        assert_eq!(
            reply.response,
            "We provide the following Services:\n\n✅ 🚀🚀\n\nWhich services are you interested in?"
        );
    }

    #[tokio::test]
    async fn test_unrenderable_value_reports_no_match() {
        let fx = fixture(unlimited()).await;
        let key = add_site(&fx, json!([{"title": "Languages", "value": ["日本語"]}])).await;

        let reply = fx
            .responder
            .generate_response(&ChatRequest::new("do you speak 日本語", key.as_str()))
            .await
            .unwrap();

        assert!(reply.match_kind.is_none());
        assert!(reply.matched_title.is_none());
    }

    #[tokio::test]
    async fn test_request_deserializes_from_widget_json() {
        let fx = fixture(unlimited()).await;
        let request: ChatRequest = serde_json::from_value(json!({
            "question": "do you offer SEO",
            "apiKey": fx.api_key,
            "personality": {"beEnthusiastic": false, "emojiLevel": "minimal", "detailLevel": "brief"}
        }))
        .unwrap();

        let reply = fx.responder.generate_response(&request).await.unwrap();
        assert_eq!(
            reply.response,
            "We offer SEO services to boost your online business! Would you like me to start the SEO process?"
        );
    }
}

#[cfg(test)]
mod direct_tests {
    use super::*;

    #[tokio::test]
    async fn test_direct_miss_lists_titles_and_categories() {
        let fx = fixture(unlimited()).await;
        let reply = fx
            .responder
            .direct_response(&ChatRequest::new("what is the weather today", fx.api_key.as_str()))
            .await
            .unwrap();

        assert!(!reply.has_match);
        assert_eq!(reply.available_titles, Some(vec!["Services".to_string()]));
        assert_eq!(reply.available_categories, Some(vec!["Web Design".to_string()]));
        assert_eq!(
            reply.response,
            "I can help you with information about our Web Design. We have data about: Services. Try asking about any of these."
        );
    }

    #[tokio::test]
    async fn test_direct_title_hit_exposes_values() {
        let fx = fixture(unlimited()).await;
        let reply = fx
            .responder
            .direct_response(&ChatRequest::new("list services", fx.api_key.as_str()))
            .await
            .unwrap();

        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["hasMatch"], true);
        assert_eq!(
            json["matchedData"],
            json!({"title": "Services", "values": ["Web Design", "SEO"]})
        );
        assert_eq!(json["matchKind"], "title_exact");
    }

    #[tokio::test]
    async fn test_direct_unrenderable_value_is_a_miss() {
        let fx = fixture(unlimited()).await;
        let key = add_site(&fx, json!([{"title": "Languages", "value": ["日本語"]}])).await;

        let reply = fx
            .responder
            .direct_response(&ChatRequest::new("do you speak 日本語", key.as_str()))
            .await
            .unwrap();

        assert!(!reply.has_match);
        assert!(reply.matched_data.is_none());
        assert!(reply.match_kind.is_none());
        assert_eq!(reply.available_titles, Some(vec!["Languages".to_string()]));
        assert_eq!(reply.available_categories, Some(vec!["General".to_string()]));
        assert_eq!(
            reply.response,
            "I can help you with information about our General. We have data about: Languages. Try asking about any of these."
        );
    }

    #[tokio::test]
    async fn test_direct_list_question_only_matches_titles() {
        let fx = fixture(unlimited()).await;
        let request = ChatRequest::new("tell me about SEO", fx.api_key.as_str());

        let direct = fx.responder.direct_response(&request).await.unwrap();
        assert!(!direct.has_match);
        assert_eq!(direct.available_titles, Some(vec!["Services".to_string()]));

        let chat = fx.responder.generate_response(&request).await.unwrap();
        assert_eq!(chat.match_kind, Some(MatchKind::ValueSubstring));
    }

    #[tokio::test]
    async fn test_direct_match_type_follows_intent() {
        let fx = fixture(unlimited()).await;

        let reply = fx
            .responder
            .direct_response(&ChatRequest::new("list services", fx.api_key.as_str()))
            .await
            .unwrap();
        assert_eq!(serde_json::to_value(&reply).unwrap()["matchType"], "title_match");

        // a specific question answered by the title fallback still reports value_match
        let reply = fx
            .responder
            .direct_response(&ChatRequest::new("services please", fx.api_key.as_str()))
            .await
            .unwrap();
        assert_eq!(reply.match_kind, Some(MatchKind::TitleExact));
        assert_eq!(reply.match_type, Some(MatchType::ValueMatch));
    }

    #[tokio::test]
    async fn test_direct_validation_messages() {
        let fx = fixture(unlimited()).await;
        let err = fx
            .responder
            .direct_response(&ChatRequest::new(" ", fx.api_key.as_str()))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Question is required");

        let err = fx
            .responder
            .direct_response(&ChatRequest::new("hi", "missing"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Invalid API key");
    }
}

#[cfg(test)]
mod key_and_editing_tests {
    use super::*;

    #[tokio::test]
    async fn test_validate_api_key() {
        let fx = fixture(unlimited()).await;

        let result = fx.responder.validate_api_key(&fx.api_key).await.unwrap();
        assert!(result.valid);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["website"]["name"], "Pixel Studio");
        assert_eq!(json["website"]["url"], "https://pixel.example.com");
        assert_eq!(json["website"]["hasAifutureData"], true);
        assert_eq!(json["website"]["availableTitles"], json!(["Services"]));

        let result = fx.responder.validate_api_key("unknown").await.unwrap();
        assert!(!result.valid);
        assert_eq!(result.message.as_deref(), Some("Invalid API key"));

        assert!(matches!(
            fx.responder.validate_api_key("  ").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_knowledge_edits_change_answers() {
        let fx = fixture(unlimited()).await;
        let site = fx.service.website_by_api_key(&fx.api_key).await.unwrap();

        fx.service
            .add_knowledge(site.id, &json!("Pricing: Basic,Pro,Enterprise"))
            .await
            .unwrap();
        let reply = fx
            .responder
            .generate_response(&ChatRequest::new("what is your pricing", fx.api_key.as_str()))
            .await
            .unwrap();
        assert_eq!(reply.matched_title.as_deref(), Some("Pricing"));
        assert!(reply.response.starts_with("Here are our Pricing:"));

        fx.service.clear_knowledge(site.id).await.unwrap();
        let reply = fx
            .responder
            .generate_response(&ChatRequest::new("web design help", fx.api_key.as_str()))
            .await
            .unwrap();
        assert!(reply.match_kind.is_none());
        assert_eq!(
            reply.response,
            "I can help you with Web Design. Please ask about our services or products."
        );
    }

    #[tokio::test]
    async fn test_health_counts_websites() {
        let fx = fixture(unlimited()).await;
        let report = fx.responder.health().await.unwrap();
        assert!(report.success);
        assert_eq!(report.websites, 1);
    }
}
