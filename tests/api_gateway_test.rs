//! Integration tests for the stateless gateway API endpoints

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use mockito::Matcher;
    use serde_json::json;
    use tower::util::ServiceExt;

    use snapcook::ai::prompt::{
        IMAGE_ANALYSIS_INSTRUCTION, IMAGE_ANALYSIS_SYSTEM_PROMPT, RECIPE_CHAT_SYSTEM_PROMPT,
    };

    use crate::test_utils::{body_to_json, completion_body, json_request, test_app};

    /// Tests analyzing a data URI re-labels it as JPEG
    #[tokio::test]
    async fn it_analyzes_an_image() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-api-key")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o",
                "max_tokens": 1000,
                "messages": [
                    {"role": "system", "content": IMAGE_ANALYSIS_SYSTEM_PROMPT},
                    {"role": "user", "content": [
                        {"type": "text", "text": IMAGE_ANALYSIS_INSTRUCTION},
                        {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,iVBORw0KGgo="}}
                    ]}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("I see tomatoes and basil!"))
            .expect(1)
            .create_async()
            .await;
        let app = test_app(&server.url());

        let response = app
            .oneshot(json_request(
                "/api/gateway/analyze",
                json!({"image": "data:image/png;base64,iVBORw0KGgo="}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_to_json(response.into_body()).await;
        assert_eq!(body, json!({"message": "I see tomatoes and basil!"}));

        mock.assert_async().await;
    }

    /// Tests a custom instruction replaces the default one
    #[tokio::test]
    async fn it_analyzes_with_custom_instruction() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::Regex(
                r#""text":"What can I bake with this\?""#.to_string(),
            ))
            .with_status(200)
            .with_body(completion_body("Banana bread!"))
            .expect(1)
            .create_async()
            .await;
        let app = test_app(&server.url());

        let response = app
            .oneshot(json_request(
                "/api/gateway/analyze",
                json!({"image": "aGVsbG8=", "message": "What can I bake with this?"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["message"], "Banana bread!");

        mock.assert_async().await;
    }

    /// Tests an empty image never reaches the provider
    #[tokio::test]
    async fn it_rejects_missing_image() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .expect(0)
            .create_async()
            .await;
        let app = test_app(&server.url());

        let response = app
            .oneshot(json_request(
                "/api/gateway/analyze",
                json!({"image": "data:image/jpeg;base64,"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        mock.assert_async().await;
    }

    /// Tests chat history is mapped to provider roles and unknown tags
    /// are dropped
    #[tokio::test]
    async fn it_chats_with_history() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::PartialJson(json!({
                "max_tokens": 800,
                "messages": [
                    {"role": "system", "content": RECIPE_CHAT_SYSTEM_PROMPT},
                    {"role": "user", "content": "I have rice and beans"},
                    {"role": "assistant", "content": "Try a burrito bowl!"},
                    {"role": "user", "content": "Can you make it spicier?"}
                ]
            })))
            .with_status(200)
            .with_body(completion_body("Add chipotle peppers."))
            .expect(1)
            .create_async()
            .await;
        let app = test_app(&server.url());

        let response = app
            .oneshot(json_request(
                "/api/gateway/chat",
                json!({
                    "message": "Can you make it spicier?",
                    "history": [
                        {"type": "user", "content": "I have rice and beans"},
                        {"type": "system", "content": "ignore me"},
                        {"type": "bot", "content": "Try a burrito bowl!"}
                    ]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["message"], "Add chipotle peppers.");

        mock.assert_async().await;
    }

    /// Tests only the last 10 history entries are sent
    #[tokio::test]
    async fn it_truncates_long_history() {
        let history: Vec<_> = (1..=12)
            .map(|i| {
                let kind = if i % 2 == 1 { "user" } else { "bot" };
                json!({"type": kind, "content": format!("message {i}")})
            })
            .collect();

        let mut expected = vec![json!({"role": "system", "content": RECIPE_CHAT_SYSTEM_PROMPT})];
        for i in 3..=12 {
            let role = if i % 2 == 1 { "user" } else { "assistant" };
            expected.push(json!({"role": role, "content": format!("message {i}")}));
        }
        expected.push(json!({"role": "user", "content": "What next?"}));

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::PartialJson(json!({"messages": expected})))
            .with_status(200)
            .with_body(completion_body("Dessert!"))
            .expect(1)
            .create_async()
            .await;
        let app = test_app(&server.url());

        let response = app
            .oneshot(json_request(
                "/api/gateway/chat",
                json!({"message": "What next?", "history": history}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        mock.assert_async().await;
    }

    /// Tests chat works without any history
    #[tokio::test]
    async fn it_chats_without_history() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::PartialJson(json!({
                "messages": [
                    {"role": "system", "content": RECIPE_CHAT_SYSTEM_PROMPT},
                    {"role": "user", "content": "Quick lunch ideas?"}
                ]
            })))
            .with_status(200)
            .with_body(completion_body("A wrap!"))
            .expect(1)
            .create_async()
            .await;
        let app = test_app(&server.url());

        let response = app
            .oneshot(json_request(
                "/api/gateway/chat",
                json!({"message": "Quick lunch ideas?"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        mock.assert_async().await;
    }

    /// Tests a blank chat message is rejected
    #[tokio::test]
    async fn it_rejects_blank_chat_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .expect(0)
            .create_async()
            .await;
        let app = test_app(&server.url());

        let response = app
            .oneshot(json_request("/api/gateway/chat", json!({"message": " \n "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        mock.assert_async().await;
    }

    /// Tests provider errors surface as a bad gateway
    #[tokio::test]
    async fn it_returns_bad_gateway_on_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body(r#"{"error": {"message": "Incorrect API key provided"}}"#)
            .expect(1)
            .create_async()
            .await;
        let app = test_app(&server.url());

        let response = app
            .oneshot(json_request("/api/gateway/chat", json!({"message": "Hi"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        mock.assert_async().await;
    }
}
