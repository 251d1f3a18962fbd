//! API client for the voice assistant backend.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! requests to manage assistants and phone numbers and to read calls and
//! conversation logs.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::TokenStore;
use crate::config::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::models::{
    Assistant, AssistantDraft, AssistantPatch, AuthResponse, Call, ConversationLog,
    DashboardSummary, LoginRequest, PhoneNumber, PhoneNumberDraft, PhoneNumberPatch,
    RegisterRequest, RegisterResponse,
};

use super::ApiError;

/// API client for the dashboard backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// The bearer token is read from `store` on every request, so logging in
    /// or out through the session takes effect without touching the client.
    pub fn new(base_url: &str, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, store, DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    pub fn with_timeout(
        base_url: &str,
        store: Arc<dyn TokenStore>,
        timeout_secs: u64,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        let token = match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                None
            }
        };
        if let Some(token) = token {
            match header::HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(header::AUTHORIZATION, value);
                }
                Err(_) => warn!("Stored token is not a valid header value, sending without it"),
            }
        }
        headers
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn send<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!(%method, url = %url, "Sending request");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .headers(self.auth_headers());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let response = match Self::check_response(response).await {
            Ok(response) => response,
            Err(e) => {
                warn!(%method, url = %url, error = %e, "Request failed");
                return Err(e);
            }
        };

        let text = response.text().await?;
        // DELETE and friends may answer with an empty body
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send::<T, ()>(Method::GET, path, None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send::<serde_json::Value, ()>(Method::DELETE, path, None)
            .await
            .map(|_| ())
    }

    // ===== Account =====

    /// `POST /login`, returning the access token
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = self.post("/login", &body).await?;
        Ok(response.access_token)
    }

    /// `POST /register`
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        self.post("/register", request).await
    }

    // ===== Assistants =====

    pub async fn list_assistants(&self) -> Result<Vec<Assistant>, ApiError> {
        self.get("/assistants").await
    }

    pub async fn get_assistant(&self, id: &str) -> Result<Assistant, ApiError> {
        self.get(&format!("/assistants/{}", id)).await
    }

    pub async fn create_assistant(&self, draft: &AssistantDraft) -> Result<Assistant, ApiError> {
        self.post("/assistants", draft).await
    }

    pub async fn update_assistant(&self, id: &str, patch: &AssistantPatch) -> Result<Assistant, ApiError> {
        self.patch(&format!("/assistants/{}", id), patch).await
    }

    pub async fn delete_assistant(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/assistants/{}", id)).await
    }

    // ===== Phone numbers =====

    pub async fn list_phone_numbers(&self) -> Result<Vec<PhoneNumber>, ApiError> {
        self.get("/phone-numbers").await
    }

    pub async fn get_phone_number(&self, id: &str) -> Result<PhoneNumber, ApiError> {
        self.get(&format!("/phone-numbers/{}", id)).await
    }

    pub async fn create_phone_number(&self, draft: &PhoneNumberDraft) -> Result<PhoneNumber, ApiError> {
        self.post("/phone-numbers", draft).await
    }

    pub async fn update_phone_number(
        &self,
        id: &str,
        patch: &PhoneNumberPatch,
    ) -> Result<PhoneNumber, ApiError> {
        self.patch(&format!("/phone-numbers/{}", id), patch).await
    }

    pub async fn delete_phone_number(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/phone-numbers/{}", id)).await
    }

    // ===== Calls and messages =====

    /// `GET /messages`: conversations grouped by assistant name
    pub async fn fetch_messages(&self) -> Result<ConversationLog, ApiError> {
        self.get("/messages").await
    }

    pub async fn list_calls(&self) -> Result<Vec<Call>, ApiError> {
        self.get("/calls").await
    }

    pub async fn get_call(&self, id: &str) -> Result<Call, ApiError> {
        self.get(&format!("/calls/{}", id)).await
    }

    /// Fetch assistants, calls and phone numbers concurrently.
    /// Fails as a whole if any of the three requests fails.
    pub async fn fetch_dashboard(&self) -> Result<DashboardSummary, ApiError> {
        let (assistants, calls, phone_numbers) = futures::try_join!(
            self.list_assistants(),
            self.list_calls(),
            self.list_phone_numbers(),
        )?;
        Ok(DashboardSummary::from_parts(assistants, calls, phone_numbers))
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::models::Provider;

    fn client_for(server: &mockito::Server, store: Arc<dyn TokenStore>) -> ApiClient {
        ApiClient::new(&server.url(), store).unwrap()
    }

    #[tokio::test]
    async fn test_request_without_token_has_no_auth_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/assistants")
            .match_header("authorization", Matcher::Missing)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let client = client_for(&server, Arc::new(MemoryTokenStore::new()));
        let assistants = client.list_assistants().await.unwrap();
        assert!(assistants.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_token_is_sent_on_next_request() {
        let mut server = mockito::Server::new_async().await;
        let login = server
            .mock("POST", "/login")
            .match_body(Matcher::Json(serde_json::json!({
                "email": "ada@example.com",
                "password": "hunter2"
            })))
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "abc"}"#)
            .create_async()
            .await;
        let assistants = server
            .mock("GET", "/assistants")
            .match_header("authorization", "Bearer abc")
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": "a1", "name": "Front Desk"}]"#)
            .create_async()
            .await;

        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
        let client = client_for(&server, store.clone());

        let token = client.login("ada@example.com", "hunter2").await.unwrap();
        assert_eq!(token, "abc");
        store.save(&token).unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));

        let list = client.list_assistants().await.unwrap();
        assert_eq!(list[0].name, "Front Desk");

        login.assert_async().await;
        assistants.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/calls")
            .with_status(401)
            .with_body(r#"{"detail": "Not authenticated"}"#)
            .create_async()
            .await;

        let client = client_for(&server, Arc::new(MemoryTokenStore::with_token("stale")));
        let err = client.list_calls().await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_register_surfaces_backend_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/register")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "username": "ada",
                "confirm_password": "pw2"
            })))
            .with_status(400)
            .with_body(r#"{"detail": "Passwords do not match"}"#)
            .create_async()
            .await;

        let client = client_for(&server, Arc::new(MemoryTokenStore::new()));
        let request = RegisterRequest {
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
            password: "pw1".to_string(),
            confirm_password: "pw2".to_string(),
        };
        let err = client.register(&request).await.unwrap_err();
        assert_eq!(err.detail(), Some("Passwords do not match"));
    }

    #[tokio::test]
    async fn test_assistant_crud_paths() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/assistants")
            .match_header("authorization", "Bearer tok")
            .match_body(Matcher::Json(serde_json::json!({
                "name": "Sales",
                "prompt": "Sell."
            })))
            .with_body(r#"{"id": "a9", "name": "Sales"}"#)
            .create_async()
            .await;
        let update = server
            .mock("PATCH", "/assistants/a9")
            .match_body(Matcher::Json(serde_json::json!({"firstMessage": "Hi"})))
            .with_body(r#"{"id": "a9", "name": "Sales", "firstMessage": "Hi"}"#)
            .create_async()
            .await;
        let get = server
            .mock("GET", "/assistants/a9")
            .with_body(r#"{"id": "a9", "name": "Sales"}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/assistants/a9")
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let client = client_for(&server, Arc::new(MemoryTokenStore::with_token("tok")));

        let draft = AssistantDraft {
            name: "Sales".to_string(),
            prompt: "Sell.".to_string(),
            ..Default::default()
        };
        let created = client.create_assistant(&draft).await.unwrap();
        assert_eq!(created.id, "a9");

        let patch = AssistantPatch {
            first_message: Some("Hi".to_string()),
            ..Default::default()
        };
        let updated = client.update_assistant("a9", &patch).await.unwrap();
        assert_eq!(updated.first_message.as_deref(), Some("Hi"));

        assert_eq!(client.get_assistant("a9").await.unwrap().name, "Sales");
        client.delete_assistant("a9").await.unwrap();

        create.assert_async().await;
        update.assert_async().await;
        get.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_phone_number_paths() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/phone-numbers")
            .match_body(Matcher::Json(serde_json::json!({
                "provider": "vonage",
                "number": "+442071234567"
            })))
            .with_body(r#"{"id": "pn1", "provider": "vonage", "number": "+442071234567"}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/phone-numbers/pn1")
            .with_body(r#"{"message": "deleted"}"#)
            .create_async()
            .await;
        let missing = server
            .mock("GET", "/phone-numbers/nope")
            .with_status(404)
            .with_body(r#"{"detail": "Phone number not found"}"#)
            .create_async()
            .await;

        let client = client_for(&server, Arc::new(MemoryTokenStore::with_token("tok")));
        let draft = PhoneNumberDraft {
            provider: Provider::Vonage,
            number: "+442071234567".to_string(),
            credential_id: None,
        };
        let created = client.create_phone_number(&draft).await.unwrap();
        assert_eq!(created.provider, Provider::Vonage);

        client.delete_phone_number("pn1").await.unwrap();

        let err = client.get_phone_number("nope").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        create.assert_async().await;
        delete.assert_async().await;
        missing.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_messages() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/messages")
            .with_body(
                r#"{"Bot1": [[{"role": "user", "message": "hi", "time": 5},
                              {"role": "assistant", "message": "hello", "time": 2}]]}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server, Arc::new(MemoryTokenStore::with_token("tok")));
        let log = client.fetch_messages().await.unwrap();
        assert_eq!(log["Bot1"][0].len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_dashboard() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/assistants")
            .with_body(r#"[{"id": "a1"}, {"id": "a2"}]"#)
            .create_async()
            .await;
        server
            .mock("GET", "/calls")
            .with_body(r#"[{"id": "c1"}]"#)
            .create_async()
            .await;
        server
            .mock("GET", "/phone-numbers")
            .with_body(r#"[]"#)
            .create_async()
            .await;

        let client = client_for(&server, Arc::new(MemoryTokenStore::with_token("tok")));
        let summary = client.fetch_dashboard().await.unwrap();
        assert_eq!(summary.assistant_count, 2);
        assert_eq!(summary.call_count, 1);
        assert_eq!(summary.phone_number_count, 0);
    }

    #[tokio::test]
    async fn test_unknown_provider_does_not_break_loads() {
        let mut server = mockito::Server::new_async().await;
        let phones = server
            .mock("GET", "/phone-numbers")
            .with_body(
                r#"[{"id": "pn1", "number": "+14155551234", "provider": "twilio"},
                    {"id": "pn2", "number": "+14155550000", "provider": "vapi"}]"#,
            )
            .expect(2)
            .create_async()
            .await;
        server
            .mock("GET", "/assistants")
            .with_body(r#"[]"#)
            .create_async()
            .await;
        server
            .mock("GET", "/calls")
            .with_body(r#"[]"#)
            .create_async()
            .await;

        let client = client_for(&server, Arc::new(MemoryTokenStore::with_token("tok")));
        let numbers = client.list_phone_numbers().await.unwrap();
        assert_eq!(numbers[1].provider, Provider::Other);

        let summary = client.fetch_dashboard().await.unwrap();
        assert_eq!(summary.phone_number_count, 2);
        phones.assert_async().await;
    }

    #[tokio::test]
    async fn test_calls_paths() {
        let mut server = mockito::Server::new_async().await;
        let list = server
            .mock("GET", "/calls")
            .match_header("authorization", "Bearer tok")
            .with_body(r#"[{"id": "c1", "status": "ended"}, {"id": "c2"}]"#)
            .create_async()
            .await;
        let single = server
            .mock("GET", "/calls/c1")
            .match_header("authorization", "Bearer tok")
            .with_body(
                r#"{"id": "c1", "assistantId": "a1", "status": "ended",
                    "messages": [{"role": "bot", "message": "Hello", "time": 1714557600}]}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server, Arc::new(MemoryTokenStore::with_token("tok")));
        let calls = client.list_calls().await.unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].status_display(), "ended");
        assert!(calls[1].messages.is_empty());

        let call = client.get_call("c1").await.unwrap();
        assert_eq!(call.assistant_id.as_deref(), Some("a1"));
        assert_eq!(call.messages.len(), 1);
        assert_eq!(call.messages[0].message, "Hello");

        list.assert_async().await;
        single.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_dashboard_fails_if_any_part_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/assistants")
            .with_body(r#"[]"#)
            .create_async()
            .await;
        server
            .mock("GET", "/calls")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;
        server
            .mock("GET", "/phone-numbers")
            .with_body(r#"[]"#)
            .create_async()
            .await;

        let client = client_for(&server, Arc::new(MemoryTokenStore::with_token("tok")));
        assert!(matches!(
            client.fetch_dashboard().await,
            Err(ApiError::ServerError(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_json_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/calls")
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let client = client_for(&server, Arc::new(MemoryTokenStore::new()));
        assert!(matches!(
            client.list_calls().await,
            Err(ApiError::InvalidResponse(_))
        ));
    }
}
