use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::api::models::{Chat, Contact, ContactId, ErrorBody, LoginForm, Message, OutgoingMessage};

const LOGIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("server reported an error: {0}")]
    Application(String),
    #[error("login rejected by server")]
    LoginRejected,
}

/// HTTP client for the chat server. Cheap to clone; clones share the cookie
/// jar, so a session established by [`ApiClient::login`] is seen by all of them.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = HttpClient::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base: Self::base_url(base_url)?,
        })
    }

    fn base_url(base_url: &str) -> Result<Url, ApiError> {
        // Url::join drops the last path segment unless it ends with '/'.
        let trimmed = base_url.trim().trim_end_matches('/');
        Ok(Url::parse(&format!("{}/", trimmed))?)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|body| body.error)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("").to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Authenticate with the server's login form. The server redirects to
    /// `/chat` on success and re-renders the form otherwise.
    pub async fn login(&self, name: &str, phone: &str) -> Result<(), ApiError> {
        let resp = self
            .http
            .post(self.endpoint("login")?)
            .timeout(LOGIN_TIMEOUT)
            .form(&LoginForm { phone, name })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ApiError::Status {
                status: resp.status().as_u16(),
                message: resp.status().canonical_reason().unwrap_or("").to_string(),
            });
        }
        if resp.url().path().trim_end_matches('/').ends_with("/chat") {
            log::info!("logged in to {} as {name}", self.base);
            Ok(())
        } else {
            Err(ApiError::LoginRejected)
        }
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        let resp = self.http.get(self.endpoint("logout")?).send().await?;
        if !resp.status().is_success() {
            return Err(ApiError::Status {
                status: resp.status().as_u16(),
                message: resp.status().canonical_reason().unwrap_or("").to_string(),
            });
        }
        Ok(())
    }

    pub async fn chats(&self) -> Result<Vec<Chat>, ApiError> {
        let resp = self.http.get(self.endpoint("api/chats")?).send().await?;
        Self::read_json(resp).await
    }

    pub async fn contacts(&self) -> Result<Vec<Contact>, ApiError> {
        let resp = self.http.get(self.endpoint("api/contacts")?).send().await?;
        Self::read_json(resp).await
    }

    /// All messages exchanged with `contact_id`, oldest first.
    pub async fn messages(&self, contact_id: ContactId) -> Result<Vec<Message>, ApiError> {
        let url = self.endpoint(&format!("api/chat/{}", contact_id))?;
        let resp = self.http.get(url).send().await?;
        Self::read_json(resp).await
    }

    pub async fn send_message(&self, contact_id: ContactId, text: &str) -> Result<Message, ApiError> {
        let url = self.endpoint(&format!("api/chat/{}", contact_id))?;
        let resp = self
            .http
            .post(url)
            .json(&OutgoingMessage { message: text })
            .send()
            .await?;
        Self::read_json(resp).await
    }

    /// Ask the server to find or create the chat with `contact_id` by posting
    /// an empty message.
    pub async fn create_chat(&self, contact_id: ContactId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("api/chat/{}", contact_id))?;
        let resp = self
            .http
            .post(url)
            .json(&OutgoingMessage { message: "" })
            .send()
            .await?;
        let body: serde_json::Value = Self::read_json(resp).await?;
        if let Some(err) = body.get("error").and_then(|v| v.as_str()) {
            return Err(ApiError::Application(err.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message_json(id: i64, sender: &str, text: &str) -> serde_json::Value {
        json!({
            "id": id,
            "sender_name": sender,
            "message": text,
            "status": "sent",
            "created_at": "2024-03-01 09:15:00"
        })
    }

    #[test]
    fn base_url_keeps_path_prefix() {
        let client = ApiClient::new("http://localhost:5000/chatapp").unwrap();
        assert_eq!(
            client.endpoint("api/chats").unwrap().as_str(),
            "http://localhost:5000/chatapp/api/chats"
        );
        let client = ApiClient::new("http://localhost:5000/").unwrap();
        assert_eq!(client.endpoint("api/chat/7").unwrap().as_str(), "http://localhost:5000/api/chat/7");
    }

    #[test]
    fn rejects_garbage_url() {
        assert!(matches!(ApiClient::new("not a url"), Err(ApiError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn fetches_chats_with_nullable_preview() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": 1,
                    "contact_id": 7,
                    "contact_name": "Alice",
                    "contact_phone": "555-1234",
                    "last_message": "hi",
                    "last_message_time": "2024-03-01 09:15:00"
                },
                {
                    "id": 2,
                    "contact_id": 8,
                    "contact_name": "Bob",
                    "contact_phone": "555-9876",
                    "last_message": null,
                    "last_message_time": null
                }
            ])))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let chats = client.chats().await.unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].contact().name, "Alice");
        assert_eq!(chats[1].last_message, None);
    }

    #[tokio::test]
    async fn messages_are_keyed_by_contact() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chat/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                message_json(1, "Alice", "hello"),
                message_json(2, "Me", "hey")
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let messages = client.messages(7).await.unwrap();
        assert_eq!(messages.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(messages[0].status.as_deref(), Some("sent"));
    }

    #[tokio::test]
    async fn send_posts_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/7"))
            .and(body_json(json!({ "message": "ping" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(message_json(9, "Me", "ping")))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let sent = client.send_message(7, "ping").await.unwrap();
        assert_eq!(sent.id, 9);
        assert_eq!(sent.message, "ping");
    }

    #[tokio::test]
    async fn non_success_status_carries_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/contacts"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Not authenticated" })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        match client.contacts().await {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Not authenticated");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        assert!(matches!(client.chats().await, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn create_chat_surfaces_error_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/8"))
            .and(body_json(json!({ "message": "" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "no such user" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/chat/7"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "ok": true })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        match client.create_chat(8).await {
            Err(ApiError::Application(msg)) => assert_eq!(msg, "no such user"),
            other => panic!("unexpected result: {other:?}"),
        }
        client.create_chat(7).await.unwrap();
    }

    #[tokio::test]
    async fn login_keeps_session_cookie() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_string_contains("name=Alice"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", "/chat")
                    .insert_header("Set-Cookie", "session=abc; Path=/"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/chats"))
            .and(header("cookie", "session=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        client.login("Alice", "555-1234").await.unwrap();
        assert!(client.clone().chats().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn login_form_rerender_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Phone and name are required"))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        assert!(matches!(client.login("", "").await, Err(ApiError::LoginRejected)));
    }
}
