use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::error_handling::format_error_chain;
use crate::logging::GATEWAY_LOG_TARGET;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

const JSON: &str = "application/json";

/// Credentials attached to a gateway call.
#[derive(Debug, Clone, Default)]
pub enum Auth {
    #[default]
    None,
    Bearer(String),
    Headers(Vec<(String, String)>),
}

impl Auth {
    pub fn bearer(token: impl Into<String>) -> Self {
        Auth::Bearer(token.into())
    }
}

impl From<&str> for Auth {
    fn from(token: &str) -> Self {
        Auth::Bearer(token.to_string())
    }
}

impl From<String> for Auth {
    fn from(token: String) -> Self {
        Auth::Bearer(token)
    }
}

impl From<Vec<(String, String)>> for Auth {
    fn from(headers: Vec<(String, String)>) -> Self {
        Auth::Headers(headers)
    }
}

/// JSON client for `https://gateway.stackpath.com/<endpoint>`.
///
/// Every call resolves to a [`Value`]. Transport errors, non-2xx statuses and
/// bodies that are not JSON all come back as [`Value::Null`] after being
/// logged, so callers look fields up and treat missing ones as absent.
#[derive(Clone)]
pub struct Gateway {
    client: Client,
    base_url: String,
}

impl Gateway {
    pub fn new(base_url: &str, timeout: Duration) -> CoreResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stackpurge/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(cfg: &CoreConfig) -> CoreResult<Self> {
        Self::new(cfg.stackpath.gateway_url(), cfg.http.timeout())
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    pub async fn get(&self, endpoint: &str, auth: impl Into<Auth>) -> Value {
        self.request(Method::GET, endpoint, None, auth.into()).await
    }

    pub async fn post(&self, endpoint: &str, body: &Value, auth: impl Into<Auth>) -> Value {
        self.request(Method::POST, endpoint, Some(body), auth.into())
            .await
    }

    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        auth: Auth,
    ) -> Value {
        let logged_body = body.map(redact).unwrap_or(Value::Null);
        info!(
            target: GATEWAY_LOG_TARGET,
            endpoint = endpoint,
            method = %method,
            body = %logged_body,
            "gateway request"
        );

        match self.send(method, endpoint, body, auth).await {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    target: GATEWAY_LOG_TARGET,
                    endpoint = endpoint,
                    error = %format_error_chain(&err),
                    "gateway request failed"
                );
                Value::Null
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        auth: Auth,
    ) -> CoreResult<Value> {
        let mut request = self
            .client
            .request(method, self.endpoint_url(endpoint))
            .header(ACCEPT, JSON)
            .header(CONTENT_TYPE, JSON);

        request = match auth {
            Auth::None => request,
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::Headers(headers) => headers
                .into_iter()
                .fold(request, |req, (name, value)| req.header(name, value)),
        };

        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let decoded = serde_json::from_str::<Value>(&text);

        let logged_body = match &decoded {
            Ok(value) => redact(value).to_string(),
            Err(_) => text.clone(),
        };
        info!(
            target: GATEWAY_LOG_TARGET,
            endpoint = endpoint,
            status = status.as_u16(),
            body = %logged_body,
            "gateway response"
        );

        if !status.is_success() {
            return Err(CoreError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(decoded?)
    }
}

const SECRET_FIELDS: [&str; 2] = ["client_secret", "access_token"];

/// Copy of a request or response body safe to write to the log.
fn redact(body: &Value) -> Value {
    let mut body = body.clone();
    for field in SECRET_FIELDS {
        if let Some(secret) = body.get_mut(field) {
            *secret = Value::String("<redacted>".to_string());
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn gateway(server: &MockServer) -> Gateway {
        Gateway::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoint_url_joins_single_slash() {
        let gw = Gateway::new("https://gateway.stackpath.com/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            gw.endpoint_url("/stack/v1/stacks"),
            "https://gateway.stackpath.com/stack/v1/stacks"
        );
        assert_eq!(
            gw.endpoint_url("identity/v1/oauth2/token"),
            "https://gateway.stackpath.com/identity/v1/oauth2/token"
        );
    }

    #[test]
    fn string_auth_becomes_bearer() {
        assert!(matches!(Auth::from("abc"), Auth::Bearer(t) if t == "abc"));
    }

    #[test]
    fn redact_hides_client_secret_but_keeps_client_id() {
        let body = json!({"client_id": "id", "client_secret": "s3cret"});
        let logged = redact(&body);
        assert_eq!(logged["client_id"], "id");
        assert_eq!(logged["client_secret"], "<redacted>");
    }

    #[test]
    fn redact_hides_access_token_in_token_response() {
        let response = json!({"access_token": "eyJ.tok", "token_type": "bearer", "expires_in": 3600});
        let logged = redact(&response);
        assert_eq!(logged["access_token"], "<redacted>");
        assert_eq!(logged["expires_in"], 3600);
        assert!(!logged.to_string().contains("eyJ.tok"));
        // The caller still gets the real token; only the log copy is masked.
        assert_eq!(response["access_token"], "eyJ.tok");
    }

    #[tokio::test]
    async fn get_sends_json_headers_and_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stack/v1/stacks"))
            .and(header("Authorization", "Bearer tok"))
            .and(header("Accept", "application/json"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let value = gateway(&server).get("stack/v1/stacks", "tok").await;
        assert_eq!(value, json!({"results": []}));
    }

    #[tokio::test]
    async fn post_sends_body_and_explicit_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("X-Custom", "yes"))
            .and(body_json(json!({"a": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let auth = Auth::from(vec![("X-Custom".to_string(), "yes".to_string())]);
        let value = gateway(&server).post("echo", &json!({"a": 1}), auth).await;
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn error_status_decodes_to_null() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
            .mount(&server)
            .await;

        let value = gateway(&server).get("broken", Auth::None).await;
        assert!(value.is_null());
    }

    #[tokio::test]
    async fn non_json_body_decodes_to_null() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let value = gateway(&server).get("html", Auth::None).await;
        assert!(value.is_null());
        assert!(value.get("access_token").is_none());
    }

    #[tokio::test]
    async fn unreachable_host_decodes_to_null() {
        let gw = Gateway::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        assert!(gw.get("anything", Auth::None).await.is_null());
    }
}
