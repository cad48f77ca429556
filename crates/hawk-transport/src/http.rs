//! HttpBackend: The `Backend` contract over HTTP/1.1.
//!
//! Every call is a JSON `POST`. Responses carry an envelope:
//!
//! ```text
//! { "code": 0, "value": <payload> }      success
//! { "code": 5, "value": "bad app key" }  rejected
//! ```

use std::time::Duration;

use bytes::Bytes;
use http::Method;
use http::header::{CONTENT_TYPE, HOST, USER_AGENT};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tracing::debug;

use hawk_core::{
    Backend, BackendError, BackendFuture, Feedback, HawkConfig, InstallId, InstallRequest, LogRecord,
};

const REGISTER_PATH: &str = "/v1/installs/register";
const UPDATE_PATH: &str = "/v1/installs/update";
const LOGS_PATH: &str = "/v1/installs/logs";
const FEEDBACK_PATH: &str = "/v1/installs/feedback";
const APP_KEY_HEADER: &str = "x-app-key";
const AGENT: &str = concat!("hawk-sdk/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpBackend {
    address: String,
    app_key: String,
    timeout: Duration,
}

impl HttpBackend {
    /// `address` is `host:port`.
    pub fn new(address: impl Into<String>, app_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            app_key: app_key.into(),
            timeout,
        }
    }

    /// Build from the `[server]` section, if there is one.
    pub fn from_config(config: &HawkConfig) -> Option<Self> {
        let server = config.server.as_ref()?;
        Some(Self::new(
            server.address.clone(),
            config.app.app_key.clone(),
            config.server_timeout(),
        ))
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, BackendError> {
        let uri = format!("http://{}{path}", self.address);
        let payload = serde_json::to_vec(body).map_err(|e| BackendError::Encode(e.to_string()))?;

        let exchange = async {
            let stream = TcpStream::connect(&self.address)
                .await
                .map_err(|e| BackendError::Connect(e.to_string()))?;

            let io = TokioIo::new(stream);
            let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
                .await
                .map_err(|e| BackendError::Connect(e.to_string()))?;

            // Drive the connection in the background.
            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    debug!(error = %e, "backend connection closed with error");
                }
            });

            let req = http::Request::builder()
                .method(Method::POST)
                .uri(&uri)
                .header(HOST, &self.address)
                .header(USER_AGENT, AGENT)
                .header(CONTENT_TYPE, "application/json")
                .header(APP_KEY_HEADER, &self.app_key)
                .body(Full::new(Bytes::from(payload)))
                .map_err(|e| BackendError::Encode(e.to_string()))?;

            let resp = sender
                .send_request(req)
                .await
                .map_err(|e| BackendError::Request(e.to_string()))?;
            let status = resp.status().as_u16();
            let body = resp
                .into_body()
                .collect()
                .await
                .map_err(|e| BackendError::Request(e.to_string()))?
                .to_bytes();
            Ok::<_, BackendError>((status, body))
        };

        let (status, body) = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                debug!(%uri, "backend request timed out");
                return Err(BackendError::Timeout);
            }
        };
        debug!(%uri, status, bytes = body.len(), "backend response");
        parse_envelope(status, &body)
    }
}

/// Unwrap the response envelope, returning its `value`.
pub fn parse_envelope(status: u16, body: &[u8]) -> Result<Value, BackendError> {
    if !(200..300).contains(&status) {
        return Err(BackendError::Status {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        });
    }

    let envelope: Value = serde_json::from_slice(body)
        .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
    let code = envelope
        .get("code")
        .and_then(Value::as_i64)
        .ok_or_else(|| BackendError::InvalidResponse("missing numeric `code`".into()))?;
    let value = envelope.get("value").cloned().unwrap_or(Value::Null);

    if code != 0 {
        let message = match value {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        return Err(BackendError::Rejected { code, message });
    }
    Ok(value)
}

/// Accepts `{"installid": "..."}` or a bare string.
pub fn parse_install_id(value: &Value) -> Result<InstallId, BackendError> {
    value
        .get("installid")
        .and_then(Value::as_str)
        .or_else(|| value.as_str())
        .map(str::to_string)
        .ok_or_else(|| BackendError::InvalidResponse(format!("no install id in {value}")))
}

fn update_body(install_id: &str, request: &InstallRequest) -> Result<Value, BackendError> {
    let mut body = serde_json::to_value(request).map_err(|e| BackendError::Encode(e.to_string()))?;
    if let Value::Object(map) = &mut body {
        map.insert("installid".to_string(), Value::String(install_id.to_string()));
    }
    Ok(body)
}

fn logs_body(install_id: &str, records: &[LogRecord]) -> Value {
    json!({
        "installid": install_id,
        "records": records.iter().map(LogRecord::to_wire).collect::<Vec<_>>(),
    })
}

fn feedback_body(install_id: &str, feedback: &Feedback) -> Value {
    let mut body = json!({
        "installid": install_id,
        "title": feedback.title,
        "contents": feedback.content,
    });
    if let Some(msgid) = &feedback.msgid {
        body["msgid"] = Value::String(msgid.clone());
    }
    body
}

impl Backend for HttpBackend {
    fn register_install<'a>(&'a self, request: &'a InstallRequest) -> BackendFuture<'a, InstallId> {
        Box::pin(async move {
            let body = serde_json::to_value(request).map_err(|e| BackendError::Encode(e.to_string()))?;
            let value = self.post_json(REGISTER_PATH, &body).await?;
            parse_install_id(&value)
        })
    }

    fn update_install<'a>(
        &'a self,
        install_id: &'a str,
        request: &'a InstallRequest,
    ) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let body = update_body(install_id, request)?;
            self.post_json(UPDATE_PATH, &body).await.map(|_| ())
        })
    }

    fn post_logs<'a>(
        &'a self,
        install_id: &'a str,
        records: &'a [LogRecord],
    ) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let body = logs_body(install_id, records);
            self.post_json(LOGS_PATH, &body).await.map(|_| ())
        })
    }

    fn submit_feedback<'a>(
        &'a self,
        install_id: &'a str,
        feedback: &'a Feedback,
    ) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let body = feedback_body(install_id, feedback);
            self.post_json(FEEDBACK_PATH, &body).await.map(|_| ())
        })
    }
}
