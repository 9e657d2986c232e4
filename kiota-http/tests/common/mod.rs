//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use kiota_core::{
    FieldDeserializers, Headers, KiotaError, Parsable, ParseNode, Result, SerializationWriter,
    ValuedEnum,
};
use kiota_http::{HttpResponse, HttpTransport, NativeRequest};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

pub const JSON: &str = "application/json";

/// A transport that replays queued responses and records requests.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<NativeRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, status: u16, content_type: Option<&str>, body: &str) {
        let mut headers = Headers::new();
        if let Some(ct) = content_type {
            headers.add("Content-Type", ct);
        }
        headers.add("X-Request-Id", "req-1");
        let body = (!body.is_empty()).then(|| Bytes::copy_from_slice(body.as_bytes()));
        self.responses
            .lock()
            .unwrap()
            .push_back(HttpResponse::new(status, headers, body));
    }

    pub fn respond_json(&self, status: u16, body: &str) {
        self.respond(status, Some(JSON), body);
    }

    pub fn requests(&self) -> Vec<NativeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: NativeRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| KiotaError::Transport("no response queued".to_string()))
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Group {
    pub group_id: Option<String>,
    pub description: Option<String>,
}

impl Group {
    pub fn create(_: &dyn ParseNode) -> Result<Self> {
        Ok(Self::default())
    }
}

impl Parsable for Group {
    fn field_deserializers(&self) -> FieldDeserializers<Self> {
        FieldDeserializers::new()
            .with("groupId", |g: &mut Group, n| {
                g.group_id = n.get_string_value();
                Ok(())
            })
            .with("description", |g: &mut Group, n| {
                g.description = n.get_string_value();
                Ok(())
            })
    }

    fn serialize(&self, writer: &mut dyn SerializationWriter) -> Result<()> {
        writer.write_string_value(Some("groupId"), self.group_id.as_deref())?;
        writer.write_string_value(Some("description"), self.description.as_deref())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SystemInfo {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl SystemInfo {
    pub fn create(_: &dyn ParseNode) -> Result<Self> {
        Ok(Self::default())
    }
}

impl Parsable for SystemInfo {
    fn field_deserializers(&self) -> FieldDeserializers<Self> {
        FieldDeserializers::new()
            .with("name", |s: &mut SystemInfo, n| {
                s.name = n.get_string_value();
                Ok(())
            })
            .with("description", |s: &mut SystemInfo, n| {
                s.description = n.get_string_value();
                Ok(())
            })
    }

    fn serialize(&self, writer: &mut dyn SerializationWriter) -> Result<()> {
        writer.write_string_value(Some("name"), self.name.as_deref())?;
        writer.write_string_value(Some("description"), self.description.as_deref())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RuleViolation {
    pub title: Option<String>,
    pub error_code: Option<i32>,
}

impl RuleViolation {
    pub fn create(_: &dyn ParseNode) -> Result<Self> {
        Ok(Self::default())
    }
}

impl Parsable for RuleViolation {
    fn field_deserializers(&self) -> FieldDeserializers<Self> {
        FieldDeserializers::new()
            .with("title", |e: &mut RuleViolation, n| {
                e.title = n.get_string_value();
                Ok(())
            })
            .with("error_code", |e: &mut RuleViolation, n| {
                e.error_code = n.get_int_value();
                Ok(())
            })
    }

    fn serialize(&self, writer: &mut dyn SerializationWriter) -> Result<()> {
        writer.write_string_value(Some("title"), self.title.as_deref())?;
        writer.write_int_value(Some("error_code"), self.error_code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    Enabled,
    Disabled,
    Deprecated,
}

impl ValuedEnum for ArtifactState {
    fn value(&self) -> &str {
        match self {
            ArtifactState::Enabled => "ENABLED",
            ArtifactState::Disabled => "DISABLED",
            ArtifactState::Deprecated => "DEPRECATED",
        }
    }

    fn for_value(value: &str) -> Option<Self> {
        match value {
            "ENABLED" => Some(ArtifactState::Enabled),
            "DISABLED" => Some(ArtifactState::Disabled),
            "DEPRECATED" => Some(ArtifactState::Deprecated),
            _ => None,
        }
    }
}

/// A request received by the stub server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// A minimal HTTP/1.1 server for end-to-end tests.
pub struct StubServer {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve_connection(stream, Arc::clone(&log)));
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn serve_connection(stream: TcpStream, log: Arc<Mutex<Vec<RecordedRequest>>>) {
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    loop {
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).await.unwrap_or(0) == 0 {
            return;
        }
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let path = parts.next().unwrap_or_default().to_string();

        let mut headers = Vec::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                return;
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                let (name, value) = (name.trim().to_ascii_lowercase(), value.trim().to_string());
                if name == "content-length" {
                    content_length = value.parse().unwrap_or(0);
                }
                headers.push((name, value));
            }
        }

        let mut body = vec![0u8; content_length];
        if reader.read_exact(&mut body).await.is_err() {
            return;
        }

        let response = route(&method, &path);
        log.lock().unwrap().push(RecordedRequest {
            method,
            path,
            headers,
            body,
        });
        if write.write_all(response.as_bytes()).await.is_err() {
            return;
        }
    }
}

fn route(method: &str, path: &str) -> String {
    match (method, path) {
        ("GET", "/system/info") => json_response(200, "OK", r#"{"name":"test","description":"test"}"#),
        ("POST", "/groups") => "HTTP/1.1 204 No Content\r\n\r\n".to_string(),
        ("GET", "/groups/missing") => json_response(
            404,
            "Not Found",
            r#"{"title":"group not found","error_code":404}"#,
        ),
        ("GET", "/groups/states") => json_response(200, "OK", r#"["ENABLED","DEPRECATED"]"#),
        _ => "HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n".to_string(),
    }
}

fn json_response(status: u16, reason: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
}
