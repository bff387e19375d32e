use crate::errors::IncidentError;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub bearer_token: Option<String>,
    pub body: Value,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait HttpClient: Send + Sync {
    fn post_json(&self, request: HttpRequest) -> Result<HttpResponse, IncidentError>;
}

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String, IncidentError>;
}

pub trait Terminal: Send + Sync {
    fn write_line(&self, line: &str) -> Result<(), IncidentError>;
}

pub struct ProductionHttpClient {
    client: reqwest::blocking::Client,
}

impl ProductionHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for ProductionHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ProductionHttpClient {
    fn post_json(&self, request: HttpRequest) -> Result<HttpResponse, IncidentError> {
        let mut builder = self
            .client
            .post(&request.url)
            .header("Accept", "application/json")
            .json(&request.body);
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().map_err(|e| {
            if e.is_timeout() {
                IncidentError::Service(format!("request to {} timed out", request.url))
            } else {
                IncidentError::Service(e.to_string())
            }
        })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| IncidentError::Service(format!("failed to read response body: {e}")))?;
        Ok(HttpResponse { status, body })
    }
}

pub struct ProductionFileSystem;

impl FileSystem for ProductionFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, IncidentError> {
        std::fs::read_to_string(path)
            .map_err(|e| IncidentError::Io(format!("{}: {e}", path.display())))
    }
}

pub struct ProductionTerminal;

impl Terminal for ProductionTerminal {
    fn write_line(&self, line: &str) -> Result<(), IncidentError> {
        use std::io::Write;
        let mut out = std::io::stdout();
        writeln!(out, "{line}").map_err(|e| IncidentError::Io(e.to_string()))
    }
}

pub struct ProductionRuntime {
    pub file_system: Arc<dyn FileSystem>,
    pub terminal: Arc<dyn Terminal>,
    pub http_client: Arc<dyn HttpClient>,
}

impl ProductionRuntime {
    pub fn new() -> Self {
        Self {
            file_system: Arc::new(ProductionFileSystem),
            terminal: Arc::new(ProductionTerminal),
            http_client: Arc::new(ProductionHttpClient::new()),
        }
    }
}

impl Default for ProductionRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default, Clone)]
pub struct FakeFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
}

impl FakeFileSystem {
    pub fn with_file(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        let fs = Self::default();
        fs.insert(path, contents);
        fs
    }

    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files
            .lock()
            .expect("files lock")
            .insert(path.into(), contents.into());
    }
}

impl FileSystem for FakeFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, IncidentError> {
        self.files
            .lock()
            .expect("files lock")
            .get(path)
            .cloned()
            .ok_or_else(|| IncidentError::Io(format!("missing file {}", path.display())))
    }
}

#[derive(Default, Clone)]
pub struct FakeTerminal {
    writes: Arc<Mutex<Vec<String>>>,
}

impl FakeTerminal {
    pub fn written_lines(&self) -> Vec<String> {
        self.writes.lock().expect("writes lock").clone()
    }

    pub fn output(&self) -> String {
        self.written_lines().join("\n")
    }
}

impl Terminal for FakeTerminal {
    fn write_line(&self, line: &str) -> Result<(), IncidentError> {
        self.writes
            .lock()
            .expect("writes lock")
            .push(line.to_string());
        Ok(())
    }
}

/// Replays queued responses in order and records every request it receives.
#[derive(Default, Clone)]
pub struct FakeHttpClient {
    responses: Arc<Mutex<Vec<Result<HttpResponse, IncidentError>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl FakeHttpClient {
    pub fn push_response(&self, response: Result<HttpResponse, IncidentError>) {
        self.responses
            .lock()
            .expect("responses lock")
            .push(response);
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push_response(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl HttpClient for FakeHttpClient {
    fn post_json(&self, request: HttpRequest) -> Result<HttpResponse, IncidentError> {
        self.requests.lock().expect("requests lock").push(request);
        let mut responses = self.responses.lock().expect("responses lock");
        if responses.is_empty() {
            return Err(IncidentError::Service(
                "no fake response queued".to_string(),
            ));
        }
        responses.remove(0)
    }
}
