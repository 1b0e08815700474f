//! Minimal in-process HTTP server for integration tests.
//!
//! Serves a scripted queue of canned responses (one per incoming request,
//! in order) and records every request line so tests can assert on paths,
//! query strings, and request counts. Connections are closed after each
//! response.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// One canned HTTP response.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl StubResponse {
    /// A JSON response with the given status.
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string(),
        }
    }

    /// A plain-text response with the given status.
    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Scripted HTTP server bound to an ephemeral localhost port.
pub struct StubServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    /// Start a server that answers incoming requests with `responses` in
    /// order. Requests beyond the script get a 404.
    pub async fn start(responses: Vec<StubResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub server");
        let addr = listener.local_addr().expect("stub server address");
        let queue = Arc::new(Mutex::new(VecDeque::from(responses)));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let task_queue = Arc::clone(&queue);
        let task_requests = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let queue = Arc::clone(&task_queue);
                let requests = Arc::clone(&task_requests);
                tokio::spawn(async move {
                    handle_connection(stream, queue, requests).await;
                });
            }
        });

        Self { addr, requests }
    }

    /// Base URL of the server, e.g. `http://127.0.0.1:45123`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request lines seen so far, e.g. `"GET /products/C1/components?version=1"`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests served.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    queue: Arc<Mutex<VecDeque<StubResponse>>>,
    requests: Arc<Mutex<Vec<String>>>,
) {
    let Some(request_line) = read_request(&mut stream).await else {
        return;
    };
    requests.lock().unwrap().push(request_line);

    let response = queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| StubResponse::text(404, "stub script exhausted"));
    let _ = stream.write_all(render(&response).as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Read one HTTP request (head plus Content-Length body) and return its
/// request line without the trailing protocol version.
async fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find_subslice(&data, b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut buf).await.ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);

    while data.len() < header_end + content_length {
        let n = stream.read(&mut buf).await.ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }

    let request_line = head.lines().next()?;
    Some(
        request_line
            .strip_suffix(" HTTP/1.1")
            .unwrap_or(request_line)
            .to_string(),
    )
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn render(response: &StubResponse) -> String {
    let reason = match response.status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    };
    let mut out = format!("HTTP/1.1 {} {}\r\n", response.status, reason);
    for (name, value) in &response.headers {
        out.push_str(&format!("{}: {}\r\n", name, value));
    }
    out.push_str(&format!(
        "content-length: {}\r\nconnection: close\r\n\r\n{}",
        response.body.len(),
        response.body
    ));
    out
}
