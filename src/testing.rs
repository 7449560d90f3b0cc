//! An in-process test harness: bind a [`Router`] to a loopback port and
//! drive it with a raw-TCP client. No external HTTP client dependency —
//! an HTTP client is out of scope for the library itself, so tests speak
//! the wire protocol directly, reusing the same hand-rolled parser the
//! connection task uses.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::conn::{self, ConnConfig};
use crate::date::DateCache;
use crate::headers::HeaderMap;
use crate::parser::{self, ParseError};
use crate::router::Router;

/// A router bound to a random loopback port, served by a single
/// background accept loop for the lifetime of the test.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: TestClient,
}

impl TestApp {
    /// Bind `router` to `127.0.0.1:0` and start serving it in the
    /// background. The accept loop runs for as long as the returned
    /// `TestApp` (and the task it spawned) stays alive; tests don't need
    /// to shut it down explicitly since the process exits at test end.
    pub async fn spawn(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener");
        let addr = listener.local_addr().expect("test listener has no local addr");
        let router = std::sync::Arc::new(router);
        let dates = DateCache::new();

        tokio::spawn(async move {
            let config = ConnConfig {
                request_header_limit: 64 * 1024,
                request_body_limit: 16 * 1024 * 1024,
                request_timeout: std::time::Duration::from_secs(5),
                on_exception: None,
            };
            loop {
                let Ok((stream, peer_addr)) = listener.accept().await else {
                    return;
                };
                let local_addr = stream.local_addr().unwrap_or(addr);
                let router = router.clone();
                let config = config.clone();
                let dates = dates.clone();
                tokio::spawn(async move {
                    conn::serve_connection(stream, peer_addr, local_addr, router, config, dates)
                        .await;
                });
            }
        });

        TestApp {
            addr,
            client: TestClient::new(addr),
        }
    }
}

/// A minimal raw-TCP HTTP/1.1 client for exercising a [`TestApp`].
#[derive(Clone)]
pub struct TestClient {
    addr: SocketAddr,
}

impl TestClient {
    pub fn new(addr: SocketAddr) -> Self {
        TestClient { addr }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, &[], b"").await
    }

    pub async fn post(&self, path: &str, content_type: &str, body: &[u8]) -> TestResponse {
        self.request("POST", path, &[("content-type", content_type)], body)
            .await
    }

    /// Send one request over a fresh connection and read the response to
    /// completion (the connection is closed on our end immediately after,
    /// so keep-alive pipelining tests use [`Self::pipeline`] instead).
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> TestResponse {
        let mut stream = TcpStream::connect(self.addr)
            .await
            .expect("failed to connect to test app");
        write_request(&mut stream, method, path, headers, body, true).await;
        read_response(&mut stream).await
    }

    /// Send `requests` back to back on the same connection (HTTP/1.1
    /// keep-alive pipelining) and read each response in turn.
    pub async fn pipeline(
        &self,
        requests: &[(&str, &str, &[(&str, &str)], &[u8])],
    ) -> Vec<TestResponse> {
        let mut stream = TcpStream::connect(self.addr)
            .await
            .expect("failed to connect to test app");
        let mut out = Vec::with_capacity(requests.len());
        for (i, (method, path, headers, body)) in requests.iter().enumerate() {
            let last = i + 1 == requests.len();
            write_request(&mut stream, method, path, headers, body, last).await;
            out.push(read_response(&mut stream).await);
        }
        out
    }
}

async fn write_request(
    stream: &mut TcpStream,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: &[u8],
    close: bool,
) {
    let mut head = format!("{method} {path} HTTP/1.1\r\nHost: test\r\n");
    if !headers.iter().any(|(n, _)| n.eq_ignore_ascii_case("content-length")) && !body.is_empty() {
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    for (name, value) in headers {
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    if close {
        head.push_str("Connection: close\r\n");
    }
    head.push_str("\r\n");
    stream
        .write_all(head.as_bytes())
        .await
        .expect("failed to write request head");
    if !body.is_empty() {
        stream.write_all(body).await.expect("failed to write request body");
    }
}

/// A response read back from the test server: status, headers, and the
/// fully-buffered body.
#[derive(Debug)]
pub struct TestResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is not valid json")
    }
}

async fn read_response(stream: &mut TcpStream) -> TestResponse {
    let mut buf = bytes::BytesMut::with_capacity(4096);
    let (status, headers, consumed) = loop {
        match parse_response_head(&buf) {
            Ok(Some(parsed)) => break parsed,
            Ok(None) => {}
            Err(_) => panic!("malformed response head from test server"),
        }
        let mut chunk = [0u8; 4096];
        let n = stream
            .read(&mut chunk)
            .await
            .expect("failed to read response from test server");
        if n == 0 {
            panic!("test server closed the connection before sending a full response head");
        }
        buf.extend_from_slice(&chunk[..n]);
    };
    let mut rest = buf.split_off(consumed);

    let body = if headers
        .get("transfer-encoding")
        .map(|v| v.eq_ignore_ascii_case("chunked"))
        .unwrap_or(false)
    {
        let mut out = Vec::new();
        loop {
            let (used, done) = parser::decode_chunks(&rest, &mut out).expect("bad chunked body");
            let leftover = rest.split_off(used);
            rest = leftover;
            if done {
                break;
            }
            let mut chunk = [0u8; 4096];
            let n = stream.read(&mut chunk).await.expect("failed to read chunked body");
            if n == 0 {
                break;
            }
            rest.extend_from_slice(&chunk[..n]);
        }
        out
    } else if let Some(len) = headers.get("content-length").and_then(|v| v.parse::<usize>().ok()) {
        while rest.len() < len {
            let mut chunk = [0u8; 4096];
            let n = stream.read(&mut chunk).await.expect("failed to read response body");
            if n == 0 {
                break;
            }
            rest.extend_from_slice(&chunk[..n]);
        }
        rest.truncate(len);
        rest.to_vec()
    } else {
        let mut out = rest.to_vec();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.expect("failed to read response body");
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        out
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

/// A reduced version of [`parser::parse_head`] for the status line instead
/// of a request line; reuses the same header-parsing approach.
fn parse_response_head(buf: &[u8]) -> Result<Option<(u16, HeaderMap, usize)>, ParseError> {
    let term = match memchr::memmem::find(buf, b"\r\n\r\n") {
        Some(i) => i + 4,
        None => return Ok(None),
    };
    let head = &buf[..term];
    let line_end = memchr::memchr(b'\r', head).ok_or(ParseError::Invalid)?;
    let line = std::str::from_utf8(&head[..line_end]).map_err(|_| ParseError::Invalid)?;
    let mut parts = line.splitn(3, ' ');
    let _version = parts.next().ok_or(ParseError::Invalid)?;
    let status: u16 = parts
        .next()
        .ok_or(ParseError::Invalid)?
        .parse()
        .map_err(|_| ParseError::Invalid)?;

    let mut headers = HeaderMap::new();
    let mut cursor = line_end + 2;
    loop {
        if head[cursor..].starts_with(b"\r\n") {
            cursor += 2;
            break;
        }
        let rest = &head[cursor..];
        let line_len = memchr::memchr(b'\r', rest).ok_or(ParseError::Invalid)?;
        let header_line = std::str::from_utf8(&rest[..line_len]).map_err(|_| ParseError::Invalid)?;
        let (name, value) = header_line.split_once(':').ok_or(ParseError::Invalid)?;
        headers.insert(name.trim(), value.trim());
        cursor += line_len + 2;
    }

    Ok(Some((status, headers, term)))
}
