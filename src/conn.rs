//! Per-connection state machine: accept → read → dispatch → write →
//! keep-alive loop.

use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::body::{BoxBody, EofBody, MemoryBody};
use crate::date::DateCache;
use crate::error::{Error, ExceptionObserver};
use crate::method::Method;
use crate::parser::{self, ParseError};
use crate::request::{ConnectionInfo, Request};
use crate::response::Response;
use crate::router::Router;

/// Per-connection tunables, supplied by the server orchestrator.
#[derive(Clone)]
pub struct ConnConfig {
    pub request_header_limit: usize,
    pub request_body_limit: usize,
    pub request_timeout: Duration,
    pub on_exception: Option<ExceptionObserver>,
}

/// Run the read-dispatch-write loop for one accepted socket until the
/// peer closes, a deadline is exceeded, or neither side wants to keep the
/// connection alive.
pub async fn serve_connection(
    mut socket: TcpStream,
    peer_addr: std::net::SocketAddr,
    local_addr: std::net::SocketAddr,
    router: Arc<Router>,
    config: ConnConfig,
    dates: DateCache,
) {
    let connection = ConnectionInfo {
        peer_addr,
        local_addr,
    };
    let mut buf = BytesMut::with_capacity(8192);

    loop {
        let cycle = timeout(
            config.request_timeout,
            serve_one_request(&mut socket, &mut buf, &router, &config, &dates, connection),
        )
        .await;

        match cycle {
            Ok(Outcome::Continue) => continue,
            Ok(Outcome::Close) => return,
            Err(_) => {
                let _ = write_simple(&mut socket, 408, "request timed out", &dates).await;
                return;
            }
        }
    }
}

enum Outcome {
    Continue,
    Close,
}

/// Read one request off `socket`, dispatch it, and write the response.
/// Bounded end-to-end by the caller's `timeout`, per the server's
/// `request_timeout` covering the whole request+response window.
async fn serve_one_request(
    socket: &mut TcpStream,
    buf: &mut BytesMut,
    router: &Arc<Router>,
    config: &ConnConfig,
    dates: &DateCache,
    connection: ConnectionInfo,
) -> Outcome {
    let head = match read_head(socket, buf, config.request_header_limit).await {
        Ok(Some(head)) => head,
        Ok(None) => return Outcome::Close, // peer closed cleanly between requests
        Err(()) => {
            let _ = write_simple(socket, 400, "bad request", dates).await;
            return Outcome::Close;
        }
    };

    let keep_alive_requested = wants_keep_alive(head.version_minor, &head.headers);

    if head
        .headers
        .get("expect")
        .map(|v| v.eq_ignore_ascii_case("100-continue"))
        .unwrap_or(false)
    {
        if socket
            .write_all(b"HTTP/1.1 100 Continue\r\n\r\n")
            .await
            .is_err()
        {
            return Outcome::Close;
        }
    }

    let content_length = head
        .headers
        .get("content-length")
        .and_then(|v| v.parse::<u64>().ok());
    let is_chunked = head
        .headers
        .get("transfer-encoding")
        .map(|v| v.eq_ignore_ascii_case("chunked"))
        .unwrap_or(false);

    let leftover = buf.split_off(0);
    let body: BoxBody = if is_chunked {
        match read_chunked_body(socket, leftover, config.request_body_limit).await {
            Ok((data, rest)) => {
                *buf = rest;
                Box::pin(MemoryBody::new(data))
            }
            Err(()) => {
                let _ = write_simple(socket, 400, "bad request body", dates).await;
                return Outcome::Close;
            }
        }
    } else if let Some(len) = content_length.filter(|&n| n > 0) {
        match read_sized_body(socket, leftover, len, config.request_body_limit).await {
            Ok(data) => Box::pin(MemoryBody::new(data)),
            Err(()) => {
                let _ = write_simple(socket, 400, "bad request body", dates).await;
                return Outcome::Close;
            }
        }
    } else {
        *buf = leftover;
        Box::pin(EofBody)
    };

    let mut req = Request::new(
        head.method,
        head.target,
        head.version_minor,
        head.headers,
        connection,
    );
    req.set_body(body);

    let raw_path = req.path().to_string();

    let mut resp = match percent_encoding::percent_decode_str(&raw_path).decode_utf8() {
        Err(_) => Response::new(400).text("request path is not valid utf-8 after percent-decoding"),
        Ok(decoded) => {
            let path = decoded.into_owned();
            match router.lookup(head.method, &path) {
                Some(m) => {
                    let path_info = crate::path::PathInfo::from_parts(
                        m.route.pattern().source().to_string(),
                        path,
                        m.params,
                    );
                    req.set_path_info(path_info);
                    req.set_state(m.route.state().clone());
                    let service = m.route.service_arc();
                    match tokio::spawn(async move { service.call(req).await }).await {
                        Ok(resp) => resp,
                        Err(join_err) => {
                            let err = Error::Panic(join_err.to_string());
                            if let Some(observer) = &config.on_exception {
                                observer(&err);
                            }
                            Response::new(500).text("internal server error")
                        }
                    }
                }
                None => Response::new(404).text("request path is not found"),
            }
        }
    };

    let keep_alive = keep_alive_requested
        && resp
            .headers()
            .get("connection")
            .map(|v| !v.eq_ignore_ascii_case("close"))
            .unwrap_or(true);

    if write_response(socket, &mut resp, dates, keep_alive, head.version_minor)
        .await
        .is_err()
    {
        return Outcome::Close;
    }

    if !keep_alive {
        let _ = socket.shutdown().await;
        return Outcome::Close;
    }

    Outcome::Continue
}

struct Head {
    method: Method,
    target: String,
    version_minor: u8,
    headers: crate::headers::HeaderMap,
}

async fn read_head(
    socket: &mut TcpStream,
    buf: &mut BytesMut,
    limit: usize,
) -> Result<Option<Head>, ()> {
    loop {
        match parser::parse_head(buf, limit) {
            Ok(parsed) => {
                let consumed = parsed.consumed;
                let rest = buf.split_off(consumed);
                *buf = rest;
                return Ok(Some(Head {
                    method: parsed.method,
                    target: parsed.target,
                    version_minor: parsed.version_minor,
                    headers: parsed.headers,
                }));
            }
            Err(ParseError::Incomplete) => {
                let mut chunk = [0u8; 4096];
                let n = socket.read(&mut chunk).await.map_err(|_| ())?;
                if n == 0 {
                    return if buf.is_empty() { Ok(None) } else { Err(()) };
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            Err(_) => return Err(()),
        }
    }
}

async fn read_sized_body(
    socket: &mut TcpStream,
    mut already: BytesMut,
    len: u64,
    limit: usize,
) -> Result<Vec<u8>, ()> {
    if len as usize > limit {
        return Err(());
    }
    while (already.len() as u64) < len {
        let mut chunk = [0u8; 8192];
        let n = socket.read(&mut chunk).await.map_err(|_| ())?;
        if n == 0 {
            return Err(());
        }
        already.extend_from_slice(&chunk[..n]);
    }
    let data = already.split_to(len as usize);
    Ok(data.to_vec())
}

/// Read and fully decode a chunked-transfer-coded request body, returning
/// the decoded payload and any bytes read past the terminating chunk
/// (the start of the next pipelined request, if any).
async fn read_chunked_body(
    socket: &mut TcpStream,
    mut already: BytesMut,
    limit: usize,
) -> Result<(Vec<u8>, BytesMut), ()> {
    let mut out = Vec::new();
    loop {
        let (consumed, done) =
            parser::decode_chunks(&already, &mut out).map_err(|_| ())?;
        if out.len() > limit {
            return Err(());
        }
        let rest = already.split_off(consumed);
        if done {
            return Ok((out, rest));
        }
        already = rest;
        let mut chunk = [0u8; 8192];
        let n = socket.read(&mut chunk).await.map_err(|_| ())?;
        if n == 0 {
            return Err(());
        }
        already.extend_from_slice(&chunk[..n]);
    }
}

fn wants_keep_alive(version_minor: u8, headers: &crate::headers::HeaderMap) -> bool {
    let connection = headers.get("connection").map(|v| v.to_ascii_lowercase());
    match version_minor {
        1 => connection.as_deref() != Some("close"),
        _ => connection.as_deref() == Some("keep-alive"),
    }
}

async fn write_simple(
    socket: &mut TcpStream,
    status: u16,
    text: &str,
    dates: &DateCache,
) -> Result<(), std::io::Error> {
    let body = text.as_bytes();
    let date = dates.get();
    let head = format!(
        "HTTP/1.1 {status} {}\r\nDate: {date}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        reason_phrase(status),
        body.len(),
    );
    socket.write_all(head.as_bytes()).await?;
    socket.write_all(body).await?;
    socket.shutdown().await
}

async fn write_response(
    socket: &mut TcpStream,
    resp: &mut Response,
    dates: &DateCache,
    keep_alive: bool,
    version_minor: u8,
) -> Result<(), std::io::Error> {
    let date = dates.get();
    let mut head = format!(
        "HTTP/1.{} {} {}\r\nDate: {date}\r\n",
        version_minor,
        resp.status(),
        reason_phrase(resp.status()),
    );

    let size_hint = resp.body_mut().size_hint();
    let chunked = size_hint.is_none();
    for (name, value) in resp.headers().iter() {
        head.push_str(name.as_str());
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    if let Some(len) = size_hint {
        head.push_str(&format!("Content-Length: {len}\r\n"));
    } else {
        head.push_str("Transfer-Encoding: chunked\r\n");
    }
    head.push_str(if keep_alive {
        "Connection: keep-alive\r\n\r\n"
    } else {
        "Connection: close\r\n\r\n"
    });
    socket.write_all(head.as_bytes()).await?;

    let mut chunk = [0u8; 8192];
    loop {
        let n = match resp.body_mut().as_mut().read_some(&mut chunk).await {
            Ok(n) => n,
            Err(_) => return Err(std::io::Error::other("body read error")),
        };
        if n == 0 {
            if chunked {
                socket.write_all(b"0\r\n\r\n").await?;
            }
            break;
        }
        if chunked {
            socket
                .write_all(format!("{:x}\r\n", n).as_bytes())
                .await?;
            socket.write_all(&chunk[..n]).await?;
            socket.write_all(b"\r\n").await?;
        } else {
            socket.write_all(&chunk[..n]).await?;
        }
    }
    socket.flush().await
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        304 => "Not Modified",
        400 => "Bad Request",
        404 => "Not Found",
        408 => "Request Timeout",
        415 => "Unsupported Media Type",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
