//! Compression middleware: three stackable transforms illustrating the
//! pattern — `Deflate`/`Gzip` compress the response body against
//! `Accept-Encoding`, `Decompress` inflates the request body against
//! `Content-Encoding`. All three are built on the `flate2`-backed
//! [`CodecBody`] adapter.

use std::sync::Arc;

use flate2::Compression;

use crate::body::compress::CodecBody;
use crate::body::{AsyncBody, BoxBody};
use crate::error::Error;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;
use crate::service::{BoxFuture, BoxedService, Service};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Algorithm {
    Deflate,
    Gzip,
}

impl Algorithm {
    fn token(self) -> &'static str {
        match self {
            Algorithm::Deflate => "deflate",
            Algorithm::Gzip => "gzip",
        }
    }
}

/// Adapts a boxed body so it can be re-wrapped by [`CodecBody`], which is
/// generic over its inner body type.
struct Adapter(BoxBody);

#[async_trait::async_trait]
impl AsyncBody for Adapter {
    async fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        self.0.as_mut().read_some(buf).await
    }
}

/// Appends `Content-Encoding` to an existing `Vary` value per the
/// negotiation rules: absent → set; `*` → left untouched; otherwise
/// appended with a comma.
fn note_vary(headers: &mut crate::headers::HeaderMap) {
    match headers.get("vary") {
        None => headers.set("vary", "content-encoding"),
        Some("*") => {}
        Some(existing) => {
            let combined = format!("{existing}, content-encoding");
            headers.set("vary", combined);
        }
    }
}

struct CompressBody {
    algorithm: Algorithm,
    level: Compression,
}

impl Middleware for CompressBody {
    fn wrap(&self, next: BoxedService) -> BoxedService {
        Arc::new(CompressBodyService {
            next,
            algorithm: self.algorithm,
            level: self.level,
        })
    }
}

struct CompressBodyService {
    next: BoxedService,
    algorithm: Algorithm,
    level: Compression,
}

impl Service for CompressBodyService {
    fn call<'a>(&'a self, req: Request) -> BoxFuture<'a, Response> {
        let accepts = req
            .headers()
            .get("accept-encoding")
            .map(|v| {
                v.split(',')
                    .any(|enc| enc.trim().starts_with(self.algorithm.token()))
            })
            .unwrap_or(false);
        let algorithm = self.algorithm;
        let level = self.level;
        Box::pin(async move {
            let resp = Next::new(self.next.clone()).run(req).await;
            if !accepts || resp.headers().get("content-encoding").is_some() {
                return resp;
            }
            let status = resp.status();
            let mut headers = resp.headers().clone();
            let body = resp.into_body();
            let compressed = match algorithm {
                Algorithm::Deflate => CodecBody::deflate(Adapter(body), level),
                Algorithm::Gzip => CodecBody::gzip(Adapter(body), level),
            };
            headers.set("content-encoding", algorithm.token());
            headers.remove("content-length");
            note_vary(&mut headers);
            let mut out = Response::new(status);
            *out.headers_mut() = headers;
            *out.body_mut() = Box::pin(compressed);
            out
        })
    }
}

/// Compresses the response body with raw DEFLATE when the request's
/// `Accept-Encoding` allows it.
pub fn deflate() -> impl Middleware {
    CompressBody {
        algorithm: Algorithm::Deflate,
        level: Compression::default(),
    }
}

/// Compresses the response body with gzip when the request's
/// `Accept-Encoding` allows it.
pub fn gzip() -> impl Middleware {
    CompressBody {
        algorithm: Algorithm::Gzip,
        level: Compression::default(),
    }
}

struct DecompressService {
    next: BoxedService,
}

impl Middleware for Decompress {
    fn wrap(&self, next: BoxedService) -> BoxedService {
        Arc::new(DecompressService { next })
    }
}

/// Decodes the request body against `Content-Encoding`, processing its
/// comma-separated token list right to left. Accepts `deflate`, `gzip`,
/// and `identity`; consumed tokens are removed from the header, which is
/// erased entirely once empty.
pub struct Decompress;

impl Service for DecompressService {
    fn call<'a>(&'a self, mut req: Request) -> BoxFuture<'a, Response> {
        let remaining: Vec<String> = req
            .headers()
            .get("content-encoding")
            .map(|v| v.split(',').map(|s| s.trim().to_ascii_lowercase()).collect())
            .unwrap_or_default();

        let mut applied = Vec::new();
        let mut kept = Vec::new();
        for token in remaining.into_iter().rev() {
            match token.as_str() {
                "identity" => kept.push(token),
                "deflate" | "gzip" => applied.push(token),
                other => kept.push(other.to_string()),
            }
        }
        let current = std::mem::replace(req.body_mut(), Box::pin(crate::body::EofBody));
        let mut wrapped: BoxBody = current;
        for token in &applied {
            wrapped = match token.as_str() {
                "deflate" => Box::pin(CodecBody::inflate(Adapter(wrapped))),
                "gzip" => Box::pin(CodecBody::gunzip(Adapter(wrapped))),
                _ => wrapped,
            };
        }
        req.set_body(wrapped);

        if kept.is_empty() {
            req.headers_mut().remove("content-encoding");
        } else {
            let mut kept = kept;
            kept.reverse();
            req.headers_mut().set("content-encoding", kept.join(", "));
        }

        Box::pin(Next::new(self.next.clone()).run(req))
    }
}
