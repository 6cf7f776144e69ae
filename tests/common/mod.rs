//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Request, Response, StatusCode};
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use edge_cache_proxy::origin::{Origin, OriginError, OriginResponse};
use edge_cache_proxy::storage::{
    HttpMetadata, KvStore, MemoryKvStore, MemoryObjectStore, ObjectCache, ObjectStore, RedirectStore,
    StoreError, StoredObject,
};
use edge_cache_proxy::{Pipeline, PipelineSettings};

// ---------------------------------------------------------------------------
// Raw TCP mock origin
// ---------------------------------------------------------------------------

/// What the mock origin saw.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub host: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Start a programmable origin on an ephemeral port.
pub async fn start_programmable_backend<F>(f: F) -> SocketAddr
where
    F: Fn(MockRequest) -> MockResponse + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let response = f(request);
                        let reason = StatusCode::from_u16(response.status)
                            .ok()
                            .and_then(|s| s.canonical_reason())
                            .unwrap_or("Unknown");

                        let mut out = format!(
                            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
                            response.status,
                            reason,
                            response.body.len()
                        );
                        for (name, value) in &response.headers {
                            out.push_str(&format!("{}: {}\r\n", name, value));
                        }
                        out.push_str("\r\n");
                        out.push_str(&response.body);

                        let _ = socket.write_all(out.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request(socket: &mut TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let mut host = None;
    let mut content_length = 0usize;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "host" => host = Some(value.trim().to_string()),
                "content-length" => content_length = value.trim().parse().unwrap_or(0),
                _ => {}
            }
        }
    }

    let mut body = buf[head_end..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(MockRequest {
        method,
        path,
        host,
        body,
    })
}

// ---------------------------------------------------------------------------
// In-process doubles
// ---------------------------------------------------------------------------

type Responder = dyn Fn(&Request<Bytes>) -> Result<OriginResponse, OriginError> + Send + Sync;

/// Origin answering from a closure, counting calls.
pub struct ScriptedOrigin {
    calls: AtomicUsize,
    forwards: AtomicUsize,
    seen: Mutex<Vec<String>>,
    respond: Box<Responder>,
}

impl ScriptedOrigin {
    pub fn new<F>(respond: F) -> Arc<Self>
    where
        F: Fn(&Request<Bytes>) -> Result<OriginResponse, OriginError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            forwards: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        })
    }

    /// Origin that always answers with `response`.
    pub fn fixed(response: OriginResponse) -> Arc<Self> {
        Self::new(move |_| Ok(response.clone()))
    }

    /// Origin whose transport always fails.
    pub fn unreachable() -> Arc<Self> {
        Self::new(|_| Err(OriginError::Transport("connection refused".into())))
    }

    /// Total exchanges, fetched or forwarded.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Exchanges made through `forward`.
    pub fn forwards(&self) -> usize {
        self.forwards.load(Ordering::SeqCst)
    }

    /// Paths requested so far.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Origin for ScriptedOrigin {
    async fn fetch(&self, request: Request<Bytes>) -> Result<OriginResponse, OriginError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.uri().to_string());
        (self.respond)(&request)
    }

    async fn forward(&self, request: Request<Bytes>) -> Result<OriginResponse, OriginError> {
        self.forwards.fetch_add(1, Ordering::SeqCst);
        self.fetch(request).await
    }
}

/// Build an origin response.
pub fn origin_response(status: StatusCode, headers: &[(&'static str, &'static str)], body: &'static str) -> OriginResponse {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.append(*name, HeaderValue::from_static(value));
    }
    OriginResponse::new(status, map, Bytes::from_static(body.as_bytes()))
}

/// Key-value store counting calls.
#[derive(Default)]
pub struct CountingKv {
    pub inner: MemoryKvStore,
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
    pub broken: bool,
}

#[async_trait]
impl KvStore for CountingKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err(StoreError::Unavailable("kv offline".into()));
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err(StoreError::Unavailable("kv offline".into()));
        }
        self.inner.put(key, value).await
    }
}

/// Object store counting calls.
#[derive(Default)]
pub struct CountingObjects {
    pub inner: MemoryObjectStore,
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
    pub broken: bool,
}

#[async_trait]
impl ObjectStore for CountingObjects {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err(StoreError::Unavailable("bucket offline".into()));
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, body: Bytes, metadata: HttpMetadata) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err(StoreError::Unavailable("bucket offline".into()));
        }
        self.inner.put(key, body, metadata).await
    }
}

impl CountingKv {
    pub fn touched(&self) -> usize {
        self.gets.load(Ordering::SeqCst) + self.puts.load(Ordering::SeqCst)
    }
}

impl CountingObjects {
    pub fn touched(&self) -> usize {
        self.gets.load(Ordering::SeqCst) + self.puts.load(Ordering::SeqCst)
    }
}

/// A pipeline wired to counting stores and a scripted origin.
pub struct Harness {
    pub pipeline: Pipeline,
    pub kv: Arc<CountingKv>,
    pub objects: Arc<CountingObjects>,
    pub origin: Arc<ScriptedOrigin>,
}

impl Harness {
    pub fn new(origin: Arc<ScriptedOrigin>) -> Self {
        Self::with(origin, PipelineSettings::default(), CountingKv::default(), CountingObjects::default())
    }

    pub fn with(
        origin: Arc<ScriptedOrigin>,
        settings: PipelineSettings,
        kv: CountingKv,
        objects: CountingObjects,
    ) -> Self {
        let kv = Arc::new(kv);
        let objects = Arc::new(objects);
        let pipeline = Pipeline::new(
            RedirectStore::new(kv.clone()),
            ObjectCache::new(objects.clone()),
            origin.clone(),
            settings,
        );
        Self {
            pipeline,
            kv,
            objects,
            origin,
        }
    }

    /// Wait for spawned store writes.
    pub async fn settle(&self) {
        self.pipeline.background().wait_idle().await;
    }
}

/// A body-less request with a `Host` header.
pub fn request(method: &str, uri: &str, host: &str) -> Request<Bytes> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, host)
        .body(Bytes::new())
        .unwrap()
}

pub fn get(uri: &str) -> Request<Bytes> {
    request("GET", uri, "host")
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap()
}
