//! Server orchestrator: SO_REUSEPORT accept loops, one per worker, each
//! spawning a cooperative task per accepted connection.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::conn::{self, ConnConfig};
use crate::date::DateCache;
use crate::error::{Error, ExceptionObserver};
use crate::router::Router;

/// Server configuration, set once via the builder methods and shared
/// read-only by every accept loop.
#[derive(Clone)]
pub struct ServerConfig {
    max_listen_connections: u32,
    request_timeout: Duration,
    request_header_limit: usize,
    request_body_limit: usize,
    workers: usize,
    pin_to_cores: bool,
    on_exception: Option<ExceptionObserver>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        ServerConfig {
            max_listen_connections: 1024,
            request_timeout: Duration::from_secs(5),
            request_header_limit: 8 * 1024,
            request_body_limit: usize::MAX,
            workers,
            pin_to_cores: false,
            on_exception: None,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        ServerConfig::default()
    }

    pub fn max_listen_connections(mut self, backlog: u32) -> Self {
        self.max_listen_connections = backlog;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn request_header_limit(mut self, limit: usize) -> Self {
        self.request_header_limit = limit;
        self
    }

    pub fn request_body_limit(mut self, limit: usize) -> Self {
        self.request_body_limit = limit;
        self
    }

    /// Number of SO_REUSEPORT accept loops. Defaults to the number of
    /// available cores.
    pub fn workers(mut self, count: usize) -> Self {
        self.workers = count.max(1);
        self
    }

    /// Pin each accept loop's worker thread to a distinct core via
    /// `core_affinity`. Has no effect beyond `workers()` threads.
    pub fn pin_to_cores(mut self, pin: bool) -> Self {
        self.pin_to_cores = pin;
        self
    }

    pub fn on_exception<F: Fn(&Error) + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.on_exception = Some(Arc::new(f));
        self
    }
}

/// A bound, runnable server. Built with [`Server::bind`] and driven by
/// [`Server::run`].
pub struct Server {
    addr: SocketAddr,
    router: Arc<Router>,
    config: ServerConfig,
}

impl Server {
    pub fn bind(addr: SocketAddr, router: Router, config: ServerConfig) -> Self {
        Server {
            addr,
            router: Arc::new(router),
            config,
        }
    }

    /// Run accept loops until `shutdown` resolves, then let in-flight
    /// connections finish their current request before returning.
    pub async fn run(self, shutdown: impl std::future::Future<Output = ()>) -> Result<(), Error> {
        let dates = DateCache::new();
        let _refresh = dates.spawn_refresh();

        let (stop_tx, stop_rx) = watch::channel(false);
        let mut handles = Vec::with_capacity(self.config.workers);

        for worker_id in 0..self.config.workers {
            let listener = bind_reuseport(self.addr, self.config.max_listen_connections)?;
            let router = self.router.clone();
            let config = self.config.clone();
            let dates = dates.clone();
            let mut stop_rx = stop_rx.clone();
            let pin = self.config.pin_to_cores;

            let handle = tokio::spawn(async move {
                if pin {
                    if let Some(core_ids) = core_affinity::get_core_ids() {
                        if let Some(core) = core_ids.get(worker_id % core_ids.len()) {
                            core_affinity::set_for_current(*core);
                        }
                    }
                }
                accept_loop(listener, router, config, dates, &mut stop_rx).await;
            });
            handles.push(handle);
        }

        shutdown.await;
        tracing::info!("server shutting down, {} accept loops stopping", self.config.workers);
        let _ = stop_tx.send(true);

        for handle in handles {
            let _ = handle.await;
        }
        Ok(())
    }
}

fn bind_reuseport(addr: SocketAddr, backlog: u32) -> Result<TcpListener, Error> {
    let socket = Socket::new(
        if addr.is_ipv4() { Domain::IPV4 } else { Domain::IPV6 },
        Type::STREAM,
        Some(Protocol::TCP),
    )
    .map_err(Error::Io)?;
    socket.set_reuse_address(true).map_err(Error::Io)?;
    #[cfg(not(windows))]
    socket.set_reuse_port(true).map_err(Error::Io)?;
    socket.set_nonblocking(true).map_err(Error::Io)?;
    socket.bind(&addr.into()).map_err(Error::Io)?;
    socket.listen(backlog as i32).map_err(Error::Io)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener).map_err(Error::Io)
}

async fn accept_loop(
    listener: TcpListener,
    router: Arc<Router>,
    config: ServerConfig,
    dates: DateCache,
    stop_rx: &mut watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            result = listener.accept() => {
                match result {
                    Ok((stream, peer_addr)) => {
                        let _ = stream.set_nodelay(true);
                        let local_addr = stream
                            .local_addr()
                            .unwrap_or_else(|_| peer_addr);
                        let router = router.clone();
                        let dates = dates.clone();
                        let conn_config = ConnConfig {
                            request_header_limit: config.request_header_limit,
                            request_body_limit: config.request_body_limit,
                            request_timeout: config.request_timeout,
                            on_exception: config.on_exception.clone(),
                        };
                        tokio::spawn(async move {
                            conn::serve_connection(stream, peer_addr, local_addr, router, conn_config, dates).await;
                        });
                    }
                    Err(e) => {
                        tracing::warn!("accept error: {}", e);
                    }
                }
            }
            _ = stop_rx.changed() => {
                break;
            }
        }
    }
}
