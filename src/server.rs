//! HTTP listener with connection-level timeouts
//!
//! Every accepted connection is driven by hyper directly so the listener can
//! bound how long a client takes to send request headers and close
//! keep-alive connections that stay idle. On shutdown the listener stops
//! accepting, asks each open connection to finish its in-flight request and
//! waits for all of them to close.

use std::{
    future::Future,
    net::SocketAddr,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{extract::Request, Router};
use hyper::{body::Incoming, service::service_fn};
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::conn::auto,
};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::watch,
    task::JoinSet,
    time::{sleep, sleep_until, Instant},
};
use tower::ServiceExt;
use tracing::{debug, info, warn};

use crate::config::HttpServer;

/// Per-connection limits
#[derive(Debug, Clone, Copy)]
pub struct ConnectionTimeouts {
    /// Time allowed to receive a complete request head
    pub header_read: Duration,
    /// Time a connection may stay open with no request in flight
    pub idle: Duration,
}

impl From<&HttpServer> for ConnectionTimeouts {
    fn from(http: &HttpServer) -> Self {
        Self {
            header_read: http.timeout,
            idle: http.idle_timeout,
        }
    }
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, timeouts: ConnectionTimeouts, shutdown: F)
where
    F: Future<Output = ()>,
{
    let (stop_tx, stop_rx) = watch::channel(());
    let mut connections = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    connections.spawn(serve_connection(
                        stream,
                        peer,
                        app.clone(),
                        timeouts,
                        stop_rx.clone(),
                    ));
                }
                Err(err) => {
                    // accept errors are per-connection (EMFILE, ECONNABORTED)
                    warn!(error = %err, "failed to accept connection");
                    sleep(Duration::from_millis(100)).await;
                }
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    drop(listener);
    info!(open = connections.len(), "waiting for open connections to close");
    let _ = stop_tx.send(());
    while connections.join_next().await.is_some() {}
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    app: Router,
    timeouts: ConnectionTimeouts,
    mut stop: watch::Receiver<()>,
) {
    let activity = Arc::new(Activity::new());

    let service = {
        let activity = activity.clone();
        service_fn(move |request: Request<Incoming>| {
            let in_flight = activity.begin();
            let app = app.clone();
            async move {
                let response = app.oneshot(request).await;
                drop(in_flight);
                response
            }
        })
    };

    let mut builder = auto::Builder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(timeouts.header_read);

    let conn = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(err) = result {
                    debug!(%peer, error = %err, "connection closed with error");
                }
                return;
            }
            _ = sleep_until(activity.idle_deadline(timeouts.idle)) => {
                if activity.idle_deadline(timeouts.idle) <= Instant::now() {
                    debug!(%peer, "closing idle connection");
                    break;
                }
            }
            _ = stop.changed() => break,
        }
    }

    conn.as_mut().graceful_shutdown();
    if let Err(err) = conn.await {
        debug!(%peer, error = %err, "connection closed with error");
    }
}

/// Tracks in-flight requests and the last time one finished
struct Activity {
    opened: Instant,
    in_flight: AtomicUsize,
    last_millis: AtomicU64,
}

impl Activity {
    fn new() -> Self {
        Self {
            opened: Instant::now(),
            in_flight: AtomicUsize::new(0),
            last_millis: AtomicU64::new(0),
        }
    }

    fn begin(self: &Arc<Self>) -> InFlight {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlight(self.clone())
    }

    /// Instant at which the connection counts as idle; pushed forward while
    /// a request is in flight.
    fn idle_deadline(&self, idle: Duration) -> Instant {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            return Instant::now() + idle;
        }
        self.opened + Duration::from_millis(self.last_millis.load(Ordering::SeqCst)) + idle
    }
}

struct InFlight(Arc<Activity>);

impl Drop for InFlight {
    fn drop(&mut self) {
        let elapsed = self.0.opened.elapsed().as_millis() as u64;
        self.0.last_millis.store(elapsed, Ordering::SeqCst);
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
