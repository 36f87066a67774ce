use std::future::Future;
use std::io;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use rustls::ServerConfig;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

/// Plain HTTP until Ctrl-C.
pub async fn serve_http(listener: TcpListener, app: Router) -> Result<()> {
    info!("[http] listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// HTTPS until Ctrl-C.
pub async fn serve_https(listener: TcpListener, app: Router, tls: Arc<ServerConfig>) -> Result<()> {
    info!("[https] listening on {}", listener.local_addr()?);

    let acceptor = TlsAcceptor::from(tls);
    serve_connections(
        listener,
        app,
        move |stream| {
            let acceptor = acceptor.clone();
            async move { acceptor.accept(stream).await }
        },
        shutdown_signal(),
    )
    .await
}

/// Accept loop with one task per connection. `handshake` turns the raw TCP
/// stream into the transport (TLS); a failed handshake only affects that
/// connection. Once `shutdown` resolves no new connections are accepted,
/// open ones finish their in-flight requests, and the call returns after the
/// last one closes.
async fn serve_connections<H, Fut, S>(
    listener: TcpListener,
    app: Router,
    handshake: H,
    shutdown: impl Future<Output = ()>,
) -> Result<()>
where
    H: Fn(TcpStream) -> Fut,
    Fut: Future<Output = io::Result<S>> + Send + 'static,
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut connections = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    continue;
                }
            },
            _ = &mut shutdown => break,
        };

        // reap finished connections
        while connections.try_join_next().is_some() {}

        let handshake = handshake(stream);
        let app = app.clone();
        let mut stop_rx = stop_rx.clone();

        connections.spawn(async move {
            let stream = match handshake.await {
                Ok(s) => s,
                Err(e) => {
                    debug!("TLS handshake with {} failed: {}", peer, e);
                    return;
                }
            };

            let builder = auto::Builder::new(TokioExecutor::new());
            let conn = builder.serve_connection(TokioIo::new(stream), TowerToHyperService::new(app));
            tokio::pin!(conn);

            let result = tokio::select! {
                res = conn.as_mut() => res,
                _ = stop_rx.changed() => {
                    conn.as_mut().graceful_shutdown();
                    conn.await
                }
            };

            if let Err(err) = result {
                warn!("Error serving connection from {}: {:?}", peer, err);
            }
        });
    }

    info!("Waiting for {} open connections to finish", connections.len());
    let _ = stop_tx.send(true);
    while connections.join_next().await.is_some() {}

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
