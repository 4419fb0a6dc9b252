//! HTTP/1.1 server loop.

use crate::{AlbumService, Request, Response, Result};
use http_body_util::BodyExt;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::{TcpListener, ToSocketAddrs};

/// Album HTTP server.
pub struct HttpServer {
    listener: TcpListener,
    service: Arc<AlbumService>,
}

impl HttpServer {
    /// Bind to address. Port 0 picks a free port; see [`HttpServer::local_addr`].
    pub async fn bind(addr: impl ToSocketAddrs, service: AlbumService) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            service: Arc::new(service),
        })
    }

    /// Get bound address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the process exits.
    pub async fn serve(self) -> Result<()> {
        self.serve_until(std::future::pending()).await
    }

    /// Serve until `shutdown` completes. Connections already accepted keep
    /// running on their own tasks.
    pub async fn serve_until(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tracing::info!(addr = %self.local_addr()?, "listening");
        tokio::pin!(shutdown);

        loop {
            let (stream, remote_addr) = tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                        continue;
                    }
                },
                () = &mut shutdown => {
                    tracing::info!("shutting down");
                    return Ok(());
                }
            };

            let io = TokioIo::new(stream);
            let service = Arc::clone(&self.service);

            tokio::spawn(async move {
                let handler = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                    let service = Arc::clone(&service);
                    async move {
                        let resp = handle_request(req, remote_addr, &service).await;
                        Ok::<_, Infallible>(resp.into_hyper())
                    }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, handler).await {
                    tracing::error!(remote = %remote_addr, error = %e, "connection error");
                }
            });
        }
    }
}

async fn handle_request(
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
    service: &AlbumService,
) -> Response {
    let start = Instant::now();
    let (parts, body) = req.into_parts();
    let method = parts.method.clone();
    let path = parts.uri.path().to_string();

    let resp = match body.collect().await {
        Ok(collected) => {
            let mut request = Request::new(parts.method, parts.uri, collected.to_bytes());
            request.set_remote_addr(remote_addr);
            service.handle(request).await
        }
        Err(e) => Response::error(http::StatusCode::BAD_REQUEST, &format!("unreadable body: {e}")),
    };

    tracing::info!(
        method = %method,
        path = %path,
        status = resp.status_code().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "request"
    );
    resp
}
