use crate::SharedResult;
use anyhow::Result;
use bytes::Bytes;
use hyper::{body::Incoming, http, service::service_fn, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info, instrument, warn};

type Body = http_body_util::Full<Bytes>;

/// Serves the latest analysis result over HTTP.
#[derive(Clone)]
pub(crate) struct Api {
    result: SharedResult,
}

// === impl Api ===

impl Api {
    pub(crate) fn new(result: SharedResult) -> Self {
        Self { result }
    }

    #[instrument(skip_all, fields(port = %addr.port()))]
    pub(crate) async fn serve(self, addr: SocketAddr, drain: drain::Watch) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "Analysis API listening");

        loop {
            tokio::select! {
                res = listener.accept() => {
                    let (stream, client) = res?;
                    let api = self.clone();
                    let drain = drain.clone();
                    tokio::spawn(async move {
                        let conn = hyper::server::conn::http1::Builder::new().serve_connection(
                            TokioIo::new(stream),
                            service_fn(move |req| {
                                let api = api.clone();
                                async move { api.handle(req) }
                            }),
                        );
                        tokio::pin!(conn);

                        let res = tokio::select! {
                            res = &mut conn => res,
                            _ = drain.signaled() => {
                                conn.as_mut().graceful_shutdown();
                                conn.await
                            }
                        };
                        if let Err(error) = res {
                            debug!(%error, %client, "Connection closed");
                        }
                    });
                }

                _ = drain.clone().signaled() => {
                    debug!("Shutdown signaled");
                    return Ok(());
                }
            }
        }
    }

    fn handle(&self, req: Request<Incoming>) -> http::Result<Response<Body>> {
        if req.method() != http::Method::GET || req.uri().path() != "/api/analysisResults" {
            return Response::builder()
                .status(http::StatusCode::NOT_FOUND)
                .body(Body::default());
        }

        // Hold the read lock only long enough to clone the handle.
        let result = self.result.read().clone();
        match serde_json::to_vec(&*result) {
            Ok(json) => Response::builder()
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::new(Bytes::from(json))),
            Err(error) => {
                warn!(%error, "Failed to encode analysis results");
                Response::builder()
                    .status(http::StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Body::default())
            }
        }
    }
}
