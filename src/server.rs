//! Minimal HTTP/1.1 host for an [`Engine`].
//!
//! One request per connection: the request line, headers and a
//! `Content-Length` body are read, the chain runs on a blocking worker, and
//! the response is written with `Connection: close`.

use crate::app::Engine;
use crate::config::ServerConfig;
use crate::error::{panic_message, ServerError, ServerResult};
use crate::http::{Body, Method, Request, Response};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;

impl Engine {
    /// Starts the HTTP server on its own runtime and blocks forever.
    ///
    /// # Arguments
    /// * `addr` - Address to listen on (e.g. "127.0.0.1:3000")
    pub fn listen(self, addr: &str) -> ServerResult<()> {
        let runtime = Runtime::new()?;
        let listener = runtime.block_on(TcpListener::bind(addr))?;
        runtime.block_on(self.run(listener))
    }

    /// Serves connections from `listener` until an accept loop error that is
    /// not recoverable. Registration is over once this is called.
    pub async fn run(self, listener: TcpListener) -> ServerResult<()> {
        let local_addr = listener.local_addr()?;
        let max_connections = self.config.max_connections;
        let engine = Arc::new(self);
        let active = Arc::new(AtomicUsize::new(0));

        tracing::info!(addr = %local_addr, max_connections, "server listening");

        loop {
            let (mut stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    tracing::warn!(error = %err, "accept failed");
                    continue;
                }
            };

            if active.load(Ordering::Relaxed) >= max_connections {
                tracing::warn!(%peer, "max connections reached");
                tokio::spawn(async move {
                    let response = Response::error(&ServerError::TooManyConnections);
                    let _ = stream.write_all(&response.to_http_bytes()).await;
                });
                continue;
            }

            active.fetch_add(1, Ordering::Relaxed);
            let engine = Arc::clone(&engine);
            let active = Arc::clone(&active);
            tokio::spawn(async move {
                if let Err(err) = serve_connection(engine, stream).await {
                    tracing::debug!(%peer, error = %err, "connection error");
                }
                active.fetch_sub(1, Ordering::Relaxed);
            });
        }
    }
}

async fn serve_connection<S>(engine: Arc<Engine>, mut stream: S) -> ServerResult<()>
where
    S: tokio::io::AsyncRead + AsyncWrite + Unpin,
{
    let parsed = {
        let mut reader = BufReader::new(&mut stream);
        read_request(&mut reader, &engine.config).await
    };

    let request = match parsed {
        Ok(Some(request)) => request,
        Ok(None) => return Ok(()),
        Err(ServerError::Io(err)) => return Err(ServerError::Io(err)),
        Err(err) => {
            tracing::debug!(error = %err, "rejecting request");
            stream.write_all(&Response::error(&err).to_http_bytes()).await?;
            return Ok(());
        }
    };

    let response = match tokio::task::spawn_blocking(move || engine.handle(request)).await {
        Ok(response) => response,
        Err(err) => {
            let message = if err.is_panic() {
                panic_message(err.into_panic().as_ref())
            } else {
                err.to_string()
            };
            tracing::error!(panic = %message, "request worker failed");
            Response::error(&ServerError::Panic(message))
        }
    };

    stream.write_all(&response.to_http_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

/// Reads one request. `Ok(None)` means the peer closed before sending anything.
///
/// The request line and header lines share `max_header_bytes`; the body is
/// bounded by `max_body_bytes`.
pub(crate) async fn read_request<R>(reader: &mut R, config: &ServerConfig) -> ServerResult<Option<Request>>
where
    R: AsyncBufRead + Unpin,
{
    let mut budget = config.max_header_bytes;
    let mut request_line = String::new();
    read_header_line(reader, &mut request_line, &mut budget, config.max_header_bytes).await?;
    if request_line.trim().is_empty() {
        return Ok(None);
    }

    let mut parts = request_line.split_whitespace();
    let method: Method = parts
        .next()
        .ok_or_else(|| ServerError::BadRequest("invalid request line".to_string()))?
        .parse()?;
    let target = parts
        .next()
        .ok_or_else(|| ServerError::BadRequest("invalid request line".to_string()))?;
    if !target.starts_with('/') {
        return Err(ServerError::BadRequest(format!("unsupported request target `{target}`")));
    }

    let mut request = Request::from_target(method, target);
    loop {
        let mut line = String::new();
        if read_header_line(reader, &mut line, &mut budget, config.max_header_bytes).await? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            request.headers.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    if let Some(length) = request.headers.get("content-length") {
        let length: usize = length
            .parse()
            .map_err(|_| ServerError::BadRequest(format!("invalid content-length `{length}`")))?;
        if length > config.max_body_bytes {
            return Err(ServerError::PayloadTooLarge(length));
        }
        let mut data = vec![0; length];
        reader.read_exact(&mut data).await?;
        let content_type = request
            .headers
            .get("content-type")
            .cloned()
            .unwrap_or_default();
        request.body = Body::from_bytes(data).with_content_type(&content_type);
    }

    Ok(Some(request))
}

// Appends one line to `line` without letting it run past the remaining
// header budget.
async fn read_header_line<R>(reader: &mut R, line: &mut String, budget: &mut usize, limit: usize) -> ServerResult<usize>
where
    R: AsyncBufRead + Unpin,
{
    let cap = (*budget as u64).saturating_add(1);
    let mut buf = Vec::new();
    let read = (&mut *reader).take(cap).read_until(b'\n', &mut buf).await?;
    if read > *budget {
        return Err(ServerError::HeaderTooLarge(limit));
    }
    *budget -= read;
    let text = std::str::from_utf8(&buf)
        .map_err(|_| ServerError::BadRequest("request head is not valid UTF-8".to_string()))?;
    line.push_str(text);
    Ok(read)
}
