use std::{io, mem, sync::Arc, time::Duration};

use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpListener,
    task, time,
};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

use super::{Request, Response};
use crate::{
    artifacts::{ArtifactKind, ArtifactStore},
    error::PredictionError,
    pipeline::InferencePipeline,
    query::HouseQuery,
};

/// Answers requests against the artifacts held by a store.
#[derive(Debug)]
pub struct Service {
    store: Arc<ArtifactStore>,
    pipeline: InferencePipeline,
    timeout: Option<Duration>,
}

impl Service {
    /// Creates a new `Service`.
    ///
    /// # Arguments
    /// * `store` - The store holding the artifacts.
    /// * `timeout` - An optional upper bound for a single prediction.
    pub fn new(store: Arc<ArtifactStore>, timeout: Option<Duration>) -> Self {
        Self {
            store,
            pipeline: InferencePipeline::new(),
            timeout,
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::Predict(query) => self.predict(query).await,
            Request::Locations => match self.store.current().encoder() {
                Some(encoder) => Response::Locations(encoder.categories().to_vec()),
                None => PredictionError::Configuration {
                    missing: vec![ArtifactKind::Encoder],
                }
                .into(),
            },
            Request::Status => Response::Status(self.store.current().report().clone()),
            Request::Reload => {
                let store = Arc::clone(&self.store);
                match task::spawn_blocking(move || store.reload()).await {
                    Ok(bundle) => Response::Status(bundle.report().clone()),
                    Err(e) => {
                        error!("artifact reload panicked: {e}");
                        Response::Error {
                            kind: "reload_error",
                            message: "the artifacts could not be reloaded".to_string(),
                        }
                    }
                }
            }
        }
    }

    /// Runs the pipeline on the blocking pool, against a snapshot of the current bundle.
    async fn predict(&self, query: HouseQuery) -> Response {
        let bundle = self.store.current();
        let pipeline = self.pipeline;
        let prediction = task::spawn_blocking(move || pipeline.predict(&query, &bundle));

        let joined = match self.timeout {
            Some(limit) => match time::timeout(limit, prediction).await {
                Ok(joined) => joined,
                Err(_) => {
                    error!("prediction timed out after {limit:?}");
                    return PredictionError::Inference(format!("timed out after {limit:?}")).into();
                }
            },
            None => prediction.await,
        };

        match joined {
            Ok(Ok(price)) => price.into(),
            Ok(Err(e)) => e.into(),
            Err(e) => {
                error!("prediction task failed: {e}");
                PredictionError::Inference(e.to_string()).into()
            }
        }
    }
}

/// Accepts connections forever, serving each one on its own task.
pub async fn serve(listener: TcpListener, service: Arc<Service>) -> io::Result<()> {
    info!("listening at {}", listener.local_addr()?);

    loop {
        let (stream, addr) = listener.accept().await?;
        info!("client connected from {addr}");

        let service = Arc::clone(&service);
        tokio::spawn(async move {
            let (rx, tx) = stream.into_split();
            if let Err(e) = handle_connection(&service, rx, tx).await {
                warn!("connection with {addr} failed: {e}");
            }
            info!("client {addr} disconnected");
        });
    }
}

/// The longest request line accepted, in bytes.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Answers every request line read from `rx` with a response line written to `tx`.
///
/// Malformed or oversized lines get a `bad_request` answer and don't close the connection.
pub async fn handle_connection<R, W>(service: &Service, rx: R, tx: W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = FramedRead::new(rx, LinesCodec::new_with_max_length(MAX_LINE_LEN));
    let mut tx = FramedWrite::new(tx, LinesCodec::new());

    // After a decoding error the stream yields `None` once, then resumes reading with the codec
    // still discarding the rest of the oversized line.
    let mut resume = false;

    loop {
        let Some(line) = lines.next().await else {
            if mem::take(&mut resume) {
                continue;
            }
            break;
        };

        let response = match line {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => match serde_json::from_str::<Request>(&line) {
                Ok(request) => {
                    debug!("handling {request:?}");
                    service.handle(request).await
                }
                Err(e) => {
                    warn!("malformed request: {e}");
                    Response::bad_request(format!("malformed request: {e}"))
                }
            },
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                resume = true;
                warn!("request line longer than {MAX_LINE_LEN} bytes");
                Response::bad_request(format!("request lines are limited to {MAX_LINE_LEN} bytes"))
            }
            Err(LinesCodecError::Io(e)) => return Err(e),
        };

        tx.send(serde_json::to_string(&response)?)
            .await
            .map_err(codec_error)?;
    }

    Ok(())
}

fn codec_error(e: LinesCodecError) -> io::Error {
    match e {
        LinesCodecError::Io(e) => e,
        e => io::Error::other(e),
    }
}
