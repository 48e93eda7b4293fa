use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use futures_util::future::join_all;
use thiserror::Error;
use upload_logging::{upload_debug, upload_info, upload_warn};

use crate::submit::ChannelEventSink;
use crate::{
    EngineEvent, EventSink, FailureKind, ReqwestUploader, TransportFailure, UploadId,
    UploadRequest, UploadSettings, Uploader,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

enum EngineCommand {
    UploadBatch {
        requests: Vec<(UploadId, UploadRequest)>,
    },
}

/// Background dispatcher: each enqueued batch is joined on its own task, and
/// every upload reports back on the event channel as soon as it settles.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
    event_rx: Mutex<mpsc::Receiver<EngineEvent>>,
}

impl EngineHandle {
    pub fn new(settings: UploadSettings) -> Result<Self, EngineError> {
        let uploader = ReqwestUploader::new(&settings)?;
        Self::with_uploader(Arc::new(uploader))
    }

    pub fn with_uploader(uploader: Arc<dyn Uploader>) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;

        let worker_tx = event_tx.clone();
        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let uploader = uploader.clone();
                let event_tx = worker_tx.clone();
                runtime.spawn(async move {
                    handle_command(uploader.as_ref(), command, event_tx).await;
                });
            }
            // Let in-flight uploads report before the runtime goes away.
            runtime.shutdown_timeout(Duration::from_secs(1));
        });

        Ok(Self::from_channels(cmd_tx, event_tx, event_rx))
    }

    fn from_channels(
        cmd_tx: mpsc::Sender<EngineCommand>,
        event_tx: mpsc::Sender<EngineEvent>,
        event_rx: mpsc::Receiver<EngineEvent>,
    ) -> Self {
        Self {
            cmd_tx,
            event_tx,
            event_rx: Mutex::new(event_rx),
        }
    }

    /// Queues a batch of uploads. If the worker has stopped, every upload is
    /// reported as a failed transport so that no item waits forever.
    pub fn enqueue_batch(&self, requests: Vec<(UploadId, UploadRequest)>) {
        if requests.is_empty() {
            return;
        }
        if let Err(mpsc::SendError(EngineCommand::UploadBatch { requests })) = self
            .cmd_tx
            .send(EngineCommand::UploadBatch { requests })
        {
            upload_warn!("engine stopped; failing {} uploads", requests.len());
            let sink = ChannelEventSink::new(self.event_tx.clone());
            for (upload_id, _) in requests {
                sink.emit(EngineEvent::UploadCompleted {
                    upload_id,
                    result: Err(TransportFailure::new(
                        FailureKind::EngineStopped,
                        "upload worker is not running",
                    )),
                });
            }
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.lock_events().try_recv().ok()
    }

    /// Waits up to `timeout` for the next event. Other callers block on the
    /// receiver for as long as this waits, so keep `timeout` short.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.lock_events().recv_timeout(timeout).ok()
    }

    fn lock_events(&self) -> MutexGuard<'_, mpsc::Receiver<EngineEvent>> {
        self.event_rx.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn handle_command(
    uploader: &dyn Uploader,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::UploadBatch { requests } => {
            let sink = ChannelEventSink::new(event_tx);
            dispatch_batch(uploader, requests, &sink).await;
        }
    }
}

async fn settle_one(
    uploader: &dyn Uploader,
    upload_id: UploadId,
    request: &UploadRequest,
    sink: &dyn EventSink,
) {
    let result = uploader.upload(upload_id, request).await;
    match &result {
        Ok(response) => upload_debug!(
            "upload_id={} delivered success={} duplicate={}",
            upload_id,
            response.success,
            response.duplicate
        ),
        Err(failure) => upload_warn!("upload_id={} failed: {}", upload_id, failure),
    }
    sink.emit(EngineEvent::UploadCompleted { upload_id, result });
}

/// Uploads every request concurrently and returns once all have settled.
///
/// Each outcome reaches `sink` as soon as its own request finishes; no
/// request waits on another.
pub async fn dispatch_batch(
    uploader: &dyn Uploader,
    requests: Vec<(UploadId, UploadRequest)>,
    sink: &dyn EventSink,
) {
    let count = requests.len();
    upload_info!("dispatching {} uploads", count);
    join_all(
        requests
            .iter()
            .map(|(upload_id, request)| settle_one(uploader, *upload_id, request, sink)),
    )
    .await;
    upload_info!("all {} uploads settled", count);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(locator: &str) -> UploadRequest {
        UploadRequest {
            endpoint: "http://host/upload/".to_string(),
            locator: locator.to_string(),
            csrf_token: "tok".to_string(),
            collection: None,
        }
    }

    #[test]
    fn stopped_worker_fails_every_queued_upload() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        drop(cmd_rx);
        let (event_tx, event_rx) = mpsc::channel();
        let engine = EngineHandle::from_channels(cmd_tx, event_tx, event_rx);

        engine.enqueue_batch(vec![(1, request("http://a")), (2, request("http://b"))]);

        let mut failed = Vec::new();
        while let Some(EngineEvent::UploadCompleted { upload_id, result }) = engine.try_recv() {
            let failure = result.unwrap_err();
            assert_eq!(failure.kind, FailureKind::EngineStopped);
            assert_eq!(failure.status, None);
            failed.push(upload_id);
        }
        assert_eq!(failed, vec![1, 2]);
    }

    #[test]
    fn empty_batch_is_not_sent() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let engine = EngineHandle::from_channels(cmd_tx, event_tx, event_rx);

        engine.enqueue_batch(Vec::new());

        assert!(cmd_rx.try_recv().is_err());
        assert!(engine.try_recv().is_none());
    }

    #[test]
    fn handle_is_shareable_across_threads() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<EngineHandle>();
    }
}
