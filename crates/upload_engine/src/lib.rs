//! Upload engine: request dispatch and transport-level outcome handling.
mod context;
mod engine;
mod submit;
mod types;

pub use context::{ContextError, SubmitContext, UploadSettings};
pub use engine::{dispatch_batch, EngineError, EngineHandle};
pub use submit::{EventSink, ReqwestUploader, Uploader};
pub use types::{
    EngineEvent, FailureKind, TransportFailure, UploadId, UploadRequest, UploadResponse,
};
