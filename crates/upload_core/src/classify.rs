use crate::{DisplayPayload, ItemState, UNKNOWN_STATUS};

/// Fallback text for an application failure that carries no message.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Loosely-typed reply body as delivered by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerResponse {
    pub success: bool,
    pub duplicate: bool,
    pub confirm_duplicate_markup: String,
    pub form_markup: String,
    pub error_message: Option<String>,
}

/// Validated outcome of one upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerReply {
    ApplicationSuccess { duplicate: bool, payload: String },
    ApplicationFailure { message: Option<String> },
    TransportFailure {
        status: Option<u16>,
        status_text: Option<String>,
    },
}

impl ServerReply {
    pub fn transport(status: Option<u16>, status_text: Option<String>) -> Self {
        ServerReply::TransportFailure {
            status,
            status_text,
        }
    }
}

impl From<ServerResponse> for ServerReply {
    fn from(response: ServerResponse) -> Self {
        if !response.success {
            return ServerReply::ApplicationFailure {
                message: response.error_message,
            };
        }
        let payload = if response.duplicate {
            response.confirm_duplicate_markup
        } else {
            response.form_markup
        };
        ServerReply::ApplicationSuccess {
            duplicate: response.duplicate,
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub state: ItemState,
    pub payload: DisplayPayload,
}

/// Maps a reply to exactly one terminal state and its display payload.
pub fn classify(reply: &ServerReply) -> Classification {
    match reply {
        ServerReply::ApplicationSuccess { duplicate, payload } => Classification {
            state: if *duplicate {
                ItemState::Duplicate
            } else {
                ItemState::Succeeded
            },
            payload: DisplayPayload::Markup(payload.clone()),
        },
        ServerReply::ApplicationFailure { message } => {
            let text = message
                .as_deref()
                .filter(|message| !message.is_empty())
                .unwrap_or(UNKNOWN_ERROR);
            Classification {
                state: ItemState::Failed,
                payload: DisplayPayload::Message(text.to_string()),
            }
        }
        ServerReply::TransportFailure {
            status,
            status_text,
        } => Classification {
            state: ItemState::NetworkError,
            payload: DisplayPayload::TransportStatus {
                code: status
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
                text: status_text
                    .as_deref()
                    .filter(|text| !text.is_empty())
                    .unwrap_or(UNKNOWN_STATUS)
                    .to_string(),
            },
        },
    }
}
