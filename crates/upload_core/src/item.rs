use std::fmt;

use crate::Classification;

pub type BatchId = u64;
pub type ItemId = u64;

/// Placeholder shown when the transport did not report a status code or text.
pub const UNKNOWN_STATUS: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemState {
    #[default]
    Pending,
    InFlight,
    Succeeded,
    Duplicate,
    Failed,
    NetworkError,
}

impl ItemState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ItemState::Succeeded
                | ItemState::Duplicate
                | ItemState::Failed
                | ItemState::NetworkError
        )
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemState::Pending => write!(f, "pending"),
            ItemState::InFlight => write!(f, "in flight"),
            ItemState::Succeeded => write!(f, "succeeded"),
            ItemState::Duplicate => write!(f, "duplicate"),
            ItemState::Failed => write!(f, "failed"),
            ItemState::NetworkError => write!(f, "network error"),
        }
    }
}

/// Content surfaced for an item once it has been classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayPayload {
    /// Server-rendered markup (edit form or duplicate confirmation).
    Markup(String),
    /// Plain text error message from the endpoint.
    Message(String),
    /// Transport status; absent values already replaced by [`UNKNOWN_STATUS`].
    TransportStatus { code: String, text: String },
}

/// Per-locator record owned by the batch that created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    pub id: ItemId,
    pub batch_id: BatchId,
    pub locator: String,
    state: ItemState,
    settled: bool,
    payload: Option<DisplayPayload>,
}

impl UploadItem {
    pub fn new(id: ItemId, batch_id: BatchId, locator: impl Into<String>) -> Self {
        Self {
            id,
            batch_id,
            locator: locator.into(),
            state: ItemState::Pending,
            settled: false,
            payload: None,
        }
    }

    pub fn state(&self) -> ItemState {
        self.state
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn payload(&self) -> Option<&DisplayPayload> {
        self.payload.as_ref()
    }

    /// `Pending -> InFlight`. Returns false for any other source state.
    pub(crate) fn start(&mut self) -> bool {
        if self.state != ItemState::Pending {
            return false;
        }
        self.state = ItemState::InFlight;
        true
    }

    /// `InFlight -> terminal`. Classification is final: returns false and
    /// leaves the item untouched unless it is currently in flight.
    pub(crate) fn settle(&mut self, classification: Classification) -> bool {
        if self.state != ItemState::InFlight || !classification.state.is_terminal() {
            return false;
        }
        self.state = classification.state;
        self.payload = Some(classification.payload);
        self.settled = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(message: &str) -> Classification {
        Classification {
            state: ItemState::Failed,
            payload: DisplayPayload::Message(message.to_string()),
        }
    }

    #[test]
    fn settle_requires_in_flight() {
        let mut item = UploadItem::new(1, 1, "http://a");
        assert!(!item.settle(failed("early")));
        assert_eq!(item.state(), ItemState::Pending);
        assert!(!item.is_settled());

        assert!(item.start());
        assert!(item.settle(failed("bad url")));
        assert_eq!(item.state(), ItemState::Failed);
        assert!(item.is_settled());
    }

    #[test]
    fn terminal_state_is_final() {
        let mut item = UploadItem::new(1, 1, "http://a");
        item.start();
        item.settle(failed("first"));

        assert!(!item.start());
        assert!(!item.settle(failed("second")));
        assert_eq!(
            item.payload(),
            Some(&DisplayPayload::Message("first".to_string()))
        );
    }

    #[test]
    fn non_terminal_classification_is_rejected() {
        let mut item = UploadItem::new(1, 1, "http://a");
        item.start();
        let bogus = Classification {
            state: ItemState::InFlight,
            payload: DisplayPayload::Message(String::new()),
        };
        assert!(!item.settle(bogus));
        assert!(!item.is_settled());
    }
}
