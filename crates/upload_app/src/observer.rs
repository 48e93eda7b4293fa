use std::sync::Arc;

use upload_core::{BatchId, ItemControls, ItemId};
use upload_logging::{upload_info, upload_warn};

use crate::{ControlAction, ControlHandler};

/// Hooks through which the embedding UI observes a session.
///
/// Callbacks run on whichever thread pumps the session, never while the
/// session's state lock is held.
pub trait SessionObserver: Send + Sync {
    fn trigger_changed(&self, _enabled: bool) {}

    fn input_cleared(&self) {}

    fn batch_settled(&self, _batch_id: BatchId) {}

    /// Builds the handler registered for `item_id` when its controls appear.
    fn controls_attached(&self, item_id: ItemId, controls: ItemControls) -> ControlHandler {
        Arc::new(move |action: ControlAction| {
            upload_warn!(
                "item {} ({:?}): no UI bound for {}",
                item_id,
                controls,
                action
            );
        })
    }
}

/// Observer that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl SessionObserver for LoggingObserver {
    fn trigger_changed(&self, enabled: bool) {
        upload_info!("trigger enabled={}", enabled);
    }

    fn batch_settled(&self, batch_id: BatchId) {
        upload_info!("batch {} settled", batch_id);
    }
}
