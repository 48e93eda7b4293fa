use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use upload_core::{ItemControls, ItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Save the edit form of a freshly uploaded resource.
    SaveForm,
    /// Delete a freshly uploaded resource.
    DeleteUpload,
    /// Keep the upload although the endpoint flagged it as a duplicate.
    ConfirmDuplicate,
    /// Discard the upload in favour of the existing resource.
    CancelDuplicate,
}

impl ControlAction {
    pub fn is_available(self, controls: ItemControls) -> bool {
        match controls {
            ItemControls::EditForm => {
                matches!(self, ControlAction::SaveForm | ControlAction::DeleteUpload)
            }
            ItemControls::DuplicateConfirmation => matches!(
                self,
                ControlAction::ConfirmDuplicate | ControlAction::CancelDuplicate
            ),
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlAction::SaveForm => write!(f, "save form"),
            ControlAction::DeleteUpload => write!(f, "delete upload"),
            ControlAction::ConfirmDuplicate => write!(f, "confirm duplicate"),
            ControlAction::CancelDuplicate => write!(f, "cancel duplicate"),
        }
    }
}

pub type ControlHandler = Arc<dyn Fn(ControlAction) + Send + Sync>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("no controls registered for item {0}")]
    NoHandler(ItemId),
    #[error("{action} is not available on item {item_id} ({controls:?})")]
    ActionNotAvailable {
        item_id: ItemId,
        action: ControlAction,
        controls: ItemControls,
    },
}

struct Registration {
    controls: ItemControls,
    handler: ControlHandler,
}

/// Control handlers keyed by the item whose payload carries the controls.
#[derive(Default)]
pub struct HandlerRegistry {
    entries: HashMap<ItemId, Registration>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for `item_id`, replacing any earlier one.
    pub fn register(&mut self, item_id: ItemId, controls: ItemControls, handler: ControlHandler) {
        self.entries
            .insert(item_id, Registration { controls, handler });
    }

    /// Resolves the handler to invoke; the caller runs it outside any lock.
    pub fn resolve(
        &self,
        item_id: ItemId,
        action: ControlAction,
    ) -> Result<ControlHandler, HandlerError> {
        let entry = self
            .entries
            .get(&item_id)
            .ok_or(HandlerError::NoHandler(item_id))?;
        if !action.is_available(entry.controls) {
            return Err(HandlerError::ActionNotAvailable {
                item_id,
                action,
                controls: entry.controls,
            });
        }
        Ok(entry.handler.clone())
    }
}
