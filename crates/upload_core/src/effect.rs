use crate::{BatchId, ItemId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Enable or disable the submit trigger.
    SetTrigger { enabled: bool },
    /// Clear the raw locator input buffer.
    ClearInput,
    DispatchUpload {
        batch_id: BatchId,
        item_id: ItemId,
        locator: String,
        collection: Option<String>,
    },
    /// Register handlers for the controls carried by an item's payload.
    AttachControls {
        item_id: ItemId,
        controls: ItemControls,
    },
    /// Every item of the batch has settled.
    BatchSettled { batch_id: BatchId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemControls {
    EditForm,
    DuplicateConfirmation,
}
