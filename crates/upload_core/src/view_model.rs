use crate::{BatchId, DisplayPayload, ItemId, ItemState, UploadItem};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub input: String,
    pub trigger_enabled: bool,
    pub outstanding: usize,
    pub batches: Vec<BatchRowView>,
    pub items: Vec<ItemRowView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRowView {
    pub batch_id: BatchId,
    pub collection: Option<String>,
    pub item_count: usize,
    pub outstanding: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRowView {
    pub item_id: ItemId,
    pub batch_id: BatchId,
    pub locator: String,
    pub state: ItemState,
    pub settled: bool,
    pub payload: Option<DisplayPayload>,
}

impl From<&UploadItem> for ItemRowView {
    fn from(item: &UploadItem) -> Self {
        Self {
            item_id: item.id,
            batch_id: item.batch_id,
            locator: item.locator.clone(),
            state: item.state(),
            settled: item.is_settled(),
            payload: item.payload().cloned(),
        }
    }
}
