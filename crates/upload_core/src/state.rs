use std::collections::BTreeMap;

use crate::view_model::{AppViewModel, BatchRowView, ItemRowView};
use crate::{BatchId, Classification, ItemId, UploadItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchState {
    pub id: BatchId,
    pub collection: Option<String>,
    pub item_ids: Vec<ItemId>,
    outstanding: usize,
}

impl BatchState {
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn is_settled(&self) -> bool {
        self.outstanding == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    input: String,
    trigger_enabled: bool,
    next_batch_id: BatchId,
    next_item_id: ItemId,
    batches: BTreeMap<BatchId, BatchState>,
    items: BTreeMap<ItemId, UploadItem>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            input: String::new(),
            trigger_enabled: true,
            next_batch_id: 1,
            next_item_id: 1,
            batches: BTreeMap::new(),
            items: BTreeMap::new(),
            dirty: false,
        }
    }
}

/// Result of applying one settlement to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Settlement {
    pub batch_id: BatchId,
    pub batch_settled: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn trigger_enabled(&self) -> bool {
        self.trigger_enabled
    }

    /// Items not yet settled, across every batch.
    pub fn outstanding(&self) -> usize {
        self.batches.values().map(BatchState::outstanding).sum()
    }

    pub fn batch(&self, batch_id: BatchId) -> Option<&BatchState> {
        self.batches.get(&batch_id)
    }

    pub fn item(&self, item_id: ItemId) -> Option<&UploadItem> {
        self.items.get(&item_id)
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            input: self.input.clone(),
            trigger_enabled: self.trigger_enabled,
            outstanding: self.outstanding(),
            batches: self
                .batches
                .values()
                .map(|batch| BatchRowView {
                    batch_id: batch.id,
                    collection: batch.collection.clone(),
                    item_count: batch.item_ids.len(),
                    outstanding: batch.outstanding,
                })
                .collect(),
            items: self.items.values().map(ItemRowView::from).collect(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn set_input(&mut self, input: String) {
        if self.input != input {
            self.input = input;
            self.mark_dirty();
        }
    }

    pub(crate) fn clear_input(&mut self) {
        self.set_input(String::new());
    }

    /// Returns true if the flag changed.
    pub(crate) fn set_trigger_enabled(&mut self, enabled: bool) -> bool {
        if self.trigger_enabled == enabled {
            return false;
        }
        self.trigger_enabled = enabled;
        self.mark_dirty();
        true
    }

    /// Creates a batch with one in-flight item per locator.
    pub(crate) fn open_batch(
        &mut self,
        locators: Vec<String>,
        collection: Option<String>,
    ) -> (BatchId, Vec<(ItemId, String)>) {
        let batch_id = self.next_batch_id;
        self.next_batch_id += 1;

        let mut item_ids = Vec::with_capacity(locators.len());
        let mut started = Vec::with_capacity(locators.len());
        for locator in locators {
            let item_id = self.next_item_id;
            self.next_item_id += 1;
            let mut item = UploadItem::new(item_id, batch_id, locator.clone());
            item.start();
            self.items.insert(item_id, item);
            item_ids.push(item_id);
            started.push((item_id, locator));
        }

        self.batches.insert(
            batch_id,
            BatchState {
                id: batch_id,
                collection,
                outstanding: item_ids.len(),
                item_ids,
            },
        );
        self.mark_dirty();
        (batch_id, started)
    }

    /// Applies a classification to an in-flight item and decrements its batch.
    /// Returns `None` for unknown or already-settled items.
    pub(crate) fn settle_item(
        &mut self,
        item_id: ItemId,
        classification: Classification,
    ) -> Option<Settlement> {
        let item = self.items.get_mut(&item_id)?;
        if !item.settle(classification) {
            return None;
        }
        let batch_id = item.batch_id;
        let batch = self.batches.get_mut(&batch_id)?;
        batch.outstanding = batch.outstanding.checked_sub(1)?;
        let batch_settled = batch.outstanding == 0;
        self.mark_dirty();
        Some(Settlement {
            batch_id,
            batch_settled,
        })
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
