//! Upload core: pure batch state machine, classification and rendering.
mod classify;
mod effect;
mod input;
mod item;
mod msg;
mod render;
mod state;
mod update;
mod view_model;

pub use classify::{classify, Classification, ServerReply, ServerResponse, UNKNOWN_ERROR};
pub use effect::{Effect, ItemControls};
pub use input::parse_locators;
pub use item::{BatchId, DisplayPayload, ItemId, ItemState, UploadItem, UNKNOWN_STATUS};
pub use msg::Msg;
pub use render::{escape_html, render_item, render_list};
pub use state::{AppState, BatchState};
pub use update::update;
pub use view_model::{AppViewModel, BatchRowView, ItemRowView};
