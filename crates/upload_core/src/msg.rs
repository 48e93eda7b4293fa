#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the locator input box.
    InputChanged(String),
    /// User activated the trigger with the current input.
    SubmitClicked { collection: Option<String> },
    /// Transport delivered the outcome of one upload.
    UploadSettled {
        item_id: crate::ItemId,
        reply: crate::ServerReply,
    },
}
