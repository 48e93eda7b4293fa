use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;
use upload_core::{render_list, update, AppState, AppViewModel, ItemId, Msg};
use upload_engine::{
    ContextError, EngineError, EngineHandle, SubmitContext, UploadSettings, Uploader,
};
use upload_logging::upload_info;

use crate::runner::EffectRunner;
use crate::{ControlAction, HandlerError, HandlerRegistry, SessionObserver};

/// Longest single wait on the event channel, so `pump` on another thread is
/// never held off for the whole of a `wait_until_settled` timeout.
const WAIT_SLICE: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

/// One upload page: the batch state machine plus the engine serving it.
///
/// The session is `Sync`: one thread may submit while another pumps. Each
/// message is applied under the state lock, so settlements decrement the
/// outstanding counts one at a time. Effects run after the lock is released,
/// so observer callbacks from different threads may interleave.
pub struct UploadSession {
    state: Mutex<AppState>,
    handlers: Mutex<HandlerRegistry>,
    runner: EffectRunner,
}

impl UploadSession {
    pub fn new(
        settings: UploadSettings,
        observer: Arc<dyn SessionObserver>,
    ) -> Result<Self, SessionError> {
        let engine = EngineHandle::new(settings)?;
        Ok(Self::from_engine(engine, observer))
    }

    pub fn with_uploader(
        uploader: Arc<dyn Uploader>,
        observer: Arc<dyn SessionObserver>,
    ) -> Result<Self, SessionError> {
        let engine = EngineHandle::with_uploader(uploader)?;
        Ok(Self::from_engine(engine, observer))
    }

    fn from_engine(engine: EngineHandle, observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            state: Mutex::new(AppState::new()),
            handlers: Mutex::new(HandlerRegistry::new()),
            runner: EffectRunner::new(engine, observer),
        }
    }

    /// Mirrors the user typing into the locator box.
    pub fn set_input(&self, text: impl Into<String>) {
        self.dispatch_msg(Msg::InputChanged(text.into()), None);
    }

    /// Submits every non-blank line of `raw_text` as one batch.
    ///
    /// Returns as soon as the uploads are queued. Blank input is a no-op.
    pub fn submit_batch(&self, raw_text: &str, context: &SubmitContext) -> Result<(), SessionError> {
        context.validate()?;
        self.dispatch_msg(Msg::InputChanged(raw_text.to_string()), None);
        self.dispatch_msg(
            Msg::SubmitClicked {
                collection: context.collection().map(ToOwned::to_owned),
            },
            Some(context),
        );
        Ok(())
    }

    /// Applies every settlement already reported by the engine.
    pub fn pump(&self) -> usize {
        let mut applied = 0;
        while let Some(msg) = self.runner.try_next() {
            self.dispatch_msg(msg, None);
            applied += 1;
        }
        applied
    }

    /// Blocks until no item is outstanding or `timeout` elapses.
    pub fn wait_until_settled(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if self.lock_state().outstanding() == 0 {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            if let Some(msg) = self.runner.next_within(remaining.min(WAIT_SLICE)) {
                self.dispatch_msg(msg, None);
            }
        }
    }

    pub fn view(&self) -> AppViewModel {
        self.lock_state().view()
    }

    /// Markup for the whole upload list.
    pub fn render(&self) -> String {
        render_list(&self.view())
    }

    /// Runs the control handler registered for `item_id`.
    pub fn activate(&self, item_id: ItemId, action: ControlAction) -> Result<(), SessionError> {
        let handler = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(item_id, action)?;
        upload_info!("item_id={} activating {}", item_id, action);
        handler(action);
        Ok(())
    }

    fn dispatch_msg(&self, msg: Msg, context: Option<&SubmitContext>) {
        let mut pending = vec![msg];
        while let Some(msg) = pending.pop() {
            let effects = {
                let mut guard = self.lock_state();
                let state = std::mem::take(&mut *guard);
                let (state, effects) = update(state, msg);
                *guard = state;
                effects
            };
            pending.extend(self.runner.run(effects, context, &self.handlers));
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
