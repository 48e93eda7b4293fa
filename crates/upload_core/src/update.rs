use crate::state::Settlement;
use crate::{classify, parse_locators, AppState, Effect, ItemControls, ItemState, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::SubmitClicked { collection } => {
            let locators = parse_locators(state.input());
            if locators.is_empty() {
                return (state, Vec::new());
            }
            let collection = collection.filter(|value| !value.is_empty());

            let mut effects = Vec::with_capacity(locators.len() + 2);
            if state.set_trigger_enabled(false) {
                effects.push(Effect::SetTrigger { enabled: false });
            }
            let (batch_id, started) = state.open_batch(locators, collection.clone());
            // The buffer is free for the next batch while this one resolves.
            state.clear_input();
            effects.push(Effect::ClearInput);
            for (item_id, locator) in started {
                effects.push(Effect::DispatchUpload {
                    batch_id,
                    item_id,
                    locator,
                    collection: collection.clone(),
                });
            }
            effects
        }
        Msg::UploadSettled { item_id, reply } => {
            let classification = classify(&reply);
            let controls = match classification.state {
                ItemState::Succeeded => Some(ItemControls::EditForm),
                ItemState::Duplicate => Some(ItemControls::DuplicateConfirmation),
                _ => None,
            };
            match state.settle_item(item_id, classification) {
                Some(settlement) => settled_effects(&mut state, item_id, controls, settlement),
                None => Vec::new(),
            }
        }
    };

    (state, effects)
}

fn settled_effects(
    state: &mut AppState,
    item_id: crate::ItemId,
    controls: Option<ItemControls>,
    settlement: Settlement,
) -> Vec<Effect> {
    let mut effects = Vec::new();
    if let Some(controls) = controls {
        effects.push(Effect::AttachControls { item_id, controls });
    }
    if settlement.batch_settled {
        effects.push(Effect::BatchSettled {
            batch_id: settlement.batch_id,
        });
        if state.outstanding() == 0 && state.set_trigger_enabled(true) {
            effects.push(Effect::SetTrigger { enabled: true });
        }
    }
    effects
}
