pub mod lifecycle;
pub mod presence;

use crate::models::event::DriverEvent;
use crate::state::AppState;

/// Append to the audit log and fan out to websocket subscribers. The
/// log write and the triggering document write are independent; a crash
/// between them loses only diagnostic data.
pub fn append_event(state: &AppState, event: DriverEvent) {
    state.events.insert(event.id, event.clone());
    let _ = state.events_tx.send(event);
}
