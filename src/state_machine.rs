//! Per-user conversation state machine
//!
//! Elm-style: a pure `transition` maps (state, context, event) to the next
//! state plus effects; the runtime performs the effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::{Action, Event, Inbound};
pub use state::{ConvContext, ConvState};
pub use transition::{transition, TransitionError, TransitionResult};
