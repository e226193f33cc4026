//! Effects produced by state transitions

use crate::replies::Reply;
use crate::store::Mutation;

/// Effects to be executed after state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Change the user's habit list in memory
    Mutate(Mutation),

    /// Rewrite the habit file
    Persist,

    /// Send a reply to the user's chat
    Reply(Reply),
}

impl Effect {
    pub fn reply(reply: Reply) -> Self {
        Effect::Reply(reply)
    }

    pub fn mutate(mutation: Mutation) -> Self {
        Effect::Mutate(mutation)
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_mutation(&self) -> bool {
        matches!(self, Effect::Mutate(_))
    }
}
