//! Per-identity conversation state.
//!
//! Two independent tables keyed by [`Identity`](reelsmith_common::Identity):
//! the [`QuotaGuard`] sliding-window records and the [`SessionStore`] of open
//! conversations. Conversation logic itself is the pure
//! [`transition`](transition::transition) function.

pub mod error;
pub mod phase;
pub mod quota;
pub mod store;
pub mod time;
pub mod transition;

pub use {
    error::{FailureKind, InputError},
    phase::{OperationKind, Parameters, Phase, TrimEnd},
    quota::{Admission, QuotaGuard, QuotaPolicy},
    store::{Applied, Session, SessionStore},
    time::{EndPreset, parse_end, parse_time},
    transition::{Effect, Event, Prompt, Transition, transition},
};
