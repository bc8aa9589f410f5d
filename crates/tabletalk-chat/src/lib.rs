//! Tabletalk chat crate - conversational query resolution.
//!
//! Each utterance is either resolved deterministically against the previous
//! result ([`followup`]) or translated to SQL by the language model
//! ([`synthesizer`]) and run through the gated [`executor`]. The
//! [`orchestrator`] drives one turn at a time and owns the bounded
//! [`memory`].

pub mod error;
pub mod executor;
pub mod followup;
pub mod memory;
pub mod orchestrator;
pub mod render;
pub mod synthesizer;

pub use error::ChatError;
pub use executor::QueryExecutor;
pub use followup::{FollowUpResolver, Resolution, Transform};
pub use memory::{BoundedLog, ConversationMemory, Turn};
pub use orchestrator::{TurnOrchestrator, TurnOutcome};
pub use render::render_frame;
pub use synthesizer::QuerySynthesizer;
