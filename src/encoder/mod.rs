//! Supervision of the external screen encoder.

mod status;
mod supervisor;

pub use status::{EncoderState, EncoderStatus, ExitReason};
pub use supervisor::{EncoderSupervisor, SupervisorHandle};
