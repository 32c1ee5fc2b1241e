//! ripcomp-controller: Request gating, search process lifecycle, and the
//! invocation log.

pub mod controller;
pub mod gate;
pub mod invocation;
pub mod process;
pub mod request;

pub use controller::{SearchController, Session};
pub use gate::GateDecision;
pub use invocation::{
    Descriptor, Invocation, InvocationLog, InvocationStatus, Outcome, SkipReason,
};
pub use process::{ProcessEvent, RunningProcess};
pub use request::SearchRequest;
