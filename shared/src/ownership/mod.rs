mod control;
mod handlers;
mod messages;
mod outcome;
mod policy;

pub use handlers::install;
pub use messages::{
    ReleaseControl, ReleaseControlSuccess, TakeControl, TakeControlSuccess, TransferControl,
};
pub use outcome::{ControlOutcome, Refusal};
pub use policy::{DefaultOwnershipPolicy, OwnershipPolicy};
