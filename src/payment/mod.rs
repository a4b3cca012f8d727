//! Payment settlement tracking.

pub mod poller;

pub use poller::{PaymentPoller, PaymentStatusSource, PollEvent, PollHandle, PollOutcome, PollPolicy};
