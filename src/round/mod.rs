pub mod clock;
pub mod machine;
pub mod sampler;
pub mod service;

pub use clock::ServerClock;
pub use machine::{Advance, MachineConfig, Settlement};
pub use service::{RoundService, RoundSnapshot};
