pub mod command;
pub mod cpu;
pub mod delta;
pub mod error;
pub mod history;
pub mod memory;
pub mod network;
pub mod publish;
pub mod sampler;
pub mod scheduler;
pub mod snapshot;
