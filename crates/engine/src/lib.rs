// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! botfarm assignment engine: waiter registry, assignment loop, and the
//! job assigner facade bot session handlers use.

mod assigner;
mod assignment;
mod config;
pub mod env;
mod error;
mod registry;
mod signal;
mod task;

pub use assigner::{JobAssigner, WaitGuard};
pub use assignment::{
    AssignmentLoop, LoopStats, PassReport, PolicyPicker, RandomPolicyPicker, SelectionPolicy,
};
pub use config::{AssignerConfig, ConfigError};
pub use error::AssignerError;
pub use registry::{WaitHandle, WaitKey, WaiterRegistry};
pub use signal::WakeSignal;
pub use task::{BackgroundTask, Shutdown, Worker};
