pub mod balance;
pub mod config;
pub mod core;
pub mod error;
pub mod loader;
pub mod log;
pub mod report;

pub use balance::{balance, BalanceOptions, BalanceResult, Construction, Objective, Weights};
pub use crate::core::{PrecedenceGraph, TaskId, TaskMetrics, TaskTable};
pub use error::{Error, Result};
