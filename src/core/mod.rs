//! Core domain models for line balancing.
//!
//! This module contains the task data model and the precedence graph the
//! balancer works on.

pub mod dag;
pub mod task;

pub use dag::PrecedenceGraph;
pub use task::{TaskId, TaskMetrics, TaskTable};
