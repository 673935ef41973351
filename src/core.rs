//! # Core Module / 核心模块
//!
//! This module contains the core functionality of Spec Runner: the document
//! merger, spec loading, selection, parameter expansion, identity assignment,
//! result recording, and the execution of generated cases.
//!
//! 此模块包含 Spec Runner 的核心功能：文档合并、规格加载、选择、
//! 参数展开、标识分配、结果记录以及生成用例的执行。
//!
//! Pipeline order / 管道顺序:
//! `loader` → `document` (defaults) → `selector` → `expander` → `identity`
//! → `execution` → `recorder`

pub mod builtins;
pub mod config;
pub mod document;
pub mod execution;
pub mod expander;
pub mod identity;
pub mod loader;
pub mod models;
pub mod planner;
pub mod recorder;
pub mod registry;
pub mod selector;

// Re-exports
pub use config::RunConfig;
pub use models::{Case, Outcome, SpecError};
pub use planner::{RunPlan, plan_run};
