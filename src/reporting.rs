//! # Reporting Module / 报告模块
//!
//! This module handles the display of run results. It prints colorful,
//! formatted summaries to the console with internationalization support;
//! the durable record of every case is its `spec.json`.
//!
//! 此模块处理运行结果的显示。它在控制台打印彩色格式化摘要，支持国际化；
//! 每个用例的持久记录是其 `spec.json`。

pub mod console;

// Re-export common reporting functions
pub use console::{print_failure_details, print_plan, print_summary};
