//! # Commands Module / 命令模块
//!
//! One module per `spec-runner` subcommand.
//!
//! 每个 `spec-runner` 子命令对应一个模块。

pub mod collect;
pub mod init;
pub mod run;
pub mod show;
