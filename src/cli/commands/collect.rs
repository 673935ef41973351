//! # Collect Command Module / 收集命令模块
//!
//! Plans a run and lists the resulting cases without executing them or
//! writing anything.
//!
//! 规划一次运行并列出生成的用例，既不执行也不写入任何内容。

use anyhow::Result;
use colored::*;

use crate::{
    core::{config::RunConfig, planner, registry::Registry, selector::Selection},
    infra::t,
    reporting::print_plan,
};

/// Executes the collect command.
/// 执行收集命令。
pub fn execute(config: &RunConfig, selection: &Selection, registry: &Registry) -> Result<()> {
    let plan = planner::plan_run(config, selection, registry)?;
    println!(
        "{}",
        t!(
            "run.plan_summary",
            locale = &config.language,
            available = plan.available_count,
            selected = plan.selected_count,
            cases = plan.cases.len()
        )
        .cyan()
    );
    print_plan(&plan.cases, &config.language);
    Ok(())
}
