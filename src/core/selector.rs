//! # Selector Module / 选择模块
//!
//! Filters available specs down to the selected subset. Exactly one strategy
//! is active per run, chosen by precedence: tags, then modules, then test
//! names, then reproduction of recorded specs.
//!
//! 将可用规格过滤为选中的子集。每次运行仅有一种策略生效，按优先级选择：
//! 标签、模块、测试名称，最后是复现已记录的规格。

use std::path::PathBuf;

use crate::core::models::AvailableSpec;

/// Selection inputs as given on the command line.
/// 命令行给出的选择输入。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub tests: Vec<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub modules: Vec<String>,
    /// Recorded `spec.json` files to reproduce.
    pub specs: Vec<PathBuf>,
}

/// The strategy resolved from a [`Selection`].
/// 从 [`Selection`] 解析出的策略。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy<'a> {
    /// No criteria: every enabled spec.
    All,
    Tags {
        include: &'a [String],
        exclude: &'a [String],
    },
    Modules(&'a [String]),
    Names(&'a [String]),
    /// Pre-built specs bypass filtering entirely.
    Reproduce(&'a [PathBuf]),
    /// Recorded specs combined with a filter. Nothing is selected.
    Inconsistent,
}

impl Selection {
    /// Resolves the active strategy.
    ///
    /// Filters combine by precedence (tags over modules over names). Recorded
    /// specs cannot be combined with any filter: such an invocation selects
    /// nothing instead of silently picking one side.
    pub fn strategy(&self) -> Strategy<'_> {
        let has_filter = !self.include.is_empty()
            || !self.exclude.is_empty()
            || !self.modules.is_empty()
            || !self.tests.is_empty();

        if !self.specs.is_empty() && has_filter {
            Strategy::Inconsistent
        } else if !self.include.is_empty() || !self.exclude.is_empty() {
            Strategy::Tags {
                include: &self.include,
                exclude: &self.exclude,
            }
        } else if !self.modules.is_empty() {
            Strategy::Modules(&self.modules)
        } else if !self.tests.is_empty() {
            Strategy::Names(&self.tests)
        } else if !self.specs.is_empty() {
            Strategy::Reproduce(&self.specs)
        } else {
            Strategy::All
        }
    }

    pub fn is_reproduction(&self) -> bool {
        matches!(self.strategy(), Strategy::Reproduce(_))
    }
}

/// A spec matches when it carries at least one included tag (or has no tags
/// while nothing is included) and carries no excluded tag. Exclusion wins.
///
/// 规格匹配条件：至少带有一个被包含的标签（或没有标签且未指定包含项），
/// 并且不带任何被排除的标签。排除优先。
pub fn matches_tags(spec: &AvailableSpec, include: &[String], exclude: &[String]) -> bool {
    let tags = spec.tags();
    if tags.is_empty() {
        return include.is_empty();
    }
    let included = include.iter().any(|tag| tags.contains(tag));
    let excluded = exclude.iter().any(|tag| tags.contains(tag));
    included && !excluded
}

/// Applies `strategy` to `available`. Disabled specs are always dropped.
/// Reproduction and inconsistent strategies select nothing from the loaded
/// specs; reproduction cases come from the recorded files instead.
///
/// 对 `available` 应用 `strategy`。已禁用的规格总是被丢弃。
/// 复现策略和不一致策略不会从已加载规格中选择任何内容；
/// 复现用例改为来自已记录的文件。
pub fn select(strategy: &Strategy<'_>, available: Vec<AvailableSpec>) -> Vec<AvailableSpec> {
    let keep = |spec: &AvailableSpec| -> bool {
        match strategy {
            Strategy::All => true,
            Strategy::Tags { include, exclude } => matches_tags(spec, include, exclude),
            Strategy::Modules(modules) => modules.iter().any(|m| m == spec.module()),
            Strategy::Names(names) => names.iter().any(|n| n == spec.name()),
            Strategy::Reproduce(_) | Strategy::Inconsistent => false,
        }
    };

    available
        .into_iter()
        .filter(|spec| keep(spec) && spec.enabled())
        .collect()
}
