//! # Console Reporting Module / 控制台报告模块
//!
//! This module prints run summaries, failure details and planned cases to the
//! console with internationalization support.
//!
//! 此模块在控制台打印运行摘要、失败详情和已规划的用例，支持国际化。

use colored::*;

use crate::core::models::{Case, CaseResult};
use crate::infra::t;

/// Prints a formatted summary of case results to the console.
///
/// 在控制台打印格式化的用例结果摘要。
///
/// # Output Format / 输出格式
/// ```text
/// --- Run Summary ---
///   - Passed   | ping_1610120102a3f...                                    |      1.23s
///   - Failed   | ping_1610120102b7c...                                    |      0.45s
///   - Skipped  | ping_1610120103d9e...                                    |        N/A
/// ```
pub fn print_summary(results: &[CaseResult], locale: &str) {
    println!("\n{}", t!("report.summary_banner", locale = locale).bold());

    for result in results {
        let status_str = result.get_status_str(locale);
        let duration_str = result
            .get_duration()
            .map(|d| format!("{:.2?}", d))
            .unwrap_or_else(|| "N/A".to_string());

        let status_colored = match result {
            CaseResult::Passed { .. } => status_str.green(),
            CaseResult::Failed { .. } => status_str.red(),
            CaseResult::Skipped { .. } => status_str.dimmed(),
        };

        println!(
            "  - {:<10} | {:<56} | {:>10}",
            status_colored,
            result.case_name(),
            duration_str
        );
    }

    let passed = results
        .iter()
        .filter(|r| matches!(r, CaseResult::Passed { .. }))
        .count();
    let failed = results.iter().filter(|r| r.is_failure()).count();
    let skipped = results.iter().filter(|r| r.is_skipped()).count();
    println!(
        "\n{}",
        t!(
            "report.totals",
            locale = locale,
            total = results.len(),
            passed = passed,
            failed = failed,
            skipped = skipped
        )
    );
}

/// Prints the recorded exception and result file of every failed case.
///
/// 打印每个失败用例记录的异常和结果文件。
pub fn print_failure_details(results: &[CaseResult], locale: &str) {
    let failures: Vec<&CaseResult> = results.iter().filter(|r| r.is_failure()).collect();
    if failures.is_empty() {
        return;
    }

    println!("\n{}", t!("report.failure_banner", locale = locale).red().bold());
    println!("{}", "-".repeat(80));

    for (i, result) in failures.iter().enumerate() {
        if let CaseResult::Failed {
            display_name,
            exception,
            record,
            ..
        } = result
        {
            println!(
                "[{}/{}] {} '{}'",
                i + 1,
                failures.len(),
                t!("report.failure_header", locale = locale).red(),
                display_name.cyan()
            );
            println!(
                "{}",
                t!("report.record_path", locale = locale, path = record.display()).dimmed()
            );
            println!("\n{}\n", exception);
            println!("{}", "-".repeat(80));
        }
    }
}

/// Prints the planned cases without running them.
/// 打印已规划的用例而不运行它们。
pub fn print_plan(cases: &[Case], locale: &str) {
    for case in cases {
        let params = serde_json::Value::Object(case.params());
        println!(
            "  - {} {} {}",
            case.display_name().cyan(),
            format!("[{}]", case.module()).dimmed(),
            params
        );
    }
    println!(
        "\n{}",
        t!("collect.total", locale = locale, count = cases.len()).bold()
    );
}
