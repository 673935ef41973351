//! # Spec Runner Library / Spec Runner 库
//!
//! This library provides the core functionality for the Spec Runner tool,
//! a data-driven test-case generator and runner. Scenarios are declared in YAML,
//! expanded into uniquely identified cases, dispatched to registered operations,
//! and every outcome is persisted next to the parameters that produced it.
//!
//! 此库为 Spec Runner 工具提供核心功能，
//! 这是一个数据驱动的测试用例生成器和运行器。场景以 YAML 声明，
//! 展开为具有唯一标识的用例，分派给已注册的操作，
//! 每个结果都与产生它的参数一起持久化。
//!
//! ## Modules / 模块
//!
//! - `core` - Spec loading, selection, expansion, identity, recording and execution
//! - `infra` - Infrastructure services like process spawning and file discovery
//! - `reporting` - Console summaries of a run
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 规格加载、选择、展开、标识、记录和执行
//! - `infra` - 基础设施服务，如进程派生和文件发现
//! - `reporting` - 运行的控制台摘要
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use core::config;
pub use core::execution;
pub use core::models;
pub use core::registry::Registry;

/// Initializes the application's internationalization (i18n) based on the system locale.
///
/// This function detects the user's system locale and sets the appropriate
/// language for the application's user interface. It attempts to match the full
/// locale (e.g., "zh-CN"), then just the language code (e.g., "en"), and
/// finally falls back to the default language ("en").
pub fn init() {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    set_language(&locale);
}

/// Sets the active UI language, falling back through the language code to "en",
/// and returns the locale actually applied.
/// 设置当前界面语言，依次回退到语言代码和 "en"，并返回实际应用的语言。
pub fn set_language(locale: &str) -> String {
    let available_locales = rust_i18n::available_locales!();

    let lang = if available_locales.contains(&locale) {
        locale
    } else {
        locale
            .split('-')
            .next()
            .filter(|lang_code| available_locales.contains(lang_code))
            .unwrap_or("en")
    };

    rust_i18n::set_locale(lang);
    lang.to_string()
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
