//! # Data Models Module / 数据模型模块
//!
//! This module defines the core data structures used throughout the spec runner.
//! Spec documents are kept as ordered JSON-style trees so that any key a project
//! adds through its declarations or defaults travels with the case untouched;
//! the keys the runner itself understands are read through typed accessors.
//!
//! 此模块定义了整个规格运行器中使用的核心数据结构。
//! 规格文档以有序的 JSON 风格树保存，项目通过声明或默认值添加的任何键
//! 都会原样随用例传递；运行器自身理解的键通过类型化访问器读取。

use crate::infra::t;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// An ordered mapping of keys to document values.
/// 键到文档值的有序映射。
pub type Document = Map<String, Value>;

/// One concrete binding of parameter names to values.
/// 参数名到值的一个具体绑定。
pub type Params = Map<String, Value>;

/// Keys the runner reads or writes on a spec document.
/// 运行器在规格文档上读取或写入的键。
pub mod keys {
    pub const NAME: &str = "name";
    pub const MODULE: &str = "module";
    pub const PROJECT: &str = "project";
    pub const ARTIFACTS_DIR: &str = "artifacts_dir";
    pub const TEMPLATE: &str = "template";
    pub const TAGS: &str = "tags";
    pub const PARAMS: &str = "params";
    pub const VALUES: &str = "values";
    pub const GENERATOR: &str = "generator";
    pub const RANDOM: &str = "random";
    pub const ENABLED: &str = "enabled";
    pub const OPERATION: &str = "operation";
    pub const TIMEOUT_SECS: &str = "timeout_secs";
    pub const ID: &str = "id";
    pub const OUTPUT_DIR: &str = "output_dir";
    pub const RESULTS: &str = "results";
    pub const PASSED: &str = "passed";
    pub const EXCEPTION: &str = "exception";
}

/// Keys whose sub-trees are never merged into or normalized.
/// 其子树永远不会被合并或规范化的键。
pub const PROTECTED_KEYS: &[&str] = &[keys::TEMPLATE];

/// Keys owned by the runner in a result record. Attachments never replace them.
/// 结果记录中由运行器拥有的键，附件永远不会替换它们。
pub const RECORD_KEYS: &[&str] = &[
    keys::ID,
    keys::OUTPUT_DIR,
    keys::RESULTS,
    keys::NAME,
    keys::MODULE,
    keys::PROJECT,
    keys::PARAMS,
    keys::TEMPLATE,
];

/// Name of the result document written into every case output directory.
pub const RESULT_FILE_NAME: &str = "spec.json";

/// Errors raised by the planning pipeline.
/// These are authoring or configuration mistakes and always stop the run
/// before any case executes.
///
/// 规划管道引发的错误。
/// 这些是编写或配置错误，总是在任何用例执行之前停止运行。
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("unregistered {kind} reference `{reference}` (registered: {registered})")]
    UnregisteredReference {
        kind: &'static str,
        reference: String,
        registered: String,
    },
    #[error("invalid declaration `{name}`: {reason}")]
    InvalidDeclaration { name: String, reason: String },
    #[error("invalid distribution for `{variable}` in `{name}`: {reason}")]
    InvalidDistribution {
        name: String,
        variable: String,
        reason: String,
    },
    #[error("case `{0}` does not name an operation")]
    MissingOperation(String),
    #[error("no tests were selected")]
    NoCasesSelected,
    #[error("duplicate case id `{0}`")]
    DuplicateCaseId(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Python-style truthiness of a document value, used for the optional keys
/// (`params`, `generator`, `random`, `enabled`) that may be present but empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Reads `key` from `doc` as `T`. A missing or null key is `None`.
/// 从 `doc` 中以 `T` 类型读取 `key`。缺失或为 null 的键返回 `None`。
pub fn typed_field<T: DeserializeOwned>(
    doc: &Document,
    key: &str,
) -> Result<Option<T>, SpecError> {
    match doc.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
            SpecError::InvalidDeclaration {
                name: doc_name(doc).to_string(),
                reason: format!("`{key}`: {e}"),
            }
        }),
    }
}

fn doc_name(doc: &Document) -> &str {
    doc.get(keys::NAME).and_then(Value::as_str).unwrap_or("<unnamed>")
}

/// Supported sampling distributions for randomized parameters.
/// 随机参数支持的采样分布。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    /// Uniform over `[min, max]`.
    #[default]
    Uniform,
    /// Gaussian with mean `min` and standard deviation `max`.
    Normal,
}

/// A single randomized variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomParam {
    #[serde(default = "default_min")]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
    #[serde(default, rename = "type")]
    pub distribution: Distribution,
}

impl Default for RandomParam {
    fn default() -> Self {
        Self {
            min: default_min(),
            max: default_max(),
            distribution: Distribution::default(),
        }
    }
}

fn default_min() -> f64 {
    1.0
}

fn default_max() -> f64 {
    100.0
}

fn default_count() -> usize {
    1
}

/// The `random` block of a declaration.
/// Variables are kept sorted by name so multi-variable draws happen in a
/// stable order.
///
/// 声明中的 `random` 块。
/// 变量按名称排序保存，使多变量抽样按稳定顺序进行。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RandomConfig {
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub params: BTreeMap<String, RandomParam>,
}

/// A loaded declaration with provenance and defaults merged in.
/// 已加载的声明，附带来源信息并已合并默认值。
#[derive(Debug, Clone, PartialEq)]
pub struct AvailableSpec {
    doc: Document,
}

impl AvailableSpec {
    pub fn new(doc: Document) -> Self {
        Self { doc }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The key under which the declaration appears in its source file.
    pub fn name(&self) -> &str {
        self.doc.get(keys::NAME).and_then(Value::as_str).unwrap_or_default()
    }

    /// Dotted path of the declaration file relative to the specs root.
    pub fn module(&self) -> &str {
        self.doc.get(keys::MODULE).and_then(Value::as_str).unwrap_or_default()
    }

    /// Tags of the spec. Scalars inside the list are compared by their text.
    pub fn tags(&self) -> Vec<String> {
        match self.doc.get(keys::TAGS) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            Some(Value::String(single)) => vec![single.clone()],
            _ => Vec::new(),
        }
    }

    /// Specs are enabled unless `enabled` is present and falsy.
    pub fn enabled(&self) -> bool {
        self.doc.get(keys::ENABLED).is_none_or(is_truthy)
    }
}

/// The capability every value attached to a case must provide so the
/// recorder can turn it into a plain document value.
///
/// 附加到用例的每个值都必须提供的能力，
/// 使记录器能够将其转换为普通文档值。
pub trait ToSerializable: Send + Sync {
    fn to_serializable(&self) -> anyhow::Result<Value>;
}

impl ToSerializable for Value {
    fn to_serializable(&self) -> anyhow::Result<Value> {
        Ok(self.clone())
    }
}

impl ToSerializable for String {
    fn to_serializable(&self) -> anyhow::Result<Value> {
        Ok(Value::String(self.clone()))
    }
}

impl ToSerializable for bool {
    fn to_serializable(&self) -> anyhow::Result<Value> {
        Ok(Value::Bool(*self))
    }
}

impl ToSerializable for i64 {
    fn to_serializable(&self) -> anyhow::Result<Value> {
        Ok(Value::from(*self))
    }
}

impl ToSerializable for f64 {
    fn to_serializable(&self) -> anyhow::Result<Value> {
        Ok(Value::from(*self))
    }
}

impl<T: ToSerializable> ToSerializable for Vec<T> {
    fn to_serializable(&self) -> anyhow::Result<Value> {
        self.iter()
            .map(ToSerializable::to_serializable)
            .collect::<anyhow::Result<Vec<_>>>()
            .map(Value::Array)
    }
}

impl<T: ToSerializable> ToSerializable for BTreeMap<String, T> {
    fn to_serializable(&self) -> anyhow::Result<Value> {
        let mut map = Map::new();
        for (key, value) in self {
            map.insert(key.clone(), value.to_serializable()?);
        }
        Ok(Value::Object(map))
    }
}

/// A fully expanded, uniquely identified, runnable instantiation of a spec.
///
/// The document carries everything that ends up in `spec.json`; values an
/// operation hands over while running are kept as attachments and converted
/// only when the result is recorded.
///
/// 规格的一个完全展开、唯一标识、可运行的实例。
///
/// 文档包含最终写入 `spec.json` 的所有内容；操作在运行时交出的值
/// 作为附件保存，仅在记录结果时转换。
pub struct Case {
    doc: Document,
    attachments: Vec<(String, Box<dyn ToSerializable>)>,
}

impl Case {
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            attachments: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn name(&self) -> &str {
        self.doc.get(keys::NAME).and_then(Value::as_str).unwrap_or_default()
    }

    pub fn module(&self) -> &str {
        self.doc.get(keys::MODULE).and_then(Value::as_str).unwrap_or_default()
    }

    pub fn id(&self) -> &str {
        self.doc.get(keys::ID).and_then(Value::as_str).unwrap_or_default()
    }

    /// Name shown while collecting and running: `<name>_<id>`.
    pub fn display_name(&self) -> String {
        format!("{}_{}", self.name(), self.id())
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        self.doc
            .get(keys::OUTPUT_DIR)
            .and_then(Value::as_str)
            .map(PathBuf::from)
    }

    pub fn artifacts_dir(&self) -> Option<PathBuf> {
        self.doc
            .get(keys::ARTIFACTS_DIR)
            .and_then(Value::as_str)
            .map(PathBuf::from)
    }

    /// The concrete parameter binding of this case.
    pub fn params(&self) -> Params {
        match self.doc.get(keys::PARAMS) {
            Some(Value::Object(params)) => params.clone(),
            _ => Params::new(),
        }
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.doc
            .get(keys::PARAMS)
            .and_then(Value::as_object)
            .and_then(|params| params.get(name))
    }

    /// Reference string of the operation this case dispatches to.
    pub fn operation(&self) -> Result<&str, SpecError> {
        match self.doc.get(keys::OPERATION) {
            Some(Value::String(reference)) if !reference.is_empty() => Ok(reference),
            None | Some(Value::Null) => Err(SpecError::MissingOperation(self.name().to_string())),
            Some(other) => Err(SpecError::InvalidDeclaration {
                name: self.name().to_string(),
                reason: format!("`operation` must be a string, found {other}"),
            }),
        }
    }

    pub fn timeout(&self) -> Result<Option<Duration>, SpecError> {
        Ok(typed_field::<u64>(&self.doc, keys::TIMEOUT_SECS)?.map(Duration::from_secs))
    }

    /// Reads any other field of the case document as `T`.
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SpecError> {
        typed_field(&self.doc, key)
    }

    /// Attaches a value produced while running; it is stored under `key` in the
    /// recorded document.
    pub fn attach(&mut self, key: impl Into<String>, value: impl ToSerializable + 'static) {
        self.attachments.push((key.into(), Box::new(value)));
    }

    pub fn attachments(&self) -> impl Iterator<Item = (&str, &dyn ToSerializable)> {
        self.attachments
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_ref()))
    }

    /// Mutable access to the `results` mapping, created if missing.
    pub fn results_mut(&mut self) -> &mut Document {
        let slot = self
            .doc
            .entry(keys::RESULTS)
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        match slot {
            Value::Object(results) => results,
            _ => unreachable!("results slot was just normalized to a mapping"),
        }
    }
}

impl ToSerializable for Case {
    fn to_serializable(&self) -> anyhow::Result<Value> {
        Ok(Value::Object(self.doc.clone()))
    }
}

impl fmt::Debug for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Case")
            .field("doc", &self.doc)
            .field(
                "attachments",
                &self.attachments.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// The terminal outcome of one operation call.
/// 一次操作调用的最终结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Passed,
    Failed { exception: String },
}

impl Outcome {
    pub fn failed(exception: impl Into<String>) -> Self {
        Outcome::Failed {
            exception: exception.into(),
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

/// Represents the final result of a single case in a run.
/// 表示一次运行中单个用例的最终结果。
#[derive(Debug, Clone)]
pub enum CaseResult {
    /// The operation returned successfully.
    /// 操作成功返回。
    Passed {
        display_name: String,
        duration: Duration,
        record: PathBuf,
    },
    /// The operation failed, panicked, timed out or was cancelled mid-flight.
    /// 操作失败、崩溃、超时或在执行中被取消。
    Failed {
        display_name: String,
        exception: String,
        duration: Duration,
        record: PathBuf,
    },
    /// The run was cancelled before the case started; nothing was recorded.
    /// 运行在用例开始前被取消；未记录任何内容。
    Skipped { display_name: String },
}

impl CaseResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, CaseResult::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, CaseResult::Skipped { .. })
    }

    pub fn case_name(&self) -> &str {
        match self {
            CaseResult::Passed { display_name, .. }
            | CaseResult::Failed { display_name, .. }
            | CaseResult::Skipped { display_name } => display_name,
        }
    }

    pub fn get_duration(&self) -> Option<Duration> {
        match self {
            CaseResult::Passed { duration, .. } | CaseResult::Failed { duration, .. } => {
                Some(*duration)
            }
            CaseResult::Skipped { .. } => None,
        }
    }

    pub fn record_path(&self) -> Option<&PathBuf> {
        match self {
            CaseResult::Passed { record, .. } | CaseResult::Failed { record, .. } => Some(record),
            CaseResult::Skipped { .. } => None,
        }
    }

    /// Gets the status of the result as a localized string for display.
    /// 以本地化字符串形式获取结果状态以供显示。
    pub fn get_status_str(&self, locale: &str) -> String {
        match self {
            CaseResult::Passed { .. } => t!("report.status_passed", locale = locale).to_string(),
            CaseResult::Failed { .. } => t!("report.status_failed", locale = locale).to_string(),
            CaseResult::Skipped { .. } => t!("report.status_skipped", locale = locale).to_string(),
        }
    }
}
