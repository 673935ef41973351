//! # Configuration Module / 配置模块
//!
//! Builds the explicit [`RunConfig`] a run is planned and executed with.
//! Three inputs are layered: the optional TOML settings file, a snapshot of the
//! process environment taken once by the CLI layer, and command-line overrides.
//! Nothing below the CLI reads the environment directly.
//!
//! 构建用于规划和执行运行的显式 [`RunConfig`]。
//! 分三层输入：可选的 TOML 设置文件、CLI 层一次性获取的进程环境快照，
//! 以及命令行覆盖。CLI 以下的任何代码都不直接读取环境变量。

use crate::core::models::SpecError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default name of the settings file looked up in the working directory.
pub const SETTINGS_FILE_NAME: &str = "spec-runner.toml";

const DEV_RESULTS_DIR: &str = "/tmp/results";
const DEV_ARTIFACTS_DIR: &str = "/tmp/artifacts";
const PRODUCTION_RESULTS_DIR: &str = "/automation/results";
const PRODUCTION_ARTIFACTS_DIR: &str = "/automation/artifacts";

/// The deployment mode a run executes in.
/// 运行所处的部署模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Staging,
    Production,
}

/// Settings loaded from `spec-runner.toml`. Every field is optional.
/// 从 `spec-runner.toml` 加载的设置。所有字段都是可选的。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerSettings {
    /// The language for the runner's output messages (e.g., "en", "zh-CN").
    /// 运行器输出消息的语言（例如 "en", "zh-CN"）。
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub environment: Option<Environment>,
    #[serde(default)]
    pub workspace: Option<PathBuf>,
    #[serde(default)]
    pub results_dir: Option<PathBuf>,
    #[serde(default)]
    pub artifacts_dir: Option<PathBuf>,
    /// Replaces the built-in process defaults document.
    /// 替换内置的进程级默认值文档。
    #[serde(default)]
    pub defaults_file: Option<PathBuf>,
    #[serde(default)]
    pub jobs: Option<usize>,
}

impl RunnerSettings {
    /// Loads settings from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Loads settings from `path` if the file exists, otherwise returns defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// The parts of the process environment the runner cares about, captured once.
/// 运行器关心的进程环境部分，仅获取一次。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    pub production: bool,
    pub staging: bool,
    /// `CI_BUILD_ID`
    pub build_id: Option<String>,
    /// `CI_PROJECT_NAME`
    pub build_name: Option<String>,
    /// `BUILD_NUMBER`, present when a CI job re-runs recorded cases.
    pub build_number: Option<String>,
    /// `MY_WORKSPACE`
    pub workspace: Option<PathBuf>,
}

impl EnvSnapshot {
    /// Reads the snapshot from the current process environment.
    pub fn capture() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the snapshot from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            production: non_empty("PRODUCTION").is_some(),
            staging: non_empty("STAGING").is_some(),
            build_id: non_empty("CI_BUILD_ID"),
            build_name: non_empty("CI_PROJECT_NAME"),
            build_number: non_empty("BUILD_NUMBER"),
            workspace: non_empty("MY_WORKSPACE").map(PathBuf::from),
        }
    }
}

/// Command-line overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub project: String,
    pub workspace: Option<PathBuf>,
    /// Development output base: results and artifacts go underneath it.
    pub build_dir: Option<PathBuf>,
    pub language: Option<String>,
}

/// CI build information attached to a run.
/// 附加到运行的 CI 构建信息。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildInfo {
    pub id: Option<String>,
    pub name: Option<String>,
    pub number: Option<String>,
}

/// The explicit configuration of one run.
/// 一次运行的显式配置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub environment: Environment,
    pub workspace: PathBuf,
    pub project: String,
    /// Root under which every case gets its `<id>` output directory.
    pub results_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub build: BuildInfo,
    pub defaults_file: Option<PathBuf>,
    pub language: String,
    pub jobs: Option<usize>,
}

impl RunConfig {
    /// Resolves the run configuration from its three layers.
    /// 从三层输入解析运行配置。
    pub fn resolve(
        settings: &RunnerSettings,
        env: &EnvSnapshot,
        overrides: &ConfigOverrides,
    ) -> Result<Self, SpecError> {
        let environment = if env.production {
            Environment::Production
        } else if env.staging {
            Environment::Staging
        } else {
            settings.environment.unwrap_or_default()
        };

        let (mut results_dir, mut artifacts_dir) = match environment {
            Environment::Dev | Environment::Staging => {
                (PathBuf::from(DEV_RESULTS_DIR), PathBuf::from(DEV_ARTIFACTS_DIR))
            }
            Environment::Production => {
                let (Some(name), Some(id)) = (&env.build_name, &env.build_id) else {
                    return Err(SpecError::InvalidConfig(
                        "production runs require CI_PROJECT_NAME and CI_BUILD_ID".to_string(),
                    ));
                };
                (
                    Path::new(PRODUCTION_RESULTS_DIR).join(name).join(id),
                    PathBuf::from(PRODUCTION_ARTIFACTS_DIR),
                )
            }
        };

        if let Some(dir) = &settings.results_dir {
            results_dir = dir.clone();
        }
        if let Some(dir) = &settings.artifacts_dir {
            artifacts_dir = dir.clone();
        }
        if let Some(build_dir) = &overrides.build_dir {
            artifacts_dir = build_dir.join("artifacts");
            results_dir = build_dir.join("results");
        }
        if environment == Environment::Dev && !overrides.project.is_empty() {
            results_dir = results_dir.join(&overrides.project);
        }

        let workspace = overrides
            .workspace
            .clone()
            .or_else(|| env.workspace.clone())
            .or_else(|| settings.workspace.clone())
            .unwrap_or_else(|| PathBuf::from("."));

        let language = overrides
            .language
            .clone()
            .or_else(|| settings.language.clone())
            .unwrap_or_else(|| "en".to_string());

        Ok(Self {
            environment,
            workspace,
            project: overrides.project.clone(),
            results_dir,
            artifacts_dir,
            build: BuildInfo {
                id: env.build_id.clone(),
                name: env.build_name.clone(),
                number: env.build_number.clone(),
            },
            defaults_file: settings.defaults_file.clone(),
            language,
            jobs: settings.jobs,
        })
    }

    /// `<workspace>/<project>`, or the workspace itself without a project.
    pub fn project_dir(&self) -> PathBuf {
        if self.project.is_empty() {
            self.workspace.clone()
        } else {
            self.workspace.join(&self.project)
        }
    }

    /// Root of the declaration tree: `<project dir>/tests/specs`.
    pub fn specs_dir(&self) -> PathBuf {
        self.project_dir().join("tests").join("specs")
    }

    /// Optional project-specific defaults document.
    pub fn project_defaults_file(&self) -> PathBuf {
        self.specs_dir().join("defaults.yaml")
    }

    /// A reproduction run with a build number keeps recorded identities.
    pub fn has_build_number(&self) -> bool {
        self.build.number.is_some()
    }
}
