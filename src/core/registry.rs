//! # Registry Module / 注册表模块
//!
//! Maps dotted reference strings (`a.b.c`) to operations and generators.
//! A project builds its registry at startup; every lookup of an unknown
//! reference fails immediately with [`SpecError::UnregisteredReference`].
//!
//! 将点分引用字符串（`a.b.c`）映射到操作和生成器。
//! 项目在启动时构建其注册表；任何未知引用的查找都会立即以
//! [`SpecError::UnregisteredReference`] 失败。

use anyhow::Result;
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::core::models::{Case, Params, SpecError};

/// The executable action a case dispatches to. It receives the fully expanded
/// case and may attach values to it; returning an error fails the case.
///
/// 用例分派到的可执行动作。它接收完全展开的用例并可以向其附加值；
/// 返回错误表示用例失败。
pub trait Operation: Send + Sync {
    fn call<'a>(&'a self, case: &'a mut Case) -> BoxFuture<'a, Result<()>>;
}

/// Produces parameter mappings that multiply a case.
/// 生成用于扩展用例的参数映射。
pub trait Generator: Send + Sync {
    fn generate(&self) -> Result<Vec<Params>>;
}

/// Adapts a synchronous closure into an [`Operation`].
pub struct FnOperation<F>(pub F);

impl<F> Operation for FnOperation<F>
where
    F: Fn(&mut Case) -> Result<()> + Send + Sync,
{
    fn call<'a>(&'a self, case: &'a mut Case) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { (self.0)(case) })
    }
}

/// Adapts a closure into a [`Generator`].
pub struct FnGenerator<F>(pub F);

impl<F> Generator for FnGenerator<F>
where
    F: Fn() -> Result<Vec<Params>> + Send + Sync,
{
    fn generate(&self) -> Result<Vec<Params>> {
        (self.0)()
    }
}

fn listing<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let names: Vec<&str> = names.collect();
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

/// Reference string → callable lookup tables.
#[derive(Default, Clone)]
pub struct Registry {
    operations: BTreeMap<String, Arc<dyn Operation>>,
    generators: BTreeMap<String, Arc<dyn Generator>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_operation(
        &mut self,
        reference: impl Into<String>,
        operation: impl Operation + 'static,
    ) -> &mut Self {
        self.operations.insert(reference.into(), Arc::new(operation));
        self
    }

    pub fn register_operation_fn<F>(&mut self, reference: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&mut Case) -> Result<()> + Send + Sync + 'static,
    {
        self.register_operation(reference, FnOperation(f))
    }

    pub fn register_generator(
        &mut self,
        reference: impl Into<String>,
        generator: impl Generator + 'static,
    ) -> &mut Self {
        self.generators.insert(reference.into(), Arc::new(generator));
        self
    }

    pub fn register_generator_fn<F>(&mut self, reference: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn() -> Result<Vec<Params>> + Send + Sync + 'static,
    {
        self.register_generator(reference, FnGenerator(f))
    }

    pub fn operation(&self, reference: &str) -> Result<Arc<dyn Operation>, SpecError> {
        self.operations
            .get(reference)
            .cloned()
            .ok_or_else(|| SpecError::UnregisteredReference {
                kind: "operation",
                reference: reference.to_string(),
                registered: listing(self.operation_names()),
            })
    }

    pub fn generator(&self, reference: &str) -> Result<Arc<dyn Generator>, SpecError> {
        self.generators
            .get(reference)
            .cloned()
            .ok_or_else(|| SpecError::UnregisteredReference {
                kind: "generator",
                reference: reference.to_string(),
                registered: listing(self.generator_names()),
            })
    }

    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn generator_names(&self) -> impl Iterator<Item = &str> {
        self.generators.keys().map(String::as_str)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("operations", &self.operations.keys().collect::<Vec<_>>())
            .field("generators", &self.generators.keys().collect::<Vec<_>>())
            .finish()
    }
}
