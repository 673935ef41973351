//! # Parameter Expander Module / 参数展开模块
//!
//! Turns one selected spec into concrete parameter bindings in three fixed
//! stages, each consuming the previous stage's output:
//!
//! 1. constant tuples (`params` × `values`),
//! 2. a registered generator, whose mappings update the constant params,
//! 3. randomized sampling (`random`), which overwrites earlier values.
//!
//! Later stages win on name conflicts. The total is
//! `|values or 1| × |generator output or 1| × (random.count or 1)`.
//!
//! 将一个选中的规格分三个固定阶段转换为具体参数绑定，每个阶段消费前一阶段的输出：
//! 常量元组、已注册的生成器（其映射更新常量参数）、随机采样（覆盖先前的值）。
//! 名称冲突时后面的阶段优先。

use anyhow::{Context, Result};
use rand::Rng;
use rand_distr::{Distribution as _, Normal, Uniform};
use serde_json::Value;

use crate::core::models::{
    AvailableSpec, Distribution, Document, Params, RandomConfig, RandomParam, SpecError,
    is_truthy, keys, typed_field,
};
use crate::core::registry::Registry;

fn spec_name(doc: &Document) -> String {
    doc.get(keys::NAME)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn with_params(doc: &Document, params: Params) -> Document {
    let mut case = doc.clone();
    case.insert(keys::PARAMS.to_string(), Value::Object(params));
    case
}

fn params_mut(case: &mut Document) -> &mut Params {
    let slot = case
        .entry(keys::PARAMS)
        .or_insert_with(|| Value::Object(Params::new()));
    if !slot.is_object() {
        *slot = Value::Object(Params::new());
    }
    match slot {
        Value::Object(params) => params,
        _ => unreachable!("params slot was just normalized to a mapping"),
    }
}

/// Stage A: one case per `values` tuple, or a single case with empty params.
/// 阶段 A：每个 `values` 元组生成一个用例，否则生成一个参数为空的用例。
pub fn expand_constants(spec: &Document) -> Result<Vec<Document>, SpecError> {
    if !spec.get(keys::PARAMS).is_some_and(is_truthy) {
        return Ok(vec![with_params(spec, Params::new())]);
    }

    let invalid = |reason: String| SpecError::InvalidDeclaration {
        name: spec_name(spec),
        reason,
    };

    let names: Vec<String> = typed_field(spec, keys::PARAMS)?.unwrap_or_default();
    let rows: Vec<Value> = typed_field(spec, keys::VALUES)?
        .ok_or_else(|| invalid("`params` is declared without `values`".to_string()))?;

    let mut cases = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let tuple = match row {
            Value::Array(items) => items,
            scalar if names.len() == 1 => vec![scalar],
            other => {
                return Err(invalid(format!(
                    "`values[{index}]` must be a sequence, found {other}"
                )));
            }
        };
        if tuple.len() != names.len() {
            return Err(invalid(format!(
                "`values[{index}]` has {} entries but `params` names {}",
                tuple.len(),
                names.len()
            )));
        }
        let params: Params = names.iter().cloned().zip(tuple).collect();
        cases.push(with_params(spec, params));
    }
    Ok(cases)
}

/// Stage B: multiplies every case by the mappings returned from the spec's
/// generator. The generator is resolved before it is invoked, so an unknown
/// reference fails even when there are no cases to multiply.
///
/// 阶段 B：将每个用例乘以规格生成器返回的映射。
/// 生成器在调用前先解析，因此即使没有用例需要扩展，未知引用也会失败。
pub fn expand_generator(
    spec: &Document,
    cases: Vec<Document>,
    registry: &Registry,
) -> Result<Vec<Document>> {
    let Some(reference) = spec.get(keys::GENERATOR).filter(|v| is_truthy(v)) else {
        return Ok(cases);
    };
    let Value::String(reference) = reference else {
        return Err(SpecError::InvalidDeclaration {
            name: spec_name(spec),
            reason: format!("`generator` must be a string, found {reference}"),
        }
        .into());
    };
    let generator = registry.generator(reference)?;

    let mut expanded = Vec::new();
    for case in cases {
        let produced = generator.generate().with_context(|| {
            format!(
                "generator `{reference}` failed for spec `{}`",
                spec_name(spec)
            )
        })?;
        for generated in produced {
            let mut generated_case = case.clone();
            params_mut(&mut generated_case).extend(generated);
            expanded.push(generated_case);
        }
    }
    Ok(expanded)
}

/// Draws one value from `param`'s distribution.
///
/// `uniform` samples `[min, max]` (bounds given in either order); `normal`
/// uses `min` as the mean and `max` as the standard deviation.
///
/// 从 `param` 的分布中抽取一个值。
pub fn sample<R: Rng + ?Sized>(param: &RandomParam, rng: &mut R) -> Result<f64, String> {
    if !param.min.is_finite() || !param.max.is_finite() {
        return Err(format!(
            "bounds must be finite, got min={} max={}",
            param.min, param.max
        ));
    }
    match param.distribution {
        Distribution::Uniform => {
            let (low, high) = if param.min <= param.max {
                (param.min, param.max)
            } else {
                (param.max, param.min)
            };
            let uniform = Uniform::new_inclusive(low, high).map_err(|e| e.to_string())?;
            Ok(uniform.sample(rng))
        }
        Distribution::Normal => {
            let normal = Normal::new(param.min, param.max).map_err(|e| e.to_string())?;
            Ok(normal.sample(rng))
        }
    }
}

/// Stage C: `count` copies of every case, each with its own independent draw
/// for every variable of `random.params`, in variable-name order.
///
/// 阶段 C：每个用例复制 `count` 份，每份按变量名顺序为 `random.params`
/// 中的每个变量独立抽样。
pub fn expand_random<R: Rng + ?Sized>(
    spec: &Document,
    cases: Vec<Document>,
    rng: &mut R,
) -> Result<Vec<Document>, SpecError> {
    if !spec.get(keys::RANDOM).is_some_and(is_truthy) {
        return Ok(cases);
    }
    let config: RandomConfig = typed_field(spec, keys::RANDOM)?.unwrap_or(RandomConfig {
        count: 1,
        params: Default::default(),
    });

    if cases.len().checked_mul(config.count).is_none() {
        return Err(SpecError::InvalidDeclaration {
            name: spec_name(spec),
            reason: format!("random.count {} yields too many cases", config.count),
        });
    }

    let mut expanded = Vec::new();
    for case in cases {
        for _ in 0..config.count {
            let mut sampled = case.clone();
            let params = params_mut(&mut sampled);
            for (variable, param) in &config.params {
                let value = sample(param, rng).map_err(|reason| SpecError::InvalidDistribution {
                    name: spec_name(spec),
                    variable: variable.clone(),
                    reason,
                })?;
                params.insert(variable.clone(), Value::from(value));
            }
            expanded.push(sampled);
        }
    }
    Ok(expanded)
}

/// Runs all three stages for one spec.
/// 对一个规格运行全部三个阶段。
pub fn expand<R: Rng + ?Sized>(
    spec: &AvailableSpec,
    registry: &Registry,
    rng: &mut R,
) -> Result<Vec<Document>> {
    let doc = spec.document();
    let constants = expand_constants(doc)?;
    let generated = expand_generator(doc, constants, registry)?;
    Ok(expand_random(doc, generated, rng)?)
}

/// Expands every selected spec, preserving selection order.
pub fn expand_all<R: Rng + ?Sized>(
    specs: &[AvailableSpec],
    registry: &Registry,
    rng: &mut R,
) -> Result<Vec<Document>> {
    let mut cases = Vec::new();
    for spec in specs {
        cases.extend(expand(spec, registry, rng)?);
    }
    Ok(cases)
}
