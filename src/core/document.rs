//! # Document Merger Module / 文档合并模块
//!
//! Recursive merging of a defaults document into a spec document. Values the
//! spec already sets are never replaced; nested mappings are merged key by key;
//! keys in the exempt set are treated as opaque leaves and never descended into.
//!
//! 将默认值文档递归合并到规格文档中。规格已设置的值永远不会被替换；
//! 嵌套映射逐键合并；豁免集合中的键被视为不透明的叶子，永远不会深入。

use crate::core::models::{Document, PROTECTED_KEYS};
use serde_json::Value;

/// Merges `source` into `target` without overwriting anything `target` sets.
///
/// For every key of `source`:
/// - both sides are mappings and the key is not exempt: merge recursively;
/// - `target` already holds the key: keep it (a non-mapping target value wins
///   over a mapping source value);
/// - otherwise: copy the value from `source`.
///
/// 将 `source` 合并到 `target`，不覆盖 `target` 已设置的任何内容。
pub fn merge(target: &mut Document, source: &Document, exempt: &[&str]) {
    for (key, source_value) in source {
        match target.get_mut(key) {
            Some(Value::Object(target_map)) if !exempt.contains(&key.as_str()) => {
                if let Value::Object(source_map) = source_value {
                    merge(target_map, source_map, exempt);
                }
            }
            Some(_) => {}
            None => {
                target.insert(key.clone(), source_value.clone());
            }
        }
    }
}

/// Applies `defaults` to `spec` so that explicit spec values always take
/// precedence, even inside nested mappings, and the protected keys keep the
/// content they had before merging.
///
/// Two passes: defaults into the spec, then the pre-merge snapshot of the
/// spec back over the result.
///
/// 将 `defaults` 应用于 `spec`，使显式的规格值始终优先（包括嵌套映射内部），
/// 受保护的键保持合并前的内容。
pub fn apply_defaults(spec: &mut Document, defaults: &Document) {
    let snapshot = spec.clone();
    merge(spec, defaults, PROTECTED_KEYS);
    merge(spec, &snapshot, PROTECTED_KEYS);
}

/// Shallow, key-by-key override: every top-level key of `overrides` replaces
/// the one in `base`. Used to layer project defaults over process defaults.
pub fn override_shallow(base: &mut Document, overrides: Document) {
    for (key, value) in overrides {
        base.insert(key, value);
    }
}
