//! # Identity Assigner Unit Tests / 标识分配单元测试
//!
//! Unique ids, output directories, reproduction identity and results reset.
//!
//! 唯一 id、输出目录、复现标识以及结果重置。

mod common;

use common::doc;
use serde_json::json;
use spec_runner::core::identity::{IdentityMode, assign_identities, new_case_id};
use spec_runner::models::SpecError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[cfg(test)]
mod fresh_identity_tests {
    use super::*;

    #[test]
    fn test_id_shape() {
        let id = new_case_id();
        assert_eq!(id.len(), 10 + 32);
        assert!(id[..10].chars().all(|c| c.is_ascii_digit()));
        assert!(id[10..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_thousand_cases_get_distinct_ids_and_directories() {
        let docs = (0..1000).map(|_| doc(json!({"name": "same"}))).collect();
        let cases = assign_identities(docs, Path::new("/results"), IdentityMode::Fresh).unwrap();

        let ids: HashSet<&str> = cases.iter().map(|c| c.id()).collect();
        let dirs: HashSet<PathBuf> = cases.iter().filter_map(|c| c.output_dir()).collect();
        assert_eq!(ids.len(), 1000);
        assert_eq!(dirs.len(), 1000);
        for case in &cases {
            assert_eq!(case.output_dir(), Some(Path::new("/results").join(case.id())));
        }
    }

    #[test]
    fn test_fresh_mode_replaces_recorded_identity_and_results() {
        let recorded = doc(json!({
            "name": "old",
            "id": "0101000000abc",
            "output_dir": "/old/place",
            "results": {"passed": false, "exception": "boom"}
        }));
        let cases = assign_identities(vec![recorded], Path::new("/new"), IdentityMode::Fresh).unwrap();
        assert_ne!(cases[0].id(), "0101000000abc");
        assert!(cases[0].output_dir().unwrap().starts_with("/new"));
        assert_eq!(cases[0].document()["results"], json!({}));
    }
}

#[cfg(test)]
mod preserve_identity_tests {
    use super::*;

    #[test]
    fn test_mode_requires_reproduction_and_build_number() {
        assert_eq!(IdentityMode::for_run(true, true), IdentityMode::Preserve);
        assert_eq!(IdentityMode::for_run(true, false), IdentityMode::Fresh);
        assert_eq!(IdentityMode::for_run(false, true), IdentityMode::Fresh);
    }

    #[test]
    fn test_recorded_identity_is_kept_and_results_reset() {
        let recorded = doc(json!({
            "name": "replay",
            "id": "fixed-id",
            "output_dir": "/old/place/fixed-id",
            "results": {"passed": false}
        }));
        let cases =
            assign_identities(vec![recorded], Path::new("/new"), IdentityMode::Preserve).unwrap();
        assert_eq!(cases[0].id(), "fixed-id");
        assert_eq!(cases[0].output_dir(), Some(PathBuf::from("/old/place/fixed-id")));
        assert_eq!(cases[0].document()["results"], json!({}));
    }

    #[test]
    fn test_missing_output_dir_is_derived_from_id() {
        let recorded = doc(json!({"name": "replay", "id": "abc"}));
        let cases =
            assign_identities(vec![recorded], Path::new("/new"), IdentityMode::Preserve).unwrap();
        assert_eq!(cases[0].output_dir(), Some(PathBuf::from("/new/abc")));
    }

    #[test]
    fn test_missing_id_is_assigned_fresh() {
        let cases = assign_identities(
            vec![doc(json!({"name": "no-id"}))],
            Path::new("/new"),
            IdentityMode::Preserve,
        )
        .unwrap();
        assert!(!cases[0].id().is_empty());
    }

    #[test]
    fn test_duplicate_preserved_id_is_rejected() {
        let docs = vec![
            doc(json!({"name": "a", "id": "dup"})),
            doc(json!({"name": "b", "id": "dup"})),
        ];
        let err = assign_identities(docs, Path::new("/new"), IdentityMode::Preserve).unwrap_err();
        assert!(matches!(err, SpecError::DuplicateCaseId(ref id) if id == "dup"));
    }
}
