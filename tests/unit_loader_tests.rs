//! # Spec Loader Unit Tests / 规格加载单元测试
//!
//! Discovery of declaration files, provenance attachment and defaults layering.
//!
//! 声明文件发现、来源信息附加以及默认值分层。

mod common;

use common::{PROJECT, Workspace, doc};
use serde_json::json;
use spec_runner::core::loader::{Provenance, load_available_specs, load_defaults, specs_from_document};
use spec_runner::infra::fs::{discover_spec_files, module_path};
use spec_runner::models::SpecError;
use std::path::Path;

#[cfg(test)]
mod discovery_tests {
    use super::*;

    #[test]
    fn test_discovery_is_sorted_and_filtered() {
        let ws = Workspace::new();
        ws.write_spec("b.yaml", "b: {}");
        ws.write_spec("a.yml", "a: {}");
        ws.write_spec("nested/c.yaml", "c: {}");
        ws.write_spec("defaults.yaml", "enabled: true");
        ws.write_spec("notes.txt", "ignored");
        ws.write_spec(".hidden.yaml", "h: {}");

        let files = discover_spec_files(&ws.specs_dir()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| module_path(&ws.specs_dir(), f).unwrap())
            .collect();
        assert_eq!(names, vec!["a", "b", "nested.c"]);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let ws = Workspace::new();
        assert!(discover_spec_files(&ws.specs_dir()).unwrap().is_empty());
    }
}

#[cfg(test)]
mod document_tests {
    use super::*;

    fn provenance(module: &str) -> Provenance<'static> {
        Provenance {
            project: PROJECT,
            module: module.to_string(),
            artifacts_dir: Path::new("/tmp/artifacts"),
        }
    }

    #[test]
    fn test_provenance_and_template_are_attached() {
        let file = doc(json!({
            "ping": {"operation": "builtin.noop", "params": ["host"], "values": [["a"]]}
        }));
        let defaults = doc(json!({"enabled": true, "tags": []}));

        let specs = specs_from_document(file, &provenance("net.ping"), &defaults).unwrap();

        assert_eq!(specs.len(), 1);
        let spec = specs[0].document();
        assert_eq!(spec["name"], json!("ping"));
        assert_eq!(spec["project"], json!(PROJECT));
        assert_eq!(spec["module"], json!("net.ping"));
        assert_eq!(spec["artifacts_dir"], json!("/tmp/artifacts"));
        assert_eq!(spec["enabled"], json!(true));
        assert_eq!(
            spec["template"],
            json!({"operation": "builtin.noop", "params": ["host"], "values": [["a"]]})
        );
    }

    #[test]
    fn test_entries_named_defaults_are_skipped() {
        let file = doc(json!({"local_defaults": {"tags": ["x"]}, "real": {}}));
        let specs = specs_from_document(file, &provenance("m"), &doc(json!({}))).unwrap();
        let names: Vec<&str> = specs.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["real"]);
    }

    #[test]
    fn test_declaration_order_is_preserved() {
        let file = doc(json!({"zeta": {}, "alpha": {}, "mid": {}}));
        let specs = specs_from_document(file, &provenance("m"), &doc(json!({}))).unwrap();
        let names: Vec<&str> = specs.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_non_mapping_declaration_is_rejected() {
        let file = doc(json!({"broken": [1, 2]}));
        let err = specs_from_document(file, &provenance("m"), &doc(json!({}))).unwrap_err();
        assert!(matches!(err, SpecError::InvalidDeclaration { ref name, .. } if name == "broken"));
    }
}

#[cfg(test)]
mod defaults_tests {
    use super::*;

    #[test]
    fn test_builtin_defaults_without_project_file() {
        let ws = Workspace::new();
        let defaults = load_defaults(&ws.config()).unwrap();
        assert_eq!(defaults["enabled"], json!(true));
        assert_eq!(defaults["tags"], json!([]));
    }

    #[test]
    fn test_project_defaults_override_key_by_key() {
        let ws = Workspace::new();
        ws.write_spec("defaults.yaml", "tags: [smoke]\noperation: shell.run\n");

        let defaults = load_defaults(&ws.config()).unwrap();
        assert_eq!(defaults["enabled"], json!(true));
        assert_eq!(defaults["tags"], json!(["smoke"]));
        assert_eq!(defaults["operation"], json!("shell.run"));
    }

    #[test]
    fn test_configured_defaults_file_replaces_builtin() {
        let ws = Workspace::new();
        let custom = ws.root().join("custom-defaults.yaml");
        std::fs::write(&custom, "operation: builtin.noop\n").unwrap();

        let mut config = ws.config();
        config.defaults_file = Some(custom);
        let defaults = load_defaults(&config).unwrap();
        assert_eq!(defaults["operation"], json!("builtin.noop"));
        assert!(!defaults.contains_key("enabled"));
    }

    #[test]
    fn test_loaded_specs_get_project_defaults() {
        let ws = Workspace::new();
        ws.write_spec("defaults.yaml", "operation: builtin.noop\n");
        ws.write_spec("suite/checks.yaml", "first:\n  tags: [a]\nsecond:\n  enabled: false\n");
        ws.write_spec("empty.yaml", "");

        let specs = load_available_specs(&ws.config()).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].module(), "suite.checks");
        assert_eq!(specs[0].document()["operation"], json!("builtin.noop"));
        assert_eq!(specs[0].tags(), vec!["a"]);
        assert!(specs[0].enabled());
        assert!(!specs[1].enabled());
    }

    #[test]
    fn test_yaml_merge_keys_share_fields_between_declarations() {
        let ws = Workspace::new();
        ws.write_spec(
            "shared.yaml",
            "base: &base\n  operation: builtin.noop\n  timeout_secs: 5\n  enabled: false\n\
             ping:\n  <<: *base\n  enabled: true\n",
        );

        let specs = load_available_specs(&ws.config()).unwrap();
        let ping = specs.iter().find(|s| s.name() == "ping").unwrap();
        let doc = ping.document();
        assert!(!doc.contains_key("<<"));
        assert_eq!(doc["operation"], json!("builtin.noop"));
        assert_eq!(doc["timeout_secs"], json!(5));
        assert!(ping.enabled());
        assert!(!doc["template"].as_object().unwrap().contains_key("<<"));
        assert_eq!(doc["template"]["operation"], json!("builtin.noop"));
    }

    #[test]
    fn test_missing_specs_directory_is_not_fatal() {
        let ws = Workspace::new();
        assert!(load_available_specs(&ws.config()).unwrap().is_empty());
    }
}
