use std::collections::BTreeMap;

use cicomp::core::ComponentError;
use cicomp::fetch::FetchOptions;
use cicomp::header::ComponentFile;
use cicomp::project::User;
use serde_json::json;

use crate::common::{address, index_service};

fn fetch_file(path: &str) -> ComponentFile {
    let fetched = index_service()
        .fetch(&address(path), &User::new("alice"), FetchOptions::default())
        .unwrap();
    ComponentFile::parse(&fetched.text()).unwrap()
}

fn args(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn test_component_without_header_has_empty_context() {
    let file = fetch_file("acme/ci/lint@1.2.3");
    let header = file.spec_header().unwrap();

    assert!(header.is_empty());
    assert_eq!(header.build_context(&args(&[])).unwrap().to_json(), json!({ "inputs": {} }));
    assert_eq!(file.body(), "lint:\n  script: make lint\n");
}

#[test]
fn test_nested_template_is_found_and_validated() {
    let file = fetch_file("acme/ci/deploy@1.2");
    assert!(file.body().starts_with("deploy:"));

    let header = file.spec_header().unwrap();
    assert!(!header.is_empty());

    let context = header
        .build_context(&args(&[("environment", "staging"), ("replicas", "3")]))
        .unwrap();
    assert_eq!(context.to_json(), json!({ "inputs": { "environment": "staging", "replicas": 3 } }));
}

#[test]
fn test_all_input_errors_are_reported() {
    let header = fetch_file("acme/ci/deploy@1").spec_header().unwrap();

    let err = header
        .build_context(&args(&[("environment", "qa"), ("replicas", "many"), ("region", "eu")]))
        .unwrap_err();
    let ComponentError::InvalidInputs { errors } = err else {
        panic!("expected invalid inputs");
    };

    assert_eq!(errors.len(), 3);
    assert_eq!(errors[0], "unknown input arguments: region");
    assert!(errors.iter().any(|e| e.contains("`qa` cannot be used")));
    assert!(errors.iter().any(|e| e.contains("`replicas` input: provided value is not a number")));
}
