//! Golden file tests for draft validation.
//!
//! Each JSON file in `fixtures/` holds a stored draft and the messages the
//! form should show for it.

use grabcook_core::{validate_draft, DraftRecipe, DraftSnapshot};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct TestCase {
    draft: DraftSnapshot,
    expected: Expected,
}

#[derive(Debug, Deserialize)]
struct Expected {
    valid: bool,
    messages: Vec<String>,
}

fn load_test_cases() -> Vec<(String, TestCase)> {
    let fixtures_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");

    let mut cases = Vec::new();
    for entry in fs::read_dir(&fixtures_dir).expect("Failed to read fixtures directory") {
        let path = entry.expect("Failed to read directory entry").path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            let name = path.file_stem().unwrap().to_string_lossy().into_owned();
            let content = fs::read_to_string(&path)
                .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
            let case: TestCase = serde_json::from_str(&content)
                .unwrap_or_else(|e| panic!("Failed to parse {}: {}", path.display(), e));
            cases.push((name, case));
        }
    }

    assert!(
        !cases.is_empty(),
        "No test fixtures found in {:?}",
        fixtures_dir
    );
    cases.sort_by(|a, b| a.0.cmp(&b.0));
    cases
}

#[test]
fn test_golden_validation() {
    let mut failures = Vec::new();

    for (name, case) in load_test_cases() {
        let draft = DraftRecipe::from(case.draft);
        let errors = validate_draft(&draft);

        if errors.is_valid() != case.expected.valid {
            failures.push(format!(
                "{}: expected valid={}, got valid={}",
                name,
                case.expected.valid,
                errors.is_valid()
            ));
        }
        let messages = errors.messages();
        if messages != case.expected.messages {
            failures.push(format!(
                "{}: messages differ\n  expected: {:?}\n  actual:   {:?}",
                name, case.expected.messages, messages
            ));
        }
    }

    assert!(failures.is_empty(), "\n{}", failures.join("\n"));
}
