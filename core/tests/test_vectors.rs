//! Verify the parser against JSON test vectors stored in `test-vectors/`.
//!
//! Each case pairs raw command text with the descriptor it must produce.
//! Descriptors are compared as JSON values so header ordering is irrelevant.

use curlrelay_core::{parse, RequestDescriptor};

#[test]
fn parse_test_vectors() {
    let raw = include_str!("../../test-vectors/parse.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = case["input"].as_str().unwrap();

        let descriptor = parse(input);
        let expected: RequestDescriptor = serde_json::from_value(case["expected"].clone()).unwrap();
        assert_eq!(descriptor, expected, "{name}");

        let actual = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(actual, case["expected"], "{name}: serialized form");
    }
}

#[test]
fn every_vector_with_url_has_absolute_url() {
    let raw = include_str!("../../test-vectors/parse.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let descriptor = parse(case["input"].as_str().unwrap());
        if descriptor.has_url() {
            assert!(
                descriptor.url.starts_with("http://") || descriptor.url.starts_with("https://"),
                "{}",
                case["name"]
            );
        }
    }
}
