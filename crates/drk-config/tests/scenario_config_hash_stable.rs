//! Config hash stability.
//!
//! GREEN when:
//! - the same layers hash identically across calls
//! - key order in the YAML source does not change the hash
//! - different values hash differently
//! - later layers override earlier ones

use drk_config::load_layered_yaml_from_strings;

const BASE_YAML: &str = r#"
server:
  bind_addr: "127.0.0.1:4000"
ordering:
  phone_rule: ten_digits
  status_match: prefix
staff:
  login:
    mode: database
"#;

const BASE_YAML_REORDERED: &str = r#"
staff:
  login:
    mode: database
ordering:
  status_match: prefix
  phone_rule: ten_digits
server:
  bind_addr: "127.0.0.1:4000"
"#;

const OVERLAY_YAML: &str = r#"
ordering:
  status_match: exact
  default_store_id: 2
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn reordered_keys_produce_same_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(
        a.config_hash, b.config_hash,
        "reordering keys in YAML must not change the hash"
    );
}

#[test]
fn different_values_produce_different_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_ne!(a.config_hash, b.config_hash);
}

#[test]
fn overlay_overrides_base() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_eq!(
        loaded
            .config_json
            .pointer("/ordering/status_match")
            .and_then(|v| v.as_str()),
        Some("exact")
    );
    // Untouched sibling keys survive the merge.
    assert_eq!(
        loaded
            .config_json
            .pointer("/ordering/phone_rule")
            .and_then(|v| v.as_str()),
        Some("ten_digits")
    );
}

#[test]
fn hash_is_64_hex_chars() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(loaded.config_hash.len(), 64);
    assert!(loaded.config_hash.chars().all(|c| c.is_ascii_hexdigit()));
}
