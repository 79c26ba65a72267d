//! Typed ShopConfig view over the merged YAML.

use drk_config::{
    load_layered_yaml_from_strings, report_unused_keys, ShopConfig, StaffLoginMode,
    UnusedKeyPolicy,
};
use drk_order::{PhoneRule, StatusMatchRule};

#[test]
fn empty_document_yields_defaults() {
    let cfg = load_layered_yaml_from_strings(&["{}"]).unwrap().shop().unwrap();
    assert_eq!(cfg, ShopConfig::default());
    assert_eq!(cfg.server.bind_addr, "127.0.0.1:4000");
    assert_eq!(cfg.database.url_env, "DRK_DATABASE_URL");
    assert_eq!(cfg.ordering.phone_rule, PhoneRule::TenDigits);
    assert_eq!(cfg.ordering.status_match, StatusMatchRule::Prefix);
    assert_eq!(cfg.ordering.default_store_id, None);
    assert_eq!(cfg.staff.login, StaffLoginMode::Database);
    assert_eq!(cfg.staff.pass_key_env, "DRK_STAFF_KEY");
}

#[test]
fn fixed_staff_login_and_rules_parse() {
    let yaml = r#"
ordering:
  phone_rule: mobile_prefix
  status_match: exact
  default_store_id: 3
staff:
  login:
    mode: fixed
    id: "A001"
    store_id: 3
"#;
    let cfg = load_layered_yaml_from_strings(&[yaml]).unwrap().shop().unwrap();
    assert_eq!(cfg.ordering.phone_rule, PhoneRule::MobilePrefix);
    assert_eq!(cfg.ordering.status_match, StatusMatchRule::Exact);
    assert_eq!(cfg.ordering.default_store_id, Some(3));
    assert_eq!(
        cfg.staff.login,
        StaffLoginMode::Fixed {
            id: "A001".to_string(),
            store_id: 3
        }
    );
}

#[test]
fn unknown_rule_value_is_an_error() {
    let yaml = "ordering:\n  phone_rule: eleven_digits\n";
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    assert!(loaded.shop().is_err());
}

#[test]
fn unused_keys_are_reported() {
    let yaml = r#"
server:
  bind_addr: "0.0.0.0:4000"
legacy:
  cursor_shared: true
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();

    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(report.unused_leaf_pointers, vec!["/legacy/cursor_shared".to_string()]);

    assert!(report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).is_err());
}
