use std::collections::BTreeMap;

use divvy_core::upload::apply_field_map;
use serde_json::json;

#[test]
fn field_map_rekeys_labels_to_widgets() {
    let rows = vec![json!({
        "person": "张三",
        "amount": 330.0,
        "date": "2025-04-01",
    })];

    let mut map = BTreeMap::new();
    map.insert("person".to_string(), "_widget_aaa".to_string());
    map.insert("amount".to_string(), "_widget_bbb".to_string());

    let mapped = apply_field_map(&rows, &map);
    assert_eq!(mapped.len(), 1);
    assert_eq!(mapped[0]["_widget_aaa"], json!({"value": "张三"}));
    assert_eq!(mapped[0]["_widget_bbb"], json!({"value": 330.0}));
    // unmapped labels pass through under their own name
    assert_eq!(mapped[0]["date"], json!({"value": "2025-04-01"}));
}

#[test]
fn empty_map_wraps_values_in_place() {
    let rows = vec![json!({"person": "李四", "amount": 80.0})];
    let mapped = apply_field_map(&rows, &BTreeMap::new());
    assert_eq!(mapped[0]["person"], json!({"value": "李四"}));
}
