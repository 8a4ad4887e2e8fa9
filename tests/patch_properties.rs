//! Property tests for text patching and manifest merging

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use template_stamper::config::FIELD_DISPLAY_TEXT;
use template_stamper::manifest::to_manifest_string;
use template_stamper::{merge_fields, AssetPatcher, Document, FieldSet, Recipe};

fn markup(name: &str) -> String {
    format!(
        "<html>\n<body>\n  <p class=\"app-name\">{name}</p>\n  <p class=\"publisher\">Publisher: X</p>\n</body>\n</html>\n"
    )
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        "[a-z0-9 ]{0,12}".prop_map(Value::from),
    ]
}

fn tree() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
            .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>()))
    })
}

fn object() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z]{1,4}", tree(), 0..6)
        .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>()))
}

proptest! {
    #[test]
    fn display_text_rule_is_idempotent(
        original in "[A-Za-z0-9 .-]{0,20}",
        replacement in "[A-Za-z0-9 .$-]{1,20}",
    ) {
        let rule = Recipe::default()
            .field(FIELD_DISPLAY_TEXT)
            .unwrap()
            .compile(&replacement)
            .unwrap();
        let patcher = AssetPatcher::new();
        let doc = Document::from(markup(&original));

        let once = patcher.apply(&doc, std::slice::from_ref(&rule)).unwrap().document;
        let twice = patcher.apply(&once, std::slice::from_ref(&rule)).unwrap().document;

        prop_assert_eq!(once.text(), twice.text());
        prop_assert_eq!(once.text(), markup(&replacement));
    }

    #[test]
    fn merge_leaves_other_top_level_keys_untouched(
        base in object(),
        value in leaf(),
        path in "(zz|q)\\.[a-z]{1,3}(\\.[a-z]{1,3})?",
    ) {
        let mut merged = base.clone();
        merge_fields(&mut merged, &FieldSet::new().set(path.clone(), value.clone()));

        let head = path.split('.').next().unwrap();
        for (key, original) in base.as_object().unwrap() {
            if key != head {
                prop_assert_eq!(&merged[key.as_str()], original);
            }
        }
        let pointer = format!("/{}", path.replace('.', "/"));
        prop_assert_eq!(merged.pointer(&pointer), Some(&value));
    }

    #[test]
    fn empty_merge_round_trips(base in object()) {
        let text = to_manifest_string(&base);
        let mut parsed: Value = serde_json::from_str(&text).unwrap();
        merge_fields(&mut parsed, &FieldSet::new());
        prop_assert_eq!(&parsed, &base);
        prop_assert_eq!(to_manifest_string(&parsed), text);
    }
}

#[test]
fn merge_keeps_sibling_leaves_inside_touched_branch() {
    let mut value = json!({"build": {"win": {"target": "nsis", "publisherName": "X"}}});
    merge_fields(&mut value, &FieldSet::new().set("build.win.icon", "assets/icon.png"));
    assert_eq!(value["build"]["win"]["publisherName"], "X");
    assert_eq!(value["build"]["win"]["target"], "nsis");
}
