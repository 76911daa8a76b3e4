use super::*;
use crate::models::{ColumnFacts, DatabaseFacts, TableFacts};
use proptest::prelude::*;

/// Every present textual attribute in visiting order.
fn texts<T: Sanitize + Clone>(value: &T) -> Vec<String> {
    let mut copy = value.clone();
    let mut seen = Vec::new();
    copy.sanitize_with(&mut |text| seen.push(text.clone()));
    seen
}

fn sample_model() -> DocumentModel {
    let mut id = ColumnFacts::new(1, " id ", "bigint");
    id.primary_key = true;
    id.remarks = Some("Row id\n| unique".to_string());
    let mut note = ColumnFacts::new(2, "note", "text");
    note.default_value = Some("'<none>'".to_string());

    let mut orders = TableFacts::new("orders", Some("  Orders & <b>refunds</b> ".to_string()));
    orders.columns = vec![id, note];
    orders.primary_keys = vec!["id".to_string()];

    DocumentModel {
        title: "  Shop ".to_string(),
        organization: Some("Acme\tLabs".to_string()),
        organization_url: None,
        version: "1.0.0".to_string(),
        description: None,
        database: DatabaseFacts::new("shop"),
        tables: vec![orders],
    }
}

#[test]
fn test_visits_parent_before_children() {
    let model = sample_model();
    assert_eq!(
        texts(&model),
        vec![
            "  Shop ",
            "Acme\tLabs",
            "1.0.0",
            "shop",
            "orders",
            "  Orders & <b>refunds</b> ",
            "id",
            " id ",
            "bigint",
            "Row id\n| unique",
            "note",
            "text",
            "'<none>'",
        ]
    );
}

#[derive(Debug, Clone, Default, Sanitize)]
struct Inner {
    label: String,
    weight: u32,
}

#[derive(Debug, Clone, Default, Sanitize)]
struct Outer {
    name: String,
    aliases: Vec<String>,
    #[sanitizer(skip)]
    raw: String,
    flag: bool,
    #[sanitizer(nested)]
    primary: Option<Inner>,
    #[sanitizer(nested)]
    others: Vec<Inner>,
}

#[test]
fn test_derive_covers_new_shapes() {
    let mut outer = Outer {
        name: " outer ".to_string(),
        aliases: vec![" a ".to_string(), "b ".to_string()],
        raw: "  keep  ".to_string(),
        flag: true,
        primary: Some(Inner { label: " p ".to_string(), weight: 7 }),
        others: vec![Inner { label: " o ".to_string(), weight: 3 }],
    };

    apply_transformation(&mut outer, Transformation::Trim);

    assert_eq!(outer.name, "outer");
    assert_eq!(outer.aliases, vec!["a", "b"]);
    assert_eq!(outer.raw, "  keep  ");
    assert!(outer.flag);
    assert_eq!(outer.primary.as_ref().map(|p| p.label.as_str()), Some("p"));
    assert_eq!(outer.primary.as_ref().map(|p| p.weight), Some(7));
    assert_eq!(outer.others[0].label, "o");
}

#[test]
fn test_absent_nested_value_is_skipped() {
    let mut outer = Outer {
        name: "x".to_string(),
        ..Default::default()
    };
    let mut visited = 0;
    outer.sanitize_with(&mut |_| visited += 1);
    assert_eq!(visited, 1);
}

#[test]
fn test_markdown_model() {
    let mut model = sample_model();
    sanitize_model(&mut model, OutputFormat::Markdown).unwrap();

    let orders = &model.tables[0];
    assert_eq!(model.title, "Shop");
    assert_eq!(model.organization.as_deref(), Some("Acme Labs"));
    assert_eq!(orders.remarks.as_deref(), Some("Orders & <b>refunds</b>"));
    assert_eq!(orders.columns[0].name, "id");
    assert_eq!(
        orders.columns[0].remarks.as_deref(),
        Some("Row id &#124; unique")
    );
    assert_eq!(orders.columns[1].remarks, None);
}

#[test]
fn test_word_model() {
    let mut model = sample_model();
    sanitize_model(&mut model, OutputFormat::Word).unwrap();

    let orders = &model.tables[0];
    assert_eq!(
        orders.remarks.as_deref(),
        Some("Orders &amp; &lt;b&gt;refunds&lt;/b&gt;")
    );
    assert_eq!(
        orders.columns[1].default_value.as_deref(),
        Some("&apos;&lt;none&gt;&apos;")
    );
    assert_eq!(
        orders.columns[0].remarks.as_deref(),
        Some("Row id\n| unique")
    );
    assert_eq!(model.organization.as_deref(), Some("Acme\tLabs"));
}

#[test]
fn test_html_model_is_only_trimmed() {
    let mut model = sample_model();
    let mut expected = model.clone();
    apply_transformation(&mut expected, Transformation::Trim);

    sanitize_model(&mut model, OutputFormat::Html).unwrap();
    assert_eq!(model, expected);
}

#[test]
fn test_untitled_model_is_rejected() {
    let mut model = sample_model();
    model.title = "   ".to_string();

    let error = sanitize_model(&mut model, OutputFormat::Html).unwrap_err();
    assert!(matches!(
        error,
        SchemaDocError::SanitizationInputInvalid { .. }
    ));
}

#[test]
fn test_nameless_table_is_rejected() {
    let mut model = sample_model();
    model.tables.push(TableFacts::new(" ", None));

    let error = sanitize_model(&mut model, OutputFormat::Markdown).unwrap_err();
    assert!(error.to_string().contains("position 1"));
}

#[test]
fn test_text_helpers() {
    assert!(matches!(trim("clean"), Cow::Borrowed(_)));
    assert_eq!(trim("\t padded \n"), "padded");
    assert!(matches!(escape_xml("plain text"), Cow::Borrowed(_)));
    assert_eq!(escape_xml("a&b"), "a&amp;b");
    assert_eq!(unescape_xml("&nbsp;&lt;"), "&nbsp;<");
    assert_eq!(unescape_xml("dangling &"), "dangling &");
    assert_eq!(replace_blank("a\r\n\tb"), "a b");
    assert_eq!(replace_blank("x|y"), format!("x{}y", CELL_DELIMITER_PLACEHOLDER));
    assert_eq!(Transformation::ReplaceBlank.to_string(), "replace-blank");
}

fn arb_text() -> impl Strategy<Value = String> {
    "[ a-z<>&'\"|\t\r\n]{0,12}"
}

fn arb_column() -> impl Strategy<Value = ColumnFacts> {
    (
        1u32..50,
        arb_text(),
        arb_text(),
        proptest::option::of(arb_text()),
        proptest::option::of(arb_text()),
    )
        .prop_map(|(ordinal, name, data_type, default_value, remarks)| {
            let mut column = ColumnFacts::new(ordinal, name, data_type);
            column.default_value = default_value;
            column.remarks = remarks;
            column
        })
}

fn arb_table() -> impl Strategy<Value = TableFacts> {
    (
        arb_text(),
        proptest::option::of(arb_text()),
        prop::collection::vec(arb_column(), 0..4),
        prop::collection::vec(arb_text(), 0..2),
    )
        .prop_map(|(name, remarks, columns, primary_keys)| {
            let mut table = TableFacts::new(name, remarks);
            table.columns = columns;
            table.primary_keys = primary_keys;
            table
        })
}

fn arb_model() -> impl Strategy<Value = DocumentModel> {
    (
        arb_text(),
        proptest::option::of(arb_text()),
        arb_text(),
        arb_text(),
        prop::collection::vec(arb_table(), 0..4),
    )
        .prop_map(|(title, organization, version, database, tables)| DocumentModel {
            title,
            organization,
            organization_url: None,
            version,
            description: None,
            database: DatabaseFacts::new(database),
            tables,
        })
}

/// Presence pattern of every optional textual attribute.
fn optional_shape(model: &DocumentModel) -> Vec<bool> {
    let mut shape = vec![model.organization.is_some(), model.description.is_some()];
    for table in &model.tables {
        shape.push(table.remarks.is_some());
        for column in &table.columns {
            shape.push(column.default_value.is_some());
            shape.push(column.remarks.is_some());
        }
    }
    shape
}

proptest! {
    #[test]
    fn trim_leaves_no_edge_whitespace(model in arb_model()) {
        let mut model = model;
        apply_transformation(&mut model, Transformation::Trim);
        for text in texts(&model) {
            prop_assert_eq!(text.trim(), text.as_str());
        }
    }

    #[test]
    fn escape_round_trips(value in any::<String>()) {
        let escaped = escape_xml(&value);
        prop_assert!(!escaped.contains(['<', '>', '"', '\'']));
        prop_assert_eq!(unescape_xml(&escaped), value.as_str());
    }

    #[test]
    fn escaped_model_round_trips(model in arb_model()) {
        let mut escaped = model.clone();
        apply_transformation(&mut escaped, Transformation::EscapeXml);
        sanitize(&mut escaped, unescape_xml);
        prop_assert_eq!(escaped, model);
    }

    #[test]
    fn blank_substitution_removes_cell_breakers(model in arb_model()) {
        let mut model = model;
        apply_transformation(&mut model, Transformation::ReplaceBlank);
        for text in texts(&model) {
            prop_assert!(!text.contains(['\n', '\r', '|']), "{:?}", text);
        }
    }

    #[test]
    fn passes_keep_shape_and_order(model in arb_model()) {
        for transformation in [Transformation::Trim, Transformation::EscapeXml, Transformation::ReplaceBlank] {
            let mut sanitized = model.clone();
            apply_transformation(&mut sanitized, transformation);

            prop_assert_eq!(optional_shape(&sanitized), optional_shape(&model));
            prop_assert_eq!(sanitized.tables.len(), model.tables.len());
            for (after, before) in sanitized.tables.iter().zip(&model.tables) {
                let after_positions: Vec<u32> = after.columns.iter().map(|c| c.ordinal_position).collect();
                let before_positions: Vec<u32> = before.columns.iter().map(|c| c.ordinal_position).collect();
                prop_assert_eq!(after_positions, before_positions);
                prop_assert_eq!(after.degraded, before.degraded);
            }
        }
    }
}
