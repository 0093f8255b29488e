use rowgate::{
    EntityDeclaration, Errors, FieldMap, Gateway, GatewayError, MemoryDriver, MetadataRegistry,
    StorageDriver, ValidationError, Value, WriteOp, field_map,
};
use std::sync::Arc;

fn widget_registry() -> MetadataRegistry {
    MetadataRegistry::new()
        .with_entity(
            EntityDeclaration::new("Widget")
                .table("widgets")
                .primary_key("id")
                .fields(["id", "name"])
                .rule("name", "required"),
        )
        .unwrap()
        .with_entity(
            EntityDeclaration::new("Note")
                .table("notes")
                .primary_key("note_id")
                .fields(["note_id", "body", "author"]),
        )
        .unwrap()
}

fn widget_gateway() -> Gateway<MemoryDriver> {
    let driver = MemoryDriver::new()
        .with_table("widgets", Some("id"))
        .unwrap()
        .with_table("notes", Some("note_id"))
        .unwrap();
    Gateway::new(widget_registry(), driver)
}

#[test]
fn test_required_name_scenario() {
    let gateway = widget_gateway();
    let mut widget = gateway.new_entity("Widget").unwrap();
    widget.mark_dirty("name").unwrap();

    let errors = gateway.validate(&widget).unwrap();
    assert_eq!(errors.into_vec(), vec![ValidationError::new("name", "required")]);
}

#[test]
fn test_update_scenario() {
    let gateway = widget_gateway();
    let mut widget = gateway
        .load_entity("Widget", field_map([("id", Value::from(5)), ("name", "Bolt".into())]))
        .unwrap();
    widget.mark_dirty("name").unwrap();
    gateway.save(&widget).unwrap();

    assert_eq!(
        gateway.driver().writes().unwrap(),
        vec![WriteOp::Update {
            table: "widgets".into(),
            key_field: "id".into(),
            key_value: Value::Integer(5),
            fields: field_map([("name", "Bolt")]),
        }]
    );
}

#[test]
fn test_insert_scenario() {
    let gateway = widget_gateway();
    let mut widget = gateway.new_entity("Widget").unwrap();
    widget.set("name", "Nut").unwrap();
    widget.mark_dirty("name").unwrap();
    gateway.save(&widget).unwrap();

    assert_eq!(
        gateway.driver().writes().unwrap(),
        vec![WriteOp::Insert {
            table: "widgets".into(),
            fields: field_map([("name", "Nut")]),
        }]
    );
    // The driver generated a key, but the entity is not told about it.
    assert_eq!(
        gateway.driver().rows("widgets").unwrap()[0].get("id"),
        Some(&Value::Integer(1))
    );
    assert!(widget.is_new());
}

#[test]
fn test_clean_existing_entity_makes_no_storage_call() {
    let gateway = widget_gateway();
    let widget = gateway.load_entity("Widget", field_map([("id", 5)])).unwrap();
    gateway.save(&widget).unwrap();
    assert!(gateway.driver().writes().unwrap().is_empty());
}

#[test]
fn test_validate_with_nothing_dirty_is_empty() {
    let gateway = widget_gateway();
    // `name` is unset and required, but nothing was marked dirty.
    let widget = gateway.new_entity("Widget").unwrap();
    assert_eq!(gateway.validate(&widget).unwrap(), Errors::new());
}

#[test]
fn test_validate_without_rules_is_empty() {
    let gateway = widget_gateway();
    let mut note = gateway.new_entity("Note").unwrap();
    note.mark_dirty("body")
        .unwrap()
        .mark_dirty("author")
        .unwrap()
        .mark_dirty("note_id")
        .unwrap();
    assert!(gateway.validate(&note).unwrap().is_empty());
}

#[test]
fn test_clean_fields_never_reach_storage() {
    let gateway = widget_gateway();
    let mut note = gateway
        .load_entity(
            "Note",
            field_map([
                ("note_id", Value::from(3)),
                ("body", "draft".into()),
                ("author", "sam".into()),
            ]),
        )
        .unwrap();
    note.set("author", "alex").unwrap();
    note.assign("body", "final").unwrap();
    gateway.save(&note).unwrap();

    let writes = gateway.driver().writes().unwrap();
    let WriteOp::Update { fields, .. } = &writes[0] else {
        panic!("expected an update, got {:?}", writes);
    };
    assert_eq!(fields, &field_map([("body", "final")]));

    let row = gateway
        .driver()
        .find("notes", "note_id", &Value::Integer(3))
        .unwrap();
    // Nothing was stored for note 3, so the update matched no rows.
    assert!(row.is_none());
}

#[test]
fn test_save_twice_issues_two_identical_writes() {
    let gateway = widget_gateway();

    let mut existing = gateway.load_entity("Widget", field_map([("id", 7)])).unwrap();
    existing.assign("name", "Gear").unwrap();
    gateway.save(&existing).unwrap();
    gateway.save(&existing).unwrap();

    let mut fresh = gateway.new_entity("Widget").unwrap();
    fresh.assign("name", "Cog").unwrap();
    gateway.save(&fresh).unwrap();
    gateway.save(&fresh).unwrap();

    let writes = gateway.driver().writes().unwrap();
    assert_eq!(writes.len(), 4);
    assert_eq!(writes[0], writes[1]);
    assert!(matches!(writes[0], WriteOp::Update { .. }));
    assert_eq!(writes[2], writes[3]);
    assert!(matches!(writes[2], WriteOp::Insert { .. }));
    // Inserting twice produced two rows.
    assert_eq!(gateway.driver().rows("widgets").unwrap().len(), 2);
}

#[test]
fn test_delete_without_identifier_always_fails() {
    let gateway = widget_gateway();
    let states: Vec<FieldMap> = vec![
        FieldMap::new(),
        field_map([("name", "Nut")]),
        field_map([("id", Value::Null), ("name", "Nut".into())]),
    ];

    for state in states {
        let mut widget = gateway.load_entity("Widget", state).unwrap();
        widget.mark_dirty("name").unwrap();
        let err = gateway.delete(&widget).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidState(_)), "{:?}", err);
    }
    assert!(gateway.driver().writes().unwrap().is_empty());
}

#[test]
fn test_restore_inserts_even_with_primary_key() {
    let gateway = widget_gateway();
    let mut widget = gateway
        .load_entity("Widget", field_map([("id", Value::from(9)), ("name", "Spring".into())]))
        .unwrap();
    widget.mark_dirty("id").unwrap().mark_dirty("name").unwrap();
    gateway.restore(&widget).unwrap();

    assert_eq!(
        gateway.driver().writes().unwrap(),
        vec![WriteOp::Insert {
            table: "widgets".into(),
            fields: field_map([("id", Value::from(9)), ("name", "Spring".into())]),
        }]
    );
    assert!(
        gateway
            .driver()
            .find("widgets", "id", &Value::Integer(9))
            .unwrap()
            .is_some()
    );
}

#[test]
fn test_restore_with_max_key_is_a_storage_error() {
    let gateway = widget_gateway();
    let mut widget = gateway
        .load_entity("Widget", field_map([("id", Value::from(i64::MAX)), ("name", "Spring".into())]))
        .unwrap();
    widget.mark_dirty("id").unwrap().mark_dirty("name").unwrap();

    let err = gateway.restore(&widget).unwrap_err();
    assert!(matches!(err, GatewayError::Storage(_)), "{:?}", err);
    assert!(gateway.driver().rows("widgets").unwrap().is_empty());
    assert!(gateway.driver().writes().unwrap().is_empty());
}

#[test]
fn test_lifecycle_insert_update_delete() {
    let gateway = widget_gateway();

    let mut widget = gateway.new_entity("Widget").unwrap();
    widget.assign("name", "Nut").unwrap();
    gateway.save(&widget).unwrap();

    let stored = gateway
        .driver()
        .find("widgets", "name", &Value::from("Nut"))
        .unwrap()
        .unwrap();
    let mut loaded = gateway.load_entity("Widget", stored).unwrap();
    assert!(!loaded.is_new());

    loaded.assign("name", "Lock nut").unwrap();
    gateway.save(&loaded).unwrap();
    let key = loaded.primary_key_value().cloned().unwrap();
    let row = gateway.driver().find("widgets", "id", &key).unwrap().unwrap();
    assert_eq!(row.get("name"), Some(&Value::from("Lock nut")));

    gateway.delete(&loaded).unwrap();
    assert!(gateway.driver().rows("widgets").unwrap().is_empty());
    // The instance keeps its state after delete.
    assert!(loaded.is_dirty("name"));
    assert_eq!(loaded.get("name"), Some(&Value::from("Lock nut")));
}

#[test]
fn test_driver_failure_propagates_unchanged() {
    struct Offline;

    impl StorageDriver for Offline {
        fn insert(&self, _: &str, _: &FieldMap) -> rowgate::Result<()> {
            Err(GatewayError::storage("connection refused"))
        }

        fn update(&self, _: &str, _: &str, _: &Value, _: &FieldMap) -> rowgate::Result<()> {
            Err(GatewayError::storage("connection refused"))
        }

        fn delete(&self, _: &str, _: &str, _: &Value) -> rowgate::Result<()> {
            Err(GatewayError::storage("connection refused"))
        }
    }

    let gateway = Gateway::new(widget_registry(), Offline);
    let mut widget = gateway.new_entity("Widget").unwrap();
    widget.assign("name", "Nut").unwrap();

    let err = gateway.save(&widget).unwrap_err();
    assert!(matches!(err, GatewayError::Storage(_)));
    assert_eq!(err.to_string(), "connection refused");
}

#[test]
fn test_shared_driver_through_arc() {
    let driver = Arc::new(MemoryDriver::new().with_table("widgets", Some("id")).unwrap());
    let gateway = Gateway::new(widget_registry(), Arc::clone(&driver));

    let mut widget = gateway.new_entity("Widget").unwrap();
    widget.assign("name", "Nut").unwrap();
    gateway.save(&widget).unwrap();

    assert_eq!(driver.rows("widgets").unwrap().len(), 1);
}

#[test]
fn test_unknown_entity_type_is_configuration_error() {
    let gateway = widget_gateway();
    assert!(matches!(
        gateway.new_entity("Gadget"),
        Err(GatewayError::Configuration(_))
    ));
}
