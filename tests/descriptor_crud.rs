use anyhow::Result;
use dbhelper::{Data, DbError, DbHelper, Descriptor, Value};
use tempfile::NamedTempFile;

// Helper to create a file-backed database; the helper reopens it per call,
// so in-memory databases would lose their state between operations.
fn create_temp_db() -> Result<(DbHelper, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let db = DbHelper::new(temp_file.path());
    Ok((db, temp_file))
}

// Seed the events table the way the sample app lays it out
fn seed_events(db: &DbHelper) -> Result<()> {
    db.exec("CREATE TABLE events (id INTEGER PRIMARY KEY, country TEXT, name TEXT)")?;
    Ok(())
}

#[test]
fn insert_then_read_back() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    seed_events(&db)?;

    let row_id = db.set(
        &Descriptor::table("events").with_data(
            Data::new()
                .with_value("country", "Chile")
                .with_value("name", "X"),
        ),
    )?;
    assert_eq!(row_id, 1);

    let records = db.get(&Descriptor::table("events").with_order("id DESC").with_limit(1));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("country"), Some(&Value::from("Chile")));
    assert_eq!(records[0].get("name"), Some(&Value::from("X")));
    Ok(())
}

#[test]
fn update_reports_affected_rows() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    seed_events(&db)?;
    db.set(&Descriptor::table("events").with_data(Data::new().with_value("name", "X")))?;

    let affected = db.update(
        &Descriptor::table("events")
            .with_where("id=1")
            .with_data(Data::new().with_value("name", "Y")),
    )?;
    assert_eq!(affected, 1);

    let missed = db.update(
        &Descriptor::table("events")
            .with_where("id=99")
            .with_data(Data::new().with_value("name", "Z")),
    )?;
    assert_eq!(missed, 0);

    let entry = db.get_entry(&Descriptor::table("events").with_id(1i64)).unwrap();
    assert_eq!(entry.get("name"), Some(&Value::from("Y")));
    Ok(())
}

#[test]
fn edit_is_an_update_alias() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    seed_events(&db)?;
    db.set(&Descriptor::table("events").with_data(Data::new().with_value("name", "X")))?;

    // id stands in for the missing where clause
    let affected = db.edit(
        &Descriptor::table("events")
            .with_id(1i64)
            .with_data(Data::new().with_value("name", "Y")),
    )?;
    assert_eq!(affected, 1);
    Ok(())
}

#[test]
fn create_from_json_builds_and_loads_the_table() -> Result<()> {
    let (db, _file) = create_temp_db()?;

    db.create_from_json(r#"[{"a":"1","b":"2"}]"#, "T")?;

    assert!(db.table_exists("T"));
    let records = db.get(&Descriptor::table("T"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("a"), Some(&Value::from("1")));
    assert_eq!(records[0].get("b"), Some(&Value::from("2")));

    // records serialize back to the flat object they were loaded from
    let json = serde_json::to_value(&records[0])?;
    assert_eq!(json["a"], "1");
    assert_eq!(json["b"], "2");
    Ok(())
}

#[test]
fn create_from_json_coerces_every_value_to_text() -> Result<()> {
    let (db, _file) = create_temp_db()?;

    db.create_from_json(
        r#"[{"name":"Ricardo Alcocer","uid":"ralcocer","age":40},{"name":"Jack Bauer","uid":"jack","age":38}]"#,
        "users",
    )?;

    let records = db.get(&Descriptor::table("users").with_order("uid ASC"));
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("uid"), Some(&Value::from("jack")));
    assert_eq!(records[0].get("age"), Some(&Value::from("38")));
    Ok(())
}

#[test]
fn create_from_json_rejects_an_empty_sample() -> Result<()> {
    let (db, _file) = create_temp_db()?;

    let err = db.create_from_json("[]", "T").unwrap_err();
    assert!(matches!(err, DbError::EmptySample { .. }));
    assert!(!db.table_exists("T"));
    Ok(())
}

#[test]
fn table_exists_is_false_for_unknown_names() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    assert!(!db.table_exists("never_created"));
    Ok(())
}

#[test]
fn drop_table_removes_the_table() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    seed_events(&db)?;
    assert!(db.table_exists("events"));

    db.drop_table("events")?;
    assert!(!db.table_exists("events"));

    // dropping again references a table that no longer exists
    assert!(db.drop_table("events").is_err());
    Ok(())
}

#[test]
fn add_column_is_idempotent() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    seed_events(&db)?;

    db.add_column("events", "venue", "TEXT")?;
    db.add_column("events", "venue", "TEXT")?;

    let info = db.exec("PRAGMA TABLE_INFO(events)")?;
    let venues = info
        .iter()
        .filter(|record| record.get("name") == Some(&Value::from("venue")))
        .count();
    assert_eq!(venues, 1);
    assert_eq!(info.len(), 4);
    Ok(())
}

#[test]
fn count_rows_matches_select_length() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    seed_events(&db)?;
    for name in ["a", "b", "c"] {
        db.set(&Descriptor::table("events").with_data(Data::new().with_value("name", name)))?;
    }

    let counted = db.count_rows(&Descriptor::table("events"));
    let listed = db.get(&Descriptor::table("events").with_fields("*"));
    assert_eq!(counted, Some(listed.len() as i64));

    let filtered = db.count_rows(&Descriptor::table("events").with_where("name=\"a\""));
    assert_eq!(filtered, Some(1));
    Ok(())
}

#[test]
fn where_in_filters_against_the_named_column() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    seed_events(&db)?;
    for country in ["Chile", "Peru", "Japan"] {
        db.set(&Descriptor::table("events").with_data(Data::new().with_value("country", country)))?;
    }

    let records = db.get(
        &Descriptor::table("events")
            .with_where("country")
            .with_where_in(&["Chile", "Peru"]),
    );
    assert_eq!(records.len(), 2);
    Ok(())
}

#[test]
fn insert_or_replace_overwrites_matching_keys() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    seed_events(&db)?;
    db.set(
        &Descriptor::table("events")
            .with_data(Data::new().with_value("id", 1i64).with_value("name", "old")),
    )?;

    let row_id = db.insert_or_replace(
        &Descriptor::table("events")
            .with_data(Data::new().with_value("id", 1i64).with_value("name", "new")),
    )?;
    assert_eq!(row_id, 1);
    assert_eq!(db.count_rows(&Descriptor::table("events")), Some(1));

    let entry = db.get_entry(&Descriptor::table("events").with_id(1i64)).unwrap();
    assert_eq!(entry.get("name"), Some(&Value::from("new")));
    Ok(())
}

#[test]
fn delete_reports_affected_rows() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    seed_events(&db)?;
    for name in ["a", "b"] {
        db.set(&Descriptor::table("events").with_data(Data::new().with_value("name", name)))?;
    }

    let affected = db.delete(&Descriptor::table("events"))?;
    assert_eq!(affected, 2);
    assert!(db.get(&Descriptor::table("events")).is_empty());
    Ok(())
}

#[test]
fn get_entry_by_field_compares_as_text() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    db.create_from_json(
        r#"[{"name":"Ricardo Alcocer","uid":"ralcocer"},{"name":"Jack Bauer","uid":"jack"}]"#,
        "users",
    )?;

    let entry = db
        .get_entry(&Descriptor::table("users").with_field("uid").with_id("jack"))
        .unwrap();
    assert_eq!(entry.get("name"), Some(&Value::from("Jack Bauer")));

    assert!(db
        .get_entry(&Descriptor::table("users").with_field("uid").with_id("nobody"))
        .is_none());
    Ok(())
}

#[test]
fn last_row_helpers_track_the_highest_id() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    seed_events(&db)?;

    let probe = Descriptor::table("events");
    assert_eq!(db.get_last_id(&probe), None);
    assert!(db.get_last_entry(&probe).is_none());

    db.set(&Descriptor::table("events").with_data(Data::new().with_value("name", "first")))?;
    db.set(&Descriptor::table("events").with_data(Data::new().with_value("name", "second")))?;

    assert_eq!(db.get_last_id(&probe), Some(2));
    let entry = db.get_last_entry(&probe).unwrap();
    assert_eq!(entry.get("name"), Some(&Value::from("second")));
    Ok(())
}

#[test]
fn callbacks_fire_once_with_the_direct_result() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    seed_events(&db)?;
    db.set(&Descriptor::table("events").with_data(Data::new().with_value("name", "X")))?;

    let descriptor = Descriptor::table("events");
    let direct = db.get(&descriptor);

    let mut seen = None;
    db.get_with(&descriptor, |records| seen = Some(records));
    assert_eq!(seen, Some(direct));

    let mut counted = None;
    db.count_rows_with(&descriptor, |count| counted = Some(count));
    assert_eq!(counted, Some(Some(1)));

    let mut last = None;
    db.get_last_id_with(&descriptor, |id| last = Some(id));
    assert_eq!(last, Some(Some(1)));
    Ok(())
}

#[test]
fn failed_reads_yield_empty_results_but_writes_propagate() -> Result<()> {
    let (db, _file) = create_temp_db()?;

    assert!(db.get(&Descriptor::table("missing")).is_empty());
    assert!(db.get_entry(&Descriptor::table("missing").with_id(1i64)).is_none());
    assert_eq!(db.count_rows(&Descriptor::table("missing")), None);

    let err = db
        .set(&Descriptor::table("missing").with_data(Data::new().with_value("name", "X")))
        .unwrap_err();
    assert!(matches!(err, DbError::Statement { .. }));
    Ok(())
}

#[test]
fn dropped_values_surface_as_a_column_count_mismatch() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    seed_events(&db)?;

    // the boolean is dropped from the value list, so the statement carries
    // two columns and one value and the store rejects it
    let result = db.set(
        &Descriptor::table("events").with_data(
            Data::new()
                .with_value("name", "X")
                .with_value("country", true),
        ),
    );
    assert!(result.is_err());
    Ok(())
}

#[test]
fn exec_commits_and_returns_decoded_rows() -> Result<()> {
    let (db, _file) = create_temp_db()?;

    db.exec("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)")?;
    assert!(db.table_exists("notes"));

    db.exec("INSERT INTO notes (body) VALUES (\"hello\")")?;
    let rows = db.exec("SELECT body FROM notes")?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("body"), Some(&Value::from("hello")));

    // a failing wrapped statement is swallowed, the transaction still closes
    let empty = db.exec("SELECT * FROM nowhere")?;
    assert!(empty.is_empty());
    Ok(())
}

#[test]
fn get_image_returns_the_stored_blob() -> Result<()> {
    let (db, _file) = create_temp_db()?;
    db.exec("CREATE TABLE pics (id INTEGER PRIMARY KEY, img BLOB)")?;
    db.exec("INSERT INTO pics (img) VALUES (X'010203')")?;

    let image = db.get_image(&Descriptor::table("pics").with_field("img"));
    assert_eq!(image, Some(Value::Blob(vec![1, 2, 3])));
    Ok(())
}
