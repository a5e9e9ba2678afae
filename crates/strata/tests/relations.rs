use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use strata::{
    driver::mem::MemConnection, schema::Schema, stmt::Value, Db, ExecuteResponse, Pool,
};

fn schema() -> Schema {
    let mut schema = Schema::new();
    schema
        .register_json(
            "user",
            r#"{
                "connection": "main",
                "table": "user",
                "keys": ["userid"],
                "fields": {
                    "userid": {"type": "integer", "auto": true},
                    "username": {"type": "text"},
                    "first_name": {"type": "text"},
                    "last_name": {"type": "text"}
                },
                "subtables": {
                    "tasks": {"object": "task", "remote_field": "owner"}
                }
            }"#,
        )
        .unwrap();
    schema
        .register_json(
            "task",
            r#"{
                "connection": "main",
                "table": "task",
                "keys": ["id"],
                "fields": {
                    "id": {"type": "integer", "auto": true},
                    "name": {"type": "text"},
                    "owner": {
                        "type": "integer",
                        "link": "user",
                        "remote_field": "userid",
                        "display": "{first_name} {last_name}"
                    }
                }
            }"#,
        )
        .unwrap();
    schema
}

fn db() -> (Db, MemConnection) {
    let conn = MemConnection::new();
    let mut pool = Pool::new();
    pool.register("main", "mysql://app@localhost/app", Box::new(conn.clone()))
        .unwrap();
    (Db::new(schema(), pool), conn)
}

fn task_row() -> ExecuteResponse {
    ExecuteResponse::rows(vec![vec![
        Value::I64(1),
        Value::from("write report"),
        Value::I64(7),
    ]])
}

fn user_row() -> ExecuteResponse {
    ExecuteResponse::rows(vec![vec![
        Value::I64(7),
        Value::from("alice"),
        Value::from("Alice"),
        Value::from("Anders"),
    ]])
}

#[test]
fn link_materializes_the_target_with_a_back_reference() {
    let (db, conn) = db();
    conn.respond(task_row());

    let task = db.get("task", &[Value::I64(1)]).unwrap();
    let owner = task.link(&db, "owner").unwrap();

    assert_eq!(owner.entity_name(), "user");
    assert_eq!(owner.keys(), vec![Value::I64(7)]);
    assert!(owner.parent().unwrap().is_same(&task));

    // The child is the cached identity, not a private copy
    assert!(db.get("user", &[Value::I64(7)]).unwrap().is_same(&owner));

    // Repeated traversal reuses the handle, no extra query
    let count = conn.executed_count();
    assert!(task.link(&db, "owner").unwrap().is_same(&owner));
    assert_eq!(conn.executed_count(), count);
}

#[test]
fn collection_upgrades_lazily_with_key_only_handles() {
    let (db, conn) = db();

    let user = db.get("user", &[Value::I64(7)]).unwrap();
    let tasks = user.collection(&db, "tasks").unwrap();

    // Building the collection asks nothing of the database: the parent key
    // answers the filter value
    assert_eq!(conn.executed_count(), 0);
    assert!(!tasks.is_upgraded());

    conn.respond(ExecuteResponse::rows(vec![
        vec![Value::I64(1)],
        vec![Value::I64(2)],
    ]));
    let rows = tasks.entities(&db).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(conn.executed_count(), 1);

    let upgrade = &conn.executed()[0];
    assert_eq!(
        upgrade.sql,
        "SELECT task.id FROM task WHERE (task.owner = ?) ORDER BY task.id ASC"
    );
    assert_eq!(upgrade.params, vec![Value::I64(7)]);

    // Second pass reuses the upgrade
    tasks.entities(&db).unwrap();
    assert_eq!(conn.executed_count(), 1);

    // Row handles load individually on access
    conn.respond(task_row());
    assert_eq!(
        rows[0].get(&db, "name").unwrap(),
        Value::from("write report")
    );
    assert_eq!(conn.executed_count(), 2);
}

#[test]
fn eager_collections_seed_their_rows() {
    let (db, conn) = db();

    let user = db.get("user", &[Value::I64(7)]).unwrap();
    let tasks = user.collection(&db, "tasks").unwrap();
    tasks.set_eager(true);

    conn.respond(ExecuteResponse::rows(vec![
        vec![Value::I64(1), Value::from("write report"), Value::I64(7)],
        vec![Value::I64(2), Value::from("file report"), Value::I64(7)],
    ]));
    let rows = tasks.entities(&db).unwrap();
    assert_eq!(conn.executed_count(), 1);

    // Seeded rows answer without further queries
    assert_eq!(rows[1].get(&db, "name").unwrap(), Value::from("file report"));
    assert_eq!(conn.executed_count(), 1);
}

#[test]
fn collection_count_never_upgrades() {
    let (db, conn) = db();

    let user = db.get("user", &[Value::I64(7)]).unwrap();
    let tasks = user.collection(&db, "tasks").unwrap();

    conn.respond(ExecuteResponse::rows(vec![vec![Value::I64(3)]]));
    assert_eq!(tasks.count(&db).unwrap(), 3);
    assert!(!tasks.is_upgraded());
    assert_eq!(
        conn.executed()[0].sql,
        "SELECT COUNT(*) FROM task WHERE (task.owner = ?)"
    );
}

#[test]
fn collect_follows_display_templates() {
    let (db, conn) = db();
    conn.respond(task_row());
    conn.respond(user_row());

    let task = db.get("task", &[Value::I64(1)]).unwrap();
    let collected = task.collect(&db, &["name", "owner"]).unwrap();

    let mut expected = IndexMap::new();
    expected.insert("name".to_string(), Value::from("write report"));
    expected.insert("owner".to_string(), Value::from("Alice Anders"));
    assert_eq!(collected, Value::Record(expected));
}

#[test]
fn collect_flattens_subtables() {
    let (db, conn) = db();

    let user = db.get("user", &[Value::I64(7)]).unwrap();

    // Upgrade query, then one load per row accessed by collect
    conn.respond(ExecuteResponse::rows(vec![vec![Value::I64(1)]]));
    conn.respond(task_row());

    let collected = user.collect(&db, &["userid", "tasks"]).unwrap();
    let Value::Record(record) = collected else {
        panic!("expected a record");
    };
    assert_eq!(record["userid"], Value::I64(7));

    let Value::List(rows) = &record["tasks"] else {
        panic!("expected a list");
    };
    assert_eq!(rows.len(), 1);
    let Value::Record(row) = &rows[0] else {
        panic!("expected a record");
    };
    assert_eq!(row["name"], Value::from("write report"));
}

#[test]
fn clean_breaks_parent_back_references() {
    let (db, conn) = db();
    conn.respond(task_row());

    let task = db.get("task", &[Value::I64(1)]).unwrap();
    let owner = task.link(&db, "owner").unwrap();
    assert!(owner.parent().is_some());

    task.clean();
    assert!(owner.parent().is_none());

    // Cleaning again is a no-op
    task.clean();
}

#[test]
fn teardown_cleans_every_cached_handle() {
    let (db, conn) = db();
    conn.respond(task_row());

    let task = db.get("task", &[Value::I64(1)]).unwrap();
    let owner = task.link(&db, "owner").unwrap();

    db.teardown();
    assert_eq!(db.cache_len(), 0);
    assert!(owner.parent().is_none());
}
