use pretty_assertions::assert_eq;
use std::sync::Arc;
use strata_core::{
    schema::{EntityType, RoleSet, Schema},
    stmt::{CompareOp, Direction, Value, WherePart},
};
use strata_sql::{JoinKind, JoinNode, JoinQuery, Page, Serializer};

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
                    "password": {"type": "text", "read_by": ["nobody"]}
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
                    "owner": {"type": "integer", "link": "user", "remote_field": "userid"}
                }
            }"#,
        )
        .unwrap();
    schema
}

fn resolve(schema: &Schema, name: &str) -> Arc<EntityType> {
    schema.resolve(name, &RoleSet::anonymous()).unwrap()
}

fn task_owner_query(schema: &Schema) -> JoinQuery {
    let task = resolve(schema, "task");
    let user = resolve(schema, "user");

    let mut root = JoinNode::new(task, "t");
    root.project("name", None).unwrap();
    let mut owner = JoinNode::new(user, "u");
    owner.project("username", None).unwrap();

    let mut query = JoinQuery::new();
    query.attach_root(root).unwrap();
    query.attach_link("t", "owner", owner).unwrap();
    query
}

#[test]
fn link_join_derives_on_clause() {
    let schema = schema();
    let query = task_owner_query(&schema);

    let stmt = query.compile(&Serializer::mysql(), None).unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT t.name AS t_name, u.username AS u_username \
         FROM (task AS t LEFT OUTER JOIN user AS u ON (t.owner = u.userid))"
    );
    assert_eq!(stmt.columns, ["t_name", "u_username"]);
    assert!(stmt.params.is_empty());
}

#[test]
fn nested_joins_parenthesize_depth_first() {
    let schema = schema();
    let task = resolve(&schema, "task");
    let user = resolve(&schema, "user");

    let mut root = JoinNode::new(task.clone(), "t");
    root.project("id", None).unwrap();
    let mut owner = JoinNode::new(user, "u");
    owner.project("username", None).unwrap();
    let mut sub = JoinNode::new(task, "t2");
    sub.project("id", None).unwrap();

    let mut query = JoinQuery::new();
    query.attach_root(root).unwrap();
    query.attach_link("t", "owner", owner).unwrap();
    query
        .attach("u", JoinKind::Inner, "u.userid = t2.owner", sub)
        .unwrap();

    let stmt = query.compile(&Serializer::mysql(), None).unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT t.id AS t_id, u.username AS u_username, t2.id AS t2_id \
         FROM (task AS t LEFT OUTER JOIN (user AS u INNER JOIN task AS t2 \
         ON (u.userid = t2.owner)) ON (t.owner = u.userid))"
    );
}

#[test]
fn per_node_filters_are_anded() {
    let schema = schema();
    let mut query = task_owner_query(&schema);

    let task = resolve(&schema, "task");
    let user = resolve(&schema, "user");

    query
        .node_mut("t")
        .unwrap()
        .filter_mut()
        .and(WherePart::new(
            task.field("name").unwrap().reference(),
            CompareOp::Like,
            Value::from("a%"),
        ))
        .unwrap();
    query
        .node_mut("u")
        .unwrap()
        .filter_mut()
        .and(WherePart::eq(
            user.field("username").unwrap().reference(),
            Value::from("alice"),
        ))
        .unwrap();

    let stmt = query.compile(&Serializer::mysql(), None).unwrap();
    assert!(stmt
        .sql
        .ends_with("WHERE ((t.name LIKE ?)) AND ((u.username = ?))"));
    assert_eq!(stmt.params, vec![Value::from("a%"), Value::from("alice")]);
}

#[test]
fn order_by_insertion_index() {
    let schema = schema();
    let mut query = task_owner_query(&schema);

    query.order_by("u", "username", Direction::Desc, None).unwrap();
    query.order_by("t", "id", Direction::Asc, Some(0)).unwrap();

    let stmt = query.compile(&Serializer::mysql(), None).unwrap();
    assert!(stmt.sql.ends_with("ORDER BY t.id ASC, u.username DESC"));
}

#[test]
fn group_by_scopes_to_alias() {
    let schema = schema();
    let user = resolve(&schema, "user");

    let mut root = JoinNode::new(user, "u");
    root.project("username", None).unwrap();
    root.project_raw("COUNT(*)", Some("n"));

    let mut query = JoinQuery::new();
    query.attach_root(root).unwrap();
    query.group_by("u", "username", None).unwrap();

    let stmt = query.compile(&Serializer::mysql(), None).unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT u.username AS u_username, COUNT(*) AS n FROM user AS u GROUP BY u.username"
    );
    assert_eq!(stmt.columns, ["u_username", "n"]);
}

#[test]
fn alias_registry_rejects_duplicates_at_attach() {
    let schema = schema();
    let task = resolve(&schema, "task");
    let user = resolve(&schema, "user");

    let mut query = JoinQuery::new();
    query.attach_root(JoinNode::new(task.clone(), "t")).unwrap();

    let err = query
        .attach_link("t", "owner", JoinNode::new(user, "t"))
        .unwrap_err();
    assert!(err.is_query_shape());

    let err = query.attach_root(JoinNode::new(task, "t2")).unwrap_err();
    assert!(err.is_query_shape());
}

#[test]
fn failed_attach_does_not_poison_the_alias() {
    let schema = schema();
    let task = resolve(&schema, "task");
    let user = resolve(&schema, "user");

    let mut query = JoinQuery::new();
    query.attach_root(JoinNode::new(task, "t")).unwrap();

    // Unknown parent: the child's alias must stay unregistered
    let err = query
        .attach("nope", JoinKind::Inner, "1 = 1", JoinNode::new(user.clone(), "u"))
        .unwrap_err();
    assert!(err.is_query_shape());

    query.attach_link("t", "owner", JoinNode::new(user, "u")).unwrap();
    assert!(query.node("u").is_some());
}

#[test]
fn attach_link_validates_the_field() {
    let schema = schema();
    let task = resolve(&schema, "task");
    let user = resolve(&schema, "user");

    let mut query = JoinQuery::new();
    query.attach_root(JoinNode::new(task.clone(), "t")).unwrap();

    // Plain field, no link declared
    let err = query
        .attach_link("t", "name", JoinNode::new(user, "u"))
        .unwrap_err();
    assert!(err.is_query_shape());

    // Link target entity mismatch
    let err = query
        .attach_link("t", "owner", JoinNode::new(task, "u"))
        .unwrap_err();
    assert!(err.is_query_shape());
}

#[test]
fn compile_requires_root_and_projection() {
    let schema = schema();
    let task = resolve(&schema, "task");

    let err = JoinQuery::new()
        .compile(&Serializer::mysql(), None)
        .unwrap_err();
    assert!(err.is_query_shape());

    let mut query = JoinQuery::new();
    query.attach_root(JoinNode::new(task, "t")).unwrap();
    let err = query.compile(&Serializer::mysql(), None).unwrap_err();
    assert!(err.is_query_shape());
}

#[test]
fn pagination_is_dialect_specific() {
    let schema = schema();
    let query = task_owner_query(&schema);
    let page = Page {
        offset: 20,
        count: 10,
    };

    let stmt = query.compile(&Serializer::mysql(), Some(page)).unwrap();
    assert!(stmt.sql.ends_with(" LIMIT ?, ?"));
    assert_eq!(stmt.params, vec![Value::I64(20), Value::I64(10)]);

    let stmt = query.compile(&Serializer::oracle(), Some(page)).unwrap();
    assert!(stmt.sql.starts_with("SELECT * FROM (SELECT paged.*, ROWNUM rnum FROM (SELECT "));
    assert!(stmt.sql.ends_with("WHERE ROWNUM <= :1) WHERE rnum > :2"));
    assert_eq!(stmt.params, vec![Value::I64(30), Value::I64(20)]);
}
