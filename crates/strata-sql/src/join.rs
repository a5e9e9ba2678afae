use crate::serializer::{Comma, Formatter, Params, SelectItem, Serializer, ToSql, TypedParams};

use strata_core::{
    schema::EntityType,
    stmt::{CompiledStmt, Direction, OrderList, Printable, Type, Value, WhereList},
    Error, Result,
};

use std::{collections::HashSet, sync::Arc};

/// Join kinds. Structurally identical to emit; only the keyword differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Cross,
    Left,
    Right,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Cross => "CROSS JOIN",
            Self::Left => "LEFT OUTER JOIN",
            Self::Right => "RIGHT OUTER JOIN",
        }
    }
}

/// Requested page of a join query: skip `offset` rows, return `count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub count: i64,
}

/// One aliased entity node of a join tree.
///
/// A node starts unattached; attaching it to a query (as root or as a join
/// target) moves it in, so a node can never be attached twice.
#[derive(Debug, Clone)]
pub struct JoinNode {
    entity: Arc<EntityType>,
    alias: String,
    projection: Vec<ProjectedField>,
    filter: WhereList,
    joins: Vec<Join>,
}

#[derive(Debug, Clone)]
struct ProjectedField {
    expr: Printable,
    /// Output column name; `None` for raw fragments projected verbatim
    output: Option<String>,
}

#[derive(Debug, Clone)]
struct Join {
    kind: JoinKind,
    /// Fully resolved ON text; derived joins are resolved at attach time
    on: String,
    child: JoinNode,
}

impl JoinNode {
    pub fn new(entity: Arc<EntityType>, alias: impl Into<String>) -> JoinNode {
        JoinNode {
            entity,
            alias: alias.into(),
            projection: Vec::new(),
            filter: WhereList::new(),
            joins: Vec::new(),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn entity(&self) -> &EntityType {
        &self.entity
    }

    /// Project one readable field, re-aliased `<nodeAlias>_<fieldName>`
    /// unless a custom output name is given. Unknown or unreadable fields
    /// fail here, not at emit time.
    pub fn project(&mut self, field: &str, output: Option<&str>) -> Result<&mut Self> {
        let field = self.entity.field(field)?;
        let output = output
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}_{}", self.alias, field.name));
        self.projection.push(ProjectedField {
            expr: Printable::Field(field.reference()),
            output: Some(output),
        });
        Ok(self)
    }

    /// Project every readable field of the node's entity.
    pub fn project_all(&mut self) -> &mut Self {
        for field in self.entity.fields.values() {
            self.projection.push(ProjectedField {
                expr: Printable::Field(field.reference()),
                output: Some(format!("{}_{}", self.alias, field.name)),
            });
        }
        self
    }

    /// Project an opaque SQL fragment. Validation is bypassed by design;
    /// the caller is solely responsible for escaping.
    pub fn project_raw(&mut self, sql: impl Into<String>, output: Option<&str>) -> &mut Self {
        self.projection.push(ProjectedField {
            expr: Printable::Raw(sql.into()),
            output: output.map(str::to_string),
        });
        self
    }

    /// The node's own filter, scoped to its alias.
    pub fn filter_mut(&mut self) -> &mut WhereList {
        &mut self.filter
    }
}

/// A query across an arbitrary tree of joined entity aliases, compiled to
/// one SELECT.
#[derive(Debug, Clone, Default)]
pub struct JoinQuery {
    root: Option<JoinNode>,
    /// Query-wide alias registry; duplicate aliases fail at attach time so
    /// errors surface close to the mistake
    aliases: HashSet<String>,
    order: OrderList,
    group: OrderList,
}

impl JoinQuery {
    pub fn new() -> JoinQuery {
        JoinQuery::default()
    }

    /// Attach the root node. Exactly one root per query.
    pub fn attach_root(&mut self, node: JoinNode) -> Result<()> {
        if self.root.is_some() {
            return Err(Error::root_already_attached());
        }
        self.register_alias(&node.alias)?;
        self.root = Some(node);
        Ok(())
    }

    /// Attach a node under `parent` by following a foreign-key field.
    ///
    /// The ON clause is derived from the field's local/remote pair and the
    /// join defaults to LEFT OUTER.
    pub fn attach_link(&mut self, parent: &str, field: &str, node: JoinNode) -> Result<()> {
        let parent_node = self
            .node(parent)
            .ok_or_else(|| Error::query_shape(format!("no node with alias `{parent}`")))?;

        let link = {
            let field = parent_node.entity.field(field)?;
            field
                .link
                .clone()
                .ok_or_else(|| Error::not_a_join_field(&parent_node.entity.name, &field.name))?
        };
        if link.entity != node.entity.name {
            return Err(Error::query_shape(format!(
                "field `{}` links to `{}`, not `{}`",
                field, link.entity, node.entity.name
            )));
        }

        let local = parent_node.entity.field(&link.local_field)?;
        let remote = node.entity.field(&link.remote_field)?;
        let on = format!(
            "{} = {}",
            local.reference().aliased(parent),
            remote.reference().aliased(&node.alias),
        );

        self.attach(parent, JoinKind::Left, on, node)
    }

    /// Attach a node under `parent` with an explicit join kind and ON
    /// clause.
    pub fn attach(
        &mut self,
        parent: &str,
        kind: JoinKind,
        on: impl Into<String>,
        node: JoinNode,
    ) -> Result<()> {
        // Resolve the parent before touching the alias registry; a failed
        // attach must not leave the child's alias registered
        if self.node(parent).is_none() {
            return Err(Error::query_shape(format!("no node with alias `{parent}`")));
        }
        self.register_alias(&node.alias)?;
        let parent = self
            .node_mut(parent)
            .ok_or_else(|| Error::query_shape(format!("no node with alias `{parent}`")))?;
        parent.joins.push(Join {
            kind,
            on: on.into(),
            child: node,
        });
        Ok(())
    }

    pub fn node(&self, alias: &str) -> Option<&JoinNode> {
        fn find<'a>(node: &'a JoinNode, alias: &str) -> Option<&'a JoinNode> {
            if node.alias == alias {
                return Some(node);
            }
            node.joins.iter().find_map(|join| find(&join.child, alias))
        }
        find(self.root.as_ref()?, alias)
    }

    pub fn node_mut(&mut self, alias: &str) -> Option<&mut JoinNode> {
        fn find<'a>(node: &'a mut JoinNode, alias: &str) -> Option<&'a mut JoinNode> {
            if node.alias == alias {
                return Some(node);
            }
            node.joins
                .iter_mut()
                .find_map(|join| find(&mut join.child, alias))
        }
        find(self.root.as_mut()?, alias)
    }

    /// Append (or insert at `index`) a global ORDER BY entry for a node's
    /// field. Insertion index controls final position across the whole
    /// query.
    pub fn order_by(
        &mut self,
        alias: &str,
        field: &str,
        direction: Direction,
        index: Option<usize>,
    ) -> Result<()> {
        let operand = self.scoped_operand(alias, field)?;
        match index {
            Some(index) => self.order.insert(index, operand, direction),
            None => self.order.push(operand, direction),
        }
        Ok(())
    }

    /// Append (or insert at `index`) a global GROUP BY entry.
    pub fn group_by(&mut self, alias: &str, field: &str, index: Option<usize>) -> Result<()> {
        let operand = self.scoped_operand(alias, field)?;
        match index {
            Some(index) => self.group.insert(index, operand, Direction::Asc),
            None => self.group.push(operand, Direction::Asc),
        }
        Ok(())
    }

    /// Compile the whole tree into one SELECT statement.
    pub fn compile(&self, serializer: &Serializer, page: Option<Page>) -> Result<CompiledStmt> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| Error::query_shape("query has no root node"))?;

        let columns = collect_columns(root);
        if columns.is_empty() {
            return Err(Error::query_shape("query projects no fields"));
        }

        let mut params = TypedParams::default();
        let mut sql = String::new();
        let mut f = Formatter {
            serializer,
            dst: &mut sql,
            params: &mut params,
            alias: root.alias.clone(),
        };

        // Fields: depth-first across the join tree
        let mut first = true;
        fmt!(&mut f, "SELECT ");
        emit_projection(root, &mut first, &mut f);

        // From: depth-first, each child's own sub-joins fully resolved
        // before being spliced in
        let from = from_sql(root);
        fmt!(&mut f, " FROM " from);

        // Where: AND the per-node lists together at the top level
        let mut s = " WHERE ";
        emit_filters(root, &mut s, &mut f);

        if !self.group.is_empty() {
            let by = Comma(self.group.iter().map(|entry| Side(&entry.operand)));
            fmt!(&mut f, " GROUP BY " by);
        }
        if !self.order.is_empty() {
            fmt!(&mut f, " ORDER BY " self.order);
        }

        drop(f);

        if let Some(page) = page {
            sql = self.paginate(serializer, sql, page, &mut params);
        }

        tracing::debug!(sql = %sql, "compiled join query");

        Ok(CompiledStmt {
            sql,
            params: params.values,
            param_types: params.types,
            columns,
        })
    }

    /// Dialect-specific pagination. MySQL appends a LIMIT clause; Oracle
    /// wraps the query as a subquery filtered by ROWNUM bounds, because
    /// ROWNUM cannot be compared before the row is materialized.
    fn paginate(
        &self,
        serializer: &Serializer,
        sql: String,
        page: Page,
        params: &mut TypedParams,
    ) -> String {
        if serializer.is_mysql() {
            params.push(&Value::I64(page.offset), Type::Integer);
            params.push(&Value::I64(page.count), Type::Integer);
            format!("{sql} LIMIT ?, ?")
        } else {
            let upper = params.push(&Value::I64(page.offset + page.count), Type::Integer);
            let lower = params.push(&Value::I64(page.offset), Type::Integer);
            format!(
                "SELECT * FROM (SELECT paged.*, ROWNUM rnum FROM ({sql}) paged \
                 WHERE ROWNUM <= :{}) WHERE rnum > :{}",
                upper.0, lower.0
            )
        }
    }

    fn scoped_operand(
        &self,
        alias: &str,
        field: &str,
    ) -> Result<strata_core::stmt::Operand> {
        let node = self
            .node(alias)
            .ok_or_else(|| Error::query_shape(format!("no node with alias `{alias}`")))?;
        let field = node.entity.field(field)?;
        Ok(strata_core::stmt::Operand::Raw(
            field.reference().aliased(alias),
        ))
    }

    fn register_alias(&mut self, alias: &str) -> Result<()> {
        if !self.aliases.insert(alias.to_string()) {
            return Err(Error::duplicate_alias(alias));
        }
        Ok(())
    }
}

/// Order-list operand without a direction keyword, for GROUP BY.
struct Side<'a>(&'a strata_core::stmt::Operand);

impl ToSql for Side<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        use strata_core::stmt::Operand;

        match self.0 {
            Operand::Raw(sql) => fmt!(f, sql),
            Operand::Field(field) => {
                let sql = field.aliased(&f.alias);
                fmt!(f, sql);
            }
            Operand::Value(_) => {}
        }
    }
}

fn emit_projection<P: Params>(node: &JoinNode, first: &mut bool, f: &mut Formatter<'_, P>) {
    let prev = std::mem::replace(&mut f.alias, node.alias.clone());

    for projected in &node.projection {
        if !*first {
            fmt!(f, ", ");
        }
        *first = false;
        let item = SelectItem {
            expr: &projected.expr,
            alias: projected.output.as_deref(),
        };
        fmt!(f, item);
    }

    f.alias = prev;
    for join in &node.joins {
        emit_projection(&join.child, first, f);
    }
}

fn from_sql(node: &JoinNode) -> String {
    let mut text = format!("{} AS {}", node.entity.table, node.alias);
    for join in &node.joins {
        let child = from_sql(&join.child);
        text = format!("({} {} {} ON ({}))", text, join.kind.as_str(), child, join.on);
    }
    text
}

fn emit_filters<'a, P: Params>(node: &JoinNode, s: &mut &'a str, f: &mut Formatter<'_, P>) {
    if !node.filter.is_empty() {
        let prev = std::mem::replace(&mut f.alias, node.alias.clone());
        fmt!(f, *s "(" node.filter ")");
        f.alias = prev;
        *s = " AND ";
    }
    for join in &node.joins {
        emit_filters(&join.child, s, f);
    }
}

fn collect_columns(node: &JoinNode) -> Vec<String> {
    let mut columns = Vec::new();
    fn walk(node: &JoinNode, columns: &mut Vec<String>) {
        for projected in &node.projection {
            match (&projected.output, &projected.expr) {
                (Some(output), _) => columns.push(output.clone()),
                (None, Printable::Raw(sql)) => columns.push(sql.clone()),
                (None, Printable::Field(field)) => columns.push(field.name.clone()),
            }
        }
        for join in &node.joins {
            walk(&join.child, columns);
        }
    }
    walk(node, &mut columns);
    columns
}
