//! Query Builder SQL generation

use serde_json::Value;
use sqlx::sqlite::SqliteArguments;
use sqlx::Arguments;

use super::builder::Query;
use crate::schema::{quote_identifier, Model};

/// What a SELECT returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Projection<'a> {
    /// Full rows of the model's table
    Rows,
    /// Distinct values of one column
    DistinctColumn(&'a str),
}

impl<M: Model> Query<M> {
    /// Render the query with `?` placeholders
    pub fn to_sql(&self) -> String {
        self.build_select(Projection::Rows).0
    }

    /// Render the query with `?` placeholders and return the values to bind
    pub fn to_sql_with_params(&self) -> (String, Vec<Value>) {
        self.build_select(Projection::Rows)
    }

    pub(crate) fn build_select(&self, projection: Projection<'_>) -> (String, Vec<Value>) {
        let mut sql = String::from("SELECT ");
        let mut params = Vec::new();

        match projection {
            Projection::Rows => {
                if self.distinct {
                    sql.push_str("DISTINCT ");
                }
                sql.push('*');
            }
            Projection::DistinctColumn(column) => {
                sql.push_str("DISTINCT ");
                sql.push_str(&quote_identifier(column));
            }
        }

        sql.push_str(" FROM ");
        sql.push_str(&quote_identifier(M::table_name()));

        self.build_where_clause(&mut sql, &mut params);
        self.build_order_limit_clause(&mut sql);

        (sql, params)
    }

    fn build_where_clause(&self, sql: &mut String, params: &mut Vec<Value>) {
        if self.predicates.is_empty() {
            return;
        }
        sql.push_str(" WHERE ");
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            predicate.render(sql, params);
        }
    }

    fn build_order_limit_clause(&self, sql: &mut String) {
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            let terms: Vec<String> = self
                .order_by
                .iter()
                .map(|term| format!("{} {}", quote_identifier(&term.column), term.direction))
                .collect();
            sql.push_str(&terms.join(", "));
        }

        match (self.limit_count, self.offset_value) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }
    }

    pub(crate) fn log_statement(&self, sql: &str) {
        tracing::debug!(
            target: "grace_orm::query",
            model = M::model_name(),
            sql = %sql,
            "Executing query"
        );
    }
}

/// Wrap a SELECT so the database counts its rows
pub(crate) fn count_sql(inner: &str) -> String {
    format!("SELECT COUNT(*) FROM ({}) AS counted", inner)
}

/// Bind JSON values as SQLite arguments
pub(crate) fn arguments<'q>(values: Vec<Value>) -> SqliteArguments<'q> {
    let mut args = SqliteArguments::default();
    for value in values {
        match value {
            Value::Null => args.add(None::<String>),
            Value::Bool(b) => args.add(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    args.add(i)
                } else if let Some(f) = n.as_f64() {
                    args.add(f)
                } else {
                    args.add(n.to_string())
                }
            }
            Value::String(s) => args.add(s),
            other @ (Value::Array(_) | Value::Object(_)) => args.add(sqlx::types::Json(other)),
        }
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::schema::Column;
    use serde_json::json;

    #[derive(Debug, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
    struct Member {
        id: Option<i64>,
        name: String,
        age: i64,
        active: bool,
    }

    impl Member {
        const NAME: Column<Member, String> = Column::new("name");
        const AGE: Column<Member, i64> = Column::new("age");
        const ACTIVE: Column<Member, bool> = Column::new("active");
    }

    impl Model for Member {
        fn table_name() -> &'static str {
            "members"
        }

        fn columns() -> &'static [&'static str] {
            &["id", "name", "age", "active"]
        }
    }

    fn query() -> Query<Member> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .connect_lazy("sqlite::memory:")
            .unwrap();
        Query::with_engine(Engine::from_pool(pool))
    }

    #[tokio::test]
    async fn test_basic_select() {
        assert_eq!(query().to_sql(), "SELECT * FROM \"members\"");
    }

    #[tokio::test]
    async fn test_where_conditions_are_anded_in_call_order() {
        let (sql, params) = query()
            .filter(Member::AGE.gt(25))
            .where_eq("active", true)
            .unwrap()
            .to_sql_with_params();

        assert_eq!(
            sql,
            "SELECT * FROM \"members\" WHERE \"age\" > ? AND \"active\" = ?"
        );
        assert_eq!(params, vec![json!(25), json!(true)]);
    }

    #[tokio::test]
    async fn test_order_limit_offset() {
        let sql = query()
            .order_by(Member::ACTIVE)
            .order_by(Member::AGE.desc())
            .offset(1)
            .limit(2)
            .to_sql();

        assert_eq!(
            sql,
            "SELECT * FROM \"members\" ORDER BY \"active\" ASC, \"age\" DESC LIMIT 2 OFFSET 1"
        );
    }

    #[tokio::test]
    async fn test_limit_and_offset_overwrite() {
        let sql = query().limit(10).limit(3).offset(5).offset(1).to_sql();
        assert_eq!(sql, "SELECT * FROM \"members\" LIMIT 3 OFFSET 1");
    }

    #[tokio::test]
    async fn test_offset_without_limit() {
        let sql = query().offset(2).to_sql();
        assert_eq!(sql, "SELECT * FROM \"members\" LIMIT -1 OFFSET 2");
    }

    #[tokio::test]
    async fn test_paginate() {
        let sql = query().paginate(20, 3).to_sql();
        assert_eq!(sql, "SELECT * FROM \"members\" LIMIT 20 OFFSET 40");
    }

    #[tokio::test]
    async fn test_paginate_saturates_huge_offsets() {
        let sql = query().paginate(i64::MAX, i64::MAX).to_sql();
        assert_eq!(
            sql,
            format!("SELECT * FROM \"members\" LIMIT {0} OFFSET {0}", i64::MAX)
        );

        let sql = query().paginate(10, 0).to_sql();
        assert_eq!(sql, "SELECT * FROM \"members\" LIMIT 10 OFFSET 0");
    }

    #[tokio::test]
    async fn test_distinct_rows_and_unique_column() {
        assert_eq!(
            query().distinct().to_sql(),
            "SELECT DISTINCT * FROM \"members\""
        );

        let sql = query()
            .filter(Member::ACTIVE.eq(true))
            .order_by(Member::NAME)
            .unique(Member::NAME)
            .to_sql();
        assert_eq!(
            sql,
            "SELECT DISTINCT \"name\" FROM \"members\" WHERE \"active\" = ? ORDER BY \"name\" ASC"
        );
    }

    #[tokio::test]
    async fn test_unknown_field_fails_at_call_time() {
        let err = query().where_eq("invalid_column", "value").unwrap_err();
        assert_eq!(err.to_string(), "Member has no column 'invalid_column'");

        let err = query().order_by_field("invalid_column", "asc").unwrap_err();
        assert!(err.to_string().contains("has no column"));
    }

    #[tokio::test]
    async fn test_invalid_direction() {
        let err = query().order_by_field("age", "invalid").unwrap_err();
        assert!(err.to_string().contains("must be 'asc' or 'desc'"));
    }

    #[tokio::test]
    async fn test_where_fields_all_or_nothing() {
        let result = query().where_fields(&[("name", json!("Bob")), ("nope", json!(1))]);
        assert!(result.is_err());

        let sql = query()
            .where_fields(&[("name", json!("Bob")), ("age", json!(30))])
            .unwrap()
            .to_sql();
        assert_eq!(
            sql,
            "SELECT * FROM \"members\" WHERE \"name\" = ? AND \"age\" = ?"
        );
    }

    #[test]
    fn test_count_sql_wraps_subquery() {
        assert_eq!(
            count_sql("SELECT * FROM \"members\" LIMIT 2"),
            "SELECT COUNT(*) FROM (SELECT * FROM \"members\" LIMIT 2) AS counted"
        );
    }
}
