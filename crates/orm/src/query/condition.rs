//! Conditions - predicate trees rendered into parameterized WHERE fragments

use std::fmt;
use std::marker::PhantomData;
use std::ops::Not;

use serde_json::Value;

use super::types::Operator;
use crate::schema::quote_identifier;

/// Untyped predicate tree
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: String,
        operator: Operator,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    Null {
        column: String,
        negated: bool,
    },
    Between {
        column: String,
        low: Value,
        high: Value,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    /// Append this predicate to `sql`, pushing bound values onto `params`
    pub(crate) fn render(&self, sql: &mut String, params: &mut Vec<Value>) {
        match self {
            Predicate::Compare {
                column,
                operator,
                value,
            } => {
                let column = quote_identifier(column);
                match (operator, value) {
                    (Operator::Equal, Value::Null) => sql.push_str(&format!("{} IS NULL", column)),
                    (Operator::NotEqual, Value::Null) => {
                        sql.push_str(&format!("{} IS NOT NULL", column))
                    }
                    _ => {
                        sql.push_str(&format!("{} {} ?", column, operator));
                        params.push(value.clone());
                    }
                }
            }
            Predicate::In {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    // IN () is not valid SQL
                    sql.push_str(if *negated { "1 = 1" } else { "1 = 0" });
                    return;
                }
                let placeholders = vec!["?"; values.len()].join(", ");
                let keyword = if *negated { "NOT IN" } else { "IN" };
                sql.push_str(&format!(
                    "{} {} ({})",
                    quote_identifier(column),
                    keyword,
                    placeholders
                ));
                params.extend(values.iter().cloned());
            }
            Predicate::Null { column, negated } => {
                let keyword = if *negated { "IS NOT NULL" } else { "IS NULL" };
                sql.push_str(&format!("{} {}", quote_identifier(column), keyword));
            }
            Predicate::Between { column, low, high } => {
                sql.push_str(&format!("{} BETWEEN ? AND ?", quote_identifier(column)));
                params.push(low.clone());
                params.push(high.clone());
            }
            Predicate::And(parts) => Self::render_group(parts, " AND ", "1 = 1", sql, params),
            Predicate::Or(parts) => Self::render_group(parts, " OR ", "1 = 0", sql, params),
            Predicate::Not(inner) => {
                sql.push_str("NOT (");
                inner.render(sql, params);
                sql.push(')');
            }
        }
    }

    fn render_group(
        parts: &[Predicate],
        separator: &str,
        empty: &str,
        sql: &mut String,
        params: &mut Vec<Value>,
    ) {
        if parts.is_empty() {
            sql.push_str(empty);
            return;
        }
        sql.push('(');
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                sql.push_str(separator);
            }
            part.render(sql, params);
        }
        sql.push(')');
    }
}

/// A predicate over the columns of model `M`
pub struct Condition<M> {
    predicate: Predicate,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for Condition<M> {
    fn clone(&self) -> Self {
        Self::from_predicate(self.predicate.clone())
    }
}

impl<M> fmt::Debug for Condition<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Condition").field(&self.predicate).finish()
    }
}

impl<M> Condition<M> {
    pub(crate) fn from_predicate(predicate: Predicate) -> Self {
        Self {
            predicate,
            _model: PhantomData,
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub(crate) fn into_predicate(self) -> Predicate {
        self.predicate
    }

    /// Both conditions must hold
    pub fn and(self, other: Condition<M>) -> Condition<M> {
        Self::from_predicate(Predicate::And(vec![self.predicate, other.predicate]))
    }

    /// Either condition may hold
    pub fn or(self, other: Condition<M>) -> Condition<M> {
        Self::from_predicate(Predicate::Or(vec![self.predicate, other.predicate]))
    }

    /// All of the given conditions must hold
    pub fn all(conditions: impl IntoIterator<Item = Condition<M>>) -> Condition<M> {
        Self::from_predicate(Predicate::And(
            conditions.into_iter().map(|c| c.predicate).collect(),
        ))
    }

    /// At least one of the given conditions must hold
    pub fn any(conditions: impl IntoIterator<Item = Condition<M>>) -> Condition<M> {
        Self::from_predicate(Predicate::Or(
            conditions.into_iter().map(|c| c.predicate).collect(),
        ))
    }
}

impl<M> Not for Condition<M> {
    type Output = Condition<M>;

    fn not(self) -> Self::Output {
        Self::from_predicate(Predicate::Not(Box::new(self.predicate)))
    }
}
