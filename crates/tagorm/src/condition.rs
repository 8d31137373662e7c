//! Filter predicates for SELECT, UPDATE and DELETE statements.
//!
//! A [`Condition`] is either a structured comparison over a validated column or a raw
//! SQL predicate whose `?` markers are bound in order. Conditions are rendered into a
//! [`Sql`] builder so placeholder numbering stays consistent with the rest of the
//! statement.

use crate::error::{OrmError, OrmResult};
use crate::ident::Ident;
use crate::sql::Sql;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
enum ConditionInner {
    Cmp {
        column: Ident,
        operator: &'static str,
        value: Value,
    },
    Null {
        column: Ident,
        negated: bool,
    },
    In {
        column: Ident,
        values: Vec<Value>,
    },
    Raw {
        sql: String,
        args: Vec<Value>,
    },
}

/// A single WHERE predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition(ConditionInner);

impl Condition {
    fn cmp(column: &str, operator: &'static str, value: impl Into<Value>) -> OrmResult<Self> {
        Ok(Condition(ConditionInner::Cmp {
            column: Ident::parse(column)?,
            operator,
            value: value.into(),
        }))
    }

    /// `column = value`
    pub fn eq(column: &str, value: impl Into<Value>) -> OrmResult<Self> {
        Self::cmp(column, "=", value)
    }

    /// `column != value`
    pub fn ne(column: &str, value: impl Into<Value>) -> OrmResult<Self> {
        Self::cmp(column, "!=", value)
    }

    /// `column > value`
    pub fn gt(column: &str, value: impl Into<Value>) -> OrmResult<Self> {
        Self::cmp(column, ">", value)
    }

    /// `column >= value`
    pub fn gte(column: &str, value: impl Into<Value>) -> OrmResult<Self> {
        Self::cmp(column, ">=", value)
    }

    /// `column < value`
    pub fn lt(column: &str, value: impl Into<Value>) -> OrmResult<Self> {
        Self::cmp(column, "<", value)
    }

    /// `column <= value`
    pub fn lte(column: &str, value: impl Into<Value>) -> OrmResult<Self> {
        Self::cmp(column, "<=", value)
    }

    /// `column LIKE pattern`
    pub fn like(column: &str, pattern: impl Into<Value>) -> OrmResult<Self> {
        Self::cmp(column, "LIKE", pattern)
    }

    /// `column ILIKE pattern`
    pub fn ilike(column: &str, pattern: impl Into<Value>) -> OrmResult<Self> {
        Self::cmp(column, "ILIKE", pattern)
    }

    /// `column IS NULL`
    pub fn is_null(column: &str) -> OrmResult<Self> {
        Ok(Condition(ConditionInner::Null {
            column: Ident::parse(column)?,
            negated: false,
        }))
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(column: &str) -> OrmResult<Self> {
        Ok(Condition(ConditionInner::Null {
            column: Ident::parse(column)?,
            negated: true,
        }))
    }

    /// `column IN (...)`. An empty list renders `1=0`.
    pub fn in_list<T: Into<Value>>(column: &str, values: Vec<T>) -> OrmResult<Self> {
        Ok(Condition(ConditionInner::In {
            column: Ident::parse(column)?,
            values: values.into_iter().map(Into::into).collect(),
        }))
    }

    /// Raw predicate with `?` argument markers, e.g. `raw("a.x > ? AND a.y < ?", ...)`.
    ///
    /// The number of markers must match `args`. The predicate text is not validated,
    /// so never build it from untrusted input.
    pub fn raw(sql: impl Into<String>, args: Vec<Value>) -> OrmResult<Self> {
        let sql = sql.into();
        let markers = sql.matches('?').count();
        if markers != args.len() {
            return Err(OrmError::build(format!(
                "raw condition has {markers} '?' markers but {} args",
                args.len()
            )));
        }
        Ok(Condition(ConditionInner::Raw { sql, args }))
    }

    /// Render into `sql`, binding values as placeholders.
    pub fn append_to_sql(&self, sql: &mut Sql) {
        match &self.0 {
            ConditionInner::Cmp {
                column,
                operator,
                value,
            } => {
                sql.push(column.as_str())
                    .push(" ")
                    .push(operator)
                    .push(" ")
                    .push_bind(value.clone());
            }
            ConditionInner::Null { column, negated } => {
                sql.push(column.as_str());
                sql.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            ConditionInner::In { column, values } => {
                if values.is_empty() {
                    sql.push("1=0");
                } else {
                    sql.push(column.as_str()).push(" IN (");
                    sql.push_bind_list(values.iter().cloned()).push(")");
                }
            }
            ConditionInner::Raw { sql: raw, args } => {
                let mut args = args.iter();
                let mut pieces = raw.split('?');
                if let Some(first) = pieces.next() {
                    sql.push(first);
                }
                for piece in pieces {
                    if let Some(arg) = args.next() {
                        sql.push_bind(arg.clone());
                    }
                    sql.push(piece);
                }
            }
        }
    }
}
