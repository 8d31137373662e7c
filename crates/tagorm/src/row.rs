//! Row mapping traits

use crate::error::{OrmError, OrmResult};
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

/// Trait for converting a database row into a Rust struct.
///
/// `#[derive(Record)]` implements it by reading each field from the column alias the
/// SELECT renderer produces (`"users.name"`), so a record round-trips through
/// [`Db::get_all`](crate::Db::get_all) without extra annotations.
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> OrmResult<Self>;
}

impl<T: FromRow> FromRow for Box<T> {
    fn from_row(row: &Row) -> OrmResult<Self> {
        T::from_row(row).map(Box::new)
    }
}

/// An absent nested record. Columns that fail to decode, as an outer join's NULLs
/// do for non-optional fields, read as `None`; other errors still propagate.
impl<T: FromRow> FromRow for Option<T> {
    fn from_row(row: &Row) -> OrmResult<Self> {
        match T::from_row(row) {
            Ok(record) => Ok(Some(record)),
            Err(OrmError::Decode { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning [`OrmError::Decode`] on failure
    fn try_get_column<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| OrmError::decode(column, e.to_string()))
    }
}
