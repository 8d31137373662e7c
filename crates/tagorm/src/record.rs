//! Record capability and input normalization.
//!
//! A record type describes its own mapped fields through [`Record`], normally
//! implemented by `#[derive(Record)]`. The derive walks the struct's fields in
//! declaration order at compile time:
//!
//! - `#[record(skip)]` fields produce nothing;
//! - fields without a `#[record]` attribute are nested records and are flattened in
//!   place by calling the nested type's `describe_fields`/`bind_fields`;
//! - every other field produces one [`FieldDescriptor`].
//!
//! [`RecordSource`] lets the cache accept a record, a reference or box to one, or a
//! collection of them, and resolve it to a single record type.

use crate::field::FieldDescriptor;
use std::any::TypeId;

/// Cache key for a record type.
///
/// Keyed on [`TypeId`], so two types with the same bare name in different modules
/// never share an entry. The fully-qualified type name is kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey {
    id: TypeId,
    name: &'static str,
}

impl RecordKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.name
    }
}

/// A type whose fields map to columns.
pub trait Record: 'static {
    /// Append this type's structural descriptors (no bound values) in field order.
    fn describe_fields(out: &mut Vec<FieldDescriptor>)
    where
        Self: Sized;

    /// Append descriptors carrying this instance's current field values.
    ///
    /// Must yield the same shape as [`Record::describe_fields`].
    fn bind_fields(&self, out: &mut Vec<FieldDescriptor>);

    /// Identity used by the field cache.
    fn record_key() -> RecordKey
    where
        Self: Sized,
    {
        RecordKey::of::<Self>()
    }
}

/// Structural descriptors for `T`.
pub fn introspect<T: Record>() -> Vec<FieldDescriptor> {
    let mut out = Vec::new();
    T::describe_fields(&mut out);
    out
}

/// Descriptors for `record`, each carrying its bound value.
pub fn introspect_values<T: Record + ?Sized>(record: &T) -> Vec<FieldDescriptor> {
    let mut out = Vec::new();
    record.bind_fields(&mut out);
    out
}

// Boxed records flatten exactly like the record they point to.
impl<T: Record> Record for Box<T> {
    fn describe_fields(out: &mut Vec<FieldDescriptor>) {
        T::describe_fields(out);
    }

    fn bind_fields(&self, out: &mut Vec<FieldDescriptor>) {
        (**self).bind_fields(out);
    }

    fn record_key() -> RecordKey {
        T::record_key()
    }
}

// An absent nested record keeps its columns; they carry no value and bind NULL.
impl<T: Record> Record for Option<T> {
    fn describe_fields(out: &mut Vec<FieldDescriptor>) {
        T::describe_fields(out);
    }

    fn bind_fields(&self, out: &mut Vec<FieldDescriptor>) {
        match self {
            Some(record) => record.bind_fields(out),
            None => T::describe_fields(out),
        }
    }

    fn record_key() -> RecordKey {
        T::record_key()
    }
}

/// The empty record.
impl Record for () {
    fn describe_fields(_out: &mut Vec<FieldDescriptor>) {}

    fn bind_fields(&self, _out: &mut Vec<FieldDescriptor>) {}
}

/// Caller input that resolves to one record type.
///
/// `#[derive(Record)]` implements this for the record itself. References, boxes,
/// options and collections forward to their element type; collections use their
/// first element as the representative instance.
pub trait RecordSource {
    type Record: Record;

    /// Instance supplying bound values, if there is one.
    ///
    /// `None` (an empty collection, or `Option::None`) still identifies the record
    /// type, so structural descriptors remain available.
    fn representative(&self) -> Option<&Self::Record>;
}

impl RecordSource for () {
    type Record = ();

    fn representative(&self) -> Option<&()> {
        Some(self)
    }
}

impl<S: RecordSource + ?Sized> RecordSource for &S {
    type Record = S::Record;

    fn representative(&self) -> Option<&Self::Record> {
        (**self).representative()
    }
}

impl<S: RecordSource + ?Sized> RecordSource for &mut S {
    type Record = S::Record;

    fn representative(&self) -> Option<&Self::Record> {
        (**self).representative()
    }
}

impl<T: Record> RecordSource for Box<T> {
    type Record = T;

    fn representative(&self) -> Option<&T> {
        Some(&**self)
    }
}

impl<T: Record> RecordSource for Option<T> {
    type Record = T;

    fn representative(&self) -> Option<&T> {
        self.as_ref()
    }
}

impl<T: Record> RecordSource for [T] {
    type Record = T;

    fn representative(&self) -> Option<&T> {
        self.first()
    }
}

impl<T: Record, const N: usize> RecordSource for [T; N] {
    type Record = T;

    fn representative(&self) -> Option<&T> {
        self.first()
    }
}

impl<T: Record> RecordSource for Vec<T> {
    type Record = T;

    fn representative(&self) -> Option<&T> {
        self.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{IntoValue, Value};

    struct Audit {
        created_by: i64,
    }

    impl Record for Audit {
        fn describe_fields(out: &mut Vec<FieldDescriptor>) {
            out.push(FieldDescriptor::new("a.created_by", "", ""));
        }

        fn bind_fields(&self, out: &mut Vec<FieldDescriptor>) {
            out.push(FieldDescriptor::new("a.created_by", "", "").with_value(self.created_by.into_value()));
        }
    }

    impl RecordSource for Audit {
        type Record = Self;

        fn representative(&self) -> Option<&Self> {
            Some(self)
        }
    }

    #[test]
    fn box_key_is_the_pointee_key() {
        assert_eq!(<Box<Audit>>::record_key(), Audit::record_key());
        assert!(Audit::record_key().type_name().ends_with("Audit"));
    }

    #[test]
    fn collections_use_first_element() {
        let items = vec![Audit { created_by: 1 }, Audit { created_by: 2 }];
        let first = items.representative().unwrap();
        assert_eq!(introspect_values(first)[0].value, Some(Value::Int8(1)));

        let empty: Vec<Audit> = Vec::new();
        assert!(empty.representative().is_none());
        assert!((&empty[..]).representative().is_none());
    }

    #[test]
    fn absent_nested_record_keeps_its_columns() {
        let some = introspect_values(&Some(Audit { created_by: 3 }));
        assert_eq!(some[0].value, Some(Value::Int8(3)));

        let none = introspect_values(&None::<Audit>);
        assert_eq!(none.len(), 1);
        assert_eq!(none[0].name, "a.created_by");
        assert_eq!(none[0].value, None);
        assert_eq!(crate::field::render_insert(&none).values, vec![Value::Null]);

        assert_eq!(introspect::<Option<Audit>>(), introspect::<Audit>());
        assert_eq!(<Option<Audit>>::record_key(), Audit::record_key());
    }

    #[test]
    fn unit_record_is_empty() {
        assert!(introspect::<()>().is_empty());
        assert!(introspect_values(&()).is_empty());
    }
}
