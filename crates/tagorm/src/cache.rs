//! Memoized field descriptors.
//!
//! [`FieldCache`] stores the structural descriptors of each record type the first
//! time the type is seen and serves them from a shared map afterwards. Entries are
//! never evicted: a type's shape cannot change while the process runs.
//!
//! Value-carrying lookups (`with_values = true`) bypass the map entirely. Their result
//! embeds one instance's field values and must not be shared.

use crate::field::{self, Assignment, ColumnValues, FieldDescriptor, NamedInsert};
use crate::record::{self, Record, RecordKey, RecordSource};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Concurrency-safe descriptor cache keyed by record type.
#[derive(Debug, Default)]
pub struct FieldCache {
    records: RwLock<HashMap<RecordKey, Arc<[FieldDescriptor]>>>,
    introspections: AtomicUsize,
}

impl FieldCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptors for the record type behind `dest`.
    ///
    /// With `with_values` the result carries the representative instance's values and
    /// is computed fresh on every call; otherwise it comes from (and populates) the
    /// cache.
    pub fn get<S>(&self, dest: &S, with_values: bool) -> Arc<[FieldDescriptor]>
    where
        S: RecordSource + ?Sized,
    {
        if !with_values {
            return self.fields::<S::Record>();
        }
        match dest.representative() {
            Some(record) => record::introspect_values(record).into(),
            None => record::introspect::<S::Record>().into(),
        }
    }

    /// Cached structural descriptors for `T`.
    ///
    /// No lock is held while the descriptors are computed. Two threads missing on the
    /// same type may both compute and both store; the results are identical, so the
    /// last write wins harmlessly.
    pub fn fields<T: Record>(&self) -> Arc<[FieldDescriptor]> {
        let key = T::record_key();

        let cached = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(fields) = cached {
            return fields;
        }

        let fields: Arc<[FieldDescriptor]> = record::introspect::<T>().into();
        self.introspections.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(
            target: "tagorm.cache",
            record = key.type_name(),
            field_count = fields.len(),
            "cached record fields"
        );

        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&fields));
        fields
    }

    /// Rendered SELECT column list.
    pub fn select_fields<S: RecordSource + ?Sized>(&self, dest: &S) -> Vec<String> {
        field::render_select(&self.get(dest, false))
    }

    /// JOIN clauses in descriptor order.
    pub fn joins<S: RecordSource + ?Sized>(&self, dest: &S) -> Vec<&'static str> {
        field::render_joins(&self.get(dest, false))
    }

    /// Columns of `table` with the instance's bound values, for a positional INSERT.
    pub fn insert_fields<S>(&self, table: &str, dest: &S) -> ColumnValues
    where
        S: RecordSource + ?Sized,
    {
        field::render_insert(&field::writable(&self.get(dest, true), table))
    }

    /// `column = value` pairs of `table` for a positional UPDATE.
    pub fn update_fields<S>(&self, table: &str, dest: &S) -> Vec<Assignment>
    where
        S: RecordSource + ?Sized,
    {
        field::render_update(&field::writable(&self.get(dest, true), table))
    }

    /// Column and `:name` placeholder lists of `table` for a template INSERT.
    pub fn named_insert_fields<S>(&self, table: &str, dest: &S) -> NamedInsert
    where
        S: RecordSource + ?Sized,
    {
        field::render_named_insert(&field::writable(&self.get(dest, false), table))
    }

    /// `column = :name` assignments of `table` for a template UPDATE.
    pub fn named_update_fields<S>(&self, table: &str, dest: &S) -> Vec<String>
    where
        S: RecordSource + ?Sized,
    {
        field::render_named_update(&field::writable(&self.get(dest, false), table))
    }

    /// Number of cached record types.
    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains<T: Record>(&self) -> bool {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&T::record_key())
    }

    /// Structural introspections performed so far (cache misses).
    pub fn introspections(&self) -> usize {
        self.introspections.load(Ordering::Relaxed)
    }
}
