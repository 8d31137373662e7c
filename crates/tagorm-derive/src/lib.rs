//! Derive macros for tagorm
//!
//! Provides `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod record;

/// Derive `Record`, `RecordSource` and `FromRow` for a struct.
///
/// # Example
///
/// ```ignore
/// use tagorm::Record;
///
/// #[derive(Record)]
/// struct User {
///     #[record(column = "users.id")]
///     id: i64,
///     #[record(column = "users.status", default = "active")]
///     status: String,
///     #[record(column = "teams.name", join = "LEFT JOIN teams ON teams.id = users.team_id")]
///     team: Option<String>,
///     audit: Audit,
///     #[record(skip)]
///     scratch: Vec<u8>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[record(column = "table.column")]` - Map the field to a qualified column. An
///   empty string keeps the field out of SELECT but still writes it.
/// - `#[record(default = "a, b")]` - `COALESCE` fallbacks; `"uuid"` means the nil UUID
/// - `#[record(join = "LEFT JOIN ...")]` - Join clause needed to reach the column
/// - `#[record(skip)]` - Ignore the field
/// - No attribute - The field is a nested record and is flattened in place
/// - `#[record(no_from_row)]` on the struct - Do not generate `FromRow`
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
