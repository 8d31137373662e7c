//! Binding styles.
//!
//! Statements are sent to Postgres with positional `$n` parameters either way. The
//! style only decides how write statements are assembled:
//!
//! - [`BindStyle::Positional`]: values are pushed as parameters while the statement is
//!   built.
//! - [`BindStyle::Named`]: a template with `:table.column` tokens is built from the
//!   structural descriptors first, then [`bind_named`] resolves each token against a
//!   record's bound descriptors.

use crate::error::{OrmError, OrmResult};
use crate::field::FieldDescriptor;
use crate::sql::Sql;
use crate::value::Value;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindStyle {
    #[default]
    Positional,
    Named,
}

impl FromStr for BindStyle {
    type Err = OrmError;

    fn from_str(s: &str) -> OrmResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positional" => Ok(Self::Positional),
            "named" => Ok(Self::Named),
            other => Err(OrmError::Config(format!("unknown bind style '{other}'"))),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c == '_' || c == '$' || c == '"' || c.is_ascii_alphanumeric()
}

/// Whether a token may end right before `rest`. A `.` only ends it when no further
/// name follows, so `:t.a.b` never resolves to `t.a`.
fn ends_token(rest: &str) -> bool {
    let mut chars = rest.chars();
    match chars.next() {
        None => true,
        Some('.') => !chars.next().is_some_and(is_name_char),
        Some(c) => !is_name_char(c),
    }
}

/// The longest descriptor name spelled out at the start of `rest`.
fn match_field<'f>(rest: &str, fields: &'f [FieldDescriptor]) -> Option<&'f FieldDescriptor> {
    fields
        .iter()
        .filter(|f| !f.name.is_empty())
        .filter(|f| rest.starts_with(f.name) && ends_token(&rest[f.name.len()..]))
        .max_by_key(|f| f.name.len())
}

/// Append `template` to `out`, resolving `:name` tokens against `fields`.
///
/// A token is the exact name of one of `fields`, so quoted and `$`-bearing names bind
/// like any other; when several names match, the longest wins. Each token becomes the
/// next `$n` placeholder of `out`, bound to the descriptor's value (`NULL` when it
/// carries none). Single-quoted literals, double-quoted identifiers and `::` casts are
/// copied through untouched. A `:` followed by a name that matches no descriptor is an
/// error.
pub fn bind_named(out: &mut Sql, template: &str, fields: &[FieldDescriptor]) -> OrmResult<()> {
    let mut chars = template.char_indices().peekable();
    let mut start = 0;

    while let Some((i, c)) = chars.next() {
        match c {
            '\'' | '"' => {
                // Copy the quoted section; a doubled quote is an escape and keeps us inside.
                while let Some((_, q)) = chars.next() {
                    if q == c {
                        if matches!(chars.peek(), Some((_, next)) if *next == c) {
                            chars.next();
                            continue;
                        }
                        break;
                    }
                }
            }
            ':' => {
                if matches!(chars.peek(), Some((_, ':'))) {
                    chars.next();
                    continue;
                }
                let rest = &template[i + 1..];
                let Some(field) = match_field(rest, fields) else {
                    if rest.starts_with(|n: char| n == '_' || n == '"' || n.is_ascii_alphabetic()) {
                        let token = rest
                            .find(|n: char| !(is_name_char(n) || n == '.'))
                            .map_or(rest, |end| &rest[..end]);
                        return Err(OrmError::build(format!(
                            "named parameter ':{token}' has no matching field"
                        )));
                    }
                    continue;
                };

                let token_end = i + 1 + field.name.len();
                while matches!(chars.peek(), Some(&(j, _)) if j < token_end) {
                    chars.next();
                }

                out.push(&template[start..i]);
                out.push_bind(field.value.clone().unwrap_or(Value::Null));
                start = token_end;
            }
            _ => {}
        }
    }

    out.push(&template[start..]);
    Ok(())
}
