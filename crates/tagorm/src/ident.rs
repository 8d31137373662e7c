//! SQL identifier validation.
//!
//! Table names, key columns and condition columns are spliced into statements
//! verbatim, so they are checked before use. Each `.`-separated segment must be
//! either unquoted (`[A-Za-z_][A-Za-z0-9_$]*`) or a double-quoted name without NUL
//! (embedded `"` written as `""`).

use crate::error::{OrmError, OrmResult};

/// A validated, possibly qualified SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident(String);

impl Ident {
    pub fn parse(s: &str) -> OrmResult<Self> {
        if s.is_empty() {
            return Err(OrmError::validation("Identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(OrmError::validation("Identifier cannot contain NUL character"));
        }

        let mut rest = s;
        loop {
            rest = if let Some(quoted) = rest.strip_prefix('"') {
                parse_quoted(quoted, s)?
            } else {
                parse_unquoted(rest, s)?
            };

            match rest.strip_prefix('.') {
                Some("") => {
                    return Err(OrmError::validation(format!("Trailing '.' in identifier '{s}'")));
                }
                Some(next) => rest = next,
                None if rest.is_empty() => break,
                None => {
                    return Err(OrmError::validation(format!(
                        "Expected '.' between identifier parts in '{s}'"
                    )));
                }
            }
        }

        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Consume one unquoted segment, returning the remainder.
fn parse_unquoted<'a>(input: &'a str, full: &str) -> OrmResult<&'a str> {
    let end = input.find(['.', '"']).unwrap_or(input.len());
    let segment = &input[..end];
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return Err(OrmError::validation(format!("Empty segment in identifier '{full}'")));
    };
    if !(first == '_' || first.is_ascii_alphabetic()) {
        return Err(OrmError::validation(format!(
            "Invalid identifier start character '{first}' in '{full}'"
        )));
    }
    if let Some(bad) = chars.find(|c| !(*c == '_' || *c == '$' || c.is_ascii_alphanumeric())) {
        return Err(OrmError::validation(format!(
            "Invalid character '{bad}' in identifier '{full}'"
        )));
    }
    Ok(&input[end..])
}

/// Consume the body of a quoted segment (opening quote already stripped).
fn parse_quoted<'a>(input: &'a str, full: &str) -> OrmResult<&'a str> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            if bytes.get(i + 1) == Some(&b'"') {
                i += 2;
                continue;
            }
            if i == 0 {
                return Err(OrmError::validation(format!("Empty quoted identifier in '{full}'")));
            }
            return Ok(&input[i + 1..]);
        }
        i += 1;
    }
    Err(OrmError::validation(format!("Unclosed quoted identifier in '{full}'")))
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_and_dotted() {
        assert_eq!(Ident::parse("users").unwrap().as_str(), "users");
        assert_eq!(Ident::parse("public.users").unwrap().as_str(), "public.users");
        assert_eq!(Ident::parse("users.id").unwrap().as_str(), "users.id");
    }

    #[test]
    fn accepts_quoted_parts() {
        assert!(Ident::parse(r#""CamelCase""#).is_ok());
        assert!(Ident::parse(r#"public."User""Table".id"#).is_ok());
    }

    #[test]
    fn rejects_unsafe() {
        assert!(Ident::parse("").is_err());
        assert!(Ident::parse("users; drop table users; --").is_err());
        assert!(Ident::parse("1users").is_err());
        assert!(Ident::parse("users..name").is_err());
        assert!(Ident::parse("users.").is_err());
        assert!(Ident::parse("users name").is_err());
        assert!(Ident::parse(r#""unclosed"#).is_err());
        assert!(Ident::parse(r#""""#).is_err());
    }
}
