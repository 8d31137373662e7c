//! Facade configuration.
//!
//! ```toml
//! select_only = false
//! bind_style = "named"
//! returning_column = "id"
//! ```

use crate::bind::BindStyle;
use crate::error::{OrmError, OrmResult};
use crate::ident::Ident;
use serde::Deserialize;

pub const ENV_SELECT_ONLY: &str = "TAGORM_SELECT_ONLY";
pub const ENV_BIND_STYLE: &str = "TAGORM_BIND_STYLE";
pub const ENV_RETURNING_COLUMN: &str = "TAGORM_RETURNING_COLUMN";

/// Construction options for [`Db`](crate::Db).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Suppress every mutating statement. `create` returns a fabricated id, and
    /// `update`/`delete`/`query` succeed without touching the handle.
    pub select_only: bool,
    /// How write statements bind record values.
    pub bind_style: BindStyle,
    /// Column returned by `create(.., with_id = true)`.
    pub returning_column: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            select_only: false,
            bind_style: BindStyle::default(),
            returning_column: "id".to_string(),
        }
    }
}

impl DbConfig {
    pub fn select_only(mut self, select_only: bool) -> Self {
        self.select_only = select_only;
        self
    }

    pub fn bind_style(mut self, bind_style: BindStyle) -> Self {
        self.bind_style = bind_style;
        self
    }

    pub fn returning_column(mut self, column: impl Into<String>) -> Self {
        self.returning_column = column.into();
        self
    }

    /// Parse from TOML; missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> OrmResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read `TAGORM_SELECT_ONLY`, `TAGORM_BIND_STYLE` and `TAGORM_RETURNING_COLUMN`,
    /// falling back to defaults for unset variables.
    pub fn from_env() -> OrmResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> OrmResult<Self> {
        let mut config = Self::default();
        if let Some(v) = lookup(ENV_SELECT_ONLY) {
            config.select_only = parse_bool(&v).ok_or_else(|| {
                OrmError::Config(format!("{ENV_SELECT_ONLY}: expected a boolean, got '{v}'"))
            })?;
        }
        if let Some(v) = lookup(ENV_BIND_STYLE) {
            config.bind_style = v.parse()?;
        }
        if let Some(v) = lookup(ENV_RETURNING_COLUMN) {
            config.returning_column = v;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> OrmResult<()> {
        Ident::parse(&self.returning_column)
            .map(|_| ())
            .map_err(|e| OrmError::Config(format!("returning_column: {e}")))
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
