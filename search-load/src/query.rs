use std::fmt;
use std::sync::Arc;

use crate::error::InputError;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SearchField {
    Artist,
    Album,
}

impl SearchField {
    /// Menu numbering: `1` is artist, `2` is album.
    pub fn from_selection(raw: &str) -> Result<Self, InputError> {
        match raw.trim() {
            "1" => Ok(Self::Artist),
            "2" => Ok(Self::Album),
            other => Err(InputError::InvalidSelection(other.to_owned())),
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Album => "album",
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field-scoped search term. Cheap to clone, the text is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchRequest {
    field: SearchField,
    query: Arc<str>,
}

impl SearchRequest {
    pub fn new(field: SearchField, query: impl Into<String>) -> Result<Self, InputError> {
        let query = query.into();
        if query.is_empty() {
            return Err(InputError::EmptyQuery);
        }
        Ok(Self {
            field,
            query: query.into(),
        })
    }

    #[inline]
    #[must_use]
    pub fn field(&self) -> SearchField {
        self.field
    }

    #[inline]
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTarget {
    pub host: String,
    pub port: u16,
}

impl SearchTarget {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for SearchTarget {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

/// `http://<host>:<port>/?q=<field>:"<value>"` with `value` inserted verbatim.
///
/// Quote characters inside `value` are not escaped, the server receives the
/// term exactly as typed.
#[must_use]
pub fn build_url(target: &SearchTarget, request: &SearchRequest) -> String {
    format!(
        "http://{}:{}/?q={}:\"{}\"",
        target.host,
        target.port,
        request.field.as_str(),
        request.query
    )
}
