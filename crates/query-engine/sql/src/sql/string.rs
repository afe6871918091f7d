//! Type definitions of a low-level SQL string representation.

use indexmap::IndexMap;
use serde::Serialize;

use super::dialect::Dialect;
use super::value::Value;

/// Named parameters of a statement, in the order they were introduced.
pub type Params = IndexMap<String, Value>;

/// The prefix character of a parameter placeholder.
pub const PLACEHOLDER_PREFIX: char = '@';

/// What a parameter is used for. Each kind is named and counted separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Values in predicates and inserted rows: `p0`, `p1`, ...
    Predicate,
    /// Values in a `SET` clause: `set0`, `set1`, ...
    Assignment,
}

impl ParamKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ParamKind::Predicate => "p",
            ParamKind::Assignment => "set",
        }
    }
}

/// Hands out parameter names. A query builder threads one counter through every fragment it
/// composes so names stay unique across the whole statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParamCounter {
    predicate: u64,
    assignment: u64,
}

impl ParamCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next unused name for the kind.
    pub fn next_name(&mut self, kind: ParamKind) -> String {
        let index = match kind {
            ParamKind::Predicate => &mut self.predicate,
            ParamKind::Assignment => &mut self.assignment,
        };
        let name = format!("{}{}", kind.prefix(), index);
        *index += 1;
        name
    }

    /// Could this name be produced by a counter?
    pub fn is_generated_name(name: &str) -> bool {
        [ParamKind::Predicate, ParamKind::Assignment]
            .iter()
            .any(|kind| {
                name.strip_prefix(kind.prefix())
                    .is_some_and(|digits| {
                        !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
                    })
            })
    }
}

/// A SQL fragment or statement together with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SQL {
    pub sql: String,
    pub params: Params,
    pub dialect: Dialect,
    /// for internal use and tests only
    pub param_index: ParamCounter,
}

/// A DDL statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DDL(pub SQL);

impl SQL {
    pub fn new(dialect: Dialect) -> SQL {
        SQL::continuing(dialect, ParamCounter::new())
    }

    /// Start a fragment whose parameter names continue from an existing counter.
    pub fn continuing(dialect: Dialect, param_index: ParamCounter) -> SQL {
        SQL {
            sql: String::new(),
            params: Params::new(),
            dialect,
            param_index,
        }
    }

    pub fn append_syntax(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    pub fn append_identifier(&mut self, name: &str) {
        let quoted = self.dialect.quote_identifier(name);
        self.sql.push_str(&quoted);
    }

    /// Bind a value under a freshly generated name and write its placeholder.
    pub fn append_param(&mut self, kind: ParamKind, value: Value) {
        let name = self.param_index.next_name(kind);
        self.sql.push(PLACEHOLDER_PREFIX);
        self.sql.push_str(&name);
        self.params.insert(name, value);
    }

    /// Append another fragment, text and parameters.
    ///
    /// Parameter names must already be unique; the caller is responsible for threading the
    /// counter or validating raw names.
    pub fn append_fragment(&mut self, text: &str, params: &Params) {
        self.sql.push_str(text);
        self.params
            .extend(params.iter().map(|(name, value)| (name.clone(), value.clone())));
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

impl std::fmt::Display for SQL {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.sql)
    }
}
