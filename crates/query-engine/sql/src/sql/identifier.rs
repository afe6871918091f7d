//! Escaping of table and column identifiers.
//!
//! Identifiers are the only user-supplied text that is written into a statement
//! directly; everything else goes through a parameter.

use super::dialect::Dialect;
use super::keywords;

/// Quote an identifier for the given dialect.
///
/// The client-server dialect always wraps the name in backticks. The embedded dialect only
/// brackets names which collide with a reserved keyword and leaves everything else untouched.
pub fn escape_identifier(name: &str, dialect: Dialect) -> String {
    match dialect {
        Dialect::ClientServer => format!("`{}`", name.replace('`', "``")),
        Dialect::Embedded => {
            if keywords::is_reserved(name, dialect) {
                format!("[{name}]")
            } else {
                name.to_string()
            }
        }
    }
}
