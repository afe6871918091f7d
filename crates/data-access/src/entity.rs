use serde::de::DeserializeOwned;
use serde::Serialize;

use query_engine_metadata::metadata::EntityDescriptor;

/// A record stored as one row of a table.
///
/// Fields are read and written through serde, so the serialized field names must match the
/// column names of the descriptor. Ignored columns are never read back; give them a
/// `#[serde(default)]`.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn describe() -> EntityDescriptor;
}
