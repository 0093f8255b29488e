use super::Value;
use std::collections::BTreeMap;

/// Field name to value mapping, used for records, entity state and write payloads.
pub type FieldMap = BTreeMap<String, Value>;

/// Build a [`FieldMap`] from `(name, value)` pairs.
pub fn field_map<K, V, I>(pairs: I) -> FieldMap
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
