/// Builds a [`Value`](crate::Value) from JSON-like literal syntax.
///
/// Sequences use `[...]`, mappings use `{ "key": value }` with string literal
/// keys. A parenthesized expression is converted with `Value::from`, which is
/// how non-literal values such as dates or `Value::Missing` are spliced in; any
/// other expression goes through [`to_value`](crate::to_value).
///
/// ```rust
/// use serde_zipson::{zipson, Value};
///
/// let value = zipson!({ "id": 7, "tags": ["a", "b"], "gone": (Value::Missing) });
/// assert_eq!(value.as_mapping().map(|m| m.len()), Some(3));
/// ```
#[macro_export]
macro_rules! zipson {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Sequence(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Sequence(vec![$($crate::zipson!($elem)),*])
    };

    ({}) => {
        $crate::Value::Mapping($crate::Map::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut mapping = $crate::Map::new();
        $(
            mapping.insert($key.to_string(), $crate::zipson!($value));
        )*
        $crate::Value::Mapping(mapping)
    }};

    (( $e:expr )) => {
        $crate::Value::from($e)
    };

    ($s:expr) => {
        $crate::to_value(&$s).unwrap_or($crate::Value::Null)
    };
}
