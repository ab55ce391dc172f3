//! Structural template detection.
//!
//! A [`Template`] records the key layout shared by two mappings: for every key,
//! either a leaf or a nested layout. The encoder builds one from the first two
//! elements of a container, then checks each later element with
//! [`Template::conforms`] until one does not fit.
//!
//! Rows are written without keys, so every mapping in a run must also list its
//! keys in the same insertion order as the template.

use crate::{CompressOptions, Map, Value};

/// One key of a template layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    /// Layout of a nested mapping, `None` for a leaf.
    pub nested: Option<Vec<Field>>,
}

impl Field {
    fn leaf(key: &str) -> Self {
        Field {
            key: key.to_string(),
            nested: None,
        }
    }

    /// Nested layout with at least one key. An empty nested layout is written
    /// and read back as a plain leaf.
    pub fn expanded(&self) -> Option<&[Field]> {
        match &self.nested {
            Some(fields) if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }
}

/// The shared key layout of a run of mappings.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    fields: Vec<Field>,
}

impl Template {
    /// Builds the layout shared by `a` and `b`, if any.
    ///
    /// Both must be mappings with equal key sets at every level, listed in the
    /// same order and agreeing on which keys hold nested mappings, within the
    /// depth and key bounds of `options`.
    ///
    /// ```rust
    /// use serde_zipson::{zipson, template::Template, CompressOptions};
    ///
    /// let options = CompressOptions::default();
    /// let a = zipson!({ "x": 1, "p": { "q": true } });
    /// let b = zipson!({ "x": 2, "p": { "q": false } });
    /// let template = Template::detect(&a, &b, &options).unwrap();
    /// assert_eq!(template.fields()[0].key, "x");
    /// assert!(template.fields()[1].nested.is_some());
    ///
    /// let c = zipson!({ "x": 1, "y": 2 });
    /// assert!(Template::detect(&a, &c, &options).is_none());
    ///
    /// let reordered = zipson!({ "p": { "q": false }, "x": 2 });
    /// assert!(Template::detect(&a, &reordered, &options).is_none());
    /// ```
    pub fn detect(a: &Value, b: &Value, options: &CompressOptions) -> Option<Template> {
        let (Value::Mapping(a), Value::Mapping(b)) = (a, b) else {
            return None;
        };
        let fields = shared_fields(a, b, 0, options)?;
        if fields.is_empty() {
            return None;
        }
        Some(Template { fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns `true` when `value` can be written as a row of this template.
    pub fn conforms(&self, value: &Value) -> bool {
        conforms_to(&self.fields, value)
    }

    /// Number of values in one row.
    pub fn row_len(&self) -> usize {
        row_len(&self.fields)
    }
}

fn row_len(fields: &[Field]) -> usize {
    fields
        .iter()
        .map(|field| field.expanded().map_or(1, row_len))
        .sum()
}

fn shared_fields(a: &Map, b: &Map, level: usize, options: &CompressOptions) -> Option<Vec<Field>> {
    if level > options.template_max_depth {
        return None;
    }
    if a.len() != b.len() || a.len() > options.template_max_keys {
        return None;
    }

    let mut keys_a: Vec<&String> = a.keys().collect();
    let mut keys_b: Vec<&String> = b.keys().collect();
    keys_a.sort();
    keys_b.sort();
    if keys_a != keys_b {
        return None;
    }
    // rows carry no keys, so the order has to match too
    if !a.keys().eq(b.keys()) {
        return None;
    }

    let mut fields = Vec::with_capacity(a.len());
    for (key, value_a) in a.iter() {
        let value_b = b.get(key)?;
        match (value_a, value_b) {
            (Value::Mapping(nested_a), Value::Mapping(nested_b)) => {
                let nested = shared_fields(nested_a, nested_b, level + 1, options)?;
                fields.push(Field {
                    key: key.clone(),
                    nested: Some(nested),
                });
            }
            (Value::Mapping(_), _) | (_, Value::Mapping(_)) => return None,
            _ => fields.push(Field::leaf(key)),
        }
    }
    Some(fields)
}

fn conforms_to(fields: &[Field], value: &Value) -> bool {
    let Value::Mapping(map) = value else {
        return false;
    };
    if map.len() != fields.len() {
        return false;
    }
    fields
        .iter()
        .zip(map.iter())
        .all(|(field, (key, value))| match (value, &field.nested) {
            _ if *key != field.key => false,
            (Value::Missing, _) => false,
            (nested_value, Some(nested)) => conforms_to(nested, nested_value),
            (leaf, None) => !leaf.is_mapping(),
        })
}
