//! Excluding constructor
//!
//! Turns a composed node tree into a native `serde_yaml::Value`, filtering
//! out mapping entries and sequence elements matched by the dialect's
//! exclusion predicates before construction. Filtering runs on raw nodes,
//! so predicates decide on tags and structure, never on converted values,
//! and an excluded entry is never constructed at all.
//!
//! Construction is restricted to the safe schema: plain scalars resolve to
//! null/bool/int/float/string, explicit `tag:yaml.org,2002:*` tags are
//! honored for those types, and any other tag still present at this stage
//! is an error. Composition-time directives perform file-system side
//! effects; combining them with unrestricted type construction is exactly
//! the mix this loader exists to forbid.

use crate::dialect::Dialect;
use crate::error::{LoadError, LoadResult};
use crate::node::{Node, NodeContent, NodeKind};
use libyaml_safer::{Mark, ScalarStyle};
use serde_yaml::{Mapping, Value};
use std::sync::Arc;
use tracing::trace;

const TAG_STR: &str = "tag:yaml.org,2002:str";
const TAG_INT: &str = "tag:yaml.org,2002:int";
const TAG_FLOAT: &str = "tag:yaml.org,2002:float";
const TAG_BOOL: &str = "tag:yaml.org,2002:bool";
const TAG_NULL: &str = "tag:yaml.org,2002:null";

/// Safe-schema constructor with exclusion filtering.
pub struct Constructor {
    dialect: Arc<Dialect>,
}

impl Constructor {
    pub fn new(dialect: Arc<Dialect>) -> Self {
        Constructor { dialect }
    }

    /// Construct the native value for `node`, dropping excluded entries.
    pub fn construct(&self, node: &Node) -> LoadResult<Value> {
        match &node.content {
            NodeContent::Scalar { value, style } => self.construct_scalar(node, value, *style),
            NodeContent::Sequence(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    if self.excluded(NodeKind::Sequence, item, None) {
                        trace!("excluding sequence element at {}", item.mark);
                        continue;
                    }
                    out.push(self.construct(item)?);
                }
                Ok(Value::Sequence(out))
            }
            NodeContent::Mapping(pairs) => {
                let mut out = Mapping::new();
                for (key, value) in pairs {
                    if self.excluded(NodeKind::Mapping, key, Some(value)) {
                        trace!("excluding mapping entry at {}", key.mark);
                        continue;
                    }
                    out.insert(self.construct(key)?, self.construct(value)?);
                }
                Ok(Value::Mapping(out))
            }
        }
    }

    fn excluded(&self, kind: NodeKind, node: &Node, value: Option<&Node>) -> bool {
        self.dialect
            .exclusions(kind)
            .iter()
            .any(|predicate| predicate.excludes(node, value))
    }

    fn construct_scalar(&self, node: &Node, value: &str, style: ScalarStyle) -> LoadResult<Value> {
        match node.tag.as_deref() {
            // The non-specific `!` tag forces the default type for the
            // style, which for scalars is a string.
            Some(TAG_STR) | Some("!") => Ok(Value::String(value.to_string())),
            Some(TAG_NULL) => Ok(Value::Null),
            Some(TAG_BOOL) => {
                parse_bool(value).ok_or_else(|| bad_scalar("bool", value, node.mark))
            }
            Some(TAG_INT) => parse_int(value).ok_or_else(|| bad_scalar("int", value, node.mark)),
            Some(TAG_FLOAT) => parse_f64(value)
                .map(|f| Value::Number(f.into()))
                .ok_or_else(|| bad_scalar("float", value, node.mark)),
            Some(other) => Err(LoadError::Construct {
                problem: format!("cannot construct value with tag `{other}` in safe mode"),
                mark: node.mark,
            }),
            None => {
                if style == ScalarStyle::Plain {
                    Ok(resolve_plain(value))
                } else {
                    Ok(Value::String(value.to_string()))
                }
            }
        }
    }
}

fn bad_scalar(expected: &str, value: &str, mark: Mark) -> LoadError {
    LoadError::Construct {
        problem: format!("cannot construct {expected} from `{value}`"),
        mark,
    }
}

/// Core-schema resolution for an untagged plain scalar.
fn resolve_plain(value: &str) -> Value {
    match value {
        "" | "~" | "null" | "Null" | "NULL" => Value::Null,
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => {
            if let Some(number) = parse_int(value) {
                number
            } else if let Some(float) = parse_f64(value) {
                Value::Number(float.into())
            } else {
                Value::String(value.to_string())
            }
        }
    }
}

fn parse_bool(value: &str) -> Option<Value> {
    match value {
        "true" | "True" | "TRUE" => Some(Value::Bool(true)),
        "false" | "False" | "FALSE" => Some(Value::Bool(false)),
        _ => None,
    }
}

fn parse_int(value: &str) -> Option<Value> {
    if let Some(hex) = value.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok().map(|i| Value::Number(i.into()));
    }
    if let Some(octal) = value.strip_prefix("0o") {
        return i64::from_str_radix(octal, 8).ok().map(|i| Value::Number(i.into()));
    }
    let unsigned = value.strip_prefix('+').unwrap_or(value);
    if let Ok(integer) = unsigned.parse::<i64>() {
        return Some(Value::Number(integer.into()));
    }
    // Past i64::MAX but still an integer
    unsigned.parse::<u64>().ok().map(|u| Value::Number(u.into()))
}

fn parse_f64(value: &str) -> Option<f64> {
    match value {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        // Require a digit so words like `inf`, which Rust itself parses as
        // a float, stay strings.
        _ if value.bytes().any(|b| b.is_ascii_digit()) => value.parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{load_str, Loader, LoaderOptions};

    fn value(text: &str) -> Value {
        load_str(text).unwrap()
    }

    #[test]
    fn test_plain_scalar_resolution() {
        assert_eq!(value("42"), Value::Number(42.into()));
        assert_eq!(value("-7"), Value::Number((-7).into()));
        assert_eq!(value("0x1F"), Value::Number(31.into()));
        assert_eq!(value("0o17"), Value::Number(15.into()));
        assert_eq!(value("1.5"), Value::Number(1.5.into()));
        assert_eq!(value("true"), Value::Bool(true));
        assert_eq!(value("null"), Value::Null);
        assert_eq!(value("~"), Value::Null);
        assert_eq!(value("hello"), Value::String("hello".to_string()));
        // Bare words that Rust would parse as floats stay strings
        assert_eq!(value("inf"), Value::String("inf".to_string()));
        assert_eq!(value("nan"), Value::String("nan".to_string()));
    }

    #[test]
    fn test_infinities() {
        assert_eq!(value(".inf"), Value::Number(f64::INFINITY.into()));
        assert_eq!(value("-.inf"), Value::Number(f64::NEG_INFINITY.into()));
        match value(".nan") {
            Value::Number(n) => assert!(n.as_f64().map(f64::is_nan).unwrap_or(false)),
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn test_quoted_scalars_stay_strings() {
        assert_eq!(value("'42'"), Value::String("42".to_string()));
        assert_eq!(value("\"true\""), Value::String("true".to_string()));
    }

    #[test]
    fn test_explicit_core_tags() {
        assert_eq!(value("!!str 42"), Value::String("42".to_string()));
        assert_eq!(value("!!int '42'"), Value::Number(42.into()));
        assert_eq!(value("!!float 1"), Value::Number(1.0.into()));
        assert_eq!(value("!!bool true"), Value::Bool(true));
    }

    #[test]
    fn test_unknown_tag_is_an_error() {
        let err = load_str("a: !custom 1\n").unwrap_err();
        match err {
            LoadError::Construct { problem, .. } => {
                assert!(problem.contains("!custom"), "{problem}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_exclude_mapping_entry_preserves_order() {
        let loaded = value("a: 1\nb: !exclude 2\nc: 3\n");
        let map = loaded.as_mapping().unwrap();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                Value::String("a".to_string()),
                Value::String("c".to_string())
            ]
        );
        assert_eq!(
            map.get(&Value::String("c".to_string())),
            Some(&Value::Number(3.into()))
        );
    }

    #[test]
    fn test_exclude_sequence_element() {
        assert_eq!(
            value("[1, !exclude 2, 3]"),
            Value::Sequence(vec![Value::Number(1.into()), Value::Number(3.into())])
        );
    }

    #[test]
    fn test_exclude_triggered_by_key_tag() {
        let loaded = value("!exclude k: v\na: 1\n");
        let map = loaded.as_mapping().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(
            map.get(&Value::String("a".to_string())),
            Some(&Value::Number(1.into()))
        );
    }

    #[test]
    fn test_excluded_entries_are_never_constructed() {
        // The excluded value carries a tag that construction would reject
        let loaded = value("keep: 1\ndrop: !exclude 2\n");
        assert_eq!(loaded.as_mapping().unwrap().len(), 1);
    }

    #[test]
    fn test_custom_predicate_runs_after_builtin() {
        let mut dialect = Dialect::standard();
        dialect.register_exclusion(
            &[NodeKind::Mapping],
            Arc::new(|key: &Node, _: Option<&Node>| key.as_scalar() == Some("password")),
        );
        let loader = Loader::with_dialect(LoaderOptions::default(), Arc::new(dialect)).unwrap();
        let loaded = loader.load_str("user: admin\npassword: hunter2\n").unwrap();
        let map = loaded.as_mapping().unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&Value::String("user".to_string())));
    }
}
