use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::warn;

pub const PACKAGE_NAME: &str = "asset-suppressor";

/// Object nesting (`{ chunks: { chunk: ... } }`) beyond this depth is
/// rejected instead of followed.
pub const MAX_OPTION_DEPTH: usize = 32;

/// The untyped value handed to the plugin as its options.
#[derive(Clone, Debug, PartialEq)]
pub enum RawOption {
    Undefined,
    Null,
    String(String),
    Number(Number),
    Bool(bool),
    /// opaque scalar, carries its description
    Symbol(Option<String>),
    List(Vec<RawOption>),
    Object(RawObject),
    Callable,
}

/// Only the two keys the normalizer looks at are kept, everything else an
/// options object carries is irrelevant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawObject {
    pub chunks: Option<Box<RawOption>>,
    pub chunk: Option<Box<RawOption>>,
}

impl RawObject {
    pub fn with_chunks(value: impl Into<RawOption>) -> Self {
        Self {
            chunks: Some(Box::new(value.into())),
            chunk: None,
        }
    }

    pub fn with_chunk(value: impl Into<RawOption>) -> Self {
        Self {
            chunks: None,
            chunk: Some(Box::new(value.into())),
        }
    }

    // a key holding `undefined` is the same as a missing key
    fn nested(&self) -> Option<&RawOption> {
        fn present(field: &Option<Box<RawOption>>) -> Option<&RawOption> {
            match field.as_deref() {
                None | Some(RawOption::Undefined) => None,
                Some(value) => Some(value),
            }
        }
        present(&self.chunks).or_else(|| present(&self.chunk))
    }
}

impl From<Value> for RawOption {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RawOption::Null,
            Value::Bool(b) => RawOption::Bool(b),
            Value::Number(n) => RawOption::Number(n),
            Value::String(s) => RawOption::String(s),
            Value::Array(items) => RawOption::List(items.into_iter().map(Into::into).collect()),
            Value::Object(mut map) => RawOption::Object(RawObject {
                chunks: map.remove("chunks").map(|v| Box::new(v.into())),
                chunk: map.remove("chunk").map(|v| Box::new(v.into())),
            }),
        }
    }
}

impl From<&str> for RawOption {
    fn from(s: &str) -> Self {
        RawOption::String(s.to_string())
    }
}

impl From<String> for RawOption {
    fn from(s: String) -> Self {
        RawOption::String(s)
    }
}

impl From<RawObject> for RawOption {
    fn from(object: RawObject) -> Self {
        RawOption::Object(object)
    }
}

impl<'de> Deserialize<'de> for RawOption {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(RawOption::from)
    }
}

/// String form of a raw option, the way a chunk name gets coerced out of it.
impl fmt::Display for RawOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawOption::Undefined => write!(f, "undefined"),
            RawOption::Null => write!(f, "null"),
            RawOption::String(s) => write!(f, "{}", s),
            RawOption::Number(n) => write!(f, "{}", number_to_string(n)),
            RawOption::Bool(b) => write!(f, "{}", b),
            RawOption::Symbol(description) => {
                write!(f, "Symbol({})", description.as_deref().unwrap_or(""))
            }
            RawOption::List(items) => {
                let parts = items
                    .iter()
                    .map(|item| match item {
                        RawOption::Undefined | RawOption::Null => String::new(),
                        _ => item.to_string(),
                    })
                    .collect::<Vec<_>>();
                write!(f, "{}", parts.join(","))
            }
            RawOption::Object(_) => write!(f, "[object Object]"),
            RawOption::Callable => write!(f, "function"),
        }
    }
}

fn number_to_string(n: &Number) -> String {
    match n.as_f64() {
        Some(float) if n.is_f64() => float_to_string(float),
        _ => n.to_string(),
    }
}

/// Shortest round-trip digits laid out the way JS `Number#toString` does:
/// plain decimal for exponents in -7..21, exponent notation otherwise.
fn float_to_string(float: f64) -> String {
    if float == 0.0 {
        return "0".to_string();
    }
    if float < 0.0 {
        return format!("-{}", float_to_string(-float));
    }
    // `{:e}` prints the shortest digits, e.g. `1.2345e20`
    let formatted = format!("{:e}", float);
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let digits = mantissa.replace('.', "");
    let k = digits.len() as i32;
    let n = exponent.parse::<i32>().unwrap_or(0) + 1;

    if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat(-n as usize), digits)
    } else {
        let (first, rest) = digits.split_at(1);
        let sign = if n - 1 < 0 { '-' } else { '+' };
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, (n - 1).abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, (n - 1).abs())
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationWarning {
    #[error("passing in an empty array makes the plugin have no effect")]
    EmptyList,
    #[error("passing in a function makes the plugin have no effect")]
    Callable,
    #[error("passing in `{0}` makes the plugin have no effect")]
    Nullish(String),
    #[error(
        "passing in an options object that does not have a \"chunks\" or \"chunk\" key makes the plugin have no effect"
    )]
    MissingChunksKey,
    #[error("passing in options nested deeper than {0} levels makes the plugin have no effect")]
    TooDeep(usize),
    #[error("chunk names should be strings, will use \"{0}\"")]
    Coerced(String),
    #[error("only one `options` argument is supported. `{0}` will be ignored")]
    ExtraArguments(String),
}

impl ConfigurationWarning {
    pub fn log(&self) {
        warn!("{}: {}.", PACKAGE_NAME, self);
    }
}

/// Canonical plugin options: the names of the chunks whose files are dropped.
#[derive(Serialize, Clone, Debug, Default, Eq, PartialEq)]
pub struct Configuration {
    pub chunks: Vec<String>,
}

impl Configuration {
    /// Never fails, unusable input ends up as an empty (no-op) configuration
    /// and a logged warning.
    pub fn normalize(raw: &RawOption) -> Self {
        let (config, warnings) = Self::normalize_with_warnings(raw);
        warnings.iter().for_each(ConfigurationWarning::log);
        config
    }

    pub fn normalize_with_warnings(raw: &RawOption) -> (Self, Vec<ConfigurationWarning>) {
        let mut warnings = vec![];
        let chunks = normalize_chunks(raw, 0, &mut warnings);
        (Self { chunks }, warnings)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.chunks.iter().any(|chunk| chunk == name)
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl<'de> Deserialize<'de> for Configuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawOption::deserialize(deserializer).map(|raw| Configuration::normalize(&raw))
    }
}

fn normalize_chunks(
    raw: &RawOption,
    depth: usize,
    warnings: &mut Vec<ConfigurationWarning>,
) -> Vec<String> {
    match raw {
        RawOption::String(s) => vec![s.clone()],
        RawOption::List(items) if items.is_empty() => {
            warnings.push(ConfigurationWarning::EmptyList);
            vec![]
        }
        RawOption::List(items) => items.iter().map(ToString::to_string).collect(),
        RawOption::Callable => {
            warnings.push(ConfigurationWarning::Callable);
            vec![]
        }
        RawOption::Undefined | RawOption::Null => {
            warnings.push(ConfigurationWarning::Nullish(raw.to_string()));
            vec![]
        }
        RawOption::Object(object) => match object.nested() {
            Some(_) if depth >= MAX_OPTION_DEPTH => {
                warnings.push(ConfigurationWarning::TooDeep(MAX_OPTION_DEPTH));
                vec![]
            }
            Some(nested) => normalize_chunks(nested, depth + 1, warnings),
            None => {
                warnings.push(ConfigurationWarning::MissingChunksKey);
                vec![]
            }
        },
        RawOption::Number(_) | RawOption::Bool(_) | RawOption::Symbol(_) => {
            let name = raw.to_string();
            warnings.push(ConfigurationWarning::Coerced(name.clone()));
            vec![name]
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn normalize(value: Value) -> (Vec<String>, Vec<ConfigurationWarning>) {
        let (config, warnings) = Configuration::normalize_with_warnings(&value.into());
        (config.chunks, warnings)
    }

    #[test]
    fn test_string() {
        assert_eq!(normalize(json!("main")), (vec!["main".to_string()], vec![]));
        assert_eq!(normalize(json!("")), (vec!["".to_string()], vec![]));
    }

    #[test]
    fn test_list_keeps_order_and_stringifies() {
        let (chunks, warnings) = normalize(json!(["vendor", 1, true, "main", null]));
        assert_eq!(chunks, vec!["vendor", "1", "true", "main", "null"]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_nested_list_element_is_joined() {
        let (chunks, _) = normalize(json!([["a", null, 2], {"chunks": "x"}]));
        assert_eq!(chunks, vec!["a,,2", "[object Object]"]);
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(
            normalize(json!([])),
            (vec![], vec![ConfigurationWarning::EmptyList])
        );
    }

    #[test]
    fn test_nullish() {
        assert_eq!(
            normalize(json!(null)),
            (vec![], vec![ConfigurationWarning::Nullish("null".to_string())])
        );
        let (config, warnings) = Configuration::normalize_with_warnings(&RawOption::Undefined);
        assert!(config.is_empty());
        assert_eq!(
            warnings,
            vec![ConfigurationWarning::Nullish("undefined".to_string())]
        );
    }

    #[test]
    fn test_callable() {
        let (config, warnings) = Configuration::normalize_with_warnings(&RawOption::Callable);
        assert!(config.is_empty());
        assert_eq!(warnings, vec![ConfigurationWarning::Callable]);
    }

    #[test]
    fn test_object_delegates_to_chunks() {
        for value in [json!("main"), json!(["a", "b"]), json!([]), json!(null), json!(7)] {
            assert_eq!(normalize(json!({ "chunks": value.clone() })), normalize(value));
        }
    }

    #[test]
    fn test_object_delegates_to_chunk() {
        for value in [json!("main"), json!(["a", "b"]), json!(false)] {
            assert_eq!(normalize(json!({ "chunk": value.clone() })), normalize(value));
        }
    }

    #[test]
    fn test_chunks_wins_over_chunk() {
        let (chunks, _) = normalize(json!({ "chunk": "b", "chunks": ["a"] }));
        assert_eq!(chunks, vec!["a"]);
    }

    #[test]
    fn test_undefined_chunks_falls_back_to_chunk() {
        let raw = RawOption::Object(RawObject {
            chunks: Some(Box::new(RawOption::Undefined)),
            chunk: Some(Box::new("b".into())),
        });
        assert_eq!(Configuration::normalize(&raw).chunks, vec!["b"]);
    }

    #[test]
    fn test_object_without_keys() {
        assert_eq!(
            normalize(json!({ "name": "main" })),
            (vec![], vec![ConfigurationWarning::MissingChunksKey])
        );
        assert_eq!(
            normalize(json!({})),
            (vec![], vec![ConfigurationWarning::MissingChunksKey])
        );
    }

    #[test]
    fn test_scalar_coerced() {
        assert_eq!(
            normalize(json!(42)),
            (
                vec!["42".to_string()],
                vec![ConfigurationWarning::Coerced("42".to_string())]
            )
        );
        assert_eq!(normalize(json!(1.5)).0, vec!["1.5"]);
        assert_eq!(normalize(json!(3.0)).0, vec!["3"]);
        assert_eq!(normalize(json!(-0.25)).0, vec!["-0.25"]);
        assert_eq!(
            Configuration::normalize(&RawOption::Symbol(Some("main".to_string()))).chunks,
            vec!["Symbol(main)"]
        );
    }

    #[test]
    fn test_float_string_form() {
        assert_eq!(float_to_string(1.2345678901234568e20), "123456789012345680000");
        assert_eq!(float_to_string(1e20), "100000000000000000000");
        assert_eq!(float_to_string(1e21), "1e+21");
        assert_eq!(float_to_string(1.5e300), "1.5e+300");
        assert_eq!(float_to_string(1e-6), "0.000001");
        assert_eq!(float_to_string(1.25e-7), "1.25e-7");
        assert_eq!(float_to_string(123.456), "123.456");
        assert_eq!(float_to_string(-0.0), "0");
    }

    #[test]
    fn test_deep_nesting_is_cut_off() {
        let mut raw: RawOption = "main".into();
        for _ in 0..=MAX_OPTION_DEPTH {
            raw = RawObject::with_chunks(raw).into();
        }
        let (config, warnings) = Configuration::normalize_with_warnings(&raw);
        assert!(config.is_empty());
        assert_eq!(warnings, vec![ConfigurationWarning::TooDeep(MAX_OPTION_DEPTH)]);

        let mut raw: RawOption = "main".into();
        for _ in 0..MAX_OPTION_DEPTH {
            raw = RawObject::with_chunk(raw).into();
        }
        assert_eq!(Configuration::normalize(&raw).chunks, vec!["main"]);
    }

    #[test]
    fn test_deserialize_configuration() {
        let config: Configuration = serde_json::from_str(r#"{"chunks":["main",2]}"#).unwrap();
        assert_eq!(config.chunks, vec!["main", "2"]);
        let config: Configuration = serde_json::from_str(r#""vendor""#).unwrap();
        assert_eq!(config.chunks, vec!["vendor"]);
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(text, r#"{"chunks":["vendor"]}"#);
    }

    #[test]
    fn test_warning_messages() {
        assert_eq!(
            ConfigurationWarning::Coerced("42".to_string()).to_string(),
            r#"chunk names should be strings, will use "42""#
        );
        assert_eq!(
            ConfigurationWarning::Nullish("null".to_string()).to_string(),
            "passing in `null` makes the plugin have no effect"
        );
    }
}
