//! Declarative requests for remote resources
//!
//! A [`ResourceDescriptor`] pairs the path of an API resource with a
//! [`ResponseParser`] that checks the response has the expected shape.
//! Descriptors are built fresh for every render and dropped once the batched
//! fetch has consumed them. Two descriptors are the same resource when their
//! paths are equal.

use std::{any::type_name, fmt, sync::Arc};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::ParseError;

/// Ordered path segments identifying one API resource, e.g.
/// `["api", "v1", "users", "me"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourcePath(Vec<String>);

impl ResourcePath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Split a slash separated route into segments, ignoring empty ones.
    pub fn parse(path: &str) -> Self {
        Self::new(path.split('/').filter(|segment| !segment.is_empty()))
    }

    /// Replace a `{name}` placeholder segment with a concrete value.
    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        let placeholder = format!("{{{name}}}");
        let value = value.into();
        for segment in &mut self.0 {
            if *segment == placeholder {
                segment.clone_from(&value);
            }
        }
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0.join("/"))
    }
}

impl From<&str> for ResourcePath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<Vec<String>> for ResourcePath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

type ParseFn = dyn Fn(Value) -> Result<Value, ParseError> + Send + Sync;

/// Validator for the body of one resource.
///
/// Parsers built with [`ResponseParser::of`] decode the body into `T` and
/// re-encode it, so anything `T` does not describe is rejected and typed
/// values (dates in particular) come out in their canonical form.
#[derive(Clone)]
pub struct ResponseParser {
    expected: &'static str,
    parse: Arc<ParseFn>,
}

impl ResponseParser {
    pub fn of<T>() -> Self
    where
        T: DeserializeOwned + Serialize + 'static,
    {
        Self {
            expected: type_name::<T>(),
            parse: Arc::new(|raw: Value| -> Result<Value, ParseError> {
                let typed: T = serde_json::from_value(raw)
                    .map_err(|err| ParseError::new(type_name::<T>(), err))?;
                serde_json::to_value(&typed)
                    .map_err(|err| ParseError::new(type_name::<T>(), err))
            }),
        }
    }

    /// Accept any JSON object, keeping every field.
    pub fn object() -> Self {
        Self {
            expected: "object",
            parse: Arc::new(|raw: Value| match raw {
                Value::Object(_) => Ok(raw),
                other => Err(ParseError::new("object", format!("found {}", json_kind(&other)))),
            }),
        }
    }

    /// Accept any JSON value.
    pub fn any() -> Self {
        Self {
            expected: "any",
            parse: Arc::new(|raw: Value| Ok::<_, ParseError>(raw)),
        }
    }

    pub fn expected(&self) -> &'static str {
        self.expected
    }

    pub fn parse(&self, raw: Value) -> Result<Value, ParseError> {
        (self.parse)(raw)
    }
}

impl fmt::Debug for ResponseParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseParser")
            .field("expected", &self.expected)
            .finish()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One remote resource required to render a page
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    path: ResourcePath,
    parser: ResponseParser,
}

impl ResourceDescriptor {
    pub fn new(path: impl Into<ResourcePath>, parser: ResponseParser) -> Self {
        Self {
            path: path.into(),
            parser,
        }
    }

    /// Descriptor whose body must decode as `T`.
    pub fn of<T>(path: impl Into<ResourcePath>) -> Self
    where
        T: DeserializeOwned + Serialize + 'static,
    {
        Self::new(path, ResponseParser::of::<T>())
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    pub fn parser(&self) -> &ResponseParser {
        &self.parser
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    struct Library {
        id: u32,
        name: String,
    }

    #[test]
    fn parse_splits_and_drops_empty_segments() {
        let path = ResourcePath::parse("/api/v1//users/me/");
        assert_eq!(path.segments(), ["api", "v1", "users", "me"]);
        assert_eq!(path.to_string(), "/api/v1/users/me");
    }

    #[test]
    fn with_param_fills_placeholders() {
        let path = ResourcePath::parse("/api/v1/libraries/{id}/media")
            .with_param("id", "7");
        assert_eq!(path.to_string(), "/api/v1/libraries/7/media");
    }

    #[test]
    fn typed_parser_accepts_matching_shape() {
        let parser = ResponseParser::of::<Vec<Library>>();
        let parsed = parser
            .parse(json!([{ "id": 1, "name": "Movies" }]))
            .expect("valid body");
        assert_eq!(parsed, json!([{ "id": 1, "name": "Movies" }]));
    }

    #[test]
    fn typed_parser_rejects_wrong_shape() {
        let parser = ResponseParser::of::<Vec<Library>>();
        let err = parser.parse(json!({ "id": "nope" })).unwrap_err();
        assert!(err.expected.contains("Library"));
    }

    #[test]
    fn object_parser_rejects_non_objects() {
        let parser = ResponseParser::object();
        assert!(parser.parse(json!({ "name": "Alice" })).is_ok());
        let err = parser.parse(json!(["Alice"])).unwrap_err();
        assert_eq!(err.message, "found array");
    }
}
