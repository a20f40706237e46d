//! Declarative parameter schemas and validation.
//!
//! Every stage declares the parameters it accepts. The invoker validates a
//! stage's arguments against that schema before calling it, so a typo in a
//! pipeline definition fails the build up front instead of halfway through
//! the document stream.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::{PipelineError, Result};

/// The shape a parameter value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Boolean,
    String,
    /// A string, or `null` for "not set".
    OptionalString,
    /// A mapping with arbitrary keys.
    Object,
    /// A list of strings.
    StringList,
    /// `null` or a list of mappings (see [`super::Selector`]).
    Selector,
    /// A list of stage descriptors (mappings).
    Pipeline,
}

impl ParamKind {
    /// Check a value against this kind, returning a description of the
    /// expected shape on mismatch.
    fn check(self, value: &Value) -> std::result::Result<(), &'static str> {
        let ok = match self {
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::String => value.is_string(),
            ParamKind::OptionalString => value.is_null() || value.is_string(),
            ParamKind::Object => value.is_object(),
            ParamKind::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            ParamKind::Selector => {
                value.is_null()
                    || value
                        .as_array()
                        .is_some_and(|items| items.iter().all(Value::is_object))
            }
            ParamKind::Pipeline => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_object)),
        };

        if ok { Ok(()) } else { Err(self.expected()) }
    }

    fn expected(self) -> &'static str {
        match self {
            ParamKind::Boolean => "a boolean",
            ParamKind::String => "a string",
            ParamKind::OptionalString => "a string or null",
            ParamKind::Object => "a mapping",
            ParamKind::StringList => "a list of strings",
            ParamKind::Selector => "null or a list of mappings",
            ParamKind::Pipeline => "a list of stage descriptors",
        }
    }
}

/// A single declared parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    /// Value used when the parameter is omitted; `None` means required.
    pub default: Option<Value>,
}

/// The parameters a stage accepts, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    params: Vec<Param>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an optional parameter with a default value.
    pub fn optional(mut self, name: &'static str, kind: ParamKind, default: impl Into<Value>) -> Self {
        self.params.push(Param {
            name,
            kind,
            default: Some(default.into()),
        });
        self
    }

    /// Declare a parameter that must be supplied.
    pub fn required(mut self, name: &'static str, kind: ParamKind) -> Self {
        self.params.push(Param {
            name,
            kind,
            default: None,
        });
        self
    }

    /// Declare the conventional `when` selector, defaulting to "everything".
    pub fn selector(self) -> Self {
        self.optional("when", ParamKind::Selector, Value::Null)
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    fn get(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// Validated stage arguments with defaults applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    stage: String,
    values: Map<String, Value>,
}

impl Params {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Decode the parameters into a stage's typed parameter struct.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        let stage = self.stage;
        serde_json::from_value(Value::Object(self.values))
            .map_err(|e| PipelineError::configuration(stage, "(params)", e.to_string()))
    }
}

/// Validate stage arguments against a schema.
///
/// Rejects unknown keys, values of the wrong shape, and missing required
/// keys; fills in defaults for everything else. Errors name the stage, the
/// offending key, and (for shape errors) the offending value.
pub fn validate(stage: &str, args: &Map<String, Value>, schema: &Schema) -> Result<Params> {
    if let Some(key) = args.keys().find(|key| schema.get(key).is_none()) {
        let known = schema
            .params()
            .iter()
            .map(|p| p.name)
            .collect::<Vec<_>>()
            .join(", ");
        let message = if known.is_empty() {
            "unrecognized parameter (this stage takes no parameters)".to_string()
        } else {
            format!("unrecognized parameter (expected one of: {known})")
        };
        return Err(PipelineError::configuration(stage, key.as_str(), message));
    }

    let mut values = Map::new();
    for param in schema.params() {
        let value = match (args.get(param.name), &param.default) {
            (Some(value), _) => {
                param.kind.check(value).map_err(|expected| {
                    PipelineError::configuration(
                        stage,
                        param.name,
                        format!("expected {expected}, got {value}"),
                    )
                })?;
                value.clone()
            }
            (None, Some(default)) => default.clone(),
            (None, None) => {
                return Err(PipelineError::configuration(
                    stage,
                    param.name,
                    "missing required parameter",
                ));
            }
        };
        values.insert(param.name.to_string(), value);
    }

    Ok(Params {
        stage: stage.to_string(),
        values,
    })
}
