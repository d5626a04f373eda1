//! Declared parameter schemas for tools
//!
//! A `ParameterSchema` is the typed field list a tool accepts. It is rendered as
//! JSON Schema for the reasoning backend and used to validate arguments before
//! a tool runs.

use agent_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Field type in a parameter schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    /// JSON Schema type name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Whether a JSON value is acceptable for this type
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// A single named parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    pub required: bool,
}

/// Ordered list of parameters a tool accepts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    params: Vec<Parameter>,
}

impl ParameterSchema {
    /// Create an empty schema (a tool without parameters)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required parameter
    pub fn required(self, name: &str, param_type: ParamType, description: &str) -> Self {
        self.with_param(name, param_type, description, true)
    }

    /// Add an optional parameter
    pub fn optional(self, name: &str, param_type: ParamType, description: &str) -> Self {
        self.with_param(name, param_type, description, false)
    }

    fn with_param(
        mut self,
        name: &str,
        param_type: ParamType,
        description: &str,
        required: bool,
    ) -> Self {
        self.params.retain(|p| p.name != name);
        self.params.push(Parameter {
            name: name.to_string(),
            param_type,
            description: description.to_string(),
            required,
        });
        self
    }

    /// All parameters in declaration order
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// Look up a parameter by name
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Render as a JSON Schema object
    ///
    /// # Example
    ///
    /// ```
    /// use agent_tools::{ParamType, ParameterSchema};
    ///
    /// let schema = ParameterSchema::new()
    ///     .required("query", ParamType::String, "Search query")
    ///     .optional("max_results", ParamType::Integer, "Maximum results");
    ///
    /// let json = schema.to_json_schema();
    /// assert_eq!(json["type"], "object");
    /// assert_eq!(json["required"][0], "query");
    /// ```
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            let mut property = json!({
                "type": param.param_type.as_str(),
                "description": param.description,
            });
            if param.param_type == ParamType::Array {
                property["items"] = json!({});
            }
            properties.insert(param.name.clone(), property);
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Check an argument mapping against the schema
    ///
    /// `null` is accepted for optional parameters. Unknown keys are ignored.
    pub fn validate(&self, tool: &str, arguments: &Value) -> Result<()> {
        let Some(args) = arguments.as_object() else {
            return Err(Error::invalid_arguments(
                tool,
                format!("expected an object, got {}", type_name(arguments)),
            ));
        };

        for param in &self.params {
            match args.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(Error::invalid_arguments(
                        tool,
                        format!("missing required parameter '{}'", param.name),
                    ));
                }
                None | Some(Value::Null) => {}
                Some(value) if !param.param_type.accepts(value) => {
                    return Err(Error::invalid_arguments(
                        tool,
                        format!(
                            "parameter '{}' must be {}, got {}",
                            param.name,
                            param.param_type.as_str(),
                            type_name(value)
                        ),
                    ));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peers_schema() -> ParameterSchema {
        ParameterSchema::new()
            .required("symbol", ParamType::String, "Ticker symbol")
            .optional("max_peers", ParamType::Integer, "Maximum peers")
    }

    #[test]
    fn test_json_schema_rendering() {
        let schema = peers_schema().to_json_schema();
        assert_eq!(schema["properties"]["symbol"]["type"], "string");
        assert_eq!(schema["properties"]["max_peers"]["type"], "integer");
        assert_eq!(schema["required"], json!(["symbol"]));
    }

    #[test]
    fn test_validate_accepts_good_arguments() {
        let schema = peers_schema();
        assert!(schema.validate("peers", &json!({"symbol": "OGDC"})).is_ok());
        assert!(
            schema
                .validate("peers", &json!({"symbol": "OGDC", "max_peers": 3}))
                .is_ok()
        );
        assert!(
            schema
                .validate("peers", &json!({"symbol": "OGDC", "max_peers": null}))
                .is_ok()
        );
    }

    #[test]
    fn test_validate_rejects_missing_required() {
        let err = peers_schema()
            .validate("peers", &json!({"max_peers": 3}))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArguments { .. }));
        assert!(err.to_string().contains("symbol"));
    }

    #[test]
    fn test_validate_rejects_wrong_type() {
        let err = peers_schema()
            .validate("peers", &json!({"symbol": "OGDC", "max_peers": 2.5}))
            .unwrap_err();
        assert!(err.to_string().contains("must be integer"));

        let err = peers_schema().validate("peers", &json!("OGDC")).unwrap_err();
        assert!(err.to_string().contains("expected an object"));
    }

    #[test]
    fn test_redeclared_parameter_replaces_previous() {
        let schema = ParameterSchema::new()
            .optional("symbol", ParamType::String, "old")
            .required("symbol", ParamType::String, "new");
        assert_eq!(schema.params().len(), 1);
        assert!(schema.get("symbol").is_some_and(|p| p.required));
    }
}
