//! Parameter Schema Compiler.
//!
//! Turns an action's declared parameter list into a JSON Schema input schema
//! for the compiled tool. Every declared parameter becomes an *optional*
//! property (the model may omit arguments it cannot infer), typed per the
//! declaration and wrapped in an array schema when `isArray` is set.
//!
//! Unknown or absent parameter types fail compilation with a
//! [`SchemaError`]; guessing a type here would let malformed values flow
//! into template substitution unnoticed.

use crate::action::{Parameter, ParameterType};
use crate::error::{Result, SchemaError};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// Compile a parameter list into a JSON Schema object.
///
/// The resulting schema always has `"type": "object"` with one property per
/// parameter and an empty `required` list.
pub fn compile_schema(parameters: &[Parameter]) -> Result<Value> {
    let mut properties = Map::new();
    let mut seen = HashSet::new();

    for parameter in parameters {
        if parameter.name.trim().is_empty() {
            return Err(SchemaError::InvalidParameter(
                "parameter name is empty".to_string(),
            ));
        }
        if !seen.insert(parameter.name.as_str()) {
            return Err(SchemaError::DuplicateParameter(parameter.name.clone()));
        }
        properties.insert(parameter.name.clone(), field_schema(parameter)?);
    }

    Ok(json!({
        "type": "object",
        "properties": Value::Object(properties),
        "required": [],
    }))
}

fn field_schema(parameter: &Parameter) -> Result<Value> {
    let base = match parameter.param_type {
        ParameterType::String => "string",
        ParameterType::Number => "number",
        ParameterType::Boolean => "boolean",
        ParameterType::Unknown => {
            return Err(SchemaError::UnsupportedType {
                name: parameter.name.clone(),
            })
        }
    };

    let mut field = if parameter.is_array {
        json!({"type": "array", "items": {"type": base}})
    } else {
        json!({"type": base})
    };

    if !parameter.description.is_empty() {
        field["description"] = Value::String(parameter.description.clone());
    }

    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parameter(name: &str, param_type: ParameterType, is_array: bool) -> Parameter {
        Parameter {
            name: name.to_string(),
            description: format!("the {name}"),
            param_type,
            is_array,
        }
    }

    #[test]
    fn compiles_scalar_parameters_as_optional_properties() {
        let schema = compile_schema(&[
            parameter("city", ParameterType::String, false),
            parameter("days", ParameterType::Number, false),
            parameter("detailed", ParameterType::Boolean, false),
        ])
        .unwrap();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["city"]["type"], "string");
        assert_eq!(schema["properties"]["days"]["type"], "number");
        assert_eq!(schema["properties"]["detailed"]["type"], "boolean");
        assert_eq!(schema["required"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn wraps_array_parameters_in_list_schema() {
        let schema =
            compile_schema(&[parameter("tags", ParameterType::String, true)]).unwrap();

        assert_eq!(schema["properties"]["tags"]["type"], "array");
        assert_eq!(schema["properties"]["tags"]["items"]["type"], "string");
    }

    #[test]
    fn carries_descriptions_into_the_schema() {
        let schema =
            compile_schema(&[parameter("city", ParameterType::String, false)]).unwrap();
        assert_eq!(schema["properties"]["city"]["description"], "the city");
    }

    #[test]
    fn unknown_type_fails_compilation() {
        let err =
            compile_schema(&[parameter("when", ParameterType::Unknown, false)]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnsupportedType {
                name: "when".to_string()
            }
        );
    }

    #[test]
    fn duplicate_names_fail_compilation() {
        let err = compile_schema(&[
            parameter("city", ParameterType::String, false),
            parameter("city", ParameterType::Number, false),
        ])
        .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateParameter("city".to_string()));
    }

    #[test]
    fn empty_parameter_list_compiles_to_empty_object_schema() {
        let schema = compile_schema(&[]).unwrap();
        assert!(schema["properties"].as_object().unwrap().is_empty());
    }
}
