//! Node definitions and parameter parsing.
//!
//! Each parameter carries a tagged [`ParameterKind`] variant with its own
//! validator and default-coercion rule, rather than a string-keyed type
//! name resolved at runtime.

use std::collections::HashMap;

use satellite_shared::{ParamValue, SatelliteError, SatelliteResult};
use serde_json::Value;

/// The type of a node parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterKind {
    Int,
    Str,
    Float,
    Bool,
    File,
}

impl ParameterKind {
    /// Parse a raw JSON value supplied by the caller into a [`ParamValue`],
    /// type-checking it against this kind.
    fn coerce(&self, name: &str, raw: &Value) -> SatelliteResult<ParamValue> {
        match self {
            ParameterKind::Int => raw
                .as_i64()
                .map(ParamValue::Int)
                .ok_or_else(|| type_mismatch(name, "int")),
            ParameterKind::Str => raw
                .as_str()
                .map(|s| ParamValue::Str(s.to_string()))
                .ok_or_else(|| type_mismatch(name, "string")),
            ParameterKind::Float => raw
                .as_f64()
                .map(ParamValue::Float)
                .ok_or_else(|| type_mismatch(name, "float")),
            ParameterKind::Bool => raw
                .as_bool()
                .map(ParamValue::Bool)
                .ok_or_else(|| type_mismatch(name, "bool")),
            ParameterKind::File => raw
                .as_str()
                .map(|s| ParamValue::File(s.to_string()))
                .ok_or_else(|| type_mismatch(name, "file")),
        }
    }

    /// Whether `default` type-checks against this kind, required when a
    /// [`ParameterSpec`] is constructed as optional.
    fn accepts_default(&self, default: &ParamValue) -> bool {
        matches!(
            (self, default),
            (ParameterKind::Int, ParamValue::Int(_))
                | (ParameterKind::Str, ParamValue::Str(_))
                | (ParameterKind::Float, ParamValue::Float(_))
                | (ParameterKind::Bool, ParamValue::Bool(_))
                | (ParameterKind::File, ParamValue::File(_))
        )
    }
}

fn type_mismatch(name: &str, expected: &str) -> SatelliteError {
    SatelliteError::InvalidRequest(format!("parameter '{name}' does not type-check as {expected}"))
}

/// The typed schema for one node parameter.
#[derive(Clone, Debug)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParameterKind,
    pub optional: bool,
    pub default: Option<ParamValue>,
}

impl ParameterSpec {
    /// Construct a spec, enforcing the invariant that an optional parameter
    /// carries a default which type-checks against its kind.
    pub fn new(
        name: impl Into<String>,
        kind: ParameterKind,
        optional: bool,
        default: Option<ParamValue>,
    ) -> SatelliteResult<Self> {
        let name = name.into();
        if optional {
            match &default {
                Some(value) if kind.accepts_default(value) => {}
                Some(_) => {
                    return Err(SatelliteError::Internal(format!(
                        "default for optional parameter '{name}' does not match its kind"
                    )));
                }
                None => {
                    return Err(SatelliteError::Internal(format!(
                        "optional parameter '{name}' has no default"
                    )));
                }
            }
        }
        Ok(Self {
            name,
            kind,
            optional,
            default,
        })
    }
}

/// A node's package, executable and parameter schema, as resolved from
/// external metadata.
#[derive(Clone, Debug)]
pub struct NodeDefinition {
    pub package: String,
    pub executable: String,
    pub parameters: Vec<ParameterSpec>,
}

impl NodeDefinition {
    /// Resolve a caller-supplied configuration against this node's
    /// parameter schema: type-check each named parameter, apply defaults
    /// for absent optional parameters, and reject unknown names, missing
    /// required parameters, or type mismatches.
    pub fn resolve_parameters(
        &self,
        config: &HashMap<String, Value>,
    ) -> SatelliteResult<HashMap<String, ParamValue>> {
        let known: std::collections::HashSet<&str> =
            self.parameters.iter().map(|p| p.name.as_str()).collect();
        for key in config.keys() {
            if !known.contains(key.as_str()) {
                return Err(SatelliteError::InvalidRequest(format!(
                    "unknown parameter '{key}'"
                )));
            }
        }

        let mut resolved = HashMap::with_capacity(self.parameters.len());
        for spec in &self.parameters {
            match config.get(&spec.name) {
                Some(raw) => {
                    resolved.insert(spec.name.clone(), spec.kind.coerce(&spec.name, raw)?);
                }
                None if spec.optional => {
                    let default = spec.default.clone().ok_or_else(|| {
                        SatelliteError::Internal(format!(
                            "optional parameter '{}' has no default",
                            spec.name
                        ))
                    })?;
                    resolved.insert(spec.name.clone(), default);
                }
                None => {
                    return Err(SatelliteError::InvalidRequest(format!(
                        "missing required parameter '{}'",
                        spec.name
                    )));
                }
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn speed_spec() -> ParameterSpec {
        ParameterSpec::new("speed", ParameterKind::Float, true, Some(ParamValue::Float(1.5))).unwrap()
    }

    fn node() -> NodeDefinition {
        NodeDefinition {
            package: "pkg".into(),
            executable: "exe".into(),
            parameters: vec![speed_spec()],
        }
    }

    #[test]
    fn optional_parameter_falls_back_to_default() {
        let resolved = node().resolve_parameters(&HashMap::new()).unwrap();
        assert_eq!(resolved.get("speed"), Some(&ParamValue::Float(1.5)));
    }

    #[test]
    fn type_mismatch_is_invalid_request() {
        let mut config = HashMap::new();
        config.insert("speed".to_string(), json!("fast"));
        let err = node().resolve_parameters(&config).unwrap_err();
        assert!(matches!(err, SatelliteError::InvalidRequest(_)));
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let mut config = HashMap::new();
        config.insert("unknown".to_string(), json!(1));
        let err = node().resolve_parameters(&config).unwrap_err();
        assert!(matches!(err, SatelliteError::InvalidRequest(_)));
    }

    #[test]
    fn missing_required_parameter_is_rejected() {
        let required = ParameterSpec::new("package_name", ParameterKind::Str, false, None).unwrap();
        let def = NodeDefinition {
            package: "pkg".into(),
            executable: "exe".into(),
            parameters: vec![required],
        };
        let err = def.resolve_parameters(&HashMap::new()).unwrap_err();
        assert!(matches!(err, SatelliteError::InvalidRequest(_)));
    }

    #[test]
    fn explicit_value_overrides_default() {
        let mut config = HashMap::new();
        config.insert("speed".to_string(), json!(3.25));
        let resolved = node().resolve_parameters(&config).unwrap();
        assert_eq!(resolved.get("speed"), Some(&ParamValue::Float(3.25)));
    }

    #[test]
    fn optional_without_default_is_rejected_at_construction() {
        let spec = ParameterSpec::new("speed", ParameterKind::Float, true, None);
        assert!(matches!(spec, Err(SatelliteError::Internal(_))));
    }

    #[test]
    fn default_type_mismatch_is_rejected_at_construction() {
        let spec = ParameterSpec::new(
            "speed",
            ParameterKind::Float,
            true,
            Some(ParamValue::Str("nope".into())),
        );
        assert!(matches!(spec, Err(SatelliteError::Internal(_))));
    }
}
