//! Declarative schema for structured extraction and validation of service responses.

use crate::types::StageError;
use serde_json::{Map, Value};

/// Type of a schema field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// JSON string.
    String,
    /// JSON number.
    Number,
    /// Percentage, sent as a JSON number or as a string such as `"12.5%"`.
    Percentage,
    /// Homogeneous list of the inner kind.
    Array(Box<FieldKind>),
    /// Nested object with the given members.
    Object(Vec<FieldSpec>),
}

/// Named member of an object schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Key in the JSON object.
    pub name: &'static str,
    /// Expected value type.
    pub kind: FieldKind,
    /// Whether the key must be present and non-null.
    pub required: bool,
}

impl FieldSpec {
    /// Required member.
    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    /// Member that may be absent or null.
    pub fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// Top-level object schema sent with every extraction request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionSchema {
    fields: Vec<FieldSpec>,
}

impl ExtractionSchema {
    /// Schema made of the given top-level members.
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Annual report schema: headline financials, risk factors, and key capital projects.
    pub fn annual_report() -> Self {
        use FieldKind::{Array, Number, Object, Percentage, String};

        Self::new(vec![
            FieldSpec::required(
                "financial_performance",
                Object(vec![
                    FieldSpec::required("total_revenue", Number),
                    FieldSpec::required("revenue_growth", Percentage),
                    FieldSpec::required("net_income", Number),
                ]),
            ),
            FieldSpec::optional("risk_factors", Array(Box::new(String))),
            FieldSpec::required(
                "key_projects",
                Array(Box::new(Object(vec![
                    FieldSpec::required("name", String),
                    FieldSpec::required("capex", Number),
                    FieldSpec::required("description", String),
                ]))),
            ),
        ])
    }

    /// Declarative form sent to the service, e.g. `{"risk_factors": ["string"]}`.
    pub fn to_wire(&self) -> Value {
        object_wire(&self.fields)
    }

    /// Check `value` against the schema.
    ///
    /// On success returns a normalized copy: percentages become JSON numbers and absent or null
    /// optional arrays become empty arrays. Unknown keys are dropped.
    pub fn conform(&self, value: &Value) -> Result<Value, StageError> {
        conform_object(&self.fields, value, "$")
    }
}

fn kind_wire(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::String => Value::from("string"),
        FieldKind::Number => Value::from("number"),
        FieldKind::Percentage => Value::from("percentage"),
        FieldKind::Array(item) => Value::Array(vec![kind_wire(item)]),
        FieldKind::Object(fields) => object_wire(fields),
    }
}

fn object_wire(fields: &[FieldSpec]) -> Value {
    let map: Map<String, Value> = fields
        .iter()
        .map(|field| (field.name.to_string(), kind_wire(&field.kind)))
        .collect();
    Value::Object(map)
}

fn conform_object(
    fields: &[FieldSpec],
    value: &Value,
    path: &str,
) -> Result<Value, StageError> {
    let object = value
        .as_object()
        .ok_or_else(|| mismatch(path, "object", value))?;

    let mut normalized = Map::with_capacity(fields.len());
    for field in fields {
        let field_path = format!("{path}.{}", field.name);
        match object.get(field.name) {
            None | Some(Value::Null) if field.required => {
                return Err(StageError::schema_mismatch(
                    field_path,
                    "missing required field",
                ));
            }
            None | Some(Value::Null) => {
                if matches!(field.kind, FieldKind::Array(_)) {
                    normalized.insert(field.name.to_string(), Value::Array(Vec::new()));
                }
            }
            Some(member) => {
                let conformed = conform_value(&field.kind, member, &field_path)?;
                normalized.insert(field.name.to_string(), conformed);
            }
        }
    }
    Ok(Value::Object(normalized))
}

fn conform_value(kind: &FieldKind, value: &Value, path: &str) -> Result<Value, StageError> {
    match kind {
        FieldKind::String => match value {
            Value::String(_) => Ok(value.clone()),
            other => Err(mismatch(path, "string", other)),
        },
        FieldKind::Number => match value {
            Value::Number(_) => Ok(value.clone()),
            other => Err(mismatch(path, "number", other)),
        },
        FieldKind::Percentage => parse_percentage(value)
            .and_then(|number| serde_json::Number::from_f64(number).map(Value::Number))
            .ok_or_else(|| mismatch(path, "percentage", value)),
        FieldKind::Array(item) => {
            let items = value
                .as_array()
                .ok_or_else(|| mismatch(path, "array", value))?;
            items
                .iter()
                .enumerate()
                .map(|(index, member)| conform_value(item, member, &format!("{path}[{index}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        FieldKind::Object(fields) => conform_object(fields, value, path),
    }
}

/// Percentage as a plain number: `12.5`, `"12.5"`, and `"12.5%"` all yield `12.5`.
pub fn parse_percentage(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let trimmed = text.trim();
            let digits = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
            digits.parse::<f64>().ok().filter(|number| number.is_finite())
        }
        _ => None,
    }
}

fn mismatch(path: &str, expected: &str, actual: &Value) -> StageError {
    StageError::schema_mismatch(path, format!("expected {expected}, got {}", type_name(actual)))
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
    use serde_json::json;

    fn valid_response() -> Value {
        json!({
            "financial_performance": {
                "total_revenue": 350018.0,
                "revenue_growth": "13.9%",
                "net_income": 100118.0
            },
            "risk_factors": ["Regulatory scrutiny"],
            "key_projects": [
                { "name": "Data centers", "capex": 52535.0, "description": "Compute capacity" }
            ],
            "notes": "ignored"
        })
    }

    #[test]
    fn wire_form_matches_declarative_shape() {
        assert_eq!(
            ExtractionSchema::annual_report().to_wire(),
            json!({
                "financial_performance": {
                    "total_revenue": "number",
                    "revenue_growth": "percentage",
                    "net_income": "number"
                },
                "risk_factors": ["string"],
                "key_projects": [
                    { "name": "string", "capex": "number", "description": "string" }
                ]
            })
        );
    }

    #[test]
    fn conform_normalizes_percentages_and_drops_unknown_keys() {
        let normalized = ExtractionSchema::annual_report()
            .conform(&valid_response())
            .expect("valid");

        assert_eq!(normalized["financial_performance"]["revenue_growth"], json!(13.9));
        assert!(normalized.get("notes").is_none());
    }

    #[test]
    fn absent_risk_factors_become_empty() {
        let mut response = valid_response();
        response
            .as_object_mut()
            .expect("object")
            .remove("risk_factors");

        let normalized = ExtractionSchema::annual_report()
            .conform(&response)
            .expect("valid");
        assert_eq!(normalized["risk_factors"], json!([]));
    }

    #[test]
    fn missing_required_member_reports_its_path() {
        let mut response = valid_response();
        response["financial_performance"]
            .as_object_mut()
            .expect("object")
            .remove("net_income");

        let error = ExtractionSchema::annual_report()
            .conform(&response)
            .expect_err("missing member");
        assert_eq!(
            error,
            StageError::schema_mismatch(
                "$.financial_performance.net_income",
                "missing required field"
            )
        );
    }

    #[test]
    fn wrong_type_inside_array_reports_indexed_path() {
        let mut response = valid_response();
        response["key_projects"][0]["capex"] = json!("a lot");

        let error = ExtractionSchema::annual_report()
            .conform(&response)
            .expect_err("wrong type");
        assert!(matches!(
            error,
            StageError::SchemaMismatch { ref path, .. } if path == "$.key_projects[0].capex"
        ));
    }

    #[test]
    fn non_object_top_level_is_rejected() {
        let error = ExtractionSchema::annual_report()
            .conform(&json!(["not", "an", "object"]))
            .expect_err("array");
        assert_eq!(
            error,
            StageError::schema_mismatch("$", "expected object, got array")
        );
    }

    #[test]
    fn percentage_accepts_numbers_and_suffixed_strings() {
        assert_eq!(parse_percentage(&json!(12.5)), Some(12.5));
        assert_eq!(parse_percentage(&json!("12.5")), Some(12.5));
        assert_eq!(parse_percentage(&json!(" -3 % ")), Some(-3.0));
        assert_eq!(parse_percentage(&json!("twelve")), None);
        assert_eq!(parse_percentage(&json!(true)), None);
    }
}
