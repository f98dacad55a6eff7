// File: src/problem.rs
// Purpose: Problem payloads, model state and client error mapping

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};

/// Structured error description returned for client and server errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, JsonValue>,
}

impl ProblemDetails {
    pub fn new(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn extension(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }
}

/// Problem payload carrying per-field validation errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationProblemDetails {
    #[serde(flatten)]
    pub problem: ProblemDetails,
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationProblemDetails {
    pub fn new(model_state: &ModelStateDictionary) -> Self {
        Self {
            problem: ProblemDetails {
                title: Some(VALIDATION_TITLE.to_string()),
                ..ProblemDetails::default()
            },
            errors: model_state.errors.clone(),
        }
    }
}

const VALIDATION_TITLE: &str = "One or more validation errors occurred.";

/// Field-keyed validation errors. Carried as data, never raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelStateDictionary {
    errors: BTreeMap<String, Vec<String>>,
}

impl ModelStateDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_model_error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(key.into()).or_default().push(message.into());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.errors.get(key).map(Vec::as_slice)
    }
}

// Form validation hands back one message per field
impl From<HashMap<String, String>> for ModelStateDictionary {
    fn from(errors: HashMap<String, String>) -> Self {
        let mut state = Self::new();
        for (key, message) in errors {
            state.add_model_error(key, message);
        }
        state
    }
}

impl From<HashMap<String, Vec<String>>> for ModelStateDictionary {
    fn from(errors: HashMap<String, Vec<String>>) -> Self {
        Self {
            errors: errors.into_iter().collect(),
        }
    }
}

/// Link and title used to enrich a client error for one status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientErrorData {
    pub link: Option<String>,
    pub title: Option<String>,
}

/// Status code → problem link/title. Later registrations overwrite earlier ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientErrorMapping(BTreeMap<u16, ClientErrorData>);

impl ClientErrorMapping {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, status: u16, data: ClientErrorData) {
        self.0.insert(status, data);
    }

    pub fn get(&self, status: u16) -> Option<&ClientErrorData> {
        self.0.get(&status)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ClientErrorMapping {
    fn default() -> Self {
        const RFC: &str = "https://tools.ietf.org/html/rfc9110";
        let defaults = [
            (400, "15.5.1", "Bad Request"),
            (401, "15.5.2", "Unauthorized"),
            (403, "15.5.4", "Forbidden"),
            (404, "15.5.5", "Not Found"),
            (405, "15.5.6", "Method Not Allowed"),
            (406, "15.5.7", "Not Acceptable"),
            (409, "15.5.10", "Conflict"),
            (415, "15.5.16", "Unsupported Media Type"),
            (422, "15.5.21", "Unprocessable Entity"),
            (500, "15.6.1", "An error occurred while processing your request."),
        ];

        let mut mapping = Self::empty();
        for (status, section, title) in defaults {
            mapping.insert(
                status,
                ClientErrorData {
                    link: Some(format!("{}#section-{}", RFC, section)),
                    title: Some(title.to_string()),
                },
            );
        }
        mapping
    }
}

/// Builds problem payloads with mapping defaults and the request trace id.
#[derive(Debug, Clone, Default)]
pub struct ProblemDetailsFactory {
    mapping: ClientErrorMapping,
}

/// Optional fields for [`ProblemDetailsFactory::create_problem_details`].
#[derive(Debug, Clone, Default)]
pub struct ProblemOptions {
    pub status: Option<u16>,
    pub title: Option<String>,
    pub type_uri: Option<String>,
    pub detail: Option<String>,
    pub instance: Option<String>,
}

impl ProblemDetailsFactory {
    pub fn new(mapping: ClientErrorMapping) -> Self {
        Self { mapping }
    }

    /// Status defaults to 500.
    pub fn create_problem_details(
        &self,
        trace_id: Option<&str>,
        options: ProblemOptions,
    ) -> ProblemDetails {
        let mut problem = ProblemDetails {
            type_uri: options.type_uri,
            title: options.title,
            status: Some(options.status.unwrap_or(500)),
            detail: options.detail,
            instance: options.instance,
            extensions: BTreeMap::new(),
        };
        self.apply_defaults(&mut problem, trace_id);
        problem
    }

    /// Status defaults to 400.
    pub fn create_validation_problem_details(
        &self,
        trace_id: Option<&str>,
        model_state: &ModelStateDictionary,
        options: ProblemOptions,
    ) -> ValidationProblemDetails {
        let mut validation = ValidationProblemDetails::new(model_state);
        validation.problem.status = Some(options.status.unwrap_or(400));
        if options.title.is_some() {
            validation.problem.title = options.title;
        }
        validation.problem.type_uri = options.type_uri;
        validation.problem.detail = options.detail;
        validation.problem.instance = options.instance;
        self.apply_defaults(&mut validation.problem, trace_id);
        validation
    }

    fn apply_defaults(&self, problem: &mut ProblemDetails, trace_id: Option<&str>) {
        if let Some(data) = problem.status.and_then(|status| self.mapping.get(status)) {
            if problem.title.is_none() {
                problem.title = data.title.clone();
            }
            if problem.type_uri.is_none() {
                problem.type_uri = data.link.clone();
            }
        }
        if let Some(trace_id) = trace_id {
            problem
                .extensions
                .entry("traceId".to_string())
                .or_insert_with(|| JsonValue::String(trace_id.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_problem_serializes_type_and_extensions() {
        let problem = ProblemDetails::new(404)
            .title("Not Found")
            .extension("traceId", JsonValue::String("abc".into()));
        let json = serde_json::to_value(&problem).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "title": "Not Found", "status": 404, "traceId": "abc" })
        );
    }

    #[test]
    fn test_factory_fills_mapping_defaults() {
        let factory = ProblemDetailsFactory::default();
        let problem = factory.create_problem_details(
            Some("trace-1"),
            ProblemOptions {
                status: Some(404),
                ..ProblemOptions::default()
            },
        );
        assert_eq!(problem.title.as_deref(), Some("Not Found"));
        assert_eq!(
            problem.type_uri.as_deref(),
            Some("https://tools.ietf.org/html/rfc9110#section-15.5.5")
        );
        assert_eq!(problem.extensions["traceId"], "trace-1");
    }

    #[test]
    fn test_factory_keeps_explicit_title() {
        let factory = ProblemDetailsFactory::default();
        let problem = factory.create_problem_details(
            None,
            ProblemOptions {
                title: Some("Boom".into()),
                ..ProblemOptions::default()
            },
        );
        assert_eq!(problem.status, Some(500));
        assert_eq!(problem.title.as_deref(), Some("Boom"));
        assert!(problem.extensions.is_empty());
    }

    #[test]
    fn test_validation_problem_defaults() {
        let mut state = ModelStateDictionary::new();
        state.add_model_error("email", "Email is required");
        state.add_model_error("email", "Email is invalid");

        let factory = ProblemDetailsFactory::default();
        let validation =
            factory.create_validation_problem_details(None, &state, ProblemOptions::default());

        assert_eq!(validation.problem.status, Some(400));
        assert_eq!(validation.problem.title.as_deref(), Some(VALIDATION_TITLE));
        assert_eq!(validation.errors["email"].len(), 2);

        let json = serde_json::to_value(&validation).unwrap();
        assert_eq!(json["errors"]["email"][1], "Email is invalid");
        assert_eq!(json["status"], 400);
    }

    #[test]
    fn test_mapping_later_registration_wins() {
        let mut mapping = ClientErrorMapping::default();
        mapping.insert(
            404,
            ClientErrorData {
                link: Some("https://example.com/missing".into()),
                title: Some("Missing".into()),
            },
        );
        assert_eq!(mapping.get(404).unwrap().title.as_deref(), Some("Missing"));
        assert_eq!(mapping.len(), 10);
    }

    #[test]
    fn test_model_state_from_form_errors() {
        let mut errors = HashMap::new();
        errors.insert("name".to_string(), "Name is required".to_string());
        let state = ModelStateDictionary::from(errors);
        assert!(!state.is_valid());
        assert_eq!(state.error_count(), 1);
        assert_eq!(state.get("name"), Some(&["Name is required".to_string()][..]));
    }
}
