//! Swagger 2.0 document model.
//!
//! These types serialize directly to the Swagger 2.0 wire format with serde.
//! Maps are ordered so that two scans over the same input serialize
//! byte-for-byte identically.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Response description used when an operation declares nothing better
pub const SUCCESSFUL_OPERATION: &str = "successful operation";

/// Key of the catch-all response slot
pub const DEFAULT_RESPONSE: &str = "default";

/// A security requirement: scheme name to required scopes
pub type SecurityRequirement = BTreeMap<String, Vec<String>>;

/// Complete Swagger 2.0 document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swagger {
    /// Swagger version, always `2.0`
    pub swagger: String,
    /// API info
    pub info: Info,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(rename = "basePath", skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemes: Vec<Scheme>,
    /// Tags, unique by name in registration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    /// Path template to path item
    pub paths: BTreeMap<String, PathItem>,
    /// Model definitions referenced from `#/definitions/...`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<String, Schema>,
}

/// Swagger Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: "Generated API".to_string(),
            version: "1.0.0".to_string(),
            description: None,
        }
    }
}

/// Transfer protocol of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
    Ws,
    Wss,
}

impl Scheme {
    /// Parse a single scheme name, ignoring case and surrounding whitespace
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "http" => Some(Scheme::Http),
            "https" => Some(Scheme::Https),
            "ws" => Some(Scheme::Ws),
            "wss" => Some(Scheme::Wss),
            _ => None,
        }
    }

    /// Parse a comma-separated protocol list, dropping unknown entries
    pub fn parse_list(protocols: &str) -> Vec<Self> {
        let mut schemes: Vec<Self> = protocols.split(',').filter_map(Self::from_name).collect();
        schemes.sort();
        schemes.dedup();
        schemes
    }
}

/// Swagger Tag object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// All operations of a single path template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
}

/// A single documented endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemes: Option<Vec<Scheme>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub produces: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Status code (or `default`) to response
    pub responses: BTreeMap<String, Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    /// `x-` vendor extensions
    #[serde(flatten)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl Operation {
    /// Append a tag unless already present
    pub fn add_tag(&mut self, tag: &str) {
        let tags = self.tags.get_or_insert_with(Vec::new);
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }

    pub fn add_consumes(&mut self, media_type: &str) {
        push_unique(self.consumes.get_or_insert_with(Vec::new), media_type);
    }

    pub fn add_produces(&mut self, media_type: &str) {
        push_unique(self.produces.get_or_insert_with(Vec::new), media_type);
    }

    pub fn add_scheme(&mut self, scheme: Scheme) {
        let schemes = self.schemes.get_or_insert_with(Vec::new);
        if !schemes.contains(&scheme) {
            schemes.push(scheme);
        }
    }

    pub fn add_security(&mut self, requirement: SecurityRequirement) {
        self.security.get_or_insert_with(Vec::new).push(requirement);
    }

    /// Add a parameter, replacing any earlier parameter with the same name
    pub fn add_parameter(&mut self, parameter: Parameter) {
        match self.parameters.iter_mut().find(|p| p.name == parameter.name) {
            Some(existing) => *existing = parameter,
            None => self.parameters.push(parameter),
        }
    }

    /// Set the response for a status code; `0` selects the default slot
    pub fn set_response(&mut self, code: u16, response: Response) {
        let key = if code == 0 {
            DEFAULT_RESPONSE.to_string()
        } else {
            code.to_string()
        };
        self.responses.insert(key, response);
    }

    pub fn set_default_response(&mut self, response: Response) {
        self.responses.insert(DEFAULT_RESPONSE.to_string(), response);
    }
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

/// Parameter location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterLocation {
    #[serde(rename = "path")]
    Path,
    #[serde(rename = "query")]
    Query,
    #[serde(rename = "header")]
    Header,
    #[serde(rename = "formData")]
    Form,
    #[serde(rename = "body")]
    Body,
}

/// Swagger Parameter object.
///
/// Body parameters carry `schema`; all other locations describe their value
/// inline through `type`, `format`, `items` and the validation keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(rename = "collectionFormat", skip_serializing_if = "Option::is_none")]
    pub collection_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl Parameter {
    /// A non-body parameter whose value is described by `property`
    pub fn simple(name: impl Into<String>, location: ParameterLocation, property: Schema) -> Self {
        Self {
            name: name.into(),
            location,
            description: property.description,
            required: location == ParameterLocation::Path,
            schema: None,
            param_type: property.schema_type,
            format: property.format,
            items: property.items,
            collection_format: None,
            default: None,
            enum_values: property.enum_values,
            minimum: None,
            maximum: None,
            pattern: property.pattern,
        }
    }

    /// A body parameter carrying `schema`
    pub fn body(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            location: ParameterLocation::Body,
            description: None,
            required: false,
            schema: Some(schema),
            param_type: None,
            format: None,
            items: None,
            collection_format: None,
            default: None,
            enum_values: None,
            minimum: None,
            maximum: None,
            pattern: None,
        }
    }
}

/// Swagger Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, Schema>>,
}

impl Response {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            schema: None,
            headers: None,
        }
    }

    pub fn successful() -> Self {
        Self::new(SUCCESSFUL_OPERATION)
    }
}

/// Swagger Schema object, used for models, properties and response schemas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(rename = "uniqueItems", skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
    #[serde(rename = "additionalProperties", skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl Schema {
    /// A schema with only `type` (and optionally `format`) set
    pub fn typed(schema_type: &str, format: Option<&str>) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            format: format.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn string() -> Self {
        Self::typed("string", None)
    }

    pub fn object() -> Self {
        Self::typed("object", None)
    }

    /// A `$ref` to a model definition; bare names are expanded to `#/definitions/<name>`
    pub fn reference(target: &str) -> Self {
        let reference = if target.starts_with('#') || target.contains("://") {
            target.to_string()
        } else {
            format!("#/definitions/{}", target)
        };
        Self {
            reference: Some(reference),
            ..Self::default()
        }
    }

    pub fn array(items: Schema) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    pub fn set(items: Schema) -> Self {
        Self {
            unique_items: Some(true),
            ..Self::array(items)
        }
    }

    pub fn map(values: Schema) -> Self {
        Self {
            schema_type: Some("object".to_string()),
            additional_properties: Some(Box::new(values)),
            ..Self::default()
        }
    }

    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }

    pub fn is_array(&self) -> bool {
        self.schema_type.as_deref() == Some("array")
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

impl Swagger {
    pub fn new(info: Info) -> Self {
        Self {
            swagger: "2.0".to_string(),
            info,
            host: None,
            base_path: None,
            schemes: Vec::new(),
            tags: Vec::new(),
            paths: BTreeMap::new(),
            definitions: BTreeMap::new(),
        }
    }

    /// Register a tag; the first registration of a name is kept
    pub fn add_tag(&mut self, tag: Tag) {
        if !self.tags.iter().any(|t| t.name == tag.name) {
            self.tags.push(tag);
        }
    }

    /// Register a model definition; a later definition of the same name wins
    pub fn add_model(&mut self, name: impl Into<String>, model: Schema) {
        self.definitions.insert(name.into(), model);
    }

    pub fn path_mut(&mut self, path: &str) -> &mut PathItem {
        self.paths.entry(path.to_string()).or_default()
    }

    pub fn operation(&self, path: &str, verb: crate::routes::HttpVerb) -> Option<&Operation> {
        self.paths.get(path).and_then(|item| item.get(verb))
    }
}

impl PathItem {
    pub fn get(&self, verb: crate::routes::HttpVerb) -> Option<&Operation> {
        use crate::routes::HttpVerb;
        match verb {
            HttpVerb::Get => self.get.as_ref(),
            HttpVerb::Put => self.put.as_ref(),
            HttpVerb::Post => self.post.as_ref(),
            HttpVerb::Delete => self.delete.as_ref(),
            HttpVerb::Options => self.options.as_ref(),
            HttpVerb::Head => self.head.as_ref(),
            HttpVerb::Patch => self.patch.as_ref(),
        }
    }

    /// Put `operation` in the slot for `verb`, replacing any previous one
    pub fn set(&mut self, verb: crate::routes::HttpVerb, operation: Operation) -> Option<Operation> {
        use crate::routes::HttpVerb;
        let slot = match verb {
            HttpVerb::Get => &mut self.get,
            HttpVerb::Put => &mut self.put,
            HttpVerb::Post => &mut self.post,
            HttpVerb::Delete => &mut self.delete,
            HttpVerb::Options => &mut self.options,
            HttpVerb::Head => &mut self.head,
            HttpVerb::Patch => &mut self.patch,
        };
        slot.replace(operation)
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        [
            &self.get,
            &self.put,
            &self.post,
            &self.delete,
            &self.options,
            &self.head,
            &self.patch,
        ]
        .into_iter()
        .filter_map(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::HttpVerb;

    #[test]
    fn test_zero_code_goes_to_default_slot() {
        let mut operation = Operation::default();
        operation.set_response(0, Response::new("unexpected error"));
        operation.set_response(404, Response::new("not found"));

        assert!(operation.responses.contains_key(DEFAULT_RESPONSE));
        assert!(operation.responses.contains_key("404"));
        assert!(!operation.responses.contains_key("0"));
    }

    #[test]
    fn test_add_parameter_replaces_same_name() {
        let mut operation = Operation::default();
        operation.add_parameter(Parameter::simple("id", ParameterLocation::Query, Schema::string()));
        operation.add_parameter(Parameter::simple("limit", ParameterLocation::Query, Schema::string()));
        operation.add_parameter(Parameter::simple(
            "id",
            ParameterLocation::Path,
            Schema::typed("integer", Some("int64")),
        ));

        assert_eq!(operation.parameters.len(), 2);
        assert_eq!(operation.parameters[0].name, "id");
        assert_eq!(operation.parameters[0].location, ParameterLocation::Path);
        assert!(operation.parameters[0].required);
    }

    #[test]
    fn test_tags_are_unique_by_name() {
        let mut swagger = Swagger::new(Info::default());
        swagger.add_tag(Tag {
            name: "pets".to_string(),
            description: Some("first".to_string()),
        });
        swagger.add_tag(Tag::new("pets"));

        assert_eq!(swagger.tags.len(), 1);
        assert_eq!(swagger.tags[0].description.as_deref(), Some("first"));
    }

    #[test]
    fn test_path_item_set_overwrites() {
        let mut item = PathItem::default();
        let first = Operation {
            operation_id: Some("first".to_string()),
            ..Operation::default()
        };
        let second = Operation {
            operation_id: Some("second".to_string()),
            ..Operation::default()
        };

        assert!(item.set(HttpVerb::Get, first).is_none());
        let replaced = item.set(HttpVerb::Get, second).unwrap();
        assert_eq!(replaced.operation_id.as_deref(), Some("first"));
        assert_eq!(item.get(HttpVerb::Get).unwrap().operation_id.as_deref(), Some("second"));
    }

    #[test]
    fn test_reference_expansion() {
        assert_eq!(Schema::reference("Pet").reference.as_deref(), Some("#/definitions/Pet"));
        assert_eq!(
            Schema::reference("#/definitions/Error").reference.as_deref(),
            Some("#/definitions/Error")
        );
    }

    #[test]
    fn test_scheme_list_parsing() {
        assert_eq!(Scheme::parse_list("https, http,bogus"), vec![Scheme::Http, Scheme::Https]);
        assert!(Scheme::parse_list("").is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let mut operation = Operation::default();
        operation.set_default_response(Response::successful());
        operation
            .extensions
            .insert("x-rate-limit".to_string(), serde_json::json!("10"));
        let value = serde_json::to_value(&operation).unwrap();

        assert_eq!(value["responses"]["default"]["description"], "successful operation");
        assert_eq!(value["x-rate-limit"], "10");
        assert!(value.get("parameters").is_none());
    }
}
