//! Controller manifest.
//!
//! The manifest is the static description of a web application that the
//! reader consumes: the compiled route table, and for every controller the
//! documentation metadata attached to the class and its methods. It is
//! produced at build time and loaded from YAML or JSON.
//!
//! ```yaml
//! config:
//!   basePath: /api
//! routes:
//!   "controllers.PetController$.getPet":
//!     verb: GET
//!     path:
//!       - static: "api/pets/"
//!       - dynamic: { name: id }
//!     parameters:
//!       - { name: id, type: Long }
//! controllers:
//!   - name: controllers.PetController
//!     api: { value: pets }
//!     methods:
//!       - name: getPet
//!         returns: Result
//!         operation: { value: "Find pet by ID", response: Pet }
//!         params:
//!           - { type: Long }
//! ```

use crate::config::ReaderConfig;
use crate::error::Result;
use crate::routes::{HttpVerb, RouteEntry, RouteTable};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Top-level manifest document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub config: ReaderConfig,
    /// Fully-qualified method name to compiled route
    #[serde(default)]
    pub routes: HashMap<String, RouteEntry>,
    #[serde(default)]
    pub controllers: Vec<ControllerDescriptor>,
}

/// Class-level `@Api` metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiDescriptor {
    /// Used as the tag when `tags` is empty
    pub value: String,
    pub tags: Vec<String>,
    /// Comma-separated media types
    pub produces: String,
    pub consumes: String,
    /// Comma-separated schemes
    pub protocols: String,
    pub hidden: bool,
    pub authorizations: Vec<Authorization>,
}

/// A required security scheme with its scopes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Authorization {
    pub value: String,
    pub scopes: Vec<String>,
}

/// A controller class and its documented methods
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerDescriptor {
    /// Canonical class name (`controllers.PetController`)
    pub name: String,
    #[serde(default)]
    pub api: Option<ApiDescriptor>,
    /// Class-level path declaration, used when a route has no pattern
    #[serde(default)]
    pub path: Option<String>,
    /// Class-level media type declarations
    #[serde(default)]
    pub produces: Vec<String>,
    #[serde(default)]
    pub consumes: Vec<String>,
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
}

/// A controller method with its annotations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    pub name: String,
    /// Declared return type
    #[serde(default = "default_return_type")]
    pub returns: String,
    #[serde(default)]
    pub operation: Option<OperationDescriptor>,
    #[serde(default)]
    pub responses: Vec<ResponseDescriptor>,
    #[serde(default)]
    pub implicit_params: Vec<ImplicitParamDescriptor>,
    /// Declared parameters, in signature order
    #[serde(default)]
    pub params: Vec<MethodParam>,
    /// Method-level path declaration
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub produces: Vec<String>,
    #[serde(default)]
    pub consumes: Vec<String>,
    #[serde(default)]
    pub deprecated: bool,
}

fn default_return_type() -> String {
    "void".to_string()
}

/// Method-level `@ApiOperation` metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperationDescriptor {
    /// Summary
    pub value: String,
    /// Description
    pub notes: String,
    pub nickname: String,
    pub tags: Vec<String>,
    /// Response type override
    pub response: String,
    /// `list`, `array`, `set` or `map`
    pub response_container: String,
    /// `$ref` target for the success response
    pub response_reference: String,
    pub code: u16,
    pub http_method: String,
    pub produces: String,
    pub consumes: String,
    pub protocols: String,
    pub hidden: bool,
    pub authorizations: Vec<Authorization>,
    pub response_headers: Vec<ResponseHeaderDescriptor>,
    /// Vendor extensions; keys are prefixed with `x-` when missing
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl Default for OperationDescriptor {
    fn default() -> Self {
        Self {
            value: String::new(),
            notes: String::new(),
            nickname: String::new(),
            tags: Vec::new(),
            response: default_return_type(),
            response_container: String::new(),
            response_reference: String::new(),
            code: 200,
            http_method: String::new(),
            produces: String::new(),
            consumes: String::new(),
            protocols: String::new(),
            hidden: false,
            authorizations: Vec::new(),
            response_headers: Vec::new(),
            extensions: BTreeMap::new(),
        }
    }
}

impl OperationDescriptor {
    /// Explicit verb override, if one is declared
    pub fn http_method(&self) -> Option<HttpVerb> {
        HttpVerb::from_name(&self.http_method)
    }
}

/// One `@ApiResponse` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseDescriptor {
    /// Status code; `0` is the default response
    pub code: u16,
    pub message: String,
    pub response: String,
    pub response_container: String,
    pub reference: String,
    pub response_headers: Vec<ResponseHeaderDescriptor>,
}

impl Default for ResponseDescriptor {
    fn default() -> Self {
        Self {
            code: 0,
            message: String::new(),
            response: default_return_type(),
            response_container: String::new(),
            reference: String::new(),
            response_headers: Vec::new(),
        }
    }
}

/// One `@ResponseHeader` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseHeaderDescriptor {
    pub name: String,
    pub description: String,
    pub response: String,
    pub response_container: String,
}

impl Default for ResponseHeaderDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            response: default_return_type(),
            response_container: String::new(),
        }
    }
}

/// One `@ApiImplicitParam` entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImplicitParamDescriptor {
    pub name: String,
    /// Description
    pub value: String,
    pub data_type: String,
    /// `path`, `query`, `header`, `form`/`formData` or `body`
    pub param_type: String,
    pub required: bool,
    pub default_value: String,
    /// `a,b,c` or `range[min,max]`
    pub allowable_values: String,
    pub allow_multiple: bool,
}

/// How a method parameter is bound, as declared by its annotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamBinding {
    /// No binding annotation
    #[default]
    None,
    Path,
    Query,
    Header,
    Form,
    Body,
    /// Framework-injected value, never documented
    Context,
}

/// A declared method parameter with its `@ApiParam`-style metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodParam {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub binding: ParamBinding,
    /// Name given by the binding annotation
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub allowable_values: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

impl MethodParam {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }
}

impl Manifest {
    /// Load a manifest, choosing JSON for `.json` files and YAML otherwise
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading manifest from {}", path.display());
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Build the route table declared by this manifest
    pub fn route_table(&self) -> RouteTable {
        RouteTable::new(self.routes.clone())
    }

    /// Find a controller by canonical or simple class name
    pub fn controller(&self, name: &str) -> Option<&ControllerDescriptor> {
        let simple = crate::types::simple_name(name);
        self.controllers
            .iter()
            .find(|c| c.name == name)
            .or_else(|| {
                self.controllers
                    .iter()
                    .find(|c| crate::types::simple_name(&c.name) == simple)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
config:
  basePath: /api
routes:
  "controllers.PetController$.getPet":
    verb: GET
    path:
      - static: "api/pets/"
      - dynamic: { name: id }
    parameters:
      - { name: id, type: Long }
controllers:
  - name: controllers.PetController
    api:
      value: pets
      produces: "application/json, application/xml"
    methods:
      - name: getPet
        returns: Result
        operation:
          value: Find pet by ID
          response: Pet
        responses:
          - { code: 404, message: Pet not found }
        params:
          - { type: Long }
"#;

    #[test]
    fn test_parse_yaml_manifest() {
        let manifest = Manifest::from_yaml_str(MANIFEST).unwrap();
        assert_eq!(manifest.config.base_path, "/api");
        assert_eq!(manifest.routes.len(), 1);

        let controller = &manifest.controllers[0];
        let api = controller.api.as_ref().unwrap();
        assert_eq!(api.value, "pets");
        assert!(!api.hidden);

        let method = &controller.methods[0];
        let operation = method.operation.as_ref().unwrap();
        assert_eq!(operation.code, 200);
        assert_eq!(operation.response, "Pet");
        assert_eq!(method.responses[0].code, 404);
        assert_eq!(method.responses[0].response, "void");
        assert_eq!(method.params[0].binding, ParamBinding::None);
    }

    #[test]
    fn test_method_defaults() {
        let method: MethodDescriptor = serde_yaml::from_str("name: ping").unwrap();
        assert_eq!(method.returns, "void");
        assert!(method.operation.is_none());
        assert!(!method.deprecated);
    }

    #[test]
    fn test_controller_lookup_by_simple_name() {
        let manifest = Manifest::from_yaml_str(MANIFEST).unwrap();
        assert!(manifest.controller("controllers.PetController").is_some());
        assert!(manifest.controller("PetController").is_some());
        assert!(manifest.controller("StoreController").is_none());
    }

    #[test]
    fn test_parse_json_manifest() {
        let json = r#"{
            "routes": {
                "controllers.Ping$.ping": { "verb": "get", "path": [ { "static": "ping" } ] }
            },
            "controllers": [ { "name": "controllers.Ping", "methods": [ { "name": "ping" } ] } ]
        }"#;
        let manifest = Manifest::from_json_str(json).unwrap();
        let table = manifest.route_table();
        assert!(table.exists("controllers.Ping$.ping"));
        assert_eq!(manifest.config.base_path, "/");
    }
}
