//! Parameter binding.
//!
//! Decides where each request parameter of an operation comes from and what
//! schema describes it. Two strategies exist:
//!
//! - **route-first** walks the parameters declared by the compiled route; a
//!   parameter is a path parameter when the path template has a matching
//!   `{name}` placeholder and a query parameter otherwise. Method parameters
//!   only contribute metadata.
//! - **annotation-first** walks the method's declared parameters through a
//!   chain of [`ParameterExtension`]s and falls back to a body parameter.
//!
//! Implicit parameters declared on the method are read the same way for both.

use crate::config::{ParameterStrategy, ReaderConfig};
use crate::converter::ModelConverter;
use crate::error::Result;
use crate::manifest::{ImplicitParamDescriptor, MethodDescriptor, MethodParam, ParamBinding};
use crate::routes::{RouteEntry, RouteParameter};
use crate::swagger::{Parameter, ParameterLocation, Schema};
use crate::types::TypeRef;
use log::debug;
use std::collections::{BTreeMap, HashSet};

/// One link of the annotation-first extraction chain
pub trait ParameterExtension {
    /// Parameters derived from `param`.
    ///
    /// Returning an empty list passes the parameter to the next extension.
    /// Inserting the type's simple name into `skip` keeps it from becoming a
    /// body parameter.
    fn extract_parameters(
        &self,
        param: &MethodParam,
        ty: &TypeRef,
        converter: &ModelConverter,
        skip: &mut HashSet<String>,
    ) -> Vec<Parameter>;
}

/// Binds parameters annotated with an explicit location
#[derive(Debug, Default)]
pub struct AnnotatedParameters;

impl ParameterExtension for AnnotatedParameters {
    fn extract_parameters(
        &self,
        param: &MethodParam,
        ty: &TypeRef,
        converter: &ModelConverter,
        skip: &mut HashSet<String>,
    ) -> Vec<Parameter> {
        let location = match param.binding {
            ParamBinding::Path => ParameterLocation::Path,
            ParamBinding::Query => ParameterLocation::Query,
            ParamBinding::Header => ParameterLocation::Header,
            ParamBinding::Form => ParameterLocation::Form,
            ParamBinding::Context => {
                skip.insert(ty.simple_name().to_string());
                return Vec::new();
            }
            ParamBinding::Body | ParamBinding::None => return Vec::new(),
        };
        let Some(name) = &param.name else {
            debug!("{:?} parameter of type {} has no name", location, ty);
            return Vec::new();
        };

        let mut parameter = simple_parameter(name, location, ty, converter);
        apply_param_metadata(&mut parameter, param);
        vec![parameter]
    }
}

/// Binds the parameters of one method
pub struct ParameterBinder<'a> {
    config: &'a ReaderConfig,
    converter: &'a ModelConverter,
    extensions: Vec<Box<dyn ParameterExtension + 'a>>,
}

impl<'a> ParameterBinder<'a> {
    pub fn new(config: &'a ReaderConfig, converter: &'a ModelConverter) -> Self {
        Self {
            config,
            converter,
            extensions: vec![Box::new(AnnotatedParameters)],
        }
    }

    /// Put `extension` ahead of the built-in ones in the chain
    pub fn with_extension(mut self, extension: Box<dyn ParameterExtension + 'a>) -> Self {
        self.extensions.insert(0, extension);
        self
    }

    /// Bind the declared parameters of `method`, collecting referenced models
    pub fn bind(
        &self,
        method: &MethodDescriptor,
        route: &RouteEntry,
        operation_path: &str,
        models: &mut BTreeMap<String, Schema>,
    ) -> Vec<Parameter> {
        match self.config.parameter_strategy {
            ParameterStrategy::RouteFirst => self.bind_route_first(method, route, operation_path, models),
            ParameterStrategy::AnnotationFirst => self.bind_annotation_first(method, route, models),
        }
    }

    fn bind_route_first(
        &self,
        method: &MethodDescriptor,
        route: &RouteEntry,
        operation_path: &str,
        models: &mut BTreeMap<String, Schema>,
    ) -> Vec<Parameter> {
        let mut parameters = Vec::new();
        let mut used = vec![false; method.params.len()];

        for route_param in route.parameters.iter().filter(|p| !p.fixed) {
            let ty = parse_or_string(&route_param.type_name);
            let location = if operation_path.contains(&format!("{{{}}}", route_param.name)) {
                ParameterLocation::Path
            } else {
                ParameterLocation::Query
            };

            let mut parameter = simple_parameter(&route_param.name, location, &ty, self.converter);
            if location == ParameterLocation::Query {
                parameter.required = !ty.is_optional() && route_param.default.is_none();
                if parameter.param_type.as_deref() == Some("array") {
                    parameter.collection_format = Some("multi".to_string());
                }
            }
            if let Some(default) = &route_param.default {
                parameter.default = Some(default_value(default));
            }

            match match_method_param(route_param, &ty, &method.params, &used) {
                Some(idx) => {
                    used[idx] = true;
                    apply_param_metadata(&mut parameter, &method.params[idx]);
                }
                None => debug!(
                    "No method parameter of {} matches route parameter {}: {}",
                    method.name, route_param.name, route_param.type_name
                ),
            }
            parameters.push(parameter);
        }

        // Locations the route file cannot express still come from annotations
        for (idx, param) in method.params.iter().enumerate() {
            if used[idx] || param.hidden {
                continue;
            }
            let ty = parse_or_string(&param.type_name);
            let location = match param.binding {
                ParamBinding::Header => ParameterLocation::Header,
                ParamBinding::Form => ParameterLocation::Form,
                ParamBinding::Body => ParameterLocation::Body,
                _ => continue,
            };
            if location == ParameterLocation::Body {
                parameters.push(self.body_parameter(param, &ty, models));
                continue;
            }
            let Some(name) = &param.name else {
                debug!("{:?} parameter of {} has no name", location, method.name);
                continue;
            };
            let mut parameter = simple_parameter(name, location, &ty, self.converter);
            apply_param_metadata(&mut parameter, param);
            parameters.push(parameter);
        }

        parameters
    }

    fn bind_annotation_first(
        &self,
        method: &MethodDescriptor,
        route: &RouteEntry,
        models: &mut BTreeMap<String, Schema>,
    ) -> Vec<Parameter> {
        let mut parameters = Vec::new();

        for (position, param) in method.params.iter().enumerate() {
            if param.hidden {
                continue;
            }
            let ty = parse_or_string(&param.type_name);
            debug!("Binding parameter {} of {}", ty, method.name);

            let mut skip = HashSet::new();
            let extracted = self
                .extensions
                .iter()
                .map(|extension| extension.extract_parameters(param, &ty, self.converter, &mut skip))
                .find(|found| !found.is_empty());
            if let Some(found) = extracted {
                parameters.extend(found);
                continue;
            }

            if skip.contains(ty.simple_name()) || self.config.is_skip_type(&param.type_name) {
                debug!("Skipping framework parameter {}", ty);
                continue;
            }

            let mut body = self.body_parameter(param, &ty, models);
            if param.name.is_none() {
                // Unnamed body parameters take their name from the route
                match route.parameters.get(position) {
                    Some(route_param)
                        if parse_or_string(&route_param.type_name).simple_name() == ty.simple_name() =>
                    {
                        body.name = route_param.name.clone();
                    }
                    Some(route_param) => debug!(
                        "Route parameter {} at position {} has type {}, method parameter has {}",
                        route_param.name, position, route_param.type_name, ty
                    ),
                    None => debug!("No route parameter at position {} of {}", position, method.name),
                }
            }
            parameters.push(body);
        }

        parameters
    }

    fn body_parameter(
        &self,
        param: &MethodParam,
        ty: &TypeRef,
        models: &mut BTreeMap<String, Schema>,
    ) -> Parameter {
        let schema = self
            .converter
            .read_as_property(ty)
            .unwrap_or_else(Schema::object);
        models.extend(self.converter.read_all(ty));
        let mut body = Parameter::body(param.name.as_deref().unwrap_or("body"), schema);
        body.description = param.description.clone();
        body.required = param.required.unwrap_or(false);
        body
    }

    /// Read implicit parameter declarations.
    ///
    /// A malformed `dataType` is an error; unknown `paramType`s are skipped.
    pub fn read_implicit_params(
        &self,
        implicit: &[ImplicitParamDescriptor],
        models: &mut BTreeMap<String, Schema>,
    ) -> Result<Vec<Parameter>> {
        let mut parameters = Vec::new();

        for declared in implicit {
            let location = match declared.param_type.to_ascii_lowercase().as_str() {
                "path" => ParameterLocation::Path,
                "query" => ParameterLocation::Query,
                "form" | "formdata" => ParameterLocation::Form,
                "header" => ParameterLocation::Header,
                "body" => ParameterLocation::Body,
                other => {
                    debug!("Unknown implicit parameter type [{}]", other);
                    continue;
                }
            };
            let ty = if declared.data_type.trim().is_empty() {
                TypeRef::new("String")
            } else {
                TypeRef::parse(&declared.data_type)?
            };

            let mut parameter = if location == ParameterLocation::Body {
                let mut schema = self
                    .converter
                    .read_as_property(&ty)
                    .unwrap_or_else(Schema::object);
                if declared.allow_multiple {
                    schema = Schema::array(schema);
                }
                models.extend(self.converter.read_all(&ty));
                Parameter::body(&declared.name, schema)
            } else {
                let mut parameter = simple_parameter(&declared.name, location, &ty, self.converter);
                if declared.allow_multiple {
                    let item = Schema {
                        schema_type: parameter.param_type.take(),
                        format: parameter.format.take(),
                        ..Schema::default()
                    };
                    parameter.param_type = Some("array".to_string());
                    parameter.items = Some(Box::new(item));
                    parameter.collection_format = Some("csv".to_string());
                }
                parameter
            };

            if !declared.value.is_empty() {
                parameter.description = Some(declared.value.clone());
            }
            parameter.required = declared.required || location == ParameterLocation::Path;
            if !declared.default_value.is_empty() {
                parameter.default = Some(default_value(&declared.default_value));
            }
            apply_allowable_values(&mut parameter, &declared.allowable_values);
            parameters.push(parameter);
        }

        Ok(parameters)
    }
}

/// Parse a declared type, degrading to `String` when it is malformed
fn parse_or_string(type_name: &str) -> TypeRef {
    TypeRef::parse(type_name).unwrap_or_else(|e| {
        debug!("Treating parameter type as String: {}", e);
        TypeRef::new("String")
    })
}

/// Index of the method parameter that corresponds to a route parameter.
///
/// A parameter bound under the same name wins; otherwise the first unused
/// parameter with the same simple type name.
fn match_method_param(
    route_param: &RouteParameter,
    route_type: &TypeRef,
    params: &[MethodParam],
    used: &[bool],
) -> Option<usize> {
    let candidates = move || {
        params
            .iter()
            .enumerate()
            .filter(move |(idx, p)| !used[*idx] && p.binding != ParamBinding::Context)
    };
    candidates()
        .find(|(_, p)| p.name.as_deref() == Some(route_param.name.as_str()))
        .or_else(|| {
            candidates().find(|(_, p)| {
                p.name.is_none()
                    && parse_or_string(&p.type_name).unwrapped().simple_name()
                        == route_type.unwrapped().simple_name()
            })
        })
        .map(|(idx, _)| idx)
}

/// A non-body parameter with a schema restricted to simple types
fn simple_parameter(
    name: &str,
    location: ParameterLocation,
    ty: &TypeRef,
    converter: &ModelConverter,
) -> Parameter {
    let property = converter
        .read_as_property(ty)
        .map(simple_property)
        .unwrap_or_else(Schema::string);
    Parameter::simple(name, location, property)
}

/// Restrict a schema to what a non-body parameter can carry.
///
/// References, maps and objects become strings. Arrays keep simple item
/// types; array items that are references or arrays become strings.
pub fn simple_property(property: Schema) -> Schema {
    if property.is_array() {
        let Schema {
            items, unique_items, ..
        } = property;
        let items = items
            .map(|item| *item)
            .filter(is_simple)
            .unwrap_or_else(Schema::string);
        return Schema {
            unique_items,
            ..Schema::array(items)
        };
    }
    if is_simple(&property) {
        property
    } else {
        Schema::string()
    }
}

fn is_simple(schema: &Schema) -> bool {
    schema.reference.is_none()
        && !matches!(schema.schema_type.as_deref(), None | Some("object") | Some("array"))
}

fn apply_param_metadata(parameter: &mut Parameter, param: &MethodParam) {
    if let Some(description) = &param.description {
        parameter.description = Some(description.clone());
    }
    if parameter.location != ParameterLocation::Path {
        if let Some(required) = param.required {
            parameter.required = required;
        }
    }
    if let Some(default) = &param.default_value {
        parameter.default = Some(default_value(default));
    }
    if let Some(allowable) = &param.allowable_values {
        apply_allowable_values(parameter, allowable);
    }
}

/// Apply `a,b,c` as an enumeration or `range[min,max]` as bounds
fn apply_allowable_values(parameter: &mut Parameter, allowable: &str) {
    let allowable = allowable.trim();
    if allowable.is_empty() {
        return;
    }
    if let Some(range) = allowable
        .strip_prefix("range[")
        .and_then(|rest| rest.strip_suffix(']'))
    {
        if let Some((min, max)) = range.split_once(',') {
            parameter.minimum = min.trim().parse().ok();
            parameter.maximum = max.trim().parse().ok();
        }
        return;
    }
    let values: Vec<String> = allowable
        .split(',')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if !values.is_empty() {
        parameter.enum_values = Some(values);
    }
}

/// Default value as JSON: numbers and booleans keep their type, quotes are dropped
fn default_value(raw: &str) -> serde_json::Value {
    let raw = raw.trim();
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(raw);
    if unquoted.len() == raw.len() {
        if let Ok(value @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) =
            serde_json::from_str::<serde_json::Value>(raw)
        {
            return value;
        }
    }
    serde_json::Value::String(unquoted.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_registry::ModelRegistry;
    use crate::routes::{HttpVerb, PathPart};
    use std::path::Path;

    fn converter() -> ModelConverter {
        let mut registry = ModelRegistry::new();
        registry
            .add_source(Path::new("models.rs"), "pub struct Pet { pub id: i64, pub name: String }")
            .unwrap();
        ModelConverter::new(registry)
    }

    fn method(params: Vec<MethodParam>) -> MethodDescriptor {
        MethodDescriptor {
            name: "handler".to_string(),
            params,
            ..MethodDescriptor::default()
        }
    }

    fn pet_route() -> RouteEntry {
        RouteEntry::new(HttpVerb::Get, vec![PathPart::literal("pets/"), PathPart::dynamic("id")])
            .with_parameter(RouteParameter::new("id", "Long"))
            .with_parameter(RouteParameter {
                default: Some("20".to_string()),
                ..RouteParameter::new("limit", "Int")
            })
            .with_parameter(RouteParameter {
                fixed: true,
                ..RouteParameter::new("format", "String")
            })
    }

    #[test]
    fn test_route_first_path_and_query() {
        let config = ReaderConfig::default();
        let converter = converter();
        let binder = ParameterBinder::new(&config, &converter);
        let mut models = BTreeMap::new();

        let params = binder.bind(
            &method(vec![MethodParam::new("Long"), MethodParam::new("Int")]),
            &pet_route(),
            "/pets/{id}",
            &mut models,
        );

        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "id");
        assert_eq!(params[0].location, ParameterLocation::Path);
        assert!(params[0].required);
        assert_eq!(params[0].format.as_deref(), Some("int64"));
        assert_eq!(params[1].name, "limit");
        assert_eq!(params[1].location, ParameterLocation::Query);
        assert!(!params[1].required);
        assert_eq!(params[1].default, Some(serde_json::json!(20)));
        assert!(models.is_empty());
    }

    #[test]
    fn test_route_first_metadata_from_matching_param() {
        let config = ReaderConfig::default();
        let converter = converter();
        let binder = ParameterBinder::new(&config, &converter);
        let described = MethodParam {
            description: Some("ID of pet to return".to_string()),
            ..MethodParam::new("java.lang.Long")
        };

        let params = binder.bind(
            &method(vec![described]),
            &pet_route(),
            "/pets/{id}",
            &mut BTreeMap::new(),
        );
        assert_eq!(params[0].description.as_deref(), Some("ID of pet to return"));
        assert!(params[1].description.is_none());
    }

    #[test]
    fn test_route_first_coerces_model_types_to_string() {
        let config = ReaderConfig::default();
        let converter = converter();
        let binder = ParameterBinder::new(&config, &converter);
        let route = RouteEntry::new(HttpVerb::Get, vec![PathPart::literal("search")])
            .with_parameter(RouteParameter::new("pet", "Pet"))
            .with_parameter(RouteParameter::new("ids", "List[Long]"))
            .with_parameter(RouteParameter::new("pets", "List[Pet]"))
            .with_parameter(RouteParameter::new("matrix", "List[List[Long]]"));

        let params = binder.bind(&method(vec![]), &route, "/search", &mut BTreeMap::new());

        assert_eq!(params[0].param_type.as_deref(), Some("string"));
        assert!(params[0].schema.is_none());
        assert_eq!(params[1].param_type.as_deref(), Some("array"));
        assert_eq!(params[1].items.as_ref().unwrap().format.as_deref(), Some("int64"));
        assert_eq!(params[1].collection_format.as_deref(), Some("multi"));
        assert_eq!(params[2].items.as_ref().unwrap().schema_type.as_deref(), Some("string"));
        assert_eq!(params[3].items.as_ref().unwrap().schema_type.as_deref(), Some("string"));
    }

    #[test]
    fn test_route_first_keeps_annotated_body_and_header() {
        let config = ReaderConfig::default();
        let converter = converter();
        let binder = ParameterBinder::new(&config, &converter);
        let route = RouteEntry::new(HttpVerb::Post, vec![PathPart::literal("pets")]);
        let params = vec![
            MethodParam {
                binding: ParamBinding::Body,
                required: Some(true),
                ..MethodParam::new("Pet")
            },
            MethodParam {
                binding: ParamBinding::Header,
                name: Some("X-Request-Id".to_string()),
                ..MethodParam::new("String")
            },
            MethodParam {
                binding: ParamBinding::Context,
                ..MethodParam::new("Http.Request")
            },
        ];
        let mut models = BTreeMap::new();

        let bound = binder.bind(&method(params), &route, "/pets", &mut models);

        assert_eq!(bound.len(), 2);
        assert_eq!(bound[0].location, ParameterLocation::Body);
        assert_eq!(bound[0].name, "body");
        assert!(bound[0].required);
        assert!(bound[0].schema.as_ref().unwrap().is_reference());
        assert_eq!(bound[1].location, ParameterLocation::Header);
        assert!(models.contains_key("Pet"));
    }

    #[test]
    fn test_annotation_first_names_body_from_route() {
        let config = ReaderConfig {
            parameter_strategy: ParameterStrategy::AnnotationFirst,
            ..ReaderConfig::default()
        };
        let converter = converter();
        let binder = ParameterBinder::new(&config, &converter);
        let params = vec![
            MethodParam::new("Long"),
            MethodParam {
                binding: ParamBinding::Query,
                name: Some("limit".to_string()),
                ..MethodParam::new("Int")
            },
            MethodParam::new("String"),
            MethodParam::new("play.mvc.Http.Request"),
        ];

        let bound = binder.bind(&method(params), &pet_route(), "/pets/{id}", &mut BTreeMap::new());

        assert_eq!(bound.len(), 3);
        assert_eq!(bound[0].name, "id");
        assert_eq!(bound[0].location, ParameterLocation::Body);
        assert_eq!(bound[1].name, "limit");
        assert_eq!(bound[1].location, ParameterLocation::Query);
        // position 2 is the fixed `format: String` route parameter
        assert_eq!(bound[2].name, "format");
    }

    #[test]
    fn test_annotation_first_mismatched_type_keeps_body_name() {
        let config = ReaderConfig {
            parameter_strategy: ParameterStrategy::AnnotationFirst,
            ..ReaderConfig::default()
        };
        let converter = converter();
        let binder = ParameterBinder::new(&config, &converter);

        let bound = binder.bind(
            &method(vec![MethodParam::new("Pet")]),
            &pet_route(),
            "/pets/{id}",
            &mut BTreeMap::new(),
        );
        assert_eq!(bound[0].name, "body");
    }

    struct TenantExtension;

    impl ParameterExtension for TenantExtension {
        fn extract_parameters(
            &self,
            _param: &MethodParam,
            ty: &TypeRef,
            _converter: &ModelConverter,
            _skip: &mut HashSet<String>,
        ) -> Vec<Parameter> {
            if ty.simple_name() == "Tenant" {
                vec![Parameter::simple("X-Tenant", ParameterLocation::Header, Schema::string())]
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn test_custom_extension_runs_first() {
        let config = ReaderConfig {
            parameter_strategy: ParameterStrategy::AnnotationFirst,
            ..ReaderConfig::default()
        };
        let converter = converter();
        let binder = ParameterBinder::new(&config, &converter).with_extension(Box::new(TenantExtension));
        let route = RouteEntry::new(HttpVerb::Get, vec![PathPart::literal("pets")]);

        let tenant_method = method(vec![MethodParam::new("Tenant")]);
        let bound = binder.bind(&tenant_method, &route, "/pets", &mut BTreeMap::new());
        assert_eq!(bound.len(), 1);
        assert_eq!(bound[0].location, ParameterLocation::Header);
    }

    #[test]
    fn test_implicit_params() {
        let config = ReaderConfig::default();
        let converter = converter();
        let binder = ParameterBinder::new(&config, &converter);
        let implicit = vec![
            ImplicitParamDescriptor {
                name: "status".to_string(),
                value: "Status values".to_string(),
                data_type: "string".to_string(),
                param_type: "query".to_string(),
                allowable_values: "available,pending,sold".to_string(),
                allow_multiple: true,
                ..ImplicitParamDescriptor::default()
            },
            ImplicitParamDescriptor {
                name: "pet".to_string(),
                data_type: "models.Pet".to_string(),
                param_type: "body".to_string(),
                required: true,
                ..ImplicitParamDescriptor::default()
            },
            ImplicitParamDescriptor {
                name: "page".to_string(),
                data_type: "Int".to_string(),
                param_type: "formData".to_string(),
                allowable_values: "range[1, 100]".to_string(),
                ..ImplicitParamDescriptor::default()
            },
            ImplicitParamDescriptor {
                name: "ignored".to_string(),
                param_type: "cookie".to_string(),
                ..ImplicitParamDescriptor::default()
            },
        ];
        let mut models = BTreeMap::new();

        let params = binder.read_implicit_params(&implicit, &mut models).unwrap();

        assert_eq!(params.len(), 3);
        assert_eq!(params[0].param_type.as_deref(), Some("array"));
        assert_eq!(params[0].collection_format.as_deref(), Some("csv"));
        assert_eq!(params[0].enum_values.as_ref().unwrap().len(), 3);
        assert_eq!(params[0].description.as_deref(), Some("Status values"));
        assert_eq!(params[1].location, ParameterLocation::Body);
        assert!(params[1].required);
        assert!(models.contains_key("Pet"));
        assert_eq!(params[2].location, ParameterLocation::Form);
        assert_eq!(params[2].minimum, Some(1.0));
        assert_eq!(params[2].maximum, Some(100.0));
    }

    #[test]
    fn test_implicit_param_with_malformed_type_fails() {
        let config = ReaderConfig::default();
        let converter = converter();
        let binder = ParameterBinder::new(&config, &converter);
        let implicit = vec![ImplicitParamDescriptor {
            name: "broken".to_string(),
            data_type: "List[Pet".to_string(),
            param_type: "query".to_string(),
            ..ImplicitParamDescriptor::default()
        }];

        assert!(binder.read_implicit_params(&implicit, &mut BTreeMap::new()).is_err());
    }

    #[test]
    fn test_default_value_typing() {
        assert_eq!(default_value("10"), serde_json::json!(10));
        assert_eq!(default_value("true"), serde_json::json!(true));
        assert_eq!(default_value("\"10\""), serde_json::json!("10"));
        assert_eq!(default_value("asc"), serde_json::json!("asc"));
    }
}
