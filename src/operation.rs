//! Operation building.
//!
//! Turns one controller method plus its compiled route into a Swagger
//! [`Operation`], together with the HTTP verb it is served under and the model
//! definitions its schemas refer to.

use crate::config::ReaderConfig;
use crate::converter::{ContainerWrapper, ModelConverter};
use crate::error::Result;
use crate::manifest::{
    Authorization, ControllerDescriptor, Manifest, MethodDescriptor, ResponseHeaderDescriptor,
};
use crate::parameters::ParameterBinder;
use crate::routes::{HttpVerb, RouteEntry};
use crate::swagger::{Operation, Response, Scheme, Schema, SecurityRequirement, SUCCESSFUL_OPERATION};
use crate::types::{Container, TypeRef};
use log::debug;
use std::collections::BTreeMap;

/// Framework result types that say nothing about the response body
const FRAMEWORK_RESULTS: &[&str] = &[
    "Result",
    "Response",
    "play.mvc.Result",
    "javax.ws.rs.core.Response",
];

/// Result of building one operation
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltOperation {
    pub verb: HttpVerb,
    pub operation: Operation,
    /// Models referenced by the operation's schemas
    pub models: BTreeMap<String, Schema>,
}

/// Builds operations for the methods of one scan
pub struct OperationBuilder<'a> {
    converter: &'a ModelConverter,
    manifest: &'a Manifest,
    binder: ParameterBinder<'a>,
}

impl<'a> OperationBuilder<'a> {
    pub fn new(config: &'a ReaderConfig, converter: &'a ModelConverter, manifest: &'a Manifest) -> Self {
        Self {
            converter,
            manifest,
            binder: ParameterBinder::new(config, converter),
        }
    }

    /// Use a customized parameter binder
    pub fn with_binder(mut self, binder: ParameterBinder<'a>) -> Self {
        self.binder = binder;
        self
    }

    /// Build the operation for `method`.
    ///
    /// Returns `Ok(None)` when the method is hidden or no HTTP verb can be
    /// determined for it. Malformed implicit parameter or response types are
    /// errors.
    pub fn parse_method(
        &self,
        controller: &ControllerDescriptor,
        method: &MethodDescriptor,
        route: &RouteEntry,
        operation_path: &str,
        parent_verb: Option<HttpVerb>,
    ) -> Result<Option<BuiltOperation>> {
        let descriptor = method.operation.as_ref();
        if descriptor.is_some_and(|op| op.hidden) {
            debug!("Skipping hidden method {}.{}", controller.name, method.name);
            return Ok(None);
        }

        let Some(verb) = descriptor
            .and_then(|op| op.http_method())
            .or(route.verb)
            .or(parent_verb)
        else {
            debug!("No HTTP verb for {}.{}", controller.name, method.name);
            return Ok(None);
        };

        let mut operation = Operation {
            operation_id: Some(method.name.clone()),
            ..Operation::default()
        };
        let mut models = BTreeMap::new();
        let mut success_code = 200;
        let mut success_headers = None;
        let mut success_schema = None;
        let mut declared_response = None;

        if let Some(op) = descriptor {
            if !op.nickname.is_empty() {
                operation.operation_id = Some(op.nickname.clone());
            }
            operation.summary = non_empty(&op.value);
            operation.description = non_empty(&op.notes);
            success_code = op.code;
            success_headers = self.response_headers(&op.response_headers)?;

            for scheme in Scheme::parse_list(&op.protocols) {
                operation.add_scheme(scheme);
            }
            for requirement in security_requirements(&op.authorizations) {
                operation.add_security(requirement);
            }
            for (key, value) in &op.extensions {
                let key = if key.starts_with("x-") {
                    key.clone()
                } else {
                    format!("x-{}", key)
                };
                operation.extensions.insert(key, value.clone());
            }

            if !op.response_reference.is_empty() {
                success_schema = Some(Schema::reference(&op.response_reference));
            } else {
                let declared = response_type(&op.response)?;
                if !declared.is_void() {
                    declared_response = Some(declared);
                }
            }
        }

        // A declared response type replaces the return type even when it is not documentable
        if success_schema.is_none() {
            let response = match declared_response {
                Some(declared) => declared,
                None => response_type(&method.returns)?,
            };
            if self.is_valid_response(&response) {
                let container = descriptor.map(|op| op.response_container.as_str()).unwrap_or("");
                success_schema = self.response_schema(&response, container, &mut models);
            }
        }

        if let Some(schema) = success_schema {
            operation.set_response(
                success_code,
                Response {
                    description: SUCCESSFUL_OPERATION.to_string(),
                    schema: Some(schema),
                    headers: success_headers,
                },
            );
        }

        let consumes = descriptor
            .map(|op| split_csv(&op.consumes))
            .filter(|values| !values.is_empty())
            .unwrap_or_else(|| method.consumes.clone());
        for media_type in &consumes {
            operation.add_consumes(media_type);
        }
        let produces = descriptor
            .map(|op| split_csv(&op.produces))
            .filter(|values| !values.is_empty())
            .unwrap_or_else(|| method.produces.clone());
        for media_type in &produces {
            operation.add_produces(media_type);
        }

        for declared in &method.responses {
            let mut response = Response::new(declared.message.clone());
            if !declared.reference.is_empty() {
                response.schema = Some(Schema::reference(&declared.reference));
            } else {
                let ty = response_type(&declared.response)?;
                if self.is_valid_response(&ty) {
                    response.schema = self.response_schema(&ty, &declared.response_container, &mut models);
                }
            }
            response.headers = self.response_headers(&declared.response_headers)?;
            operation.set_response(declared.code, response);
        }

        if method.deprecated {
            operation.deprecated = Some(true);
        }

        for parameter in self.binder.bind(method, route, operation_path, &mut models) {
            operation.add_parameter(parameter);
        }
        for parameter in self.binder.read_implicit_params(&method.implicit_params, &mut models)? {
            operation.add_parameter(parameter);
        }

        if operation.responses.is_empty() {
            operation.set_default_response(Response::successful());
        }

        Ok(Some(BuiltOperation {
            verb,
            operation,
            models,
        }))
    }

    /// Whether `ty` describes a documentable response body.
    ///
    /// Void, framework result wrappers and API resource controllers (also
    /// behind `Promise`/`CompletionStage`/`Future`) are not.
    pub fn is_valid_response(&self, ty: &TypeRef) -> bool {
        let mut inner = ty;
        while inner.container() == Some(Container::Transparent) {
            match inner.args.first() {
                Some(arg) => inner = arg,
                None => return false,
            }
        }
        if inner.is_void() {
            return false;
        }
        if FRAMEWORK_RESULTS.contains(&inner.name.as_str())
            || FRAMEWORK_RESULTS.contains(&inner.simple_name())
        {
            return false;
        }
        match self.manifest.controller(&inner.name) {
            Some(controller) if controller.api.is_some() => {
                debug!("{} is a resource controller, not a response type", inner);
                false
            }
            _ => true,
        }
    }

    fn response_schema(
        &self,
        ty: &TypeRef,
        container: &str,
        models: &mut BTreeMap<String, Schema>,
    ) -> Option<Schema> {
        let property = self.converter.read_as_property(ty)?;
        models.extend(self.converter.read_all(ty));
        Some(ContainerWrapper::wrap_container(container, property, &ContainerWrapper::ALL))
    }

    fn response_headers(
        &self,
        headers: &[ResponseHeaderDescriptor],
    ) -> Result<Option<BTreeMap<String, Schema>>> {
        let mut result = BTreeMap::new();
        for header in headers.iter().filter(|h| !h.name.is_empty()) {
            let ty = response_type(&header.response)?;
            let Some(property) = self.converter.read_as_property(&ty) else {
                debug!("Response header {} has no type", header.name);
                continue;
            };
            let property = ContainerWrapper::wrap_container(
                &header.response_container,
                property,
                &ContainerWrapper::HEADER,
            )
            .with_description(non_empty(&header.description));
            result.insert(header.name.clone(), property);
        }
        Ok((!result.is_empty()).then_some(result))
    }
}

/// Split a comma-separated annotation value, dropping blanks
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// One alternative requirement per named authorization, with its non-empty scopes
pub fn security_requirements(authorizations: &[Authorization]) -> Vec<SecurityRequirement> {
    authorizations
        .iter()
        .filter(|auth| !auth.value.is_empty())
        .map(|auth| {
            let scopes = auth.scopes.iter().filter(|s| !s.is_empty()).cloned().collect();
            SecurityRequirement::from([(auth.value.clone(), scopes)])
        })
        .collect()
}

/// A blank type name means no response body
fn response_type(name: &str) -> Result<TypeRef> {
    if name.trim().is_empty() {
        Ok(TypeRef::new("void"))
    } else {
        TypeRef::parse(name)
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
