//! Document assembly.
//!
//! [`Reader`] walks the controllers of a manifest, resolves each routed
//! method to a path template, builds its operation and registers paths, tags
//! and model definitions in the Swagger document it owns. Methods whose
//! return type is another API controller are read as sub-resources below the
//! method's path.

use crate::config::ReaderConfig;
use crate::converter::ModelConverter;
use crate::error::Result;
use crate::manifest::{ControllerDescriptor, Manifest};
use crate::operation::{security_requirements, split_csv, BuiltOperation, OperationBuilder};
use crate::path::{is_ignored, parse_path, path_from_annotations, path_from_route, route_constraints};
use crate::routes::{full_method_name, HttpVerb, RouteTable};
use crate::swagger::{Parameter, Scheme, SecurityRequirement, Swagger, Tag};
use crate::types::{Container, TypeRef};
use log::{debug, info};
use std::collections::{HashMap, HashSet};

/// State inherited by a sub-resource from the method that exposes it
#[derive(Debug, Clone, Default)]
struct ParentContext {
    path: String,
    verb: Option<HttpVerb>,
    consumes: Vec<String>,
    produces: Vec<String>,
    tags: Vec<String>,
    parameters: Vec<Parameter>,
}

/// Class-level defaults applied to every operation of a controller
#[derive(Debug, Default)]
struct ClassDefaults {
    tags: Vec<String>,
    consumes: Vec<String>,
    produces: Vec<String>,
    schemes: Vec<Scheme>,
    security: Vec<SecurityRequirement>,
}

/// Builds a Swagger document from a manifest's controllers and routes
pub struct Reader<'a> {
    config: &'a ReaderConfig,
    routes: &'a RouteTable,
    manifest: &'a Manifest,
    builder: OperationBuilder<'a>,
    swagger: Swagger,
}

impl<'a> Reader<'a> {
    pub fn new(
        config: &'a ReaderConfig,
        routes: &'a RouteTable,
        converter: &'a ModelConverter,
        manifest: &'a Manifest,
    ) -> Self {
        debug!("Initializing Reader for {} routes", routes.len());
        let mut swagger = Swagger::new(config.info.clone());
        swagger.host = config.host.clone();
        swagger.base_path = Some(format!("/{}", config.base_path.trim_matches('/')));
        swagger.schemes = config.schemes.clone();

        Self {
            config,
            routes,
            manifest,
            builder: OperationBuilder::new(config, converter, manifest),
            swagger,
        }
    }

    /// Replace the operation builder, e.g. to install parameter extensions
    pub fn with_builder(mut self, builder: OperationBuilder<'a>) -> Self {
        self.builder = builder;
        self
    }

    /// Read every controller of the manifest, in manifest order
    pub fn read_all(&mut self) -> Result<()> {
        let manifest = self.manifest;
        for controller in &manifest.controllers {
            self.read(controller)?;
        }
        info!(
            "Documented {} paths and {} models",
            self.swagger.paths.len(),
            self.swagger.definitions.len()
        );
        Ok(())
    }

    /// Read one controller and the sub-resources it exposes
    pub fn read(&mut self, controller: &ControllerDescriptor) -> Result<()> {
        let mut visited = HashSet::new();
        self.read_controller(controller, None, false, &mut visited)
    }

    pub fn swagger(&self) -> &Swagger {
        &self.swagger
    }

    pub fn into_swagger(self) -> Swagger {
        self.swagger
    }

    fn read_controller(
        &mut self,
        controller: &ControllerDescriptor,
        parent: Option<&ParentContext>,
        read_hidden: bool,
        visited: &mut HashSet<String>,
    ) -> Result<()> {
        visited.insert(controller.name.clone());
        let routes = self.routes;

        let api = controller.api.as_ref();
        let readable = api.is_some_and(|api| read_hidden || !api.hidden);
        let scan_all = api.is_none() && self.config.scan_all_resources;
        if !readable && !scan_all {
            debug!("Skipping controller {}", controller.name);
            return Ok(());
        }
        debug!("Reading controller {}", controller.name);

        let mut defaults = ClassDefaults {
            tags: parent.map(|p| p.tags.clone()).unwrap_or_default(),
            consumes: controller.consumes.clone(),
            produces: controller.produces.clone(),
            ..ClassDefaults::default()
        };
        if let Some(api) = api.filter(|_| readable) {
            let declared: Vec<&String> = if api.tags.iter().any(|t| !t.is_empty()) {
                api.tags.iter().filter(|t| !t.is_empty()).collect()
            } else if !api.value.is_empty() {
                vec![&api.value]
            } else {
                Vec::new()
            };
            for tag in declared {
                if !defaults.tags.contains(tag) {
                    defaults.tags.push(tag.clone());
                }
            }
            let consumes = split_csv(&api.consumes);
            if !consumes.is_empty() {
                defaults.consumes = consumes;
            }
            let produces = split_csv(&api.produces);
            if !produces.is_empty() {
                defaults.produces = produces;
            }
            defaults.schemes = Scheme::parse_list(&api.protocols);
            defaults.security = security_requirements(&api.authorizations);
        }
        for tag in &defaults.tags {
            self.swagger.add_tag(Tag::new(tag.as_str()));
        }

        for method in &controller.methods {
            let full_name = full_method_name(&controller.name, &method.name);
            if !routes.exists(&full_name) {
                debug!("Method {} has no route", full_name);
                continue;
            }
            let route = routes.get(&full_name)?;

            let mut regex_map = HashMap::new();
            let parent_path = parent.map(|p| p.path.as_str()).unwrap_or("");
            let operation_path = match path_from_route(&route.path, &self.config.base_path) {
                Some(path) => {
                    route_constraints(&route.path, &mut regex_map);
                    path
                }
                None => {
                    let class_path = controller.path.as_deref();
                    match path_from_annotations(class_path, method.path.as_deref(), parent_path) {
                        Some(path) => parse_path(&path, &mut regex_map),
                        None => {
                            debug!("No path for {}", full_name);
                            continue;
                        }
                    }
                }
            };
            if is_ignored(&operation_path, &self.config.ignored_routes) {
                debug!("Ignoring {} at {}", full_name, operation_path);
                continue;
            }

            let buildable = method.operation.is_some()
                || self.config.scan_all_resources
                || route.verb.is_some()
                || method.path.is_some();
            if !buildable {
                continue;
            }

            let parent_verb = parent.and_then(|p| p.verb);
            let Some(BuiltOperation {
                verb,
                mut operation,
                models,
            }) = self
                .builder
                .parse_method(controller, method, route, &operation_path, parent_verb)?
            else {
                continue;
            };
            for (name, model) in models {
                self.swagger.add_model(name, model);
            }

            if let Some(parent) = parent {
                for parameter in &parent.parameters {
                    operation.add_parameter(parameter.clone());
                }
            }
            for parameter in operation.parameters.iter_mut() {
                if let Some(regex) = regex_map.get(&parameter.name) {
                    parameter.pattern = Some(regex.clone());
                }
            }

            if operation.schemes.is_none() {
                for scheme in &defaults.schemes {
                    operation.add_scheme(*scheme);
                }
            }

            // Below a parent the fallback media types are class, parent and operation combined
            let (consumes, produces) = match parent {
                Some(parent) => (
                    merged(&defaults.consumes, &parent.consumes, operation.consumes.as_deref()),
                    merged(&defaults.produces, &parent.produces, operation.produces.as_deref()),
                ),
                None => (defaults.consumes.clone(), defaults.produces.clone()),
            };

            if let Some(sub_resource) = self.sub_resource(&method.returns, visited) {
                let context = ParentContext {
                    path: operation_path.clone(),
                    verb: Some(verb),
                    consumes: consumes.clone(),
                    produces: produces.clone(),
                    tags: defaults.tags.clone(),
                    parameters: operation.parameters.clone(),
                };
                debug!("Reading sub-resource {} below {}", sub_resource.name, operation_path);
                self.read_controller(sub_resource, Some(&context), true, visited)?;
            }

            if let Some(op) = &method.operation {
                for tag in op.tags.iter().filter(|t| !t.is_empty()) {
                    operation.add_tag(tag);
                    self.swagger.add_tag(Tag::new(tag.as_str()));
                }
            }
            if operation.tags.is_none() {
                for tag in &defaults.tags {
                    operation.add_tag(tag);
                }
            }
            if operation.consumes.is_none() {
                for media_type in &consumes {
                    operation.add_consumes(media_type);
                }
            }
            if operation.produces.is_none() {
                for media_type in &produces {
                    operation.add_produces(media_type);
                }
            }
            if operation.security.is_none() {
                for requirement in &defaults.security {
                    operation.add_security(requirement.clone());
                }
            }

            debug!("Adding {} {}", verb, operation_path);
            if let Some(replaced) = self.swagger.path_mut(&operation_path).set(verb, operation) {
                debug!(
                    "{} {} replaces operation {:?}",
                    verb,
                    operation_path,
                    replaced.operation_id.unwrap_or_default()
                );
            }
        }

        Ok(())
    }

    /// The unvisited API controller a method's return type names, if any
    fn sub_resource(&self, returns: &str, visited: &HashSet<String>) -> Option<&'a ControllerDescriptor> {
        let ty = TypeRef::parse(returns).ok()?;
        let mut inner = &ty;
        while inner.container() == Some(Container::Transparent) {
            inner = inner.args.first()?;
        }
        let manifest = self.manifest;
        manifest
            .controller(&inner.name)
            .filter(|controller| controller.api.is_some() && !visited.contains(&controller.name))
    }
}

/// Union of class, parent and operation media types, in that order
fn merged(class: &[String], parent: &[String], operation: Option<&[String]>) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for value in class.iter().chain(parent).chain(operation.unwrap_or_default()) {
        if !values.contains(value) {
            values.push(value.clone());
        }
    }
    values
}
