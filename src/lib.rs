//! swagger-from-routes - Swagger 2.0 documentation from compiled routes and controller metadata.
//!
//! The library reads a web application's compiled route table together with a
//! static manifest of its controllers (class-level `api` metadata, operation,
//! response and parameter descriptors) and assembles a Swagger 2.0 document.
//! Response and body types are resolved against Rust model definitions parsed
//! from source.
//!
//! # Architecture
//!
//! 1. [`manifest`] - Loads the route table and controller descriptors from YAML or JSON
//! 2. [`routes`] - Route table lookup by fully-qualified method name
//! 3. [`path`] - Turns route patterns into `{name}` path templates
//! 4. [`types`], [`model_registry`], [`converter`] - Type names, model definitions and schemas
//! 5. [`parameters`] - Binds request parameters (route-first or annotation-first)
//! 6. [`operation`] - Builds one operation per controller method
//! 7. [`reader`] - Walks controllers and assembles the [`swagger::Swagger`] document
//! 8. [`serializer`] - Serializes the document to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use swagger_from_routes::{
//!     converter::ModelConverter,
//!     manifest::Manifest,
//!     model_registry::ModelRegistry,
//!     reader::Reader,
//!     serializer::serialize_yaml,
//! };
//! use std::path::Path;
//!
//! let manifest = Manifest::from_file(Path::new("manifest.yaml")).unwrap();
//! let registry = ModelRegistry::from_dir(Path::new("src/models")).unwrap();
//! let converter = ModelConverter::new(registry);
//! let routes = manifest.route_table();
//!
//! let mut reader = Reader::new(&manifest.config, &routes, &converter, &manifest);
//! reader.read_all().unwrap();
//! let swagger = reader.into_swagger();
//!
//! println!("{}", serialize_yaml(&swagger).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod cli;
pub mod config;
pub mod converter;
pub mod error;
pub mod manifest;
pub mod model_registry;
pub mod operation;
pub mod parameters;
pub mod path;
pub mod reader;
pub mod routes;
pub mod serializer;
pub mod swagger;
pub mod types;
