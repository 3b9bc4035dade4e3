//! Compiled route table.
//!
//! A [`RouteTable`] maps fully-qualified controller method names to the
//! [`RouteEntry`] produced by a route compiler: the HTTP verb, the path
//! pattern and the parameters declared in the route file. The table is
//! loaded once and only read afterwards; it is handed to the reader by
//! reference rather than kept in a global.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Constraint a route compiler gives dynamic segments that declare none
pub const DEFAULT_SEGMENT_CONSTRAINT: &str = "[^/]+";

/// HTTP methods a route may be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpVerb {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
}

impl HttpVerb {
    /// Parse a verb name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "get" => Some(HttpVerb::Get),
            "put" => Some(HttpVerb::Put),
            "post" => Some(HttpVerb::Post),
            "delete" => Some(HttpVerb::Delete),
            "options" => Some(HttpVerb::Options),
            "head" => Some(HttpVerb::Head),
            "patch" => Some(HttpVerb::Patch),
            _ => None,
        }
    }

    /// Lowercase name, as used for path item keys
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "get",
            HttpVerb::Put => "put",
            HttpVerb::Post => "post",
            HttpVerb::Delete => "delete",
            HttpVerb::Options => "options",
            HttpVerb::Head => "head",
            HttpVerb::Patch => "patch",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

impl<'de> Deserialize<'de> for HttpVerb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        HttpVerb::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown HTTP method `{}`", name)))
    }
}

/// One segment of a compiled path pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathPart {
    /// Literal text, copied verbatim
    Static(String),
    /// Named placeholder
    Dynamic {
        name: String,
        /// Regex the segment must match, if the route declares one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        constraint: Option<String>,
    },
}

impl PathPart {
    pub fn literal(text: impl Into<String>) -> Self {
        PathPart::Static(text.into())
    }

    pub fn dynamic(name: impl Into<String>) -> Self {
        PathPart::Dynamic {
            name: name.into(),
            constraint: None,
        }
    }
}

/// A parameter declared on the route's controller call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteParameter {
    pub name: String,
    /// Declared type as written in the route file (`Long`, `Option[String]`)
    #[serde(rename = "type")]
    pub type_name: String,
    /// Fixed parameters (`name: Type = value`) are not client-supplied
    #[serde(default)]
    pub fixed: bool,
    /// Default value (`name: Type ?= value`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl RouteParameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            fixed: false,
            default: None,
        }
    }
}

/// A compiled route bound to one controller method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<HttpVerb>,
    /// Parts are written as single-key maps (`- static: "pets/"`) in YAML too
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub path: Vec<PathPart>,
    #[serde(default)]
    pub parameters: Vec<RouteParameter>,
}

impl RouteEntry {
    pub fn new(verb: HttpVerb, path: Vec<PathPart>) -> Self {
        Self {
            verb: Some(verb),
            path,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: RouteParameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// Read-only lookup from fully-qualified method name to route
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, RouteEntry>,
}

impl RouteTable {
    pub fn new(routes: HashMap<String, RouteEntry>) -> Self {
        Self { routes }
    }

    pub fn exists(&self, method_name: &str) -> bool {
        self.routes.contains_key(method_name)
    }

    pub fn get(&self, method_name: &str) -> Result<&RouteEntry> {
        self.routes
            .get(method_name)
            .ok_or_else(|| Error::RouteNotFound(method_name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl FromIterator<(String, RouteEntry)> for RouteTable {
    fn from_iter<I: IntoIterator<Item = (String, RouteEntry)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The key a route compiler stores for a controller method.
///
/// Companion objects already carry a `$` in their name and are joined with a
/// plain `.`; every other class gets `$.` so it matches the compiled key.
pub fn full_method_name(class_name: &str, method_name: &str) -> String {
    if class_name.contains('$') {
        format!("{}.{}", class_name, method_name)
    } else {
        format!("{}$.{}", class_name, method_name)
    }
}
