//! Reader configuration.
//!
//! `ReaderConfig` is read from the `config` section of a manifest and may be
//! overridden from the command line. It is passed to the reader explicitly.

use crate::error::{Error, Result};
use crate::swagger::{Info, Scheme};
use serde::{Deserialize, Serialize};

/// How method parameters are matched to request locations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParameterStrategy {
    /// Bind from the route's declared parameters and the path template
    #[default]
    RouteFirst,
    /// Bind from parameter annotations, falling back to a body parameter
    AnnotationFirst,
}

/// Configuration for a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReaderConfig {
    /// Prefix removed from every compiled route path
    pub base_path: String,
    /// Also scan controllers without an `api` descriptor
    pub scan_all_resources: bool,
    /// Paths excluded together with everything below them
    pub ignored_routes: Vec<String>,
    pub parameter_strategy: ParameterStrategy,
    /// Framework types that are injected rather than sent by clients
    pub skip_types: Vec<String>,
    pub info: Info,
    pub host: Option<String>,
    pub schemes: Vec<Scheme>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            base_path: "/".to_string(),
            scan_all_resources: false,
            ignored_routes: Vec::new(),
            parameter_strategy: ParameterStrategy::default(),
            skip_types: default_skip_types(),
            info: Info::default(),
            host: None,
            schemes: Vec::new(),
        }
    }
}

fn default_skip_types() -> Vec<String> {
    ["Http.Context", "Http.Request", "Request", "RequestHeader"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl ReaderConfig {
    /// Check the settings that would otherwise produce malformed paths
    pub fn validate(&self) -> Result<()> {
        if let Some(route) = self.ignored_routes.iter().find(|r| !r.starts_with('/')) {
            return Err(Error::Config(format!(
                "ignored route `{}` must start with `/`",
                route
            )));
        }
        if self.base_path.contains(['{', '}']) {
            return Err(Error::Config(format!(
                "base path `{}` must not contain placeholders",
                self.base_path
            )));
        }
        Ok(())
    }

    /// Whether a type name is one of the framework-injected skip types
    pub fn is_skip_type(&self, type_name: &str) -> bool {
        let simple = crate::types::simple_name(type_name);
        self.skip_types.iter().any(|skip| {
            skip == type_name || crate::types::simple_name(skip) == simple
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReaderConfig::default();
        assert_eq!(config.base_path, "/");
        assert!(!config.scan_all_resources);
        assert_eq!(config.parameter_strategy, ParameterStrategy::RouteFirst);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: ReaderConfig = serde_yaml::from_str(
            "basePath: /api\nparameterStrategy: annotation-first\nignoredRoutes: [/admin]",
        )
        .unwrap();
        assert_eq!(config.base_path, "/api");
        assert_eq!(config.parameter_strategy, ParameterStrategy::AnnotationFirst);
        assert_eq!(config.ignored_routes, vec!["/admin".to_string()]);
        assert!(!config.skip_types.is_empty());
    }

    #[test]
    fn test_validate_rejects_relative_ignored_route() {
        let config = ReaderConfig {
            ignored_routes: vec!["admin".to_string()],
            ..ReaderConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_skip_type_matching() {
        let config = ReaderConfig::default();
        assert!(config.is_skip_type("play.mvc.Http.Request"));
        assert!(config.is_skip_type("RequestHeader"));
        assert!(!config.is_skip_type("Pet"));
    }
}
