//! Path template resolution.
//!
//! Turns a compiled route pattern into a Swagger path template relative to
//! the configured base path, with a fallback that assembles the template from
//! class- and method-level path declarations when the route carries none.

use crate::routes::{PathPart, DEFAULT_SEGMENT_CONSTRAINT};
use log::debug;
use std::collections::HashMap;

const PATH_DELIMITER: char = '/';

/// Render a route pattern as a `{name}` template relative to `base_path`.
///
/// Static parts are copied verbatim and dynamic parts become `{name}`. The
/// base path is removed when the rendered route starts with it at a segment
/// boundary; otherwise the route is left untouched. The result always starts
/// with `/`. Returns `None` for an empty pattern.
pub fn path_from_route(parts: &[PathPart], base_path: &str) -> Option<String> {
    if parts.is_empty() {
        return None;
    }

    let mut rendered = String::new();
    for part in parts {
        match part {
            PathPart::Static(text) => rendered.push_str(text),
            PathPart::Dynamic { name, .. } => {
                rendered.push('{');
                rendered.push_str(name);
                rendered.push('}');
            }
        }
    }

    let route = rendered.trim_start_matches(PATH_DELIMITER);
    let base = base_path.trim_matches(PATH_DELIMITER);
    let relative = match route.strip_prefix(base) {
        Some(rest) if !base.is_empty() && (rest.is_empty() || rest.starts_with(PATH_DELIMITER)) => rest,
        _ => {
            if !base.is_empty() {
                debug!("Route /{} is not under base path /{}", route, base);
            }
            route
        }
    };

    if relative.starts_with(PATH_DELIMITER) {
        Some(relative.to_string())
    } else {
        Some(format!("/{}", relative))
    }
}

/// Collect `name -> regex` for dynamic parts with a non-default constraint
pub fn route_constraints(parts: &[PathPart], regex_map: &mut HashMap<String, String>) {
    for part in parts {
        if let PathPart::Dynamic {
            name,
            constraint: Some(constraint),
        } = part
        {
            if constraint != DEFAULT_SEGMENT_CONSTRAINT {
                regex_map.insert(name.clone(), constraint.clone());
            }
        }
    }
}

/// Assemble a path from parent, class-level and method-level declarations.
///
/// Returns `None` when none of the three is present.
pub fn path_from_annotations(
    class_path: Option<&str>,
    method_path: Option<&str>,
    parent_path: &str,
) -> Option<String> {
    if class_path.is_none() && method_path.is_none() && parent_path.is_empty() {
        return None;
    }

    let mut path = String::new();
    if !parent_path.is_empty() && parent_path != "/" {
        if !parent_path.starts_with(PATH_DELIMITER) {
            path.push(PATH_DELIMITER);
        }
        path.push_str(parent_path.strip_suffix(PATH_DELIMITER).unwrap_or(parent_path));
    }
    if let Some(class_path) = class_path {
        path.push_str(class_path);
    }
    if let Some(method_path) = method_path.filter(|p| *p != "/") {
        if !method_path.starts_with(PATH_DELIMITER) && !path.ends_with(PATH_DELIMITER) {
            path.push(PATH_DELIMITER);
        }
        path.push_str(method_path.strip_suffix(PATH_DELIMITER).unwrap_or(method_path));
    }

    if !path.starts_with(PATH_DELIMITER) {
        path.insert(0, PATH_DELIMITER);
    }
    if path.len() > 1 && path.ends_with(PATH_DELIMITER) {
        path.pop();
    }
    Some(path)
}

/// Rewrite `{name: regex}` placeholders to `{name}`, recording each regex.
///
/// Braces inside the regex (`{id: [0-9]{1,3}}`) are balanced, so quantifiers
/// do not end the placeholder early.
pub fn parse_path(path: &str, regex_map: &mut HashMap<String, String>) -> String {
    let mut output = String::with_capacity(path.len());
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        if c != '{' {
            output.push(c);
            continue;
        }

        let mut depth = 1;
        let mut placeholder = String::new();
        for inner in chars.by_ref() {
            match inner {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            placeholder.push(inner);
        }

        let (name, regex) = match placeholder.split_once(':') {
            Some((name, regex)) => (name.trim(), Some(regex.trim())),
            None => (placeholder.trim(), None),
        };
        if let Some(regex) = regex.filter(|r| !r.is_empty()) {
            regex_map.insert(name.to_string(), regex.to_string());
        }
        output.push('{');
        output.push_str(name);
        output.push('}');
    }

    output
}

/// Whether `path` equals, or lies under, one of the ignored routes
pub fn is_ignored(path: &str, ignored_routes: &[String]) -> bool {
    ignored_routes.iter().any(|item| match path.strip_prefix(item.as_str()) {
        Some(rest) => rest.is_empty() || rest.starts_with(PATH_DELIMITER),
        None => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::PathPart;

    #[test]
    fn test_static_route_minus_base_path() {
        let parts = vec![PathPart::literal("api/pets/all")];
        assert_eq!(path_from_route(&parts, "/api").as_deref(), Some("/pets/all"));
        assert_eq!(path_from_route(&parts, "api/").as_deref(), Some("/pets/all"));
    }

    #[test]
    fn test_dynamic_segment_rendering() {
        let parts = vec![
            PathPart::literal("/pets/"),
            PathPart::dynamic("id"),
            PathPart::literal("/photos"),
        ];
        assert_eq!(path_from_route(&parts, "/").as_deref(), Some("/pets/{id}/photos"));
    }

    #[test]
    fn test_base_path_must_end_at_segment_boundary() {
        let parts = vec![PathPart::literal("apiary/bees")];
        assert_eq!(path_from_route(&parts, "/api").as_deref(), Some("/apiary/bees"));
    }

    #[test]
    fn test_base_path_not_a_prefix_is_noop() {
        let parts = vec![PathPart::literal("v2/pets")];
        assert_eq!(path_from_route(&parts, "/api").as_deref(), Some("/v2/pets"));
    }

    #[test]
    fn test_route_equal_to_base_path() {
        let parts = vec![PathPart::literal("api")];
        assert_eq!(path_from_route(&parts, "/api").as_deref(), Some("/"));
    }

    #[test]
    fn test_empty_pattern() {
        assert!(path_from_route(&[], "/").is_none());
    }

    #[test]
    fn test_route_constraints_skip_default() {
        let parts = vec![
            PathPart::Dynamic {
                name: "id".to_string(),
                constraint: Some("[0-9]+".to_string()),
            },
            PathPart::Dynamic {
                name: "slug".to_string(),
                constraint: Some(DEFAULT_SEGMENT_CONSTRAINT.to_string()),
            },
        ];
        let mut regex_map = HashMap::new();
        route_constraints(&parts, &mut regex_map);
        assert_eq!(regex_map.len(), 1);
        assert_eq!(regex_map["id"], "[0-9]+");
    }

    #[test]
    fn test_path_from_annotations() {
        assert_eq!(path_from_annotations(None, None, ""), None);
        assert_eq!(
            path_from_annotations(Some("/pets"), Some("{id}/"), "").as_deref(),
            Some("/pets/{id}")
        );
        assert_eq!(
            path_from_annotations(None, Some("/owners"), "stores/").as_deref(),
            Some("/stores/owners")
        );
        assert_eq!(path_from_annotations(Some("/pets/"), Some("/"), "").as_deref(), Some("/pets"));
        assert_eq!(path_from_annotations(None, None, "/").as_deref(), Some("/"));
    }

    #[test]
    fn test_parse_path_extracts_regex() {
        let mut regex_map = HashMap::new();
        let path = parse_path("/pets/{id: [0-9]{1,3}}/tags/{tag}", &mut regex_map);
        assert_eq!(path, "/pets/{id}/tags/{tag}");
        assert_eq!(regex_map.get("id").map(String::as_str), Some("[0-9]{1,3}"));
        assert!(!regex_map.contains_key("tag"));
    }

    #[test]
    fn test_is_ignored() {
        let ignored = vec!["/admin".to_string()];
        assert!(is_ignored("/admin", &ignored));
        assert!(is_ignored("/admin/users", &ignored));
        assert!(!is_ignored("/administrators", &ignored));
        assert!(!is_ignored("/pets", &ignored));
    }
}
