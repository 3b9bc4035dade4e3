//! Model definitions loaded from Rust sources.
//!
//! Response and body types named in the manifest are resolved against the
//! structs and enums found in a directory of Rust model sources. Files are
//! discovered with `walkdir` (skipping `target` and hidden directories) and
//! parsed with `syn`; files that fail to parse are reported and skipped so a
//! partial model set still produces a document.

use crate::error::{Error, Result};
use crate::types::TypeRef;
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Registry of model definitions keyed by simple type name
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, ModelDef>,
    /// Files that could not be read or parsed
    pub warnings: Vec<String>,
}

/// A model definition
#[derive(Debug, Clone, PartialEq)]
pub enum ModelDef {
    /// Struct with named fields
    Struct {
        description: Option<String>,
        fields: Vec<FieldDef>,
    },
    /// Enum of unit variants, documented as a string enumeration
    Enum {
        description: Option<String>,
        variants: Vec<String>,
    },
}

/// A documented struct field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Serialized name (after `#[serde(rename)]` / `rename_all`)
    pub name: String,
    pub type_ref: TypeRef,
    pub required: bool,
    pub description: Option<String>,
}

#[derive(Debug, Default)]
struct SerdeAttrs {
    rename: Option<String>,
    rename_all: Option<String>,
    skip: bool,
    default: bool,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `.rs` file below `root`
    pub fn from_dir(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("model directory not found: {}", root.display()),
            )));
        }

        let mut registry = Self::new();
        for entry in WalkDir::new(root).into_iter().filter_entry(|e| {
            if e.path() == root {
                return true;
            }
            let file_name = e.file_name().to_string_lossy();
            !file_name.starts_with('.') && file_name != "target"
        }) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    registry.warnings.push(warning);
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("rs") {
                continue;
            }
            let loaded = fs::read_to_string(path)
                .map_err(Error::from)
                .and_then(|content| registry.add_source(path, &content));
            if let Err(e) = loaded {
                let warning = format!("Skipping {}: {}", path.display(), e);
                warn!("{}", warning);
                registry.warnings.push(warning);
            }
        }

        debug!("Loaded {} models from {}", registry.len(), root.display());
        Ok(registry)
    }

    /// Parse one Rust source and register its structs and enums
    pub fn add_source(&mut self, file: &Path, content: &str) -> Result<()> {
        let syntax_tree = syn::parse_file(content).map_err(|e| Error::Parse {
            file: PathBuf::from(file),
            message: e.to_string(),
        })?;
        self.add_items(&syntax_tree.items);
        Ok(())
    }

    fn add_items(&mut self, items: &[syn::Item]) {
        for item in items {
            match item {
                syn::Item::Struct(item_struct) => {
                    if let Some(model) = parse_struct(item_struct) {
                        debug!("Registered struct model {}", item_struct.ident);
                        self.insert(item_struct.ident.to_string(), model);
                    }
                }
                syn::Item::Enum(item_enum) => {
                    if let Some(model) = parse_enum(item_enum) {
                        debug!("Registered enum model {}", item_enum.ident);
                        self.insert(item_enum.ident.to_string(), model);
                    }
                }
                syn::Item::Mod(item_mod) => {
                    if let Some((_, nested)) = &item_mod.content {
                        self.add_items(nested);
                    }
                }
                _ => {}
            }
        }
    }

    /// Register a model; a later definition with the same name replaces it
    pub fn insert(&mut self, name: impl Into<String>, model: ModelDef) {
        self.models.insert(name.into(), model);
    }

    /// Look up a model by qualified or simple name
    pub fn get(&self, name: &str) -> Option<&ModelDef> {
        self.models.get(crate::types::simple_name(name))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

fn parse_struct(item: &syn::ItemStruct) -> Option<ModelDef> {
    let syn::Fields::Named(named) = &item.fields else {
        debug!("Skipping struct {} without named fields", item.ident);
        return None;
    };
    let container = serde_attrs(&item.attrs);

    let fields = named
        .named
        .iter()
        .filter_map(|field| {
            let ident = field.ident.as_ref()?.to_string();
            let attrs = serde_attrs(&field.attrs);
            if attrs.skip {
                return None;
            }
            let type_ref = type_ref_from_syn(&field.ty);
            let name = attrs
                .rename
                .unwrap_or_else(|| apply_rename_all(&ident, container.rename_all.as_deref()));
            Some(FieldDef {
                name,
                required: !type_ref.is_optional() && !attrs.default && !container.default,
                type_ref,
                description: doc_comment(&field.attrs),
            })
        })
        .collect();

    Some(ModelDef::Struct {
        description: doc_comment(&item.attrs),
        fields,
    })
}

fn parse_enum(item: &syn::ItemEnum) -> Option<ModelDef> {
    if item
        .variants
        .iter()
        .any(|v| !matches!(v.fields, syn::Fields::Unit))
    {
        debug!("Skipping enum {} with data-carrying variants", item.ident);
        return None;
    }
    let container = serde_attrs(&item.attrs);
    let variants = item
        .variants
        .iter()
        .filter_map(|variant| {
            let attrs = serde_attrs(&variant.attrs);
            if attrs.skip {
                return None;
            }
            Some(attrs.rename.unwrap_or_else(|| {
                apply_rename_all(&variant.ident.to_string(), container.rename_all.as_deref())
            }))
        })
        .collect();

    Some(ModelDef::Enum {
        description: doc_comment(&item.attrs),
        variants,
    })
}

fn serde_attrs(attrs: &[syn::Attribute]) -> SerdeAttrs {
    let mut result = SerdeAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: syn::LitStr = meta.value()?.parse()?;
                result.rename = Some(value.value());
            } else if meta.path.is_ident("rename_all") {
                let value: syn::LitStr = meta.value()?.parse()?;
                result.rename_all = Some(value.value());
            } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                result.skip = true;
            } else if meta.path.is_ident("default") {
                result.default = true;
                if meta.input.peek(syn::Token![=]) {
                    let _: syn::LitStr = meta.value()?.parse()?;
                }
            } else if meta.input.peek(syn::Token![=]) {
                // skip_serializing_if, with, alias, ...
                let _: syn::Expr = meta.value()?.parse()?;
            }
            Ok(())
        });
        if let Err(e) = parsed {
            debug!("Ignoring unparseable serde attribute: {}", e);
        }
    }
    result
}

fn apply_rename_all(name: &str, rule: Option<&str>) -> String {
    match rule {
        Some("camelCase") => {
            let pascal = to_pascal_case(name);
            let mut chars = pascal.chars();
            match chars.next() {
                Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        }
        Some("PascalCase") => to_pascal_case(name),
        Some("lowercase") => name.to_ascii_lowercase(),
        Some("UPPERCASE") => name.to_ascii_uppercase(),
        Some("snake_case") => to_snake_case(name),
        Some("SCREAMING_SNAKE_CASE") => to_snake_case(name).to_ascii_uppercase(),
        Some("kebab-case") => to_snake_case(name).replace('_', "-"),
        _ => name.to_string(),
    }
}

fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn to_snake_case(name: &str) -> String {
    let mut snake = String::with_capacity(name.len() + 4);
    for (idx, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if idx > 0 {
                snake.push('_');
            }
            snake.push(c.to_ascii_lowercase());
        } else {
            snake.push(c);
        }
    }
    snake
}

fn doc_comment(attrs: &[syn::Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|a| a.path().is_ident("doc"))
        .filter_map(|a| match &a.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => Some(s.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .collect();
    let joined = lines.join(" ").trim().to_string();
    (!joined.is_empty()).then_some(joined)
}

/// Convert a syn type into a [`TypeRef`]
fn type_ref_from_syn(ty: &syn::Type) -> TypeRef {
    match ty {
        syn::Type::Path(type_path) => match type_path.path.segments.last() {
            Some(segment) => {
                let args = match &segment.arguments {
                    syn::PathArguments::AngleBracketed(angle) => angle
                        .args
                        .iter()
                        .filter_map(|arg| match arg {
                            syn::GenericArgument::Type(inner) => Some(type_ref_from_syn(inner)),
                            _ => None,
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                TypeRef::generic(segment.ident.to_string(), args)
            }
            None => TypeRef::new("Object"),
        },
        syn::Type::Reference(reference) => type_ref_from_syn(&reference.elem),
        syn::Type::Array(array) => TypeRef::generic("Array", vec![type_ref_from_syn(&array.elem)]),
        syn::Type::Slice(slice) => TypeRef::generic("Array", vec![type_ref_from_syn(&slice.elem)]),
        syn::Type::Tuple(tuple) if tuple.elems.is_empty() => TypeRef::new("()"),
        _ => TypeRef::new("Object"),
    }
}
