//! Type-to-schema conversion.
//!
//! [`ModelConverter`] turns [`TypeRef`]s into Swagger property schemas and
//! collects the model definitions a type refers to, resolving named types
//! against a [`ModelRegistry`]. [`ContainerWrapper`] applies the
//! `responseContainer` hints of operation and response descriptors.

use crate::model_registry::{ModelDef, ModelRegistry};
use crate::swagger::Schema;
use crate::types::{Container, Primitive, TypeRef};
use log::debug;
use std::collections::{BTreeMap, HashSet};

/// Converts type references to schemas
#[derive(Debug, Clone, Default)]
pub struct ModelConverter {
    registry: ModelRegistry,
}

impl ModelConverter {
    pub fn new(registry: ModelRegistry) -> Self {
        debug!("Initializing ModelConverter with {} models", registry.len());
        Self { registry }
    }

    /// Schema describing a value of `ty`, or `None` for void types
    pub fn read_as_property(&self, ty: &TypeRef) -> Option<Schema> {
        if ty.is_void() {
            return None;
        }

        match ty.container() {
            Some(Container::Optional | Container::Transparent) => {
                return match ty.args.first() {
                    Some(inner) => self.read_as_property(inner),
                    None => Some(Schema::object()),
                };
            }
            Some(Container::Array) => return Some(Schema::array(self.item_property(ty.args.first()))),
            Some(Container::Set) => return Some(Schema::set(self.item_property(ty.args.first()))),
            Some(Container::Map) => return Some(Schema::map(self.item_property(ty.args.last()))),
            None => {}
        }

        if let Some(primitive) = ty.primitive() {
            return Some(primitive_schema(primitive));
        }

        if self.registry.get(&ty.name).is_some() {
            return Some(Schema::reference(ty.simple_name()));
        }

        debug!("Unknown type {}, using object placeholder", ty);
        Some(Schema::object())
    }

    fn item_property(&self, item: Option<&TypeRef>) -> Schema {
        item.and_then(|ty| self.read_as_property(ty))
            .unwrap_or_else(Schema::object)
    }

    /// All model definitions reachable from `ty`, keyed by model name
    pub fn read_all(&self, ty: &TypeRef) -> BTreeMap<String, Schema> {
        let mut models = BTreeMap::new();
        let mut visited = HashSet::new();
        self.collect_models(ty, &mut models, &mut visited);
        models
    }

    fn collect_models(
        &self,
        ty: &TypeRef,
        models: &mut BTreeMap<String, Schema>,
        visited: &mut HashSet<String>,
    ) {
        for arg in &ty.args {
            self.collect_models(arg, models, visited);
        }

        let name = ty.simple_name().to_string();
        let Some(model) = self.registry.get(&name) else {
            return;
        };
        if !visited.insert(name.clone()) {
            return;
        }

        let schema = match model {
            ModelDef::Struct {
                description,
                fields,
            } => {
                let mut properties = BTreeMap::new();
                let mut required = Vec::new();
                for field in fields {
                    self.collect_models(&field.type_ref, models, visited);
                    let property = self
                        .read_as_property(&field.type_ref)
                        .unwrap_or_else(Schema::object)
                        .with_description(field.description.clone());
                    properties.insert(field.name.clone(), property);
                    if field.required {
                        required.push(field.name.clone());
                    }
                }
                Schema {
                    schema_type: Some("object".to_string()),
                    description: description.clone(),
                    properties: Some(properties),
                    required: (!required.is_empty()).then_some(required),
                    ..Schema::default()
                }
            }
            ModelDef::Enum {
                description,
                variants,
            } => Schema {
                schema_type: Some("string".to_string()),
                description: description.clone(),
                enum_values: Some(variants.clone()),
                ..Schema::default()
            },
        };
        debug!("Collected model {}", name);
        models.insert(name, schema);
    }
}

/// Swagger `type`/`format` for a primitive
pub fn primitive_schema(primitive: Primitive) -> Schema {
    let (schema_type, format) = match primitive {
        Primitive::String => ("string", None),
        Primitive::Byte => ("string", Some("byte")),
        Primitive::Int32 => ("integer", Some("int32")),
        Primitive::Int64 => ("integer", Some("int64")),
        Primitive::Float => ("number", Some("float")),
        Primitive::Double => ("number", Some("double")),
        Primitive::Decimal => ("number", None),
        Primitive::Boolean => ("boolean", None),
        Primitive::Date => ("string", Some("date")),
        Primitive::DateTime => ("string", Some("date-time")),
        Primitive::Uuid => ("string", Some("uuid")),
        Primitive::Object => ("object", None),
    };
    Schema::typed(schema_type, format)
}

/// Container shapes a `responseContainer` hint can select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerWrapper {
    List,
    Array,
    Map,
    Set,
}

impl ContainerWrapper {
    pub const ALL: [ContainerWrapper; 4] = [
        ContainerWrapper::List,
        ContainerWrapper::Array,
        ContainerWrapper::Map,
        ContainerWrapper::Set,
    ];

    /// Wrappers allowed for response headers
    pub const HEADER: [ContainerWrapper; 3] = [
        ContainerWrapper::Array,
        ContainerWrapper::List,
        ContainerWrapper::Set,
    ];

    fn name(&self) -> &'static str {
        match self {
            ContainerWrapper::List => "list",
            ContainerWrapper::Array => "array",
            ContainerWrapper::Map => "map",
            ContainerWrapper::Set => "set",
        }
    }

    fn wrap(&self, property: Schema) -> Schema {
        match self {
            ContainerWrapper::List | ContainerWrapper::Array => Schema::array(property),
            ContainerWrapper::Map => Schema::map(property),
            ContainerWrapper::Set => Schema::set(property),
        }
    }

    /// Wrap `property` in the container named by `hint` (case-insensitive).
    ///
    /// Hints outside `allowed` leave the property unchanged.
    pub fn wrap_container(hint: &str, property: Schema, allowed: &[ContainerWrapper]) -> Schema {
        match allowed
            .iter()
            .find(|wrapper| wrapper.name().eq_ignore_ascii_case(hint.trim()))
        {
            Some(wrapper) => wrapper.wrap(property),
            None => property,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn converter_from(code: &str) -> ModelConverter {
        let mut registry = ModelRegistry::new();
        registry.add_source(Path::new("models.rs"), code).unwrap();
        ModelConverter::new(registry)
    }

    fn parse(ty: &str) -> TypeRef {
        TypeRef::parse(ty).unwrap()
    }

    #[test]
    fn test_primitive_properties() {
        let converter = ModelConverter::default();
        let long = converter.read_as_property(&parse("Long")).unwrap();
        assert_eq!(long.schema_type.as_deref(), Some("integer"));
        assert_eq!(long.format.as_deref(), Some("int64"));

        let flag = converter.read_as_property(&parse("bool")).unwrap();
        assert_eq!(flag.schema_type.as_deref(), Some("boolean"));
        assert!(flag.format.is_none());
    }

    #[test]
    fn test_void_has_no_property() {
        let converter = ModelConverter::default();
        assert!(converter.read_as_property(&parse("void")).is_none());
        assert!(converter.read_as_property(&parse("()")).is_none());
    }

    #[test]
    fn test_containers() {
        let converter = converter_from("pub struct Pet { pub id: i64 }");

        let list = converter.read_as_property(&parse("List[Pet]")).unwrap();
        assert!(list.is_array());
        assert_eq!(
            list.items.unwrap().reference.as_deref(),
            Some("#/definitions/Pet")
        );

        let set = converter.read_as_property(&parse("Set<String>")).unwrap();
        assert_eq!(set.unique_items, Some(true));

        let map = converter.read_as_property(&parse("Map[String, Long]")).unwrap();
        assert_eq!(map.schema_type.as_deref(), Some("object"));
        assert_eq!(
            map.additional_properties.unwrap().format.as_deref(),
            Some("int64")
        );

        let optional = converter.read_as_property(&parse("Option[Pet]")).unwrap();
        assert!(optional.is_reference());
    }

    #[test]
    fn test_unknown_type_is_object() {
        let converter = ModelConverter::default();
        let schema = converter.read_as_property(&parse("Mystery")).unwrap();
        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        assert!(converter.read_all(&parse("Mystery")).is_empty());
    }

    #[test]
    fn test_read_all_collects_nested_models() {
        let converter = converter_from(
            r#"
            pub struct Pet {
                pub id: i64,
                pub category: Option<Category>,
                pub status: Status,
                pub tags: Vec<Tag>,
            }
            pub struct Category { pub id: i64, pub parent: Option<Box<Category>> }
            pub struct Tag { pub name: String }
            pub enum Status { Available, Sold }
        "#,
        );

        let models = converter.read_all(&parse("List[Pet]"));
        let names: Vec<_> = models.keys().cloned().collect();
        assert_eq!(names, vec!["Category", "Pet", "Status", "Tag"]);

        let pet = &models["Pet"];
        assert_eq!(
            pet.required.as_ref().unwrap(),
            &vec!["id".to_string(), "status".to_string(), "tags".to_string()]
        );
        let properties = pet.properties.as_ref().unwrap();
        assert_eq!(
            properties["category"].reference.as_deref(),
            Some("#/definitions/Category")
        );
        assert_eq!(models["Status"].enum_values.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_wrap_container() {
        let wrapped = ContainerWrapper::wrap_container("LIST", Schema::string(), &ContainerWrapper::ALL);
        assert!(wrapped.is_array());

        let set = ContainerWrapper::wrap_container("set", Schema::string(), &ContainerWrapper::ALL);
        assert_eq!(set.unique_items, Some(true));

        let map = ContainerWrapper::wrap_container("Map", Schema::string(), &ContainerWrapper::ALL);
        assert!(map.additional_properties.is_some());

        let unknown = ContainerWrapper::wrap_container("bag", Schema::string(), &ContainerWrapper::ALL);
        assert_eq!(unknown, Schema::string());

        let header = ContainerWrapper::wrap_container("map", Schema::string(), &ContainerWrapper::HEADER);
        assert_eq!(header, Schema::string());
    }
}
