//! Type names as they appear in route tables and controller manifests.
//!
//! Route compilers and annotation descriptors refer to types by name only
//! (`Long`, `List[Pet]`, `Option<String>`, `models.Pet`, `int[]`). [`TypeRef`]
//! parses those names into a small tree so the converter can classify them as
//! primitives, containers or named models.

use crate::error::{Error, Result};
use std::fmt;

/// A parsed type name with its generic arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// Name as written, possibly package-qualified (`models.Pet`, `crate::Pet`)
    pub name: String,
    /// Generic arguments, in order
    pub args: Vec<TypeRef>,
}

/// Primitive types with a direct Swagger `type`/`format` mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Byte,
    Int32,
    Int64,
    Float,
    Double,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Uuid,
    Object,
}

/// Collection-like wrappers recognized by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// Ordered sequence, rendered as `array`
    Array,
    /// Unique items, rendered as `array` with `uniqueItems`
    Set,
    /// String-keyed map, rendered as `object` with `additionalProperties`
    Map,
    /// Optional value, rendered as its inner type
    Optional,
    /// Deferred or boxed value (`Promise`, `Future`, `Box`), rendered as its inner type
    Transparent,
}

impl TypeRef {
    /// Create a non-generic type reference
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Create a generic type reference
    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Parse a type name such as `List[Pet]`, `Map<String, Long>` or `Pet[]`.
    ///
    /// Both Scala-style `[...]` and Java/Rust-style `<...>` argument lists are
    /// accepted; a trailing `[]` wraps the type in an `Array`.
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = TypeParser { input, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != input.len() {
            return Err(Error::invalid_type(
                input,
                format!("unexpected `{}`", &input[parser.pos..]),
            ));
        }
        Ok(ty)
    }

    /// The unqualified name, without package path or companion marker
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    /// Whether this names the absence of a value
    pub fn is_void(&self) -> bool {
        matches!(self.simple_name(), "void" | "Void" | "Unit" | "()" | "")
    }

    pub fn primitive(&self) -> Option<Primitive> {
        primitive(self.simple_name())
    }

    pub fn container(&self) -> Option<Container> {
        container(self.simple_name())
    }

    /// Whether a value of this type may be absent
    pub fn is_optional(&self) -> bool {
        self.container() == Some(Container::Optional)
    }

    /// The type with optional and transparent wrappers removed
    pub fn unwrapped(&self) -> &TypeRef {
        match (self.container(), self.args.first()) {
            (Some(Container::Optional | Container::Transparent), Some(inner)) => inner.unwrapped(),
            _ => self,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "[")?;
            for (idx, arg) in self.args.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

/// The unqualified part of a possibly qualified type name
pub fn simple_name(name: &str) -> &str {
    let name = name.trim();
    name.rsplit(|c: char| c == '.' || c == ':')
        .next()
        .unwrap_or(name)
        .trim_end_matches('$')
}

/// Classify a simple type name as a primitive
pub fn primitive(simple: &str) -> Option<Primitive> {
    let primitive = match simple {
        "String" | "string" | "str" | "char" | "Char" | "Character" => Primitive::String,
        "byte" | "Byte" => Primitive::Byte,
        "int" | "Int" | "Integer" | "integer" | "short" | "Short" | "i8" | "i16" | "i32"
        | "u8" | "u16" | "u32" => Primitive::Int32,
        "long" | "Long" | "BigInteger" | "i64" | "i128" | "u64" | "u128" | "isize"
        | "usize" => Primitive::Int64,
        "float" | "Float" | "f32" => Primitive::Float,
        "double" | "Double" | "f64" => Primitive::Double,
        "BigDecimal" | "Decimal" | "number" => Primitive::Decimal,
        "boolean" | "Boolean" | "bool" => Primitive::Boolean,
        "LocalDate" | "NaiveDate" => Primitive::Date,
        "Date" | "DateTime" | "LocalDateTime" | "NaiveDateTime" | "Instant"
        | "OffsetDateTime" | "ZonedDateTime" => Primitive::DateTime,
        "UUID" | "Uuid" => Primitive::Uuid,
        "Object" | "JsonNode" | "JsValue" | "Value" => Primitive::Object,
        _ => return None,
    };
    Some(primitive)
}

/// Classify a simple type name as a container
pub fn container(simple: &str) -> Option<Container> {
    let container = match simple {
        "List" | "Seq" | "Vec" | "VecDeque" | "ArrayList" | "LinkedList" | "Array"
        | "Iterable" | "Collection" | "IndexedSeq" | "Buffer" => Container::Array,
        "Set" | "HashSet" | "BTreeSet" | "TreeSet" | "LinkedHashSet" => Container::Set,
        "Map" | "HashMap" | "BTreeMap" | "TreeMap" | "LinkedHashMap" => Container::Map,
        "Option" | "Optional" => Container::Optional,
        "Promise" | "CompletionStage" | "CompletableFuture" | "Future" | "Box" | "Rc"
        | "Arc" => Container::Transparent,
        _ => return None,
    };
    Some(container)
}

struct TypeParser<'a> {
    input: &'a str,
    pos: usize,
}

impl TypeParser<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    /// Consume `[]` if it follows, allowing whitespace inside
    fn eat_array_marker(&mut self) -> bool {
        let rest = &self.input[self.pos..];
        let trimmed = rest.trim_start();
        if let Some(after) = trimmed.strip_prefix('[') {
            let inner = after.trim_start();
            if inner.starts_with(']') {
                self.pos = self.input.len() - inner.len() + 1;
                return true;
            }
        }
        false
    }

    fn parse_type(&mut self) -> Result<TypeRef> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '.' | ':' | '$') {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        let name = &self.input[start..self.pos];
        let mut ty = if name.is_empty() {
            // `()` is the only name made of punctuation
            if self.input[self.pos..].starts_with("()") {
                self.pos += 2;
                TypeRef::new("()")
            } else {
                return Err(Error::invalid_type(
                    self.input,
                    format!("expected a type name at offset {}", self.pos),
                ));
            }
        } else {
            TypeRef::new(name)
        };

        if self.eat_array_marker() {
            ty = TypeRef::generic("Array", vec![ty]);
        } else {
            self.skip_ws();
            let close = match self.peek() {
                Some('<') => Some('>'),
                Some('[') => Some(']'),
                _ => None,
            };
            if let Some(close) = close {
                self.pos += 1;
                loop {
                    ty.args.push(self.parse_type()?);
                    self.skip_ws();
                    match self.peek() {
                        Some(',') => self.pos += 1,
                        Some(c) if c == close => {
                            self.pos += 1;
                            break;
                        }
                        _ => {
                            return Err(Error::invalid_type(
                                self.input,
                                format!("expected `,` or `{}` at offset {}", close, self.pos),
                            ))
                        }
                    }
                }
            }
        }

        while self.eat_array_marker() {
            ty = TypeRef::generic("Array", vec![ty]);
        }
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_name() {
        let ty = TypeRef::parse("Long").unwrap();
        assert_eq!(ty, TypeRef::new("Long"));
        assert_eq!(ty.primitive(), Some(Primitive::Int64));
    }

    #[test]
    fn test_parse_scala_generics() {
        let ty = TypeRef::parse("Map[String, List[models.Pet]]").unwrap();
        assert_eq!(ty.name, "Map");
        assert_eq!(ty.args.len(), 2);
        assert_eq!(ty.args[1].name, "List");
        assert_eq!(ty.args[1].args[0].simple_name(), "Pet");
    }

    #[test]
    fn test_parse_rust_generics() {
        let ty = TypeRef::parse("Option<Vec<u64>>").unwrap();
        assert!(ty.is_optional());
        assert_eq!(ty.args[0].container(), Some(Container::Array));
        assert_eq!(ty.args[0].args[0].primitive(), Some(Primitive::Int64));
    }

    #[test]
    fn test_parse_java_array() {
        let ty = TypeRef::parse("int[][]").unwrap();
        assert_eq!(ty.name, "Array");
        assert_eq!(ty.args[0].name, "Array");
        assert_eq!(ty.args[0].args[0].name, "int");
    }

    #[test]
    fn test_parse_unit() {
        assert!(TypeRef::parse("()").unwrap().is_void());
        assert!(TypeRef::parse("void").unwrap().is_void());
    }

    #[test]
    fn test_parse_rejects_unbalanced() {
        assert!(TypeRef::parse("List[Pet").is_err());
        assert!(TypeRef::parse("List[Pet]]").is_err());
        assert!(TypeRef::parse("").is_err());
    }

    #[test]
    fn test_simple_name_strips_qualifiers() {
        assert_eq!(simple_name("controllers.PetApi$"), "PetApi");
        assert_eq!(simple_name("crate::models::Pet"), "Pet");
        assert_eq!(simple_name("Pet"), "Pet");
    }

    #[test]
    fn test_unwrapped_removes_optional_and_async() {
        let ty = TypeRef::parse("Promise[Option[Pet]]").unwrap();
        assert_eq!(ty.unwrapped().name, "Pet");
    }

    #[test]
    fn test_display_round_trip_shape() {
        let ty = TypeRef::parse("Map<String,Pet>").unwrap();
        assert_eq!(ty.to_string(), "Map[String, Pet]");
    }
}
