//! Type descriptor model.
//!
//! A [`TypeIdentity`] is the canonical, fully resolved identity of a type as seen in
//! Rust source: generics are part of the identity, lifetimes and const arguments are not.
//! Project-declared types carry a `crate::`-rooted path, external types keep the path as
//! it was written. Identities are compared structurally and are the deduplication key for
//! every schema emitted during a run.

use std::fmt;

/// Path prefix carried by every type declared inside the analyzed project.
pub const CRATE_ROOT: &str = "crate";

/// Canonical identity of a resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeIdentity {
    /// A language primitive (`i32`, `bool`, ...)
    Primitive(PrimitiveType),
    /// A fixed-size array or slice (`[T; N]`, `[T]`, `&[T]`)
    Array(Box<TypeIdentity>),
    /// A named type with its resolved type arguments
    Reference {
        /// `crate::`-rooted path for project types, written path otherwise
        path: String,
        /// Ordered type arguments
        args: Vec<TypeIdentity>,
    },
    /// An unbound generic parameter
    TypeVariable(String),
    /// A type whose concrete shape is unknown (`impl Trait`, `dyn Trait`, `_`)
    Wildcard,
    /// The unit type `()`, i.e. no value
    Unit,
}

/// Primitive types supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    Bool,
    Char,
}

/// Shape category of a [`TypeIdentity`], in walker dispatch order.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape<'a> {
    Primitive(PrimitiveType),
    Array(&'a TypeIdentity),
    /// `Option<T>`; `None` when the argument is missing
    Optional(Option<&'a TypeIdentity>),
    /// Smart pointers and cells that serialize as their content
    Transparent(Option<&'a TypeIdentity>),
    Collection(Option<&'a TypeIdentity>),
    /// Map types; carries the value type argument
    Map(Option<&'a TypeIdentity>),
    KnownScalar(ScalarFormat),
    /// Type variables, wildcards and unit
    Unknown,
    /// Anything that must be looked up in the declaration catalog
    Declared,
}

/// Schema type/format pair for well-known scalar reference types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarFormat {
    pub schema_type: &'static str,
    pub format: Option<&'static str>,
}

const TRANSPARENT: &[&str] = &["Box", "Arc", "Rc", "Cow", "RefCell", "Cell", "Mutex", "RwLock"];

const COLLECTIONS: &[&str] = &[
    "Vec",
    "VecDeque",
    "LinkedList",
    "HashSet",
    "BTreeSet",
    "IndexSet",
    "BinaryHeap",
];

const MAPS: &[&str] = &["HashMap", "BTreeMap", "IndexMap"];

impl TypeIdentity {
    /// Create a reference identity without type arguments
    pub fn named(path: impl Into<String>) -> Self {
        TypeIdentity::Reference {
            path: path.into(),
            args: Vec::new(),
        }
    }

    /// Create a reference identity with type arguments
    pub fn generic(path: impl Into<String>, args: Vec<TypeIdentity>) -> Self {
        TypeIdentity::Reference {
            path: path.into(),
            args,
        }
    }

    /// The path of a reference type, `None` for every other kind
    pub fn qualified_name(&self) -> Option<&str> {
        match self {
            TypeIdentity::Reference { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Last path segment of a reference type
    pub fn simple_name(&self) -> Option<&str> {
        self.qualified_name().map(last_segment)
    }

    pub fn type_arguments(&self) -> &[TypeIdentity] {
        match self {
            TypeIdentity::Reference { args, .. } => args,
            _ => &[],
        }
    }

    pub fn type_argument(&self, index: usize) -> Option<&TypeIdentity> {
        self.type_arguments().get(index)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeIdentity::Primitive(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeIdentity::Array(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, TypeIdentity::Reference { .. })
    }

    pub fn is_type_variable(&self) -> bool {
        matches!(self, TypeIdentity::TypeVariable(_))
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, TypeIdentity::Wildcard)
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, TypeIdentity::Unit)
    }

    /// Whether this type is declared inside the analyzed project
    pub fn is_project_type(&self) -> bool {
        self.qualified_name()
            .map(|path| path.starts_with("crate::"))
            .unwrap_or(false)
    }

    /// Canonical textual form, e.g. `crate::page::Page<crate::user::User>`
    pub fn describe(&self) -> String {
        self.to_string()
    }

    /// Classify this identity for schema lowering.
    ///
    /// Std and ecosystem shapes (options, pointers, collections, maps and well-known
    /// scalars) are only recognized on external paths, so a project type that happens to
    /// be called `Url` or `Vec` still resolves through its own declaration.
    pub fn shape(&self) -> TypeShape<'_> {
        match self {
            TypeIdentity::Primitive(primitive) => TypeShape::Primitive(*primitive),
            TypeIdentity::Array(inner) => TypeShape::Array(inner),
            TypeIdentity::TypeVariable(_) | TypeIdentity::Wildcard | TypeIdentity::Unit => {
                TypeShape::Unknown
            }
            TypeIdentity::Reference { path, args } => {
                if self.is_project_type() {
                    return TypeShape::Declared;
                }
                let name = last_segment(path);
                if name == "Option" {
                    TypeShape::Optional(args.first())
                } else if TRANSPARENT.contains(&name) {
                    // Cow<'a, T> only carries T once lifetimes are dropped
                    TypeShape::Transparent(args.last())
                } else if COLLECTIONS.contains(&name) {
                    TypeShape::Collection(args.first())
                } else if MAPS.contains(&name) {
                    TypeShape::Map(args.get(1))
                } else if let Some(format) = known_scalar(name) {
                    TypeShape::KnownScalar(format)
                } else {
                    TypeShape::Declared
                }
            }
        }
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeIdentity::Primitive(primitive) => write!(f, "{}", primitive.as_str()),
            TypeIdentity::Array(inner) => write!(f, "[{}]", inner),
            TypeIdentity::Reference { path, args } => {
                write!(f, "{}", path)?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (idx, arg) in args.iter().enumerate() {
                        if idx > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeIdentity::TypeVariable(name) => write!(f, "{}", name),
            TypeIdentity::Wildcard => write!(f, "_"),
            TypeIdentity::Unit => write!(f, "()"),
        }
    }
}

impl PrimitiveType {
    /// Parse a primitive type name
    pub fn parse(type_name: &str) -> Option<PrimitiveType> {
        match type_name {
            "i8" => Some(PrimitiveType::I8),
            "i16" => Some(PrimitiveType::I16),
            "i32" => Some(PrimitiveType::I32),
            "i64" => Some(PrimitiveType::I64),
            "i128" => Some(PrimitiveType::I128),
            "isize" => Some(PrimitiveType::Isize),
            "u8" => Some(PrimitiveType::U8),
            "u16" => Some(PrimitiveType::U16),
            "u32" => Some(PrimitiveType::U32),
            "u64" => Some(PrimitiveType::U64),
            "u128" => Some(PrimitiveType::U128),
            "usize" => Some(PrimitiveType::Usize),
            "f32" => Some(PrimitiveType::F32),
            "f64" => Some(PrimitiveType::F64),
            "bool" => Some(PrimitiveType::Bool),
            "char" => Some(PrimitiveType::Char),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::I8 => "i8",
            PrimitiveType::I16 => "i16",
            PrimitiveType::I32 => "i32",
            PrimitiveType::I64 => "i64",
            PrimitiveType::I128 => "i128",
            PrimitiveType::Isize => "isize",
            PrimitiveType::U8 => "u8",
            PrimitiveType::U16 => "u16",
            PrimitiveType::U32 => "u32",
            PrimitiveType::U64 => "u64",
            PrimitiveType::U128 => "u128",
            PrimitiveType::Usize => "usize",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Char => "char",
        }
    }

    /// OpenAPI type and format for this primitive
    pub fn schema_format(&self) -> ScalarFormat {
        let (schema_type, format) = match self {
            PrimitiveType::I8
            | PrimitiveType::I16
            | PrimitiveType::I32
            | PrimitiveType::U8
            | PrimitiveType::U16 => ("integer", Some("int32")),
            // u32 exceeds the int32 range
            PrimitiveType::U32
            | PrimitiveType::I64
            | PrimitiveType::I128
            | PrimitiveType::Isize
            | PrimitiveType::U64
            | PrimitiveType::U128
            | PrimitiveType::Usize => ("integer", Some("int64")),
            PrimitiveType::F32 => ("number", Some("float")),
            PrimitiveType::F64 => ("number", Some("double")),
            PrimitiveType::Bool => ("boolean", None),
            PrimitiveType::Char => ("string", None),
        };
        ScalarFormat {
            schema_type,
            format,
        }
    }
}

/// Table of well-known scalar reference types, keyed by simple name.
fn known_scalar(name: &str) -> Option<ScalarFormat> {
    let (schema_type, format) = match name {
        "String" | "str" | "PathBuf" | "Path" | "OsString" => ("string", None),
        "Uuid" => ("string", Some("uuid")),
        "NaiveDate" | "Date" => ("string", Some("date")),
        "DateTime" | "NaiveDateTime" | "OffsetDateTime" | "PrimitiveDateTime" | "SystemTime"
        | "Timestamp" => ("string", Some("date-time")),
        "Url" | "Uri" => ("string", Some("uri")),
        "IpAddr" | "Ipv4Addr" => ("string", Some("ipv4")),
        "Ipv6Addr" => ("string", Some("ipv6")),
        "Decimal" | "BigDecimal" => ("number", Some("double")),
        "NonZeroU8" | "NonZeroU16" | "NonZeroI8" | "NonZeroI16" | "NonZeroI32" => {
            ("integer", Some("int32"))
        }
        "NonZeroU32" | "NonZeroU64" | "NonZeroI64" | "NonZeroUsize" | "NonZeroIsize" => {
            ("integer", Some("int64"))
        }
        _ => return None,
    };
    Some(ScalarFormat {
        schema_type,
        format,
    })
}

/// Last `::`-separated segment of a path
pub fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// One declared field of a type, inherited (flattened) fields included.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// The type that declares the field; for flattened fields, the flattened type
    pub declaring_type: TypeIdentity,
    /// Field name as written in source
    pub name: String,
    /// Fully substituted field type
    pub ty: TypeIdentity,
    /// Fields that carry no instance data (`PhantomData` markers)
    pub is_static: bool,
}

/// Resolved declaration of a named type.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// A struct, or a data-carrying enum acting as a polymorphic base
    Object { fields: Vec<FieldDescriptor> },
    /// A fieldless enum; constants are serialized names in declaration order
    Enum { constants: Vec<String> },
    /// A newtype struct or type alias that serializes as the inner type
    Transparent(TypeIdentity),
}

/// A subtype attached to a polymorphic base type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtypeDeclaration {
    pub ty: TypeIdentity,
    /// Discriminator value selecting this subtype
    pub alias: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> TypeIdentity {
        TypeIdentity::named("crate::models::User")
    }

    #[test]
    fn test_describe_generic_reference() {
        let page = TypeIdentity::generic("crate::page::Page", vec![user()]);
        assert_eq!(page.describe(), "crate::page::Page<crate::models::User>");
        assert_eq!(page.simple_name(), Some("Page"));
        assert_eq!(page.type_argument(0), Some(&user()));
    }

    #[test]
    fn test_describe_array_and_primitive() {
        let ty = TypeIdentity::Array(Box::new(TypeIdentity::Primitive(PrimitiveType::U8)));
        assert_eq!(ty.describe(), "[u8]");
        assert!(ty.is_array());
        assert_eq!(TypeIdentity::Unit.describe(), "()");
    }

    #[test]
    fn test_structural_equality() {
        let a = TypeIdentity::generic("Vec", vec![user()]);
        let b = TypeIdentity::generic("Vec", vec![user()]);
        let c = TypeIdentity::generic("Vec", vec![TypeIdentity::named("crate::Order")]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_shape_of_std_types() {
        let option = TypeIdentity::generic("Option", vec![user()]);
        assert_eq!(option.shape(), TypeShape::Optional(Some(&user())));

        let map = TypeIdentity::generic(
            "std::collections::HashMap",
            vec![TypeIdentity::named("String"), user()],
        );
        assert_eq!(map.shape(), TypeShape::Map(Some(&user())));

        let set = TypeIdentity::generic("BTreeSet", vec![user()]);
        assert_eq!(set.shape(), TypeShape::Collection(Some(&user())));

        let boxed = TypeIdentity::generic("Box", vec![user()]);
        assert_eq!(boxed.shape(), TypeShape::Transparent(Some(&user())));
    }

    #[test]
    fn test_shape_of_known_scalars() {
        match TypeIdentity::named("uuid::Uuid").shape() {
            TypeShape::KnownScalar(format) => {
                assert_eq!(format.schema_type, "string");
                assert_eq!(format.format, Some("uuid"));
            }
            other => panic!("Expected known scalar, got {:?}", other),
        }
    }

    #[test]
    fn test_project_types_are_never_std_shapes() {
        assert_eq!(TypeIdentity::named("crate::net::Url").shape(), TypeShape::Declared);
        assert_eq!(TypeIdentity::named("crate::Vec").shape(), TypeShape::Declared);
        assert_eq!(TypeIdentity::named("external::Thing").shape(), TypeShape::Declared);
    }

    #[test]
    fn test_unknown_shapes() {
        assert_eq!(TypeIdentity::TypeVariable("T".into()).shape(), TypeShape::Unknown);
        assert_eq!(TypeIdentity::Wildcard.shape(), TypeShape::Unknown);
        assert_eq!(TypeIdentity::Unit.shape(), TypeShape::Unknown);
    }

    #[test]
    fn test_parse_primitive() {
        assert_eq!(PrimitiveType::parse("u64"), Some(PrimitiveType::U64));
        assert_eq!(PrimitiveType::parse("String"), None);
        assert_eq!(PrimitiveType::F32.schema_format().format, Some("float"));
    }

    #[test]
    fn test_unsigned_integer_formats() {
        assert_eq!(PrimitiveType::U8.schema_format().format, Some("int32"));
        assert_eq!(PrimitiveType::U16.schema_format().format, Some("int32"));
        assert_eq!(PrimitiveType::U32.schema_format().format, Some("int64"));
        assert_eq!(PrimitiveType::I32.schema_format().format, Some("int32"));
    }
}
