use crate::arena::TypeId;
use crate::error::{ModelError, ModelResult};
use crate::structs::StructTypeSpec;
use crate::unions::UnionTypeSpec;
use indexmap::IndexSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Bool,
    Char,
    Octet,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
}

impl PrimitiveKind {
    pub fn bits(&self) -> Bits {
        match self {
            PrimitiveKind::Bool
            | PrimitiveKind::Char
            | PrimitiveKind::Octet
            | PrimitiveKind::Int8
            | PrimitiveKind::UInt8 => Bits::B8,
            PrimitiveKind::Int16 | PrimitiveKind::UInt16 => Bits::B16,
            PrimitiveKind::Int32 | PrimitiveKind::UInt32 | PrimitiveKind::Float => Bits::B32,
            PrimitiveKind::Int64 | PrimitiveKind::UInt64 | PrimitiveKind::Double => Bits::B64,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Octet
                | PrimitiveKind::Int8
                | PrimitiveKind::Int16
                | PrimitiveKind::Int32
                | PrimitiveKind::Int64
                | PrimitiveKind::UInt8
                | PrimitiveKind::UInt16
                | PrimitiveKind::UInt32
                | PrimitiveKind::UInt64
        )
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, PrimitiveKind::Float | PrimitiveKind::Double)
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int8 | PrimitiveKind::Int16 | PrimitiveKind::Int32 | PrimitiveKind::Int64
        )
    }

    /// Inclusive value range of an integer kind, as i128 so every kind fits.
    pub fn integer_range(&self) -> Option<(i128, i128)> {
        let range = match self {
            PrimitiveKind::Octet | PrimitiveKind::UInt8 => (0, u8::MAX as i128),
            PrimitiveKind::UInt16 => (0, u16::MAX as i128),
            PrimitiveKind::UInt32 => (0, u32::MAX as i128),
            PrimitiveKind::UInt64 => (0, u64::MAX as i128),
            PrimitiveKind::Int8 => (i8::MIN as i128, i8::MAX as i128),
            PrimitiveKind::Int16 => (i16::MIN as i128, i16::MAX as i128),
            PrimitiveKind::Int32 => (i32::MIN as i128, i32::MAX as i128),
            PrimitiveKind::Int64 => (i64::MIN as i128, i64::MAX as i128),
            _ => return None,
        };
        Some(range)
    }

    pub fn idl_name(&self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "boolean",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Octet => "octet",
            PrimitiveKind::Int8 => "int8",
            PrimitiveKind::Int16 => "int16",
            PrimitiveKind::Int32 => "int32",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::UInt8 => "uint8",
            PrimitiveKind::UInt16 => "uint16",
            PrimitiveKind::UInt32 => "uint32",
            PrimitiveKind::UInt64 => "uint64",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }
}

/// Declared bit width of a type. Composites report `Undefined`: their size
/// is computed from their members rather than declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bits {
    B8,
    B16,
    B32,
    B64,
    Undefined,
}

impl Bits {
    pub fn bytes(&self) -> Option<u64> {
        match self {
            Bits::B8 => Some(1),
            Bits::B16 => Some(2),
            Bits::B32 => Some(4),
            Bits::B64 => Some(8),
            Bits::Undefined => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
}

impl Literal {
    pub fn as_f64(&self) -> f64 {
        match self {
            Literal::Integer(v) => *v as f64,
            Literal::Float(v) => *v,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{:?}", v),
        }
    }
}

/// Per-declarator annotations driving the validate and transform hooks.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Range { min: Literal, max: Literal },
    Min(Literal),
    Max(Literal),
    Round,
}

impl Annotation {
    pub fn is_validation(&self) -> bool {
        !matches!(self, Annotation::Round)
    }

    /// Inclusive (min, max) bounds contributed by a validation annotation.
    pub fn bounds(&self) -> (Option<Literal>, Option<Literal>) {
        match self {
            Annotation::Range { min, max } => (Some(*min), Some(*max)),
            Annotation::Min(min) => (Some(*min), None),
            Annotation::Max(max) => (None, Some(*max)),
            Annotation::Round => (None, None),
        }
    }
}

/// A declared name with optional array extents, e.g. `vals[4]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    identifier: String,
    dimensions: Vec<u32>,
    annotations: Vec<Annotation>,
}

impl Declarator {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            dimensions: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn with_dimensions(mut self, dimensions: impl IntoIterator<Item = u32>) -> Self {
        self.dimensions.extend(dimensions);
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn dimensions(&self) -> &[u32] {
        &self.dimensions
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Number of elements covered by the declarator (1 for a scalar).
    pub fn element_count(&self) -> u64 {
        self.dimensions.iter().map(|d| *d as u64).product()
    }

    pub(crate) fn check(&self) -> ModelResult<()> {
        if self.dimensions.iter().any(|d| *d == 0) {
            return Err(ModelError::ZeroExtent {
                name: self.identifier.clone(),
            });
        }
        for annotation in &self.annotations {
            let (min, max) = annotation.bounds();
            for literal in min.iter().chain(max.iter()) {
                if let Literal::Float(v) = literal {
                    if !v.is_finite() {
                        return Err(ModelError::InvalidAnnotation {
                            declarator: self.identifier.clone(),
                            reason: format!("bound {} is not finite", v),
                        });
                    }
                }
            }
            if let (Some(min), Some(max)) = (min, max) {
                if min.as_f64() > max.as_f64() {
                    return Err(ModelError::InvalidAnnotation {
                        declarator: self.identifier.clone(),
                        reason: format!("min {} is greater than max {}", min, max),
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumTypeSpec {
    namespace_prefix: Option<String>,
    identifier: String,
    enumerators: IndexSet<String>,
}

impl EnumTypeSpec {
    pub fn new(namespace_prefix: Option<String>, identifier: impl Into<String>) -> Self {
        Self {
            namespace_prefix,
            identifier: identifier.into(),
            enumerators: IndexSet::new(),
        }
    }

    pub fn add_enumerator(&mut self, name: impl Into<String>) -> ModelResult<u32> {
        let name = name.into();
        if self.enumerators.contains(&name) {
            return Err(ModelError::DuplicateEnumerator {
                type_name: self.identifier.clone(),
                enumerator: name,
            });
        }
        let (index, _) = self.enumerators.insert_full(name);
        Ok(index as u32)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn namespace_prefix(&self) -> Option<&str> {
        self.namespace_prefix.as_deref()
    }

    pub fn enumerators(&self) -> impl Iterator<Item = &str> {
        self.enumerators.iter().map(String::as_str)
    }

    pub fn enumerator_count(&self) -> u32 {
        self.enumerators.len() as u32
    }

    pub fn ordinal(&self, name: &str) -> Option<u32> {
        self.enumerators.get_index_of(name).map(|i| i as u32)
    }

    pub fn enumerator(&self, ordinal: u32) -> Option<&str> {
        self.enumerators.get_index(ordinal as usize).map(String::as_str)
    }
}

/// Anonymous fixed-size array type (`int32[2][3]`).
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayTypeSpec {
    element: TypeId,
    dimensions: Vec<u32>,
}

impl ArrayTypeSpec {
    pub fn new(element: TypeId, dimensions: Vec<u32>) -> ModelResult<Self> {
        if dimensions.is_empty() || dimensions.iter().any(|d| *d == 0) {
            return Err(ModelError::ZeroExtent {
                name: format!("array of {}", element),
            });
        }
        Ok(Self {
            element,
            dimensions,
        })
    }

    pub fn element(&self) -> TypeId {
        self.element
    }

    pub fn dimensions(&self) -> &[u32] {
        &self.dimensions
    }
}

/// Bounded string; holds at most `bound` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringTypeSpec {
    bound: u32,
}

impl StringTypeSpec {
    pub fn new(bound: u32) -> ModelResult<Self> {
        if bound == 0 {
            return Err(ModelError::ZeroExtent {
                name: "string".to_string(),
            });
        }
        Ok(Self { bound })
    }

    pub fn bound(&self) -> u32 {
        self.bound
    }
}

/// Bounded sequence; holds between 0 and `bound` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceTypeSpec {
    element: TypeId,
    bound: u32,
}

impl SequenceTypeSpec {
    pub fn new(element: TypeId, bound: u32) -> ModelResult<Self> {
        if bound == 0 {
            return Err(ModelError::ZeroExtent {
                name: format!("sequence of {}", element),
            });
        }
        Ok(Self { element, bound })
    }

    pub fn element(&self) -> TypeId {
        self.element
    }

    pub fn bound(&self) -> u32 {
        self.bound
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpec {
    Primitive(PrimitiveKind),
    Enum(EnumTypeSpec),
    Array(ArrayTypeSpec),
    String(StringTypeSpec),
    Sequence(SequenceTypeSpec),
    Struct(StructTypeSpec),
    Union(UnionTypeSpec),
}

impl TypeSpec {
    pub fn bits(&self) -> Bits {
        match self {
            TypeSpec::Primitive(kind) => kind.bits(),
            TypeSpec::Enum(_) => Bits::B32,
            TypeSpec::Array(_)
            | TypeSpec::String(_)
            | TypeSpec::Sequence(_)
            | TypeSpec::Struct(_)
            | TypeSpec::Union(_) => Bits::Undefined,
        }
    }

    /// Containers get their own generated functions; everything else is
    /// emitted inline by the type that holds it.
    pub fn is_container(&self) -> bool {
        matches!(self, TypeSpec::Struct(_) | TypeSpec::Union(_))
    }

    pub fn identifier_name(&self) -> String {
        match self {
            TypeSpec::Primitive(kind) => kind.idl_name().to_string(),
            TypeSpec::Enum(e) => e.identifier().to_string(),
            TypeSpec::Array(a) => {
                let dims: String = a.dimensions().iter().map(|d| format!("[{}]", d)).collect();
                format!("array{}", dims)
            }
            TypeSpec::String(s) => format!("string<{}>", s.bound()),
            TypeSpec::Sequence(s) => format!("sequence<{}>", s.bound()),
            TypeSpec::Struct(s) => s.identifier().to_string(),
            TypeSpec::Union(u) => u.identifier().to_string(),
        }
    }

    pub fn namespace_prefix(&self) -> Option<&str> {
        match self {
            TypeSpec::Enum(e) => e.namespace_prefix(),
            TypeSpec::Struct(s) => s.namespace_prefix(),
            TypeSpec::Union(u) => u.namespace_prefix(),
            _ => None,
        }
    }

    /// `a::b::Name` for named types, the bare identifier otherwise.
    pub fn qualified_name(&self) -> String {
        match self.namespace_prefix() {
            Some(ns) if !ns.is_empty() => format!("{}::{}", ns, self.identifier_name()),
            _ => self.identifier_name(),
        }
    }

    /// Type ids this type refers to, in declaration order.
    pub fn references(&self) -> Vec<TypeId> {
        match self {
            TypeSpec::Primitive(_) | TypeSpec::Enum(_) | TypeSpec::String(_) => Vec::new(),
            TypeSpec::Array(a) => vec![a.element()],
            TypeSpec::Sequence(s) => vec![s.element()],
            TypeSpec::Struct(s) => s.members().iter().map(|m| m.type_id()).collect(),
            TypeSpec::Union(u) => std::iter::once(u.switch_type())
                .chain(u.members().iter().map(|m| m.type_id()))
                .collect(),
        }
    }
}
