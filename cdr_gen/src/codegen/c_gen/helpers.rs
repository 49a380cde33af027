use crate::codegen::TargetLanguage;
use cdr_types::{PrimitiveKind, TypeSpec};
use std::fmt::Write;

const C_KEYWORDS: &[&str] = &[
    // C keywords
    "auto",
    "break",
    "case",
    "char",
    "const",
    "continue",
    "default",
    "do",
    "double",
    "else",
    "enum",
    "extern",
    "float",
    "for",
    "goto",
    "if",
    "inline",
    "int",
    "long",
    "register",
    "restrict",
    "return",
    "short",
    "signed",
    "sizeof",
    "static",
    "struct",
    "switch",
    "typedef",
    "union",
    "unsigned",
    "void",
    "volatile",
    "while",
    // C99/C11 keywords
    "_Alignas",
    "_Alignof",
    "_Atomic",
    "_Bool",
    "_Complex",
    "_Generic",
    "_Imaginary",
    "_Noreturn",
    "_Static_assert",
    "_Thread_local",
    // Common reserved identifiers
    "bool",
    "true",
    "false",
    "complex",
    "imaginary",
    // Commonly used types that might conflict
    "size_t",
    "ssize_t",
    "ptrdiff_t",
    "wchar_t",
    "NULL",
];

/* Words reserved only when the header is compiled as C++ */
const CPP_KEYWORDS: &[&str] = &[
    "class",
    "delete",
    "explicit",
    "friend",
    "mutable",
    "namespace",
    "new",
    "operator",
    "private",
    "protected",
    "public",
    "template",
    "this",
    "throw",
    "try",
    "catch",
    "typename",
    "using",
    "virtual",
    "alignas",
    "alignof",
    "constexpr",
    "decltype",
    "noexcept",
    "nullptr",
    "static_assert",
    "thread_local",
];

fn sanitize(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        sanitized.push('_');
    }

    if sanitized
        .chars()
        .next()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false)
    {
        sanitized.insert(0, '_');
    }

    sanitized
}

pub fn escape_c_keyword(name: &str) -> String {
    escape_keyword(name, TargetLanguage::C)
}

/// Maps `name` to a valid identifier for `lang`, appending `_` to reserved
/// words.
pub fn escape_keyword(name: &str, lang: TargetLanguage) -> String {
    let mut sanitized = sanitize(name);
    let reserved = match lang {
        TargetLanguage::C => C_KEYWORDS.contains(&sanitized.as_str()),
        TargetLanguage::Cpp => {
            C_KEYWORDS.contains(&sanitized.as_str()) || CPP_KEYWORDS.contains(&sanitized.as_str())
        }
    };
    if reserved {
        sanitized.push('_');
    }
    sanitized
}

/// Generated names of an enum, struct or union.
///
/// C flattens the namespace into the identifier (`a::b::X` becomes
/// `a_b_X_t`); C++ keeps real namespaces and refers to types by their fully
/// qualified name (`::a::b::X`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNames {
    namespace: Vec<String>,
    identifier: String,
}

impl TypeNames {
    pub fn new(namespace_prefix: Option<&str>, identifier: &str) -> Self {
        let namespace = namespace_prefix
            .map(|ns| {
                ns.split("::")
                    .filter(|part| !part.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            namespace,
            identifier: identifier.to_string(),
        }
    }

    fn cpp_identifier(&self) -> String {
        escape_keyword(&self.identifier, TargetLanguage::Cpp)
    }

    pub fn of(spec: &TypeSpec) -> Option<Self> {
        match spec {
            TypeSpec::Enum(e) => Some(Self::new(e.namespace_prefix(), e.identifier())),
            TypeSpec::Struct(s) => Some(Self::new(s.namespace_prefix(), s.identifier())),
            TypeSpec::Union(u) => Some(Self::new(u.namespace_prefix(), u.identifier())),
            _ => None,
        }
    }

    /// `a_b_X`
    pub fn c_base(&self) -> String {
        let mut base = String::new();
        for part in &self.namespace {
            base.push_str(&escape_c_keyword(part));
            base.push('_');
        }
        base.push_str(&escape_c_keyword(&self.identifier));
        base
    }

    /// `a::b`, if the type is namespaced.
    pub fn namespace(&self) -> Option<String> {
        if self.namespace.is_empty() {
            None
        } else {
            let parts: Vec<String> = self
                .namespace
                .iter()
                .map(|part| escape_keyword(part, TargetLanguage::Cpp))
                .collect();
            Some(parts.join("::"))
        }
    }

    fn qualify(&self, name: &str) -> String {
        let mut qualified = String::new();
        for part in &self.namespace {
            qualified.push_str("::");
            qualified.push_str(&escape_keyword(part, TargetLanguage::Cpp));
        }
        qualified.push_str("::");
        qualified.push_str(name);
        qualified
    }

    /// Name under which other types refer to the native type.
    pub fn native(&self, lang: TargetLanguage) -> String {
        match lang {
            TargetLanguage::C => format!("{}_t", self.c_base()),
            TargetLanguage::Cpp => self.qualify(&self.cpp_identifier()),
        }
    }

    /// Name under which other types refer to the wire type.
    pub fn wire(&self, lang: TargetLanguage) -> String {
        match lang {
            TargetLanguage::C => format!("{}_wire_t", self.c_base()),
            TargetLanguage::Cpp => self.qualify(&format!("{}_wire", self.cpp_identifier())),
        }
    }

    /// Tag used in the defining declaration of the native type.
    pub fn local(&self, lang: TargetLanguage) -> String {
        match lang {
            TargetLanguage::C => self.c_base(),
            TargetLanguage::Cpp => self.cpp_identifier(),
        }
    }

    /// Tag used in the defining declaration of the wire type.
    pub fn local_wire(&self, lang: TargetLanguage) -> String {
        format!("{}_wire", self.local(lang))
    }

    /// Name of a per-type function as seen from anywhere in the header.
    pub fn function(&self, prefix: &str, lang: TargetLanguage) -> String {
        match lang {
            TargetLanguage::C => format!("{}_{}", prefix, self.c_base()),
            TargetLanguage::Cpp => {
                self.qualify(&format!("{}_{}", prefix, self.cpp_identifier()))
            }
        }
    }

    /// Name of a per-type function at its definition.
    pub fn local_function(&self, prefix: &str, lang: TargetLanguage) -> String {
        match lang {
            TargetLanguage::C => format!("{}_{}", prefix, self.c_base()),
            TargetLanguage::Cpp => format!("{}_{}", prefix, self.cpp_identifier()),
        }
    }

    /// C enumeration constant, e.g. `A_B_COLOR_RED`.
    pub fn enumerator_constant(&self, enumerator: &str) -> String {
        format!(
            "{}_{}",
            self.c_base().to_ascii_uppercase(),
            escape_c_keyword(enumerator).to_ascii_uppercase()
        )
    }
}

pub fn primitive_to_c_type(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Bool => "bool",
        PrimitiveKind::Char => "char",
        PrimitiveKind::Octet => "uint8_t",
        PrimitiveKind::Int8 => "int8_t",
        PrimitiveKind::Int16 => "int16_t",
        PrimitiveKind::Int32 => "int32_t",
        PrimitiveKind::Int64 => "int64_t",
        PrimitiveKind::UInt8 => "uint8_t",
        PrimitiveKind::UInt16 => "uint16_t",
        PrimitiveKind::UInt32 => "uint32_t",
        PrimitiveKind::UInt64 => "uint64_t",
        PrimitiveKind::Float => "float",
        PrimitiveKind::Double => "double",
    }
}

/* Unsigned carrier used to byte swap a value of the given width */
pub fn carrier_type(bytes: u64) -> &'static str {
    match bytes {
        2 => "uint16_t",
        4 => "uint32_t",
        8 => "uint64_t",
        _ => "uint8_t",
    }
}

/* Signed integer literal valid in both dialects */
pub fn c_int_literal(value: i64) -> String {
    if value == i64::MIN {
        "(-9223372036854775807LL - 1)".to_string()
    } else if i32::try_from(value).is_ok() {
        value.to_string()
    } else {
        format!("{}LL", value)
    }
}

/* Literal of a value already known to fit `kind` */
pub fn c_literal_for(kind: PrimitiveKind, value: i64) -> String {
    if kind.is_signed() || value < 0 {
        return c_int_literal(value);
    }
    match kind {
        PrimitiveKind::UInt64 => format!("{}ull", value),
        _ if kind.is_integer() => format!("{}u", value),
        _ => c_int_literal(value),
    }
}

pub fn c_float_literal(value: f64) -> String {
    format!("{:?}", value)
}

pub fn array_suffix(dimensions: &[u32]) -> String {
    let mut suffix = String::new();
    for d in dimensions {
        write!(suffix, "[{}]", d).ok();
    }
    suffix
}

const BYTE_ORDER_HELPERS: &str = "/* Byte order helpers: multi-byte wire values are big-endian */\n\
#ifndef CDR_BYTE_ORDER_HELPERS\n\
#define CDR_BYTE_ORDER_HELPERS\n\
#if defined(__BYTE_ORDER__) && __BYTE_ORDER__ == __ORDER_LITTLE_ENDIAN__\n\
static inline uint16_t cdr_to_be16(uint16_t v) { return __builtin_bswap16(v); }\n\
static inline uint32_t cdr_to_be32(uint32_t v) { return __builtin_bswap32(v); }\n\
static inline uint64_t cdr_to_be64(uint64_t v) { return __builtin_bswap64(v); }\n\
#else\n\
static inline uint16_t cdr_to_be16(uint16_t v) { return v; }\n\
static inline uint32_t cdr_to_be32(uint32_t v) { return v; }\n\
static inline uint64_t cdr_to_be64(uint64_t v) { return v; }\n\
#endif\n\
static inline uint16_t cdr_from_be16(uint16_t v) { return cdr_to_be16(v); }\n\
static inline uint32_t cdr_from_be32(uint32_t v) { return cdr_to_be32(v); }\n\
static inline uint64_t cdr_from_be64(uint64_t v) { return cdr_to_be64(v); }\n\
#endif\n";

const C_INCLUDES: &str = "#include <math.h>\n\
#include <stdbool.h>\n\
#include <stddef.h>\n\
#include <stdint.h>\n\
#include <string.h>\n";

const CPP_INCLUDES: &str = "#include <cmath>\n\
#include <cstddef>\n\
#include <cstdint>\n\
#include <cstring>\n\
#include <stdexcept>\n\
#include <vector>\n";

/// Header prologue: include guard, includes, byte order helpers and, for
/// C++, the primary `Serialization` template.
pub fn emit_prelude(
    out: &mut impl Write,
    lang: TargetLanguage,
    include_guard: Option<&str>,
    serialization_namespace: &str,
) -> std::fmt::Result {
    match include_guard {
        Some(guard) => {
            writeln!(out, "#ifndef {}", guard)?;
            writeln!(out, "#define {}", guard)?;
        }
        None => writeln!(out, "#pragma once")?,
    }
    writeln!(out)?;
    match lang {
        TargetLanguage::C => out.write_str(C_INCLUDES)?,
        TargetLanguage::Cpp => out.write_str(CPP_INCLUDES)?,
    }
    writeln!(out)?;
    out.write_str(BYTE_ORDER_HELPERS)?;
    if lang == TargetLanguage::Cpp {
        writeln!(out)?;
        writeln!(out, "namespace {} {{", serialization_namespace)?;
        writeln!(out, "template<typename T>")?;
        writeln!(out, "struct Serialization;")?;
        writeln!(out, "}}  // namespace {}", serialization_namespace)?;
    }
    writeln!(out)
}
