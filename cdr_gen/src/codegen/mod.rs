pub mod c_gen;
pub mod generator;

use c_gen::{asserts, decls, hooks, structs, unions, Emitter};
use cdr_types::{ModelError, TypeArena, TypeId, TypeSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Direction of a generated conversion routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CdrFunc {
    /// Native value to wire bytes.
    Encode,
    /// Wire bytes to native value.
    Decode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLanguage {
    #[default]
    C,
    Cpp,
}

#[derive(Debug, Error)]
pub enum CodegenError {
    /// The output sink rejected a write.
    #[error("failed to write generated code: {0}")]
    Fmt(#[from] fmt::Error),

    /// The model handed to the generator breaks an invariant that the
    /// construction calls should have enforced.
    #[error("internal consistency fault in '{type_name}', member '{member}': {reason}")]
    InternalConsistency {
        type_name: String,
        member: String,
        reason: String,
    },

    /// Dependency ordering of the requested roots failed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Generator options could not be parsed.
    #[error("invalid generator options: {0}")]
    Options(#[from] serde_yml::Error),
}

fn lookup<'a>(arena: &'a TypeArena, id: TypeId) -> Result<&'a TypeSpec, CodegenError> {
    arena.get(id).ok_or_else(|| {
        tracing::error!("generation requested for unknown type {}", id);
        CodegenError::InternalConsistency {
            type_name: id.to_string(),
            member: String::new(),
            reason: "type id is not defined in the arena".to_string(),
        }
    })
}

/// Native declaration of a named type. Leaf types produce nothing: they are
/// declared inline by the struct or union that holds them.
pub fn emit_type_decl(
    arena: &TypeArena,
    id: TypeId,
    lang: TargetLanguage,
    out: &mut impl fmt::Write,
) -> Result<(), CodegenError> {
    let mut e = Emitter::new(arena, lang, out);
    match lookup(arena, id)? {
        TypeSpec::Enum(spec) => decls::emit_enum_decl(&mut e, spec),
        TypeSpec::Struct(spec) => decls::emit_struct_decl(&mut e, spec),
        TypeSpec::Union(spec) => decls::emit_union_decl(&mut e, spec),
        TypeSpec::Primitive(_)
        | TypeSpec::Array(_)
        | TypeSpec::String(_)
        | TypeSpec::Sequence(_) => Ok(()),
    }
}

/// Wire declaration of a struct or union.
pub fn emit_type_decl_wire(
    arena: &TypeArena,
    id: TypeId,
    lang: TargetLanguage,
    out: &mut impl fmt::Write,
) -> Result<(), CodegenError> {
    let mut e = Emitter::new(arena, lang, out);
    match lookup(arena, id)? {
        TypeSpec::Struct(spec) => decls::emit_struct_wire_decl(&mut e, id, spec),
        TypeSpec::Union(spec) => decls::emit_union_wire_decl(&mut e, spec),
        TypeSpec::Primitive(_)
        | TypeSpec::Enum(_)
        | TypeSpec::Array(_)
        | TypeSpec::String(_)
        | TypeSpec::Sequence(_) => Ok(()),
    }
}

/// Encode or decode routine of a struct or union.
///
/// For C this is a standalone `static inline` function. For C++ it is the
/// pair of static members (`toWireType`/`toBuffer` or
/// `fromWireType`/`fromBuffer`) that goes inside the type's
/// `Serialization` specialization; see [`emit_serialization`].
pub fn emit_functions(
    arena: &TypeArena,
    id: TypeId,
    lang: TargetLanguage,
    func: CdrFunc,
    out: &mut impl fmt::Write,
) -> Result<(), CodegenError> {
    let mut e = Emitter::new(arena, lang, out);
    match lookup(arena, id)? {
        TypeSpec::Struct(spec) => structs::emit_struct_function(&mut e, spec, func),
        TypeSpec::Union(spec) => unions::emit_union_function(&mut e, spec, func),
        TypeSpec::Primitive(_)
        | TypeSpec::Enum(_)
        | TypeSpec::Array(_)
        | TypeSpec::String(_)
        | TypeSpec::Sequence(_) => Ok(()),
    }
}

/// Both conversion directions of a struct or union. In C this is the
/// encode function followed by the decode function; in C++ the complete
/// `template<> struct Serialization<T>` specialization, to be placed inside
/// the namespace that declares the primary template.
pub fn emit_serialization(
    arena: &TypeArena,
    id: TypeId,
    lang: TargetLanguage,
    out: &mut impl fmt::Write,
) -> Result<(), CodegenError> {
    let mut e = Emitter::new(arena, lang, out);
    match lookup(arena, id)? {
        TypeSpec::Struct(spec) => structs::emit_struct_serialization(&mut e, spec),
        TypeSpec::Union(spec) => unions::emit_union_serialization(&mut e, spec),
        TypeSpec::Primitive(_)
        | TypeSpec::Enum(_)
        | TypeSpec::Array(_)
        | TypeSpec::String(_)
        | TypeSpec::Sequence(_) => Ok(()),
    }
}

/// Annotation validate hook of a struct or union.
pub fn emit_annotation_validate(
    arena: &TypeArena,
    id: TypeId,
    lang: TargetLanguage,
    out: &mut impl fmt::Write,
) -> Result<(), CodegenError> {
    let mut e = Emitter::new(arena, lang, out);
    match lookup(arena, id)? {
        TypeSpec::Struct(spec) => hooks::emit_struct_hook(&mut e, spec, hooks::Hook::Validate),
        TypeSpec::Union(spec) => hooks::emit_union_hook(&mut e, spec, hooks::Hook::Validate),
        TypeSpec::Primitive(_)
        | TypeSpec::Enum(_)
        | TypeSpec::Array(_)
        | TypeSpec::String(_)
        | TypeSpec::Sequence(_) => Ok(()),
    }
}

/// Annotation transform hook of a struct or union.
pub fn emit_annotation_transform(
    arena: &TypeArena,
    id: TypeId,
    lang: TargetLanguage,
    out: &mut impl fmt::Write,
) -> Result<(), CodegenError> {
    let mut e = Emitter::new(arena, lang, out);
    match lookup(arena, id)? {
        TypeSpec::Struct(spec) => hooks::emit_struct_hook(&mut e, spec, hooks::Hook::Transform),
        TypeSpec::Union(spec) => hooks::emit_union_hook(&mut e, spec, hooks::Hook::Transform),
        TypeSpec::Primitive(_)
        | TypeSpec::Enum(_)
        | TypeSpec::Array(_)
        | TypeSpec::String(_)
        | TypeSpec::Sequence(_) => Ok(()),
    }
}

/// Static size assertion of a packed, statically sized struct or union.
pub fn emit_asserts(
    arena: &TypeArena,
    id: TypeId,
    lang: TargetLanguage,
    out: &mut impl fmt::Write,
) -> Result<(), CodegenError> {
    let mut e = Emitter::new(arena, lang, out);
    match lookup(arena, id)? {
        TypeSpec::Struct(spec) => asserts::emit_struct_asserts(&mut e, id, spec),
        TypeSpec::Union(spec) => asserts::emit_union_asserts(&mut e, id, spec),
        TypeSpec::Primitive(_)
        | TypeSpec::Enum(_)
        | TypeSpec::Array(_)
        | TypeSpec::String(_)
        | TypeSpec::Sequence(_) => Ok(()),
    }
}
