//! CDR code generation.
//!
//! Emits native declarations, wire declarations, encode/decode routines,
//! annotation hooks and packed size assertions for the types of a
//! `cdr_types::TypeArena`, in C or C++.

pub mod codegen;

pub use codegen::generator::{CodeGenerator, CodeGeneratorOptions};
pub use codegen::{
    emit_annotation_transform, emit_annotation_validate, emit_asserts, emit_functions,
    emit_serialization, emit_type_decl, emit_type_decl_wire, CdrFunc, CodegenError, TargetLanguage,
};
