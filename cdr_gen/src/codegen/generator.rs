use super::c_gen::emit_prelude;
use super::{
    emit_annotation_transform, emit_annotation_validate, emit_asserts, emit_serialization,
    emit_type_decl, emit_type_decl_wire, CodegenError, TargetLanguage,
};
use cdr_types::{TypeArena, TypeId, TypeSpec};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::{debug, info};

/// Which artifacts a header contains and how it is wrapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CodeGeneratorOptions {
    pub language: TargetLanguage,
    pub emit_type_definitions: bool,
    pub emit_functions: bool,
    pub emit_annotations: bool,
    pub emit_asserts: bool,
    /// `#ifndef` guard macro; `#pragma once` when unset.
    pub include_guard: Option<String>,
    /// Namespace holding the C++ `Serialization` template.
    pub cpp_serialization_namespace: String,
}

impl Default for CodeGeneratorOptions {
    fn default() -> Self {
        Self {
            language: TargetLanguage::C,
            emit_type_definitions: true,
            emit_functions: true,
            emit_annotations: true,
            emit_asserts: true,
            include_guard: None,
            cpp_serialization_namespace: "cdr".to_string(),
        }
    }
}

impl CodeGeneratorOptions {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CodegenError> {
        let options: Self = serde_yml::from_str(yaml)?;
        Ok(options)
    }
}

pub struct CodeGenerator<'a> {
    arena: &'a TypeArena,
    options: CodeGeneratorOptions,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(arena: &'a TypeArena, options: CodeGeneratorOptions) -> Self {
        Self { arena, options }
    }

    pub fn options(&self) -> &CodeGeneratorOptions {
        &self.options
    }

    /// One header covering `roots` and everything they reference, each type
    /// emitted after its dependencies.
    pub fn emit(&self, roots: &[TypeId]) -> Result<String, CodegenError> {
        let roots: Vec<TypeId> = roots
            .iter()
            .copied()
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();
        let order = self.arena.topo_order(&roots)?;
        let lang = self.options.language;

        let mut out = String::new();
        emit_prelude(
            &mut out,
            lang,
            self.options.include_guard.as_deref(),
            &self.options.cpp_serialization_namespace,
        )?;

        let mut emitted = 0usize;
        for id in order {
            let Some(spec) = self.arena.get(id) else {
                continue;
            };
            let composite = match spec {
                TypeSpec::Struct(_) | TypeSpec::Union(_) => true,
                TypeSpec::Enum(_) => false,
                TypeSpec::Primitive(_)
                | TypeSpec::Array(_)
                | TypeSpec::String(_)
                | TypeSpec::Sequence(_) => continue,
            };
            debug!("emitting artifacts for '{}'", spec.qualified_name());
            writeln!(out, "/* ----- {} ----- */", spec.qualified_name())?;
            writeln!(out)?;

            if self.options.emit_type_definitions {
                emit_type_decl(self.arena, id, lang, &mut out)?;
                emit_type_decl_wire(self.arena, id, lang, &mut out)?;
                if self.options.emit_asserts {
                    emit_asserts(self.arena, id, lang, &mut out)?;
                }
            }
            if composite && self.options.emit_functions {
                self.emit_serialization_for(id, &mut out)?;
            }
            if composite && self.options.emit_annotations {
                emit_annotation_validate(self.arena, id, lang, &mut out)?;
                emit_annotation_transform(self.arena, id, lang, &mut out)?;
            }
            emitted += 1;
        }

        if self.options.include_guard.is_some() {
            writeln!(out, "#endif")?;
        }
        info!("generated {} types for {} roots", emitted, roots.len());
        Ok(out)
    }

    /* C++ specializations have to live in the namespace of the primary template */
    fn emit_serialization_for(&self, id: TypeId, out: &mut String) -> Result<(), CodegenError> {
        let lang = self.options.language;
        match lang {
            TargetLanguage::C => emit_serialization(self.arena, id, lang, out),
            TargetLanguage::Cpp => {
                let ns = &self.options.cpp_serialization_namespace;
                writeln!(out, "namespace {} {{", ns)?;
                writeln!(out)?;
                emit_serialization(self.arena, id, lang, out)?;
                writeln!(out, "}}  // namespace {}", ns)?;
                writeln!(out)?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_yaml() {
        let options = CodeGeneratorOptions::from_yaml_str(
            "language: cpp\nemit-asserts: false\ninclude-guard: POINT_H\n",
        )
        .unwrap();
        assert_eq!(options.language, TargetLanguage::Cpp);
        assert!(!options.emit_asserts);
        assert!(options.emit_functions);
        assert_eq!(options.include_guard.as_deref(), Some("POINT_H"));
        assert_eq!(options.cpp_serialization_namespace, "cdr");
    }

    #[test]
    fn test_options_reject_unknown_language() {
        let err = CodeGeneratorOptions::from_yaml_str("language: fortran\n").unwrap_err();
        assert!(matches!(err, CodegenError::Options(_)));
    }

    #[test]
    fn test_empty_roots_emit_prelude_only() {
        let arena = TypeArena::new();
        let generator = CodeGenerator::new(&arena, CodeGeneratorOptions::default());
        let header = generator.emit(&[]).unwrap();
        assert!(header.starts_with("#pragma once\n"));
        assert!(!header.contains("/* -----"));
    }
}
