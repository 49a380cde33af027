//! C and C++ emission. Both dialects share the same declarations and
//! statement shapes; `TargetLanguage` only switches naming, the standard
//! library spelling and how failures are reported.

use crate::codegen::{CodegenError, TargetLanguage};
use cdr_types::{TypeArena, TypeId, TypeSpec};
use std::fmt;

/// Writes one indented line.
macro_rules! emit {
    ($e:expr, $($arg:tt)*) => {
        $e.line(format_args!($($arg)*))?
    };
}

/// Writes one indented line and indents everything after it.
macro_rules! open {
    ($e:expr, $($arg:tt)*) => {
        $e.open(format_args!($($arg)*))?
    };
}

pub mod asserts;
pub mod decls;
pub mod helpers;
pub mod hooks;
pub mod leaf;
pub mod structs;
pub mod unions;

pub use helpers::{emit_prelude, TypeNames};

pub struct Emitter<'a, 'w> {
    pub(crate) arena: &'a TypeArena,
    pub(crate) lang: TargetLanguage,
    out: &'w mut dyn fmt::Write,
    indent: usize,
    loop_depth: usize,
    type_name: String,
    member: String,
}

impl<'a, 'w> Emitter<'a, 'w> {
    pub fn new<W: fmt::Write>(arena: &'a TypeArena, lang: TargetLanguage, out: &'w mut W) -> Self {
        Self {
            arena,
            lang,
            out,
            indent: 0,
            loop_depth: 0,
            type_name: String::new(),
            member: String::new(),
        }
    }

    pub(crate) fn line(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        for _ in 0..self.indent {
            self.out.write_str("  ")?;
        }
        self.out.write_fmt(args)?;
        self.out.write_char('\n')
    }

    pub(crate) fn open(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        self.line(args)?;
        self.indent += 1;
        Ok(())
    }

    pub(crate) fn close(&mut self, text: &str) -> fmt::Result {
        self.indent = self.indent.saturating_sub(1);
        self.line(format_args!("{}", text))
    }

    pub(crate) fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub(crate) fn blank(&mut self) -> fmt::Result {
        self.out.write_char('\n')
    }

    /// Names the struct/union and member being emitted, for diagnostics.
    pub(crate) fn set_context(&mut self, type_name: &str, member: &str) {
        self.type_name = type_name.to_string();
        self.member = member.to_string();
    }

    pub(crate) fn spec(&self, id: TypeId) -> Result<&'a TypeSpec, CodegenError> {
        self.arena.get(id).ok_or_else(|| self.fault(format!("references unknown type {}", id)))
    }

    pub(crate) fn fault(&self, reason: String) -> CodegenError {
        tracing::error!(
            "internal consistency fault in '{}', member '{}': {}",
            self.type_name,
            self.member,
            reason
        );
        CodegenError::InternalConsistency {
            type_name: self.type_name.clone(),
            member: self.member.clone(),
            reason,
        }
    }

    /// Enters a counted loop and returns its depth, which suffixes the
    /// loop's variables (`i1`, `n1`, ...).
    pub(crate) fn push_loop(&mut self) -> usize {
        self.loop_depth += 1;
        self.loop_depth
    }

    pub(crate) fn pop_loop(&mut self) {
        self.loop_depth = self.loop_depth.saturating_sub(1);
    }

    /// Spells a `<string.h>` function for the target dialect.
    pub(crate) fn libc(&self, name: &str) -> String {
        match self.lang {
            TargetLanguage::C => name.to_string(),
            TargetLanguage::Cpp => format!("std::{}", name),
        }
    }

    pub(crate) fn null(&self) -> &'static str {
        match self.lang {
            TargetLanguage::C => "NULL",
            TargetLanguage::Cpp => "nullptr",
        }
    }

    /// Statement that aborts a decode routine.
    pub(crate) fn decode_failure(&self, reason: &str) -> String {
        match self.lang {
            TargetLanguage::C => "return -1;".to_string(),
            TargetLanguage::Cpp => format!(
                "throw std::runtime_error(\"{}: {}\");",
                self.type_name, reason
            ),
        }
    }

    /// `(type)expr` in C, `static_cast<type>(expr)` in C++.
    pub(crate) fn cast(&self, ty: &str, expr: &str) -> String {
        match self.lang {
            TargetLanguage::C => format!("({}){}", ty, expr),
            TargetLanguage::Cpp => format!("static_cast<{}>({})", ty, expr),
        }
    }
}
