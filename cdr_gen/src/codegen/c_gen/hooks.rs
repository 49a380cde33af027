//! Annotation hooks.
//!
//! `validate` checks the `range`/`min`/`max` annotations of numeric
//! declarators and reports the first violation; `transform` applies
//! `round` to floating point declarators in place. Both recurse into
//! nested structs and unions through their own generated hooks, and only
//! touch the active member of a union.

use super::decls::names_of;
use super::helpers::{c_float_literal, c_int_literal, c_literal_for, escape_keyword, TypeNames};
use super::unions::{emit_fallback, open_case, switch_selector};
use super::Emitter;
use crate::codegen::{CodegenError, TargetLanguage};
use cdr_types::{
    Annotation, Literal, PrimitiveKind, StructTypeSpec, TypeArena, TypeId, TypeSpec, UnionTypeSpec,
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Validate,
    Transform,
}

impl Hook {
    fn prefix(&self) -> &'static str {
        match self {
            Hook::Validate => "validate",
            Hook::Transform => "transform",
        }
    }
}

/// True when applying `hook` to a value of `id` carrying `annotations`
/// produces any code.
pub fn has_hook(arena: &TypeArena, id: TypeId, annotations: &[Annotation], hook: Hook) -> bool {
    match arena.get(id) {
        Some(TypeSpec::Primitive(kind)) => match hook {
            Hook::Validate => {
                (kind.is_integer() || kind.is_floating_point())
                    && annotations.iter().any(Annotation::is_validation)
            }
            Hook::Transform => {
                kind.is_floating_point() && annotations.iter().any(|a| *a == Annotation::Round)
            }
        },
        Some(TypeSpec::Array(a)) => has_hook(arena, a.element(), annotations, hook),
        Some(TypeSpec::Sequence(s)) => has_hook(arena, s.element(), annotations, hook),
        Some(TypeSpec::Struct(s)) => s
            .declarators()
            .any(|(m, d)| has_hook(arena, m.type_id(), d.annotations(), hook)),
        Some(TypeSpec::Union(u)) => u
            .members()
            .iter()
            .any(|m| has_hook(arena, m.type_id(), m.declarator().annotations(), hook)),
        Some(TypeSpec::Enum(_)) | Some(TypeSpec::String(_)) | None => false,
    }
}

fn failure(e: &Emitter) -> &'static str {
    match e.lang {
        TargetLanguage::C => "return -1;",
        TargetLanguage::Cpp => "return false;",
    }
}

fn literal(value: &Literal) -> String {
    match value {
        Literal::Integer(v) => c_int_literal(*v),
        Literal::Float(v) => c_float_literal(*v),
    }
}

/* Comparisons that can never fail for the declared type are dropped */
fn emit_bounds(
    e: &mut Emitter,
    kind: PrimitiveKind,
    annotation: &Annotation,
    expr: &str,
) -> Result<(), CodegenError> {
    let (min, max) = annotation.bounds();
    let fail = failure(e);
    if kind.is_floating_point() {
        /* Written as negated inclusive checks so NaN is rejected */
        let condition = match (min, max) {
            (Some(lo), Some(hi)) => format!(
                "!({expr} >= {} && {expr} <= {})",
                literal(&lo),
                literal(&hi)
            ),
            (Some(lo), None) => format!("!({expr} >= {})", literal(&lo)),
            (None, Some(hi)) => format!("!({expr} <= {})", literal(&hi)),
            (None, None) => return Ok(()),
        };
        emit!(e, "if ({condition}) {fail}");
        return Ok(());
    }

    let Some((type_min, type_max)) = kind.integer_range() else {
        return Ok(());
    };
    let as_double = e.cast("double", expr);
    let mut checks = Vec::new();
    if let Some(lo) = min {
        match lo {
            Literal::Integer(v) if (v as i128) <= type_min => {}
            Literal::Integer(v) if (v as i128) > type_max => {
                emit!(e, "{fail}");
                return Ok(());
            }
            Literal::Integer(v) => checks.push(format!("{expr} < {}", c_literal_for(kind, v))),
            Literal::Float(v) => checks.push(format!("{as_double} < {}", c_float_literal(v))),
        }
    }
    if let Some(hi) = max {
        match hi {
            Literal::Integer(v) if (v as i128) >= type_max => {}
            Literal::Integer(v) if (v as i128) < type_min => {
                emit!(e, "{fail}");
                return Ok(());
            }
            Literal::Integer(v) => checks.push(format!("{expr} > {}", c_literal_for(kind, v))),
            Literal::Float(v) => checks.push(format!("{as_double} > {}", c_float_literal(v))),
        }
    }
    if !checks.is_empty() {
        emit!(e, "if ({}) {fail}", checks.join(" || "));
    }
    Ok(())
}

fn emit_primitive_hook(
    e: &mut Emitter,
    hook: Hook,
    kind: PrimitiveKind,
    annotations: &[Annotation],
    expr: &str,
) -> Result<(), CodegenError> {
    match hook {
        Hook::Validate => {
            if !(kind.is_integer() || kind.is_floating_point()) {
                return Ok(());
            }
            for annotation in annotations.iter().filter(|a| a.is_validation()) {
                emit_bounds(e, kind, annotation, expr)?;
            }
        }
        Hook::Transform => {
            if !kind.is_floating_point() || !annotations.contains(&Annotation::Round) {
                return Ok(());
            }
            let round = match (e.lang, kind) {
                (TargetLanguage::Cpp, _) => "std::round",
                (TargetLanguage::C, PrimitiveKind::Float) => "roundf",
                (TargetLanguage::C, _) => "round",
            };
            emit!(e, "{expr} = {round}({expr});");
        }
    }
    Ok(())
}

fn nested_hook_call(e: &Emitter, hook: Hook, names: &TypeNames, ptr: &str) -> String {
    let function = names.function(hook.prefix(), e.lang);
    match (hook, e.lang) {
        (Hook::Validate, TargetLanguage::C) => format!("if ({function}({ptr}) != 0) return -1;"),
        (Hook::Validate, TargetLanguage::Cpp) => format!("if (!{function}({ptr})) return false;"),
        (Hook::Transform, _) => format!("{function}({ptr});"),
    }
}

fn emit_nested_hook(
    e: &mut Emitter,
    hook: Hook,
    id: TypeId,
    expr: &str,
    packed: bool,
) -> Result<(), CodegenError> {
    let names = names_of(e, id)?;
    if !packed {
        let call = nested_hook_call(e, hook, &names, &format!("&{expr}"));
        emit!(e, "{call}");
        return Ok(());
    }
    let memcpy = e.libc("memcpy");
    let native_type = names.native(e.lang);
    let call = nested_hook_call(e, hook, &names, "&native_tmp");
    open!(e, "{{");
    emit!(e, "{native_type} native_tmp;");
    emit!(e, "{memcpy}(&native_tmp, &{expr}, sizeof(native_tmp));");
    emit!(e, "{call}");
    if hook == Hook::Transform {
        emit!(e, "{memcpy}(&{expr}, &native_tmp, sizeof(native_tmp));");
    }
    e.close("}")?;
    Ok(())
}

fn emit_value_hook(
    e: &mut Emitter,
    hook: Hook,
    id: TypeId,
    annotations: &[Annotation],
    expr: &str,
    packed: bool,
) -> Result<(), CodegenError> {
    if !has_hook(e.arena, id, annotations, hook) {
        return Ok(());
    }
    match e.spec(id)? {
        TypeSpec::Primitive(kind) => emit_primitive_hook(e, hook, *kind, annotations, expr),
        TypeSpec::Array(a) => {
            emit_indexed_hook(e, hook, a.element(), a.dimensions(), annotations, expr, packed)
        }
        TypeSpec::Sequence(s) => {
            let depth = e.push_loop();
            let i = format!("i{}", depth);
            open!(
                e,
                "for (uint32_t {i} = 0; {i} < {expr}.length && {i} < {}u; {i}++) {{",
                s.bound()
            );
            emit_value_hook(
                e,
                hook,
                s.element(),
                annotations,
                &format!("{expr}.data[{i}]"),
                packed,
            )?;
            e.close("}")?;
            e.pop_loop();
            Ok(())
        }
        TypeSpec::Struct(_) | TypeSpec::Union(_) => emit_nested_hook(e, hook, id, expr, packed),
        TypeSpec::Enum(_) | TypeSpec::String(_) => Ok(()),
    }
}

fn emit_indexed_hook(
    e: &mut Emitter,
    hook: Hook,
    id: TypeId,
    dimensions: &[u32],
    annotations: &[Annotation],
    expr: &str,
    packed: bool,
) -> Result<(), CodegenError> {
    let mut expr = expr.to_string();
    for extent in dimensions {
        let depth = e.push_loop();
        open!(e, "for (uint32_t i{d} = 0; i{d} < {extent}u; i{d}++) {{", d = depth);
        expr = format!("{}[i{}]", expr, depth);
    }
    emit_value_hook(e, hook, id, annotations, &expr, packed)?;
    for _ in dimensions {
        e.pop_loop();
        e.close("}")?;
    }
    Ok(())
}

fn open_hook_function(e: &mut Emitter, hook: Hook, names: &TypeNames) -> Result<(), CodegenError> {
    let native = names.native(e.lang);
    let function = names.local_function(hook.prefix(), e.lang);
    match (hook, e.lang) {
        (Hook::Validate, TargetLanguage::C) => {
            open!(e, "static inline int {function}(const {native}* input) {{")
        }
        (Hook::Transform, TargetLanguage::C) => {
            open!(e, "static inline void {function}({native}* input) {{")
        }
        (Hook::Validate, TargetLanguage::Cpp) => {
            open!(e, "inline bool {function}(const {native}* input) {{")
        }
        (Hook::Transform, TargetLanguage::Cpp) => {
            open!(e, "inline void {function}({native}* input) {{")
        }
    }
    Ok(())
}

fn close_hook_function(e: &mut Emitter, hook: Hook, names: &TypeNames) -> Result<(), CodegenError> {
    match (hook, e.lang) {
        (Hook::Validate, TargetLanguage::C) => emit!(e, "return 0;"),
        (Hook::Validate, TargetLanguage::Cpp) => emit!(e, "return true;"),
        (Hook::Transform, _) => {}
    }
    e.close("}")?;
    super::decls::close_namespace(e, names)?;
    e.blank()?;
    Ok(())
}

pub fn emit_struct_hook(
    e: &mut Emitter,
    spec: &StructTypeSpec,
    hook: Hook,
) -> Result<(), CodegenError> {
    let names = TypeNames::new(spec.namespace_prefix(), spec.identifier());
    debug!("emitting {} hook for struct '{}'", hook.prefix(), spec.identifier());
    super::decls::open_namespace(e, &names)?;
    open_hook_function(e, hook, &names)?;
    let mut emitted = false;
    for (member, declarator) in spec.declarators() {
        if !has_hook(e.arena, member.type_id(), declarator.annotations(), hook) {
            continue;
        }
        e.set_context(spec.identifier(), declarator.identifier());
        let field = escape_keyword(declarator.identifier(), e.lang);
        emit_indexed_hook(
            e,
            hook,
            member.type_id(),
            declarator.dimensions(),
            declarator.annotations(),
            &format!("input->{}", field),
            spec.packed(),
        )?;
        emitted = true;
    }
    if !emitted {
        emit!(e, "(void) input;");
    }
    close_hook_function(e, hook, &names)
}

/* Every labeled member gets a case, hooked or not, so the selection
 * matches encode and decode exactly */
pub fn emit_union_hook(
    e: &mut Emitter,
    spec: &UnionTypeSpec,
    hook: Hook,
) -> Result<(), CodegenError> {
    let names = TypeNames::new(spec.namespace_prefix(), spec.identifier());
    debug!("emitting {} hook for union '{}'", hook.prefix(), spec.identifier());
    super::decls::open_namespace(e, &names)?;
    open_hook_function(e, hook, &names)?;
    let selector = switch_selector(e, spec, "input->tag");
    open!(e, "switch ({selector}) {{");
    for member in spec.members() {
        let declarator = member.declarator();
        e.set_context(spec.identifier(), declarator.identifier());
        if !open_case(e, member)? {
            continue;
        }
        let field = escape_keyword(declarator.identifier(), e.lang);
        emit_indexed_hook(
            e,
            hook,
            member.type_id(),
            declarator.dimensions(),
            declarator.annotations(),
            &format!("input->data.{}", field),
            spec.packed(),
        )?;
        emit!(e, "break;");
        e.close("}")?;
    }
    if spec.default_member().is_none() {
        emit_fallback(e, "break;")?;
    }
    e.close("}")?;
    close_hook_function(e, hook, &names)
}
