use super::helpers::{c_int_literal, escape_keyword, TypeNames};
use super::leaf::emit_indexed;
use super::structs::{close_serialization, emit_cpp_buffer_function, open_serialization};
use super::Emitter;
use crate::codegen::{CdrFunc, CodegenError, TargetLanguage};
use cdr_types::{Label, SwitchKind, UnionMember, UnionTypeSpec};
use tracing::debug;

/// Controlling expression of the member `switch` for a discriminant lvalue.
pub(crate) fn switch_selector(e: &Emitter, spec: &UnionTypeSpec, tag: &str) -> String {
    match (spec.switch_kind(), e.lang) {
        (SwitchKind::Bool, _) => e.cast("int", tag),
        (SwitchKind::Enum { .. }, TargetLanguage::Cpp) => e.cast("uint32_t", tag),
        _ => tag.to_string(),
    }
}

/// Opens the case block of a member: one `case` per label, plus `default`
/// for the default member. Returns false for members no discriminant can
/// select.
pub(crate) fn open_case(e: &mut Emitter, member: &UnionMember) -> Result<bool, CodegenError> {
    let mut labels: Vec<String> = member
        .labels()
        .iter()
        .map(|(label, value)| match label {
            Label::Integer(_) => format!("case {}:", c_int_literal(*value)),
            other => format!("case {}: /* {} */", c_int_literal(*value), other),
        })
        .collect();
    if member.has_default() {
        labels.push("default:".to_string());
    }
    let Some(last) = labels.pop() else {
        return Ok(false);
    };
    for label in &labels {
        emit!(e, "{}", label);
    }
    open!(e, "{} {{", last);
    Ok(true)
}

/* `default:` arm for unions without a default member */
pub(crate) fn emit_fallback(e: &mut Emitter, statement: &str) -> Result<(), CodegenError> {
    open!(e, "default:");
    emit!(e, "{}", statement);
    e.dedent();
    Ok(())
}

/* Discriminant first, then exactly one member selected by label or default */
fn emit_dispatch(
    e: &mut Emitter,
    spec: &UnionTypeSpec,
    func: CdrFunc,
    native_root: &str,
    wire_root: &str,
) -> Result<(), CodegenError> {
    e.set_context(spec.identifier(), "tag");
    let tag = format!("{}tag", native_root);
    emit_indexed(
        e,
        func,
        spec.switch_type(),
        &[],
        &tag,
        &format!("{}tag", wire_root),
        spec.packed(),
    )?;
    let selector = switch_selector(e, spec, &tag);
    open!(e, "switch ({}) {{", selector);
    for member in spec.members() {
        let declarator = member.declarator();
        e.set_context(spec.identifier(), declarator.identifier());
        if !open_case(e, member)? {
            continue;
        }
        let field = escape_keyword(declarator.identifier(), e.lang);
        emit_indexed(
            e,
            func,
            member.type_id(),
            declarator.dimensions(),
            &format!("{}data.{}", native_root, field),
            &format!("{}data.{}", wire_root, field),
            spec.packed(),
        )?;
        emit!(e, "break;");
        e.close("}")?;
    }
    if spec.default_member().is_none() {
        e.set_context(spec.identifier(), "");
        let fallback = match func {
            CdrFunc::Encode => "break;".to_string(),
            CdrFunc::Decode => e.decode_failure("discriminant matches no member"),
        };
        emit_fallback(e, &fallback)?;
    }
    e.close("}")?;
    Ok(())
}

pub fn emit_union_function(
    e: &mut Emitter,
    spec: &UnionTypeSpec,
    func: CdrFunc,
) -> Result<(), CodegenError> {
    let names = TypeNames::new(spec.namespace_prefix(), spec.identifier());
    debug!("emitting {:?} routine for union '{}'", func, spec.identifier());
    let native = names.native(e.lang);
    let wire = names.wire(e.lang);
    let memset = e.libc("memset");
    let memcpy = e.libc("memcpy");
    match (e.lang, func) {
        (TargetLanguage::C, CdrFunc::Encode) => {
            emit!(e, "/* Encode {}: discriminant, then the selected member */", spec.identifier());
            open!(
                e,
                "static inline void {}(const {}* input, {}* output) {{",
                names.local_function("encode", e.lang),
                native,
                wire
            );
        }
        (TargetLanguage::C, CdrFunc::Decode) => {
            emit!(
                e,
                "/* Decode {}; fails when the discriminant selects no member */",
                spec.identifier()
            );
            open!(
                e,
                "static inline int {}(const {}* input, {}* output) {{",
                names.local_function("decode", e.lang),
                wire,
                native
            );
        }
        (TargetLanguage::Cpp, CdrFunc::Encode) => {
            open!(e, "static void toWireType(const {}* input, {}* output) {{", native, wire);
        }
        (TargetLanguage::Cpp, CdrFunc::Decode) => {
            open!(e, "static void fromWireType(const {}* input, {}* output) {{", wire, native);
        }
    }
    match func {
        CdrFunc::Encode => {
            emit!(e, "{memset}(output, 0, sizeof(*output));");
            emit_dispatch(e, spec, func, "input->", "output->")?;
        }
        CdrFunc::Decode => {
            emit!(e, "{native} tmp;");
            emit!(e, "{memset}(&tmp, 0, sizeof(tmp));");
            emit_dispatch(e, spec, func, "tmp.", "input->")?;
            emit!(e, "{memcpy}(output, &tmp, sizeof(tmp));");
            if e.lang == TargetLanguage::C {
                emit!(e, "return 0;");
            }
        }
    }
    e.close("}")?;
    e.blank()?;
    if e.lang == TargetLanguage::Cpp {
        emit_cpp_buffer_function(e, &names, func)?;
    }
    Ok(())
}

pub fn emit_union_serialization(e: &mut Emitter, spec: &UnionTypeSpec) -> Result<(), CodegenError> {
    let names = TypeNames::new(spec.namespace_prefix(), spec.identifier());
    if e.lang == TargetLanguage::Cpp {
        open_serialization(e, &names)?;
    }
    emit_union_function(e, spec, CdrFunc::Encode)?;
    emit_union_function(e, spec, CdrFunc::Decode)?;
    if e.lang == TargetLanguage::Cpp {
        close_serialization(e)?;
    }
    Ok(())
}
