//! Inline conversion code for one declarator.
//!
//! Primitives, enums, strings, sequences and arrays have no routines of
//! their own: the struct or union holding them gets their conversion
//! statements spliced in. Nested structs and unions are reached through a
//! call to their own generated routine.

use super::decls::names_of;
use super::helpers::carrier_type;
use super::Emitter;
use crate::codegen::{CdrFunc, CodegenError, TargetLanguage};
use cdr_types::{PrimitiveKind, TypeId, TypeSpec};

/// Converts `native` to or from `wire` for a declarator with the given
/// extents, one element at a time in index order.
pub(crate) fn emit_indexed(
    e: &mut Emitter,
    func: CdrFunc,
    id: TypeId,
    dimensions: &[u32],
    native: &str,
    wire: &str,
    packed: bool,
) -> Result<(), CodegenError> {
    let mut native = native.to_string();
    let mut wire = wire.to_string();
    for extent in dimensions {
        let depth = e.push_loop();
        open!(e, "for (uint32_t i{d} = 0; i{d} < {extent}u; i{d}++) {{", d = depth);
        native = format!("{}[i{}]", native, depth);
        wire = format!("{}[i{}]", wire, depth);
    }
    emit_convert(e, func, id, &native, &wire, packed)?;
    for _ in dimensions {
        e.pop_loop();
        e.close("}")?;
    }
    Ok(())
}

pub(crate) fn emit_convert(
    e: &mut Emitter,
    func: CdrFunc,
    id: TypeId,
    native: &str,
    wire: &str,
    packed: bool,
) -> Result<(), CodegenError> {
    match e.spec(id)? {
        TypeSpec::Primitive(kind) => emit_primitive(e, func, *kind, native, wire),
        TypeSpec::Enum(spec) => emit_enum(e, func, id, spec.enumerator_count(), native, wire),
        TypeSpec::String(spec) => emit_string(e, func, spec.bound(), native, wire),
        TypeSpec::Array(spec) => {
            emit_indexed(e, func, spec.element(), spec.dimensions(), native, wire, packed)
        }
        TypeSpec::Sequence(spec) => {
            emit_sequence(e, func, spec.element(), spec.bound(), native, wire, packed)
        }
        TypeSpec::Struct(_) | TypeSpec::Union(_) => {
            emit_nested_call(e, func, id, native, wire, packed)
        }
    }
}

fn emit_primitive(
    e: &mut Emitter,
    func: CdrFunc,
    kind: PrimitiveKind,
    native: &str,
    wire: &str,
) -> Result<(), CodegenError> {
    let memcpy = e.libc("memcpy");
    let bytes = kind.bits().bytes().unwrap_or(1);
    if func == CdrFunc::Decode && kind == PrimitiveKind::Bool {
        let fail = e.decode_failure("boolean out of range");
        open!(e, "{{");
        emit!(e, "uint8_t v;");
        emit!(e, "{memcpy}(&v, &{wire}, 1);");
        emit!(e, "if (v > 1) {fail}");
        emit!(e, "{native} = (v != 0);");
        e.close("}")?;
        return Ok(());
    }
    if bytes == 1 {
        match func {
            CdrFunc::Encode => emit!(e, "{memcpy}(&{wire}, &{native}, 1);"),
            CdrFunc::Decode => emit!(e, "{memcpy}(&{native}, &{wire}, 1);"),
        }
        return Ok(());
    }
    let carrier = carrier_type(bytes);
    let bits = bytes * 8;
    open!(e, "{{");
    emit!(e, "{carrier} v;");
    match func {
        CdrFunc::Encode => {
            emit!(e, "{memcpy}(&v, &{native}, sizeof(v));");
            emit!(e, "v = cdr_to_be{bits}(v);");
            emit!(e, "{memcpy}(&{wire}, &v, sizeof(v));");
        }
        CdrFunc::Decode => {
            emit!(e, "{memcpy}(&v, &{wire}, sizeof(v));");
            emit!(e, "v = cdr_from_be{bits}(v);");
            emit!(e, "{memcpy}(&{native}, &v, sizeof(v));");
        }
    }
    e.close("}")?;
    Ok(())
}

fn emit_enum(
    e: &mut Emitter,
    func: CdrFunc,
    id: TypeId,
    count: u32,
    native: &str,
    wire: &str,
) -> Result<(), CodegenError> {
    let memcpy = e.libc("memcpy");
    open!(e, "{{");
    match func {
        CdrFunc::Encode => {
            let value = e.cast("uint32_t", native);
            emit!(e, "uint32_t v = {value};");
            emit!(e, "v = cdr_to_be32(v);");
            emit!(e, "{memcpy}(&{wire}, &v, sizeof(v));");
        }
        CdrFunc::Decode => {
            let fail = e.decode_failure("enumerator out of range");
            let value = e.cast(&names_of(e, id)?.native(e.lang), "v");
            emit!(e, "uint32_t v;");
            emit!(e, "{memcpy}(&v, &{wire}, sizeof(v));");
            emit!(e, "v = cdr_from_be32(v);");
            emit!(e, "if (v >= {count}u) {fail}");
            emit!(e, "{native} = {value};");
        }
    }
    e.close("}")?;
    Ok(())
}

fn emit_string(
    e: &mut Emitter,
    func: CdrFunc,
    bound: u32,
    native: &str,
    wire: &str,
) -> Result<(), CodegenError> {
    let memcpy = e.libc("memcpy");
    let memchr = e.libc("memchr");
    let null = e.null();
    let capacity = bound as u64 + 1;
    open!(e, "{{");
    match func {
        CdrFunc::Encode => {
            let memset = e.libc("memset");
            let end = e.cast("const char*", &format!("{memchr}({native}, 0, {bound}u)"));
            let len = e.cast("size_t", &format!("(end - {native})"));
            emit!(e, "const char* end = {end};");
            emit!(e, "size_t len = end != {null} ? {len} : {bound}u;");
            emit!(e, "{memcpy}({wire}, {native}, len);");
            emit!(e, "{memset}({wire} + len, 0, {capacity}u - len);");
        }
        CdrFunc::Decode => {
            let fail = e.decode_failure("unterminated string");
            emit!(e, "if ({memchr}({wire}, 0, {capacity}u) == {null}) {fail}");
            emit!(e, "{memcpy}({native}, {wire}, {capacity}u);");
        }
    }
    e.close("}")?;
    Ok(())
}

fn emit_sequence(
    e: &mut Emitter,
    func: CdrFunc,
    element: TypeId,
    bound: u32,
    native: &str,
    wire: &str,
    packed: bool,
) -> Result<(), CodegenError> {
    let memcpy = e.libc("memcpy");
    let depth = e.push_loop();
    let n = format!("n{}", depth);
    let i = format!("i{}", depth);
    open!(e, "{{");
    match func {
        CdrFunc::Encode => {
            emit!(e, "uint32_t {n} = {native}.length;");
            emit!(e, "if ({n} > {bound}u) {n} = {bound}u;");
            emit!(e, "uint32_t length_be = cdr_to_be32({n});");
            emit!(e, "{memcpy}(&{wire}.length, &length_be, sizeof(length_be));");
        }
        CdrFunc::Decode => {
            let fail = e.decode_failure("sequence length exceeds bound");
            emit!(e, "uint32_t {n};");
            emit!(e, "{memcpy}(&{n}, &{wire}.length, sizeof({n}));");
            emit!(e, "{n} = cdr_from_be32({n});");
            emit!(e, "if ({n} > {bound}u) {fail}");
            emit!(e, "{native}.length = {n};");
        }
    }
    open!(e, "for (uint32_t {i} = 0; {i} < {n}; {i}++) {{");
    emit_convert(
        e,
        func,
        element,
        &format!("{native}.data[{i}]"),
        &format!("{wire}.data[{i}]"),
        packed,
    )?;
    e.close("}")?;
    e.close("}")?;
    e.pop_loop();
    Ok(())
}

/* Call into the nested type's own routine. Members of packed containers may
 * be misaligned, so they go through aligned temporaries. */
fn emit_nested_call(
    e: &mut Emitter,
    func: CdrFunc,
    id: TypeId,
    native: &str,
    wire: &str,
    packed: bool,
) -> Result<(), CodegenError> {
    let names = names_of(e, id)?;
    if !packed {
        let call = nested_call(e, func, &names, &format!("&{native}"), &format!("&{wire}"));
        emit!(e, "{call}");
        return Ok(());
    }
    let memcpy = e.libc("memcpy");
    let native_type = names.native(e.lang);
    let wire_type = names.wire(e.lang);
    let call = nested_call(e, func, &names, "&native_tmp", "&wire_tmp");
    open!(e, "{{");
    emit!(e, "{native_type} native_tmp;");
    emit!(e, "{wire_type} wire_tmp;");
    match func {
        CdrFunc::Encode => {
            emit!(e, "{memcpy}(&native_tmp, &{native}, sizeof(native_tmp));");
            emit!(e, "{call}");
            emit!(e, "{memcpy}(&{wire}, &wire_tmp, sizeof(wire_tmp));");
        }
        CdrFunc::Decode => {
            emit!(e, "{memcpy}(&wire_tmp, &{wire}, sizeof(wire_tmp));");
            emit!(e, "{call}");
            emit!(e, "{memcpy}(&{native}, &native_tmp, sizeof(native_tmp));");
        }
    }
    e.close("}")?;
    Ok(())
}

fn nested_call(
    e: &Emitter,
    func: CdrFunc,
    names: &super::TypeNames,
    native_ptr: &str,
    wire_ptr: &str,
) -> String {
    match (e.lang, func) {
        (TargetLanguage::C, CdrFunc::Encode) => format!(
            "{}({}, {});",
            names.function("encode", e.lang),
            native_ptr,
            wire_ptr
        ),
        (TargetLanguage::C, CdrFunc::Decode) => format!(
            "if ({}({}, {}) != 0) return -1;",
            names.function("decode", e.lang),
            wire_ptr,
            native_ptr
        ),
        (TargetLanguage::Cpp, CdrFunc::Encode) => format!(
            "Serialization<{}>::toWireType({}, {});",
            names.native(e.lang),
            native_ptr,
            wire_ptr
        ),
        (TargetLanguage::Cpp, CdrFunc::Decode) => format!(
            "Serialization<{}>::fromWireType({}, {});",
            names.native(e.lang),
            wire_ptr,
            native_ptr
        ),
    }
}
