use super::helpers::{escape_keyword, TypeNames};
use super::leaf::emit_indexed;
use super::Emitter;
use crate::codegen::{CdrFunc, CodegenError, TargetLanguage};
use cdr_types::StructTypeSpec;
use tracing::debug;

/* Member conversions in declaration order; this order is the wire order */
fn emit_members(
    e: &mut Emitter,
    spec: &StructTypeSpec,
    func: CdrFunc,
    native_root: &str,
    wire_root: &str,
) -> Result<(), CodegenError> {
    for (member, declarator) in spec.declarators() {
        e.set_context(spec.identifier(), declarator.identifier());
        let field = escape_keyword(declarator.identifier(), e.lang);
        emit_indexed(
            e,
            func,
            member.type_id(),
            declarator.dimensions(),
            &format!("{}{}", native_root, field),
            &format!("{}{}", wire_root, field),
            spec.packed(),
        )?;
    }
    Ok(())
}

fn has_members(spec: &StructTypeSpec) -> bool {
    spec.declarators().next().is_some()
}

pub fn emit_struct_function(
    e: &mut Emitter,
    spec: &StructTypeSpec,
    func: CdrFunc,
) -> Result<(), CodegenError> {
    let names = TypeNames::new(spec.namespace_prefix(), spec.identifier());
    debug!("emitting {:?} routine for struct '{}'", func, spec.identifier());
    e.set_context(spec.identifier(), "");
    match e.lang {
        TargetLanguage::C => emit_c_function(e, spec, &names, func),
        TargetLanguage::Cpp => {
            emit_cpp_wire_function(e, spec, &names, func)?;
            emit_cpp_buffer_function(e, &names, func)
        }
    }
}

pub fn emit_struct_serialization(
    e: &mut Emitter,
    spec: &StructTypeSpec,
) -> Result<(), CodegenError> {
    let names = TypeNames::new(spec.namespace_prefix(), spec.identifier());
    if e.lang == TargetLanguage::Cpp {
        open_serialization(e, &names)?;
    }
    emit_struct_function(e, spec, CdrFunc::Encode)?;
    emit_struct_function(e, spec, CdrFunc::Decode)?;
    if e.lang == TargetLanguage::Cpp {
        close_serialization(e)?;
    }
    Ok(())
}

fn emit_c_function(
    e: &mut Emitter,
    spec: &StructTypeSpec,
    names: &TypeNames,
    func: CdrFunc,
) -> Result<(), CodegenError> {
    let native = names.native(e.lang);
    let wire = names.wire(e.lang);
    match func {
        CdrFunc::Encode => {
            emit!(e, "/* Encode {} into its wire representation */", spec.identifier());
            open!(
                e,
                "static inline void {}(const {}* input, {}* output) {{",
                names.local_function("encode", e.lang),
                native,
                wire
            );
            emit!(e, "memset(output, 0, sizeof(*output));");
            if !has_members(spec) {
                emit!(e, "(void) input;");
            }
            emit_members(e, spec, func, "input->", "output->")?;
            e.close("}")?;
        }
        CdrFunc::Decode => {
            emit!(
                e,
                "/* Decode {} from its wire representation; output is untouched on failure */",
                spec.identifier()
            );
            open!(
                e,
                "static inline int {}(const {}* input, {}* output) {{",
                names.local_function("decode", e.lang),
                wire,
                native
            );
            emit!(e, "{} tmp;", native);
            emit!(e, "memset(&tmp, 0, sizeof(tmp));");
            if !has_members(spec) {
                emit!(e, "(void) input;");
            }
            emit_members(e, spec, func, "tmp.", "input->")?;
            emit!(e, "memcpy(output, &tmp, sizeof(tmp));");
            emit!(e, "return 0;");
            e.close("}")?;
        }
    }
    e.blank()?;
    Ok(())
}

fn emit_cpp_wire_function(
    e: &mut Emitter,
    spec: &StructTypeSpec,
    names: &TypeNames,
    func: CdrFunc,
) -> Result<(), CodegenError> {
    let native = names.native(e.lang);
    let wire = names.wire(e.lang);
    match func {
        CdrFunc::Encode => {
            open!(e, "static void toWireType(const {}* input, {}* output) {{", native, wire);
            emit!(e, "std::memset(output, 0, sizeof(*output));");
            if !has_members(spec) {
                emit!(e, "(void) input;");
            }
            emit_members(e, spec, func, "input->", "output->")?;
            e.close("}")?;
        }
        CdrFunc::Decode => {
            open!(e, "static void fromWireType(const {}* input, {}* output) {{", wire, native);
            emit!(e, "{} tmp;", native);
            emit!(e, "std::memset(&tmp, 0, sizeof(tmp));");
            if !has_members(spec) {
                emit!(e, "(void) input;");
            }
            emit_members(e, spec, func, "tmp.", "input->")?;
            emit!(e, "std::memcpy(output, &tmp, sizeof(tmp));");
            e.close("}")?;
        }
    }
    e.blank()?;
    Ok(())
}

/* Whole-buffer entry points of a C++ Serialization specialization */
pub(crate) fn emit_cpp_buffer_function(
    e: &mut Emitter,
    names: &TypeNames,
    func: CdrFunc,
) -> Result<(), CodegenError> {
    let native = names.native(e.lang);
    let wire = names.wire(e.lang);
    match func {
        CdrFunc::Encode => {
            open!(e, "static std::vector<char> toBuffer(const {}& value) {{", native);
            emit!(e, "{} wire;", wire);
            emit!(e, "toWireType(&value, &wire);");
            emit!(e, "std::vector<char> buffer(sizeof(wire));");
            emit!(e, "std::memcpy(buffer.data(), &wire, sizeof(wire));");
            emit!(e, "return buffer;");
            e.close("}")?;
        }
        CdrFunc::Decode => {
            open!(e, "static {} fromBuffer(const std::vector<char>& buffer) {{", native);
            open!(e, "if (buffer.size() != sizeof({})) {{", wire);
            emit!(e, "throw std::length_error(\"{}: wire buffer has the wrong size\");", native);
            e.close("}")?;
            emit!(e, "{} wire;", wire);
            emit!(e, "std::memcpy(&wire, buffer.data(), sizeof(wire));");
            emit!(e, "{} value{{}};", native);
            emit!(e, "fromWireType(&wire, &value);");
            emit!(e, "return value;");
            e.close("}")?;
        }
    }
    e.blank()?;
    Ok(())
}

pub(crate) fn open_serialization(e: &mut Emitter, names: &TypeNames) -> Result<(), CodegenError> {
    emit!(e, "template<>");
    open!(e, "struct Serialization<{}> {{", names.native(e.lang));
    Ok(())
}

pub(crate) fn close_serialization(e: &mut Emitter) -> Result<(), CodegenError> {
    e.close("};")?;
    e.blank()?;
    Ok(())
}
