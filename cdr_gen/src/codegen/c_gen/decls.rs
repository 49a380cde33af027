use super::helpers::{TypeNames, array_suffix, escape_keyword, primitive_to_c_type};
use super::Emitter;
use crate::codegen::{CodegenError, TargetLanguage};
use cdr_types::{Declarator, EnumTypeSpec, StructTypeSpec, TypeId, TypeSpec, UnionTypeSpec};
use tracing::debug;

const PACKED_ATTR: &str = "__attribute__((packed)) ";

fn packed_attr(packed: bool) -> &'static str {
    if packed { PACKED_ATTR } else { "" }
}

/* Alignment attribute for a wire byte array of a `size`-byte leaf */
fn aligned_attr(size: u64, packed: bool) -> String {
    if packed || size <= 1 {
        String::new()
    } else {
        format!(" __attribute__((aligned({})))", size)
    }
}

/* Escaped declarator name with its extents, e.g. `vals[4]` */
fn declarator_name(declarator: &Declarator, lang: TargetLanguage) -> String {
    format!(
        "{}{}",
        escape_keyword(declarator.identifier(), lang),
        array_suffix(declarator.dimensions())
    )
}

/* Names of a named type referenced from a field */
pub(crate) fn names_of(e: &Emitter, id: TypeId) -> Result<TypeNames, CodegenError> {
    let spec = e.spec(id)?;
    TypeNames::of(spec)
        .ok_or_else(|| e.fault(format!("{} is not a named type", spec.identifier_name())))
}

/* Native field declaration `<type> <name><extents>`, without the semicolon */
pub(crate) fn native_field(
    e: &Emitter,
    id: TypeId,
    name: &str,
    packed: bool,
) -> Result<String, CodegenError> {
    let field = match e.spec(id)? {
        TypeSpec::Primitive(kind) => format!("{} {}", primitive_to_c_type(*kind), name),
        TypeSpec::String(s) => format!("char {}[{}]", name, s.bound() as u64 + 1),
        TypeSpec::Array(a) => {
            let name = format!("{}{}", name, array_suffix(a.dimensions()));
            native_field(e, a.element(), &name, packed)?
        }
        TypeSpec::Sequence(s) => {
            let data = native_field(e, s.element(), &format!("data[{}]", s.bound()), packed)?;
            format!(
                "struct {}{{ uint32_t length; {}; }} {}",
                packed_attr(packed),
                data,
                name
            )
        }
        TypeSpec::Enum(_) | TypeSpec::Struct(_) | TypeSpec::Union(_) => {
            format!("{} {}", names_of(e, id)?.native(e.lang), name)
        }
    };
    Ok(field)
}

/* Wire field declaration: leaves become big-endian byte arrays */
pub(crate) fn wire_field(
    e: &Emitter,
    id: TypeId,
    name: &str,
    packed: bool,
) -> Result<String, CodegenError> {
    let field = match e.spec(id)? {
        TypeSpec::Primitive(kind) => {
            let size = kind.bits().bytes().unwrap_or(1);
            format!("unsigned char {}[{}]{}", name, size, aligned_attr(size, packed))
        }
        TypeSpec::Enum(_) => format!("unsigned char {}[4]{}", name, aligned_attr(4, packed)),
        TypeSpec::String(s) => format!("unsigned char {}[{}]", name, s.bound() as u64 + 1),
        TypeSpec::Array(a) => {
            let name = format!("{}{}", name, array_suffix(a.dimensions()));
            wire_field(e, a.element(), &name, packed)?
        }
        TypeSpec::Sequence(s) => {
            let data = wire_field(e, s.element(), &format!("data[{}]", s.bound()), packed)?;
            format!(
                "struct {}{{ unsigned char length[4]{}; {}; }} {}",
                packed_attr(packed),
                aligned_attr(4, packed),
                data,
                name
            )
        }
        TypeSpec::Struct(_) | TypeSpec::Union(_) => {
            format!("{} {}", names_of(e, id)?.wire(e.lang), name)
        }
    };
    Ok(field)
}

pub(crate) fn open_namespace(e: &mut Emitter, names: &TypeNames) -> Result<(), CodegenError> {
    if e.lang == TargetLanguage::Cpp {
        if let Some(ns) = names.namespace() {
            emit!(e, "namespace {} {{", ns);
        }
    }
    Ok(())
}

pub(crate) fn close_namespace(e: &mut Emitter, names: &TypeNames) -> Result<(), CodegenError> {
    if e.lang == TargetLanguage::Cpp {
        if let Some(ns) = names.namespace() {
            emit!(e, "}}  // namespace {}", ns);
        }
    }
    Ok(())
}

/* Closes a defining declaration; C also gets the `_t` typedef */
fn close_definition(e: &mut Emitter, tag: &str, typedef: &str) -> Result<(), CodegenError> {
    e.close("};")?;
    if e.lang == TargetLanguage::C {
        emit!(e, "typedef struct {} {};", tag, typedef);
    }
    Ok(())
}

pub fn emit_enum_decl(e: &mut Emitter, spec: &EnumTypeSpec) -> Result<(), CodegenError> {
    let names = TypeNames::new(spec.namespace_prefix(), spec.identifier());
    debug!("emitting enum declaration for '{}'", spec.identifier());
    let count = spec.enumerator_count();
    match e.lang {
        TargetLanguage::C => {
            emit!(e, "typedef uint32_t {};", names.native(e.lang));
            if count > 0 {
                open!(e, "enum {} {{", names.local(e.lang));
                for (ordinal, enumerator) in spec.enumerators().enumerate() {
                    let sep = if ordinal as u32 + 1 == count { "" } else { "," };
                    emit!(e, "{} = {}{}", names.enumerator_constant(enumerator), ordinal, sep);
                }
                e.close("};")?;
            }
        }
        TargetLanguage::Cpp => {
            open_namespace(e, &names)?;
            open!(e, "enum class {} : uint32_t {{", names.local(e.lang));
            for (ordinal, enumerator) in spec.enumerators().enumerate() {
                let sep = if ordinal as u32 + 1 == count { "" } else { "," };
                let name = escape_keyword(enumerator, e.lang);
                emit!(e, "{} = {}{}", name, ordinal, sep);
            }
            e.close("};")?;
            close_namespace(e, &names)?;
        }
    }
    e.blank()?;
    Ok(())
}

pub fn emit_struct_decl(e: &mut Emitter, spec: &StructTypeSpec) -> Result<(), CodegenError> {
    let names = TypeNames::new(spec.namespace_prefix(), spec.identifier());
    debug!("emitting native declaration for struct '{}'", spec.identifier());
    open_namespace(e, &names)?;
    open!(e, "struct {}{} {{", packed_attr(spec.packed()), names.local(e.lang));
    for (member, declarator) in spec.declarators() {
        e.set_context(spec.identifier(), declarator.identifier());
        let name = declarator_name(declarator, e.lang);
        let field = native_field(e, member.type_id(), &name, spec.packed())?;
        emit!(e, "{};", field);
    }
    close_definition(e, &names.local(e.lang), &names.native(e.lang))?;
    close_namespace(e, &names)?;
    e.blank()?;
    Ok(())
}

/* A byte-exact struct is its own wire type */
pub fn emit_struct_wire_decl(
    e: &mut Emitter,
    id: TypeId,
    spec: &StructTypeSpec,
) -> Result<(), CodegenError> {
    let names = TypeNames::new(spec.namespace_prefix(), spec.identifier());
    debug!("emitting wire declaration for struct '{}'", spec.identifier());
    open_namespace(e, &names)?;
    if e.arena.is_byte_exact(id) {
        match e.lang {
            TargetLanguage::C => {
                emit!(e, "typedef struct {} {};", names.local(e.lang), names.wire(e.lang))
            }
            TargetLanguage::Cpp => {
                emit!(e, "using {} = {};", names.local_wire(e.lang), names.local(e.lang))
            }
        }
    } else {
        open!(e, "struct {}{} {{", packed_attr(spec.packed()), names.local_wire(e.lang));
        for (member, declarator) in spec.declarators() {
            e.set_context(spec.identifier(), declarator.identifier());
            let name = declarator_name(declarator, e.lang);
            let field = wire_field(e, member.type_id(), &name, spec.packed())?;
            emit!(e, "{};", field);
        }
        close_definition(e, &names.local_wire(e.lang), &names.wire(e.lang))?;
    }
    close_namespace(e, &names)?;
    e.blank()?;
    Ok(())
}

/* Tagged layout shared by the native and wire union declarations */
fn emit_union_body(e: &mut Emitter, spec: &UnionTypeSpec, wire: bool) -> Result<(), CodegenError> {
    let field: fn(&Emitter, TypeId, &str, bool) -> Result<String, CodegenError> =
        if wire { wire_field } else { native_field };
    e.set_context(spec.identifier(), "tag");
    let tag = field(e, spec.switch_type(), "tag", spec.packed())?;
    emit!(e, "{};", tag);
    if spec.members().is_empty() {
        return Ok(());
    }
    open!(e, "union {}{{", packed_attr(spec.packed()));
    for member in spec.members() {
        let declarator = member.declarator();
        e.set_context(spec.identifier(), declarator.identifier());
        let name = declarator_name(declarator, e.lang);
        let decl = field(e, member.type_id(), &name, spec.packed())?;
        emit!(e, "{};", decl);
    }
    e.close("} data;")?;
    Ok(())
}

pub fn emit_union_decl(e: &mut Emitter, spec: &UnionTypeSpec) -> Result<(), CodegenError> {
    let names = TypeNames::new(spec.namespace_prefix(), spec.identifier());
    debug!("emitting native declaration for union '{}'", spec.identifier());
    open_namespace(e, &names)?;
    open!(e, "struct {}{} {{", packed_attr(spec.packed()), names.local(e.lang));
    emit_union_body(e, spec, false)?;
    close_definition(e, &names.local(e.lang), &names.native(e.lang))?;
    close_namespace(e, &names)?;
    e.blank()?;
    Ok(())
}

pub fn emit_union_wire_decl(e: &mut Emitter, spec: &UnionTypeSpec) -> Result<(), CodegenError> {
    let names = TypeNames::new(spec.namespace_prefix(), spec.identifier());
    debug!("emitting wire declaration for union '{}'", spec.identifier());
    open_namespace(e, &names)?;
    open!(e, "struct {}{} {{", packed_attr(spec.packed()), names.local_wire(e.lang));
    emit_union_body(e, spec, true)?;
    close_definition(e, &names.local_wire(e.lang), &names.wire(e.lang))?;
    close_namespace(e, &names)?;
    e.blank()?;
    Ok(())
}
