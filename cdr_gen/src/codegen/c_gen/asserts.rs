use super::helpers::TypeNames;
use super::Emitter;
use crate::codegen::{CodegenError, TargetLanguage};
use cdr_types::{StructTypeSpec, TypeId, UnionTypeSpec};
use tracing::debug;

/* Only packed types with members of fixed wire size get a hard check */
fn emit_size_assert(
    e: &mut Emitter,
    id: TypeId,
    names: &TypeNames,
    packed: bool,
    has_members: bool,
) -> Result<(), CodegenError> {
    if !packed || !has_members {
        return Ok(());
    }
    if e.arena.static_wire_size(id).is_none() {
        debug!("'{}' has variable-length members, no size assertion", names.c_base());
        return Ok(());
    }
    let size = e.arena.wire_layout(id, false)?.size;
    let wire = names.wire(e.lang);
    match e.lang {
        TargetLanguage::C => emit!(
            e,
            "_Static_assert(sizeof({wire}) == {size}, \"{wire} must be {size} bytes\");"
        ),
        TargetLanguage::Cpp => emit!(
            e,
            "static_assert(sizeof({wire}) == {size}, \"{wire} must be {size} bytes\");"
        ),
    }
    e.blank()?;
    Ok(())
}

/// Wire size of a packed struct: the sum of element size times element
/// count over its declarators.
pub fn emit_struct_asserts(
    e: &mut Emitter,
    id: TypeId,
    spec: &StructTypeSpec,
) -> Result<(), CodegenError> {
    let names = TypeNames::new(spec.namespace_prefix(), spec.identifier());
    e.set_context(spec.identifier(), "");
    let has_members = spec.declarators().next().is_some();
    emit_size_assert(e, id, &names, spec.packed(), has_members)
}

/// Wire size of a packed union: the discriminant plus its largest member.
pub fn emit_union_asserts(
    e: &mut Emitter,
    id: TypeId,
    spec: &UnionTypeSpec,
) -> Result<(), CodegenError> {
    let names = TypeNames::new(spec.namespace_prefix(), spec.identifier());
    e.set_context(spec.identifier(), "");
    emit_size_assert(e, id, &names, spec.packed(), !spec.members().is_empty())
}
