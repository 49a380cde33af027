//! Wire layout computation.
//!
//! Sizes and alignments here mirror the generated C wire declarations: every
//! leaf is an `unsigned char[N]` aligned to `N` unless it sits in a packed
//! container, where `__attribute__((packed))` drops every member to
//! alignment 1 without changing nested composite sizes.

use crate::arena::{TypeArena, TypeId};
use crate::error::{ModelError, ModelResult};
use crate::types::{PrimitiveKind, TypeSpec};

/// Size and alignment of a wire representation, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireLayout {
    pub size: u64,
    pub alignment: u64,
}

impl WireLayout {
    fn new(size: u64, alignment: u64) -> Self {
        Self { size, alignment }
    }
}

/// Rounds `offset` up to the next multiple of `alignment`.
pub fn align_up(offset: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        return offset;
    }
    offset.div_ceil(alignment) * alignment
}

/// Placement of one declarator inside a struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: String,
    pub type_id: TypeId,
    pub offset: u64,
    /// Layout of one element; arrays repeat it `count` times.
    pub element: WireLayout,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    pub fields: Vec<FieldLayout>,
    pub layout: WireLayout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnionLayout {
    pub discriminant: WireLayout,
    /// Offset of the member storage; every member starts here.
    pub data_offset: u64,
    pub layout: WireLayout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceLayout {
    pub data_offset: u64,
    pub element: WireLayout,
    pub layout: WireLayout,
}

impl TypeArena {
    fn spec(&self, id: TypeId) -> ModelResult<&TypeSpec> {
        self.get(id).ok_or(ModelError::UnknownType(id.index()))
    }

    /// Wire layout of `id` when placed in a container that is (or is not)
    /// packed.
    pub fn wire_layout(&self, id: TypeId, packed_context: bool) -> ModelResult<WireLayout> {
        let placed = |natural: u64| if packed_context { 1 } else { natural };
        let layout = match self.spec(id)? {
            TypeSpec::Primitive(kind) => {
                let size = primitive_size(*kind);
                WireLayout::new(size, placed(size))
            }
            TypeSpec::Enum(_) => WireLayout::new(4, placed(4)),
            TypeSpec::String(s) => WireLayout::new(s.bound() as u64 + 1, 1),
            TypeSpec::Array(a) => {
                let element = self.wire_layout(a.element(), packed_context)?;
                let count: u64 = a.dimensions().iter().map(|d| *d as u64).product();
                WireLayout::new(element.size * count, element.alignment)
            }
            TypeSpec::Sequence(_) => self.sequence_layout(id, packed_context)?.layout,
            TypeSpec::Struct(_) => {
                let natural = self.struct_layout(id)?.layout;
                WireLayout::new(natural.size, placed(natural.alignment))
            }
            TypeSpec::Union(_) => {
                let natural = self.union_layout(id)?.layout;
                WireLayout::new(natural.size, placed(natural.alignment))
            }
        };
        Ok(layout)
    }

    pub fn sequence_layout(&self, id: TypeId, packed_context: bool) -> ModelResult<SequenceLayout> {
        let seq = match self.spec(id)? {
            TypeSpec::Sequence(seq) => seq,
            _ => return Err(ModelError::UnknownType(id.index())),
        };
        let element = self.wire_layout(seq.element(), packed_context)?;
        let data_len = element.size * seq.bound() as u64;
        if packed_context {
            return Ok(SequenceLayout {
                data_offset: 4,
                element,
                layout: WireLayout::new(4 + data_len, 1),
            });
        }
        let alignment = element.alignment.max(4);
        let data_offset = align_up(4, element.alignment);
        Ok(SequenceLayout {
            data_offset,
            element,
            layout: WireLayout::new(align_up(data_offset + data_len, alignment), alignment),
        })
    }

    pub fn struct_layout(&self, id: TypeId) -> ModelResult<StructLayout> {
        let spec = match self.spec(id)? {
            TypeSpec::Struct(spec) => spec,
            _ => return Err(ModelError::UnknownType(id.index())),
        };
        let packed = spec.packed();
        let mut fields = Vec::new();
        let mut offset = 0;
        let mut max_alignment = 1;
        for (member, declarator) in spec.declarators() {
            let element = self.wire_layout(member.type_id(), packed)?;
            offset = align_up(offset, element.alignment);
            let count = declarator.element_count();
            fields.push(FieldLayout {
                name: declarator.identifier().to_string(),
                type_id: member.type_id(),
                offset,
                element,
                count,
            });
            offset += element.size * count;
            max_alignment = max_alignment.max(element.alignment);
        }
        let layout = if packed {
            WireLayout::new(offset, 1)
        } else {
            WireLayout::new(align_up(offset, max_alignment), max_alignment)
        };
        Ok(StructLayout { fields, layout })
    }

    pub fn union_layout(&self, id: TypeId) -> ModelResult<UnionLayout> {
        let spec = match self.spec(id)? {
            TypeSpec::Union(spec) => spec,
            _ => return Err(ModelError::UnknownType(id.index())),
        };
        let packed = spec.packed();
        let discriminant = self.wire_layout(spec.switch_type(), packed)?;
        if spec.members().is_empty() {
            return Ok(UnionLayout {
                discriminant,
                data_offset: discriminant.size,
                layout: discriminant,
            });
        }
        let mut max_size = 0;
        let mut max_alignment = 1;
        for member in spec.members() {
            let element = self.wire_layout(member.type_id(), packed)?;
            max_size = max_size.max(element.size * member.declarator().element_count());
            max_alignment = max_alignment.max(element.alignment);
        }
        if packed {
            return Ok(UnionLayout {
                discriminant,
                data_offset: discriminant.size,
                layout: WireLayout::new(discriminant.size + max_size, 1),
            });
        }
        let storage = align_up(max_size, max_alignment);
        let data_offset = align_up(discriminant.size, max_alignment);
        let alignment = discriminant.alignment.max(max_alignment);
        Ok(UnionLayout {
            discriminant,
            data_offset,
            layout: WireLayout::new(align_up(data_offset + storage, alignment), alignment),
        })
    }

    /// Wire size of `id` when every value of the type occupies a fixed,
    /// fully meaningful number of bytes. Strings, sequences and anything
    /// containing them have variable content and report `None`.
    pub fn static_wire_size(&self, id: TypeId) -> Option<u64> {
        if !self.is_statically_sized(id) {
            return None;
        }
        self.wire_layout(id, false).ok().map(|l| l.size)
    }

    fn is_statically_sized(&self, id: TypeId) -> bool {
        match self.get(id) {
            None => false,
            Some(TypeSpec::Primitive(_)) | Some(TypeSpec::Enum(_)) => true,
            Some(TypeSpec::String(_)) | Some(TypeSpec::Sequence(_)) => false,
            Some(TypeSpec::Array(a)) => self.is_statically_sized(a.element()),
            Some(TypeSpec::Struct(s)) => s
                .members()
                .iter()
                .all(|m| self.is_statically_sized(m.type_id())),
            Some(TypeSpec::Union(u)) => u
                .members()
                .iter()
                .all(|m| self.is_statically_sized(m.type_id())),
        }
    }

    /// True when the native declaration of a struct already is its wire
    /// layout: packed, and every leaf a single byte that needs no checking.
    pub fn is_byte_exact(&self, id: TypeId) -> bool {
        match self.get(id) {
            Some(TypeSpec::Struct(s)) => {
                s.packed() && s.members().iter().all(|m| self.is_byte_leaf(m.type_id()))
            }
            _ => false,
        }
    }

    fn is_byte_leaf(&self, id: TypeId) -> bool {
        match self.get(id) {
            Some(TypeSpec::Primitive(kind)) => matches!(
                kind,
                PrimitiveKind::Char
                    | PrimitiveKind::Octet
                    | PrimitiveKind::Int8
                    | PrimitiveKind::UInt8
            ),
            Some(TypeSpec::Array(a)) => self.is_byte_leaf(a.element()),
            Some(TypeSpec::Struct(_)) => self.is_byte_exact(id),
            _ => false,
        }
    }
}

fn primitive_size(kind: PrimitiveKind) -> u64 {
    kind.bits().bytes().unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::{StructMember, StructTypeSpec};
    use crate::types::{Declarator, SequenceTypeSpec, StringTypeSpec};
    use crate::unions::{Label, UnionMember, UnionTypeSpec};

    fn point(arena: &mut TypeArena, packed: bool) -> TypeId {
        let int32 = arena.primitive(PrimitiveKind::Int32);
        let mut s = StructTypeSpec::new(None, "Point", packed);
        s.add_member(
            StructMember::new(int32)
                .with_declarator(Declarator::new("x"))
                .with_declarator(Declarator::new("y")),
        )
        .unwrap();
        arena.insert(TypeSpec::Struct(s)).unwrap()
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 4), 0);
        assert_eq!(align_up(1, 4), 4);
        assert_eq!(align_up(5, 1), 5);
        assert_eq!(align_up(9, 8), 16);
    }

    #[test]
    fn test_packed_point_is_eight_bytes() {
        let mut arena = TypeArena::new();
        let id = point(&mut arena, true);
        assert_eq!(arena.wire_layout(id, false).unwrap(), WireLayout::new(8, 1));
        assert_eq!(arena.static_wire_size(id), Some(8));
        let layout = arena.struct_layout(id).unwrap();
        assert_eq!(layout.fields[1].offset, 4);
    }

    #[test]
    fn test_unpacked_struct_padding() {
        let mut arena = TypeArena::new();
        let octet = arena.primitive(PrimitiveKind::Octet);
        let int64 = arena.primitive(PrimitiveKind::Int64);
        let mut s = StructTypeSpec::new(None, "Mixed", false);
        s.add_member(StructMember::new(octet).with_declarator(Declarator::new("a")))
            .unwrap();
        s.add_member(StructMember::new(int64).with_declarator(Declarator::new("b")))
            .unwrap();
        s.add_member(StructMember::new(octet).with_declarator(Declarator::new("c")))
            .unwrap();
        let id = arena.insert(TypeSpec::Struct(s)).unwrap();
        let layout = arena.struct_layout(id).unwrap();
        let offsets: Vec<u64> = layout.fields.iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 8, 16]);
        assert_eq!(layout.layout, WireLayout::new(24, 8));
        // Nested inside a packed container the size is kept.
        assert_eq!(arena.wire_layout(id, true).unwrap(), WireLayout::new(24, 1));
    }

    #[test]
    fn test_array_declarator_layout() {
        let mut arena = TypeArena::new();
        let int32 = arena.primitive(PrimitiveKind::Int32);
        let mut s = StructTypeSpec::new(None, "Vals", false);
        s.add_member(
            StructMember::new(int32).with_declarator(Declarator::new("vals").with_dimensions([4])),
        )
        .unwrap();
        let id = arena.insert(TypeSpec::Struct(s)).unwrap();
        let layout = arena.struct_layout(id).unwrap();
        assert_eq!(layout.fields[0].count, 4);
        assert_eq!(layout.layout.size, 16);
    }

    #[test]
    fn test_packed_union_size_law() {
        let mut arena = TypeArena::new();
        let int32 = arena.primitive(PrimitiveKind::Int32);
        let int16 = arena.primitive(PrimitiveKind::Int16);
        let double = arena.primitive(PrimitiveKind::Double);
        let mut u = UnionTypeSpec::new(None, "U", int16, true, &arena).unwrap();
        let a = u.add_member(UnionMember::new(int32, Declarator::new("a"))).unwrap();
        u.add_label(a, Label::Integer(1)).unwrap();
        let b = u.add_member(UnionMember::new(double, Declarator::new("b"))).unwrap();
        u.add_label(b, Label::Integer(2)).unwrap();
        let id = arena.insert(TypeSpec::Union(u)).unwrap();
        let layout = arena.union_layout(id).unwrap();
        assert_eq!(layout.layout.size, 2 + 8);
        assert_eq!(layout.data_offset, 2);
        assert_eq!(arena.static_wire_size(id), Some(10));
    }

    #[test]
    fn test_unpacked_union_layout() {
        let mut arena = TypeArena::new();
        let int16 = arena.primitive(PrimitiveKind::Int16);
        let double = arena.primitive(PrimitiveKind::Double);
        let mut u = UnionTypeSpec::new(None, "U", int16, false, &arena).unwrap();
        u.add_member(UnionMember::new(double, Declarator::new("b"))).unwrap();
        let id = arena.insert(TypeSpec::Union(u)).unwrap();
        let layout = arena.union_layout(id).unwrap();
        assert_eq!(layout.data_offset, 8);
        assert_eq!(layout.layout, WireLayout::new(16, 8));
    }

    #[test]
    fn test_variable_length_types_have_no_static_size() {
        let mut arena = TypeArena::new();
        let int32 = arena.primitive(PrimitiveKind::Int32);
        let text = arena
            .insert(TypeSpec::String(StringTypeSpec::new(15).unwrap()))
            .unwrap();
        let seq = arena
            .insert(TypeSpec::Sequence(SequenceTypeSpec::new(int32, 3).unwrap()))
            .unwrap();
        assert_eq!(arena.wire_layout(text, false).unwrap(), WireLayout::new(16, 1));
        assert_eq!(arena.wire_layout(seq, false).unwrap(), WireLayout::new(16, 4));
        assert_eq!(arena.wire_layout(seq, true).unwrap(), WireLayout::new(16, 1));
        assert_eq!(arena.static_wire_size(text), None);

        let mut s = StructTypeSpec::new(None, "Named", true);
        s.add_member(StructMember::new(text).with_declarator(Declarator::new("name")))
            .unwrap();
        let id = arena.insert(TypeSpec::Struct(s)).unwrap();
        assert_eq!(arena.static_wire_size(id), None);
    }

    #[test]
    fn test_byte_exact_detection() {
        let mut arena = TypeArena::new();
        let octet = arena.primitive(PrimitiveKind::Octet);
        let mut bytes = StructTypeSpec::new(None, "Bytes", true);
        bytes
            .add_member(
                StructMember::new(octet)
                    .with_declarator(Declarator::new("raw").with_dimensions([6])),
            )
            .unwrap();
        let bytes = arena.insert(TypeSpec::Struct(bytes)).unwrap();
        assert!(arena.is_byte_exact(bytes));

        let packed_point = point(&mut arena, true);
        assert!(!arena.is_byte_exact(packed_point));

        let mut loose = StructTypeSpec::new(None, "Loose", false);
        loose
            .add_member(StructMember::new(octet).with_declarator(Declarator::new("b")))
            .unwrap();
        let loose = arena.insert(TypeSpec::Struct(loose)).unwrap();
        assert!(!arena.is_byte_exact(loose));
    }
}
