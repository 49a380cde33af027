/* Decoder accepting exactly the buffers the generated decode routines accept */

use crate::errors::{check_size, ReflectError, ReflectResult};
use crate::primitives::{read_enum, read_length, read_primitive};
use crate::value::{UnionValue, Value};
use cdr_types::{StructTypeSpec, SwitchKind, TypeArena, TypeId, TypeSpec, UnionTypeSpec};
use tracing::{debug, warn};

pub struct Decoder<'a> {
    arena: &'a TypeArena,
}

impl<'a> Decoder<'a> {
    pub fn new(arena: &'a TypeArena) -> Self {
        Self { arena }
    }

    /// Decodes a top-level `id` from the start of `data`. Bytes past the
    /// wire size are ignored.
    pub fn decode(&self, id: TypeId, data: &[u8]) -> ReflectResult<Value> {
        let size = self.arena.wire_layout(id, false)?.size as usize;
        check_size(data, size)?;
        let value = self.read(id, &data[..size], false).inspect_err(|err| {
            warn!("decoding {} failed: {}", id, err);
        })?;
        debug!("decoded {} from {} bytes", id, size);
        Ok(value)
    }

    fn spec(&self, id: TypeId) -> ReflectResult<&'a TypeSpec> {
        self.arena
            .get(id)
            .ok_or(ReflectError::Model(cdr_types::ModelError::UnknownType(id.index())))
    }

    fn read(&self, id: TypeId, data: &[u8], packed: bool) -> ReflectResult<Value> {
        match self.spec(id)? {
            TypeSpec::Primitive(kind) => read_primitive(*kind, data),
            TypeSpec::Enum(spec) => read_enum(spec, data),
            TypeSpec::String(spec) => {
                let capacity = spec.bound() as usize + 1;
                check_size(data, capacity)?;
                let end = data[..capacity]
                    .iter()
                    .position(|b| *b == 0)
                    .ok_or(ReflectError::UnterminatedString {
                        capacity: capacity as u64,
                    })?;
                Ok(Value::String(String::from_utf8_lossy(&data[..end]).into_owned()))
            }
            TypeSpec::Array(spec) => {
                self.read_indexed(spec.element(), spec.dimensions(), data, packed)
            }
            TypeSpec::Sequence(spec) => {
                let layout = self.arena.sequence_layout(id, packed)?;
                let length = read_length(data)?;
                if length > spec.bound() {
                    return Err(ReflectError::BoundExceeded {
                        length,
                        bound: spec.bound(),
                    });
                }
                let stride = layout.element.size as usize;
                let base = layout.data_offset as usize;
                let mut items = Vec::with_capacity(length as usize);
                for i in 0..length as usize {
                    let start = base + i * stride;
                    check_size(data, start + stride)?;
                    items.push(self.read(spec.element(), &data[start..start + stride], packed)?);
                }
                Ok(Value::Sequence(items))
            }
            TypeSpec::Struct(spec) => self.read_struct(id, spec, data),
            TypeSpec::Union(spec) => self.read_union(id, spec, data),
        }
    }

    fn read_indexed(
        &self,
        id: TypeId,
        dimensions: &[u32],
        data: &[u8],
        packed: bool,
    ) -> ReflectResult<Value> {
        let Some((extent, rest)) = dimensions.split_first() else {
            return self.read(id, data, packed);
        };
        let stride = data.len() / *extent as usize;
        let items = (0..*extent as usize)
            .map(|i| self.read_indexed(id, rest, &data[i * stride..(i + 1) * stride], packed))
            .collect::<ReflectResult<Vec<_>>>()?;
        Ok(Value::Array(items))
    }

    fn read_struct(&self, id: TypeId, spec: &StructTypeSpec, data: &[u8]) -> ReflectResult<Value> {
        let layout = self.arena.struct_layout(id)?;
        check_size(data, layout.layout.size as usize)?;
        let mut fields = Vec::with_capacity(layout.fields.len());
        for ((_, declarator), field) in spec.declarators().zip(layout.fields.iter()) {
            let start = field.offset as usize;
            let end = start + (field.element.size * field.count) as usize;
            let value = self.read_indexed(
                field.type_id,
                declarator.dimensions(),
                &data[start..end],
                spec.packed(),
            )?;
            fields.push((declarator.identifier().to_string(), value));
        }
        Ok(Value::Struct(fields))
    }

    fn read_union(&self, id: TypeId, spec: &UnionTypeSpec, data: &[u8]) -> ReflectResult<Value> {
        let layout = self.arena.union_layout(id)?;
        check_size(data, layout.layout.size as usize)?;
        let disc_end = layout.discriminant.size as usize;
        let tag = self.read(spec.switch_type(), &data[..disc_end], spec.packed())?;
        let discriminant = discriminant_of(spec, &tag)?;

        let index = spec
            .select_member(discriminant)
            .ok_or_else(|| ReflectError::UnmatchedDiscriminant {
                type_name: spec.identifier().to_string(),
                discriminant,
            })?;
        let member = &spec.members()[index];
        let declarator = member.declarator();
        let element = self.arena.wire_layout(member.type_id(), spec.packed())?;
        let start = layout.data_offset as usize;
        let end = start + (element.size * declarator.element_count()) as usize;
        let value = self.read_indexed(
            member.type_id(),
            declarator.dimensions(),
            &data[start..end],
            spec.packed(),
        )?;
        Ok(Value::Union(UnionValue::new(discriminant, declarator.identifier(), value)))
    }
}

/* Integer discriminant of a decoded switch value */
pub(crate) fn discriminant_of(spec: &UnionTypeSpec, tag: &Value) -> ReflectResult<i64> {
    let discriminant = match (spec.switch_kind(), tag) {
        (SwitchKind::Integer(_), Value::Int(v)) => *v,
        (SwitchKind::Integer(_), Value::UInt(v)) => *v as i64,
        (SwitchKind::Char, Value::Char(c)) => *c as i64,
        (SwitchKind::Bool, Value::Bool(b)) => *b as i64,
        (SwitchKind::Enum { identifier, enumerators }, Value::Enum(name)) => enumerators
            .iter()
            .position(|e| e == name)
            .map(|i| i as i64)
            .ok_or_else(|| ReflectError::InvalidEnumValue {
                type_name: identifier.clone(),
                value: name.clone(),
            })?,
        (kind, tag) => {
            return Err(ReflectError::mismatch(format!("{} discriminant", kind), tag.kind_name()))
        }
    };
    Ok(discriminant)
}
