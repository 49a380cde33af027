/* Encoder producing the exact wire bytes of the generated encode routines */

use crate::errors::{ReflectError, ReflectResult};
use crate::primitives::{write_enum, write_length, write_primitive};
use crate::value::{UnionValue, Value};
use cdr_types::{StructTypeSpec, SwitchKind, TypeArena, TypeId, TypeSpec, UnionTypeSpec};
use tracing::debug;

pub struct Encoder<'a> {
    arena: &'a TypeArena,
}

impl<'a> Encoder<'a> {
    pub fn new(arena: &'a TypeArena) -> Self {
        Self { arena }
    }

    /// Wire bytes of `value` as a top-level `id`. Padding bytes are zero.
    pub fn encode(&self, id: TypeId, value: &Value) -> ReflectResult<Vec<u8>> {
        let layout = self.arena.wire_layout(id, false)?;
        let mut out = vec![0u8; layout.size as usize];
        self.write(id, value, &mut out, false)?;
        debug!("encoded {} into {} bytes", id, out.len());
        Ok(out)
    }

    fn spec(&self, id: TypeId) -> ReflectResult<&'a TypeSpec> {
        self.arena
            .get(id)
            .ok_or(ReflectError::Model(cdr_types::ModelError::UnknownType(id.index())))
    }

    /* `out` spans exactly the wire layout of `id` in its container */
    fn write(&self, id: TypeId, value: &Value, out: &mut [u8], packed: bool) -> ReflectResult<()> {
        match self.spec(id)? {
            TypeSpec::Primitive(kind) => write_primitive(*kind, value, out),
            TypeSpec::Enum(spec) => write_enum(spec, value, out),
            TypeSpec::String(spec) => {
                let Value::String(text) = value else {
                    return Err(ReflectError::mismatch("string", value.kind_name()));
                };
                /* Up to the first NUL, at most `bound` bytes; the rest stays zero */
                let bytes = text.as_bytes();
                let len = bytes
                    .iter()
                    .position(|b| *b == 0)
                    .unwrap_or(bytes.len())
                    .min(spec.bound() as usize);
                out[..len].copy_from_slice(&bytes[..len]);
                Ok(())
            }
            TypeSpec::Array(spec) => {
                self.write_indexed(spec.element(), spec.dimensions(), value, out, packed)
            }
            TypeSpec::Sequence(spec) => {
                let Value::Sequence(items) = value else {
                    return Err(ReflectError::mismatch("sequence", value.kind_name()));
                };
                let layout = self.arena.sequence_layout(id, packed)?;
                let count = items.len().min(spec.bound() as usize);
                write_length(out, count as u32)?;
                let stride = layout.element.size as usize;
                let base = layout.data_offset as usize;
                for (i, item) in items.iter().take(count).enumerate() {
                    let start = base + i * stride;
                    self.write(spec.element(), item, &mut out[start..start + stride], packed)?;
                }
                Ok(())
            }
            TypeSpec::Struct(spec) => self.write_struct(id, spec, value, out),
            TypeSpec::Union(spec) => self.write_union(id, spec, value, out),
        }
    }

    fn write_indexed(
        &self,
        id: TypeId,
        dimensions: &[u32],
        value: &Value,
        out: &mut [u8],
        packed: bool,
    ) -> ReflectResult<()> {
        let Some((extent, rest)) = dimensions.split_first() else {
            return self.write(id, value, out, packed);
        };
        let items = match value {
            Value::Array(items) if items.len() == *extent as usize => items,
            Value::Array(items) => {
                return Err(ReflectError::mismatch(
                    format!("array of {}", extent),
                    format!("array of {}", items.len()),
                ))
            }
            other => return Err(ReflectError::mismatch("array", other.kind_name())),
        };
        let stride = out.len() / *extent as usize;
        for (i, item) in items.iter().enumerate() {
            self.write_indexed(id, rest, item, &mut out[i * stride..(i + 1) * stride], packed)?;
        }
        Ok(())
    }

    fn write_struct(
        &self,
        id: TypeId,
        spec: &StructTypeSpec,
        value: &Value,
        out: &mut [u8],
    ) -> ReflectResult<()> {
        if !matches!(value, Value::Struct(_)) {
            let expected = format!("struct {}", spec.identifier());
            return Err(ReflectError::mismatch(expected, value.kind_name()));
        }
        let layout = self.arena.struct_layout(id)?;
        for ((_, declarator), field) in spec.declarators().zip(layout.fields.iter()) {
            let member = value.field(declarator.identifier()).ok_or_else(|| {
                ReflectError::mismatch(
                    format!("member '{}' of {}", declarator.identifier(), spec.identifier()),
                    "nothing",
                )
            })?;
            let start = field.offset as usize;
            let end = start + (field.element.size * field.count) as usize;
            self.write_indexed(
                field.type_id,
                declarator.dimensions(),
                member,
                &mut out[start..end],
                spec.packed(),
            )?;
        }
        Ok(())
    }

    fn write_union(
        &self,
        id: TypeId,
        spec: &UnionTypeSpec,
        value: &Value,
        out: &mut [u8],
    ) -> ReflectResult<()> {
        let Value::Union(UnionValue { discriminant, active }) = value else {
            let expected = format!("union {}", spec.identifier());
            return Err(ReflectError::mismatch(expected, value.kind_name()));
        };
        let layout = self.arena.union_layout(id)?;
        let tag = discriminant_value(spec, *discriminant)?;
        let disc_end = layout.discriminant.size as usize;
        self.write(spec.switch_type(), &tag, &mut out[..disc_end], spec.packed())?;

        let selected = spec.select_member(*discriminant);
        match (selected, active) {
            (None, None) => Ok(()),
            (None, Some((name, _))) => Err(ReflectError::mismatch(
                format!("no member for discriminant {}", discriminant),
                format!("member '{}'", name),
            )),
            (Some(index), active) => {
                let member = &spec.members()[index];
                let declarator = member.declarator();
                let inner = match active {
                    Some((name, inner)) if name == declarator.identifier() => inner,
                    Some((name, _)) => {
                        return Err(ReflectError::mismatch(
                            format!("member '{}'", declarator.identifier()),
                            format!("member '{}'", name),
                        ))
                    }
                    None => {
                        return Err(ReflectError::mismatch(
                            format!("member '{}'", declarator.identifier()),
                            "nothing",
                        ))
                    }
                };
                let element = self.arena.wire_layout(member.type_id(), spec.packed())?;
                let start = layout.data_offset as usize;
                let end = start + (element.size * declarator.element_count()) as usize;
                self.write_indexed(
                    member.type_id(),
                    declarator.dimensions(),
                    inner,
                    &mut out[start..end],
                    spec.packed(),
                )
            }
        }
    }
}

/* Discriminant as a value of the union's switch type */
pub(crate) fn discriminant_value(spec: &UnionTypeSpec, discriminant: i64) -> ReflectResult<Value> {
    let value = match spec.switch_kind() {
        SwitchKind::Integer(kind) if kind.is_signed() => Value::Int(discriminant),
        /* Unsigned 64-bit tags above i64::MAX travel as their bit pattern */
        SwitchKind::Integer(_) => Value::UInt(discriminant as u64),
        SwitchKind::Char if (0..=0xff).contains(&discriminant) => {
            Value::Char(discriminant as u8 as char)
        }
        SwitchKind::Bool if discriminant == 0 || discriminant == 1 => {
            Value::Bool(discriminant == 1)
        }
        SwitchKind::Enum { identifier, enumerators } => {
            let name = usize::try_from(discriminant)
                .ok()
                .and_then(|i| enumerators.get(i))
                .ok_or_else(|| ReflectError::InvalidEnumValue {
                    type_name: identifier.clone(),
                    value: discriminant.to_string(),
                })?;
            Value::Enum(name.clone())
        }
        kind => {
            return Err(ReflectError::mismatch(
                format!("{} discriminant", kind),
                format!("discriminant {}", discriminant),
            ))
        }
    };
    Ok(value)
}
