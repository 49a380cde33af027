/* Big-endian leaf conversion shared by the encoder and decoder */

use crate::errors::{check_size, ReflectError, ReflectResult};
use crate::value::Value;
use cdr_types::{EnumTypeSpec, PrimitiveKind};

pub(crate) fn width(kind: PrimitiveKind) -> usize {
    kind.bits().bytes().unwrap_or(1) as usize
}

fn put_be(out: &mut [u8], raw: u64, width: usize) -> ReflectResult<()> {
    check_size(out, width)?;
    out[..width].copy_from_slice(&raw.to_be_bytes()[8 - width..]);
    Ok(())
}

fn get_be(data: &[u8], width: usize) -> ReflectResult<u64> {
    check_size(data, width)?;
    let mut bytes = [0u8; 8];
    bytes[8 - width..].copy_from_slice(&data[..width]);
    Ok(u64::from_be_bytes(bytes))
}

fn sign_extend(raw: u64, width: usize) -> i64 {
    let shift = 64 - width * 8;
    ((raw << shift) as i64) >> shift
}

fn integer_of(value: &Value) -> Option<i128> {
    match value {
        Value::Int(v) => Some(*v as i128),
        Value::UInt(v) => Some(*v as i128),
        _ => None,
    }
}

pub(crate) fn write_primitive(
    kind: PrimitiveKind,
    value: &Value,
    out: &mut [u8],
) -> ReflectResult<()> {
    let width = width(kind);
    let raw = match (kind, value) {
        (PrimitiveKind::Bool, Value::Bool(b)) => *b as u64,
        (PrimitiveKind::Char, Value::Char(c)) if (*c as u32) <= 0xff => *c as u64,
        (PrimitiveKind::Float, Value::Float(v)) => (*v as f32).to_bits() as u64,
        (PrimitiveKind::Double, Value::Float(v)) => v.to_bits(),
        (kind, value) if kind.is_integer() => {
            let (lo, hi) = kind
                .integer_range()
                .ok_or_else(|| ReflectError::mismatch(kind.idl_name(), value.kind_name()))?;
            match integer_of(value) {
                Some(v) if lo <= v && v <= hi => v as u64,
                Some(v) => {
                    let found = format!("out of range value {}", v);
                    return Err(ReflectError::mismatch(kind.idl_name(), found));
                }
                None => return Err(ReflectError::mismatch(kind.idl_name(), value.kind_name())),
            }
        }
        (kind, value) => return Err(ReflectError::mismatch(kind.idl_name(), value.kind_name())),
    };
    put_be(out, raw, width)
}

pub(crate) fn read_primitive(kind: PrimitiveKind, data: &[u8]) -> ReflectResult<Value> {
    let width = width(kind);
    let raw = get_be(data, width)?;
    let value = match kind {
        PrimitiveKind::Bool => match raw {
            0 => Value::Bool(false),
            1 => Value::Bool(true),
            other => return Err(ReflectError::InvalidBool { value: other as u8 }),
        },
        PrimitiveKind::Char => Value::Char(raw as u8 as char),
        PrimitiveKind::Float => Value::Float(f32::from_bits(raw as u32) as f64),
        PrimitiveKind::Double => Value::Float(f64::from_bits(raw)),
        kind if kind.is_signed() => Value::Int(sign_extend(raw, width)),
        _ => Value::UInt(raw),
    };
    Ok(value)
}

pub(crate) fn write_enum(spec: &EnumTypeSpec, value: &Value, out: &mut [u8]) -> ReflectResult<()> {
    let Value::Enum(name) = value else {
        let expected = format!("enum {}", spec.identifier());
        return Err(ReflectError::mismatch(expected, value.kind_name()));
    };
    let ordinal = spec.ordinal(name).ok_or_else(|| ReflectError::InvalidEnumValue {
        type_name: spec.identifier().to_string(),
        value: name.clone(),
    })?;
    put_be(out, ordinal as u64, 4)
}

pub(crate) fn read_enum(spec: &EnumTypeSpec, data: &[u8]) -> ReflectResult<Value> {
    let ordinal = get_be(data, 4)? as u32;
    let name = spec.enumerator(ordinal).ok_or_else(|| ReflectError::InvalidEnumValue {
        type_name: spec.identifier().to_string(),
        value: ordinal.to_string(),
    })?;
    Ok(Value::Enum(name.to_string()))
}

pub(crate) fn write_length(out: &mut [u8], length: u32) -> ReflectResult<()> {
    put_be(out, length as u64, 4)
}

pub(crate) fn read_length(data: &[u8]) -> ReflectResult<u32> {
    Ok(get_be(data, 4)? as u32)
}
