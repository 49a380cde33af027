//! Annotation checks over dynamic values.
//!
//! Same outcomes as the generated `validate_*` and `transform_*` hooks:
//! bounds are inclusive, NaN never satisfies a floating point bound, and
//! only the active member of a union is visited.

use crate::errors::{ReflectError, ReflectResult};
use crate::value::{UnionValue, Value};
use cdr_types::{Annotation, Declarator, Literal, PrimitiveKind, TypeArena, TypeId, TypeSpec};

/* Struct or union name and member name used in violation reports */
struct Site<'a> {
    type_name: &'a str,
    member: &'a str,
}

/// Checks every `range`/`min`/`max` annotation reachable from `value`.
pub fn validate(arena: &TypeArena, id: TypeId, value: &Value) -> ReflectResult<()> {
    match arena.get(id) {
        Some(TypeSpec::Struct(spec)) => {
            for (member, declarator) in spec.declarators() {
                let Some(field) = value.field(declarator.identifier()) else {
                    continue;
                };
                let site = Site {
                    type_name: spec.identifier(),
                    member: declarator.identifier(),
                };
                validate_indexed(
                    arena,
                    member.type_id(),
                    declarator,
                    declarator.dimensions(),
                    field,
                    &site,
                )?;
            }
            Ok(())
        }
        Some(TypeSpec::Union(spec)) => {
            let Value::Union(UnionValue {
                discriminant,
                active: Some((name, inner)),
            }) = value
            else {
                return Ok(());
            };
            let Some(index) = spec.select_member(*discriminant) else {
                return Ok(());
            };
            let member = &spec.members()[index];
            let declarator = member.declarator();
            if declarator.identifier() != name {
                return Ok(());
            }
            let site = Site {
                type_name: spec.identifier(),
                member: declarator.identifier(),
            };
            validate_indexed(
                arena,
                member.type_id(),
                declarator,
                declarator.dimensions(),
                inner,
                &site,
            )
        }
        Some(_) => Ok(()),
        None => Err(cdr_types::ModelError::UnknownType(id.index()).into()),
    }
}

fn validate_indexed(
    arena: &TypeArena,
    id: TypeId,
    declarator: &Declarator,
    dimensions: &[u32],
    value: &Value,
    site: &Site<'_>,
) -> ReflectResult<()> {
    let Some((_, rest)) = dimensions.split_first() else {
        return validate_member(arena, id, declarator, value, site);
    };
    if let Value::Array(items) = value {
        for item in items {
            validate_indexed(arena, id, declarator, rest, item, site)?;
        }
    }
    Ok(())
}

fn validate_member(
    arena: &TypeArena,
    id: TypeId,
    declarator: &Declarator,
    value: &Value,
    site: &Site<'_>,
) -> ReflectResult<()> {
    match (arena.get(id), value) {
        (Some(TypeSpec::Primitive(kind)), value) => {
            for annotation in declarator.annotations().iter().filter(|a| a.is_validation()) {
                if !within_bounds(*kind, annotation, value) {
                    return Err(ReflectError::RangeViolation {
                        type_name: site.type_name.to_string(),
                        member: site.member.to_string(),
                        value: display(value),
                    });
                }
            }
            Ok(())
        }
        (Some(TypeSpec::Array(spec)), value) => {
            validate_indexed(arena, spec.element(), declarator, spec.dimensions(), value, site)
        }
        (Some(TypeSpec::Sequence(spec)), Value::Sequence(items)) => {
            for item in items.iter().take(spec.bound() as usize) {
                validate_member(arena, spec.element(), declarator, item, site)?;
            }
            Ok(())
        }
        (Some(TypeSpec::Struct(_)) | Some(TypeSpec::Union(_)), value) => validate(arena, id, value),
        _ => Ok(()),
    }
}

fn within_bounds(kind: PrimitiveKind, annotation: &Annotation, value: &Value) -> bool {
    let (min, max) = annotation.bounds();
    if kind.is_floating_point() {
        let Value::Float(v) = value else {
            return true;
        };
        let v = *v;
        /* NaN fails every comparison */
        return min.map_or(true, |lo| v >= lo.as_f64()) && max.map_or(true, |hi| v <= hi.as_f64());
    }
    if !kind.is_integer() {
        return true;
    }
    let v: i128 = match value {
        Value::Int(v) => *v as i128,
        Value::UInt(v) => *v as i128,
        _ => return true,
    };
    let above = |lo: Literal| match lo {
        Literal::Integer(lo) => v >= lo as i128,
        Literal::Float(lo) => v as f64 >= lo,
    };
    let below = |hi: Literal| match hi {
        Literal::Integer(hi) => v <= hi as i128,
        Literal::Float(hi) => v as f64 <= hi,
    };
    min.map_or(true, above) && max.map_or(true, below)
}

fn display(value: &Value) -> String {
    match value {
        Value::Int(v) => v.to_string(),
        Value::UInt(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        other => other.kind_name().to_string(),
    }
}

/// Applies every `round` annotation reachable from `value` in place.
pub fn transform(arena: &TypeArena, id: TypeId, value: &mut Value) -> ReflectResult<()> {
    match arena.get(id) {
        Some(TypeSpec::Struct(spec)) => {
            for (member, declarator) in spec.declarators() {
                if let Some(field) = value.field_mut(declarator.identifier()) {
                    let dimensions = declarator.dimensions();
                    transform_indexed(arena, member.type_id(), declarator, dimensions, field)?;
                }
            }
            Ok(())
        }
        Some(TypeSpec::Union(spec)) => {
            let Value::Union(UnionValue {
                discriminant,
                active: Some((name, inner)),
            }) = value
            else {
                return Ok(());
            };
            let Some(index) = spec.select_member(*discriminant) else {
                return Ok(());
            };
            let member = &spec.members()[index];
            let declarator = member.declarator();
            if declarator.identifier() != name.as_str() {
                return Ok(());
            }
            transform_indexed(arena, member.type_id(), declarator, declarator.dimensions(), inner)
        }
        Some(_) => Ok(()),
        None => Err(cdr_types::ModelError::UnknownType(id.index()).into()),
    }
}

fn transform_indexed(
    arena: &TypeArena,
    id: TypeId,
    declarator: &Declarator,
    dimensions: &[u32],
    value: &mut Value,
) -> ReflectResult<()> {
    let Some((_, rest)) = dimensions.split_first() else {
        return transform_member(arena, id, declarator, value);
    };
    if let Value::Array(items) = value {
        for item in items.iter_mut() {
            transform_indexed(arena, id, declarator, rest, item)?;
        }
    }
    Ok(())
}

fn transform_member(
    arena: &TypeArena,
    id: TypeId,
    declarator: &Declarator,
    value: &mut Value,
) -> ReflectResult<()> {
    match (arena.get(id), value) {
        (Some(TypeSpec::Primitive(kind)), Value::Float(v)) => {
            if declarator.annotations().contains(&Annotation::Round) {
                *v = match kind {
                    PrimitiveKind::Float => (*v as f32).round() as f64,
                    _ => v.round(),
                };
            }
            Ok(())
        }
        (Some(TypeSpec::Array(spec)), value) => {
            transform_indexed(arena, spec.element(), declarator, spec.dimensions(), value)
        }
        (Some(TypeSpec::Sequence(spec)), Value::Sequence(items)) => {
            for item in items.iter_mut().take(spec.bound() as usize) {
                transform_member(arena, spec.element(), declarator, item)?;
            }
            Ok(())
        }
        (Some(TypeSpec::Struct(_)) | Some(TypeSpec::Union(_)), value) => {
            transform(arena, id, value)
        }
        _ => Ok(()),
    }
}
