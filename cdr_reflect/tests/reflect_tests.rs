/* Reference codec tests
 *
 * Byte-exact encodings of packed and unpacked composites, the decode
 * failures a generated decode routine reports, and annotation checks over
 * decoded values.
 */

use anyhow::Result;
use cdr_reflect::{transform, validate, Decoder, Encoder, ReflectError, UnionValue, Value};
use cdr_types::{
    Annotation, Declarator, EnumTypeSpec, Label, Literal, PrimitiveKind, SequenceTypeSpec,
    StringTypeSpec, StructMember, StructTypeSpec, TypeArena, TypeId, TypeSpec, UnionMember,
    UnionTypeSpec,
};

struct Model {
    arena: TypeArena,
    frame: TypeId,
    choice: TypeId,
    flag: TypeId,
    sensor: TypeId,
}

fn field(id: TypeId, name: &str) -> StructMember {
    StructMember::new(id).with_declarator(Declarator::new(name))
}

/* geo::Point  packed { int32 x, y; }
 * Msg         union switch (int32) { 1: ping; 2, default: other; }
 * MsgStrict   union switch (int32) { 1: ping; 2: other; }
 * Frame       packed { octet kind; geo::Point at; Msg msg; }
 * Choice      union switch (geo::Color) { red: r; green, blue: gb; }
 * Flag        union switch (boolean) { TRUE: on; }
 * Sensor      struct with strings, sequences, arrays and annotations */
fn model() -> Result<Model> {
    let mut arena = TypeArena::new();
    let int32 = arena.primitive(PrimitiveKind::Int32);
    let int16 = arena.primitive(PrimitiveKind::Int16);
    let octet = arena.primitive(PrimitiveKind::Octet);
    let boolean = arena.primitive(PrimitiveKind::Bool);
    let float = arena.primitive(PrimitiveKind::Float);
    let double = arena.primitive(PrimitiveKind::Double);

    let mut color = EnumTypeSpec::new(Some("geo".into()), "Color");
    for name in ["red", "green", "blue"] {
        color.add_enumerator(name)?;
    }
    let color = arena.insert(TypeSpec::Enum(color))?;

    let mut point = StructTypeSpec::new(Some("geo".into()), "Point", true);
    point.add_member(field(int32, "x"))?;
    point.add_member(field(int32, "y"))?;
    let point = arena.insert(TypeSpec::Struct(point))?;

    let mut msgs = Vec::new();
    for (name, with_default) in [("Msg", true), ("MsgStrict", false)] {
        let mut u = UnionTypeSpec::new(None, name, int32, false, &arena)?;
        let ping = u.add_member(UnionMember::new(int32, Declarator::new("ping")))?;
        u.add_label(ping, Label::Integer(1))?;
        let other = u.add_member(UnionMember::new(int32, Declarator::new("other")))?;
        u.add_label(other, Label::Integer(2))?;
        if with_default {
            u.set_has_default(other)?;
        }
        msgs.push(arena.insert(TypeSpec::Union(u))?);
    }
    let (msg, msg_strict) = (msgs[0], msgs[1]);

    let mut frame = StructTypeSpec::new(None, "Frame", true);
    frame.add_member(field(octet, "kind"))?;
    frame.add_member(field(point, "at"))?;
    frame.add_member(field(msg, "msg"))?;
    let frame = arena.insert(TypeSpec::Struct(frame))?;

    let mut choice = UnionTypeSpec::new(None, "Choice", color, false, &arena)?;
    let r = choice.add_member(UnionMember::new(int32, Declarator::new("r")))?;
    choice.add_label(r, Label::Enumerator("red".into()))?;
    let gb = choice.add_member(UnionMember::new(double, Declarator::new("gb")))?;
    choice.add_label(gb, Label::Enumerator("green".into()))?;
    choice.add_label(gb, Label::Enumerator("blue".into()))?;
    let choice = arena.insert(TypeSpec::Union(choice))?;

    let mut flag = UnionTypeSpec::new(None, "Flag", boolean, false, &arena)?;
    let on = flag.add_member(UnionMember::new(float, Declarator::new("on")))?;
    flag.add_label(on, Label::Bool(true))?;
    let flag = arena.insert(TypeSpec::Union(flag))?;

    let name = arena.insert(TypeSpec::String(StringTypeSpec::new(15)?))?;
    let readings = arena.insert(TypeSpec::Sequence(SequenceTypeSpec::new(int16, 4)?))?;
    let mut sensor = StructTypeSpec::new(None, "Sensor", false);
    sensor.add_member(field(color, "color"))?;
    sensor.add_member(field(name, "name"))?;
    sensor.add_member(StructMember::new(readings).with_declarator(
        Declarator::new("readings").with_annotation(Annotation::Range {
            min: Literal::Integer(-100),
            max: Literal::Integer(100),
        }),
    ))?;
    sensor.add_member(
        StructMember::new(float)
            .with_declarator(Declarator::new("gain").with_annotation(Annotation::Round)),
    )?;
    sensor.add_member(
        StructMember::new(octet).with_declarator(Declarator::new("raw").with_dimensions([2, 3])),
    )?;
    sensor.add_member(field(boolean, "ok"))?;
    sensor.add_member(field(msg_strict, "strict"))?;
    let sensor = arena.insert(TypeSpec::Struct(sensor))?;

    Ok(Model {
        arena,
        frame,
        choice,
        flag,
        sensor,
    })
}

fn frame_value(discriminant: i64) -> Value {
    let msg = match discriminant {
        1 => UnionValue::new(1, "ping", Value::Int(5)),
        d => UnionValue::new(d, "other", Value::Int(5)),
    };
    Value::structure([
        ("kind", Value::UInt(7)),
        ("at", Value::structure([("x", Value::Int(1)), ("y", Value::Int(-1))])),
        ("msg", Value::Union(msg)),
    ])
}

fn sensor_value(readings: Vec<i64>, gain: f64) -> Value {
    let row = |start: u64| Value::Array((start..start + 3).map(Value::UInt).collect());
    Value::structure([
        ("color", Value::Enum("blue".into())),
        ("name", Value::String("sensor".into())),
        ("readings", Value::Sequence(readings.into_iter().map(Value::Int).collect())),
        ("gain", Value::Float(gain)),
        ("raw", Value::Array(vec![row(1), row(4)])),
        ("ok", Value::Bool(true)),
        ("strict", Value::Union(UnionValue::new(2, "other", Value::Int(-9)))),
    ])
}

#[test]
fn test_packed_frame_bytes() -> Result<()> {
    let model = model()?;
    let bytes = Encoder::new(&model.arena).encode(model.frame, &frame_value(1))?;

    assert_eq!(bytes.len() as u64, model.arena.static_wire_size(model.frame).unwrap_or(0));
    assert_eq!(
        bytes,
        vec![7, 0, 0, 0, 1, 0xff, 0xff, 0xff, 0xff, 0, 0, 0, 1, 0, 0, 0, 5]
    );
    assert_eq!(Decoder::new(&model.arena).decode(model.frame, &bytes)?, frame_value(1));
    Ok(())
}

#[test]
fn test_default_member_keeps_discriminant() -> Result<()> {
    let model = model()?;
    let bytes = Encoder::new(&model.arena).encode(model.frame, &frame_value(42))?;
    assert_eq!(&bytes[9..13], &[0, 0, 0, 42]);
    assert_eq!(Decoder::new(&model.arena).decode(model.frame, &bytes)?, frame_value(42));
    Ok(())
}

#[test]
fn test_unpacked_sensor_round_trip() -> Result<()> {
    let model = model()?;
    let value = sensor_value(vec![-100, 0, 100], 1.5);
    let bytes = Encoder::new(&model.arena).encode(model.sensor, &value)?;
    assert_eq!(bytes.len() as u64, model.arena.wire_layout(model.sensor, false)?.size);

    let decoded = Decoder::new(&model.arena).decode(model.sensor, &bytes)?;
    assert_eq!(decoded, value);
    validate(&model.arena, model.sensor, &decoded)?;
    Ok(())
}

#[test]
fn test_unmatched_strict_discriminant_is_rejected() -> Result<()> {
    let model = model()?;
    let mut bytes = Encoder::new(&model.arena).encode(model.sensor, &sensor_value(vec![], 0.0))?;
    let layout = model.arena.struct_layout(model.sensor)?;
    let strict = layout
        .fields
        .iter()
        .find(|f| f.name == "strict")
        .map(|f| f.offset as usize)
        .unwrap_or_default();
    bytes[strict..strict + 4].copy_from_slice(&99u32.to_be_bytes());

    let err = Decoder::new(&model.arena).decode(model.sensor, &bytes).unwrap_err();
    assert!(matches!(
        err,
        ReflectError::UnmatchedDiscriminant { ref type_name, discriminant: 99 }
            if type_name == "MsgStrict"
    ));
    Ok(())
}

#[test]
fn test_enum_switch_layout() -> Result<()> {
    let model = model()?;
    let value = Value::Union(UnionValue::new(1, "gb", Value::Float(0.5)));
    let bytes = Encoder::new(&model.arena).encode(model.choice, &value)?;
    assert_eq!(
        bytes,
        vec![0, 0, 0, 1, 0, 0, 0, 0, 0x3f, 0xe0, 0, 0, 0, 0, 0, 0]
    );
    assert_eq!(Decoder::new(&model.arena).decode(model.choice, &bytes)?, value);

    let mut bad = bytes.clone();
    bad[3] = 3;
    assert!(matches!(
        Decoder::new(&model.arena).decode(model.choice, &bad),
        Err(ReflectError::InvalidEnumValue { .. })
    ));
    Ok(())
}

#[test]
fn test_bool_switch_rejects_other_bytes() -> Result<()> {
    let model = model()?;
    let decoder = Decoder::new(&model.arena);
    let on = decoder.decode(model.flag, &[1, 0, 0, 0, 0x3f, 0x80, 0, 0])?;
    assert_eq!(on, Value::Union(UnionValue::new(1, "on", Value::Float(1.0))));

    assert!(matches!(
        decoder.decode(model.flag, &[0, 0, 0, 0, 0, 0, 0, 0]),
        Err(ReflectError::UnmatchedDiscriminant { discriminant: 0, .. })
    ));
    assert!(matches!(
        decoder.decode(model.flag, &[2, 0, 0, 0, 0, 0, 0, 0]),
        Err(ReflectError::InvalidBool { value: 2 })
    ));
    Ok(())
}

#[test]
fn test_corrupt_sensor_buffers() -> Result<()> {
    let model = model()?;
    let bytes = Encoder::new(&model.arena).encode(model.sensor, &sensor_value(vec![1], 0.0))?;
    let layout = model.arena.struct_layout(model.sensor)?;
    let offset_of = |name: &str| {
        layout
            .fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.offset as usize)
            .unwrap_or_default()
    };
    let decoder = Decoder::new(&model.arena);

    let mut unterminated = bytes.clone();
    let name = offset_of("name");
    unterminated[name..name + 16].fill(b'x');
    assert!(matches!(
        decoder.decode(model.sensor, &unterminated),
        Err(ReflectError::UnterminatedString { capacity: 16 })
    ));

    let mut too_long = bytes.clone();
    let readings = offset_of("readings");
    too_long[readings..readings + 4].copy_from_slice(&5u32.to_be_bytes());
    assert!(matches!(
        decoder.decode(model.sensor, &too_long),
        Err(ReflectError::BoundExceeded { length: 5, bound: 4 })
    ));

    assert!(matches!(
        decoder.decode(model.sensor, &bytes[..bytes.len() - 1]),
        Err(ReflectError::InsufficientData { .. })
    ));
    Ok(())
}

#[test]
fn test_annotations_on_decoded_values() -> Result<()> {
    let model = model()?;
    let bytes = Encoder::new(&model.arena).encode(model.sensor, &sensor_value(vec![5, 101], 2.5))?;
    let mut decoded = Decoder::new(&model.arena).decode(model.sensor, &bytes)?;

    let err = validate(&model.arena, model.sensor, &decoded).unwrap_err();
    assert!(matches!(
        err,
        ReflectError::RangeViolation { ref member, ref value, .. }
            if member == "readings" && value == "101"
    ));

    transform(&model.arena, model.sensor, &mut decoded)?;
    assert_eq!(decoded.field("gain"), Some(&Value::Float(3.0)));
    Ok(())
}
