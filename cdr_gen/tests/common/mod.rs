/* Shared model for the code generation tests
 *
 *   geo::Color      enum { red, green, blue }
 *   geo::Point      packed struct { int32 x, y; }
 *   Samples         struct { int32 vals[4]; }
 *   Msg             union switch (int32) { 1: ping; 2, default: other; }
 *   MsgStrict       union switch (int32) { 1: ping; 2: other; }
 *   Choice          union switch (geo::Color) { red: r; green, blue: gb; }
 *   Flag            union switch (boolean) { TRUE: on; }
 *   Tag             packed struct { char code[4]; octet level; }
 *   Frame           packed struct { octet kind; geo::Point at; Msg msg; }
 *   Packet          packed union switch (int16) { 1: a; 2: b; }
 *   Telemetry       struct with every leaf kind and annotated members
 */

#![allow(dead_code)]

use anyhow::Result;
use cdr_types::{
    Annotation, Declarator, EnumTypeSpec, Label, Literal, PrimitiveKind, SequenceTypeSpec,
    StringTypeSpec, StructMember, StructTypeSpec, TypeArena, TypeId, TypeSpec, UnionMember,
    UnionTypeSpec,
};

pub struct Model {
    pub arena: TypeArena,
    pub color: TypeId,
    pub point: TypeId,
    pub samples: TypeId,
    pub msg: TypeId,
    pub msg_strict: TypeId,
    pub choice: TypeId,
    pub flag: TypeId,
    pub tag: TypeId,
    pub frame: TypeId,
    pub packet: TypeId,
    pub telemetry: TypeId,
}

impl Model {
    pub fn roots(&self) -> Vec<TypeId> {
        vec![
            self.telemetry,
            self.frame,
            self.samples,
            self.choice,
            self.flag,
            self.tag,
            self.packet,
        ]
    }
}

fn field(id: TypeId, name: &str) -> StructMember {
    StructMember::new(id).with_declarator(Declarator::new(name))
}

fn ping_union(
    arena: &TypeArena,
    name: &str,
    int32: TypeId,
    with_default: bool,
) -> Result<UnionTypeSpec> {
    let mut u = UnionTypeSpec::new(None, name, int32, false, arena)?;
    let ping = u.add_member(UnionMember::new(int32, Declarator::new("ping")))?;
    u.add_label(ping, Label::Integer(1))?;
    let other = u.add_member(UnionMember::new(int32, Declarator::new("other")))?;
    u.add_label(other, Label::Integer(2))?;
    if with_default {
        u.set_has_default(other)?;
    }
    Ok(u)
}

pub fn model() -> Result<Model> {
    let mut arena = TypeArena::new();
    let int32 = arena.primitive(PrimitiveKind::Int32);
    let int16 = arena.primitive(PrimitiveKind::Int16);
    let octet = arena.primitive(PrimitiveKind::Octet);
    let ch = arena.primitive(PrimitiveKind::Char);
    let boolean = arena.primitive(PrimitiveKind::Bool);
    let float = arena.primitive(PrimitiveKind::Float);
    let double = arena.primitive(PrimitiveKind::Double);

    let mut color = EnumTypeSpec::new(Some("geo".into()), "Color");
    for name in ["red", "green", "blue"] {
        color.add_enumerator(name)?;
    }
    let color = arena.insert(TypeSpec::Enum(color))?;

    let mut point = StructTypeSpec::new(Some("geo".into()), "Point", true);
    point.add_member(
        StructMember::new(int32)
            .with_declarator(Declarator::new("x"))
            .with_declarator(Declarator::new("y")),
    )?;
    let point = arena.insert(TypeSpec::Struct(point))?;

    let mut samples = StructTypeSpec::new(None, "Samples", false);
    samples.add_member(
        StructMember::new(int32).with_declarator(Declarator::new("vals").with_dimensions([4])),
    )?;
    let samples = arena.insert(TypeSpec::Struct(samples))?;

    let msg = ping_union(&arena, "Msg", int32, true)?;
    let msg = arena.insert(TypeSpec::Union(msg))?;
    let msg_strict = ping_union(&arena, "MsgStrict", int32, false)?;
    let msg_strict = arena.insert(TypeSpec::Union(msg_strict))?;

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

    let mut tag = StructTypeSpec::new(None, "Tag", true);
    tag.add_member(
        StructMember::new(ch).with_declarator(Declarator::new("code").with_dimensions([4])),
    )?;
    tag.add_member(field(octet, "level"))?;
    let tag = arena.insert(TypeSpec::Struct(tag))?;

    let mut frame = StructTypeSpec::new(None, "Frame", true);
    frame.add_member(field(octet, "kind"))?;
    frame.add_member(field(point, "at"))?;
    frame.add_member(field(msg, "msg"))?;
    let frame = arena.insert(TypeSpec::Struct(frame))?;

    let mut packet = UnionTypeSpec::new(None, "Packet", int16, true, &arena)?;
    let a = packet.add_member(UnionMember::new(int32, Declarator::new("a")))?;
    packet.add_label(a, Label::Integer(1))?;
    let b = packet.add_member(UnionMember::new(double, Declarator::new("b")))?;
    packet.add_label(b, Label::Integer(2))?;
    let packet = arena.insert(TypeSpec::Union(packet))?;

    let name = arena.insert(TypeSpec::String(StringTypeSpec::new(15)?))?;
    let readings = arena.insert(TypeSpec::Sequence(SequenceTypeSpec::new(int16, 4)?))?;
    let mut telemetry = StructTypeSpec::new(None, "Telemetry", false);
    telemetry.add_member(field(color, "color"))?;
    telemetry.add_member(field(point, "origin"))?;
    telemetry.add_member(field(msg, "msg"))?;
    telemetry.add_member(field(name, "name"))?;
    telemetry.add_member(StructMember::new(readings).with_declarator(
        Declarator::new("readings").with_annotation(Annotation::Range {
            min: Literal::Integer(-100),
            max: Literal::Integer(100),
        }),
    ))?;
    telemetry.add_member(StructMember::new(double).with_declarator(
        Declarator::new("level").with_annotation(Annotation::Range {
            min: Literal::Float(0.0),
            max: Literal::Float(1.0),
        }),
    ))?;
    telemetry.add_member(
        StructMember::new(float)
            .with_declarator(Declarator::new("gain").with_annotation(Annotation::Round)),
    )?;
    telemetry.add_member(
        StructMember::new(octet).with_declarator(Declarator::new("raw").with_dimensions([2, 3])),
    )?;
    telemetry.add_member(field(boolean, "ok"))?;
    telemetry.add_member(field(msg_strict, "strict"))?;
    let telemetry = arena.insert(TypeSpec::Struct(telemetry))?;

    Ok(Model {
        arena,
        color,
        point,
        samples,
        msg,
        msg_strict,
        choice,
        flag,
        tag,
        frame,
        packet,
        telemetry,
    })
}
