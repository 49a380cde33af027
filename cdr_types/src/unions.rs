use crate::arena::{TypeArena, TypeId};
use crate::error::{ModelError, ModelResult};
use crate::types::{Declarator, PrimitiveKind, TypeSpec};
use std::fmt;
use tracing::{debug, warn};

/// A case label as written in the IDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Integer(i64),
    Char(char),
    Bool(bool),
    Enumerator(String),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Integer(v) => write!(f, "{}", v),
            Label::Char(c) => write!(f, "'{}'", c.escape_default()),
            Label::Bool(true) => f.write_str("TRUE"),
            Label::Bool(false) => f.write_str("FALSE"),
            Label::Enumerator(name) => f.write_str(name),
        }
    }
}

/// The discriminant type of a union, resolved from its switch `TypeId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchKind {
    Integer(PrimitiveKind),
    Char,
    Bool,
    Enum {
        identifier: String,
        enumerators: Vec<String>,
    },
}

impl SwitchKind {
    /// Resolves the switch type, rejecting anything that is not ordinal.
    pub fn resolve(spec: &TypeSpec) -> Option<SwitchKind> {
        match spec {
            TypeSpec::Primitive(PrimitiveKind::Char) => Some(SwitchKind::Char),
            TypeSpec::Primitive(PrimitiveKind::Bool) => Some(SwitchKind::Bool),
            TypeSpec::Primitive(kind) if kind.is_integer() => Some(SwitchKind::Integer(*kind)),
            TypeSpec::Enum(e) => Some(SwitchKind::Enum {
                identifier: e.identifier().to_string(),
                enumerators: e.enumerators().map(str::to_string).collect(),
            }),
            _ => None,
        }
    }

    /// Discriminant value of `label` under this switch kind, if the label
    /// can be represented.
    pub fn label_value(&self, label: &Label) -> Option<i64> {
        match (self, label) {
            (SwitchKind::Integer(kind), Label::Integer(v)) => {
                let (lo, hi) = kind.integer_range()?;
                let v128 = *v as i128;
                (lo <= v128 && v128 <= hi).then_some(*v)
            }
            (SwitchKind::Char, Label::Char(c)) => c.is_ascii().then_some(*c as i64),
            (SwitchKind::Bool, Label::Bool(b)) => Some(*b as i64),
            (SwitchKind::Enum { enumerators, .. }, Label::Enumerator(name)) => enumerators
                .iter()
                .position(|e| e == name)
                .map(|i| i as i64),
            _ => None,
        }
    }
}

impl fmt::Display for SwitchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchKind::Integer(kind) => f.write_str(kind.idl_name()),
            SwitchKind::Char => f.write_str("char"),
            SwitchKind::Bool => f.write_str("boolean"),
            SwitchKind::Enum { identifier, .. } => write!(f, "enum {}", identifier),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionMember {
    type_id: TypeId,
    declarator: Declarator,
    labels: Vec<(Label, i64)>,
    has_default: bool,
}

impl UnionMember {
    pub fn new(type_id: TypeId, declarator: Declarator) -> Self {
        Self {
            type_id,
            declarator,
            labels: Vec::new(),
            has_default: false,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn declarator(&self) -> &Declarator {
        &self.declarator
    }

    /// Labels in insertion order with their resolved discriminant values.
    pub fn labels(&self) -> &[(Label, i64)] {
        &self.labels
    }

    pub fn has_default(&self) -> bool {
        self.has_default
    }

    pub fn matches(&self, discriminant: i64) -> bool {
        self.labels.iter().any(|(_, v)| *v == discriminant)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionTypeSpec {
    namespace_prefix: Option<String>,
    identifier: String,
    switch_type: TypeId,
    switch_kind: SwitchKind,
    packed: bool,
    members: Vec<UnionMember>,
}

impl UnionTypeSpec {
    pub fn new(
        namespace_prefix: Option<String>,
        identifier: impl Into<String>,
        switch_type: TypeId,
        packed: bool,
        arena: &TypeArena,
    ) -> ModelResult<Self> {
        let identifier = identifier.into();
        let spec = arena
            .get(switch_type)
            .ok_or(ModelError::UnknownType(switch_type.index()))?;
        let switch_kind = SwitchKind::resolve(spec).ok_or_else(|| {
            warn!("union '{}' switch type is not ordinal", identifier);
            ModelError::NonOrdinalSwitch {
                type_name: identifier.clone(),
                switch_type: spec.identifier_name(),
            }
        })?;
        Ok(Self {
            namespace_prefix,
            identifier,
            switch_type,
            switch_kind,
            packed,
            members: Vec::new(),
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn namespace_prefix(&self) -> Option<&str> {
        self.namespace_prefix.as_deref()
    }

    pub fn switch_type(&self) -> TypeId {
        self.switch_type
    }

    pub fn switch_kind(&self) -> &SwitchKind {
        &self.switch_kind
    }

    pub fn packed(&self) -> bool {
        self.packed
    }

    pub fn members(&self) -> &[UnionMember] {
        &self.members
    }

    pub fn default_member(&self) -> Option<usize> {
        self.members.iter().position(|m| m.has_default)
    }

    /// First member in declaration order whose labels contain the
    /// discriminant, falling back to the default member.
    pub fn select_member(&self, discriminant: i64) -> Option<usize> {
        self.members
            .iter()
            .position(|m| m.matches(discriminant))
            .or_else(|| self.default_member())
    }

    fn member_mut(&mut self, index: usize) -> ModelResult<&mut UnionMember> {
        let type_name = self.identifier.clone();
        self.members
            .get_mut(index)
            .ok_or(ModelError::UnknownMember { type_name, index })
    }

    pub fn add_member(&mut self, member: UnionMember) -> ModelResult<usize> {
        let name = member.declarator.identifier();
        if self.members.iter().any(|m| m.declarator.identifier() == name) {
            warn!(
                "rejecting duplicate declarator '{}' in union '{}'",
                name, self.identifier
            );
            return Err(ModelError::DuplicateDeclarator {
                type_name: self.identifier.clone(),
                declarator: name.to_string(),
            });
        }
        member.declarator.check()?;
        // Labels and the default flag only enter through add_label and
        // set_has_default so they are always checked.
        let member = UnionMember {
            labels: Vec::new(),
            has_default: false,
            ..member
        };
        self.members.push(member);
        debug!(
            "union '{}': added member {}",
            self.identifier,
            self.members.len() - 1
        );
        Ok(self.members.len() - 1)
    }

    pub fn add_label(&mut self, member_index: usize, label: Label) -> ModelResult<()> {
        if member_index >= self.members.len() {
            return Err(ModelError::UnknownMember {
                type_name: self.identifier.clone(),
                index: member_index,
            });
        }
        let value = self.switch_kind.label_value(&label).ok_or_else(|| {
            warn!("union '{}': label {} rejected", self.identifier, label);
            ModelError::InvalidLabel {
                type_name: self.identifier.clone(),
                label: label.to_string(),
                switch_type: self.switch_kind.to_string(),
            }
        })?;
        if let Some(owner) = self.members.iter().find(|m| m.matches(value)) {
            warn!(
                "union '{}': label {} already used by '{}'",
                self.identifier,
                label,
                owner.declarator.identifier()
            );
            return Err(ModelError::DuplicateLabel {
                type_name: self.identifier.clone(),
                label: label.to_string(),
                member: owner.declarator.identifier().to_string(),
            });
        }
        self.member_mut(member_index)?.labels.push((label, value));
        Ok(())
    }

    pub fn set_has_default(&mut self, member_index: usize) -> ModelResult<()> {
        if let Some(existing) = self.default_member() {
            if existing == member_index {
                return Ok(());
            }
            let member = self.members[existing].declarator.identifier().to_string();
            warn!(
                "union '{}': second default member rejected",
                self.identifier
            );
            return Err(ModelError::DuplicateDefault {
                type_name: self.identifier.clone(),
                member,
            });
        }
        self.member_mut(member_index)?.has_default = true;
        Ok(())
    }
}
