use crate::arena::TypeId;
use crate::error::{ModelError, ModelResult};
use crate::types::Declarator;
use tracing::{debug, warn};

/// One element type shared by one or more declarators (`T a, b[3];`).
#[derive(Debug, Clone, PartialEq)]
pub struct StructMember {
    type_id: TypeId,
    declarators: Vec<Declarator>,
}

impl StructMember {
    pub fn new(type_id: TypeId) -> Self {
        Self {
            type_id,
            declarators: Vec::new(),
        }
    }

    /// Builder form used before the member is added to a struct. Name
    /// uniqueness is checked by `StructTypeSpec::add_member`.
    pub fn with_declarator(mut self, declarator: Declarator) -> Self {
        self.declarators.push(declarator);
        self
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn declarators(&self) -> &[Declarator] {
        &self.declarators
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructTypeSpec {
    namespace_prefix: Option<String>,
    identifier: String,
    packed: bool,
    members: Vec<StructMember>,
}

impl StructTypeSpec {
    pub fn new(
        namespace_prefix: Option<String>,
        identifier: impl Into<String>,
        packed: bool,
    ) -> Self {
        Self {
            namespace_prefix,
            identifier: identifier.into(),
            packed,
            members: Vec::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn namespace_prefix(&self) -> Option<&str> {
        self.namespace_prefix.as_deref()
    }

    pub fn packed(&self) -> bool {
        self.packed
    }

    pub fn members(&self) -> &[StructMember] {
        &self.members
    }

    /// Every declarator of the struct in wire order, paired with its member.
    pub fn declarators(&self) -> impl Iterator<Item = (&StructMember, &Declarator)> {
        self.members
            .iter()
            .flat_map(|m| m.declarators.iter().map(move |d| (m, d)))
    }

    fn has_declarator(&self, name: &str) -> bool {
        self.declarators().any(|(_, d)| d.identifier() == name)
    }

    fn check_declarator(&self, pending: &[Declarator], declarator: &Declarator) -> ModelResult<()> {
        let name = declarator.identifier();
        if self.has_declarator(name) || pending.iter().any(|d| d.identifier() == name) {
            warn!(
                "rejecting duplicate declarator '{}' in struct '{}'",
                name, self.identifier
            );
            return Err(ModelError::DuplicateDeclarator {
                type_name: self.identifier.clone(),
                declarator: name.to_string(),
            });
        }
        declarator.check()
    }

    /// Appends a member. All of its declarators are validated before the
    /// struct is touched; on error nothing is added.
    pub fn add_member(&mut self, member: StructMember) -> ModelResult<usize> {
        for (i, declarator) in member.declarators.iter().enumerate() {
            self.check_declarator(&member.declarators[..i], declarator)?;
        }
        self.members.push(member);
        let index = self.members.len() - 1;
        debug!("struct '{}': added member {}", self.identifier, index);
        Ok(index)
    }

    pub fn add_declarator(
        &mut self,
        member_index: usize,
        declarator: Declarator,
    ) -> ModelResult<()> {
        if member_index >= self.members.len() {
            return Err(ModelError::UnknownMember {
                type_name: self.identifier.clone(),
                index: member_index,
            });
        }
        self.check_declarator(&[], &declarator)?;
        debug!(
            "struct '{}': added declarator '{}' to member {}",
            self.identifier,
            declarator.identifier(),
            member_index
        );
        self.members[member_index].declarators.push(declarator);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Annotation, Literal};

    fn point() -> StructTypeSpec {
        let mut s = StructTypeSpec::new(None, "Point", true);
        let idx = s.add_member(StructMember::new(TypeId(0))).unwrap();
        s.add_declarator(idx, Declarator::new("x")).unwrap();
        s.add_declarator(idx, Declarator::new("y")).unwrap();
        s
    }

    #[test]
    fn test_declarators_in_wire_order() {
        let s = point();
        let names: Vec<_> = s.declarators().map(|(_, d)| d.identifier()).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert!(s.packed());
    }

    #[test]
    fn test_duplicate_declarator_rejected() {
        let mut s = point();
        let err = s.add_declarator(0, Declarator::new("x")).unwrap_err();
        assert_eq!(
            err,
            ModelError::DuplicateDeclarator {
                type_name: "Point".to_string(),
                declarator: "x".to_string(),
            }
        );
        assert_eq!(s.members()[0].declarators().len(), 2);
    }

    #[test]
    fn test_add_member_is_all_or_nothing() {
        let mut s = point();
        let member = StructMember::new(TypeId(0))
            .with_declarator(Declarator::new("z"))
            .with_declarator(Declarator::new("z"));
        assert!(s.add_member(member).is_err());
        assert_eq!(s.members().len(), 1);

        let clashing = StructMember::new(TypeId(0)).with_declarator(Declarator::new("y"));
        assert!(s.add_member(clashing).is_err());
        assert_eq!(s.members().len(), 1);
    }

    #[test]
    fn test_invalid_declarators_rejected() {
        let mut s = point();
        assert!(matches!(
            s.add_declarator(0, Declarator::new("v").with_dimensions([0])),
            Err(ModelError::ZeroExtent { .. })
        ));
        let bad =
            Declarator::new("w").with_annotation(Annotation::Min(Literal::Float(f64::INFINITY)));
        assert!(s.add_declarator(0, bad).is_err());
        assert!(matches!(
            s.add_declarator(5, Declarator::new("q")),
            Err(ModelError::UnknownMember { index: 5, .. })
        ));
    }
}
