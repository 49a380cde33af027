use crate::error::{ModelError, ModelResult};
use crate::types::{PrimitiveKind, TypeSpec};
use indexmap::IndexSet;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use tracing::{debug, warn};

/// Index of a type inside its `TypeArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) usize);

impl TypeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owns every type of a compilation unit.
///
/// A type may only reference types inserted before it, so the graph held by
/// an arena is acyclic by construction. Once inserted a type is immutable.
#[derive(Debug, Clone, Default)]
pub struct TypeArena {
    types: Vec<TypeSpec>,
}

impl TypeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeSpec> {
        self.types.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeSpec)> {
        self.types.iter().enumerate().map(|(i, t)| (TypeId(i), t))
    }

    pub fn insert(&mut self, spec: TypeSpec) -> ModelResult<TypeId> {
        if let Some(bad) = spec.references().into_iter().find(|r| r.0 >= self.types.len()) {
            warn!(
                "rejecting '{}': reference to undefined type {}",
                spec.identifier_name(),
                bad
            );
            return Err(ModelError::UnknownType(bad.0));
        }
        let id = TypeId(self.types.len());
        debug!("inserted type '{}' as {}", spec.qualified_name(), id);
        self.types.push(spec);
        Ok(id)
    }

    /// Returns the id of `kind`, inserting it on first use.
    pub fn primitive(&mut self, kind: PrimitiveKind) -> TypeId {
        if let Some(pos) = self
            .types
            .iter()
            .position(|t| matches!(t, TypeSpec::Primitive(k) if *k == kind))
        {
            return TypeId(pos);
        }
        self.types.push(TypeSpec::Primitive(kind));
        TypeId(self.types.len() - 1)
    }

    pub fn find(&self, qualified_name: &str) -> Option<TypeId> {
        self.iter()
            .find(|(_, t)| t.qualified_name() == qualified_name)
            .map(|(id, _)| id)
    }

    fn lookup(&self, id: TypeId) -> ModelResult<&TypeSpec> {
        self.get(id).ok_or(ModelError::UnknownType(id.0))
    }

    /// Every type reachable from `roots`, dependencies before dependents.
    ///
    /// Ties are broken by discovery order so the result is stable for a
    /// given arena and root list.
    pub fn topo_order(&self, roots: &[TypeId]) -> ModelResult<Vec<TypeId>> {
        let mut reachable: IndexSet<TypeId> = IndexSet::new();
        let mut stack: Vec<TypeId> = roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if !reachable.insert(id) {
                continue;
            }
            let refs = self.lookup(id)?.references();
            stack.extend(refs.into_iter().rev());
        }

        let mut in_degree: BTreeMap<TypeId, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<TypeId, Vec<TypeId>> = BTreeMap::new();
        for id in &reachable {
            let deps: IndexSet<TypeId> = self.lookup(*id)?.references().into_iter().collect();
            in_degree.insert(*id, deps.len());
            for dep in deps {
                dependents.entry(dep).or_default().push(*id);
            }
        }

        let mut queue: VecDeque<TypeId> = reachable
            .iter()
            .filter(|id| in_degree.get(id) == Some(&0))
            .copied()
            .collect();
        let mut order = Vec::with_capacity(reachable.len());
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for dependent in dependents.get(&id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(*dependent);
                    }
                }
            }
        }

        if order.len() != reachable.len() {
            let cycle: Vec<String> = reachable
                .iter()
                .filter(|id| !order.contains(id))
                .filter_map(|id| self.get(*id).map(TypeSpec::qualified_name))
                .collect();
            return Err(ModelError::CircularDependency(cycle));
        }
        Ok(order)
    }
}
