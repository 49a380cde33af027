use thiserror::Error;

/// Result alias used by every model construction call.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building the type model.
///
/// Every variant is produced synchronously by the insertion call that would
/// have broken an invariant; the model is left in its last valid state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A declarator with the same name already exists in the struct or union.
    #[error("'{type_name}' already declares a member named '{declarator}'")]
    DuplicateDeclarator {
        type_name: String,
        declarator: String,
    },

    /// An enumerator with the same name already exists in the enum.
    #[error("enum '{type_name}' already declares enumerator '{enumerator}'")]
    DuplicateEnumerator {
        type_name: String,
        enumerator: String,
    },

    /// The label resolves to a discriminant already claimed by a member.
    #[error("union '{type_name}' label {label} is already used by member '{member}'")]
    DuplicateLabel {
        type_name: String,
        label: String,
        member: String,
    },

    /// A second member was marked as the default case.
    #[error("union '{type_name}' already has default member '{member}'")]
    DuplicateDefault { type_name: String, member: String },

    /// The label cannot be represented by the union's switch type.
    #[error("union '{type_name}' label {label} is not valid for switch type {switch_type}")]
    InvalidLabel {
        type_name: String,
        label: String,
        switch_type: String,
    },

    /// The discriminant type of a union is not an ordinal type.
    #[error("union '{type_name}' cannot switch on non-ordinal type {switch_type}")]
    NonOrdinalSwitch {
        type_name: String,
        switch_type: String,
    },

    /// Array extents, string bounds and sequence bounds must be non-zero.
    #[error("'{name}' has a zero-sized extent or bound")]
    ZeroExtent { name: String },

    /// An annotation literal cannot be emitted (non-finite float or min > max).
    #[error("declarator '{declarator}' has an invalid annotation: {reason}")]
    InvalidAnnotation { declarator: String, reason: String },

    /// A member index passed to an insertion call does not exist.
    #[error("'{type_name}' has no member at index {index}")]
    UnknownMember { type_name: String, index: usize },

    /// A type id does not belong to the arena (or refers forward).
    #[error("type id {0} is not defined in this arena")]
    UnknownType(usize),

    /// The type graph contains a cycle.
    #[error("circular dependency detected: {0:?}")]
    CircularDependency(Vec<String>),
}
