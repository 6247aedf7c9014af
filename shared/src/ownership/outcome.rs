/// Result of a local ownership operation. Refusals are policy outcomes,
/// not errors, and are only logged at debug level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlOutcome {
    /// Request sent, the state changes when the confirmation arrives
    Requested,
    /// Applied locally right away (authority side)
    Completed,
    Refused(Refusal),
}

impl ControlOutcome {
    pub fn is_refused(&self) -> bool {
        matches!(self, ControlOutcome::Refused(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Refusal {
    /// Player-bound entities never change authority
    PlayerEntity,
    /// Entity's access level forbids the operation
    AccessLevel,
    /// Ownership is disabled by the policy
    OwnershipDisabled,
    AlreadyActive,
    NotActive,
    /// An accept predicate returned false
    Predicate,
    /// Transfer target is not a player entity with an owning connection
    TargetNotPlayer,
    /// Transfer target is this peer
    TargetIsSelf,
    /// Authority has nobody to release to
    IsAuthority,
    /// Local connection id not assigned yet
    NotConnected,
}
