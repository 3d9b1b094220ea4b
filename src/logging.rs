//! Log categories used as `log` targets.
//!
//! The library only emits records through the `log` facade. Hosts pick the
//! backend; filtering per concern works with targets such as
//! `RUST_LOG=entra_claims::lookup=debug`.

/// Area of the claims provider a log record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    Core,
    Configuration,
    Lookup,
    ClaimsPicking,
    Rehydration,
    Augmentation,
    Graph,
}

impl LogCategory {
    /// The `log` target for this category.
    pub const fn target(self) -> &'static str {
        match self {
            Self::Core => "entra_claims::core",
            Self::Configuration => "entra_claims::configuration",
            Self::Lookup => "entra_claims::lookup",
            Self::ClaimsPicking => "entra_claims::claims_picking",
            Self::Rehydration => "entra_claims::rehydration",
            Self::Augmentation => "entra_claims::augmentation",
            Self::Graph => "entra_claims::graph",
        }
    }
}
