//! formflow rules
//!
//! Field validation rules derived from declarative markup markers, plus the
//! value validators behind them. Shared by the pipeline (`formflow`) and the
//! browser bindings (`formflow-wasm`), so both judge values identically.

pub mod markers;
pub mod messages;
pub mod rule;
pub mod validators;

pub use markers::FieldMarkers;
pub use messages::RuleMessages;
pub use rule::{
    first_failure, parse_rules, Rule, RuleDescriptor, RuleError, RuleKind, RuleTag, RuleValue,
};
