pub mod context;
pub mod defaults;
pub mod flag;
pub mod rule;
pub mod ruleset;
pub mod value;

pub use context::{Attribute, Context};
pub use defaults::DefaultsCollection;
pub use flag::{Flag, FlagKind, Target, ValueEnvelope};
pub use rule::{Condition, ConditionValue, Operator, Rule};
pub use ruleset::RuleSet;
pub use value::{FlagValue, ValuePayload};
