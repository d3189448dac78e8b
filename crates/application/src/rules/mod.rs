mod chain;
mod engine;
mod expr;
mod functions;
mod reader;
mod rule;

pub use chain::Chain;
pub use engine::RuleEngine;
pub use expr::{Expr, Params};
pub use functions::{in_network, is_subdomain};
pub use reader::{parse_rules, read_rules};
pub use rule::Rule;
