//! Policy rules.
//!
//! Each rule inspects a `DirectiveView` and returns the findings it produces.
//! Rules are stateless: testing the same Dockerfile twice gives the same
//! findings, and a rule never fails. Directives it cannot interpret (an
//! unresolvable `$PORT`, a RUN with unbalanced quotes) are not applicable.

use std::fmt;

use crate::dockerfile::DirectiveView;
use crate::types::{Finding, RuleKind};

pub mod enforce_registry;
pub mod forbid_insecure_registries;
pub mod forbid_packages;
pub mod forbid_privileged_ports;
pub mod forbid_root;
pub mod forbid_secrets;
pub mod forbid_tags;

pub use enforce_registry::EnforceRegistry;
pub use forbid_insecure_registries::ForbidInsecureRegistries;
pub use forbid_packages::ForbidPackages;
pub use forbid_privileged_ports::ForbidPrivilegedPorts;
pub use forbid_root::ForbidRoot;
pub use forbid_secrets::ForbidSecrets;
pub use forbid_tags::ForbidTags;

/// A configured policy check.
pub trait Rule: Send + Sync + fmt::Debug {
    /// Get the rule kind.
    fn kind(&self) -> RuleKind;

    /// Human description of what the rule enforces.
    fn description(&self) -> &'static str;

    /// The rule's configuration, for documentation.
    fn details(&self) -> String {
        String::new()
    }

    /// Evaluate the rule.
    fn test(&self, view: &DirectiveView<'_>) -> Vec<Finding>;
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::Rule;
    use crate::dockerfile::Dockerfile;
    use crate::types::Finding;

    /// Parse `content` and run a single rule over it.
    pub fn run(rule: &dyn Rule, content: &str) -> Vec<Finding> {
        let dockerfile = Dockerfile::parse_str(content).unwrap();
        rule.test(&dockerfile.view())
    }
}
