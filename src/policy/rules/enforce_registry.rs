//! ENFORCE_REGISTRY: base images must come from approved registries.
//!
//! `scratch` and images built from an earlier stage of the same file
//! (`FROM build`) are exempt.

use super::Rule;
use crate::dockerfile::DirectiveView;
use crate::types::{Finding, RuleKind};

#[derive(Debug, Clone)]
pub struct EnforceRegistry {
    allowed: Vec<String>,
}

impl EnforceRegistry {
    pub fn new(allowed: Vec<String>) -> Self {
        Self { allowed }
    }
}

impl Rule for EnforceRegistry {
    fn kind(&self) -> RuleKind {
        RuleKind::EnforceRegistry
    }

    fn description(&self) -> &'static str {
        "Allow images to be based (using the FROM command) only on images belonging to approved repositories."
    }

    fn details(&self) -> String {
        format!("The following registries are allowed: {}.", self.allowed.join(", "))
    }

    fn test(&self, view: &DirectiveView<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (i, from) in view.from.iter().enumerate() {
            let image = from.item;
            if image.is_scratch() {
                continue;
            }
            let is_local_stage = view.from[..i]
                .iter()
                .any(|earlier| earlier.item.alias.as_deref() == Some(image.image.as_str()));
            if is_local_stage {
                continue;
            }

            let registry = image.registry();
            if !self.allowed.iter().any(|allowed| allowed == registry) {
                findings.push(
                    Finding::new(
                        self.kind(),
                        format!("Registry {} is not an allowed registry to pull images from.", registry),
                        format!(
                            "The FROM statement should be changed using images from one of the allowed registries: {}",
                            self.allowed.join(", ")
                        ),
                    )
                    .with_statement(from.raw_text()),
                );
            }
        }

        findings
    }
}
