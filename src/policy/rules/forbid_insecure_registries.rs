//! FORBID_INSECURE_REGISTRIES: no base images pulled over plain HTTP.

use super::Rule;
use crate::dockerfile::DirectiveView;
use crate::types::{Finding, RuleKind};

#[derive(Debug, Clone, Default)]
pub struct ForbidInsecureRegistries;

impl Rule for ForbidInsecureRegistries {
    fn kind(&self) -> RuleKind {
        RuleKind::ForbidInsecureRegistries
    }

    fn description(&self) -> &'static str {
        "Forbid the use of HTTP protocol for the registries from which source images are stored."
    }

    fn test(&self, view: &DirectiveView<'_>) -> Vec<Finding> {
        view.from
            .iter()
            .filter(|from| from.item.registry().starts_with("http://"))
            .map(|from| {
                Finding::new(
                    self.kind(),
                    format!(
                        "Registry {} uses HTTP and therefore it is considered insecure",
                        from.item.registry()
                    ),
                    "The FROM statement should be changed using images from a registry which uses HTTPS.",
                )
                .with_statement(from.raw_text())
            })
            .collect()
    }
}
