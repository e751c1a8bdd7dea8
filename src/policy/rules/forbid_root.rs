//! FORBID_ROOT: the container must not run as root.
//!
//! Only the last USER directive determines the runtime user. With no USER
//! directive at all the container runs as root, and the finding cites no
//! statement.

use super::Rule;
use crate::dockerfile::DirectiveView;
use crate::types::{Finding, RuleKind};

#[derive(Debug, Clone, Default)]
pub struct ForbidRoot;

impl Rule for ForbidRoot {
    fn kind(&self) -> RuleKind {
        RuleKind::ForbidRoot
    }

    fn description(&self) -> &'static str {
        "Forbid the container to run as a privileged (root) user."
    }

    fn test(&self, view: &DirectiveView<'_>) -> Vec<Finding> {
        match view.user.last() {
            None => vec![Finding::new(
                self.kind(),
                "No USER statements found. By default, if privileges are not dropped, the container will run as root.",
                "Create a user and add a USER statement before the entrypoint of the image to run the application as a non-privileged user.",
            )],
            Some(user) if user.item.is_root() => vec![
                Finding::new(
                    self.kind(),
                    "The last USER statement found elevates privileges to root.",
                    "Add one more USER statement before the entrypoint of the image to run the application as a non-privileged user.",
                )
                .with_statement(user.raw_text()),
            ],
            Some(_) => Vec::new(),
        }
    }
}
