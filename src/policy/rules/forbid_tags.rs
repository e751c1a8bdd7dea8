//! FORBID_TAGS: base images must not use floating tags.

use super::Rule;
use crate::dockerfile::DirectiveView;
use crate::types::{Finding, RuleKind};

#[derive(Debug, Clone)]
pub struct ForbidTags {
    forbidden: Vec<String>,
}

impl ForbidTags {
    pub fn new(forbidden: Vec<String>) -> Self {
        Self { forbidden }
    }
}

impl Rule for ForbidTags {
    fn kind(&self) -> RuleKind {
        RuleKind::ForbidTags
    }

    fn description(&self) -> &'static str {
        "Restrict the use of certain tags for the images the build is sourced from (using FROM command)"
    }

    fn details(&self) -> String {
        format!("The following tags are forbidden: {}.", self.forbidden.join(", "))
    }

    fn test(&self, view: &DirectiveView<'_>) -> Vec<Finding> {
        view.from
            .iter()
            .filter(|from| !from.item.is_scratch())
            .filter_map(|from| {
                let tag = from.item.tag()?;
                self.forbidden.iter().any(|t| t == tag).then(|| {
                    Finding::new(
                        self.kind(),
                        format!("Tag {} is not allowed.", tag),
                        format!(
                            "The FROM statements should be changed using an image with a fixed tag or without any of the following tags: {}",
                            self.forbidden.join(", ")
                        ),
                    )
                    .with_statement(from.raw_text())
                })
            })
            .collect()
    }
}
