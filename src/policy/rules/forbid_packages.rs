//! FORBID_PACKAGES: dangerous packages must not be installed.
//!
//! Package-manager invocations are detected in the RUN directives of the
//! last build stage. A package installed and later removed is not counted.
//! When no invocation is detected at all, every RUN, CMD and ENTRYPOINT in
//! the file is matched against the package names instead; that fallback is
//! loose and accepts false positives such as `export FOO=curl`.

use std::collections::BTreeSet;

use log::{debug, warn};
use regex::Regex;

use super::Rule;
use crate::dockerfile::{DirectiveView, Located};
use crate::error::PolicyError;
use crate::parser::RunArgs;
use crate::shell::{PackageAction, PackageInvocation, ParsedShell};
use crate::types::{Finding, RuleKind};

#[derive(Debug, Clone)]
pub struct ForbidPackages {
    forbidden: Vec<String>,
    matchers: Vec<Regex>,
}

impl ForbidPackages {
    pub fn new(forbidden: Vec<String>) -> Result<Self, PolicyError> {
        let matchers = forbidden
            .iter()
            .map(|package| {
                let pattern = format!(
                    "(^|[^a-zA-Z0-9]){}([^a-zA-Z0-9]|$)",
                    regex::escape(package)
                );
                Regex::new(&pattern).map_err(|source| PolicyError::InvalidPattern {
                    pattern,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { forbidden, matchers })
    }

    fn invocations(run: &RunArgs) -> Option<Vec<PackageInvocation>> {
        match ParsedShell::parse(&run.command()) {
            Ok(parsed) => Some(parsed.package_invocations()),
            Err(e) => {
                warn!("Skipping RUN command for package detection: {}", e);
                None
            }
        }
    }

    fn net_installed<'a>(
        &self,
        runs: &[Located<'a, RunArgs>],
    ) -> Option<Vec<(String, Located<'a, RunArgs>)>> {
        let mut installed: Vec<(String, Located<'a, RunArgs>)> = Vec::new();
        let mut removed = BTreeSet::new();
        let mut detected = 0usize;

        for run in runs {
            let Some(invocations) = Self::invocations(run.item) else {
                continue;
            };
            detected += invocations.len();
            for invocation in invocations {
                match invocation.action {
                    Some(PackageAction::Install) => {
                        for package in invocation.packages {
                            if !installed.iter().any(|(p, _)| *p == package) {
                                installed.push((package, *run));
                            }
                        }
                    }
                    Some(PackageAction::Remove) => removed.extend(invocation.packages),
                    None => {}
                }
            }
        }

        if detected == 0 {
            return None;
        }
        debug!(
            "Found the following installed packages: {:?}",
            installed.iter().map(|(p, _)| p.as_str()).collect::<Vec<_>>()
        );
        installed.retain(|(package, _)| !removed.contains(package));
        Some(installed)
    }

    fn fallback(&self, view: &DirectiveView<'_>) -> Vec<Finding> {
        warn!("No automated package install detection. Falling back on dumb detection.");

        let mut statements: Vec<(u32, &str)> = view
            .run
            .iter()
            .map(|r| (r.line(), r.raw_text()))
            .chain(view.cmd.iter().map(|c| (c.line(), c.raw_text())))
            .chain(view.entrypoint.iter().map(|e| (e.line(), e.raw_text())))
            .collect();
        statements.sort_by_key(|(line, _)| *line);

        let mut findings = Vec::new();
        for (_, raw) in statements {
            for (package, matcher) in self.forbidden.iter().zip(&self.matchers) {
                if matcher.is_match(raw) {
                    findings.push(
                        Finding::new(
                            self.kind(),
                            format!("Forbidden package \"{}\" is installed or used.", package),
                            format!(
                                "The RUN/CMD/ENTRYPOINT statement should be reviewed and package \"{}\" should be removed unless absolutely necessary.",
                                package
                            ),
                        )
                        .with_statement(raw),
                    );
                }
            }
        }
        findings
    }
}

impl Rule for ForbidPackages {
    fn kind(&self) -> RuleKind {
        RuleKind::ForbidPackages
    }

    fn description(&self) -> &'static str {
        "Forbid the installation/use of dangerous packages."
    }

    fn details(&self) -> String {
        format!("The following packages are forbidden: {}.", self.forbidden.join(", "))
    }

    fn test(&self, view: &DirectiveView<'_>) -> Vec<Finding> {
        let Some(installed) = self.net_installed(&view.run_last_stage) else {
            return self.fallback(view);
        };

        self.forbidden
            .iter()
            .filter_map(|package| {
                let (_, run) = installed.iter().find(|(p, _)| p == package)?;
                Some(
                    Finding::new(
                        self.kind(),
                        format!("Forbidden package \"{}\" is installed.", package),
                        format!(
                            "The RUN statements should be reviewed and package \"{}\" should be removed unless absolutely necessary.",
                            package
                        ),
                    )
                    .with_statement(run.raw_text()),
                )
            })
            .collect()
    }
}
