//! FORBID_PRIVILEGED_PORTS: no EXPOSE of ports at or below 1024.
//!
//! `$NAME` / `${NAME}` ports are resolved through ENV; the last definition
//! wins. A range is judged by its lower bound.

use log::debug;

use super::Rule;
use crate::dockerfile::DirectiveView;
use crate::parser::{parse_port_number, Port};
use crate::types::{Finding, RuleKind};

/// Highest privileged port number.
pub const MAX_PRIVILEGED_PORT: u32 = 1024;

#[derive(Debug, Clone, Default)]
pub struct ForbidPrivilegedPorts;

impl ForbidPrivilegedPorts {
    /// Resolve a port to a number, through ENV if needed.
    fn resolve(port: &Port, view: &DirectiveView<'_>) -> Option<u32> {
        if let Some(number) = port.number() {
            return Some(number);
        }
        let name = port.env_reference()?;
        let Some(value) = view.env_value(name) else {
            debug!("Port variable {} is not defined by any ENV", name);
            return None;
        };
        let value = value.split('/').next().unwrap_or(value);
        parse_port_number(value)
    }
}

impl Rule for ForbidPrivilegedPorts {
    fn kind(&self) -> RuleKind {
        RuleKind::ForbidPrivilegedPorts
    }

    fn description(&self) -> &'static str {
        "Forbid the image to expose privileged ports that require administrative permissions."
    }

    fn test(&self, view: &DirectiveView<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for expose in &view.expose {
            for port in expose.item {
                let Some(number) = Self::resolve(port, view) else {
                    continue;
                };
                if number <= MAX_PRIVILEGED_PORT {
                    findings.push(
                        Finding::new(
                            self.kind(),
                            format!(
                                "The container exposes a privileged port: {}. Privileged ports require the application which uses it to run as root.",
                                number
                            ),
                            "Change the configuration for the application to bind on a port greater than 1024, and change the Dockerfile to reflect this modification.",
                        )
                        .with_statement(expose.raw_text()),
                    );
                }
            }
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dockerfile::Dockerfile;
    use crate::parser::{Directive, DirectivePos};
    use crate::policy::rules::test_utils::run;

    #[test]
    fn test_literal_ports() {
        let findings = run(&ForbidPrivilegedPorts, "FROM a\nEXPOSE 80 8080 443/tcp");
        assert_eq!(findings.len(), 2);
        assert!(findings[0].details.contains(": 80."));
        assert!(findings[1].details.contains(": 443."));
    }

    #[test]
    fn test_boundary() {
        assert_eq!(run(&ForbidPrivilegedPorts, "FROM a\nEXPOSE 1024").len(), 1);
        assert!(run(&ForbidPrivilegedPorts, "FROM a\nEXPOSE 1025").is_empty());
    }

    #[test]
    fn test_range_uses_lower_bound() {
        assert_eq!(run(&ForbidPrivilegedPorts, "FROM a\nEXPOSE 1000-2000").len(), 1);
        assert!(run(&ForbidPrivilegedPorts, "FROM a\nEXPOSE 3000-3010").is_empty());
    }

    #[test]
    fn test_env_resolved_port() {
        assert_eq!(
            run(&ForbidPrivilegedPorts, "FROM a\nENV PORT 80\nEXPOSE ${PORT}").len(),
            1
        );
        assert!(run(&ForbidPrivilegedPorts, "FROM a\nENV PORT 8080\nEXPOSE ${PORT}").is_empty());
    }

    #[test]
    fn test_unresolved_reference_bypassing_normalisation() {
        // Build the view directly so the reference survives to the rule.
        let mut df = Dockerfile::new();
        df.add_directive(DirectivePos::new(
            Directive::Env(vec![("ADMIN".to_string(), "22".to_string())]),
            1,
            "ENV ADMIN=22",
        ));
        df.add_directive(DirectivePos::new(
            Directive::Expose(vec![Port::tcp("$ADMIN"), Port::tcp("${MISSING}")]),
            2,
            "EXPOSE $ADMIN ${MISSING}",
        ));
        let findings = ForbidPrivilegedPorts.test(&df.view());
        assert_eq!(findings.len(), 1);
        assert!(findings[0].details.contains(": 22."));
    }

    #[test]
    fn test_undefined_variable_not_applicable() {
        assert!(run(&ForbidPrivilegedPorts, "FROM a\nEXPOSE $PORT").is_empty());
    }
}
