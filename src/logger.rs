//! Logging transport is a collaborator, not the core's concern (spec §1):
//! warnings, debug output and deprecations are emitted through an injected
//! [`Logger`], never printed directly.

use crate::error::{Diagnostic, DiagnosticKind};

pub trait Logger {
    fn diagnostic(&self, diagnostic: &Diagnostic);
}

/// Forwards to the `log` crate, the way the rest of the ambient stack does.
/// This is the default used when no logger is supplied to [`crate::options::CompileOptions`].
#[derive(Default)]
pub struct TracingLogger {
    pub quiet_deps: bool,
    pub verbose: bool,
}

impl Logger for TracingLogger {
    fn diagnostic(&self, diagnostic: &Diagnostic) {
        let location = diagnostic
            .span
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_default();
        match diagnostic.kind {
            DiagnosticKind::Warning => {
                log::warn!("{} {}", diagnostic.message, location);
            }
            DiagnosticKind::Debug => {
                if self.verbose {
                    log::debug!("{} {}", diagnostic.message, location);
                }
            }
            DiagnosticKind::Deprecation(id) => {
                log::warn!("Deprecation [{}]: {} {}", id, diagnostic.message, location);
            }
        }
    }
}

/// Drops everything; used by tests that don't care about log output.
pub struct NullLogger;

impl Logger for NullLogger {
    fn diagnostic(&self, _diagnostic: &Diagnostic) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn a_null_logger_drops_every_diagnostic() {
        let logger = NullLogger;
        logger.diagnostic(&Diagnostic {
            kind: DiagnosticKind::Warning,
            message: "uh oh".to_string(),
            span: None,
        });
    }

    /// Records diagnostics instead of forwarding to the `log` crate, so a
    /// caller behind a `&dyn Logger` can be asserted against directly.
    struct RecordingLogger(RefCell<Vec<String>>);

    impl Logger for RecordingLogger {
        fn diagnostic(&self, diagnostic: &Diagnostic) {
            self.0.borrow_mut().push(diagnostic.message.clone());
        }
    }

    #[test]
    fn a_logger_is_reachable_through_a_trait_object() {
        let logger = RecordingLogger(RefCell::new(Vec::new()));
        let dyn_logger: &dyn Logger = &logger;
        dyn_logger.diagnostic(&Diagnostic {
            kind: DiagnosticKind::Debug,
            message: "first".to_string(),
            span: None,
        });
        dyn_logger.diagnostic(&Diagnostic {
            kind: DiagnosticKind::Deprecation(crate::error::DeprecationId::SlashDiv),
            message: "second".to_string(),
            span: None,
        });
        assert_eq!(logger.0.borrow().as_slice(), ["first", "second"]);
    }
}
