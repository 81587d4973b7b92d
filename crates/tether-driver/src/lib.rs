//! Linking driver for Tether libraries.
//!
//! This crate runs the linking pipeline over a deserialized module:
//! 1. Structural validation
//! 2. Partial linkage (or, when disabled, a hard error per unlinked symbol)
//! 3. Collection of diagnostics into a [`LinkResult`]

use miette::Diagnostic;
use tether_ir::{validate, Builtins, Module, ValidationError};
use tether_linkage::{
    find_unlinked_symbols, module_roots, patch_module, render, CollectingLogger, LinkageCase,
    Location, PartialLinkageConfig, PatchSummary, Severity,
};
use thiserror::Error;

/// Linker configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkerConfig {
    /// Partial linkage settings.
    pub partial_linkage: PartialLinkageConfig,
    /// Enable verbose output.
    pub verbose: bool,
}

/// Link result.
#[derive(Debug)]
pub struct LinkResult {
    /// Whether linking succeeded.
    pub success: bool,
    /// Errors encountered.
    pub errors: Vec<LinkDiagnostic>,
    /// Warnings and informational reports.
    pub warnings: Vec<LinkDiagnostic>,
    /// What partial linkage rewrote. Empty when it did not run.
    pub summary: PatchSummary,
}

/// A linker diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDiagnostic {
    pub message: String,
    pub location: Option<Location>,
}

/// Failures that stop the pipeline before any rewriting.
#[derive(Debug, Error, Diagnostic)]
pub enum LinkError {
    #[error("module `{module}` is malformed: {}", first_error(.errors))]
    #[diagnostic(code(tether::invalid_module))]
    InvalidModule {
        module: String,
        errors: Vec<ValidationError>,
    },
}

fn first_error(errors: &[ValidationError]) -> String {
    match errors {
        [] => String::new(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

/// Link a module in place.
pub fn link(
    module: &mut Module,
    builtins: &Builtins,
    config: LinkerConfig,
) -> miette::Result<LinkResult> {
    if config.verbose {
        tracing::info!("Validating {}...", module.name);
    }

    validate(module).map_err(|errors| LinkError::InvalidModule {
        module: module.name.to_string(),
        errors,
    })?;

    if !config.partial_linkage.is_enabled() {
        return Ok(reject_unlinked(module, builtins, config));
    }

    if config.verbose {
        tracing::info!("Running partial linkage...");
    }

    let mut logger = CollectingLogger::new();
    let summary = patch_module(module, builtins, &config.partial_linkage, &mut logger);

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    for report in logger.reports {
        let diagnostic = LinkDiagnostic {
            message: report.message,
            location: report.location,
        };
        match report.severity {
            Severity::Error => errors.push(diagnostic),
            Severity::Warning | Severity::Info => warnings.push(diagnostic),
        }
    }

    if config.verbose {
        tracing::info!(
            "Partial linkage rewrote {} declaration(s) and {} expression(s)",
            summary.rewritten_declarations,
            summary.rewritten_expressions
        );
    }

    Ok(LinkResult {
        success: errors.is_empty(),
        errors,
        warnings,
        summary,
    })
}

/// Report every unlinked symbol as an error without touching the tree.
fn reject_unlinked(module: &Module, builtins: &Builtins, config: LinkerConfig) -> LinkResult {
    let roots = module_roots(module, builtins);
    let errors: Vec<LinkDiagnostic> = find_unlinked_symbols(module, &roots)
        .into_iter()
        .map(|symbol| LinkDiagnostic {
            message: render(module, &LinkageCase::MissingDeclaration { symbol }),
            location: None,
        })
        .collect();

    if config.verbose {
        tracing::info!(
            "Partial linkage disabled: {} unlinked symbol(s)",
            errors.len()
        );
    }

    LinkResult {
        success: errors.is_empty(),
        errors,
        warnings: Vec::new(),
        summary: PatchSummary::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_ir::{
        ClassKind, ExprKind, IrBuilder, MemberAccess, Parent, Statement, SymbolKind, Type,
    };
    use tether_linkage::{PartialLinkageLogLevel, PartialLinkageMode};

    fn broken_module() -> (Module, Builtins) {
        let mut module = Module::new("app");
        let builtins = Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("main.kt", "");
        let b = ir.missing_symbol(SymbolKind::Class, "B");
        let gone = ir.missing_symbol(SymbolKind::Function, "gone");
        let a = ir.class(Parent::File(file), "A", ClassKind::Class);
        ir.add_super_type(a, Type::simple(b));
        let main = ir.function(Parent::File(file), "main", builtins.unit_type());
        let call = ir.expr(
            ExprKind::Call {
                access: MemberAccess::new(gone),
                super_qualifier: None,
            },
            builtins.unit_type(),
        );
        ir.set_body(main, vec![Statement::Expression(call)]);
        (module, builtins)
    }

    #[test]
    fn test_link_with_partial_linkage() {
        let (mut module, builtins) = broken_module();
        let result = link(&mut module, &builtins, LinkerConfig::default()).unwrap();

        assert!(result.success);
        assert!(result.errors.is_empty());
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(
            result.warnings[0].message,
            "The signature of class A uses unlinked symbol pkg/B"
        );
        assert_eq!(result.summary.rewritten_declarations, 1);
        assert_eq!(result.summary.rewritten_expressions, 1);
    }

    #[test]
    fn test_error_log_level_fails_the_link() {
        let (mut module, builtins) = broken_module();
        let config = LinkerConfig {
            partial_linkage: PartialLinkageConfig::builder()
                .log_level(PartialLinkageLogLevel::Error)
                .build(),
            verbose: false,
        };
        let result = link(&mut module, &builtins, config).unwrap();

        assert!(!result.success);
        assert_eq!(result.errors.len(), 2);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_disabled_partial_linkage_leaves_tree_untouched() {
        let (mut module, builtins) = broken_module();
        let before = format!("{:?}", module);
        let config = LinkerConfig {
            partial_linkage: PartialLinkageConfig::builder()
                .mode(PartialLinkageMode::Disabled)
                .build(),
            verbose: true,
        };
        let result = link(&mut module, &builtins, config).unwrap();

        assert!(!result.success);
        let messages: Vec<_> = result.errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "No class found for signature pkg/B",
                "No function found for signature pkg/gone"
            ]
        );
        assert!(result.summary.is_empty());
        assert_eq!(format!("{:?}", module), before);
    }

    #[test]
    fn test_clean_module_links() {
        let mut module = Module::new("app");
        let builtins = Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("main.kt", "");
        ir.function(Parent::File(file), "main", builtins.unit_type());

        let result = link(&mut module, &builtins, LinkerConfig::default()).unwrap();
        assert!(result.success);
        assert!(result.warnings.is_empty());
        assert!(result.summary.is_empty());
    }

    #[test]
    fn test_malformed_module_is_rejected() {
        let (mut module, builtins) = broken_module();
        let file = module.files.iter().map(|(id, _)| id).last().unwrap();
        let first = module.files[file].declarations[0];
        module.files[file].declarations.push(first);

        let err = link(&mut module, &builtins, LinkerConfig::default()).unwrap_err();
        assert!(err.to_string().starts_with("module `app` is malformed"));
    }
}
