//! The partial linkage tree patcher.
//!
//! Two sweeps run over every root, strictly one after the other:
//!
//! 1. Declarations: broken classes get a throwing anonymous initializer and
//!    lose their broken supertypes, broken signature types become marker
//!    types, and functions whose signature broke get a throwing body.
//! 2. Expressions: every expression that touches a missing declaration or a
//!    partially linked classifier is replaced, children and all, by a call to
//!    the linkage-error intrinsic.
//!
//! Nothing here fails. Each rewrite is reported once through the injected
//! [`MessageLogger`].

mod declarations;
mod expressions;
mod unimplemented;

use crate::case::LinkageCase;
use crate::config::PartialLinkageConfig;
use crate::explorer::ClassifierExplorer;
use crate::logger::{Location, MessageLogger, Severity};
use crate::render::render;
use rustc_hash::FxHashSet;
use tether_ir::{Builtins, DeclId, Expression, FileId, Module, Span};

/// Where a sweep starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Root {
    /// Every top-level declaration of a file.
    File(FileId),
    /// A single declaration, itself included.
    Declaration(DeclId),
}

/// What one run of the patcher changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatchSummary {
    /// Classes given a throwing initializer and functions given a throwing
    /// body.
    pub rewritten_declarations: usize,
    /// Expressions replaced by a linkage-error call.
    pub rewritten_expressions: usize,
    /// Members synthesized for unimplemented abstract callables.
    pub synthesized_members: usize,
}

impl PatchSummary {
    pub fn is_empty(&self) -> bool {
        self.rewritten_declarations == 0
            && self.rewritten_expressions == 0
            && self.synthesized_members == 0
    }
}

/// Rewrites a module so that it links even though some of the declarations
/// it references are missing or changed.
pub struct PartiallyLinkedTreePatcher<'a> {
    module: &'a mut Module,
    builtins: &'a Builtins,
    explorer: ClassifierExplorer,
    logger: &'a mut dyn MessageLogger,
    severity: Severity,
    summary: PatchSummary,
    /// Classes already checked for unimplemented abstract members.
    synthesized_for: FxHashSet<DeclId>,
}

impl<'a> PartiallyLinkedTreePatcher<'a> {
    pub fn new(
        module: &'a mut Module,
        builtins: &'a Builtins,
        config: &PartialLinkageConfig,
        logger: &'a mut dyn MessageLogger,
    ) -> Self {
        Self {
            module,
            builtins,
            explorer: ClassifierExplorer::new(),
            logger,
            severity: config.log_level.severity(),
            summary: PatchSummary::default(),
            synthesized_for: FxHashSet::default(),
        }
    }

    /// Run both sweeps over `roots`.
    pub fn patch(mut self, roots: &[Root]) -> PatchSummary {
        {
            let _span = tracing::debug_span!("declarations").entered();
            for &root in roots {
                self.sweep_declarations(root);
            }
        }
        {
            let _span = tracing::debug_span!("expressions").entered();
            for &root in roots {
                self.sweep_expressions(root);
            }
        }

        tracing::debug!(
            declarations = self.summary.rewritten_declarations,
            expressions = self.summary.rewritten_expressions,
            synthesized = self.summary.synthesized_members,
            "partial linkage finished"
        );
        self.summary
    }

    /// Render `case`, report it, and build the linkage-error call that
    /// replaces the offending node.
    fn throw_linkage_error(
        &mut self,
        case: &LinkageCase,
        span: Span,
        location: Option<Location>,
    ) -> Expression {
        let message = render(self.module, case);
        self.logger.report(self.severity, &message, location.as_ref());
        tracing::trace!(%message, "inserted linkage error");
        self.builtins.linkage_error_call(self.module, span, message)
    }
}

/// Every file of `module` except the built-ins, as roots.
pub fn module_roots(module: &Module, builtins: &Builtins) -> Vec<Root> {
    module
        .files
        .iter()
        .map(|(file, _)| file)
        .filter(|&file| file != builtins.file)
        .map(Root::File)
        .collect()
}

/// Patch every user file of `module`.
pub fn patch_module(
    module: &mut Module,
    builtins: &Builtins,
    config: &PartialLinkageConfig,
    logger: &mut dyn MessageLogger,
) -> PatchSummary {
    let roots = module_roots(module, builtins);
    PartiallyLinkedTreePatcher::new(module, builtins, config, logger).patch(&roots)
}
