//! Structural validation: ensure a forest handed over by the front-end is
//! well-formed before any pass rewrites it.

use crate::{DeclId, ExprId, Module, Node, Parent};
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use thiserror::Error;

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("declaration `{name}` has a parent link that does not point at its container")]
    ParentMismatch { name: SmolStr },

    #[error("declaration `{name}` is not the owner of its own symbol")]
    OwnerMismatch { name: SmolStr },

    #[error("declaration `{name}` is reachable more than once")]
    SharedDeclaration { name: SmolStr },

    #[error("expression is reachable more than once")]
    SharedExpression,
}

/// Validate every file of a module.
pub fn validate(module: &Module) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen_decls = FxHashSet::default();
    let mut seen_exprs = FxHashSet::default();

    for (file, contents) in module.files.iter() {
        for &decl in &contents.declarations {
            validate_declaration(
                module,
                decl,
                Parent::File(file),
                &mut seen_decls,
                &mut seen_exprs,
                &mut errors,
            );
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_declaration(
    module: &Module,
    decl: DeclId,
    expected_parent: Parent,
    seen_decls: &mut FxHashSet<DeclId>,
    seen_exprs: &mut FxHashSet<ExprId>,
    errors: &mut Vec<ValidationError>,
) {
    let declaration = &module.declarations[decl];
    if !seen_decls.insert(decl) {
        errors.push(ValidationError::SharedDeclaration {
            name: declaration.name.clone(),
        });
        return;
    }

    if declaration.parent != Some(expected_parent) {
        errors.push(ValidationError::ParentMismatch {
            name: declaration.name.clone(),
        });
    }
    if module.symbols[declaration.symbol].owner != Some(decl) {
        errors.push(ValidationError::OwnerMismatch {
            name: declaration.name.clone(),
        });
    }

    for child in module.declaration_children(decl) {
        validate_node(module, child, decl, seen_decls, seen_exprs, errors);
    }
}

/// Declarations nested in expressions belong to the closest declaration.
fn validate_node(
    module: &Module,
    node: Node,
    container: DeclId,
    seen_decls: &mut FxHashSet<DeclId>,
    seen_exprs: &mut FxHashSet<ExprId>,
    errors: &mut Vec<ValidationError>,
) {
    match node {
        Node::Declaration(decl) => validate_declaration(
            module,
            decl,
            Parent::Declaration(container),
            seen_decls,
            seen_exprs,
            errors,
        ),
        Node::Expression(expr) => {
            if !seen_exprs.insert(expr) {
                errors.push(ValidationError::SharedExpression);
                return;
            }
            for child in module.expression_children(expr) {
                validate_node(module, child, container, seen_decls, seen_exprs, errors);
            }
        }
    }
}
