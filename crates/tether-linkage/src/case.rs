//! Reasons a declaration or expression is partially linked.

use crate::explorer::Partially;
use std::rc::Rc;
use tether_ir::{DeclId, ExprId, SymbolId};

/// One detected problem. Built fresh for every rewrite and rendered before
/// the offending node is replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkageCase {
    /// Only a synthetic stub (or nothing at all) backs the symbol; the
    /// declaration was likely removed from a newer version of its library.
    MissingDeclaration { symbol: SymbolId },

    /// An inner class or enum-entry class lost its enclosing class, for
    /// example because it became top-level.
    MissingEnclosingClass { class: DeclId },

    /// The declaration's signature mentions a classifier that is not fully
    /// linked.
    DeclarationUsesPartiallyLinkedSymbol {
        declaration: DeclId,
        cause: Rc<Partially>,
    },

    /// The expression references a declaration that does not exist.
    ExpressionUsesMissingDeclaration {
        expression: ExprId,
        symbol: SymbolId,
    },

    /// The expression operates on a type or classifier that is not fully
    /// linked.
    ExpressionUsesPartiallyLinkedSymbol {
        expression: ExprId,
        cause: Rc<Partially>,
    },

    /// The expression references a declaration whose signature mentions a
    /// classifier that is not fully linked.
    ExpressionUsesDeclarationThatUsesPartiallyLinkedSymbol {
        expression: ExprId,
        declaration: DeclId,
        cause: Rc<Partially>,
    },

    /// Synthetic member standing in for an abstract callable that a
    /// non-abstract class does not implement.
    UnimplementedAbstractCallable { member: DeclId },
}
