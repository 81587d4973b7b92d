//! Type references attached to declarations and expressions.

use crate::SymbolId;

/// A type reference.
///
/// A simple type names a classifier symbol which may or may not resolve. The
/// marker type stands in for a reference that could not be resolved; it
/// erases to the nullable top type and remembers which classifier broke it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Simple {
        classifier: SymbolId,
        arguments: Vec<TypeArgument>,
        nullable: bool,
    },
    Marker(MarkerType),
}

/// A type argument of a generic type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeArgument {
    /// `*`
    Star,
    Projection(Type),
}

/// Sentinel type substituted for an unresolvable type reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerType {
    /// Classifier the marker erases to (the top type).
    pub erased_to: SymbolId,
    /// The classifier that was not fully linked.
    pub unlinked: SymbolId,
}

impl Type {
    /// Non-nullable type without arguments.
    pub fn simple(classifier: SymbolId) -> Self {
        Type::Simple {
            classifier,
            arguments: Vec::new(),
            nullable: false,
        }
    }

    /// Generic type applied to `arguments`.
    pub fn generic(classifier: SymbolId, arguments: Vec<TypeArgument>) -> Self {
        Type::Simple {
            classifier,
            arguments,
            nullable: false,
        }
    }

    /// The same type, made nullable.
    pub fn nullable(self) -> Self {
        match self {
            Type::Simple {
                classifier,
                arguments,
                ..
            } => Type::Simple {
                classifier,
                arguments,
                nullable: true,
            },
            marker @ Type::Marker(_) => marker,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, Type::Marker(_))
    }

    /// The classifier this type names. Markers name their erased classifier.
    pub fn classifier(&self) -> SymbolId {
        match self {
            Type::Simple { classifier, .. } => *classifier,
            Type::Marker(marker) => marker.erased_to,
        }
    }

    /// Every classifier this type mentions, the head first, then arguments
    /// depth-first in index order.
    pub fn classifiers(&self) -> Vec<SymbolId> {
        let mut out = Vec::new();
        self.collect_classifiers(&mut out);
        out
    }

    fn collect_classifiers(&self, out: &mut Vec<SymbolId>) {
        match self {
            Type::Simple {
                classifier,
                arguments,
                ..
            } => {
                out.push(*classifier);
                for arg in arguments {
                    if let TypeArgument::Projection(ty) = arg {
                        ty.collect_classifiers(out);
                    }
                }
            }
            Type::Marker(marker) => out.push(marker.erased_to),
        }
    }
}
