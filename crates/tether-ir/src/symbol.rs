//! Symbols and their serialized signatures.
//!
//! A symbol is the identity of a declaration as seen from other libraries.
//! It may or may not be bound to a real owner declaration: symbols of
//! declarations that were removed from a dependency stay unbound.

use crate::DeclId;
use la_arena::Idx;
use smol_str::SmolStr;
use std::fmt;

pub type SymbolId = Idx<Symbol>;

/// A reference-with-identity to a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// Serialized signature, absent for local declarations.
    pub signature: Option<Signature>,
    /// The real declaration, if there is one.
    pub owner: Option<DeclId>,
}

/// What kind of declaration a symbol refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SymbolKind {
    Class,
    EnumEntry,
    TypeParameter,
    Function,
    Constructor,
    Property,
    Field,
    Variable,
    ValueParameter,
    AnonymousInitializer,
}

impl SymbolKind {
    /// Whether a type may name a symbol of this kind as its classifier.
    pub fn is_classifier(self) -> bool {
        matches!(self, SymbolKind::Class | SymbolKind::TypeParameter)
    }
}

/// Cross-library identity of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Signature {
    /// `package/Outer.Inner.name|id`
    Public {
        package: SmolStr,
        declaration: SmolStr,
        id: Option<u64>,
    },
    /// Property accessor: the property's signature plus the accessor's own.
    Accessor {
        property: Box<Signature>,
        accessor: Box<Signature>,
    },
}

impl Signature {
    /// Public signature without a disambiguating id.
    pub fn public(package: impl Into<SmolStr>, declaration: impl Into<SmolStr>) -> Self {
        Signature::Public {
            package: package.into(),
            declaration: declaration.into(),
            id: None,
        }
    }

    /// Signature of a property accessor.
    pub fn accessor(property: Signature, accessor: Signature) -> Self {
        Signature::Accessor {
            property: Box::new(property),
            accessor: Box::new(accessor),
        }
    }

    pub fn with_id(self, id: u64) -> Self {
        match self {
            Signature::Public {
                package,
                declaration,
                ..
            } => Signature::Public {
                package,
                declaration,
                id: Some(id),
            },
            Signature::Accessor { property, accessor } => Signature::Accessor {
                property,
                accessor: Box::new(accessor.with_id(id)),
            },
        }
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self, Signature::Accessor { .. })
    }

    /// Best-effort declaration name: the last `segments` dotted segments of
    /// the declaration's qualified name.
    pub fn guess_name(&self, segments: usize) -> Option<String> {
        match self {
            Signature::Public { declaration, .. } => {
                if declaration.is_empty() {
                    return None;
                }
                let parts: Vec<&str> = declaration.split('.').collect();
                let from = parts.len().saturating_sub(segments.max(1));
                Some(parts[from..].join("."))
            }
            Signature::Accessor { accessor, .. } => accessor.guess_name(segments),
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::Public {
                package,
                declaration,
                id,
            } => {
                write!(f, "{}/{}", package, declaration)?;
                if let Some(id) = id {
                    write!(f, "|{}", id)?;
                }
                Ok(())
            }
            Signature::Accessor { accessor, .. } => accessor.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_public_signature() {
        assert_eq!(Signature::public("pkg", "Foo.bar").to_string(), "pkg/Foo.bar");
        assert_eq!(
            Signature::public("com.example", "Foo").with_id(42).to_string(),
            "com.example/Foo|42"
        );
    }

    #[test]
    fn test_guess_name() {
        let sig = Signature::public("pkg", "Outer.Inner.<init>");
        assert_eq!(sig.guess_name(1).as_deref(), Some("<init>"));
        assert_eq!(sig.guess_name(2).as_deref(), Some("Inner.<init>"));
        assert_eq!(sig.guess_name(5).as_deref(), Some("Outer.Inner.<init>"));
        assert_eq!(Signature::public("pkg", "").guess_name(1), None);
    }

    #[test]
    fn test_accessor_signature() {
        let sig = Signature::accessor(
            Signature::public("pkg", "Foo.count"),
            Signature::public("pkg", "Foo.count.<get-count>"),
        );
        assert!(sig.is_accessor());
        assert_eq!(sig.to_string(), "pkg/Foo.count.<get-count>");
        assert_eq!(sig.guess_name(2).as_deref(), Some("count.<get-count>"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_signature_serde() {
        let sig = Signature::public("pkg", "Foo.bar").with_id(7);
        let json = serde_json::to_string(&sig).unwrap();
        assert!(json.contains("Foo.bar"));
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);
    }
}
