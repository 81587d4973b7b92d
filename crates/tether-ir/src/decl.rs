//! Declaration nodes.

use crate::{ExprId, FileId, Span, Statement, SymbolId, Type};
use la_arena::Idx;
use smol_str::SmolStr;

pub type DeclId = Idx<Declaration>;

/// A declaration in the IR tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub symbol: SymbolId,
    pub name: SmolStr,
    pub origin: DeclOrigin,
    /// Back-reference to the owning file or declaration. `None` only while the
    /// node is being built.
    pub parent: Option<Parent>,
    /// Source span for error reporting.
    pub span: Span,
    pub kind: DeclKind,
}

/// Where a declaration sits in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parent {
    File(FileId),
    Declaration(DeclId),
}

/// How a declaration came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeclOrigin {
    /// Written by the user (or lowered from user code).
    #[default]
    Defined,
    /// Synthetic stand-in for a declaration the linker could not find.
    MissingDeclaration,
    /// Synthetic implementation of an abstract member that a non-abstract
    /// class no longer implements.
    UnimplementedAbstractCallableMember,
}

impl DeclOrigin {
    /// Whether the declaration was synthesized by partial linkage and thus
    /// has no counterpart in source code.
    pub fn is_partial_linkage(self) -> bool {
        !matches!(self, DeclOrigin::Defined)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Internal,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Modality {
    #[default]
    Final,
    Open,
    Sealed,
    Abstract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    EnumClass,
    EnumEntry,
    AnnotationClass,
    Object,
}

/// Declaration kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Class(ClassDecl),
    /// Functions, constructors and property accessors.
    Function(FunctionDecl),
    Property(PropertyDecl),
    Field(FieldDecl),
    Variable(VariableDecl),
    ValueParameter(ValueParameterDecl),
    TypeParameter(TypeParameterDecl),
    EnumEntry(EnumEntryDecl),
    AnonymousInitializer(AnonymousInitializerDecl),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassDecl {
    pub class_kind: ClassKind,
    pub modality: Modality,
    pub visibility: Visibility,
    pub is_inner: bool,
    pub is_companion: bool,
    /// Anonymous objects (`object : Foo {}` expressions).
    pub is_anonymous: bool,
    pub super_types: Vec<Type>,
    pub type_parameters: Vec<DeclId>,
    /// Member declarations, in source order.
    pub declarations: Vec<DeclId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub modality: Modality,
    pub visibility: Visibility,
    pub type_parameters: Vec<DeclId>,
    pub dispatch_receiver: Option<DeclId>,
    pub extension_receiver: Option<DeclId>,
    pub value_parameters: Vec<DeclId>,
    pub return_type: Type,
    pub body: Option<Body>,
    pub overridden: Vec<SymbolId>,
    /// Set for property accessors.
    pub corresponding_property: Option<SymbolId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyDecl {
    pub modality: Modality,
    pub visibility: Visibility,
    pub is_var: bool,
    pub backing_field: Option<DeclId>,
    pub getter: Option<DeclId>,
    pub setter: Option<DeclId>,
    pub overridden: Vec<SymbolId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub visibility: Visibility,
    pub ty: Type,
    pub initializer: Option<ExprId>,
    /// Set for backing fields.
    pub corresponding_property: Option<SymbolId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub is_var: bool,
    pub ty: Type,
    pub initializer: Option<ExprId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueParameterDecl {
    pub ty: Type,
    /// Element type of a `vararg` parameter.
    pub vararg_element_type: Option<Type>,
    pub default_value: Option<ExprId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeParameterDecl {
    /// Upper bounds.
    pub super_types: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnumEntryDecl {
    /// Class of an entry with its own body.
    pub corresponding_class: Option<DeclId>,
    pub initializer: Option<ExprId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnonymousInitializerDecl {
    pub body: Body,
}

/// A block body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Body {
    pub statements: Vec<Statement>,
}

impl Body {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

impl Declaration {
    pub fn as_class(&self) -> Option<&ClassDecl> {
        match &self.kind {
            DeclKind::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_class_mut(&mut self) -> Option<&mut ClassDecl> {
        match &mut self.kind {
            DeclKind::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionDecl> {
        match &self.kind {
            DeclKind::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut FunctionDecl> {
        match &mut self.kind {
            DeclKind::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyDecl> {
        match &self.kind {
            DeclKind::Property(property) => Some(property),
            _ => None,
        }
    }

    pub fn as_value_parameter(&self) -> Option<&ValueParameterDecl> {
        match &self.kind {
            DeclKind::ValueParameter(param) => Some(param),
            _ => None,
        }
    }

    pub fn as_value_parameter_mut(&mut self) -> Option<&mut ValueParameterDecl> {
        match &mut self.kind {
            DeclKind::ValueParameter(param) => Some(param),
            _ => None,
        }
    }

    pub fn as_type_parameter(&self) -> Option<&TypeParameterDecl> {
        match &self.kind {
            DeclKind::TypeParameter(param) => Some(param),
            _ => None,
        }
    }

    pub fn as_type_parameter_mut(&mut self) -> Option<&mut TypeParameterDecl> {
        match &mut self.kind {
            DeclKind::TypeParameter(param) => Some(param),
            _ => None,
        }
    }

    /// Declared visibility, for declarations that have one.
    pub fn visibility(&self) -> Option<Visibility> {
        match &self.kind {
            DeclKind::Class(class) => Some(class.visibility),
            DeclKind::Function(function) => Some(function.visibility),
            DeclKind::Property(property) => Some(property.visibility),
            DeclKind::Field(field) => Some(field.visibility),
            DeclKind::Variable(_)
            | DeclKind::ValueParameter(_)
            | DeclKind::TypeParameter(_)
            | DeclKind::EnumEntry(_)
            | DeclKind::AnonymousInitializer(_) => None,
        }
    }

    /// Declared modality, for declarations that have one.
    pub fn modality(&self) -> Option<Modality> {
        match &self.kind {
            DeclKind::Class(class) => Some(class.modality),
            DeclKind::Function(function) => Some(function.modality),
            DeclKind::Property(property) => Some(property.modality),
            _ => None,
        }
    }

    /// Symbols this declaration overrides. Empty for non-overridable kinds.
    pub fn overridden(&self) -> &[SymbolId] {
        match &self.kind {
            DeclKind::Function(function) => &function.overridden,
            DeclKind::Property(property) => &property.overridden,
            _ => &[],
        }
    }

    /// Declared type of a typed value declaration.
    pub fn value_type(&self) -> Option<&Type> {
        match &self.kind {
            DeclKind::Field(field) => Some(&field.ty),
            DeclKind::Variable(variable) => Some(&variable.ty),
            DeclKind::ValueParameter(param) => Some(&param.ty),
            _ => None,
        }
    }
}
