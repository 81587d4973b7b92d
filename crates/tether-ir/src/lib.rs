//! Arena-based intermediate representation for the Tether linker.
//!
//! The IR is a forest of files, each holding a tree of declarations whose
//! bodies hold expression trees. All nodes live in arenas owned by a
//! [`Module`] and are addressed by index; parent links are plain indices and
//! never own anything.
//!
//! Symbols are the cross-library identities of declarations. A symbol whose
//! owner is absent refers to a declaration that the libraries being linked no
//! longer provide.

mod builder;
mod builtins;
mod decl;
mod expr;
mod span;
mod symbol;
mod types;
mod validation;

pub use builder::IrBuilder;
pub use builtins::Builtins;
pub use decl::*;
pub use expr::*;
pub use span::{FileEntry, Span};
pub use symbol::{Signature, Symbol, SymbolId, SymbolKind};
pub use types::{MarkerType, Type, TypeArgument};
pub use validation::{validate, ValidationError};

use la_arena::{Arena, Idx};
use smol_str::SmolStr;

pub type FileId = Idx<File>;

/// A linked module: every file and node of the forest.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub name: SmolStr,
    pub files: Arena<File>,
    pub symbols: Arena<Symbol>,
    pub declarations: Arena<Declaration>,
    pub expressions: Arena<Expression>,
}

/// A source file: the root of one declaration tree.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub entry: FileEntry,
    pub package: SmolStr,
    /// Top-level declarations, in source order.
    pub declarations: Vec<DeclId>,
}

/// A node of the tree, as reached while walking it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Declaration(DeclId),
    Expression(ExprId),
}

impl From<Statement> for Node {
    fn from(stmt: Statement) -> Self {
        match stmt {
            Statement::Declaration(decl) => Node::Declaration(decl),
            Statement::Expression(expr) => Node::Expression(expr),
        }
    }
}

impl Module {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_file(&mut self, entry: FileEntry, package: impl Into<SmolStr>) -> FileId {
        self.files.alloc(File {
            entry,
            package: package.into(),
            declarations: Vec::new(),
        })
    }

    /// Allocate an unbound symbol.
    pub fn add_symbol(&mut self, kind: SymbolKind, signature: Option<Signature>) -> SymbolId {
        self.symbols.alloc(Symbol {
            kind,
            signature,
            owner: None,
        })
    }

    /// Allocate a declaration and bind its symbol to it.
    ///
    /// The declaration is not linked into its parent's child list; use
    /// [`Module::attach`] for members and top-level declarations.
    pub fn add_declaration(&mut self, decl: Declaration) -> DeclId {
        let symbol = decl.symbol;
        let id = self.declarations.alloc(decl);
        self.symbols[symbol].owner = Some(id);
        id
    }

    pub fn add_expression(&mut self, expr: Expression) -> ExprId {
        self.expressions.alloc(expr)
    }

    /// Make `child` a member of `parent`: sets the back-reference and appends
    /// to the file's or class's declaration list.
    pub fn attach(&mut self, parent: Parent, child: DeclId) {
        self.declarations[child].parent = Some(parent);
        match parent {
            Parent::File(file) => self.files[file].declarations.push(child),
            Parent::Declaration(decl) => {
                if let Some(class) = self.declarations[decl].as_class_mut() {
                    class.declarations.push(child);
                }
            }
        }
    }

    /// Owner of a symbol, if it is bound.
    pub fn owner(&self, symbol: SymbolId) -> Option<&Declaration> {
        self.symbols[symbol].owner.map(|id| &self.declarations[id])
    }

    /// Whether the symbol has no real declaration behind it: it is unbound or
    /// bound to a stub synthesized for a missing declaration.
    pub fn is_missing(&self, symbol: SymbolId) -> bool {
        match self.owner(symbol) {
            None => true,
            Some(owner) => owner.origin == DeclOrigin::MissingDeclaration,
        }
    }

    /// Parent declaration, if the parent is not a file.
    pub fn parent_declaration(&self, decl: DeclId) -> Option<DeclId> {
        match self.declarations[decl].parent {
            Some(Parent::Declaration(parent)) => Some(parent),
            _ => None,
        }
    }

    /// File containing the declaration.
    pub fn file_of(&self, mut decl: DeclId) -> Option<FileId> {
        loop {
            match self.declarations[decl].parent? {
                Parent::File(file) => return Some(file),
                Parent::Declaration(parent) => decl = parent,
            }
        }
    }

    /// Syntactically enclosing class of a class, looking through the enum
    /// entry that owns an entry's body class.
    pub fn enclosing_class(&self, decl: DeclId) -> Option<DeclId> {
        let parent = self.parent_declaration(decl)?;
        match &self.declarations[parent].kind {
            DeclKind::Class(_) => Some(parent),
            DeclKind::EnumEntry(_) => self
                .parent_declaration(parent)
                .filter(|&outer| self.declarations[outer].as_class().is_some()),
            _ => None,
        }
    }

    /// Direct children of a declaration, in tree order.
    pub fn declaration_children(&self, decl: DeclId) -> Vec<Node> {
        let mut out = Vec::new();
        match &self.declarations[decl].kind {
            DeclKind::Class(class) => {
                out.extend(class.type_parameters.iter().copied().map(Node::Declaration));
                out.extend(class.declarations.iter().copied().map(Node::Declaration));
            }
            DeclKind::Function(function) => {
                out.extend(function.type_parameters.iter().copied().map(Node::Declaration));
                out.extend(function.dispatch_receiver.map(Node::Declaration));
                out.extend(function.extension_receiver.map(Node::Declaration));
                out.extend(function.value_parameters.iter().copied().map(Node::Declaration));
                if let Some(body) = &function.body {
                    out.extend(body.statements.iter().copied().map(Node::from));
                }
            }
            DeclKind::Property(property) => {
                out.extend(property.backing_field.map(Node::Declaration));
                out.extend(property.getter.map(Node::Declaration));
                out.extend(property.setter.map(Node::Declaration));
            }
            DeclKind::Field(field) => out.extend(field.initializer.map(Node::Expression)),
            DeclKind::Variable(variable) => {
                out.extend(variable.initializer.map(Node::Expression))
            }
            DeclKind::ValueParameter(param) => {
                out.extend(param.default_value.map(Node::Expression))
            }
            DeclKind::TypeParameter(_) => {}
            DeclKind::EnumEntry(entry) => {
                out.extend(entry.corresponding_class.map(Node::Declaration));
                out.extend(entry.initializer.map(Node::Expression));
            }
            DeclKind::AnonymousInitializer(init) => {
                out.extend(init.body.statements.iter().copied().map(Node::from));
            }
        }
        out
    }

    /// Direct children of an expression, including local declarations of
    /// blocks, in tree order.
    pub fn expression_children(&self, expr: ExprId) -> Vec<Node> {
        match &self.expressions[expr].kind {
            ExprKind::Block { statements, .. } => {
                statements.iter().copied().map(Node::from).collect()
            }
            kind => kind
                .child_expressions()
                .into_iter()
                .map(Node::Expression)
                .collect(),
        }
    }
}
