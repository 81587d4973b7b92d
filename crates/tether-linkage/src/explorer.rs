//! Classifier reachability: decides whether a class, type parameter or type
//! is fully linked, and if not, what broke it.

use rustc_hash::FxHashMap;
use std::rc::Rc;
use tether_ir::{ClassKind, DeclKind, DeclOrigin, Module, SymbolId, Type, TypeArgument};

/// Linkage status of a classifier or type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkageStatus {
    Fully,
    Partially(Rc<Partially>),
}

/// Why a classifier is not fully linked.
///
/// Root causes nest but always end in a [`Partially::MissingClassifier`] or a
/// [`Partially::MissingEnclosingClass`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Partially {
    /// The classifier has no real declaration.
    MissingClassifier(SymbolId),
    /// An inner class or enum-entry class whose enclosing class is gone.
    MissingEnclosingClass(SymbolId),
    /// A supertype or the enclosing class is not fully linked.
    DueToOtherClassifier {
        symbol: SymbolId,
        root_cause: Rc<Partially>,
    },
}

impl Partially {
    pub fn symbol(&self) -> SymbolId {
        match self {
            Partially::MissingClassifier(symbol)
            | Partially::MissingEnclosingClass(symbol)
            | Partially::DueToOtherClassifier { symbol, .. } => *symbol,
        }
    }

    /// The innermost cause.
    pub fn innermost(&self) -> &Partially {
        match self {
            Partially::DueToOtherClassifier { root_cause, .. } => root_cause.innermost(),
            cause => cause,
        }
    }
}

impl LinkageStatus {
    pub fn is_fully(&self) -> bool {
        matches!(self, LinkageStatus::Fully)
    }

    pub fn partially(&self) -> Option<&Rc<Partially>> {
        match self {
            LinkageStatus::Fully => None,
            LinkageStatus::Partially(cause) => Some(cause),
        }
    }

    pub fn into_partially(self) -> Option<Rc<Partially>> {
        match self {
            LinkageStatus::Fully => None,
            LinkageStatus::Partially(cause) => Some(cause),
        }
    }

    fn partially_linked(cause: Partially) -> Self {
        LinkageStatus::Partially(Rc::new(cause))
    }
}

/// Memoizing explorer over the classifier graph of one module.
///
/// The cache lives as long as the explorer; one explorer serves one run of
/// the pass.
#[derive(Debug, Default)]
pub struct ClassifierExplorer {
    cache: FxHashMap<SymbolId, LinkageStatus>,
    /// Classifiers being explored, with their depth on the exploration stack.
    in_progress: FxHashMap<SymbolId, usize>,
    /// Shallowest stack depth at which a cycle was cut during the current
    /// computation.
    cut_at: Option<usize>,
}

impl ClassifierExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status of a type: its classifier first, then its type arguments in
    /// index order. Star projections and marker types are fully linked.
    pub fn explore_type(&mut self, module: &Module, ty: &Type) -> LinkageStatus {
        match ty {
            Type::Marker(_) => LinkageStatus::Fully,
            Type::Simple {
                classifier,
                arguments,
                ..
            } => {
                let status = self.explore_symbol(module, *classifier);
                if !status.is_fully() {
                    return status;
                }
                for argument in arguments {
                    if let TypeArgument::Projection(argument) = argument {
                        let status = self.explore_type(module, argument);
                        if !status.is_fully() {
                            return status;
                        }
                    }
                }
                LinkageStatus::Fully
            }
        }
    }

    /// Status of a classifier symbol.
    pub fn explore_symbol(&mut self, module: &Module, symbol: SymbolId) -> LinkageStatus {
        if let Some(status) = self.cache.get(&symbol) {
            return status.clone();
        }
        if let Some(&depth) = self.in_progress.get(&symbol) {
            // The cycle closes here; the classifiers on it decide for themselves.
            self.cut_at = Some(self.cut_at.map_or(depth, |cut| cut.min(depth)));
            return LinkageStatus::Fully;
        }

        let depth = self.in_progress.len();
        self.in_progress.insert(symbol, depth);
        let outer_cut = self.cut_at.take();
        let status = self.compute(module, symbol);
        self.in_progress.remove(&symbol);

        // A fully linked result that relied on a cycle cut above this
        // classifier is only provisional: the classifier cut at may still
        // turn out broken.
        let cut_above = self.cut_at.filter(|&cut| cut < depth);
        self.cut_at = match (outer_cut, cut_above) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let provisional = cut_above.is_some() && status.is_fully();

        tracing::trace!(?symbol, fully = status.is_fully(), provisional, "explored classifier");
        if !provisional {
            self.cache.insert(symbol, status.clone());
        }
        status
    }

    fn compute(&mut self, module: &Module, symbol: SymbolId) -> LinkageStatus {
        let Some(owner_id) = module.symbols[symbol].owner else {
            return LinkageStatus::partially_linked(Partially::MissingClassifier(symbol));
        };
        let owner = &module.declarations[owner_id];
        if owner.origin == DeclOrigin::MissingDeclaration {
            return LinkageStatus::partially_linked(Partially::MissingClassifier(symbol));
        }

        match &owner.kind {
            DeclKind::Class(class) => {
                let enclosing = module.enclosing_class(owner_id);
                let needs_enclosing = class.is_inner || class.class_kind == ClassKind::EnumEntry;
                let enclosing_missing = enclosing.map_or(true, |outer| {
                    module.declarations[outer].origin == DeclOrigin::MissingDeclaration
                });
                if needs_enclosing && enclosing_missing {
                    return LinkageStatus::partially_linked(Partially::MissingEnclosingClass(symbol));
                }

                for super_type in &class.super_types {
                    if let LinkageStatus::Partially(cause) = self.explore_type(module, super_type) {
                        return LinkageStatus::partially_linked(Partially::DueToOtherClassifier {
                            symbol,
                            root_cause: cause,
                        });
                    }
                }

                if let Some(outer) = enclosing {
                    let outer_symbol = module.declarations[outer].symbol;
                    if let LinkageStatus::Partially(cause) = self.explore_symbol(module, outer_symbol)
                    {
                        return LinkageStatus::partially_linked(Partially::DueToOtherClassifier {
                            symbol,
                            root_cause: cause,
                        });
                    }
                }
                LinkageStatus::Fully
            }
            DeclKind::TypeParameter(param) => param
                .super_types
                .iter()
                .map(|bound| self.explore_type(module, bound))
                .find(|status| !status.is_fully())
                .unwrap_or(LinkageStatus::Fully),
            _ => LinkageStatus::Fully,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_ir::{Builtins, IrBuilder, Parent, SymbolKind};

    #[test]
    fn test_fully_linked_class() {
        let mut module = Module::new("lib");
        let builtins = Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("A.kt", "");
        let a = ir.class(Parent::File(file), "A", ClassKind::Class);
        ir.add_super_type(a, builtins.any_type());
        let a_symbol = ir.symbol_of(a);

        let mut explorer = ClassifierExplorer::new();
        assert!(explorer.explore_symbol(&module, a_symbol).is_fully());
    }

    #[test]
    fn test_missing_super_type() {
        let mut module = Module::new("lib");
        Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("A.kt", "");
        let b = ir.missing_symbol(SymbolKind::Class, "B");
        let a = ir.class(Parent::File(file), "A", ClassKind::Class);
        ir.add_super_type(a, Type::simple(b));
        let a_symbol = ir.symbol_of(a);

        let mut explorer = ClassifierExplorer::new();
        let status = explorer.explore_symbol(&module, a_symbol);
        let cause = status.partially().unwrap();
        assert_eq!(
            **cause,
            Partially::DueToOtherClassifier {
                symbol: a_symbol,
                root_cause: Rc::new(Partially::MissingClassifier(b)),
            }
        );
        assert_eq!(cause.innermost(), &Partially::MissingClassifier(b));
    }

    #[test]
    fn test_memoized_status_is_shared() {
        let mut module = Module::new("lib");
        Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let b = ir.missing_symbol(SymbolKind::Class, "B");

        let mut explorer = ClassifierExplorer::new();
        let first = explorer.explore_symbol(&module, b);
        let second = explorer.explore_symbol(&module, b);
        match (first, second) {
            (LinkageStatus::Partially(first), LinkageStatus::Partially(second)) => {
                assert!(Rc::ptr_eq(&first, &second))
            }
            other => panic!("expected partially linked twice, got {:?}", other),
        }
    }

    #[test]
    fn test_inner_class_without_enclosing_class() {
        let mut module = Module::new("lib");
        Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("A.kt", "");
        let inner = ir.class(Parent::File(file), "Inner", ClassKind::Class);
        if let Some(class) = ir.module().declarations[inner].as_class_mut() {
            class.is_inner = true;
        }
        let inner_symbol = ir.symbol_of(inner);

        let mut explorer = ClassifierExplorer::new();
        let status = explorer.explore_symbol(&module, inner_symbol);
        assert!(matches!(
            status.partially().map(|cause| &**cause),
            Some(Partially::MissingEnclosingClass(symbol)) if *symbol == inner_symbol
        ));
    }

    #[test]
    fn test_nested_class_inherits_enclosing_breakage() {
        let mut module = Module::new("lib");
        Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("Outer.kt", "");
        let gone = ir.missing_symbol(SymbolKind::Class, "Gone");
        let outer = ir.class(Parent::File(file), "Outer", ClassKind::Class);
        ir.add_super_type(outer, Type::simple(gone));
        let nested = ir.class(Parent::Declaration(outer), "Nested", ClassKind::Class);
        let nested_symbol = ir.symbol_of(nested);
        let outer_symbol = ir.symbol_of(outer);

        let mut explorer = ClassifierExplorer::new();
        let status = explorer.explore_symbol(&module, nested_symbol);
        match status.partially().map(|cause| &**cause) {
            Some(Partially::DueToOtherClassifier { symbol, root_cause }) => {
                assert_eq!(*symbol, nested_symbol);
                assert_eq!(root_cause.symbol(), outer_symbol);
            }
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[test]
    fn test_first_broken_super_type_wins() {
        let mut module = Module::new("lib");
        Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("A.kt", "");
        let first = ir.missing_symbol(SymbolKind::Class, "First");
        let second = ir.missing_symbol(SymbolKind::Class, "Second");
        let a = ir.class(Parent::File(file), "A", ClassKind::Class);
        ir.add_super_type(a, Type::simple(first));
        ir.add_super_type(a, Type::simple(second));
        let a_symbol = ir.symbol_of(a);

        let mut explorer = ClassifierExplorer::new();
        let status = explorer.explore_symbol(&module, a_symbol);
        assert_eq!(
            status.partially().map(|cause| cause.innermost().symbol()),
            Some(first)
        );
    }

    #[test]
    fn test_type_arguments_and_type_parameters() {
        let mut module = Module::new("lib");
        let builtins = Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("Box.kt", "");
        let gone = ir.missing_symbol(SymbolKind::Class, "Gone");
        let boxed = ir.class(Parent::File(file), "Box", ClassKind::Class);
        let t = ir.type_parameter(boxed, "T", vec![Type::simple(gone)]);
        let t_symbol = ir.symbol_of(t);
        let box_symbol = ir.symbol_of(boxed);

        let mut explorer = ClassifierExplorer::new();
        let generic = Type::generic(
            box_symbol,
            vec![TypeArgument::Star, TypeArgument::Projection(Type::simple(gone))],
        );
        assert_eq!(
            explorer.explore_type(&module, &generic),
            LinkageStatus::Partially(Rc::new(Partially::MissingClassifier(gone)))
        );
        assert_eq!(
            explorer.explore_symbol(&module, t_symbol),
            LinkageStatus::Partially(Rc::new(Partially::MissingClassifier(gone)))
        );
        assert!(explorer
            .explore_type(&module, &builtins.marker_type(gone))
            .is_fully());
    }

    #[test]
    fn test_super_type_cycle_terminates() {
        let mut module = Module::new("lib");
        Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("A.kt", "");
        let a = ir.class(Parent::File(file), "A", ClassKind::Class);
        let b = ir.class(Parent::File(file), "B", ClassKind::Class);
        let a_type = ir.type_of(a);
        let b_type = ir.type_of(b);
        ir.add_super_type(a, b_type);
        ir.add_super_type(b, a_type);
        let a_symbol = ir.symbol_of(a);

        let mut explorer = ClassifierExplorer::new();
        assert!(explorer.explore_symbol(&module, a_symbol).is_fully());
    }

    #[test]
    fn test_cycle_result_independent_of_order() {
        let mut module = Module::new("lib");
        Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("A.kt", "");
        let gone = ir.missing_symbol(SymbolKind::Class, "Gone");
        let a = ir.class(Parent::File(file), "A", ClassKind::Class);
        let b = ir.class(Parent::File(file), "B", ClassKind::Class);
        let a_type = ir.type_of(a);
        let b_type = ir.type_of(b);
        ir.add_super_type(a, b_type);
        ir.add_super_type(a, Type::simple(gone));
        ir.add_super_type(b, a_type);
        let a_symbol = ir.symbol_of(a);
        let b_symbol = ir.symbol_of(b);

        for order in [[a_symbol, b_symbol], [b_symbol, a_symbol]] {
            let mut explorer = ClassifierExplorer::new();
            for symbol in order {
                let status = explorer.explore_symbol(&module, symbol);
                let cause = status.partially().expect("part of a broken cycle");
                assert_eq!(cause.innermost(), &Partially::MissingClassifier(gone));
            }
        }
    }
}
