//! Marker types stand in for type references that are not fully linked.

use crate::explorer::{ClassifierExplorer, Partially};
use std::rc::Rc;
use tether_ir::{Builtins, Module, Type};

/// Marker replacing `ty` together with its cause, or `None` when `ty` is
/// fully linked.
pub fn to_marker_type_or_none(
    explorer: &mut ClassifierExplorer,
    module: &Module,
    builtins: &Builtins,
    ty: &Type,
) -> Option<(Type, Rc<Partially>)> {
    let cause = explorer.explore_type(module, ty).into_partially()?;
    Some((builtins.marker_type(cause.symbol()), cause))
}

/// Cause recorded by a marker type, or the exploration result of any other
/// type.
pub fn precalculated_cause(
    explorer: &mut ClassifierExplorer,
    module: &Module,
    ty: &Type,
) -> Option<Rc<Partially>> {
    match ty {
        Type::Marker(marker) => explorer.explore_symbol(module, marker.unlinked).into_partially(),
        ty => explorer.explore_type(module, ty).into_partially(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_ir::{ClassKind, IrBuilder, Parent, SymbolKind};

    #[test]
    fn test_marker_remembers_cause() {
        let mut module = Module::new("lib");
        let builtins = Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("A.kt", "");
        let gone = ir.missing_symbol(SymbolKind::Class, "Gone");
        let a = ir.class(Parent::File(file), "A", ClassKind::Class);
        ir.add_super_type(a, Type::simple(gone));
        let a_type = ir.type_of(a);

        let mut explorer = ClassifierExplorer::new();
        let (marker, cause) =
            to_marker_type_or_none(&mut explorer, &module, &builtins, &a_type).unwrap();
        assert!(marker.is_marker());
        assert_eq!(marker.classifier(), builtins.any_class);

        let recovered = precalculated_cause(&mut explorer, &module, &marker).unwrap();
        assert!(Rc::ptr_eq(&cause, &recovered));
    }

    #[test]
    fn test_fully_linked_type_has_no_marker() {
        let mut module = Module::new("lib");
        let builtins = Builtins::install(&mut module);

        let mut explorer = ClassifierExplorer::new();
        assert!(
            to_marker_type_or_none(&mut explorer, &module, &builtins, &builtins.string_type())
                .is_none()
        );
    }
}
