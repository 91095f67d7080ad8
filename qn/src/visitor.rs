use crate::{Cell, Obj};

pub trait Visitable {
    fn visit_edges(&self, visitor: &mut impl Visitor);
}

pub trait Visitor: Sized {
    fn visit(&mut self, object: Obj);
}

// visiting a cell means we visit only its direct references.
// foreign pointers are opaque here, the collector hands them to the host.
impl Visitable for Cell {
    #[inline]
    fn visit_edges(&self, visitor: &mut impl Visitor) {
        match *self {
            Cell::Pair { first, rest } => {
                visitor.visit(first);
                visitor.visit(rest);
            }
            Cell::String { next, .. } => visitor.visit(next),
            Cell::Symbol { name } => visitor.visit(name),
            Cell::Function { body } | Cell::Macro { body } => visitor.visit(body),
            Cell::Free { .. }
            | Cell::Number(_)
            | Cell::Object { .. }
            | Cell::Primitive(_)
            | Cell::NativeFunction(_)
            | Cell::ForeignPointer(_) => (),
        }
    }
}
