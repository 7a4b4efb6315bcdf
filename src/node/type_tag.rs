use std::any::{type_name, TypeId};

/// A node's declared input or output type, used by the validator.
/// Equality is exact-match on `TypeId`; there is no Rust analogue of Go's
/// structural interface satisfaction, so compatibility narrows to "same
/// concrete type, or either side unset".
#[derive(Clone, Copy, Debug)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    pub fn of<T: 'static>() -> Self {
        TypeTag {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn compatible(output: Option<TypeTag>, input: Option<TypeTag>) -> bool {
        match (output, input) {
            (Some(a), Some(b)) => a.id == b.id,
            _ => true,
        }
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}
