//! The structural type system the specializer computes over.
//!
//! Types are interned: every distinct [`TypeKind`] is leaked exactly once and
//! [`Type`] is a `Copy` handle comparing by pointer. All constructors go
//! through [`intern`], so structural equality and pointer equality coincide.

use std::sync::RwLock;

use colored::Colorize;
use hashbrown::HashSet;
use once_cell::sync::Lazy;

use crate::intern::Name;

static TYPE_TABLE: Lazy<RwLock<HashSet<&'static TypeKind>>> = Lazy::new(Default::default);

/// Interned handle to a [`TypeKind`]. Cheap to copy; equality and hashing are
/// by pointer.
#[derive(Clone, Copy)]
pub struct Type(&'static TypeKind);

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl Eq for Type {}

impl core::hash::Hash for Type {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        state.write_usize(self.0 as *const TypeKind as usize);
    }
}

impl core::ops::Deref for Type {
    type Target = TypeKind;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl core::fmt::Debug for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Type({})", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// i8, u32, ... Width 1 unsigned is `bool`.
    Integer { width: u16, signed: bool },
    /// f32, f64
    Real { width: u16 },
    Pointer {
        element: Type,
        flags: PointerFlags,
        /// `None` is the unnamed (heap-capable) storage class
        storage_class: Option<Name>,
    },
    Array { element: Type, count: u64 },
    Vector { element: Type, count: u64 },
    Tuple { fields: Vec<Field> },
    Union { fields: Vec<Field> },
    Function {
        return_type: Type,
        params: Vec<Type>,
        /// `None` means the function cannot raise
        except_type: Option<Type>,
    },
    /// The distinguished multi-value tuple. Never holds exactly one element;
    /// [`arguments_type`] collapses that case.
    Arguments { values: Vec<Type> },
    /// Nominal wrapper over a storage type; [`storage_type`] unwraps it.
    Named { name: Name, storage: Type },
    /// The type of `none`
    Nothing,
    NoReturn,
    /// Placeholder of untyped nodes; the specializer never emits it
    Unknown,
    /// Compile-time (template, frame) pair
    Closure,
    /// Primitive-operator tag
    Builtin,
    /// Compile-time node-rewriting function
    AstMacro,
    /// First-class type constant
    TypeValue,
    /// Interned symbol literal
    Symbol,
    Str,
    /// Expander scope handle, only seen by `syntax-extend`
    Scope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: Option<Name>,
    pub ty: Type,
}

impl Field {
    pub fn unnamed(ty: Type) -> Self {
        Self { name: None, ty }
    }

    pub fn named(name: Name, ty: Type) -> Self {
        Self {
            name: Some(name),
            ty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerFlags {
    pub readable: bool,
    pub writable: bool,
}

impl PointerFlags {
    pub const READ_WRITE: PointerFlags = PointerFlags {
        readable: true,
        writable: true,
    };
    pub const READ_ONLY: PointerFlags = PointerFlags {
        readable: true,
        writable: false,
    };
    pub const WRITE_ONLY: PointerFlags = PointerFlags {
        readable: false,
        writable: true,
    };
}

pub fn intern(kind: TypeKind) -> Type {
    {
        let table = TYPE_TABLE.read().unwrap();
        if let Some(&existing) = table.get(&kind) {
            return Type(existing);
        }
    }

    let mut table = TYPE_TABLE.write().unwrap();
    if let Some(&existing) = table.get(&kind) {
        return Type(existing);
    }

    let leaked: &'static TypeKind = Box::leak(Box::new(kind));
    table.insert(leaked);
    Type(leaked)
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

pub fn integer_type(width: u16, signed: bool) -> Type {
    intern(TypeKind::Integer { width, signed })
}

pub fn real_type(width: u16) -> Type {
    intern(TypeKind::Real { width })
}

pub fn bool_type() -> Type {
    integer_type(1, false)
}

pub fn i32_type() -> Type {
    integer_type(32, true)
}

pub fn f32_type() -> Type {
    real_type(32)
}

pub fn f64_type() -> Type {
    real_type(64)
}

pub fn nothing_type() -> Type {
    intern(TypeKind::Nothing)
}

pub fn noreturn_type() -> Type {
    intern(TypeKind::NoReturn)
}

pub fn unknown_type() -> Type {
    intern(TypeKind::Unknown)
}

pub fn closure_type() -> Type {
    intern(TypeKind::Closure)
}

pub fn builtin_type() -> Type {
    intern(TypeKind::Builtin)
}

pub fn ast_macro_type() -> Type {
    intern(TypeKind::AstMacro)
}

pub fn type_value_type() -> Type {
    intern(TypeKind::TypeValue)
}

pub fn symbol_type() -> Type {
    intern(TypeKind::Symbol)
}

pub fn str_type() -> Type {
    intern(TypeKind::Str)
}

pub fn scope_type() -> Type {
    intern(TypeKind::Scope)
}

pub fn pointer_type(element: Type, flags: PointerFlags, storage_class: Option<Name>) -> Type {
    intern(TypeKind::Pointer {
        element,
        flags,
        storage_class,
    })
}

/// Mutable pointer in the unnamed storage class; what `malloc` hands out.
pub fn native_pointer_type(element: Type) -> Type {
    pointer_type(element, PointerFlags::READ_WRITE, None)
}

pub fn native_ro_pointer_type(element: Type) -> Type {
    pointer_type(element, PointerFlags::READ_ONLY, None)
}

/// Stack allocation; lives in the `function` storage class so it can never be
/// freed.
pub fn local_pointer_type(element: Type) -> Type {
    pointer_type(
        element,
        PointerFlags::READ_WRITE,
        Some(Name::new("function")),
    )
}

pub fn array_type(element: Type, count: u64) -> Type {
    intern(TypeKind::Array { element, count })
}

pub fn vector_type(element: Type, count: u64) -> Type {
    intern(TypeKind::Vector { element, count })
}

pub fn tuple_type(fields: Vec<Field>) -> Type {
    intern(TypeKind::Tuple { fields })
}

pub fn union_type(fields: Vec<Field>) -> Type {
    intern(TypeKind::Union { fields })
}

pub fn named_type(name: Name, storage: Type) -> Type {
    intern(TypeKind::Named { name, storage })
}

pub fn function_type(return_type: Type, params: Vec<Type>) -> Type {
    intern(TypeKind::Function {
        return_type,
        params,
        except_type: None,
    })
}

/// An except type of `noreturn` degrades to the plain function type.
pub fn raising_function_type(except_type: Type, return_type: Type, params: Vec<Type>) -> Type {
    if except_type == noreturn_type() {
        return function_type(return_type, params);
    }
    intern(TypeKind::Function {
        return_type,
        params,
        except_type: Some(except_type),
    })
}

/// The type of a multi-value. A single element collapses to that element's
/// type, so `()` (no values) and two-or-more values are the only arguments
/// tuples in existence.
pub fn arguments_type(mut values: Vec<Type>) -> Type {
    if values.len() == 1 {
        return values.pop().unwrap();
    }
    intern(TypeKind::Arguments { values })
}

pub fn empty_arguments_type() -> Type {
    arguments_type(Vec::new())
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl TypeKind {
    pub fn is_returning(&self) -> bool {
        !matches!(self, TypeKind::NoReturn)
    }

    pub fn is_arguments(&self) -> bool {
        matches!(self, TypeKind::Arguments { .. })
    }

    pub fn is_bool(&self) -> bool {
        matches!(
            self,
            TypeKind::Integer {
                width: 1,
                signed: false
            }
        )
    }
}

/// Unwraps nominal types down to their underlying storage. Total: types
/// without a separate storage representation (the opaque compile-time
/// markers included) are their own storage.
pub fn storage_type(ty: Type) -> Type {
    match *ty {
        TypeKind::Named { storage, .. } => storage_type(storage),
        _ => ty,
    }
}

/// Element type at `index`, for every indexable aggregate.
pub fn type_at_index(ty: Type, index: usize) -> Option<Type> {
    match &*storage_type(ty) {
        TypeKind::Array { element, count } | TypeKind::Vector { element, count } => {
            ((index as u64) < *count).then_some(*element)
        }
        TypeKind::Tuple { fields } | TypeKind::Union { fields } => {
            fields.get(index).map(|f| f.ty)
        }
        TypeKind::Arguments { values } => values.get(index).copied(),
        _ => None,
    }
}

/// Positional index of a named tuple field.
pub fn field_index(ty: Type, name: Name) -> Option<usize> {
    match &*storage_type(ty) {
        TypeKind::Tuple { fields } => fields.iter().position(|f| f.name == Some(name)),
        _ => None,
    }
}

pub fn arguments_values(ty: Type) -> Vec<Type> {
    match &*storage_type(ty) {
        TypeKind::Arguments { values } => values.clone(),
        _ => vec![ty],
    }
}

/// Scalar-or-vector view: the element type and the vector size, if any.
fn scalar_of(ty: Type) -> (Type, Option<u64>) {
    match *storage_type(ty) {
        TypeKind::Vector { element, count } => (storage_type(element), Some(count)),
        _ => (storage_type(ty), None),
    }
}

pub fn is_integer(ty: Type) -> bool {
    matches!(*storage_type(ty), TypeKind::Integer { .. })
}

pub fn is_real(ty: Type) -> bool {
    matches!(*storage_type(ty), TypeKind::Real { .. })
}

pub fn is_integer_vector(ty: Type) -> bool {
    matches!(*scalar_of(ty).0, TypeKind::Integer { .. })
}

pub fn is_real_vector(ty: Type) -> bool {
    matches!(*scalar_of(ty).0, TypeKind::Real { .. })
}

pub fn is_bool_vector(ty: Type) -> bool {
    scalar_of(ty).0.is_bool()
}

pub fn vector_count(ty: Type) -> Option<u64> {
    scalar_of(ty).1
}

/// Result type of a comparison over `ty`: bool, or a bool vector of the same
/// size when the operand is a vector.
pub fn bool_result_type(ty: Type) -> Type {
    match vector_count(ty) {
        Some(count) => vector_type(bool_type(), count),
        None => bool_type(),
    }
}

/// A pointer whose element storage is a function type.
pub fn is_function_pointer(ty: Type) -> bool {
    match &*storage_type(ty) {
        TypeKind::Pointer { element, .. } => {
            matches!(&*storage_type(*element), TypeKind::Function { .. })
        }
        _ => false,
    }
}

/// The function signature behind a function pointer.
pub fn function_pointee(ty: Type) -> Option<Type> {
    match &*storage_type(ty) {
        TypeKind::Pointer { element, .. } => {
            let element = storage_type(*element);
            matches!(&*element, TypeKind::Function { .. }).then_some(element)
        }
        _ => None,
    }
}

/// A destination pointer may drop capabilities relative to the source but
/// never add them.
pub fn pointer_flags_compatible(dst: PointerFlags, src: PointerFlags) -> bool {
    (!dst.readable || src.readable) && (!dst.writable || src.writable)
}

/// An unnamed destination class accepts any source class; a named one only
/// itself.
pub fn pointer_storage_classes_compatible(dst: Option<Name>, src: Option<Name>) -> bool {
    match dst {
        None => true,
        Some(_) => dst == src,
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl core::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer { width: 1, signed: false } => write!(f, "bool"),
            Self::Integer { width, signed: true } => write!(f, "i{width}"),
            Self::Integer { width, signed: false } => write!(f, "u{width}"),
            Self::Real { width } => write!(f, "f{width}"),
            Self::Pointer {
                element,
                flags,
                storage_class,
            } => {
                match (flags.readable, flags.writable) {
                    (true, true) => write!(f, "*mut {}", **element)?,
                    (true, false) => write!(f, "*{}", **element)?,
                    (false, true) => write!(f, "*wo {}", **element)?,
                    (false, false) => write!(f, "*opaque {}", **element)?,
                }
                if let Some(class) = storage_class {
                    write!(f, "@{class}")?;
                }
                Ok(())
            }
            Self::Array { element, count } => write!(f, "[{}; {count}]", **element),
            Self::Vector { element, count } => write!(f, "<{} x {count}>", **element),
            Self::Tuple { fields } => {
                write!(f, "(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if let Some(name) = field.name {
                        write!(f, "{name}: ")?;
                    }
                    write!(f, "{}", *field.ty)?;
                }
                write!(f, ")")
            }
            Self::Union { fields } => {
                write!(f, "union(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if let Some(name) = field.name {
                        write!(f, "{name}: ")?;
                    }
                    write!(f, "{}", *field.ty)?;
                }
                write!(f, ")")
            }
            Self::Function {
                return_type,
                params,
                except_type,
            } => {
                write!(f, "fn(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", **param)?;
                }
                write!(f, ") -> {}", **return_type)?;
                if let Some(except) = except_type {
                    write!(f, " raises {}", **except)?;
                }
                Ok(())
            }
            Self::Arguments { values } => {
                write!(f, "λ(")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", **value)?;
                }
                write!(f, ")")
            }
            Self::Named { name, .. } => write!(f, "{name}"),
            Self::Nothing => write!(f, "nothing"),
            Self::NoReturn => write!(f, "noreturn"),
            Self::Unknown => write!(f, "?"),
            Self::Closure => write!(f, "closure"),
            Self::Builtin => write!(f, "builtin"),
            Self::AstMacro => write!(f, "ast-macro"),
            Self::TypeValue => write!(f, "type"),
            Self::Symbol => write!(f, "symbol"),
            Self::Str => write!(f, "str"),
            Self::Scope => write!(f, "scope"),
        }
    }
}

impl core::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.colored())
    }
}

impl Type {
    pub fn colored(&self) -> colored::ColoredString {
        self.0.to_string().yellow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_makes_structural_equality_pointer_equality() {
        let a = tuple_type(vec![Field::unnamed(i32_type()), Field::unnamed(f32_type())]);
        let b = tuple_type(vec![Field::unnamed(i32_type()), Field::unnamed(f32_type())]);
        assert_eq!(a, b);
        assert_ne!(a, tuple_type(vec![Field::unnamed(i32_type())]));
    }

    #[test]
    fn single_argument_collapses() {
        assert_eq!(arguments_type(vec![i32_type()]), i32_type());
        assert!(empty_arguments_type().is_arguments());
        assert_eq!(
            arguments_type(vec![i32_type(), f32_type()]),
            arguments_type(vec![i32_type(), f32_type()])
        );
    }

    #[test]
    fn storage_unwraps_nominal_chains() {
        let point = named_type(
            Name::new("Point"),
            tuple_type(vec![
                Field::named(Name::new("x"), f32_type()),
                Field::named(Name::new("y"), f32_type()),
            ]),
        );
        let alias = named_type(Name::new("P"), point);
        assert!(matches!(*storage_type(alias), TypeKind::Tuple { .. }));
        assert_eq!(field_index(alias, Name::new("y")), Some(1));
        assert_eq!(field_index(alias, Name::new("z")), None);
    }

    #[test]
    fn raising_function_degrades_without_except() {
        let plain = function_type(i32_type(), vec![f32_type()]);
        assert_eq!(
            raising_function_type(noreturn_type(), i32_type(), vec![f32_type()]),
            plain
        );
        assert_ne!(
            raising_function_type(str_type(), i32_type(), vec![f32_type()]),
            plain
        );
    }

    #[test]
    fn vector_predicates_see_through_wrappers() {
        let v = vector_type(bool_type(), 4);
        assert!(is_bool_vector(v));
        assert!(is_integer_vector(v));
        assert!(!is_real_vector(v));
        assert_eq!(bool_result_type(vector_type(f32_type(), 4)), v);
        assert_eq!(bool_result_type(i32_type()), bool_type());
    }

    #[test]
    fn pointer_compatibility_rules() {
        assert!(pointer_flags_compatible(
            PointerFlags::READ_ONLY,
            PointerFlags::READ_WRITE
        ));
        assert!(!pointer_flags_compatible(
            PointerFlags::READ_WRITE,
            PointerFlags::READ_ONLY
        ));
        assert!(pointer_storage_classes_compatible(
            None,
            Some(Name::new("function"))
        ));
        assert!(!pointer_storage_classes_compatible(
            Some(Name::new("function")),
            None
        ));
    }
}
