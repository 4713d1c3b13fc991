//! The shared value graph both halves of the middle-end speak.
//!
//! The expander produces untyped nodes (templates, symbols, calls, control
//! flow); the specializer rewrites them into typed nodes. Nodes are shared by
//! reference and never form cycles at the value level — recursive functions
//! only close the loop through frames, which the function cache keys by
//! identity. A node's type slot is write-once.

pub mod print;

use std::cell::{OnceCell, RefCell};
use std::rc::Rc;

use crate::builtins::Builtin;
use crate::errors::{CompileResult, ErrorKind, SpecializeError};
use crate::host::ScopeHandle;
use crate::intern::Name;
use crate::source::Anchor;
use crate::specialize::frame::Frame;
use crate::types::{self, Type};

/// Node-rewriting function invoked for AST-macro callees.
pub type AstMacroFn = Rc<dyn Fn(&[Value]) -> CompileResult<Value>>;

/// Identity of a node, used for binding tables and the printer's visited
/// set. Two handles are the same node iff they share an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(usize);

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// An untyped function literal. Created by the expander; `scope` is wired up
/// right after construction (bodies reference their template, so the graph
/// cannot be built leaves-out) and never changes afterwards.
pub struct Template {
    pub anchor: Anchor,
    pub name: Name,
    pub params: Vec<Rc<Sym>>,
    pub body: Value,
    pub inline: bool,
    scope: RefCell<Option<Rc<Template>>>,
}

impl Template {
    pub fn new(
        anchor: Anchor,
        name: Name,
        params: Vec<Rc<Sym>>,
        body: Value,
        inline: bool,
    ) -> Rc<Self> {
        Rc::new(Self {
            anchor,
            name,
            params,
            body,
            inline,
            scope: RefCell::new(None),
        })
    }

    /// Marks `scope` as the template this one is defined inside.
    pub fn set_scope(&self, scope: &Rc<Template>) {
        *self.scope.borrow_mut() = Some(scope.clone());
    }

    pub fn scope(&self) -> Option<Rc<Template>> {
        self.scope.borrow().clone()
    }

    pub fn is_inline(&self) -> bool {
        self.inline
    }
}

/// A named binding reference; carries a type once bound.
pub struct Sym {
    pub anchor: Anchor,
    pub name: Name,
    pub variadic: bool,
    ty: OnceCell<Type>,
}

impl Sym {
    pub fn untyped(anchor: Anchor, name: Name) -> Rc<Self> {
        Rc::new(Self {
            anchor,
            name,
            variadic: false,
            ty: OnceCell::new(),
        })
    }

    pub fn variadic(anchor: Anchor, name: Name) -> Rc<Self> {
        Rc::new(Self {
            anchor,
            name,
            variadic: true,
            ty: OnceCell::new(),
        })
    }

    pub fn typed(anchor: Anchor, name: Name, ty: Type) -> Rc<Self> {
        let sym = Self {
            anchor,
            name,
            variadic: false,
            ty: OnceCell::new(),
        };
        sym.ty.set(ty).ok();
        Rc::new(sym)
    }

    pub fn get_type(&self) -> Option<Type> {
        self.ty.get().copied()
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }
}

pub struct ConstInt {
    pub anchor: Anchor,
    pub value: u64,
    pub ty: Type,
}

pub struct ConstReal {
    pub anchor: Anchor,
    pub value: f64,
    pub ty: Type,
}

/// Compile-time pointer payloads: the opaque constants the specializer can
/// see through.
#[derive(Clone)]
pub enum PtrValue {
    Closure(Rc<Closure>),
    Type(Type),
    Str(Rc<str>),
    Symbol(Name),
    Builtin(Builtin),
    Macro(AstMacroFn),
    Scope(ScopeHandle),
}

pub struct ConstPointer {
    pub anchor: Anchor,
    pub payload: PtrValue,
    pub ty: Type,
}

/// Shared shape of tuple, array and vector constants.
pub struct ConstAggregate {
    pub anchor: Anchor,
    pub values: Vec<Value>,
    pub ty: Type,
}

/// Reference to an external symbol with a declared type.
pub struct Extern {
    pub anchor: Anchor,
    pub name: Name,
    pub ty: Type,
}

/// A compile-time (template, captured-frame) pair.
pub struct Closure {
    pub template: Rc<Template>,
    pub frame: Rc<Frame>,
}

impl Closure {
    pub fn new(template: Rc<Template>, frame: Rc<Frame>) -> Rc<Self> {
        Rc::new(Self { template, frame })
    }
}

/// Ordered multi-value.
pub struct ArgumentList {
    pub anchor: Anchor,
    pub values: Vec<Value>,
    ty: OnceCell<Type>,
}

/// Projection of one element out of a multi-value.
pub struct ExtractArgument {
    pub anchor: Anchor,
    pub value: Value,
    pub index: usize,
    ty: OnceCell<Type>,
}

pub struct Call {
    pub anchor: Anchor,
    pub callee: Value,
    pub args: Vec<Value>,
    ty: OnceCell<Type>,
}

/// Parallel binding. Carries no result: its type is the empty arguments
/// tuple.
pub struct Let {
    pub anchor: Anchor,
    pub params: Vec<Rc<Sym>>,
    pub args: Vec<Value>,
    ty: OnceCell<Type>,
}

/// Tail-recursive loop. The body is attached after construction because
/// `break`/`repeat` inside it need to point back at the loop node.
pub struct Loop {
    pub anchor: Anchor,
    pub params: RefCell<Vec<Rc<Sym>>>,
    pub args: RefCell<Vec<Value>>,
    pub body: RefCell<Option<Value>>,
    pub return_type: RefCell<Option<Type>>,
    ty: OnceCell<Type>,
}

#[derive(Clone)]
pub struct Clause {
    pub anchor: Anchor,
    /// `None` marks the else clause
    pub cond: Option<Value>,
    pub body: Value,
}

pub struct If {
    pub anchor: Anchor,
    pub clauses: Vec<Clause>,
    pub else_clause: Clause,
    ty: OnceCell<Type>,
}

pub struct Break {
    pub anchor: Anchor,
    pub value: Value,
    ty: OnceCell<Type>,
}

pub struct Repeat {
    pub anchor: Anchor,
    pub args: Vec<Value>,
    ty: OnceCell<Type>,
}

pub struct Return {
    pub anchor: Anchor,
    pub value: Value,
    ty: OnceCell<Type>,
}

pub struct Raise {
    pub anchor: Anchor,
    pub value: Value,
    ty: OnceCell<Type>,
}

pub struct Try {
    pub anchor: Anchor,
    pub try_body: Value,
    pub except_body: Value,
    ty: OnceCell<Type>,
}

/// Statement sequence plus a tail value. Only the tail may be non-returning.
pub struct Block {
    pub anchor: Anchor,
    pub body: Vec<Value>,
    pub value: Value,
    ty: OnceCell<Type>,
}

/// A value labeled with a keyword.
pub struct Keyed {
    pub anchor: Anchor,
    pub key: Name,
    pub value: Value,
    ty: OnceCell<Type>,
}

/// Compile-time macro hook: `func` evaluates to a scope transformer which is
/// applied to `env`; the host then expands `continuation` against the result.
pub struct SyntaxExtend {
    pub anchor: Anchor,
    pub func: Rc<Template>,
    pub env: ScopeHandle,
    pub continuation: ScopeHandle,
    ty: OnceCell<Type>,
}

// ---------------------------------------------------------------------------
// The sum type
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub enum Value {
    Template(Rc<Template>),
    Function(Rc<Frame>),
    Sym(Rc<Sym>),
    ConstInt(Rc<ConstInt>),
    ConstReal(Rc<ConstReal>),
    ConstPointer(Rc<ConstPointer>),
    ConstTuple(Rc<ConstAggregate>),
    ConstArray(Rc<ConstAggregate>),
    ConstVector(Rc<ConstAggregate>),
    Extern(Rc<Extern>),
    ArgumentList(Rc<ArgumentList>),
    ExtractArgument(Rc<ExtractArgument>),
    Call(Rc<Call>),
    Let(Rc<Let>),
    Loop(Rc<Loop>),
    If(Rc<If>),
    Break(Rc<Break>),
    Repeat(Rc<Repeat>),
    Return(Rc<Return>),
    Raise(Rc<Raise>),
    Try(Rc<Try>),
    Block(Rc<Block>),
    Keyed(Rc<Keyed>),
    SyntaxExtend(Rc<SyntaxExtend>),
}

macro_rules! each_variant {
    ($self:expr, $node:ident => $body:expr) => {
        match $self {
            Value::Template($node) => $body,
            Value::Function($node) => $body,
            Value::Sym($node) => $body,
            Value::ConstInt($node) => $body,
            Value::ConstReal($node) => $body,
            Value::ConstPointer($node) => $body,
            Value::ConstTuple($node) => $body,
            Value::ConstArray($node) => $body,
            Value::ConstVector($node) => $body,
            Value::Extern($node) => $body,
            Value::ArgumentList($node) => $body,
            Value::ExtractArgument($node) => $body,
            Value::Call($node) => $body,
            Value::Let($node) => $body,
            Value::Loop($node) => $body,
            Value::If($node) => $body,
            Value::Break($node) => $body,
            Value::Repeat($node) => $body,
            Value::Return($node) => $body,
            Value::Raise($node) => $body,
            Value::Try($node) => $body,
            Value::Block($node) => $body,
            Value::Keyed($node) => $body,
            Value::SyntaxExtend($node) => $body,
        }
    };
}

impl Value {
    pub fn id(&self) -> ValueId {
        each_variant!(self, node => ValueId(Rc::as_ptr(node) as *const () as usize))
    }

    pub fn anchor(&self) -> Anchor {
        match self {
            Value::Template(n) => n.anchor,
            Value::Function(n) => n.anchor,
            Value::Sym(n) => n.anchor,
            Value::ConstInt(n) => n.anchor,
            Value::ConstReal(n) => n.anchor,
            Value::ConstPointer(n) => n.anchor,
            Value::ConstTuple(n) | Value::ConstArray(n) | Value::ConstVector(n) => n.anchor,
            Value::Extern(n) => n.anchor,
            Value::ArgumentList(n) => n.anchor,
            Value::ExtractArgument(n) => n.anchor,
            Value::Call(n) => n.anchor,
            Value::Let(n) => n.anchor,
            Value::Loop(n) => n.anchor,
            Value::If(n) => n.anchor,
            Value::Break(n) => n.anchor,
            Value::Repeat(n) => n.anchor,
            Value::Return(n) => n.anchor,
            Value::Raise(n) => n.anchor,
            Value::Try(n) => n.anchor,
            Value::Block(n) => n.anchor,
            Value::Keyed(n) => n.anchor,
            Value::SyntaxExtend(n) => n.anchor,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Template(_) => "Template",
            Value::Function(_) => "Function",
            Value::Sym(_) => "Symbol",
            Value::ConstInt(_) => "ConstInt",
            Value::ConstReal(_) => "ConstReal",
            Value::ConstPointer(_) => "ConstPointer",
            Value::ConstTuple(_) => "ConstTuple",
            Value::ConstArray(_) => "ConstArray",
            Value::ConstVector(_) => "ConstVector",
            Value::Extern(_) => "Extern",
            Value::ArgumentList(_) => "ArgumentList",
            Value::ExtractArgument(_) => "ExtractArgument",
            Value::Call(_) => "Call",
            Value::Let(_) => "Let",
            Value::Loop(_) => "Loop",
            Value::If(_) => "If",
            Value::Break(_) => "Break",
            Value::Repeat(_) => "Repeat",
            Value::Return(_) => "Return",
            Value::Raise(_) => "Raise",
            Value::Try(_) => "Try",
            Value::Block(_) => "Block",
            Value::Keyed(_) => "Keyed",
            Value::SyntaxExtend(_) => "SyntaxExtend",
        }
    }

    pub fn get_type(&self) -> Option<Type> {
        match self {
            Value::Template(_) => None,
            Value::Function(frame) => frame.get_type(),
            Value::Sym(sym) => sym.get_type(),
            Value::ConstInt(n) => Some(n.ty),
            Value::ConstReal(n) => Some(n.ty),
            Value::ConstPointer(n) => Some(n.ty),
            Value::ConstTuple(n) | Value::ConstArray(n) | Value::ConstVector(n) => Some(n.ty),
            Value::Extern(n) => Some(n.ty),
            Value::ArgumentList(n) => n.ty.get().copied(),
            Value::ExtractArgument(n) => n.ty.get().copied(),
            Value::Call(n) => n.ty.get().copied(),
            Value::Let(n) => n.ty.get().copied(),
            Value::Loop(n) => n.ty.get().copied(),
            Value::If(n) => n.ty.get().copied(),
            Value::Break(n) => n.ty.get().copied(),
            Value::Repeat(n) => n.ty.get().copied(),
            Value::Return(n) => n.ty.get().copied(),
            Value::Raise(n) => n.ty.get().copied(),
            Value::Try(n) => n.ty.get().copied(),
            Value::Block(n) => n.ty.get().copied(),
            Value::Keyed(n) => n.ty.get().copied(),
            Value::SyntaxExtend(n) => n.ty.get().copied(),
        }
    }

    /// The node's type. Only valid on specialized values; untyped nodes are a
    /// specializer bug at every site this is called from.
    #[track_caller]
    pub fn ty(&self) -> Type {
        self.get_type()
            .unwrap_or_else(|| panic!("untyped {} value", self.kind_name()))
    }

    pub fn is_typed(&self) -> bool {
        self.get_type().is_some()
    }

    pub fn set_type(&self, ty: Type) {
        let slot = match self {
            Value::ArgumentList(n) => &n.ty,
            Value::ExtractArgument(n) => &n.ty,
            Value::Call(n) => &n.ty,
            Value::Let(n) => &n.ty,
            Value::Loop(n) => &n.ty,
            Value::If(n) => &n.ty,
            Value::Break(n) => &n.ty,
            Value::Repeat(n) => &n.ty,
            Value::Return(n) => &n.ty,
            Value::Raise(n) => &n.ty,
            Value::Try(n) => &n.ty,
            Value::Block(n) => &n.ty,
            Value::Keyed(n) => &n.ty,
            Value::SyntaxExtend(n) => &n.ty,
            other => unreachable!("cannot retype a {} node", other.kind_name()),
        };
        assert!(slot.set(ty).is_ok(), "type slot written twice");
    }

    /// A value for which substitution is equivalent to binding: constants,
    /// templates, symbols and functions.
    pub fn is_symbolic(&self) -> bool {
        matches!(
            self,
            Value::Template(_)
                | Value::Function(_)
                | Value::Sym(_)
                | Value::ConstInt(_)
                | Value::ConstReal(_)
                | Value::ConstPointer(_)
                | Value::ConstTuple(_)
                | Value::ConstArray(_)
                | Value::ConstVector(_)
                | Value::Extern(_)
        )
    }

    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            Value::ConstInt(_)
                | Value::ConstReal(_)
                | Value::ConstPointer(_)
                | Value::ConstTuple(_)
                | Value::ConstArray(_)
                | Value::ConstVector(_)
                | Value::Extern(_)
        )
    }

    // -- constant constructors ---------------------------------------------

    pub fn const_int(anchor: Anchor, ty: Type, value: u64) -> Value {
        Value::ConstInt(Rc::new(ConstInt { anchor, value, ty }))
    }

    pub fn const_bool(anchor: Anchor, value: bool) -> Value {
        Value::const_int(anchor, types::bool_type(), value as u64)
    }

    pub fn const_real(anchor: Anchor, ty: Type, value: f64) -> Value {
        Value::ConstReal(Rc::new(ConstReal { anchor, value, ty }))
    }

    /// The `none` constant: an empty tuple of type `nothing`.
    pub fn none(anchor: Anchor) -> Value {
        Value::ConstTuple(Rc::new(ConstAggregate {
            anchor,
            values: Vec::new(),
            ty: types::nothing_type(),
        }))
    }

    pub fn closure_const(anchor: Anchor, closure: Rc<Closure>) -> Value {
        Value::ConstPointer(Rc::new(ConstPointer {
            anchor,
            payload: PtrValue::Closure(closure),
            ty: types::closure_type(),
        }))
    }

    pub fn type_const(anchor: Anchor, ty: Type) -> Value {
        Value::ConstPointer(Rc::new(ConstPointer {
            anchor,
            payload: PtrValue::Type(ty),
            ty: types::type_value_type(),
        }))
    }

    pub fn str_const(anchor: Anchor, value: &str) -> Value {
        Value::ConstPointer(Rc::new(ConstPointer {
            anchor,
            payload: PtrValue::Str(value.into()),
            ty: types::str_type(),
        }))
    }

    pub fn symbol_const(anchor: Anchor, name: Name) -> Value {
        Value::ConstPointer(Rc::new(ConstPointer {
            anchor,
            payload: PtrValue::Symbol(name),
            ty: types::symbol_type(),
        }))
    }

    pub fn builtin_const(anchor: Anchor, builtin: Builtin) -> Value {
        Value::ConstPointer(Rc::new(ConstPointer {
            anchor,
            payload: PtrValue::Builtin(builtin),
            ty: types::builtin_type(),
        }))
    }

    pub fn macro_const(anchor: Anchor, func: AstMacroFn) -> Value {
        Value::ConstPointer(Rc::new(ConstPointer {
            anchor,
            payload: PtrValue::Macro(func),
            ty: types::ast_macro_type(),
        }))
    }

    pub fn scope_const(anchor: Anchor, scope: ScopeHandle) -> Value {
        Value::ConstPointer(Rc::new(ConstPointer {
            anchor,
            payload: PtrValue::Scope(scope),
            ty: types::scope_type(),
        }))
    }

    pub fn extern_ref(anchor: Anchor, name: Name, ty: Type) -> Value {
        Value::Extern(Rc::new(Extern { anchor, name, ty }))
    }

    // -- constant extraction -----------------------------------------------

    fn constant_expected(&self) -> SpecializeError {
        SpecializeError::new(
            ErrorKind::ConstantExpected {
                got: self.get_type().unwrap_or_else(types::unknown_type),
            },
            self.anchor(),
        )
    }

    pub fn as_const_int(&self) -> Option<&ConstInt> {
        match self {
            Value::ConstInt(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_const_real(&self) -> Option<&ConstReal> {
        match self {
            Value::ConstReal(n) => Some(n),
            _ => None,
        }
    }

    pub fn extract_integer_constant(&self) -> CompileResult<u64> {
        self.as_const_int()
            .map(|c| c.value)
            .ok_or_else(|| self.constant_expected())
    }

    pub fn extract_closure_constant(&self) -> CompileResult<Rc<Closure>> {
        match self {
            Value::ConstPointer(p) => match &p.payload {
                PtrValue::Closure(closure) => Ok(closure.clone()),
                _ => Err(self.constant_expected()),
            },
            _ => Err(self.constant_expected()),
        }
    }

    pub fn extract_type_constant(&self) -> CompileResult<Type> {
        match self {
            Value::ConstPointer(p) => match &p.payload {
                PtrValue::Type(ty) => Ok(*ty),
                _ => Err(self.constant_expected()),
            },
            _ => Err(self.constant_expected()),
        }
    }

    pub fn extract_builtin_constant(&self) -> CompileResult<Builtin> {
        match self {
            Value::ConstPointer(p) => match &p.payload {
                PtrValue::Builtin(builtin) => Ok(*builtin),
                _ => Err(self.constant_expected()),
            },
            _ => Err(self.constant_expected()),
        }
    }

    pub fn extract_symbol_constant(&self) -> CompileResult<Name> {
        match self {
            Value::ConstPointer(p) => match &p.payload {
                PtrValue::Symbol(name) => Ok(*name),
                _ => Err(self.constant_expected()),
            },
            _ => Err(self.constant_expected()),
        }
    }

    pub fn extract_macro_constant(&self) -> CompileResult<AstMacroFn> {
        match self {
            Value::ConstPointer(p) => match &p.payload {
                PtrValue::Macro(func) => Ok(func.clone()),
                _ => Err(self.constant_expected()),
            },
            _ => Err(self.constant_expected()),
        }
    }

    pub fn extract_scope_constant(&self) -> CompileResult<ScopeHandle> {
        match self {
            Value::ConstPointer(p) => match &p.payload {
                PtrValue::Scope(scope) => Ok(scope.clone()),
                _ => Err(self.constant_expected()),
            },
            _ => Err(self.constant_expected()),
        }
    }
}

impl core::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // shallow on purpose; the graph shares nodes and the printer is the
        // tool for looking inside
        write!(f, "{}@{:#x}", self.kind_name(), self.id().0)?;
        if let Some(ty) = self.get_type() {
            write!(f, ": {}", *ty)?;
        }
        Ok(())
    }
}

// -- structured node constructors ------------------------------------------

impl ArgumentList {
    pub fn new(anchor: Anchor, values: Vec<Value>) -> Rc<Self> {
        Rc::new(Self {
            anchor,
            values,
            ty: OnceCell::new(),
        })
    }
}

impl ExtractArgument {
    pub fn new(anchor: Anchor, value: Value, index: usize) -> Rc<Self> {
        Rc::new(Self {
            anchor,
            value,
            index,
            ty: OnceCell::new(),
        })
    }
}

impl Call {
    pub fn new(anchor: Anchor, callee: Value, args: Vec<Value>) -> Rc<Self> {
        Rc::new(Self {
            anchor,
            callee,
            args,
            ty: OnceCell::new(),
        })
    }
}

impl Let {
    pub fn new(anchor: Anchor, params: Vec<Rc<Sym>>, args: Vec<Value>) -> Rc<Self> {
        Rc::new(Self {
            anchor,
            params,
            args,
            ty: OnceCell::new(),
        })
    }
}

impl Loop {
    pub fn new(anchor: Anchor) -> Rc<Self> {
        Rc::new(Self {
            anchor,
            params: RefCell::new(Vec::new()),
            args: RefCell::new(Vec::new()),
            body: RefCell::new(None),
            return_type: RefCell::new(None),
            ty: OnceCell::new(),
        })
    }

    pub fn with_body(
        anchor: Anchor,
        params: Vec<Rc<Sym>>,
        args: Vec<Value>,
        body: Value,
    ) -> Rc<Self> {
        let node = Loop::new(anchor);
        *node.params.borrow_mut() = params;
        *node.args.borrow_mut() = args;
        *node.body.borrow_mut() = Some(body);
        node
    }

    pub fn body(&self) -> Value {
        self.body
            .borrow()
            .clone()
            .expect("loop body not attached yet")
    }
}

impl If {
    pub fn new(anchor: Anchor, clauses: Vec<Clause>, else_clause: Clause) -> Rc<Self> {
        Rc::new(Self {
            anchor,
            clauses,
            else_clause,
            ty: OnceCell::new(),
        })
    }
}

impl Break {
    pub fn new(anchor: Anchor, value: Value) -> Rc<Self> {
        Rc::new(Self {
            anchor,
            value,
            ty: OnceCell::new(),
        })
    }
}

impl Repeat {
    pub fn new(anchor: Anchor, args: Vec<Value>) -> Rc<Self> {
        Rc::new(Self {
            anchor,
            args,
            ty: OnceCell::new(),
        })
    }
}

impl Return {
    pub fn new(anchor: Anchor, value: Value) -> Rc<Self> {
        Rc::new(Self {
            anchor,
            value,
            ty: OnceCell::new(),
        })
    }
}

impl Raise {
    pub fn new(anchor: Anchor, value: Value) -> Rc<Self> {
        Rc::new(Self {
            anchor,
            value,
            ty: OnceCell::new(),
        })
    }
}

impl Try {
    pub fn new(anchor: Anchor, try_body: Value, except_body: Value) -> Rc<Self> {
        Rc::new(Self {
            anchor,
            try_body,
            except_body,
            ty: OnceCell::new(),
        })
    }
}

impl Block {
    pub fn new(anchor: Anchor, body: Vec<Value>, value: Value) -> Rc<Self> {
        Rc::new(Self {
            anchor,
            body,
            value,
            ty: OnceCell::new(),
        })
    }
}

impl Keyed {
    pub fn new(anchor: Anchor, key: Name, value: Value) -> Rc<Self> {
        Rc::new(Self {
            anchor,
            key,
            value,
            ty: OnceCell::new(),
        })
    }
}

impl SyntaxExtend {
    pub fn new(
        anchor: Anchor,
        func: Rc<Template>,
        env: ScopeHandle,
        continuation: ScopeHandle,
    ) -> Rc<Self> {
        Rc::new(Self {
            anchor,
            func,
            env,
            continuation,
            ty: OnceCell::new(),
        })
    }
}

macro_rules! value_from {
    ($($variant:ident($node:ty)),+ $(,)?) => {
        $(impl From<Rc<$node>> for Value {
            fn from(node: Rc<$node>) -> Value {
                Value::$variant(node)
            }
        })+
    };
}

value_from! {
    Template(Template),
    Function(Frame),
    Sym(Sym),
    ArgumentList(ArgumentList),
    ExtractArgument(ExtractArgument),
    Call(Call),
    Let(Let),
    Loop(Loop),
    If(If),
    Break(Break),
    Repeat(Repeat),
    Return(Return),
    Raise(Raise),
    Try(Try),
    Block(Block),
    Keyed(Keyed),
    SyntaxExtend(SyntaxExtend),
}
