//! Per-function specialization state.
//!
//! A frame doubles as the specialized function instance: it owns the binding
//! table from original nodes to their replacements, the chain to the
//! enclosing lexical frame, and the monotonically-joined return and except
//! types. Frames form a tree through their parent pointers; cycles between
//! functions exist only through the function cache.

use std::cell::{Cell, OnceCell, RefCell};
use std::rc::Rc;

use hashbrown::HashMap;

use crate::intern::Name;
use crate::ir::{Sym, Template, Value, ValueId};
use crate::source::Anchor;
use crate::types::{self, Type};

pub struct Frame {
    pub anchor: Anchor,
    pub name: Name,
    /// The template this frame instantiates; `None` only for the root frame.
    pub original: Option<Rc<Template>>,
    /// Enclosing lexical frame.
    pub parent: Option<Rc<Frame>>,
    pub params: RefCell<Vec<Rc<Sym>>>,
    pub body: RefCell<Option<Value>>,
    /// Joined from every `return` that lands here. Cached instances start at
    /// `noreturn`, meaning no return has been typed yet.
    pub return_type: RefCell<Option<Type>>,
    pub except_type: RefCell<Option<Type>>,
    /// The argument types this instance was monomorphized with; part of the
    /// cache key.
    pub instance_args: Vec<Type>,
    pub complete: Cell<bool>,
    bindings: RefCell<HashMap<ValueId, Value>>,
    ty: OnceCell<Type>,
}

impl Frame {
    /// The top of a frame tree; owns the bindings of the module scope.
    pub fn root() -> Rc<Frame> {
        Rc::new(Frame {
            anchor: Anchor::builtin(),
            name: Name::new("<root>"),
            original: None,
            parent: None,
            params: RefCell::new(Vec::new()),
            body: RefCell::new(None),
            return_type: RefCell::new(None),
            except_type: RefCell::new(None),
            instance_args: Vec::new(),
            complete: Cell::new(false),
            bindings: RefCell::new(HashMap::new()),
            ty: OnceCell::new(),
        })
    }

    /// A cacheable function instance. Return and except types start at
    /// `noreturn` so recursive callers can watch them refine.
    pub fn instantiate(
        template: &Rc<Template>,
        parent: &Rc<Frame>,
        instance_args: Vec<Type>,
    ) -> Rc<Frame> {
        Rc::new(Frame {
            anchor: template.anchor,
            name: template.name,
            original: Some(template.clone()),
            parent: Some(parent.clone()),
            params: RefCell::new(Vec::new()),
            body: RefCell::new(Some(template.body.clone())),
            return_type: RefCell::new(Some(types::noreturn_type())),
            except_type: RefCell::new(Some(types::noreturn_type())),
            instance_args,
            complete: Cell::new(false),
            bindings: RefCell::new(HashMap::new()),
            ty: OnceCell::new(),
        })
    }

    /// A throwaway frame for inline expansion; never cached, never typed.
    pub fn inline_expansion(template: &Rc<Template>, parent: &Rc<Frame>) -> Rc<Frame> {
        Rc::new(Frame {
            anchor: template.anchor,
            name: template.name,
            original: Some(template.clone()),
            parent: Some(parent.clone()),
            params: RefCell::new(Vec::new()),
            body: RefCell::new(Some(template.body.clone())),
            return_type: RefCell::new(None),
            except_type: RefCell::new(None),
            instance_args: Vec::new(),
            complete: Cell::new(false),
            bindings: RefCell::new(HashMap::new()),
            ty: OnceCell::new(),
        })
    }

    /// Maps an original node to its specialized replacement.
    pub fn bind(&self, original: &Value, replacement: Value) {
        self.bindings.borrow_mut().insert(original.id(), replacement);
    }

    /// Looks `node` up here and in every enclosing frame; captured symbols
    /// resolve through the chain.
    pub fn resolve(&self, node: &Value) -> Option<Value> {
        if let Some(found) = self.bindings.borrow().get(&node.id()) {
            return Some(found.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.resolve(node))
    }

    /// The innermost frame, starting at `from`, that instantiates `scope`.
    pub fn find_frame(from: &Rc<Frame>, scope: &Rc<Template>) -> Option<Rc<Frame>> {
        let mut frame = from.clone();
        loop {
            if let Some(original) = &frame.original {
                if Rc::ptr_eq(original, scope) {
                    return Some(frame);
                }
            }
            let parent = frame.parent.clone()?;
            frame = parent;
        }
    }

    pub fn append_param(&self, param: Rc<Sym>) {
        self.params.borrow_mut().push(param);
    }

    pub fn is_inline(&self) -> bool {
        self.original
            .as_ref()
            .map(|original| original.is_inline())
            .unwrap_or(false)
    }

    pub fn return_type(&self) -> Option<Type> {
        *self.return_type.borrow()
    }

    pub fn except_type(&self) -> Option<Type> {
        *self.except_type.borrow()
    }

    /// The function-pointer type this instance has right now. For an
    /// incomplete instance this reflects the joins seen so far.
    pub fn function_pointer_type(&self) -> Type {
        let params = self
            .params
            .borrow()
            .iter()
            .map(|param| param.get_type().expect("untyped specialized parameter"))
            .collect();
        let except = self.except_type().unwrap_or_else(types::noreturn_type);
        let ret = self.return_type().unwrap_or_else(types::noreturn_type);
        types::native_ro_pointer_type(types::raising_function_type(except, ret, params))
    }

    pub fn get_type(&self) -> Option<Type> {
        self.ty.get().copied()
    }

    pub fn set_type(&self, ty: Type) {
        assert!(self.ty.set(ty).is_ok(), "function type written twice");
    }

    pub fn body(&self) -> Value {
        self.body
            .borrow()
            .clone()
            .expect("frame has no body")
    }

    pub fn set_body(&self, body: Value) {
        *self.body.borrow_mut() = Some(body);
    }
}

impl core::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Frame({} @ {:#x}, complete: {})",
            self.name,
            self as *const Frame as usize,
            self.complete.get()
        )
    }
}
