//! Memoization of specialized function instances.
//!
//! The key is exact: identity on the enclosing frame and the template,
//! value equality on the argument-type vector (types are interned, so that
//! is pointer comparison too). Instances are inserted before their bodies
//! are specialized so recursive self-calls discover the in-flight entry.

use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;

use crate::ir::Template;
use crate::specialize::frame::Frame;
use crate::types::Type;

#[derive(PartialEq, Eq, Hash)]
struct FunctionKey {
    frame: usize,
    template: usize,
    args: Vec<Type>,
}

impl FunctionKey {
    fn new(frame: &Rc<Frame>, template: &Rc<Template>, args: &[Type]) -> Self {
        Self {
            frame: Rc::as_ptr(frame) as usize,
            template: Rc::as_ptr(template) as usize,
            args: args.to_vec(),
        }
    }
}

#[derive(Default)]
pub struct FunctionCache {
    map: RefCell<HashMap<FunctionKey, Rc<Frame>>>,
}

impl FunctionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(
        &self,
        frame: &Rc<Frame>,
        template: &Rc<Template>,
        args: &[Type],
    ) -> Option<Rc<Frame>> {
        self.map
            .borrow()
            .get(&FunctionKey::new(frame, template, args))
            .cloned()
    }

    pub fn insert(
        &self,
        frame: &Rc<Frame>,
        template: &Rc<Template>,
        args: &[Type],
        instance: Rc<Frame>,
    ) {
        let previous = self
            .map
            .borrow_mut()
            .insert(FunctionKey::new(frame, template, args), instance);
        debug_assert!(previous.is_none(), "function specialized twice for one key");
    }

    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }
}
