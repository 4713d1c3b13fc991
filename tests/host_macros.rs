//! Integration tests for the compile-time callees: AST macros that rewrite
//! their call site, and `syntax-extend` driving the expander/JIT host.

use std::cell::Cell;
use std::rc::Rc;

use smelt::builtins::Builtin;
use smelt::errors::{CompileResult, ErrorKind, SpecializeError};
use smelt::host::{HostInterface, ScopeHandle};
use smelt::intern::Name;
use smelt::ir::{self, Value};
use smelt::source::Anchor;
use smelt::specialize::{frame::Frame, specialize, specialize_function, Context, Session};
use smelt::types;

fn anchor() -> Anchor {
    Anchor::builtin()
}

fn int(value: u64) -> Value {
    Value::const_int(anchor(), types::i32_type(), value)
}

fn builtin_call(builtin: Builtin, args: Vec<Value>) -> Value {
    Value::from(ir::Call::new(
        anchor(),
        Value::builtin_const(anchor(), builtin),
        args,
    ))
}

// ---------------------------------------------------------------------------
// AST macros
// ---------------------------------------------------------------------------

#[test]
fn macro_results_are_specialized_recursively() {
    let session = Session::new();
    let root = Frame::root();
    let ctx = Context::new(&session, &root);

    // a macro that rewrites its call into an addition of its arguments
    let add_macro = Value::macro_const(
        anchor(),
        Rc::new(|args: &[Value]| {
            Ok(builtin_call(Builtin::Add, args.to_vec()))
        }),
    );
    let node = Value::from(ir::Call::new(anchor(), add_macro, vec![int(2), int(3)]));
    let result = specialize(&ctx, &node).expect("specialize");
    let Value::ConstInt(folded) = &result else {
        panic!("the rewritten call should fold");
    };
    assert_eq!(folded.value, 5);
}

#[test]
fn macro_errors_propagate_with_the_call_site() {
    let session = Session::new();
    let root = Frame::root();
    let ctx = Context::new(&session, &root);

    let failing = Value::macro_const(
        anchor(),
        Rc::new(|_: &[Value]| {
            Err(SpecializeError::message(Anchor::builtin(), "macro exploded"))
        }),
    );
    let node = Value::from(ir::Call::new(anchor(), failing, vec![]));
    let error = specialize(&ctx, &node).expect_err("macro failure");
    assert!(matches!(&error.kind, ErrorKind::Message(m) if m.contains("exploded")));
    assert!(!error.trace.is_empty());
}

// ---------------------------------------------------------------------------
// syntax-extend
// ---------------------------------------------------------------------------

struct MockHost {
    ran_transformer: Cell<bool>,
    expanded: Cell<bool>,
}

impl HostInterface for MockHost {
    fn run_scope_transformer(
        &self,
        function: &Value,
        env: &ScopeHandle,
    ) -> CompileResult<ScopeHandle> {
        assert!(function.is_typed(), "transformer must be fully specialized");
        self.ran_transformer.set(true);
        Ok(env.clone())
    }

    fn expand_continuation(
        &self,
        _continuation: &ScopeHandle,
        _env: &ScopeHandle,
    ) -> CompileResult<Value> {
        self.expanded.set(true);
        Ok(int(9))
    }
}

/// `main() { syntax-extend(fn (scope) scope) }`
fn syntax_extend_main() -> (Rc<ir::Template>, Rc<ir::Template>) {
    let scope_param = ir::Sym::untyped(anchor(), Name::new("scope"));
    let transformer_body = Value::from(ir::Block::new(
        anchor(),
        vec![],
        Value::Sym(scope_param.clone()),
    ));
    let transformer = ir::Template::new(
        anchor(),
        Name::new("scope-transformer"),
        vec![scope_param],
        transformer_body,
        false,
    );

    let env: ScopeHandle = Rc::new(());
    let continuation: ScopeHandle = Rc::new(());
    let sx = Value::from(ir::SyntaxExtend::new(
        anchor(),
        transformer.clone(),
        env,
        continuation,
    ));
    let body = Value::from(ir::Block::new(anchor(), vec![], sx));
    let main = ir::Template::new(anchor(), Name::new("main"), vec![], body, false);
    transformer.set_scope(&main);
    (main, transformer)
}

#[test]
fn syntax_extend_runs_the_transformer_and_continues_with_the_expansion() {
    let host = Rc::new(MockHost {
        ran_transformer: Cell::new(false),
        expanded: Cell::new(false),
    });
    let session = Session::with_host(host.clone());
    let root = Frame::root();
    let (main, _) = syntax_extend_main();

    let instance = specialize_function(&session, &root, &main, &[]).expect("specialize");
    assert!(host.ran_transformer.get());
    assert!(host.expanded.get());
    assert_eq!(instance.return_type(), Some(types::i32_type()));

    let Value::Return(ret) = instance.body() else {
        panic!("body should end in a return");
    };
    assert!(matches!(&ret.value, Value::ConstInt(c) if c.value == 9));
}

#[test]
fn syntax_extend_without_a_host_is_an_error() {
    let session = Session::new();
    let root = Frame::root();
    let (main, _) = syntax_extend_main();

    let error = specialize_function(&session, &root, &main, &[]).expect_err("no host");
    assert!(matches!(&error.kind, ErrorKind::Message(m) if m.contains("host")));
}

// ---------------------------------------------------------------------------
// Keyed values
// ---------------------------------------------------------------------------

#[test]
fn keyed_values_keep_their_label_and_take_the_inner_type() {
    let session = Session::new();
    let root = Frame::root();
    let ctx = Context::new(&session, &root);

    let node = Value::from(ir::Keyed::new(anchor(), Name::new("count"), int(3)));
    let result = specialize(&ctx, &node).expect("specialize");
    let Value::Keyed(keyed) = &result else {
        panic!("keyed stays keyed");
    };
    assert_eq!(keyed.key, Name::new("count"));
    assert_eq!(result.ty(), types::i32_type());
}
