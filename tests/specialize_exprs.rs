//! Integration tests for the core specialization rules: constant folding
//! through bindings, conditional pruning, block statement filtering, binding
//! arity rules and the function cache.

use std::rc::Rc;

use smelt::builtins::Builtin;
use smelt::errors::ErrorKind;
use smelt::intern::Name;
use smelt::ir::{self, Value};
use smelt::source::Anchor;
use smelt::specialize::{frame::Frame, specialize, specialize_function, Context, Session};
use smelt::types;

// ---------------------------------------------------------------------------
// Graph building helpers
// ---------------------------------------------------------------------------

fn anchor() -> Anchor {
    Anchor::builtin()
}

fn int(value: u64) -> Value {
    Value::const_int(anchor(), types::i32_type(), value)
}

fn call(callee: Value, args: Vec<Value>) -> Value {
    Value::from(ir::Call::new(anchor(), callee, args))
}

fn builtin_call(builtin: Builtin, args: Vec<Value>) -> Value {
    call(Value::builtin_const(anchor(), builtin), args)
}

/// Wraps a value in an untyped block so it flows through the enclosing
/// evaluation target instead of passing through as a typed leaf.
fn blocked(value: Value) -> Value {
    Value::from(ir::Block::new(anchor(), vec![], value))
}

fn template(name: &str, params: Vec<Rc<ir::Sym>>, body: Value) -> Rc<ir::Template> {
    ir::Template::new(anchor(), Name::new(name), params, body, false)
}

fn root_context(session: &Rc<Session>) -> (Context, Rc<Frame>) {
    let root = Frame::root();
    (Context::new(session, &root), root)
}

// ---------------------------------------------------------------------------
// Scenario: let-bound constants fold at the builtin level
// ---------------------------------------------------------------------------

#[test]
fn let_bound_constants_fold_to_a_constant() {
    let session = Session::new();
    let root = Frame::root();

    let x = ir::Sym::untyped(anchor(), Name::new("x"));
    let binding = Value::from(ir::Let::new(anchor(), vec![x.clone()], vec![int(1)]));
    let sum = builtin_call(Builtin::Add, vec![Value::Sym(x), int(2)]);
    let body = Value::from(ir::Block::new(anchor(), vec![binding], sum));
    let main = template("main", vec![], body);

    let instance = specialize_function(&session, &root, &main, &[]).expect("specialize");
    assert!(instance.complete.get());
    assert_eq!(instance.return_type(), Some(types::i32_type()));

    let Value::Return(ret) = instance.body() else {
        panic!("function body should end in a return");
    };
    let Value::ConstInt(folded) = &ret.value else {
        panic!("the add should have folded to a constant");
    };
    assert_eq!(folded.value, 3);
    assert_eq!(folded.ty, types::i32_type());
}

#[test]
fn opaque_operands_keep_a_typed_call() {
    let session = Session::new();
    let (ctx, _) = root_context(&session);

    let x = ir::Sym::typed(anchor(), Name::new("x"), types::i32_type());
    let sum = builtin_call(Builtin::Add, vec![Value::Sym(x), int(2)]);
    let result = specialize(&ctx, &sum).expect("specialize");
    let Value::Call(typed) = &result else {
        panic!("opaque add should stay a call");
    };
    assert_eq!(result.ty(), types::i32_type());
    assert_eq!(typed.args.len(), 2);
}

// ---------------------------------------------------------------------------
// Scenario: conditionals
// ---------------------------------------------------------------------------

fn conditional(cond: Value, then_body: Value, else_body: Value) -> Value {
    Value::from(ir::If::new(
        anchor(),
        vec![ir::Clause {
            anchor: anchor(),
            cond: Some(cond),
            body: then_body,
        }],
        ir::Clause {
            anchor: anchor(),
            cond: None,
            body: else_body,
        },
    ))
}

#[test]
fn statically_true_condition_drops_the_other_branch() {
    let session = Session::new();
    let (ctx, _) = root_context(&session);

    // the else branch has an incompatible type but is unreachable, so the
    // mismatch is never reported
    let node = conditional(
        Value::const_bool(anchor(), true),
        blocked(int(1)),
        Value::str_const(anchor(), "s"),
    );
    let result = specialize(&ctx, &node).expect("specialize");
    let Value::ConstInt(constant) = &result else {
        panic!("statically-true if should collapse to its branch value");
    };
    assert_eq!(constant.value, 1);
    assert_eq!(result.ty(), types::i32_type());
}

#[test]
fn statically_false_clauses_vanish() {
    let session = Session::new();
    let (ctx, _) = root_context(&session);

    let node = conditional(
        Value::const_bool(anchor(), false),
        Value::str_const(anchor(), "unreachable"),
        blocked(int(7)),
    );
    let result = specialize(&ctx, &node).expect("specialize");
    assert_eq!(result.ty(), types::i32_type());
}

#[test]
fn opaque_condition_with_incompatible_branches_fails_to_merge() {
    let session = Session::new();
    let (ctx, _) = root_context(&session);

    let cond = ir::Sym::typed(anchor(), Name::new("cond"), types::bool_type());
    let node = conditional(
        Value::Sym(cond),
        blocked(int(1)),
        Value::str_const(anchor(), "s"),
    );
    let error = specialize(&ctx, &node).expect_err("branches cannot merge");
    assert!(matches!(
        error.kind,
        ErrorKind::CannotMergeExpressionTypes { left, right }
            if left == types::i32_type() && right == types::str_type()
    ));
}

#[test]
fn non_boolean_condition_is_rejected() {
    let session = Session::new();
    let (ctx, _) = root_context(&session);

    let node = conditional(int(1), blocked(int(2)), blocked(int(3)));
    let error = specialize(&ctx, &node).expect_err("condition must be bool");
    assert!(matches!(
        error.kind,
        ErrorKind::InvalidConditionType { ty } if ty == types::i32_type()
    ));
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

#[test]
fn interior_noreturn_statement_is_rejected() {
    let session = Session::new();
    let root = Frame::root();

    let early = Value::from(ir::Return::new(anchor(), int(1)));
    let body = Value::from(ir::Block::new(anchor(), vec![early], int(2)));
    let main = template("main", vec![], body);

    let error = specialize_function(&session, &root, &main, &[]).expect_err("must reject");
    assert!(matches!(error.kind, ErrorKind::NoReturnNotLastExpression));
}

#[test]
fn useless_statements_disappear_from_blocks() {
    let session = Session::new();
    let root = Frame::root();

    // a bare constant statement and a constant-only let both evaporate; the
    // opaque add stays because its result could matter at runtime
    let p = ir::Sym::untyped(anchor(), Name::new("p"));
    let x = ir::Sym::untyped(anchor(), Name::new("x"));
    let binding = Value::from(ir::Let::new(anchor(), vec![x.clone()], vec![int(4)]));
    let stray = int(9);
    let opaque = builtin_call(Builtin::Add, vec![Value::Sym(p.clone()), int(1)]);
    let keep = builtin_call(Builtin::Add, vec![Value::Sym(x.clone()), Value::Sym(x)]);
    let body = Value::from(ir::Block::new(
        anchor(),
        vec![binding, stray, opaque],
        keep,
    ));
    let main = template("main", vec![p], body);

    let instance =
        specialize_function(&session, &root, &main, &[types::i32_type()]).expect("specialize");
    let Value::Return(ret) = instance.body() else {
        panic!("body should end in return");
    };
    let Value::Block(block) = &ret.value else {
        panic!("the surviving statement should keep the block");
    };
    assert_eq!(block.body.len(), 1);
    assert!(matches!(&block.body[0], Value::Call(_)));
    let Value::ConstInt(folded) = &block.value else {
        panic!("x + x should fold");
    };
    assert_eq!(folded.value, 8);
}

// ---------------------------------------------------------------------------
// Binding rules
// ---------------------------------------------------------------------------

#[test]
fn variadic_parameter_must_be_last() {
    let session = Session::new();
    let root = Frame::root();

    let rest = ir::Sym::variadic(anchor(), Name::new("rest"));
    let x = ir::Sym::untyped(anchor(), Name::new("x"));
    let main = template("main", vec![rest, x], blocked(int(0)));

    let error = specialize_function(&session, &root, &main, &[types::i32_type()])
        .expect_err("variadic must be last");
    assert!(matches!(error.kind, ErrorKind::VariadicSymbolNotInLastPlace));
}

#[test]
fn variadic_tail_spreads_into_parameters() {
    let session = Session::new();
    let root = Frame::root();

    let x = ir::Sym::untyped(anchor(), Name::new("x"));
    let rest = ir::Sym::variadic(anchor(), Name::new("rest"));
    let main = template("main", vec![x, rest], blocked(int(0)));

    let arg_types = [types::i32_type(), types::i32_type(), types::f32_type()];
    let instance = specialize_function(&session, &root, &main, &arg_types).expect("specialize");
    assert_eq!(instance.params.borrow().len(), 3);
    assert_eq!(instance.instance_args, arg_types);

    // exactly one remaining argument binds the variadic directly
    let session = Session::new();
    let root = Frame::root();
    let x = ir::Sym::untyped(anchor(), Name::new("x"));
    let rest = ir::Sym::variadic(anchor(), Name::new("rest"));
    let main = template("main", vec![x, rest], blocked(int(0)));
    let instance =
        specialize_function(&session, &root, &main, &[types::i32_type(), types::f32_type()])
            .expect("specialize");
    assert_eq!(instance.params.borrow().len(), 2);
}

#[test]
fn missing_arguments_pad_with_none() {
    let session = Session::new();
    let root = Frame::root();

    let x = ir::Sym::untyped(anchor(), Name::new("x"));
    let body = blocked(Value::Sym(x.clone()));
    let main = template("main", vec![x], body);

    let instance = specialize_function(&session, &root, &main, &[]).expect("specialize");
    assert_eq!(instance.return_type(), Some(types::nothing_type()));
}

#[test]
fn typed_parameter_must_agree_with_instance_type() {
    let session = Session::new();
    let root = Frame::root();

    let x = ir::Sym::typed(anchor(), Name::new("x"), types::i32_type());
    let main = template("main", vec![x], blocked(int(0)));

    let error = specialize_function(&session, &root, &main, &[types::f32_type()])
        .expect_err("declared type must match");
    assert!(matches!(
        error.kind,
        ErrorKind::ArgumentTypeMismatch { expected, got }
            if expected == types::i32_type() && got == types::f32_type()
    ));
}

// ---------------------------------------------------------------------------
// Control transfers
// ---------------------------------------------------------------------------

#[test]
fn break_and_repeat_require_a_loop() {
    let session = Session::new();
    let (ctx, _) = root_context(&session);

    let stray_break = Value::from(ir::Break::new(anchor(), int(1)));
    let error = specialize(&ctx, &stray_break).expect_err("break needs a loop");
    assert!(matches!(error.kind, ErrorKind::IllegalBreakOutsideLoop));

    let stray_repeat = Value::from(ir::Repeat::new(anchor(), vec![int(1)]));
    let error = specialize(&ctx, &stray_repeat).expect_err("repeat needs a loop");
    assert!(matches!(error.kind, ErrorKind::IllegalRepeatOutsideLoop));
}

#[test]
fn loop_type_comes_from_its_breaks() {
    let session = Session::new();
    let (ctx, _) = root_context(&session);

    let i = ir::Sym::untyped(anchor(), Name::new("i"));
    let cond = builtin_call(Builtin::ICmpSLt, vec![Value::Sym(i.clone()), int(3)]);
    let step = builtin_call(Builtin::Add, vec![Value::Sym(i.clone()), int(1)]);
    let again = Value::from(ir::Repeat::new(anchor(), vec![step]));
    let done = Value::from(ir::Break::new(anchor(), Value::Sym(i.clone())));
    let body = conditional(cond, blocked(again), blocked(done));
    let node = Value::from(ir::Loop::with_body(anchor(), vec![i], vec![int(0)], body));

    let result = specialize(&ctx, &node).expect("specialize");
    assert_eq!(result.ty(), types::i32_type());
    let Value::Loop(specialized) = &result else {
        panic!("loop should stay a loop");
    };
    assert_eq!(*specialized.return_type.borrow(), Some(types::i32_type()));
}

// ---------------------------------------------------------------------------
// Idempotence and the cache
// ---------------------------------------------------------------------------

#[test]
fn typed_leaves_specialize_to_themselves() {
    let session = Session::new();
    let (ctx, _) = root_context(&session);

    let constant = int(5);
    let result = specialize(&ctx, &constant).expect("specialize");
    assert_eq!(result.id(), constant.id());

    let sym = Value::Sym(ir::Sym::typed(anchor(), Name::new("v"), types::f32_type()));
    let result = specialize(&ctx, &sym).expect("specialize");
    assert_eq!(result.id(), sym.id());
}

#[test]
fn respecializing_returns_the_cached_instance() {
    let session = Session::new();
    let root = Frame::root();

    let x = ir::Sym::untyped(anchor(), Name::new("x"));
    let main = template("main", vec![x.clone()], blocked(Value::Sym(x)));

    let first =
        specialize_function(&session, &root, &main, &[types::i32_type()]).expect("specialize");
    let second =
        specialize_function(&session, &root, &main, &[types::i32_type()]).expect("cache hit");
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(session.cache.len(), 1);

    let other =
        specialize_function(&session, &root, &main, &[types::f32_type()]).expect("specialize");
    assert!(!Rc::ptr_eq(&first, &other));
    assert_eq!(session.cache.len(), 2);
}

// ---------------------------------------------------------------------------
// Multi-values
// ---------------------------------------------------------------------------

#[test]
fn trailing_multi_values_splat_and_interior_ones_truncate() {
    let session = Session::new();
    let (ctx, _) = root_context(&session);

    let inner = Value::from(ir::ArgumentList::new(anchor(), vec![int(2), int(3)]));
    let trailing = Value::from(ir::ArgumentList::new(
        anchor(),
        vec![int(1), inner.clone()],
    ));
    let result = specialize(&ctx, &trailing).expect("specialize");
    assert_eq!(types::arguments_values(result.ty()).len(), 3);

    let interior = Value::from(ir::ArgumentList::new(anchor(), vec![inner, int(9)]));
    let result = specialize(&ctx, &interior).expect("specialize");
    let Value::ArgumentList(list) = &result else {
        panic!("expected an argument list");
    };
    assert_eq!(list.values.len(), 2);
    let Value::ConstInt(first) = &list.values[0] else {
        panic!("interior multi-value should contribute its first element");
    };
    assert_eq!(first.value, 2);
}

#[test]
fn non_returning_arguments_are_rejected() {
    let session = Session::new();
    let (ctx, _) = root_context(&session);

    let raise = Value::from(ir::Raise::new(anchor(), int(1)));
    let node = Value::from(ir::ArgumentList::new(anchor(), vec![raise, int(2)]));
    let error = specialize(&ctx, &node).expect_err("noreturn argument");
    assert!(matches!(error.kind, ErrorKind::NoReturnNotLastExpression));
}

// ---------------------------------------------------------------------------
// Try
// ---------------------------------------------------------------------------

#[test]
fn try_joins_both_body_types() {
    let session = Session::new();
    let (ctx, _) = root_context(&session);

    let node = Value::from(ir::Try::new(anchor(), blocked(int(1)), blocked(int(2))));
    let result = specialize(&ctx, &node).expect("specialize");
    assert_eq!(result.ty(), types::i32_type());

    let node = Value::from(ir::Try::new(
        anchor(),
        blocked(int(1)),
        Value::str_const(anchor(), "s"),
    ));
    let error = specialize(&ctx, &node).expect_err("incompatible bodies");
    assert!(matches!(
        error.kind,
        ErrorKind::CannotMergeExpressionTypes { .. }
    ));
}
