//! The specializer: one interleaved pass that turns the untyped value graph
//! into typed, monomorphized IR.
//!
//! Specialization is driven by an evaluation target describing what the
//! surrounding code does with a value: discard it (`Void`), consume it
//! (`Symbol`), or return it from the enclosing function (`Return`). Every
//! rule produces a value carrying a concrete type or `noreturn`; control
//! transfers are always `noreturn`.

pub mod cache;
pub mod call;
pub mod frame;
pub mod scheduler;

use std::cell::RefCell;
use std::rc::Rc;

use crate::errors::{CompileResult, ErrorKind, SpecializeError};
use crate::host::HostInterface;
use crate::ir::{self, Clause, Closure, Sym, Template, Value};
use crate::source::Anchor;
use crate::types::{self, Type, TypeKind};

use cache::FunctionCache;
use frame::Frame;
use scheduler::Scheduler;

/// Everything a single specialization run shares: the function cache and the
/// cooperative job queue, plus the optional expander/JIT host. Sessions are
/// independent of each other, so tests build isolated compilers.
pub struct Session {
    pub cache: FunctionCache,
    pub scheduler: Scheduler,
    pub host: Option<Rc<dyn HostInterface>>,
}

impl Session {
    pub fn new() -> Rc<Session> {
        Rc::new(Session {
            cache: FunctionCache::new(),
            scheduler: Scheduler::new(),
            host: None,
        })
    }

    pub fn with_host(host: Rc<dyn HostInterface>) -> Rc<Session> {
        Rc::new(Session {
            cache: FunctionCache::new(),
            scheduler: Scheduler::new(),
            host: Some(host),
        })
    }
}

/// What the surrounding code does with the value being specialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The result is discarded; returning types rewrite to `()`
    Void,
    /// The result is consumed as a value
    Symbol,
    /// The result becomes the enclosing function's return value
    Return,
}

/// Ambient state threaded through every specialization step.
#[derive(Clone)]
pub struct Context {
    session: Rc<Session>,
    pub frame: Rc<Frame>,
    pub target: Target,
    pub enclosing_loop: Option<Rc<ir::Loop>>,
    pub enclosing_try: Option<Rc<ir::Try>>,
}

impl Context {
    pub fn new(session: &Rc<Session>, frame: &Rc<Frame>) -> Context {
        Context {
            session: session.clone(),
            frame: frame.clone(),
            target: Target::Symbol,
            enclosing_loop: None,
            enclosing_try: None,
        }
    }

    pub fn session(&self) -> &Rc<Session> {
        &self.session
    }

    fn with_target(&self, target: Target) -> Context {
        Context {
            target,
            ..self.clone()
        }
    }

    pub fn with_void_target(&self) -> Context {
        self.with_target(Target::Void)
    }

    pub fn with_symbol_target(&self) -> Context {
        self.with_target(Target::Symbol)
    }

    pub fn with_return_target(&self) -> Context {
        self.with_target(Target::Return)
    }

    fn with_frame(&self, frame: &Rc<Frame>, target: Target) -> Context {
        Context {
            session: self.session.clone(),
            frame: frame.clone(),
            target,
            enclosing_loop: None,
            enclosing_try: None,
        }
    }

    pub fn for_loop(&self, enclosing: &Rc<ir::Loop>) -> Context {
        Context {
            target: Target::Symbol,
            enclosing_loop: Some(enclosing.clone()),
            ..self.clone()
        }
    }

    pub fn for_try(&self, enclosing: &Rc<ir::Try>) -> Context {
        Context {
            enclosing_try: Some(enclosing.clone()),
            ..self.clone()
        }
    }

    pub fn is_target_void(&self) -> bool {
        self.target == Target::Void
    }

    /// Discarded results lose their value: any returning type becomes the
    /// empty arguments tuple.
    pub fn transform_return_type(&self, ty: Type) -> Type {
        if ty.is_returning() && self.is_target_void() {
            return types::empty_arguments_type();
        }
        ty
    }
}

// ---------------------------------------------------------------------------
// Type joins
// ---------------------------------------------------------------------------

/// Join for branch result types; the incoming type is void-rewritten first.
pub fn merge_value_type(
    ctx: &Context,
    anchor: Anchor,
    t1: Option<Type>,
    t2: Type,
) -> CompileResult<Type> {
    let t2 = ctx.transform_return_type(t2);
    merge_return_type(anchor, t1, t2)
}

/// The monotone join both `return_type` and `except_type` refine through:
/// absent ⊔ T = T, T ⊔ T = T, `noreturn` loses to anything returning, and
/// two distinct returning types cannot merge.
pub fn merge_return_type(anchor: Anchor, t1: Option<Type>, t2: Type) -> CompileResult<Type> {
    let Some(t1) = t1 else {
        return Ok(t2);
    };
    if t1 == t2 {
        return Ok(t1);
    }
    if !t1.is_returning() {
        return Ok(t2);
    }
    if !t2.is_returning() {
        return Ok(t1);
    }
    Err(SpecializeError::new(
        ErrorKind::CannotMergeExpressionTypes { left: t1, right: t2 },
        anchor,
    ))
}

// ---------------------------------------------------------------------------
// Argument plumbing
// ---------------------------------------------------------------------------

/// Pulls one element out of a multi-value: the element itself when the list
/// is explicit, a typed projection when it is opaque, `none` past the end.
pub fn extract_argument(value: &Value, index: usize) -> Value {
    let anchor = value.anchor();
    let ty = value.ty();
    if !ty.is_returning() {
        return value.clone();
    }
    if ty.is_arguments() {
        match types::type_at_index(ty, index) {
            None => Value::none(anchor),
            Some(element) if element == types::nothing_type() => Value::none(anchor),
            Some(element) => {
                if let Value::ArgumentList(list) = value {
                    list.values[index].clone()
                } else {
                    let node = Value::from(ir::ExtractArgument::new(anchor, value.clone(), index));
                    node.set_type(element);
                    node
                }
            }
        }
    } else if index == 0 {
        value.clone()
    } else {
        Value::none(anchor)
    }
}

/// A single value is its own argument list.
pub fn build_argument_list(anchor: Anchor, mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        return values.pop().unwrap();
    }
    let ty = types::arguments_type(values.iter().map(Value::ty).collect());
    let node = Value::from(ir::ArgumentList::new(anchor, values));
    node.set_type(ty);
    node
}

/// Specializes a value sequence under the symbol target and flattens
/// multi-values: a trailing arguments tuple is splatted in full, an interior
/// one contributes only its first element. Non-returning values are illegal
/// in argument position.
pub fn specialize_arguments(ctx: &Context, values: &[Value]) -> CompileResult<Vec<Value>> {
    let subctx = ctx.with_symbol_target();
    let count = values.len();
    let mut out = Vec::with_capacity(count);
    for (i, source) in values.iter().enumerate() {
        let value = specialize(&subctx, source)?;
        let ty = value.ty();
        if !ty.is_returning() {
            return Err(SpecializeError::new(
                ErrorKind::NoReturnNotLastExpression,
                value.anchor(),
            ));
        }
        if ty.is_arguments() {
            if i + 1 == count {
                for j in 0..types::arguments_values(ty).len() {
                    out.push(extract_argument(&value, j));
                }
                break;
            }
            out.push(extract_argument(&value, 0));
            continue;
        }
        out.push(value);
    }
    Ok(out)
}

/// Binds already-specialized arguments to parameters, producing the
/// surviving (parameter, argument) pairs. With `inline_constants`, symbolic
/// values are substituted through the frame instead of materializing a
/// binding.
fn bind_specialized_arguments(
    ctx: &Context,
    params: &[Rc<Sym>],
    args: Vec<Value>,
    inline_constants: bool,
) -> CompileResult<(Vec<Rc<Sym>>, Vec<Value>)> {
    let count = params.len();
    let mut out_params = Vec::new();
    let mut out_args = Vec::new();
    for (i, old_sym) in params.iter().enumerate() {
        let new_value = if old_sym.is_variadic() {
            if i + 1 < count {
                return Err(SpecializeError::new(
                    ErrorKind::VariadicSymbolNotInLastPlace,
                    old_sym.anchor,
                ));
            }
            if i + 1 == args.len() {
                args[i].clone()
            } else {
                let rest: Vec<Value> = args.get(i..).unwrap_or(&[]).to_vec();
                let ty = types::arguments_type(rest.iter().map(Value::ty).collect());
                let list = Value::from(ir::ArgumentList::new(old_sym.anchor, rest));
                list.set_type(ty);
                list
            }
        } else if i < args.len() {
            args[i].clone()
        } else {
            Value::none(old_sym.anchor)
        };

        if inline_constants && new_value.is_symbolic() {
            ctx.frame.bind(&Value::Sym(old_sym.clone()), new_value);
        } else {
            let new_sym = Sym::typed(old_sym.anchor, old_sym.name, new_value.ty());
            ctx.frame
                .bind(&Value::Sym(old_sym.clone()), Value::Sym(new_sym.clone()));
            out_params.push(new_sym);
            out_args.push(new_value);
        }
    }
    Ok((out_params, out_args))
}

fn bind_arguments(
    ctx: &Context,
    params: &[Rc<Sym>],
    values: &[Value],
    inline_constants: bool,
) -> CompileResult<(Vec<Rc<Sym>>, Vec<Value>)> {
    let args = specialize_arguments(ctx, values)?;
    bind_specialized_arguments(ctx, params, args, inline_constants)
}

// ---------------------------------------------------------------------------
// Node rules
// ---------------------------------------------------------------------------

/// Statements whose results nobody can observe.
fn is_useless(node: &Value) -> bool {
    if node.is_constant() {
        return true;
    }
    match node {
        Value::Template(_) | Value::Function(_) | Value::Sym(_) => true,
        Value::Let(binding) => binding.params.is_empty(),
        _ => false,
    }
}

fn specialize_block(ctx: &Context, block: &Rc<ir::Block>) -> CompileResult<Value> {
    let subctx = ctx.with_void_target();
    let mut body = Vec::new();
    for source in &block.body {
        let statement = specialize(&subctx, source)?;
        if !statement.ty().is_returning() {
            return Err(SpecializeError::new(
                ErrorKind::NoReturnNotLastExpression,
                statement.anchor(),
            ));
        }
        if !is_useless(&statement) {
            body.push(statement);
        }
    }
    let tail = specialize(ctx, &block.value)?;
    if body.is_empty() {
        return Ok(tail);
    }
    let ty = ctx.transform_return_type(tail.ty());
    let node = Value::from(ir::Block::new(block.anchor, body, tail));
    node.set_type(ty);
    Ok(node)
}

fn specialize_argument_list(ctx: &Context, list: &Rc<ir::ArgumentList>) -> CompileResult<Value> {
    let values = specialize_arguments(ctx, &list.values)?;
    Ok(build_argument_list(list.anchor, values))
}

fn specialize_extract_argument(
    ctx: &Context,
    node: &Rc<ir::ExtractArgument>,
) -> CompileResult<Value> {
    let value = specialize(ctx, &node.value)?;
    Ok(extract_argument(&value, node.index))
}

fn specialize_let(ctx: &Context, binding: &Rc<ir::Let>) -> CompileResult<Value> {
    let (params, args) = bind_arguments(ctx, &binding.params, &binding.args, true)?;
    let node = Value::from(ir::Let::new(binding.anchor, params, args));
    node.set_type(types::empty_arguments_type());
    Ok(node)
}

fn specialize_loop(ctx: &Context, source: &Rc<ir::Loop>) -> CompileResult<Value> {
    let new_loop = ir::Loop::new(source.anchor);
    let (params, args) = bind_arguments(
        ctx,
        &source.params.borrow(),
        &source.args.borrow(),
        false,
    )?;
    *new_loop.params.borrow_mut() = params;
    *new_loop.args.borrow_mut() = args;
    let body = specialize(&ctx.for_loop(&new_loop), &source.body())?;
    let joined = merge_value_type(ctx, source.anchor, *new_loop.return_type.borrow(), body.ty())?;
    *new_loop.body.borrow_mut() = Some(body);
    *new_loop.return_type.borrow_mut() = Some(joined);
    let node = Value::from(new_loop);
    node.set_type(joined);
    Ok(node)
}

fn specialize_break(ctx: &Context, node: &Rc<ir::Break>) -> CompileResult<Value> {
    let Some(enclosing) = ctx.enclosing_loop.clone() else {
        return Err(SpecializeError::new(
            ErrorKind::IllegalBreakOutsideLoop,
            node.anchor,
        ));
    };
    let subctx = ctx.with_symbol_target();
    let value = specialize(&subctx, &node.value)?;
    let joined = merge_value_type(
        &subctx,
        node.anchor,
        *enclosing.return_type.borrow(),
        value.ty(),
    )?;
    *enclosing.return_type.borrow_mut() = Some(joined);
    let new_break = Value::from(ir::Break::new(node.anchor, value));
    new_break.set_type(types::noreturn_type());
    Ok(new_break)
}

fn specialize_repeat(ctx: &Context, node: &Rc<ir::Repeat>) -> CompileResult<Value> {
    if ctx.enclosing_loop.is_none() {
        return Err(SpecializeError::new(
            ErrorKind::IllegalRepeatOutsideLoop,
            node.anchor,
        ));
    }
    let args = specialize_arguments(ctx, &node.args)?;
    let new_repeat = Value::from(ir::Repeat::new(node.anchor, args));
    new_repeat.set_type(types::noreturn_type());
    Ok(new_repeat)
}

/// Synthesizes a `return`, joining the receiving function's return type.
/// Returns inside inline expansions escape to the innermost non-inline
/// frame.
fn make_return(ctx: &Context, anchor: Anchor, value: Value) -> CompileResult<Value> {
    let mut frame = ctx.frame.clone();
    while frame.is_inline() {
        frame = frame
            .parent
            .clone()
            .expect("inline frame without a parent");
    }
    let joined = merge_return_type(anchor, frame.return_type(), value.ty())?;
    *frame.return_type.borrow_mut() = Some(joined);
    let node = Value::from(ir::Return::new(anchor, value));
    node.set_type(types::noreturn_type());
    Ok(node)
}

fn specialize_return(ctx: &Context, node: &Rc<ir::Return>) -> CompileResult<Value> {
    if ctx.frame.is_inline() {
        return Err(SpecializeError::new(
            ErrorKind::IllegalReturnInInline,
            node.anchor,
        ));
    }
    let value = specialize(&ctx.with_symbol_target(), &node.value)?;
    if ctx.target == Target::Return {
        // flows out bare; the dispatch wrapper synthesizes the return
        return Ok(value);
    }
    make_return(ctx, node.anchor, value)
}

fn specialize_raise(ctx: &Context, node: &Rc<ir::Raise>) -> CompileResult<Value> {
    let value = specialize(&ctx.with_symbol_target(), &node.value)?;
    let joined = merge_return_type(node.anchor, ctx.frame.except_type(), value.ty())?;
    *ctx.frame.except_type.borrow_mut() = Some(joined);
    let new_raise = Value::from(ir::Raise::new(node.anchor, value));
    new_raise.set_type(types::noreturn_type());
    Ok(new_raise)
}

fn specialize_if(ctx: &Context, node: &Rc<ir::If>) -> CompileResult<Value> {
    assert!(!node.clauses.is_empty(), "if without clauses");
    let subctx = ctx.with_symbol_target();
    let mut clauses: Vec<Clause> = Vec::new();
    let mut else_clause = None;
    for clause in &node.clauses {
        let cond_source = clause.cond.as_ref().expect("clause without condition");
        let cond = specialize(&subctx, cond_source)?;
        if cond.ty() != types::bool_type() {
            return Err(SpecializeError::new(
                ErrorKind::InvalidConditionType { ty: cond.ty() },
                clause.anchor,
            ));
        }
        if let Some(constant) = cond.as_const_int() {
            if constant.value != 0 {
                // always taken; nothing beyond this clause is reachable
                else_clause = Some(Clause {
                    anchor: clause.anchor,
                    cond: None,
                    body: clause.body.clone(),
                });
                break;
            }
            // never taken
            continue;
        }
        clauses.push(Clause {
            anchor: clause.anchor,
            cond: Some(cond),
            body: clause.body.clone(),
        });
    }
    let mut else_clause = else_clause.unwrap_or_else(|| node.else_clause.clone());

    // every surviving branch runs as a suspendable job so branches can wait
    // on each other's return types
    let mut bodies: Vec<Value> = clauses.iter().map(|c| c.body.clone()).collect();
    bodies.push(else_clause.body.clone());
    let bodies = specialize_jobs(ctx, bodies)?;

    let mut result_type = None;
    for body in &bodies {
        result_type = Some(merge_value_type(
            ctx,
            body.anchor(),
            result_type,
            body.ty(),
        )?);
    }
    let mut bodies = bodies;
    else_clause.body = bodies.pop().expect("else body went missing");
    for (clause, body) in clauses.iter_mut().zip(bodies) {
        clause.body = body;
    }

    if clauses.is_empty() {
        // the else branch is always selected
        return Ok(else_clause.body);
    }
    let ty = ctx.transform_return_type(result_type.expect("if without branches"));
    let new_if = Value::from(ir::If::new(node.anchor, clauses, else_clause));
    new_if.set_type(ty);
    Ok(new_if)
}

fn specialize_keyed(ctx: &Context, node: &Rc<ir::Keyed>) -> CompileResult<Value> {
    let value = specialize(ctx, &node.value)?;
    let ty = value.ty();
    let new_keyed = Value::from(ir::Keyed::new(node.anchor, node.key, value));
    new_keyed.set_type(ty);
    Ok(new_keyed)
}

fn specialize_try(ctx: &Context, node: &Rc<ir::Try>) -> CompileResult<Value> {
    let try_body = specialize(ctx, &node.try_body)?;
    let except_body = specialize(ctx, &node.except_body)?;
    let joined = merge_value_type(ctx, node.anchor, None, try_body.ty())?;
    let joined = merge_value_type(ctx, node.anchor, Some(joined), except_body.ty())?;
    let new_try = Value::from(ir::Try::new(node.anchor, try_body, except_body));
    new_try.set_type(joined);
    Ok(new_try)
}

/// A template literal closes over the frame instantiating its definition
/// scope.
fn specialize_template_literal(ctx: &Context, template: &Rc<Template>) -> CompileResult<Value> {
    let scope = template.scope().expect("template literal without a scope");
    let Some(frame) = Frame::find_frame(&ctx.frame, &scope) else {
        return Err(SpecializeError::new(
            ErrorKind::CannotFindFrame {
                name: template.name,
            },
            template.anchor,
        ));
    };
    Ok(Value::closure_const(
        template.anchor,
        Closure::new(template.clone(), frame),
    ))
}

fn specialize_syntax_extend(ctx: &Context, node: &Rc<ir::SyntaxExtend>) -> CompileResult<Value> {
    let scope = node
        .func
        .scope()
        .expect("syntax-extend function without a scope");
    let Some(frame) = Frame::find_frame(&ctx.frame, &scope) else {
        return Err(SpecializeError::new(
            ErrorKind::CannotFindFrame {
                name: node.func.name,
            },
            node.func.anchor,
        ));
    };
    let instance =
        specialize_function(ctx.session(), &frame, &node.func, &[types::scope_type()])?;

    let signature = instance.get_type().and_then(types::function_pointee);
    let transformer_ok = match signature.as_deref() {
        Some(TypeKind::Function {
            return_type,
            params,
            ..
        }) => {
            *return_type == types::scope_type()
                && params.len() == 1
                && params[0] == types::scope_type()
        }
        _ => false,
    };
    if !transformer_ok {
        return Err(SpecializeError::message(
            node.anchor,
            format!(
                "syntax-extend transformer has the wrong signature: {}",
                *instance.function_pointer_type()
            ),
        ));
    }

    let Some(host) = ctx.session().host.clone() else {
        return Err(SpecializeError::message(
            node.anchor,
            "syntax-extend requires a compilation host",
        ));
    };
    let function = Value::Function(instance);
    let env = host.run_scope_transformer(&function, &node.env)?;
    let next = host.expand_continuation(&node.continuation, &env)?;
    specialize(ctx, &next)
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Specializes one node under the ambient context. Bindings win over
/// everything; an already-typed unbound node passes through unchanged; every
/// other node dispatches on its variant. Under the `Return` target any
/// returning result is wrapped into a synthesized `return`.
pub fn specialize(ctx: &Context, node: &Value) -> CompileResult<Value> {
    let result = match ctx.frame.resolve(node) {
        Some(bound) => bound,
        None => {
            if node.is_typed() {
                return Ok(node.clone());
            }
            log::trace!("specializing {} at {}", node.kind_name(), node.anchor());
            match node {
                Value::Template(template) => specialize_template_literal(ctx, template)?,
                Value::Function(_) => node.clone(),
                Value::Sym(sym) => {
                    return Err(SpecializeError::new(
                        ErrorKind::UnboundSymbol { name: sym.name },
                        sym.anchor,
                    ));
                }
                Value::ConstInt(_)
                | Value::ConstReal(_)
                | Value::ConstPointer(_)
                | Value::ConstTuple(_)
                | Value::ConstArray(_)
                | Value::ConstVector(_)
                | Value::Extern(_) => node.clone(),
                Value::ArgumentList(list) => specialize_argument_list(ctx, list)?,
                Value::ExtractArgument(extract) => specialize_extract_argument(ctx, extract)?,
                Value::Call(call) => call::specialize_call(ctx, call)?,
                Value::Let(binding) => specialize_let(ctx, binding)?,
                Value::Loop(source) => specialize_loop(ctx, source)?,
                Value::If(source) => specialize_if(ctx, source)?,
                Value::Break(source) => specialize_break(ctx, source)?,
                Value::Repeat(source) => specialize_repeat(ctx, source)?,
                Value::Return(source) => specialize_return(ctx, source)?,
                Value::Raise(source) => specialize_raise(ctx, source)?,
                Value::Try(source) => specialize_try(ctx, source)?,
                Value::Block(block) => specialize_block(ctx, block)?,
                Value::Keyed(keyed) => specialize_keyed(ctx, keyed)?,
                Value::SyntaxExtend(sx) => specialize_syntax_extend(ctx, sx)?,
            }
        }
    };
    if ctx.target == Target::Return && result.ty().is_returning() {
        return make_return(ctx, result.anchor(), result);
    }
    Ok(result)
}

// ---------------------------------------------------------------------------
// Branch jobs
// ---------------------------------------------------------------------------

type JobSlot = Rc<RefCell<Option<CompileResult<Value>>>>;

/// Runs one specialization per node through the cooperative queue. All jobs
/// complete before this returns; the first error in enqueue order wins and
/// later results are discarded.
fn specialize_jobs(ctx: &Context, nodes: Vec<Value>) -> CompileResult<Vec<Value>> {
    let slots: Vec<JobSlot> = nodes.iter().map(|_| JobSlot::default()).collect();
    for (node, slot) in nodes.into_iter().zip(&slots) {
        let job_ctx = ctx.clone();
        let slot = slot.clone();
        ctx.session().scheduler.enqueue(Box::new(move || {
            let result = specialize(&job_ctx, &node);
            *slot.borrow_mut() = Some(result);
        }));
    }
    ctx.session().scheduler.process();
    slots
        .into_iter()
        .map(|slot| {
            slot.borrow_mut()
                .take()
                .expect("specialization job did not complete")
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Function specialization
// ---------------------------------------------------------------------------

/// Specializes `template` against concrete argument types inside `frame`,
/// memoized in the session's function cache. The in-flight instance is
/// inserted before its body runs so recursive self-calls find it.
pub fn specialize_function(
    session: &Rc<Session>,
    frame: &Rc<Frame>,
    template: &Rc<Template>,
    arg_types: &[Type],
) -> CompileResult<Rc<Frame>> {
    if let Some(found) = session.cache.lookup(frame, template, arg_types) {
        log::debug!("cache hit for {}", template.name);
        return Ok(found);
    }
    log::debug!(
        "specializing function {} with {} argument type(s)",
        template.name,
        arg_types.len()
    );

    let instance = Frame::instantiate(template, frame, arg_types.to_vec());
    let count = template.params.len();
    for (i, old_param) in template.params.iter().enumerate() {
        if old_param.is_variadic() {
            if i + 1 < count {
                return Err(SpecializeError::new(
                    ErrorKind::VariadicSymbolNotInLastPlace,
                    old_param.anchor,
                ));
            }
            if i + 1 == arg_types.len() {
                let new_param = Sym::typed(old_param.anchor, old_param.name, arg_types[i]);
                instance.append_param(new_param.clone());
                instance.bind(&Value::Sym(old_param.clone()), Value::Sym(new_param));
            } else {
                // the tail of the argument types spreads into one parameter
                // per type, rejoined as a multi-value
                let tail = arg_types.get(i..).unwrap_or(&[]);
                let mut list_values = Vec::with_capacity(tail.len());
                for &ty in tail {
                    let new_param = Sym::typed(old_param.anchor, old_param.name, ty);
                    instance.append_param(new_param.clone());
                    list_values.push(Value::Sym(new_param));
                }
                let list = Value::from(ir::ArgumentList::new(old_param.anchor, list_values));
                list.set_type(types::arguments_type(tail.to_vec()));
                instance.bind(&Value::Sym(old_param.clone()), list);
            }
        } else {
            let ty = arg_types
                .get(i)
                .copied()
                .unwrap_or_else(types::nothing_type);
            if let Some(declared) = old_param.get_type() {
                if declared != ty {
                    return Err(SpecializeError::new(
                        ErrorKind::ArgumentTypeMismatch {
                            expected: declared,
                            got: ty,
                        },
                        old_param.anchor,
                    ));
                }
            }
            let new_param = Sym::typed(old_param.anchor, old_param.name, ty);
            instance.append_param(new_param.clone());
            instance.bind(&Value::Sym(old_param.clone()), Value::Sym(new_param));
        }
    }
    session
        .cache
        .insert(frame, template, arg_types, instance.clone());

    let subctx = Context::new(session, &instance).with_return_target();
    let body = instance.body();
    let result = specialize(&subctx, &body)
        .map_err(|e| e.with_function_trace(instance.anchor, instance.name))?;
    assert!(
        !result.ty().is_returning(),
        "function body must exit through a return or raise"
    );
    instance.set_body(result);
    instance.complete.set(true);
    instance.set_type(instance.function_pointer_type());
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{f32_type, i32_type, noreturn_type, str_type};

    fn anchor() -> Anchor {
        Anchor::builtin()
    }

    #[test]
    fn merge_return_type_is_commutative() {
        let pairs = [
            (i32_type(), i32_type(), Some(i32_type())),
            (noreturn_type(), i32_type(), Some(i32_type())),
            (i32_type(), noreturn_type(), Some(i32_type())),
            (i32_type(), str_type(), None),
        ];
        for (a, b, expect) in pairs {
            let left = merge_return_type(anchor(), Some(a), b).ok();
            let right = merge_return_type(anchor(), Some(b), a).ok();
            assert_eq!(left, expect);
            assert_eq!(right, expect);
        }
        assert_eq!(
            merge_return_type(anchor(), None, f32_type()).ok(),
            Some(f32_type())
        );
    }

    #[test]
    fn single_element_lists_collapse() {
        let x = Value::const_int(anchor(), i32_type(), 7);
        let collapsed = build_argument_list(anchor(), vec![x.clone()]);
        assert_eq!(collapsed.id(), x.id());
        assert_eq!(extract_argument(&collapsed, 0).id(), x.id());
    }

    #[test]
    fn extraction_past_the_end_is_none() {
        let x = Value::const_int(anchor(), i32_type(), 1);
        let y = Value::const_real(anchor(), f32_type(), 2.0);
        let list = build_argument_list(anchor(), vec![x.clone(), y]);
        assert_eq!(extract_argument(&list, 0).id(), x.id());
        let past = extract_argument(&list, 5);
        assert_eq!(past.ty(), types::nothing_type());
        // scalars project to themselves at index 0
        assert_eq!(extract_argument(&x, 0).id(), x.id());
        assert_eq!(extract_argument(&x, 3).ty(), types::nothing_type());
    }

    #[test]
    fn useless_statements_are_recognized() {
        let c = Value::const_int(anchor(), i32_type(), 0);
        assert!(is_useless(&c));
        let empty_let = Value::from(ir::Let::new(anchor(), vec![], vec![]));
        assert!(is_useless(&empty_let));
        let call = Value::from(ir::Call::new(anchor(), c.clone(), vec![]));
        assert!(!is_useless(&call));
    }
}
