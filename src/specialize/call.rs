//! Call specialization: closure instantiation and inline expansion, AST
//! macros, the primitive-operator table, and foreign function pointers.
//!
//! Whatever the callee turns out to be, the emitted call is fully typed.
//! Errors leaving this module carry the call site on their trace so the
//! reporter can unwind the specialization stack.

use std::rc::Rc;

use crate::builtins::{self, Builtin, OpClass};
use crate::errors::{CompileResult, ErrorKind, SpecializeError};
use crate::ir::print::{format_ast, StreamAstFormat};
use crate::ir::{self, Template, Value};
use crate::source::Anchor;
use crate::types::{self, Type, TypeKind};

use super::frame::Frame;
use super::{
    bind_specialized_arguments, build_argument_list, merge_return_type, specialize,
    specialize_arguments, specialize_function, Context,
};

pub(super) fn specialize_call(ctx: &Context, call: &Rc<ir::Call>) -> CompileResult<Value> {
    specialize_call_interior(ctx, call).map_err(|e| e.with_call_trace(call.anchor))
}

fn specialize_call_interior(ctx: &Context, call: &Rc<ir::Call>) -> CompileResult<Value> {
    let subctx = ctx.with_symbol_target();
    let mut callee = specialize(&subctx, &call.callee)?;
    let values = specialize_arguments(ctx, &call.args)?;
    let mut callee_type = callee.ty();

    if callee_type == types::closure_type() {
        let closure = callee.extract_closure_constant()?;
        if closure.template.is_inline() {
            return specialize_inline(ctx, &closure.frame, &closure.template, values);
        }
        let arg_types: Vec<Type> = values.iter().map(Value::ty).collect();
        let instance =
            specialize_function(ctx.session(), &closure.frame, &closure.template, &arg_types)?;
        callee_type = if instance.complete.get() {
            instance
                .get_type()
                .expect("complete function without a type")
        } else {
            // A recursive call into an instance whose body is still being
            // specialized. If no return has been typed yet this is the one
            // cooperative suspension point: run the other queued branch
            // jobs, then look again.
            let mut ret = instance.return_type();
            if ret == Some(types::noreturn_type()) {
                ctx.session().scheduler.process();
                ret = instance.return_type();
            }
            if ret == Some(types::noreturn_type()) {
                return Err(SpecializeError::new(
                    ErrorKind::UntypedRecursiveCall,
                    call.anchor,
                ));
            }
            instance.function_pointer_type()
        };
        callee = Value::Function(instance);
    } else if callee_type == types::ast_macro_type() {
        let func = callee.extract_macro_constant()?;
        let produced = func(&values)?;
        return specialize(ctx, &produced);
    } else if callee_type == types::builtin_type() {
        let builtin = callee.extract_builtin_constant()?;
        return specialize_builtin(ctx, call.anchor, callee, builtin, values);
    }

    let Some(signature) = types::function_pointee(callee_type) else {
        return Err(SpecializeError::new(
            ErrorKind::InvalidCallType { ty: callee_type },
            call.anchor,
        ));
    };
    let TypeKind::Function {
        return_type,
        params,
        except_type,
    } = &*signature
    else {
        unreachable!("function pointee is not a function");
    };

    if values.len() != params.len() {
        return Err(SpecializeError::new(
            ErrorKind::ArgumentCountMismatch {
                min: params.len(),
                max: Some(params.len()),
                got: values.len(),
            },
            call.anchor,
        ));
    }
    for (value, &expected) in values.iter().zip(params) {
        let got = value.ty();
        if got == expected {
            continue;
        }
        let got_storage = types::storage_type(got);
        let expected_storage = types::storage_type(expected);
        if let (
            TypeKind::Pointer {
                element: got_elem,
                flags: got_flags,
                storage_class: got_class,
            },
            TypeKind::Pointer {
                element: expected_elem,
                flags: expected_flags,
                storage_class: expected_class,
            },
        ) = (&*got_storage, &*expected_storage)
        {
            if got_elem == expected_elem
                && types::pointer_flags_compatible(*expected_flags, *got_flags)
                && types::pointer_storage_classes_compatible(*expected_class, *got_class)
            {
                continue;
            }
        }
        return Err(SpecializeError::new(
            ErrorKind::ArgumentTypeMismatch { expected, got },
            value.anchor(),
        ));
    }

    let new_call = Value::from(ir::Call::new(call.anchor, callee, values));
    new_call.set_type(*return_type);
    if let Some(except) = except_type {
        let joined = merge_return_type(call.anchor, ctx.frame.except_type(), *except)?;
        *ctx.frame.except_type.borrow_mut() = Some(joined);
    }
    Ok(new_call)
}

/// Splices an inline template at the call site: parameters bind like a `let`
/// with constants substituted, the body specializes under the caller's
/// target, and any surviving bindings wrap the result in a block.
fn specialize_inline(
    ctx: &Context,
    frame: &Rc<Frame>,
    template: &Rc<Template>,
    values: Vec<Value>,
) -> CompileResult<Value> {
    let expansion = Frame::inline_expansion(template, frame);
    let subctx = ctx.with_frame(&expansion, ctx.target);
    let (params, args) = bind_specialized_arguments(&subctx, &template.params, values, true)?;
    let body = expansion.body();
    let result = specialize(&subctx, &body)
        .map_err(|e| e.with_function_trace(expansion.anchor, expansion.name))?;
    if params.is_empty() {
        expansion.set_body(result.clone());
        return Ok(result);
    }
    let result_type = subctx.transform_return_type(result.ty());
    let binding = Value::from(ir::Let::new(expansion.anchor, params, args));
    binding.set_type(types::empty_arguments_type());
    let block = Value::from(ir::Block::new(template.anchor, vec![binding], result));
    block.set_type(result_type);
    expansion.set_body(block.clone());
    Ok(block)
}

// ---------------------------------------------------------------------------
// Builtins
// ---------------------------------------------------------------------------

fn check_argcount(
    anchor: Anchor,
    values: &[Value],
    min: usize,
    max: Option<usize>,
) -> CompileResult<()> {
    let got = values.len();
    if got >= min && max.map_or(true, |max| got <= max) {
        return Ok(());
    }
    Err(SpecializeError::new(
        ErrorKind::ArgumentCountMismatch { min, max, got },
        anchor,
    ))
}

/// The typed call a builtin reduces to when it cannot fold.
fn typed_call(
    anchor: Anchor,
    callee: Value,
    values: Vec<Value>,
    result: Vec<Type>,
) -> CompileResult<Value> {
    let node = Value::from(ir::Call::new(anchor, callee, values));
    node.set_type(types::arguments_type(result));
    Ok(node)
}

fn verify_integer_vector(anchor: Anchor, ty: Type) -> CompileResult<()> {
    if types::is_integer_vector(ty) {
        return Ok(());
    }
    Err(SpecializeError::message(
        anchor,
        format!("expected integer or integer vector type, got {}", *ty),
    ))
}

fn verify_real_vector(anchor: Anchor, ty: Type) -> CompileResult<()> {
    if types::is_real_vector(ty) {
        return Ok(());
    }
    Err(SpecializeError::message(
        anchor,
        format!("expected real or real vector type, got {}", *ty),
    ))
}

fn verify_same(anchor: Anchor, expected: Type, got: Type) -> CompileResult<()> {
    if expected == got {
        return Ok(());
    }
    Err(SpecializeError::new(
        ErrorKind::ArgumentTypeMismatch { expected, got },
        anchor,
    ))
}

/// Width of a scalar storage type, when there is one to take.
fn scalar_width(ty: Type) -> Option<u16> {
    match *types::storage_type(ty) {
        TypeKind::Integer { width, .. } | TypeKind::Real { width } => Some(width),
        _ => None,
    }
}

fn bitcast_category(kind: &TypeKind) -> u32 {
    match kind {
        // reals fold into the integer category
        TypeKind::Integer { .. } | TypeKind::Real { .. } => 0,
        TypeKind::Pointer { .. } => 1,
        TypeKind::Array { .. } => 2,
        TypeKind::Vector { .. } => 3,
        TypeKind::Tuple { .. } => 4,
        TypeKind::Union { .. } => 5,
        TypeKind::Function { .. } => 6,
        TypeKind::Arguments { .. } => 7,
        TypeKind::Named { .. } => 8,
        TypeKind::Nothing => 9,
        TypeKind::NoReturn => 10,
        TypeKind::Unknown => 11,
        TypeKind::Closure => 12,
        TypeKind::Builtin => 13,
        TypeKind::AstMacro => 14,
        TypeKind::TypeValue => 15,
        TypeKind::Symbol => 16,
        TypeKind::Str => 17,
        TypeKind::Scope => 18,
    }
}

fn specialize_builtin(
    ctx: &Context,
    anchor: Anchor,
    callee: Value,
    builtin: Builtin,
    values: Vec<Value>,
) -> CompileResult<Value> {
    match builtin.class() {
        OpClass::IntegerBinary => {
            check_argcount(anchor, &values, 2, Some(2))?;
            let (a, b) = (values[0].ty(), values[1].ty());
            verify_integer_vector(anchor, a)?;
            verify_same(anchor, a, b)?;
            if let (Some(ca), Some(cb)) = (values[0].as_const_int(), values[1].as_const_int()) {
                if let TypeKind::Integer { width, .. } = *types::storage_type(a) {
                    if let Some(folded) =
                        builtins::fold_integer_binary(builtin, ca.value, cb.value, width)
                    {
                        return Ok(Value::const_int(anchor, a, folded));
                    }
                }
            }
            typed_call(anchor, callee, values, vec![a])
        }
        OpClass::IntegerUnary => {
            check_argcount(anchor, &values, 1, Some(1))?;
            let a = values[0].ty();
            verify_integer_vector(anchor, a)?;
            typed_call(anchor, callee, values, vec![a])
        }
        OpClass::IntegerCompare => {
            check_argcount(anchor, &values, 2, Some(2))?;
            let (a, b) = (values[0].ty(), values[1].ty());
            verify_integer_vector(anchor, a)?;
            verify_same(anchor, a, b)?;
            if let (Some(ca), Some(cb)) = (values[0].as_const_int(), values[1].as_const_int()) {
                if let TypeKind::Integer { width, .. } = *types::storage_type(a) {
                    if let Some(folded) =
                        builtins::fold_integer_compare(builtin, ca.value, cb.value, width)
                    {
                        return Ok(Value::const_bool(anchor, folded));
                    }
                }
            }
            typed_call(anchor, callee, values, vec![types::bool_result_type(a)])
        }
        OpClass::RealBinary => {
            check_argcount(anchor, &values, 2, Some(2))?;
            let (a, b) = (values[0].ty(), values[1].ty());
            verify_real_vector(anchor, a)?;
            verify_same(anchor, a, b)?;
            if let (Some(ca), Some(cb)) = (values[0].as_const_real(), values[1].as_const_real()) {
                if let TypeKind::Real { width } = *types::storage_type(a) {
                    if let Some(folded) =
                        builtins::fold_real_binary(builtin, ca.value, cb.value, width)
                    {
                        return Ok(Value::const_real(anchor, a, folded));
                    }
                }
            }
            typed_call(anchor, callee, values, vec![a])
        }
        OpClass::RealUnary => {
            check_argcount(anchor, &values, 1, Some(1))?;
            let a = values[0].ty();
            verify_real_vector(anchor, a)?;
            if let Some(ca) = values[0].as_const_real() {
                if let TypeKind::Real { width } = *types::storage_type(a) {
                    if let Some(folded) = builtins::fold_real_unary(builtin, ca.value, width) {
                        return Ok(Value::const_real(anchor, a, folded));
                    }
                }
            }
            typed_call(anchor, callee, values, vec![a])
        }
        OpClass::RealCompare => {
            check_argcount(anchor, &values, 2, Some(2))?;
            let (a, b) = (values[0].ty(), values[1].ty());
            verify_real_vector(anchor, a)?;
            verify_same(anchor, a, b)?;
            if let (Some(ca), Some(cb)) = (values[0].as_const_real(), values[1].as_const_real()) {
                if let Some(folded) = builtins::fold_real_compare(builtin, ca.value, cb.value) {
                    return Ok(Value::const_bool(anchor, folded));
                }
            }
            typed_call(anchor, callee, values, vec![types::bool_result_type(a)])
        }
        OpClass::RealTernary => {
            check_argcount(anchor, &values, 3, Some(3))?;
            let (a, b, c) = (values[0].ty(), values[1].ty(), values[2].ty());
            verify_real_vector(anchor, a)?;
            verify_same(anchor, a, b)?;
            verify_same(anchor, a, c)?;
            typed_call(anchor, callee, values, vec![a])
        }
        OpClass::Special => specialize_special_builtin(ctx, anchor, callee, builtin, values),
    }
}

fn specialize_special_builtin(
    ctx: &Context,
    anchor: Anchor,
    callee: Value,
    builtin: Builtin,
    mut values: Vec<Value>,
) -> CompileResult<Value> {
    match builtin {
        Builtin::Dump => {
            eprint!("{anchor} dump:");
            for value in &values {
                eprint!(" {}", format_ast(value, &StreamAstFormat::default()));
            }
            eprintln!();
            Ok(build_argument_list(anchor, values))
        }
        Builtin::Undef => {
            check_argcount(anchor, &values, 1, Some(1))?;
            let ty = values[0].extract_type_constant()?;
            typed_call(anchor, callee, values, vec![ty])
        }
        Builtin::TypeOf => {
            check_argcount(anchor, &values, 1, Some(1))?;
            Ok(Value::type_const(anchor, values[0].ty()))
        }
        Builtin::Tertiary => {
            check_argcount(anchor, &values, 3, Some(3))?;
            let cond = types::storage_type(values[0].ty());
            let (then_type, else_type) = (values[1].ty(), values[2].ty());
            if !types::is_bool_vector(cond) {
                return Err(SpecializeError::message(
                    anchor,
                    format!("expected bool or bool vector condition, got {}", *cond),
                ));
            }
            if types::vector_count(cond).is_some()
                && types::vector_count(cond) != types::vector_count(then_type)
            {
                return Err(SpecializeError::message(
                    anchor,
                    format!(
                        "vector sizes of {} and {} do not match",
                        *cond, *then_type
                    ),
                ));
            }
            verify_same(anchor, then_type, else_type)?;
            typed_call(anchor, callee, values, vec![then_type])
        }
        Builtin::Bitcast => {
            check_argcount(anchor, &values, 2, Some(2))?;
            let source_type = values[0].ty();
            let dest_type = values[1].extract_type_constant()?;
            if source_type == dest_type {
                return Ok(values.swap_remove(0));
            }
            let source_storage = types::storage_type(source_type);
            let dest_storage = types::storage_type(dest_type);
            if bitcast_category(&source_storage) != bitcast_category(&dest_storage) {
                return Err(SpecializeError::message(
                    anchor,
                    format!(
                        "can not bitcast value of type {} to type {} because storage types \
                         are not of compatible category",
                        *source_type, *dest_type
                    ),
                ));
            }
            if source_storage != dest_storage
                && matches!(
                    &*dest_storage,
                    TypeKind::Array { .. } | TypeKind::Tuple { .. } | TypeKind::Union { .. }
                )
            {
                return Err(SpecializeError::message(
                    anchor,
                    format!(
                        "can not bitcast value of type {} to type {} with aggregate storage \
                         type {}",
                        *source_type, *dest_type, *dest_storage
                    ),
                ));
            }
            typed_call(anchor, callee, values, vec![dest_type])
        }
        Builtin::IntToPtr => {
            check_argcount(anchor, &values, 2, Some(2))?;
            let source = types::storage_type(values[0].ty());
            let dest = values[1].extract_type_constant()?;
            verify_integer_vector(anchor, source)?;
            verify_pointer(anchor, types::storage_type(dest))?;
            typed_call(anchor, callee, values, vec![dest])
        }
        Builtin::PtrToInt => {
            check_argcount(anchor, &values, 2, Some(2))?;
            let source = types::storage_type(values[0].ty());
            let dest = values[1].extract_type_constant()?;
            verify_pointer(anchor, source)?;
            verify_integer_vector(anchor, types::storage_type(dest))?;
            typed_call(anchor, callee, values, vec![dest])
        }
        Builtin::ITrunc | Builtin::ZExt | Builtin::SExt => {
            check_argcount(anchor, &values, 2, Some(2))?;
            let source = types::storage_type(values[0].ty());
            let dest = values[1].extract_type_constant()?;
            verify_integer_vector(anchor, source)?;
            verify_integer_vector(anchor, types::storage_type(dest))?;
            typed_call(anchor, callee, values, vec![dest])
        }
        Builtin::FPTrunc | Builtin::FPExt => {
            check_argcount(anchor, &values, 2, Some(2))?;
            let source = types::storage_type(values[0].ty());
            let dest = values[1].extract_type_constant()?;
            verify_real_vector(anchor, source)?;
            verify_real_vector(anchor, types::storage_type(dest))?;
            let (source_width, dest_width) = (scalar_width(source), scalar_width(dest));
            let widening = source_width < dest_width;
            if (builtin == Builtin::FPTrunc && widening)
                || (builtin == Builtin::FPExt && !widening && source_width != dest_width)
            {
                return Err(SpecializeError::new(
                    ErrorKind::InvalidOperands {
                        left: source,
                        right: dest,
                    },
                    anchor,
                ));
            }
            typed_call(anchor, callee, values, vec![dest])
        }
        Builtin::FPToUI | Builtin::FPToSI => {
            check_argcount(anchor, &values, 2, Some(2))?;
            let source = types::storage_type(values[0].ty());
            let dest = values[1].extract_type_constant()?;
            verify_real_vector(anchor, source)?;
            verify_integer_vector(anchor, types::storage_type(dest))?;
            if source != types::f32_type() && source != types::f64_type() {
                return Err(SpecializeError::new(
                    ErrorKind::InvalidOperands {
                        left: source,
                        right: dest,
                    },
                    anchor,
                ));
            }
            typed_call(anchor, callee, values, vec![dest])
        }
        Builtin::UIToFP | Builtin::SIToFP => {
            check_argcount(anchor, &values, 2, Some(2))?;
            let source = types::storage_type(values[0].ty());
            let dest = values[1].extract_type_constant()?;
            verify_integer_vector(anchor, source)?;
            verify_real_vector(anchor, types::storage_type(dest))?;
            if dest != types::f32_type() && dest != types::f64_type() {
                return Err(SpecializeError::new(
                    ErrorKind::InvalidOperands {
                        left: source,
                        right: dest,
                    },
                    anchor,
                ));
            }
            typed_call(anchor, callee, values, vec![dest])
        }
        Builtin::ExtractValue => {
            check_argcount(anchor, &values, 2, Some(2))?;
            let aggregate = types::storage_type(values[0].ty());
            let index = values[1].extract_integer_constant()? as usize;
            match &*aggregate {
                TypeKind::Array { .. } | TypeKind::Tuple { .. } | TypeKind::Union { .. } => {
                    let element = types::type_at_index(aggregate, index).ok_or_else(|| {
                        SpecializeError::message(
                            anchor,
                            format!("index {index} is out of range for type {}", *aggregate),
                        )
                    })?;
                    typed_call(anchor, callee, values, vec![element])
                }
                _ => Err(SpecializeError::message(
                    anchor,
                    format!("can not extract value from type {}", *aggregate),
                )),
            }
        }
        Builtin::InsertValue => {
            check_argcount(anchor, &values, 3, Some(3))?;
            let aggregate_type = values[0].ty();
            let element_storage = types::storage_type(values[1].ty());
            let index = values[2].extract_integer_constant()? as usize;
            let aggregate = types::storage_type(aggregate_type);
            match &*aggregate {
                TypeKind::Array { .. } | TypeKind::Tuple { .. } | TypeKind::Union { .. } => {
                    let slot = types::type_at_index(aggregate, index).ok_or_else(|| {
                        SpecializeError::message(
                            anchor,
                            format!("index {index} is out of range for type {}", *aggregate),
                        )
                    })?;
                    verify_same(anchor, types::storage_type(slot), element_storage)?;
                }
                _ => {
                    return Err(SpecializeError::message(
                        anchor,
                        format!("can not insert value into type {}", *aggregate),
                    ));
                }
            }
            typed_call(anchor, callee, values, vec![aggregate_type])
        }
        Builtin::GetElementPtr => {
            check_argcount(anchor, &values, 2, None)?;
            let pointer = types::storage_type(values[0].ty());
            let TypeKind::Pointer {
                element,
                flags,
                storage_class,
            } = &*pointer
            else {
                return Err(SpecializeError::message(
                    anchor,
                    format!("can not get element pointer from type {}", *pointer),
                ));
            };
            verify_integer_vector(anchor, values[1].ty())?;
            let mut current = *element;
            for position in 2..values.len() {
                let step = types::storage_type(current);
                match &*step {
                    TypeKind::Array { element, .. } => {
                        verify_integer_vector(anchor, values[position].ty())?;
                        current = *element;
                    }
                    TypeKind::Tuple { .. } => {
                        let index = if values[position].ty() == types::symbol_type() {
                            let field = values[position].extract_symbol_constant()?;
                            let index = types::field_index(step, field).ok_or_else(|| {
                                SpecializeError::message(
                                    anchor,
                                    format!("no such field {field} in storage type {}", *step),
                                )
                            })?;
                            // rewrite the field name to its positional index
                            values[position] = Value::const_int(
                                values[position].anchor(),
                                types::i32_type(),
                                index as u64,
                            );
                            index
                        } else {
                            values[position].extract_integer_constant()? as usize
                        };
                        current = types::type_at_index(step, index).ok_or_else(|| {
                            SpecializeError::message(
                                anchor,
                                format!("index {index} is out of range for type {}", *step),
                            )
                        })?;
                    }
                    _ => {
                        return Err(SpecializeError::message(
                            anchor,
                            format!("can not get element pointer from type {}", *current),
                        ));
                    }
                }
            }
            let result = types::pointer_type(current, *flags, *storage_class);
            typed_call(anchor, callee, values, vec![result])
        }
        Builtin::Load | Builtin::VolatileLoad => {
            check_argcount(anchor, &values, 1, Some(1))?;
            let pointer = types::storage_type(values[0].ty());
            let TypeKind::Pointer { element, flags, .. } = &*pointer else {
                return Err(SpecializeError::message(
                    anchor,
                    format!("can not load value from non-pointer type {}", *pointer),
                ));
            };
            if !flags.readable {
                return Err(SpecializeError::message(
                    anchor,
                    format!(
                        "can not load value from address of type {} because the target is \
                         non-readable",
                        *pointer
                    ),
                ));
            }
            typed_call(anchor, callee, values, vec![*element])
        }
        Builtin::Store | Builtin::VolatileStore => {
            check_argcount(anchor, &values, 2, Some(2))?;
            let element_storage = types::storage_type(values[0].ty());
            let pointer = types::storage_type(values[1].ty());
            let TypeKind::Pointer { element, flags, .. } = &*pointer else {
                return Err(SpecializeError::message(
                    anchor,
                    format!("can not store value into non-pointer type {}", *pointer),
                ));
            };
            if !flags.writable {
                return Err(SpecializeError::message(
                    anchor,
                    format!(
                        "can not store value at address of type {} because the target is \
                         non-writable",
                        *pointer
                    ),
                ));
            }
            verify_same(anchor, types::storage_type(*element), element_storage)?;
            typed_call(anchor, callee, values, vec![])
        }
        Builtin::Alloca => {
            check_argcount(anchor, &values, 1, Some(1))?;
            let ty = values[0].extract_type_constant()?;
            typed_call(anchor, callee, values, vec![types::local_pointer_type(ty)])
        }
        Builtin::AllocaArray => {
            check_argcount(anchor, &values, 2, Some(2))?;
            let ty = values[0].extract_type_constant()?;
            verify_integer_vector(anchor, values[1].ty())?;
            typed_call(anchor, callee, values, vec![types::local_pointer_type(ty)])
        }
        Builtin::Malloc => {
            check_argcount(anchor, &values, 1, Some(1))?;
            let ty = values[0].extract_type_constant()?;
            typed_call(anchor, callee, values, vec![types::native_pointer_type(ty)])
        }
        Builtin::MallocArray => {
            check_argcount(anchor, &values, 2, Some(2))?;
            let ty = values[0].extract_type_constant()?;
            verify_integer_vector(anchor, values[1].ty())?;
            typed_call(anchor, callee, values, vec![types::native_pointer_type(ty)])
        }
        Builtin::Free => {
            check_argcount(anchor, &values, 1, Some(1))?;
            let pointer = types::storage_type(values[0].ty());
            let TypeKind::Pointer {
                flags,
                storage_class,
                ..
            } = &*pointer
            else {
                return Err(SpecializeError::message(
                    anchor,
                    format!("can not free non-pointer type {}", *pointer),
                ));
            };
            if !flags.writable {
                return Err(SpecializeError::message(
                    anchor,
                    format!(
                        "can not free value at address of type {} because the target is \
                         non-writable",
                        *pointer
                    ),
                ));
            }
            if storage_class.is_some() {
                return Err(SpecializeError::message(
                    anchor,
                    "pointer is not a heap pointer",
                ));
            }
            typed_call(anchor, callee, values, vec![])
        }
        other => Err(SpecializeError::new(
            ErrorKind::CannotTypeBuiltin { builtin: other },
            anchor,
        )),
    }
}

fn verify_pointer(anchor: Anchor, ty: Type) -> CompileResult<()> {
    if matches!(&*ty, TypeKind::Pointer { .. }) {
        return Ok(());
    }
    Err(SpecializeError::message(
        anchor,
        format!("expected pointer type, got {}", *ty),
    ))
}
