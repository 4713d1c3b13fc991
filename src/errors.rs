//! Specialization failures. Every fallible specializer operation returns
//! [`CompileResult`]; errors carry the anchor of the offending node and the
//! chain of call sites unwound while propagating, so the reporter can print
//! the specialization stack the way a runtime would print a backtrace.

use colored::Colorize;
use itertools::Itertools;

use crate::{builtins::Builtin, intern::Name, source::Anchor, types::Type};

pub type CompileResult<T> = Result<T, SpecializeError>;

#[derive(Debug, Clone)]
pub struct SpecializeError {
    pub kind: ErrorKind,
    pub anchor: Anchor,
    /// Innermost first; grown as the error unwinds through calls and
    /// function bodies.
    pub trace: Vec<TraceEntry>,
}

#[derive(Debug, Clone)]
pub enum TraceEntry {
    Call(Anchor),
    Function { anchor: Anchor, name: Name },
}

#[derive(Debug, Clone)]
pub enum ErrorKind {
    CannotMergeExpressionTypes { left: Type, right: Type },
    NoReturnNotLastExpression,
    VariadicSymbolNotInLastPlace,
    IllegalBreakOutsideLoop,
    IllegalRepeatOutsideLoop,
    IllegalReturnInInline,
    CannotFindFrame { name: Name },
    UnboundSymbol { name: Name },
    InvalidConditionType { ty: Type },
    ConstantExpected { got: Type },
    InvalidCallType { ty: Type },
    InvalidOperands { left: Type, right: Type },
    ArgumentCountMismatch {
        min: usize,
        max: Option<usize>,
        got: usize,
    },
    ArgumentTypeMismatch { expected: Type, got: Type },
    UntypedRecursiveCall,
    CannotTypeBuiltin { builtin: Builtin },
    /// Bespoke condition with a preformatted message
    Message(String),
}

impl SpecializeError {
    pub fn new(kind: ErrorKind, anchor: Anchor) -> Self {
        Self {
            kind,
            anchor,
            trace: Vec::new(),
        }
    }

    pub fn message(anchor: Anchor, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message(message.into()), anchor)
    }

    /// Records the call site the error is currently unwinding through.
    pub fn with_call_trace(mut self, anchor: Anchor) -> Self {
        self.trace.push(TraceEntry::Call(anchor));
        self
    }

    pub fn with_function_trace(mut self, anchor: Anchor, name: Name) -> Self {
        self.trace.push(TraceEntry::Function { anchor, name });
        self
    }

    /// Prints the primary error, its anchor, and the chain of call sites
    /// leading into the failure.
    pub fn report(&self) {
        eprintln!(
            "{}: {} {}",
            "error".red().bold(),
            self.kind,
            format!("(at {})", self.anchor).white()
        );
        for entry in &self.trace {
            match entry {
                TraceEntry::Call(anchor) => {
                    eprintln!("  {} call at {anchor}", "in".white());
                }
                TraceEntry::Function { anchor, name } => {
                    eprintln!("  {} function {} at {anchor}", "in".white(), name.to_string().blue());
                }
            }
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::CannotMergeExpressionTypes { left, right } => {
                write!(f, "cannot merge expression types {left} and {right}")
            }
            ErrorKind::NoReturnNotLastExpression => {
                write!(f, "non-returning expression is not the last expression")
            }
            ErrorKind::VariadicSymbolNotInLastPlace => {
                write!(f, "variadic symbol is not in last place")
            }
            ErrorKind::IllegalBreakOutsideLoop => {
                write!(f, "`break` can only be used within a loop")
            }
            ErrorKind::IllegalRepeatOutsideLoop => {
                write!(f, "`repeat` can only be used within a loop")
            }
            ErrorKind::IllegalReturnInInline => {
                write!(f, "`return` cannot be used inside an inline function")
            }
            ErrorKind::CannotFindFrame { name } => {
                write!(f, "cannot find a frame for the scope of {name}")
            }
            ErrorKind::UnboundSymbol { name } => write!(f, "symbol {name} is not bound"),
            ErrorKind::InvalidConditionType { ty } => {
                write!(f, "condition must be bool, not {ty}")
            }
            ErrorKind::ConstantExpected { got } => {
                write!(f, "expected a constant, got a value of type {got}")
            }
            ErrorKind::InvalidCallType { ty } => {
                write!(f, "value of type {ty} cannot be called")
            }
            ErrorKind::InvalidOperands { left, right } => {
                write!(f, "invalid operand types {left} and {right}")
            }
            ErrorKind::ArgumentCountMismatch { min, max, got } => match max {
                Some(max) if max == min => {
                    write!(f, "expected {min} argument(s), got {got}")
                }
                Some(max) => write!(f, "expected {min} to {max} arguments, got {got}"),
                None => write!(f, "expected at least {min} argument(s), got {got}"),
            },
            ErrorKind::ArgumentTypeMismatch { expected, got } => {
                write!(f, "expected argument of type {expected}, got {got}")
            }
            ErrorKind::UntypedRecursiveCall => write!(
                f,
                "the return type of this recursive call cannot be inferred"
            ),
            ErrorKind::CannotTypeBuiltin { builtin } => {
                write!(f, "cannot type builtin {builtin}")
            }
            ErrorKind::Message(message) => f.write_str(message),
        }
    }
}

impl core::fmt::Display for SpecializeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (at {})", self.kind, self.anchor)?;
        if !self.trace.is_empty() {
            let sites = self
                .trace
                .iter()
                .map(|entry| match entry {
                    TraceEntry::Call(anchor) => anchor.to_string(),
                    TraceEntry::Function { anchor, name } => format!("{name} at {anchor}"),
                })
                .join(", ");
            write!(f, " via {sites}")?;
        }
        Ok(())
    }
}
