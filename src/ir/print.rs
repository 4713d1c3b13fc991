//! Debug printer for the value graph.
//!
//! Walks the same shared IR the specializer rewrites, one node per line with
//! indentation rails. Function nodes that were already printed show `<...>`
//! instead of recursing, which keeps recursive functions printable. Anchors
//! can be omitted, printed per line, or attached to every atom.

use colored::Colorize;
use hashbrown::HashSet;
use itertools::Itertools;

use crate::ir::{PtrValue, Value, ValueId};
use crate::types::TypeKind;

const INDENT_RAIL: &str = "⁞ ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorMode {
    #[default]
    None,
    Line,
    All,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StreamAstFormat {
    pub anchors: AnchorMode,
    pub depth: usize,
}

pub fn format_ast(node: &Value, fmt: &StreamAstFormat) -> String {
    let mut printer = AstPrinter {
        out: String::new(),
        line_anchors: fmt.anchors == AnchorMode::Line,
        atom_anchors: fmt.anchors == AnchorMode::All,
        visited: HashSet::new(),
    };
    printer.walk(node, fmt.depth);
    printer.out
}

pub fn print_ast(node: &Value, fmt: &StreamAstFormat) {
    println!("{}", format_ast(node, fmt));
}

struct AstPrinter {
    out: String,
    line_anchors: bool,
    atom_anchors: bool,
    visited: HashSet<ValueId>,
}

impl AstPrinter {
    fn line(&mut self, depth: usize, node: &Value) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        if self.line_anchors {
            self.out
                .push_str(&format!("{} ", format!("[{}]", node.anchor()).white()));
        }
        if depth >= 1 {
            self.out.push_str("  ");
            for _ in 2..=depth {
                self.out.push_str(&INDENT_RAIL.white().to_string());
            }
        }
        if self.atom_anchors {
            self.out
                .push_str(&format!("{} ", format!("[{}]", node.anchor()).white()));
        }
    }

    fn keyword(&mut self, word: &str) {
        self.out.push_str(&word.magenta().to_string());
    }

    fn name_tag(&mut self, name: impl core::fmt::Display, sigil: char, id: ValueId) {
        self.out.push_str(
            &format!("{name}{sigil}{:04x}", id.0 & 0xffff)
                .blue()
                .to_string(),
        );
    }

    fn type_suffix(&mut self, node: &Value) {
        if let Some(ty) = node.get_type() {
            self.out.push_str(&format!(":{}", ty.colored()));
        }
    }

    fn walk(&mut self, node: &Value, depth: usize) {
        self.line(depth, node);

        let is_new = self.visited.insert(node.id());

        match node {
            Value::Template(template) => {
                self.keyword("Template");
                if template.is_inline() {
                    self.out.push(' ');
                    self.keyword("inline");
                }
                self.out.push(' ');
                self.name_tag(template.name, 'λ', node.id());
                if is_new {
                    for param in &template.params {
                        self.walk(&Value::Sym(param.clone()), depth + 1);
                    }
                    self.walk(&template.body, depth + 1);
                } else {
                    self.out.push_str(" <...>");
                }
            }
            Value::Function(frame) => {
                self.keyword("Function");
                if frame.is_inline() {
                    self.out.push(' ');
                    self.keyword("inline");
                }
                if !frame.complete.get() {
                    self.out.push(' ');
                    self.keyword("incomplete");
                }
                self.out.push(' ');
                self.name_tag(frame.name, 'λ', node.id());
                self.type_suffix(node);
                if is_new {
                    for param in frame.params.borrow().iter() {
                        self.walk(&Value::Sym(param.clone()), depth + 1);
                    }
                    if let Some(body) = frame.body.borrow().clone() {
                        self.walk(&body, depth + 1);
                    }
                } else {
                    self.out.push_str(" <...>");
                }
            }
            Value::Sym(sym) => {
                self.name_tag(sym.name, '$', node.id());
                if sym.is_variadic() {
                    self.out.push('…');
                }
                self.type_suffix(node);
            }
            Value::ConstInt(constant) => {
                self.keyword("Const");
                self.out
                    .push_str(&format!(" {}", constant.value).purple().to_string());
                self.type_suffix(node);
            }
            Value::ConstReal(constant) => {
                self.keyword("Const");
                self.out
                    .push_str(&format!(" {}", constant.value).purple().to_string());
                self.type_suffix(node);
            }
            Value::ConstPointer(constant) => {
                self.keyword("Const");
                self.out.push(' ');
                match &constant.payload {
                    PtrValue::Closure(closure) => {
                        self.out.push_str(
                            &format!("closure {}", closure.template.name)
                                .purple()
                                .to_string(),
                        );
                    }
                    PtrValue::Type(ty) => self.out.push_str(&ty.colored().to_string()),
                    PtrValue::Str(text) => {
                        self.out.push_str(&format!("{text:?}").purple().to_string())
                    }
                    PtrValue::Symbol(name) => {
                        self.out.push_str(&format!("'{name}").purple().to_string())
                    }
                    PtrValue::Builtin(builtin) => {
                        self.out.push_str(&builtin.to_string().purple().to_string())
                    }
                    PtrValue::Macro(_) => self.out.push_str(&"<ast-macro>".purple().to_string()),
                    PtrValue::Scope(_) => self.out.push_str(&"<scope>".purple().to_string()),
                }
                self.type_suffix(node);
            }
            Value::ConstTuple(aggregate)
            | Value::ConstArray(aggregate)
            | Value::ConstVector(aggregate) => {
                self.keyword("Const");
                if aggregate.values.is_empty()
                    && matches!(&*aggregate.ty, TypeKind::Nothing)
                {
                    self.out.push_str(&" none".purple().to_string());
                } else {
                    self.type_suffix(node);
                    for value in &aggregate.values {
                        self.walk(value, depth + 1);
                    }
                }
            }
            Value::Extern(external) => {
                self.keyword("Extern");
                self.out.push(' ');
                self.name_tag(external.name, '@', node.id());
                self.type_suffix(node);
            }
            Value::ArgumentList(list) => {
                self.keyword("ArgumentList");
                self.type_suffix(node);
                for value in &list.values {
                    self.walk(value, depth + 1);
                }
            }
            Value::ExtractArgument(extract) => {
                self.keyword("ExtractArgument");
                self.out
                    .push_str(&format!(" {}", extract.index).purple().to_string());
                self.type_suffix(node);
                self.walk(&extract.value, depth + 1);
            }
            Value::Call(call) => {
                self.keyword("Call");
                self.type_suffix(node);
                self.walk(&call.callee, depth + 1);
                for arg in &call.args {
                    self.walk(arg, depth + 1);
                }
            }
            Value::Let(binding) => {
                self.keyword("Let");
                for (param, arg) in binding.params.iter().zip_eq(&binding.args) {
                    self.walk(&Value::Sym(param.clone()), depth + 1);
                    self.walk(arg, depth + 2);
                }
            }
            Value::Loop(source) => {
                self.keyword("Loop");
                self.type_suffix(node);
                let params = source.params.borrow().clone();
                let args = source.args.borrow().clone();
                for (param, arg) in params.iter().zip(&args) {
                    self.walk(&Value::Sym(param.clone()), depth + 1);
                    self.walk(arg, depth + 2);
                }
                if let Some(body) = source.body.borrow().clone() {
                    self.walk(&body, depth + 1);
                }
            }
            Value::If(conditional) => {
                self.keyword("If");
                self.type_suffix(node);
                for clause in &conditional.clauses {
                    if let Some(cond) = &clause.cond {
                        self.walk(cond, depth + 1);
                    }
                    self.walk(&clause.body, depth + 2);
                }
                let else_clause = &conditional.else_clause;
                self.line(depth + 1, node);
                self.keyword("Else");
                self.walk(&else_clause.body, depth + 2);
            }
            Value::Break(transfer) => {
                self.keyword("Break");
                self.walk(&transfer.value, depth + 1);
            }
            Value::Repeat(transfer) => {
                self.keyword("Repeat");
                for arg in &transfer.args {
                    self.walk(arg, depth + 1);
                }
            }
            Value::Return(transfer) => {
                self.keyword("Return");
                self.walk(&transfer.value, depth + 1);
            }
            Value::Raise(transfer) => {
                self.keyword("Raise");
                self.walk(&transfer.value, depth + 1);
            }
            Value::Try(guarded) => {
                self.keyword("Try");
                self.type_suffix(node);
                self.walk(&guarded.try_body, depth + 1);
                self.line(depth, node);
                self.keyword("Except");
                self.walk(&guarded.except_body, depth + 1);
            }
            Value::Block(block) => {
                self.keyword("Block");
                self.type_suffix(node);
                for statement in &block.body {
                    self.walk(statement, depth + 1);
                }
                self.walk(&block.value, depth + 1);
            }
            Value::Keyed(keyed) => {
                self.keyword("Keyed");
                self.out.push_str(&format!(
                    " {} {}",
                    keyed.key.to_string().blue(),
                    "=".white()
                ));
                self.walk(&keyed.value, depth + 1);
            }
            Value::SyntaxExtend(sx) => {
                self.keyword("SyntaxExtend");
                self.walk(&Value::Template(sx.func.clone()), depth + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Name;
    use crate::ir;
    use crate::source::Anchor;
    use crate::types::i32_type;

    #[test]
    fn shared_nodes_print_once() {
        let anchor = Anchor::builtin();
        let one = Value::const_int(anchor, i32_type(), 1);
        let template = ir::Template::new(
            anchor,
            Name::new("twice"),
            vec![],
            one.clone(),
            false,
        );
        let call = Value::from(ir::Call::new(
            anchor,
            Value::Template(template.clone()),
            vec![Value::Template(template)],
        ));
        let text = format_ast(&call, &StreamAstFormat::default());
        assert_eq!(text.matches("<...>").count(), 1);
    }

    #[test]
    fn anchors_appear_in_all_mode() {
        let anchor = Anchor::new(Name::new("demo.sm"), 3, 7);
        let node = Value::const_int(anchor, i32_type(), 42);
        let fmt = StreamAstFormat {
            anchors: AnchorMode::All,
            depth: 0,
        };
        assert!(format_ast(&node, &fmt).contains("demo.sm:3:7"));
        let none = format_ast(&node, &StreamAstFormat::default());
        assert!(!none.contains("demo.sm"));
    }
}
