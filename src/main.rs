//! Demo driver: builds a couple of untyped value graphs the way the
//! expander would, runs the specializer over them, and prints the result.

use clap::Parser as ClapParser;

use smelt::builtins::Builtin;
use smelt::intern::Name;
use smelt::ir::print::{print_ast, AnchorMode, StreamAstFormat};
use smelt::ir::{self, Value};
use smelt::source::Anchor;
use smelt::specialize::{frame::Frame, specialize_function, Session};
use smelt::types;

#[derive(Debug, ClapParser)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(short = 'e', value_enum, default_value_t = Default::default())]
    emit: EmitFormat,
    #[arg(short = 'a', value_enum, default_value_t = Default::default())]
    anchors: AnchorFormat,
    /// Demos to run; all of them when empty
    demos: Vec<Demo>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EmitFormat {
    #[value(name = "untyped")]
    Untyped,
    #[default]
    #[value(name = "typed")]
    Typed,
    #[value(name = "both")]
    Both,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AnchorFormat {
    #[default]
    #[value(name = "none")]
    None,
    #[value(name = "line")]
    Line,
    #[value(name = "all")]
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Demo {
    /// let-bound constants folding through an integer add
    #[value(name = "fold")]
    Fold,
    /// recursive factorial typed through the cooperative scheduler
    #[value(name = "factorial")]
    Factorial,
}

fn main() {
    let args = Args::parse();

    let demos = if args.demos.is_empty() {
        vec![Demo::Fold, Demo::Factorial]
    } else {
        args.demos.clone()
    };

    let format = StreamAstFormat {
        anchors: match args.anchors {
            AnchorFormat::None => AnchorMode::None,
            AnchorFormat::Line => AnchorMode::Line,
            AnchorFormat::All => AnchorMode::All,
        },
        depth: 0,
    };

    for demo in demos {
        let (name, template) = match demo {
            Demo::Fold => ("fold", build_fold_demo()),
            Demo::Factorial => ("factorial", build_factorial_demo()),
        };

        println!("=== {name} ===");
        if args.emit != EmitFormat::Typed {
            print_ast(&Value::Template(template.clone()), &format);
        }
        if args.emit == EmitFormat::Untyped {
            continue;
        }

        let session = Session::new();
        let root = Frame::root();
        match specialize_function(&session, &root, &template, &[]) {
            Ok(instance) => print_ast(&Value::Function(instance), &format),
            Err(error) => {
                error.report();
                std::process::exit(1);
            }
        }
    }
}

fn anchor(line: u32, column: u32) -> Anchor {
    Anchor::new(Name::new("<demo>"), line, column)
}

/// `main() { let x = 1; x + 2 }` — the add folds away entirely.
fn build_fold_demo() -> std::rc::Rc<ir::Template> {
    let x = ir::Sym::untyped(anchor(1, 5), Name::new("x"));
    let binding = Value::from(ir::Let::new(
        anchor(1, 1),
        vec![x.clone()],
        vec![Value::const_int(anchor(1, 9), types::i32_type(), 1)],
    ));
    let sum = Value::from(ir::Call::new(
        anchor(2, 1),
        Value::builtin_const(anchor(2, 3), Builtin::Add),
        vec![
            Value::Sym(x),
            Value::const_int(anchor(2, 7), types::i32_type(), 2),
        ],
    ));
    let body = Value::from(ir::Block::new(anchor(1, 1), vec![binding], sum));
    ir::Template::new(anchor(1, 1), Name::new("main"), vec![], body, false)
}

/// `main() { let fact = \n -> if n <= 1 then 1 else n * fact(n - 1); fact(5) }`
fn build_factorial_demo() -> std::rc::Rc<ir::Template> {
    let fact_sym = ir::Sym::untyped(anchor(1, 5), Name::new("fact"));
    let n = ir::Sym::untyped(anchor(1, 13), Name::new("n"));

    let is_base = Value::from(ir::Call::new(
        anchor(2, 8),
        Value::builtin_const(anchor(2, 8), Builtin::ICmpSLe),
        vec![
            Value::Sym(n.clone()),
            Value::const_int(anchor(2, 15), types::i32_type(), 1),
        ],
    ));
    let minus_one = Value::from(ir::Call::new(
        anchor(3, 22),
        Value::builtin_const(anchor(3, 22), Builtin::Sub),
        vec![
            Value::Sym(n.clone()),
            Value::const_int(anchor(3, 26), types::i32_type(), 1),
        ],
    ));
    let recurse = Value::from(ir::Call::new(
        anchor(3, 17),
        Value::Sym(fact_sym.clone()),
        vec![minus_one],
    ));
    let product = Value::from(ir::Call::new(
        anchor(3, 13),
        Value::builtin_const(anchor(3, 13), Builtin::Mul),
        vec![Value::Sym(n.clone()), recurse],
    ));
    // the base case sits in a block so the branch flows through the return
    // target instead of passing through as a bare typed constant
    let base_case = Value::from(ir::Block::new(
        anchor(2, 20),
        vec![],
        Value::const_int(anchor(2, 20), types::i32_type(), 1),
    ));
    let conditional = Value::from(ir::If::new(
        anchor(2, 5),
        vec![ir::Clause {
            anchor: anchor(2, 5),
            cond: Some(is_base),
            body: base_case,
        }],
        ir::Clause {
            anchor: anchor(3, 5),
            cond: None,
            body: product,
        },
    ));
    let fact = ir::Template::new(
        anchor(1, 12),
        Name::new("fact"),
        vec![n],
        conditional,
        false,
    );

    let binding = Value::from(ir::Let::new(
        anchor(1, 1),
        vec![fact_sym.clone()],
        vec![Value::Template(fact.clone())],
    ));
    let result = Value::from(ir::Call::new(
        anchor(5, 1),
        Value::Sym(fact_sym),
        vec![Value::const_int(anchor(5, 6), types::i32_type(), 5)],
    ));
    let body = Value::from(ir::Block::new(anchor(1, 1), vec![binding], result));
    let main = ir::Template::new(anchor(1, 1), Name::new("main"), vec![], body, false);
    fact.set_scope(&main);
    main
}
