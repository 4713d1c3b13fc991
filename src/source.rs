use crate::intern::Name;

/// A source location attached to every IR node. Anchors survive every
/// rewrite the specializer performs so diagnostics can always point back at
/// the expression a value came from.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anchor {
    pub path: Name,
    /// 1-based line number
    pub line: u32,
    /// 1-based column number
    pub column: u32,
}

impl Anchor {
    pub fn new(path: Name, line: u32, column: u32) -> Self {
        Self { path, line, column }
    }

    /// Anchor for nodes synthesized by the compiler itself.
    pub fn builtin() -> Self {
        Self {
            path: Name::new("<builtin>"),
            line: 1,
            column: 1,
        }
    }
}

impl core::fmt::Display for Anchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.line, self.column)
    }
}

impl core::fmt::Debug for Anchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Anchor({self})")
    }
}
