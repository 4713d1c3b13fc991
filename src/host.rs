//! External collaborators the specializer calls back into.
//!
//! The surface expander and the JIT are not part of the middle-end; the only
//! rule that needs them is `syntax-extend`, which compiles a scope
//! transformer and re-expands the rest of the source against the scope it
//! returns. Sessions carry an optional [`HostInterface`]; scopes and
//! continuations are opaque handles only the host looks inside.

use std::any::Any;
use std::rc::Rc;

use crate::errors::CompileResult;
use crate::ir::Value;

/// Opaque expander-owned data: a scope, or an unexpanded source continuation.
pub type ScopeHandle = Rc<dyn Any>;

pub trait HostInterface {
    /// JIT-compiles a completed scope-transformer function and applies it to
    /// `env`, returning the updated scope.
    fn run_scope_transformer(
        &self,
        function: &Value,
        env: &ScopeHandle,
    ) -> CompileResult<ScopeHandle>;

    /// Expands the remaining source continuation against `env`, producing a
    /// fresh untyped value for the specializer to continue with.
    fn expand_continuation(
        &self,
        continuation: &ScopeHandle,
        env: &ScopeHandle,
    ) -> CompileResult<Value>;
}
