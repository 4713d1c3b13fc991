//! Primitive-operator tags and their operator classes.
//!
//! The specializer types most builtins generically from their class (operand
//! kind × shape); only the memory, conversion and introspection operators
//! carry bespoke rules. The fold helpers below evaluate an operator over
//! constant operands where that is safe, and decline (returning `None`)
//! wherever runtime semantics could differ: division by zero, out-of-range
//! shifts, overflow on the no-wrap variants.

use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Builtin {
    // introspection and selection
    Dump,
    Undef,
    TypeOf,
    Tertiary,
    // conversions
    Bitcast,
    IntToPtr,
    PtrToInt,
    ITrunc,
    ZExt,
    SExt,
    FPTrunc,
    FPExt,
    FPToUI,
    FPToSI,
    UIToFP,
    SIToFP,
    // aggregates and memory
    ExtractValue,
    InsertValue,
    GetElementPtr,
    Load,
    VolatileLoad,
    Store,
    VolatileStore,
    Alloca,
    AllocaArray,
    Malloc,
    MallocArray,
    Free,
    // integer comparisons
    ICmpEq,
    ICmpNe,
    ICmpUGt,
    ICmpUGe,
    ICmpULt,
    ICmpULe,
    ICmpSGt,
    ICmpSGe,
    ICmpSLt,
    ICmpSLe,
    // real comparisons (ordered / unordered)
    FCmpOEq,
    FCmpONe,
    FCmpOrd,
    FCmpOGt,
    FCmpOGe,
    FCmpOLt,
    FCmpOLe,
    FCmpUEq,
    FCmpUNe,
    FCmpUno,
    FCmpUGt,
    FCmpUGe,
    FCmpULt,
    FCmpULe,
    // integer arithmetic
    Add,
    AddNuw,
    AddNsw,
    Sub,
    SubNuw,
    SubNsw,
    Mul,
    MulNuw,
    MulNsw,
    SDiv,
    UDiv,
    SRem,
    URem,
    BAnd,
    BOr,
    BXor,
    Shl,
    LShr,
    AShr,
    SSign,
    // real arithmetic
    FAdd,
    FSub,
    FMul,
    FDiv,
    FRem,
    Atan2,
    Step,
    Pow,
    FAbs,
    FSign,
    Radians,
    Degrees,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Exp,
    Log,
    Exp2,
    Log2,
    Trunc,
    Floor,
    Sqrt,
    InverseSqrt,
    FMix,
}

/// How an operator is typed. Everything except `Special` shares a generic
/// rule: operands must be matching integer or real vectors, and the result is
/// the operand type (bool-vector for comparisons).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpClass {
    IntegerBinary,
    IntegerUnary,
    IntegerCompare,
    RealBinary,
    RealUnary,
    RealCompare,
    RealTernary,
    Special,
}

impl Builtin {
    pub fn class(self) -> OpClass {
        use Builtin::*;
        match self {
            Add | AddNuw | AddNsw | Sub | SubNuw | SubNsw | Mul | MulNuw | MulNsw | SDiv
            | UDiv | SRem | URem | BAnd | BOr | BXor | Shl | LShr | AShr => OpClass::IntegerBinary,
            SSign => OpClass::IntegerUnary,
            ICmpEq | ICmpNe | ICmpUGt | ICmpUGe | ICmpULt | ICmpULe | ICmpSGt | ICmpSGe
            | ICmpSLt | ICmpSLe => OpClass::IntegerCompare,
            FAdd | FSub | FMul | FDiv | FRem | Atan2 | Step | Pow => OpClass::RealBinary,
            FAbs | FSign | Radians | Degrees | Sin | Cos | Tan | Asin | Acos | Atan | Exp
            | Log | Exp2 | Log2 | Trunc | Floor | Sqrt | InverseSqrt => OpClass::RealUnary,
            FCmpOEq | FCmpONe | FCmpOrd | FCmpOGt | FCmpOGe | FCmpOLt | FCmpOLe | FCmpUEq
            | FCmpUNe | FCmpUno | FCmpUGt | FCmpUGe | FCmpULt | FCmpULe => OpClass::RealCompare,
            FMix => OpClass::RealTernary,
            Dump | Undef | TypeOf | Tertiary | Bitcast | IntToPtr | PtrToInt | ITrunc | ZExt
            | SExt | FPTrunc | FPExt | FPToUI | FPToSI | UIToFP | SIToFP | ExtractValue
            | InsertValue | GetElementPtr | Load | VolatileLoad | Store | VolatileStore
            | Alloca | AllocaArray | Malloc | MallocArray | Free => OpClass::Special,
        }
    }
}

// ---------------------------------------------------------------------------
// Constant folding
// ---------------------------------------------------------------------------

fn width_mask(width: u16) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

fn sign_extend(value: u64, width: u16) -> i64 {
    if width >= 64 {
        return value as i64;
    }
    let shift = 64 - width as u32;
    ((value << shift) as i64) >> shift
}

/// Folds an integer binary operator over constant bit patterns of the given
/// width. Signedness comes from the operator, not the type.
pub fn fold_integer_binary(op: Builtin, a: u64, b: u64, width: u16) -> Option<u64> {
    use Builtin::*;
    let mask = width_mask(width);
    let (a, b) = (a & mask, b & mask);
    let (sa, sb) = (sign_extend(a, width), sign_extend(b, width));
    let raw = match op {
        Add => a.wrapping_add(b),
        Sub => a.wrapping_sub(b),
        Mul => a.wrapping_mul(b),
        AddNuw => a.checked_add(b).filter(|v| *v <= mask)?,
        SubNuw => a.checked_sub(b)?,
        MulNuw => a.checked_mul(b).filter(|v| *v <= mask)?,
        AddNsw => in_signed_range(sa.checked_add(sb)?, width)? as u64,
        SubNsw => in_signed_range(sa.checked_sub(sb)?, width)? as u64,
        MulNsw => in_signed_range(sa.checked_mul(sb)?, width)? as u64,
        SDiv => sa.checked_div(sb)? as u64,
        SRem => sa.checked_rem(sb)? as u64,
        UDiv => a.checked_div(b)?,
        URem => a.checked_rem(b)?,
        BAnd => a & b,
        BOr => a | b,
        BXor => a ^ b,
        Shl if b < width as u64 => a << b,
        LShr if b < width as u64 => a >> b,
        AShr if b < width as u64 => (sa >> b) as u64,
        Shl | LShr | AShr => return None,
        _ => return None,
    };
    Some(raw & mask)
}

fn in_signed_range(value: i64, width: u16) -> Option<i64> {
    if width >= 64 {
        return Some(value);
    }
    let bound = 1i64 << (width - 1);
    ((-bound..bound).contains(&value)).then_some(value)
}

pub fn fold_integer_compare(op: Builtin, a: u64, b: u64, width: u16) -> Option<bool> {
    use Builtin::*;
    let mask = width_mask(width);
    let (a, b) = (a & mask, b & mask);
    let (sa, sb) = (sign_extend(a, width), sign_extend(b, width));
    Some(match op {
        ICmpEq => a == b,
        ICmpNe => a != b,
        ICmpUGt => a > b,
        ICmpUGe => a >= b,
        ICmpULt => a < b,
        ICmpULe => a <= b,
        ICmpSGt => sa > sb,
        ICmpSGe => sa >= sb,
        ICmpSLt => sa < sb,
        ICmpSLe => sa <= sb,
        _ => return None,
    })
}

/// Rounds through f32 so a folded f32 operation matches what the target
/// would have computed.
fn round_to_width(value: f64, width: u16) -> f64 {
    if width == 32 {
        value as f32 as f64
    } else {
        value
    }
}

pub fn fold_real_binary(op: Builtin, a: f64, b: f64, width: u16) -> Option<f64> {
    use Builtin::*;
    let result = match op {
        FAdd => a + b,
        FSub => a - b,
        FMul => a * b,
        FDiv => a / b,
        FRem => a % b,
        Atan2 => a.atan2(b),
        Pow => a.powf(b),
        // step(edge, x)
        Step => {
            if b < a {
                0.0
            } else {
                1.0
            }
        }
        _ => return None,
    };
    Some(round_to_width(result, width))
}

pub fn fold_real_unary(op: Builtin, a: f64, width: u16) -> Option<f64> {
    use Builtin::*;
    let result = match op {
        FAbs => a.abs(),
        FSign => {
            if a == 0.0 {
                0.0
            } else {
                a.signum()
            }
        }
        Radians => a.to_radians(),
        Degrees => a.to_degrees(),
        Sin => a.sin(),
        Cos => a.cos(),
        Tan => a.tan(),
        Asin => a.asin(),
        Acos => a.acos(),
        Atan => a.atan(),
        Exp => a.exp(),
        Log => a.ln(),
        Exp2 => a.exp2(),
        Log2 => a.log2(),
        Trunc => a.trunc(),
        Floor => a.floor(),
        Sqrt => a.sqrt(),
        InverseSqrt => a.sqrt().recip(),
        _ => return None,
    };
    Some(round_to_width(result, width))
}

pub fn fold_real_compare(op: Builtin, a: f64, b: f64) -> Option<bool> {
    use Builtin::*;
    let unordered = a.is_nan() || b.is_nan();
    Some(match op {
        FCmpOEq => !unordered && a == b,
        FCmpONe => !unordered && a != b,
        FCmpOGt => !unordered && a > b,
        FCmpOGe => !unordered && a >= b,
        FCmpOLt => !unordered && a < b,
        FCmpOLe => !unordered && a <= b,
        FCmpOrd => !unordered,
        FCmpUEq => unordered || a == b,
        FCmpUNe => unordered || a != b,
        FCmpUGt => unordered || a > b,
        FCmpUGe => unordered || a >= b,
        FCmpULt => unordered || a < b,
        FCmpULe => unordered || a <= b,
        FCmpUno => unordered,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_add_masks_to_width() {
        assert_eq!(fold_integer_binary(Builtin::Add, 255, 1, 8), Some(0));
        assert_eq!(
            fold_integer_binary(Builtin::AddNuw, 255, 1, 8),
            None
        );
    }

    #[test]
    fn signed_division_uses_sign_extension() {
        // -6 / 2 at width 8
        let minus_six = 0xFAu64;
        assert_eq!(
            fold_integer_binary(Builtin::SDiv, minus_six, 2, 8),
            Some(0xFD)
        );
        assert_eq!(fold_integer_binary(Builtin::SDiv, 1, 0, 8), None);
    }

    #[test]
    fn out_of_range_shifts_stay_symbolic() {
        assert_eq!(fold_integer_binary(Builtin::Shl, 1, 8, 8), None);
        assert_eq!(fold_integer_binary(Builtin::Shl, 1, 3, 8), Some(8));
    }

    #[test]
    fn signed_compare_disagrees_with_unsigned() {
        let minus_one = 0xFFu64;
        assert_eq!(
            fold_integer_compare(Builtin::ICmpSLt, minus_one, 1, 8),
            Some(true)
        );
        assert_eq!(
            fold_integer_compare(Builtin::ICmpULt, minus_one, 1, 8),
            Some(false)
        );
    }

    #[test]
    fn unordered_compares_accept_nan() {
        assert_eq!(
            fold_real_compare(Builtin::FCmpOEq, f64::NAN, 1.0),
            Some(false)
        );
        assert_eq!(
            fold_real_compare(Builtin::FCmpUNe, f64::NAN, 1.0),
            Some(true)
        );
    }
}
