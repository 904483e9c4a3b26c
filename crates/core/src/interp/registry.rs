//! Operator registry.
//!
//! Maps every content-stream mnemonic to its declared arity and handler.
//! The table is built once, on first use, and is read-only afterwards, so
//! concurrent processors share it without locking. Handlers extract and
//! type-check all operands before calling into the processor, so a failing
//! operand check never leaves a half-applied operator behind.

use std::fmt;
use std::sync::LazyLock;

use rustc_hash::FxHashMap;

use super::interpreter::PDFStreamProcessor;
use super::operands::Operands;
use crate::error::Result;

/// Declared operand count of an operator.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Exact(usize),
    /// Count depends on state, e.g. the components of the current color space
    Variable,
}

impl Arity {
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => n == count,
            Self::Variable => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::Variable => f.write_str("a variable number of"),
        }
    }
}

impl fmt::Debug for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "Exact({n})"),
            Self::Variable => f.write_str("Variable"),
        }
    }
}

/// Handler contract: the processor plus the arity-checked operands.
pub type OperatorFn = fn(&mut PDFStreamProcessor<'_>, &Operands<'_>) -> Result<()>;

/// One registered operator.
#[derive(Clone, Copy)]
pub struct OperatorSpec {
    pub mnemonic: &'static str,
    pub arity: Arity,
    pub handler: OperatorFn,
}

impl OperatorSpec {
    pub const fn new(mnemonic: &'static str, arity: Arity, handler: OperatorFn) -> Self {
        Self {
            mnemonic,
            arity,
            handler,
        }
    }
}

impl fmt::Debug for OperatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorSpec")
            .field("mnemonic", &self.mnemonic)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Mnemonic to handler table.
#[derive(Debug, Default)]
pub struct OperatorRegistry {
    ops: FxHashMap<&'static str, OperatorSpec>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, returning the one it replaced.
    pub fn register(&mut self, spec: OperatorSpec) -> Option<OperatorSpec> {
        self.ops.insert(spec.mnemonic, spec)
    }

    pub fn lookup(&self, mnemonic: &str) -> Option<&OperatorSpec> {
        self.ops.get(mnemonic)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Registered mnemonics in sorted order.
    pub fn mnemonics(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.ops.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// The process-wide registry of every content-stream operator.
pub fn registry() -> &'static OperatorRegistry {
    &REGISTRY
}

static REGISTRY: LazyLock<OperatorRegistry> = LazyLock::new(|| {
    let mut reg = OperatorRegistry::new();
    for spec in standard_operators() {
        let replaced = reg.register(spec);
        debug_assert!(replaced.is_none(), "duplicate operator {}", spec.mnemonic);
    }
    reg
});

use Arity::{Exact, Variable};

#[rustfmt::skip]
fn standard_operators() -> [OperatorSpec; 73] {
    [
        // General graphics state
        OperatorSpec::new("w", Exact(1), |p, a| p.do_w(a.number(0)?)),
        OperatorSpec::new("J", Exact(1), |p, a| p.do_J(a.int(0)?)),
        OperatorSpec::new("j", Exact(1), |p, a| p.do_j(a.int(0)?)),
        OperatorSpec::new("M", Exact(1), |p, a| p.do_M(a.number(0)?)),
        OperatorSpec::new("d", Exact(2), |p, a| p.do_d(a.array(0)?, a.number(1)?)),
        OperatorSpec::new("ri", Exact(1), |p, a| p.do_ri(a.name(0)?)),
        OperatorSpec::new("i", Exact(1), |p, a| p.do_i(a.number(0)?)),
        OperatorSpec::new("gs", Exact(1), |p, a| p.do_gs(a.name(0)?)),
        // Special graphics state
        OperatorSpec::new("q", Exact(0), |p, _| p.do_q()),
        OperatorSpec::new("Q", Exact(0), |p, _| p.do_Q()),
        OperatorSpec::new("cm", Exact(6), |p, a| p.do_cm(a.matrix(0)?)),
        // Path construction
        OperatorSpec::new("m", Exact(2), |p, a| p.do_m(a.point(0)?)),
        OperatorSpec::new("l", Exact(2), |p, a| p.do_l(a.point(0)?)),
        OperatorSpec::new("c", Exact(6), |p, a| p.do_c(a.point(0)?, a.point(2)?, a.point(4)?)),
        OperatorSpec::new("v", Exact(4), |p, a| p.do_v(a.point(0)?, a.point(2)?)),
        OperatorSpec::new("y", Exact(4), |p, a| p.do_y(a.point(0)?, a.point(2)?)),
        OperatorSpec::new("h", Exact(0), |p, _| p.do_h()),
        OperatorSpec::new("re", Exact(4), |p, a| p.do_re(a.point(0)?, a.point(2)?)),
        // Path painting
        OperatorSpec::new("S", Exact(0), |p, _| p.do_S()),
        OperatorSpec::new("s", Exact(0), |p, _| p.do_s()),
        OperatorSpec::new("f", Exact(0), |p, _| p.do_f()),
        OperatorSpec::new("F", Exact(0), |p, _| p.do_F()),
        OperatorSpec::new("f*", Exact(0), |p, _| p.do_f_star()),
        OperatorSpec::new("B", Exact(0), |p, _| p.do_B()),
        OperatorSpec::new("B*", Exact(0), |p, _| p.do_B_star()),
        OperatorSpec::new("b", Exact(0), |p, _| p.do_b()),
        OperatorSpec::new("b*", Exact(0), |p, _| p.do_b_star()),
        OperatorSpec::new("n", Exact(0), |p, _| p.do_n()),
        // Clipping
        OperatorSpec::new("W", Exact(0), |p, _| p.do_W()),
        OperatorSpec::new("W*", Exact(0), |p, _| p.do_W_star()),
        // Text objects
        OperatorSpec::new("BT", Exact(0), |p, _| p.do_BT()),
        OperatorSpec::new("ET", Exact(0), |p, _| p.do_ET()),
        // Text state
        OperatorSpec::new("Tc", Exact(1), |p, a| p.do_Tc(a.number(0)?)),
        OperatorSpec::new("Tw", Exact(1), |p, a| p.do_Tw(a.number(0)?)),
        OperatorSpec::new("Tz", Exact(1), |p, a| p.do_Tz(a.number(0)?)),
        OperatorSpec::new("TL", Exact(1), |p, a| p.do_TL(a.number(0)?)),
        OperatorSpec::new("Tf", Exact(2), |p, a| p.do_Tf(a.name(0)?, a.number(1)?)),
        OperatorSpec::new("Tr", Exact(1), |p, a| p.do_Tr(a.int(0)?)),
        OperatorSpec::new("Ts", Exact(1), |p, a| p.do_Ts(a.number(0)?)),
        // Text positioning
        OperatorSpec::new("Td", Exact(2), |p, a| p.do_Td(a.point(0)?)),
        OperatorSpec::new("TD", Exact(2), |p, a| p.do_TD(a.point(0)?)),
        OperatorSpec::new("Tm", Exact(6), |p, a| p.do_Tm(a.matrix(0)?)),
        OperatorSpec::new("T*", Exact(0), |p, _| p.do_T_star()),
        // Text showing
        OperatorSpec::new("Tj", Exact(1), |p, a| p.do_Tj(a.string(0)?)),
        OperatorSpec::new("TJ", Exact(1), |p, a| p.do_TJ(a.array(0)?)),
        OperatorSpec::new("'", Exact(1), |p, a| p.do_quote(a.string(0)?)),
        OperatorSpec::new("\"", Exact(3), |p, a| p.do_doublequote(a.number(0)?, a.number(1)?, a.string(2)?)),
        // Type 3 fonts
        OperatorSpec::new("d0", Exact(2), |p, a| p.do_d0(a.point(0)?)),
        OperatorSpec::new("d1", Exact(6), |p, a| p.do_d1(a.point(0)?, a.point(2)?, a.point(4)?)),
        // Color
        OperatorSpec::new("CS", Exact(1), |p, a| p.do_CS(a.name(0)?)),
        OperatorSpec::new("cs", Exact(1), |p, a| p.do_cs(a.name(0)?)),
        OperatorSpec::new("SC", Variable, |p, a| p.do_SC(a)),
        OperatorSpec::new("SCN", Variable, |p, a| p.do_SCN(a)),
        OperatorSpec::new("sc", Variable, |p, a| p.do_sc(a)),
        OperatorSpec::new("scn", Variable, |p, a| p.do_scn(a)),
        OperatorSpec::new("G", Exact(1), |p, a| p.do_G(a.number(0)?)),
        OperatorSpec::new("g", Exact(1), |p, a| p.do_g(a.number(0)?)),
        OperatorSpec::new("RG", Exact(3), |p, a| p.do_RG(a.number(0)?, a.number(1)?, a.number(2)?)),
        OperatorSpec::new("rg", Exact(3), |p, a| p.do_rg(a.number(0)?, a.number(1)?, a.number(2)?)),
        OperatorSpec::new("K", Exact(4), |p, a| p.do_K(a.number(0)?, a.number(1)?, a.number(2)?, a.number(3)?)),
        OperatorSpec::new("k", Exact(4), |p, a| p.do_k(a.number(0)?, a.number(1)?, a.number(2)?, a.number(3)?)),
        // Shading, images and XObjects
        OperatorSpec::new("sh", Exact(1), |p, a| p.do_sh(a.name(0)?)),
        OperatorSpec::new("BI", Exact(0), |p, _| p.do_BI()),
        OperatorSpec::new("ID", Exact(0), |p, _| p.do_ID()),
        OperatorSpec::new("EI", Exact(1), |p, a| p.do_EI(a.stream(0)?)),
        OperatorSpec::new("Do", Exact(1), |p, a| p.do_Do(a.name(0)?)),
        // Marked content
        OperatorSpec::new("MP", Exact(1), |p, a| p.do_MP(a.name(0)?)),
        OperatorSpec::new("DP", Exact(2), |p, a| p.do_DP(a.name(0)?, a.get(1)?)),
        OperatorSpec::new("BMC", Exact(1), |p, a| p.do_BMC(a.name(0)?)),
        OperatorSpec::new("BDC", Exact(2), |p, a| p.do_BDC(a.name(0)?, a.get(1)?)),
        OperatorSpec::new("EMC", Exact(0), |p, _| p.do_EMC()),
        // Compatibility
        OperatorSpec::new("BX", Exact(0), |p, _| p.do_BX()),
        OperatorSpec::new("EX", Exact(0), |p, _| p.do_EX()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_operator_registered_once() {
        let reg = registry();
        assert_eq!(reg.len(), 73);
        for name in ["q", "Q", "cm", "Ts", "Tj", "Do", "BDC", "EMC", "BX", "EX", "d0", "d1", "sh"] {
            assert!(reg.lookup(name).is_some(), "{name} missing");
        }
        assert!(reg.lookup("Zx").is_none());
    }

    #[test]
    fn test_arity() {
        let reg = registry();
        assert_eq!(reg.lookup("cm").map(|s| s.arity), Some(Arity::Exact(6)));
        assert_eq!(reg.lookup("scn").map(|s| s.arity), Some(Arity::Variable));
        assert!(Arity::Exact(1).accepts(1));
        assert!(!Arity::Exact(1).accepts(2));
        assert_eq!(Arity::Exact(6).to_string(), "6");
    }
}
