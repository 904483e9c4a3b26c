//! PDF content stream operator implementations.
//!
//! Operators are grouped by category:
//! - `graphics_state` - State stack and transforms (q, Q, cm, w, J, j, M, d, ri, i, gs)
//! - `color` - Color space and values (G, g, RG, rg, K, k, CS, cs, SC, SCN, sc, scn)
//! - `path` - Path construction and painting (m, l, c, v, y, h, re, S, s, f, F, f\*, B, B\*, b, b\*, n, W, W\*)
//! - `text` - Text state, positioning and showing, Type 3 metrics (BT, ET, Tc, Tw, Tz, TL, Tf, Tr, Ts, Td, TD, Tm, T\*, Tj, TJ, ', ", d0, d1)
//! - `xobject` - XObjects, inline images and shading (Do, BI, ID, EI, sh)
//! - `marked_content` - Marked content and compatibility (MP, DP, BMC, BDC, EMC, BX, EX)

mod color;
mod graphics_state;
mod marked_content;
mod path;
mod text;
mod xobject;

// Each file adds an impl block to PDFStreamProcessor, so there is nothing
// to re-export; the registry calls the handlers directly.
