//! # patches-algorithm
//!
//! The pure conflict-resolution kernel: applying operations to produce
//! document state, transforming one operation against another, and the two
//! [`Strategy`] implementations ([`OtStrategy`], [`LwwStrategy`]) a tracked
//! document is bound to at track time.
//!
//! Every function here is a pure transformation of its explicit inputs —
//! no IO, no async, no clock reads beyond the injected
//! [`patches_types::Clock`]. The manager and sync layers own all
//! concurrency and persistence; this crate is what they call into.

mod compose;
mod error;
mod json_patch;
mod lww;
mod ot;
mod strategy;
mod transform;

pub use error::{AlgorithmError, AlgorithmResult};
pub use json_patch::{apply_ops, parse_splice, path_to_string, splice_op, Splice};
pub use lww::LwwStrategy;
pub use ot::OtStrategy;
pub use strategy::Strategy;
pub use transform::transform_op;

use patches_types::AlgorithmKind;

/// Returns the strategy implementation bound to `kind`.
pub fn strategy_for(kind: AlgorithmKind) -> Box<dyn Strategy> {
    match kind {
        AlgorithmKind::Ot => Box::new(OtStrategy),
        AlgorithmKind::Lww => Box::new(LwwStrategy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_for_returns_matching_kind() {
        assert_eq!(strategy_for(AlgorithmKind::Ot).kind(), AlgorithmKind::Ot);
        assert_eq!(strategy_for(AlgorithmKind::Lww).kind(), AlgorithmKind::Lww);
    }
}
