//! Compiler-wide configuration, threaded into the parser, annotator, and
//! code generator constructors. Not a file format — the driver (out of
//! scope for this crate) is responsible for turning flags into this struct.

/// Target-dependent sizes and tunables for the reference x86-64 target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Size in bytes of `int` on the target (4 on the reference target).
    pub int_size: u32,
    /// Size in bytes of a pointer on the target (8 on the reference target).
    pub pointer_size: u32,
    /// Size in bytes of `long` on the target (8 on the reference target).
    pub long_size: u32,
    /// Maximum recursion depth the constant evaluator will walk before
    /// giving up and reporting the expression as non-constant. Guards
    /// against stack overflow on deeply nested constant expressions.
    pub max_constant_fold_depth: u32,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            int_size: 4,
            pointer_size: 8,
            long_size: 8,
            max_constant_fold_depth: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_reference_target() {
        let opts = CompileOptions::default();
        assert_eq!(opts.int_size, 4);
        assert_eq!(opts.pointer_size, 8);
    }
}
