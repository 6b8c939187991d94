//! Transition classification and bit sequences.
//!
//! Every (test, mutant) pair is classified against the baseline into one of
//! four transitions; a mutant's row in the matrix carries one bit per
//! baseline test, in tcID order, for the result transition and for each of
//! the three exception-detail deltas.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{DetailedTestResult, TestCaseMetadata};

/// 2×2 classification of a (test, mutant) outcome against baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// Passed in baseline, fails on the mutant.
    P2F,
    /// Failed in baseline, passes on the mutant.
    F2P,
    /// Passed in both.
    P2P,
    /// Failed in both.
    F2F,
}

impl Transition {
    /// Classify from (baseline passed, current passed).
    pub fn classify(baseline_passed: bool, current_passed: bool) -> Transition {
        match (baseline_passed, current_passed) {
            (true, false) => Transition::P2F,
            (false, true) => Transition::F2P,
            (true, true) => Transition::P2P,
            (false, false) => Transition::F2F,
        }
    }

    /// True for the detecting transitions (P→F, F→P).
    pub fn is_detection(self) -> bool {
        matches!(self, Transition::P2F | Transition::F2P)
    }
}

/// Fixed-length bit sequence rendered as a `0`/`1` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitSeq {
    bits: Vec<bool>,
}

impl BitSeq {
    /// All-zero sequence of the given length.
    pub fn zeros(len: usize) -> Self {
        Self { bits: vec![false; len] }
    }

    /// Set the bit at `index`; out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, value: bool) {
        if let Some(slot) = self.bits.get_mut(index) {
            *slot = value;
        }
    }

    /// Bit at `index`, false when out of range.
    pub fn get(&self, index: usize) -> bool {
        self.bits.get(index).copied().unwrap_or(false)
    }

    /// Sequence length.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True for the empty sequence.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// True when at least one bit is set.
    pub fn any_set(&self) -> bool {
        self.bits.iter().any(|&b| b)
    }
}

impl std::fmt::Display for BitSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &b in &self.bits {
            f.write_str(if b { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Normalize an optional detail string: `None`, empty, and the literal
/// `"None"` all mean absent.
pub fn normalize_detail(s: Option<&str>) -> Option<&str> {
    match s {
        None => None,
        Some("") | Some("None") => None,
        Some(other) => Some(other),
    }
}

/// True when the two detail strings differ after normalization.
pub fn details_differ(a: Option<&str>, b: Option<&str>) -> bool {
    normalize_detail(a) != normalize_detail(b)
}

/// The four per-mutant bit sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionBits {
    /// 1 iff the pair is P→F or F→P.
    pub result: BitSeq,
    /// 1 iff the exception type differs from baseline.
    pub exc_type: BitSeq,
    /// 1 iff the exception message differs from baseline.
    pub exc_msg: BitSeq,
    /// 1 iff the filtered stack trace differs from baseline.
    pub stack: BitSeq,
}

impl TransitionBits {
    /// All-zero bit sets over `num_tests` columns.
    pub fn zeros(num_tests: usize) -> Self {
        Self {
            result: BitSeq::zeros(num_tests),
            exc_type: BitSeq::zeros(num_tests),
            exc_msg: BitSeq::zeros(num_tests),
            stack: BitSeq::zeros(num_tests),
        }
    }

    /// Build the bit sets for one mutant's detailed results.
    ///
    /// Tests the executor never ran contribute 0 in every column; results
    /// for tests absent from the baseline table are dropped.
    pub fn compute(
        num_tests: usize,
        baseline: &BTreeMap<String, TestCaseMetadata>,
        detailed: &[DetailedTestResult],
    ) -> Self {
        let mut bits = Self::zeros(num_tests);
        for result in detailed {
            let Some(meta) = baseline.get(&result.test_name) else {
                continue;
            };
            let col = meta.tc_id as usize;
            let transition = Transition::classify(meta.passed, result.passed);
            bits.result.set(col, transition.is_detection());
            bits.exc_type.set(
                col,
                details_differ(
                    meta.exception.type_name.as_deref(),
                    result.exception.type_name.as_deref(),
                ),
            );
            bits.exc_msg.set(
                col,
                details_differ(
                    meta.exception.message.as_deref(),
                    result.exception.message.as_deref(),
                ),
            );
            bits.stack.set(
                col,
                details_differ(
                    meta.exception.stack.as_deref(),
                    result.exception.stack.as_deref(),
                ),
            );
        }
        bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExceptionDetail;

    fn meta(tc_id: u32, name: &str, passed: bool, exc_type: Option<&str>) -> TestCaseMetadata {
        TestCaseMetadata {
            tc_id,
            test_name: name.to_string(),
            passed,
            exception: ExceptionDetail {
                type_name: exc_type.map(str::to_string),
                message: None,
                stack: None,
            },
            duration_ms: 1,
        }
    }

    fn result(name: &str, passed: bool, exc_type: Option<&str>) -> DetailedTestResult {
        DetailedTestResult {
            test_name: name.to_string(),
            passed,
            exception: ExceptionDetail {
                type_name: exc_type.map(str::to_string),
                message: None,
                stack: None,
            },
            duration_ms: 1,
        }
    }

    #[test]
    fn classification_covers_the_four_quadrants() {
        assert_eq!(Transition::classify(true, false), Transition::P2F);
        assert_eq!(Transition::classify(false, true), Transition::F2P);
        assert_eq!(Transition::classify(true, true), Transition::P2P);
        assert_eq!(Transition::classify(false, false), Transition::F2F);
        assert!(Transition::P2F.is_detection());
        assert!(Transition::F2P.is_detection());
        assert!(!Transition::P2P.is_detection());
        assert!(!Transition::F2F.is_detection());
    }

    #[test]
    fn absent_detail_spellings_are_equivalent() {
        assert!(!details_differ(None, Some("")));
        assert!(!details_differ(Some("None"), None));
        assert!(!details_differ(Some(""), Some("None")));
        assert!(details_differ(Some("AssertionError"), None));
        assert!(details_differ(Some("A"), Some("B")));
    }

    #[test]
    fn bits_are_indexed_by_tc_id_and_missing_runs_stay_zero() {
        let mut baseline = BTreeMap::new();
        baseline.insert("t0".to_string(), meta(0, "t0", true, None));
        baseline.insert("t1".to_string(), meta(1, "t1", true, None));
        baseline.insert("t2".to_string(), meta(2, "t2", false, Some("IOError")));

        // t1 never ran; t0 flips P->F; t2 flips F->P.
        let detailed = vec![
            result("t0", false, Some("AssertionError")),
            result("t2", true, None),
        ];
        let bits = TransitionBits::compute(3, &baseline, &detailed);
        assert_eq!(bits.result.to_string(), "101");
        assert_eq!(bits.exc_type.to_string(), "101");
        assert_eq!(bits.result.len(), 3);
    }

    #[test]
    fn unknown_test_names_are_dropped() {
        let baseline = BTreeMap::new();
        let detailed = vec![result("ghost", false, Some("X"))];
        let bits = TransitionBits::compute(2, &baseline, &detailed);
        assert_eq!(bits.result.to_string(), "00");
    }

    #[test]
    fn display_renders_zero_one_string() {
        let mut seq = BitSeq::zeros(4);
        seq.set(1, true);
        seq.set(3, true);
        assert_eq!(seq.to_string(), "0101");
        assert!(seq.any_set());
        assert!(!BitSeq::zeros(2).any_set());
    }
}
