//! Stack-trace filtering.
//!
//! The canonical compared form of a stack trace drops the leading
//! type/message line and every frame belonging to the test harness, the
//! concurrency scaffolding, or the executor itself; only user and framework
//! frames remain.

/// Markers identifying harness and scaffolding frames.
pub const HARNESS_MARKERS: &[&str] = &["mutmatrix.", "Thread.run("];

/// Reduce a raw trace to the canonical compared form.
pub fn filter_stack_trace(raw: &str) -> String {
    raw.lines()
        .enumerate()
        .filter(|(i, line)| {
            if *i == 0 && !line.starts_with("\tat ") {
                return false;
            }
            !HARNESS_MARKERS.iter().any(|m| line.contains(m))
        })
        .map(|(_, line)| line)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_leading_line_and_harness_frames() {
        let raw = "AssertionError: expected 5 but was -1\n\
                   \tat demo.CalcTest.testAdd(CalcTest.test:1)\n\
                   \tat mutmatrix.minion.FixtureRunner.run(FixtureRunner:0)\n\
                   \tat worker.Thread.run(Thread:0)";
        assert_eq!(
            filter_stack_trace(raw),
            "\tat demo.CalcTest.testAdd(CalcTest.test:1)"
        );
    }

    #[test]
    fn keeps_user_and_framework_frames() {
        let raw = "ArithmeticException: / by zero\n\
                   \tat demo.Calc.div(Calc.src:5)\n\
                   \tat demo.CalcTest.testDiv(CalcTest.test:1)";
        assert_eq!(
            filter_stack_trace(raw),
            "\tat demo.Calc.div(Calc.src:5)\n\tat demo.CalcTest.testDiv(CalcTest.test:1)"
        );
    }

    #[test]
    fn already_filtered_traces_are_stable() {
        let filtered = "\tat demo.Calc.div(Calc.src:5)";
        assert_eq!(filter_stack_trace(filtered), filtered);
    }
}
