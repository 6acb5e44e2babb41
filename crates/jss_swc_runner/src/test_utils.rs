use regex::Regex;
use swc_core::ecma::visit::{Visit, VisitMut};

use crate::runner::{run_visit, run_visit_const, RunOptions};
pub use crate::runner::{RunContext, RunVisitResult};

/// In the future this might be a different type to `RunContext`
pub type RunTestContext = RunContext;

/// Helper to test SWC visitors.
///
/// * Parse `code` with SWC
/// * Run a visitor over it
/// * Return the result
///
pub fn run_test_visit<V: VisitMut>(
  code: &str,
  make_visit: impl FnOnce(RunTestContext) -> V,
) -> RunVisitResult<V> {
  run_visit(code, &test_run_options(), make_visit).unwrap()
}

pub fn run_test_visit_const<V: Visit>(
  code: &str,
  make_visit: impl FnOnce(RunTestContext) -> V,
) -> RunVisitResult<V> {
  run_visit_const(code, &test_run_options(), make_visit).unwrap()
}

/// Print `code` back without transforming it, so expectations can be written against the
/// normalized output of the code generator.
pub fn print_unchanged(code: &str) -> String {
  struct Noop;
  impl VisitMut for Noop {}

  run_test_visit(code, |_| Noop).output_code
}

/// Remove whitespace from line starts and ends
pub fn remove_code_whitespace(code: &str) -> String {
  let re = Regex::new(r"\s*\n\s*").unwrap();
  re.replace_all(code, "\n").trim().to_string()
}

fn test_run_options() -> RunOptions {
  RunOptions {
    file_name: Some("something/styles.js".to_string()),
    ..Default::default()
  }
}
