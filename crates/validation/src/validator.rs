use expertkit_core::task::Task;

use crate::report::ValidationReport;

/// Checks a task's result before it is trusted.
///
/// Implemented once per kind of task. Validators never fail: every problem
/// they find is an entry in the returned report.
pub trait Validator<T: Task>: Send + Sync {
    fn validate(&self, result: &T::Output, task: &T) -> ValidationReport;
}
