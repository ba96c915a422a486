//! Bounded validate-and-retry around an expert invocation.
//!
//! After each invocation the task's result is checked by a [`Validator`].
//! A failing report is fed back to the model as a user message listing the
//! report's entries, and the expert is invoked again on the same task, until
//! the result passes or the attempt budget runs out.

use expertkit_core::error::ExpertError;
use expertkit_core::message::Message;
use expertkit_core::task::Task;
use expertkit_validation::{ValidationReport, Validator};
use tracing::{info, warn};

use crate::expert::Expert;

/// Final state of a correction loop.
#[derive(Debug, Clone)]
pub struct CorrectionOutcome {
    /// Number of invocations performed (at least one).
    pub attempts: usize,
    /// The report for the last attempt.
    pub report: ValidationReport,
}

impl CorrectionOutcome {
    pub fn passed(&self) -> bool {
        self.report.passed()
    }
}

/// Build the feedback message sent after a failed validation.
pub fn correction_message(report: &ValidationReport) -> Message {
    Message::user(format!(
        "The result you produced failed validation:\n{}\n\nFix these problems and call the tool again.",
        report.feedback()
    ))
}

/// Invoke `expert` on `task` until `validator` accepts the result, at most
/// `max_attempts` times (zero is treated as one).
///
/// Orchestration faults are returned as errors immediately; a result that
/// never validates is not an error, it is an outcome whose report has not
/// passed.
pub async fn invoke_with_validation<T, V>(
    expert: &Expert<T>,
    task: &mut T,
    validator: &V,
    max_attempts: usize,
) -> Result<CorrectionOutcome, ExpertError>
where
    T: Task,
    V: Validator<T> + ?Sized,
{
    let max_attempts = max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;
        expert.invoke(task).await?;

        let result = task
            .result()
            .ok_or_else(|| ExpertError::MissingResult(task.id().to_string()))?;
        let report = validator.validate(result, task);

        if report.passed() {
            info!(expert = %expert.name(), task_id = %task.id(), attempts, "Result validated");
            return Ok(CorrectionOutcome { attempts, report });
        }
        if attempts >= max_attempts {
            warn!(
                expert = %expert.name(),
                task_id = %task.id(),
                attempts,
                "Result still failing validation; giving up"
            );
            return Ok(CorrectionOutcome { attempts, report });
        }

        warn!(
            expert = %expert.name(),
            task_id = %task.id(),
            attempt = attempts,
            errors = report.errors().count(),
            "Result failed validation; asking for a correction"
        );
        task.context_mut().push(correction_message(&report));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedModel, Verdict, VerdictTask, make_tool_call, tool_call_response};
    use expertkit_core::message::Role;
    use expertkit_core::tool::{ToolBundle, TypedTool};
    use expertkit_validation::Severity;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Deserialize, JsonSchema)]
    struct VerdictArgs {
        label: String,
        score: u32,
    }

    /// Accepts verdicts with a score of at least 5.
    struct MinimumScore;

    impl Validator<VerdictTask> for MinimumScore {
        fn validate(&self, result: &Verdict, task: &VerdictTask) -> ValidationReport {
            let mut report = ValidationReport::new(json!(task.claim));
            if result.score >= 5 {
                report.append("score accepted", Severity::Info);
                let mut output = serde_json::Map::new();
                output.insert("score".into(), json!(result.score));
                report.pass(output);
            } else {
                report.append(format!("score {} is below 5", result.score), Severity::Error);
            }
            report
        }
    }

    fn response(id: &str, score: u32) -> Message {
        tool_call_response(vec![make_tool_call(
            id,
            "GiveVerdict",
            json!({"label": "x", "score": score}),
        )])
    }

    fn expert(model: Arc<ScriptedModel>) -> Expert<VerdictTask> {
        let tool: TypedTool<VerdictArgs, Verdict> = TypedTool::new("GiveVerdict", "Rate", |a: VerdictArgs| {
            Ok(Verdict {
                label: a.label,
                score: a.score,
            })
        });
        Expert::new("verdict", model, |_: &VerdictTask| Message::system("rate it"), ToolBundle::new(tool))
    }

    #[tokio::test]
    async fn passing_first_attempt_stops_immediately() {
        let model = Arc::new(ScriptedModel::new(vec![response("c1", 7)]));
        let mut task = VerdictTask::new("t", "claim");

        let outcome = invoke_with_validation(&expert(model.clone()), &mut task, &MinimumScore, 3)
            .await
            .unwrap();

        assert!(outcome.passed());
        assert_eq!(outcome.attempts, 1);
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn failed_report_is_fed_back_before_retry() {
        let model = Arc::new(ScriptedModel::new(vec![response("c1", 2), response("c2", 8)]));
        let mut task = VerdictTask::new("t", "claim");

        let outcome = invoke_with_validation(&expert(model.clone()), &mut task, &MinimumScore, 3)
            .await
            .unwrap();

        assert!(outcome.passed());
        assert_eq!(outcome.attempts, 2);
        assert_eq!(task.result().map(|v| v.score), Some(8));

        let second = &model.contexts()[1];
        let feedback = second.last().unwrap();
        assert_eq!(feedback.role(), Role::User);
        assert!(feedback.content().contains("- [error] score 2 is below 5"));
    }

    #[tokio::test]
    async fn budget_exhaustion_returns_failing_report() {
        let model = Arc::new(ScriptedModel::new(vec![response("c1", 1), response("c2", 2)]));
        let mut task = VerdictTask::new("t", "claim");

        let outcome = invoke_with_validation(&expert(model.clone()), &mut task, &MinimumScore, 2)
            .await
            .unwrap();

        assert!(!outcome.passed());
        assert_eq!(outcome.attempts, 2);
        assert_eq!(model.call_count(), 2);
        // No feedback message is appended after the final attempt.
        assert_eq!(task.context().last().unwrap().role(), Role::ToolResult);
    }

    #[tokio::test]
    async fn orchestration_fault_propagates() {
        let model = Arc::new(ScriptedModel::new(vec![Message::assistant("no tool")]));
        let mut task = VerdictTask::new("t", "claim");

        let err = invoke_with_validation(&expert(model), &mut task, &MinimumScore, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, ExpertError::NoToolCallProduced { .. }));
    }

    #[tokio::test]
    async fn zero_budget_still_attempts_once() {
        let model = Arc::new(ScriptedModel::new(vec![response("c1", 1)]));
        let mut task = VerdictTask::new("t", "claim");

        let outcome = invoke_with_validation(&expert(model), &mut task, &MinimumScore, 0)
            .await
            .unwrap();
        assert_eq!(outcome.attempts, 1);
    }
}
