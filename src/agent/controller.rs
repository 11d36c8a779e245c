use crate::agent::action::AgentAction;
use crate::agent::config::AgentConfig;
use crate::agent::parser::extract_action;
use crate::agent::session::{AgentSession, FailureReason, StopSignal, TaskOutcome};
use crate::agent::trace::TraceWriter;
use crate::browser::{PageDriver, ScrollDirection};
use crate::dom::{DomDistiller, ListedIds, format_prompt};
use crate::error::{AgentError, Result};
use crate::model::ActionModel;
use crate::tools::utils::normalize_url;
use crate::tools::{ActionFailure, ElementAction};
use crate::vision::ImageNormalizer;
use image::DynamicImage;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// What a single step did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEvent {
    Finished { result: Option<String> },
    Scrolled,
    ScrollFailed(String),
    Executed(ElementAction),
    ActionFailed { action: ElementAction, failure: ActionFailure },
    /// The model named an id that is not in the listing it was shown
    Hallucinated { element_id: String },
    Unparsable,
    Cancelled,
}

impl fmt::Display for StepEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepEvent::Finished { result: Some(result) } => write!(f, "Task complete: {}", result),
            StepEvent::Finished { result: None } => write!(f, "Task complete"),
            StepEvent::Scrolled => write!(f, "Scrolled down"),
            StepEvent::ScrollFailed(reason) => write!(f, "Scroll failed: {}", reason),
            StepEvent::Executed(action) => match action.value() {
                Some(value) => write!(f, "{} [{}] '{}'", action.kind, action.element_id, value),
                None => write!(f, "{} [{}]", action.kind, action.element_id),
            },
            StepEvent::ActionFailed { action, failure } => {
                write!(f, "{} [{}] failed: {}", action.kind, action.element_id, failure)
            }
            StepEvent::Hallucinated { element_id } => {
                write!(f, "Hallucination: element {} is not in the listing", element_id)
            }
            StepEvent::Unparsable => write!(f, "Model output could not be parsed"),
            StepEvent::Cancelled => write!(f, "Stopped by request"),
        }
    }
}

/// Per-step progress handed to callers
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: u32,

    /// The normalized image the model saw; absent when the step never captured
    pub screenshot: Option<DynamicImage>,

    pub event: StepEvent,

    /// Human-readable summary of `event`
    pub log: String,

    /// Whether the run is over after this step
    pub done: bool,
}

impl StepReport {
    fn new(step: u32, screenshot: Option<DynamicImage>, event: StepEvent, done: bool) -> Self {
        Self {
            step,
            screenshot,
            log: event.to_string(),
            event,
            done,
        }
    }
}

/// Drives one page with one model toward a goal
pub struct Agent<'a> {
    driver: &'a mut dyn PageDriver,
    model: &'a dyn ActionModel,
    config: AgentConfig,
    distiller: DomDistiller,
    normalizer: ImageNormalizer,
    stop: StopSignal,
}

impl<'a> Agent<'a> {
    pub fn new(driver: &'a mut dyn PageDriver, model: &'a dyn ActionModel, config: AgentConfig) -> Self {
        Self {
            driver,
            model,
            distiller: DomDistiller::new(config.max_elements),
            normalizer: ImageNormalizer::default(),
            config,
            stop: StopSignal::new(),
        }
    }

    /// Use a signal shared with another thread, e.g. a Ctrl-C handler
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Navigate to the start page and return the step iterator.
    ///
    /// Navigation and trace setup failures are returned here; nothing has been
    /// asked of the model yet.
    pub fn start<'r>(&'r mut self, goal: &str, start_url: &str) -> Result<AgentRun<'r, 'a>> {
        let url = normalize_url(start_url);
        log::info!("Starting task '{}' at {}", goal, url);
        self.driver.navigate(&url)?;

        let trace = match &self.config.trace_dir {
            Some(dir) => Some(TraceWriter::create(dir)?),
            None => None,
        };

        let mut session = AgentSession::new(goal, self.config.max_steps);
        let mut outcome = None;
        if self.config.max_steps == 0 {
            log::warn!("Step budget is zero; nothing to do");
            session.fail();
            outcome = Some(TaskOutcome::Failed {
                reason: FailureReason::BudgetExhausted,
                steps: 0,
            });
        }

        Ok(AgentRun {
            agent: self,
            session,
            trace,
            outcome,
        })
    }

    /// Run a task to its end
    pub fn run_task(&mut self, goal: &str, start_url: &str) -> Result<TaskOutcome> {
        let mut run = self.start(goal, start_url)?;
        for report in run.by_ref() {
            let report = report?;
            log::info!("Step {}: {}", report.step, report.log);
        }
        run.into_outcome().ok_or(AgentError::RunAborted)
    }
}

/// A run in progress.
///
/// Yields one report per step and ends after the terminal one. A step error
/// is yielded once and also ends the run.
pub struct AgentRun<'r, 'a> {
    agent: &'r mut Agent<'a>,
    session: AgentSession,
    trace: Option<TraceWriter>,
    outcome: Option<TaskOutcome>,
}

impl AgentRun<'_, '_> {
    pub fn session(&self) -> &AgentSession {
        &self.session
    }

    /// Set once the run has ended without an error
    pub fn outcome(&self) -> Option<&TaskOutcome> {
        self.outcome.as_ref()
    }

    pub fn into_outcome(self) -> Option<TaskOutcome> {
        self.outcome
    }

    pub fn trace_dir(&self) -> Option<&Path> {
        self.trace.as_ref().map(|t| t.dir())
    }

    fn step(&mut self, step: u32) -> Result<StepReport> {
        log::info!("Step {}/{}", step, self.session.max_steps);

        let capture = self.agent.driver.capture()?;
        let view = self.agent.normalizer.normalize(&capture.screenshot);
        let listing = self.agent.distiller.distill(&capture.html).render();
        let prompt = format_prompt(&self.session.goal, &listing);
        let valid_ids = ListedIds::from_listing(&listing);
        log::debug!(
            "Listing has {} entries (ids {}), page max id {}",
            valid_ids.len(),
            valid_ids.iter().collect::<Vec<_>>().join(","),
            capture.max_id
        );

        self.record(|trace| trace.write_view(step, &view));
        self.record(|trace| trace.write_dom(step, &listing));

        let raw = self.agent.model.predict(&view, &prompt)?;
        log::debug!("Model output: {}", raw);
        self.record(|trace| trace.write_output(step, &raw));

        let event = self.dispatch(&raw, &valid_ids);
        let done = self.transition(&event, step);
        Ok(StepReport::new(step, Some(view), event, done))
    }

    fn dispatch(&mut self, raw: &str, valid_ids: &ListedIds) -> StepEvent {
        let Some(prediction) = extract_action(raw) else {
            log::warn!("Could not parse model output: {}", raw);
            return StepEvent::Unparsable;
        };
        log::info!("Prediction: {:?}", prediction);

        match prediction.into_action() {
            AgentAction::Finish { result } => StepEvent::Finished { result },
            AgentAction::Scroll => {
                let event = match self.agent.driver.scroll(ScrollDirection::Down) {
                    Ok(()) => StepEvent::Scrolled,
                    Err(e) => {
                        log::warn!("Scroll failed: {}", e);
                        StepEvent::ScrollFailed(e.to_string())
                    }
                };
                settle(self.agent.config.scroll_settle);
                event
            }
            AgentAction::Interact(action) if valid_ids.contains(&action.element_id) => {
                let event = match self.agent.driver.execute(&action) {
                    Ok(()) => StepEvent::Executed(action),
                    Err(failure) => StepEvent::ActionFailed { action, failure },
                };
                settle(self.agent.config.action_settle);
                event
            }
            AgentAction::Interact(action) => {
                log::warn!("Hallucination: element {} is not in the listing", action.element_id);
                StepEvent::Hallucinated {
                    element_id: action.element_id,
                }
            }
        }
    }

    /// Apply the step's result to the session; true when the run is over
    fn transition(&mut self, event: &StepEvent, step: u32) -> bool {
        if let StepEvent::Finished { result } = event {
            log::info!("Task complete at step {}", step);
            self.session.succeed();
            self.outcome = Some(TaskOutcome::Succeeded {
                result: result.clone(),
                steps: step,
            });
            return true;
        }

        if self.session.budget_spent() {
            log::warn!("Step budget of {} exhausted", self.session.max_steps);
            self.session.fail();
            self.outcome = Some(TaskOutcome::Failed {
                reason: FailureReason::BudgetExhausted,
                steps: step,
            });
            return true;
        }

        self.session.advance();
        false
    }

    fn record(&self, write: impl FnOnce(&TraceWriter) -> Result<()>) {
        if let Some(trace) = &self.trace {
            if let Err(e) = write(trace) {
                log::warn!("Debug trace not written: {}", e);
            }
        }
    }
}

impl Iterator for AgentRun<'_, '_> {
    type Item = Result<StepReport>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.session.is_running() {
            return None;
        }

        let step = self.session.current_step;
        if self.agent.stop.is_stopped() {
            log::warn!("Stop requested before step {}", step);
            self.session.fail();
            self.outcome = Some(TaskOutcome::Failed {
                reason: FailureReason::Cancelled,
                steps: step - 1,
            });
            return Some(Ok(StepReport::new(step, None, StepEvent::Cancelled, true)));
        }

        match self.step(step) {
            Ok(report) => Some(Ok(report)),
            Err(e) => {
                log::error!("Step {} aborted the run: {}", step, e);
                self.session.fail();
                Some(Err(e))
            }
        }
    }
}

fn settle(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::session::SessionStatus;
    use crate::browser::PageCapture;
    use crate::tools::{ActionKind, ActionOutcome};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    const PAGE: &str = "<html><body>\
        <h1>Search</h1>\
        <input data-m2w-id='50' data-m2w-visible='true' placeholder='Query'>\
        <button data-m2w-id='51' data-m2w-visible='true'>Go</button>\
        </body></html>";

    #[derive(Default)]
    struct RecordingDriver {
        navigated: Vec<String>,
        captures: usize,
        scrolls: Vec<ScrollDirection>,
        executed: Vec<ElementAction>,
        execute_failure: Option<ActionFailure>,
        broken_capture: bool,
        broken_scroll: bool,
    }

    impl PageDriver for RecordingDriver {
        fn navigate(&mut self, url: &str) -> Result<()> {
            self.navigated.push(url.to_string());
            Ok(())
        }

        fn capture(&mut self) -> Result<PageCapture> {
            if self.broken_capture {
                return Err(AgentError::ScreenshotFailed("tab crashed".to_string()));
            }
            self.captures += 1;
            Ok(PageCapture {
                screenshot: DynamicImage::new_rgb8(256, 128),
                html: PAGE.to_string(),
                max_id: 51,
            })
        }

        fn scroll(&mut self, direction: ScrollDirection) -> Result<()> {
            self.scrolls.push(direction);
            if self.broken_scroll {
                return Err(AgentError::EvaluationFailed("scroll blocked".to_string()));
            }
            Ok(())
        }

        fn execute(&mut self, action: &ElementAction) -> ActionOutcome {
            self.executed.push(action.clone());
            match &self.execute_failure {
                Some(failure) => Err(failure.clone()),
                None => Ok(()),
            }
        }

        fn current_url(&self) -> Result<String> {
            Ok(self.navigated.last().cloned().unwrap_or_default())
        }
    }

    /// Replays canned outputs, repeating the last one when the script runs out
    struct ScriptedModel {
        outputs: RefCell<VecDeque<String>>,
        last: RefCell<String>,
        calls: Cell<usize>,
        prompts: RefCell<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(outputs: &[&str]) -> Self {
            Self {
                outputs: RefCell::new(outputs.iter().map(|o| o.to_string()).collect()),
                last: RefCell::new(String::new()),
                calls: Cell::new(0),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl ActionModel for ScriptedModel {
        fn predict(&self, image: &DynamicImage, prompt: &str) -> Result<String> {
            assert_eq!(image.width(), 1024);
            self.calls.set(self.calls.get() + 1);
            self.prompts.borrow_mut().push(prompt.to_string());
            if let Some(next) = self.outputs.borrow_mut().pop_front() {
                *self.last.borrow_mut() = next;
            }
            Ok(self.last.borrow().clone())
        }
    }

    fn config(max_steps: u32) -> AgentConfig {
        AgentConfig::new().max_steps(max_steps).without_settling()
    }

    fn run(driver: &mut RecordingDriver, model: &ScriptedModel, max_steps: u32) -> Result<TaskOutcome> {
        Agent::new(driver, model, config(max_steps)).run_task("Search for X", "example.com")
    }

    #[test]
    fn test_hallucinated_id_touches_nothing() {
        let mut driver = RecordingDriver::default();
        let model = ScriptedModel::new(&[r#"{"action": "click", "element_id": "999"}"#]);

        let outcome = run(&mut driver, &model, 1).unwrap();

        assert_eq!(
            outcome,
            TaskOutcome::Failed {
                reason: FailureReason::BudgetExhausted,
                steps: 1
            }
        );
        assert!(driver.executed.is_empty());
        assert!(driver.scrolls.is_empty());
    }

    #[test]
    fn test_sentinel_scrolls_once() {
        let mut driver = RecordingDriver::default();
        let model = ScriptedModel::new(&[r#"{"action": "click", "element_id": "0"}"#]);

        run(&mut driver, &model, 1).unwrap();

        assert_eq!(driver.scrolls, vec![ScrollDirection::Down]);
        assert!(driver.executed.is_empty());
    }

    #[test]
    fn test_explicit_scroll_ignores_id() {
        let mut driver = RecordingDriver::default();
        let model = ScriptedModel::new(&[r#"{"action": "scroll", "element_id": "50"}"#]);

        run(&mut driver, &model, 1).unwrap();

        assert_eq!(driver.scrolls, vec![ScrollDirection::Down]);
        assert!(driver.executed.is_empty());
    }

    #[test]
    fn test_listed_element_is_executed() {
        let mut driver = RecordingDriver::default();
        let model = ScriptedModel::new(&[r#"{"action": "type", "element_id": "50", "value": "X"}"#]);

        run(&mut driver, &model, 1).unwrap();

        assert_eq!(
            driver.executed,
            vec![ElementAction::new(ActionKind::Type, "50").with_value("X")]
        );
        assert!(driver.scrolls.is_empty());
    }

    #[test]
    fn test_finish_stops_after_one_inference() {
        let mut driver = RecordingDriver::default();
        let model = ScriptedModel::new(&[r#"{"action": "finish", "element_id": "0", "value": "Done", "is_finished": true}"#]);

        let outcome = run(&mut driver, &model, 5).unwrap();

        assert_eq!(
            outcome,
            TaskOutcome::Succeeded {
                result: Some("Done".to_string()),
                steps: 1
            }
        );
        assert_eq!(model.calls.get(), 1);
        assert_eq!(driver.captures, 1);
        assert!(driver.scrolls.is_empty());
    }

    #[test]
    fn test_unparsable_output_leaves_browser_alone() {
        let mut driver = RecordingDriver::default();
        let model = ScriptedModel::new(&["garbage, not json"]);

        let outcome = run(&mut driver, &model, 2).unwrap();

        assert_eq!(outcome.steps(), 2);
        assert!(!outcome.is_success());
        assert_eq!(driver.captures, 2);
        assert!(driver.scrolls.is_empty());
        assert!(driver.executed.is_empty());
    }

    #[test]
    fn test_multi_step_task() {
        let mut driver = RecordingDriver::default();
        let model = ScriptedModel::new(&[
            r#"{"action": "type", "element_id": "50", "value": "X"}"#,
            "```json\n{\"action\": \"click\", \"element_id\": \"51\"}\n```",
            r#"{"action": "finish", "is_finished": true}"#,
        ]);

        let outcome = run(&mut driver, &model, 5).unwrap();

        assert_eq!(outcome, TaskOutcome::Succeeded { result: None, steps: 3 });
        assert_eq!(driver.executed.len(), 2);
        assert_eq!(driver.executed[1], ElementAction::new(ActionKind::Click, "51"));
        assert_eq!(driver.navigated, vec!["https://example.com".to_string()]);
    }

    #[test]
    fn test_failed_action_consumes_a_step() {
        let mut driver = RecordingDriver {
            execute_failure: Some(ActionFailure::NotInteractable("covered by overlay".to_string())),
            ..Default::default()
        };
        let model = ScriptedModel::new(&[
            r#"{"action": "click", "element_id": "51"}"#,
            r#"{"is_finished": true}"#,
        ]);

        let outcome = run(&mut driver, &model, 5).unwrap();

        assert_eq!(outcome.steps(), 2);
        assert!(outcome.is_success());
        assert_eq!(driver.executed.len(), 1);
    }

    #[test]
    fn test_failed_scroll_consumes_a_step() {
        let mut driver = RecordingDriver {
            broken_scroll: true,
            ..Default::default()
        };
        let model = ScriptedModel::new(&[
            r#"{"action": "click", "element_id": "0"}"#,
            r#"{"is_finished": true}"#,
        ]);
        let (reports, outcome) = {
            let mut agent = Agent::new(&mut driver, &model, config(5));
            let mut run = agent.start("Search for X", "example.com").unwrap();
            let reports: Vec<StepReport> = run.by_ref().collect::<Result<_>>().unwrap();
            (reports, run.into_outcome())
        };

        assert_eq!(reports.len(), 2);
        assert_eq!(
            reports[0].event,
            StepEvent::ScrollFailed("Script evaluation failed: scroll blocked".to_string())
        );
        assert_eq!(reports[0].log, "Scroll failed: Script evaluation failed: scroll blocked");
        assert!(!reports[0].done);
        assert!(reports[1].done);
        assert_eq!(outcome, Some(TaskOutcome::Succeeded { result: None, steps: 2 }));
        assert_eq!(driver.scrolls, vec![ScrollDirection::Down]);
        assert!(driver.executed.is_empty());
    }

    #[test]
    fn test_prompt_carries_goal_and_listing() {
        let mut driver = RecordingDriver::default();
        let model = ScriptedModel::new(&[r#"{"is_finished": true}"#]);

        run(&mut driver, &model, 1).unwrap();

        let prompts = model.prompts.borrow();
        assert!(prompts[0].contains("TASK: Search for X"));
        assert!(prompts[0].contains("[0] <option> Target element is not in this list"));
        assert!(prompts[0].contains("[-] <h1> Search"));
        assert!(prompts[0].contains("[51] <button> Go"));
    }

    #[test]
    fn test_stop_before_first_step() {
        let mut driver = RecordingDriver::default();
        let model = ScriptedModel::new(&[r#"{"action": "click", "element_id": "51"}"#]);
        let stop = StopSignal::new();
        stop.stop();

        let outcome = Agent::new(&mut driver, &model, config(5))
            .with_stop_signal(stop)
            .run_task("Search for X", "example.com")
            .unwrap();

        assert_eq!(
            outcome,
            TaskOutcome::Failed {
                reason: FailureReason::Cancelled,
                steps: 0
            }
        );
        assert_eq!(model.calls.get(), 0);
        assert_eq!(driver.captures, 0);
    }

    #[test]
    fn test_stop_between_steps() {
        let mut driver = RecordingDriver::default();
        let model = ScriptedModel::new(&[r#"{"action": "click", "element_id": "51"}"#]);
        let mut agent = Agent::new(&mut driver, &model, config(5));
        let stop = agent.stop_signal();

        let mut run = agent.start("Search for X", "example.com").unwrap();
        let first = run.next().unwrap().unwrap();
        assert!(!first.done);
        assert!(first.screenshot.is_some());

        stop.stop();
        let second = run.next().unwrap().unwrap();
        assert_eq!(second.event, StepEvent::Cancelled);
        assert!(second.done);
        assert!(second.screenshot.is_none());
        assert!(run.next().is_none());
        assert_eq!(run.session().status, SessionStatus::Failed);
        assert_eq!(
            run.outcome(),
            Some(&TaskOutcome::Failed {
                reason: FailureReason::Cancelled,
                steps: 1
            })
        );
    }

    #[test]
    fn test_reports_carry_normalized_view() {
        let mut driver = RecordingDriver::default();
        let model = ScriptedModel::new(&[
            r#"{"action": "click", "element_id": "999"}"#,
            r#"{"is_finished": true, "value": "ok"}"#,
        ]);
        let mut agent = Agent::new(&mut driver, &model, config(5));

        let reports: Vec<StepReport> = agent
            .start("Search for X", "example.com")
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(reports.len(), 2);
        let view = reports[0].screenshot.as_ref().unwrap();
        assert_eq!((view.width(), view.height()), (1024, 512));
        assert_eq!(
            reports[0].event,
            StepEvent::Hallucinated {
                element_id: "999".to_string()
            }
        );
        assert!(!reports[0].done);
        assert_eq!(reports[1].log, "Task complete: ok");
        assert!(reports[1].done);
    }

    #[test]
    fn test_capture_failure_is_fatal() {
        let mut driver = RecordingDriver {
            broken_capture: true,
            ..Default::default()
        };
        let model = ScriptedModel::new(&[r#"{"is_finished": true}"#]);

        let result = run(&mut driver, &model, 5);

        assert!(matches!(result, Err(AgentError::ScreenshotFailed(_))));
        assert_eq!(model.calls.get(), 0);
    }

    #[test]
    fn test_zero_budget() {
        let mut driver = RecordingDriver::default();
        let model = ScriptedModel::new(&[r#"{"is_finished": true}"#]);

        let outcome = run(&mut driver, &model, 0).unwrap();

        assert_eq!(outcome.steps(), 0);
        assert_eq!(driver.captures, 0);
    }

    #[test]
    fn test_trace_written_per_step() {
        let base = tempfile::tempdir().unwrap();
        let mut driver = RecordingDriver::default();
        let model = ScriptedModel::new(&[r#"{"action": "click", "element_id": "0"}"#]);
        let mut agent = Agent::new(&mut driver, &model, config(2).trace_dir(base.path()));

        let mut run = agent.start("Search for X", "example.com").unwrap();
        let trace_dir = run.trace_dir().unwrap().to_path_buf();
        while let Some(report) = run.next() {
            report.unwrap();
        }

        for step in 1..=2 {
            assert!(trace_dir.join(format!("step_{}_view.png", step)).exists());
            assert!(trace_dir.join(format!("step_{}_dom.txt", step)).exists());
        }
        let output = std::fs::read_to_string(trace_dir.join("step_2_output.txt")).unwrap();
        assert_eq!(output, r#"{"action": "click", "element_id": "0"}"#);
    }

    #[test]
    fn test_event_log_lines() {
        let typed = StepEvent::Executed(ElementAction::new(ActionKind::Type, "50").with_value("X"));
        assert_eq!(typed.to_string(), "type [50] 'X'");

        let failed = StepEvent::ActionFailed {
            action: ElementAction::new(ActionKind::Click, "7"),
            failure: ActionFailure::ElementNotFound("7".to_string()),
        };
        assert_eq!(failed.to_string(), "click [7] failed: element 7 not found");
    }
}
