//! Scripted test plans
//!
//! A plan file describes fixtures and their tests as data, each test being a
//! short script of steps with a fixed outcome. Plans are how the command
//! line tool gets something to run.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::builder::NamespaceTreeBuilder;
use crate::executor::TestContext;
use crate::models::{RunEligibility, TestAction, TestCase, TestError, TestNode, TestSuite};

/// Errors raised while loading or building a plan
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Failed to read plan file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML plan: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON plan: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid plan: {0}")]
    Invalid(String),
}

/// What a scripted step does when invoked
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    #[default]
    Pass,
    Fail,
    Error,
    Ignore,
    Inconclusive,
    Cancel,
    Panic,
}

/// One scripted step: optional output followed by an outcome
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub outcome: StepAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Text written to the test's standard output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Text written to the test's error output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_output: Option<String>,
}

impl Step {
    pub fn new(outcome: StepAction) -> Self {
        Self {
            outcome,
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    fn message_or(&self, default: &str) -> String {
        self.message.clone().unwrap_or_else(|| default.to_string())
    }

    /// Run the step against a test context
    pub fn invoke(&self, ctx: &mut TestContext<'_>) -> Result<(), TestError> {
        if let Some(text) = &self.output {
            ctx.write_out(text);
        }
        if let Some(text) = &self.error_output {
            ctx.write_err(text);
        }

        match self.outcome {
            StepAction::Pass => Ok(()),
            StepAction::Fail => Err(TestError::failure(self.message_or("step failed"))),
            StepAction::Error => Err(anyhow::anyhow!(self.message_or("step raised an error")).into()),
            StepAction::Ignore => Err(TestError::ignore(self.message_or("ignored"))),
            StepAction::Inconclusive => {
                Err(TestError::inconclusive(self.message_or("inconclusive")))
            }
            StepAction::Cancel => Err(TestError::cancelled(self.message_or("cancelled"))),
            StepAction::Panic => panic!("{}", self.message_or("step panicked")),
        }
    }
}

fn action<F>(f: F) -> TestAction
where
    F: Fn(&mut TestContext<'_>) -> Result<(), TestError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A script of steps run in order until one does not pass
fn script(steps: Vec<Step>) -> TestAction {
    action(move |ctx| {
        for step in &steps {
            step.invoke(ctx)?;
        }
        Ok(())
    })
}

/// Single step script
fn single(step: Step) -> TestAction {
    script(vec![step])
}

/// A test case, or a parameterized method when it lists cases
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CasePlan {
    pub name: String,

    #[serde(default)]
    pub state: RunEligibility,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Steps of the test body; an empty script passes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,

    /// Generated cases of a parameterized method
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cases: Vec<CasePlan>,
}

impl CasePlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_state(mut self, state: RunEligibility, reason: Option<String>) -> Self {
        self.state = state;
        self.reason = reason;
        self
    }

    fn build(&self) -> TestNode {
        if self.cases.is_empty() {
            let body = script(self.steps.clone());
            let case = TestCase::new(self.name.clone(), move |ctx| body(ctx))
                .with_run_state(self.state, self.reason.clone());
            return case.into();
        }

        let mut method =
            TestSuite::parameterized(self.name.clone()).with_run_state(self.state, self.reason.clone());
        for case in &self.cases {
            method.add(case.build());
        }
        method.into()
    }

    fn validate(&self, fixture: &str) -> Result<(), PlanError> {
        if self.name.trim().is_empty() {
            return Err(PlanError::Invalid(format!(
                "Test with empty name in fixture '{fixture}'"
            )));
        }
        if !self.cases.is_empty() && !self.steps.is_empty() {
            return Err(PlanError::Invalid(format!(
                "Parameterized test '{}' in '{fixture}' cannot have its own steps",
                self.name
            )));
        }
        self.cases.iter().try_for_each(|c| c.validate(fixture))
    }
}

/// Kind of a planned fixture
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureKind {
    #[default]
    Fixture,
    /// Stands in for the namespace it is declared in
    SetupFixture,
}

/// A fixture with its setup, teardown and tests
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FixturePlan {
    /// Namespace-qualified name, e.g. `Billing.Invoices.TaxTests`
    pub name: String,

    #[serde(default)]
    pub kind: FixtureKind,

    #[serde(default)]
    pub state: RunEligibility,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Run tests in declaration order even when sorting
    #[serde(default)]
    pub maintain_order: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_time_setup: Vec<Step>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_time_teardown: Vec<Step>,

    /// Run before every test of the fixture
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub setup: Vec<Step>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub teardown: Vec<Step>,

    #[serde(default)]
    pub tests: Vec<CasePlan>,
}

impl FixturePlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_test(mut self, test: CasePlan) -> Self {
        self.tests.push(test);
        self
    }

    fn build(&self) -> TestSuite {
        let mut suite = match self.kind {
            FixtureKind::Fixture => TestSuite::fixture(self.name.clone()),
            FixtureKind::SetupFixture => TestSuite::setup_fixture(self.name.clone()),
        }
        .with_run_state(self.state, self.reason.clone());
        suite.maintain_order = self.maintain_order;

        for step in &self.one_time_setup {
            suite.push_one_time_setup(single(step.clone()));
        }
        for step in &self.one_time_teardown {
            suite.push_one_time_teardown(single(step.clone()));
        }
        for step in &self.setup {
            suite.push_setup(single(step.clone()));
        }
        for step in &self.teardown {
            suite.push_teardown(single(step.clone()));
        }
        for test in &self.tests {
            suite.add(test.build());
        }
        suite
    }

    fn validate(&self) -> Result<(), PlanError> {
        if self.name.trim().is_empty() {
            return Err(PlanError::Invalid("Fixture with empty name".to_string()));
        }
        if self.kind == FixtureKind::SetupFixture && !self.tests.is_empty() {
            return Err(PlanError::Invalid(format!(
                "Setup fixture '{}' cannot contain tests",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for test in &self.tests {
            test.validate(&self.name)?;
            if !seen.insert(test.name.as_str()) {
                return Err(PlanError::Invalid(format!(
                    "Duplicate test '{}' in fixture '{}'",
                    test.name, self.name
                )));
            }
        }
        Ok(())
    }
}

/// A whole plan: the root name and a flat list of fixtures
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestPlan {
    /// Name of the root suite
    #[serde(default = "default_plan_name")]
    pub name: String,

    #[serde(default)]
    pub fixtures: Vec<FixturePlan>,
}

fn default_plan_name() -> String {
    "plan".to_string()
}

impl Default for TestPlan {
    fn default() -> Self {
        Self {
            name: default_plan_name(),
            fixtures: Vec::new(),
        }
    }
}

impl TestPlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixtures: Vec::new(),
        }
    }

    pub fn with_fixture(mut self, fixture: FixturePlan) -> Self {
        self.fixtures.push(fixture);
        self
    }

    /// Load a plan file; `.yaml`/`.yml` files are YAML, anything else JSON
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let plan = if crate::config::is_yaml_file(path) {
            Self::from_yaml(&content)?
        } else {
            Self::from_json(&content)?
        };
        debug!("Loaded plan '{}' from {}", plan.name, path.display());
        Ok(plan)
    }

    pub fn from_yaml(content: &str) -> Result<Self, PlanError> {
        let plan: Self = serde_yaml::from_str(content)?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn from_json(content: &str) -> Result<Self, PlanError> {
        let plan: Self = serde_json::from_str(content)?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if self.name.trim().is_empty() {
            return Err(PlanError::Invalid("Plan name is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for fixture in &self.fixtures {
            fixture.validate()?;
            if !seen.insert(fixture.name.as_str()) {
                return Err(PlanError::Invalid(format!(
                    "Duplicate fixture '{}'",
                    fixture.name
                )));
            }
        }
        Ok(())
    }

    /// Build the suite tree, fixtures nested by namespace
    pub fn build(&self) -> Result<TestSuite, PlanError> {
        self.validate()?;
        let mut builder = NamespaceTreeBuilder::new(TestSuite::root(self.name.clone()));
        builder.add_all(self.fixtures.iter().map(FixturePlan::build));
        Ok(builder.into_root())
    }

    /// Number of test cases the plan declares
    pub fn test_count(&self) -> usize {
        fn count(test: &CasePlan) -> usize {
            if test.cases.is_empty() {
                1
            } else {
                test.cases.iter().map(count).sum()
            }
        }
        self.fixtures
            .iter()
            .flat_map(|f| f.tests.iter())
            .map(count)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingListener;
    use crate::executor::TestAssemblyRunner;
    use crate::models::{Outcome, ResultStatus, SuiteKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
name: billing
fixtures:
  - name: Billing.Setup
    kind: setup_fixture
    one_time_setup:
      - output: "connecting"
  - name: Billing.Invoices.TaxTests
    setup:
      - outcome: pass
    tests:
      - name: AddsVat
        steps:
          - output: "vat=20%"
      - name: RoundsDown
        steps:
          - outcome: fail
            message: "expected 10.00 but was 10.01"
      - name: Rates
        cases:
          - name: Rates(0.2)
          - name: Rates(0.05)
            state: ignored
            reason: "reduced rate pending"
  - name: Billing.Refunds
    state: skipped
    reason: "service offline"
    tests:
      - name: Refunds
"#;

    #[test]
    fn test_parse_yaml() {
        let plan = TestPlan::from_yaml(SAMPLE).unwrap();
        assert_eq!(plan.name, "billing");
        assert_eq!(plan.fixtures.len(), 3);
        assert_eq!(plan.fixtures[0].kind, FixtureKind::SetupFixture);
        assert_eq!(plan.fixtures[1].tests[1].steps[0].outcome, StepAction::Fail);
        assert_eq!(plan.fixtures[2].state, RunEligibility::Skipped);
        assert_eq!(plan.test_count(), 5);
    }

    #[test]
    fn test_build_tree() {
        let root = TestPlan::from_yaml(SAMPLE).unwrap().build().unwrap();

        let billing = root.find("Billing").and_then(TestNode::as_suite).unwrap();
        assert_eq!(billing.kind, SuiteKind::SetUpFixture);
        assert_eq!(billing.one_time_setup().len(), 1);

        let rates = root
            .find("Billing.Invoices.TaxTests.Rates")
            .and_then(TestNode::as_suite)
            .unwrap();
        assert_eq!(rates.kind, SuiteKind::ParameterizedMethod);
        assert!(root.find("Billing.Invoices.TaxTests.Rates.Rates(0.05)").is_some());
        assert_eq!(root.test_case_count(), 5);
    }

    #[test]
    fn test_run_plan() {
        let root = TestPlan::from_yaml(SAMPLE).unwrap().build().unwrap();
        let mut runner = TestAssemblyRunner::new();
        runner.load(root);

        let recorder = Arc::new(RecordingListener::new());
        let result = runner.run(recorder.clone()).unwrap();

        let status = |name: &str| result.find(name).map(|r| r.status);
        assert_eq!(status("Billing.Invoices.TaxTests.AddsVat"), Some(ResultStatus::Success));
        assert_eq!(status("Billing.Invoices.TaxTests.RoundsDown"), Some(ResultStatus::Failure));
        assert_eq!(
            status("Billing.Invoices.TaxTests.Rates.Rates(0.05)"),
            Some(ResultStatus::Ignored)
        );
        assert_eq!(status("Billing.Refunds.Refunds"), Some(ResultStatus::Skipped));

        let texts: Vec<String> = recorder.output().into_iter().map(|o| o.text).collect();
        assert_eq!(texts, vec!["connecting", "vat=20%"]);
    }

    #[test]
    fn test_step_outcomes() {
        let recorder = Arc::new(RecordingListener::new());
        let mut ctx = TestContext::new("Steps", recorder, None);

        fn outcome(step: Step, ctx: &mut TestContext<'_>) -> Outcome {
            step.invoke(ctx).unwrap_err().outcome()
        }

        assert!(Step::new(StepAction::Pass).invoke(&mut ctx).is_ok());
        assert_eq!(outcome(Step::new(StepAction::Fail), &mut ctx).status, ResultStatus::Failure);
        assert_eq!(outcome(Step::new(StepAction::Error), &mut ctx).status, ResultStatus::Error);
        assert_eq!(
            outcome(Step::new(StepAction::Cancel).with_message("stop"), &mut ctx).message,
            "stop"
        );
        assert_eq!(
            outcome(Step::new(StepAction::Inconclusive), &mut ctx).status,
            ResultStatus::Inconclusive
        );
    }

    #[test]
    fn test_builder_plan_runs() {
        let plan = TestPlan::new("built").with_fixture(
            FixturePlan::new("Shop.Cart")
                .with_test(
                    CasePlan::new("Adds")
                        .with_step(Step::new(StepAction::Pass).with_output("added 1 item")),
                )
                .with_test(
                    CasePlan::new("Later")
                        .with_state(RunEligibility::Ignored, Some("needs stock".to_string())),
                ),
        );

        let mut runner = TestAssemblyRunner::new();
        runner.load(plan.build().unwrap());
        let recorder = Arc::new(RecordingListener::new());
        let result = runner.run(recorder.clone()).unwrap();

        let later = result.find("Shop.Cart.Later").unwrap();
        assert_eq!(later.status, ResultStatus::Ignored);
        assert_eq!(later.message.as_deref(), Some("needs stock"));
        assert_eq!(recorder.output()[0].text, "added 1 item");
    }

    #[test]
    fn test_validation_errors() {
        let duplicate = TestPlan::new("dup")
            .with_fixture(FixturePlan::new("A.One"))
            .with_fixture(FixturePlan::new("A.One"));
        assert!(matches!(duplicate.validate(), Err(PlanError::Invalid(_))));

        let mut setup = FixturePlan::new("A.Setup").with_test(CasePlan::new("Nope"));
        setup.kind = FixtureKind::SetupFixture;
        assert!(TestPlan::new("bad").with_fixture(setup).validate().is_err());

        let twice = FixturePlan::new("A.Twice")
            .with_test(CasePlan::new("Same"))
            .with_test(CasePlan::new("Same"));
        assert!(TestPlan::new("bad").with_fixture(twice).build().is_err());
    }

    #[test]
    fn test_load_json_file() {
        let plan = TestPlan::new("json-plan").with_fixture(
            FixturePlan::new("Json.Fixture")
                .with_test(CasePlan::new("Works").with_step(Step::new(StepAction::Pass))),
        );

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string_pretty(&plan).unwrap().as_bytes())
            .unwrap();

        let loaded = TestPlan::load(file.path()).unwrap();
        assert_eq!(loaded, plan);
    }

    #[test]
    fn test_load_missing_file() {
        let err = TestPlan::load("/nonexistent/plan.yaml").unwrap_err();
        assert!(matches!(err, PlanError::Read { .. }));
    }
}
