//! Test node tree
//!
//! Defines test cases, suites and the run eligibility that decides whether
//! a node is executed.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::TestError;
use crate::executor::TestContext;

/// Invocable body of a test case or a setup/teardown step
pub type TestAction = Arc<dyn Fn(&mut TestContext<'_>) -> Result<(), TestError> + Send + Sync>;

/// Owned fixture instance shared by the tests of a suite
pub type FixtureInstance = Box<dyn Any + Send>;

/// Creates the fixture instance when a suite starts
pub type FixtureFactory = Arc<dyn Fn() -> Result<FixtureInstance, TestError> + Send + Sync>;

/// Process-unique identity of a test node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestId(u64);

impl TestId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        TestId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a node's body is executed during a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEligibility {
    #[default]
    Runnable,
    /// Runs only when selected directly, never through a parent's enumeration
    Explicit,
    Skipped,
    Ignored,
    NotRunnable,
}

impl RunEligibility {
    /// True for states whose body is executed when reached
    pub fn is_runnable(self) -> bool {
        matches!(self, RunEligibility::Runnable | RunEligibility::Explicit)
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "runnable" => Some(RunEligibility::Runnable),
            "explicit" => Some(RunEligibility::Explicit),
            "skipped" | "skip" => Some(RunEligibility::Skipped),
            "ignored" | "ignore" => Some(RunEligibility::Ignored),
            "notrunnable" => Some(RunEligibility::NotRunnable),
            _ => None,
        }
    }
}

impl fmt::Display for RunEligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEligibility::Runnable => write!(f, "Runnable"),
            RunEligibility::Explicit => write!(f, "Explicit"),
            RunEligibility::Skipped => write!(f, "Skipped"),
            RunEligibility::Ignored => write!(f, "Ignored"),
            RunEligibility::NotRunnable => write!(f, "NotRunnable"),
        }
    }
}

/// Eligibility of a node as seen from its position in the tree during a run.
///
/// A runnable node below a suite that is not runnable takes over the
/// suite's state and reason. Nothing in the tree is mutated to get there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectiveEligibility {
    pub state: RunEligibility,
    pub reason: Option<String>,
}

impl EffectiveEligibility {
    pub fn resolve(info: &TestInfo, parent: Option<&EffectiveEligibility>) -> Self {
        match parent {
            Some(parent)
                if info.run_state == RunEligibility::Runnable && !parent.state.is_runnable() =>
            {
                parent.clone()
            }
            _ => Self {
                state: info.run_state,
                reason: info.ignore_reason.clone(),
            },
        }
    }

    pub fn is_runnable(&self) -> bool {
        self.state.is_runnable()
    }
}

/// Kinds of composite nodes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteKind {
    /// Top of a tree handed to the runner
    Root,
    /// Generated for one dotted namespace segment
    Namespace,
    /// Groups the tests of one fixture
    Fixture,
    /// Wraps a whole namespace with one-time setup and teardown
    SetUpFixture,
    /// Groups the generated cases of one parameterized test
    ParameterizedMethod,
}

impl SuiteKind {
    pub fn name(&self) -> &'static str {
        match self {
            SuiteKind::Root => "Root",
            SuiteKind::Namespace => "Namespace",
            SuiteKind::Fixture => "Fixture",
            SuiteKind::SetUpFixture => "SetUpFixture",
            SuiteKind::ParameterizedMethod => "ParameterizedMethod",
        }
    }
}

/// Identity and eligibility shared by cases and suites
#[derive(Clone, Debug)]
pub struct TestInfo {
    id: TestId,
    pub name: String,
    pub full_name: String,
    pub run_state: RunEligibility,
    pub ignore_reason: Option<String>,
    parent: Option<TestId>,
}

impl TestInfo {
    pub fn new(name: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: TestId::next(),
            name: name.into(),
            full_name: full_name.into(),
            run_state: RunEligibility::Runnable,
            ignore_reason: None,
            parent: None,
        }
    }

    pub fn id(&self) -> TestId {
        self.id
    }

    /// Id of the containing suite, if the node has been added to one
    pub fn parent(&self) -> Option<TestId> {
        self.parent
    }

    pub fn set_run_state(&mut self, state: RunEligibility, reason: Option<String>) {
        self.run_state = state;
        self.ignore_reason = reason;
    }
}

/// Snapshot of a node, detached from the tree so it can cross threads
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TestDescriptor {
    pub id: TestId,
    pub parent: Option<TestId>,
    pub name: String,
    pub full_name: String,
    pub is_suite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suite_kind: Option<SuiteKind>,
    pub run_state: RunEligibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_reason: Option<String>,
    pub test_case_count: usize,
}

impl fmt::Display for TestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name)
    }
}

/// A single test case
pub struct TestCase {
    pub info: TestInfo,
    action: TestAction,
}

impl TestCase {
    pub fn new<F>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut TestContext<'_>) -> Result<(), TestError> + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            info: TestInfo::new(name.clone(), name),
            action: Arc::new(action),
        }
    }

    pub fn with_run_state(mut self, state: RunEligibility, reason: Option<String>) -> Self {
        self.info.set_run_state(state, reason);
        self
    }

    pub fn action(&self) -> &TestAction {
        &self.action
    }

    pub fn descriptor(&self) -> TestDescriptor {
        TestDescriptor {
            id: self.info.id,
            parent: self.info.parent,
            name: self.info.name.clone(),
            full_name: self.info.full_name.clone(),
            is_suite: false,
            suite_kind: None,
            run_state: self.info.run_state,
            ignore_reason: self.info.ignore_reason.clone(),
            test_case_count: 1,
        }
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase").field("info", &self.info).finish()
    }
}

/// A composite node owning an ordered list of children
pub struct TestSuite {
    pub info: TestInfo,
    pub kind: SuiteKind,
    /// Keeps insertion order when the tree is sorted
    pub maintain_order: bool,
    /// Name the suite was created with; survives [`TestSuite::rename`]
    fixture_name: String,
    children: Vec<TestNode>,
    fixture: Option<FixtureFactory>,
    one_time_setup: Vec<TestAction>,
    one_time_teardown: Vec<TestAction>,
    setup: Vec<TestAction>,
    teardown: Vec<TestAction>,
}

impl TestSuite {
    fn with_kind(kind: SuiteKind, name: impl Into<String>, full_name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            fixture_name: name.clone(),
            info: TestInfo::new(name, full_name),
            kind,
            maintain_order: false,
            children: Vec::new(),
            fixture: None,
            one_time_setup: Vec::new(),
            one_time_teardown: Vec::new(),
            setup: Vec::new(),
            teardown: Vec::new(),
        }
    }

    /// Create the root suite of a tree
    pub fn root(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_kind(SuiteKind::Root, name.clone(), name)
    }

    /// Create the suite for `name` inside namespace `parent_namespace`
    pub fn namespace(parent_namespace: &str, name: &str) -> Self {
        let full_name = if parent_namespace.is_empty() {
            name.to_string()
        } else {
            format!("{parent_namespace}.{name}")
        };
        Self::with_kind(SuiteKind::Namespace, name, full_name)
    }

    /// Create a fixture suite from its namespace-qualified name
    pub fn fixture(full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        let name = simple_name(&full_name).to_string();
        Self::with_kind(SuiteKind::Fixture, name, full_name)
    }

    /// Create a setup fixture; it replaces the namespace suite it lives in
    pub fn setup_fixture(full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        let name = simple_name(&full_name).to_string();
        Self::with_kind(SuiteKind::SetUpFixture, name, full_name)
    }

    /// Create the suite holding the generated cases of a parameterized test
    pub fn parameterized(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_kind(SuiteKind::ParameterizedMethod, name.clone(), name)
    }

    pub fn with_run_state(mut self, state: RunEligibility, reason: Option<String>) -> Self {
        self.info.set_run_state(state, reason);
        self
    }

    pub fn with_maintain_order(mut self) -> Self {
        self.maintain_order = true;
        self
    }

    pub fn with_fixture<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<FixtureInstance, TestError> + Send + Sync + 'static,
    {
        self.fixture = Some(Arc::new(factory));
        self
    }

    pub fn with_one_time_setup<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut TestContext<'_>) -> Result<(), TestError> + Send + Sync + 'static,
    {
        self.one_time_setup.push(Arc::new(action));
        self
    }

    pub fn with_one_time_teardown<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut TestContext<'_>) -> Result<(), TestError> + Send + Sync + 'static,
    {
        self.one_time_teardown.push(Arc::new(action));
        self
    }

    pub fn with_setup<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut TestContext<'_>) -> Result<(), TestError> + Send + Sync + 'static,
    {
        self.setup.push(Arc::new(action));
        self
    }

    pub fn with_teardown<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut TestContext<'_>) -> Result<(), TestError> + Send + Sync + 'static,
    {
        self.teardown.push(Arc::new(action));
        self
    }

    pub fn push_one_time_setup(&mut self, action: TestAction) {
        self.one_time_setup.push(action);
    }

    pub fn push_one_time_teardown(&mut self, action: TestAction) {
        self.one_time_teardown.push(action);
    }

    pub fn push_setup(&mut self, action: TestAction) {
        self.setup.push(action);
    }

    pub fn push_teardown(&mut self, action: TestAction) {
        self.teardown.push(action);
    }

    /// Builder form of [`TestSuite::add`]
    pub fn with_child(mut self, child: impl Into<TestNode>) -> Self {
        self.add(child);
        self
    }

    /// Append a child. Cases and parameterized suites that carry only their
    /// simple name are qualified with this suite's full name.
    pub fn add(&mut self, child: impl Into<TestNode>) {
        let mut child = child.into();
        if self.kind != SuiteKind::Root && child.wants_qualified_name() {
            child.qualify(&self.info.full_name);
        }
        child.info_mut().parent = Some(self.info.id);
        self.children.push(child);
    }

    /// Replace the child with id `old` by `node` at the same position.
    /// Returns the removed child.
    pub fn replace_child(&mut self, old: TestId, node: impl Into<TestNode>) -> Option<TestNode> {
        let index = self.children.iter().position(|c| c.id() == old)?;
        let mut node = node.into();
        node.info_mut().parent = Some(self.info.id);
        Some(std::mem::replace(&mut self.children[index], node))
    }

    /// Remove and return all children
    pub fn take_children(&mut self) -> Vec<TestNode> {
        std::mem::take(&mut self.children)
    }

    /// Append children taken from another suite, keeping their names
    pub fn adopt(&mut self, children: Vec<TestNode>) {
        for mut child in children {
            child.info_mut().parent = Some(self.info.id);
            self.children.push(child);
        }
    }

    /// Take over the name of the suite this one stands in for
    pub fn rename(&mut self, name: impl Into<String>, full_name: impl Into<String>) {
        self.info.name = name.into();
        self.info.full_name = full_name.into();
    }

    /// The name given at creation. A setup fixture that replaced a
    /// namespace suite still reports its own name here.
    pub fn fixture_name(&self) -> &str {
        &self.fixture_name
    }

    pub fn children(&self) -> &[TestNode] {
        &self.children
    }

    pub fn fixture_factory(&self) -> Option<&FixtureFactory> {
        self.fixture.as_ref()
    }

    pub fn one_time_setup(&self) -> &[TestAction] {
        &self.one_time_setup
    }

    pub fn one_time_teardown(&self) -> &[TestAction] {
        &self.one_time_teardown
    }

    pub fn setup(&self) -> &[TestAction] {
        &self.setup
    }

    pub fn teardown(&self) -> &[TestAction] {
        &self.teardown
    }

    /// Number of test cases in this subtree
    pub fn test_case_count(&self) -> usize {
        self.children.iter().map(TestNode::test_case_count).sum()
    }

    /// Sort children by name, recursively. Suites that maintain their
    /// order are left alone together with everything below them.
    pub fn sort(&mut self) {
        if self.maintain_order {
            return;
        }
        self.children.sort_by(|a, b| a.name().cmp(b.name()));
        for child in &mut self.children {
            if let TestNode::Suite(suite) = child {
                suite.sort();
            }
        }
    }

    /// Find a node in this subtree by full name
    pub fn find(&self, full_name: &str) -> Option<&TestNode> {
        for child in &self.children {
            if child.full_name() == full_name {
                return Some(child);
            }
            if let TestNode::Suite(suite) = child {
                if let Some(found) = suite.find(full_name) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Ids of the nodes leading from this suite (exclusive) down to the node
    /// named `full_name` (inclusive)
    pub fn path_to(&self, full_name: &str) -> Option<Vec<TestId>> {
        for child in &self.children {
            if child.full_name() == full_name {
                return Some(vec![child.id()]);
            }
            if let TestNode::Suite(suite) = child {
                if let Some(mut path) = suite.path_to(full_name) {
                    path.insert(0, child.id());
                    return Some(path);
                }
            }
        }
        None
    }

    /// Find a suite in this subtree (including this one) by id
    pub fn find_suite(&self, id: TestId) -> Option<&TestSuite> {
        if self.info.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| match child {
            TestNode::Suite(suite) => suite.find_suite(id),
            TestNode::Case(_) => None,
        })
    }

    /// Mutable form of [`TestSuite::find_suite`]
    pub fn find_suite_mut(&mut self, id: TestId) -> Option<&mut TestSuite> {
        if self.info.id == id {
            return Some(self);
        }
        for child in &mut self.children {
            if let TestNode::Suite(suite) = child {
                if let Some(found) = suite.find_suite_mut(id) {
                    return Some(found);
                }
            }
        }
        None
    }

    pub fn descriptor(&self) -> TestDescriptor {
        TestDescriptor {
            id: self.info.id,
            parent: self.info.parent,
            name: self.info.name.clone(),
            full_name: self.info.full_name.clone(),
            is_suite: true,
            suite_kind: Some(self.kind),
            run_state: self.info.run_state,
            ignore_reason: self.info.ignore_reason.clone(),
            test_case_count: self.test_case_count(),
        }
    }
}

impl fmt::Debug for TestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSuite")
            .field("info", &self.info)
            .field("kind", &self.kind)
            .field("fixture_name", &self.fixture_name)
            .field("maintain_order", &self.maintain_order)
            .field("children", &self.children)
            .field("has_fixture", &self.fixture.is_some())
            .field("one_time_setup", &self.one_time_setup.len())
            .field("one_time_teardown", &self.one_time_teardown.len())
            .finish()
    }
}

/// A node of the test tree
#[derive(Debug)]
pub enum TestNode {
    Case(TestCase),
    Suite(TestSuite),
}

impl TestNode {
    pub fn info(&self) -> &TestInfo {
        match self {
            TestNode::Case(case) => &case.info,
            TestNode::Suite(suite) => &suite.info,
        }
    }

    pub fn info_mut(&mut self) -> &mut TestInfo {
        match self {
            TestNode::Case(case) => &mut case.info,
            TestNode::Suite(suite) => &mut suite.info,
        }
    }

    pub fn id(&self) -> TestId {
        self.info().id
    }

    pub fn name(&self) -> &str {
        &self.info().name
    }

    pub fn full_name(&self) -> &str {
        &self.info().full_name
    }

    pub fn is_suite(&self) -> bool {
        matches!(self, TestNode::Suite(_))
    }

    pub fn as_suite(&self) -> Option<&TestSuite> {
        match self {
            TestNode::Suite(suite) => Some(suite),
            TestNode::Case(_) => None,
        }
    }

    pub fn test_case_count(&self) -> usize {
        match self {
            TestNode::Case(_) => 1,
            TestNode::Suite(suite) => suite.test_case_count(),
        }
    }

    pub fn descriptor(&self) -> TestDescriptor {
        match self {
            TestNode::Suite(suite) => suite.descriptor(),
            TestNode::Case(case) => case.descriptor(),
        }
    }

    fn wants_qualified_name(&self) -> bool {
        let info = self.info();
        let qualifiable = match self {
            TestNode::Case(_) => true,
            TestNode::Suite(suite) => suite.kind == SuiteKind::ParameterizedMethod,
        };
        qualifiable && info.full_name == info.name
    }

    fn qualify(&mut self, prefix: &str) {
        let old = self.full_name().to_string();
        let new = format!("{prefix}.{}", self.name());
        self.reprefix(&old, &new);
    }

    fn reprefix(&mut self, old: &str, new: &str) {
        let info = self.info_mut();
        if info.full_name == old {
            info.full_name = new.to_string();
        } else if let Some(rest) = info.full_name.strip_prefix(&format!("{old}.")) {
            info.full_name = format!("{new}.{rest}");
        }
        if let TestNode::Suite(suite) = self {
            for child in &mut suite.children {
                child.reprefix(old, new);
            }
        }
    }
}

impl From<TestCase> for TestNode {
    fn from(case: TestCase) -> Self {
        TestNode::Case(case)
    }
}

impl From<TestSuite> for TestNode {
    fn from(suite: TestSuite) -> Self {
        TestNode::Suite(suite)
    }
}

/// Strip a trailing parameterization (`[...]` or `(...)`) from a full name
pub fn strip_parameters(full_name: &str) -> &str {
    match full_name.find(['[', '(']) {
        Some(index) => &full_name[..index],
        None => full_name,
    }
}

/// Last dotted segment of a full name, keeping any parameterization
fn simple_name(full_name: &str) -> &str {
    let base = strip_parameters(full_name);
    match base.rfind('.') {
        Some(index) => &full_name[index + 1..],
        None => full_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(name: &str) -> TestCase {
        TestCase::new(name, |_| Ok(()))
    }

    #[test]
    fn test_fixture_names() {
        let suite = TestSuite::fixture("Acme.Billing.InvoiceTests");
        assert_eq!(suite.info.name, "InvoiceTests");
        assert_eq!(suite.info.full_name, "Acme.Billing.InvoiceTests");

        let suite = TestSuite::fixture("Acme.Generic[System.Int32]");
        assert_eq!(suite.info.name, "Generic[System.Int32]");
    }

    #[test]
    fn test_add_qualifies_cases() {
        let suite = TestSuite::fixture("Acme.Tests").with_child(pass("Adds"));
        assert_eq!(suite.children()[0].full_name(), "Acme.Tests.Adds");
        assert_eq!(suite.children()[0].info().parent(), Some(suite.info.id()));
    }

    #[test]
    fn test_parameterized_suite_qualified_recursively() {
        let method = TestSuite::parameterized("Adds")
            .with_child(pass("Adds(1,2)"))
            .with_child(pass("Adds(3,4)"));
        let suite = TestSuite::fixture("Acme.Tests").with_child(method);

        let method = suite.children()[0].as_suite().unwrap();
        assert_eq!(method.info.full_name, "Acme.Tests.Adds");
        assert_eq!(method.children()[1].full_name(), "Acme.Tests.Adds.Adds(3,4)");
        assert!(suite.find("Acme.Tests.Adds.Adds(1,2)").is_some());
    }

    #[test]
    fn test_root_does_not_qualify() {
        let root = TestSuite::root("All").with_child(pass("Loose"));
        assert_eq!(root.children()[0].full_name(), "Loose");
    }

    #[test]
    fn test_case_count() {
        let suite = TestSuite::fixture("A.Fx")
            .with_child(pass("One"))
            .with_child(TestSuite::parameterized("P").with_child(pass("P(1)")));
        assert_eq!(suite.test_case_count(), 2);
        assert_eq!(suite.descriptor().test_case_count, 2);
    }

    #[test]
    fn test_sort_respects_maintain_order() {
        let ordered = TestSuite::fixture("A.Ordered")
            .with_maintain_order()
            .with_child(pass("Z"))
            .with_child(pass("A"));
        let mut root = TestSuite::root("root")
            .with_child(TestSuite::fixture("A.Zeta").with_child(pass("b")).with_child(pass("a")))
            .with_child(ordered);

        root.sort();

        let names: Vec<_> = root.children().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["Ordered", "Zeta"]);
        let ordered = root.children()[0].as_suite().unwrap();
        assert_eq!(ordered.children()[0].name(), "Z");
        let zeta = root.children()[1].as_suite().unwrap();
        assert_eq!(zeta.children()[0].name(), "a");
    }

    #[test]
    fn test_effective_eligibility_inherits_from_parent() {
        let child = TestInfo::new("c", "c");
        let parent = EffectiveEligibility {
            state: RunEligibility::Skipped,
            reason: Some("platform".to_string()),
        };
        let effective = EffectiveEligibility::resolve(&child, Some(&parent));
        assert_eq!(effective, parent);

        let mut ignored = TestInfo::new("i", "i");
        ignored.set_run_state(RunEligibility::Ignored, Some("own".to_string()));
        let effective = EffectiveEligibility::resolve(&ignored, Some(&parent));
        assert_eq!(effective.state, RunEligibility::Ignored);
        assert_eq!(effective.reason.as_deref(), Some("own"));

        // the stored state is untouched
        assert_eq!(child.run_state, RunEligibility::Runnable);
    }

    #[test]
    fn test_replace_child_keeps_position() {
        let mut suite = TestSuite::root("r")
            .with_child(pass("a"))
            .with_child(pass("b"))
            .with_child(pass("c"));
        let old = suite.children()[1].id();
        let removed = suite.replace_child(old, pass("x")).unwrap();
        assert_eq!(removed.name(), "b");
        let names: Vec<_> = suite.children().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["a", "x", "c"]);
    }

    #[test]
    fn test_path_to() {
        let root = TestSuite::root("r").with_child(
            TestSuite::fixture("A.Fx")
                .with_child(pass("One"))
                .with_child(TestSuite::parameterized("P").with_child(pass("P(1)"))),
        );
        let fixture = root.children()[0].as_suite().unwrap();
        let method = fixture.children()[1].as_suite().unwrap();

        let path = root.path_to("A.Fx.P.P(1)").unwrap();
        assert_eq!(
            path,
            vec![fixture.info.id(), method.info.id(), method.children()[0].id()]
        );
        assert_eq!(root.path_to("A.Fx").unwrap(), vec![fixture.info.id()]);
        assert!(root.path_to("A.Fx.Two").is_none());
    }

    #[test]
    fn test_rename_keeps_fixture_name() {
        let mut suite = TestSuite::setup_fixture("Acme.Billing.BillingSetup");
        suite.rename("Billing", "Acme.Billing");
        assert_eq!(suite.info.name, "Billing");
        assert_eq!(suite.fixture_name(), "BillingSetup");
    }

    #[test]
    fn test_eligibility_from_str() {
        assert_eq!(RunEligibility::from_str("not_runnable"), Some(RunEligibility::NotRunnable));
        assert_eq!(RunEligibility::from_str("Explicit"), Some(RunEligibility::Explicit));
        assert_eq!(RunEligibility::from_str("maybe"), None);
    }
}
