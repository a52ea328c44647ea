//! Namespace tree builder
//!
//! Fixtures arrive as a flat list with dotted full names. Each one is placed
//! in a suite per namespace segment, created on first use. A setup fixture
//! stands in for the namespace suite it belongs to.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::models::{strip_parameters, SuiteKind, TestId, TestSuite};

/// Builds a single root suite from fixtures with dotted full names
#[derive(Debug)]
pub struct NamespaceTreeBuilder {
    root: TestSuite,
    /// Namespace full name to the suite representing it
    namespaces: HashMap<String, TestId>,
}

impl NamespaceTreeBuilder {
    pub fn new(root: TestSuite) -> Self {
        let mut namespaces = HashMap::new();
        namespaces.insert(String::new(), root.info.id());
        Self { root, namespaces }
    }

    /// Place a fixture (or setup fixture) in the tree
    pub fn add(&mut self, fixture: TestSuite) {
        let namespace = namespace_of(strip_parameters(&fixture.info.full_name)).to_string();
        let suite_id = self.namespace_suite(&namespace);

        if fixture.kind == SuiteKind::SetUpFixture {
            self.replace_namespace(&namespace, suite_id, fixture);
            return;
        }

        debug!("Adding {} to namespace '{}'", fixture.info.full_name, namespace);
        match self.root.find_suite_mut(suite_id) {
            Some(suite) => suite.add(fixture),
            None => {
                warn!("Namespace '{}' missing from tree, adding {} to root", namespace, fixture.info.full_name);
                self.root.add(fixture);
            }
        }
    }

    pub fn add_all(&mut self, fixtures: impl IntoIterator<Item = TestSuite>) {
        for fixture in fixtures {
            self.add(fixture);
        }
    }

    pub fn root(&self) -> &TestSuite {
        &self.root
    }

    pub fn into_root(self) -> TestSuite {
        self.root
    }

    /// Id of the suite for `namespace`, creating it and any missing parents
    fn namespace_suite(&mut self, namespace: &str) -> TestId {
        if let Some(id) = self.namespaces.get(namespace) {
            return *id;
        }

        let parent_namespace = namespace_of(namespace);
        let parent_id = self.namespace_suite(parent_namespace);
        let name = &namespace[namespace.rfind('.').map_or(0, |i| i + 1)..];

        let suite = TestSuite::namespace(parent_namespace, name);
        let id = suite.info.id();
        match self.root.find_suite_mut(parent_id) {
            Some(parent) => parent.add(suite),
            None => self.root.add(suite),
        }
        self.namespaces.insert(namespace.to_string(), id);
        id
    }

    /// Swap the namespace suite `suite_id` for a setup fixture, which takes
    /// over its name, position and children
    fn replace_namespace(&mut self, namespace: &str, suite_id: TestId, mut fixture: TestSuite) {
        let fixture_id = fixture.info.id();

        if suite_id == self.root.info.id() {
            debug!("Setup fixture {} becomes the root", fixture.info.full_name);
            fixture.rename(self.root.info.name.clone(), self.root.info.full_name.clone());
            fixture.adopt(self.root.take_children());
            self.root = fixture;
        } else {
            let Some(suite) = self.root.find_suite_mut(suite_id) else {
                warn!("Namespace '{}' missing from tree, setup fixture {} dropped", namespace, fixture.info.full_name);
                return;
            };
            debug!("Setup fixture {} replaces namespace '{}'", fixture.info.full_name, namespace);
            fixture.rename(suite.info.name.clone(), suite.info.full_name.clone());
            fixture.adopt(suite.take_children());
            let parent_id = suite.info.parent();

            let parent = parent_id.and_then(|id| self.root.find_suite_mut(id));
            match parent {
                Some(parent) => {
                    parent.replace_child(suite_id, fixture);
                }
                None => warn!("Namespace '{}' has no parent suite", namespace),
            }
        }

        self.namespaces.insert(namespace.to_string(), fixture_id);
    }
}

/// Namespace part of a dotted name: everything before the last dot
pub fn namespace_of(full_name: &str) -> &str {
    full_name.rfind('.').map_or("", |index| &full_name[..index])
}
