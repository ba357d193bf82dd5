//! Shared action fixture for unit tests

use crate::Action;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TestAction {
    Increment,
    Add(i32),
    Multiply(i32),
    Convert,
    Blocked,
    Noop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum TestKind {
    Increment,
    Add,
    Multiply,
    Convert,
    Blocked,
    Noop,
}

impl Action for TestAction {
    type Kind = TestKind;

    fn name(&self) -> &'static str {
        match self {
            TestAction::Increment => "Increment",
            TestAction::Add(_) => "Add",
            TestAction::Multiply(_) => "Multiply",
            TestAction::Convert => "Convert",
            TestAction::Blocked => "Blocked",
            TestAction::Noop => "Noop",
        }
    }

    fn kind(&self) -> TestKind {
        match self {
            TestAction::Increment => TestKind::Increment,
            TestAction::Add(_) => TestKind::Add,
            TestAction::Multiply(_) => TestKind::Multiply,
            TestAction::Convert => TestKind::Convert,
            TestAction::Blocked => TestKind::Blocked,
            TestAction::Noop => TestKind::Noop,
        }
    }
}

impl crate::ActionSummary for TestAction {}
