use std::sync::{Arc, Mutex};

use ai_core::Blackboard;
use ai_tools::ExecutionBridge;

#[derive(Clone, Default)]
struct Calls {
    nodes: Arc<Mutex<Vec<u32>>>,
    boards: Arc<Mutex<usize>>,
}

impl Calls {
    fn install(&self, bridge: &mut ExecutionBridge) {
        let nodes = self.nodes.clone();
        let boards = self.boards.clone();
        bridge.install_with(
            move |id| nodes.lock().unwrap().push(id),
            move |_bb| *boards.lock().unwrap() += 1,
        );
    }
}

#[test]
fn publish_reaches_both_hooks_when_installed() {
    let calls = Calls::default();
    let mut bridge = ExecutionBridge::new();
    calls.install(&mut bridge);

    bridge.publish(4, &Blackboard::new());

    assert_eq!(*calls.nodes.lock().unwrap(), vec![4]);
    assert_eq!(*calls.boards.lock().unwrap(), 1);
}

#[test]
fn uninstall_stops_publishing_and_is_idempotent() {
    let calls = Calls::default();
    let mut bridge = ExecutionBridge::new();
    calls.install(&mut bridge);

    bridge.uninstall();
    bridge.uninstall();
    bridge.publish(1, &Blackboard::new());

    assert!(!bridge.is_installed());
    assert!(calls.nodes.lock().unwrap().is_empty());
}

#[test]
fn install_without_hooks_still_counts_as_installed() {
    let mut bridge = ExecutionBridge::new();
    bridge.install(None, None);

    assert!(bridge.is_installed());
    bridge.publish(0, &Blackboard::new());
}

#[test]
fn reinstall_replaces_previous_hooks() {
    let first = Calls::default();
    let second = Calls::default();
    let mut bridge = ExecutionBridge::new();
    first.install(&mut bridge);
    second.install(&mut bridge);

    bridge.publish(2, &Blackboard::new());

    assert!(first.nodes.lock().unwrap().is_empty());
    assert_eq!(*second.nodes.lock().unwrap(), vec![2]);
}
