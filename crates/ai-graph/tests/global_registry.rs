use ai_core::TaskStatus;
use ai_graph::{Leaf, LeafContext, LeafRegistry, RegistryError};

#[derive(Default)]
struct Succeed;

impl Leaf for Succeed {
    fn execute(&mut self, _ctx: &mut LeafContext<'_>) -> TaskStatus {
        TaskStatus::Success
    }
}

// The global slot is process-wide, so everything touching it lives in one test.
#[test]
fn global_registry_installs_once() {
    assert!(LeafRegistry::global().is_none());

    let mut registry = LeafRegistry::new();
    registry.register_default::<Succeed>("succeed").unwrap();
    let installed = registry.install_global().unwrap();
    assert!(installed.contains("succeed"));

    let global = LeafRegistry::global().unwrap();
    assert!(std::ptr::eq(global, installed));

    let err = LeafRegistry::new().install_global().unwrap_err();
    assert_eq!(err, RegistryError::GlobalAlreadyInstalled);
    assert!(LeafRegistry::global().unwrap().contains("succeed"));
}
