//! Demo leaves for running graph definitions from the command line.

use ai_core::{BbKey, TaskStatus, Vec3};
use ai_graph::{Leaf, LeafContext, LeafRegistry, RegistryError};

pub const POSITION: BbKey<Vec3> = BbKey::new("position");
pub const COUNTER: BbKey<i64> = BbKey::new("counter");

/// Distance at which `move_to` counts as arrived.
const ARRIVE_EPSILON: f32 = 1e-3;

#[derive(Debug, Default)]
pub struct Succeed;

impl Leaf for Succeed {
    fn execute(&mut self, _ctx: &mut LeafContext<'_>) -> TaskStatus {
        TaskStatus::Success
    }
}

#[derive(Debug, Default)]
pub struct Fail;

impl Leaf for Fail {
    fn execute(&mut self, _ctx: &mut LeafContext<'_>) -> TaskStatus {
        TaskStatus::Failure
    }
}

/// Runs until `seconds` of step time have accumulated.
#[derive(Debug, Default)]
pub struct Wait {
    elapsed: f64,
}

impl Leaf for Wait {
    fn execute(&mut self, ctx: &mut LeafContext<'_>) -> TaskStatus {
        let seconds = ctx.param_f64("seconds").unwrap_or(1.0);
        self.elapsed += ctx.delta_time() as f64;
        if self.elapsed >= seconds {
            TaskStatus::Success
        } else {
            TaskStatus::Running
        }
    }

    fn abort(&mut self) {
        self.elapsed = 0.0;
    }
}

/// Moves the blackboard `position` toward the `goal` parameter at `speed` units per second.
///
/// Fails when no goal is given.
#[derive(Debug, Default)]
pub struct MoveTo;

impl Leaf for MoveTo {
    fn execute(&mut self, ctx: &mut LeafContext<'_>) -> TaskStatus {
        let Some(goal) = ctx.param_vec3("goal") else {
            return TaskStatus::Failure;
        };
        let speed = ctx.param_f64("speed").unwrap_or(1.0) as f32;
        let position = ctx.blackboard().get_or(POSITION, Vec3::ZERO);

        let next = position.move_towards(goal, speed * ctx.delta_time());
        ctx.blackboard_mut().set(POSITION, next);

        if next.distance(goal) <= ARRIVE_EPSILON {
            TaskStatus::Success
        } else {
            TaskStatus::Running
        }
    }
}

/// Increments the blackboard `counter`; succeeds while it stays below `max`.
#[derive(Debug, Default)]
pub struct Count;

impl Leaf for Count {
    fn execute(&mut self, ctx: &mut LeafContext<'_>) -> TaskStatus {
        let max = ctx.param_i64("max").unwrap_or(3);
        let next = ctx.blackboard().get_or(COUNTER, 0).saturating_add(1);
        ctx.blackboard_mut().set(COUNTER, next);
        if next < max {
            TaskStatus::Success
        } else {
            TaskStatus::Failure
        }
    }
}

/// Register every demo leaf under its id.
pub fn register_demo_leaves(registry: &mut LeafRegistry) -> Result<(), RegistryError> {
    registry.register_default::<Succeed>("succeed")?;
    registry.register_default::<Fail>("fail")?;
    registry.register_default::<Wait>("wait")?;
    registry.register_default::<MoveTo>("move_to")?;
    registry.register_default::<Count>("count")?;
    Ok(())
}

pub fn demo_registry() -> Result<LeafRegistry, RegistryError> {
    let mut registry = LeafRegistry::new();
    register_demo_leaves(&mut registry)?;
    Ok(registry)
}
