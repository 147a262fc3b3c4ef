use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ai_core::{AgentId, BbKey, Blackboard, TaskStatus, TickContext};
use ai_graph::{
    ConfigurationError, EngineConfig, ExecutionCursor, GraphEngine, GraphTemplate, Leaf,
    LeafContext, LeafRegistry, NodeDef, NodeId, StepReport, Transition,
};

const COUNTER: BbKey<i64> = BbKey::new("counter");
const OBSERVED_SPEED: BbKey<f64> = BbKey::new("observed_speed");
const OBSERVED_DT: BbKey<f64> = BbKey::new("observed_dt");

struct Succeed;

impl Leaf for Succeed {
    fn execute(&mut self, _ctx: &mut LeafContext<'_>) -> TaskStatus {
        TaskStatus::Success
    }
}

struct Fail;

impl Leaf for Fail {
    fn execute(&mut self, _ctx: &mut LeafContext<'_>) -> TaskStatus {
        TaskStatus::Failure
    }
}

/// Finishes with `Success` on its `calls`-th execute.
struct FinishOnCall {
    calls: u32,
    seen: u32,
}

impl FinishOnCall {
    fn new(calls: u32) -> Self {
        Self { calls, seen: 0 }
    }
}

impl Leaf for FinishOnCall {
    fn execute(&mut self, _ctx: &mut LeafContext<'_>) -> TaskStatus {
        self.seen += 1;
        if self.seen >= self.calls {
            TaskStatus::Success
        } else {
            TaskStatus::Running
        }
    }
}

/// Increments the blackboard counter; fails once it reaches the `max` parameter.
struct Count;

impl Leaf for Count {
    fn execute(&mut self, ctx: &mut LeafContext<'_>) -> TaskStatus {
        let max = ctx.param_i64("max").unwrap_or(3);
        let next = ctx.blackboard().get_or(COUNTER, 0) + 1;
        ctx.blackboard_mut().set(COUNTER, next);
        if next < max {
            TaskStatus::Success
        } else {
            TaskStatus::Failure
        }
    }
}

/// Records what the merged parameter view resolves.
struct Probe;

impl Leaf for Probe {
    fn execute(&mut self, ctx: &mut LeafContext<'_>) -> TaskStatus {
        let speed = ctx.param_f64("speed").unwrap_or(-1.0);
        let dt = ctx.param_f64(ai_graph::DELTA_TIME_PARAM).unwrap_or(-1.0);
        ctx.blackboard_mut().set(OBSERVED_SPEED, speed);
        ctx.blackboard_mut().set(OBSERVED_DT, dt);
        TaskStatus::Success
    }
}

fn registry() -> LeafRegistry {
    let mut registry = LeafRegistry::new();
    registry.register_fn("succeed", || Succeed).unwrap();
    registry.register_fn("fail", || Fail).unwrap();
    registry.register_fn("move_to", || FinishOnCall::new(3)).unwrap();
    registry.register_fn("count", || Count).unwrap();
    registry.register_fn("probe", || Probe).unwrap();
    registry
}

fn built(mut template: GraphTemplate) -> Arc<GraphTemplate> {
    template.build_lookup_cache();
    Arc::new(template)
}

fn start_move_end() -> Arc<GraphTemplate> {
    built(
        GraphTemplate::new("start-move-end", 0)
            .with_node(NodeDef::leaf(0, "Start", "succeed").on_success(1))
            .with_node(NodeDef::leaf(1, "MoveToGoal", "move_to").on_success(2))
            .with_node(NodeDef::leaf(2, "End", "succeed")),
    )
}

#[test]
fn start_move_end_progresses_one_node_per_step() {
    let registry = registry();
    let engine = GraphEngine::new(&registry);
    let template = start_move_end();
    let mut cursor = ExecutionCursor::bind(template.clone());
    let mut bb = Blackboard::new();
    let agent = AgentId::new(1);

    let mut step = |cursor: &mut ExecutionCursor| engine.step(agent, cursor, &template, &mut bb, 0.1);

    // Tick 1: Start -> MoveToGoal.
    let r = step(&mut cursor);
    assert_eq!(r.transition, Transition::Moved(NodeId(1)));
    assert_eq!(cursor.current_node(), NodeId(1));

    // Ticks 2-3: MoveToGoal keeps running.
    for _ in 0..2 {
        let r = step(&mut cursor);
        assert_eq!(r.status, Some(TaskStatus::Running));
        assert_eq!(r.transition, Transition::Stay);
        assert_eq!(cursor.current_node(), NodeId(1));
        assert!(cursor.is_running());
    }

    // Tick 4: MoveToGoal -> End.
    let r = step(&mut cursor);
    assert_eq!(r.status, Some(TaskStatus::Success));
    assert_eq!(r.transition, Transition::Moved(NodeId(2)));
    assert!(!cursor.is_running());

    // Tick 5: End follows its terminate edge and stays there.
    let r = step(&mut cursor);
    assert_eq!(r.transition, Transition::Terminated);
    assert_eq!(cursor.current_node(), NodeId(2));
    assert!(cursor.is_idle());

    // Later ticks are no-ops.
    let r = step(&mut cursor);
    assert_eq!(r.transition, Transition::Idle);
    assert_eq!(r.status, None);
    assert_eq!(cursor.current_node(), NodeId(2));
    assert_eq!(cursor.steps_taken(), 6);
}

#[test]
fn chained_instant_nodes_do_not_cascade_within_a_step() {
    let registry = registry();
    let engine = GraphEngine::new(&registry);
    let template = built(
        GraphTemplate::new("chain", 0)
            .with_node(NodeDef::leaf(0, "A", "succeed").on_success(1))
            .with_node(NodeDef::leaf(1, "B", "succeed").on_success(2))
            .with_node(NodeDef::leaf(2, "C", "succeed")),
    );
    let mut cursor = ExecutionCursor::bind(template.clone());
    let mut bb = Blackboard::new();

    let r = engine.step(AgentId::new(1), &mut cursor, &template, &mut bb, 0.016);

    assert_eq!(r.node, NodeId(0));
    assert_eq!(r.next_node(), NodeId(1));
    assert_eq!(cursor.current_node(), NodeId(1));
}

#[test]
fn failure_follows_the_failure_edge() {
    let registry = registry();
    let engine = GraphEngine::new(&registry);
    let template = built(
        GraphTemplate::new("fallback", 0)
            .with_node(NodeDef::leaf(0, "Try", "fail").on_success(1).on_failure(2))
            .with_node(NodeDef::leaf(1, "Happy", "succeed"))
            .with_node(NodeDef::leaf(2, "Recover", "succeed")),
    );
    let mut cursor = ExecutionCursor::bind(template.clone());
    let mut bb = Blackboard::new();

    let r = engine.step(AgentId::new(1), &mut cursor, &template, &mut bb, 0.016);

    assert_eq!(r.status, Some(TaskStatus::Failure));
    assert_eq!(r.transition, Transition::Moved(NodeId(2)));
    assert!(r.config_error.is_none());
}

#[test]
fn unregistered_leaf_degrades_to_failure_edge() {
    let registry = registry();
    let engine = GraphEngine::new(&registry);
    let template = built(
        GraphTemplate::new("missing-leaf", 0)
            .with_node(NodeDef::leaf(0, "Ghost", "not_registered").on_success(1).on_failure(1))
            .with_node(NodeDef::leaf(1, "Recover", "succeed")),
    );
    let mut cursor = ExecutionCursor::bind(template.clone());
    let mut bb = Blackboard::new();

    let r = engine.step(AgentId::new(9), &mut cursor, &template, &mut bb, 0.016);

    assert_eq!(r.status, Some(TaskStatus::Failure));
    assert_eq!(r.transition, Transition::Moved(NodeId(1)));
    assert_eq!(
        r.config_error,
        Some(ConfigurationError::UnregisteredLeaf {
            node: NodeId(0),
            name: "Ghost".to_string(),
            leaf_id: "not_registered".to_string(),
        })
    );
}

#[test]
fn template_mismatch_fails_without_panicking() {
    let registry = registry();
    let engine = GraphEngine::new(&registry);
    let bound = built(GraphTemplate::new("bound", 7).with_node(NodeDef::leaf(7, "Far", "succeed")));
    let other = start_move_end();
    let mut cursor = ExecutionCursor::bind(bound);
    let mut bb = Blackboard::new();

    let r = engine.step(AgentId::new(1), &mut cursor, &other, &mut bb, 0.016);

    assert_eq!(r.status, Some(TaskStatus::Failure));
    assert_eq!(r.transition, Transition::Terminated);
    assert!(matches!(
        r.config_error,
        Some(ConfigurationError::MissingNode { node: NodeId(7), .. })
    ));
    assert!(cursor.is_idle());
}

#[test]
fn stepping_before_cache_is_built_fails() {
    let registry = registry();
    let engine = GraphEngine::new(&registry);
    let template = Arc::new(GraphTemplate::new("raw", 0).with_node(NodeDef::leaf(0, "A", "succeed")));
    let mut cursor = ExecutionCursor::bind(template.clone());
    let mut bb = Blackboard::new();

    let r = engine.step(AgentId::new(1), &mut cursor, &template, &mut bb, 0.016);

    assert!(matches!(r.config_error, Some(ConfigurationError::CacheNotBuilt { .. })));
    assert_eq!(r.status, Some(TaskStatus::Failure));
}

#[test]
fn blackboard_values_override_node_parameters() {
    let registry = registry();
    let engine = GraphEngine::new(&registry);
    let template = built(
        GraphTemplate::new("probe", 0).with_node(NodeDef::leaf(0, "Probe", "probe").with_param("speed", 1.5f64)),
    );

    let mut plain = Blackboard::new();
    let mut fast = Blackboard::new();
    fast.set_value("speed", 6i64);

    let mut a = ExecutionCursor::bind(template.clone());
    let mut b = ExecutionCursor::bind(template.clone());
    engine.step(AgentId::new(1), &mut a, &template, &mut plain, 0.25);
    engine.step(AgentId::new(2), &mut b, &template, &mut fast, 0.25);

    assert_eq!(plain.get(OBSERVED_SPEED), Some(1.5));
    assert_eq!(fast.get(OBSERVED_SPEED), Some(6.0));
    assert_eq!(plain.get(OBSERVED_DT), Some(0.25));
}

#[test]
fn restart_from_root_loops_the_walk() {
    let registry = registry();
    let engine = GraphEngine::new(&registry).with_config(EngineConfig::restart_on_terminate());
    let template = built(
        GraphTemplate::new("loop", 0)
            .with_node(NodeDef::leaf(0, "A", "succeed").on_success(1))
            .with_node(NodeDef::leaf(1, "B", "succeed")),
    );
    let mut cursor = ExecutionCursor::bind(template.clone());
    let mut bb = Blackboard::new();
    let ctx = TickContext::new(0, 0.016);

    let transitions: Vec<Transition> = (0..3)
        .map(|_| engine.tick(&ctx, AgentId::new(1), &mut cursor, &mut bb).transition)
        .collect();

    assert_eq!(
        transitions,
        vec![
            Transition::Moved(NodeId(1)),
            Transition::Restarted(NodeId(0)),
            Transition::Moved(NodeId(1)),
        ]
    );
    assert!(!cursor.is_idle());
}

#[test]
fn identical_agents_produce_identical_transition_sequences() {
    let registry = registry();
    let engine = GraphEngine::new(&registry);
    // Patrol-style cycle: count -> move -> count ... until the counter hits max.
    let template = built(
        GraphTemplate::new("patrol", 0)
            .with_node(NodeDef::leaf(0, "Count", "count").with_param("max", 4i64).on_success(1).on_failure(2))
            .with_node(NodeDef::leaf(1, "Move", "move_to").on_success(0))
            .with_node(NodeDef::leaf(2, "Done", "succeed")),
    );

    let run = |agent: u64| -> Vec<(NodeId, Transition)> {
        let mut cursor = ExecutionCursor::bind(template.clone());
        let mut bb = Blackboard::new();
        let mut ctx = TickContext::new(0, 0.05);
        let mut seq = Vec::new();
        for _ in 0..30 {
            let r: StepReport = engine.tick(&ctx, AgentId::new(agent), &mut cursor, &mut bb);
            seq.push((r.node, r.transition));
            ctx = ctx.next();
        }
        seq
    };

    let a = run(1);
    let b = run(2);
    assert_eq!(a, b);
    assert!(a.contains(&(NodeId(0), Transition::Moved(NodeId(2)))));
    assert_eq!(a.last().map(|(_, t)| *t), Some(Transition::Idle));
}

#[test]
fn trace_events_describe_the_step() {
    let registry = registry();
    let engine = GraphEngine::new(&registry);
    let template = start_move_end();
    let mut cursor = ExecutionCursor::bind(template.clone());
    let mut bb = Blackboard::new();

    let first = engine.step(AgentId::new(4), &mut cursor, &template, &mut bb, 0.1);
    let second = engine.step(AgentId::new(4), &mut cursor, &template, &mut bb, 0.1);

    let moved = first.trace_event(10);
    assert_eq!(moved.tag, "graph.transition");
    assert_eq!((moved.agent, moved.a, moved.b), (4, 0, 1));

    let running = second.trace_event(11);
    assert_eq!(running.tag, "graph.running");
    assert_eq!((running.a, running.b), (1, 1));
}

/// Never finishes; counts how often it was aborted.
struct Spin {
    aborts: Arc<AtomicUsize>,
}

impl Leaf for Spin {
    fn execute(&mut self, _ctx: &mut LeafContext<'_>) -> TaskStatus {
        TaskStatus::Running
    }

    fn abort(&mut self) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn restart_after_missing_node_aborts_the_running_leaf() {
    let aborts = Arc::new(AtomicUsize::new(0));
    let counter = aborts.clone();
    let mut registry = registry();
    registry
        .register_fn("spin", move || Spin { aborts: counter.clone() })
        .unwrap();
    let engine = GraphEngine::new(&registry).with_config(EngineConfig::restart_on_terminate());

    let spinning = built(GraphTemplate::new("a", 5).with_node(NodeDef::leaf(5, "Spin", "spin")));
    let other = built(GraphTemplate::new("b", 0).with_node(NodeDef::leaf(0, "Start", "succeed")));
    let mut cursor = ExecutionCursor::bind(spinning.clone());
    let mut bb = Blackboard::new();

    engine.step(AgentId::new(1), &mut cursor, &spinning, &mut bb, 0.016);
    assert_eq!(cursor.running_leaf_id(), Some("spin"));

    let r = engine.step(AgentId::new(1), &mut cursor, &other, &mut bb, 0.016);

    assert_eq!(r.transition, Transition::Restarted(NodeId(0)));
    assert!(matches!(
        r.config_error,
        Some(ConfigurationError::MissingNode { node: NodeId(5), .. })
    ));
    assert_eq!(cursor.current_node(), NodeId(0));
    assert!(!cursor.is_running());
    assert_eq!(cursor.running_leaf_id(), None);
    assert_eq!(aborts.load(Ordering::SeqCst), 1);

    // Dropping the cursor later must not abort a second time.
    drop(cursor);
    assert_eq!(aborts.load(Ordering::SeqCst), 1);
}
