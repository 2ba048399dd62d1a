//! Hierarchical Task Scheduler
//!
//! A tree of timer nodes driven by a single external `advance(delta)` call per frame.
//!
//! ## Model
//! - Every node is owned by its parent. Destroying a node destroys its whole subtree.
//! - A timed node fires first after `delay`, then every `interval`, until it has
//!   completed `repeat` cycles. It then becomes inert and is destroyed immediately.
//! - Container nodes (no timing) never fire; they only group children.
//!
//! ## Ordering
//! - `advance` walks the tree depth-first. For each node its children are advanced
//!   first (in insertion order), then the node itself gets its chance to fire.
//! - A node fires at most once per `advance` call. Elapsed time beyond the slot it
//!   fired for is kept, so variable frame lengths never lose time.
//! - Teardown runs deepest-first: every descendant is torn down before its parent.
//!
//! ## Callbacks
//! Callbacks never touch the tree directly. They queue spawns and cancellations on
//! their [`TaskContext`], which the tree applies as soon as the callback returns.
//! Nodes created while an `advance` is in progress start accumulating time on the
//! next `advance`.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use bevy::log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Identifier of a node in a [`TaskTree`]. Ids are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(u64);

impl TaskId {
    /// The root of every tree. It is a container and can never be destroyed.
    pub const ROOT: TaskId = TaskId(0);

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// How many cycles a timed node completes before it becomes inert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Repeat {
    Times(u32),
    Forever,
}

impl Repeat {
    fn is_exhausted(self, cycles: u32) -> bool {
        match self {
            Repeat::Times(limit) => cycles >= limit,
            Repeat::Forever => false,
        }
    }
}

/// Delay/interval/repeat configuration of a timed node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Time before the first fire
    pub delay: Duration,
    /// Time between subsequent fires
    pub interval: Duration,
    pub repeat: Repeat,
}

impl Timing {
    /// Fire a single time after `delay`.
    pub fn once(delay: Duration) -> Self {
        Self {
            delay,
            interval: Duration::ZERO,
            repeat: Repeat::Times(1),
        }
    }

    /// Fire `times` times: after `delay`, then every `interval`.
    pub fn times(delay: Duration, interval: Duration, times: u32) -> Self {
        Self {
            delay,
            interval,
            repeat: Repeat::Times(times),
        }
    }

    /// Fire after `delay`, then every `interval`, until cancelled.
    pub fn forever(delay: Duration, interval: Duration) -> Self {
        Self {
            delay,
            interval,
            repeat: Repeat::Forever,
        }
    }
}

/// Behavior attached to a scheduler node.
///
/// `Context` is the shared state every callback of the tree mutates.
pub trait Task: Sized {
    type Context;

    /// Runs exactly once, when the node is attached under the root.
    fn mount(&mut self, _cx: &mut TaskContext<'_, Self>) {}

    /// Guard evaluated when a slot is due. Returning `false` skips the slot
    /// without counting a completed cycle.
    fn should_tick(&mut self, _ctx: &mut Self::Context) -> bool {
        true
    }

    /// Runs when a slot is due and the guard passed.
    fn tick(&mut self, cx: &mut TaskContext<'_, Self>);

    /// Runs exactly once, when the node is destroyed for any reason.
    fn teardown(&mut self, _cx: &mut TaskContext<'_, Self>) {}
}

enum Command<T> {
    Spawn {
        parent: TaskId,
        timing: Option<Timing>,
        task: T,
    },
    Cancel(TaskId),
    CancelChildren(TaskId),
}

/// Handle passed to task callbacks.
pub struct TaskContext<'a, T: Task> {
    id: TaskId,
    parent: TaskId,
    cycles: u32,
    /// Shared state of the tree
    pub ctx: &'a mut T::Context,
    commands: &'a mut Vec<Command<T>>,
}

impl<'a, T: Task> TaskContext<'a, T> {
    /// Id of the node running the callback
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn parent(&self) -> TaskId {
        self.parent
    }

    /// Cycles the node has completed. During `tick` this does not yet include
    /// the cycle being fired.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Queue a new timed node under `parent`.
    pub fn spawn(&mut self, parent: TaskId, timing: Timing, task: T) {
        self.commands.push(Command::Spawn {
            parent,
            timing: Some(timing),
            task,
        });
    }

    /// Queue the destruction of `id` and its subtree.
    pub fn cancel(&mut self, id: TaskId) {
        self.commands.push(Command::Cancel(id));
    }

    /// Queue the destruction of every child of `id`, keeping `id` itself.
    pub fn cancel_children(&mut self, id: TaskId) {
        self.commands.push(Command::CancelChildren(id));
    }
}

/// Read-only view of a node's timer state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskInfo {
    pub id: TaskId,
    pub parent: TaskId,
    pub timing: Option<Timing>,
    /// Time accumulated towards the next slot
    pub elapsed: Duration,
    pub cycles: u32,
}

impl TaskInfo {
    /// Time left until the next slot is due, or `None` for containers.
    pub fn remaining(&self) -> Option<Duration> {
        let timing = self.timing?;
        let slot = if self.cycles == 0 {
            timing.delay
        } else {
            timing.interval
        };
        Some(slot.saturating_sub(self.elapsed))
    }
}

struct Node<T> {
    parent: Option<TaskId>,
    children: SmallVec<[TaskId; 4]>,
    timing: Option<Timing>,
    elapsed: Duration,
    /// Slots reached so far, fired or skipped
    slots: u32,
    cycles: u32,
    /// Advance pass during which the node was mounted
    born: u64,
    task: Option<T>,
}

/// The scheduler: a tree of task nodes under a permanent root.
pub struct TaskTree<T: Task> {
    nodes: HashMap<TaskId, Node<T>>,
    next_id: u64,
    pass: u64,
}

impl<T: Task> Default for TaskTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Task> TaskTree<T> {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            TaskId::ROOT,
            Node {
                parent: None,
                children: SmallVec::new(),
                timing: None,
                elapsed: Duration::ZERO,
                slots: 0,
                cycles: 0,
                born: 0,
                task: None,
            },
        );
        Self {
            nodes,
            next_id: 1,
            pass: 0,
        }
    }

    /// Attach a timed node under `parent` and mount it.
    ///
    /// Returns `None` when `parent` is not alive; nothing is created in that case.
    pub fn spawn(
        &mut self,
        parent: TaskId,
        timing: Timing,
        task: T,
        ctx: &mut T::Context,
    ) -> Option<TaskId> {
        self.spawn_node(parent, Some(timing), task, ctx)
    }

    /// Attach a container node (never fires) under `parent` and mount it.
    pub fn spawn_container(&mut self, parent: TaskId, task: T, ctx: &mut T::Context) -> Option<TaskId> {
        self.spawn_node(parent, None, task, ctx)
    }

    /// Destroy `id` and its subtree. Returns `false` if it was not alive.
    pub fn cancel(&mut self, id: TaskId, ctx: &mut T::Context) -> bool {
        if id == TaskId::ROOT || !self.nodes.contains_key(&id) {
            return false;
        }
        let mut queue = VecDeque::new();
        self.destroy(id, ctx, &mut queue);
        self.flush(ctx, &mut queue);
        true
    }

    /// Destroy every child of `id`.
    pub fn cancel_children(&mut self, id: TaskId, ctx: &mut T::Context) {
        let mut queue = VecDeque::from([Command::CancelChildren(id)]);
        self.flush(ctx, &mut queue);
    }

    /// Advance every live node by `delta`, firing whatever is due.
    pub fn advance(&mut self, delta: Duration, ctx: &mut T::Context) {
        self.pass += 1;
        let mut queue = VecDeque::new();
        self.advance_children(TaskId::ROOT, delta, ctx, &mut queue);
        self.flush(ctx, &mut queue);
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of live nodes, not counting the root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn task(&self, id: TaskId) -> Option<&T> {
        self.nodes.get(&id).and_then(|node| node.task.as_ref())
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut T> {
        self.nodes.get_mut(&id).and_then(|node| node.task.as_mut())
    }

    /// Children of `id` in fire order. Empty if `id` is not alive.
    pub fn children(&self, id: TaskId) -> &[TaskId] {
        self.nodes
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn info(&self, id: TaskId) -> Option<TaskInfo> {
        self.nodes.get(&id).map(|node| TaskInfo {
            id,
            parent: node.parent.unwrap_or(TaskId::ROOT),
            timing: node.timing,
            elapsed: node.elapsed,
            cycles: node.cycles,
        })
    }

    fn spawn_node(
        &mut self,
        parent: TaskId,
        timing: Option<Timing>,
        task: T,
        ctx: &mut T::Context,
    ) -> Option<TaskId> {
        let mut queue = VecDeque::new();
        let id = self.attach(parent, timing, task, ctx, &mut queue);
        self.flush(ctx, &mut queue);
        id
    }

    fn attach(
        &mut self,
        parent: TaskId,
        timing: Option<Timing>,
        task: T,
        ctx: &mut T::Context,
        queue: &mut VecDeque<Command<T>>,
    ) -> Option<TaskId> {
        let parent_node = self.nodes.get_mut(&parent)?;
        let id = TaskId(self.next_id);
        self.next_id += 1;
        parent_node.children.push(id);
        self.nodes.insert(
            id,
            Node {
                parent: Some(parent),
                children: SmallVec::new(),
                timing,
                elapsed: Duration::ZERO,
                slots: 0,
                cycles: 0,
                born: self.pass,
                task: Some(task),
            },
        );
        debug!("task {} mounted under {}", id.0, parent.0);
        self.invoke(id, ctx, queue, |task, cx| task.mount(cx));

        if timing.is_some_and(|timing| timing.repeat.is_exhausted(0)) {
            self.destroy(id, ctx, queue);
        }
        Some(id)
    }

    fn invoke(
        &mut self,
        id: TaskId,
        ctx: &mut T::Context,
        queue: &mut VecDeque<Command<T>>,
        callback: impl FnOnce(&mut T, &mut TaskContext<'_, T>),
    ) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        let parent = node.parent.unwrap_or(TaskId::ROOT);
        let cycles = node.cycles;
        let Some(task) = node.task.as_mut() else {
            return;
        };
        let mut commands = Vec::new();
        let mut cx = TaskContext {
            id,
            parent,
            cycles,
            ctx,
            commands: &mut commands,
        };
        callback(task, &mut cx);
        queue.extend(commands);
    }

    fn flush(&mut self, ctx: &mut T::Context, queue: &mut VecDeque<Command<T>>) {
        while let Some(command) = queue.pop_front() {
            match command {
                Command::Spawn {
                    parent,
                    timing,
                    task,
                } => {
                    if self.attach(parent, timing, task, ctx, queue).is_none() {
                        debug!("dropped spawn under dead parent {}", parent.0);
                    }
                }
                Command::Cancel(id) => {
                    if id != TaskId::ROOT {
                        self.destroy(id, ctx, queue);
                    }
                }
                Command::CancelChildren(id) => {
                    let children: SmallVec<[TaskId; 8]> =
                        SmallVec::from_slice(self.children(id));
                    for child in children {
                        self.destroy(child, ctx, queue);
                    }
                }
            }
        }
    }

    /// Tear down the subtree under `id` deepest-first, then remove it.
    fn destroy(&mut self, id: TaskId, ctx: &mut T::Context, queue: &mut VecDeque<Command<T>>) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let children: SmallVec<[TaskId; 8]> = node.children.clone().into_iter().collect();
        for child in children {
            self.destroy(child, ctx, queue);
        }

        self.invoke(id, ctx, queue, |task, cx| task.teardown(cx));

        if let Some(node) = self.nodes.remove(&id) {
            if let Some(parent) = node.parent.and_then(|parent| self.nodes.get_mut(&parent)) {
                parent.children.retain(|child| *child != id);
            }
            debug!("task {} destroyed after {} cycles", id.0, node.cycles);
        }
    }

    fn advance_children(
        &mut self,
        parent: TaskId,
        delta: Duration,
        ctx: &mut T::Context,
        queue: &mut VecDeque<Command<T>>,
    ) {
        let children: SmallVec<[TaskId; 8]> = SmallVec::from_slice(self.children(parent));
        for child in children {
            self.advance_node(child, delta, ctx, queue);
        }
    }

    fn advance_node(
        &mut self,
        id: TaskId,
        delta: Duration,
        ctx: &mut T::Context,
        queue: &mut VecDeque<Command<T>>,
    ) {
        // Destroyed by an earlier sibling, or mounted during this pass
        match self.nodes.get(&id) {
            Some(node) if node.born != self.pass => {}
            _ => return,
        }
        self.advance_children(id, delta, ctx, queue);
        self.step(id, delta, ctx, queue);
    }

    fn step(&mut self, id: TaskId, delta: Duration, ctx: &mut T::Context, queue: &mut VecDeque<Command<T>>) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        let Some(timing) = node.timing else {
            return;
        };

        node.elapsed += delta;
        let slot = if node.slots == 0 {
            timing.delay
        } else {
            timing.interval
        };
        if node.elapsed < slot {
            return;
        }
        node.elapsed -= slot;
        node.slots += 1;

        let Some(task) = node.task.as_mut() else {
            return;
        };
        if !task.should_tick(ctx) {
            return;
        }

        self.invoke(id, ctx, queue, |task, cx| task.tick(cx));
        let exhausted = match self.nodes.get_mut(&id) {
            Some(node) => {
                node.cycles += 1;
                timing.repeat.is_exhausted(node.cycles)
            }
            None => false,
        };
        self.flush(ctx, queue);

        if exhausted {
            self.destroy(id, ctx, queue);
            self.flush(ctx, queue);
        }
    }
}
