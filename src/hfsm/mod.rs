//! Hierarchical state machine engine.
//!
//! Function-pointer state tables, extended with parents and initial
//! children:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  State table                    Transition table             │
//! │  ┌──────┬────────┬─────────┐    ┌────────┬─────────┬───────┐ │
//! │  │ id   │ parent │ initial │    │ source │ trigger │ target│ │
//! │  │ on_enter / on_exit      │    │ guard / effect / enabled │ │
//! │  └──────┴────────┴─────────┘    └────────┴─────────┴───────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exactly one leaf is active after [`Hfsm::start`]; the active path is the
//! leaf's parent chain.  [`Hfsm::dispatch`] walks that path from the leaf
//! upward and fires the first enabled transition whose trigger matches and
//! whose guard passes.  Everything handlers need lives in the context `C`
//! ("blackboard"); handlers never see the engine, except through a
//! [`TransitionSwitch`] that lets entry/exit actions enable or disable
//! other transitions.

use core::fmt;

use heapless::Vec;
use log::{debug, info, trace};

use crate::error::HfsmError;

/// Maximum number of states in one machine.
pub const MAX_STATES: usize = 32;
/// Maximum number of transitions in one machine.
pub const MAX_TRANSITIONS: usize = 96;
/// Maximum nesting depth, root included.
pub const MAX_DEPTH: usize = 8;

// ---------------------------------------------------------------------------
// Identity traits
// ---------------------------------------------------------------------------

/// A closed set of state identities, densely indexed from zero.
pub trait StateSet: Copy + Eq + fmt::Debug {
    const COUNT: usize;
    fn index(self) -> usize;
    fn name(self) -> &'static str;
}

/// An event that can be matched against transition triggers by kind.
pub trait Trigger {
    type Kind: Copy + Eq + fmt::Debug;
    fn kind(&self) -> Self::Kind;
}

// ---------------------------------------------------------------------------
// Handler signatures
// ---------------------------------------------------------------------------

/// Entry and exit actions.
pub type ActionFn<C> = fn(&mut C, &mut TransitionSwitch<'_>);
/// Transition guard; must not mutate anything.
pub type GuardFn<C, E> = fn(&C, &E) -> bool;
/// Transition effect, run between the exits and the entries.
pub type EffectFn<C, E> = fn(&mut C, &E);

/// Handle to one row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionId(u16);

impl TransitionId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Runtime enable/disable of transitions, handed to entry and exit actions.
pub struct TransitionSwitch<'a> {
    enabled: &'a mut [bool],
}

impl TransitionSwitch<'_> {
    /// Let `id` fire again.
    pub fn enable(&mut self, id: TransitionId) {
        self.set(id, true);
    }

    /// Stop `id` from matching until it is enabled again.
    pub fn disable(&mut self, id: TransitionId) {
        self.set(id, false);
    }

    pub fn set(&mut self, id: TransitionId, enabled: bool) {
        if let Some(flag) = self.enabled.get_mut(id.index()) {
            *flag = enabled;
        }
    }

    pub fn is_enabled(&self, id: TransitionId) -> bool {
        self.enabled.get(id.index()).copied().unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

/// One row in the state table.
pub struct StateDescriptor<S, C> {
    pub id: S,
    pub parent: Option<S>,
    pub initial: Option<S>,
    pub on_enter: Option<ActionFn<C>>,
    pub on_exit: Option<ActionFn<C>>,
}

impl<S: Copy, C> Clone for StateDescriptor<S, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Copy, C> Copy for StateDescriptor<S, C> {}

impl<S, C> StateDescriptor<S, C> {
    /// The root state.  Every machine has exactly one.
    pub const fn root(id: S, initial: S) -> Self {
        Self {
            id,
            parent: None,
            initial: Some(initial),
            on_enter: None,
            on_exit: None,
        }
    }

    /// A state with children; `initial` is entered by default.
    pub const fn composite(id: S, parent: S, initial: S) -> Self {
        Self {
            id,
            parent: Some(parent),
            initial: Some(initial),
            on_enter: None,
            on_exit: None,
        }
    }

    /// A state with no children.
    pub const fn leaf(id: S, parent: S) -> Self {
        Self {
            id,
            parent: Some(parent),
            initial: None,
            on_enter: None,
            on_exit: None,
        }
    }

    /// Run `f` every time the state is entered.
    pub const fn on_enter(mut self, f: ActionFn<C>) -> Self {
        self.on_enter = Some(f);
        self
    }

    /// Run `f` every time the state is exited.
    pub const fn on_exit(mut self, f: ActionFn<C>) -> Self {
        self.on_exit = Some(f);
        self
    }
}

/// One row in the transition table.  `target: None` is an internal
/// transition: only the effect runs, no state is exited or entered.
pub struct Transition<S, C, E: Trigger> {
    pub source: S,
    pub trigger: E::Kind,
    pub target: Option<S>,
    pub guard: Option<GuardFn<C, E>>,
    pub effect: Option<EffectFn<C, E>>,
}

impl<S: Copy, C, E: Trigger> Clone for Transition<S, C, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Copy, C, E: Trigger> Copy for Transition<S, C, E> {}

impl<S, C, E: Trigger> Transition<S, C, E> {
    /// A transition that runs its effect without leaving `source`.
    pub const fn internal(source: S, trigger: E::Kind) -> Self {
        Self {
            source,
            trigger,
            target: None,
            guard: None,
            effect: None,
        }
    }

    /// Leave `source` for `target`, running exits, the effect and entries.
    pub const fn external(source: S, trigger: E::Kind, target: S) -> Self {
        Self {
            source,
            trigger,
            target: Some(target),
            guard: None,
            effect: None,
        }
    }

    /// Only fire when `f` holds.
    pub const fn guard(mut self, f: GuardFn<C, E>) -> Self {
        self.guard = Some(f);
        self
    }

    /// Run `f` between the exits and the entries.
    pub const fn effect(mut self, f: EffectFn<C, E>) -> Self {
        self.effect = Some(f);
        self
    }
}

/// Outcome of [`Hfsm::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A transition fired (external or internal).
    Fired,
    /// No enabled transition on the active path matched.
    Ignored,
}

impl Dispatch {
    pub fn fired(self) -> bool {
        self == Self::Fired
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects the state and transition tables and validates them.
///
/// Errors are latched: the first problem is reported by [`build`](Self::build)
/// so table construction code can stay a flat list of calls.
pub struct HfsmBuilder<S: StateSet, C, E: Trigger> {
    states: Vec<Option<StateDescriptor<S, C>>, MAX_STATES>,
    transitions: Vec<Transition<S, C, E>, MAX_TRANSITIONS>,
    error: Option<HfsmError>,
}

impl<S: StateSet, C, E: Trigger> Default for HfsmBuilder<S, C, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateSet, C, E: Trigger> HfsmBuilder<S, C, E> {
    /// Start an empty table.
    pub fn new() -> Self {
        let mut states = Vec::new();
        let mut error = None;
        if S::COUNT > MAX_STATES {
            error = Some(HfsmError::CapacityExceeded);
        } else {
            states.resize(S::COUNT, None).ok();
        }
        Self {
            states,
            transitions: Vec::new(),
            error,
        }
    }

    /// Declare a state.  Declaring the same state twice is an error at [`build`](Self::build).
    pub fn state(&mut self, desc: StateDescriptor<S, C>) -> &mut Self {
        let name = desc.id.name();
        let result = match self.states.get_mut(desc.id.index()) {
            Some(slot) if slot.is_none() => {
                *slot = Some(desc);
                Ok(())
            }
            Some(_) => Err(HfsmError::DuplicateState(name)),
            None => Err(HfsmError::CapacityExceeded),
        };
        if let Err(e) = result {
            self.latch(e);
        }
        self
    }

    /// Add a transition and return its handle.  Transitions start enabled.
    pub fn transition(&mut self, t: Transition<S, C, E>) -> TransitionId {
        let id = TransitionId(self.transitions.len() as u16);
        if self.transitions.push(t).is_err() {
            self.latch(HfsmError::CapacityExceeded);
        }
        id
    }

    /// Validate the table and produce a machine that has not been started.
    pub fn build(self) -> Result<Hfsm<S, C, E>, HfsmError> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let mut states: Vec<StateDescriptor<S, C>, MAX_STATES> = Vec::new();
        for (index, slot) in self.states.iter().enumerate() {
            // Every identity in the set must be declared.
            let desc = slot.ok_or(HfsmError::MissingState(index))?;
            states.push(desc).map_err(|_| HfsmError::CapacityExceeded)?;
        }

        let mut root = None;
        for desc in &states {
            match desc.parent {
                None if root.is_some() => return Err(HfsmError::SecondRoot(desc.id.name())),
                None => root = Some(desc.id),
                Some(_) => {}
            }
            if let Some(initial) = desc.initial {
                if states[initial.index()].parent != Some(desc.id) {
                    return Err(HfsmError::BadInitial(desc.id.name()));
                }
            }
            let has_children = states.iter().any(|s| s.parent == Some(desc.id));
            if has_children && desc.initial.is_none() {
                return Err(HfsmError::BadInitial(desc.id.name()));
            }
            // Depth bound also rejects parent cycles.
            let mut depth = 1;
            let mut cursor = desc.parent;
            while let Some(p) = cursor {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(HfsmError::CapacityExceeded);
                }
                cursor = states[p.index()].parent;
            }
        }
        let root = root.ok_or(HfsmError::NoRoot)?;

        let mut enabled = Vec::new();
        enabled
            .resize(self.transitions.len(), true)
            .map_err(|_| HfsmError::CapacityExceeded)?;

        Ok(Hfsm {
            states,
            transitions: self.transitions,
            enabled,
            root,
            active: None,
        })
    }

    fn latch(&mut self, e: HfsmError) {
        if self.error.is_none() {
            self.error = Some(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The hierarchical state machine.
///
/// Owns the validated tables, the per-transition enabled flags and the
/// active leaf.  The context `C` is passed in on every call.
pub struct Hfsm<S: StateSet, C, E: Trigger> {
    states: Vec<StateDescriptor<S, C>, MAX_STATES>,
    transitions: Vec<Transition<S, C, E>, MAX_TRANSITIONS>,
    enabled: Vec<bool, MAX_TRANSITIONS>,
    root: S,
    active: Option<S>,
}

impl<S: StateSet, C, E: Trigger + fmt::Debug> Hfsm<S, C, E> {
    /// Start declaring a machine's states and transitions.
    pub fn builder() -> HfsmBuilder<S, C, E> {
        HfsmBuilder::new()
    }

    /// Enter the root and follow initial children down to a leaf, firing
    /// entry actions top-down.
    pub fn start(&mut self, ctx: &mut C) -> Result<(), HfsmError> {
        if self.active.is_some() {
            return Err(HfsmError::AlreadyStarted);
        }
        self.enter(self.root, ctx);
        let leaf = self.drill_initial(self.root, ctx);
        self.active = Some(leaf);
        info!("HFSM starting in state: {}", leaf.name());
        Ok(())
    }

    /// Resolve `event` against the active path and fire the winning
    /// transition, if any.
    pub fn dispatch(&mut self, ctx: &mut C, event: &E) -> Result<Dispatch, HfsmError> {
        let leaf = self.active.ok_or(HfsmError::NotStarted)?;
        let kind = event.kind();

        let mut cursor = Some(leaf);
        while let Some(state) = cursor {
            let winner = self.transitions.iter().enumerate().find(|(i, t)| {
                t.source == state
                    && self.enabled[*i]
                    && t.trigger == kind
                    && t.guard.is_none_or(|g| g(ctx, event))
            });
            if let Some((_, t)) = winner {
                let t = *t;
                self.fire(leaf, &t, ctx, event);
                return Ok(Dispatch::Fired);
            }
            cursor = self.parent(state);
        }

        trace!("HFSM ignored {:?} in {}", event, leaf.name());
        Ok(Dispatch::Ignored)
    }

    // ── Transition switches ───────────────────────────────────

    /// Re-enable a transition disabled earlier.
    pub fn enable_transition(&mut self, id: TransitionId) {
        self.switch().enable(id);
    }

    /// Make a transition invisible to dispatch.
    pub fn disable_transition(&mut self, id: TransitionId) {
        self.switch().disable(id);
    }

    pub fn is_transition_enabled(&self, id: TransitionId) -> bool {
        self.enabled.get(id.index()).copied().unwrap_or(false)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_started(&self) -> bool {
        self.active.is_some()
    }

    /// The active leaf, `None` until started.
    pub fn active_leaf(&self) -> Option<S> {
        self.active
    }

    /// True if `state` is the active leaf or one of its ancestors.
    pub fn is_active(&self, state: S) -> bool {
        self.active
            .is_some_and(|leaf| leaf == state || self.is_ancestor(state, leaf))
    }

    /// Active states from the leaf up to the root.
    pub fn active_path(&self) -> Vec<S, MAX_DEPTH> {
        let mut path = Vec::new();
        let mut cursor = self.active;
        while let Some(s) = cursor {
            if path.push(s).is_err() {
                break;
            }
            cursor = self.parent(s);
        }
        path
    }

    /// Declared parent of `state`, `None` for the root.
    pub fn parent(&self, state: S) -> Option<S> {
        self.states[state.index()].parent
    }

    pub fn state_name(&self, state: S) -> &'static str {
        state.name()
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn switch(&mut self) -> TransitionSwitch<'_> {
        TransitionSwitch {
            enabled: &mut self.enabled,
        }
    }

    /// Strict ancestry: a state is not its own ancestor.
    fn is_ancestor(&self, ancestor: S, state: S) -> bool {
        let mut cursor = self.parent(state);
        while let Some(s) = cursor {
            if s == ancestor {
                return true;
            }
            cursor = self.parent(s);
        }
        false
    }

    /// The state whose boundary the transition does not cross.
    /// `None` means the root itself is exited and re-entered.
    fn domain(&self, source: S, target: S) -> Option<S> {
        if target == source || self.is_ancestor(target, source) {
            return self.parent(target);
        }
        if self.is_ancestor(source, target) {
            return Some(source);
        }
        let mut cursor = self.parent(source);
        while let Some(s) = cursor {
            if self.is_ancestor(s, target) {
                return Some(s);
            }
            cursor = self.parent(s);
        }
        None
    }

    fn fire(&mut self, leaf: S, t: &Transition<S, C, E>, ctx: &mut C, event: &E) {
        let Some(target) = t.target else {
            debug!("HFSM internal: {} on {:?}", t.source.name(), event);
            if let Some(effect) = t.effect {
                effect(ctx, event);
            }
            return;
        };

        let domain = self.domain(t.source, target);

        // Exit leaf-first up to, not including, the domain.
        let mut cursor = Some(leaf);
        while cursor != domain {
            let Some(s) = cursor else { break };
            self.exit(s, ctx);
            cursor = self.parent(s);
        }

        if let Some(effect) = t.effect {
            effect(ctx, event);
        }

        // Enter from just below the domain down to the target.
        let mut chain: Vec<S, MAX_DEPTH> = Vec::new();
        let mut cursor = Some(target);
        while cursor != domain {
            let Some(s) = cursor else { break };
            if chain.push(s).is_err() {
                break;
            }
            cursor = self.parent(s);
        }
        for s in chain.iter().rev() {
            self.enter(*s, ctx);
        }
        let new_leaf = self.drill_initial(target, ctx);
        self.active = Some(new_leaf);

        info!("HFSM transition: {} -> {}", leaf.name(), new_leaf.name());
    }

    fn drill_initial(&mut self, from: S, ctx: &mut C) -> S {
        let mut current = from;
        while let Some(initial) = self.states[current.index()].initial {
            self.enter(initial, ctx);
            current = initial;
        }
        current
    }

    fn enter(&mut self, state: S, ctx: &mut C) {
        if let Some(f) = self.states[state.index()].on_enter {
            f(ctx, &mut self.switch());
        }
    }

    fn exit(&mut self, state: S, ctx: &mut C) {
        if let Some(f) = self.states[state.index()].on_exit {
            f(ctx, &mut self.switch());
        }
    }
}
