//! Rendering capability
//!
//! The `React` object handed to the executed unit: `createElement`, `Fragment`
//! and the hooks. Hook state lives in a [`HookStore`] keyed by component
//! instance path; the materializer drives it pass by pass.

use std::mem;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use super::builtins::Intrinsic;
use super::fault::{ErrorKind, Fault};
use super::value::{same_value, Callable, Element, Object, Value, FRAGMENT_SYMBOL};
use super::Interpreter;

const INVALID_HOOK_CALL: &str = "Invalid hook call. Hooks can only be called inside of the body of a function component.";

/// Builds the capability object passed to the executable unit.
pub fn capability<'a>() -> Value<'a> {
    let mut react = Object::default();
    for intrinsic in [
        Intrinsic::CreateElement,
        Intrinsic::UseState,
        Intrinsic::UseReducer,
        Intrinsic::UseEffect,
        Intrinsic::UseLayoutEffect,
        Intrinsic::UseMemo,
        Intrinsic::UseCallback,
        Intrinsic::UseRef,
    ] {
        react.set(intrinsic.name(), Value::intrinsic(intrinsic));
    }
    react.set("Fragment", Value::Symbol(FRAGMENT_SYMBOL));
    Value::object(react)
}

pub(crate) fn call_capability<'a>(
    interp: &mut Interpreter<'a>,
    intrinsic: Intrinsic,
    args: Vec<Value<'a>>,
) -> Result<Value<'a>, Fault<'a>> {
    let mut args = args.into_iter();
    let mut next = || args.next().unwrap_or(Value::Undefined);
    match intrinsic {
        Intrinsic::CreateElement => {
            let kind = next();
            let props = next();
            create_element(kind, props, args.collect())
        }
        Intrinsic::UseState => use_state(interp, next()),
        Intrinsic::UseReducer => {
            let (reducer, initial, init) = (next(), next(), next());
            use_reducer(interp, reducer, initial, init)
        }
        Intrinsic::UseEffect => {
            let (callback, deps) = (next(), next());
            use_effect(interp, callback, deps, false)
        }
        Intrinsic::UseLayoutEffect => {
            let (callback, deps) = (next(), next());
            use_effect(interp, callback, deps, true)
        }
        Intrinsic::UseMemo => {
            let (factory, deps) = (next(), next());
            use_memo(interp, factory, deps, false)
        }
        Intrinsic::UseCallback => {
            let (callback, deps) = (next(), next());
            use_memo(interp, callback, deps, true)
        }
        Intrinsic::UseRef => use_ref(interp, next()),
        other => Err(Fault::type_error(format!(
            "{} is not a rendering capability",
            other.name()
        ))),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ELEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

fn create_element<'a>(
    kind: Value<'a>,
    config: Value<'a>,
    children: Vec<Value<'a>>,
) -> Result<Value<'a>, Fault<'a>> {
    let mut props = Object::default();
    let mut key = None;
    if let Value::Object(config) = &config {
        for (name, value) in config.borrow().entries() {
            match name.as_ref() {
                "key" => {
                    if !value.is_nullish() {
                        key = Some(value.to_property_key());
                    }
                }
                "ref" => {}
                _ => props.set(name, value.clone()),
            }
        }
    }

    let mut children = children;
    match children.len() {
        0 => {}
        1 => props.set("children", children.remove(0)),
        _ => props.set("children", Value::array(children)),
    }

    Ok(Value::Element(Rc::new(Element {
        kind,
        key,
        props: Rc::new(std::cell::RefCell::new(props)),
    })))
}

// ═══════════════════════════════════════════════════════════════════════════════
// HOOK STORE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub enum HookSlot<'a> {
    State {
        value: Value<'a>,
        setter: Value<'a>,
    },
    Reducer {
        state: Value<'a>,
        reducer: Value<'a>,
        dispatch: Value<'a>,
    },
    Effect {
        /// Dependencies of the last run; `None` means "every render".
        deps: Option<Vec<Value<'a>>>,
        cleanup: Option<Value<'a>>,
        ran: bool,
    },
    Memo {
        deps: Option<Vec<Value<'a>>>,
        value: Value<'a>,
    },
    Ref(Value<'a>),
}

impl HookSlot<'_> {
    fn kind(&self) -> &'static str {
        match self {
            HookSlot::State { .. } => "useState",
            HookSlot::Reducer { .. } => "useReducer",
            HookSlot::Effect { .. } => "useEffect",
            HookSlot::Memo { .. } => "useMemo",
            HookSlot::Ref(_) => "useRef",
        }
    }
}

struct Frame {
    instance: Rc<str>,
    cursor: usize,
    mounting: bool,
}

struct PendingEffect<'a> {
    instance: Rc<str>,
    slot: usize,
    callback: Value<'a>,
    deps: Option<Vec<Value<'a>>>,
    layout: bool,
}

/// Per-cycle hook state for every mounted component instance.
#[derive(Default)]
pub struct HookStore<'a> {
    instances: FxHashMap<Rc<str>, Vec<HookSlot<'a>>>,
    frames: Vec<Frame>,
    /// A state update landed since the current pass started.
    dirty: bool,
    /// Effects scheduled by instances still rendering.
    pending: Vec<PendingEffect<'a>>,
    /// Effects of completed instances, children before parents.
    committed: Vec<PendingEffect<'a>>,
    rendered: FxHashSet<Rc<str>>,
}

impl<'a> HookStore<'a> {
    /// Resets per-pass bookkeeping; hook state is kept.
    pub fn start_pass(&mut self) {
        self.frames.clear();
        self.pending.clear();
        self.committed.clear();
        self.rendered.clear();
        self.dirty = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn begin_component(&mut self, instance: Rc<str>) {
        let mounting = !self.instances.contains_key(&instance);
        if mounting {
            self.instances.insert(instance.clone(), Vec::new());
        }
        self.frames.push(Frame {
            instance,
            cursor: 0,
            mounting,
        });
    }

    /// Closes the innermost component frame, checking the hook count.
    pub fn end_component(&mut self) -> Result<(), Fault<'a>> {
        let Some(frame) = self.frames.pop() else {
            return Ok(());
        };
        let expected = self
            .instances
            .get(&frame.instance)
            .map(Vec::len)
            .unwrap_or_default();
        if !frame.mounting && frame.cursor < expected {
            return Err(Fault::new(
                ErrorKind::Error,
                "Rendered fewer hooks than expected. This may be caused by an accidental early return statement.",
            ));
        }
        Ok(())
    }

    /// Abandons the innermost frame after a fault.
    pub fn abort_component(&mut self) {
        self.frames.pop();
    }

    /// Marks `instance` (and its subtree) as rendered in this pass and commits
    /// its scheduled effects.
    pub fn complete_instance(&mut self, instance: &Rc<str>) {
        self.rendered.insert(instance.clone());
        let (own, rest): (Vec<_>, Vec<_>) = mem::take(&mut self.pending)
            .into_iter()
            .partition(|effect| &effect.instance == instance);
        self.pending = rest;
        self.committed.extend(own);
    }

    /// Drops all state; closures held by slots are released with it.
    pub fn clear(&mut self) {
        self.instances.clear();
        self.frames.clear();
        self.pending.clear();
        self.committed.clear();
        self.rendered.clear();
    }

    fn claim_slot(&mut self) -> Result<(Rc<str>, usize, bool), Fault<'a>> {
        let Some(frame) = self.frames.last_mut() else {
            return Err(Fault::new(ErrorKind::Error, INVALID_HOOK_CALL));
        };
        let index = frame.cursor;
        frame.cursor += 1;
        let len = self
            .instances
            .get(&frame.instance)
            .map(Vec::len)
            .unwrap_or_default();
        if !frame.mounting && index >= len {
            return Err(Fault::new(
                ErrorKind::Error,
                "Rendered more hooks than during the previous render.",
            ));
        }
        Ok((frame.instance.clone(), index, frame.mounting))
    }

    fn slot(&self, instance: &str, index: usize) -> Option<&HookSlot<'a>> {
        self.instances.get(instance)?.get(index)
    }

    fn slot_mut(&mut self, instance: &str, index: usize) -> Option<&mut HookSlot<'a>> {
        self.instances.get_mut(instance)?.get_mut(index)
    }

    fn put(&mut self, instance: &Rc<str>, index: usize, slot: HookSlot<'a>) {
        let slots = self.instances.entry(instance.clone()).or_default();
        match slots.get_mut(index) {
            Some(existing) => *existing = slot,
            None => slots.push(slot),
        }
    }
}

/// Reads the slot claimed by a hook on update, checking the hook kind.
fn existing<'a>(
    interp: &Interpreter<'a>,
    instance: &str,
    index: usize,
    kind: &str,
) -> Result<HookSlot<'a>, Fault<'a>> {
    match interp.hooks.slot(instance, index) {
        Some(slot) if slot.kind() == kind => Ok(slot.clone()),
        Some(slot) => Err(Fault::new(
            ErrorKind::Error,
            format!(
                "React has detected a change in the order of Hooks: expected {} but found {}.",
                slot.kind(),
                kind
            ),
        )),
        None => Err(Fault::new(
            ErrorKind::Error,
            "Rendered more hooks than during the previous render.",
        )),
    }
}

fn dependency_list<'a>(deps: &Value<'a>) -> Option<Vec<Value<'a>>> {
    match deps {
        Value::Array(items) => Some(items.borrow().to_vec()),
        _ => None,
    }
}

fn deps_changed<'a>(old: &Option<Vec<Value<'a>>>, new: &Option<Vec<Value<'a>>>) -> bool {
    match (old, new) {
        (Some(old), Some(new)) => {
            old.len() != new.len() || old.iter().zip(new).any(|(a, b)| !same_value(a, b))
        }
        _ => true,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HOOKS
// ═══════════════════════════════════════════════════════════════════════════════

fn use_state<'a>(interp: &mut Interpreter<'a>, initial: Value<'a>) -> Result<Value<'a>, Fault<'a>> {
    let (instance, index, mounting) = interp.hooks.claim_slot()?;
    if !mounting {
        if let HookSlot::State { value, setter } = existing(interp, &instance, index, "useState")? {
            return Ok(Value::array(vec![value, setter]));
        }
    }
    let value = if initial.is_callable() {
        interp.call(&initial, Value::Undefined, Vec::new())?
    } else {
        initial
    };
    let setter = Value::function(Callable::StateSetter {
        instance: instance.clone(),
        slot: index,
    });
    interp.hooks.put(
        &instance,
        index,
        HookSlot::State {
            value: value.clone(),
            setter: setter.clone(),
        },
    );
    Ok(Value::array(vec![value, setter]))
}

fn use_reducer<'a>(
    interp: &mut Interpreter<'a>,
    reducer: Value<'a>,
    initial: Value<'a>,
    init: Value<'a>,
) -> Result<Value<'a>, Fault<'a>> {
    let (instance, index, mounting) = interp.hooks.claim_slot()?;
    if !mounting {
        if let HookSlot::Reducer { state, dispatch, .. } =
            existing(interp, &instance, index, "useReducer")?
        {
            // The latest reducer wins, as it may close over fresh props.
            if let Some(HookSlot::Reducer { reducer: slot, .. }) =
                interp.hooks.slot_mut(&instance, index)
            {
                *slot = reducer;
            }
            return Ok(Value::array(vec![state, dispatch]));
        }
    }
    let state = if init.is_callable() {
        interp.call(&init, Value::Undefined, vec![initial])?
    } else {
        initial
    };
    let dispatch = Value::function(Callable::Dispatch {
        instance: instance.clone(),
        slot: index,
    });
    interp.hooks.put(
        &instance,
        index,
        HookSlot::Reducer {
            state: state.clone(),
            reducer,
            dispatch: dispatch.clone(),
        },
    );
    Ok(Value::array(vec![state, dispatch]))
}

fn use_effect<'a>(
    interp: &mut Interpreter<'a>,
    callback: Value<'a>,
    deps: Value<'a>,
    layout: bool,
) -> Result<Value<'a>, Fault<'a>> {
    let (instance, index, mounting) = interp.hooks.claim_slot()?;
    let deps = dependency_list(&deps);
    let schedule = if mounting {
        interp.hooks.put(
            &instance,
            index,
            HookSlot::Effect {
                deps: None,
                cleanup: None,
                ran: false,
            },
        );
        true
    } else {
        match existing(interp, &instance, index, "useEffect")? {
            HookSlot::Effect { deps: old, ran, .. } => !ran || deps_changed(&old, &deps),
            _ => false,
        }
    };
    if schedule {
        interp.hooks.pending.push(PendingEffect {
            instance,
            slot: index,
            callback,
            deps,
            layout,
        });
    }
    Ok(Value::Undefined)
}

fn use_memo<'a>(
    interp: &mut Interpreter<'a>,
    factory: Value<'a>,
    deps: Value<'a>,
    callback: bool,
) -> Result<Value<'a>, Fault<'a>> {
    let (instance, index, mounting) = interp.hooks.claim_slot()?;
    let deps = dependency_list(&deps);
    if !mounting {
        if let HookSlot::Memo { deps: old, value } = existing(interp, &instance, index, "useMemo")? {
            if !deps_changed(&old, &deps) {
                return Ok(value);
            }
        }
    }
    let value = if callback {
        factory
    } else {
        interp.call(&factory, Value::Undefined, Vec::new())?
    };
    interp.hooks.put(
        &instance,
        index,
        HookSlot::Memo {
            deps,
            value: value.clone(),
        },
    );
    Ok(value)
}

fn use_ref<'a>(interp: &mut Interpreter<'a>, initial: Value<'a>) -> Result<Value<'a>, Fault<'a>> {
    let (instance, index, mounting) = interp.hooks.claim_slot()?;
    if !mounting {
        if let HookSlot::Ref(object) = existing(interp, &instance, index, "useRef")? {
            return Ok(object);
        }
    }
    let mut object = Object::default();
    object.set("current", initial);
    let object = Value::object(object);
    interp.hooks.put(&instance, index, HookSlot::Ref(object.clone()));
    Ok(object)
}

// ═══════════════════════════════════════════════════════════════════════════════
// UPDATES
// ═══════════════════════════════════════════════════════════════════════════════

pub(crate) fn set_state<'a>(
    interp: &mut Interpreter<'a>,
    instance: &Rc<str>,
    slot: usize,
    args: Vec<Value<'a>>,
) -> Result<Value<'a>, Fault<'a>> {
    let Some(HookSlot::State { value: current, .. }) = interp.hooks.slot(instance, slot).cloned()
    else {
        // Updates to unmounted instances are ignored.
        return Ok(Value::Undefined);
    };
    let update = args.into_iter().next().unwrap_or(Value::Undefined);
    let next = if update.is_callable() {
        interp.call(&update, Value::Undefined, vec![current.clone()])?
    } else {
        update
    };
    if !same_value(&current, &next) {
        if let Some(HookSlot::State { value, .. }) = interp.hooks.slot_mut(instance, slot) {
            *value = next;
        }
        interp.hooks.dirty = true;
    }
    Ok(Value::Undefined)
}

pub(crate) fn dispatch<'a>(
    interp: &mut Interpreter<'a>,
    instance: &Rc<str>,
    slot: usize,
    args: Vec<Value<'a>>,
) -> Result<Value<'a>, Fault<'a>> {
    let Some(HookSlot::Reducer { state, reducer, .. }) = interp.hooks.slot(instance, slot).cloned()
    else {
        return Ok(Value::Undefined);
    };
    let action = args.into_iter().next().unwrap_or(Value::Undefined);
    let next = interp.call(&reducer, Value::Undefined, vec![state.clone(), action])?;
    if !same_value(&state, &next) {
        if let Some(HookSlot::Reducer { state, .. }) = interp.hooks.slot_mut(instance, slot) {
            *state = next;
        }
        interp.hooks.dirty = true;
    }
    Ok(Value::Undefined)
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMMIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Tears down instances that were not rendered in the last pass, running their
/// effect cleanups.
pub fn unmount_missing<'a>(interp: &mut Interpreter<'a>) -> Result<(), Fault<'a>> {
    let mut gone: Vec<Rc<str>> = interp
        .hooks
        .instances
        .keys()
        .filter(|instance| !interp.hooks.rendered.contains(*instance))
        .cloned()
        .collect();
    gone.sort();
    for instance in gone {
        let Some(slots) = interp.hooks.instances.remove(&instance) else {
            continue;
        };
        for slot in slots {
            if let HookSlot::Effect {
                cleanup: Some(cleanup),
                ..
            } = slot
            {
                interp.call(&cleanup, Value::Undefined, Vec::new())?;
            }
        }
    }
    Ok(())
}

/// Runs committed effects: every stale cleanup first, then layout effects, then
/// passive ones, each group children before parents.
pub fn run_effects<'a>(interp: &mut Interpreter<'a>) -> Result<(), Fault<'a>> {
    let committed = mem::take(&mut interp.hooks.committed);

    for effect in &committed {
        let cleanup = match interp.hooks.slot_mut(&effect.instance, effect.slot) {
            Some(HookSlot::Effect { cleanup, .. }) => cleanup.take(),
            _ => None,
        };
        if let Some(cleanup) = cleanup {
            interp.call(&cleanup, Value::Undefined, Vec::new())?;
        }
    }

    for layout in [true, false] {
        for effect in committed.iter().filter(|effect| effect.layout == layout) {
            let result = interp.call(&effect.callback, Value::Undefined, Vec::new())?;
            if let Some(HookSlot::Effect { deps, cleanup, ran }) =
                interp.hooks.slot_mut(&effect.instance, effect.slot)
            {
                *deps = effect.deps.clone();
                *cleanup = result.is_callable().then_some(result);
                *ran = true;
            }
        }
    }
    Ok(())
}
