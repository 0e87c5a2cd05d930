//! Table driven grammars.
//!
//! A grammar maps `(state, tag)` to an action and the next state. Tables
//! are built once and only read afterwards, so a single table serves any
//! number of concurrent decodes. Everything a decode mutates lives in the
//! [`Container`] of its own frame.

use super::{Tag, TagClass};
use crate::core::messages::{Message, MessageType};
use crate::error::{ProtocolError, Result};
use log::{error, warn};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

/// Accumulator of a message being decoded.
pub trait Container: Default + Send + 'static {
    type State: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// State before the first tag of the message.
    const START: Self::State;

    fn grammar() -> &'static Grammar<Self>;

    /// Turns the accumulated fields into the decoded message. Only called
    /// when the grammar ended in an accepting state.
    fn finish(self) -> Result<Message>;
}

pub type StoreFn<C> = fn(&mut C, &[u8]) -> Result<()>;
pub type MergeFn<C> = fn(&mut C, Message) -> Result<()>;

pub enum Action<C> {
    /// Opens an explicit tag that wraps exactly one element.
    Explicit,
    /// Like `Explicit`, recording the tag in the container first.
    ExplicitMark(fn(&mut C)),
    /// Opens a SEQUENCE or SEQUENCE OF.
    Constructed,
    /// Decodes the value of a primitive element.
    Store(StoreFn<C>),
    /// The element is a message of its own, decoded by its own grammar in a
    /// child frame and merged back once complete.
    Nested(MessageType, MergeFn<C>),
}

impl<C> Clone for Action<C> {
    fn clone(&self) -> Self {
        match self {
            Action::Explicit => Action::Explicit,
            Action::ExplicitMark(f) => Action::ExplicitMark(*f),
            Action::Constructed => Action::Constructed,
            Action::Store(f) => Action::Store(*f),
            Action::Nested(message_type, f) => Action::Nested(*message_type, *f),
        }
    }
}

pub struct Transition<C: Container> {
    pub action: Action<C>,
    pub next: C::State,
    pub allow_empty: bool,
}

pub struct Grammar<C: Container> {
    name: &'static str,
    table: HashMap<(C::State, Tag), Transition<C>>,
    accepting: HashSet<C::State>,
    extensible: HashSet<C::State>,
    closing: HashMap<C::State, C::State>,
    /// Highest context tag number of any field, extensions lie above it.
    last_field: Option<u32>,
}

impl<C: Container> Grammar<C> {
    pub fn new(name: &'static str) -> Self {
        return Self {
            name,
            table: HashMap::new(),
            accepting: HashSet::new(),
            extensible: HashSet::new(),
            closing: HashMap::new(),
            last_field: None,
        };
    }

    pub fn name(&self) -> &'static str {
        return self.name;
    }

    pub fn on(
        self,
        state: C::State,
        tag: Tag,
        action: Action<C>,
        next: C::State,
    ) -> Self {
        return self.insert(&[state], tag, action, next, false);
    }

    /// Same transition from several states, used where optional fields
    /// can be absent.
    pub fn on_any(
        self,
        states: &[C::State],
        tag: Tag,
        action: Action<C>,
        next: C::State,
    ) -> Self {
        return self.insert(states, tag, action, next, false);
    }

    /// Transition whose element may have zero length.
    pub fn on_maybe_empty(
        self,
        state: C::State,
        tag: Tag,
        action: Action<C>,
        next: C::State,
    ) -> Self {
        return self.insert(&[state], tag, action, next, true);
    }

    /// States in which the message may end.
    pub fn accept(mut self, states: &[C::State]) -> Self {
        self.accepting.extend(states.iter().copied());
        return self;
    }

    /// States followed by OPTIONAL fields, where context tags above the
    /// last known field are skipped instead of rejected. Known tags out of
    /// place are always rejected.
    pub fn extensible(mut self, states: &[C::State]) -> Self {
        self.extensible.extend(states.iter().copied());
        return self;
    }

    /// State entered when a SEQUENCE OF or explicit tag closes while the
    /// frame is in `state`. Loops over SEQUENCE OF elements use it to stop
    /// accepting elements once their list has ended.
    pub fn on_close(mut self, state: C::State, next: C::State) -> Self {
        self.closing.insert(state, next);
        return self;
    }

    fn insert(
        mut self,
        states: &[C::State],
        tag: Tag,
        action: Action<C>,
        next: C::State,
        allow_empty: bool,
    ) -> Self {
        if tag.class == TagClass::Context {
            self.last_field = self.last_field.max(Some(tag.number));
        }
        for state in states {
            self.table.insert(
                (*state, tag),
                Transition {
                    action: action.clone(),
                    next,
                    allow_empty,
                },
            );
        }
        return self;
    }

    pub fn lookup(&self, state: C::State, tag: Tag) -> Option<&Transition<C>> {
        return self.table.get(&(state, tag));
    }

    pub fn is_accepting(&self, state: C::State) -> bool {
        return self.accepting.contains(&state);
    }

    pub fn is_extensible(&self, state: C::State) -> bool {
        return self.extensible.contains(&state);
    }

    /// Whether `tag` is an extension this grammar does not know, which
    /// may be skipped in an extensible state.
    pub fn is_extension(&self, state: C::State, tag: Tag) -> bool {
        if tag.class != TagClass::Context || !self.is_extensible(state) {
            return false;
        }
        return match self.last_field {
            Some(last_field) => tag.number > last_field,
            None => true,
        };
    }

    pub fn closed(&self, state: C::State) -> Option<C::State> {
        return self.closing.get(&state).copied();
    }
}

/// What the decoder must do with the TLV whose tag was just matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Explicit { allow_empty: bool },
    Constructed { allow_empty: bool },
    Primitive { allow_empty: bool },
    Nested(MessageType),
    Skip,
}

/// Type erased frame, so frames of different containers share one stack.
pub trait Frame: Send {
    fn transit(&mut self, tag: Tag) -> Result<Step>;
    fn store(&mut self, value: &[u8]) -> Result<()>;
    fn merge(&mut self, message: Message) -> Result<()>;
    /// Called when a SEQUENCE OF or explicit tag opened by this frame has
    /// been fully consumed.
    fn scope_closed(&mut self);
    fn finish(self: Box<Self>) -> Result<Message>;
}

enum Pending<C> {
    None,
    Store(StoreFn<C>),
    Merge(MergeFn<C>),
}

pub struct GrammarFrame<C: Container> {
    container: C,
    state: C::State,
    pending: Pending<C>,
}

impl<C: Container> GrammarFrame<C> {
    pub fn new() -> Self {
        return Self {
            container: C::default(),
            state: C::START,
            pending: Pending::None,
        };
    }

    pub fn boxed() -> Box<dyn Frame> {
        return Box::new(Self::new());
    }
}

impl<C: Container> Frame for GrammarFrame<C> {
    fn transit(&mut self, tag: Tag) -> Result<Step> {
        let grammar = C::grammar();
        let transition = match grammar.lookup(self.state, tag) {
            Some(transition) => transition,
            None => {
                if grammar.is_extension(self.state, tag) {
                    warn!(
                        "{}: skipping unknown {} in state {:?}",
                        grammar.name(),
                        tag,
                        self.state
                    );
                    return Ok(Step::Skip);
                }
                error!(
                    "{}: unexpected {} in state {:?}",
                    grammar.name(),
                    tag,
                    self.state
                );
                return Err(ProtocolError::UnexpectedTag {
                    grammar: grammar.name(),
                    state: format!("{:?}", self.state),
                    tag,
                })?;
            }
        };

        self.state = transition.next;
        let allow_empty = transition.allow_empty;
        let step = match &transition.action {
            Action::Explicit => Step::Explicit { allow_empty },
            Action::ExplicitMark(mark) => {
                mark(&mut self.container);
                Step::Explicit { allow_empty }
            }
            Action::Constructed => Step::Constructed { allow_empty },
            Action::Store(store) => {
                self.pending = Pending::Store(*store);
                Step::Primitive { allow_empty }
            }
            Action::Nested(message_type, merge) => {
                self.pending = Pending::Merge(*merge);
                Step::Nested(*message_type)
            }
        };
        return Ok(step);
    }

    fn store(&mut self, value: &[u8]) -> Result<()> {
        match std::mem::replace(&mut self.pending, Pending::None) {
            Pending::Store(store) => return store(&mut self.container, value),
            _ => {
                return Err(ProtocolError::invalid(
                    C::grammar().name(),
                    "primitive value without a pending action",
                ))?
            }
        }
    }

    fn merge(&mut self, message: Message) -> Result<()> {
        match std::mem::replace(&mut self.pending, Pending::None) {
            Pending::Merge(merge) => return merge(&mut self.container, message),
            _ => {
                return Err(ProtocolError::invalid(
                    C::grammar().name(),
                    "nested message without a pending action",
                ))?
            }
        }
    }

    fn scope_closed(&mut self) {
        if let Some(next) = C::grammar().closed(self.state) {
            self.state = next;
        }
    }

    fn finish(self: Box<Self>) -> Result<Message> {
        let grammar = C::grammar();
        if !grammar.is_accepting(self.state) {
            return Err(ProtocolError::Incomplete {
                grammar: grammar.name(),
                state: format!("{:?}", self.state),
            })?;
        }
        return self.container.finish();
    }
}
