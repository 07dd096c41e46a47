//! Store Coordinator
//!
//! Owns the link to the dispatcher (or the staged tree while a reduction
//! runs), executes actions, performs copy-on-write path updates and hands
//! out cached views. Everything is single-threaded: the store lives behind
//! an `Rc` and keeps its mutable slots in `RefCell`s.

pub mod cache;

pub use cache::ViewCache;

use crate::action::{Action, Arg, AsyncArg};
use crate::config::StoreConfig;
use crate::dispatch::Dispatcher;
use crate::error::StoreError;
use crate::protocol::{ready_args, resolve_pending, OpKind, Operation, Property, ResultBag};
use crate::schema::{SchemaKind, SchemaRef};
use crate::tree::{update_at, Node, Path};
use crate::view::{Outcome, Unpacked, View};
use std::cell::RefCell;
use std::fmt;
use std::num::NonZeroUsize;
use std::rc::{Rc, Weak};
use tracing::{debug, instrument, trace};

/// Runtime options of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// View cache capacity.
    pub max_cache: usize,
    /// Validate the staged tree against the schema before each commit.
    pub validate: bool,
    pub debug: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_cache: 1024,
            validate: false,
            debug: false,
        }
    }
}

impl From<&StoreConfig> for StoreOptions {
    fn from(config: &StoreConfig) -> Self {
        Self {
            max_cache: config.max_cache,
            validate: config.validate || config.debug,
            debug: config.debug,
        }
    }
}

pub struct Store {
    this: Weak<Store>,
    schema: SchemaRef,
    options: StoreOptions,
    dispatcher: RefCell<Option<Rc<dyn Dispatcher>>>,
    /// Tree being reduced; `Some` only while an action executes.
    staged: RefCell<Option<Node>>,
    /// Action type the next invocation must derive to run.
    verify: RefCell<Option<String>>,
    /// One-shot result of the last reduced action.
    result: RefCell<Option<Outcome>>,
    cache: RefCell<ViewCache>,
    root: RefCell<Option<Rc<View>>>,
    reads: RefCell<Option<Vec<Path>>>,
}

impl Store {
    pub fn new(schema: Option<SchemaRef>, options: StoreOptions) -> Result<Rc<Self>, StoreError> {
        let schema = schema.ok_or(StoreError::MissingSchema)?;
        let capacity = NonZeroUsize::new(options.max_cache).ok_or_else(|| {
            StoreError::ConfigError("max_cache must be greater than zero".to_string())
        })?;
        debug!(
            moniker = %schema.moniker(),
            max_cache = options.max_cache,
            validate = options.validate,
            "Creating store"
        );
        Ok(Rc::new_cyclic(|this| Store {
            this: this.clone(),
            schema,
            options,
            dispatcher: RefCell::new(None),
            staged: RefCell::new(None),
            verify: RefCell::new(None),
            result: RefCell::new(None),
            cache: RefCell::new(ViewCache::new(capacity)),
            root: RefCell::new(None),
            reads: RefCell::new(None),
        }))
    }

    /// Store with default options.
    pub fn with_schema(schema: SchemaRef) -> Result<Rc<Self>, StoreError> {
        Self::new(Some(schema), StoreOptions::default())
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn set_dispatcher(&self, dispatcher: Rc<dyn Dispatcher>) {
        *self.dispatcher.borrow_mut() = Some(dispatcher);
    }

    pub fn has_dispatcher(&self) -> bool {
        self.dispatcher.borrow().is_some()
    }

    pub fn in_reduction(&self) -> bool {
        self.staged.borrow().is_some()
    }

    /// Active tree: the staged one during a reduction, otherwise the
    /// dispatcher's committed state.
    fn active_state(&self) -> Node {
        if let Some(staged) = self.staged.borrow().as_ref() {
            return staged.clone();
        }
        let dispatcher = self.dispatcher.borrow().clone();
        match dispatcher {
            Some(dispatcher) => dispatcher.get_state(),
            None => Node::UNDEFINED,
        }
    }

    /// Node at `path`; `Undefined` on any missing segment.
    pub fn get(&self, path: &Path) -> Node {
        self.active_state().get_in(path.keys())
    }

    /// Whole tree.
    pub fn state(&self) -> Node {
        self.active_state()
    }

    /// Replace the whole tree after validating it against the schema.
    pub fn set_state(&self, value: Node) -> Result<Outcome, StoreError> {
        if let Some(message) = self.schema.validate_data(&value) {
            return Err(StoreError::InvalidState(message));
        }
        self.put(&Path::root(), value)
    }

    /// Replace the whole tree with the packed form of `value`.
    pub fn set_instance(&self, value: Node) -> Result<Outcome, StoreError> {
        self.put(&Path::root(), self.schema.pack(value))
    }

    /// Plain assignment at `path`.
    pub fn put(&self, path: &Path, value: Node) -> Result<Outcome, StoreError> {
        let action = Action::set(path.clone(), value);
        if self.in_reduction() {
            self.execute_action(&action)
        } else {
            self.dispatch(action)
        }
    }

    /// Hand an action to the dispatcher and return its one-shot result.
    pub fn dispatch(&self, action: Action) -> Result<Outcome, StoreError> {
        let dispatcher = self
            .dispatcher
            .borrow()
            .clone()
            .ok_or(StoreError::NoDispatcher)?;
        self.result.borrow_mut().take();
        trace!(action = %action.action_type, "Dispatching action");
        dispatcher.dispatch(action)?;
        Ok(self.result.borrow_mut().take().unwrap_or(Outcome::Nothing))
    }

    /// Run a mutating operation of `view`.
    ///
    /// Outside a reduction the call becomes an action for the dispatcher.
    /// Inside one it runs directly, unless the verify token names a
    /// different action type, in which case it does nothing.
    pub fn invoke(
        &self,
        view: &Rc<View>,
        action_type: &str,
        path: &Path,
        operation: &Operation,
        args: Vec<Arg>,
    ) -> Result<Outcome, StoreError> {
        if !self.in_reduction() {
            return self.dispatch(Action::method(action_type, path.clone(), args));
        }

        let expected = self.verify.borrow().clone();
        if let Some(expected) = expected {
            if expected != action_type {
                debug!(
                    expected = %expected,
                    action = %action_type,
                    "Skipping invocation from a foreign action"
                );
                return Ok(Outcome::Nothing);
            }
        }
        self.verify.borrow_mut().take();

        match operation.kind {
            OpKind::Transform(transform) => {
                let current = self.get(view.tree_path());
                let mut bag = ResultBag::default();
                let next = transform(view, &current, &args, &mut bag)?;
                if !next.same(&current) {
                    self.put(view.tree_path(), next)?;
                } else {
                    trace!(action = %action_type, "Transform left the tree unchanged");
                }
                Ok(bag.into_outcome(view))
            }
            OpKind::Direct(apply) => apply(view, &args),
        }
    }

    /// `invoke` for arguments that may still be pending. Auto-resolving
    /// operations await them leftmost first; others refuse them.
    pub async fn invoke_async(
        &self,
        view: &Rc<View>,
        action_type: &str,
        path: &Path,
        operation: &Operation,
        args: Vec<AsyncArg>,
    ) -> Result<Outcome, StoreError> {
        let args = if operation.auto_resolve {
            resolve_pending(args).await?
        } else {
            ready_args(args)?
        };
        self.invoke(view, action_type, path, operation, args)
    }

    /// Property assignment with a custom setter, following the same
    /// protocol as `invoke`.
    pub fn assign(
        &self,
        view: &Rc<View>,
        action_type: &str,
        path: &Path,
        property: &Property,
        value: Node,
    ) -> Result<Outcome, StoreError> {
        if !self.in_reduction() {
            return self.dispatch(Action::assign(action_type, path.clone(), value));
        }

        let expected = self.verify.borrow().clone();
        if let Some(expected) = expected {
            if expected != action_type {
                debug!(
                    expected = %expected,
                    action = %action_type,
                    "Skipping assignment from a foreign action"
                );
                return Ok(Outcome::Nothing);
            }
        }
        self.verify.borrow_mut().take();
        (property.set)(view, value)
    }

    /// Reduction entry point for the dispatcher.
    ///
    /// An undefined state is replaced by the schema default. Actions without
    /// a path pass the state through untouched. On error the staged tree is
    /// discarded and the caller's state stays current.
    #[instrument(skip(self, state, action), fields(action = %action.action_type))]
    pub fn reduce(&self, state: Node, action: &Action) -> Result<Node, StoreError> {
        let state = if state.is_undefined() {
            self.schema.default_value()
        } else {
            state
        };
        if action.path.is_none() {
            return Ok(state);
        }
        if self.in_reduction() {
            return Err(StoreError::InvalidOperation(format!(
                "{} dispatched while another action is being reduced",
                action.action_type
            )));
        }

        *self.staged.borrow_mut() = Some(state);
        let outcome = self.execute_action(action);
        let staged = self.staged.borrow_mut().take();
        self.verify.borrow_mut().take();

        let outcome = outcome?;
        let next = staged.unwrap_or_default();
        if self.options.validate {
            if let Some(message) = self.schema.validate_data(&next) {
                return Err(StoreError::InvalidState(message));
            }
        }
        *self.result.borrow_mut() = Some(outcome);
        debug!("Reduced action");
        Ok(next)
    }

    /// Execute `action` against the staged tree.
    pub fn execute_action(&self, action: &Action) -> Result<Outcome, StoreError> {
        if !self.in_reduction() {
            return Err(StoreError::InvalidOperation(format!(
                "{} executed outside a reduction",
                action.action_type
            )));
        }
        let Some(path) = action.path.as_ref() else {
            return Ok(Outcome::Nothing);
        };

        if action.is_plain_assignment() {
            let value = action.value.clone().unwrap_or_default();
            let current = self.staged.borrow().clone().unwrap_or_default();
            let next = update_at(&current, path.keys(), value)?;
            if !next.same(&current) {
                trace!(path = %path, "Committed path update");
                *self.staged.borrow_mut() = Some(next);
            }
            return Ok(Outcome::Nothing);
        }

        let (name, view_path) = path.split_last().ok_or_else(|| {
            StoreError::InvalidOperation(format!("{} has an empty path", action.action_type))
        })?;
        let view = self.traverse_path(&view_path)?;

        *self.verify.borrow_mut() = Some(action.action_type.clone());
        let outcome = match &action.args {
            Some(args) => view.invoke_operation(&name.as_name(), args.clone()),
            None => view.apply_prop(name, action.value.clone().unwrap_or_default()),
        };
        self.verify.borrow_mut().take();
        outcome
    }

    /// Descend from the root view through child views.
    pub fn traverse_path(&self, path: &Path) -> Result<Rc<View>, StoreError> {
        let not_found = || StoreError::PathNotFound(path.clone());
        let mut current = match self.instance() {
            Unpacked::View(view) => view,
            Unpacked::Value(_) => return Err(not_found()),
        };
        for key in path.keys() {
            current = match current.get(key) {
                Unpacked::View(view) => view,
                Unpacked::Value(_) => return Err(not_found()),
            };
        }
        Ok(current)
    }

    /// Resolve the value or view for `schema` at a path.
    ///
    /// Scalars are returned as plain values and never cached. For
    /// containers a cached view with the same moniker is promoted and
    /// reused unless `existing` is supplied; otherwise the supplied (or a
    /// freshly built) view is installed.
    pub fn unpack(
        &self,
        schema: SchemaRef,
        tree_path: Path,
        view_path: Path,
        existing: Option<Rc<View>>,
        parent: Option<&Rc<View>>,
    ) -> Unpacked {
        if schema.kind() == SchemaKind::Scalar {
            return Unpacked::Value(self.get(&tree_path));
        }

        let moniker = schema.moniker();
        if existing.is_none() {
            let hit = self.cache.borrow_mut().touch(&view_path, &moniker);
            if let Some(view) = hit {
                return Unpacked::View(view);
            }
        }

        let view = match existing {
            Some(view) if *view.moniker() == moniker => view,
            _ => {
                trace!(path = %view_path, moniker = %moniker, "Building view");
                View::new(
                    self.this.clone(),
                    schema,
                    moniker,
                    tree_path,
                    view_path.clone(),
                    parent,
                )
            }
        };
        self.cache.borrow_mut().install(view_path, view.clone());
        Unpacked::View(view)
    }

    /// Root view, built once for the lifetime of the store.
    pub fn instance(&self) -> Unpacked {
        let memo = self.root.borrow().clone();
        if let Some(root) = memo {
            return Unpacked::View(root);
        }
        let unpacked = self.unpack(self.schema.clone(), Path::root(), Path::root(), None, None);
        if let Unpacked::View(view) = &unpacked {
            *self.root.borrow_mut() = Some(view.clone());
        }
        unpacked
    }

    /// Note a read dependency while reads are being tracked.
    pub fn record_read(&self, path: Path) {
        if let Some(reads) = self.reads.borrow_mut().as_mut() {
            reads.push(path);
        }
    }

    /// Run `f` and collect the paths it read through views.
    pub fn track_reads<T>(&self, f: impl FnOnce() -> T) -> (T, Vec<Path>) {
        let outer = self.reads.borrow_mut().replace(Vec::new());
        let value = f();
        let reads = self.reads.borrow_mut().take().unwrap_or_default();
        if let Some(mut outer) = outer {
            outer.extend(reads.iter().cloned());
            *self.reads.borrow_mut() = Some(outer);
        }
        (value, reads)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache.borrow().capacity()
    }

    /// Cached view at `path` without touching recency.
    pub fn cached_view(&self, path: &Path) -> Option<Rc<View>> {
        self.cache.borrow().peek(path).cloned()
    }

    /// Cached paths, most recent first.
    pub fn cached_paths(&self) -> Vec<Path> {
        self.cache.borrow().paths()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("moniker", &self.schema.moniker().to_string())
            .field("options", &self.options)
            .field("has_dispatcher", &self.has_dispatcher())
            .field("in_reduction", &self.in_reduction())
            .field("cached_views", &self.cache_len())
            .finish()
    }
}
