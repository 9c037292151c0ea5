//! Request context and the thread-bound context stack.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::error::EngineError;

/// Request parameter that carries the ajax target control id, by convention.
pub const TARGET_PARAM: &str = "trellis_target";

/// HTTP method of the incoming request.
///
/// The engine only distinguishes GET and POST; anything richer belongs to
/// the transport collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl Method {
    /// Check whether this is a POST request.
    pub fn is_post(&self) -> bool {
        matches!(self, Self::Post)
    }
}

/// Session attribute store shared between nested contexts of one outer
/// request.
///
/// The engine treats the session as an opaque key-value store and performs
/// no locking around it; callers must not assume atomicity across two
/// session operations in the same cycle.
#[derive(Debug, Clone, Default)]
pub struct SessionStore(Rc<RefCell<HashMap<String, Value>>>);

impl SessionStore {
    /// Create an empty session store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a session attribute by name.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.borrow().get(name).cloned()
    }

    /// Set a session attribute.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().insert(name.into(), value);
    }

    /// Remove a session attribute, returning the previous value.
    pub fn remove(&self, name: &str) -> Option<Value> {
        self.0.borrow_mut().remove(name)
    }

    /// Number of attributes currently stored.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Check if the session holds no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

/// One logical request cycle.
///
/// Carries the incoming parameters, request-scoped attributes, a handle to
/// the session store, and the flags the lifecycle engine keys off
/// (`is_ajax`, `is_forward`, method).
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    params: HashMap<String, String>,
    attributes: RefCell<HashMap<String, Value>>,
    session: SessionStore,
    is_ajax: bool,
    is_forward: bool,
    locale: String,
}

impl RequestContext {
    /// Create a new request context for the given method.
    pub fn new(method: Method) -> Self {
        Self {
            method,
            params: HashMap::new(),
            attributes: RefCell::new(HashMap::new()),
            session: SessionStore::new(),
            is_ajax: false,
            is_forward: false,
            locale: "en".to_string(),
        }
    }

    /// Add a request parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Attach a session store (shared with sibling/nested contexts).
    pub fn with_session(mut self, session: SessionStore) -> Self {
        self.session = session;
        self
    }

    /// Set the locale tag.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Mark this cycle as an ajax request.
    pub fn ajax(mut self) -> Self {
        self.is_ajax = true;
        self
    }

    /// Mark this cycle as reached via an internal forward.
    pub fn forward(mut self) -> Self {
        self.is_forward = true;
        self
    }

    /// Get a request parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    /// Get a request-scoped attribute by name.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        self.attributes.borrow().get(name).cloned()
    }

    /// Set a request-scoped attribute.
    pub fn set_attribute(&self, name: impl Into<String>, value: Value) {
        self.attributes.borrow_mut().insert(name.into(), value);
    }

    /// Remove a request-scoped attribute, returning the previous value.
    pub fn remove_attribute(&self, name: &str) -> Option<Value> {
        self.attributes.borrow_mut().remove(name)
    }

    /// Get the session store handle.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// HTTP method of this cycle.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Check whether this is a POST cycle.
    pub fn is_post(&self) -> bool {
        self.method.is_post()
    }

    /// Check whether this is an ajax cycle.
    pub fn is_ajax(&self) -> bool {
        self.is_ajax
    }

    /// Check whether this cycle was reached via an internal forward.
    pub fn is_forward(&self) -> bool {
        self.is_forward
    }

    /// Locale tag for this cycle.
    pub fn locale(&self) -> &str {
        &self.locale
    }
}

thread_local! {
    static STACK: RefCell<Vec<Rc<RequestContext>>> = const { RefCell::new(Vec::new()) };
}

/// Cheap cloneable handle to the context on top of the stack.
///
/// Downstream components read [`ContextStack::current`] rather than holding
/// their own reference, so a forward pushing a new context mid-cycle is
/// transparently observed.
#[derive(Debug, Clone)]
pub struct CurrentContext(Rc<RequestContext>);

impl std::ops::Deref for CurrentContext {
    type Target = RequestContext;

    fn deref(&self) -> &RequestContext {
        &self.0
    }
}

/// Process-wide, thread-scoped stack of request contexts.
///
/// Contexts pushed on one thread are invisible to another; concurrent
/// requests and concurrent simulated test cycles coexist without locking.
/// `push` returns a guard that pops on drop, so the stack depth after a
/// complete cycle equals the depth before it on every exit path, including
/// panics and error returns.
#[derive(Debug)]
pub struct ContextStack;

impl ContextStack {
    /// Push a context for the current thread and return the pop guard.
    #[must_use = "dropping the guard pops the context"]
    pub fn push(ctx: RequestContext) -> ContextGuard {
        let ctx = Rc::new(ctx);
        STACK.with(|s| s.borrow_mut().push(Rc::clone(&ctx)));
        ContextGuard { ctx }
    }

    /// Get the most recently pushed, not-yet-popped context on this thread.
    pub fn current() -> Result<CurrentContext, EngineError> {
        STACK.with(|s| {
            s.borrow()
                .last()
                .map(|rc| CurrentContext(Rc::clone(rc)))
                .ok_or(EngineError::NoActiveContext)
        })
    }

    /// Current stack depth on this thread.
    pub fn depth() -> usize {
        STACK.with(|s| s.borrow().len())
    }

    /// Forcibly reset the stack on this thread.
    ///
    /// Only for test harness use between unrelated test cases; a live
    /// [`ContextGuard`] dropped afterwards finds its context gone and
    /// leaves the stack untouched.
    pub fn clear_all() {
        STACK.with(|s| s.borrow_mut().clear());
    }
}

/// Scoped pop for a pushed request context.
#[derive(Debug)]
pub struct ContextGuard {
    ctx: Rc<RequestContext>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        STACK.with(|s| {
            let mut stack = s.borrow_mut();
            // Pop only the context this guard pushed. A guard left over from
            // before a forced reset must not pop a foreign context.
            if stack
                .last()
                .is_some_and(|top| Rc::ptr_eq(top, &self.ctx))
            {
                stack.pop();
            }
        });
    }
}
