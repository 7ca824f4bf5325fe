//! Form provider: owns values, errors and the submit counter.
//!
//! Descendants never hold the state itself. They receive a [`FormContext`],
//! an explicit handle that reads snapshots and calls the synchronous
//! mutators. The handle only weakly references the provider, so using it
//! after the provider is dropped fails with [`FormError::Unmounted`].

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, instrument, trace};

use crate::error::{FormError, FormResult, ValidationFailure};
use crate::field::Input;
use crate::markup::Element;
use crate::schema::Schema;
use crate::types::{Errors, Issue, Values};

type SubmitHandler<T> = Box<dyn FnMut(T, &FormContext)>;
type InvalidHandler = Box<dyn FnMut(&ValidationFailure)>;
type Revalidate = Box<dyn Fn(&Values) -> Result<(), ValidationFailure>>;

/// Reduce validation issues to one message per field.
///
/// Every segment of an issue's path becomes a key carrying that issue's
/// message, and later issues overwrite earlier ones. Only single-segment
/// paths map cleanly onto flat field names; a nested path like
/// `["address", "zip"]` also writes its message under `address`.
///
/// Issues with an empty path add nothing. Root-level failures such as
/// unknown fields under strict mode or a [`Typed`](crate::Typed)
/// deserialization error therefore leave the map empty even though the
/// submit was rejected; they only reach the `on_invalid` handler.
pub fn reduce_issues(issues: &[Issue]) -> Errors {
    issues
        .iter()
        .flat_map(|issue| {
            issue
                .path
                .iter()
                .map(move |segment| (segment.to_string(), issue.message.clone()))
        })
        .collect()
}

/// Native submit event; the provider suppresses its default navigation.
#[derive(Debug, Clone, Default)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Which exit a submit took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation passed and the submit handler ran.
    Submitted,
    /// Validation failed; errors were replaced and the invalid handler ran.
    Invalid,
}

#[derive(Debug)]
struct FormState {
    values: Values,
    errors: Errors,
    submit_count: u32,
}

struct Shared {
    defaults: Values,
    state: RefCell<FormState>,
    revalidate: Revalidate,
}

impl Shared {
    fn errors_for(&self, values: &Values) -> Errors {
        match (self.revalidate)(values) {
            Ok(()) => Errors::new(),
            Err(failure) => reduce_issues(&failure.issues),
        }
    }
}

/// Handle to a provider's state, passed down to fields and handlers.
#[derive(Clone)]
pub struct FormContext {
    shared: Weak<Shared>,
}

impl FormContext {
    fn shared(&self) -> FormResult<Rc<Shared>> {
        self.shared.upgrade().ok_or(FormError::Unmounted)
    }

    /// Snapshot of all current values.
    pub fn values(&self) -> FormResult<Values> {
        Ok(self.shared()?.state.borrow().values.clone())
    }

    /// Snapshot of all current errors.
    pub fn errors(&self) -> FormResult<Errors> {
        Ok(self.shared()?.state.borrow().errors.clone())
    }

    pub fn submit_count(&self) -> FormResult<u32> {
        Ok(self.shared()?.state.borrow().submit_count)
    }

    pub fn value(&self, name: &str) -> FormResult<Option<Value>> {
        Ok(self.shared()?.state.borrow().values.get(name).cloned())
    }

    pub fn error(&self, name: &str) -> FormResult<Option<String>> {
        Ok(self.shared()?.state.borrow().errors.get(name).cloned())
    }

    /// Merge one field update into the values.
    ///
    /// Once the form has been submitted at least once, the whole updated
    /// mapping is re-validated and the errors are replaced, not merged.
    pub fn set_value(&self, name: &str, value: impl Into<Value>) -> FormResult<()> {
        let shared = self.shared()?;
        let armed = {
            let mut state = shared.state.borrow_mut();
            state.values.insert(name.to_string(), value.into());
            state.submit_count > 0
        };

        if armed {
            let snapshot = shared.state.borrow().values.clone();
            let errors = shared.errors_for(&snapshot);
            trace!(field = name, errors = errors.len(), "revalidated after change");
            shared.state.borrow_mut().errors = errors;
        }
        Ok(())
    }

    /// Restore defaults, clear errors and disarm live validation.
    pub fn reset(&self) -> FormResult<()> {
        let shared = self.shared()?;
        let mut state = shared.state.borrow_mut();
        state.values = shared.defaults.clone();
        state.errors.clear();
        state.submit_count = 0;
        debug!("form reset");
        Ok(())
    }

    /// True while the owning provider is alive.
    pub fn is_mounted(&self) -> bool {
        self.shared.strong_count() > 0
    }
}

/// Owner of a form's state and driver of its validation.
pub struct FormProvider<S: Schema> {
    shared: Rc<Shared>,
    schema: Rc<S>,
    on_submit: SubmitHandler<S::Output>,
    on_invalid: Option<InvalidHandler>,
    attrs: Vec<(String, String)>,
    submit_label: String,
}

impl<S> FormProvider<S>
where
    S: Schema + 'static,
{
    /// Mount a provider seeded with `default_values`.
    ///
    /// `on_submit` receives the parsed output and a context whose `reset`
    /// the handler may call; the provider never resets on its own.
    pub fn new<F>(default_values: Values, schema: S, on_submit: F) -> Self
    where
        F: FnMut(S::Output, &FormContext) + 'static,
    {
        let schema = Rc::new(schema);
        let revalidator = Rc::clone(&schema);
        let shared = Rc::new(Shared {
            state: RefCell::new(FormState {
                values: default_values.clone(),
                errors: Errors::new(),
                submit_count: 0,
            }),
            defaults: default_values,
            revalidate: Box::new(move |values: &Values| revalidator.validate(values).map(|_| ())),
        });

        Self {
            shared,
            schema,
            on_submit: Box::new(on_submit),
            on_invalid: None,
            attrs: Vec::new(),
            submit_label: "Submit".to_string(),
        }
    }

    /// Called with the raw failure whenever a submit is rejected.
    pub fn on_invalid<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&ValidationFailure) + 'static,
    {
        self.on_invalid = Some(Box::new(handler));
        self
    }

    /// Passthrough attribute for the rendered `<form>`.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn submit_label(mut self, label: impl Into<String>) -> Self {
        self.submit_label = label.into();
        self
    }

    pub fn context(&self) -> FormContext {
        FormContext {
            shared: Rc::downgrade(&self.shared),
        }
    }

    pub fn values(&self) -> Values {
        self.shared.state.borrow().values.clone()
    }

    pub fn errors(&self) -> Errors {
        self.shared.state.borrow().errors.clone()
    }

    pub fn submit_count(&self) -> u32 {
        self.shared.state.borrow().submit_count
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    /// Handle a native submit event.
    ///
    /// The count is bumped before validating, even when validation fails,
    /// which is what arms re-validation on later edits.
    #[instrument(skip_all, fields(submit_count = tracing::field::Empty))]
    pub fn handle_submit(&mut self, event: &mut SubmitEvent) -> SubmitOutcome {
        event.prevent_default();

        let snapshot = {
            let mut state = self.shared.state.borrow_mut();
            state.submit_count += 1;
            tracing::Span::current().record("submit_count", state.submit_count);
            state.values.clone()
        };

        match self.schema.validate(&snapshot) {
            Ok(parsed) => {
                self.shared.state.borrow_mut().errors.clear();
                debug!("submit accepted");
                let context = self.context();
                (self.on_submit)(parsed, &context);
                SubmitOutcome::Submitted
            }
            Err(failure) => {
                let errors = reduce_issues(&failure.issues);
                debug!(fields = errors.len(), "submit rejected");
                self.shared.state.borrow_mut().errors = errors;
                if let Some(on_invalid) = self.on_invalid.as_mut() {
                    on_invalid(&failure);
                }
                SubmitOutcome::Invalid
            }
        }
    }

    /// Submit as if a fresh submit event fired.
    pub fn submit(&mut self) -> SubmitOutcome {
        self.handle_submit(&mut SubmitEvent::new())
    }

    /// Render the `<form>` with each field and a submit button.
    pub fn render(&self, fields: &[&Input]) -> FormResult<Element> {
        let context = self.context();
        let mut form = Element::new("form");
        for (name, value) in &self.attrs {
            form = form.attr(name.as_str(), value.as_str());
        }
        for field in fields {
            form = form.child(field.render(&context)?);
        }
        Ok(form.child(
            Element::new("button")
                .attr("type", "submit")
                .text(self.submit_label.as_str()),
        ))
    }
}
