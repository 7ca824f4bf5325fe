//! Field binder: a labelled, controlled input bound to a form context.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use crate::error::FormResult;
use crate::form::FormContext;
use crate::markup::Element;

static FIELD_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

/// Attributes the binder owns; passthrough values for these are ignored.
const RESERVED_ATTRS: &[&str] = &["id", "name", "value", "checked"];

/// Prefix of generated field ids.
pub const FIELD_ID_PREFIX: &str = "formstate-field";

/// A user edit, handed to the caller's change handler before it reaches
/// the form.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub name: String,
    pub value: Value,
}

type ChangeHandler = Box<dyn FnMut(&ChangeEvent)>;

pub struct Input {
    name: String,
    label: String,
    generated_id: String,
    explicit_id: Option<String>,
    attrs: Vec<(String, String)>,
    on_change: Option<ChangeHandler>,
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("id", &self.element_id())
            .field("attrs", &self.attrs)
            .finish_non_exhaustive()
    }
}

impl Input {
    /// Create a field; its generated id stays fixed for this instance.
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        let seq = FIELD_ID_ALLOCATOR.fetch_add(1, Ordering::Relaxed);
        Self {
            name: name.into(),
            label: label.into(),
            generated_id: format!("{}-{}", FIELD_ID_PREFIX, seq),
            explicit_id: None,
            attrs: Vec::new(),
            on_change: None,
        }
    }

    /// Use a caller-supplied id instead of the generated one.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.explicit_id = Some(id.into());
        self
    }

    /// Passthrough attribute for the rendered `<input>`.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn on_change<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&ChangeEvent) + 'static,
    {
        self.on_change = Some(Box::new(handler));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Effective id linking the label to the control.
    pub fn element_id(&self) -> &str {
        self.explicit_id.as_deref().unwrap_or(&self.generated_id)
    }

    /// Render label, control and (when present) the field's error alert.
    pub fn render(&self, ctx: &FormContext) -> FormResult<Element> {
        let id = self.element_id();
        let value = ctx.value(&self.name)?;
        let error = ctx.error(&self.name)?.filter(|message| !message.is_empty());

        let mut control = Element::new("input").attr("id", id).attr("name", &*self.name);
        for (name, attr_value) in &self.attrs {
            if !RESERVED_ATTRS.contains(&name.as_str()) {
                control = control.attr(name.as_str(), attr_value.as_str());
            }
        }

        let control = match value {
            Some(Value::Bool(checked)) => {
                let control = if control.has_attr("type") {
                    control
                } else {
                    control.attr("type", "checkbox")
                };
                if checked {
                    control.attr("checked", "")
                } else {
                    control
                }
            }
            other => control.attr("value", display_value(other.as_ref())),
        };

        let error_id = format!("{}-error", id);
        let control = if error.is_some() {
            control
                .attr("aria-invalid", "true")
                .attr("aria-describedby", error_id.as_str())
        } else {
            control
        };

        let mut wrapper = Element::new("div")
            .child(Element::new("label").attr("for", id).text(&*self.label))
            .child(control);
        if let Some(message) = error {
            wrapper = wrapper.child(
                Element::new("p")
                    .attr("id", error_id)
                    .attr("role", "alert")
                    .text(message),
            );
        }
        Ok(wrapper)
    }

    /// Apply a user edit: the caller's handler sees it first, then the form.
    pub fn change(&mut self, ctx: &FormContext, value: impl Into<Value>) -> FormResult<()> {
        let event = ChangeEvent {
            name: self.name.clone(),
            value: value.into(),
        };
        if let Some(on_change) = self.on_change.as_mut() {
            on_change(&event);
        }
        ctx.set_value(&event.name, event.value)
    }
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
