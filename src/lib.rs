//! formstate
//!
//! Schema-validated form state with bound input fields.
//!
//! A [`FormProvider`] owns the field values, the per-field error messages
//! and a submit counter. [`Input`] fields read their value and error through
//! a [`FormContext`] handle and push edits back through it. Validation is
//! delegated to any [`Schema`]; [`JsonSchema`] is the bundled engine.
//!
//! # Example
//!
//! ```
//! use formstate::{FormProvider, Input, JsonSchema, SubmitOutcome};
//! use serde_json::json;
//!
//! let schema = JsonSchema::new(&json!({
//!     "type": "object",
//!     "properties": {
//!         "name": {
//!             "type": "string",
//!             "minLength": 1,
//!             "errorMessage": "Name is required"
//!         }
//!     }
//! }))
//! .unwrap();
//!
//! let defaults = json!({ "name": "" }).as_object().unwrap().clone();
//! let mut form = FormProvider::new(defaults, schema, |values, _ctx| {
//!     println!("saving {}", values["name"]);
//! });
//! let mut name = Input::new("name", "Name");
//!
//! // Nothing is validated until the first submit.
//! assert_eq!(form.submit(), SubmitOutcome::Invalid);
//! let markup = form.render(&[&name]).unwrap();
//! assert_eq!(markup.find_by_role("alert").unwrap().text_content(), "Name is required");
//!
//! // After that, every edit re-validates.
//! name.change(&form.context(), "John Doe").unwrap();
//! assert!(form.errors().is_empty());
//! assert_eq!(form.submit(), SubmitOutcome::Submitted);
//! ```
//!
//! # Lifecycle
//!
//! | Event | Values | Errors | Submit count |
//! |-------|--------|--------|--------------|
//! | mount | defaults | empty | 0 |
//! | edit, count = 0 | field merged | unchanged | unchanged |
//! | edit, count > 0 | field merged | replaced by full re-validation | unchanged |
//! | submit | unchanged | empty or replaced | +1 |
//! | reset | fresh copy of defaults | empty | 0 |

mod error;
mod field;
mod form;
mod loader;
pub mod markup;
mod schema;
mod types;

pub use error::{FormError, FormResult, LoadError, ValidationFailure};
pub use field::{ChangeEvent, Input, FIELD_ID_PREFIX};
pub use form::{reduce_issues, FormContext, FormProvider, SubmitEvent, SubmitOutcome};
pub use loader::{into_values, is_url, load_json, load_json_auto, load_json_str, load_values};
pub use markup::{Element, Node};
pub use schema::{FnSchema, JsonSchema, Schema, SchemaOptions, Typed, ERROR_MESSAGE_KEYWORD};
pub use types::{json_type_name, pointer_segments, Errors, Issue, PathSegment, Values};

#[cfg(feature = "remote")]
pub use loader::load_json_url;
