//! formstate CLI
//!
//! Command-line interface for validating field values and replaying form
//! sessions against a JSON Schema.

use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use formstate::{
    load_json, load_json_auto, load_values, reduce_issues, FormProvider, Input, JsonSchema,
    LoadError, Schema, SchemaOptions,
};

#[derive(Parser)]
#[command(name = "formstate")]
#[command(about = "Validate form values and replay form sessions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a values file against a schema
    Validate {
        /// Values file (JSON object of field name to value)
        values: PathBuf,

        /// Schema source: file path or URL (http:// or https://)
        #[arg(long)]
        schema: String,

        /// Strict mode: reject fields the schema doesn't declare (default: false)
        #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
        strict: bool,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Replay a scripted session of edits, submits and resets
    Run {
        /// Script file: JSON array of steps
        script: PathBuf,

        /// Schema source: file path or URL
        #[arg(long)]
        schema: String,

        /// Default values source: file path or URL
        #[arg(long)]
        defaults: String,

        /// Strict mode: reject fields the schema doesn't declare (default: false)
        #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
        strict: bool,

        /// Reset the form from inside the submit handler
        #[arg(long)]
        reset_on_submit: bool,

        /// Print the rendered form markup after the session
        #[arg(long)]
        render: bool,
    },
}

/// One scripted user action.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Step {
    Set { name: String, value: Value },
    Submit,
    Reset,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            values,
            schema,
            strict,
            json,
        } => run_validate(&values, &schema, strict, json),

        Commands::Run {
            script,
            schema,
            defaults,
            strict,
            reset_on_submit,
            render,
        } => run_session(RunArgs {
            script,
            schema,
            defaults,
            strict,
            reset_on_submit,
            render,
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn compile_schema(source: &str, strict: bool) -> Result<JsonSchema, LoadError> {
    let document = load_json_auto(source)?;
    JsonSchema::with_options(&document, SchemaOptions::new().strict(strict))
}

/// Print a load error and map it to its exit code.
fn fail(context: &str, error: LoadError) -> u8 {
    eprintln!("Error {}: {}", context, error);
    error.exit_code() as u8
}

fn run_validate(
    values_path: &std::path::Path,
    schema_source: &str,
    strict: bool,
    json_output: bool,
) -> Result<(), u8> {
    let values = load_json(values_path)
        .and_then(formstate::into_values)
        .map_err(|e| fail("loading values", e))?;
    let schema = compile_schema(schema_source, strict).map_err(|e| fail("loading schema", e))?;

    match schema.validate(&values) {
        Ok(_) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(failure) => {
            if json_output {
                let output = json!({
                    "valid": false,
                    "errors": reduce_issues(&failure.issues),
                    "issues": failure.issues,
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for issue in &failure.issues {
                    eprintln!("  {}", issue);
                }
            }
            Err(1)
        }
    }
}

struct RunArgs {
    script: PathBuf,
    schema: String,
    defaults: String,
    strict: bool,
    reset_on_submit: bool,
    render: bool,
}

fn run_session(args: RunArgs) -> Result<(), u8> {
    let RunArgs {
        script,
        schema,
        defaults,
        strict,
        reset_on_submit,
        render,
    } = args;

    let schema = compile_schema(&schema, strict).map_err(|e| fail("loading schema", e))?;
    let defaults = load_values(&defaults).map_err(|e| fail("loading defaults", e))?;
    let steps: Vec<Step> = load_json(&script)
        .map_err(|e| fail("loading script", e))
        .and_then(|doc| {
            serde_json::from_value(doc).map_err(|e| {
                eprintln!("Error parsing script: {}", e);
                2u8
            })
        })?;

    let events: Rc<RefCell<Vec<Value>>> = Rc::default();
    let submitted = Rc::clone(&events);
    let rejected = Rc::clone(&events);

    let mut form = FormProvider::new(defaults.clone(), schema, move |values, ctx| {
        submitted
            .borrow_mut()
            .push(json!({ "event": "submit", "values": values }));
        if reset_on_submit {
            if let Err(e) = ctx.reset() {
                warn!(error = %e, "reset from submit handler failed");
            }
        }
    })
    .on_invalid(move |failure| {
        rejected.borrow_mut().push(json!({
            "event": "invalid",
            "errors": reduce_issues(&failure.issues),
        }));
    });

    let ctx = form.context();
    let mut inputs: Vec<Input> = defaults
        .keys()
        .map(|name| Input::new(name.as_str(), name.as_str()))
        .collect();

    for step in steps {
        let applied = match step {
            Step::Set { name, value } => match inputs.iter_mut().find(|i| i.name() == name) {
                Some(input) => input.change(&ctx, value),
                None => ctx.set_value(&name, value),
            },
            Step::Submit => {
                form.submit();
                Ok(())
            }
            Step::Reset => ctx.reset(),
        };
        if let Err(e) = applied {
            eprintln!("Error: {}", e);
            return Err(2);
        }
        for event in events.borrow_mut().drain(..) {
            println!("{}", event);
        }
    }

    println!(
        "{}",
        json!({
            "event": "state",
            "values": form.values(),
            "errors": form.errors(),
            "submitCount": form.submit_count(),
        })
    );

    if render {
        let fields: Vec<&Input> = inputs.iter().collect();
        let markup = form.render(&fields).map_err(|e| {
            eprintln!("Error: {}", e);
            2u8
        })?;
        println!("{}", markup);
    }

    Ok(())
}
