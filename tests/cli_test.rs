//! CLI integration tests for the formstate binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("formstate"))
}

// Helper to create a temp input file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const NAME_SCHEMA: &str = r#"{
    "type": "object",
    "properties": {
        "name": {
            "type": "string",
            "minLength": 1,
            "errorMessage": { "minLength": "Name is required" }
        }
    }
}"#;

mod validate_command {
    use super::*;

    #[test]
    fn valid_values() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", NAME_SCHEMA);
        let values = write_temp_file(&dir, "values.json", r#"{"name":"John Doe"}"#);

        cmd()
            .args(["validate", values.to_str().unwrap(), "--schema", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("Valid"));
    }

    #[test]
    fn invalid_values_exit_one() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", NAME_SCHEMA);
        let values = write_temp_file(&dir, "values.json", r#"{"name":""}"#);

        cmd()
            .args(["validate", values.to_str().unwrap(), "--schema", schema.to_str().unwrap()])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("/name: Name is required"));
    }

    #[test]
    fn json_output_has_field_errors() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", NAME_SCHEMA);
        let values = write_temp_file(&dir, "values.json", r#"{"name":""}"#);

        cmd()
            .args([
                "validate",
                values.to_str().unwrap(),
                "--schema",
                schema.to_str().unwrap(),
                "--json",
            ])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#""valid":false"#))
            .stdout(predicate::str::contains(r#""errors":{"name":"Name is required"}"#));
    }

    #[test]
    fn strict_rejects_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", NAME_SCHEMA);
        let values = write_temp_file(&dir, "values.json", r#"{"name":"Ada","extra":1}"#);

        cmd()
            .args(["validate", values.to_str().unwrap(), "--schema", schema.to_str().unwrap()])
            .assert()
            .success();

        cmd()
            .args([
                "validate",
                values.to_str().unwrap(),
                "--schema",
                schema.to_str().unwrap(),
                "--strict",
                "true",
            ])
            .assert()
            .code(1);
    }

    #[test]
    fn missing_values_file_exit_three() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", NAME_SCHEMA);

        cmd()
            .args(["validate", "/nonexistent/values.json", "--schema", schema.to_str().unwrap()])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn values_must_be_object() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", NAME_SCHEMA);
        let values = write_temp_file(&dir, "values.json", r#"["name"]"#);

        cmd()
            .args(["validate", values.to_str().unwrap(), "--schema", schema.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("expected a JSON object"));
    }

    #[test]
    fn invalid_schema_exit_two() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", "{not json");
        let values = write_temp_file(&dir, "values.json", r#"{"name":"Ada"}"#);

        cmd()
            .args(["validate", values.to_str().unwrap(), "--schema", schema.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid JSON"));
    }
}

mod run_command {
    use super::*;

    struct Session {
        dir: TempDir,
        schema: std::path::PathBuf,
        defaults: std::path::PathBuf,
    }

    fn session(defaults: &str) -> Session {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", NAME_SCHEMA);
        let defaults = write_temp_file(&dir, "defaults.json", defaults);
        Session {
            dir,
            schema,
            defaults,
        }
    }

    impl Session {
        fn run(&self, script: &str, extra: &[&str]) -> assert_cmd::assert::Assert {
            let script = write_temp_file(&self.dir, "script.json", script);
            cmd()
                .args([
                    "run",
                    script.to_str().unwrap(),
                    "--schema",
                    self.schema.to_str().unwrap(),
                    "--defaults",
                    self.defaults.to_str().unwrap(),
                ])
                .args(extra)
                .assert()
        }
    }

    #[test]
    fn submit_with_valid_defaults() {
        session(r#"{"name":"John Doe"}"#)
            .run(r#"["submit"]"#, &[])
            .success()
            .stdout(predicate::str::contains(
                r#"{"event":"submit","values":{"name":"John Doe"}}"#,
            ))
            .stdout(predicate::str::contains(r#""submitCount":1"#));
    }

    #[test]
    fn invalid_then_fixed() {
        session(r#"{"name":""}"#)
            .run(
                r#"["submit", {"set": {"name": "name", "value": "John Doe"}}, "submit"]"#,
                &[],
            )
            .success()
            .stdout(predicate::str::contains(
                r#"{"event":"invalid","errors":{"name":"Name is required"}}"#,
            ))
            .stdout(predicate::str::contains(
                r#"{"event":"submit","values":{"name":"John Doe"}}"#,
            ))
            .stdout(predicate::str::contains(r#""errors":{}"#));
    }

    #[test]
    fn edits_before_submit_stay_quiet() {
        session(r#"{"name":"John Doe"}"#)
            .run(r#"[{"set": {"name": "name", "value": ""}}]"#, &[])
            .success()
            .stdout(predicate::str::contains(r#""errors":{}"#))
            .stdout(predicate::str::contains(r#""submitCount":0"#));
    }

    #[test]
    fn reset_on_submit_restores_defaults() {
        session(r#"{"name":"John Doe"}"#)
            .run(
                r#"[{"set": {"name": "name", "value": "Jane"}}, "submit"]"#,
                &["--reset-on-submit"],
            )
            .success()
            .stdout(predicate::str::contains(
                r#"{"event":"submit","values":{"name":"Jane"}}"#,
            ))
            .stdout(predicate::str::contains(
                r#"{"event":"state","values":{"name":"John Doe"},"errors":{},"submitCount":0}"#,
            ));
    }

    #[test]
    fn render_prints_alert_markup() {
        session(r#"{"name":""}"#)
            .run(r#"["submit"]"#, &["--render"])
            .success()
            .stdout(predicate::str::contains(r#"<label for="formstate-field-"#))
            .stdout(predicate::str::contains(
                r#"role="alert">Name is required</p>"#,
            ))
            .stdout(predicate::str::contains(
                r#"<button type="submit">Submit</button>"#,
            ));
    }

    #[test]
    fn bad_script_exit_two() {
        session(r#"{"name":""}"#)
            .run(r#"["explode"]"#, &[])
            .code(2)
            .stderr(predicate::str::contains("Error parsing script"));
    }
}
