use std::io::Write;

use connkit_codegen::{Pipeline, Role, Severity, lower, lower_all};
use connkit_manifest::Manifest;

const SALESFORCE: &str = r##"
[module]
name = "salesforce"
type = "crate::Salesforce"
error = "crate::SalesforceError"
description = "Salesforce connector"

[module.lifecycle]
start = "start"
stop = "stop"

[[fields]]
name = "url"
type = "String"
default = "https://login.example.com"

[connect]
method = "connect"
disconnect = "disconnect"
validate = "is_connected"

[[connect.params]]
name = "username"
type = "String"
key = true

[[connect.params]]
name = "password"
type = "String"

[[operations]]
name = "query"
returns = "Vec<String>"
invalidate-on = "SessionExpired"
retry-max = 3
description = "Runs a SOQL query"

[[operations.params]]
name = "soql"
type = "String"
kind = "payload"

[[operations]]
name = "set-tags"
description = "Tags the current record"

[[operations.params]]
name = "tags"
type = "OutboundHeaders"

[oauth]
authorization-url = "https://login.example.com/authorize"
access-token-url = "https://login.example.com/token"
"##;

fn manifest(content: &str) -> Manifest {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    Manifest::from_file(file.path()).unwrap()
}

#[test]
fn test_full_module_layers() {
    let module = lower(&manifest(SALESFORCE)).unwrap();
    let ctx = Pipeline::new().run(&[module]).unwrap();

    let chain: Vec<_> = ctx
        .roles
        .layers("salesforce", Role::ModuleObject)
        .iter()
        .map(|h| h.rust_type.as_str())
        .collect();
    assert_eq!(
        chain,
        [
            "crate::Salesforce",
            "SalesforceLifecycleAdapter",
            "SalesforceConnectionManager",
            "SalesforceOAuthAdapter",
        ]
    );
    assert_eq!(
        ctx.roles
            .lookup("salesforce", Role::ConnectorObject)
            .unwrap()
            .rust_type,
        "SalesforceLifecycleAdapter"
    );
    assert_eq!(
        ctx.roles.lookup("salesforce", Role::Config).unwrap().rust_type,
        "SalesforceConfig"
    );

    let names: Vec<_> = ctx.units.names().collect();
    assert_eq!(
        names,
        [
            "salesforce/config.rs",
            "salesforce/lifecycle.rs",
            "salesforce/connection.rs",
            "salesforce/oauth.rs",
            "salesforce/capabilities.rs",
            "salesforce/query_processor.rs",
            "salesforce/set_tags_processor.rs",
            "salesforce/mod.rs",
        ]
    );
}

#[test]
fn test_generated_connection_path() {
    let module = lower(&manifest(SALESFORCE)).unwrap();
    let ctx = Pipeline::new().run(&[module]).unwrap();

    let connection = &ctx.units.get("salesforce/connection.rs").unwrap().content;
    assert!(connection.starts_with("// Generated by connkit (connection-manager). Do not edit.\n"));
    assert!(connection.contains("impl ManagedConnection for SalesforceLifecycleAdapter {"));
    assert!(connection.contains("Ok(SalesforceLifecycleAdapter::new(config.instantiate()))"));
    assert!(connection.contains("self.inner\n"));

    let query = &ctx.units.get("salesforce/query_processor.rs").unwrap().content;
    assert!(query.contains("config: ConfigRef<SalesforceOAuthAdapter>,"));
    assert!(query.contains("soql: Some(Value::from(\"#[payload]\")),"));
    assert!(query.contains("let manager = &module.inner;"));
    assert!(query.contains("Ok(SalesforceConnectionKey::new(username).with_password(password))"));
    assert!(query.contains("match connection.inner.query(soql) {"));

    let tags = &ctx.units.get("salesforce/set_tags_processor.rs").unwrap().content;
    assert!(tags.contains("match connection.inner.set_tags(&mut outbound) {"));

    let index = &ctx.units.get("salesforce/mod.rs").unwrap().content;
    assert!(index.contains("mod query_processor;\n"));
    assert!(index.contains("pub use query_processor::*;\n"));
}

#[test]
fn test_capabilities_on_outermost_layer() {
    let module = lower(&manifest(SALESFORCE)).unwrap();
    let ctx = Pipeline::new().run(&[module]).unwrap();

    let caps = &ctx.units.get("salesforce/capabilities.rs").unwrap().content;
    assert!(caps.contains("impl Capabilities for SalesforceOAuthAdapter {"));
    assert!(caps.contains("Some(self.inner.connection_manager())"));
    assert!(caps.contains("Some(self.oauth_state())"));
    assert!(!caps.contains("fn pooling("));
}

#[test]
fn test_plain_module_is_called_directly() {
    let module = lower(&manifest(
        r#"
[module]
name = "echo"
type = "crate::Echo"
description = "Echoes payloads"

[[operations]]
name = "echo"
returns = "String"
description = "Returns the payload"

[[operations.params]]
name = "text"
type = "String"
kind = "payload"
"#,
    ))
    .unwrap();
    let ctx = Pipeline::new().run(&[module]).unwrap();

    assert!(ctx.units.get("echo/config.rs").is_none());
    let echo = &ctx.units.get("echo/echo_processor.rs").unwrap().content;
    assert!(echo.contains("let target = &*module;"));
    assert!(echo.contains(".direct("));
    assert!(ctx.diagnostics.is_empty());
}

#[test]
fn test_lint_errors_abort_generation() {
    let module = lower(&manifest(
        r#"
[module]
name = "broken"
type = "crate::Broken"

[[operations]]
name = "fetch"

[[operations.params]]
name = "token"
type = "String"
kind = "connection-field"
"#,
    ))
    .unwrap();

    let pipeline = Pipeline::new();
    let diagnostics = pipeline.check(&module);
    assert!(
        diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error && d.generator == "connection-field")
    );

    let err = pipeline.run(&[module]).unwrap_err();
    assert_eq!(err.to_string(), "module 'broken' has 1 lint error(s)");
}

#[test]
fn test_duplicate_modules_are_rejected() {
    let echo = r#"
[module]
name = "echo"
type = "crate::Echo"
"#;
    let err = lower_all(&[manifest(echo), manifest(echo)]).unwrap_err();
    assert!(err.to_string().contains("echo"));
}
