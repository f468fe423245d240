use std::{
    sync::{Arc, mpsc},
    time::Duration,
};

use connkit_fixture::{
    Org,
    salesforce::{
        QueryProcessor, SalesforceConfig, SalesforceConnectionKey, SalesforceConnectionManager,
        SalesforceTransformers, UpdateProcessor, WatchAccountsSource,
    },
};
use connkit_runtime::{
    Capabilities, Capability, ConfigRef, HeaderScope, Message, MessageProcessor, ProcessError,
    RuntimeContext, Value,
};
use parking_lot::Mutex;

fn context() -> Arc<RuntimeContext> {
    let context = RuntimeContext::default();
    SalesforceTransformers::register(context.evaluator.transformers()).unwrap();
    Arc::new(context)
}

fn manager(org: &Org) -> Arc<SalesforceConnectionManager> {
    let config = SalesforceConfig {
        org: org.clone(),
        ..SalesforceConfig::default()
    };
    Arc::new(
        SalesforceConnectionManager::new(config)
            .with_username("alice")
            .with_password("secret"),
    )
}

fn alice() -> SalesforceConnectionKey {
    SalesforceConnectionKey::new("alice".to_string())
}

fn strings(items: &[&str]) -> Value {
    Value::List(items.iter().map(|s| Value::from(*s)).collect())
}

#[test]
fn test_query_succeeds_after_two_expired_sessions() {
    let org = Org::with_accounts(["Acme", "Globex"]);
    org.expire_sessions(2);
    let manager = manager(&org);
    let query = QueryProcessor::new(context(), ConfigRef::Instance(Arc::clone(&manager)));
    assert_eq!(query.retry_state().max_retries(), 3);

    let message = query
        .process(Message::new("SELECT Name FROM Account"))
        .unwrap();

    assert_eq!(message.payload().to_value(), strings(&["Acme", "Globex"]));
    assert_eq!(org.calls(), 3);
    // One session per acquisition, the two expired ones were destroyed.
    assert_eq!(org.sessions(), 3);
    assert_eq!(org.closed(), 2);
    assert_eq!(query.retry_state().attempt(), 0);
    assert_eq!(manager.connection_manager().num_idle(&alice()), 1);
    assert_eq!(manager.connection_manager().total_active(), 0);
}

#[test]
fn test_query_gives_up_after_retry_budget() {
    let org = Org::with_accounts(["Acme"]);
    org.expire_sessions(usize::MAX);
    let manager = manager(&org);
    let query = QueryProcessor::new(context(), ConfigRef::Instance(Arc::clone(&manager)));

    let err = query.process(Message::new("SELECT Name FROM Account")).unwrap_err();

    match err {
        ProcessError::InvalidatingOperation { attempts, .. } => assert_eq!(attempts, 4),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(org.sessions(), 4);
    assert_eq!(org.closed(), 4);
    assert_eq!(query.retry_state().attempt(), 4);
    assert_eq!(manager.connection_manager().num_idle(&alice()), 0);
}

#[test]
fn test_other_errors_are_not_retried() {
    let org = Org::with_accounts(["Acme"]);
    let manager = manager(&org);
    let query = QueryProcessor::new(context(), ConfigRef::Instance(Arc::clone(&manager)));

    let err = query.process(Message::new("DELETE Account")).unwrap_err();

    assert!(matches!(err, ProcessError::GenericOperation { .. }));
    assert!(err.to_string().contains("malformed query"));
    assert_eq!(org.calls(), 1);
    assert_eq!(org.closed(), 0);
    assert_eq!(manager.connection_manager().num_idle(&alice()), 1);
}

#[test]
fn test_operation_override_selects_another_connection() {
    let org = Org::with_accounts(["Acme"]);
    let manager = manager(&org);
    let query = QueryProcessor::new(context(), ConfigRef::Instance(Arc::clone(&manager)))
        .with_username("#[header:INBOUND:user]");

    query
        .process(Message::new("SELECT Name FROM Account").with_header(
            HeaderScope::Inbound,
            "user",
            "bob",
        ))
        .unwrap();

    let bob = SalesforceConnectionKey::new("bob".to_string());
    assert_eq!(manager.connection_manager().num_idle(&bob), 1);
    assert_eq!(manager.connection_manager().num_idle(&alice()), 0);
}

#[test]
fn test_map_parameter_is_coerced_entry_wise() {
    let org = Org::default();
    let update = UpdateProcessor::new(context(), ConfigRef::Instance(manager(&org)))
        .with_fields(Value::Map(vec![
            (Value::from("Name"), Value::from("Acme")),
            (Value::from("Employees"), Value::Int(42)),
        ]));

    let message = update.process(Message::empty()).unwrap();

    assert_eq!(
        message.payload().to_value(),
        strings(&["Account:Low", "Employees=42", "Name=Acme"])
    );
}

#[test]
fn test_map_parameter_from_headers() {
    let org = Org::default();
    let update = UpdateProcessor::new(context(), ConfigRef::Instance(manager(&org)))
        .with_sobject("Contact")
        .with_fields("#[headers:INBOUND:region,tier]")
        .with_priority("HIGH");

    let message = Message::empty()
        .with_header(HeaderScope::Inbound, "region", "emea")
        .with_header(HeaderScope::Inbound, "tier", 2_i64);
    let message = update.process(message).unwrap();

    assert_eq!(
        message.payload().to_value(),
        strings(&["Contact:High", "region=emea", "tier=2"])
    );
}

#[test]
fn test_user_transformer_converts_levels() {
    let org = Org::default();
    let manager = manager(&org);
    let fields = Value::Map(vec![(Value::from("Name"), Value::from("Acme"))]);

    let update = UpdateProcessor::new(context(), ConfigRef::Instance(Arc::clone(&manager)))
        .with_fields(fields.clone())
        .with_priority(Value::Int(7));
    let message = update.process(Message::empty()).unwrap();
    assert_eq!(message.payload().to_value(), strings(&["Account:High", "Name=Acme"]));

    let update = UpdateProcessor::new(context(), ConfigRef::Instance(manager))
        .with_fields(fields)
        .with_priority(Value::Int(12));
    let err = update.process(Message::empty()).unwrap_err();
    assert!(err.to_string().contains("parameter 'priority'"));
    assert_eq!(org.calls(), 1);
}

#[test]
fn test_unknown_enum_name_is_rejected() {
    let org = Org::default();
    let update = UpdateProcessor::new(context(), ConfigRef::Instance(manager(&org)))
        .with_fields(Value::Map(Vec::new()))
        .with_priority("urgent");

    let err = update.process(Message::empty()).unwrap_err();
    assert!(err.to_string().contains("parameter 'priority'"));
    assert_eq!(org.calls(), 0);
}

#[test]
fn test_source_emits_accounts() {
    let org = Org::with_accounts(["Acme", "Globex"]);
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let listener = move |message: Message| -> Result<Message, ProcessError> {
        let _ = tx.lock().send(message.payload().to_value());
        Ok(message)
    };

    let source = Arc::new(WatchAccountsSource::new(
        context(),
        ConfigRef::Instance(manager(&org)),
    ));
    source.start(Arc::new(listener)).unwrap();

    let received: Vec<Value> = (0..2)
        .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
        .collect();
    source.stop();

    assert_eq!(received, [Value::from("Acme"), Value::from("Globex")]);
    assert!(!source.runner().is_running());
    assert_eq!(org.sessions(), 1);
}

#[test]
fn test_manager_reports_connection_management() {
    let org = Org::default();
    let manager = manager(&org);

    assert!(manager.is_capable_of(Capability::ConnectionManagement));
    assert!(!manager.is_capable_of(Capability::Pooling));
    assert!(manager.lifecycle().is_none());
}
