mod common;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use common::{Counters, Session, SessionError, UserKey};
use connkit_runtime::{
    BoxError, ConnectionManager, Evaluator, Invocation, InvocationError, Lifecycle, Message,
    ObjectPool, Outcome, PoolConfig, PoolableObjectFactory, ProcessError, RetryState, Value,
    connect_param,
};

fn classify(err: SessionError) -> InvocationError {
    if matches!(err, SessionError::Expired) {
        InvocationError::invalidating(err)
    } else {
        InvocationError::failed(err)
    }
}

/// Runs `op(x)` on a connection keyed by `user`, failing with `fail_with`
/// on the first `failures` calls.
fn run(
    manager: &ConnectionManager<Session>,
    retry: &RetryState,
    acquires: &AtomicUsize,
    failures: usize,
    fail_with: fn() -> SessionError,
) -> Result<Message, ProcessError> {
    let evaluator = Evaluator::default();
    let user = Value::from("alice");
    let x = Value::from("#[payload]");
    let calls = AtomicUsize::new(0);

    Invocation::new("op", retry).connected(
        manager,
        Message::new("21"),
        |message| {
            acquires.fetch_add(1, Ordering::SeqCst);
            let user: String = connect_param(&evaluator, "op", message, "user", None, Some(&user))?;
            Ok(UserKey::new(user).with_pass("secret"))
        },
        |message| Ok(evaluator.evaluate_as::<i64>("x", message, Some(&x))?),
        |_session: &mut Session, x: i64| {
            if calls.fetch_add(1, Ordering::SeqCst) < failures {
                return Err(classify(fail_with()));
            }
            Ok(Outcome::returned(x * 2))
        },
    )
}

#[test]
fn test_exhausted_retries_raise_invalidating_error() {
    let counters = Arc::new(Counters::default());
    let manager = ConnectionManager::<Session>::new(Arc::clone(&counters), None);
    let retry = RetryState::new(3);
    let acquires = AtomicUsize::new(0);

    let err = run(&manager, &retry, &acquires, usize::MAX, || SessionError::Expired).unwrap_err();

    match err {
        ProcessError::InvalidatingOperation { attempts, .. } => assert_eq!(attempts, 4),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(acquires.load(Ordering::SeqCst), 4);
    assert_eq!(counters.closed(), 4);
    assert_eq!(manager.total_active(), 0);
    // The counter is only reset by a success.
    assert_eq!(retry.attempt(), 4);
}

#[test]
fn test_succeeds_after_two_invalidations() {
    let counters = Arc::new(Counters::default());
    let manager = ConnectionManager::<Session>::new(Arc::clone(&counters), None);
    let retry = RetryState::new(3);
    let acquires = AtomicUsize::new(0);

    let message = run(&manager, &retry, &acquires, 2, || SessionError::Expired).unwrap();

    assert_eq!(message.payload().to_value(), Value::Int(42));
    assert_eq!(acquires.load(Ordering::SeqCst), 3);
    assert_eq!(counters.closed(), 2);
    assert_eq!(retry.attempt(), 0);
    assert_eq!(manager.total_active(), 0);
}

#[test]
fn test_success_resets_attempt_count() {
    let counters = Arc::new(Counters::default());
    let manager = ConnectionManager::<Session>::new(Arc::clone(&counters), None);
    let retry = RetryState::new(1);
    let acquires = AtomicUsize::new(0);

    run(&manager, &retry, &acquires, 1, || SessionError::Expired).unwrap();
    assert_eq!(retry.attempt(), 0);

    // A fresh failure sequence gets the full budget again.
    run(&manager, &retry, &acquires, 1, || SessionError::Expired).unwrap();
    assert_eq!(counters.closed(), 2);
}

#[test]
fn test_other_errors_release_without_retry() {
    let counters = Arc::new(Counters::default());
    let manager = ConnectionManager::<Session>::new(Arc::clone(&counters), None);
    let retry = RetryState::new(3);
    let acquires = AtomicUsize::new(0);
    let key = UserKey::new("alice");

    let err = run(&manager, &retry, &acquires, 1, || {
        SessionError::BadRequest("nope".into())
    })
    .unwrap_err();

    assert!(matches!(err, ProcessError::GenericOperation { .. }));
    assert!(err.to_string().contains("nope"));
    assert_eq!(acquires.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closed(), 0);
    assert_eq!(manager.num_active(&key), 0);
    assert_eq!(manager.num_idle(&key), 1);
}

#[test]
fn test_missing_connect_param_is_configuration_error() {
    let manager = ConnectionManager::<Session>::new(Arc::new(Counters::default()), None);
    let retry = RetryState::new(1);
    let evaluator = Evaluator::default();

    let err = Invocation::new("op", &retry)
        .connected(
            &manager,
            Message::empty(),
            |message| {
                let user: String = connect_param(&evaluator, "op", message, "user", None, None)?;
                Ok(UserKey::new(user))
            },
            |_| Ok(()),
            |_session: &mut Session, ()| Ok(Outcome::void()),
        )
        .unwrap_err();

    assert!(matches!(err, ProcessError::Configuration { .. }));
    assert_eq!(manager.total_active(), 0);
}

struct Worker;

impl Lifecycle for Worker {}

#[derive(Default)]
struct WorkerFactory {
    made: AtomicUsize,
    returned: Arc<AtomicUsize>,
}

impl PoolableObjectFactory<Worker> for WorkerFactory {
    fn make(&self) -> Result<Worker, BoxError> {
        self.made.fetch_add(1, Ordering::SeqCst);
        Ok(Worker)
    }

    fn destroy(&self, _object: Worker) -> Result<(), BoxError> {
        Ok(())
    }

    fn passivate(&self, _object: &mut Worker) -> Result<(), BoxError> {
        self.returned.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_pooled_object_returned_once_on_failure() {
    let returned = Arc::new(AtomicUsize::new(0));
    let factory = WorkerFactory {
        made: AtomicUsize::new(0),
        returned: Arc::clone(&returned),
    };
    let pool = ObjectPool::new(factory, PoolConfig::default());
    let retry = RetryState::new(1);

    let err = Invocation::new("work", &retry)
        .pooled(
            &pool,
            Message::empty(),
            |_| Ok(()),
            |_worker: &mut Worker, ()| {
                Err::<Outcome, _>(InvocationError::failed(SessionError::BadRequest("x".into())))
            },
        )
        .unwrap_err();

    assert!(matches!(err, ProcessError::GenericOperation { .. }));
    assert_eq!(returned.load(Ordering::SeqCst), 1);
    assert_eq!(pool.num_active(), 0);
    assert_eq!(pool.num_idle(), 1);
    assert_eq!(pool.factory().made.load(Ordering::SeqCst), 1);
}
