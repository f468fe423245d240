//! Message sources: operations that feed messages into a flow from a thread
//! of their own.
//!
//! A generated source hands its body to a [`SourceRunner`]. The body calls
//! the user method with a [`SourceCallback`], which forwards every payload
//! the method produces to the listening processor.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
};

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::{HeaderScope, Headers, Message, MessageProcessor, ProcessError, Value};

/// Handed to the user method of a source.
pub struct SourceCallback {
    listener: Arc<dyn MessageProcessor>,
    stopping: Arc<AtomicBool>,
}

impl SourceCallback {
    /// A callback that is never asked to stop.
    pub fn new(listener: Arc<dyn MessageProcessor>) -> Self {
        Self {
            listener,
            stopping: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Send `payload` through the listener.
    pub fn process(&self, payload: impl Into<Value>) -> Result<Message, ProcessError> {
        self.listener.process(Message::new(payload))
    }

    /// Send `payload` with `properties` as inbound headers.
    pub fn process_with_properties(
        &self,
        payload: impl Into<Value>,
        properties: Headers,
    ) -> Result<Message, ProcessError> {
        let mut message = Message::new(payload);
        message.headers_mut(HeaderScope::Inbound).extend(properties);
        self.listener.process(message)
    }

    /// Send an empty message.
    pub fn process_empty(&self) -> Result<Message, ProcessError> {
        self.listener.process(Message::empty())
    }

    /// True once the owning runner was stopped. Long-running methods poll
    /// this and return.
    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }
}

impl fmt::Debug for SourceCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceCallback")
            .field("stopping", &self.is_stopping())
            .finish_non_exhaustive()
    }
}

type ExceptionListener = Arc<dyn Fn(&ProcessError) + Send + Sync>;

/// Runs a source body on a named thread.
pub struct SourceRunner {
    name: String,
    stopping: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    exception_listener: Mutex<Option<ExceptionListener>>,
}

impl SourceRunner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stopping: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
            exception_listener: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Receives the error a body returned. Errors are logged either way.
    pub fn set_exception_listener(&self, listener: impl Fn(&ProcessError) + Send + Sync + 'static) {
        *self.exception_listener.lock() = Some(Arc::new(listener));
    }

    /// Spawn `body` with a callback bound to `listener`.
    ///
    /// Fails if the previous body is still running.
    pub fn start<F>(&self, listener: Arc<dyn MessageProcessor>, body: F) -> Result<(), ProcessError>
    where
        F: FnOnce(&SourceCallback) -> Result<(), ProcessError> + Send + 'static,
    {
        let mut handle = self.handle.lock();
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return Err(ProcessError::configuration(
                &self.name,
                "source is already running",
            ));
        }

        self.stopping.store(false, Ordering::Release);
        let callback = SourceCallback {
            listener,
            stopping: Arc::clone(&self.stopping),
        };
        let name = self.name.clone();
        let exception_listener = self.exception_listener.lock().clone();

        let spawned = thread::Builder::new()
            .name(format!("source-{}", self.name))
            .spawn(move || {
                debug!(source = %name, "message source started");
                match body(&callback) {
                    Ok(()) => debug!(source = %name, "message source finished"),
                    Err(err) => {
                        error!(source = %name, error = %err, "message source failed");
                        if let Some(listener) = exception_listener {
                            listener(&err);
                        }
                    }
                }
            })
            .map_err(|e| ProcessError::generic(&self.name, Box::new(e)))?;

        *handle = Some(spawned);
        Ok(())
    }

    /// Signal the body to stop and wait for it to return.
    ///
    /// Called from the body's own thread (the last owner of a source can
    /// drop it there) it only raises the flag.
    pub fn stop(&self) {
        self.stopping.store(true, Ordering::Release);
        let Some(handle) = self.handle.lock().take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            error!(source = %self.name, "message source panicked");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for SourceRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for SourceRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRunner")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::mpsc, time::Duration};

    use super::*;

    fn collector() -> (Arc<dyn MessageProcessor>, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let listener = move |message: Message| -> Result<Message, ProcessError> {
            let _ = tx.lock().send(message.clone());
            Ok(message)
        };
        (Arc::new(listener), rx)
    }

    #[test]
    fn test_callback_forwards_properties() {
        let (listener, rx) = collector();
        let callback = SourceCallback::new(listener);

        let mut properties = Headers::new();
        properties.insert("topic".to_string(), Value::from("accounts"));
        callback.process_with_properties("created", properties).unwrap();

        let message = rx.recv().unwrap();
        assert_eq!(message.payload().to_value(), Value::from("created"));
        assert_eq!(
            message.header(HeaderScope::Inbound, "topic"),
            Some(&Value::from("accounts"))
        );
        assert!(!callback.is_stopping());
    }

    #[test]
    fn test_runner_stops_polling_body() {
        let (listener, rx) = collector();
        let runner = SourceRunner::new("ticks");

        runner
            .start(listener, |callback| {
                let mut tick = 0;
                while !callback.is_stopping() {
                    callback.process(Value::Int(tick))?;
                    tick += 1;
                    thread::sleep(Duration::from_millis(5));
                }
                Ok(())
            })
            .unwrap();

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first.payload().to_value(), Value::Int(0));
        assert!(runner.is_running());

        runner.stop();
        assert!(!runner.is_running());
    }

    #[test]
    fn test_second_start_while_running_fails() {
        let (listener, _rx) = collector();
        let runner = SourceRunner::new("busy");
        let body = |callback: &SourceCallback| {
            while !callback.is_stopping() {
                thread::sleep(Duration::from_millis(5));
            }
            Ok(())
        };

        runner.start(Arc::clone(&listener), body).unwrap();
        let err = runner.start(listener, body).unwrap_err();
        assert!(err.to_string().contains("already running"));
        runner.stop();
    }

    #[test]
    fn test_body_error_reaches_exception_listener() {
        let (listener, _rx) = collector();
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);

        let runner = SourceRunner::new("failing");
        runner.set_exception_listener(move |err| {
            let _ = tx.lock().send(err.to_string());
        });
        runner
            .start(listener, |_callback| {
                Err(ProcessError::configuration("failing", "no feed configured"))
            })
            .unwrap();

        let reported = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(reported.contains("no feed configured"));
        runner.stop();
    }

    #[test]
    fn test_runner_dropped_on_its_own_thread() {
        let (listener, _rx) = collector();
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);

        let runner = Arc::new(SourceRunner::new("owned"));
        let owner = Arc::clone(&runner);
        runner
            .start(listener, move |_callback| {
                // Wait until the test dropped its handle, then drop the last one here.
                while Arc::strong_count(&owner) > 1 {
                    thread::sleep(Duration::from_millis(5));
                }
                drop(owner);
                let _ = tx.lock().send(());
                Ok(())
            })
            .unwrap();
        drop(runner);

        rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }
}
