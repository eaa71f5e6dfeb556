use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{EngineError, RefactorEngine, RenameRequest, SourceChange};
use crate::error::{Error, Result};

type Reply = std::result::Result<SourceChange, EngineError>;

struct Job {
    request: RenameRequest,
    reply: Sender<Reply>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// The engine answered with an error.
    Engine(EngineError),
    /// No answer within the timeout. The client refuses further requests.
    Timeout(Duration),
    /// The engine thread is gone.
    Disconnected,
}

/// Synchronous request/response access to an engine running on its own thread.
///
/// At most one request is in flight. After a timeout the client is poisoned:
/// the late answer is dropped and every later request fails immediately.
pub struct EngineClient {
    jobs: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    timeout: Duration,
    poisoned: bool,
}

impl EngineClient {
    pub fn spawn<E>(engine: E, timeout: Duration) -> Result<Self>
    where
        E: RefactorEngine + 'static,
    {
        let (jobs, inbox) = mpsc::channel::<Job>();
        let worker = thread::Builder::new()
            .name("refactor-engine".to_string())
            .spawn(move || serve(engine, inbox))
            .map_err(|e| Error::internal_io(e.to_string(), Some("spawn engine thread".to_string())))?;

        Ok(Self {
            jobs: Some(jobs),
            worker: Some(worker),
            timeout,
            poisoned: false,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn request(&mut self, request: &RenameRequest) -> std::result::Result<SourceChange, ExchangeError> {
        if self.poisoned {
            return Err(ExchangeError::Disconnected);
        }
        let jobs = self.jobs.as_ref().ok_or(ExchangeError::Disconnected)?;

        let (reply, answer) = mpsc::channel();
        jobs.send(Job {
            request: request.clone(),
            reply,
        })
        .map_err(|_| ExchangeError::Disconnected)?;

        match answer.recv_timeout(self.timeout) {
            Ok(Ok(change)) => Ok(change),
            Ok(Err(err)) => Err(ExchangeError::Engine(err)),
            Err(RecvTimeoutError::Timeout) => {
                self.poisoned = true;
                Err(ExchangeError::Timeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(ExchangeError::Disconnected),
        }
    }
}

impl Drop for EngineClient {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            // A stuck engine would block here forever.
            if !self.poisoned {
                let _ = worker.join();
            }
        }
    }
}

fn serve<E: RefactorEngine>(mut engine: E, inbox: Receiver<Job>) {
    for job in inbox {
        let answer = engine.refactor(&job.request);
        // The caller may have timed out and dropped its receiver.
        let _ = job.reply.send(answer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct Echo;

    impl RefactorEngine for Echo {
        fn refactor(&mut self, request: &RenameRequest) -> std::result::Result<SourceChange, EngineError> {
            if request.new_name == "fail" {
                return Err(EngineError::new("refused"));
            }
            Ok(SourceChange {
                message: format!("rename to {}", request.new_name),
                ..SourceChange::default()
            })
        }
    }

    struct Stuck;

    impl RefactorEngine for Stuck {
        fn refactor(&mut self, _request: &RenameRequest) -> std::result::Result<SourceChange, EngineError> {
            thread::sleep(Duration::from_secs(2));
            Ok(SourceChange::default())
        }
    }

    fn req(name: &str) -> RenameRequest {
        RenameRequest::rename(PathBuf::from("lib/a.dart"), 4, name)
    }

    #[test]
    fn answers_requests_in_order() {
        let mut client = EngineClient::spawn(Echo, Duration::from_secs(5)).unwrap();
        assert_eq!(client.request(&req("one")).unwrap().message, "rename to one");
        assert_eq!(client.request(&req("two")).unwrap().message, "rename to two");
    }

    #[test]
    fn engine_errors_are_passed_through() {
        let mut client = EngineClient::spawn(Echo, Duration::from_secs(5)).unwrap();
        let err = client.request(&req("fail")).unwrap_err();
        assert_eq!(err, ExchangeError::Engine(EngineError::new("refused")));
        assert!(!client.is_poisoned());
        assert!(client.request(&req("ok")).is_ok());
    }

    #[test]
    fn timeout_poisons_the_client() {
        let mut client = EngineClient::spawn(Stuck, Duration::from_millis(50)).unwrap();
        let err = client.request(&req("slow")).unwrap_err();
        assert_eq!(err, ExchangeError::Timeout(Duration::from_millis(50)));
        assert!(client.is_poisoned());
        assert_eq!(client.request(&req("again")).unwrap_err(), ExchangeError::Disconnected);
    }
}
