use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use crate::intercept;
use crate::log::LogStore;
use crate::port::{self, PortSettings, SerialPort};
use crate::traffic::{SharedTrafficLog, TrafficLog};

use super::{Mode, ReserialConfig, SessionError, TestId};

/// Serial traffic interception for the duration of one test.
///
/// Created with [`Session::begin`], which resolves the mode and loads
/// recorded traffic; ports are routed through it with [`Session::attach`];
/// [`Session::finish`] persists (record) or verifies (replay) the traffic.
pub struct Session {
    id: TestId,
    mode: Mode,
    store: LogStore,
    log: SharedTrafficLog,
    finished: bool,
}

impl Session {
    pub fn begin(config: &ReserialConfig, id: TestId) -> Result<Self, SessionError> {
        // Resolve first: an invalid mode must not touch the filesystem.
        let mode = config.mode()?;
        let store = LogStore::new(id.log_path(&config.log_dir()));

        let log = match mode {
            Mode::Replay => store.load(id.key())?,
            _ => TrafficLog::new(),
        };

        tracing::debug!(
            test = %id,
            %mode,
            path = %store.path().display(),
            "Started serial traffic session"
        );

        Ok(Self {
            id,
            mode,
            store,
            log: log.shared(),
            finished: false,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn test_id(&self) -> &TestId {
        &self.id
    }

    pub fn log_path(&self) -> &Path {
        self.store.path()
    }

    /// The buffer every attached port reads from and writes to.
    pub fn traffic(&self) -> SharedTrafficLog {
        self.log.clone()
    }

    /// Route `port` through this session's mode.
    ///
    /// Dropping the returned port releases it; in record mode the real
    /// transport is closed with it.
    pub fn attach<P>(&self, port: P) -> Result<Box<dyn SerialPort>, SessionError>
    where
        P: SerialPort + 'static,
    {
        intercept::intercept(self.mode, Box::new(port), &self.log)
    }

    /// Build the transport for `url` and attach it. Nothing is opened.
    pub fn open_url(
        &self,
        url: &str,
        settings: PortSettings,
    ) -> Result<Box<dyn SerialPort>, SessionError> {
        let port = port::for_url(url, settings)?;
        intercept::intercept(self.mode, port, &self.log)
    }

    /// End the session: save recorded traffic, or check that the
    /// replayed traffic was consumed completely.
    pub fn finish(mut self) -> Result<(), SessionError> {
        self.finished = true;
        self.teardown(false)
    }

    fn teardown(&self, panicked: bool) -> Result<(), SessionError> {
        match self.mode {
            Mode::Record => {
                let log = self.log.lock().clone();
                let outcome = self
                    .store
                    .save(self.id.key(), &log)
                    .map_err(SessionError::Persist)?;
                tracing::info!(
                    test = %self.id,
                    path = %self.store.path().display(),
                    rx = log.rx_len(),
                    tx = log.tx_len(),
                    ?outcome,
                    "Recorded serial traffic"
                );
                Ok(())
            }
            // The panic already fails the test.
            Mode::Replay if panicked => Ok(()),
            Mode::Replay => {
                let log = self.log.lock();
                if let Some(mismatch) = log.mismatch() {
                    return Err(SessionError::TrafficMismatch {
                        written: mismatch.written.clone(),
                        expected: mismatch.expected.clone(),
                    });
                }
                if log.is_drained() {
                    return Ok(());
                }
                tracing::warn!(
                    test = %self.id,
                    rx = log.rx_len(),
                    tx = log.tx_len(),
                    "Recorded traffic was not fully replayed"
                );
                Err(SessionError::IncompleteReplay {
                    rx: log.rx_len(),
                    tx: log.tx_len(),
                })
            }
            Mode::Passthrough | Mode::Invalid => Ok(()),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.finished && !std::thread::panicking() {
            tracing::warn!(test = %self.id, mode = %self.mode, "Session dropped without finish()");
        }
    }
}

/// Run `body` inside a session and tear it down however the body exits.
///
/// A panicking body is torn down too (recorded traffic is still saved)
/// before the panic continues.
pub fn run<F, R>(config: &ReserialConfig, id: TestId, body: F) -> Result<R, SessionError>
where
    F: FnOnce(&Session) -> R,
{
    let mut session = Session::begin(config, id)?;
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&session)));
    session.finished = true;

    match outcome {
        Ok(value) => {
            session.teardown(false)?;
            Ok(value)
        }
        Err(payload) => {
            if let Err(err) = session.teardown(true) {
                tracing::error!(test = %session.id, error = %err, "Teardown failed after panic");
            }
            drop(session);
            panic::resume_unwind(payload)
        }
    }
}
