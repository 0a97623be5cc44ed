pub mod codec;
pub mod intercept;
pub mod log;
pub mod logging;
pub mod port;
pub mod session;
pub mod traffic;

pub use codec::{CodecError, Encoding};
pub use log::{LogEntry, LogError, LogRecord, LogStore};
pub use logging::init_test_logging;
pub use port::{LocalPort, MockPort, NetworkPort, PortError, PortSettings, SerialPort};
pub use session::{run, Mode, ReserialConfig, Session, SessionError, TestId};
pub use traffic::{Mismatch, SharedTrafficLog, TrafficLog};
