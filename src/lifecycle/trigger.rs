//! Normalized shutdown triggers.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Termination signals the listener subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalName {
    /// SIGINT (Ctrl+C).
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl SignalName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalName::Interrupt => "SIGINT",
            SignalName::Terminate => "SIGTERM",
        }
    }

    /// Conventional exit code when the signal's default action kills the process.
    pub fn default_exit_code(&self) -> i32 {
        match self {
            SignalName::Interrupt => 128 + 2,
            SignalName::Terminate => 128 + 15,
        }
    }
}

impl fmt::Display for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shareable error value carried by a fault trigger or a failed cleanup.
#[derive(Clone)]
pub struct Fault(Arc<dyn StdError + Send + Sync + 'static>);

impl Fault {
    pub fn new<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Arc::new(err))
    }

    /// Fault from a plain message, e.g. a panic payload.
    pub fn msg(message: impl Into<String>) -> Self {
        Self(Arc::new(Message(message.into())))
    }

    pub fn as_error(&self) -> &(dyn StdError + 'static) {
        &*self.0
    }
}

impl From<Box<dyn StdError + Send + Sync + 'static>> for Fault {
    fn from(err: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        Self(Arc::from(err))
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for Message {}

/// Why shutdown started. Passed through to the cleanup routine.
#[derive(Debug, Clone)]
pub enum Trigger {
    Signal(SignalName),
    Fault(Fault),
    NormalExit,
    Manual,
}

impl Trigger {
    pub fn is_fault(&self) -> bool {
        matches!(self, Trigger::Fault(_))
    }

    pub fn signal(&self) -> Option<SignalName> {
        match self {
            Trigger::Signal(name) => Some(*name),
            _ => None,
        }
    }

    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Trigger::Fault(err) => Some(err),
            _ => None,
        }
    }

    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            Trigger::Signal(_) => "signal",
            Trigger::Fault(_) => "fault",
            Trigger::NormalExit => "normal_exit",
            Trigger::Manual => "manual",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Signal(name) => write!(f, "signal {}", name),
            Trigger::Fault(err) => write!(f, "fault: {}", err),
            Trigger::NormalExit => f.write_str("normal exit"),
            Trigger::Manual => f.write_str("manual close"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_accessors() {
        let t = Trigger::Signal(SignalName::Terminate);
        assert_eq!(t.signal(), Some(SignalName::Terminate));
        assert!(!t.is_fault());
        assert_eq!(t.to_string(), "signal SIGTERM");

        let t = Trigger::Fault(Fault::msg("disk on fire"));
        assert!(t.is_fault());
        assert_eq!(t.fault().map(|f| f.to_string()).as_deref(), Some("disk on fire"));
        assert_eq!(t.kind(), "fault");
    }

    #[test]
    fn test_signal_default_exit_codes() {
        assert_eq!(SignalName::Interrupt.default_exit_code(), 130);
        assert_eq!(SignalName::Terminate.default_exit_code(), 143);
    }

    #[test]
    fn test_fault_from_io_error() {
        let fault = Fault::new(std::io::Error::new(std::io::ErrorKind::Other, "broken pipe"));
        assert_eq!(fault.to_string(), "broken pipe");
        assert_eq!(fault.as_error().to_string(), "broken pipe");
    }
}
