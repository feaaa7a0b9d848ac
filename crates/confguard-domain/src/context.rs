use std::time::Duration;
use time::OffsetDateTime;

/// Diagnostics sink for one evaluation.
///
/// Rule kinds and the engine write human-readable lines here; the fleet
/// runner decides where they end up (report log, stderr, discarded).
pub trait EvalLog: Send {
    fn info(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLog;

impl EvalLog for NullLog {
    fn info(&mut self, _message: &str) {}
    fn error(&mut self, _message: &str) {}
}

/// Collects lines for later replay; the fleet runner gives each
/// (rule, device) evaluation its own buffer.
#[derive(Debug, Default)]
pub struct BufferLog {
    pub lines: Vec<String>,
}

impl EvalLog for BufferLog {
    fn info(&mut self, message: &str) {
        self.lines.push(format!("info: {message}"));
    }

    fn error(&mut self, message: &str) {
        self.lines.push(format!("error: {message}"));
    }
}

/// Per-evaluation context.
///
/// Carries the evaluation instant (exemption expiry is checked against
/// this, never against a clock read inside kind logic), the timeout budget
/// for the kind delegate, and the diagnostics sink. Deliberately grants no
/// mutable access to rules, policies, or exemptions.
pub struct EvalContext<'a> {
    pub now: OffsetDateTime,
    pub timeout: Duration,
    log: &'a mut dyn EvalLog,
}

impl<'a> EvalContext<'a> {
    pub fn new(now: OffsetDateTime, timeout: Duration, log: &'a mut dyn EvalLog) -> Self {
        Self { now, timeout, log }
    }

    pub fn info(&mut self, message: &str) {
        self.log.info(message);
    }

    pub fn error(&mut self, message: &str) {
        self.log.error(message);
    }
}
