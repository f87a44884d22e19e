//! Clipboard export of a verse selection.
//!
//! [`ExportMachine`] performs no I/O of its own. The host asks it what to
//! do next, performs the (possibly asynchronous) clipboard write, and
//! reports the outcome back:
//!
//! ```text
//! Idle --begin--> Primary --ok--> Confirming --settle--> Idle
//!                    |                ^
//!                   err               ok
//!                    v                |
//!                 Fallback ----------+
//!                    |
//!                   err --> Idle (Failed notice)
//! ```
//!
//! While a run is in flight every further `begin` is refused, so a double
//! click never produces a second clipboard write.

use std::time::Duration;

use thiserror::Error;

/// Notice shown after a successful copy.
pub const COPIED_NOTICE: &str = "Verses copied to clipboard!";

/// Notice shown when neither writer could copy.
pub const FAILED_NOTICE: &str = "Failed to copy verses";

/// How long the confirmation stays up before the selection is cleared.
pub const DEFAULT_CONFIRM_HOLD: Duration = Duration::from_millis(1500);

/// Which part of the export string comes first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportOrder {
    /// `"{text} - {reference}"`
    #[default]
    TextFirst,
    /// `"{reference} - {text}"`
    ReferenceFirst,
}

/// Configuration for formatting and confirming an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub order: ExportOrder,
    pub confirm_hold: Duration,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            order: ExportOrder::TextFirst,
            confirm_hold: DEFAULT_CONFIRM_HOLD,
        }
    }
}

impl ExportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(mut self, order: ExportOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_confirm_hold(mut self, hold: Duration) -> Self {
        self.confirm_hold = hold;
        self
    }

    /// Join selection text and reference in the configured order.
    pub fn format(&self, text: &str, reference: &str) -> String {
        match self.order {
            ExportOrder::TextFirst => format!("{text} - {reference}"),
            ExportOrder::ReferenceFirst => format!("{reference} - {text}"),
        }
    }
}

/// A clipboard write failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("clipboard write failed: {0}")]
pub struct ClipboardError(pub String);

/// Something that can receive exported text.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// In-memory clipboard that records every write.
///
/// A clipboard built with [`MemoryClipboard::unavailable`] rejects every
/// write, which stands in for a browser without clipboard permission.
#[derive(Debug, Clone)]
pub struct MemoryClipboard {
    pub writes: Vec<String>,
    available: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self {
            writes: Vec::new(),
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            writes: Vec::new(),
            available: false,
        }
    }

    /// Last text written.
    pub fn contents(&self) -> Option<&str> {
        self.writes.last().map(String::as_str)
    }
}

impl Default for MemoryClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if !self.available {
            return Err(ClipboardError("clipboard unavailable".into()));
        }
        self.writes.push(text.to_string());
        Ok(())
    }
}

/// Phase of an export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    /// Waiting for the primary writer's outcome.
    Primary,
    /// Primary failed; waiting for the fallback writer's outcome.
    Fallback,
    /// Copied; waiting for the host to call `settle` after the hold.
    Confirming,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportState {
    #[default]
    Idle,
    Exporting(ExportPhase),
}

/// What the host should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Write this text with the primary clipboard.
    Primary(String),
    /// The primary write failed: write this text with the fallback.
    Fallback(String),
    /// Copied. Show `notice`, then call `settle` after `hold`.
    Confirm { notice: &'static str, hold: Duration },
    /// Both writers failed. Show `notice`; the selection is kept.
    Failed { notice: &'static str },
}

#[derive(Debug, Clone, Default)]
pub struct ExportMachine {
    config: ExportConfig,
    state: ExportState,
    pending: Option<String>,
}

impl ExportMachine {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            state: ExportState::Idle,
            pending: None,
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == ExportState::Idle
    }

    /// Start exporting `text`. Returns `None` while another run is in flight.
    pub fn begin(&mut self, text: String) -> Option<Step> {
        if !self.is_idle() {
            log::debug!("export already in progress, ignoring trigger");
            return None;
        }
        self.state = ExportState::Exporting(ExportPhase::Primary);
        self.pending = Some(text.clone());
        Some(Step::Primary(text))
    }

    /// Report the primary writer's outcome.
    ///
    /// Returns `None` if the machine was not waiting for it.
    pub fn complete_primary(&mut self, outcome: Result<(), ClipboardError>) -> Option<Step> {
        if self.state != ExportState::Exporting(ExportPhase::Primary) {
            return None;
        }
        match outcome {
            Ok(()) => Some(self.confirm()),
            Err(e) => {
                log::debug!("{e}, trying fallback");
                self.state = ExportState::Exporting(ExportPhase::Fallback);
                self.pending.clone().map(Step::Fallback)
            }
        }
    }

    /// Report the fallback writer's outcome.
    pub fn complete_fallback(&mut self, outcome: Result<(), ClipboardError>) -> Option<Step> {
        if self.state != ExportState::Exporting(ExportPhase::Fallback) {
            return None;
        }
        match outcome {
            Ok(()) => Some(self.confirm()),
            Err(e) => {
                log::warn!("{e}, giving up on export");
                self.state = ExportState::Idle;
                self.pending = None;
                Some(Step::Failed {
                    notice: FAILED_NOTICE,
                })
            }
        }
    }

    /// End the confirmation window.
    ///
    /// Returns `true` when a confirmed run ended, meaning the selection
    /// should now be cleared. Anywhere else this does nothing.
    pub fn settle(&mut self) -> bool {
        if self.state != ExportState::Exporting(ExportPhase::Confirming) {
            return false;
        }
        self.state = ExportState::Idle;
        true
    }

    /// Drive a whole run synchronously against two writers.
    ///
    /// Leaves the machine confirming on success; the caller still decides
    /// when to `settle`.
    pub fn run(
        &mut self,
        text: String,
        primary: &mut dyn Clipboard,
        fallback: &mut dyn Clipboard,
    ) -> Option<Step> {
        let mut step = self.begin(text)?;
        loop {
            step = match step {
                Step::Primary(text) => self.complete_primary(primary.write_text(&text))?,
                Step::Fallback(text) => self.complete_fallback(fallback.write_text(&text))?,
                done => return Some(done),
            };
        }
    }

    fn confirm(&mut self) -> Step {
        self.state = ExportState::Exporting(ExportPhase::Confirming);
        self.pending = None;
        Step::Confirm {
            notice: COPIED_NOTICE,
            hold: self.config.confirm_hold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed() -> Result<(), ClipboardError> {
        Err(ClipboardError("denied".into()))
    }

    #[test]
    fn test_format_orders() {
        let config = ExportConfig::default();
        assert_eq!(config.format("Jesus wept.", "John 11:35"), "Jesus wept. - John 11:35");
        let config = config.with_order(ExportOrder::ReferenceFirst);
        assert_eq!(config.format("Jesus wept.", "John 11:35"), "John 11:35 - Jesus wept.");
    }

    #[test]
    fn test_primary_success_confirms() {
        let mut machine = ExportMachine::default();
        assert_eq!(machine.begin("x".into()), Some(Step::Primary("x".into())));
        assert_eq!(
            machine.complete_primary(Ok(())),
            Some(Step::Confirm {
                notice: COPIED_NOTICE,
                hold: Duration::from_millis(1500)
            })
        );
        assert_eq!(machine.state(), ExportState::Exporting(ExportPhase::Confirming));
        assert!(machine.settle());
        assert!(machine.is_idle());
    }

    #[test]
    fn test_fallback_path() {
        let mut machine = ExportMachine::default();
        machine.begin("x".into());
        assert_eq!(machine.complete_primary(failed()), Some(Step::Fallback("x".into())));
        assert!(matches!(machine.complete_fallback(Ok(())), Some(Step::Confirm { .. })));
    }

    #[test]
    fn test_both_fail_returns_to_idle() {
        let mut machine = ExportMachine::default();
        machine.begin("x".into());
        machine.complete_primary(failed());
        assert_eq!(
            machine.complete_fallback(failed()),
            Some(Step::Failed {
                notice: FAILED_NOTICE
            })
        );
        assert!(machine.is_idle());
        assert!(!machine.settle());
    }

    #[test]
    fn test_retrigger_while_exporting_is_ignored() {
        let mut machine = ExportMachine::default();
        machine.begin("first".into());
        assert_eq!(machine.begin("second".into()), None);

        machine.complete_primary(Ok(()));
        assert_eq!(machine.begin("third".into()), None);
    }

    #[test]
    fn test_out_of_order_outcomes_ignored() {
        let mut machine = ExportMachine::default();
        assert_eq!(machine.complete_primary(Ok(())), None);
        assert_eq!(machine.complete_fallback(Ok(())), None);
        machine.begin("x".into());
        assert_eq!(machine.complete_fallback(Ok(())), None);
        assert_eq!(machine.state(), ExportState::Exporting(ExportPhase::Primary));
    }

    #[test]
    fn test_settle_is_noop_when_idle() {
        let mut machine = ExportMachine::default();
        assert!(!machine.settle());
        assert!(!machine.settle());
    }

    #[test]
    fn test_run_uses_fallback_once() {
        let mut machine = ExportMachine::new(ExportConfig::new().with_confirm_hold(Duration::ZERO));
        let mut primary = MemoryClipboard::unavailable();
        let mut fallback = MemoryClipboard::new();

        let step = machine.run("text".into(), &mut primary, &mut fallback);
        assert_eq!(
            step,
            Some(Step::Confirm {
                notice: COPIED_NOTICE,
                hold: Duration::ZERO
            })
        );
        assert_eq!(fallback.writes, vec!["text".to_string()]);

        assert_eq!(machine.run("again".into(), &mut primary, &mut fallback), None);
        assert_eq!(fallback.writes.len(), 1);
    }
}
