//! Command/response engine.
//!
//! At most one command is outstanding at a time. A command registers what it
//! waits for, a deadline and what to do next; incoming lines and the clock
//! then decide whether the continuation runs, the command is resent or the
//! session is flagged for restart.

use core::fmt::Write as _;

use heapless::String;

use super::Modem;
use super::status::{Phase, Status};
use crate::network::Transport;
use crate::system::Platform;

/// Answer most commands wait for
pub const DEFAULT_ANSWER: &str = "OK";

/// Markers of a device-reported failure
pub const ERROR_MARKERS: [&str; 2] = ["+CMS ERROR", "+CME ERROR"];

/// Longest command text
pub const MAX_COMMAND: usize = 64;

/// Command text
pub type CommandText = String<MAX_COMMAND>;

/// Longest expected answer pattern
pub(crate) const MAX_EXPECTED: usize = 16;

/// Expected answer pattern
pub(crate) type Expected = String<MAX_EXPECTED>;

/// End of an SMS PDU
pub(crate) const CTRL_Z: u8 = 0x1A;

/// What runs once a command succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Continuation {
    /// Advance the bring-up table
    NextInitStep,
    /// Write the PDU after the `>` prompt
    SendPdu,
    /// Issue the next part of the outgoing message
    NextChunk,
}

/// How a pending command completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wait {
    /// A line matching the expected answer
    Answer,
    /// The deadline, whatever arrives
    Delay,
    /// Network registration or the deadline
    Registration,
}

/// What a timeout resend writes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payload {
    Nothing,
    Text,
    Byte(u8),
}

/// The single command in flight.
#[derive(Debug, Clone)]
pub(crate) struct PendingCommand {
    pub(crate) expected: Expected,
    pub(crate) wait: Wait,
    started_ms: u64,
    timeout_ms: u32,
    retries: u8,
    payload: Payload,
    pub(crate) continuation: Option<Continuation>,
}

impl PendingCommand {
    /// Single-character answer that completes a line on arrival
    pub(crate) fn marker(&self) -> Option<u8> {
        match self.expected.as_bytes() {
            [single] => Some(*single),
            _ => None,
        }
    }

    fn matches(&self, line: &str) -> bool {
        if self.wait != Wait::Answer {
            return false;
        }
        if self.expected == DEFAULT_ANSWER {
            line == DEFAULT_ANSWER
        } else {
            line.contains(self.expected.as_str())
        }
    }
}

/// True when `line` reports a device failure
pub fn is_device_error(line: &str) -> bool {
    ERROR_MARKERS.iter().any(|marker| line.contains(marker))
}

impl<T: Transport, P: Platform> Modem<T, P> {
    fn write_bytes(&mut self, bytes: &[u8]) {
        if self.transport.write_all(bytes).is_err() {
            error!("transport write failed");
        }
    }

    fn arm(
        &mut self,
        expected: &str,
        wait: Wait,
        timeout_ms: u32,
        retries: u8,
        payload: Payload,
        continuation: Option<Continuation>,
    ) {
        debug_assert!(
            expected.len() <= MAX_EXPECTED,
            "expected answer {:?} exceeds {} bytes",
            expected,
            MAX_EXPECTED
        );
        let expected = match Expected::try_from(expected) {
            Ok(pattern) => pattern,
            Err(_) => {
                error!("expected answer {} cut to {} bytes", expected, MAX_EXPECTED);
                let mut cut = MAX_EXPECTED;
                while !expected.is_char_boundary(cut) {
                    cut -= 1;
                }
                Expected::try_from(&expected[..cut]).unwrap_or_default()
            }
        };
        self.counters.commands += 1;
        self.status = Status::Running;
        self.pending = Some(PendingCommand {
            expected,
            wait,
            started_ms: self.platform.now_ms(),
            timeout_ms,
            retries,
            payload,
            continuation,
        });
    }

    /// Issue `command` and wait for `expected`.
    ///
    /// The retry count only restarts when the text differs from the previous
    /// command, so a resend keeps its accounting. An empty command sends
    /// nothing and waits for an answer to something already sent.
    pub(crate) fn send_command(
        &mut self,
        command: &str,
        expected: &str,
        timeout_ms: u32,
        retries: u8,
        continuation: Option<Continuation>,
    ) {
        let payload = if command.is_empty() {
            Payload::Nothing
        } else {
            if command != self.last_command.as_str() {
                self.retry_count = 0;
                self.last_command = CommandText::try_from(command).unwrap_or_default();
            }
            Payload::Text
        };
        self.arm(expected, Wait::Answer, timeout_ms, retries, payload, continuation);
        if payload == Payload::Text {
            debug!("issuing {}", command);
            self.framer.clear();
            self.write_bytes(command.as_bytes());
            self.write_bytes(b"\r");
        }
    }

    /// Issue a formatted command
    pub(crate) fn send_formatted(
        &mut self,
        args: core::fmt::Arguments<'_>,
        expected: &str,
        timeout_ms: u32,
        continuation: Option<Continuation>,
    ) {
        let mut command = CommandText::new();
        if command.write_fmt(args).is_err() {
            error!("command does not fit {} bytes", MAX_COMMAND);
        }
        self.send_command(&command, expected, timeout_ms, 0, continuation);
    }

    /// Write one raw byte and wait for `expected`.
    pub(crate) fn send_byte(
        &mut self,
        byte: u8,
        expected: &str,
        timeout_ms: u32,
        continuation: Option<Continuation>,
    ) {
        self.arm(
            expected,
            Wait::Answer,
            timeout_ms,
            0,
            Payload::Byte(byte),
            continuation,
        );
        debug!("issuing byte {}", byte);
        self.framer.clear();
        self.write_bytes(&[byte]);
    }

    /// Wait `ms` without sending anything.
    pub(crate) fn wait_for(&mut self, ms: u32, continuation: Option<Continuation>) {
        debug!("waiting {} ms", ms);
        self.arm("", Wait::Delay, ms, 0, Payload::Nothing, continuation);
    }

    /// Wait until registered or `ms` elapsed.
    pub(crate) fn wait_for_registration(&mut self, ms: u32, continuation: Option<Continuation>) {
        debug!("waiting up to {} ms for registration", ms);
        self.arm("", Wait::Registration, ms, 0, Payload::Nothing, continuation);
    }

    /// Offer `line` to the pending command. Returns `true` when consumed.
    pub(crate) fn match_answer(&mut self, line: &str) -> bool {
        let Some(pending) = &self.pending else {
            return false;
        };
        if pending.matches(line) {
            let continuation = pending.continuation;
            debug!(
                "reply in {} ms: {}",
                self.platform.now_ms().saturating_sub(pending.started_ms),
                line
            );
            self.last_answer = super::framer::Line::try_from(line).unwrap_or_default();
            self.pending = None;
            self.status = Status::Ok;
            self.resume(continuation);
            return true;
        }
        if pending.wait == Wait::Answer && !self.ignore_errors && is_device_error(line) {
            error!("error answer {} to {}", line, self.last_command.as_str());
            self.status = Status::ModemError;
            self.request_restart(Status::ModemError);
            self.go_idle();
            return true;
        }
        false
    }

    /// Check the pending command against the clock.
    pub(crate) fn check_pending(&mut self) {
        let Some(pending) = &self.pending else {
            return;
        };
        let wait = pending.wait;
        let elapsed = self.platform.now_ms().saturating_sub(pending.started_ms);
        let expired = elapsed >= pending.timeout_ms as u64;

        match wait {
            Wait::Registration if self.registered || expired => {
                debug!("registration wait over after {} ms", elapsed);
                self.complete();
            }
            Wait::Delay if expired => {
                debug!("end of {} ms wait", elapsed);
                self.complete();
            }
            Wait::Answer if expired => self.on_timeout(elapsed),
            _ => {}
        }
    }

    fn complete(&mut self) {
        let continuation = self.pending.take().and_then(|p| p.continuation);
        self.status = Status::Ok;
        self.resume(continuation);
    }

    fn on_timeout(&mut self, elapsed: u64) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };

        if self.ignore_errors {
            warn!(
                "ignoring timeout after {} ms, command was {}",
                elapsed,
                self.last_command.as_str()
            );
            self.complete();
            return;
        }

        if self.retry_count < pending.retries {
            self.retry_count += 1;
            pending.started_ms = self.platform.now_ms();
            let payload = pending.payload;
            self.counters.commands += 1;
            warn!(
                "no answer to {}, retry {}",
                self.last_command.as_str(),
                self.retry_count
            );
            match payload {
                Payload::Text => {
                    let mut command = CommandText::new();
                    let _ = command.push_str(&self.last_command);
                    self.framer.clear();
                    self.write_bytes(command.as_bytes());
                    self.write_bytes(b"\r");
                }
                Payload::Byte(byte) => self.write_bytes(&[byte]),
                Payload::Nothing => {}
            }
            return;
        }

        let reason = if self.framer.is_empty() {
            error!(
                "timed out after {} ms, command was {}",
                elapsed,
                self.last_command.as_str()
            );
            Status::Timeout
        } else {
            error!(
                "partial answer after {} ms, command was {}",
                elapsed,
                self.last_command.as_str()
            );
            Status::BadAnswer
        };
        self.status = reason;
        self.request_restart(reason);
        self.go_idle();
    }

    /// Run `continuation`, or go idle when there is none.
    pub(crate) fn resume(&mut self, continuation: Option<Continuation>) {
        match continuation {
            None => self.go_idle(),
            Some(Continuation::NextInitStep) => self.next_init_step(),
            Some(Continuation::SendPdu) => self.send_pdu(),
            Some(Continuation::NextChunk) => {
                // Encode failures are logged and end the transfer
                let _ = self.send_next_chunk();
            }
        }
    }

    /// Drop any pending command and partial line and become idle.
    pub(crate) fn go_idle(&mut self) {
        if self.phase != Phase::Idle {
            debug!("modem is idle");
        }
        self.phase = Phase::Idle;
        self.pending = None;
        self.transfer = None;
        self.framer.clear();
    }

    /// Flag the session for restart by the host.
    pub(crate) fn request_restart(&mut self, reason: Status) {
        warn!("restart requested: {}", reason);
        self.restart_needed = true;
        self.restart_reason = reason;
    }

    /// Write the stored PDU, terminate it and wait for the confirmation.
    pub(crate) fn send_pdu(&mut self) {
        debug!("PDU {}", self.pdu.as_str());
        let pdu = core::mem::take(&mut self.pdu);
        self.write_bytes(pdu.as_bytes());
        self.send_byte(
            CTRL_Z,
            "+CMGS:",
            self.config.sms_send_timeout_ms,
            Some(Continuation::NextChunk),
        );
    }
}
