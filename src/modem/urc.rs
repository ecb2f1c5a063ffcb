//! Classification of incoming lines.
//!
//! Registration and network time pushes are filtered first whatever command
//! is in flight. Remaining lines go to the pending command, then to SMS
//! reception, and finally to the host line callback.

use super::Modem;
use super::framer::Line;
use super::status::{Phase, Status};
use crate::network::Transport;
use crate::sms::pdu::Deliver;
use crate::system::Platform;
use crate::system::time::{NETWORK_TIME_MARKER, NetworkTime, format_wall_clock};

/// Registration push and query answer
pub const REGISTRATION_MARKER: &str = "+CREG: ";

/// Registration query command
pub const REGISTRATION_QUERY: &str = "+CREG?";

/// SMS arrival indicator
pub const SMS_INDICATOR: &str = "+CMT: ";

/// Registration status digit of a `+CREG:` line.
///
/// A push carries the status right after the marker. The answer to
/// `AT+CREG?` prefixes it with `<n>,`, which is skipped when `queried` is set
/// and present.
pub fn registration_digit(line: &str, queried: bool) -> Option<u8> {
    let start = line.find(REGISTRATION_MARKER)? + REGISTRATION_MARKER.len();
    let rest = &line.as_bytes()[start..];
    if queried && rest.get(1) == Some(&b',') {
        rest.get(2).copied()
    } else {
        rest.first().copied()
    }
}

/// Registered on the home network or roaming
pub fn is_registered_status(digit: u8) -> bool {
    digit == b'1' || digit == b'5'
}

impl<T: Transport, P: Platform> Modem<T, P> {
    /// Route one completed line.
    pub(crate) fn handle_line(&mut self, line: &str) {
        if line.contains(REGISTRATION_MARKER) {
            let queried = self.last_command.contains(REGISTRATION_QUERY);
            let digit = registration_digit(line, queried);
            self.registered = digit.is_some_and(is_registered_status);
            debug!("got {}, registered: {}", line, self.registered);
            return;
        }

        if self.config.network_time {
            if let Some(position) = line.find(NETWORK_TIME_MARKER) {
                self.apply_network_time(&line[position + NETWORK_TIME_MARKER.len()..]);
                return;
            }
        }

        if self.match_answer(line) {
            return;
        }

        if line.trim().is_empty() {
            return;
        }

        if self.awaiting_body.take().is_some() {
            debug!("message is {}", line);
            self.receive_body(line);
            self.sms_header.clear();
            return;
        }

        if line.contains(SMS_INDICATOR) {
            debug!("indicator is {}", line);
            self.sms_header = Line::try_from(line).unwrap_or_default();
            self.awaiting_body = Some(self.platform.now_ms());
            if self.pending.is_none() {
                self.phase = Phase::Receiving;
            }
            return;
        }

        debug!("ignoring {}", line);
        if let Some(callback) = self.on_line {
            callback(line);
        }
    }

    fn apply_network_time(&mut self, payload: &str) {
        match NetworkTime::parse(payload) {
            Ok(time) => {
                let unix = time.to_unix();
                let before = self.platform.unix_time().map(format_wall_clock);
                self.platform.set_unix_time(unix);
                info!(
                    "date changed from {} to {}",
                    before.as_ref().map_or("unknown", |b| b.as_str()),
                    format_wall_clock(unix).as_str()
                );
            }
            Err(e) => debug!("ignoring time push: {}", e),
        }
    }

    fn receive_body(&mut self, line: &str) {
        match Deliver::decode(line) {
            Ok(sms) => {
                self.counters.sms_received += 1;
                self.last_received.sender = sms.sender;
                self.last_received.date = sms.timestamp.to_text();
                self.last_received.text = sms.text;
                info!(
                    "got SMS from {}, sent at {}",
                    self.last_received.sender.as_str(),
                    self.last_received.date.as_str()
                );
                if let Some(callback) = self.on_sms {
                    callback(
                        &self.last_received.sender,
                        &self.last_received.date,
                        &self.last_received.text,
                    );
                }
                if self.pending.is_none() {
                    self.delete_consumed();
                } else {
                    debug!("delete deferred until the current command completes");
                    self.delete_pending = true;
                }
            }
            Err(e) => {
                self.counters.decode_failures += 1;
                error!("SMS PDU decode failed: {}", e);
                if self.pending.is_none() {
                    self.go_idle();
                }
            }
        }
    }

    /// Free the storage used by received messages.
    pub(crate) fn delete_consumed(&mut self) {
        self.delete_pending = false;
        self.phase = Phase::Receiving;
        let timeout_ms = self.config.delete_timeout_ms;
        self.send_formatted(format_args!("AT+CMGD={},{}", 1, 2), "OK", timeout_ms, None);
    }

    /// Abandon a reception whose PDU line never came.
    pub(crate) fn check_body_timeout(&mut self) {
        let Some(started) = self.awaiting_body else {
            return;
        };
        let elapsed = self.platform.now_ms().saturating_sub(started);
        if elapsed < self.config.sms_body_timeout_ms as u64 {
            return;
        }
        error!(
            "no SMS body after {} ms, header was {}",
            elapsed,
            self.sms_header.as_str()
        );
        self.awaiting_body = None;
        self.status = Status::Timeout;
        self.request_restart(Status::Timeout);
        if self.pending.is_none() {
            self.go_idle();
        }
    }
}
