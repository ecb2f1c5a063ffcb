//! Modem bring-up.
//!
//! Once the transport is open, a cursor walks [`INIT_STEPS`]. Each command
//! step chains to the next one on success; the last step harvests the service
//! centre number used as the SCA of outgoing PDUs.

use super::Modem;
use super::engine::{Continuation, DEFAULT_ANSWER};
use super::framer::MAX_ANSWER;
use super::status::{Phase, Status};
use crate::network::Transport;
use crate::sms::PhoneNumber;
use crate::sms::pdu::MAX_NUMBER_DIGITS;
use crate::system::Platform;

/// Answer to `AT+CSCA?`
pub const SERVICE_CENTRE_MARKER: &str = "+CSCA:";

/// What a bring-up step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Send a fixed command
    Send(&'static str),
    /// Send `AT+IPR=<baud rate>` from the configuration
    SetBaudRate,
    /// Read the service centre from the last `+CSCA:` answer
    HarvestServiceCentre,
}

/// One entry of the bring-up table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitStep {
    /// What to do
    pub action: Action,
    /// Answer to wait for
    pub expected: &'static str,
    /// Answer timeout, `None` for the configured default
    pub timeout_ms: Option<u32>,
    /// Resends allowed on timeout
    pub retries: u8,
}

const fn send(command: &'static str) -> InitStep {
    InitStep {
        action: Action::Send(command),
        expected: DEFAULT_ANSWER,
        timeout_ms: None,
        retries: 0,
    }
}

/// Bring-up sequence
pub static INIT_STEPS: [InitStep; 14] = [
    // Up to ten attempts, one second apart, while the modem boots
    InitStep {
        timeout_ms: Some(1000),
        retries: 9,
        ..send("AT")
    },
    InitStep {
        action: Action::SetBaudRate,
        ..send("")
    },
    send("ATE0"),
    send("AT+CMEE=2"),
    // PDU mode
    send("AT+CMGF=0"),
    send("AT+CNMP=51"),
    send("AT+CREG=2"),
    send("AT+CSDH=1"),
    InitStep {
        timeout_ms: Some(10_000),
        ..send("AT+CMGD=1,4")
    },
    // Route new messages straight to the link as +CMT
    send("AT+CNMI=2,2,0,2,0"),
    send("AT+CREG?"),
    send("AT+CLTS=1"),
    InitStep {
        expected: SERVICE_CENTRE_MARKER,
        timeout_ms: Some(10_000),
        ..send("AT+CSCA?")
    },
    InitStep {
        action: Action::HarvestServiceCentre,
        ..send("")
    },
];

/// Extract the number from a `+CSCA: "<number>",<type>` answer.
///
/// The number may start with `+`; every other character must be a digit.
pub fn parse_service_centre(line: &str) -> Option<PhoneNumber> {
    let start = line.find(SERVICE_CENTRE_MARKER)?;
    let mut tokens = line[start..].split('"').filter(|t| !t.is_empty());
    tokens.next()?;
    let number = tokens.next()?;

    let digits = number.strip_prefix('+').unwrap_or(number);
    if digits.is_empty()
        || digits.len() > MAX_NUMBER_DIGITS
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    PhoneNumber::try_from(number).ok()
}

impl<T: Transport, P: Platform> Modem<T, P> {
    /// Open the transport and start the bring-up table.
    pub(crate) fn open_transport(&mut self) {
        let baud_rate = self.config.baud_rate;
        info!("opening modem link at {} bauds", baud_rate);
        if self.transport.open(baud_rate).is_err() {
            error!("transport failed to open");
            self.status = Status::NeedsInit;
            self.request_restart(Status::NeedsInit);
            self.phase = Phase::NotConnected;
            return;
        }

        // Stale input from before the open
        let mut flushed = 0;
        while flushed < MAX_ANSWER * 4 && matches!(self.transport.read_byte(), Ok(Some(_))) {
            flushed += 1;
        }
        self.framer.clear();
        self.registered = false;
        self.init_cursor = 0;
        self.retry_count = 0;
        self.run_init_step();
    }

    fn run_init_step(&mut self) {
        let Some(step) = INIT_STEPS.get(self.init_cursor) else {
            self.finish_init();
            return;
        };
        let timeout_ms = step.timeout_ms.unwrap_or(self.config.command_timeout_ms);
        let baud_rate = self.config.baud_rate;
        debug!("bring-up step {}", self.init_cursor);

        match step.action {
            Action::Send(command) => self.send_command(
                command,
                step.expected,
                timeout_ms,
                step.retries,
                Some(Continuation::NextInitStep),
            ),
            Action::SetBaudRate => self.send_formatted(
                format_args!("AT+IPR={}", baud_rate),
                step.expected,
                timeout_ms,
                Some(Continuation::NextInitStep),
            ),
            Action::HarvestServiceCentre => self.harvest_service_centre(),
        }
    }

    pub(crate) fn next_init_step(&mut self) {
        self.init_cursor += 1;
        self.run_init_step();
    }

    fn harvest_service_centre(&mut self) {
        match parse_service_centre(&self.last_answer) {
            Some(number) => {
                debug!("service centre is {}", number.as_str());
                self.service_centre = number;
                self.last_answer.clear();
                self.next_init_step();
            }
            None => {
                error!("no service centre in {}", self.last_answer.as_str());
                self.status = Status::BadAnswer;
                self.request_restart(Status::BadAnswer);
                self.go_idle();
            }
        }
    }

    fn finish_init(&mut self) {
        if self.status != Status::Ok {
            self.request_restart(self.status);
            return;
        }
        self.go_idle();
        info!("SMS gateway started, restart count {}", self.counters.restarts);
        self.counters.restarts += 1;
    }
}
