//! Non-blocking SIM7000 driver.
//!
//! [`Modem`] owns the transport and the platform. The host calls
//! [`poll`](Modem::poll) from its main loop; every call does a bounded amount
//! of work (one power step, one received line, or one timeout check) and
//! never waits.
//!
//! # Lifecycle
//!
//! 1. [`Modem::begin`] sequences the power key if one is configured, opens the
//!    transport and runs the bring-up commands.
//! 2. Once [`is_idle`](Modem::is_idle) is true, messages can be sent with
//!    [`send_sms`](Modem::send_sms). Received messages are decoded, handed to
//!    the callback registered with [`on_sms_received`](Modem::on_sms_received)
//!    and deleted from the SIM.
//! 3. On any unrecoverable condition [`need_restart`](Modem::need_restart)
//!    becomes true. The driver never restarts itself; the host decides when
//!    to call `begin` again.
//!
//! # Examples
//!
//! ```rust
//! use simsms::modem::{Modem, config::Config};
//! use simsms::network::{Read, Transport, Write};
//! use simsms::system::Platform;
//!
//! struct Uart;
//!
//! impl Read for Uart {
//!     type Error = ();
//!     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> { Ok(0) }
//! }
//!
//! impl Write for Uart {
//!     type Error = ();
//!     fn write(&mut self, buf: &[u8]) -> Result<usize, ()> { Ok(buf.len()) }
//!     fn flush(&mut self) -> Result<(), ()> { Ok(()) }
//! }
//!
//! impl Transport for Uart {
//!     fn open(&mut self, _baud_rate: u32) -> Result<(), ()> { Ok(()) }
//! }
//!
//! struct Clock;
//!
//! impl Platform for Clock {
//!     fn now_ms(&self) -> u64 { 0 }
//! }
//!
//! fn on_sms(number: &str, date: &str, text: &str) {
//!     let _ = (number, date, text);
//! }
//!
//! let mut modem = Modem::new(Uart, Clock, Config::default());
//! modem.on_sms_received(on_sms);
//! modem.begin();
//! modem.poll();
//! assert!(modem.is_starting());
//! ```

#![deny(unsafe_code)]

/// Driver configuration
pub mod config;
/// Command/response engine
pub mod engine;
/// Line framing
pub mod framer;
/// Bring-up sequence
pub mod init;
/// Power key sequencing
pub mod power;
/// Session state and diagnostics
pub mod status;
/// Unsolicited line classification
pub mod urc;

use core::fmt;

use heapless::String;

use crate::network::Transport;
use crate::sms::error::EncodeError;
use crate::sms::pdu::{Address, PduHex, SmsText};
use crate::sms::{self, MAX_MESSAGE_BYTES, MessageText, OutgoingTransfer, PhoneNumber};
use crate::system::Platform;
use crate::system::time::{WallClock, format_wall_clock};

use config::Config;
use engine::{CTRL_Z, CommandText, Continuation, MAX_COMMAND, PendingCommand};
use framer::{Feed, Line, LineFramer};
use power::{PowerSequencer, SILENT_RESTART_STEP};
use status::{Counters, Diagnostics, Phase, Status};

/// Callback for a received or sent SMS: number, date, text
pub type SmsFn = fn(number: &str, date: &str, text: &str);

/// Callback for lines no one else claimed
pub type LineFn = fn(line: &str);

/// Reasons a host request is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A command or transfer is already in progress
    Busy,
    /// The session is not started or still starting
    NotReady,
    /// The text does not fit the message buffer or needs too many parts
    MessageTooLong,
    /// The command does not fit the command buffer
    CommandTooLong,
    /// The first part could not be encoded
    Encode(EncodeError),
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Self {
        Error::Encode(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Busy => write!(f, "Modem busy"),
            Error::NotReady => write!(f, "Modem not ready"),
            Error::MessageTooLong => write!(f, "Message too long"),
            Error::CommandTooLong => write!(f, "Command too long"),
            Error::Encode(e) => write!(f, "Encode error: {}", e),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Busy => defmt::write!(f, "Modem busy"),
            Error::NotReady => defmt::write!(f, "Modem not ready"),
            Error::MessageTooLong => defmt::write!(f, "Message too long"),
            Error::CommandTooLong => defmt::write!(f, "Command too long"),
            Error::Encode(e) => defmt::write!(f, "Encode error: {}", e),
        }
    }
}

/// Last message received.
#[derive(Debug, Clone, Default)]
pub struct ReceivedSms {
    /// Sender number or name
    pub sender: Address,
    /// Service centre time stamp, `YY/MM/DD,hh:mm:ss±zz`
    pub date: String<24>,
    /// Text
    pub text: SmsText,
}

/// Last message sent.
#[derive(Debug, Clone, Default)]
pub struct SentSms {
    /// Destination number
    pub number: PhoneNumber,
    /// Local time of the request, empty when the platform has no clock
    pub date: WallClock,
    /// Text
    pub text: MessageText,
}

/// SIM7000 SMS driver.
pub struct Modem<T: Transport, P: Platform> {
    transport: T,
    platform: P,
    config: Config,
    framer: LineFramer,
    power: PowerSequencer,

    status: Status,
    phase: Phase,
    restart_needed: bool,
    restart_reason: Status,
    registered: bool,
    ignore_errors: bool,
    began: bool,
    modem_spoke: bool,

    pending: Option<PendingCommand>,
    last_command: CommandText,
    last_answer: Line,
    retry_count: u8,
    init_cursor: usize,

    service_centre: PhoneNumber,
    transfer: Option<OutgoingTransfer>,
    pdu: PduHex,
    next_reference: u8,
    awaiting_body: Option<u64>,
    sms_header: Line,
    delete_pending: bool,
    last_received: ReceivedSms,
    last_sent: SentSms,

    on_sms: Option<SmsFn>,
    on_sent: Option<SmsFn>,
    on_line: Option<LineFn>,

    counters: Counters,
}

impl<T: Transport, P: Platform> fmt::Debug for Modem<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modem")
            .field("phase", &self.phase)
            .field("status", &self.status)
            .field("registered", &self.registered)
            .field("restart_needed", &self.restart_needed)
            .finish_non_exhaustive()
    }
}

impl<T: Transport, P: Platform> Modem<T, P> {
    /// Create a driver. Nothing happens until [`begin`](Self::begin).
    pub fn new(transport: T, platform: P, config: Config) -> Self {
        let power = PowerSequencer::new(config.power_steps_ms, config.power_key_active_high);
        Self {
            transport,
            platform,
            config,
            framer: LineFramer::new(),
            power,
            status: Status::NeedsInit,
            phase: Phase::NotConnected,
            restart_needed: false,
            restart_reason: Status::Ok,
            registered: false,
            ignore_errors: false,
            began: false,
            modem_spoke: false,
            pending: None,
            last_command: CommandText::new(),
            last_answer: Line::new(),
            retry_count: 0,
            init_cursor: 0,
            service_centre: PhoneNumber::new(),
            transfer: None,
            pdu: PduHex::new(),
            next_reference: 0,
            awaiting_body: None,
            sms_header: Line::new(),
            delete_pending: false,
            last_received: ReceivedSms::default(),
            last_sent: SentSms::default(),
            on_sms: None,
            on_sent: None,
            on_line: None,
            counters: Counters::default(),
        }
    }

    /// Register the callback run for every received SMS
    pub fn on_sms_received(&mut self, callback: SmsFn) {
        self.on_sms = Some(callback);
    }

    /// Register the callback run once every part of a message is accepted
    pub fn on_sms_sent(&mut self, callback: SmsFn) {
        self.on_sent = Some(callback);
    }

    /// Register the callback run for unclassified lines
    pub fn on_line(&mut self, callback: LineFn) {
        self.on_line = Some(callback);
    }

    /// Start (or restart) a session.
    ///
    /// Any command or transfer in progress is dropped. If the previous session
    /// never heard from the modem, the power key is only toggled once instead
    /// of running the full off/on cycle.
    pub fn begin(&mut self) {
        info!("modem begin");
        self.counters.begins += 1;
        self.restart_needed = false;
        self.status = Status::Running;
        self.phase = Phase::Starting;
        self.pending = None;
        self.transfer = None;
        self.awaiting_body = None;
        self.sms_header.clear();
        self.delete_pending = false;
        self.framer.clear();
        self.last_command.clear();
        self.retry_count = 0;

        let first_step = if self.began && !self.modem_spoke {
            SILENT_RESTART_STEP
        } else {
            0
        };
        self.began = true;
        self.modem_spoke = false;

        if !self.config.power_key || !self.power.start(&mut self.platform, first_step) {
            self.open_transport();
        }
    }

    /// Advance the driver. Call as often as possible.
    pub fn poll(&mut self) {
        if self.power.is_running() {
            if self.power.poll(&mut self.platform) {
                self.open_transport();
            }
            return;
        }
        if self.phase == Phase::NotConnected {
            return;
        }
        if self.read_line() {
            return;
        }
        if self.delete_pending && self.pending.is_none() {
            self.delete_consumed();
            return;
        }
        self.check_body_timeout();
        self.check_pending();
    }

    /// Read until a line completes. Returns `true` if one was handled.
    fn read_line(&mut self) -> bool {
        let marker = self.pending.as_ref().and_then(PendingCommand::marker);
        loop {
            let byte = match self.transport.read_byte() {
                Ok(Some(byte)) => byte,
                Ok(None) => return false,
                Err(_) => {
                    warn!("transport read failed");
                    return false;
                }
            };
            self.modem_spoke = true;
            match self.framer.push(byte, marker) {
                Feed::Pending => {}
                Feed::Overflow => {
                    error!("answer too long");
                    self.status = Status::TooLong;
                    return true;
                }
                Feed::Line => {
                    let line = self.framer.take_line();
                    self.handle_line(&line);
                    return true;
                }
            }
        }
    }

    fn ensure_idle(&self) -> Result<(), Error> {
        match self.phase {
            Phase::NotConnected | Phase::Starting => Err(Error::NotReady),
            Phase::Idle
                if self.pending.is_none()
                    && self.awaiting_body.is_none()
                    && !self.delete_pending =>
            {
                Ok(())
            }
            _ => Err(Error::Busy),
        }
    }

    /// Send `text` to `number`, split into as many parts as needed.
    ///
    /// Returns once the first part is handed to the modem; completion is
    /// reported through [`on_sms_sent`](Self::on_sms_sent) and
    /// [`is_idle`](Self::is_idle).
    pub fn send_sms(&mut self, number: &str, text: &str) -> Result<(), Error> {
        self.ensure_idle()?;
        if text.len() > MAX_MESSAGE_BYTES {
            return Err(Error::MessageTooLong);
        }
        if number.len() > PhoneNumber::new().capacity() {
            return Err(Error::Encode(EncodeError::AddressFormat));
        }

        let plan = sms::plan(text);
        info!(
            "sending {} characters as {} in {} part(s)",
            text.chars().count(),
            plan.alphabet,
            plan.parts
        );
        let reference = if plan.parts > 1 {
            self.next_reference = self.next_reference.wrapping_add(1);
            self.next_reference
        } else {
            0
        };
        let transfer =
            OutgoingTransfer::new(number, text, reference).ok_or(Error::MessageTooLong)?;

        self.last_sent = SentSms {
            number: PhoneNumber::try_from(number).unwrap_or_default(),
            date: self
                .platform
                .unix_time()
                .map(format_wall_clock)
                .unwrap_or_default(),
            text: MessageText::try_from(text).unwrap_or_default(),
        };
        self.transfer = Some(transfer);
        self.send_next_chunk().map_err(Error::Encode)
    }

    /// Encode and submit the next part, or finish the transfer.
    pub(crate) fn send_next_chunk(&mut self) -> Result<(), EncodeError> {
        let Some(transfer) = self.transfer.as_mut() else {
            self.go_idle();
            return Ok(());
        };

        if transfer.is_last() {
            info!("SMS to {} fully sent", transfer.number());
            if let Some(callback) = self.on_sent {
                callback(
                    &self.last_sent.number,
                    &self.last_sent.date,
                    &self.last_sent.text,
                );
            }
            self.go_idle();
            return Ok(());
        }

        let part = transfer.index() + 1;
        let count = transfer.count();
        match transfer.encode_next(&self.service_centre) {
            Some(Ok(pdu)) => {
                debug!("sending part {}/{}", part, count);
                self.counters.chunks_sent += 1;
                self.pdu = pdu.hex;
                self.phase = Phase::Sending;
                let timeout_ms = self.config.prompt_timeout_ms;
                self.send_formatted(
                    format_args!("AT+CMGS={}", pdu.tpdu_len),
                    ">",
                    timeout_ms,
                    Some(Continuation::SendPdu),
                );
                Ok(())
            }
            Some(Err(e)) => {
                self.counters.encode_failures += 1;
                error!("encode error {} on part {}/{}", e, part, count);
                self.go_idle();
                Err(e)
            }
            None => {
                self.go_idle();
                Ok(())
            }
        }
    }

    /// Delete messages from storage with `AT+CMGD=<index>,<flag>`.
    pub fn delete_sms(&mut self, index: u8, flag: u8) -> Result<(), Error> {
        self.ensure_idle()?;
        self.phase = Phase::Sending;
        let timeout_ms = self.config.delete_timeout_ms;
        self.send_formatted(
            format_args!("AT+CMGD={},{}", index, flag),
            engine::DEFAULT_ANSWER,
            timeout_ms,
            None,
        );
        Ok(())
    }

    /// Write an untracked command. Answers reach the line callback.
    pub fn send_at(&mut self, command: &str) -> Result<(), Error> {
        self.ensure_untracked()?;
        if command.len() > MAX_COMMAND {
            return Err(Error::CommandTooLong);
        }
        debug!("out of band {}", command);
        self.counters.commands += 1;
        if command != self.last_command.as_str() {
            self.retry_count = 0;
            self.last_command = CommandText::try_from(command).unwrap_or_default();
        }
        if self.transport.write_all(command.as_bytes()).is_err()
            || self.transport.write_all(b"\r").is_err()
        {
            error!("transport write failed");
        }
        Ok(())
    }

    /// Write an untracked end-of-message byte (0x1A).
    pub fn send_eof(&mut self) -> Result<(), Error> {
        self.ensure_untracked()?;
        self.counters.commands += 1;
        if self.transport.write_all(&[CTRL_Z]).is_err() {
            error!("transport write failed");
        }
        Ok(())
    }

    fn ensure_untracked(&self) -> Result<(), Error> {
        if self.phase == Phase::NotConnected || self.power.is_running() {
            return Err(Error::NotReady);
        }
        if self.pending.is_some() {
            return Err(Error::Busy);
        }
        Ok(())
    }

    /// Wait until the network registration is seen or `ms` elapsed.
    ///
    /// Completes on the next poll when already registered.
    pub fn wait_until_registered(&mut self, ms: u32) -> Result<(), Error> {
        self.ensure_idle()?;
        if self.registered {
            debug!("already registered");
            return Ok(());
        }
        self.phase = Phase::Sending;
        self.wait_for_registration(ms, None);
        Ok(())
    }

    /// Hold the command slot for `ms` without sending anything.
    pub fn delay(&mut self, ms: u32) -> Result<(), Error> {
        self.ensure_idle()?;
        self.phase = Phase::Sending;
        self.wait_for(ms, None);
        Ok(())
    }

    /// Set or clear the restart flag
    pub fn set_restart(&mut self, restart: bool) {
        self.restart_needed = restart;
    }

    /// Treat timeouts as success and ignore error answers
    pub fn set_ignore_errors(&mut self, ignore: bool) {
        self.ignore_errors = ignore;
    }

    /// The host should call [`begin`](Self::begin) again
    pub fn need_restart(&self) -> bool {
        self.restart_needed
    }

    /// Why the restart was requested
    pub fn restart_reason(&self) -> Status {
        self.restart_reason
    }

    /// Outcome of the last command
    pub fn status(&self) -> Status {
        self.status
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Nothing in progress
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Sending a message or a host command
    pub fn is_sending(&self) -> bool {
        self.phase == Phase::Sending
    }

    /// Handling a received message
    pub fn is_receiving(&self) -> bool {
        self.phase == Phase::Receiving
    }

    /// Power sequencing or bring-up in progress
    pub fn is_starting(&self) -> bool {
        self.phase == Phase::Starting
    }

    /// Registered on the network
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Service centre harvested at bring-up
    pub fn service_centre(&self) -> &str {
        &self.service_centre
    }

    /// Last message received
    pub fn last_received(&self) -> &ReceivedSms {
        &self.last_received
    }

    /// Last message sent
    pub fn last_sent(&self) -> &SentSms {
        &self.last_sent
    }

    /// Running totals
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Snapshot for diagnostics
    pub fn diagnostics(&self) -> Diagnostics<'_> {
        Diagnostics {
            phase: self.phase,
            status: self.status,
            need_restart: self.restart_needed,
            restart_reason: self.restart_reason,
            registered: self.registered,
            power_step: self.power.is_running().then(|| self.power.step() as u8),
            last_command: &self.last_command,
            service_centre: &self.service_centre,
            sms_header: &self.sms_header,
            counters: self.counters,
        }
    }

    /// The transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The transport, mutably
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The platform
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// The platform, mutably
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }
}
