//! Session state reported to the host.

use core::fmt;

use serde::Serialize;

/// Outcome of the last command, also used as the restart reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    /// Last command answered as expected
    Ok,
    /// A command is in flight
    Running,
    /// No answer before the deadline
    Timeout,
    /// An incoming line overflowed the answer buffer
    TooLong,
    /// Only part of an answer arrived before the deadline
    BadAnswer,
    /// The modem answered `+CME ERROR` or `+CMS ERROR`
    ModemError,
    /// The session was never started or the transport failed to open
    NeedsInit,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Ok => "ok",
            Status::Running => "running",
            Status::Timeout => "timeout",
            Status::TooLong => "too long",
            Status::BadAnswer => "bad answer",
            Status::ModemError => "modem error",
            Status::NeedsInit => "needs init",
        };
        f.write_str(s)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Status {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Status::Ok => defmt::write!(f, "ok"),
            Status::Running => defmt::write!(f, "running"),
            Status::Timeout => defmt::write!(f, "timeout"),
            Status::TooLong => defmt::write!(f, "too long"),
            Status::BadAnswer => defmt::write!(f, "bad answer"),
            Status::ModemError => defmt::write!(f, "modem error"),
            Status::NeedsInit => defmt::write!(f, "needs init"),
        }
    }
}

/// What the driver is busy with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Ready for a new operation
    Idle,
    /// Sending an SMS or a host command
    Sending,
    /// Between an SMS arrival and the deletion of its storage slot
    Receiving,
    /// Power sequencing or bring-up in progress
    Starting,
    /// `begin` was never called
    NotConnected,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Sending => "sending",
            Phase::Receiving => "receiving",
            Phase::Starting => "starting",
            Phase::NotConnected => "not connected",
        };
        f.write_str(s)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Phase {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Phase::Idle => defmt::write!(f, "idle"),
            Phase::Sending => defmt::write!(f, "sending"),
            Phase::Receiving => defmt::write!(f, "receiving"),
            Phase::Starting => defmt::write!(f, "starting"),
            Phase::NotConnected => defmt::write!(f, "not connected"),
        }
    }
}

/// Running totals since the driver was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    /// Commands issued, retries included
    pub commands: u32,
    /// Calls to `begin`
    pub begins: u32,
    /// Bring-ups that completed
    pub restarts: u32,
    /// Messages decoded and delivered
    pub sms_received: u32,
    /// Received PDUs that failed to decode
    pub decode_failures: u32,
    /// SMS parts handed to the modem
    pub chunks_sent: u32,
    /// Parts that failed to encode
    pub encode_failures: u32,
}

/// Snapshot of the driver state, serializable for remote diagnostics.
///
/// ```
/// # use simsms::modem::status::{Counters, Diagnostics, Phase, Status};
/// let diag = Diagnostics {
///     phase: Phase::Idle,
///     status: Status::Ok,
///     need_restart: false,
///     restart_reason: Status::Ok,
///     registered: true,
///     power_step: None,
///     last_command: "AT+CSCA?",
///     service_centre: "+33609001390",
///     sms_header: "",
///     counters: Counters::default(),
/// };
/// let mut buf = [0u8; 512];
/// let len = serde_json_core::to_slice(&diag, &mut buf).unwrap();
/// assert!(core::str::from_utf8(&buf[..len]).unwrap().starts_with("{\"phase\":\"Idle\""));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics<'a> {
    /// Current phase
    pub phase: Phase,
    /// Last command outcome
    pub status: Status,
    /// Restart requested
    pub need_restart: bool,
    /// Why the restart was requested
    pub restart_reason: Status,
    /// Network registration seen
    pub registered: bool,
    /// Power step while sequencing
    pub power_step: Option<u8>,
    /// Text of the last command sent
    pub last_command: &'a str,
    /// Service centre number harvested at bring-up
    pub service_centre: &'a str,
    /// `+CMT:` indicator of a message whose body has not been handled
    pub sms_header: &'a str,
    /// Totals
    pub counters: Counters,
}
