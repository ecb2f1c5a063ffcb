#![allow(dead_code)]

use simsms::modem::Modem;
use simsms::modem::config::Config;
use simsms::network::error::Error;
use simsms::network::{Read, Transport, Write};
use simsms::system::{PinLevel, Platform};
use std::collections::VecDeque;

/// Transport fed by the test and recording everything the driver writes
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    pub opened_at: Vec<u32>,
    pub fail_open: bool,
}

impl Read for ScriptedTransport {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut count = 0;
        while count < buf.len() {
            match self.rx.pop_front() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }
}

impl Write for ScriptedTransport {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Transport for ScriptedTransport {
    fn open(&mut self, baud_rate: u32) -> Result<(), Error> {
        if self.fail_open {
            return Err(Error::UnsupportedBaudRate);
        }
        self.opened_at.push(baud_rate);
        Ok(())
    }
}

/// Clock moved by hand, recording power key activity
#[derive(Debug, Default)]
pub struct ManualClock {
    pub now: u64,
    pub levels: Vec<PinLevel>,
    pub releases: usize,
    pub unix: Option<i64>,
}

impl Platform for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn set_power_key(&mut self, level: PinLevel) {
        self.levels.push(level);
    }

    fn release_power_key(&mut self) {
        self.releases += 1;
    }

    fn unix_time(&self) -> Option<i64> {
        self.unix
    }

    fn set_unix_time(&mut self, unix_seconds: i64) {
        self.unix = Some(unix_seconds);
    }
}

pub type TestModem = Modem<ScriptedTransport, ManualClock>;

pub const SERVICE_CENTRE: &str = "+33609001390";

/// Answers for every bring-up command after the first `AT`
pub const BRING_UP: [(&str, &str); 12] = [
    ("AT+IPR=115200", "OK"),
    ("ATE0", "OK"),
    ("AT+CMEE=2", "OK"),
    ("AT+CMGF=0", "OK"),
    ("AT+CNMP=51", "OK"),
    ("AT+CREG=2", "OK"),
    ("AT+CSDH=1", "OK"),
    ("AT+CMGD=1,4", "OK"),
    ("AT+CNMI=2,2,0,2,0", "OK"),
    ("AT+CREG?", "+CREG: 2,1,\"1A2B\",\"01C3\",7\r\nOK"),
    ("AT+CLTS=1", "OK"),
    ("AT+CSCA?", "+CSCA: \"+33609001390\",145\r\nOK"),
];

pub fn new_modem(config: Config) -> TestModem {
    Modem::new(ScriptedTransport::default(), ManualClock::default(), config)
}

/// Queue bytes for the driver to read
pub fn feed(modem: &mut TestModem, text: &str) {
    modem.transport_mut().rx.extend(text.as_bytes());
}

/// Poll until every queued byte is consumed
pub fn pump(modem: &mut TestModem) {
    for _ in 0..64 {
        modem.poll();
        if modem.transport().rx.is_empty() {
            break;
        }
    }
    modem.poll();
}

/// Queue `text` as modem output lines and process it
pub fn reply(modem: &mut TestModem, text: &str) {
    feed(modem, "\r\n");
    feed(modem, text);
    feed(modem, "\r\n");
    pump(modem);
}

/// Everything written since the last call, lossily decoded
pub fn take_written(modem: &mut TestModem) -> String {
    let bytes = std::mem::take(&mut modem.transport_mut().tx);
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Move the clock forward and poll once
pub fn advance(modem: &mut TestModem, ms: u64) {
    modem.platform_mut().now += ms;
    modem.poll();
}

/// Run the whole bring-up and leave the driver idle
pub fn bring_up(modem: &mut TestModem) {
    modem.begin();
    assert_eq!(take_written(modem), "AT\r");
    reply(modem, "OK");
    for (command, answer) in BRING_UP {
        assert_eq!(take_written(modem), format!("{}\r", command));
        reply(modem, answer);
    }
    assert!(modem.is_idle(), "bring-up did not finish: {:?}", modem);
}

/// A driver with default configuration, already started
pub fn started_modem() -> TestModem {
    let mut modem = new_modem(Config::default());
    bring_up(&mut modem);
    take_written(&mut modem);
    modem
}
