use criterion::{BatchSize, Criterion, Throughput};
use simsms::modem::Modem;
use simsms::modem::config::Config;
use simsms::network::error::Error;
use simsms::network::{Read, Transport, Write};
use simsms::system::Platform;
use std::cell::Cell;
use std::collections::VecDeque;

const BRING_UP: &str = "\r\nOK\r\n\r\nOK\r\n\r\nOK\r\n\r\nOK\r\n\r\nOK\r\n\r\nOK\r\n\r\nOK\r\n\
\r\nOK\r\n\r\nOK\r\n\r\nOK\r\n\r\n+CREG: 2,1\r\nOK\r\n\r\nOK\r\n\r\n+CSCA: \"+33609001390\",145\r\n";

const INCOMING: &str = "\r\n+CMT: ,29\r\n\
07913396050066F0040B913306672146F00000328041102270800FCDF27C1E3E9741E432885E9ED301\r\n\r\nOK\r\n";

#[derive(Default)]
struct LoopbackUart {
    rx: VecDeque<u8>,
    written: usize,
}

impl Read for LoopbackUart {
    type Error = Error;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match (buf.first_mut(), self.rx.pop_front()) {
            (Some(slot), Some(byte)) => {
                *slot = byte;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

impl Write for LoopbackUart {
    type Error = Error;
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.written += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Transport for LoopbackUart {
    fn open(&mut self, _baud_rate: u32) -> Result<(), Error> {
        Ok(())
    }
}

#[derive(Default)]
struct FrozenClock {
    now: Cell<u64>,
}

impl Platform for FrozenClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

type BenchModem = Modem<LoopbackUart, FrozenClock>;

fn drain(modem: &mut BenchModem, script: &str) {
    modem.transport_mut().rx.extend(script.as_bytes());
    while !modem.transport().rx.is_empty() {
        modem.poll();
    }
    modem.poll();
}

fn started_modem() -> BenchModem {
    let mut modem = Modem::new(
        LoopbackUart::default(),
        FrozenClock::default(),
        Config::default(),
    );
    modem.begin();
    drain(&mut modem, BRING_UP);
    assert!(modem.is_idle(), "Failed to start modem");
    modem
}

pub fn bench_receive_sms(c: &mut Criterion) {
    let mut group = c.benchmark_group("receive_sms");
    group.throughput(Throughput::Bytes(INCOMING.len() as u64));
    group.bench_function("receive_sms", |b| {
        b.iter_batched_ref(
            started_modem,
            |modem| {
                drain(modem, INCOMING);
                assert!(modem.is_idle());
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

pub fn bench_send_multi_part(c: &mut Criterion) {
    let mut group = c.benchmark_group("send_multi_part");
    let text = "a".repeat(600);
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("send_multi_part", |b| {
        b.iter_batched_ref(
            started_modem,
            |modem| {
                modem
                    .send_sms("+33607612640", &text)
                    .expect("Failed to send");
                while modem.is_sending() {
                    drain(modem, "\r\n> ");
                    drain(modem, "\r\n+CMGS: 1\r\n");
                }
                assert_eq!(modem.counters().chunks_sent, 4);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}
