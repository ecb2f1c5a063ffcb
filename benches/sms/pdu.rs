use criterion::{Criterion, Throughput};
use simsms::sms::pdu::{Deliver, Submit};
use simsms::sms::{Alphabet, OutgoingTransfer, plan};
use std::hint::black_box;

const DELIVER: &str =
    "07913396050066F0040B913306672146F00000328041102270800FCDF27C1E3E9741E432885E9ED301";

pub fn bench_encode_submit(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_submit");
    let text = "The quick brown fox jumps over the lazy dog, then naps for a while.";
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("gsm7", |b| {
        b.iter(|| {
            Submit {
                service_centre: "+33609001390",
                destination: "+33607612640",
                text: black_box(text),
                alphabet: Alphabet::Gsm7,
                concat: None,
            }
            .encode()
            .expect("Failed to encode")
        })
    });
    group.bench_function("ucs2", |b| {
        b.iter(|| {
            Submit {
                service_centre: "+33609001390",
                destination: "+33607612640",
                text: black_box("Привет, как дела?"),
                alphabet: Alphabet::Ucs2,
                concat: None,
            }
            .encode()
            .expect("Failed to encode")
        })
    });
    group.finish();
}

pub fn bench_decode_deliver(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_deliver");
    group.throughput(Throughput::Bytes(DELIVER.len() as u64 / 2));
    group.bench_function("decode_deliver", |b| {
        b.iter(|| Deliver::decode(black_box(DELIVER)).expect("Failed to decode"))
    });
    group.finish();
}

pub fn bench_plan_long_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_long_text");
    let text = "Long message {with} [brackets] and euros € ".repeat(20);
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("plan", |b| b.iter(|| plan(black_box(&text))));
    group.bench_function("encode_all_parts", |b| {
        b.iter(|| {
            let mut transfer =
                OutgoingTransfer::new("+33607612640", &text, 7).expect("Failed to prepare");
            while let Some(pdu) = transfer.encode_next("+33609001390") {
                black_box(pdu.expect("Failed to encode"));
            }
        })
    });
    group.finish();
}
