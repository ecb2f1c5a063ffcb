use criterion::{criterion_group, criterion_main};

mod modem;
mod sms;

criterion_group!(
    benches,
    sms::pdu::bench_encode_submit,
    sms::pdu::bench_decode_deliver,
    sms::pdu::bench_plan_long_text,
    modem::session::bench_receive_sms,
    modem::session::bench_send_multi_part
);
criterion_main!(benches);
