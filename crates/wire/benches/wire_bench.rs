use std::hint::black_box;

use bytes::BytesMut;
use criterion::{Criterion, criterion_group, criterion_main};
use micro_wire::codec::{HttpCodec, HttpDecoder};
use micro_wire::websocket::{Opcode, WebSocketDecoder, encode};
use tokio_util::codec::Decoder;

const GET: &[u8] = b"GET /description.xml HTTP/1.1\r\nHost: 192.168.1.20:49152\r\nUser-Agent: bench\r\n\r\n";

const CHUNKED: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";

fn bench_http_decoder(c: &mut Criterion) {
    c.bench_function("decode_get_request", |b| {
        b.iter(|| {
            let mut decoder = HttpDecoder::new();
            let consumed = decoder.process_bytes(black_box(GET)).unwrap();
            black_box((consumed, decoder.take()));
        });
    });

    c.bench_function("decode_chunked_response", |b| {
        b.iter(|| {
            let mut codec = HttpCodec::new();
            let mut src = BytesMut::from(black_box(CHUNKED));
            black_box(codec.decode(&mut src).unwrap());
        });
    });

    c.bench_function("decode_get_request_bytewise", |b| {
        b.iter(|| {
            let mut decoder = HttpDecoder::new();
            for byte in GET.chunks(1) {
                decoder.process_bytes(black_box(byte)).unwrap();
            }
            black_box(decoder.take());
        });
    });
}

fn bench_websocket_decoder(c: &mut Criterion) {
    let mut frame = BytesMut::new();
    encode(&[0x5a; 4096], Opcode::Binary, &mut frame);
    let frame = frame.freeze();

    c.bench_function("decode_websocket_binary_4k", |b| {
        b.iter(|| {
            let mut decoder = WebSocketDecoder::new();
            let consumed = decoder.process(black_box(&frame)).unwrap();
            black_box((consumed, decoder.take()));
        });
    });
}

criterion_group!(benches, bench_http_decoder, bench_websocket_decoder);
criterion_main!(benches);
