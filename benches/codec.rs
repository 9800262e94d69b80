//! Wire codec benchmark suite.
//!
//! Measures the hot path of the event loop:
//! - Classifying inbound frames (success, error, event)
//! - Decoding typed event payloads
//! - Encoding outbound commands
//!
//! Run with: cargo bench --bench codec
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::{Value, json};

use webdriver_bidi::protocol::browsing_context::{Navigate, ReadinessState};
use webdriver_bidi::protocol::message::Message;
use webdriver_bidi::{BrowsingContextId, Codec, Command, CommandId};

// ============================================================================
// Frames
// ============================================================================

fn success_frame() -> String {
    json!({
        "type": "success",
        "id": 42,
        "result": { "navigation": "nav-1", "url": "https://example.com/" }
    })
    .to_string()
}

fn error_frame() -> String {
    json!({
        "type": "error",
        "id": 43,
        "error": "no such frame",
        "message": "context gone",
        "stacktrace": ""
    })
    .to_string()
}

fn request_event_params() -> Value {
    json!({
        "context": "ctx",
        "isBlocked": false,
        "navigation": null,
        "redirectCount": 0,
        "request": {
            "request": "req-1",
            "url": "https://example.com/app.js",
            "method": "GET",
            "headers": [
                { "name": "accept", "value": { "type": "string", "value": "*/*" } },
                { "name": "user-agent", "value": { "type": "string", "value": "bench" } }
            ],
            "cookies": [],
            "headersSize": 64,
            "bodySize": 0,
            "destination": "script",
            "initiatorType": "script",
            "timings": {
                "timeOrigin": 0, "requestTime": 0, "redirectStart": 0,
                "redirectEnd": 0, "fetchStart": 0, "dnsStart": 0, "dnsEnd": 0,
                "connectStart": 0, "connectEnd": 0, "tlsStart": 0,
                "requestStart": 0, "responseStart": 0, "responseEnd": 0
            }
        },
        "timestamp": 1,
        "initiator": { "type": "script" }
    })
}

fn event_frame() -> String {
    json!({
        "type": "event",
        "method": "network.beforeRequestSent",
        "params": request_event_params()
    })
    .to_string()
}

// ============================================================================
// Benchmark: Inbound Classification
// ============================================================================

fn bench_decode_message(c: &mut Criterion) {
    let codec = Codec::new();
    let frames = [
        ("success", success_frame()),
        ("error", error_frame()),
        ("event", event_frame()),
    ];

    let mut group = c.benchmark_group("decode_message");
    for (name, frame) in &frames {
        group.throughput(Throughput::Bytes(frame.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), frame, |b, frame| {
            b.iter(|| codec.decode_message(black_box(frame)));
        });
    }
    group.finish();
}

// ============================================================================
// Benchmark: Event Payloads
// ============================================================================

fn bench_decode_event(c: &mut Criterion) {
    let codec = Codec::new();
    let frame = event_frame();

    c.bench_function("classify_and_decode_event", |b| {
        b.iter(|| {
            if let Ok(Message::Event(event)) = codec.decode_message(black_box(&frame)) {
                black_box(codec.decode_event(&event.method, event.params));
            }
        });
    });
}

// ============================================================================
// Benchmark: Outbound Encoding
// ============================================================================

fn bench_encode_command(c: &mut Criterion) {
    let codec = Codec::new();
    let command: Command = Navigate {
        context: BrowsingContextId::new("ctx"),
        url: "https://example.com/".to_string(),
        wait: Some(ReadinessState::Complete),
    }
    .into();

    c.bench_function("encode_command", |b| {
        let mut id = CommandId::new(1);
        b.iter(|| {
            id = id.next();
            codec.encode_command(id, black_box(&command))
        });
    });
}

criterion_group!(
    benches,
    bench_decode_message,
    bench_decode_event,
    bench_encode_command
);
criterion_main!(benches);
