//! Benchmarks for the response matcher.
//!
//! ## Running the benchmarks
//!
//! ```bash
//! cargo bench -p atcmd-parser
//! ```
//!
//! ## Benchmarks included
//!
//! - `pattern_rewrite` - Splitting and rewriting response patterns
//! - `recv/N_noise_lines` - Matching a two-line response behind N noise lines
//! - `recv_with_oob` - Matching a response interrupted by a notification

use std::time::Duration;

use atcmd_parser::{AtParser, OobAction, ParserConfig, PatternLine, Transport, TransportError};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Replays the same input on every pass.
struct ReplayTransport {
    input: Vec<u8>,
    pos: usize,
}

impl ReplayTransport {
    fn new(input: Vec<u8>) -> Self {
        ReplayTransport { input, pos: 0 }
    }
}

impl Transport for ReplayTransport {
    fn init(&mut self, _timeout: Duration) -> Result<(), TransportError> {
        Ok(())
    }

    fn read_byte(&mut self, _timeout: Duration) -> Option<u8> {
        let byte = self.input.get(self.pos).copied();
        self.pos += 1;
        byte
    }

    fn write_byte(&mut self, _byte: u8) -> Result<(), TransportError> {
        Ok(())
    }

    fn data_available(&mut self) -> bool {
        self.pos < self.input.len()
    }
}

fn bench_pattern_rewrite(c: &mut Criterion) {
    let patterns = [
        "OK",
        "+CSQ: %d,%d\r\nOK\r\n",
        "\r\n+CMGL: %d,\"%[^\"]\",\"%[^\"]\",,\"%[^\"]\"\r\n%[^\r\n]\r\n\r\nOK\r\n",
    ];

    c.bench_function("pattern_rewrite", |b| {
        b.iter(|| {
            for pattern in &patterns {
                black_box(PatternLine::split(black_box(pattern)).ok());
            }
        });
    });
}

fn bench_recv(c: &mut Criterion) {
    let mut group = c.benchmark_group("recv");

    for noise_lines in [0usize, 4, 16].iter() {
        let mut input = Vec::new();
        for i in 0..*noise_lines {
            input.extend_from_slice(format!("+NOISE: {}\r\n", i).as_bytes());
        }
        input.extend_from_slice(b"+CSQ: 21,99\r\n\r\nOK\r\n");
        group.throughput(Throughput::Bytes(input.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("noise_lines", noise_lines),
            &input,
            |b, input| {
                let transport = ReplayTransport::new(input.clone());
                let mut at = AtParser::new(transport, ParserConfig::default()).unwrap();
                b.iter(|| {
                    at.transport_mut().pos = 0;
                    black_box(at.recv("+CSQ: %d,%d\r\nOK\r\n").unwrap());
                });
            },
        );
    }

    group.finish();
}

fn bench_recv_with_oob(c: &mut Criterion) {
    let input = b"+CSQ: 1,1\r\n+CMTI: \"SM\",3\r\n+CSQ: 21,99\r\nOK\r\n".to_vec();
    let transport = ReplayTransport::new(input);
    let mut at = AtParser::new(transport, ParserConfig::default()).unwrap();
    at.register_oob("+CMTI:", |at| {
        let _ = at.recv(" \"%*[^\"]\",%d\r\n");
        OobAction::Continue
    });

    c.bench_function("recv_with_oob", |b| {
        b.iter(|| {
            at.transport_mut().pos = 0;
            black_box(at.recv("+CSQ: %d,%d\r\nOK\r\n").unwrap());
        });
    });
}

criterion_group!(benches, bench_pattern_rewrite, bench_recv, bench_recv_with_oob);
criterion_main!(benches);
