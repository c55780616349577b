//! Simple benchmark suite for the kmr codec.

use std::time::{Duration, Instant};

use kmr::EncodeParameters;
use rand::Rng;
use rand::SeedableRng;

fn ns() -> Instant {
    Instant::now()
}

#[inline(never)]
fn benchmark_fn(runs: u32, avg_time: &mut Duration, mut f: impl FnMut()) {
    f();

    let mut time = Duration::ZERO;
    for _ in 0..runs {
        let time_start = ns();
        f();
        time += time_start.elapsed();
    }

    *avg_time = time / runs;
}

struct BenchmarkResult {
    w: u32,
    h: u32,
    size: u64,
    encode_time: Duration,
    decode_time: Duration,
}

/// A synthetic RGBA image with smooth gradients and a little high-frequency
/// noise mixed in, so neither the nodal skeleton nor the Paeth residual
/// degenerates to a trivial constant stream.
fn synthetic_image(w: u32, h: u32, seed: u64) -> Vec<u8> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut pixels = vec![0u8; (w * h * 4) as usize];
    for y in 0..h {
        for x in 0..w {
            let idx = ((y * w + x) * 4) as usize;
            let noise: i32 = rng.gen_range(-8..=8);
            pixels[idx] = ((x * 255 / w.max(1)) as i32 + noise).clamp(0, 255) as u8;
            pixels[idx + 1] = ((y * 255 / h.max(1)) as i32 + noise).clamp(0, 255) as u8;
            pixels[idx + 2] = (((x + y) * 255 / (w + h).max(1)) as i32 + noise).clamp(0, 255) as u8;
            pixels[idx + 3] = 255;
        }
    }
    pixels
}

fn benchmark_image(w: u32, h: u32, params: EncodeParameters, runs: u32) -> BenchmarkResult {
    let pixels = synthetic_image(w, h, 0x5EED);

    let mut res = BenchmarkResult { w, h, size: 0, encode_time: Duration::ZERO, decode_time: Duration::ZERO };

    let encoded = kmr::encode(&pixels, w, h, params).unwrap();
    res.size = encoded.len() as u64;

    benchmark_fn(runs, &mut res.decode_time, || {
        kmr::decode(&encoded).unwrap();
    });

    benchmark_fn(runs, &mut res.encode_time, || {
        kmr::encode(&pixels, w, h, params).unwrap();
    });

    res
}

fn print_result(label: &str, res: &BenchmarkResult) {
    let px = (res.w as f64) * (res.h as f64);
    println!(
        "{label:<14} {:4}x{:<4}  encode {:8.3} ms  decode {:8.3} ms  encode {:7.2} mpps  decode {:7.2} mpps  size {:7} kb",
        res.w,
        res.h,
        res.encode_time.as_secs_f64() * 1000.0,
        res.decode_time.as_secs_f64() * 1000.0,
        px / (res.encode_time.as_secs_f64() * 1_000_000.0),
        px / (res.decode_time.as_secs_f64() * 1_000_000.0),
        res.size / 1024,
    );
}

fn main() {
    let mut args = std::env::args();
    args.next();
    let runs: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(10).max(1);

    println!("## kmr encode/decode -- {runs} runs per image");
    println!();

    let sizes = [(64, 64), (256, 256), (1024, 768)];
    let configs = [
        ("lossless", EncodeParameters::new(8, 0, true)),
        ("discard=2,flat", EncodeParameters::new(8, 2, false)),
        ("discard=4,smooth", EncodeParameters::new(16, 4, true)),
    ];

    for &(w, h) in &sizes {
        for (label, params) in configs {
            let res = benchmark_image(w, h, params, runs);
            print_result(label, &res);
        }
        println!();
    }
}
