use std::time::Instant;

use hunter::{digest_hex, pow_solve_from};

pub(super) fn run_pow(seed: &str, difficulty: u32, start: u64) -> Result<(), String> {
    if difficulty > 64 {
        return Err(format!(
            "difficulty {} exceeds the 64 hex digits of a sha256 digest",
            difficulty
        ));
    }
    let started = Instant::now();
    let nonce = pow_solve_from(seed, difficulty, start);
    println!(
        "nonce={} digest={} ({} ms)",
        nonce,
        digest_hex(seed, nonce),
        started.elapsed().as_millis()
    );
    Ok(())
}
