use sha2::{Digest, Sha256};

/// Hex SHA-256 of the decimal concatenation `seed‖nonce`.
pub fn digest_hex(seed: &str, nonce: u64) -> String {
    hex::encode(pow_hash(seed, nonce))
}

fn pow_hash(seed: &str, nonce: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hasher.finalize().into()
}

/// True when the first `difficulty` hex digits of the hash are zero.
pub fn pow_valid(seed: &str, nonce: u64, difficulty: u32) -> bool {
    leading_zero_nibbles(&pow_hash(seed, nonce)) >= difficulty
}

fn leading_zero_nibbles(hash: &[u8]) -> u32 {
    let mut count = 0;
    for byte in hash {
        if *byte == 0 {
            count += 2;
            continue;
        }
        if byte >> 4 == 0 {
            count += 1;
        }
        break;
    }
    count
}

/// Smallest valid nonce.
pub fn pow_solve(seed: &str, difficulty: u32) -> u64 {
    pow_solve_from(seed, difficulty, 0)
}

/// Find a valid nonce starting from `start_nonce` (inclusive).
pub fn pow_solve_from(seed: &str, difficulty: u32, start_nonce: u64) -> u64 {
    let mut nonce = start_nonce;
    loop {
        if pow_valid(seed, nonce, difficulty) {
            return nonce;
        }
        nonce = nonce.wrapping_add(1);
    }
}
