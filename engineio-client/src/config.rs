//! Compile-time constants and small helpers shared by the transport and packet layers.

use rand::Rng;

/// Default Engine.IO protocol major version, used when configuration asks for `0`.
pub const DEFAULT_EIO_VERSION: u8 = 4;

/// Default Socket.IO URL path segment.
pub const DEFAULT_SIO_URL_PATH: &str = "/socket.io";

/// Length of the cache-busting token appended to every request URL.
pub const TOKEN_LEN: usize = 7;

/// A sane upper bound used when a response carries no `Content-Length` header.
pub const MAX_RECV_BUFFER: usize = 512;

const TOKEN_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a random cache-busting token of `length` characters drawn from
/// `[A-Za-z0-9]`.
///
/// Draws uniformly over the full `TOKEN_CHARSET.len()` range, avoiding an off-by-one
/// that would under-cover the last charset character. The token remains a
/// cache-buster, not a secret, so `rand`'s default non-cryptographic generator is used
/// deliberately, not upgraded.
pub fn random_token(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| TOKEN_CHARSET[rng.gen_range(0..TOKEN_CHARSET.len())] as char)
        .collect()
}
