use rand::Rng;

/// Length of generated short codes.
pub const DEFAULT_LENGTH: usize = 6;

pub(crate) const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random alphanumeric string of the given length.
///
/// No collision avoidance happens here; callers check uniqueness against the
/// store and draw again if needed.
pub fn generate(len: usize) -> String {
    generate_with(&mut rand::thread_rng(), len)
}

/// Same as [`generate`] but drawing from the supplied RNG.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
