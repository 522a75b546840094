use rand::Rng;

/// Derives a fresh object key `<PREFIX>_<filename>` so repeated uploads of the same
/// filename land on distinct keys. The prefix is `prefix_len` letters in `A..=Z`.
pub fn gen_object_key(filename: &str, prefix_len: usize) -> String {
    format!("{}_{filename}", gen_key_prefix(prefix_len))
}

// thread_rng is seeded from the OS once per thread, never per call.
pub fn gen_key_prefix(prefix_len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..prefix_len)
        .map(|_| rng.gen_range(b'A'..=b'Z') as char)
        .collect()
}
