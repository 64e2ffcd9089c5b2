use md5::{Digest, Md5};

/// Lower-case hex MD5 digest of `content`. Equality of this hash is the sole
/// criterion the scanner uses to decide a file is unchanged.
#[must_use]
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(content);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_same_hash() {
        assert_eq!(content_hash(b"fn main() {}"), content_hash(b"fn main() {}"));
    }

    #[test]
    fn different_content_different_hash() {
        assert_ne!(content_hash(b"a"), content_hash(b"b"));
    }

    #[test]
    fn hash_is_lowercase_hex_32_chars() {
        let h = content_hash(b"hello world");
        assert_eq!(h.len(), 32);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
