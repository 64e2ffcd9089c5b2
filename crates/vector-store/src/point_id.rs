const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Deterministic 64-bit FNV-1a hash of a chunk's string id, used as the
/// point id a vector store needs. Collisions are astronomically unlikely for
/// any realistic repository and are treated as upsert-equivalent: a collided
/// id simply overwrites the prior point rather than widening to a 128-bit id.
#[must_use]
pub fn chunk_point_id(chunk_id: &str) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in chunk_id.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_across_calls() {
        assert_eq!(
            chunk_point_id("src/main.rs:1:0"),
            chunk_point_id("src/main.rs:1:0")
        );
    }

    #[test]
    fn distinct_ids_differ_with_overwhelming_probability() {
        let a = chunk_point_id("src/main.rs:1:0");
        let b = chunk_point_id("src/main.rs:1:1");
        assert_ne!(a, b);
    }

    #[test]
    fn empty_id_still_hashes() {
        assert_eq!(chunk_point_id(""), FNV_OFFSET_BASIS);
    }

    #[test]
    fn property_no_collisions_across_a_thousand_sequential_ids() {
        use std::collections::HashSet;
        let ids: HashSet<u64> = (0..1000)
            .map(|i| chunk_point_id(&format!("src/file_{i}.rs:{i}:0")))
            .collect();
        assert_eq!(ids.len(), 1000);
    }
}
