//! Short share codes for rotation board links.
//!
//! A rotation id round-trips through a compact, URL-safe code so operators
//! can hand out board links without exposing raw UUIDs. The encoding is
//! deterministic; access control on the resulting views lives with the
//! caller.

use sqids::Sqids;
use uuid::Uuid;

fn sqids_instance() -> Sqids {
    Sqids::builder()
        .min_length(8)
        .build()
        .expect("valid sqids config")
}

pub fn uuid_to_share_code(uuid: Uuid) -> String {
    let bytes = uuid.as_bytes();
    let high = u64::from_be_bytes(bytes[0..8].try_into().unwrap());
    let low = u64::from_be_bytes(bytes[8..16].try_into().unwrap());
    sqids_instance().encode(&[high, low]).expect("sqids encode")
}

pub fn share_code_to_uuid(code: &str) -> Option<Uuid> {
    let nums = sqids_instance().decode(code);
    if nums.len() != 2 {
        return None;
    }
    let mut bytes = [0u8; 16];
    bytes[0..8].copy_from_slice(&nums[0].to_be_bytes());
    bytes[8..16].copy_from_slice(&nums[1].to_be_bytes());
    Some(Uuid::from_bytes(bytes))
}
