//! Composite key layout.
//!
//! Identifiers never contain `0x00` (see `credence_types::ids`), so a NUL
//! separator keeps every composite key unambiguous and makes "all records of
//! one owner in one domain" a contiguous prefix range.

use credence_types::{Domain, RecordId, UserId};

const SEP: u8 = 0;

/// `user ++ 0 ++ domain_tag`
pub fn bucket_key(user: &UserId, domain: Domain) -> Vec<u8> {
    let u = user.as_str().as_bytes();
    let mut key = Vec::with_capacity(u.len() + 2);
    key.extend_from_slice(u);
    key.push(SEP);
    key.push(domain.tag());
    key
}

/// `owner ++ 0 ++ domain_tag ++ 0`
pub fn record_prefix(owner: &UserId, domain: Domain) -> Vec<u8> {
    let mut key = bucket_key(owner, domain);
    key.push(SEP);
    key
}

/// `owner ++ 0 ++ domain_tag ++ 0 ++ record_id`
pub fn record_key(owner: &UserId, domain: Domain, id: &RecordId) -> Vec<u8> {
    let mut key = record_prefix(owner, domain);
    key.extend_from_slice(id.as_str().as_bytes());
    key
}

/// Turn `prefix` into the smallest key greater than every key starting with
/// it, for use as an exclusive range bound.
pub fn increment_prefix(prefix: &mut Vec<u8>) {
    while let Some(last) = prefix.last_mut() {
        if *last < u8::MAX {
            *last += 1;
            return;
        }
        prefix.pop();
    }
}
