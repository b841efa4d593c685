//! Stable location ids derived from postal addresses.
//!
//! The id is the first 32 hex characters of SHA-256 over the compact JSON form
//! of the address (`line`, `city`, `state`, `postalCode`, `district`). Absent
//! optional fields are left out of the JSON entirely, so adding a district or
//! a second street line yields a different id.

use sha2::{Digest, Sha256};

use crate::domain::model::Address;
use crate::utils::error::Result;

pub const ADDRESS_ID_LEN: usize = 32;

pub fn address_id(address: &Address) -> Result<String> {
    let canonical = serde_json::to_vec(address)?;
    let digest = Sha256::digest(&canonical);
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    Ok(hex[..ADDRESS_ID_LEN].to_string())
}
