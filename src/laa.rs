//! Large-address-awareness ("4GB patch").
//!
//! All supported games share the same COFF header tail: characteristics
//! `0x010F` directly followed by the PE32 optional-header magic `0x010B`.
//! Setting bit 5 of the characteristics turns `0F 01` into `2F 01`.

use goblin::pe::characteristic::IMAGE_FILE_LARGE_ADDRESS_AWARE;
use goblin::pe::PE;
use tracing::debug;

use crate::resolution::Resolution;
use crate::substitute::Edit;

const HEADER_TAIL: [u8; 4] = [0x0F, 0x01, 0x0B, 0x01];
const HEADER_TAIL_LAA: [u8; 4] = [0x2F, 0x01, 0x0B, 0x01];

/// Whether the LAA flag should be set. `forced` is the explicit
/// `--lla=true|false` choice; without it, large resolutions turn it on.
pub fn should_enable(resolution: Resolution, forced: Option<bool>) -> bool {
    forced.unwrap_or_else(|| resolution.is_large())
}

pub fn edit() -> Edit {
    Edit::replace("large address aware", &HEADER_TAIL, &HEADER_TAIL_LAA)
}

/// LAA state recorded in the PE header, or `None` when `image` is not a
/// parseable PE file.
pub fn large_address_aware(image: &[u8]) -> Option<bool> {
    match PE::parse(image) {
        Ok(pe) => {
            let characteristics = pe.header.coff_header.characteristics;
            debug!(
                "PE{} image, characteristics {:#06x}",
                if pe.is_64 { "32+" } else { "32" },
                characteristics
            );
            Some(characteristics & IMAGE_FILE_LARGE_ADDRESS_AWARE != 0)
        }
        Err(e) => {
            debug!("Could not parse PE header: {}", e);
            None
        }
    }
}
