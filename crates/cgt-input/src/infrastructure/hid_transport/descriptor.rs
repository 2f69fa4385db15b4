//! Minimal HID report-descriptor scanner.
//!
//! Only the first Usage Page and first Usage items are needed: together
//! they name the top-level collection, which is how the virtual driver's
//! two interfaces are told apart.

use cgt_core::hid::UsagePair;

const LONG_ITEM_PREFIX: u8 = 0xFE;

// bTag | bType, with the size bits masked off.
const USAGE_PAGE: u8 = 0x04;
const USAGE: u8 = 0x08;

/// Returns the `(usage page, usage)` of the first top-level collection, or
/// `None` when the descriptor has neither item.
pub fn top_level_usage(descriptor: &[u8]) -> Option<UsagePair> {
    let mut usage_page = None;
    let mut usage = None;
    let mut i = 0;

    while i < descriptor.len() && (usage_page.is_none() || usage.is_none()) {
        let prefix = descriptor[i];
        if prefix == LONG_ITEM_PREFIX {
            let size = *descriptor.get(i + 1)? as usize;
            i += 3 + size;
            continue;
        }
        let size = match prefix & 0x03 {
            3 => 4,
            n => n as usize,
        };
        let data = descriptor.get(i + 1..i + 1 + size)?;
        let value = data
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b));

        match prefix & 0xFC {
            USAGE_PAGE if usage_page.is_none() => usage_page = Some(value as u16),
            // A 4-byte Usage carries its own page in the high half.
            USAGE if usage.is_none() => usage = Some(value as u16),
            _ => {}
        }
        i += 1 + size;
    }

    Some(UsagePair {
        usage_page: usage_page?,
        usage: usage?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_collection_with_two_byte_page() {
        // Usage Page (0xFF00), Usage (0x01), Collection (Application)
        let desc = [0x06, 0x00, 0xFF, 0x09, 0x01, 0xA1, 0x01, 0xC0];
        assert_eq!(
            top_level_usage(&desc),
            Some(UsagePair {
                usage_page: 0xFF00,
                usage: 0x01
            })
        );
    }

    #[test]
    fn test_standard_keyboard_descriptor() {
        // Usage Page (Generic Desktop), Usage (Keyboard), Collection, Usage Page (Key Codes)
        let desc = [0x05, 0x01, 0x09, 0x06, 0xA1, 0x01, 0x05, 0x07];
        assert_eq!(
            top_level_usage(&desc),
            Some(UsagePair {
                usage_page: 0x01,
                usage: 0x06
            })
        );
    }

    #[test]
    fn test_truncated_descriptor_yields_none() {
        assert_eq!(top_level_usage(&[0x06, 0x00]), None);
        assert_eq!(top_level_usage(&[]), None);
    }

    #[test]
    fn test_long_items_are_skipped() {
        let desc = [0xFE, 0x02, 0x10, 0xAA, 0xBB, 0x05, 0x0C, 0x09, 0x01];
        assert_eq!(
            top_level_usage(&desc),
            Some(UsagePair {
                usage_page: 0x0C,
                usage: 0x01
            })
        );
    }
}
