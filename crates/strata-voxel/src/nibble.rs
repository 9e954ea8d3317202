//! Nibble-packed array: two 4-bit values per byte.
//!
//! Element `i` lives in byte `i >> 1`. Even indices use the low nibble,
//! odd indices the high nibble.

/// A compact array of 4-bit values backed by a byte buffer of half the
/// logical length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NibbleArray {
    bytes: Vec<u8>,
}

impl NibbleArray {
    /// Creates an array of `len` nibbles with every byte set to `fill`.
    ///
    /// `len` must be even. A fill of `0xFF` sets every nibble to 15.
    pub fn filled(len: usize, fill: u8) -> Self {
        debug_assert!(len % 2 == 0, "nibble array length must be even");
        Self {
            bytes: vec![fill; len / 2],
        }
    }

    /// Wraps an existing packed byte buffer.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Returns the nibble at index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn get(&self, i: usize) -> u8 {
        let byte = self.bytes[i >> 1];
        if i & 1 == 0 { byte & 0x0F } else { byte >> 4 }
    }

    /// Sets the nibble at index `i`, leaving the other nibble of the byte intact.
    ///
    /// Only the low four bits of `value` are stored.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn set(&mut self, i: usize, value: u8) {
        let byte = &mut self.bytes[i >> 1];
        let value = value & 0x0F;
        if i & 1 == 0 {
            *byte = (*byte & 0xF0) | value;
        } else {
            *byte = (*byte & 0x0F) | (value << 4);
        }
    }

    /// Number of logical nibbles.
    pub fn len(&self) -> usize {
        self.bytes.len() * 2
    }

    /// Returns `true` if the array holds no nibbles.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The packed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
