//! Fixed-width little-endian value codec.
//!
//! Every ESS characteristic carries a scalar or a small vector of scalars,
//! each 1 to 4 bytes wide, signed or unsigned. [`ValueFormat`] describes one
//! such layout and converts between [`Value`] and its wire bytes.
//!
//! For example: a 2D magnetic flux density reading of `(-3, 258)` in
//! `sint16` components is encoded as `FD FF 02 01`.

use serde::{Serialize, Serializer};

/// Maximum number of components in a vector value (x, y, z).
pub const MAX_DIMS: usize = 3;

/// Maximum width in bytes of a single component.
pub const MAX_WIDTH: u8 = 4;

/// Wire layout of a characteristic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValueFormat {
    /// Bytes per component (1-4)
    pub width: u8,
    /// Whether components are two's complement
    pub signed: bool,
    /// Number of components (1-3)
    pub dims: u8,
}

impl ValueFormat {
    /// Create a format, panicking at compile time for const tables when
    /// width or dimension count is unsupported.
    pub const fn new(width: u8, signed: bool, dims: u8) -> Self {
        assert!(width >= 1 && width <= MAX_WIDTH, "component width must be 1-4 bytes");
        assert!(dims >= 1 && dims as usize <= MAX_DIMS, "vector must have 1-3 components");
        Self {
            width,
            signed,
            dims,
        }
    }

    pub const fn unsigned(width: u8) -> Self {
        Self::new(width, false, 1)
    }

    pub const fn signed(width: u8) -> Self {
        Self::new(width, true, 1)
    }

    /// Total number of bytes of an encoded value.
    pub const fn encoded_len(&self) -> usize {
        self.width as usize * self.dims as usize
    }

    /// Smallest component value representable in this format.
    pub fn min_component(&self) -> i64 {
        if self.signed {
            -(1i64 << (self.width as u32 * 8 - 1))
        } else {
            0
        }
    }

    /// Largest component value representable in this format.
    pub fn max_component(&self) -> i64 {
        if self.signed {
            (1i64 << (self.width as u32 * 8 - 1)) - 1
        } else {
            (1i64 << (self.width as u32 * 8)) - 1
        }
    }

    /// Encode a value, appending its bytes to `out`.
    ///
    /// Components beyond the format's width are truncated to their low bytes,
    /// matching how a fixed-width integer store behaves.
    pub fn encode_into(&self, value: &Value, out: &mut Vec<u8>) {
        let width = self.width as usize;
        for component in value.components().iter().take(self.dims as usize) {
            out.extend_from_slice(&component.to_le_bytes()[..width]);
        }
    }

    pub fn encode(&self, value: &Value) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(value, &mut out);
        out
    }

    /// Decode a value. Returns `None` unless `bytes` is exactly
    /// [`encoded_len`](Self::encoded_len) long.
    pub fn decode(&self, bytes: &[u8]) -> Option<Value> {
        if bytes.len() != self.encoded_len() {
            return None;
        }

        let width = self.width as usize;
        let mut components = [0i64; MAX_DIMS];
        for (slot, chunk) in components.iter_mut().zip(bytes.chunks_exact(width)) {
            *slot = self.decode_component(chunk);
        }

        Some(Value {
            components,
            dims: self.dims,
        })
    }

    fn decode_component(&self, chunk: &[u8]) -> i64 {
        let mut raw = [0u8; 8];
        raw[..chunk.len()].copy_from_slice(chunk);
        let unsigned = u64::from_le_bytes(raw);

        if self.signed {
            let shift = 64 - 8 * chunk.len() as u32;
            ((unsigned << shift) as i64) >> shift
        } else {
            unsigned as i64
        }
    }
}

/// A scalar or vector measurement value.
///
/// Components are held widened to `i64` so both signed and unsigned
/// formats up to 32 bits compare correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Value {
    components: [i64; MAX_DIMS],
    dims: u8,
}

impl Value {
    pub const fn scalar(value: i64) -> Self {
        Self {
            components: [value, 0, 0],
            dims: 1,
        }
    }

    pub const fn xy(x: i64, y: i64) -> Self {
        Self {
            components: [x, y, 0],
            dims: 2,
        }
    }

    pub const fn xyz(x: i64, y: i64, z: i64) -> Self {
        Self {
            components: [x, y, z],
            dims: 3,
        }
    }

    /// A value of `dims` components all set to `component`.
    pub fn splat(component: i64, dims: u8) -> Self {
        let dims = dims.clamp(1, MAX_DIMS as u8);
        let mut components = [0i64; MAX_DIMS];
        components[..dims as usize].fill(component);
        Self { components, dims }
    }

    /// Build from a slice of 1-3 components.
    pub fn from_components(values: &[i64]) -> Option<Self> {
        if values.is_empty() || values.len() > MAX_DIMS {
            return None;
        }
        let mut components = [0i64; MAX_DIMS];
        components[..values.len()].copy_from_slice(values);
        Some(Self {
            components,
            dims: values.len() as u8,
        })
    }

    pub fn components(&self) -> &[i64] {
        &self.components[..self.dims as usize]
    }

    pub fn dims(&self) -> u8 {
        self.dims
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.dims == 1 {
            serializer.serialize_i64(self.components[0])
        } else {
            serializer.collect_seq(self.components())
        }
    }
}
