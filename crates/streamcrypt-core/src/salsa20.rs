//! Salsa20 keystream generator and stream cipher
//!
//! The 16-word state is laid out as a 4x4 matrix:
//!
//! ```text
//!  c0  k0  k1  k2
//!  k3  c1  n0  n1
//!  b0  b1  c2  k4
//!  k5  k6  k7  c3
//! ```
//!
//! - `c0..c3`: constants chosen by key length
//! - `k0..k3`: first 16 key bytes; `k4..k7` the last 16 (or `k0..k3` again for 16-byte keys)
//! - `n0, n1`: the 8-byte nonce
//! - `b0, b1`: the 64-bit block counter, low word first
//!
//! All words are little-endian. Each keystream block runs 10 double rounds
//! over a copy of the state and adds the original state back in.
//!
//! Encryption XORs the input with blocks 0, 1, 2, ... so decryption is the
//! same function.

use crate::error::CipherError;
use crate::module::{CipherModule, names};

/// Keystream block size in bytes
pub const SALSA20_BLOCK_SIZE: usize = 64;

/// Required nonce size in bytes
pub const SALSA20_NONCE_SIZE: usize = 8;

/// Accepted key sizes in bytes
pub const SALSA20_KEY_SIZES: [usize; 2] = [16, 32];

/// Number of double rounds per block
const DOUBLE_ROUNDS: usize = 10;

/// Constants for 32-byte keys
const SIGMA: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

/// Constants for 16-byte keys
const TAU: [u32; 4] = [0x6170_7865, 0x3120_646e, 0x7962_2d32, 0x6b20_6574];

static SALSA20_MODULE: CipherModule = CipherModule {
    name: names::SALSA20,
    encrypt: salsa20_cipher,
    decrypt: salsa20_cipher,
};

/// Factory entry point for the Salsa20 unit
pub fn create_cipher_module() -> &'static CipherModule {
    &SALSA20_MODULE
}

/// Salsa20 quarter round on state words `a`, `b`, `c`, `d`
pub fn quarter_round(state: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    state[b] ^= state[a].wrapping_add(state[d]).rotate_left(7);
    state[c] ^= state[b].wrapping_add(state[a]).rotate_left(9);
    state[d] ^= state[c].wrapping_add(state[b]).rotate_left(13);
    state[a] ^= state[d].wrapping_add(state[c]).rotate_left(18);
}

/// Quarter rounds down the four columns
pub fn column_round(state: &mut [u32; 16]) {
    quarter_round(state, 0, 4, 8, 12);
    quarter_round(state, 1, 5, 9, 13);
    quarter_round(state, 2, 6, 10, 14);
    quarter_round(state, 3, 7, 11, 15);
}

/// Quarter rounds along the four rows, each starting at its diagonal word
pub fn row_round(state: &mut [u32; 16]) {
    quarter_round(state, 0, 1, 2, 3);
    quarter_round(state, 5, 6, 7, 4);
    quarter_round(state, 10, 11, 8, 9);
    quarter_round(state, 15, 12, 13, 14);
}

/// One column round followed by one row round
pub fn double_round(state: &mut [u32; 16]) {
    column_round(state);
    row_round(state);
}

/// Read little-endian words from `bytes` into `words`
fn load_words(bytes: &[u8], words: &mut [u32]) {
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
}

fn check_nonce(nonce: Option<&[u8]>) -> Result<&[u8], CipherError> {
    match nonce {
        Some(nonce) if nonce.len() == SALSA20_NONCE_SIZE => Ok(nonce),
        other => Err(CipherError::InvalidNonce {
            algorithm: names::SALSA20,
            expected: SALSA20_NONCE_SIZE,
            actual: other.map(<[u8]>::len),
        }),
    }
}

/// Salsa20 block function bound to one key and nonce
///
/// The key and nonce are validated once; [`Salsa20Core::block`] then derives
/// any keystream block by counter.
#[derive(Clone)]
pub struct Salsa20Core {
    state: [u32; 16],
}

impl Salsa20Core {
    /// Build the initial state
    ///
    /// # Arguments
    /// * `key` - 16 or 32 byte key
    /// * `nonce` - 8 byte nonce
    ///
    /// # Errors
    ///
    /// Returns `CipherError::InvalidNonce` for a nonce that is not 8 bytes and
    /// `CipherError::InvalidKey` for a key that is not 16 or 32 bytes.
    pub fn new(key: &[u8], nonce: &[u8]) -> Result<Self, CipherError> {
        let nonce = check_nonce(Some(nonce))?;

        let constants = match key.len() {
            32 => SIGMA,
            16 => TAU,
            actual => {
                return Err(CipherError::InvalidKey {
                    algorithm: names::SALSA20,
                    expected: "16 or 32 bytes".to_string(),
                    actual,
                });
            }
        };

        let mut state = [0u32; 16];

        state[0] = constants[0];
        state[5] = constants[1];
        state[10] = constants[2];
        state[15] = constants[3];

        load_words(&key[..16], &mut state[1..5]);
        if key.len() == 32 {
            load_words(&key[16..], &mut state[11..15]);
        } else {
            state.copy_within(1..5, 11);
        }

        load_words(nonce, &mut state[6..8]);

        // Counter words 8 and 9 are filled per block
        Ok(Self { state })
    }

    /// Generate the 64-byte keystream block for `counter`
    pub fn block(&self, counter: u64) -> [u8; SALSA20_BLOCK_SIZE] {
        let mut input = self.state;
        input[8] = counter as u32;
        input[9] = (counter >> 32) as u32;

        let mut working = input;
        for _ in 0..DOUBLE_ROUNDS {
            double_round(&mut working);
        }

        let mut output = [0u8; SALSA20_BLOCK_SIZE];
        for ((out, word), original) in output.chunks_exact_mut(4).zip(working).zip(input) {
            out.copy_from_slice(&word.wrapping_add(original).to_le_bytes());
        }
        output
    }

    /// XOR `input` with the keystream starting at block 0
    pub fn apply_keystream(&self, input: &[u8]) -> Vec<u8> {
        let mut output = Vec::with_capacity(input.len());

        for (counter, chunk) in (0u64..).zip(input.chunks(SALSA20_BLOCK_SIZE)) {
            let keystream = self.block(counter);
            output.extend(chunk.iter().zip(keystream).map(|(&byte, ks)| byte ^ ks));
        }

        output
    }
}

/// Generate a single keystream block
///
/// # Errors
///
/// Same as [`Salsa20Core::new`].
pub fn keystream_block(
    key: &[u8],
    nonce: &[u8],
    counter: u64,
) -> Result<[u8; SALSA20_BLOCK_SIZE], CipherError> {
    Ok(Salsa20Core::new(key, nonce)?.block(counter))
}

/// Encrypt or decrypt with Salsa20 (the operation is its own inverse)
///
/// # Errors
///
/// Returns `CipherError::InvalidNonce` if the nonce is missing or not 8 bytes,
/// `CipherError::InvalidKey` if the key is not 16 or 32 bytes.
pub fn salsa20_cipher(
    input: &[u8],
    key: &[u8],
    nonce: Option<&[u8]>,
) -> Result<Vec<u8>, CipherError> {
    let nonce = check_nonce(nonce)?;
    let core = Salsa20Core::new(key, nonce)?;
    Ok(core.apply_keystream(input))
}
