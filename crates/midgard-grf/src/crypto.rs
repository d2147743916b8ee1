//! GRF obfuscation cipher.
//!
//! GRF archives obscure entry names and payloads with a keyless,
//! single-round variant of DES combined with a byte shuffle. A DES round
//! without a key schedule is its own inverse, so the block transform below
//! both encodes and decodes; only the shuffle has a distinct inverse.

use tracing::trace;

/// Number of leading blocks that are always DES-transformed.
const DES_HEADER_BLOCKS: usize = 20;

/// Non-DES blocks between two shuffled blocks in mixed mode.
const SHUFFLE_CYCLE: usize = 7;

const BLOCK_SIZE: usize = 8;

/// Bit masks for the eight bits of a byte, most significant first.
const MASK: [u8; 8] = [0x80, 0x40, 0x20, 0x10, 0x08, 0x04, 0x02, 0x01];

/// Initial permutation.
const IP_TABLE: [u8; 64] = [
    58, 50, 42, 34, 26, 18, 10, 2, //
    60, 52, 44, 36, 28, 20, 12, 4, //
    62, 54, 46, 38, 30, 22, 14, 6, //
    64, 56, 48, 40, 32, 24, 16, 8, //
    57, 49, 41, 33, 25, 17, 9, 1, //
    59, 51, 43, 35, 27, 19, 11, 3, //
    61, 53, 45, 37, 29, 21, 13, 5, //
    63, 55, 47, 39, 31, 23, 15, 7, //
];

/// Final permutation (inverse of [`IP_TABLE`]).
const FP_TABLE: [u8; 64] = [
    40, 8, 48, 16, 56, 24, 64, 32, //
    39, 7, 47, 15, 55, 23, 63, 31, //
    38, 6, 46, 14, 54, 22, 62, 30, //
    37, 5, 45, 13, 53, 21, 61, 29, //
    36, 4, 44, 12, 52, 20, 60, 28, //
    35, 3, 43, 11, 51, 19, 59, 27, //
    34, 2, 42, 10, 50, 18, 58, 26, //
    33, 1, 41, 9, 49, 17, 57, 25, //
];

/// Round permutation (P-box).
const P_TABLE: [u8; 32] = [
    16, 7, 20, 21, 29, 12, 28, 17, //
    1, 15, 23, 26, 5, 18, 31, 10, //
    2, 8, 24, 14, 32, 27, 3, 9, //
    19, 13, 30, 6, 22, 11, 4, 25, //
];

/// The eight standard DES substitution boxes, indexed `[box][row][column]`.
const S_BOXES: [[[u8; 16]; 4]; 8] = [
    [
        [14, 4, 13, 1, 2, 15, 11, 8, 3, 10, 6, 12, 5, 9, 0, 7],
        [0, 15, 7, 4, 14, 2, 13, 1, 10, 6, 12, 11, 9, 5, 3, 8],
        [4, 1, 14, 8, 13, 6, 2, 11, 15, 12, 9, 7, 3, 10, 5, 0],
        [15, 12, 8, 2, 4, 9, 1, 7, 5, 11, 3, 14, 10, 0, 6, 13],
    ],
    [
        [15, 1, 8, 14, 6, 11, 3, 4, 9, 7, 2, 13, 12, 0, 5, 10],
        [3, 13, 4, 7, 15, 2, 8, 14, 12, 0, 1, 10, 6, 9, 11, 5],
        [0, 14, 7, 11, 10, 4, 13, 1, 5, 8, 12, 6, 9, 3, 2, 15],
        [13, 8, 10, 1, 3, 15, 4, 2, 11, 6, 7, 12, 0, 5, 14, 9],
    ],
    [
        [10, 0, 9, 14, 6, 3, 15, 5, 1, 13, 12, 7, 11, 4, 2, 8],
        [13, 7, 0, 9, 3, 4, 6, 10, 2, 8, 5, 14, 12, 11, 15, 1],
        [13, 6, 4, 9, 8, 15, 3, 0, 11, 1, 2, 12, 5, 10, 14, 7],
        [1, 10, 13, 0, 6, 9, 8, 7, 4, 15, 14, 3, 11, 5, 2, 12],
    ],
    [
        [7, 13, 14, 3, 0, 6, 9, 10, 1, 2, 8, 5, 11, 12, 4, 15],
        [13, 8, 11, 5, 6, 15, 0, 3, 4, 7, 2, 12, 1, 10, 14, 9],
        [10, 6, 9, 0, 12, 11, 7, 13, 15, 1, 3, 14, 5, 2, 8, 4],
        [3, 15, 0, 6, 10, 1, 13, 8, 9, 4, 5, 11, 12, 7, 2, 14],
    ],
    [
        [2, 12, 4, 1, 7, 10, 11, 6, 8, 5, 3, 15, 13, 0, 14, 9],
        [14, 11, 2, 12, 4, 7, 13, 1, 5, 0, 15, 10, 3, 9, 8, 6],
        [4, 2, 1, 11, 10, 13, 7, 8, 15, 9, 12, 5, 6, 3, 0, 14],
        [11, 8, 12, 7, 1, 14, 2, 13, 6, 15, 0, 9, 10, 4, 5, 3],
    ],
    [
        [12, 1, 10, 15, 9, 2, 6, 8, 0, 13, 3, 4, 14, 7, 5, 11],
        [10, 15, 4, 2, 7, 12, 9, 5, 6, 1, 13, 14, 0, 11, 3, 8],
        [9, 14, 15, 5, 2, 8, 12, 3, 7, 0, 4, 10, 1, 13, 11, 6],
        [4, 3, 2, 12, 9, 5, 15, 10, 11, 14, 1, 7, 6, 0, 8, 13],
    ],
    [
        [4, 11, 2, 14, 15, 0, 8, 13, 3, 12, 9, 7, 5, 10, 6, 1],
        [13, 0, 11, 7, 4, 9, 1, 10, 14, 3, 5, 12, 2, 15, 8, 6],
        [1, 4, 11, 13, 12, 3, 7, 14, 10, 15, 6, 8, 0, 5, 9, 2],
        [6, 11, 13, 8, 1, 4, 10, 7, 9, 5, 0, 15, 14, 2, 3, 12],
    ],
    [
        [13, 2, 8, 4, 6, 15, 11, 1, 10, 9, 3, 14, 5, 0, 12, 7],
        [1, 15, 13, 8, 10, 3, 7, 4, 12, 5, 6, 11, 0, 14, 9, 2],
        [7, 11, 4, 1, 9, 12, 14, 2, 0, 6, 10, 13, 15, 3, 5, 8],
        [2, 1, 14, 7, 4, 10, 8, 13, 15, 12, 9, 0, 3, 5, 6, 11],
    ],
];

/// Reversible transforms applied to GRF entry names and payloads.
///
/// Implementations work in place. The archive reader calls
/// [`decode_filename`](Decryptor::decode_filename) on legacy table names and
/// [`decode_content`](Decryptor::decode_content) on encrypted payloads.
pub trait Decryptor {
    /// Decode an obfuscated legacy file name.
    fn decode_filename(&self, data: &mut [u8]);

    /// Decode a payload.
    ///
    /// `cycle` is the entry's cycle count: 0 selects header-only decoding,
    /// anything else the mixed scheme keyed by that digit count.
    fn decode_content(&self, data: &mut [u8], cycle: u32);
}

/// The cipher used by GRF archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrfCipher;

impl Decryptor for GrfCipher {
    fn decode_filename(&self, data: &mut [u8]) {
        for block in data.chunks_exact_mut(BLOCK_SIZE) {
            swap_nibbles(block);
            des_block(block);
        }
    }

    fn decode_content(&self, data: &mut [u8], cycle: u32) {
        trace!("decoding {} bytes with cycle {}", data.len(), cycle);
        if cycle == 0 {
            decode_header(data);
        } else {
            mixed(data, cycle, deshuffle);
        }
    }
}

impl GrfCipher {
    /// Obfuscate a legacy file name, the inverse of
    /// [`Decryptor::decode_filename`].
    pub fn encode_filename(&self, data: &mut [u8]) {
        for block in data.chunks_exact_mut(BLOCK_SIZE) {
            des_block(block);
            swap_nibbles(block);
        }
    }

    /// Obfuscate a payload, the inverse of [`Decryptor::decode_content`].
    pub fn encode_content(&self, data: &mut [u8], cycle: u32) {
        if cycle == 0 {
            decode_header(data);
        } else {
            mixed(data, cycle, shuffle);
        }
    }
}

/// Map an entry's digit count to the spacing between DES blocks.
pub(crate) fn des_gap(digits: u32) -> usize {
    let digits = digits as usize;
    match digits {
        0..=2 => 1,
        3..=4 => digits + 1,
        5..=6 => digits + 9,
        _ => digits + 15,
    }
}

/// DES-transform the first 20 blocks, leave the rest alone.
fn decode_header(data: &mut [u8]) {
    for block in data.chunks_exact_mut(BLOCK_SIZE).take(DES_HEADER_BLOCKS) {
        des_block(block);
    }
}

/// Mixed scheme shared by encoding and decoding; only the shuffle differs.
fn mixed(data: &mut [u8], cycle: u32, shuffle_fn: fn(&mut [u8])) {
    let gap = des_gap(cycle);
    let mut since_shuffle = 0;

    for (index, block) in data.chunks_exact_mut(BLOCK_SIZE).enumerate() {
        if index < DES_HEADER_BLOCKS || index % gap == 0 {
            des_block(block);
            continue;
        }

        if since_shuffle == SHUFFLE_CYCLE {
            shuffle_fn(block);
            since_shuffle = 0;
        }
        since_shuffle += 1;
    }
}

fn deshuffle(block: &mut [u8]) {
    let t = [
        block[0], block[1], block[2], block[3], block[4], block[5], block[6], block[7],
    ];
    block[0] = t[3];
    block[1] = t[4];
    block[2] = t[6];
    block[3] = t[0];
    block[4] = t[1];
    block[5] = t[2];
    block[6] = t[5];
    block[7] = substitute(t[7]);
}

fn shuffle(block: &mut [u8]) {
    let t = [
        block[0], block[1], block[2], block[3], block[4], block[5], block[6], block[7],
    ];
    block[3] = t[0];
    block[4] = t[1];
    block[6] = t[2];
    block[0] = t[3];
    block[1] = t[4];
    block[2] = t[5];
    block[5] = t[6];
    block[7] = substitute(t[7]);
}

/// Fixed byte substitution applied to the last byte of shuffled blocks.
/// Applying it twice yields the input.
fn substitute(byte: u8) -> u8 {
    match byte {
        0x00 => 0x2B,
        0x2B => 0x00,
        0x6C => 0x80,
        0x80 => 0x6C,
        0x01 => 0x68,
        0x68 => 0x01,
        0x48 => 0x77,
        0x77 => 0x48,
        0x60 => 0xFF,
        0xFF => 0x60,
        0xB9 => 0xC0,
        0xC0 => 0xB9,
        0xFE => 0xEB,
        0xEB => 0xFE,
        other => other,
    }
}

fn swap_nibbles(block: &mut [u8]) {
    for byte in block {
        *byte = byte.rotate_left(4);
    }
}

/// One keyless DES round between the initial and final permutations.
///
/// `block` must be exactly eight bytes.
fn des_block(block: &mut [u8]) {
    let mut state = permute(block, &IP_TABLE);
    round(&mut state);
    let out = permute(&state, &FP_TABLE);
    block.copy_from_slice(&out);
}

fn permute(src: &[u8], table: &[u8; 64]) -> [u8; 8] {
    let mut out = [0u8; 8];
    for (i, &bit) in table.iter().enumerate() {
        let j = (bit - 1) as usize;
        if src[j >> 3] & MASK[j & 7] != 0 {
            out[i >> 3] |= MASK[i & 7];
        }
    }
    out
}

/// Feistel round: the left half is XOR-ed with f(right half).
fn round(state: &mut [u8; 8]) {
    let expanded = expand(&[state[4], state[5], state[6], state[7]]);

    let mut substituted = [0u8; 4];
    for (i, out) in substituted.iter_mut().enumerate() {
        let high = sbox(2 * i, expanded[2 * i]);
        let low = sbox(2 * i + 1, expanded[2 * i + 1]);
        *out = (high << 4) | low;
    }

    let mut f = [0u8; 4];
    for (i, &bit) in P_TABLE.iter().enumerate() {
        let j = (bit - 1) as usize;
        if substituted[j >> 3] & MASK[j & 7] != 0 {
            f[i >> 3] |= MASK[i & 7];
        }
    }

    for (left, f) in state[..4].iter_mut().zip(f) {
        *left ^= f;
    }
}

/// Expand 32 bits into eight 6-bit groups.
fn expand(r: &[u8; 4]) -> [u8; 8] {
    [
        ((r[3] << 5) | (r[0] >> 3)) & 0x3f,
        ((r[0] << 1) | (r[1] >> 7)) & 0x3f,
        ((r[0] << 5) | (r[1] >> 3)) & 0x3f,
        ((r[1] << 1) | (r[2] >> 7)) & 0x3f,
        ((r[1] << 5) | (r[2] >> 3)) & 0x3f,
        ((r[2] << 1) | (r[3] >> 7)) & 0x3f,
        ((r[2] << 5) | (r[3] >> 3)) & 0x3f,
        ((r[3] << 1) | (r[0] >> 7)) & 0x3f,
    ]
}

fn sbox(index: usize, input: u8) -> u8 {
    let row = (((input >> 4) & 0x02) | (input & 0x01)) as usize;
    let column = ((input >> 1) & 0x0f) as usize;
    S_BOXES[index][row][column]
}
