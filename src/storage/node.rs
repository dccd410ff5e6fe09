use byteorder::{BigEndian, ByteOrder};

use crate::storage::block::BLOCK_SIZE;

pub const MIN_DEGREE: usize = 10;
pub const MAX_KEYS: usize = 2 * MIN_DEGREE - 1;
pub const MAX_CHILDREN: usize = 2 * MIN_DEGREE;

// Every field is a big-endian u64: id, parent id, key count, then the
// key, value and child slot arrays, zero-padded to the block size.
const KEYS_OFFSET: usize = 24;
const VALUES_OFFSET: usize = KEYS_OFFSET + 8 * MAX_KEYS;
const CHILDREN_OFFSET: usize = VALUES_OFFSET + 8 * MAX_KEYS;
const CHILDREN_END: usize = CHILDREN_OFFSET + 8 * MAX_CHILDREN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: u64,
    /// Reserved on-disk field. Written as 0 on creation and never consulted.
    pub parent_id: u64,
    pub key_count: usize,
    pub keys: [u64; MAX_KEYS],
    pub values: [u64; MAX_KEYS],
    pub children: [u64; MAX_CHILDREN],
    /// Not stored; derived on decode from all child slots being zero.
    pub is_leaf: bool,
}

impl Node {
    pub fn new(id: u64, is_leaf: bool) -> Self {
        Self {
            id,
            parent_id: 0,
            key_count: 0,
            keys: [0; MAX_KEYS],
            values: [0; MAX_KEYS],
            children: [0; MAX_CHILDREN],
            is_leaf,
        }
    }

    /// The occupied prefix of the key slots.
    pub fn active_keys(&self) -> &[u64] {
        &self.keys[..self.key_count]
    }

    pub fn to_bytes(&self) -> [u8; BLOCK_SIZE] {
        let mut buf = [0u8; BLOCK_SIZE];
        BigEndian::write_u64(&mut buf[0..8], self.id);
        BigEndian::write_u64(&mut buf[8..16], self.parent_id);
        BigEndian::write_u64(&mut buf[16..24], self.key_count as u64);
        BigEndian::write_u64_into(&self.keys, &mut buf[KEYS_OFFSET..VALUES_OFFSET]);
        BigEndian::write_u64_into(&self.values, &mut buf[VALUES_OFFSET..CHILDREN_OFFSET]);
        BigEndian::write_u64_into(&self.children, &mut buf[CHILDREN_OFFSET..CHILDREN_END]);
        buf
    }

    pub fn from_bytes(buf: &[u8; BLOCK_SIZE]) -> Self {
        let id = BigEndian::read_u64(&buf[0..8]);
        let parent_id = BigEndian::read_u64(&buf[8..16]);
        let key_count = BigEndian::read_u64(&buf[16..24]) as usize;

        let mut keys = [0u64; MAX_KEYS];
        let mut values = [0u64; MAX_KEYS];
        let mut children = [0u64; MAX_CHILDREN];
        BigEndian::read_u64_into(&buf[KEYS_OFFSET..VALUES_OFFSET], &mut keys);
        BigEndian::read_u64_into(&buf[VALUES_OFFSET..CHILDREN_OFFSET], &mut values);
        BigEndian::read_u64_into(&buf[CHILDREN_OFFSET..CHILDREN_END], &mut children);

        let is_leaf = children.iter().all(|&child| child == 0);

        Self {
            id,
            parent_id,
            key_count,
            keys,
            values,
            children,
            is_leaf,
        }
    }
}
