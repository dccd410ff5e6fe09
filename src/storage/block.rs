pub const BLOCK_SIZE: usize = 512;

#[derive(Clone)]
pub struct Block {
    pub id: u64,
    pub data: [u8; BLOCK_SIZE],
}

impl Block {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            data: [0; BLOCK_SIZE],
        }
    }

    pub fn from_bytes(id: u64, bytes: [u8; BLOCK_SIZE]) -> Self {
        Self { id, data: bytes }
    }
}
