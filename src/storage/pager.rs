use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::core::error::IndexError;
use crate::storage::block::{BLOCK_SIZE, Block};

/// Positions the index file at block boundaries and transfers whole
/// 512-byte blocks. Short reads and writes surface as errors.
pub struct Pager {
    file: std::fs::File,
}

impl Pager {
    /// Open a fresh file, truncating any existing content.
    pub fn create(path: &Path) -> Result<Self, IndexError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Ok(Self { file })
    }

    /// Open an existing file for block access.
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        if !path.exists() {
            return Err(IndexError::FileNotFound(path.to_path_buf()));
        }

        let file = OpenOptions::new().read(true).write(true).open(path)?;

        Ok(Self { file })
    }

    pub fn read_block(&mut self, id: u64) -> Result<Block, IndexError> {
        self.file.seek(SeekFrom::Start(id * BLOCK_SIZE as u64))?;

        let mut buffer = [0u8; BLOCK_SIZE];
        self.file.read_exact(&mut buffer)?;

        Ok(Block::from_bytes(id, buffer))
    }

    pub fn write_block(&mut self, block: &Block) -> Result<(), IndexError> {
        self.file.seek(SeekFrom::Start(block.id * BLOCK_SIZE as u64))?;
        self.file.write_all(&block.data)?;

        Ok(())
    }
}
