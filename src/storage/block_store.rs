use std::{
    collections::BTreeMap,
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};

use crate::types::{
    BlockOffset,
    error::{Result, TabMapError},
};

/// Positioned block I/O underneath the block layer.
pub trait BlockStore {
    fn read_block(&mut self, offset: BlockOffset, size: usize) -> Result<Vec<u8>>;

    fn write_block(&mut self, offset: BlockOffset, data: &[u8]) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

fn checked_offset(offset: BlockOffset) -> Result<u64> {
    if offset < 0 {
        return Err(TabMapError::InvalidBlockOffset(offset));
    }
    Ok(offset as u64)
}

pub struct FileBlockStore {
    file: File,
}

impl FileBlockStore {
    pub fn new(file: File) -> Self {
        Self { file }
    }

    /// Creates (or truncates) a file for writing.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .read(true)
            .truncate(true)
            .open(path)?;
        Ok(Self { file })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        Ok(Self { file })
    }

    pub fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl BlockStore for FileBlockStore {
    fn read_block(&mut self, offset: BlockOffset, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        self.file.seek(SeekFrom::Start(checked_offset(offset)?))?;
        self.file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn write_block(&mut self, offset: BlockOffset, data: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(checked_offset(offset)?))?;
        self.file.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}

/// In-memory block arena keyed by file offset.
#[derive(Debug, Default, Clone)]
pub struct MemBlockStore {
    blocks: BTreeMap<BlockOffset, Vec<u8>>,
}

impl MemBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&self, offset: BlockOffset) -> Option<&[u8]> {
        self.blocks.get(&offset).map(|b| b.as_slice())
    }

    pub fn offsets(&self) -> impl Iterator<Item = BlockOffset> + '_ {
        self.blocks.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl BlockStore for MemBlockStore {
    fn read_block(&mut self, offset: BlockOffset, size: usize) -> Result<Vec<u8>> {
        checked_offset(offset)?;
        let block = self
            .blocks
            .get(&offset)
            .ok_or(TabMapError::InvalidBlockOffset(offset))?;
        let mut buffer = vec![0u8; size];
        let n = block.len().min(size);
        buffer[..n].copy_from_slice(&block[..n]);
        Ok(buffer)
    }

    fn write_block(&mut self, offset: BlockOffset, data: &[u8]) -> Result<()> {
        checked_offset(offset)?;
        self.blocks.insert(offset, data.to_vec());
        Ok(())
    }
}
