use tabmap::{
    storage::{
        block_store::{BlockStore, MemBlockStore},
        raw_block::RawBinBlock,
    },
    types::{AccessMode, BLOCK_SIZE, BlockType, ByteOrder, error::TabMapError},
};

#[test]
fn test_write_then_read_primitives() {
    let mut block = RawBinBlock::new(BLOCK_SIZE, 0, ByteOrder::LittleEndian);
    block.write_i16(3).unwrap();
    block.write_i32(-123456).unwrap();
    block.write_f64(2.5).unwrap();
    block.write_u8(0xab).unwrap();
    assert_eq!(block.cur_pos(), 15);
    assert_eq!(block.size_used(), 15);

    let mut store = MemBlockStore::new();
    block.commit(&mut store).unwrap();

    let mut read = RawBinBlock::read_from_store(
        &mut store,
        0,
        BLOCK_SIZE,
        Some(BlockType::Coord),
        ByteOrder::LittleEndian,
        AccessMode::Read,
    )
    .unwrap();
    assert_eq!(read.block_type(), 3);
    assert_eq!(read.read_i16().unwrap(), 3);
    assert_eq!(read.read_i32().unwrap(), -123456);
    assert_eq!(read.read_f64().unwrap(), 2.5);
    assert_eq!(read.read_u8().unwrap(), 0xab);
}

#[test]
fn test_little_endian_layout_on_disk() {
    let mut block = RawBinBlock::new(16, 0, ByteOrder::LittleEndian);
    block.write_i32(0x01020304).unwrap();
    assert_eq!(&block.as_bytes()[..4], &[0x04, 0x03, 0x02, 0x01]);

    let mut block = RawBinBlock::new(16, 0, ByteOrder::BigEndian);
    block.write_i32(0x01020304).unwrap();
    assert_eq!(&block.as_bytes()[..4], &[0x01, 0x02, 0x03, 0x04]);
}

#[test]
fn test_big_endian_round_trip() {
    let mut block = RawBinBlock::new(32, 0, ByteOrder::BigEndian);
    block.write_i16(2).unwrap();
    block.write_f64(-1.25).unwrap();

    let mut read = RawBinBlock::init_from_bytes(
        block.as_bytes().to_vec(),
        0,
        Some(BlockType::Object),
        ByteOrder::BigEndian,
        AccessMode::Read,
    )
    .unwrap();
    assert_eq!(read.read_i16().unwrap(), 2);
    assert_eq!(read.read_f64().unwrap(), -1.25);
}

#[test]
fn test_block_type_mismatch_is_rejected() {
    let mut bytes = vec![0u8; BLOCK_SIZE];
    bytes[0] = 2;
    let result = RawBinBlock::init_from_bytes(
        bytes,
        1024,
        Some(BlockType::Coord),
        ByteOrder::LittleEndian,
        AccessMode::Read,
    );
    match result {
        Err(TabMapError::InvalidBlockType {
            offset,
            expected,
            actual,
        }) => {
            assert_eq!(offset, 1024);
            assert_eq!(expected, 3);
            assert_eq!(actual, 2);
        }
        other => panic!("expected InvalidBlockType, got {:?}", other),
    }
}

#[test]
fn test_write_past_end_fails() {
    let mut block = RawBinBlock::new(8, 0, ByteOrder::LittleEndian);
    block.write_i32(1).unwrap();
    block.write_i16(2).unwrap();
    assert!(matches!(
        block.write_i32(3),
        Err(TabMapError::WritePastEnd { pos: 6, len: 4, .. })
    ));
    // The failed write leaves the cursor alone
    assert_eq!(block.cur_pos(), 6);
    block.write_i16(4).unwrap();
    assert_eq!(block.cur_pos(), 8);
}

#[test]
fn test_read_past_end_fails() {
    let mut read = RawBinBlock::init_from_bytes(
        vec![0u8; 6],
        0,
        None,
        ByteOrder::LittleEndian,
        AccessMode::Read,
    )
    .unwrap();
    read.read_i32().unwrap();
    assert!(matches!(
        read.read_i32(),
        Err(TabMapError::ReadPastEnd { available: 2, .. })
    ));
}

#[test]
fn test_read_only_block_refuses_writes() {
    let mut read = RawBinBlock::init_from_bytes(
        vec![0u8; 16],
        512,
        None,
        ByteOrder::LittleEndian,
        AccessMode::Read,
    )
    .unwrap();
    assert!(matches!(
        read.write_i16(1),
        Err(TabMapError::ReadOnlyBlock { offset: 512 })
    ));
}

#[test]
fn test_goto_byte_in_block() {
    let mut block = RawBinBlock::new(64, 0, ByteOrder::LittleEndian);
    block.goto_byte_in_block(32).unwrap();
    assert_eq!(block.size_used(), 32);
    block.write_i16(7).unwrap();
    block.goto_byte_in_block(32).unwrap();
    assert_eq!(block.cur_pos(), 32);
    assert!(matches!(
        block.goto_byte_in_block(65),
        Err(TabMapError::InvalidPosition { pos: 65, block_size: 64 })
    ));
}

#[test]
fn test_mem_store_keys_blocks_by_offset() {
    let mut store = MemBlockStore::new();
    store.write_block(1024, &[1, 2, 3]).unwrap();
    store.write_block(0, &[9]).unwrap();
    assert_eq!(store.offsets().collect::<Vec<_>>(), vec![0, 1024]);
    assert_eq!(store.read_block(1024, 4).unwrap(), vec![1, 2, 3, 0]);
    assert!(matches!(
        store.read_block(512, 4),
        Err(TabMapError::InvalidBlockOffset(512))
    ));
}
