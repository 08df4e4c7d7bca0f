pub mod block_manager;
pub mod block_store;
pub mod coord_block;
pub mod header;
pub mod map_file;
pub mod raw_block;

const HDR_MAGIC_COOKIE: i32 = 42424242;
const HDR_VERSION_NUMBER: i16 = 400;
const HDR_MAGIC_OFFSET: usize = 0x100;
const HDR_OBJ_LEN_ARRAY_SIZE: usize = 46;

// Body length per map object type; bit 0x80 flags objects whose
// coordinates live in a separate coordinate block.
const HDR_OBJ_LEN_ARRAY: [u8; HDR_OBJ_LEN_ARRAY_SIZE] = [
    0x00, 0x0a, 0x0e, 0x15, 0x0e, 0x16, 0x1b, 0xa2, 0xa6, 0xab, 0x1a, 0x2a, 0x2f, 0xa5, 0xa9, 0xb5,
    0xa7, 0xb5, 0xd9, 0x0f, 0x17, 0x23, 0x13, 0x1f, 0x2b, 0x0f, 0x17, 0x23, 0x4f, 0x57, 0x63, 0x9c,
    0xa4, 0xa9, 0xa0, 0xa8, 0xad, 0xa4, 0xa8, 0xad, 0x16, 0x1a, 0x39, 0x0d, 0x11, 0x37,
];
