use tabmap::{
    config::MapConfig,
    storage::{
        block_store::MemBlockStore,
        header::{MapHeaderBlock, ProjInfo, Quadrant},
    },
    types::{BLOCK_SIZE, Mbr, error::TabMapError},
};

fn ready_header() -> MapHeaderBlock {
    let mut header = MapHeaderBlock::new();
    header
        .set_coordsys_bounds(-180.0, -90.0, 180.0, 90.0)
        .unwrap();
    header
}

#[test]
fn test_new_header_refuses_conversion_until_bounds_set() {
    let header = MapHeaderBlock::new();
    assert!(!header.is_transform_ready());
    assert!(matches!(
        header.coordsys2int(1.0, 1.0),
        Err(TabMapError::CoordsysBoundsNotSet)
    ));
    assert!(matches!(
        header.int2coordsys(1, 1),
        Err(TabMapError::CoordsysBoundsNotSet)
    ));
}

#[test]
fn test_set_coordsys_bounds_maps_extent_to_full_range() {
    let header = ready_header();
    assert_eq!(header.quadrant, Quadrant::First);
    assert_eq!(header.x_scale, 2e9 / 360.0);
    assert_eq!(header.y_scale, 2e9 / 180.0);
    assert_eq!(header.x_displ, 0.0);
    assert_eq!(header.bounds, Mbr::new(-1_000_000_000, -1_000_000_000, 1_000_000_000, 1_000_000_000));

    let (x, y) = header.coordsys2int(180.0, -90.0).unwrap();
    assert!((x - 1_000_000_000).abs() <= 1);
    assert!((y + 1_000_000_000).abs() <= 1);
    assert_eq!(header.coordsys2int(0.0, 0.0).unwrap(), (0, 0));
}

#[test]
fn test_degenerate_bounds_are_widened() {
    let mut header = MapHeaderBlock::new();
    header.set_coordsys_bounds(10.0, 5.0, 10.0, 5.0).unwrap();
    assert_eq!(header.x_scale, 1e9);
    assert_eq!(header.y_scale, 1e9);
    assert_eq!(header.x_displ, -1e10);
    assert_eq!(header.coordsys2int(10.0, 5.0).unwrap(), (0, 0));
}

#[test]
fn test_invalid_bounds_are_rejected() {
    let mut header = MapHeaderBlock::new();
    assert!(matches!(
        header.set_coordsys_bounds(0.0, 0.0, f64::NAN, 1.0),
        Err(TabMapError::InvalidBounds { .. })
    ));
    assert!(matches!(
        header.set_coordsys_bounds(5.0, 0.0, 1.0, 1.0),
        Err(TabMapError::InvalidBounds { .. })
    ));
}

#[test]
fn test_round_trip_within_one_integer_unit() {
    let mut header = MapHeaderBlock::new();
    header
        .set_coordsys_bounds(300_000.0, 5_000_000.0, 800_000.0, 5_600_000.0)
        .unwrap();
    let tolerance_x = 1.0 / header.x_scale;
    let tolerance_y = 1.0 / header.y_scale;

    for i in 0..50 {
        let x = 300_000.0 + i as f64 * 9_999.37;
        let y = 5_000_000.0 + i as f64 * 11_999.11;
        let (ix, iy) = header.coordsys2int(x, y).unwrap();
        let (rx, ry) = header.int2coordsys(ix, iy).unwrap();
        assert!((rx - x).abs() <= tolerance_x, "x {} came back as {}", x, rx);
        assert!((ry - y).abs() <= tolerance_y, "y {} came back as {}", y, ry);
    }
}

#[test]
fn test_first_quadrant_is_plain_displacement_and_scale() {
    let mut header = ready_header();
    header.x_displ = 250.0;
    header.y_displ = -125.0;
    header.x_scale = 4.0;
    header.y_scale = 8.0;
    let (x, y) = header.int2coordsys(1250, 875).unwrap();
    assert_eq!(x, (1250.0 - 250.0) / 4.0);
    assert_eq!(y, (875.0 + 125.0) / 8.0);
}

#[test]
fn test_quadrants_flip_axes() {
    let mut header = ready_header();
    header.x_displ = 10.0;
    header.y_displ = 20.0;
    header.x_scale = 2.0;
    header.y_scale = 4.0;

    let expect = |q: Quadrant, header: &mut MapHeaderBlock| {
        header.quadrant = q;
        header.int2coordsys(100, 200).unwrap()
    };

    let plain_x = (100.0 - 10.0) / 2.0;
    let plain_y = (200.0 - 20.0) / 4.0;
    let flip_x = -(100.0 + 10.0) / 2.0;
    let flip_y = -(200.0 + 20.0) / 4.0;

    assert_eq!(expect(Quadrant::First, &mut header), (plain_x, plain_y));
    assert_eq!(expect(Quadrant::Second, &mut header), (flip_x, plain_y));
    assert_eq!(expect(Quadrant::Third, &mut header), (flip_x, flip_y));
    assert_eq!(expect(Quadrant::Fourth, &mut header), (plain_x, flip_y));

    // coordsys2int inverts every quadrant
    for q in [Quadrant::First, Quadrant::Second, Quadrant::Third, Quadrant::Fourth] {
        header.quadrant = q;
        let (dx, dy) = header.int2coordsys(100, 200).unwrap();
        assert_eq!(header.coordsys2int(dx, dy).unwrap(), (100, 200));
    }
}

#[test]
fn test_distance_conversions_ignore_displacement() {
    let mut header = ready_header();
    header.x_displ = 1e6;
    header.x_scale = 1000.0;
    header.y_scale = 500.0;
    assert_eq!(header.int2coordsys_dist(2000, 1000).unwrap(), (2.0, 2.0));
    assert_eq!(header.coordsys2int_dist(2.0, 2.0).unwrap(), (2000, 1000));
}

#[test]
fn test_compressed_conversion_adds_origin() {
    let header = ready_header();
    assert_eq!(
        header.compr_int2coordsys(1000, 2000, -10, 20).unwrap(),
        header.int2coordsys(990, 2020).unwrap()
    );
}

#[test]
fn test_compressed_conversion_rejects_overflowing_origin() {
    let header = ready_header();
    assert!(matches!(
        header.compr_int2coordsys(i32::MAX, 0, 1, 0),
        Err(TabMapError::CompressedOriginOverflow { center_x: i32::MAX, dx: 1, .. })
    ));
    assert!(matches!(
        header.compr_int2coordsys(0, i32::MIN, 0, -1),
        Err(TabMapError::CompressedOriginOverflow { dy: -1, .. })
    ));
}

#[test]
fn test_layout_round_trip() {
    let mut header = MapHeaderBlock::from_config(&MapConfig::default());
    header.set_coordsys_bounds(0.0, 0.0, 1000.0, 500.0).unwrap();
    header.num_line_objects = 12;
    header.num_region_objects = 3;
    header.max_coord_buf_size = 4096;
    header.num_pen_defs = 2;
    header.num_map_tool_blocks = 1;
    header.set_proj_info(ProjInfo {
        proj_id: 8,
        ellipsoid_id: 28,
        units_id: 7,
        proj_params: [-75.0, 0.0, 0.9996, 500000.0, 0.0, 0.0],
        datum_shift_x: 1.5,
        datum_shift_y: -2.5,
        datum_shift_z: 3.5,
        datum_params: [0.1, 0.2, 0.3, 0.4, 0.5],
    });

    let bytes = header.to_bytes().unwrap();
    assert_eq!(bytes.len(), BLOCK_SIZE);
    assert_eq!(i32::from_le_bytes([bytes[0x100], bytes[0x101], bytes[0x102], bytes[0x103]]), 42424242);
    assert_eq!(i16::from_le_bytes([bytes[0x104], bytes[0x105]]), 400);
    assert_eq!(i16::from_le_bytes([bytes[0x106], bytes[0x107]]), 512);
    assert_eq!(bytes[0x161], 1); // origin quadrant
    assert_eq!(bytes[0x163], 45); // max object length array id
    assert_eq!(bytes[0x16d], 8); // projection id

    let decoded = MapHeaderBlock::from_bytes(&bytes).unwrap();
    assert!(decoded.is_transform_ready());
    assert_eq!(decoded.num_line_objects, 12);
    assert_eq!(decoded.num_region_objects, 3);
    assert_eq!(decoded.max_coord_buf_size, 4096);
    assert_eq!(decoded.num_pen_defs, 2);
    assert_eq!(decoded.num_map_tool_blocks, 1);
    assert_eq!(decoded.coord_precision, 3);
    assert_eq!(decoded.dist_units_code, 7);
    assert_eq!(decoded.proj_info(), header.proj_info());
    assert_eq!(decoded.x_scale, header.x_scale);
    assert_eq!(decoded.y_displ, header.y_displ);
    assert_eq!(decoded.bounds, header.bounds);
    assert_eq!(
        decoded.coordsys2int(250.0, 125.0).unwrap(),
        header.coordsys2int(250.0, 125.0).unwrap()
    );
}

#[test]
fn test_commit_and_read_from_store() {
    let header = ready_header();
    let mut store = MemBlockStore::new();
    header.commit(&mut store).unwrap();
    let decoded = MapHeaderBlock::read_from_store(&mut store).unwrap();
    assert_eq!(decoded.x_scale, header.x_scale);
}

#[test]
fn test_bad_magic_cookie_is_rejected() {
    let mut bytes = ready_header().to_bytes().unwrap();
    bytes[0x100] = 0;
    assert!(matches!(
        MapHeaderBlock::from_bytes(&bytes),
        Err(TabMapError::InvalidMagicCookie { expected: 42424242, .. })
    ));
    assert!(matches!(
        MapHeaderBlock::from_bytes(&bytes[..100]),
        Err(TabMapError::InvalidBlockSize { expected: 512, actual: 100 })
    ));
}

#[test]
fn test_invalid_quadrant_is_rejected() {
    let mut bytes = ready_header().to_bytes().unwrap();
    bytes[0x161] = 7;
    assert!(matches!(
        MapHeaderBlock::from_bytes(&bytes),
        Err(TabMapError::InvalidQuadrant(7))
    ));
}

#[test]
fn test_zero_quadrant_reads_as_first() {
    let header = ready_header();
    let mut bytes = header.to_bytes().unwrap();
    bytes[0x161] = 0;
    let decoded = MapHeaderBlock::from_bytes(&bytes).unwrap();
    assert_eq!(decoded.quadrant, Quadrant::First);
    assert_eq!(
        decoded.int2coordsys(1234, -5678).unwrap(),
        header.int2coordsys(1234, -5678).unwrap()
    );
}

#[test]
fn test_object_length_table() {
    let header = MapHeaderBlock::new();
    // Point: 10 bytes, no coordinate block
    assert_eq!(header.map_object_size(1).unwrap(), 10);
    assert!(!header.map_object_uses_coord_block(1).unwrap());
    // Pline: coordinate block
    assert_eq!(header.map_object_size(7).unwrap(), 0x22);
    assert!(header.map_object_uses_coord_block(7).unwrap());
    // Beyond the defined table the entries are empty
    assert_eq!(header.map_object_size(200).unwrap(), 0);
    assert!(matches!(
        header.map_object_size(256),
        Err(TabMapError::InvalidObjectType(256))
    ));
    assert!(matches!(
        header.map_object_size(-1),
        Err(TabMapError::InvalidObjectType(-1))
    ));

    let bytes = header.to_bytes().unwrap();
    assert_eq!(&bytes[..4], &[0x00, 0x0a, 0x0e, 0x15]);
    assert_eq!(bytes[45], 0x37);
}

#[test]
fn test_dump_lists_key_fields() {
    let header = ready_header();
    let dump = header.to_string();
    assert!(dump.contains("Version: 400"));
    assert!(dump.contains("Coord origin quadrant: 1"));
}
