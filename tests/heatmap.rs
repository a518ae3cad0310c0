use chrono::{DateTime, TimeZone, Utc};
use solaris::{
    color::{interpolate, DEFAULT_STOPS},
    solar::potential,
    tiles::{generate_tiles, HeatTileGenerator, DEFAULT_GRID_SIZE, DEFAULT_MIN_VALUE},
    Region,
};

fn march_noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 20, 6, 30, 0).unwrap()
}

fn delhi() -> Region {
    Region::new(28.6139, 77.209, 0.4, 0.4)
}

#[test]
fn interpolated_colors_stay_in_range() {
    for step in 0..=1000 {
        let value = step as f64 / 1000.0;
        let color = interpolate(value);
        assert!(
            (0.18 - 1e-12..=0.73 + 1e-12).contains(&color.a),
            "alpha {} out of range at {value}",
            color.a
        );
    }
    let first = interpolate(0.0);
    let last = interpolate(1.0);
    assert_eq!([first.r, first.g, first.b], DEFAULT_STOPS[0].rgb);
    assert_eq!([last.r, last.g, last.b], DEFAULT_STOPS[DEFAULT_STOPS.len() - 1].rgb);
}

#[test]
fn potential_is_bit_identical_across_calls() {
    let region = delhi();
    let at = march_noon();
    let a = potential(28.7, 77.1, at, &region);
    let b = potential(28.7, 77.1, at, &region);
    assert_eq!(a.to_bits(), b.to_bits());
}

#[test]
fn potential_stays_in_unit_interval_worldwide() {
    let at = Utc.with_ymd_and_hms(2024, 6, 21, 0, 0, 0).unwrap();
    for lat in (-90..=90).step_by(3) {
        for lon in (-180..=180).step_by(9) {
            let region = Region::new(lat as f64, lon as f64, 5.0, 5.0);
            let value = potential(lat as f64, lon as f64, at, &region);
            assert!((0.0..=1.0).contains(&value), "{value} at ({lat}, {lon})");
        }
    }
}

#[test]
fn sampling_covers_every_cell_before_filtering() {
    let generator = HeatTileGenerator::default();
    let region = delhi();
    let cells = generator.sample_cells(&region, march_noon(), DEFAULT_GRID_SIZE);
    assert_eq!(cells.len(), (DEFAULT_GRID_SIZE * DEFAULT_GRID_SIZE) as usize);

    let tiles = generator.generate(&region, march_noon(), DEFAULT_GRID_SIZE);
    let kept: Vec<f64> = cells
        .iter()
        .filter(|cell| cell.value > 0.02)
        .map(|cell| cell.value)
        .collect();
    assert_eq!(tiles.len(), kept.len());
    assert!(tiles.iter().all(|tile| tile.value > 0.02));
    assert_eq!(tiles.iter().map(|t| t.value).collect::<Vec<_>>(), kept);
}

#[test]
fn default_threshold_drops_cells_beyond_polar_night() {
    // around the December solstice the sun stays down north of ~66.6N
    let at = Utc.with_ymd_and_hms(2024, 12, 21, 6, 0, 0).unwrap();
    let region = Region::new(64.0, 25.0, 6.0, 6.0);
    let generator = HeatTileGenerator::default();

    let cells = generator.sample_cells(&region, at, DEFAULT_GRID_SIZE);
    let tiles = generator.generate(&region, at, DEFAULT_GRID_SIZE);
    assert!(!tiles.is_empty(), "southern rows should stay lit");
    assert!(tiles.len() < cells.len(), "northern rows should be dropped");

    let (kept, dropped): (Vec<_>, Vec<_>) = cells.iter().partition(|cell| cell.value > DEFAULT_MIN_VALUE);
    assert_eq!(tiles.len(), kept.len());
    assert!(dropped.iter().all(|cell| cell.value <= DEFAULT_MIN_VALUE));
    assert!(cells[0].value == 0.0, "north-west cell is in polar night");
    assert!(tiles.iter().all(|tile| tile.value > DEFAULT_MIN_VALUE));
}

#[test]
fn cells_tile_the_region_exactly() {
    let region = Region::new(-12.3, 130.8, 0.73, 1.19);
    let cells = HeatTileGenerator::default().sample_cells(&region, march_noon(), 9);

    let area: f64 = cells
        .iter()
        .map(|cell| {
            let [nw, _, se, _] = cell.corners;
            (nw.0 - se.0) * (se.1 - nw.1)
        })
        .sum();
    assert!((area - region.area()).abs() < 1e-9, "{area} vs {}", region.area());

    for pair in cells.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if a.pos.row == b.pos.row {
            // east edge of one cell is the west edge of the next
            assert_eq!(a.corners[1], b.corners[0]);
        }
    }
    for cell in &cells {
        for (lat, lon) in cell.corners {
            assert!(lat >= region.south() && lat <= region.north());
            assert!(lon >= region.west() && lon <= region.east());
        }
    }
}

#[test]
fn tiles_come_out_row_major_from_the_north_west() {
    let region = Region::new(20.0, 75.0, 1.0, 1.0);
    let cells = HeatTileGenerator::default().sample_cells(&region, march_noon(), 4);
    let positions: Vec<(u32, u32)> = cells.iter().map(|c| (c.pos.row, c.pos.col)).collect();
    let expected: Vec<(u32, u32)> = (0..4).flat_map(|r| (0..4).map(move |c| (r, c))).collect();
    assert_eq!(positions, expected);
    assert!(cells[0].center.0 > cells[4].center.0);
    assert!(cells[0].center.1 < cells[1].center.1);
}

#[test]
fn tile_generation_is_reproducible() {
    let region = delhi();
    let first = generate_tiles(&region, march_noon(), 14);
    let second = generate_tiles(&region, march_noon(), 14);
    assert_eq!(first, second);
    assert!(!first.is_empty(), "Delhi in March should have visible tiles");
    for tile in &first {
        assert!(tile.fill_color.starts_with("rgba("));
    }
}

#[test]
fn tiles_serialize_with_camel_case_fill_color() {
    let tiles = generate_tiles(&delhi(), march_noon(), 2);
    let json = serde_json::to_value(&tiles).unwrap();
    let first = &json[0];
    assert!(first["fillColor"].is_string());
    assert_eq!(first["coordinates"].as_array().unwrap().len(), 4);
}
