use divan::bench;
use tilescan_core::config::PipelineConfig;
use tilescan_core::test_utils::{make_board, TileSpec};
use tilescan_core::TileReader;

fn main() {
    divan::main();
}

fn board_with_tiles(width: usize, height: usize, count: usize) -> tilescan_core::GrayBuf {
    let specs: Vec<TileSpec> = (0..count)
        .map(|i| TileSpec {
            cx: 180.0 + 200.0 * (i % 4) as f64,
            cy: 180.0 + 200.0 * (i / 4) as f64,
            side: 140.0,
            angle_deg: 7.0 * i as f64,
            letter: Some((b'A' + (i % 26) as u8) as char),
        })
        .collect();
    make_board(width, height, &specs)
}

#[bench]
fn bench_detect_1080p_empty(bencher: divan::Bencher) {
    let canvas = tilescan_core::test_utils::board_frame(1920, 1080);
    let reader = TileReader::new(PipelineConfig::default()).unwrap();
    bencher.bench_local(move || reader.detect(&canvas.view()));
}

#[bench]
fn bench_detect_eight_tiles(bencher: divan::Bencher) {
    let canvas = board_with_tiles(1024, 600, 8);
    let reader = TileReader::new(PipelineConfig::default()).unwrap();
    bencher.bench_local(move || reader.detect(&canvas.view()));
}

#[bench]
fn bench_process_eight_tiles(bencher: divan::Bencher) {
    let canvas = board_with_tiles(1024, 600, 8);
    let reader = TileReader::new(PipelineConfig::default()).unwrap();
    bencher.bench_local(move || reader.process(&canvas.view()));
}
