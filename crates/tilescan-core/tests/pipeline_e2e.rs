#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use tilescan_core::config::PipelineConfig;
use tilescan_core::image::GrayBuf;
use tilescan_core::recognize::TemplateStrategy;
use tilescan_core::rectify::Rectifier;
use tilescan_core::test_utils::{make_board, TileSpec};
use tilescan_core::{TileReader, TileStatus};

fn tile(cx: f64, cy: f64, letter: Option<char>) -> TileSpec {
    TileSpec {
        cx,
        cy,
        side: 140.0,
        angle_deg: 0.0,
        letter,
    }
}

/// Build gallery entries the way the original rig does: from rectified
/// crops of reference tiles, so templates and live crops share scale.
fn reference_gallery(letters: &[char], config: &PipelineConfig) -> Vec<(char, GrayBuf)> {
    let reader = TileReader::new(config.clone()).unwrap();
    let rectifier = Rectifier::new(config.clone());
    letters
        .iter()
        .map(|&letter| {
            let board = make_board(320, 320, &[tile(160.0, 160.0, Some(letter))]);
            let boxes = reader.detect(&board.view());
            assert_eq!(boxes.len(), 1, "reference board for {letter} must detect");
            let crop = rectifier.rectify(&board.view(), &boxes[0]);
            (letter, crop.pixels)
        })
        .collect()
}

fn template_reader(letters: &[char]) -> TileReader {
    let config = PipelineConfig::default();
    let gallery = reference_gallery(letters, &config);
    let strategy = TemplateStrategy::from_labeled(gallery, &config);
    TileReader::with_recognizer(config, Box::new(strategy))
}

#[test]
fn test_full_pipeline_reads_letters_and_blanks() {
    let reader = template_reader(&['A', 'E', 'T', 'X']);
    let board = make_board(
        800,
        320,
        &[
            tile(140.0, 160.0, Some('T')),
            tile(400.0, 160.0, None),
            tile(660.0, 160.0, Some('A')),
        ],
    );

    let report = reader.process(&board.view());
    assert_eq!(report.readings.len(), 3);
    assert_eq!(report.stats.num_tiles, 3);
    assert_eq!(report.stats.num_recognized, 2);
    assert_eq!(report.stats.num_blank, 1);
    assert_eq!(report.stats.num_unknown, 0);

    for reading in &report.readings {
        match reading.status {
            TileStatus::Blank => {
                assert!(reading.letter.is_none(), "blank tiles never carry a letter");
                assert!((reading.region.cx - 400.0).abs() < 8.0);
            }
            TileStatus::Recognized => {
                let expected = if reading.region.cx < 300.0 { 'T' } else { 'A' };
                assert_eq!(reading.letter, Some(expected));
                assert!(reading.confidence > 45.0);
            }
            TileStatus::Unknown => panic!("unexpected unknown reading: {reading:?}"),
        }
    }
}

#[test]
fn test_readings_align_with_detection_order() {
    let reader = template_reader(&['A', 'E']);
    let board = make_board(
        800,
        320,
        &[
            tile(140.0, 160.0, Some('E')),
            tile(400.0, 160.0, Some('A')),
            tile(660.0, 160.0, None),
        ],
    );
    let boxes = reader.detect(&board.view());
    let report = reader.process(&board.view());
    assert_eq!(boxes.len(), report.readings.len());
    for (bx, reading) in boxes.iter().zip(report.readings.iter()) {
        assert_eq!(*bx, reading.region);
    }
}

#[test]
fn test_rotated_tile_recognized() {
    let reader = template_reader(&['A', 'E', 'T', 'X']);
    for angle in [90.0, 180.0, 270.0] {
        let board = make_board(
            320,
            320,
            &[TileSpec {
                cx: 160.0,
                cy: 160.0,
                side: 140.0,
                angle_deg: angle,
                letter: Some('E'),
            }],
        );
        let report = reader.process(&board.view());
        assert_eq!(report.readings.len(), 1);
        assert_eq!(
            report.readings[0].letter,
            Some('E'),
            "letter lost at rotation {angle}"
        );
    }
}

#[test]
fn test_no_backend_degrades_to_unknown() {
    let reader = TileReader::new(PipelineConfig::default()).unwrap();
    assert!(reader.recognizer_name().is_none());
    let board = make_board(320, 320, &[tile(160.0, 160.0, Some('Q'))]);
    let report = reader.process(&board.view());
    assert_eq!(report.readings.len(), 1);
    assert_eq!(report.readings[0].status, TileStatus::Unknown);
    assert_eq!(report.readings[0].letter, None);
}

#[test]
fn test_annotated_overlay_has_frame_dimensions() {
    let reader = template_reader(&['A']);
    let board = make_board(400, 300, &[tile(160.0, 150.0, Some('A'))]);
    let (report, overlay) = reader.process_annotated(&board.view());
    assert_eq!(report.readings.len(), 1);
    assert_eq!(overlay.dimensions(), (400, 300));
}

#[test]
fn test_word_regions_merge_adjacent_lettered_tiles() {
    // Two touching lettered tiles form one word; a distant blank tile is
    // dropped before clustering.
    let reader = template_reader(&['A', 'E']);
    let board = make_board(
        900,
        600,
        &[
            tile(200.0, 160.0, Some('A')),
            tile(355.0, 160.0, Some('E')),
            tile(700.0, 450.0, None),
        ],
    );
    let regions = reader.word_regions(&board.view());
    assert_eq!(regions.len(), 1, "{regions:?}");
    let word = regions[0];
    assert!(word.w.max(word.h) > 250.0, "merged region spans both tiles");
    assert!((word.cy - 160.0).abs() < 10.0);
}
