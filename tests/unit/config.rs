use super::*;

#[test]
fn defaults_are_valid() {
    let cfg = GeoCamConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.tiles.timeout(), Duration::from_millis(1500));
    assert_eq!(cfg.photo.jpeg_quality, 95);
    assert_eq!(cfg.video.fps, 30);
    assert_eq!(cfg.video.bitrate_bps, 2_500_000);
    assert_eq!(cfg.utc_offset().unwrap().local_minus_utc(), 330 * 60);
}

#[test]
fn partial_json_fills_in_defaults() {
    let cfg = GeoCamConfig::from_json_str(
        r#"{ "footer": { "watermark": "Survey" }, "video": { "codecs": ["mp4-h264-aac"] } }"#,
    )
    .unwrap();
    assert_eq!(cfg.footer.watermark, "Survey");
    assert_eq!(cfg.footer.utc_offset_minutes, 330);
    assert_eq!(cfg.video.codecs, vec![VideoCodec::Mp4H264Aac]);
    assert_eq!(cfg.tiles.zoom, 15);
}

#[test]
fn audio_input_round_trips_through_json() {
    let cfg = GeoCamConfig::from_json_str(
        r#"{ "video": { "audio": { "source": "default", "format": "pulse" } } }"#,
    )
    .unwrap();
    assert_eq!(cfg.video.audio, Some(AudioInput::device("pulse", "default")));
}

#[test]
fn unknown_fields_are_rejected() {
    let err = GeoCamConfig::from_json_str(r#"{ "tiles": { "mirror": [] } }"#).unwrap_err();
    assert!(matches!(err, GeoCamError::Serde(_)));
}

#[test]
fn invalid_values_are_rejected() {
    for json in [
        r#"{ "tiles": { "timeout_ms": 500 } }"#,
        r#"{ "tiles": { "timeout_ms": 2500 } }"#,
        r#"{ "tiles": { "zoom": 25 } }"#,
        r#"{ "tiles": { "mirrors": ["tile.example.org"] } }"#,
        r#"{ "tiles": { "mirrors": [] } }"#,
        r#"{ "photo": { "jpeg_quality": 0 } }"#,
        r#"{ "video": { "codecs": [] } }"#,
        r#"{ "footer": { "utc_offset_minutes": 100000 } }"#,
    ] {
        assert!(GeoCamConfig::from_json_str(json).is_err(), "{json}");
    }
}

#[test]
fn footer_style_uses_configured_values() {
    let mut cfg = GeoCamConfig::default();
    cfg.footer.utc_offset_minutes = -300;
    cfg.tiles.zoom = 12;
    let style = cfg.footer_style().unwrap();
    assert_eq!(style.zoom, 12);
    assert_eq!(style.utc_offset.local_minus_utc(), -300 * 60);
    assert_eq!(cfg.recorder_settings().codecs.len(), 3);
}

#[test]
fn load_reports_missing_files() {
    let err = GeoCamConfig::load(Path::new("/nonexistent/geocam.json")).unwrap_err();
    assert!(matches!(err, GeoCamError::Other(_)));
}
