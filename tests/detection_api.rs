// Integration tests against stub detection endpoints on an ephemeral port.

use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use plaque_relay::detect::{DetectionClient, DetectionOutcome};
use plaque_relay::pipeline::video::submit_frames;
use plaque_relay::video::{sample_frames, RgbFrame, VideoReader};
use serde_json::json;

/// Serve `router` on an ephemeral port and return the /detect URL.
fn serve(router: Router) -> String {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let listener = rt
        .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
        .unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        rt.block_on(async move {
            axum::serve(listener, router).await.unwrap();
        });
    });
    format!("http://{}/detect", addr)
}

fn solid_frame(position: usize) -> RgbFrame {
    RgbFrame {
        position,
        width: 4,
        height: 4,
        data: vec![(position % 256) as u8; 4 * 4 * 3],
    }
}

/// Three decodable frames, like a very short clip.
struct ThreeFrameSource {
    cursor: usize,
}

impl VideoReader for ThreeFrameSource {
    fn frame_count(&self) -> anyhow::Result<usize> {
        Ok(3)
    }

    fn seek_to_frame(&mut self, frame_num: usize) -> anyhow::Result<()> {
        self.cursor = frame_num;
        Ok(())
    }

    fn read_frame(&mut self) -> anyhow::Result<RgbFrame> {
        if self.cursor >= 3 {
            anyhow::bail!("End of stream");
        }
        let frame = solid_frame(self.cursor);
        self.cursor += 1;
        Ok(frame)
    }
}

#[test]
fn non_200_status_yields_failed_not_error() {
    let endpoint = serve(Router::new().route(
        "/detect",
        post(|| async { (StatusCode::NOT_FOUND, "no such model") }),
    ));

    let client = DetectionClient::new(endpoint).unwrap();
    let outcome = client.detect(vec![1, 2, 3], "frame.png", "image/png");

    match outcome {
        DetectionOutcome::Failed(reason) => assert!(reason.contains("404"), "{}", reason),
        DetectionOutcome::Detected(_) => panic!("expected a failed outcome"),
    }
}

#[test]
fn unreachable_endpoint_yields_failed_not_error() {
    // Port 1 is essentially never listening.
    let client = DetectionClient::new("http://127.0.0.1:1/detect").unwrap();
    let outcome = client.detect(vec![1, 2, 3], "frame.png", "image/png");
    assert!(matches!(outcome, DetectionOutcome::Failed(_)));
}

#[test]
fn multipart_field_is_named_image() {
    let endpoint = serve(Router::new().route(
        "/detect",
        post(|mut multipart: Multipart| async move {
            let field = multipart.next_field().await.unwrap().unwrap();
            assert_eq!(field.name(), Some("image"));
            assert_eq!(field.file_name(), Some("frame.png"));
            assert_eq!(field.content_type(), Some("image/png"));
            Json(json!({"plaques": []}))
        }),
    ));

    let client = DetectionClient::new(endpoint).unwrap();
    let outcome = client.detect(vec![0u8; 16], "frame.png", "image/png");
    assert_eq!(outcome.plaques(), Some(Vec::new()));
}

#[test]
fn end_to_end_three_frame_video() {
    let endpoint = serve(Router::new().route(
        "/detect",
        post(|| async { Json(json!({"plaques": ["ABC123"]})) }),
    ));
    let client = DetectionClient::new(endpoint).unwrap();

    // 3-frame source, 6 requested: duplicates allowed, at most 3 distinct.
    let frames = sample_frames(Box::new(ThreeFrameSource { cursor: 0 }), 6).unwrap();
    assert_eq!(frames.len(), 6);
    let positions: Vec<usize> = frames.iter().map(|f| f.position).collect();
    assert!(positions.windows(2).all(|w| w[0] <= w[1]));
    let mut distinct = positions.clone();
    distinct.dedup();
    assert!(distinct.len() <= 3);

    let mut emitted = Vec::new();
    let reports = submit_frames(&frames, &client, &mut |submitted, total| {
        emitted.push((submitted, total))
    })
    .unwrap();

    // ABC123 once per submitted frame, in frame order.
    assert_eq!(reports.len(), 6);
    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.frame, i + 1);
        assert_eq!(report.plaques, Some(vec!["ABC123".to_string()]));
    }

    assert_eq!(emitted, (1..=6).map(|i| (i, 6)).collect::<Vec<_>>());
}

#[test]
fn progress_sequence_is_exact_regardless_of_outcomes() {
    let endpoint = serve(Router::new().route(
        "/detect",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    ));
    let client = DetectionClient::new(endpoint).unwrap();

    let frames: Vec<RgbFrame> = (0..6).map(solid_frame).collect();
    let mut fractions = Vec::new();
    let reports = submit_frames(&frames, &client, &mut |submitted, total| {
        fractions.push(submitted as f64 / total as f64)
    })
    .unwrap();

    // Every frame failed, yet progress still walked 1/6 .. 1.0.
    assert!(reports.iter().all(|r| r.plaques.is_none()));
    let expected: Vec<f64> = (1..=6).map(|i| i as f64 / 6.0).collect();
    assert_eq!(fractions, expected);
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*fractions.last().unwrap(), 1.0);
}

#[test]
fn absent_plaques_key_is_zero_detections() {
    let endpoint = serve(Router::new().route(
        "/detect",
        post(|| async { Json(json!({"status": "ok"})) }),
    ));
    let client = DetectionClient::new(endpoint).unwrap();

    let frames = vec![solid_frame(0)];
    let reports = submit_frames(&frames, &client, &mut |_, _| {}).unwrap();
    assert_eq!(reports[0].plaques, Some(Vec::new()));
}
