//! End-to-end mux tests against a real FFmpeg install.

use std::path::Path;
use std::process::Command;

use avgen_media::{probe_media, Combiner, FfmpegMuxer, MediaError};
use tempfile::TempDir;

fn lavfi(source: &str, args: &[&str], output: &Path) {
    let status = Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-f", "lavfi", "-i", source])
        .args(args)
        .arg(output)
        .status()
        .expect("ffmpeg should be installed");
    assert!(status.success(), "failed to generate {}", output.display());
}

fn make_video(dir: &Path, seconds: f64) -> std::path::PathBuf {
    let path = dir.join("video.mp4");
    lavfi(
        &format!("testsrc=size=320x240:rate=24:duration={seconds}"),
        &["-c:v", "libx264", "-pix_fmt", "yuv420p"],
        &path,
    );
    path
}

fn make_audio(dir: &Path, seconds: f64) -> std::path::PathBuf {
    let path = dir.join("audio.mp3");
    lavfi(
        &format!("sine=frequency=440:duration={seconds}"),
        &["-c:a", "libmp3lame"],
        &path,
    );
    path
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_mux_trims_to_shorter_video() {
    let dir = TempDir::new().unwrap();
    let video = make_video(dir.path(), 5.2);
    let audio = make_audio(dir.path(), 7.8);
    let output = dir.path().join("final.mp4");

    let result = FfmpegMuxer::default().combine(&video, &audio, &output).await.unwrap();

    let duration = probe_media(&output).await.unwrap().duration;
    assert!((result.plan.output_duration() - 5.2).abs() < 0.1);
    assert!((duration - 5.2).abs() < 0.15, "output was {duration}s");
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_mux_trims_to_shorter_audio() {
    let dir = TempDir::new().unwrap();
    let video = make_video(dir.path(), 7.8);
    let audio = make_audio(dir.path(), 5.2);
    let output = dir.path().join("final.mp4");

    FfmpegMuxer::default().combine(&video, &audio, &output).await.unwrap();

    let duration = probe_media(&output).await.unwrap().duration;
    assert!((duration - 5.2).abs() < 0.15, "output was {duration}s");
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_mux_rejects_audio_without_sound() {
    let dir = TempDir::new().unwrap();
    let video = make_video(dir.path(), 2.0);
    // A video file in the audio slot has no audio stream to map
    let output = dir.path().join("final.mp4");

    let result = FfmpegMuxer::default().combine(&video, &video, &output).await;

    assert!(matches!(result, Err(MediaError::InvalidMedia(_))));
    assert!(!output.exists());
}
