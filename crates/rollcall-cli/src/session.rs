//! The live attendance session: capture, locate, extract, match, record.
//!
//! Single-threaded and synchronous per frame. The roster is read-only once
//! enrollment completes; only this loop mutates the ledger. Operator
//! controls arrive over a channel and are consumed at frame boundaries.

use image::GrayImage;
use rollcall_core::{
    AttendanceLedger, FaceLocator, FeatureExtractor, HammingMatcher, Matcher, Region, Roster,
};
use rollcall_hw::Camera;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("camera error: {0}")]
    Camera(#[from] rollcall_hw::CameraError),
    #[error("export failed: {0}")]
    Export(#[from] std::io::Error),
}

/// Operator command, consumed once per frame boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SaveSnapshot,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim() {
        "s" | "save" => Some(Command::SaveSnapshot),
        "q" | "quit" => Some(Command::Quit),
        _ => None,
    }
}

/// Read operator commands from stdin on a dedicated thread: `s` saves a
/// snapshot now, `q` terminates. The thread exits on EOF or when the
/// session side hangs up.
pub fn spawn_stdin_listener() -> Receiver<Command> {
    let (tx, rx) = mpsc::channel();

    std::thread::Builder::new()
        .name("rollcall-stdin".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match stdin.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
                let trimmed = line.trim();
                match parse_command(trimmed) {
                    Some(cmd) => {
                        if tx.send(cmd).is_err() {
                            break;
                        }
                    }
                    None if trimmed.is_empty() => {}
                    None => {
                        tracing::warn!(input = trimmed, "unrecognized command ('s' saves, 'q' quits)");
                    }
                }
            }
        })
        .expect("failed to spawn stdin listener thread");

    rx
}

/// Match each detected region against the roster and update the ledger.
/// Returns how many identities were newly marked present.
pub fn record_regions(
    gray: &GrayImage,
    regions: &[Region],
    extractor: &FeatureExtractor,
    matcher: &HammingMatcher,
    roster: &Roster,
    ledger: &mut AttendanceLedger,
) -> usize {
    let mut newly_present = 0;

    for region in regions {
        let Some((x, y, w, h)) = region.clamp_to(gray.width(), gray.height()) else {
            tracing::debug!(?region, "region outside frame, skipped");
            continue;
        };

        let crop = image::imageops::crop_imm(gray, x, y, w, h).to_image();
        let signature = extractor.extract(&crop);
        let result = matcher.assign(&signature, roster);

        match result.identity.as_deref().filter(|_| result.matched) {
            Some(identity) => {
                if ledger.mark_present(identity) {
                    newly_present += 1;
                    tracing::info!(identity, distance = result.distance, "marked present");
                } else {
                    tracing::debug!(identity, distance = result.distance, "recognized again");
                }
            }
            None => {
                tracing::debug!(
                    keypoints = signature.len(),
                    distance = result.distance,
                    "unknown face"
                );
            }
        }
    }

    newly_present
}

/// Run the live loop until a quit command, Ctrl-C, or a frame-acquisition
/// failure (acquisition failure is terminal for the session, not retried).
/// The ledger is exported on demand and once more on exit.
#[allow(clippy::too_many_arguments)]
pub fn run(
    camera: &Camera,
    locator: &mut FaceLocator,
    extractor: &FeatureExtractor,
    matcher: &HammingMatcher,
    roster: &Roster,
    ledger: &mut AttendanceLedger,
    export_path: &Path,
    commands: &Receiver<Command>,
    quit: &AtomicBool,
) -> Result<(), SessionError> {
    let mut stream = camera.stream()?;

    tracing::info!(
        enrolled = roster.len(),
        export = %export_path.display(),
        "attendance session started ('s' + Enter saves a snapshot, 'q' + Enter quits)"
    );

    'frames: loop {
        loop {
            match commands.try_recv() {
                Ok(Command::SaveSnapshot) => {
                    // A failed on-demand export should not end the session.
                    if let Err(err) = ledger.save_csv(export_path) {
                        tracing::error!(error = %err, "snapshot export failed");
                    }
                }
                Ok(Command::Quit) => break 'frames,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if quit.load(Ordering::SeqCst) {
            tracing::info!("interrupt received, stopping");
            break;
        }

        let frame = match stream.next_frame() {
            Ok(frame) => frame,
            Err(err) => {
                tracing::error!(error = %err, "frame acquisition failed, stopping");
                break;
            }
        };

        let sequence = frame.sequence;
        let Some(gray) = GrayImage::from_raw(frame.width, frame.height, frame.data) else {
            tracing::error!(sequence, "frame buffer size mismatch, stopping");
            break;
        };

        let regions = locator.locate(&gray);
        if !regions.is_empty() {
            tracing::debug!(sequence, faces = regions.len(), "faces located");
        }
        record_regions(&gray, &regions, extractor, matcher, roster, ledger);
    }

    ledger.save_csv(export_path)?;
    Ok(())
}
