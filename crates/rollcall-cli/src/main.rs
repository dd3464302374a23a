use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rollcall_core::{AttendanceLedger, FaceLocator, FeatureExtractor, HammingMatcher, Matcher, Roster};
use rollcall_hw::Camera;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

mod config;
mod session;

use config::Config;

#[derive(Parser)]
#[command(name = "rollcall", about = "Camera attendance tracking from enrolled reference images")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll the roster and run the live attendance loop
    Run {
        /// Directory of reference images, one per student (filename stem = student ID)
        #[arg(short, long)]
        students: PathBuf,
        /// Path to the pretrained face detection model
        #[arg(short, long)]
        model: PathBuf,
        /// Camera device index
        #[arg(short, long)]
        device: Option<usize>,
        /// Attendance export path
        #[arg(short, long, default_value = "attendance.csv")]
        output: PathBuf,
        /// Largest aggregate match distance still accepted
        #[arg(short, long)]
        threshold: Option<u32>,
    },
    /// Match one image file against the roster and print the decision
    Identify {
        /// Directory of reference images
        #[arg(short, long)]
        students: PathBuf,
        /// Query image, treated as one detected face
        image: PathBuf,
        /// Largest aggregate match distance still accepted
        #[arg(short, long)]
        threshold: Option<u32>,
    },
    /// Enroll the roster and print it without starting the camera
    Roster {
        /// Directory of reference images
        #[arg(short, long)]
        students: PathBuf,
    },
    /// List available capture devices
    Devices,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            students,
            model,
            device,
            output,
            threshold,
        } => run(&config, &students, &model, device, &output, threshold),
        Commands::Identify {
            students,
            image,
            threshold,
        } => identify(&config, &students, &image, threshold),
        Commands::Roster { students } => print_roster(&config, &students),
        Commands::Devices => {
            let devices = Camera::list_devices();
            if devices.is_empty() {
                println!("no capture devices found");
            }
            for dev in devices {
                println!("{}: {} ({})", dev.index, dev.name, dev.driver);
            }
            Ok(())
        }
    }
}

fn run(
    config: &Config,
    students: &PathBuf,
    model: &PathBuf,
    device: Option<usize>,
    output: &PathBuf,
    threshold: Option<u32>,
) -> Result<()> {
    let extractor = FeatureExtractor::new(config.extractor.clone());
    let roster = Roster::load_dir(students, &extractor).context("enrollment failed")?;
    let mut locator = FaceLocator::load(&model.to_string_lossy(), &config.locator)
        .context("face detector startup failed")?;
    let camera =
        Camera::open(device.unwrap_or(config.camera_index)).context("camera startup failed")?;

    let matcher = HammingMatcher::new(threshold.unwrap_or(config.accept_threshold));
    let mut ledger = AttendanceLedger::from_roster(&roster);

    let quit = Arc::new(AtomicBool::new(false));
    {
        let quit = Arc::clone(&quit);
        ctrlc::set_handler(move || quit.store(true, Ordering::SeqCst))
            .context("failed to install interrupt handler")?;
    }
    let commands = session::spawn_stdin_listener();

    session::run(
        &camera,
        &mut locator,
        &extractor,
        &matcher,
        &roster,
        &mut ledger,
        output,
        &commands,
        &quit,
    )?;

    println!(
        "attendance saved to {} ({} of {} present)",
        output.display(),
        ledger.present_count(),
        ledger.len()
    );
    Ok(())
}

fn identify(
    config: &Config,
    students: &PathBuf,
    image_path: &PathBuf,
    threshold: Option<u32>,
) -> Result<()> {
    let extractor = FeatureExtractor::new(config.extractor.clone());
    let roster = Roster::load_dir(students, &extractor).context("enrollment failed")?;
    let matcher = HammingMatcher::new(threshold.unwrap_or(config.accept_threshold));

    let image = image::open(image_path)
        .with_context(|| format!("cannot read query image {}", image_path.display()))?
        .to_luma8();
    let signature = extractor.extract(&image);
    let result = matcher.assign(&signature, &roster);

    match (result.matched, result.identity) {
        (true, Some(identity)) => println!("{identity} (distance {})", result.distance),
        _ if result.distance == u32::MAX => println!("Unknown (no scorable candidate)"),
        _ => println!("Unknown (best distance {})", result.distance),
    }
    Ok(())
}

fn print_roster(config: &Config, students: &PathBuf) -> Result<()> {
    let extractor = FeatureExtractor::new(config.extractor.clone());
    let roster = Roster::load_dir(students, &extractor).context("enrollment failed")?;

    println!("{} enrolled", roster.len());
    for entry in roster.entries() {
        println!("{}: {} keypoints", entry.identity, entry.signature.len());
    }
    Ok(())
}
