use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use ffgate::cli::{self, Commands};
use ffgate::config::Config;
use ffgate::engine::{
    self, BitrateAnalysis, EncodePlan, EncoderFamily, HostCapabilities, PipelineRun, PlanOutcome,
    QualityIntent, select_encoder,
};
use ffgate::host::{self, hardware};
use ffgate::stats::{GateStats, format_bytes, format_percent};

/// Exit code for a reverted gate
const EXIT_REVERTED: u8 = 2;

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "ffgate=debug" } else { "ffgate=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = cli::parse();
    init_tracing(cli.verbose);

    if let Commands::InitConfig = cli.command {
        init_config()?;
        return Ok(ExitCode::SUCCESS);
    }
    if let Commands::Stats = cli.command {
        print_stats()?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = Config::load()?;
    let intent = cli
        .overrides
        .apply(config.defaults.raw_intent()?)
        .validate()?;
    let container = cli
        .overrides
        .container
        .clone()
        .unwrap_or_else(|| config.defaults.container.clone());
    let caps = host::capabilities_for(cli.overrides.hw);

    match cli.command {
        Commands::Plan { file, json } => plan_one(&file, &intent, &*caps, &container, json)?,
        Commands::DryRun { directory } => {
            let root = directory.unwrap_or_else(|| PathBuf::from("."));
            dry_run(&root, &intent, &*caps, &container)?;
        }
        Commands::Gate {
            original,
            transcoded,
            score,
        } => return gate(&original, &transcoded, &intent, score),
        Commands::CheckHw { json } => check_hw(&intent, &*caps, json)?,
        Commands::Stats | Commands::InitConfig => {}
    }

    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct PlanReport<'a> {
    file: &'a Path,
    run_id: String,
    #[serde(flatten)]
    outcome: &'a PlanOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    bitrate: Option<&'a BitrateAnalysis>,
}

fn plan_one(
    file: &Path,
    intent: &QualityIntent,
    caps: &dyn HostCapabilities,
    container: &str,
    json: bool,
) -> Result<()> {
    let raw = host::probe_file(file)?;
    let mut run = PipelineRun::from_raw(&raw, intent.clone())
        .with_context(|| format!("Failed to analyze {}", file.display()))?;
    run.plan(caps, container)?;

    let Some(outcome) = run.outcome() else {
        return Ok(());
    };

    if json {
        let report = PlanReport {
            file,
            run_id: run.id.to_string(),
            outcome,
            bitrate: run.analysis(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match outcome {
        PlanOutcome::Skip { reason } => println!("{}: skip ({})", file.display(), reason),
        PlanOutcome::Ready(plan) => {
            println!("{}: {}", file.display(), plan.summary);
            if let Some(analysis) = run.analysis() {
                println!(
                    "  bitrate: {:.0} kbps -> {:.0} kbps target",
                    analysis.current_bitrate_kbps, analysis.target_bitrate_kbps
                );
            }
            let fallbacks: Vec<_> = plan
                .encoder
                .fallbacks
                .iter()
                .map(|f| f.ffmpeg_name())
                .collect();
            if !fallbacks.is_empty() {
                println!("  fallbacks: {}", fallbacks.join(" -> "));
            }
            println!("{}", render_commands(file, plan, &run));
        }
    }

    Ok(())
}

fn render_commands(file: &Path, plan: &EncodePlan, run: &PipelineRun) -> String {
    let output = host::derive_output_path(file, &plan.container);
    let cmds = host::build_ffmpeg_cmds(plan, file, &output, &host::two_pass_log_prefix(run.id));
    host::format_ffmpeg_cmds(&cmds)
}

fn dry_run(
    root: &Path,
    intent: &QualityIntent,
    caps: &dyn HostCapabilities,
    container: &str,
) -> Result<()> {
    let files = host::scan::scan(root);
    if files.is_empty() {
        println!("No video files found under {}", root.display());
        return Ok(());
    }

    println!("Dry run - {} file(s):\n", files.len());

    let mut planned = 0usize;
    let mut skipped = 0usize;
    for file in &files {
        // One unreadable file doesn't stop the batch
        let raw = match host::probe_file(file) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("{:#}", e);
                continue;
            }
        };
        let mut run = match PipelineRun::from_raw(&raw, intent.clone()) {
            Ok(run) => run,
            Err(e) => {
                warn!(file = %file.display(), "{}", e);
                continue;
            }
        };

        let outcome = run.plan(caps, container)?.clone();
        match &outcome {
            PlanOutcome::Skip { reason } => {
                skipped += 1;
                println!("# {} (skip: {})", file.display(), reason);
            }
            PlanOutcome::Ready(plan) => {
                planned += 1;
                println!("# {} ({})", file.display(), plan.summary);
                println!("{}", render_commands(file, plan, &run));
            }
        }
        println!();
    }

    info!(planned, skipped, total = files.len(), "dry run complete");
    Ok(())
}

fn gate(
    original: &Path,
    transcoded: &Path,
    intent: &QualityIntent,
    score: Option<f64>,
) -> Result<ExitCode> {
    let original_probe = engine::analyze(&host::probe_file(original)?)
        .with_context(|| format!("Failed to analyze {}", original.display()))?;
    let transcoded_probe = engine::analyze(&host::probe_file(transcoded)?)
        .with_context(|| format!("Failed to analyze {}", transcoded.display()))?;

    let decision = engine::evaluate(&original_probe, &transcoded_probe, intent, score)?;
    println!("{}", serde_json::to_string_pretty(&decision)?);

    match GateStats::load() {
        Ok(mut stats) => {
            stats.record(
                &decision,
                original_probe.file_size_bytes,
                transcoded_probe.file_size_bytes,
            );
            if let Err(e) = stats.save() {
                warn!("Could not save gate statistics: {:#}", e);
            }
        }
        Err(e) => warn!("Could not load gate statistics: {:#}", e),
    }

    if decision.accepted {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_REVERTED))
    }
}

/// `check-hw --json` output
#[derive(Serialize)]
struct CheckHwReport {
    ffprobe: Option<String>,
    #[serde(flatten)]
    host: hardware::HwReport,
    available_encoders: Vec<EncoderFamily>,
    encoder_chain: Vec<EncoderFamily>,
    gpu_enabled: bool,
}

fn check_hw(intent: &QualityIntent, caps: &dyn HostCapabilities, json: bool) -> Result<()> {
    let ffprobe = host::ffprobe::ffprobe_version();
    let report = hardware::hw_report();

    let gpu_intent = QualityIntent {
        use_gpu: true,
        ..intent.clone()
    };
    let encoder_chain: Vec<_> = select_encoder(&gpu_intent, caps).chain().collect();

    if json {
        let out = CheckHwReport {
            ffprobe: ffprobe.ok(),
            available_encoders: report.available_encoders(),
            host: report,
            encoder_chain,
            gpu_enabled: intent.use_gpu,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match ffprobe {
        Ok(version) => println!("ffprobe: {}", version),
        Err(e) => println!("ffprobe: not available ({:#})", e),
    }

    println!(
        "NVIDIA GPU:    {}",
        report.nvidia_gpu.as_deref().unwrap_or("not detected")
    );
    println!(
        "Render device: {}",
        report.render_device.as_deref().unwrap_or("not detected")
    );
    println!("ffmpeg encoders:");
    println!("  hevc_nvenc: {}", yes_no(report.hevc_nvenc_encoder));
    println!("  hevc_qsv:   {}", yes_no(report.hevc_qsv_encoder));
    println!("  libx265:    {}", yes_no(report.libx265_encoder));

    println!(
        "\nUsable encoders: {}",
        family_names(&report.available_encoders())
    );
    println!("Encoder chain:   {}", family_names(&encoder_chain));
    if !intent.use_gpu {
        println!("(GPU disabled by config/flags; plans will use x265)");
    }
    Ok(())
}

fn family_names(families: &[EncoderFamily]) -> String {
    families
        .iter()
        .map(|f| f.display_name())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn print_stats() -> Result<()> {
    let stats = GateStats::load()?;

    println!("Gated:      {}", stats.total_gated());
    println!("Accepted:   {}", stats.accepted);
    println!("  unverified quality: {}", stats.unverified);
    println!("Reverted:   {}", stats.reverted);
    println!("Originals:  {}", format_bytes(stats.original_bytes));
    println!("Kept:       {}", format_bytes(stats.kept_bytes));
    println!("Space:      {}", stats.format_space_saved());
    if stats.total_gated() > 0 {
        println!(
            "Acceptance: {}",
            format_percent(stats.accepted as f64 / stats.total_gated() as f64 * 100.0)
        );
    }
    if let Some(updated) = &stats.last_updated {
        println!("Updated:    {}", updated);
    }
    Ok(())
}

fn init_config() -> Result<()> {
    let config_path = Config::config_path()?;

    if Config::exists() {
        println!("Config file: {}", config_path.display());
        let config = Config::load()?;
        print!("{}", toml::to_string_pretty(&config)?);
        if let Err(e) = config.intent() {
            println!("\nWarning: {}", e);
        }
    } else {
        Config::ensure_default()?;
        println!("Created default config: {}", config_path.display());
    }

    Ok(())
}
