use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs;
use std::path::PathBuf;

use photomatch::export::{
    write_asset_listing, write_json_report, write_matched_csv, write_unmatched_csv, MATCHED_FILE,
    UNMATCHED_FILE,
};
use photomatch::ingest::{read_assets_path, read_roster_path};
use photomatch::{assign_with_progress, MatchConfig, MatchResult, SlotMap, DEFAULT_THRESHOLD};

const DEFAULT_OUT_DIR: &str = "output";

#[derive(Parser, Debug)]
#[command(
    name = "photomatch",
    version,
    about = "Match a people roster against labeled photo files"
)]
struct Cli {
    /// Roster CSV (display_name or surname/given_name/patronymic, plus external_id)
    #[arg(long)]
    roster: PathBuf,

    /// Photo list: `.csv` with display_name,asset_id or a `:::` listing file
    #[arg(long)]
    assets: PathBuf,

    /// Directory receiving matched.csv and unmatched.csv
    #[arg(long, default_value = DEFAULT_OUT_DIR)]
    out_dir: PathBuf,

    /// Ratio under which the previous person's name is tried as well
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Do not fall back to the previous person's name for weak matches
    #[arg(long, action = ArgAction::SetTrue)]
    no_previous_fallback: bool,

    /// Also write the full report as JSON
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Save the photo list in the `:::` listing format for later runs
    #[arg(long)]
    save_listing: Option<PathBuf>,

    /// Debug logs to <out-dir>/photomatch.log
    #[arg(long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Explicit log file path (enables file logging)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn match_config(&self) -> MatchConfig {
        MatchConfig {
            acceptance_threshold: self.threshold,
            previous_name_fallback: !self.no_previous_fallback,
        }
    }
}

fn init_logging(cli: &Cli) {
    let log_path = match (&cli.log_file, cli.debug) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(cli.out_dir.join("photomatch.log")),
        (None, false) => None,
    };
    let Some(log_path) = log_path else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        return;
    };
    if let Some(parent) = log_path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match fs::File::create(&log_path) {
        Ok(file) => {
            let cfg = ConfigBuilder::new()
                .set_time_format_rfc3339()
                .set_target_level(LevelFilter::Off)
                .build();
            if let Err(e) = WriteLogger::init(LevelFilter::Debug, cfg, file) {
                eprintln!("[warn] file logger init failed: {e}");
            } else {
                println!("[debug] logs → {:?}", log_path);
            }
        }
        Err(e) => {
            eprintln!("[warn] cannot create log file {:?}: {e}", log_path);
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .init();
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if !(0.0..=1.0).contains(&cli.threshold) {
        return Err(anyhow!("Threshold must be within [0, 1], got {}", cli.threshold));
    }
    let config = cli.match_config();
    debug!("config: {:?}", config);

    let roster = read_roster_path(&cli.roster)?;
    let assets = read_assets_path(&cli.assets)?;
    println!("Found {} photos", assets.accepted.len());
    println!("Found {} people", roster.accepted.len());
    if !roster.rejected.is_empty() || !assets.rejected.is_empty() {
        warn!(
            "rejected {} roster rows and {} photo rows",
            roster.rejected.len(),
            assets.rejected.len()
        );
    }
    if let Some(path) = &cli.save_listing {
        write_asset_listing(path, &assets.accepted)?;
        info!("photo listing saved to {:?}", path);
    }

    let slots = SlotMap::from_assets(&assets.accepted);
    println!("Found {} unique photo names", slots.len());

    let pb = ProgressBar::new(roster.accepted.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?,
    );
    let report = assign_with_progress(
        roster.accepted,
        &assets.accepted,
        slots,
        &config,
        |person, outcome| {
            if let MatchResult::SlotTaken(asset) = outcome {
                pb.set_message(format!(
                    "{} lost {:?}",
                    person.external_id(),
                    asset.normalized_name()
                ));
            }
            pb.inc(1);
        },
    );
    pb.finish_with_message("Done");

    let matched_path = cli.out_dir.join(MATCHED_FILE);
    let unmatched_path = cli.out_dir.join(UNMATCHED_FILE);
    write_matched_csv(&matched_path, &report)?;
    write_unmatched_csv(&unmatched_path, &report)?;
    if let Some(path) = &cli.report_json {
        write_json_report(path, &report, &roster.rejected, &assets.rejected)?;
    }

    let total_photos = report.slot_count();
    let total_people = report.matched_count() + report.unmatched_people_count();
    println!(
        "Photos without a person: {}. Total photo names: {}. Matched: {}",
        report.unmatched_asset_count(),
        total_photos,
        total_photos - report.unmatched_asset_count()
    );
    println!(
        "People without a photo: {}. Total people: {}. Matched: {}",
        report.unmatched_people_count(),
        total_people,
        report.matched_count()
    );
    println!(
        "Rejected rows: roster {}, photos {}",
        roster.rejected.len(),
        assets.rejected.len()
    );
    println!(
        "Done ({:.1}% matched). Results in {:?}.",
        report.match_rate() * 100.0,
        cli.out_dir
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);
    run(cli)
}
