#[macro_use]
mod verbose;

mod analyzer;
mod cli;
mod config;
mod model;
mod ndjson;
mod report;

use std::time::Instant;

use anyhow::Context;

use crate::analyzer::GameAnalyzer;
use crate::report::PlayerReport;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = cli::parse()?;
    verbose::set(args.verbose);

    if args.help {
        cli::print_help();
        return Ok(());
    }
    if args.example {
        println!("{}", PlayerReport::example().to_json()?);
        return Ok(());
    }

    let user = args
        .user
        .clone()
        .context("--user is required (see --help)")?;
    let analyzer = GameAnalyzer::new(&user)?;
    let cfg = config::Config::load();
    vprintln!("config: {:?}", cfg);

    if let Some(n) = cfg.rayon_threads {
        let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
    }

    let t0 = Instant::now();
    let mut batch = ndjson::Batch::default();
    if args.inputs.is_empty() {
        vprintln!("input: stdin");
        batch = ndjson::read_stdin()?;
    } else {
        for path in &args.inputs {
            vprintln!("input: {}", path.display());
            batch.extend(ndjson::read_path(path)?);
        }
    }
    vprintln!(
        "input: {} games decoded, {} malformed lines, {:.3}s",
        batch.records.len(),
        batch.malformed,
        t0.elapsed().as_secs_f64()
    );

    let records = args.select(batch.records);
    vprintln!("filter: {} games selected", records.len());

    let t1 = Instant::now();
    let (summary, stats) = if args.parallel && records.len() >= cfg.parallel_threshold {
        vprintln!("analyze: parallel, batch_size={}", cfg.batch_size);
        analyzer.analyze_parallel(&records, cfg.batch_size)
    } else {
        analyzer.analyze_with_stats(&records)
    };
    vprintln!(
        "analyze: {} of {} games attributed, skipped {} missing player / {} not {} / {} provisional, {:.3}s",
        stats.attributed,
        stats.total(),
        stats.missing_player,
        stats.not_participant,
        analyzer.target(),
        stats.provisional,
        t1.elapsed().as_secs_f64()
    );

    let report = PlayerReport::from_summary(&user, &summary);
    if let Some(out) = args.out.as_deref() {
        report::write_csv(&report, out).with_context(|| format!("writing {}", out.display()))?;
        vprintln!("output: CSV written to {}", out.display());
    }
    println!("{}", report.to_json()?);
    Ok(())
}
