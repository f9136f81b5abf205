//! Congestion CLI - query Seoul subway congestion CSV exports
//!
//! # Commands
//!
//! ```bash
//! congestion info                          # Load summary and source metadata
//! congestion values line                   # Distinct values of a column
//! congestion summary --line 2호선          # Headline numbers for a selection
//! congestion time-stats --from 07:00 --to 09:00
//! congestion stations --limit 10           # Most congested station/directions
//! congestion compare "강남 (2호선)" "서울역 (1호선)"
//! congestion heatmap --line 2호선 --sort max -o heatmap.csv
//! congestion quality --threshold 170       # Data-quality report
//! congestion export --display -o out.csv   # Filtered rows as CSV
//! ```
//!
//! `--data <path>` overrides the CSV path (default from `CONGESTION_DATA_PATH`
//! or the bundled export name). `--json` prints JSON instead of text.

use clap::{Args, Parser, Subcommand};
use congestion::analysis::{line_quality, station_options};
use congestion::config::DEFAULT_OUTLIER_THRESHOLD;
use congestion::logging::init_logging;
use congestion::query::get_stations_by_lines;
use congestion::{
    compare_stations, get_unique_values, outliers, station_stats, summarize, time_slot_stats,
    Column, Config, DatasetCache, FilterConfig, FilterError, Heatmap, HeatmapSort,
    ObservationLayout, QualityReport, StationRef, Table, TimeRange, TimeSlot,
};
use serde::Serialize;
use serde_json::json;
use std::error::Error;
use std::path::{Path, PathBuf};

type CmdResult = Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "congestion")]
#[command(about = "Query Seoul subway congestion CSV exports", long_about = None)]
struct Cli {
    /// CSV export to load
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Row filters shared by the query commands. Omitted flags do not constrain.
#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Day type (평일, 토요일, 일요일)
    #[arg(long)]
    day_type: Option<String>,

    /// Line, repeatable
    #[arg(long = "line")]
    lines: Vec<String>,

    /// Station name, repeatable
    #[arg(long = "station")]
    stations: Vec<String>,

    /// Direction, repeatable
    #[arg(long = "direction")]
    directions: Vec<String>,

    /// First time slot (HH:MM, inclusive)
    #[arg(long)]
    from: Option<TimeSlot>,

    /// Last time slot (HH:MM, inclusive)
    #[arg(long)]
    to: Option<TimeSlot>,

    /// Minimum congestion (%)
    #[arg(long)]
    min: Option<f64>,

    /// Maximum congestion (%)
    #[arg(long)]
    max: Option<f64>,
}

impl FilterArgs {
    fn to_config(&self) -> Result<FilterConfig, FilterError> {
        let mut config = FilterConfig::new()
            .lines(&self.lines)
            .stations(&self.stations)
            .directions(&self.directions);

        if let Some(day_type) = &self.day_type {
            config = config.day_type(day_type);
        }
        if self.from.is_some() || self.to.is_some() {
            config = config.time_range(TimeRange::new(
                self.from.unwrap_or(TimeSlot::FIRST),
                self.to.unwrap_or(TimeSlot::LAST),
            ));
        }
        if self.min.is_some() || self.max.is_some() {
            config = config.congestion_range(
                self.min.unwrap_or(f64::NEG_INFINITY),
                self.max.unwrap_or(f64::INFINITY),
            )?;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load the export and show source metadata
    Info,

    /// List the distinct values of a column
    Values {
        /// Column name (day_type, line, station_id, station, direction, time_slot, congestion)
        column: Column,

        /// Only rows of this line, repeatable
        #[arg(long = "line")]
        lines: Vec<String>,
    },

    /// Headline numbers for a selection
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Count, mean, max and min per time slot
    TimeStats {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Station/direction pairs ranked by maximum congestion
    Stations {
        #[command(flatten)]
        filters: FilterArgs,

        /// Number of rows to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Compare stations given as "station (line)"
    Compare {
        /// Stations to compare
        #[arg(required = true)]
        stations: Vec<StationRef>,

        /// Day type (평일, 토요일, 일요일)
        #[arg(long)]
        day_type: Option<String>,
    },

    /// Station × time-slot heatmap of mean congestion
    Heatmap {
        #[command(flatten)]
        filters: FilterArgs,

        /// Row order: name, max, mean, or an HH:MM slot
        #[arg(long, default_value = "name")]
        sort: HeatmapSort,

        /// Write the pivot as CSV instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Data-quality report over the whole export
    Quality {
        /// Outlier threshold (%)
        #[arg(long, default_value_t = DEFAULT_OUTLIER_THRESHOLD)]
        threshold: f64,

        /// Outlier rows to show
        #[arg(long, default_value = "50")]
        limit: usize,

        /// Write all outliers as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the filtered rows as UTF-8 CSV with BOM
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Use Korean display headers and rounded values
        #[arg(long)]
        display: bool,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::from_env().with_data_path(cli.data);
    let cache = DatasetCache::with_default_path(&config.data_path);
    let json = cli.json;

    let result = match cli.command {
        Commands::Info => cmd_info(&cache, json),
        Commands::Values { column, lines } => cmd_values(&cache, column, &lines, json),
        Commands::Summary { filters } => cmd_summary(&cache, &filters, json),
        Commands::TimeStats { filters } => cmd_time_stats(&cache, &filters, json),
        Commands::Stations { filters, limit } => cmd_stations(&cache, &filters, limit, json),
        Commands::Compare { stations, day_type } => {
            cmd_compare(&cache, &stations, day_type.as_deref(), json)
        }
        Commands::Heatmap {
            filters,
            sort,
            output,
        } => cmd_heatmap(&cache, &filters, sort, output.as_deref(), json),
        Commands::Quality {
            threshold,
            limit,
            output,
        } => cmd_quality(&cache, threshold, limit, output.as_deref(), json),
        Commands::Export {
            filters,
            display,
            output,
        } => cmd_export(&cache, &filters, display, &output),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_info(cache: &DatasetCache, json: bool) -> CmdResult {
    let dataset = cache.get_default()?;
    let source = dataset.source();
    let observations = dataset.observations();
    let lines = get_unique_values(observations, Column::Line);
    let stations = get_stations_by_lines(observations, lines.iter().map(String::as_str));

    if json {
        return print_json(&json!({
            "source": source,
            "rows": dataset.len(),
            "lines": lines,
            "stations": stations.len(),
            "time_slots": get_unique_values(observations, Column::TimeSlot),
        }));
    }

    eprintln!("📄 Loaded: {}", cache.default_path().display());
    println!("Encoding:      {}", source.encoding);
    println!("Wide rows:     {}", source.wide_rows);
    println!("Time columns:  {}", source.time_columns);
    println!("Rows:          {}", dataset.len());
    println!("Dropped cells: {}", source.dropped_cells);
    if !source.skipped_headers.is_empty() {
        println!("Skipped:       {}", source.skipped_headers.join(", "));
    }
    println!("Lines:         {}", lines.join(", "));
    println!("Stations:      {}", stations.len());
    Ok(())
}

fn cmd_values(cache: &DatasetCache, column: Column, lines: &[String], json: bool) -> CmdResult {
    let dataset = cache.get_default()?;
    let rows = FilterConfig::new().lines(lines).apply(dataset.observations());
    let values = get_unique_values(&rows, column);

    if json {
        return print_json(&values);
    }
    eprintln!("🔎 {} distinct values of '{}'", values.len(), column);
    for value in values {
        println!("{}", value);
    }
    Ok(())
}

fn cmd_summary(cache: &DatasetCache, filters: &FilterArgs, json: bool) -> CmdResult {
    let dataset = cache.get_default()?;
    let rows = filters.to_config()?.apply(dataset.observations());

    let Some(summary) = summarize(&rows) else {
        eprintln!("⚠️  No rows match the filters.");
        return Ok(());
    };
    if json {
        return print_json(&summary);
    }

    let max = &summary.max;
    println!("Rows:          {}", summary.rows);
    println!("Mean:          {:.1}%", summary.mean);
    println!(
        "Max:           {:.1}% ({} {} {} {})",
        max.congestion, max.line, max.station, max.direction, max.time_slot
    );
    println!(
        "Peak slot:     {} ({:.1}%)",
        summary.peak_time_slot, summary.peak_time_mean
    );
    println!(
        "Coverage:      {} lines, {} stations, {} directions, {} slots",
        summary.lines, summary.stations, summary.directions, summary.time_slots
    );
    Ok(())
}

fn cmd_time_stats(cache: &DatasetCache, filters: &FilterArgs, json: bool) -> CmdResult {
    let dataset = cache.get_default()?;
    let rows = filters.to_config()?.apply(dataset.observations());
    let stats = time_slot_stats(&rows);

    if json {
        return print_json(&stats);
    }
    println!("{:<6} {:>7} {:>8} {:>8} {:>8}", "slot", "rows", "mean", "max", "min");
    for s in &stats {
        println!(
            "{:<6} {:>7} {:>8.1} {:>8.1} {:>8.1}",
            s.time_slot, s.count, s.mean, s.max, s.min
        );
    }
    Ok(())
}

fn cmd_stations(cache: &DatasetCache, filters: &FilterArgs, limit: usize, json: bool) -> CmdResult {
    let dataset = cache.get_default()?;
    let rows = filters.to_config()?.apply(dataset.observations());
    let stats: Vec<_> = station_stats(&rows).into_iter().take(limit).collect();

    if json {
        return print_json(&stats);
    }
    for s in &stats {
        println!(
            "{} {} {}: max {:.1}% at {}, mean {:.1}%",
            s.line, s.station, s.direction, s.max, s.peak_time_slot, s.mean
        );
    }
    Ok(())
}

fn cmd_compare(
    cache: &DatasetCache,
    stations: &[StationRef],
    day_type: Option<&str>,
    json: bool,
) -> CmdResult {
    let dataset = cache.get_default()?;
    let mut config = FilterConfig::new();
    if let Some(day_type) = day_type {
        config = config.day_type(day_type);
    }
    let rows = config.apply(dataset.observations());
    let profiles = compare_stations(&rows, stations);

    if profiles.is_empty() {
        let known: Vec<String> = station_options(&rows)
            .iter()
            .take(5)
            .map(ToString::to_string)
            .collect();
        return Err(format!(
            "None of the stations have data (expected e.g. {})",
            known.join(", ")
        )
        .into());
    }
    if json {
        return print_json(&profiles);
    }
    for p in &profiles {
        println!(
            "{}: {} rows, mean {:.1}%, max {:.1}%, peak {}",
            p.label, p.rows, p.mean, p.max, p.peak_time_slot
        );
    }
    Ok(())
}

fn cmd_heatmap(
    cache: &DatasetCache,
    filters: &FilterArgs,
    sort: HeatmapSort,
    output: Option<&Path>,
    json: bool,
) -> CmdResult {
    let dataset = cache.get_default()?;
    let rows = filters.to_config()?.apply(dataset.observations());
    let heatmap = Heatmap::build(&rows, sort);

    if let Some(path) = output {
        heatmap.to_table().write_csv(path)?;
        eprintln!("💾 Heatmap written to: {}", path.display());
        return Ok(());
    }
    if json {
        return print_json(&heatmap);
    }

    eprintln!(
        "🗺️  {} stations × {} slots (sorted by {})",
        heatmap.stations.len(),
        heatmap.time_slots.len(),
        sort
    );
    if let Some((station, slot, value)) = heatmap.max_cell() {
        println!("Highest: {} {} ({:.1}%)", station, slot, value);
    }
    if let Some((station, slot, value)) = heatmap.min_positive_cell() {
        println!("Lowest:  {} {} ({:.1}%)", station, slot, value);
    }
    for row in heatmap.row_stats() {
        println!(
            "{}: mean {:.1}%, max {:.1}% at {}",
            row.station, row.mean, row.max, row.peak_time_slot
        );
    }
    Ok(())
}

fn cmd_quality(
    cache: &DatasetCache,
    threshold: f64,
    limit: usize,
    output: Option<&Path>,
    json: bool,
) -> CmdResult {
    let dataset = cache.get_default()?;
    let report = QualityReport::build(&dataset);
    let flagged = outliers(dataset.observations(), threshold);

    if let Some(path) = output {
        Table::from_observations(&flagged, ObservationLayout::Display).write_csv(path)?;
        eprintln!("💾 {} outliers written to: {}", flagged.len(), path.display());
    }
    if json {
        return print_json(&json!({
            "report": report,
            "threshold": threshold,
            "outliers": flagged.iter().take(limit).collect::<Vec<_>>(),
            "outlier_count": flagged.len(),
        }));
    }

    println!(
        "Quality score: {:.1}/100 ({})",
        report.score,
        report.status.label()
    );
    println!("Rows:          {}", report.total_rows);
    println!(
        "Missing:       {} ({:.2}%)",
        report.missing_count, report.missing_ratio
    );
    println!("Zero values:   {} ({:.2}%)", report.zero_count, report.zero_ratio);
    println!("150%+:         {} ({:.2}%)", report.high_count, report.high_ratio);
    println!(
        "200%+:         {} ({:.2}%)",
        report.extreme_count, report.extreme_ratio
    );

    if let Some(stats) = &report.stats {
        println!(
            "Distribution:  mean {:.1}, median {:.1}, std {:.1}, q25 {:.1}, q75 {:.1}",
            stats.mean, stats.median, stats.std, stats.q25, stats.q75
        );
    }
    println!("\nLevels:");
    for share in &report.levels {
        println!("  {:<16} {:>8} ({:.1}%)", share.level.label(), share.count, share.ratio);
    }
    println!("\nLines:");
    for line in line_quality(dataset.observations()) {
        println!(
            "  {:<8} {:>4} stations {:>7} rows  mean {:>6.1}  max {:>6.1}  zero {:.2}%",
            line.line,
            line.stations,
            line.rows,
            line.mean,
            line.max,
            line.zero_ratio
        );
    }

    println!("\nOutliers ≥ {}%: {}", threshold, flagged.len());
    for o in flagged.iter().take(limit) {
        println!(
            "  {} {} {} {}: {:.1}%",
            o.line, o.station, o.direction, o.time_slot, o.congestion
        );
    }
    Ok(())
}

fn cmd_export(cache: &DatasetCache, filters: &FilterArgs, display: bool, output: &Path) -> CmdResult {
    let dataset = cache.get_default()?;
    let rows = filters.to_config()?.apply(dataset.observations());
    let layout = if display {
        ObservationLayout::Display
    } else {
        ObservationLayout::Internal
    };

    let table = Table::from_observations(&rows, layout);
    table.write_csv(output)?;
    eprintln!("💾 {} rows written to: {}", table.len(), output.display());
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_args_open_ended_ranges() {
        let args = FilterArgs {
            from: Some("22:00".parse().unwrap()),
            min: Some(100.0),
            lines: vec!["2호선".to_string()],
            ..FilterArgs::default()
        };
        let config = args.to_config().unwrap();

        let range = config.time_range.unwrap();
        assert_eq!(range.start.label(), "22:00");
        assert_eq!(range.end, TimeSlot::LAST);
        assert_eq!(config.congestion_range, Some((100.0, f64::INFINITY)));
        assert!(config.lines.contains("2호선"));
    }

    #[test]
    fn test_filter_args_empty_is_unconstrained() {
        assert!(FilterArgs::default().to_config().unwrap().is_unconstrained());
    }

    #[test]
    fn test_filter_args_reversed_range_rejected() {
        let args = FilterArgs {
            min: Some(50.0),
            max: Some(10.0),
            ..FilterArgs::default()
        };
        assert!(args.to_config().is_err());
    }

    #[test]
    fn test_cli_parses_repeatable_filters() {
        let cli = Cli::parse_from([
            "congestion",
            "--data",
            "x.csv",
            "summary",
            "--line",
            "1호선",
            "--line",
            "2호선",
            "--from",
            "07:00",
        ]);
        assert_eq!(cli.data, Some(PathBuf::from("x.csv")));
        match cli.command {
            Commands::Summary { filters } => {
                assert_eq!(filters.lines, vec!["1호선", "2호선"]);
                assert_eq!(filters.from.map(|s| s.label()), Some("07:00"));
            }
            _ => panic!("expected summary"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_slot() {
        let result = Cli::try_parse_from(["congestion", "summary", "--from", "04:00"]);
        assert!(result.is_err());
    }
}
