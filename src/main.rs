//! Nordic training data CLI
//!
//! Imports cross-country race history and assembles training matrices from it.

use clap::{Parser, Subcommand};
use nordic::{Config, Result};

#[derive(Parser)]
#[command(name = "nordic")]
#[command(about = "Training data assembly from cross-country race history", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Assemble a training matrix with a collection scheme
    Collect {
        /// Scheme name (built-in or from config)
        #[arg(long, default_value = "distance-top10")]
        scheme: String,
        /// Output CSV (defaults to <output_dir>/<scheme>.csv)
        #[arg(long)]
        out: Option<String>,
        /// Stop after this many rows
        #[arg(long)]
        limit: Option<usize>,
        /// Override the history scan budget
        #[arg(long)]
        budget: Option<usize>,
    },
    /// Expand the features of a collected CSV into a polynomial basis
    Expand {
        /// Collected CSV file
        input: String,
        /// Override the expansion degree
        #[arg(long)]
        degree: Option<u32>,
        /// Output CSV (defaults to <input>.poly<degree>.csv)
        #[arg(long)]
        out: Option<String>,
    },
    /// Split a CSV into consecutive partitions
    Split {
        /// CSV file to split
        input: String,
        /// Comma-separated fractions, e.g. 0.6,0.2,0.2
        #[arg(long, value_delimiter = ',', default_value = "0.6,0.2,0.2")]
        fractions: Vec<f64>,
        /// Shuffle rows with this seed first
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List collection schemes
    Schemes {
        /// Print one scheme in full as TOML
        #[arg(long)]
        show: Option<String>,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Import a JSON race index and its result files
    Import {
        /// Index file (array of race rows, most recent first)
        index: String,
        /// Directory result file paths are relative to
        #[arg(long, default_value = ".")]
        base: String,
    },
    /// Show database status
    Status,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Data { action } => match action {
            DataCommands::Import { index, base } => commands::data_import(&config, &index, &base),
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Collect {
            scheme,
            out,
            limit,
            budget,
        } => commands::collect(&config, &scheme, out, limit, budget),
        Commands::Expand { input, degree, out } => commands::expand(&config, &input, degree, out),
        Commands::Split {
            input,
            fractions,
            seed,
        } => commands::split(&input, &fractions, seed),
        Commands::Schemes { show } => commands::schemes(&config, show.as_deref()),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use nordic::assembly::{self, CollectionOptions, BUILTIN_SCHEMES};
    use nordic::data::{export, import, Database};
    use nordic::matrix::{self, Matrix};
    use nordic::NordicError;
    use std::path::{Path, PathBuf};

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all(&config.data.output_dir)?;
        println!("Created data/ and {}/ directories", config.data.output_dir);

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'nordic data import data/racesIndex.json' to load race history");
        println!("  3. Run 'nordic schemes' to list collection schemes");
        println!("  4. Run 'nordic collect --scheme <name>' to build a training matrix");

        Ok(())
    }

    pub fn data_import(config: &Config, index: &str, base: &str) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let summary = import::import_index(&db, index, base)?;

        println!(
            "Imported {} races with {} results",
            summary.events, summary.results
        );
        if summary.skipped > 0 {
            println!("Skipped {} races (see log for details)", summary.skipped);
        }
        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:     {}", config.data.database_path);
        println!("  Races:    {}", stats.event_count);
        println!("  Results:  {}", stats.result_count);
        println!("  Athletes: {}", stats.athlete_count);
        if let (Some(earliest), Some(latest)) = (stats.earliest_event, stats.latest_event) {
            println!("  Range:    {} to {}", earliest, latest);
        }

        Ok(())
    }

    pub fn collect(
        config: &Config,
        scheme_name: &str,
        out: Option<String>,
        limit: Option<usize>,
        budget: Option<usize>,
    ) -> Result<()> {
        let scheme = config.scheme(scheme_name)?;
        let mut options = CollectionOptions::from(&config.collection);
        if let Some(limit) = limit {
            options.limit = Some(limit);
        }
        if let Some(budget) = budget {
            options.scan_budget = budget;
        }

        let db = Database::open(&config.data.database_path)?;
        let index = db.load_history()?;
        if index.is_empty() {
            return Err(NordicError::Config(
                "No races in database. Run 'nordic data import' first.".to_string(),
            ));
        }
        let results = db.load_results()?;

        let report = assembly::collect(&index, &results, &scheme, options)?;
        let out = out.map(PathBuf::from).unwrap_or_else(|| {
            Path::new(&config.data.output_dir).join(format!("{}.csv", scheme_name))
        });
        export::write_csv(
            &out,
            &report.to_matrix()?,
            &export::default_header(report.feature_width, report.response_width),
        )?;

        println!("Collection: {}", scheme_name);
        println!("───────────────────────────────");
        println!("  Results examined:   {}", report.examined);
        println!("  Rows emitted:       {}", report.rows.len());
        println!("  Ineligible:         {}", report.rejections.ineligible);
        println!("  Missing response:   {}", report.rejections.missing_response);
        for (i, count) in report.rejections.exhausted.iter().enumerate() {
            println!(
                "  Exhausted cat. {}:   {} ({:?})",
                i, count, scheme.categories[i].similarity
            );
        }
        println!("  Vectors evicted:    {}", report.evictions);
        println!("  Output:             {}", out.display());

        Ok(())
    }

    pub fn expand(
        config: &Config,
        input: &str,
        degree: Option<u32>,
        out: Option<String>,
    ) -> Result<()> {
        let degree = degree.unwrap_or(config.expansion.degree);
        let (header, data) = export::read_csv(input)?;
        let (features, response) = matrix::split_response(&data, config.expansion.response_width)?;
        let feature_names = &header[..features.cols()];

        let features = if config.expansion.normalize {
            let normalized = matrix::normalize(&features);
            let stats_path = format!("{}.norm.json", input);
            let stats = serde_json::json!({
                "columns": feature_names,
                "means": normalized.means,
                "stds": normalized.stds,
            });
            std::fs::write(&stats_path, serde_json::to_string_pretty(&stats)?)?;
            log::info!("Wrote normalization statistics to {}", stats_path);
            normalized.matrix
        } else {
            features
        };

        let expanded = matrix::expand_polynomial(&features, degree)?;
        let mut labels: Vec<String> = matrix::exponents(features.cols(), degree)?
            .iter()
            .map(|e| matrix::monomial_label(e, feature_names))
            .collect();
        labels.extend_from_slice(&header[features.cols()..]);

        let out = out.unwrap_or_else(|| {
            format!("{}.poly{}.csv", input.trim_end_matches(".csv"), degree)
        });
        export::write_csv(&out, &expanded.hstack(&response)?, &labels)?;

        println!(
            "Expanded {} features to {} monomials of degree <= {} ({} rows) -> {}",
            features.cols(),
            expanded.cols(),
            degree,
            expanded.rows(),
            out
        );
        Ok(())
    }

    pub fn split(input: &str, fractions: &[f64], seed: Option<u64>) -> Result<()> {
        let (header, data) = export::read_csv(input)?;
        let data: Matrix = match seed {
            Some(seed) => matrix::shuffle_rows(&data, seed),
            None => data,
        };

        let stem = input.trim_end_matches(".csv");
        for (i, part) in matrix::partition(&data, fractions)?.iter().enumerate() {
            let path = format!("{}.part{}.csv", stem, i);
            export::write_csv(&path, part, &header)?;
            println!("  {}: {} rows", path, part.rows());
        }
        Ok(())
    }

    pub fn schemes(config: &Config, show: Option<&str>) -> Result<()> {
        if let Some(name) = show {
            let scheme = config.scheme(name)?;
            let text = toml::to_string_pretty(&scheme)
                .map_err(|e| NordicError::Config(format!("Failed to serialize scheme: {}", e)))?;
            println!("# {}", name);
            print!("{}", text);
            return Ok(());
        }

        println!("Collection Schemes");
        println!("───────────────────────────────");
        let custom = config
            .schemes
            .keys()
            .map(String::as_str)
            .filter(|name| !BUILTIN_SCHEMES.contains(name));
        for name in BUILTIN_SCHEMES.iter().copied().chain(custom) {
            let scheme = config.scheme(name)?;
            let origin = if config.schemes.contains_key(name) {
                "config"
            } else {
                "built-in"
            };
            println!(
                "  {:<34} {:>3} features  [{}]",
                name,
                scheme.feature_width(),
                origin
            );
            if !scheme.description.is_empty() {
                println!("      {}", scheme.description);
            }
        }
        Ok(())
    }
}
