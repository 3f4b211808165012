use crate::curate::{
    strategy::parse_flank_distance, BlockMode, FilterParams, ResolveParams, Strategy,
};
use chrono::Datelike;
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

type ArgResult<T> = std::result::Result<T, String>;

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="trbait",
          author="trbait developers",
          version=&**FULL_VERSION,
          long_about = None,
          disable_help_subcommand = true,
          after_help = format!("Copyright (C) 2018-{}     trbait developers
This program comes with ABSOLUTELY NO WARRANTY.", chrono::Utc::now().year()),
          help_template = "{name} {version}\n{author}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Create an empty bait database")]
    Init(InitArgs),
    #[clap(about = "Apply quality filters to loci and candidate regions")]
    Filter(FilterArgs),
    #[clap(about = "Resolve overlapping candidate regions")]
    Resolve(ResolveArgs),
    #[clap(about = "Report database counts")]
    Stats(StatsArgs),
    #[clap(about = "Write passing candidate regions as FASTA")]
    Export(ExportArgs),
    #[clap(about = "Validate a GFF3 annotation file")]
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("init")))]
#[command(arg_required_else_help(true))]
pub struct InitArgs {
    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "db")]
    #[clap(help = "Path of the database to create (existing tables are replaced)")]
    #[clap(value_name = "DB")]
    #[arg(value_parser = check_prefix_path)]
    pub db_path: PathBuf,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("filter")))]
#[command(arg_required_else_help(true))]
pub struct FilterArgs {
    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "db")]
    #[clap(help = "Bait database")]
    #[clap(value_name = "DB")]
    #[arg(value_parser = check_file_exists)]
    pub db_path: PathBuf,

    #[clap(help_heading("Loci"))]
    #[clap(long = "min-locus-len")]
    #[clap(value_name = "LEN")]
    #[clap(help = "Minimum consensus length of a locus")]
    #[arg(value_parser = non_negative)]
    pub min_locus_len: Option<i64>,

    #[clap(help_heading("Loci"))]
    #[clap(long = "min-depth")]
    #[clap(value_name = "DEPTH")]
    #[clap(help = "Minimum read depth of a locus")]
    #[arg(value_parser = non_negative)]
    pub min_depth: Option<i64>,

    #[clap(help_heading("Regions"))]
    #[clap(long = "min-len")]
    #[clap(value_name = "LEN")]
    #[clap(help = "Minimum candidate region length")]
    #[arg(value_parser = non_negative)]
    pub min_region_len: Option<i64>,

    #[clap(help_heading("Regions"))]
    #[clap(long = "max-len")]
    #[clap(value_name = "LEN")]
    #[clap(help = "Maximum candidate region length")]
    #[arg(value_parser = non_negative)]
    pub max_region_len: Option<i64>,

    #[clap(help_heading("Regions"))]
    #[clap(long = "min-snps")]
    #[clap(value_name = "COUNT")]
    #[clap(help = "Minimum number of flanking SNP columns")]
    #[arg(value_parser = non_negative)]
    pub min_flank_snps: Option<i64>,

    #[clap(help_heading("Regions"))]
    #[clap(long = "max-snps")]
    #[clap(value_name = "COUNT")]
    #[clap(help = "Maximum number of flanking SNP columns")]
    #[arg(value_parser = non_negative)]
    pub max_flank_snps: Option<i64>,

    #[clap(help_heading("Regions"))]
    #[clap(long = "flank-dist")]
    #[clap(value_name = "DIST")]
    #[clap(help = "Distance around a region in which flanking variants are counted")]
    #[clap(default_value = "100")]
    #[arg(value_parser = non_negative)]
    pub flank_dist: i64,

    #[clap(help_heading("Regions"))]
    #[clap(long = "subsample")]
    #[clap(value_name = "COUNT")]
    #[clap(help = "Randomly keep at most this many passing regions")]
    pub subsample: Option<usize>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "seed")]
    #[clap(value_name = "SEED")]
    #[clap(help = "Seed for random subsampling")]
    pub seed: Option<u64>,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("resolve")))]
#[command(arg_required_else_help(true))]
pub struct ResolveArgs {
    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "db")]
    #[clap(help = "Bait database")]
    #[clap(value_name = "DB")]
    #[arg(value_parser = check_file_exists)]
    pub db_path: PathBuf,

    #[clap(long = "dist")]
    #[clap(value_name = "DIST")]
    #[clap(help = "Regions closer than this distance conflict")]
    #[clap(default_value = "0")]
    #[arg(value_parser = non_negative)]
    pub dist: i64,

    #[clap(short = 's')]
    #[clap(long = "strategy")]
    #[clap(value_name = "STRATEGY")]
    #[clap(help = "Tie-break strategies applied in order (snp, bad, var, min-snp)")]
    #[clap(value_delimiter = ',')]
    #[clap(default_value = "snp")]
    pub strategies: Vec<Strategy>,

    #[clap(long = "flank-dist")]
    #[clap(value_name = "DIST")]
    #[clap(help = "Distance around a region in which flanking variants are counted")]
    #[clap(default_value = "100")]
    #[arg(value_parser = flank_distance)]
    pub flank_dist: i64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "per-locus")]
    #[clap(help = "Treat every locus as a single conflict block")]
    pub per_locus: bool,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "whole-locus-len")]
    #[clap(value_name = "LEN")]
    #[clap(help = "Loci up to this length form a single conflict block")]
    #[arg(value_parser = non_negative)]
    pub whole_locus_len: Option<i64>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "seed")]
    #[clap(value_name = "SEED")]
    #[clap(help = "Seed for the random tie-break")]
    pub seed: Option<u64>,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("stats")))]
#[command(arg_required_else_help(true))]
pub struct StatsArgs {
    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "db")]
    #[clap(help = "Bait database")]
    #[clap(value_name = "DB")]
    #[arg(value_parser = check_file_exists)]
    pub db_path: PathBuf,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("export")))]
#[command(arg_required_else_help(true))]
pub struct ExportArgs {
    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "db")]
    #[clap(help = "Bait database")]
    #[clap(value_name = "DB")]
    #[arg(value_parser = check_file_exists)]
    pub db_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Output FASTA path (gzip-compressed if it ends in .gz)")]
    #[clap(value_name = "FASTA")]
    #[arg(value_parser = check_prefix_path)]
    pub output_path: PathBuf,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("validate")))]
#[command(arg_required_else_help(true))]
pub struct ValidateArgs {
    #[clap(required = true)]
    #[clap(short = 'g')]
    #[clap(long = "gff")]
    #[clap(help = "GFF3 annotation file")]
    #[clap(value_name = "GFF")]
    #[arg(value_parser = check_file_exists)]
    pub gff_path: PathBuf,
}

impl From<&FilterArgs> for FilterParams {
    fn from(args: &FilterArgs) -> Self {
        FilterParams {
            min_locus_len: args.min_locus_len,
            min_depth: args.min_depth,
            min_region_len: args.min_region_len,
            max_region_len: args.max_region_len,
            min_flank_snps: args.min_flank_snps,
            max_flank_snps: args.max_flank_snps,
            flank_dist: args.flank_dist,
            subsample: args.subsample,
        }
    }
}

impl From<&ResolveArgs> for ResolveParams {
    fn from(args: &ResolveArgs) -> Self {
        let block_mode = if args.per_locus {
            BlockMode::PerLocus
        } else {
            BlockMode::Adjacent {
                distance: args.dist,
                whole_locus_max_len: args.whole_locus_len,
            }
        };
        ResolveParams {
            block_mode,
            strategies: args.strategies.clone(),
            flank_dist: args.flank_dist,
        }
    }
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> ArgResult<PathBuf> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(path.to_path_buf())
}

fn check_file_exists(s: &str) -> ArgResult<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn non_negative(s: &str) -> ArgResult<i64> {
    let value: i64 = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid integer", s))?;
    if value < 0 {
        Err(format!("Value cannot be negative, got {}", value))
    } else {
        Ok(value)
    }
}

fn flank_distance(s: &str) -> ArgResult<i64> {
    parse_flank_distance(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_args_to_params() {
        let cli = Cli::try_parse_from([
            "trbait",
            "resolve",
            "--db",
            "Cargo.toml",
            "--dist",
            "5",
            "--strategy",
            "snp,bad,var",
            "--flank-dist",
            "50",
        ])
        .unwrap();
        let Command::Resolve(args) = cli.command else {
            panic!("expected resolve command");
        };
        let params = ResolveParams::from(&args);
        assert_eq!(
            params.strategies,
            vec![Strategy::MaxSnp, Strategy::MinBad, Strategy::MinVariants]
        );
        assert_eq!(params.flank_dist, 50);
        assert_eq!(params.block_mode, BlockMode::adjacent(5));
    }

    #[test]
    fn test_resolve_rejects_fractional_flank() {
        let result = Cli::try_parse_from([
            "trbait",
            "resolve",
            "--db",
            "Cargo.toml",
            "--flank-dist",
            "2.5",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_per_locus_flag() {
        let cli =
            Cli::try_parse_from(["trbait", "resolve", "--db", "Cargo.toml", "--per-locus"])
                .unwrap();
        let Command::Resolve(args) = cli.command else {
            panic!("expected resolve command");
        };
        assert_eq!(ResolveParams::from(&args).block_mode, BlockMode::PerLocus);
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative("12"), Ok(12));
        assert!(non_negative("-1").is_err());
        assert!(non_negative("x").is_err());
    }
}
