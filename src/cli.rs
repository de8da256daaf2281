use crate::utils::Result as SvgtResult;
use clap::{ArgAction, Parser};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(name = "svgt",
          version,
          about = "Re-genotypes structural variant records using allele-balance clustering and Bayesian calling",
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}")]
pub struct Cli {
    #[clap(short = 'i')]
    #[clap(long = "input")]
    #[clap(help = "Input VCF file (plain or gzipped); reads standard input when omitted")]
    #[clap(value_name = "VCF")]
    #[arg(value_parser = check_file_exists)]
    pub input: Option<PathBuf>,

    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Output VCF file; writes standard output when omitted")]
    #[clap(value_name = "VCF")]
    pub output: Option<PathBuf>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "seed")]
    #[clap(value_name = "SEED")]
    #[clap(help = "Seed for the mixture-model initialization, fixed once per run")]
    #[clap(default_value = "42")]
    pub seed: u64,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
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

fn check_file_exists(s: &str) -> SvgtResult<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(crate::utils::SvgtError::Io(format!(
            "File does not exist: {}",
            path.display()
        )))
    } else {
        Ok(path.to_path_buf())
    }
}
