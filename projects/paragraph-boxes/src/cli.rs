use crate::config::Strategy;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Log level used when RUST_LOG is not set
    #[arg(long, short = 'l', default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Cut page images into one image per paragraph
    Paragraphs(ParagraphsArgs),

    /// Report how many text columns each page has
    Columns(ColumnsArgs),

    /// Write the default configuration as JSON
    InitConfig {
        /// Destination file
        path: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
pub struct ParagraphsArgs {
    /// Image file or directory of page images
    pub input: PathBuf,

    /// Directory for paragraph images and run manifests
    #[arg(long, short = 'o', env = "PARAGRAPH_BOXES_OUTPUT", default_value = "paragraphs")]
    pub output: PathBuf,

    /// Layout configuration (JSON)
    #[arg(long, short = 'c', env = "PARAGRAPH_BOXES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the configured segmentation strategy
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Worker threads (default: available parallelism)
    #[arg(long, short = 'j', env = "PARAGRAPH_BOXES_WORKERS")]
    pub workers: Option<usize>,

    /// Report boxes without writing paragraph images
    #[arg(long)]
    pub no_save: bool,

    /// Write every density profile next to the paragraph images
    #[arg(long, conflicts_with = "no_save")]
    pub dump_profiles: bool,
}

#[derive(clap::Args, Debug)]
pub struct ColumnsArgs {
    /// Image file or directory of page images
    pub input: PathBuf,

    /// Layout configuration (JSON)
    #[arg(long, short = 'c', env = "PARAGRAPH_BOXES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Worker threads (default: available parallelism)
    #[arg(long, short = 'j', env = "PARAGRAPH_BOXES_WORKERS")]
    pub workers: Option<usize>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyArg {
    Projection,
    Components,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Projection => Strategy::Projection,
            StrategyArg::Components => Strategy::Components,
        }
    }
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_paragraphs_flags() {
        let args = Args::try_parse_from([
            "paragraph-boxes",
            "paragraphs",
            "scans",
            "--output",
            "out",
            "--strategy",
            "projection",
            "-j",
            "2",
            "--no-save",
        ])
        .unwrap();
        let Command::Paragraphs(p) = args.command else {
            panic!("expected paragraphs subcommand");
        };
        assert_eq!(p.input, PathBuf::from("scans"));
        assert_eq!(p.output, PathBuf::from("out"));
        assert_eq!(p.strategy.map(Strategy::from), Some(Strategy::Projection));
        assert_eq!(p.workers, Some(2));
        assert!(p.no_save);
        assert!(!p.dump_profiles);
    }

    #[test]
    fn test_profiles_need_saved_output() {
        let err = Args::try_parse_from([
            "paragraph-boxes",
            "paragraphs",
            "scans",
            "--no-save",
            "--dump-profiles",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_init_config_takes_path() {
        let args = Args::try_parse_from(["paragraph-boxes", "init-config", "layout.json"]).unwrap();
        assert!(matches!(args.command, Command::InitConfig { ref path } if path == &PathBuf::from("layout.json")));
    }
}
