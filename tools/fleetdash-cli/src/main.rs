//! Fleetdash CLI: export fleet dashboard tables from the command line.
//!
//! Usage:
//!   fleetdash export <DATA.json> --format <id>   Export a dataset
//!   fleetdash formats                            List the export menu
//!   fleetdash config [--init]                    Show or write the config file

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fleetdash_export_model::{ColumnDescriptor, FormatId};

mod commands;

#[derive(Parser)]
#[command(
    name = "fleetdash",
    about = "Export fleet dashboard tables as spreadsheets, documents, and snapshots",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a JSON dataset
    Export {
        /// JSON array of records, or an object with a `data` array
        data: PathBuf,

        /// Output format: xlsx, pdf, doc, json, image, print
        #[arg(short, long)]
        format: FormatId,

        /// Column order and headers, e.g. `name:Vehicle,km:Odometer (km)`
        #[arg(long, value_delimiter = ',')]
        columns: Vec<ColumnDescriptor>,

        /// Filename base (defaults to the configured base plus today's date)
        #[arg(long)]
        filename: Option<String>,

        /// Output directory (defaults to the configured export directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rendered table image used by the `image` format
        #[arg(long)]
        surface: Option<PathBuf>,
    },

    /// List export formats as the export menu shows them
    Formats {
        /// Rendered table image, enables the `image` entry
        #[arg(long)]
        surface: Option<PathBuf>,

        /// Print the menu as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the active configuration
    Config {
        /// Write the active configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = fleetdash_common::AppConfig::load();
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    fleetdash_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Export {
            data,
            format,
            columns,
            filename,
            output,
            surface,
        } => {
            commands::export::run(
                commands::export::ExportArgs {
                    data,
                    format,
                    columns,
                    filename,
                    output,
                    surface,
                },
                &config,
            )
            .await
        }
        Commands::Formats { surface, json } => commands::formats::run(surface, json, &config),
        Commands::Config { init } => commands::config::run(init, &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_arguments_parse() {
        let cli = Cli::try_parse_from([
            "fleetdash",
            "export",
            "vehicles.json",
            "--format",
            "excel",
            "--columns",
            "name:Vehicle,km",
        ])
        .unwrap();

        let Commands::Export {
            format, columns, ..
        } = cli.command
        else {
            panic!("expected export command");
        };
        assert_eq!(format, FormatId::Xlsx);
        assert_eq!(
            columns,
            vec![
                ColumnDescriptor::new("name", "Vehicle"),
                ColumnDescriptor::verbatim("km"),
            ]
        );
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["fleetdash", "export", "v.json", "--format", "csv"]).is_err());
    }
}
