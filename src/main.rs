use clap::{Parser, Subcommand};
use sd_organizer::config::{self, CONFIG_FILE_NAME};
use sd_organizer::imaging::{ContainerReader, MetadataReader, sniff_file};
use sd_organizer::organize::{self, OrganizeOptions};
use sd_organizer::parameters::{self, KeyStyle};
use sd_organizer::output;
use std::path::PathBuf;
use tracing::Level;

/// Shared flags for commands that parse parameters.
#[derive(clap::Args, Clone)]
struct ParseArgs {
    /// Key naming for parsed fields (overrides parameters.key_style)
    #[arg(long, value_enum)]
    key_style: Option<KeyStyle>,
}

#[derive(Parser)]
#[command(name = "sd-organizer")]
#[command(about = "Sort generated images into model/date folders")]
#[command(long_about = "\
Sort generated images into model/date folders

Images are recognised by content, not extension. Every image whose embedded
`parameters` text carries a prompt is moved next to a JSON sidecar holding
everything parsed from it:

  output/
  ├── sdxl_base/                   # Model field, lower-cased
  │   └── 2024-05-01/              # File creation date
  │       ├── 00012-1234.png
  │       ├── 00012-1234.json      # Sidecar: prompt, settings, file info
  │       ├── 00013-1234.png
  │       └── 00013-1234.json
  └── unknown/                     # Images without a Model field
      └── ...

Images without a prompt are left where they are.

Run 'sd-organizer gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Input directory or single image [default: input]
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// Output directory [default: output]
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Config file (optional; defaults apply when it doesn't exist)
    #[arg(long, default_value = CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Move images with a prompt into the output tree, writing sidecars
    Organize {
        #[command(flatten)]
        parse: ParseArgs,
        /// Report failing images and continue instead of aborting
        #[arg(long)]
        keep_going: bool,
    },
    /// List discovered images and where they would go, without moving anything
    Scan(ParseArgs),
    /// Print the parsed parameters of one image as JSON
    Read {
        /// Image file to read
        file: PathBuf,
        #[command(flatten)]
        parse: ParseArgs,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut site = config::load_config(&cli.config)?;
    if let Some(input) = cli.input {
        site.input_dir = input;
    }
    if let Some(output) = cli.output {
        site.output_dir = output;
    }

    match cli.command {
        Command::Organize { parse, keep_going } => {
            let mut options = OrganizeOptions::from_config(&site);
            options.key_style = parse.key_style.unwrap_or(options.key_style);
            options.keep_going |= keep_going;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_organize_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = organize::organize(
                &site.input_dir,
                &site.output_dir,
                &options,
                &ContainerReader,
                Some(tx),
            );
            printer.join().ok();
            let report = result?;
            println!();
            println!("{}", report);
        }
        Command::Scan(parse) => {
            let mut options = OrganizeOptions::from_config(&site);
            options.key_style = parse.key_style.unwrap_or(options.key_style);
            let planned =
                organize::plan(&site.input_dir, &site.output_dir, &options, &ContainerReader)?;
            output::print_plan(&planned);
        }
        Command::Read { file, parse } => {
            let style = parse.key_style.unwrap_or(site.parameters.key_style);
            let kind = sniff_file(&file)?
                .ok_or_else(|| format!("Not a recognised image: {}", file.display()))?;
            let raw = ContainerReader
                .read_parameters(&file, kind)?
                .unwrap_or_default();
            let parsed = parameters::parse(&raw, style);
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Diagnostics go to stderr so stdout stays clean for progress and JSON.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
