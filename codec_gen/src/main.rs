use clap::{Args, Parser, Subcommand, ValueEnum};
use cmds::analyze::IrOutputFormat;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cmds;

#[derive(Parser)]
#[command(name = "codec-gen")]
#[command(about = "Streaming JSON codec generator", long_about = None)]
struct Cli {
    /* Log pipeline decisions at debug level (overrides RUST_LOG) */
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/* Declaration files and where their imports live */
#[derive(Args)]
struct InputArgs {
    #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    #[arg(short = 'i', long = "include-dir", value_name = "DIR")]
    include_dirs: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /* Generate codecs and commit them with the known-types manifest */
    Codegen {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long = "format", value_enum, default_value_t = Format::Rust)]
        format: Format,

        #[arg(short = 'o', long = "output", value_name = "DIR", default_value = "generated")]
        output_dir: PathBuf,

        /* Overrides the namespace named by the declaration files */
        #[arg(long = "namespace", value_name = "NAME")]
        namespace: Option<String>,

        /* Output stores of dependencies, searched for known-types manifests */
        #[arg(long = "classpath", value_name = "DIR")]
        classpath: Vec<PathBuf>,
    },

    /* Show discovered types and their resolved members */
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long = "print-ir")]
        print_ir: bool,

        #[arg(long = "ir-format", value_enum, default_value_t = IrOutputFormat::Json)]
        ir_format: IrOutputFormat,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Format {
    /* Rust source over the codec_reflect runtime */
    Rust,
    /* Serialized codec IR */
    Json,
}

impl From<Format> for cmds::codegen::Format {
    fn from(format: Format) -> Self {
        match format {
            Format::Rust => cmds::codegen::Format::Rust,
            Format::Json => cmds::codegen::Format::Json,
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Codegen { input, format, output_dir, namespace, classpath } => cmds::codegen::run(
            input.files,
            input.include_dirs,
            format.into(),
            output_dir,
            namespace,
            classpath,
            cli.verbose,
        ),
        Commands::Analyze { input, print_ir, ir_format } => {
            cmds::analyze::run(input.files, input.include_dirs, print_ir, ir_format)
        }
    }
}
