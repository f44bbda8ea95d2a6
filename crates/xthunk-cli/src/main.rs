use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use xthunk_core::ThunkConfig;
use xthunk_protocol::{FastCode, FuncCode, TableSignature};

mod demo;
mod probe;

#[derive(Parser)]
#[command(name = "xthunk")]
#[command(about = "xthunk - Vulkan and OpenXR thunking layer")]
#[command(version)]
struct Cli {
    /// Configuration file path (defaults to $XTHUNK_CONFIG or the platform path)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the entry-point table and its signature
    Table,

    /// Load the host driver through the thunk and check which functions it serves
    Probe {
        /// Function names to check (e.g. vkCmdDrawMeshTasksEXT)
        names: Vec<String>,
    },

    /// Print the effective configuration
    Config,

    /// Drive the surface manager over the software compositor
    PresentDemo {
        /// Number of toplevel windows
        #[arg(short, long, default_value_t = 3)]
        windows: u32,

        /// Frames to draw and flush per window
        #[arg(short, long, default_value_t = 60)]
        frames: u32,

        /// Drawable edge length in pixels
        #[arg(short, long, default_value_t = 128)]
        size: u32,
    },
}

fn main() -> anyhow::Result<()> {
    xthunk_common::logging::init_logging();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .unwrap_or_else(xthunk_common::platform::default_config_path);

    match cli.command {
        Commands::Table => print_table(),

        Commands::Probe { names } => {
            let config = ThunkConfig::load_or_default(&config_path);
            info!("probing host driver {}", config.host.vulkan_library);
            probe::run(&config, &names)?;
        }

        Commands::Config => {
            let config = ThunkConfig::load_or_default(&config_path);
            println!("# {}", config_path.display());
            print!("{}", config.to_toml().context("serializing configuration")?);
        }

        Commands::PresentDemo { windows, frames, size } => {
            let config = ThunkConfig::load_or_default(&config_path);
            demo::run(&config, windows, frames, size)?;
        }
    }

    Ok(())
}

fn print_table() {
    let sig = TableSignature::current();
    println!("Table version {}  checksum {:#018x}", sig.version, sig.checksum);
    println!();
    println!("Entry points ({}):", sig.count);
    for code in FuncCode::ALL {
        println!("  {:4}  {}", code.as_raw(), code.name());
    }
    println!();
    println!("Fast path ({}):", sig.fast_count);
    for code in FastCode::ALL {
        println!("  {:<28} {} words", code.name(), code.arg_count());
    }
    println!();
    println!(
        "Client proc-address tables resolve {} names",
        xthunk_vk_icd::proc_addr::table_names().count()
    );
}
