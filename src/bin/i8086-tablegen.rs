use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use i8086_tables::emit::{cpp_artifacts, json_artifact, write_artifacts};
use i8086_tables::{compile, load_spec, CompiledTables, TableConfig};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Compile an 8086 encoding spec into opcode dispatch tables"
)]
struct Cli {
    /// JSON file overriding the default table config
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the generated tables
    Generate {
        #[arg(value_name = "SPEC")]
        spec: PathBuf,
        /// Directory receiving the generated files
        #[arg(long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Cpp)]
        format: OutputFormat,
    },
    /// Show the table entry for one opcode byte
    Lookup {
        #[arg(value_name = "SPEC")]
        spec: PathBuf,
        /// Opcode byte (hex or dec)
        byte: String,
        /// Second byte, resolves group opcodes through its ModRM reg field
        #[arg(long)]
        modrm: Option<String>,
    },
    /// Print the harvested opcode and category enumerations
    Idents {
        #[arg(value_name = "SPEC")]
        spec: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Cpp,
    Json,
    All,
}

fn parse_byte(s: &str) -> Result<u8> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u8::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u8>()?)
    }
}

fn build(spec: &Path, cfg: &TableConfig) -> Result<CompiledTables> {
    let file = load_spec(spec, cfg)?;
    compile(&file, cfg).with_context(|| format!("compiling {}", spec.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => TableConfig::from_json_file(path)?,
        None => TableConfig::default(),
    };

    match cli.cmd {
        Command::Generate { spec, out_dir, format } => {
            let tables = build(&spec, &cfg)?;
            let mut artifacts = Vec::new();
            if matches!(format, OutputFormat::Cpp | OutputFormat::All) {
                artifacts.extend(cpp_artifacts(&tables, &cfg));
            }
            if matches!(format, OutputFormat::Json | OutputFormat::All) {
                artifacts.push(json_artifact(&tables, &cfg)?);
            }
            for path in write_artifacts(&out_dir, &artifacts)? {
                println!("{}", path.display());
            }
            if !tables.overlaps.is_empty() {
                eprintln!("{} overlapping declaration pair(s); later ones won", tables.overlaps.len());
            }
        }
        Command::Lookup { spec, byte, modrm } => {
            let tables = build(&spec, &cfg)?;
            let byte = parse_byte(&byte)?;
            let e = tables.lookup(byte);
            println!(
                "{byte:#04x}: {:<8} {:<16} opcode={} aux={}",
                e.mnemonic,
                e.category,
                e.opcode(&cfg),
                e.aux_index
            );
            if let Some(modrm) = modrm {
                let second = parse_byte(&modrm)?;
                anyhow::ensure!(e.aux_index >= 0, "{byte:#04x} is not a group opcode");
                if let Some(g) = tables.group_entry(byte, second) {
                    println!(
                        "  reg={}: {:<8} {:<16} opcode={}",
                        (second >> 3) & 7,
                        g.mnemonic,
                        g.category,
                        g.opcode(&cfg)
                    );
                }
            }
        }
        Command::Idents { spec } => {
            let tables = build(&spec, &cfg)?;
            println!("{}:", cfg.opcode_enum);
            println!("  0 Unknown");
            for (i, name) in tables.identifiers.opcodes.iter().enumerate() {
                println!("  {} {name}", i + 1);
            }
            println!("{}:", cfg.category_enum);
            println!("  0 Unknown");
            for (i, name) in tables.identifiers.categories.iter().enumerate() {
                println!("  {} {name}", i + 1);
            }
        }
    }

    Ok(())
}
