//! bytecode-flow: decode EVM bytecode and report on its control flow.
//!
//! The bytecode is given either directly as hex or as a file, which holds hex
//! or the JSON output of compiling a contract.

use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use bytecode_flow_analyzer::{
    analyzer::{
        chain::{
            version::{ChainVersion, EthereumVersion},
            Chain,
        },
        config::Config,
    },
    contract::Contract,
    flow::{cfg::EdgeTarget, jump_index::JumpDestinationSet},
    query::stats::{self, BytecodeStats},
    Program,
};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bytecode-flow")]
#[command(author, version, about = "Instruction decoding and control-flow analysis for EVM bytecode")]
#[command(group(ArgGroup::new("input").args(["hex", "file"])))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Bytecode as hex, with or without a 0x prefix
    #[arg(long, global = true)]
    hex: Option<String>,

    /// File holding the bytecode as hex, or a compiled contract as JSON
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// The fork whose instruction set is used to decode the bytecode
    #[arg(long, global = true, default_value_t = EthereumVersion::latest())]
    fork: EthereumVersion,

    /// End basic blocks at halting instructions as well as at jumps
    #[arg(long, global = true)]
    halts_end_blocks: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every instruction with its offset
    Disasm,

    /// Count the jump instructions and list the valid jump destinations
    Jumps,

    /// Print the basic blocks and the edges between them
    Blocks,

    /// Print the loops formed by backward jumps
    Loops,

    /// Print summary statistics
    Stats,

    /// Print the full report
    Report {
        /// Length of the instruction sequences to count
        #[arg(long, default_value = "2")]
        sequence_length: usize,

        /// Number of most frequent sequences to show
        #[arg(long, default_value = "10")]
        top: usize,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let contract = load_contract(cli)?;
    let mut config = Config::default().with_halts_end_blocks(cli.halts_end_blocks);
    if let Commands::Report {
        sequence_length,
        top,
    } = cli.command
    {
        config = config.with_sequence_length(sequence_length).with_sequence_top(top);
    }

    let analyzer = bytecode_flow_analyzer::new(contract, config).analyze()?;
    let program = analyzer.program();
    tracing::info!(
        bytes = program.len(),
        instructions = program.instructions().len(),
        fork = %cli.fork,
        "analyzed bytecode"
    );

    match cli.command {
        Commands::Disasm => disasm(program, cli.format),
        Commands::Jumps => jumps(program, cli.format),
        Commands::Blocks => blocks(program, cli.format),
        Commands::Loops => loops(program, cli.format),
        Commands::Stats => show_stats(program, cli.format),
        Commands::Report { .. } => {
            let report = analyzer.report();
            match cli.format {
                OutputFormat::Json => print_json(&report),
                OutputFormat::Text => {
                    print_stats(&report.stats);
                    println!();
                    print_block_stats(&report.blocks);
                    println!();
                    println!("Loops: {}", report.loops.len());
                    for l in &report.loops {
                        println!("  {:#06x} -> {:#06x} ({:?})", l.source, l.target, l.kind);
                    }
                    println!();
                    println!("Categories:");
                    for (category, count) in &report.categories {
                        println!("  {category:?}: {count}");
                    }
                    println!();
                    println!("Most frequent sequences:");
                    for sequence in &report.sequences {
                        println!("  {:5} {}", sequence.count, sequence.sequence.join(" "));
                    }
                    Ok(())
                }
            }
        }
    }
}

fn load_contract(cli: &Cli) -> Result<Contract> {
    let chain = Chain::Ethereum { version: cli.fork };
    let contract = match (&cli.hex, &cli.file) {
        (Some(hex), _) => Contract::from_hex(hex.trim(), chain)?,
        (None, Some(path)) => Contract::new_from_file(path, chain)?,
        (None, None) => anyhow::bail!("Either --hex or --file must be provided"),
    };

    Ok(contract)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct DisasmLine {
    offset:    u32,
    mnemonic:  String,
    immediate: Option<String>,
    truncated: bool,
}

fn disasm(program: &Program, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for instruction in program.instructions() {
                println!("{}", program.format_instruction(instruction));
            }
            Ok(())
        }
        OutputFormat::Json => {
            let lines: Vec<DisasmLine> = program
                .instructions()
                .iter()
                .map(|i| DisasmLine {
                    offset:    i.offset(),
                    mnemonic:  program.mnemonic(i.opcode()).into_owned(),
                    immediate: (i.declared_immediate_size() > 0)
                        .then(|| format!("0x{}", hex::encode(i.immediate()))),
                    truncated: i.is_truncated(),
                })
                .collect();
            print_json(&lines)
        }
    }
}

fn jumps(program: &Program, format: OutputFormat) -> Result<()> {
    let counts = stats::jump_counts(program);
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Jumps<'a> {
                counts:       stats::JumpCounts,
                destinations: &'a JumpDestinationSet,
            }
            print_json(&Jumps {
                counts,
                destinations: program.jump_destinations(),
            })
        }
        OutputFormat::Text => {
            println!("JUMP:     {}", counts.jump);
            println!("JUMPI:    {}", counts.jumpi);
            println!("JUMPDEST: {}", counts.jumpdest);
            println!("Total:    {}", counts.total);
            let destinations: Vec<String> = program
                .jump_destinations()
                .iter()
                .map(|offset| format!("{offset:#06x}"))
                .collect();
            println!("Destinations: {}", destinations.join(", "));
            Ok(())
        }
    }
}

fn describe_target(target: EdgeTarget) -> String {
    match target {
        EdgeTarget::Block(offset) => format!("{offset:#06x}"),
        EdgeTarget::InvalidDestination(offset) => format!("{offset:#06x} (invalid)"),
        EdgeTarget::Dynamic => "dynamic".to_string(),
        EdgeTarget::ProgramEnd => "end".to_string(),
    }
}

fn blocks(program: &Program, format: OutputFormat) -> Result<()> {
    let cfg = program.control_flow();
    match format {
        OutputFormat::Json => print_json(cfg),
        OutputFormat::Text => {
            for block in cfg.blocks() {
                println!(
                    "block {:#06x}..{:#06x} ({} instructions)",
                    block.start(),
                    block.end(),
                    block.len()
                );
                for instruction in program.block_instructions(block) {
                    println!("    {}", program.format_instruction(instruction));
                }
                for edge in block.successors() {
                    println!("  {:?} -> {}", edge.kind, describe_target(edge.target));
                }
            }
            Ok(())
        }
    }
}

fn loops(program: &Program, format: OutputFormat) -> Result<()> {
    let loops = program.control_flow().loops();
    match format {
        OutputFormat::Json => print_json(&loops),
        OutputFormat::Text => {
            println!("Loops: {}", loops.len());
            for l in &loops {
                println!("  {:#06x} -> {:#06x} ({:?})", l.source, l.target, l.kind);
            }
            Ok(())
        }
    }
}

fn show_stats(program: &Program, format: OutputFormat) -> Result<()> {
    let bytecode_stats = BytecodeStats::new(program);
    let block_stats = stats::block_statistics(&stats::block_summaries(program));
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Stats {
                bytecode: BytecodeStats,
                blocks:   stats::BlockStatistics,
            }
            print_json(&Stats {
                bytecode: bytecode_stats,
                blocks:   block_stats,
            })
        }
        OutputFormat::Text => {
            print_stats(&bytecode_stats);
            println!();
            print_block_stats(&block_stats);
            Ok(())
        }
    }
}

fn print_stats(stats: &BytecodeStats) {
    println!("Length:            {} bytes", stats.length);
    println!("Instructions:      {}", stats.instruction_count);
    println!("Unique opcodes:    {}", stats.unique_opcodes);
    println!("Pushes:            {}", stats.push_count);
    println!("Jumps:             {}", stats.jump_count);
    println!("Jump destinations: {}", stats.jumpdest_count);
    println!("Invalid opcodes:   {}", stats.invalid_opcode_count);
    if stats.truncated_tail {
        println!("The final push is truncated by the end of the code");
    }
}

fn print_block_stats(stats: &stats::BlockStatistics) {
    println!("Blocks:            {}", stats.total_blocks);
    println!("Average length:    {:.1}", stats.average_length);
    println!("Shortest:          {}", stats.min_length);
    println!("Longest:           {}", stats.max_length);
    for (length, count) in &stats.length_distribution {
        println!("  {count:3} blocks of length {length:2}");
    }
}
