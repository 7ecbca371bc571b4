// Copyright (c) 2026 ecutools Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use flexi_logger::Logger;

use ecutools::address::to_address;
use ecutools::{
    analyze, objdump, serialize_report, AnalysisOptions, Enrichment, RomDefinition, RomListing,
    XmlDirectory,
};

#[derive(Parser, Debug)]
#[command(name = "ecutools", version, about = "M32R ECU ROM disassembler and annotator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Disassemble a ROM image and annotate it from the definition documents
    Disassemble(DisassembleArgs),
}

#[derive(Args, Debug)]
struct DisassembleArgs {
    /// Raw ROM image to disassemble
    #[arg(short = 'f', long = "from")]
    from: PathBuf,

    /// Listing to write (default: <rom stem>.asm next to the ROM)
    #[arg(short = 'o', long = "out")]
    out: Option<PathBuf>,

    /// Directory holding rom/, ram/ and code/ definition documents
    #[arg(long = "definitions", default_value = "xml")]
    definitions: PathBuf,

    /// objdump binary with M32R support
    #[arg(long = "objdump", env = "ECUTOOLS_OBJDUMP", default_value = "gobjdump")]
    objdump: String,

    /// Only disassemble, do not annotate
    #[arg(long = "no-analyze", default_value_t = false)]
    no_analyze: bool,

    /// Literals loaded into r0 above this address are tried as headers
    #[arg(long = "discovery-threshold", value_parser = parse_hex, default_value = "0x40000")]
    discovery_threshold: u32,

    /// Write definition fragments for discovered tables here
    #[arg(long = "discoveries")]
    discoveries: Option<PathBuf>,

    /// Write the JSON analysis report here
    #[arg(long = "report")]
    report: Option<PathBuf>,

    /// Enable debug output
    #[arg(short = 'd', long = "debug", default_value_t = false)]
    debug: bool,
}

fn parse_hex(text: &str) -> std::result::Result<u32, String> {
    to_address(text).map_err(|e| e.to_string())
}

fn default_out(rom: &Path) -> PathBuf {
    rom.with_extension("asm")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Disassemble(args) => disassemble(args),
    }
}

fn disassemble(args: DisassembleArgs) -> Result<()> {
    let level = if args.debug { "debug" } else { "info" };
    // RUST_LOG wins over --debug
    let _logger = Logger::try_with_env_or_str(level)?
        .log_to_stderr()
        .start()
        .context("Failed to start logger")?;

    let lines = objdump::disassemble(&args.objdump, &args.from)
        .with_context(|| format!("Failed to disassemble {}", args.from.display()))?;
    let mut listing = RomListing::new(lines);
    log::info!(
        "ROM ID {}, base address {}",
        listing.rom_id().unwrap_or("unknown"),
        listing
            .base_address()
            .map(|b| format!("0x{:x}", b))
            .unwrap_or_else(|| "unknown".to_string())
    );

    if !args.no_analyze {
        run_analysis(&mut listing, &args)?;
    }

    let out = args.out.clone().unwrap_or_else(|| default_out(&args.from));
    let file = fs::File::create(&out)
        .with_context(|| format!("Failed to create {}", out.display()))?;
    let mut writer = BufWriter::new(file);
    listing
        .write(&mut writer)
        .and_then(|_| writer.flush())
        .with_context(|| format!("Failed to write {}", out.display()))?;
    log::info!("Listing written to {}", out.display());
    Ok(())
}

fn run_analysis(listing: &mut RomListing, args: &DisassembleArgs) -> Result<()> {
    let Some(rom_id) = listing.rom_id().map(str::to_string) else {
        log::warn!("ROM is too short to carry a ROM ID, skipping analysis");
        return Ok(());
    };
    let store = XmlDirectory::new(&args.definitions);
    let definition = match RomDefinition::load(&store, &rom_id) {
        Ok(definition) => definition,
        Err(e) => {
            log::error!("Cannot load definitions for ROM {}: {}", rom_id, e);
            log::warn!("Skipping analysis, the listing will carry no annotations");
            return Ok(());
        }
    };
    let enrichment = Enrichment::load(&store, &rom_id).unwrap_or_else(|e| {
        log::warn!("Cannot load description maps for ROM {}: {}", rom_id, e);
        Enrichment::default()
    });

    let options = AnalysisOptions {
        discovery_threshold: args.discovery_threshold,
    };
    let analysis = analyze(listing, &definition, &enrichment, options)
        .context("Annotation failed")?;
    let report = &analysis.report;

    for label in &report.unreferenced {
        log::debug!("Not referenced from code: {}", label);
    }
    if !report.discovered_tables.is_empty() {
        match &args.discoveries {
            Some(path) => {
                fs::write(path, report.fragments())
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                log::info!(
                    "{} discovered table definitions written to {}",
                    report.discovered_tables.len(),
                    path.display()
                );
            }
            None => log::info!("Discovered table definitions:\n{}", report.fragments()),
        }
    }
    if let Some(path) = &args.report {
        let value =
            serialize_report(report, Some(&rom_id)).context("Failed to serialize report")?;
        let json = serde_json::to_string_pretty(&value)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Analysis report written to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cli() {
        let cli = Cli::try_parse_from([
            "ecutools",
            "disassemble",
            "--from",
            "evo9.bin",
            "--discovery-threshold",
            "0x50000",
            "--no-analyze",
        ])
        .unwrap();
        let Command::Disassemble(args) = cli.command;
        assert_eq!(args.from, PathBuf::from("evo9.bin"));
        assert_eq!(args.discovery_threshold, 0x50000);
        assert!(args.no_analyze);

        let cli = Cli::try_parse_from(["ecutools", "disassemble", "--from", "evo9.bin"]).unwrap();
        let Command::Disassemble(defaults) = cli.command;
        assert_eq!(
            defaults.discovery_threshold,
            ecutools::annotate::DISCOVERY_THRESHOLD
        );
        assert_eq!(args.definitions, PathBuf::from("xml"));
        assert_eq!(default_out(&args.from), PathBuf::from("evo9.asm"));
    }
}
