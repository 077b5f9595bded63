use anyhow::{Context, Result};
use byteview::config::Config;
use byteview::{
    logging, ByteSource, DateOrder, FieldId, FileBuffer, FormatSpec, MemoryBuffer, Session,
    Snapshot, REGISTRY,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bv")]
#[command(about = "Show the bytes at an offset as integers, floats, timestamps and GUIDs")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/byteview/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Date order: mdy, dmy, ymd (or 0, 1, 2)
    #[arg(long, global = true)]
    date_order: Option<String>,

    /// Date separator character
    #[arg(long, global = true)]
    date_separator: Option<char>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interpret the bytes at an offset as every supported type
    Inspect {
        /// Input file
        #[arg(required_unless_present = "data")]
        input: Option<PathBuf>,

        /// Inline bytes as hex instead of a file (e.g. '12345678')
        #[arg(short, long, conflicts_with = "input")]
        data: Option<String>,

        /// Byte offset (decimal or 0x hex)
        #[arg(short, long, default_value = "0")]
        offset: String,

        /// Read multi-byte values as big-endian
        #[arg(short, long)]
        big_endian: bool,

        /// Read multi-byte values as little-endian, overriding the config
        #[arg(short, long, conflicts_with = "big_endian")]
        little_endian: bool,

        /// Show integers and floats as hex
        #[arg(short = 'x', long)]
        hex: bool,

        /// Show integers and floats as decimal, overriding the config
        #[arg(long, conflicts_with = "hex")]
        no_hex: bool,

        /// Selected field; the binary view takes its width
        #[arg(short, long)]
        select: Option<String>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Parse a value for one field and write its bytes into a file
    Set {
        /// Input file
        input: PathBuf,

        /// Byte offset (decimal or 0x hex)
        #[arg(short, long, default_value = "0")]
        offset: String,

        /// Field to edit (see `bv fields`)
        #[arg(short, long)]
        field: String,

        /// New value, in the field's display format
        #[arg(short, long, allow_hyphen_values = true)]
        value: String,

        /// Write multi-byte values as big-endian
        #[arg(short, long)]
        big_endian: bool,

        /// Write multi-byte values as little-endian, overriding the config
        #[arg(short, long, conflicts_with = "big_endian")]
        little_endian: bool,

        /// Parse integers and floats as hex
        #[arg(short = 'x', long)]
        hex: bool,

        /// Parse integers and floats as decimal, overriding the config
        #[arg(long, conflicts_with = "hex")]
        no_hex: bool,

        /// Field whose width the binary view uses
        #[arg(short, long)]
        select: Option<String>,

        /// Show the result without saving the file
        #[arg(long)]
        dry_run: bool,
    },

    /// List the available fields
    Fields,
}

fn parse_offset(s: &str) -> Result<u64> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).context("Invalid hex offset"),
        None => s.parse().context("Invalid offset"),
    }
}

fn parse_field(name: &str) -> Result<FieldId> {
    FieldId::from_name(name)
        .ok_or_else(|| anyhow::anyhow!("Unknown field: {} (see `bv fields`)", name))
}

fn date_format(cli: &Cli, config: &Config) -> Result<FormatSpec> {
    let mut spec = config.date_format;
    if let Some(order) = &cli.date_order {
        spec.order = DateOrder::from_name(order)
            .ok_or_else(|| anyhow::anyhow!("Unknown date order: {}", order))?;
    }
    if let Some(sep) = cli.date_separator {
        spec.separator = sep;
    }
    Ok(spec)
}

/// An explicit `on`/`off` flag wins over the config value
fn resolve_flag(on: bool, off: bool, config: bool) -> bool {
    if on {
        true
    } else if off {
        false
    } else {
        config
    }
}

/// Apply view flags to a fresh session
fn configure<B: ByteSource>(
    session: &mut Session<B>,
    offset: u64,
    big_endian: bool,
    hex: bool,
    select: Option<FieldId>,
) -> Result<()> {
    session.set_offset(offset)?;
    session.set_big_endian(big_endian);
    session.set_show_hex(hex);
    if let Some(id) = select {
        session.select_field(id);
    }
    Ok(())
}

fn print_snapshot<B: ByteSource>(session: &Session<B>) {
    let ctx = session.context();
    println!(
        "Offset 0x{:x} ({} of {} bytes, {}{})",
        ctx.offset,
        ctx.data_len - ctx.offset,
        ctx.data_len,
        if ctx.big_endian { "big-endian" } else { "little-endian" },
        if ctx.show_hex { ", hex" } else { "" }
    );
    print_fields(session.snapshot());
}

fn print_fields(snapshot: &Snapshot) {
    let label_width = snapshot.iter().map(|(_, v)| v.label.len()).max().unwrap_or(0);
    let mut group = None;

    for (_, view) in snapshot.iter() {
        if group != Some(view.group) {
            group = Some(view.group);
            println!("\n{}", view.group.name());
            println!("{}", "-".repeat(40));
        }
        let marker = if view.available { "" } else { "  (unavailable)" };
        println!(
            "  {:<width$}  {:>2}B  {}{}",
            view.label,
            view.width,
            view.display,
            marker,
            width = label_width
        );
    }
}

fn list_fields() {
    println!("{:<12}  {:<14}  {:>5}  Label", "Name", "Group", "Bytes");
    println!("{}", "-".repeat(50));
    for def in REGISTRY {
        let width = if def.id == FieldId::Binary {
            "1-8".to_string()
        } else {
            def.width.to_string()
        };
        println!(
            "{:<12}  {:<14}  {:>5}  {}",
            def.id.name(),
            def.group.name(),
            width,
            def.id.label()
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    logging::init(level)?;

    let spec = date_format(&cli, &config)?;

    match cli.command {
        Command::Inspect {
            input,
            data,
            offset,
            big_endian,
            little_endian,
            hex,
            no_hex,
            select,
            json,
        } => {
            let offset = parse_offset(&offset)?;
            let select = select.as_deref().map(parse_field).transpose()?;
            let buffer = match (input, data) {
                (_, Some(data)) => {
                    let bytes = hex::decode(data.replace([' ', ':'], ""))
                        .context("Invalid hex data")?;
                    MemoryBuffer::read_only(bytes)
                }
                (Some(path), None) => {
                    let bytes = std::fs::read(&path)
                        .with_context(|| format!("Failed to open {:?}", path))?;
                    MemoryBuffer::read_only(bytes)
                }
                (None, None) => anyhow::bail!("Specify an input file or --data"),
            };

            let mut session = Session::new(buffer.with_date_format(spec));
            configure(
                &mut session,
                offset,
                resolve_flag(big_endian, little_endian, config.big_endian),
                resolve_flag(hex, no_hex, config.show_hex),
                select,
            )?;

            if json {
                println!("{}", serde_json::to_string_pretty(session.snapshot())?);
            } else {
                print_snapshot(&session);
            }
        }
        Command::Set {
            input,
            offset,
            field,
            value,
            big_endian,
            little_endian,
            hex,
            no_hex,
            select,
            dry_run,
        } => {
            let offset = parse_offset(&offset)?;
            let field = parse_field(&field)?;
            let select = match select {
                Some(name) => Some(parse_field(&name)?),
                None if field != FieldId::Binary => Some(field),
                None => None,
            };

            let buffer = FileBuffer::open(&input)
                .with_context(|| format!("Failed to open {:?}", input))?
                .with_date_format(spec);
            let mut session = Session::new(buffer);
            configure(
                &mut session,
                offset,
                resolve_flag(big_endian, little_endian, config.big_endian),
                resolve_flag(hex, no_hex, config.show_hex),
                select,
            )?;

            session
                .edit(field, &value)
                .with_context(|| format!("Cannot set {} to {:?}", field.label(), value))?;

            if dry_run {
                println!("Dry run: {:?} not modified", input);
            } else {
                session
                    .source_mut()
                    .save()
                    .with_context(|| format!("Failed to write {:?}", input))?;
            }
            print_snapshot(&session);
        }
        Command::Fields => list_fields(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("16").unwrap(), 16);
        assert_eq!(parse_offset("0x10").unwrap(), 16);
        assert_eq!(parse_offset(" 0XfF ").unwrap(), 255);
        assert!(parse_offset("0xZZ").is_err());
        assert!(parse_offset("-1").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "bv", "set", "file.bin", "-o", "0x4", "-f", "int16", "-v", "-1", "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Command::Set { value, dry_run, .. } => {
                assert_eq!(value, "-1");
                assert!(dry_run);
            }
            _ => panic!("expected set"),
        }

        assert!(Cli::try_parse_from(["bv", "inspect", "--data", "12345678", "-x"]).is_ok());
        assert!(Cli::try_parse_from(["bv", "inspect"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        assert!(resolve_flag(false, false, true));
        assert!(!resolve_flag(false, true, true));
        assert!(resolve_flag(true, false, false));
        assert!(!resolve_flag(false, false, false));

        let cli = Cli::try_parse_from(["bv", "inspect", "--data", "00", "-l", "--no-hex"]).unwrap();
        match cli.command {
            Command::Inspect {
                little_endian,
                no_hex,
                ..
            } => assert!(little_endian && no_hex),
            _ => panic!("expected inspect"),
        }
        assert!(Cli::try_parse_from(["bv", "inspect", "--data", "00", "-b", "-l"]).is_err());
        assert!(Cli::try_parse_from(["bv", "inspect", "--data", "00", "-x", "--no-hex"]).is_err());
    }

    #[test]
    fn test_date_format_overrides() {
        let cli = Cli::try_parse_from([
            "bv", "--date-order", "ymd", "--date-separator", "-", "fields",
        ])
        .unwrap();
        let spec = date_format(&cli, &Config::default()).unwrap();
        assert_eq!(spec, FormatSpec::new(DateOrder::Ymd, '-'));
    }
}
