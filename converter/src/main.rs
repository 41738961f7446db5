//! MDFlow CLI - convert pasted specs to structured markdown
//!
//! # Main Commands
//!
//! ```bash
//! mdflow convert input.tsv                 # Render with the auto-selected template
//! mdflow convert input.tsv -t feature      # Render with a given template
//! mdflow validate input.tsv --preset ui-spec
//! pbpaste | mdflow convert -               # Read from stdin
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! mdflow detect input.txt     # Markdown vs. table verdict
//! mdflow parse input.csv      # Raw matrix as JSON
//! mdflow map input.csv        # Header mapping as JSON
//! mdflow build input.csv      # Spec document as JSON
//! mdflow templates            # List templates
//! mdflow presets              # List validation presets
//! ```

use clap::{Parser, Subcommand};
use mdflow::{
    decode_auto, detect_input_type, get_template_names, mapping::extra_columns,
    parse_with_delimiter, parse_with_metadata, pipeline::{default_rules_for, load_rules},
    read_file_auto, validate, BuildOutput, ConvertOptions, Delimiter, HeaderMapper, SpecDocBuilder,
    Template, ValidationRules,
};
use serde_json::json;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mdflow")]
#[command(about = "Convert pasted tables and block-quoted notes to structured markdown", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify input as markdown or table
    Detect {
        /// Input file, or - for stdin
        input: PathBuf,
    },

    /// Parse delimited input and output the matrix as JSON
    Parse {
        /// Input file, or - for stdin
        input: PathBuf,

        /// Delimiter: tab, comma, pipe or none (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Map the header row onto canonical fields
    Map {
        /// Input file, or - for stdin
        input: PathBuf,
    },

    /// Build the spec document and output it as JSON
    Build {
        /// Input file, or - for stdin
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate rows against a rule set (exit code 1 when invalid)
    Validate {
        /// Input file, or - for stdin
        input: PathBuf,

        /// JSON rule file
        #[arg(short, long, conflicts_with = "preset")]
        rules: Option<PathBuf>,

        /// Built-in rule preset
        #[arg(short, long)]
        preset: Option<String>,
    },

    /// Full conversion: detect, build, validate, render
    Convert {
        /// Input file, or - for stdin
        input: PathBuf,

        /// Template name or "auto" (default: MDFLOW_TEMPLATE or auto)
        #[arg(short, long)]
        template: Option<String>,

        /// JSON rule file
        #[arg(short, long, conflicts_with = "preset")]
        rules: Option<PathBuf>,

        /// Built-in rule preset
        #[arg(short, long)]
        preset: Option<String>,

        /// Output the full result (markdown, warnings, meta) as JSON
        #[arg(long)]
        json: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List available templates
    Templates,

    /// List built-in validation presets
    Presets,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Detect { input } => cmd_detect(&input),
        Commands::Parse { input, delimiter, output } => {
            cmd_parse(&input, delimiter.as_deref(), output.as_deref())
        }
        Commands::Map { input } => cmd_map(&input),
        Commands::Build { input, output } => cmd_build(&input, output.as_deref()),
        Commands::Validate { input, rules, preset } => {
            cmd_validate(&input, rules.as_deref(), preset.as_deref())
        }
        Commands::Convert { input, template, rules, preset, json, output } => cmd_convert(
            &input,
            template.as_deref(),
            rules.as_deref(),
            preset.as_deref(),
            json,
            output.as_deref(),
        ),
        Commands::Templates => cmd_templates(),
        Commands::Presets => cmd_presets(),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Read a file (or stdin for `-`) with encoding detection.
fn read_input(input: &Path) -> CliResult<String> {
    let decoded = if input.as_os_str() == "-" {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        decode_auto(&bytes)
    } else {
        read_file_auto(input)?
    };
    tracing::debug!(target: "mdflow", encoding = %decoded.encoding, "read {}", input.display());
    Ok(decoded.content)
}

fn read_rules(rules: Option<&Path>, preset: Option<&str>) -> CliResult<Option<ValidationRules>> {
    let json = rules.map(fs::read_to_string).transpose()?;
    Ok(load_rules(preset, json.as_deref())?)
}

fn cmd_detect(input: &Path) -> CliResult<()> {
    let content = read_input(input)?;
    let analysis = detect_input_type(&content);
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

fn cmd_parse(input: &Path, delimiter: Option<&str>, output: Option<&Path>) -> CliResult<()> {
    let content = read_input(input)?;

    let (rows, used) = match delimiter {
        Some(name) => {
            let delimiter = parse_delimiter(name)?;
            (parse_with_delimiter(&content, delimiter)?, delimiter)
        }
        None => {
            let parsed = parse_with_metadata(&content)?;
            (parsed.rows, parsed.delimiter)
        }
    };

    eprintln!("📄 Parsed {} rows (delimiter: {})", rows.len(), used.display());
    write_output(&serde_json::to_string_pretty(&rows)?, output)
}

fn parse_delimiter(name: &str) -> CliResult<Delimiter> {
    match name.to_lowercase().as_str() {
        "tab" | "\\t" | "\t" => Ok(Delimiter::Tab),
        "comma" | "," => Ok(Delimiter::Comma),
        "pipe" | "|" => Ok(Delimiter::Pipe),
        "none" => Ok(Delimiter::None),
        other => Err(format!("Unknown delimiter: {}", other).into()),
    }
}

fn cmd_map(input: &Path) -> CliResult<()> {
    let content = read_input(input)?;
    let parsed = parse_with_metadata(&content)?;
    let options = ConvertOptions::from_env()?;

    let mapper = HeaderMapper::new(options.mapper);
    let header_row = parsed.headers();
    let mappings = mapper.map(header_row);
    let extras = extra_columns(header_row, &mappings);

    for m in &mappings {
        eprintln!("   {} → {} ({})", m.source_header, m.canonical_field, m.confidence);
    }
    if !extras.is_empty() {
        eprintln!("⚠️  {} columns not mapped", extras.len());
    }

    let report = json!({
        "family": mapper.family(header_row),
        "mappings": mappings,
        "extra_columns": extras,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn build(content: &str) -> CliResult<BuildOutput> {
    let options = ConvertOptions::from_env()?;
    let builder = SpecDocBuilder::new(
        mdflow::InputDetector::new(options.detector),
        HeaderMapper::new(options.mapper),
    );
    Ok(builder.build_with_details(content)?)
}

fn cmd_build(input: &Path, output: Option<&Path>) -> CliResult<()> {
    let content = read_input(input)?;
    let built = build(&content)?;

    eprintln!(
        "📦 {} input, {} rows ({} dropped)",
        built.analysis.input_type,
        built.doc.rows().len(),
        built.dropped_rows
    );
    write_output(&serde_json::to_string_pretty(&built.doc)?, output)
}

fn cmd_validate(input: &Path, rules: Option<&Path>, preset: Option<&str>) -> CliResult<()> {
    let content = read_input(input)?;
    let built = build(&content)?;

    let rules = match read_rules(rules, preset)? {
        Some(rules) => Some(rules),
        None => default_rules_for(&built.doc),
    };
    let result = validate(Some(&built.doc), rules.as_ref());

    for warning in &result.warnings {
        eprintln!("   - {}", warning);
    }
    eprintln!(
        "\n📊 Results: {} rows, {} warnings, {}",
        built.doc.rows().len(),
        result.warnings.len(),
        if result.valid { "valid" } else { "invalid" }
    );
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.valid {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_convert(
    input: &Path,
    template: Option<&str>,
    rules: Option<&Path>,
    preset: Option<&str>,
    json: bool,
    output: Option<&Path>,
) -> CliResult<()> {
    let content = read_input(input)?;

    let mut options = ConvertOptions::from_env()?;
    if let Some(template) = template {
        options.template = template.to_string();
    }
    if let Some(rules) = read_rules(rules, preset)? {
        options.rules = Some(rules);
    }

    let result = mdflow::convert_paste_with(&content, &options)?;

    eprintln!(
        "✅ {} input → {} template, {} rows",
        result.meta.input_type,
        result.meta.template.name(),
        result.meta.row_count
    );
    for warning in &result.warnings {
        eprintln!("⚠️  {}", warning);
    }

    if json {
        write_output(&serde_json::to_string_pretty(&result)?, output)
    } else {
        write_output(result.mdflow.trim_end(), output)
    }
}

fn cmd_templates() -> CliResult<()> {
    for name in get_template_names() {
        let template: Template = name.parse()?;
        println!("{:<8} {}", name, template.description());
    }
    println!("{:<8} table for screen item sheets, spec otherwise", mdflow::render::AUTO_TEMPLATE);
    Ok(())
}

fn cmd_presets() -> CliResult<()> {
    for name in ValidationRules::preset_names() {
        let rules = ValidationRules::preset(name)?;
        println!("{}:", name);
        println!("{}", serde_json::to_string_pretty(&rules)?);
    }
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> CliResult<()> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
