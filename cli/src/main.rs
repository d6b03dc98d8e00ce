//! docfill CLI - fill sections and compute tables in Word documents

use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docfill::generate::estimate_tokens;
use docfill::package::output_file_name;
use docfill::render::sections_to_json;
use docfill::{
    Config, Docfill, DocfillSession, GeneratedContent, GenerationRequest, JsonFormat,
    SectionPromptBuilder,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "docfill")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Fill marked sections and table calculations in DOCX documents", long_about = None)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show document information
    Info {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// List the sections of a document
    Sections {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Only sections with a placeholder
        #[arg(long)]
        pending: bool,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the generation prompt for a section
    Prompt {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Section number (as listed by `sections`)
        #[arg(short, long)]
        section: usize,

        /// Requirements for the section
        #[arg(short, long, default_value = "")]
        notes: String,

        /// Desired tone
        #[arg(long, default_value = "professional")]
        tone: String,

        /// Length guidance
        #[arg(long, default_value = "2-3 paragraphs")]
        length: String,

        /// Number of preceding sections used as context
        #[arg(long, default_value = "2")]
        context: usize,
    },

    /// Insert text at a section's placeholder
    Insert {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Section number (as listed by `sections`)
        #[arg(short, long)]
        section: usize,

        /// Text to insert
        #[arg(short, long, conflicts_with = "content_file", required_unless_present = "content_file")]
        content: Option<String>,

        /// Read the text to insert from a file
        #[arg(long, value_name = "FILE")]
        content_file: Option<PathBuf>,

        /// Keep the placeholder paragraph and insert after it
        #[arg(long)]
        keep_placeholder: bool,

        /// Output file (defaults to <input>_generated.docx)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Insert content for many sections from a plan, then compute tables
    Fill {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// JSON object mapping section numbers or titles to text
        #[arg(long, value_name = "PLAN")]
        plan: PathBuf,

        /// Keep placeholder paragraphs and insert after them
        #[arg(long)]
        keep_placeholder: bool,

        /// Skip table calculations
        #[arg(long)]
        no_tables: bool,

        /// Output file (defaults to <input>_generated.docx)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Compute table calculations
    Calc {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (defaults to <input>_generated.docx)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Dump the document model as JSON
    Json {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Dump the document as plain text
    Text {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = run(cli);

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult {
    let config = match cli.config.as_deref() {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let docfill = Docfill::new().with_config(config);

    match cli.command {
        Commands::Info { input } => cmd_info(docfill, &input),
        Commands::Sections {
            input,
            pending,
            json,
        } => cmd_sections(docfill, &input, pending, json),
        Commands::Prompt {
            input,
            section,
            notes,
            tone,
            length,
            context,
        } => {
            let request = GenerationRequest::new(notes)
                .with_tone(tone)
                .with_length(length)
                .with_context_window(context);
            cmd_prompt(docfill, &input, section, &request)
        }
        Commands::Insert {
            input,
            section,
            content,
            content_file,
            keep_placeholder,
            output,
        } => {
            let content = match (content, content_file) {
                (Some(text), _) => text,
                (None, Some(path)) => fs::read_to_string(path)?,
                (None, None) => return Err("either --content or --content-file is required".into()),
            };
            cmd_insert(docfill, &input, section, &content, keep_placeholder, output.as_deref())
        }
        Commands::Fill {
            input,
            plan,
            keep_placeholder,
            no_tables,
            output,
        } => cmd_fill(docfill, &input, &plan, keep_placeholder, no_tables, output.as_deref()),
        Commands::Calc { input, output } => cmd_calc(docfill, &input, output.as_deref()),
        Commands::Json {
            input,
            output,
            compact,
        } => cmd_json(docfill, &input, output.as_deref(), compact),
        Commands::Text { input, output } => cmd_text(docfill, &input, output.as_deref()),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    }
}

/// Default output path: `<stem>_generated.<ext>` beside the input.
fn output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => input.with_file_name(output_file_name(input, "_generated")),
    }
}

fn save(session: &DocfillSession, input: &Path, output: Option<&Path>) -> CliResult {
    let path = output_path(input, output);
    if !session.save(&path) {
        return Err(format!("failed to save {}", path.display()).into());
    }
    println!("{} {}", "Saved to".green(), path.display());
    Ok(())
}

fn write_or_print(output: Option<&Path>, content: &str) -> CliResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_info(docfill: Docfill, input: &Path) -> CliResult {
    let session = docfill.open(input)?;
    let doc = session.document();
    let info = doc.info();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    if let Some(ref title) = info.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = info.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref created) = doc.metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = doc.metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let text = doc.plain_text();
    println!("{}: {}", "Paragraphs".bold(), info.paragraph_count);
    println!("{}: {}", "Tables".bold(), info.table_count);
    println!("{}: {}", "Page sections".bold(), info.section_count);
    println!("{}: {}", "Words".bold(), text.split_whitespace().count());
    println!("{}: {}", "Headed sections".bold(), session.sections().len());
    println!(
        "{}: {}",
        "Awaiting content".bold(),
        session.sections_needing_content().len()
    );

    Ok(())
}

fn cmd_sections(docfill: Docfill, input: &Path, pending: bool, json: bool) -> CliResult {
    let session = docfill.open(input)?;
    let listed: Vec<(usize, &docfill::Section)> = if pending {
        session.sections_needing_content()
    } else {
        session.sections().iter().enumerate().collect()
    };

    if json {
        let sections: Vec<docfill::Section> = listed.iter().map(|(_, s)| (*s).clone()).collect();
        println!("{}", sections_to_json(&sections, JsonFormat::Pretty)?);
        return Ok(());
    }

    if listed.is_empty() {
        println!("{}", "No sections found".yellow());
        return Ok(());
    }
    for (ordinal, section) in listed {
        let indent = "  ".repeat(section.level.saturating_sub(1) as usize);
        let marker = if section.has_placeholder {
            "needs content".yellow()
        } else {
            "".normal()
        };
        println!(
            "{:>3}  {}{} {} {}",
            ordinal.to_string().dimmed(),
            indent,
            section.title.bold(),
            format!("({} paragraphs)", section.content.len()).dimmed(),
            marker
        );
    }
    Ok(())
}

fn cmd_prompt(
    docfill: Docfill,
    input: &Path,
    section: usize,
    request: &GenerationRequest,
) -> CliResult {
    let session = docfill.open(input)?;
    let (system, prompt) = session.build_prompt(section, &SectionPromptBuilder::new(), request)?;

    println!("{}", "System".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}\n", system);
    println!("{}", "Prompt".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}\n", prompt);
    println!(
        "{}: ~{}",
        "Estimated tokens".bold(),
        estimate_tokens(&system) + estimate_tokens(&prompt)
    );
    Ok(())
}

fn cmd_insert(
    docfill: Docfill,
    input: &Path,
    section: usize,
    content: &str,
    keep_placeholder: bool,
    output: Option<&Path>,
) -> CliResult {
    let mut session = docfill.open(input)?;
    let title = session.section(section)?.title.clone();
    if !session.insert_content(section, content, keep_placeholder) {
        return Err(format!("could not insert content into section '{}'", title).into());
    }
    println!("{} {}", "Inserted content into".green(), title.bold());
    save(&session, input, output)
}

/// Read a plan: a JSON object whose keys are section numbers or titles.
fn read_plan(path: &Path, session: &DocfillSession) -> Result<GeneratedContent, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let entries = value
        .as_object()
        .ok_or("plan must be a JSON object of section -> text")?;

    let mut by_ordinal = Vec::new();
    let mut by_title = Vec::new();
    for (key, value) in entries {
        let content = value
            .as_str()
            .ok_or_else(|| format!("plan entry '{}' is not a string", key))?
            .to_string();
        match key.parse::<usize>() {
            Ok(ordinal) => by_ordinal.push((ordinal, content)),
            Err(_) => by_title.push((key.clone(), content)),
        }
    }

    let mut plan = GeneratedContent::by_title(session.sections(), by_title);
    for (ordinal, content) in by_ordinal {
        plan.insert(ordinal, content);
    }
    Ok(plan)
}

fn cmd_fill(
    docfill: Docfill,
    input: &Path,
    plan_path: &Path,
    keep_placeholder: bool,
    no_tables: bool,
    output: Option<&Path>,
) -> CliResult {
    let mut session = docfill.open(input)?;
    let plan = read_plan(plan_path, &session)?;

    let pb = ProgressBar::new(plan.len() as u64 + u64::from(!no_tables));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut inserted = 0;
    let mut failed = Vec::new();
    for (ordinal, content) in plan.iter() {
        let title = session
            .section(ordinal)
            .map(|s| s.title.clone())
            .unwrap_or_else(|_| format!("#{}", ordinal));
        pb.set_message(title.clone());
        if session.insert_content(ordinal, content, keep_placeholder) {
            inserted += 1;
        } else {
            failed.push(title);
        }
        pb.inc(1);
    }

    let mut calculations = 0;
    if !no_tables {
        pb.set_message("Calculating tables...");
        calculations = session.process_all_tables();
        pb.inc(1);
    }
    pb.finish_with_message("Done!");

    println!(
        "\n{} {} section(s) filled, {} table calculation(s)",
        "Done!".green().bold(),
        inserted,
        calculations
    );
    for title in &failed {
        println!("  {} {}", "skipped".yellow(), title);
    }
    save(&session, input, output)
}

fn cmd_calc(docfill: Docfill, input: &Path, output: Option<&Path>) -> CliResult {
    let mut session = docfill.open(input)?;
    let count = session.process_all_tables();
    println!("{} {} calculation(s)", "Computed".green(), count);
    save(&session, input, output)
}

fn cmd_json(docfill: Docfill, input: &Path, output: Option<&Path>, compact: bool) -> CliResult {
    let session = docfill.open(input)?;
    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    write_or_print(output, &session.to_json(format)?)
}

fn cmd_text(docfill: Docfill, input: &Path, output: Option<&Path>) -> CliResult {
    let session = docfill.open(input)?;
    write_or_print(output, &session.to_text()?)
}

fn cmd_version() {
    println!("{} {}", "docfill".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("DOCX section filling and table calculation tool");
    println!();
    println!("License: MIT");
}
