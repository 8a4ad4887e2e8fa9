use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use template_stamper::console::{format_diff, format_line, Tone};
use template_stamper::prompt::Prompter;
use template_stamper::{
    load_from_path, CustomizationSession, EditOptions, Recipe, SessionInputs, StepOutcome,
    StepStatus,
};

#[derive(Parser)]
#[command(name = "template-stamper")]
#[command(about = "Customize a desktop app template directory", long_about = None)]
#[command(version)]
struct Cli {
    /// Template directory (defaults to the current directory)
    dir: Option<PathBuf>,

    /// TOML recipe overriding the built-in file layout and rules
    #[arg(short, long)]
    recipe: Option<PathBuf>,

    /// Dry run - show what would be changed without modifying files
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Keep a .bak copy of every file before overwriting it
    #[arg(short, long)]
    backup: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let color = !cli.no_color && env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();

    match run(cli, color) {
        Ok(code) => code,
        Err(e) => {
            log::debug!("unexpected error: {e:?}");
            eprintln!("{}", format_line(Tone::Failure, &format!("Unexpected error: {e}"), color));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, color: bool) -> Result<ExitCode> {
    let root = match cli.dir {
        Some(dir) => dir,
        None => env::current_dir()?,
    };
    let recipe = match &cli.recipe {
        Some(path) => load_from_path(path)?,
        None => Recipe::default(),
    };
    let options = EditOptions {
        dry_run: cli.dry_run,
        backup: cli.backup,
    };

    println!("{}", "Template Stamper".bold());
    println!("Template: {}", root.display());
    if options.dry_run {
        println!("{}", "[DRY RUN - no files will be modified]".cyan());
    }
    println!();

    let mut session = CustomizationSession::new(&root, recipe).with_options(options);

    // Fail before prompting when the directory is not a template
    let missing = session.missing_files();
    if !missing.is_empty() {
        report_missing(&missing, color);
        return Ok(ExitCode::FAILURE);
    }

    let inputs = collect_inputs()?;
    println!();

    let report = session.run_with(&inputs, |step| print_step(step, color));
    if report.is_aborted() {
        report_missing(&report.missing, color);
        return Ok(ExitCode::FAILURE);
    }

    let failed = report.failures().count();
    println!();
    println!("{}", "Summary:".bold());
    println!(
        "  {} steps, {} failed",
        report.steps.len(),
        if failed > 0 {
            failed.to_string().red()
        } else {
            failed.to_string().green()
        }
    );
    Ok(ExitCode::SUCCESS)
}

fn collect_inputs() -> Result<SessionInputs> {
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());

    let display_text = prompter.ask("Display text", "Application")?;
    let attribution = prompter.ask("Attribution", "Unknown")?;
    let endpoint = prompter.ask_optional("Endpoint URL (empty to skip)")?;
    let icon = prompter
        .ask_optional("Icon file path (empty to skip)")?
        .map(PathBuf::from);
    let package = prompter.confirm("Run the packaging step now?", false)?;

    Ok(SessionInputs {
        display_text,
        attribution,
        endpoint,
        icon,
        package,
    })
}

fn print_step(step: &StepOutcome, color: bool) {
    match &step.status {
        StepStatus::Succeeded { detail, changed } => {
            let tone = if *changed { Tone::Success } else { Tone::Unchanged };
            let suffix = if *changed { "" } else { " (already up to date)" };
            println!(
                "{}",
                format_line(tone, &format!("{}: {detail}{suffix}", step.kind), color)
            );
        }
        StepStatus::Skipped { reason } => {
            println!(
                "{}",
                format_line(Tone::Skipped, &format!("{}: skipped ({reason})", step.kind), color)
            );
        }
        StepStatus::Failed(e) => {
            eprintln!(
                "{}",
                format_line(Tone::Failure, &format!("{}: {e}", step.kind), color)
            );
        }
    }
    for diff in &step.diffs {
        println!("{}", format_diff(diff, color));
    }
}

fn report_missing(missing: &[String], color: bool) {
    eprintln!(
        "{}",
        format_line(
            Tone::Failure,
            &format!("Missing required files: {}", missing.join(", ")),
            color
        )
    );
    eprintln!(
        "{}",
        format_line(
            Tone::Info,
            "Run from a template directory or pass it as the first argument",
            color
        )
    );
}
