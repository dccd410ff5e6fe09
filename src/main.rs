use clap::Parser;
use logly::prelude::*;
use std::io::{self, Write};
use std::path::Path;

use bindex::cli::{
    Cli, Commands, CreateArgs, ExtractArgs, InsertArgs, LoadArgs, PrintArgs, SearchArgs,
};
use bindex::core::config::{Config, ConfigManager};
use bindex::session::{LoadReport, Session};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = std::sync::Arc::new(Logger::new());
    let mut logger_config = LoggerConfig::default();

    let config_manager = ConfigManager::new()?;
    let config = config_manager.load_config()?;

    logger_config.color = config.logging.color;
    logger.configure(logger_config);

    if config.logging.log_to_file {
        config_manager.init()?;
        logger.add_sink(SinkConfig {
            path: Some(config_manager.log_dir().join("bindex.log")),
            rotation: Some("daily".to_string()),
            retention: Some(7),
            async_write: true,
            ..Default::default()
        })?;
    }

    match cli.command {
        Some(Commands::Create(args)) => handle_create(&args, &logger),
        Some(Commands::Insert(args)) => handle_insert(&args, &logger),
        Some(Commands::Search(args)) => handle_search(&args),
        Some(Commands::Load(args)) => handle_load(&args, &logger),
        Some(Commands::Print(args)) => handle_print(&args),
        Some(Commands::Extract(args)) => handle_extract(&args, &logger),
        Some(Commands::Shell(args)) => run_shell(args.file.as_deref(), &config, &logger),
        None => run_shell(None, &config, &logger),
    }
}

fn handle_create(args: &CreateArgs, logger: &Logger) -> anyhow::Result<()> {
    if args.path.exists() && !args.force {
        logger.error(format!(
            "File {} already exists (use --force to overwrite)",
            args.path.display()
        ))?;
        return Ok(());
    }

    let mut session = Session::new();
    session.create(&args.path)?;
    logger.success(format!("Created index file {}", args.path.display()))?;
    Ok(())
}

fn handle_insert(args: &InsertArgs, logger: &Logger) -> anyhow::Result<()> {
    let mut session = Session::new();
    session.open(&args.file)?;
    session.insert(args.key, args.value)?;
    logger.success(format!("Inserted key={}, value={}", args.key, args.value))?;
    Ok(())
}

fn handle_search(args: &SearchArgs) -> anyhow::Result<()> {
    let mut session = Session::new();
    session.open(&args.file)?;
    match session.search(args.key)? {
        Some((key, value)) => println!("Found: key={}, value={}", key, value),
        None => println!("Key {} not found.", args.key),
    }
    Ok(())
}

fn handle_load(args: &LoadArgs, logger: &Logger) -> anyhow::Result<()> {
    let mut session = Session::new();
    session.open(&args.file)?;
    let report = session.load(&args.input)?;
    report_load(&report, logger)?;
    Ok(())
}

fn handle_print(args: &PrintArgs) -> anyhow::Result<()> {
    let mut session = Session::new();
    session.open(&args.file)?;
    session.print(&mut io::stdout())?;
    Ok(())
}

fn handle_extract(args: &ExtractArgs, logger: &Logger) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        logger.error(format!(
            "File {} already exists (use --force to overwrite)",
            args.output.display()
        ))?;
        return Ok(());
    }

    let mut session = Session::new();
    session.open(&args.file)?;
    let count = session.extract(&args.output)?;
    logger.success(format!(
        "Extracted {} pairs to {}",
        count,
        args.output.display()
    ))?;
    Ok(())
}

fn report_load(report: &LoadReport, logger: &Logger) -> anyhow::Result<()> {
    for (number, line) in &report.skipped {
        logger.error(format!("Skipping invalid line {}: {:?}", number, line))?;
    }
    logger.success(format!("Loaded {} pairs", report.inserted))?;
    Ok(())
}

fn run_shell(startup: Option<&Path>, config: &Config, logger: &Logger) -> anyhow::Result<()> {
    let mut session = Session::new();

    if let Some(path) = startup {
        match session.open(path) {
            Ok(()) => logger.info(format!("Opened index file {}", path.display()))?,
            Err(e) => logger.error(e.to_string())?,
        }
    }

    loop {
        println!("\nCommands: create, open, insert, search, load, print, extract, quit");
        let Some(command) = prompt(&config.shell.prompt)? else {
            break;
        };

        match command.to_lowercase().as_str() {
            "create" => shell_create(&mut session, config, logger)?,
            "open" => shell_open(&mut session, logger)?,
            "insert" => shell_insert(&mut session, logger)?,
            "search" => shell_search(&mut session, logger)?,
            "load" => shell_load(&mut session, logger)?,
            "print" => shell_print(&mut session, logger)?,
            "extract" => shell_extract(&mut session, config, logger)?,
            "quit" => {
                session.close();
                println!("Goodbye!");
                break;
            }
            "" => {}
            other => logger.error(format!("Unknown command: {}", other))?,
        }
    }

    Ok(())
}

/// Prompt on stdout and read one trimmed line. `None` means stdin hit EOF.
fn prompt(message: &str) -> io::Result<Option<String>> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

fn prompt_u64(message: &str, logger: &Logger) -> anyhow::Result<Option<u64>> {
    let Some(raw) = prompt(message)? else {
        return Ok(None);
    };
    match raw.parse::<u64>() {
        Ok(value) => Ok(Some(value)),
        Err(_) => {
            logger.error(format!("Invalid input: {:?} is not an unsigned integer", raw))?;
            Ok(None)
        }
    }
}

/// Ask before clobbering an existing file. Returns false to abort.
fn confirm_overwrite(path: &Path, config: &Config) -> anyhow::Result<bool> {
    if !path.exists() || !config.shell.confirm_overwrite {
        return Ok(true);
    }
    let Some(answer) = prompt(&format!(
        "File {} already exists. Overwrite? (yes/no): ",
        path.display()
    ))?
    else {
        return Ok(false);
    };
    if answer.eq_ignore_ascii_case("yes") {
        Ok(true)
    } else {
        println!("Aborted.");
        Ok(false)
    }
}

fn shell_create(session: &mut Session, config: &Config, logger: &Logger) -> anyhow::Result<()> {
    let Some(name) = prompt("Enter file name: ")? else {
        return Ok(());
    };
    if name.is_empty() {
        logger.error("File name must not be empty".to_string())?;
        return Ok(());
    }
    let path = Path::new(&name);
    if !confirm_overwrite(path, config)? {
        return Ok(());
    }
    match session.create(path) {
        Ok(()) => logger.success(format!("Created index file {}", name))?,
        Err(e) => logger.error(e.to_string())?,
    }
    Ok(())
}

fn shell_open(session: &mut Session, logger: &Logger) -> anyhow::Result<()> {
    let Some(name) = prompt("Enter file name: ")? else {
        return Ok(());
    };
    match session.open(Path::new(&name)) {
        Ok(()) => logger.success(format!("Opened index file {}", name))?,
        Err(e) => logger.error(e.to_string())?,
    }
    Ok(())
}

fn shell_insert(session: &mut Session, logger: &Logger) -> anyhow::Result<()> {
    let Some(key) = prompt_u64("Enter key: ", logger)? else {
        return Ok(());
    };
    let Some(value) = prompt_u64("Enter value: ", logger)? else {
        return Ok(());
    };
    match session.insert(key, value) {
        Ok(()) => logger.success(format!("Inserted key={}, value={}", key, value))?,
        Err(e) => logger.error(e.to_string())?,
    }
    Ok(())
}

fn shell_search(session: &mut Session, logger: &Logger) -> anyhow::Result<()> {
    let Some(key) = prompt_u64("Enter key: ", logger)? else {
        return Ok(());
    };
    match session.search(key) {
        Ok(Some((key, value))) => println!("Found: key={}, value={}", key, value),
        Ok(None) => println!("Key {} not found.", key),
        Err(e) => logger.error(e.to_string())?,
    }
    Ok(())
}

fn shell_load(session: &mut Session, logger: &Logger) -> anyhow::Result<()> {
    let Some(name) = prompt("Enter file name to load: ")? else {
        return Ok(());
    };
    match session.load(Path::new(&name)) {
        Ok(report) => report_load(&report, logger)?,
        Err(e) => logger.error(e.to_string())?,
    }
    Ok(())
}

fn shell_print(session: &mut Session, logger: &Logger) -> anyhow::Result<()> {
    println!("B-tree structure:");
    if let Err(e) = session.print(&mut io::stdout()) {
        logger.error(e.to_string())?;
    }
    Ok(())
}

fn shell_extract(session: &mut Session, config: &Config, logger: &Logger) -> anyhow::Result<()> {
    let Some(name) = prompt("Enter file name to extract to: ")? else {
        return Ok(());
    };
    if name.is_empty() {
        logger.error("File name must not be empty".to_string())?;
        return Ok(());
    }
    let path = Path::new(&name);
    if !confirm_overwrite(path, config)? {
        return Ok(());
    }
    match session.extract(path) {
        Ok(count) => logger.success(format!("Extracted {} pairs to {}", count, name))?,
        Err(e) => logger.error(e.to_string())?,
    }
    Ok(())
}
