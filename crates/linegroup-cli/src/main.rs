//! linegroup CLI - numbered, tree-grouped output from the shell.
//!
//! Commands:
//! - `demo` - Tour of steps, nested groups, wrapping and arrays
//! - `spin` - Run an animated step for a while
//! - `cat` - Print a file or stdin as one group
//! - `run` - Run a command as a titled step, streaming its output
//! - `spinners` - List the spinner presets

#![forbid(unsafe_code)]

use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitCode, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use log::LevelFilter;

use linegroup::{
    Error, ErrorBoundary, GlyphRole, LogKind, Printer, Result, SPINNERS, SettingsPatch, logging,
};

/// linegroup - numbered, tree-grouped console output.
#[derive(Parser)]
#[command(name = "linegroup")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Settings file (TOML). Defaults to linegroup/config.toml in the user config directory.
    #[arg(long, short = 'c', global = true, env = "LINEGROUP_CONFIG")]
    config: Option<PathBuf>,

    /// Disable colors and spinner animation.
    #[arg(long, global = true)]
    plain: bool,

    /// Spinner preset index (see `linegroup spinners`).
    #[arg(long, global = true)]
    spinner: Option<usize>,

    /// Level of diagnostics printed as lines.
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show steps, nested groups, wrapping, arrays and customization.
    Demo {
        /// Delay between demo lines in milliseconds.
        #[arg(long, default_value = "300")]
        delay: u64,
    },

    /// Run an animated step for the given number of seconds.
    Spin {
        #[arg(long, short = 's', default_value = "3")]
        seconds: u64,
    },

    /// Print a file, or stdin, as one group.
    Cat {
        /// File to print. Reads stdin when omitted.
        file: Option<PathBuf>,
    },

    /// Run a command as a titled step.
    ///
    /// Each line the command writes becomes a line of the group; stderr
    /// lines are printed as warnings.
    Run {
        /// Command and its arguments (after --).
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },

    /// List the spinner presets.
    Spinners,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let printer = Printer::stdout();
    let boundary = ErrorBoundary::new(&printer);

    let Some(patch) = boundary.wrap_with_context(load_settings(&cli), "Loading settings") else {
        return ExitCode::FAILURE;
    };
    printer.configure(patch);
    let registration = boundary.wrap(logging::register(&printer, cli.log_level));

    let result = match cli.command {
        Commands::Demo { delay } => cmd_demo(&printer, Duration::from_millis(delay)),
        Commands::Spin { seconds } => cmd_spin(&printer, seconds),
        Commands::Cat { file } => cmd_cat(&printer, file.as_deref()),
        Commands::Run { command } => cmd_run(&printer, &command),
        Commands::Spinners => cmd_spinners(&printer),
    };
    boundary.wrap(result);

    let finished = match registration {
        Some(registration) => registration.unregister(),
        None => printer.shutdown(),
    };
    if let Err(e) = finished {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    if boundary.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Default settings file location.
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("linegroup").join("config.toml"))
}

/// Settings patch from the config file and the command-line flags.
///
/// A missing default file is fine; an explicitly named one must exist.
fn load_settings(cli: &Cli) -> Result<SettingsPatch> {
    let mut patch = SettingsPatch::new();

    match &cli.config {
        Some(path) => patch = patch.merge(SettingsPatch::from_file(path)?),
        None => {
            if let Some(path) = default_config_path().filter(|p| p.is_file()) {
                log::debug!("loading settings from {}", path.display());
                patch = patch.merge(SettingsPatch::from_file(&path)?);
            }
        }
    }

    if let Some(index) = cli.spinner {
        let frames = SPINNERS.get(index).ok_or_else(|| Error::Config {
            source_name: "--spinner".to_string(),
            message: format!("no preset {index}, expected 0-{}", SPINNERS.len() - 1),
        })?;
        patch = patch.spinner_frames(*frames);
    }

    if cli.plain {
        patch = patch.colored(false).animate(false);
    }

    Ok(patch)
}

// ============================================================================
// Demo Command
// ============================================================================

fn cmd_demo(p: &Printer, delay: Duration) -> Result<()> {
    let pause = || thread::sleep(delay);

    p.info("linegroup demo")?;

    p.divider("Steps")?;
    p.step("Build", || -> Result<()> {
        for unit in ["parser", "codec", "runtime"] {
            p.log(format!("compiling {unit}"))?;
            pause();
        }
        p.step("Tests", || -> Result<()> {
            for suite in ["unit", "integration", "doc"] {
                p.log(format!("{suite} tests passed"))?;
                pause();
            }
            Ok(())
        })??;
        p.log("linking")?;
        pause();
        Ok(())
    })??;

    p.divider("Groups")?;
    let outer = p.group_scope_with(|p| p.start("Deploy"))?;
    p.log("uploading artifacts")?;
    pause();
    {
        let inner = p.group_scope_with(|p| p.start("Migrate"))?;
        p.log("001_create_users")?;
        pause();
        p.log("002_add_index")?;
        pause();
        inner.close_with(|p| p.info("schema up to date"))??;
    }
    p.warn("cache warmup skipped")?;
    pause();
    outer.close_with(|p| p.info("deployed"))??;

    p.divider("Wrapping")?;
    p.log(
        "Long messages are wrapped at the terminal width. Continuation lines keep the \
         message column and start with the new-line glyph, inside and outside of groups.",
    )?;

    p.divider("Arrays")?;
    p.array(LogKind::Info, &["first line is the header", "middle", "last line is the footer"])?;
    p.dir(&serde_json::json!({
        "server": { "host": "localhost", "port": 8080 },
        "features": ["spinner", "wrap"],
    }))?;
    p.table(
        &["step", "state", "time"],
        &[vec!["build", "ok", "1s 200ms"], vec!["test", "ok", "4s"], vec!["deploy", "skipped", "-"]],
    )?;

    p.divider("Customization")?;
    p.configure(
        SettingsPatch::new()
            .symbol(GlyphRole::Prefix, "$")
            .symbol(GlyphRole::GroupStart, "╭")
            .symbol(GlyphRole::GroupEnd, "╰")
            .spinner_frames(SPINNERS[10]),
    );
    p.step("Custom glyphs", || -> Result<()> {
        p.log("rounded corners")?;
        pause();
        p.log("another spinner")?;
        pause();
        Ok(())
    })??;

    Ok(())
}

// ============================================================================
// Spin Command
// ============================================================================

fn cmd_spin(p: &Printer, seconds: u64) -> Result<()> {
    let total = Duration::from_secs(seconds);
    p.step("Spin", || -> Result<()> {
        let started = Instant::now();
        p.log(format!("spinning for {seconds}s"))?;
        let mut elapsed = started.elapsed();
        while elapsed < total {
            p.log(format!("{}s left", (total - elapsed).as_secs_f64().ceil()))?;
            thread::sleep((total - elapsed).min(Duration::from_secs(1)));
            elapsed = started.elapsed();
        }
        Ok(())
    })?
}

// ============================================================================
// Cat Command
// ============================================================================

fn cmd_cat(p: &Printer, file: Option<&Path>) -> Result<()> {
    let bytes = match file {
        Some(path) => fs::read(path)?,
        None => {
            let mut bytes = Vec::new();
            io::stdin().lock().read_to_end(&mut bytes)?;
            bytes
        }
    };
    p.chunk(LogKind::Log, &bytes)
}

// ============================================================================
// Run Command
// ============================================================================

fn cmd_run(p: &Printer, command: &[String]) -> Result<()> {
    let Some((program, args)) = command.split_first() else {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "no command given").into());
    };
    let title = command.join(" ");

    let status = p.step(&title, || run_streaming(p, program, args))??;

    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("`{title}` exited with {status}")).into())
    }
}

/// Spawn the command and print its output line by line as it arrives.
///
/// If printing or reading fails the child is killed, and it is always reaped
/// before returning.
fn run_streaming(p: &Printer, program: &str, args: &[String]) -> Result<ExitStatus> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let streamed = thread::scope(|s| -> Result<()> {
        let errors = stderr.map(|stderr| {
            s.spawn(move || -> Result<()> {
                for line in BufReader::new(stderr).lines() {
                    p.warn(line?)?;
                }
                Ok(())
            })
        });

        let read = match stdout {
            Some(stdout) => print_lines(stdout, |line| p.log(line)),
            None => Ok(()),
        };
        if read.is_err() {
            // Unblocks the stderr reader, which the scope joins.
            kill(&mut child);
        }

        if let Some(handle) = errors {
            match handle.join() {
                Ok(result) => result?,
                Err(_) => log::warn!("stderr reader thread panicked"),
            }
        }
        read
    });

    if streamed.is_err() {
        kill(&mut child);
    }
    let status = child.wait()?;
    streamed.map(|()| status)
}

fn print_lines(reader: impl Read, mut print: impl FnMut(String) -> Result<()>) -> Result<()> {
    for line in BufReader::new(reader).lines() {
        print(line?)?;
    }
    Ok(())
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        log::debug!("failed to kill child process: {e}");
    }
}

// ============================================================================
// Spinners Command
// ============================================================================

fn cmd_spinners(p: &Printer) -> Result<()> {
    let lines: Vec<String> = SPINNERS
        .iter()
        .enumerate()
        .map(|(i, frames)| format!("{i:>2}  {frames}"))
        .collect();
    p.array(LogKind::Info, &lines)
}
