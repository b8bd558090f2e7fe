//! Color Profile Switcher: per-monitor ICC profile switching.
//!
//! Lists the displays colord knows about, loads a chosen profile into the
//! video card with ArgyllCMS `dispwin`, and records the choice in colord.
//! Runs as an interactive terminal menu or as one-shot commands.

use clap::{Parser, Subcommand};
use cps_core::config::{self, Config};
use cps_core::{Device, Error as CoreError, DISABLE_SENTINEL};
use cps_device::fetch_devices;
use cps_exec::{locate_tool, CommandRunner, SystemRunner, Tools};
use cps_profile::{resolve_monitor_index, ApplyWorker, ProfileApplier};
use log::{debug, LevelFilter};
use menu::{describe_outcome, dispatch_command, Dispatch, MenuCommand};
use std::error::Error;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

mod menu;
mod tui;

#[derive(Parser)]
#[command(
    name = "color-profile-switcher",
    version,
    about = "Switch per-monitor ICC color profiles via colord and dispwin",
    long_about = "Switch per-monitor ICC color profiles.\n\n\
        Loads the selected profile into the display's video LUT with\n\
        ArgyllCMS dispwin and makes it the colord default, or clears the\n\
        LUT and disables color management for the display."
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Resolve monitors but do not change any state
    #[arg(long, global = true)]
    dry_run: bool,

    /// Force non-interactive CLI mode (skip TUI)
    #[arg(long, global = true)]
    non_interactive: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List color-managed displays and their profiles
    Devices,

    /// Print the menu the TUI would show
    Menu,

    /// Print the dispwin monitor index for an output name
    Resolve {
        /// XRandR output name, e.g. eDP-1
        output: String,
    },

    /// Apply a profile to a device
    Apply {
        /// colord object path of the device
        #[arg(short, long)]
        device: String,

        /// colord profile id ("Disable" disables color management)
        #[arg(short, long)]
        profile: String,

        /// XRandR output name (looked up from colord if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// ICC file path (looked up from colord if omitted)
        #[arg(long)]
        icc: Option<String>,
    },

    /// Clear the loaded profile and disable color management for a device
    Disable {
        /// colord object path of the device
        #[arg(short, long)]
        device: String,

        /// XRandR output name (looked up from colord if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show tool locations, config and detected devices
    Probe,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print config file path
    Path,
    /// Reset config to defaults
    Reset,
}

/// Everything a command needs, built once from the CLI flags and config.
struct App {
    cfg: Config,
    config_path: PathBuf,
    tools: Tools,
    runner: Arc<SystemRunner>,
    applier: Arc<ProfileApplier>,
}

impl App {
    fn new(cfg: Config, config_path: PathBuf, dry_run: bool) -> Self {
        let tools = Tools::from_config(&cfg);
        let runner = Arc::new(SystemRunner::new(cfg.command_timeout()));
        let applier = ProfileApplier::new(runner.clone(), tools.clone())
            .with_rollback(cfg.rollback_on_failure)
            .with_dry_run(dry_run);
        Self {
            cfg,
            config_path,
            tools,
            runner,
            applier: Arc::new(applier),
        }
    }

    fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    fn devices(&self) -> Result<Vec<Device>, CoreError> {
        fetch_devices(self.runner(), &self.tools)
    }

    fn find_device(&self, path: &str) -> Result<Device, CoreError> {
        self.devices()?
            .into_iter()
            .find(|d| d.path == path)
            .ok_or_else(|| CoreError::DeviceNotFound {
                path: path.to_string(),
            })
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // Console logger; the level is settled once the config is read.
    env_logger::Builder::new()
        .filter_level(LevelFilter::Debug)
        .format_timestamp(None)
        .init();
    log::set_max_level(level_for(cli.verbose));

    let config_path = cli.config.clone().unwrap_or_else(config::config_path);
    let cfg = Config::load_from(&config_path);
    log::set_max_level(level_for(cli.verbose || cfg.verbose));
    debug!("Using config {}", config_path.display());

    let app = App::new(cfg, config_path, cli.dry_run);

    let command = match cli.command {
        Some(command) => command,
        None => {
            // No subcommand → interactive TUI (unless --non-interactive or not a terminal)
            if !cli.non_interactive && std::io::stdout().is_terminal() {
                return run_tui(&app, cli.dry_run);
            }
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            return Ok(());
        }
    };

    match command {
        Commands::Devices => cmd_devices(&app)?,
        Commands::Menu => cmd_menu(&app)?,
        Commands::Resolve { output } => cmd_resolve(&app, &output)?,
        Commands::Apply {
            device,
            profile,
            output,
            icc,
        } => cmd_apply(&app, &device, &profile, output, icc)?,
        Commands::Disable { device, output } => {
            cmd_apply(&app, &device, DISABLE_SENTINEL, output, None)?
        }
        Commands::Probe => cmd_probe(&app)?,
        Commands::Config { action } => cmd_config(&app, action)?,
    }

    Ok(())
}

fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

fn run_tui(app: &App, dry_run: bool) -> Result<(), Box<dyn Error>> {
    let worker = ApplyWorker::spawn(app.applier.clone());
    let mut session = tui::Session::new(app.config_path.clone(), dry_run);
    tui::run(app.runner(), &app.tools, &worker, &mut session)?;
    worker.shutdown();
    Ok(())
}

// ============================================================================
// Command implementations
// ============================================================================

fn cmd_devices(app: &App) -> Result<(), Box<dyn Error>> {
    let devices = app.devices()?;
    if devices.is_empty() {
        println!("No color-managed displays found.");
        return Ok(());
    }

    println!("Found {} display(s):\n", devices.len());
    for (i, device) in devices.iter().enumerate() {
        println!("  {}. {}", i + 1, device.display_name());
        println!("     Device:  {}", device.path);
        println!(
            "     Output:  {}",
            if device.xrandr_name.is_empty() {
                "(unknown)"
            } else {
                &device.xrandr_name
            }
        );
        println!(
            "     Enabled: {}",
            if device.enabled { "yes" } else { "no" }
        );
        if !device.model.is_empty() {
            println!("     Model:   {}", device.model);
        }
        if !device.serial.is_empty() {
            println!("     Serial:  {}", device.serial);
        }
        for profile in &device.profiles {
            println!("     Profile: {}  {}", profile.id, profile.path);
        }
    }
    Ok(())
}

fn cmd_menu(app: &App) -> Result<(), Box<dyn Error>> {
    let menu = menu::load_menu(app.runner(), &app.tools);
    if let Some(status) = &menu.status {
        println!("[WARN] {}", status);
    } else if menu.submenus.is_empty() {
        println!("(no devices)");
    }
    for submenu in &menu.submenus {
        println!("{}", submenu.label);
        for item in &submenu.items {
            println!("  {}", item.label);
        }
    }
    println!("{}", menu.exit.label);
    Ok(())
}

fn cmd_resolve(app: &App, output: &str) -> Result<(), Box<dyn Error>> {
    let index = resolve_monitor_index(app.runner(), &app.tools, output)?;
    println!("{}", index);
    Ok(())
}

fn cmd_apply(
    app: &App,
    device_path: &str,
    profile_id: &str,
    output: Option<String>,
    icc: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let disable = profile_id == DISABLE_SENTINEL;

    // Only ask colord when the caller left something out.
    let (output_name, profile_path) = match (output, icc) {
        (Some(output), Some(icc)) => (output, icc),
        (Some(output), None) if disable => (output, String::new()),
        (output, icc) => {
            let device = app.find_device(device_path)?;
            let profile_path = match icc {
                Some(icc) => icc,
                None if disable => String::new(),
                None => device
                    .find_profile(profile_id)
                    .map(|p| p.path.clone())
                    .ok_or_else(|| CoreError::ProfileNotFound {
                        device: device_path.to_string(),
                        profile: profile_id.to_string(),
                    })?,
            };
            (output.unwrap_or(device.xrandr_name), profile_path)
        }
    };

    if app.applier.is_dry_run() {
        println!("[DRY RUN] No state will be changed");
    }

    let command = if disable {
        MenuCommand::Disable {
            device_path: device_path.to_string(),
            output_name,
        }
    } else {
        MenuCommand::ApplyProfile {
            device_path: device_path.to_string(),
            output_name,
            profile_id: profile_id.to_string(),
            profile_path,
        }
    };

    let worker = ApplyWorker::spawn(app.applier.clone());
    let outcome = match dispatch_command(&command, &worker) {
        Dispatch::Queued(ticket) => ticket.wait()?,
        Dispatch::Ignored | Dispatch::Exit => return Ok(()),
    };
    worker.shutdown();

    let (summary, warning) = describe_outcome(&outcome);
    if let Some(warning) = warning {
        println!("[WARN] {}", warning);
    }
    println!("[OK]   {}", summary);
    Ok(())
}

fn cmd_probe(app: &App) -> Result<(), Box<dyn Error>> {
    let cfg = &app.cfg;

    println!("═══ Color Profile Switcher Probe ═══\n");

    println!("── Tools ──");
    for command in [&cfg.colormgr_command, &cfg.dispwin_command] {
        match locate_tool(command, &cfg.tool_search_paths) {
            Some(path) => println!("  {:<9} {} ✓", command, path.display()),
            None => println!("  {:<9} not found ✗", command),
        }
    }

    println!("\n── Config ──");
    println!("  File:     {}", app.config_path.display());
    println!("  Timeout:  {} ms", cfg.command_timeout_ms);
    println!("  Rollback: {}", cfg.rollback_on_failure);
    println!("  Verbose:  {}", cfg.verbose);

    println!("\n── Devices ({}) ──", cfg.device_kind);
    match app.devices() {
        Ok(devices) if devices.is_empty() => println!("  (none found)"),
        Ok(devices) => {
            for (i, device) in devices.iter().enumerate() {
                let index =
                    match resolve_monitor_index(app.runner(), &app.tools, &device.xrandr_name) {
                        Ok(index) => format!("dispwin -d {}", index),
                        Err(e) => format!("unresolved: {}", e),
                    };
                println!("  {}. {}  ({})", i + 1, device.display_name(), index);
                println!("     Device: {}", device.path);
            }
        }
        Err(e) => println!("  [ERR ] {}", e),
    }

    println!("\n═══ Probe complete ═══");
    Ok(())
}

fn cmd_config(app: &App, action: Option<ConfigAction>) -> Result<(), Box<dyn Error>> {
    match action {
        None | Some(ConfigAction::Show) => {
            let cfg = &app.cfg;
            println!("Config file: {}\n", app.config_path.display());
            println!("── Tools ──");
            println!("  colormgr_command    = \"{}\"", cfg.colormgr_command);
            println!("  dispwin_command     = \"{}\"", cfg.dispwin_command);
            println!("  tool_search_paths   = {:?}", cfg.tool_search_paths);
            println!("  device_kind         = \"{}\"", cfg.device_kind);
            println!("\n── Invocation ──");
            println!("  command_timeout_ms  = {}", cfg.command_timeout_ms);
            println!("  rollback_on_failure = {}", cfg.rollback_on_failure);
            println!("\n── Debug ──");
            println!("  verbose             = {}", cfg.verbose);
        }
        Some(ConfigAction::Path) => {
            println!("{}", app.config_path.display());
        }
        Some(ConfigAction::Reset) => {
            Config::write_default(&app.config_path)?;
            println!(
                "[OK] Config reset to defaults at {}",
                app.config_path.display()
            );
        }
    }
    Ok(())
}
