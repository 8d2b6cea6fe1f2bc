//! lift-emu: emulator for a microprogrammed elevator controller

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use lift_emu::config::Config;
use lift_emu::lift::{ControllerStatus, LiftController, LiftState, MAX_FLOORS};
use lift_emu::seqnet::Program;
use lift_emu::testing::{Scenario, ScenarioRunner, ScenarioSuite};
use lift_emu::version;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn")
    ).init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");
    let rest: &[String] = args.get(2..).unwrap_or(&[]);
    let config = Config::get();

    match command {
        "dump" => cmd_dump(rest, config),
        "suite" => cmd_suite(rest, config),
        "run" => cmd_run(rest, config),
        "simulate" => cmd_simulate(rest, config),
        "export" => cmd_export(rest),
        "config" => {
            if let Some(path) = Config::user_config_path() {
                println!("# User config location: {}", path.display());
            }
            print!("{}", Config::sample_config());
            Ok(())
        }
        "version" | "--version" | "-V" => {
            println!("{}", version::banner());
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            print_usage();
            bail!("unknown command: {}", other)
        }
    }
}

fn print_usage() {
    println!("{}", version::banner());
    println!();
    println!("Usage: lift-emu <command> [options]");
    println!();
    println!("Commands:");
    println!("  dump [image]                       Print program memory table and listing");
    println!("  suite [dir] [--program image]      Run built-in or directory scenarios");
    println!("  run <scenario.toml> [--program image] [--trace]");
    println!("                                     Run a single scenario manifest");
    println!("  simulate [--floor N] [--calls a,b] [--door-closed] [--steps N]");
    println!("           [--break PC] [--program image] [--trace]");
    println!("                                     Run the controller from an ad-hoc state");
    println!("  export <image>                     Write the built-in program as an image");
    println!("  config                             Print a sample configuration file");
    println!("  version                            Print version information");
}

/// Value following `flag`, if present.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// First argument that is neither a flag nor a flag's value.
fn positional(args: &[String]) -> Option<&str> {
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
            continue;
        }
        if arg.starts_with("--") {
            skip = !matches!(arg.as_str(), "--trace" | "--door-closed");
            continue;
        }
        return Some(arg.as_str());
    }
    None
}

/// Program from `--program`, then the configured image, then the built-in one.
fn select_program(args: &[String], config: &Config) -> anyhow::Result<Program> {
    let path = flag_value(args, "--program")
        .map(PathBuf::from)
        .or_else(|| config.program_path());

    match path {
        Some(path) => Program::load_file(&path)
            .with_context(|| format!("loading program image {}", path.display())),
        None => Ok(Program::default_lift()),
    }
}

fn cmd_dump(args: &[String], config: &Config) -> anyhow::Result<()> {
    let program = match positional(args) {
        Some(path) => Program::load_file(Path::new(path))?,
        None => select_program(args, config)?,
    };

    print!("{}", program.dump());
    println!();
    print!("{}", program.disassemble());
    Ok(())
}

fn cmd_suite(args: &[String], config: &Config) -> anyhow::Result<()> {
    let program = select_program(args, config)?;
    let dir = positional(args).map(PathBuf::from).or_else(|| config.scenario_dir());

    let suite = match &dir {
        Some(dir) => ScenarioSuite::load_dir(dir, config.max_steps())?,
        None => ScenarioSuite::builtin(),
    };
    if suite.is_empty() {
        bail!("no scenarios found");
    }

    let runner = ScenarioRunner::new()
        .with_program(program)
        .with_max_steps(config.max_steps())
        .with_trace(has_flag(args, "--trace"));

    println!("[TEST] Running {} scenarios...", suite.len());
    let report = runner.run_suite(&suite);

    for failure in report.failures() {
        println!();
        print!("{}", failure.report());
    }
    println!();
    print!("{}", report.summary());

    if !report.all_passed() {
        bail!("{} scenario(s) failed", report.failed());
    }
    Ok(())
}

fn cmd_run(args: &[String], config: &Config) -> anyhow::Result<()> {
    let path = positional(args).ok_or_else(|| anyhow!("run requires a scenario manifest"))?;
    let scenario = Scenario::from_file(Path::new(path), config.max_steps())?;
    let runner = ScenarioRunner::new()
        .with_program(select_program(args, config)?)
        .with_max_steps(config.max_steps())
        .with_trace(has_flag(args, "--trace"));

    println!("INT: {}, PC preset: {}", scenario.initial, scenario.pc_preset);
    let outcome = runner.run(&scenario);
    print!("{}", outcome.report());

    if !outcome.passed {
        bail!("scenario '{}' failed", scenario.name);
    }
    Ok(())
}

fn cmd_simulate(args: &[String], config: &Config) -> anyhow::Result<()> {
    let floors = config.floors();
    if floors == 0 || floors > MAX_FLOORS {
        bail!("floors must be between 1 and {}, got {}", MAX_FLOORS, floors);
    }
    let floor = flag_value(args, "--floor")
        .unwrap_or("0")
        .parse::<u8>()
        .context("--floor expects a floor number")?;
    let steps = flag_value(args, "--steps")
        .unwrap_or("50")
        .parse::<u64>()
        .context("--steps expects a number")?;

    let calls = match flag_value(args, "--calls") {
        Some(list) => list
            .split(',')
            .filter(|s| !s.is_empty())
            .map(|s| s.trim().parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .context("--calls expects a comma separated floor list")?,
        None => Vec::new(),
    };

    if floor as usize >= floors {
        bail!("floor {} outside 0..{}", floor, floors);
    }
    if let Some(bad) = calls.iter().find(|&&c| c as usize >= floors) {
        bail!("call floor {} outside 0..{}", bad, floors);
    }

    let state = LiftState::with_calls(floors, floor, !has_flag(args, "--door-closed"), &calls);
    let mut controller = LiftController::new(&select_program(args, config)?, state);
    if has_flag(args, "--trace") {
        controller = controller.with_trace();
    }

    if let Some(pc) = flag_value(args, "--break") {
        controller.add_breakpoint(parse_address(pc)?);
    }

    println!("INT: {}", controller.plant());
    let result = controller.run(steps);

    for record in controller.trace() {
        println!("{}", record);
    }
    if let ControllerStatus::Breakpoint { pc } = controller.status() {
        println!("Breakpoint at PC 0x{:02X}", pc);
    }

    println!();
    controller.print_status();
    result?;
    Ok(())
}

fn parse_address(text: &str) -> anyhow::Result<u8> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => text.parse::<u8>(),
    };
    parsed.with_context(|| format!("invalid program address: {}", text))
}

fn cmd_export(args: &[String]) -> anyhow::Result<()> {
    let path = positional(args).ok_or_else(|| anyhow!("export requires an output path"))?;
    let program = Program::default_lift();
    program.save_file(Path::new(path))?;
    println!("Wrote {} words ({} bytes) to {}", program.len(), program.len() * 2, path);
    Ok(())
}
