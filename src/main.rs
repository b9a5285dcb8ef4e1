use clap::Parser;
use rotor_balance::graphics::Canvas;
use rotor_balance::inputs::{MassSource, DEFAULT_MASS_COUNT, MASS_COUNT_RANGE};
use rotor_balance::scheduler::{FixedRateScheduler, Unthrottled};
use rotor_balance::widget::{terminal_size, BalanceWidget, TerminalGuard};
use rotor_balance::{AnimationDriver, BalanceResult, Error, Mass, MassInputs, Result, SimConfig};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

/// Static and dynamic balancing of masses on a rotating shaft
#[derive(Parser, Debug)]
#[command(name = "rotor-balance", version, about)]
struct Args {
    /// Number of masses on the shaft
    #[arg(short = 'n', long, default_value_t = DEFAULT_MASS_COUNT as u8,
          value_parser = clap::value_parser!(u8).range(1..=4))]
    masses: u8,

    /// Initial values for the next mass, as mass,radius,angle,position
    #[arg(long = "mass", value_name = "M,R,ANGLE,POS", allow_hyphen_values = true)]
    mass: Vec<String>,

    /// JSON file with simulation constants
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target frames per second
    #[arg(long)]
    fps: Option<f64>,

    /// Shaft angular velocity
    #[arg(long)]
    angular_velocity: Option<f64>,

    /// Absolute tolerance for the balance checks
    #[arg(long)]
    tolerance: Option<f64>,

    /// Run this many frames without the terminal UI and print the results
    #[arg(long)]
    frames: Option<u64>,

    /// Print headless results as JSON
    #[arg(long, requires = "frames")]
    json: bool,
}

#[derive(Serialize)]
struct HeadlessReport<'a> {
    phase: f64,
    masses: &'a [Mass],
    result: BalanceResult,
}

fn build_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(fps) = args.fps {
        config.frame_rate = fps;
    }
    if let Some(angular_velocity) = args.angular_velocity {
        config.angular_velocity = angular_velocity;
    }
    if let Some(tolerance) = args.tolerance {
        config.tolerance = tolerance;
    }
    config.validate()?;
    Ok(config)
}

fn build_inputs(args: &Args) -> Result<(MassInputs, usize)> {
    let max = *MASS_COUNT_RANGE.end();
    if args.mass.len() > max {
        return Err(Error::InvalidConfig(format!(
            "at most {max} masses can be given, got {}",
            args.mass.len()
        )));
    }
    let count = (args.masses as usize).max(args.mass.len());
    let mut inputs = MassInputs::new(count);
    for (index, spec) in args.mass.iter().enumerate() {
        let mass = Mass::parse_spec(spec).ok_or_else(|| Error::InvalidMassSpec(spec.clone()))?;
        inputs.set_mass(index, &mass);
    }
    Ok((inputs, count))
}

fn run_headless(
    out: &mut impl Write,
    mut driver: AnimationDriver,
    inputs: &MassInputs,
    frames: u64,
    json: bool,
) -> Result<()> {
    let config = driver.config();
    let mut canvas = Canvas::new(config.canvas_width, config.canvas_height, 80, 40);
    let result = driver.run_for(frames, inputs, &mut canvas, &mut Unthrottled);
    log::info!("ran {} frames headless", driver.state().frames);

    if json {
        let masses = inputs.get_masses(driver.mass_count());
        let report = HeadlessReport {
            phase: driver.phase(),
            masses: &masses,
            result,
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        writeln!(out, "Phase: {:.3}°", driver.phase())?;
        for line in result.report_lines() {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

fn run_interactive(driver: AnimationDriver, inputs: MassInputs) -> Result<()> {
    let mut scheduler = FixedRateScheduler::new(driver.config().frame_rate);
    let mut stdout = std::io::stdout();
    let _guard = TerminalGuard::new(&mut stdout)?;
    let (cols, rows) = terminal_size();
    let mut widget = BalanceWidget::new(driver, inputs, cols, rows);
    widget.run(&mut stdout, &mut scheduler)
}

/// Main function
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let (inputs, count) = build_inputs(&args)?;
    let driver = AnimationDriver::new(config, count);

    match args.frames {
        Some(frames) => run_headless(&mut std::io::stdout(), driver, &inputs, frames, args.json),
        None => run_interactive(driver, inputs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotor_balance::inputs::MassField;

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("rotor-balance").chain(extra.iter().copied()))
            .unwrap()
    }

    fn headless(args: &Args) -> String {
        let config = build_config(args).unwrap();
        let (inputs, count) = build_inputs(args).unwrap();
        let mut out = Vec::new();
        run_headless(
            &mut out,
            AnimationDriver::new(config, count),
            &inputs,
            args.frames.unwrap(),
            args.json,
        )
        .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn mass_rows_override_first_groups_and_raise_count() {
        let args = args(&["-n", "1", "--mass", "2,0.3,45,1.5", "--mass", "-1,0.2,10,0"]);
        let (inputs, count) = build_inputs(&args).unwrap();
        assert_eq!(count, 2);
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs.field(0, MassField::Value), Some("2"));
        assert_eq!(inputs.field(0, MassField::Angle), Some("45"));
        assert_eq!(inputs.field(1, MassField::Value), Some("-1"));
        assert_eq!(inputs.field(1, MassField::Position), Some("0"));
    }

    #[test]
    fn mass_rows_keep_remaining_defaults() {
        let args = args(&["--mass", "3,0.1,0,0"]);
        let (inputs, count) = build_inputs(&args).unwrap();
        assert_eq!(count, DEFAULT_MASS_COUNT);
        assert_eq!(inputs.field(0, MassField::Value), Some("3"));
        assert_eq!(inputs.get_masses(4)[3], Mass::default_for_index(3));
    }

    #[test]
    fn malformed_mass_row_is_rejected() {
        let args = args(&["--mass", "1,0.2,90"]);
        match build_inputs(&args) {
            Err(Error::InvalidMassSpec(spec)) => assert_eq!(spec, "1,0.2,90"),
            other => panic!("expected InvalidMassSpec, got {other:?}"),
        }
    }

    #[test]
    fn more_than_four_mass_rows_are_rejected() {
        let row = "1,0.2,0,0";
        let args = args(&["--mass", row, "--mass", row, "--mass", row, "--mass", row, "--mass", row]);
        assert!(matches!(build_inputs(&args), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn mass_count_outside_range_fails_to_parse() {
        assert!(Args::try_parse_from(["rotor-balance", "-n", "5"]).is_err());
        assert!(Args::try_parse_from(["rotor-balance", "--json"]).is_err());
    }

    #[test]
    fn command_line_overrides_config() {
        let config = build_config(&args(&["--fps", "30", "--tolerance", "0.5"])).unwrap();
        assert_eq!(config.frame_rate, 30.0);
        assert_eq!(config.tolerance, 0.5);
        assert!(build_config(&args(&["--fps", "0"])).is_err());
    }

    #[test]
    fn json_report_has_phase_masses_and_result() {
        let out = headless(&args(&["--frames", "0", "--json", "-n", "2"]));
        let report: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(report["phase"], 0.0);
        let masses = report["masses"].as_array().unwrap();
        assert_eq!(masses.len(), 2);
        assert_eq!(masses[1]["angle"], 90.0);
        assert_eq!(report["result"]["statically_balanced"], false);
        assert!(report["result"]["sum_fx"].is_number());
    }

    #[test]
    fn text_report_prints_phase_and_verdicts() {
        let out = headless(&args(&["--frames", "0"]));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "Phase: 0.000°");
        assert_eq!(lines[5], "Static Balance: Balanced");
        assert_eq!(lines[6], "Dynamic Balance: Unbalanced");
    }
}
