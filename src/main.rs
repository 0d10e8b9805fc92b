use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use cosmoscope::params::{FractalParams, ParameterSet, ParticleParams};
use cosmoscope::presets::preset_table;
use cosmoscope::{FractalPreset, ParticlePreset, Preset, Scene, Theme, Visualizer, VisualizerError};

#[derive(Parser, Debug)]
#[command(name = "cosmoscope", version, about = "Curl-noise galaxy and ray-marched Mandelbulb")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Curl-noise galaxy particles.
    Particles(ViewArgs),
    /// Ray-marched power-N Mandelbulb.
    Mandelbulb(ViewArgs),
    /// Print the presets and parameter ranges of both pipelines.
    Presets,
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// Preset to start from.
    #[arg(long)]
    preset: Option<String>,

    /// Seed for the particle spawn sampler.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = ThemeArg::Dark)]
    theme: ThemeArg,

    #[arg(long, default_value_t = false)]
    auto_rotate: bool,

    #[arg(long, default_value_t = 1.0)]
    rotation_speed: f32,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Directory for saved PNG frames.
    #[arg(long, default_value = "captures")]
    capture_dir: PathBuf,

    /// Override a parameter, e.g. `--set power=9.5`. Repeatable.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    settings: Vec<String>,
}

// Used when no subcommand is given; mirrors the flag defaults
impl Default for ViewArgs {
    fn default() -> Self {
        Self {
            preset: None,
            seed: None,
            theme: ThemeArg::Dark,
            auto_rotate: false,
            rotation_speed: 1.0,
            width: 1280,
            height: 720,
            capture_dir: PathBuf::from("captures"),
            settings: Vec::new(),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
enum ThemeArg {
    #[default]
    Dark,
    Light,
}

impl From<ThemeArg> for Theme {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Light => Theme::Light,
        }
    }
}

fn configure<S: Scene>(mut visualizer: Visualizer<S>, args: ViewArgs) -> Result<Visualizer<S>, VisualizerError> {
    if let Some(name) = &args.preset {
        let preset = S::Preset::from_name(name).inspect_err(|_| log::warn!("Unknown preset '{}'", name))?;
        visualizer = visualizer.with_preset(preset);
    }
    if let Some(seed) = args.seed {
        visualizer = visualizer.with_seed(seed);
    }
    for setting in args.settings {
        visualizer = visualizer.with_setting(setting);
    }
    Ok(visualizer
        .with_theme(args.theme.into())
        .with_auto_rotate(args.auto_rotate)
        .with_rotation_speed(args.rotation_speed)
        .with_window_size(args.width, args.height)
        .with_capture_dir(args.capture_dir))
}

fn print_presets<Pr: Preset>(title: &str) {
    println!("{} presets:", title);
    for (name, values) in preset_table::<Pr>() {
        println!("  {}", name);
        for (field, value) in values {
            println!("    {:<16} {:>10}", field, value);
        }
    }
}

fn print_fields<P: ParameterSet>(title: &str) {
    println!("{} parameters:", title);
    println!("  {:<16} {:>10} {:>10} {:>8}", "name", "min", "max", "step");
    for spec in P::FIELDS {
        println!("  {:<16} {:>10} {:>10} {:>8}", spec.name, spec.min, spec.max, spec.step);
    }
}

fn main() -> Result<(), VisualizerError> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Particles(ViewArgs::default())) {
        Command::Particles(args) => configure(Visualizer::particles(), args)?.run(),
        Command::Mandelbulb(args) => configure(Visualizer::mandelbulb(), args)?.run(),
        Command::Presets => {
            print_presets::<ParticlePreset>("Galaxy");
            print_fields::<ParticleParams>("Galaxy");
            println!();
            print_presets::<FractalPreset>("Mandelbulb");
            print_fields::<FractalParams>("Mandelbulb");
            Ok(())
        }
    }
}
