//! Balances the pole with a linear state feedback controller and saves the frames.
use anyhow::Result;
use border_cartpole_env::{
    CartPoleContinuousAct, CartPoleContinuousEnv, CartPoleEnvConfig, ColorMode,
    ContinuousActFilterConfig, DownScale, PixelArray, RenderMode, ResetOptions,
};
use border_core::Env as _;
use clap::{Parser, ValueEnum};
use image::{GrayImage, RgbImage};
use log::info;
use std::{fs, path::Path};

type Env = CartPoleContinuousEnv;
type EnvConfig = CartPoleEnvConfig<ContinuousActFilterConfig>;

// Gains on [x, x_dot, theta, theta_dot]
const GAINS: [f64; 4] = [1.0, 1.6567, 18.6854, 3.4594];

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Color {
    Rgb,
    Grayscale,
    Binary,
}

impl From<Color> for ColorMode {
    fn from(c: Color) -> Self {
        match c {
            Color::Rgb => ColorMode::Rgb,
            Color::Grayscale => ColorMode::Grayscale,
            Color::Binary => ColorMode::Binary,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Initial pole angle in degrees
    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    initial_angle: f64,

    /// Duration of the episode
    #[arg(long, default_value_t = 200)]
    max_steps: usize,

    /// Colour of the saved frames
    #[arg(long, value_enum, default_value_t = Color::Rgb)]
    color: Color,

    /// Down-scaling factor of the saved frames
    #[arg(long, default_value_t = 1)]
    factor: usize,

    /// Also show frames in a window (requires the `window` feature)
    #[arg(long, default_value_t = false)]
    show: bool,

    /// Directory where frames are saved, nothing is saved if omitted
    #[arg(long)]
    frame_dir: Option<String>,
}

fn control(state: [f64; 4]) -> CartPoleContinuousAct {
    GAINS
        .iter()
        .zip(state.iter())
        .map(|(k, s)| k * s)
        .sum::<f64>()
        .into()
}

fn save_frame(pixels: &PixelArray, path: &Path) -> Result<()> {
    let (h, w, c) = pixels.dim();
    let raw = pixels.iter().copied().collect::<Vec<_>>();
    let invalid = || anyhow::anyhow!("inconsistent frame of shape {:?}", (h, w, c));
    match c {
        3 => RgbImage::from_raw(w as _, h as _, raw)
            .ok_or_else(invalid)?
            .save(path)?,
        _ => GrayImage::from_raw(w as _, h as _, raw)
            .ok_or_else(invalid)?
            .save(path)?,
    }
    Ok(())
}

/// Renders the current state, saving the frame if a directory is given.
fn render_frame(env: &mut Env, args: &Args) -> Result<()> {
    let scale = Some(DownScale::Factor(args.factor));
    let pixels = env.render_scaled(RenderMode::RgbArray, args.color.into(), args.show, scale)?;
    if let (Some(dir), Some(pixels)) = (&args.frame_dir, &pixels) {
        let path = Path::new(dir).join(format!("frame_{:04}.png", env.step_count()));
        save_frame(pixels, &path)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut env = Env::build(&EnvConfig::default(), 42)?;
    let options = ResetOptions::default()
        .initial_angle(args.initial_angle)
        .max_steps(args.max_steps);
    let mut obs = env.reset_with(&options)?;

    if let Some(dir) = &args.frame_dir {
        fs::create_dir_all(dir)?;
    }

    let mut r_total = 0.0;
    loop {
        render_frame(&mut env, &args)?;

        let (step, _) = env.step(&control(obs.state.to_array()))?;
        r_total += step.reward;
        if step.is_done() {
            info!(
                "Episode ended after {} steps by {:?}, return = {}",
                step.info.step_count, step.info.termination, r_total
            );
            break;
        }
        obs = step.obs;
    }
    // Terminal state
    render_frame(&mut env, &args)?;
    env.close();

    Ok(())
}
