use anyhow::Result;
use border_cartpole_env::{
    CartPoleDiscreteAct, CartPoleDiscreteEnv, CartPoleEnvConfig, CartPoleObs,
    DiscreteActFilterConfig,
};
use border_core::{
    record::{BufferedRecorder, Record},
    util, Env as _, Policy,
};
use csv::WriterBuilder;
use serde::Serialize;
use std::{convert::TryFrom, fs::File};

type Env = CartPoleDiscreteEnv;
type EnvConfig = CartPoleEnvConfig<DiscreteActFilterConfig>;

struct RandomPolicy;

impl Policy<Env> for RandomPolicy {
    fn sample(&mut self, _: &CartPoleObs) -> CartPoleDiscreteAct {
        let n = CartPoleDiscreteAct::N_ACTIONS as u8;
        fastrand::u8(..n).into()
    }
}

#[derive(Debug, Serialize)]
struct CartPoleRecord {
    episode: usize,
    step: usize,
    reward: f32,
    act: f32,
    force: f32,
    x: f32,
    x_dot: f32,
    theta: f32,
    theta_dot: f32,
}

impl TryFrom<&Record> for CartPoleRecord {
    type Error = anyhow::Error;

    fn try_from(record: &Record) -> Result<Self> {
        Ok(Self {
            episode: record.get_scalar("episode")? as _,
            step: record.get_scalar("step")? as _,
            reward: record.get_scalar("reward")?,
            act: record.get_scalar("act")?,
            force: record.get_scalar("force")?,
            x: record.get_scalar("x")?,
            x_dot: record.get_scalar("x_dot")?,
            theta: record.get_scalar("theta")?,
            theta_dot: record.get_scalar("theta_dot")?,
        })
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    fastrand::seed(42);

    let mut env = Env::build(&EnvConfig::default(), 42)?;
    let mut recorder = BufferedRecorder::new();
    let mut policy = RandomPolicy;

    let _ = util::eval_with_recorder(&mut env, &mut policy, 5, &mut recorder)?;

    let mut wtr = WriterBuilder::new().from_writer(File::create("random_cartpole_eval.csv")?);
    for record in recorder.iter() {
        wtr.serialize(CartPoleRecord::try_from(record)?)?;
    }
    wtr.flush()?;

    Ok(())
}
