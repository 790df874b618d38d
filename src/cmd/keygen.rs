use crate::cmd::{output_arg, write_to_file_or_stdout, Cmd, RsaKitConfig};
use crate::error::RsaKitError;
use cipher::rsa::{KeyGenerationState, Phase};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

pub struct KeyGenCmd;

impl Cmd for KeyGenCmd {
    const NAME: &'static str = "keygen";

    fn cmd() -> Command {
        Command::new(Self::NAME)
            .about("rsa key pair generate")
            .arg(
                Arg::new("bits")
                    .value_name("BITS")
                    .action(ArgAction::Set)
                    .required(false)
                    .value_parser(value_parser!(usize))
                    .help("to specify the public key modulus bits length, default to `keygen.bits`"),
            )
            .arg(
                Arg::new("exp")
                    .long("exp")
                    .short('e')
                    .action(ArgAction::Set)
                    .required(false)
                    .value_parser(value_parser!(u64))
                    .help("to specify the public exponent, default to `keygen.exponent`"),
            )
            .arg(
                Arg::new("step")
                    .long("step-ms")
                    .action(ArgAction::Set)
                    .required(false)
                    .value_parser(value_parser!(u64).range(1..))
                    .help("to specify the milliseconds of each generation step"),
            )
            .arg(output_arg())
    }

    fn run(&self, m: &ArgMatches) -> anyhow::Result<()> {
        let cfg = &RsaKitConfig::config().keygen;
        let (bits, exp, step_ms) = (
            m.get_one::<usize>("bits").copied().unwrap_or(cfg.bits),
            m.get_one::<u64>("exp").copied().unwrap_or(cfg.exponent),
            m.get_one::<u64>("step").copied().unwrap_or(cfg.step_millis),
        );

        let mut state = KeyGenerationState::new(bits, exp)?;
        let mut phase = state.phase();
        log::info!("generating {bits} bits rsa key, e = {exp}");

        while !state.step(step_ms) {
            if state.phase() != phase {
                phase = state.phase();
                log::info!("{:?} after {} steps", phase, state.steps());
            } else {
                log::debug!("{:?} after {} steps", phase, state.steps());
            }
        }

        debug_assert_eq!(state.phase(), Phase::Done);
        let steps = state.steps();
        let (_pk, sk) = state.into_keys().ok_or(RsaKitError::KeyGenIncomplete)?;
        log::info!("key pair generated after {steps} steps");

        let key = serde_json::to_string_pretty(&sk)?;
        write_to_file_or_stdout(m, key.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::KeyGenCmd;
    use crate::cmd::Cmd;

    #[test]
    fn keygen_args() {
        KeyGenCmd::cmd().debug_assert();

        let m = KeyGenCmd::cmd()
            .try_get_matches_from(["keygen", "1024", "--exp", "3", "--step-ms", "10"])
            .unwrap();
        assert_eq!(m.get_one::<usize>("bits"), Some(&1024));
        assert_eq!(m.get_one::<u64>("exp"), Some(&3));
        assert_eq!(m.get_one::<u64>("step"), Some(&10));

        assert!(KeyGenCmd::cmd()
            .try_get_matches_from(["keygen", "--step-ms", "0"])
            .is_err());
    }
}
