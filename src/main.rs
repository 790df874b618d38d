use clap::{value_parser, Arg, ArgAction, Command};
use log::LevelFilter;
use rsakit::cmd::{Cmd, KeyGenCmd, OAEPCmd, RsaKitConfig};
use rsakit::log_error;
use std::path::PathBuf;

fn main() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let version = env!("RSAKIT_VERSION_INFO");
    let app = Command::new("rsakit")
        .version(version)
        .about("rsa key generation and oaep padding")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .action(ArgAction::Set)
                .required(false)
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("to specify the config file path"),
        )
        .subcommand(KeyGenCmd::cmd())
        .subcommand(OAEPCmd::cmd())
        .get_matches();

    if log_error(RsaKitConfig::init(app.get_one::<PathBuf>("config"))).is_none() {
        std::process::exit(2);
    }

    let res = match app.subcommand() {
        Some((KeyGenCmd::NAME, m)) => KeyGenCmd.run(m),
        Some((OAEPCmd::NAME, m)) => OAEPCmd.run(m),
        Some((name, _)) => Err(anyhow::anyhow!("unsupport for {name}")),
        None => {
            println!(
                "{} {} ({})",
                env!("CARGO_PKG_NAME"),
                version,
                env!("RSAKIT_GIT_INFO")
            );
            Ok(())
        }
    };

    if log_error(res).is_none() {
        std::process::exit(1);
    }
}
