use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::PathBuf;

pub trait Cmd {
    const NAME: &'static str;

    fn cmd() -> Command;

    fn run(&self, m: &ArgMatches) -> anyhow::Result<()>;
}

mod config;
pub use config::{KeyGenConfig, OAEPConfig, RsaKitConfig};

mod keygen;
pub use keygen::KeyGenCmd;

mod oaep;
pub use oaep::OAEPCmd;

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .action(ArgAction::Set)
        .required(false)
        .value_parser(value_parser!(PathBuf))
        .help("to specify the output file path, default to stdout")
}

fn input_arg() -> Arg {
    Arg::new("input")
        .long("input")
        .short('i')
        .action(ArgAction::Set)
        .required(false)
        .value_parser(value_parser!(PathBuf))
        .help("to specify the input file path, default to stdin")
}

/// 从`input`指定的文件或者标准输入读取全部数据
fn read_from_file_or_stdin(m: &ArgMatches) -> anyhow::Result<Vec<u8>> {
    match m.get_one::<PathBuf>("input") {
        Some(p) => std::fs::read(p).with_context(|| format!("read `{}` failed", p.display())),
        None => {
            let mut buf = Vec::with_capacity(1024);
            std::io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .context("read stdin failed")?;
            Ok(buf)
        }
    }
}

/// 写入`output`指定的文件, 文件必须不存在; 未指定时写到标准输出
fn write_to_file_or_stdout(m: &ArgMatches, data: &[u8]) -> anyhow::Result<()> {
    match m.get_one::<PathBuf>("output") {
        Some(p) => {
            let mut f = OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(p)
                .with_context(|| format!("create `{}` failed", p.display()))?;
            f.write_all(data)?;
        }
        None => {
            let mut out = std::io::stdout().lock();
            out.write_all(data)?;
            out.flush()?;
        }
    }
    Ok(())
}
