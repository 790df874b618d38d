use crate::cmd::{input_arg, output_arg, read_from_file_or_stdin, write_to_file_or_stdout};
use crate::cmd::{Cmd, RsaKitConfig};
use crate::error::RsaKitError;
use anyhow::Context;
use cipher::rsa::{decode_oaep, encode_oaep, OAEPOptions, PrivateKey, PublicKey};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
#[cfg(feature = "sec-zeroize")]
use zeroize::Zeroize;

/// RSAES-OAEP填充的编码和解码, 不做RSA运算
pub struct OAEPCmd;

impl OAEPCmd {
    const ENCODE: &'static str = "encode";
    const DECODE: &'static str = "decode";

    fn sub_cmd(name: &'static str, about: &'static str) -> Command {
        Command::new(name)
            .about(about)
            .arg(
                Arg::new("key")
                    .short('k')
                    .long("key")
                    .action(ArgAction::Set)
                    .value_parser(value_parser!(PathBuf))
                    .required(true)
                    .help("to specify the public or private key file path"),
            )
            .arg(
                Arg::new("label")
                    .short('l')
                    .long("label")
                    .action(ArgAction::Set)
                    .required(false)
                    .value_parser(value_parser!(String))
                    .help("to specify the label associated with the message"),
            )
            .arg(
                Arg::new("hash")
                    .long("hash")
                    .action(ArgAction::Set)
                    .required(false)
                    .value_parser(value_parser!(String))
                    .help("to specify the hash function, default to `oaep.hash`"),
            )
            .arg(
                Arg::new("mgf1-hash")
                    .long("mgf1-hash")
                    .action(ArgAction::Set)
                    .required(false)
                    .value_parser(value_parser!(String))
                    .help("to specify the mgf1 hash function, default to the same as `--hash`"),
            )
            .arg(input_arg())
            .arg(output_arg())
    }

    fn options(m: &ArgMatches) -> anyhow::Result<OAEPOptions> {
        let cfg = &RsaKitConfig::config().oaep;
        let hash = m.get_one::<String>("hash").unwrap_or(&cfg.hash);
        // 只指定了--hash时, mgf1也使用同一个哈希
        let mgf1_hash = match m.get_one::<String>("mgf1-hash") {
            Some(h) => Some(h.as_str()),
            None if m.get_one::<String>("hash").is_some() => None,
            None => cfg.mgf1_hash.as_deref(),
        };

        let opts = OAEPOptions::from_names(hash.as_str(), mgf1_hash)?;
        Ok(match m.get_one::<String>("label") {
            Some(l) => opts.with_label(l.as_bytes()),
            None => opts,
        })
    }

    fn encode(m: &ArgMatches) -> anyhow::Result<()> {
        let key = load_public_key(m)?;
        let opts = Self::options(m)?;
        let mut msg = read_from_file_or_stdin(m)?;

        let em = encode_oaep(&key, msg.as_slice(), &opts);
        #[cfg(feature = "sec-zeroize")]
        msg.zeroize();

        write_to_file_or_stdout(m, em?.as_slice())
    }

    fn decode(m: &ArgMatches) -> anyhow::Result<()> {
        let key = load_public_key(m)?;
        let opts = Self::options(m)?;
        let em = read_from_file_or_stdin(m)?;

        let mut msg = decode_oaep(&key, em.as_slice(), &opts).context("oaep decode failed")?;
        let res = write_to_file_or_stdout(m, msg.as_slice());
        #[cfg(feature = "sec-zeroize")]
        msg.zeroize();

        res
    }
}

impl Cmd for OAEPCmd {
    const NAME: &'static str = "oaep";

    fn cmd() -> Command {
        Command::new(Self::NAME)
            .about("RSAES-OAEP encoding method, PKCS #1 v2.2")
            .subcommand(Self::sub_cmd(
                Self::ENCODE,
                "pad the message to an encoded message of the modulus length",
            ))
            .subcommand(Self::sub_cmd(
                Self::DECODE,
                "recover the message from an encoded message",
            ))
            .subcommand_required(true)
    }

    fn run(&self, m: &ArgMatches) -> anyhow::Result<()> {
        match m.subcommand() {
            Some((Self::ENCODE, m)) => Self::encode(m),
            Some((Self::DECODE, m)) => Self::decode(m),
            Some((other, _)) => anyhow::bail!("not support the oaep {other}"),
            None => anyhow::bail!("need to specify encode or decode"),
        }
    }
}

fn load_public_key(m: &ArgMatches) -> anyhow::Result<PublicKey> {
    let p = m
        .get_one::<PathBuf>("key")
        .context("need to specify the key file")?;
    let data = std::fs::read(p).with_context(|| format!("read `{}` failed", p.display()))?;
    parse_public_key(p, data.as_slice())
}

/// 私钥文件中包含公钥, 两种格式都接受
fn parse_public_key(p: &Path, data: &[u8]) -> anyhow::Result<PublicKey> {
    let invalid = |reason: String| RsaKitError::InvalidKeyFile {
        path: p.display().to_string(),
        reason,
    };

    let value: serde_json::Value =
        serde_json::from_slice(data).map_err(|e| invalid(e.to_string()))?;

    let pk = if value.get("pk").is_some() {
        let sk: PrivateKey = serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
        sk.public_key().clone()
    } else {
        serde_json::from_value::<PublicKey>(value).map_err(|e| invalid(e.to_string()))?
    };

    pk.is_valid().map_err(|e| invalid(e.to_string()))?;
    Ok(pk)
}
