use crate::error::RsaKitError;
use config::Config;
use crypto_hash::HashRegistry;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

static CONFIG: OnceLock<RsaKitConfig> = OnceLock::new();

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct KeyGenConfig {
    // modulus bits
    pub bits: usize,
    pub exponent: u64,
    // 每次调用step的时间上限, 毫秒
    pub step_millis: u64,
}

impl Default for KeyGenConfig {
    fn default() -> Self {
        Self {
            bits: 2048,
            exponent: 65537,
            step_millis: 100,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct OAEPConfig {
    pub hash: String,
    // 为空时和hash相同
    #[serde(default)]
    pub mgf1_hash: Option<String>,
}

impl Default for OAEPConfig {
    fn default() -> Self {
        Self {
            hash: "sha1".to_string(),
            mgf1_hash: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RsaKitConfig {
    pub keygen: KeyGenConfig,
    pub oaep: OAEPConfig,
}

impl RsaKitConfig {
    /// 未调用[`RsaKitConfig::init`]时返回默认配置
    pub fn config() -> &'static Self {
        CONFIG.get_or_init(Self::default)
    }

    /// 加载配置并缓存, 只有第一次调用生效
    pub fn init<P: AsRef<Path>>(f: Option<P>) -> anyhow::Result<&'static Self> {
        if let Some(c) = CONFIG.get() {
            return Ok(c);
        }

        let c = Self::load(f)?;
        Ok(CONFIG.get_or_init(|| c))
    }

    /// 默认值 -> 配置文件 -> 环境变量`RSAKIT__*`, 后面的覆盖前面的
    pub fn load<P: AsRef<Path>>(f: Option<P>) -> anyhow::Result<Self> {
        let default_config = Config::try_from(&RsaKitConfig::default())?;

        let mut config = Config::builder().add_source(default_config);
        if let Some(f) = f {
            config = config.add_source(config::File::from(f.as_ref()).required(true));
        }
        config = config.add_source(
            config::Environment::with_prefix("RSAKIT")
                .try_parsing(true)
                .separator("__"),
        );

        let config: RsaKitConfig = config.build()?.try_deserialize()?;
        config.validate()?;

        log::trace!("{:?}", config);

        Ok(config)
    }

    fn validate(&self) -> Result<(), RsaKitError> {
        let registry = HashRegistry::global();
        let hashes = [
            ("oaep.hash", Some(&self.oaep.hash)),
            ("oaep.mgf1_hash", self.oaep.mgf1_hash.as_ref()),
        ];
        for (key, name) in hashes {
            if let Some(name) = name {
                registry
                    .resolve(name)
                    .map_err(|e| RsaKitError::InvalidConfig {
                        key: key.to_string(),
                        reason: e.to_string(),
                    })?;
            }
        }

        if self.keygen.step_millis == 0 {
            return Err(RsaKitError::InvalidConfig {
                key: "keygen.step_millis".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::RsaKitConfig;
    use std::path::PathBuf;

    fn write_tmp(name: &str, content: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!("rsakit-{}-{}", std::process::id(), name));
        std::fs::write(&p, content).unwrap();
        p
    }

    #[test]
    fn default_config() {
        let c = RsaKitConfig::load(None::<&str>).unwrap();
        assert_eq!(c, RsaKitConfig::default());
        assert_eq!(c.keygen.bits, 2048);
        assert_eq!(c.keygen.exponent, 65537);
        assert_eq!(c.oaep.hash, "sha1");
        assert_eq!(c.oaep.mgf1_hash, None);
    }

    #[test]
    fn file_overrides_default() {
        let p = write_tmp(
            "override.json",
            r#"{"keygen": {"bits": 3072}, "oaep": {"hash": "sha256", "mgf1_hash": "sha512"}}"#,
        );
        let c = RsaKitConfig::load(Some(&p)).unwrap();
        std::fs::remove_file(&p).unwrap();

        assert_eq!(c.keygen.bits, 3072);
        assert_eq!(c.keygen.step_millis, 100);
        assert_eq!(c.oaep.hash, "sha256");
        assert_eq!(c.oaep.mgf1_hash.as_deref(), Some("sha512"));
    }

    #[test]
    fn invalid_hash() {
        let p = write_tmp("invalid.json", r#"{"oaep": {"hash": "md5"}}"#);
        let c = RsaKitConfig::load(Some(&p));
        std::fs::remove_file(&p).unwrap();
        assert!(c.is_err());
    }
}
