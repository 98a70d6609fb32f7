use std::path::PathBuf;

use crate::{Error, Result};

pub const DEFAULT_TTL_SECS: i64 = 1800;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// TTL applied by `set` when none is given.
    pub default_ttl: i64,
    /// Loaded at startup and saved on exit, when present.
    pub db_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL_SECS,
            db_file: None,
        }
    }
}

impl Config {
    /// Parses `--name value` pairs. The program name must already be stripped.
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let Some(name) = arg.strip_prefix("--") else {
                return Err(Error::Config(format!("invalid argument {:?}", arg)));
            };
            let value = args
                .next()
                .ok_or_else(|| Error::Config(format!("missing value for --{}", name)))?;

            match name {
                "default-ttl" => {
                    config.default_ttl = value.parse().map_err(|_| {
                        Error::Config(format!("invalid default ttl {:?}", value))
                    })?;
                }
                "db-file" => config.db_file = Some(PathBuf::from(value)),
                _ => return Err(Error::Config(format!("unknown option --{}", name))),
            }
        }

        Ok(config)
    }
}
