use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::db::DEFAULT_DB_NAME;
use crate::init::InitOptions;

pub const DEFAULT_IMAGE_EXTS: &str = ".png,.jpg,.jpeg,.bmp,.gif";

/// Command line, every option also readable from an `HIC_*` variable.
#[derive(Parser, Debug, Clone)]
#[command(name = "hic", version)]
#[command(about = "Human image classifier: tag a directory of images over HTTP")]
pub struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, env = "HIC_IP")]
    pub ip: String,

    /// Port to bind the HTTP server to
    #[arg(long, env = "HIC_PORT")]
    pub port: u16,

    /// Build a new catalog before serving (needs --tags and --image-root)
    #[arg(long)]
    pub init: bool,

    /// With --init, drop an existing catalog first
    #[arg(long)]
    pub force: bool,

    /// Directory holding the images
    #[arg(long, env = "HIC_IMAGE_ROOT")]
    pub image_root: Option<PathBuf>,

    /// Comma separated list of accepted extensions, lowercase with leading dot
    #[arg(long, env = "HIC_IMAGE_EXTS", default_value = DEFAULT_IMAGE_EXTS)]
    pub image_exts: String,

    /// JSON file with the tag vocabulary
    #[arg(long, env = "HIC_TAGS")]
    pub tags: Option<PathBuf>,

    /// Database file (default: <image-root>/hic.db)
    #[arg(long, env = "HIC_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Verbose logging and request tracing
    #[arg(long)]
    pub debug: bool,

    /// Also write daily rolling log files to this directory
    #[arg(long, env = "HIC_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

/// Validated startup settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub ip: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Present when the catalog has to be built before serving.
    pub init: Option<InitOptions>,
    pub debug: bool,
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    pub fn into_settings(self) -> Result<Settings> {
        if self.force && !self.init {
            bail!("--force only applies together with --init");
        }

        let init = if self.init {
            let (Some(image_root), Some(tags_path)) = (self.image_root.clone(), self.tags.clone())
            else {
                bail!("--init requires --image-root and --tags");
            };
            Some(InitOptions {
                image_root,
                image_exts: self.image_exts.clone(),
                tags_path,
                force: self.force,
            })
        } else {
            None
        };

        let db_path = match (&self.db_path, &self.image_root) {
            (Some(path), _) => path.clone(),
            (None, Some(root)) => root.join(DEFAULT_DB_NAME),
            (None, None) => bail!("no database given: pass --db-path or --image-root"),
        };

        Ok(Settings {
            ip: self.ip,
            port: self.port,
            db_path,
            init,
            debug: self.debug,
            log_dir: self.log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Settings> {
        let mut argv = vec!["hic", "--ip", "127.0.0.1", "--port", "8080"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv)?.into_settings()
    }

    #[test]
    fn test_init_defaults_db_into_image_root() {
        let settings = parse(&["--init", "--image-root", "/data", "--tags", "t.json"]).unwrap();

        assert_eq!(settings.db_path, PathBuf::from("/data/hic.db"));
        let init = settings.init.unwrap();
        assert_eq!(init.image_exts, DEFAULT_IMAGE_EXTS);
        assert_eq!(init.tags_path, PathBuf::from("t.json"));
        assert!(!init.force);
    }

    #[test]
    fn test_init_requires_tags_and_root() {
        assert!(parse(&["--init", "--image-root", "/data"]).is_err());
        assert!(parse(&["--init", "--tags", "t.json"]).is_err());
    }

    #[test]
    fn test_db_path_override() {
        let settings = parse(&["--db-path", "/tmp/x.db"]).unwrap();
        assert_eq!(settings.db_path, PathBuf::from("/tmp/x.db"));
        assert!(settings.init.is_none());
    }

    #[test]
    fn test_serving_needs_a_database() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--force", "--db-path", "x.db"]).is_err());
    }

    #[test]
    fn test_ip_and_port_are_required() {
        assert!(Cli::try_parse_from(["hic", "--port", "80"]).is_err());
        assert!(Cli::try_parse_from(["hic", "--ip", "0.0.0.0"]).is_err());
    }
}
