/*!
Structs to hold configuration data and global variables.
*/
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde::Deserialize;

use crate::{
    auth,
    render,
    store::Store,
    upload,
};

#[derive(Deserialize)]
struct ConfigFile {
    db_path: Option<PathBuf>,
    template_dir: Option<PathBuf>,
    static_dir: Option<PathBuf>,
    upload_root: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    session_minutes: Option<i64>,
    max_upload_bytes: Option<usize>,
    admin_uname: Option<String>,
    admin_password: Option<String>,
}

pub struct Cfg {
    pub db_path: PathBuf,
    pub template_dir: PathBuf,
    pub static_dir: PathBuf,
    pub upload_root: PathBuf,
    pub addr: SocketAddr,
    /// Admin sessions expire after this long without a request.
    pub session_minutes: i64,
    pub max_upload_bytes: usize,
    /// Inserted at startup only if the `admin` table is empty.
    pub default_admin_uname: Option<String>,
    pub default_admin_password: Option<String>,
}

impl std::default::Default for Cfg {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("Impact.db"),
            template_dir: PathBuf::from("templates"),
            static_dir: PathBuf::from("static"),
            upload_root: PathBuf::from("uploads"),
            addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            session_minutes: 60,
            max_upload_bytes: 16 * 1024 * 1024,
            default_admin_uname: None,
            default_admin_password: None,
        }
    }
}

impl std::fmt::Debug for Cfg {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Cfg")
            .field("db_path", &self.db_path)
            .field("template_dir", &self.template_dir)
            .field("static_dir", &self.static_dir)
            .field("upload_root", &self.upload_root)
            .field("addr", &self.addr)
            .field("session_minutes", &self.session_minutes)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("default_admin_uname", &self.default_admin_uname)
            .field(
                "default_admin_password",
                &self.default_admin_password.as_ref().map(|_| "[ redacted ]")
            )
            .finish()
    }
}

impl Cfg {
    pub fn from_toml(file_contents: &str) -> Result<Self, String> {
        let cf: ConfigFile = toml::from_str(file_contents)
            .map_err(|e| format!("Unable to deserialize config file: {}", &e))?;

        let mut c = Self::default();

        if let Some(p) = cf.db_path {
            c.db_path = p;
        }
        if let Some(p) = cf.template_dir {
            c.template_dir = p;
        }
        if let Some(p) = cf.static_dir {
            c.static_dir = p;
        }
        if let Some(p) = cf.upload_root {
            c.upload_root = p;
        }
        if let Some(s) = cf.host {
            c.addr.set_ip(
                s.parse().map_err(|e| format!(
                    "Error parsing {:?} as IP address: {}",
                    &s, &e
                ))?
            );
        }
        if let Some(n) = cf.port {
            c.addr.set_port(n);
        }
        if let Some(n) = cf.session_minutes {
            if n < 1 {
                return Err(format!("session_minutes must be positive (got {}).", &n));
            }
            c.session_minutes = n;
        }
        if let Some(n) = cf.max_upload_bytes {
            c.max_upload_bytes = n;
        }
        c.default_admin_uname = cf.admin_uname;
        c.default_admin_password = cf.admin_password;

        Ok(c)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let file_contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Unable to read config file {}: {}", path.display(), &e))?;
        Self::from_toml(&file_contents)
    }
}

/**
This guy hauls around the global resources and gets handed to the handlers
who need him as `State<Arc<Glob>>`. Nothing in him changes after startup.
*/
#[derive(Debug)]
pub struct Glob {
    pub store: Store,
    pub templates: Handlebars<'static>,
    pub static_dir: PathBuf,
    pub upload_root: PathBuf,
    pub addr: SocketAddr,
    pub session_minutes: i64,
    pub max_upload_bytes: usize,
}

/// Insert the configured default admin if there are no admins at all.
async fn ensure_default_admin(store: &Store, cfg: &Cfg) -> Result<(), String> {
    let (uname, password) = match (&cfg.default_admin_uname, &cfg.default_admin_password) {
        (Some(u), Some(p)) => (u, p),
        (None, None) => { return Ok(()); },
        _ => {
            log::warn!("Only one of admin_uname and admin_password configured; ignoring both.");
            return Ok(());
        },
    };

    log::trace!("Checking existence of any admin in data DB...");
    let n = store.count_admins().await
        .map_err(|e| format!("Error counting admins in data DB: {}", &e))?;
    if n > 0 {
        log::trace!("{} admin(s) already present; not inserting default.", &n);
        return Ok(());
    }

    log::info!("No admins in data DB; inserting default admin {:?}.", uname);
    store.insert_admin(uname, &auth::hash_password(password)).await
        .map_err(|e| format!("Error inserting default admin into data DB: {}", &e))?;

    Ok(())
}

/// Ensures the database tables and upload directories exist, loads
/// templates, and assembles the `Glob`.
pub async fn build_glob(cfg: Cfg) -> Result<Glob, String> {
    log::trace!("build_glob( {:?} ) called.", &cfg);

    log::trace!("Checking state of data DB...");
    let store = Store::new(cfg.db_path.clone());
    if let Err(e) = store.ensure_db_schema().await {
        let estr = format!("Unable to ensure state of data DB: {}", &e);
        return Err(estr);
    }
    log::trace!("...data DB okay.");

    ensure_default_admin(&store, &cfg).await?;

    upload::ensure_upload_dirs(&cfg.upload_root)
        .map_err(|e| format!(
            "Unable to create upload directories under {}: {}",
            cfg.upload_root.display(), &e
        ))?;

    let templates = render::load_templates(&cfg.template_dir)?;

    let glob = Glob {
        store,
        templates,
        static_dir: cfg.static_dir,
        upload_root: cfg.upload_root,
        addr: cfg.addr,
        session_minutes: cfg.session_minutes,
        max_upload_bytes: cfg.max_upload_bytes,
    };

    Ok(glob)
}

/// Reads the configuration file at `path` and builds the `Glob` from it.
pub async fn load_configuration<P: AsRef<Path>>(path: P) -> Result<Glob, String> {
    let cfg = Cfg::from_file(path.as_ref())?;
    log::info!("Configuration file read:\n{:#?}", &cfg);

    build_glob(cfg).await
}
