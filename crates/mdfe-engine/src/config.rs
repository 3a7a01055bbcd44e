//! Engine configuration
//!
//! [`EngineConfig`] is read from TOML and rendered into the `ACBrLib.ini`
//! artifact the native engine loads at start-up.

use mdfe_core::Environment;
use mdfe_ini::{IniDocument, IniError, IniSection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the generated engine configuration file
pub const CONFIG_FILE_NAME: &str = "ACBrLib.ini";

/// Subdirectories created under the base path
pub const OUTPUT_DIRS: [&str; 4] = ["Schemas", "MDFe", "Evento", "PDF"];

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("config io error at {path}: {source}")]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML could not be parsed
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML could not be produced
    #[error("config serialization failed: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// INI artifact could not be built
    #[error(transparent)]
    Ini(#[from] IniError),

    /// Semantically invalid values
    #[error("invalid config: {0}")]
    Validation(String),
}

impl ConfigError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Signing certificate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateConfig {
    /// A1 certificate file
    #[serde(default)]
    pub pfx_path: Option<PathBuf>,
    /// A1 certificate password
    #[serde(default)]
    pub password: Option<String>,
    /// A3 certificate serial number
    #[serde(default)]
    pub serial_number: Option<String>,
}

/// HTTP proxy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Host; proxy is disabled when absent
    #[serde(default)]
    pub host: Option<String>,
    /// Port
    #[serde(default = "default_proxy_port")]
    pub port: u16,
    /// User
    #[serde(default)]
    pub user: Option<String>,
    /// Password
    #[serde(default)]
    pub password: Option<String>,
}

/// Outgoing e-mail
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    /// SMTP host; e-mail is disabled when absent
    #[serde(default)]
    pub host: Option<String>,
    /// SMTP port
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Sender display name
    #[serde(default)]
    pub sender_name: Option<String>,
    /// Sender account
    #[serde(default)]
    pub account: Option<String>,
    /// Login
    #[serde(default)]
    pub user: Option<String>,
    /// Password
    #[serde(default)]
    pub password: Option<String>,
    /// Use SSL
    #[serde(default = "default_true")]
    pub ssl: bool,
    /// Use TLS
    #[serde(default = "default_true")]
    pub tls: bool,
}

/// DAMDFe rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfConfig {
    /// Landscape layout
    #[serde(default = "default_true")]
    pub landscape: bool,
    /// Printer name
    #[serde(default)]
    pub printer: Option<String>,
    /// Copies
    #[serde(default = "default_copies")]
    pub copies: u32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            landscape: true,
            printer: None,
            copies: default_copies(),
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Authority environment
    #[serde(default)]
    pub environment: Environment,
    /// Root of the engine's output tree
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,
    /// Where `ACBrLib.ini` is written; defaults under `base_path`
    #[serde(default)]
    pub config_file: Option<PathBuf>,
    /// Key used by the engine to encrypt stored passwords
    #[serde(default)]
    pub crypt_key: String,
    /// Response buffer size in bytes
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// Signing certificate
    #[serde(default)]
    pub certificate: CertificateConfig,
    /// HTTP proxy
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// Outgoing e-mail
    #[serde(default)]
    pub email: EmailConfig,
    /// PDF rendering
    #[serde(default)]
    pub pdf: PdfConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            base_path: default_base_path(),
            config_file: None,
            crypt_key: String::new(),
            buffer_capacity: default_buffer_capacity(),
            certificate: CertificateConfig::default(),
            proxy: ProxyConfig::default(),
            email: EmailConfig::default(),
            pdf: PdfConfig::default(),
        }
    }
}

fn default_base_path() -> PathBuf {
    PathBuf::from("MDFeFiles")
}

fn default_buffer_capacity() -> usize {
    crate::native::DEFAULT_BUFFER_CAPACITY
}

fn default_proxy_port() -> u16 {
    8080
}

fn default_smtp_port() -> u16 {
    587
}

fn default_copies() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl EngineConfig {
    /// Load from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse TOML
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_capacity == 0 {
            return Err(ConfigError::Validation(
                "buffer_capacity must be positive".to_string(),
            ));
        }
        if self.certificate.pfx_path.is_some() && self.certificate.serial_number.is_some() {
            return Err(ConfigError::Validation(
                "certificate takes either pfx_path or serial_number, not both".to_string(),
            ));
        }
        Ok(())
    }

    /// Path of the generated `ACBrLib.ini`
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config_file
            .clone()
            .unwrap_or_else(|| self.base_path.join(CONFIG_FILE_NAME))
    }

    /// Directory receiving rendered PDFs
    #[must_use]
    pub fn pdf_dir(&self) -> PathBuf {
        self.base_path.join("PDF")
    }

    /// Engine configuration as an INI document
    pub fn to_ini(&self) -> Result<IniDocument, ConfigError> {
        let base = self.base_path.display().to_string();
        let sub = |name: &str| self.base_path.join(name).display().to_string();
        let mut doc = IniDocument::new();

        doc.push(
            IniSection::new("Principal")?
                .with("TipoResposta", "1")
                .with("CodResposta", "0"),
        );

        // engine numbering: 0 production, 1 homologation
        let ambiente = match self.environment {
            Environment::Production => "0",
            Environment::Homologation => "1",
        };
        doc.push(
            IniSection::new("MDFe")?
                .with("Ambiente", ambiente)
                .with("VersaoDF", mdfe_generator::manifest::LAYOUT_VERSION)
                .with("FormaEmissao", "1")
                .with("Visualizar", "0")
                .with("SalvarGer", "1")
                .with("SalvarEnv", "1")
                .with("SalvarSoap", "1")
                .with("PathSalvar", base.as_str())
                .with("PathSchemas", sub("Schemas"))
                .with("PathMDFe", sub("MDFe"))
                .with("PathEvento", sub("Evento"))
                .with("ValidarDigest", "1"),
        );

        doc.push(
            IniSection::new("DAMDFe")?
                .with("PathPDF", sub("PDF"))
                .with("TipoDAMDFe", if self.pdf.landscape { "1" } else { "0" })
                .with("TamanhoPapel", "0")
                .with("Impressora", self.pdf.printer.clone().unwrap_or_default())
                .with("NumeroCopias", self.pdf.copies.to_string()),
        );

        let mut dfe = IniSection::new("DFe")?;
        let cert = &self.certificate;
        if let Some(pfx) = &cert.pfx_path {
            dfe.insert("SSLType", "5");
            dfe.insert("ArquivoPFX", pfx.display().to_string());
            dfe.insert("Senha", cert.password.clone().unwrap_or_default());
        } else if let Some(serial) = &cert.serial_number {
            dfe.insert("SSLType", "6");
            dfe.insert("NumeroSerie", serial.as_str());
        } else {
            dfe.insert("SSLType", "0");
        }
        doc.push(dfe);

        let mut proxy = IniSection::new("Proxy")?;
        match &self.proxy.host {
            Some(host) => {
                proxy.insert("Servidor", host.as_str());
                proxy.insert("Porta", self.proxy.port.to_string());
                proxy.insert("Usuario", self.proxy.user.clone().unwrap_or_default());
                proxy.insert("Senha", self.proxy.password.clone().unwrap_or_default());
            }
            None => {
                proxy.insert("Servidor", "");
                proxy.insert("Porta", "");
            }
        }
        doc.push(proxy);

        let mut email = IniSection::new("Email")?;
        let mail = &self.email;
        match &mail.host {
            Some(host) => {
                email.insert("Nome", mail.sender_name.clone().unwrap_or_default());
                email.insert("Conta", mail.account.clone().unwrap_or_default());
                email.insert("Usuario", mail.user.clone().unwrap_or_default());
                email.insert("Senha", mail.password.clone().unwrap_or_default());
                email.insert("Servidor", host.as_str());
                email.insert("Porta", mail.port.to_string());
                email.insert("SSL", u8::from(mail.ssl).to_string());
                email.insert("TLS", u8::from(mail.tls).to_string());
            }
            None => {
                email.insert("Nome", "");
                email.insert("Conta", "");
                email.insert("Servidor", "");
            }
        }
        doc.push(email);

        Ok(doc)
    }

    /// Create the output tree and write `ACBrLib.ini`; returns its path
    pub fn provision(&self) -> Result<PathBuf, ConfigError> {
        std::fs::create_dir_all(&self.base_path).map_err(|e| ConfigError::io(&self.base_path, e))?;
        for dir in OUTPUT_DIRS {
            let path = self.base_path.join(dir);
            std::fs::create_dir_all(&path).map_err(|e| ConfigError::io(&path, e))?;
        }

        let path = self.config_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }
        std::fs::write(&path, self.to_ini()?.to_ini_string()).map_err(|e| ConfigError::io(&path, e))?;

        tracing::info!(path = %path.display(), "engine configuration written");
        Ok(path)
    }
}
