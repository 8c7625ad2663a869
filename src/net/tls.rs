//! TLS configuration and certificate loading.

use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsConfig;

/// Certificate and key locations, relative paths taken from `root`.
pub fn resolve_paths(tls: &TlsConfig, root: &Path) -> (PathBuf, PathBuf) {
    (root.join(&tls.cert_path), root.join(&tls.key_path))
}

/// Load the PEM certificate chain and key. ALPN offers `h2` and `http/1.1`.
pub async fn load_tls_config(tls: &TlsConfig, root: &Path) -> Result<RustlsConfig, std::io::Error> {
    let (cert_path, key_path) = resolve_paths(tls, root);
    for (kind, path) in [("Certificate", &cert_path), ("Private key", &key_path)] {
        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{kind} file not found: {}", path.display()),
            ));
        }
    }
    RustlsConfig::from_pem_file(cert_path, key_path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_use_root() {
        let tls = TlsConfig {
            cert_path: "certs/server.pem".to_string(),
            key_path: "/etc/keys/server.key".to_string(),
        };
        let (cert, key) = resolve_paths(&tls, Path::new("/srv/app"));
        assert_eq!(cert, PathBuf::from("/srv/app/certs/server.pem"));
        assert_eq!(key, PathBuf::from("/etc/keys/server.key"));
    }

    #[tokio::test]
    async fn missing_certificate_is_reported() {
        let tls = TlsConfig {
            cert_path: "missing.pem".to_string(),
            key_path: "missing.key".to_string(),
        };
        let dir = tempfile::tempdir().unwrap();
        let err = load_tls_config(&tls, dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
