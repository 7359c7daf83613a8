//! Este modulo contiene la estructura que parsea los datos de
//! configuracion del coordinator a partir del archivo .conf
use crate::constantes::{
    ARCHIVO_REGISTRY, DIR_BACKUPS, DIR_CACHE, GRACIA_HEARTBEAT_SEGS, INTERVALO_HEARTBEAT_SEGS,
};
use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Estructura para almacenar la configuracion del coordinator
#[derive(Debug, Clone)]
pub struct Config {
    pub address: SocketAddr,
    pub registry_file: PathBuf,
    pub cache_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub log_file: String,
    pub intervalo_heartbeat_segs: u64,
    pub gracia_heartbeat_segs: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            address: "127.0.0.1:9000".parse().unwrap_or_else(|_| {
                SocketAddr::from(([127, 0, 0, 1], 9000))
            }),
            registry_file: PathBuf::from(ARCHIVO_REGISTRY),
            cache_dir: PathBuf::from(DIR_CACHE),
            backup_dir: PathBuf::from(DIR_BACKUPS),
            log_file: "coordinator.log".to_string(),
            intervalo_heartbeat_segs: INTERVALO_HEARTBEAT_SEGS,
            gracia_heartbeat_segs: GRACIA_HEARTBEAT_SEGS,
        }
    }
}

impl Config {
    /// Crea una nueva instancia de Config a partir de un archivo de
    /// configuracion con lineas `clave = valor`.
    ///
    /// # Parametros
    /// * `path`: ruta al archivo de configuracion
    ///
    /// # Retorna
    /// - `Ok(Config)` si la configuracion se carga correctamente
    /// - `Err(String)` con la clave o valor problematico
    pub fn from_file(path: &str) -> Result<Self, String> {
        let contenido = fs::read_to_string(path)
            .map_err(|e| format!("no se pudo leer '{path}': {e}"))?;
        let map = Self::parse_key_value_lines(&contenido)?;
        let mut config = Config::default();

        if let Some(valor) = map.get("address") {
            config.address = valor
                .parse()
                .map_err(|_| format!("address invalida: {valor}"))?;
        }
        if let Some(valor) = map.get("registry_file") {
            config.registry_file = PathBuf::from(valor);
        }
        if let Some(valor) = map.get("cache_dir") {
            config.cache_dir = PathBuf::from(valor);
        }
        if let Some(valor) = map.get("backup_dir") {
            config.backup_dir = PathBuf::from(valor);
        }
        if let Some(valor) = map.get("log_file") {
            config.log_file = valor.clone();
        }
        if let Some(valor) = map.get("heartbeat_interval_secs") {
            config.intervalo_heartbeat_segs = valor
                .parse()
                .map_err(|_| format!("heartbeat_interval_secs invalido: {valor}"))?;
        }
        if let Some(valor) = map.get("heartbeat_grace_secs") {
            config.gracia_heartbeat_segs = valor
                .parse()
                .map_err(|_| format!("heartbeat_grace_secs invalido: {valor}"))?;
        }
        Ok(config)
    }

    /// Parsea lineas `clave = valor`, ignorando vacias y comentarios `#`.
    fn parse_key_value_lines(contenido: &str) -> Result<HashMap<String, String>, String> {
        let mut map = HashMap::new();
        for linea in contenido.lines() {
            let linea = linea.trim();
            if linea.is_empty() || linea.starts_with('#') {
                continue;
            }
            let (clave, valor) = linea
                .split_once('=')
                .ok_or_else(|| format!("linea de configuracion invalida: {linea}"))?;
            map.insert(clave.trim().to_string(), valor.trim().to_string());
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test01_archivo_completo() {
        let dir = tempfile::TempDir::new().unwrap();
        let ruta = dir.path().join("coordinator.conf");
        let mut archivo = fs::File::create(&ruta).unwrap();
        writeln!(archivo, "# configuracion de prueba").unwrap();
        writeln!(archivo, "address = 0.0.0.0:9500").unwrap();
        writeln!(archivo, "registry_file = /tmp/registry.dat").unwrap();
        writeln!(archivo, "heartbeat_interval_secs = 2").unwrap();
        writeln!(archivo, "heartbeat_grace_secs = 5").unwrap();

        let config = Config::from_file(ruta.to_str().unwrap()).unwrap();
        assert_eq!(config.address.port(), 9500);
        assert_eq!(config.registry_file, PathBuf::from("/tmp/registry.dat"));
        assert_eq!(config.intervalo_heartbeat_segs, 2);
        assert_eq!(config.gracia_heartbeat_segs, 5);
        // las claves ausentes conservan el default
        assert_eq!(config.cache_dir, PathBuf::from(DIR_CACHE));
    }

    #[test]
    fn test02_linea_invalida() {
        let dir = tempfile::TempDir::new().unwrap();
        let ruta = dir.path().join("rota.conf");
        fs::write(&ruta, "sin igual").unwrap();
        assert!(Config::from_file(ruta.to_str().unwrap()).is_err());
    }

    #[test]
    fn test03_archivo_inexistente() {
        assert!(Config::from_file("/no/existe.conf").is_err());
    }
}
