//! Este modulo contiene el builder del coordinator
use crate::config::config_parser::Config;
use crate::coordinator::Coordinator;
use crate::errores::CoordinatorError;
use crate::log_msj::log_mensajes::log_persistencia_cargada;
use crate::persistencia::persistencia::cargar_registro;
use crate::registro::busqueda::SearchCache;
use crate::registro::carpetas::FolderManager;
use crate::registro::registry::Registry;
use crate::registro::solicitudes::AccessRequestManager;
use crate::registro::usuarios::UserManager;
use crate::cluster::nodo_storage::ManagerNodos;
use logger::logger::Logger;
use std::fs;
use std::path::PathBuf;

/// Builder de [`Coordinator`]: parte de una configuracion (por defecto o
/// de un `.conf`), prepara los directorios de cache y respaldo y carga la
/// metadata persistida si existe.
#[derive(Debug, Default)]
pub struct CoordinatorBuilder {
    config: Option<Config>,
    address: Option<String>,
    registry_file: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    backup_dir: Option<PathBuf>,
    intervalo_heartbeat_segs: Option<u64>,
    gracia_heartbeat_segs: Option<i64>,
    logger: Option<Logger>,
}

impl CoordinatorBuilder {
    pub fn new() -> CoordinatorBuilder {
        CoordinatorBuilder::default()
    }

    /// Parte de una configuracion completa ya cargada.
    pub fn config(mut self, config: Config) -> CoordinatorBuilder {
        self.config = Some(config);
        self
    }

    /// Direccion de escucha `ip:puerto` (0 deja elegir al sistema).
    pub fn address(mut self, direccion: &str) -> CoordinatorBuilder {
        self.address = Some(direccion.to_string());
        self
    }

    /// Ruta del archivo de persistencia de la metadata.
    pub fn registry_file(mut self, ruta: PathBuf) -> CoordinatorBuilder {
        self.registry_file = Some(ruta);
        self
    }

    /// Directorios de cache de contenidos y de respaldos por nodo.
    pub fn directorios(mut self, cache: PathBuf, backup: PathBuf) -> CoordinatorBuilder {
        self.cache_dir = Some(cache);
        self.backup_dir = Some(backup);
        self
    }

    /// Periodo y ventana de gracia del detector de fallas.
    pub fn heartbeat(mut self, intervalo_segs: u64, gracia_segs: i64) -> CoordinatorBuilder {
        self.intervalo_heartbeat_segs = Some(intervalo_segs);
        self.gracia_heartbeat_segs = Some(gracia_segs);
        self
    }

    /// Logger del coordinator (por defecto uno nulo).
    pub fn logger(mut self, logger: Logger) -> CoordinatorBuilder {
        self.logger = Some(logger);
        self
    }

    /// Construye el coordinator: aplica los overrides a la configuracion,
    /// crea los directorios y carga la persistencia.
    pub fn build(self) -> Result<Coordinator, CoordinatorError> {
        let mut config = self.config.unwrap_or_default();
        if let Some(direccion) = self.address {
            config.address = direccion
                .parse()
                .map_err(|_| CoordinatorError::new_config_error(direccion))?;
        }
        if let Some(ruta) = self.registry_file {
            config.registry_file = ruta;
        }
        if let Some(dir) = self.cache_dir {
            config.cache_dir = dir;
        }
        if let Some(dir) = self.backup_dir {
            config.backup_dir = dir;
        }
        if let Some(intervalo) = self.intervalo_heartbeat_segs {
            config.intervalo_heartbeat_segs = intervalo;
        }
        if let Some(gracia) = self.gracia_heartbeat_segs {
            config.gracia_heartbeat_segs = gracia;
        }

        fs::create_dir_all(&config.cache_dir)
            .map_err(|e| CoordinatorError::new_io_error(&e, "START"))?;
        fs::create_dir_all(&config.backup_dir)
            .map_err(|e| CoordinatorError::new_io_error(&e, "START"))?;

        let logger = self.logger.unwrap_or_else(Logger::null);
        let registry = Registry::new();
        let carpetas = FolderManager::new();
        let cargados = cargar_registro(&config.registry_file, &registry, &carpetas)
            .map_err(|e| CoordinatorError::new_io_error(&e, "PERSISTENCIA"))?;
        if cargados > 0 {
            log_persistencia_cargada(
                &logger,
                cargados,
                &config.registry_file.to_string_lossy(),
            );
        }

        Ok(Coordinator {
            config,
            registry,
            carpetas,
            usuarios: UserManager::new(),
            solicitudes: AccessRequestManager::new(),
            busqueda: SearchCache::new(),
            nodos: ManagerNodos::new(),
            logger,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test01_build_prepara_directorios() {
        let dir = TempDir::new().unwrap();
        let coordinator = CoordinatorBuilder::new()
            .address("127.0.0.1:0")
            .registry_file(dir.path().join("registry.dat"))
            .directorios(dir.path().join("cache"), dir.path().join("backups"))
            .build()
            .unwrap();
        assert!(dir.path().join("cache").is_dir());
        assert!(dir.path().join("backups").is_dir());
        drop(coordinator);
    }

    #[test]
    fn test02_direccion_invalida() {
        assert!(CoordinatorBuilder::new().address("no es una direccion").build().is_err());
    }
}
