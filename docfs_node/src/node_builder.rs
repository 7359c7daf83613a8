//! Este modulo contiene el builder del nodo de almacenamiento
use crate::archivos::file_ops::ArchivosNodo;
use crate::bloqueos::tabla_locks::TablaLocks;
use crate::bloqueos::tabla_undo::TablaUndo;
use crate::constantes::{DIR_BACKUPS, DIR_STORAGE, OFFSET_PUERTO_CONTROL};
use crate::errores::NodeError;
use crate::node::StorageNode;
use crate::registro::descubrir_ip_local;
use logger::logger::Logger;
use std::path::PathBuf;

/// Builder de [`StorageNode`] con valores por defecto razonables: ip
/// descubierta, puerto de control derivado del de clientes y arboles
/// `storage/` y `backups/` relativos al directorio de trabajo.
#[derive(Debug, Default)]
pub struct NodeBuilder {
    id: Option<String>,
    coordinator: Option<String>,
    ip_anunciada: Option<String>,
    puerto_cliente: Option<u16>,
    base_storage: Option<PathBuf>,
    base_backup: Option<PathBuf>,
    logger: Option<Logger>,
}

impl NodeBuilder {
    pub fn new() -> NodeBuilder {
        NodeBuilder::default()
    }

    /// Id del nodo dentro del cluster.
    pub fn id(mut self, id: &str) -> NodeBuilder {
        self.id = Some(id.to_string());
        self
    }

    /// Direccion `ip:puerto` del coordinator.
    pub fn coordinator(mut self, direccion: &str) -> NodeBuilder {
        self.coordinator = Some(direccion.to_string());
        self
    }

    /// Ip que el nodo anuncia en su registro (por defecto se descubre).
    pub fn ip_anunciada(mut self, ip: &str) -> NodeBuilder {
        self.ip_anunciada = Some(ip.to_string());
        self
    }

    /// Puerto de clientes; 0 deja elegir al sistema.
    pub fn puerto_cliente(mut self, puerto: u16) -> NodeBuilder {
        self.puerto_cliente = Some(puerto);
        self
    }

    /// Directorios base de los arboles de almacenamiento y respaldo.
    pub fn directorios(mut self, storage: PathBuf, backup: PathBuf) -> NodeBuilder {
        self.base_storage = Some(storage);
        self.base_backup = Some(backup);
        self
    }

    /// Logger del nodo (por defecto uno nulo).
    pub fn logger(mut self, logger: Logger) -> NodeBuilder {
        self.logger = Some(logger);
        self
    }

    /// Construye el nodo, preparando sus directorios en disco.
    ///
    /// # Errores
    /// - `NodeError` si falta el id o el coordinator, o si los directorios
    ///   no se pudieron crear
    pub fn build(self) -> Result<StorageNode, NodeError> {
        let id = self
            .id
            .ok_or_else(|| NodeError::new_start_error("falta el id del nodo".to_string()))?;
        let coordinator = self.coordinator.ok_or_else(|| {
            NodeError::new_start_error("falta la direccion del coordinator".to_string())
        })?;

        let puerto_cliente = self.puerto_cliente.unwrap_or(0);
        let base_storage = self.base_storage.unwrap_or_else(|| PathBuf::from(DIR_STORAGE));
        let base_backup = self.base_backup.unwrap_or_else(|| PathBuf::from(DIR_BACKUPS));
        let archivos = ArchivosNodo::new(&base_storage, &base_backup, &id)
            .map_err(|e| NodeError::new_start_error(e.to_string()))?;

        Ok(StorageNode {
            id,
            coordinator,
            ip_anunciada: self.ip_anunciada.unwrap_or_else(descubrir_ip_local),
            puerto_cliente,
            puerto_control: puerto_cliente.wrapping_add(OFFSET_PUERTO_CONTROL),
            archivos,
            locks: TablaLocks::new(),
            undo: TablaUndo::new(),
            logger: self.logger.unwrap_or_else(Logger::null),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test01_builder_exige_id_y_coordinator() {
        assert!(NodeBuilder::new().build().is_err());
        assert!(NodeBuilder::new().id("n1").build().is_err());
    }

    #[test]
    fn test02_builder_prepara_directorios() {
        let dir = TempDir::new().unwrap();
        let nodo = NodeBuilder::new()
            .id("n1")
            .coordinator("127.0.0.1:9000")
            .ip_anunciada("127.0.0.1")
            .directorios(dir.path().join("storage"), dir.path().join("backups"))
            .build()
            .unwrap();
        assert_eq!(nodo.id(), "n1");
        assert!(dir.path().join("storage/n1/checkpoints").is_dir());
        assert!(dir.path().join("backups/n1").is_dir());
    }
}
