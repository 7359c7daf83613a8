//! Este modulo contiene la implementacion principal del nodo de
//! almacenamiento del filesystem de documentos
use crate::archivos::file_ops::ArchivosNodo;
use crate::bloqueos::tabla_locks::TablaLocks;
use crate::bloqueos::tabla_undo::TablaUndo;
use crate::clientes::atender_canal_datos;
use crate::constantes::CANT_HILOS_POOL;
use crate::control::atender_canal_control;
use crate::errores::NodeError;
use crate::log_msj::log_mensajes::{
    log_error_accepting_connection, log_nodo_start, log_registro_aceptado,
};
use crate::registro::registrar_en_coordinator;
use common::thread_pool::ThreadPool;
use docfs_client::protocol::payloads::RegistroNodo;
use logger::logger::Logger;
use std::net::TcpListener;
use std::sync::Arc;
use std::thread::spawn;

/// Nodo de almacenamiento: duenio del contenido de los archivos que el
/// coordinator le asigno.
///
/// Al arrancar anuncia `(id, ip, puertos, archivos)` al coordinator; el
/// socket del registro queda como canal de control permanente y un hilo
/// propio lo atiende. Los clientes llegan referidos por el coordinator a
/// traves del puerto de clientes, una conexion corta por operacion.
#[derive(Debug)]
pub struct StorageNode {
    pub(crate) id: String,
    pub(crate) coordinator: String,
    pub(crate) ip_anunciada: String,
    pub(crate) puerto_cliente: u16,
    pub(crate) puerto_control: u16,
    pub(crate) archivos: ArchivosNodo,
    pub(crate) locks: TablaLocks,
    pub(crate) undo: TablaUndo,
    pub(crate) logger: Logger,
}

impl StorageNode {
    /// Id del nodo.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Puerto de clientes con el que el nodo atiende canales de datos.
    pub fn puerto_cliente(&self) -> u16 {
        self.puerto_cliente
    }

    /// Levanta el nodo: se registra, atiende el canal de control en un
    /// hilo y entra al bucle de aceptacion de canales de datos.
    ///
    /// El puerto de clientes 0 deja que el sistema elija uno libre; el
    /// puerto efectivo es el que se anuncia al coordinator.
    ///
    /// # Retorna
    /// - `Err(NodeError)` si no se pudo enlazar el puerto o registrarse;
    ///   en condiciones normales la funcion no retorna
    pub fn start_node(self: Arc<Self>) -> Result<(), NodeError> {
        let listener = TcpListener::bind(("0.0.0.0", self.puerto_cliente))
            .map_err(|e| NodeError::new_start_error(e.to_string()))?;
        let puerto_efectivo = listener
            .local_addr()
            .map_err(|e| NodeError::new_start_error(e.to_string()))?
            .port();

        let anuncio = RegistroNodo {
            id: self.id.clone(),
            ip: self.ip_anunciada.clone(),
            puerto_cliente: puerto_efectivo,
            puerto_control: self.puerto_control,
            archivos: self.archivos.listar(),
        };
        let control = registrar_en_coordinator(&self.coordinator, &anuncio)?;
        log_registro_aceptado(&self.logger, anuncio.archivos.len());
        log_nodo_start(&self.logger, &self.id, puerto_efectivo, self.puerto_control);

        let archivos_control = self.archivos.clone();
        let undo_control = self.undo.clone();
        let logger_control = self.logger.clone();
        spawn(move || {
            atender_canal_control(control, archivos_control, undo_control, logger_control);
        });

        let pool = ThreadPool::new(CANT_HILOS_POOL);
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let archivos = self.archivos.clone();
                    let locks = self.locks.clone();
                    let undo = self.undo.clone();
                    let logger = self.logger.clone();
                    let encolado = pool.execute(move || {
                        atender_canal_datos(stream, archivos, locks, undo, logger);
                    });
                    if encolado.is_err() {
                        log_error_accepting_connection(&self.logger, "pool de hilos caido");
                        break;
                    }
                }
                Err(e) => {
                    log_error_accepting_connection(&self.logger, &e.to_string());
                    break;
                }
            }
        }
        Ok(())
    }
}
