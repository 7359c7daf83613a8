//! Este modulo contiene la implementacion principal del coordinator del
//! filesystem de documentos
use crate::cluster::nodo_storage::ManagerNodos;
use crate::config::config_parser::Config;
use crate::constantes::CANT_HILOS_POOL;
use crate::errores::CoordinatorError;
use crate::log_msj::log_mensajes::{
    log_conexion_aceptada, log_coordinator_start, log_error_aceptando, log_persistencia_guardada,
};
use crate::persistencia::persistencia::guardar_registro;
use crate::registro::busqueda::SearchCache;
use crate::registro::carpetas::FolderManager;
use crate::registro::registry::Registry;
use crate::registro::solicitudes::AccessRequestManager;
use crate::registro::usuarios::UserManager;
use common::thread_pool::ThreadPool;
use docfs_client::protocol::codigo_resultado::CodigoResultado;
use docfs_client::protocol::opcode::Opcode;
use docfs_client::protocol::trama::{escribir_trama, leer_trama};
use logger::logger::Logger;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::spawn;

/// Coordinator: metadata global del cluster y ruteo de pedidos.
///
/// Atiende dos tipos de conexion entrante: clientes (que quedan en un
/// bucle de pedidos hasta su EOF) y nodos de almacenamiento (cuyo socket
/// de registro queda como canal de control permanente). Cada subsistema de
/// la metadata esta guardado por su propio lock y ninguna seccion critica
/// hace E/S.
#[derive(Debug)]
pub struct Coordinator {
    pub(crate) config: Config,
    pub(crate) registry: Registry,
    pub(crate) carpetas: FolderManager,
    pub(crate) usuarios: UserManager,
    pub(crate) solicitudes: AccessRequestManager,
    pub(crate) busqueda: SearchCache,
    pub(crate) nodos: ManagerNodos,
    pub(crate) logger: Logger,
}

impl Coordinator {
    /// Levanta el coordinator: enlaza el puerto de clientes, lanza el
    /// detector de fallas y el hilo aceptador, y retorna el puerto
    /// efectivo (util cuando la configuracion pide el puerto 0).
    ///
    /// # Retorna
    /// - `Ok(puerto)` con el servicio ya corriendo en background
    /// - `Err(CoordinatorError)` si el puerto no se pudo enlazar
    pub fn iniciar(self: Arc<Self>) -> Result<u16, CoordinatorError> {
        let listener = TcpListener::bind(self.config.address)
            .map_err(|e| CoordinatorError::new_start_error(e.to_string()))?;
        let puerto = listener
            .local_addr()
            .map_err(|e| CoordinatorError::new_start_error(e.to_string()))?
            .port();

        log_coordinator_start(&self.logger, puerto);
        Arc::clone(&self).iniciar_hilo_heartbeat();

        let coordinator = Arc::clone(&self);
        spawn(move || {
            let pool = ThreadPool::new(CANT_HILOS_POOL);
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => {
                        let coordinator_hilo = Arc::clone(&coordinator);
                        if pool
                            .execute(move || coordinator_hilo.atender_conexion(stream))
                            .is_err()
                        {
                            log_error_aceptando(&coordinator.logger, "pool de hilos caido");
                            break;
                        }
                    }
                    Err(e) => {
                        log_error_aceptando(&coordinator.logger, &e.to_string());
                        break;
                    }
                }
            }
        });

        Ok(puerto)
    }

    /// Atiende una conexion aceptada: la primera trama decide si es un
    /// cliente que registra sesion o un nodo que se anuncia.
    fn atender_conexion(self: Arc<Self>, mut stream: TcpStream) {
        let direccion = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "desconocida".to_string());
        log_conexion_aceptada(&self.logger, &direccion);

        let primera = match leer_trama(&mut stream) {
            Ok(trama) => trama,
            Err(_) => return,
        };

        match primera.operacion() {
            Some(Opcode::RegisterClient) => {
                self.atender_sesion_cliente(stream, &primera, &direccion);
            }
            Some(Opcode::RegisterNode) => {
                self.atender_registro_nodo(stream, &primera);
            }
            _ => {
                let respuesta = primera.responder(
                    CodigoResultado::BadRequest,
                    "La conexion debe abrirse con un registro de cliente o de nodo",
                );
                let _ = escribir_trama(&mut stream, &respuesta);
            }
        }
    }

    /// Manager de nodos de almacenamiento conocidos.
    pub fn nodos(&self) -> &ManagerNodos {
        &self.nodos
    }

    /// Registro central de archivos.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Escribe el snapshot de la metadata en el archivo de persistencia.
    /// Se invoca en el apagado ordenado (comando de consola o senial).
    pub fn guardar_metadata(&self) -> Result<(), CoordinatorError> {
        guardar_registro(
            &self.config.registry_file,
            &self.registry,
            &self.carpetas,
        )
        .map_err(|e| CoordinatorError::new_io_error(&e, "PERSISTENCIA"))?;
        log_persistencia_guardada(
            &self.logger,
            self.registry.cantidad(),
            &self.config.registry_file.to_string_lossy(),
        );
        Ok(())
    }
}
