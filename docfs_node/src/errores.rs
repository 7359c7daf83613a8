//! Este modulo contiene los errores usados internamente por el nodo de
//! almacenamiento

use std::fmt;
use std::io::Error;

#[derive(Debug)]
pub struct NodeError {
    pub error_type: NodeErrorType,
    pub description: String,
    pub module: String,
}

#[derive(Debug)]
pub enum NodeErrorType {
    Lock,
    Io,
    Registro,
    Conexion,
    Protocolo,
    StartNode,
}

impl NodeError {
    /// Crea un NodeError correspondiente al fallo al obtener un lock
    ///
    /// # Parametros
    /// * `lock`: lock que no se pudo adquirir
    /// * `module`: modulo logico del flujo donde se produjo el error
    pub fn new_lock_error(lock: &'static str, module: &'static str) -> Self {
        NodeError {
            error_type: NodeErrorType::Lock,
            description: format!("(error) ERR error en lock '{lock}'"),
            module: module.to_string(),
        }
    }

    /// Crea un NodeError a partir de un error de entrada/salida
    ///
    /// # Parametros
    /// * `error`: error de E/S original
    /// * `module`: modulo logico del flujo donde se produjo el error
    pub fn new_io_error(error: &Error, module: &'static str) -> Self {
        NodeError {
            error_type: NodeErrorType::Io,
            description: format!("(error) ERR de E/S: {error}"),
            module: module.to_string(),
        }
    }

    /// Crea un NodeError correspondiente al fallo del registro ante el
    /// coordinator
    ///
    /// # Parametros
    /// * `detalle`: motivo del rechazo o fallo
    /// * `module`: modulo logico del flujo donde se produjo el error
    pub fn new_registro_error(detalle: String, module: &'static str) -> Self {
        NodeError {
            error_type: NodeErrorType::Registro,
            description: format!("(error) ERR registro rechazado: {detalle}"),
            module: module.to_string(),
        }
    }

    /// Crea un NodeError correspondiente a una conexion caida o imposible
    ///
    /// # Parametros
    /// * `detalle`: descripcion de la falla
    /// * `module`: modulo logico del flujo donde se produjo el error
    pub fn new_conexion_error(detalle: String, module: &'static str) -> Self {
        NodeError {
            error_type: NodeErrorType::Conexion,
            description: format!("(error) ERR conexion: {detalle}"),
            module: module.to_string(),
        }
    }

    /// Crea un NodeError correspondiente a una trama invalida
    ///
    /// # Parametros
    /// * `module`: modulo logico del flujo donde se produjo el error
    pub fn new_protocolo_error(module: &'static str) -> Self {
        NodeError {
            error_type: NodeErrorType::Protocolo,
            description: "(error) ERR trama invalida".to_string(),
            module: module.to_string(),
        }
    }

    /// Crea un NodeError correspondiente al fallo al levantar el nodo
    ///
    /// # Parametros
    /// * `detalle`: descripcion de la falla
    pub fn new_start_error(detalle: String) -> Self {
        NodeError {
            error_type: NodeErrorType::StartNode,
            description: format!("(error) ERR al iniciar el nodo: {detalle}"),
            module: "START".to_string(),
        }
    }
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.module, self.description)
    }
}
