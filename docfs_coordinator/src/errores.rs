//! Este modulo contiene los errores usados internamente al operar el
//! coordinator

use std::fmt;
use std::io::Error;

#[derive(Debug)]
pub struct CoordinatorError {
    pub error_type: CoordinatorErrorType,
    pub description: String,
    pub module: String,
}

#[derive(Debug)]
pub enum CoordinatorErrorType {
    Lock,
    Io,
    NodoCaido,
    Configuracion,
    StartCoordinator,
}

impl CoordinatorError {
    /// Crea un CoordinatorError correspondiente al fallo al obtener un lock
    ///
    /// # Parametros
    /// * `lock`: lock que no se pudo adquirir
    /// * `module`: modulo logico del flujo donde se produjo el error
    pub fn new_lock_error(lock: &'static str, module: &'static str) -> Self {
        CoordinatorError {
            error_type: CoordinatorErrorType::Lock,
            description: format!("(error) ERR error en lock '{lock}'"),
            module: module.to_string(),
        }
    }

    /// Crea un CoordinatorError a partir de un error de entrada/salida
    ///
    /// # Parametros
    /// * `error`: error de E/S original
    /// * `module`: modulo logico del flujo donde se produjo el error
    pub fn new_io_error(error: &Error, module: &'static str) -> Self {
        CoordinatorError {
            error_type: CoordinatorErrorType::Io,
            description: format!("(error) ERR de E/S: {error}"),
            module: module.to_string(),
        }
    }

    /// Crea un CoordinatorError para un canal de control caido o ausente
    ///
    /// # Parametros
    /// * `nodo`: id del nodo inalcanzable
    /// * `module`: modulo logico del flujo donde se produjo el error
    pub fn new_nodo_caido_error(nodo: &str, module: &'static str) -> Self {
        CoordinatorError {
            error_type: CoordinatorErrorType::NodoCaido,
            description: format!("(error) ERR nodo '{nodo}' inalcanzable"),
            module: module.to_string(),
        }
    }

    /// Crea un CoordinatorError por una configuracion invalida
    ///
    /// # Parametros
    /// * `detalle`: clave o valor problematico
    pub fn new_config_error(detalle: String) -> Self {
        CoordinatorError {
            error_type: CoordinatorErrorType::Configuracion,
            description: format!("(error) ERR configuracion: {detalle}"),
            module: "CONFIG".to_string(),
        }
    }

    /// Crea un CoordinatorError por un fallo al levantar el coordinator
    ///
    /// # Parametros
    /// * `detalle`: descripcion de la falla
    pub fn new_start_error(detalle: String) -> Self {
        CoordinatorError {
            error_type: CoordinatorErrorType::StartCoordinator,
            description: format!("(error) ERR al iniciar el coordinator: {detalle}"),
            module: "START".to_string(),
        }
    }
}

impl fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.module, self.description)
    }
}

impl From<Error> for CoordinatorError {
    fn from(err: Error) -> Self {
        CoordinatorError::new_io_error(&err, "IO")
    }
}
