//! Este modulo contiene la implementacion de errores del driver
//! del filesystem de documentos
use crate::protocol::codigo_resultado::CodigoResultado;

#[derive(Debug, PartialEq)]
pub enum DriverErrorKind {
    /// Error caused by connection issues, wrong ports, etc.
    ConnectionError,
    /// The server rejected the registration handshake
    HandshakeError,
    /// Malformed or unexpected frames on the wire
    ProtocolError,
    /// The server answered with an error result code
    ServerError,
    /// Generical errors
    OtherError,
}

/// Error del driver del filesystem de documentos.
#[derive(Debug, PartialEq)]
pub struct DriverError {
    /// The error message, always printable for the shell
    pub message: String,
    /// The error kind
    pub kind: DriverErrorKind,
    /// Codigo de resultado del servidor, si el error vino en una respuesta
    pub codigo: Option<CodigoResultado>,
    /// Maximo vigente informado en los errores de rango (oracion o palabra)
    pub limite: Option<i32>,
}

impl DriverError {
    /// Creates a new DriverError
    pub fn new(message: String, kind: DriverErrorKind) -> Self {
        DriverError {
            message,
            kind,
            codigo: None,
            limite: None,
        }
    }

    /// Crea el error correspondiente a una respuesta con codigo de error.
    ///
    /// # Parametros
    /// * `codigo`: codigo de resultado de la respuesta
    /// * `message`: descripcion legible enviada por el servidor
    /// * `limite`: maximo vigente si la respuesta es un error de rango
    pub fn servidor(codigo: CodigoResultado, message: String, limite: Option<i32>) -> Self {
        DriverError {
            message,
            kind: DriverErrorKind::ServerError,
            codigo: Some(codigo),
            limite,
        }
    }

    pub fn other(message: String) -> Self {
        DriverError::new(message, DriverErrorKind::OtherError)
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the error kind
    pub fn kind(&self) -> &DriverErrorKind {
        &self.kind
    }
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.codigo {
            Some(codigo) => write!(f, "DriverError: {} - {codigo}", self.message),
            None => write!(f, "DriverError: {} - {:?}", self.message, self.kind),
        }
    }
}

impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> Self {
        DriverError::new(err.to_string(), DriverErrorKind::ConnectionError)
    }
}
