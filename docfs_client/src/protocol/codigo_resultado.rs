//! Este modulo contiene los codigos de resultado de las respuestas
use std::fmt;

/// Resultado de una operacion. El espacio de valores esta partido entre
/// exitos (200..=203) y errores; los valores numericos son parte del
/// contrato de interoperabilidad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodigoResultado {
    Success = 200,
    SsInfo = 201,
    Data = 202,
    Ack = 203,
    BadRequest = 400,
    Denied = 403,
    NotFound = 404,
    Exists = 409,
    WordOutOfRange = 421,
    SentenceOutOfRange = 422,
    Locked = 423,
    FolderMissing = 424,
    FolderExists = 425,
    CheckpointNotFound = 426,
    NoRequests = 427,
    RequestNotFound = 428,
    ServerError = 500,
    Unavailable = 503,
}

impl CodigoResultado {
    /// Interpreta el entero de una trama recibida.
    pub fn from_i32(valor: i32) -> Option<CodigoResultado> {
        let codigo = match valor {
            200 => CodigoResultado::Success,
            201 => CodigoResultado::SsInfo,
            202 => CodigoResultado::Data,
            203 => CodigoResultado::Ack,
            400 => CodigoResultado::BadRequest,
            403 => CodigoResultado::Denied,
            404 => CodigoResultado::NotFound,
            409 => CodigoResultado::Exists,
            421 => CodigoResultado::WordOutOfRange,
            422 => CodigoResultado::SentenceOutOfRange,
            423 => CodigoResultado::Locked,
            424 => CodigoResultado::FolderMissing,
            425 => CodigoResultado::FolderExists,
            426 => CodigoResultado::CheckpointNotFound,
            427 => CodigoResultado::NoRequests,
            428 => CodigoResultado::RequestNotFound,
            500 => CodigoResultado::ServerError,
            503 => CodigoResultado::Unavailable,
            _ => return None,
        };
        Some(codigo)
    }

    /// Valor numerico con el que el codigo viaja por el socket.
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Indica si el codigo pertenece a la franja de exitos.
    pub fn es_exito(&self) -> bool {
        matches!(
            self,
            CodigoResultado::Success
                | CodigoResultado::SsInfo
                | CodigoResultado::Data
                | CodigoResultado::Ack
        )
    }
}

impl fmt::Display for CodigoResultado {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?} ({})", self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test01_exitos_y_errores() {
        assert!(CodigoResultado::Success.es_exito());
        assert!(CodigoResultado::SsInfo.es_exito());
        assert!(CodigoResultado::Data.es_exito());
        assert!(CodigoResultado::Ack.es_exito());
        assert!(!CodigoResultado::Denied.es_exito());
        assert!(!CodigoResultado::Unavailable.es_exito());
    }

    #[test]
    fn test02_ida_y_vuelta() {
        for valor in [
            200, 201, 202, 203, 400, 403, 404, 409, 421, 422, 423, 424, 425, 426, 427, 428, 500,
            503,
        ] {
            let codigo = CodigoResultado::from_i32(valor).unwrap();
            assert_eq!(codigo.as_i32(), valor);
        }
        assert_eq!(CodigoResultado::from_i32(0), None);
        assert_eq!(CodigoResultado::from_i32(299), None);
    }
}
