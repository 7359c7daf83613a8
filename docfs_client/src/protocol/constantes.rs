//! Constantes del protocolo de tramas del filesystem de documentos

/// Capacidad de los campos de texto fijos (username, filename, folder, tag)
pub const MAX_TEXTO: usize = 256;

/// Capacidad del campo de ip textual de las respuestas con referral
pub const MAX_IP: usize = 16;

/// Capacidad del payload de datos de una trama
pub const MAX_DATA: usize = 4096;

/// Longitud total de una trama en bytes: 5 enteros de control, 4 campos de
/// texto fijos, payload, codigo de resultado y par (ip, puerto)
pub const TRAMA_LEN: usize = 4 + 4 * MAX_TEXTO + 4 * 4 + 4 + MAX_DATA + 4 + MAX_IP + 4;

/// Token literal que cierra una sesion de escritura interactiva
pub const TOKEN_CIERRE_ESCRITURA: &str = "ETIRW";

/// Pausa entre palabras durante un STREAM, en milisegundos
pub const PAUSA_STREAM_MS: u64 = 100;

/// Mascara de acceso de lectura (bit 0 de flags)
pub const ACCESO_LECTURA: i32 = 1;

/// Mascara de acceso de escritura (bit 1 de flags)
pub const ACCESO_ESCRITURA: i32 = 2;

/// Flag de VIEW para incluir archivos sin acceso
pub const VIEW_TODOS: i32 = 1;

/// Flag de VIEW para el listado detallado
pub const VIEW_DETALLE: i32 = 2;
