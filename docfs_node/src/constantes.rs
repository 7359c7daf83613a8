//! Constantes del nodo de almacenamiento

/// Caracteres que pueden cerrar una oracion
pub const DELIMITADORES: [char; 3] = ['.', '!', '?'];

/// Diferencia fija entre el puerto de clientes y el puerto de control
pub const OFFSET_PUERTO_CONTROL: u16 = 1000;

/// Cantidad de hilos del pool que atiende canales de datos
pub const CANT_HILOS_POOL: usize = 8;

/// Subdirectorio donde viven los checkpoints de cada nodo
pub const DIR_CHECKPOINTS: &str = "checkpoints";

/// Extension del sidecar de respaldo que alimenta el undo
pub const EXTENSION_SIDECAR: &str = ".backup";

/// Directorio base por defecto del arbol de almacenamiento
pub const DIR_STORAGE: &str = "storage";

/// Directorio base por defecto del arbol de respaldos
pub const DIR_BACKUPS: &str = "backups";

/// Direccion ruteable usada solo para descubrir la ip local anunciable
pub const DIRECCION_DESCUBRIMIENTO: &str = "8.8.8.8:80";

/// Comando de consola que apaga el nodo en forma ordenada
pub const COMANDO_DESCONEXION: &str = "DISCONNECT";
