//! Constantes del coordinator

/// Periodo del detector de fallas, en segundos
pub const INTERVALO_HEARTBEAT_SEGS: u64 = 10;

/// Ventana de gracia sin latidos antes de marcar un nodo como caido
pub const GRACIA_HEARTBEAT_SEGS: i64 = 60;

/// Timeout de lectura del canal de control de cada nodo, en segundos
pub const TIMEOUT_CONTROL_SEGS: u64 = 10;

/// Cantidad de hilos del pool que atiende conexiones entrantes
pub const CANT_HILOS_POOL: usize = 16;

/// Capacidad de la cache LRU de busquedas
pub const CAPACIDAD_CACHE_BUSQUEDA: usize = 50;

/// Largo maximo de un nombre de archivo
pub const MAX_NOMBRE_ARCHIVO: usize = 255;

/// Archivo de persistencia de la metadata por defecto
pub const ARCHIVO_REGISTRY: &str = "registry.dat";

/// Directorio de cache de contenidos por defecto
pub const DIR_CACHE: &str = "cache";

/// Directorio de respaldos por nodo por defecto
pub const DIR_BACKUPS: &str = "backups";

/// Comando de consola que apaga el coordinator en forma ordenada
pub const COMANDO_SHUTDOWN: &str = "SHUTDOWN";

/// Duenio asignado a los archivos anunciados por un nodo desconocido
pub const DUENIO_SISTEMA: &str = "system";
