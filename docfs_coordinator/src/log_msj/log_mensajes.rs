//! Mensajes de log canonicos del coordinator
use logger::logger::Logger;

/// Registra el arranque del coordinator.
pub fn log_coordinator_start(logger: &Logger, puerto: u16) {
    logger.info(
        &format!("coordinator escuchando clientes y nodos en el puerto {puerto}"),
        "START",
    );
}

/// Registra una conexion entrante aceptada.
pub fn log_conexion_aceptada(logger: &Logger, direccion: &str) {
    logger.info(&format!("conexion aceptada desde {direccion}"), "ACCEPT");
}

/// Registra un fallo del bucle aceptador.
pub fn log_error_aceptando(logger: &Logger, detalle: &str) {
    logger.error(&format!("error al aceptar conexion: {detalle}"), "ACCEPT");
}

/// Registra el alta de la sesion de un cliente.
pub fn log_sesion_abierta(logger: &Logger, usuario: &str, direccion: &str) {
    logger.info(
        &format!("sesion de '{usuario}' abierta desde {direccion}"),
        "SESION",
    );
}

/// Registra el rechazo de una sesion duplicada.
pub fn log_sesion_rechazada(logger: &Logger, usuario: &str) {
    logger.warn(
        &format!("sesion de '{usuario}' rechazada: ya hay una activa"),
        "SESION",
    );
}

/// Registra el cierre de la sesion de un cliente.
pub fn log_sesion_cerrada(logger: &Logger, usuario: &str) {
    logger.info(&format!("sesion de '{usuario}' cerrada"), "SESION");
}

/// Registra el alta o reingreso de un nodo de almacenamiento.
pub fn log_nodo_registrado(logger: &Logger, id: &str, reingreso: bool, archivos: usize) {
    let modo = if reingreso { "reingreso" } else { "alta" };
    logger.info(
        &format!("{modo} del nodo '{id}' con {archivos} archivo(s) anunciados"),
        "NODOS",
    );
}

/// Registra la caida de un nodo detectada por el heartbeat.
pub fn log_nodo_caido(logger: &Logger, id: &str) {
    logger.warn(&format!("nodo '{id}' marcado como caido"), "HEARTBEAT");
}

/// Registra un latido fallido dentro de la ventana de gracia.
pub fn log_latido_perdido(logger: &Logger, id: &str) {
    logger.warn(
        &format!("latido perdido del nodo '{id}', sigue en ventana de gracia"),
        "HEARTBEAT",
    );
}

/// Registra el snapshot de la metadata en disco.
pub fn log_persistencia_guardada(logger: &Logger, archivos: usize, ruta: &str) {
    logger.info(
        &format!("metadata de {archivos} archivo(s) guardada en {ruta}"),
        "PERSISTENCIA",
    );
}

/// Registra la carga de la metadata desde disco.
pub fn log_persistencia_cargada(logger: &Logger, archivos: usize, ruta: &str) {
    logger.info(
        &format!("metadata de {archivos} archivo(s) cargada desde {ruta}"),
        "PERSISTENCIA",
    );
}

/// Registra un failover de archivo hacia otro nodo.
pub fn log_failover(logger: &Logger, archivo: &str, desde: &str, hacia: &str) {
    logger.warn(
        &format!("archivo '{archivo}' reasignado de '{desde}' a '{hacia}'"),
        "FAILOVER",
    );
}
