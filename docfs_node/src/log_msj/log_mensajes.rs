//! Mensajes de log canonicos del nodo de almacenamiento
use logger::logger::Logger;

/// Registra el arranque del nodo con sus puertos.
pub fn log_nodo_start(logger: &Logger, id: &str, puerto_cliente: u16, puerto_control: u16) {
    logger.info(
        &format!(
            "nodo '{id}' escuchando clientes en {puerto_cliente}, control anunciado en {puerto_control}"
        ),
        "START",
    );
}

/// Registra el resultado del registro ante el coordinator.
pub fn log_registro_aceptado(logger: &Logger, cantidad_archivos: usize) {
    logger.info(
        &format!("registro aceptado por el coordinator, {cantidad_archivos} archivo(s) anunciados"),
        "REGISTRO",
    );
}

/// Registra una conexion de cliente aceptada.
pub fn log_connection_accepted(logger: &Logger, direccion: &str) {
    logger.info(&format!("canal de datos aceptado desde {direccion}"), "DATOS");
}

/// Registra un fallo al aceptar una conexion.
pub fn log_error_accepting_connection(logger: &Logger, detalle: &str) {
    logger.error(&format!("error al aceptar conexion: {detalle}"), "DATOS");
}

/// Registra la caida del canal de control con el coordinator.
pub fn log_control_caido(logger: &Logger, detalle: &str) {
    logger.warn(&format!("canal de control cerrado: {detalle}"), "CONTROL");
}

/// Registra la orden de apagado recibida.
pub fn log_shutdown(logger: &Logger, origen: &str) {
    logger.info(&format!("apagado ordenado recibido de {origen}"), "SHUTDOWN");
}
