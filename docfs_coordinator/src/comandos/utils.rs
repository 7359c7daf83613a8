//! Helpers compartidos por los handlers de operaciones del coordinator
use crate::cluster::control::pedir_a_nodo;
use crate::cluster::nodo_storage::NodoStorage;
use crate::constantes::MAX_NOMBRE_ARCHIVO;
use crate::coordinator::Coordinator;
use crate::registro::archivo::FichaArchivo;
use docfs_client::protocol::codigo_resultado::CodigoResultado;
use docfs_client::protocol::trama::Trama;

/// Valida un nombre de archivo: no vacio, acotado, sin separadores ni `:`
/// (reservado por el formato de persistencia).
pub fn nombre_valido(nombre: &str) -> bool {
    !nombre.is_empty()
        && nombre.len() <= MAX_NOMBRE_ARCHIVO
        && !nombre.contains('/')
        && !nombre.contains(':')
        && !nombre.contains(char::is_whitespace)
}

/// Valida un tag de checkpoint con las mismas reglas que un nombre.
pub fn tag_valido(tag: &str) -> bool {
    nombre_valido(tag)
}

/// Formatea un epoch en segundos para las respuestas legibles.
pub fn formatear_fecha(epoch: i64) -> String {
    match chrono::DateTime::from_timestamp(epoch, 0) {
        Some(fecha) => fecha
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => format!("epoch {epoch}"),
    }
}

impl Coordinator {
    /// Busca la ficha del archivo del pedido.
    ///
    /// # Retorna
    /// - `Err(Trama)` con la respuesta `NotFound` lista para enviar
    pub(crate) fn ficha_o_not_found(&self, pedido: &Trama) -> Result<FichaArchivo, Trama> {
        self.registry.obtener(&pedido.filename).ok_or_else(|| {
            pedido.responder(
                CodigoResultado::NotFound,
                &format!("El archivo '{}' no existe", pedido.filename),
            )
        })
    }

    /// Ficha del nodo duenio de un archivo, solo si esta disponible.
    pub(crate) fn nodo_disponible_de(&self, ficha: &FichaArchivo) -> Option<NodoStorage> {
        self.nodos.obtener(&ficha.nodo).filter(|n| n.disponible())
    }

    /// Par pedido/respuesta por el canal de control de un nodo; una falla
    /// de E/S marca el nodo como caido y se traduce en `Unavailable`.
    ///
    /// # Retorna
    /// - `Err(Trama)` con la respuesta `Unavailable` lista para enviar
    pub(crate) fn pedir_o_unavailable(
        &self,
        nodo: &NodoStorage,
        control: &Trama,
        pedido: &Trama,
    ) -> Result<Trama, Trama> {
        match pedir_a_nodo(nodo, control) {
            Ok(respuesta) => Ok(respuesta),
            Err(e) => {
                self.logger.warn(
                    &format!("canal de control de '{}' fallo: {e}", nodo.id),
                    "CONTROL",
                );
                self.nodos.marcar_fallado(&nodo.id);
                Err(pedido.responder(
                    CodigoResultado::Unavailable,
                    &format!("El nodo '{}' no respondio", nodo.id),
                ))
            }
        }
    }

    /// Respuesta `Unavailable` estandar para un archivo sin nodo.
    pub(crate) fn sin_nodo(&self, pedido: &Trama, ficha: &FichaArchivo) -> Trama {
        pedido.responder(
            CodigoResultado::Unavailable,
            &format!(
                "El nodo '{}' que aloja a '{}' no esta disponible",
                ficha.nodo, ficha.nombre
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test01_nombres_validos() {
        assert!(nombre_valido("informe"));
        assert!(nombre_valido("informe_2024.txt"));
        assert!(!nombre_valido(""));
        assert!(!nombre_valido("con espacio"));
        assert!(!nombre_valido("con/barra"));
        assert!(!nombre_valido("con:puntos"));
        assert!(!nombre_valido(&"x".repeat(MAX_NOMBRE_ARCHIVO + 1)));
    }

    #[test]
    fn test02_fecha_formateada() {
        let fecha = formatear_fecha(0);
        assert!(fecha.starts_with("19"));
        assert!(formatear_fecha(i64::MAX).contains("epoch"));
    }
}
