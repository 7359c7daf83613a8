//! Este modulo contiene la cola de solicitudes de acceso: pedidos de
//! usuarios sobre archivos ajenos que el duenio aprueba o rechaza
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Estado de una solicitud de acceso.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstadoSolicitud {
    Pendiente,
    Aprobada,
    Denegada,
}

/// Solicitud de acceso de un usuario sobre un archivo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solicitud {
    pub id: i32,
    pub solicitante: String,
    pub archivo: String,
    pub mascara: i32,
    pub pedida_en: i64,
    pub estado: EstadoSolicitud,
}

/// Resultado de responder una solicitud.
#[derive(Debug, PartialEq, Eq)]
pub enum ErrorSolicitud {
    NoEncontrada,
    YaRespondida,
}

/// Cola de solicitudes de acceso con ids monotonicamente crecientes.
///
/// Por cada `(solicitante, archivo)` hay a lo sumo una solicitud
/// pendiente; las respondidas quedan con su estado final.
#[derive(Debug, Clone, Default)]
pub struct AccessRequestManager {
    interior: Arc<Mutex<(i32, HashMap<i32, Solicitud>)>>,
}

impl AccessRequestManager {
    pub fn new() -> AccessRequestManager {
        AccessRequestManager {
            interior: Arc::new(Mutex::new((1, HashMap::new()))),
        }
    }

    /// Da de alta una solicitud pendiente.
    ///
    /// # Parametros
    /// * `solicitante`: usuario que pide el acceso
    /// * `archivo`: archivo objetivo
    /// * `mascara`: mascara de acceso pedida
    ///
    /// # Retorna
    /// - `Ok(id)` de la solicitud creada
    /// - `Err(id existente)` si ya hay una pendiente del mismo par
    pub fn crear(&self, solicitante: &str, archivo: &str, mascara: i32) -> Result<i32, i32> {
        let mut interior = match self.interior.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(existente) = interior.1.values().find(|s| {
            s.estado == EstadoSolicitud::Pendiente
                && s.solicitante == solicitante
                && s.archivo == archivo
        }) {
            return Err(existente.id);
        }

        let id = interior.0;
        interior.0 += 1;
        interior.1.insert(
            id,
            Solicitud {
                id,
                solicitante: solicitante.to_string(),
                archivo: archivo.to_string(),
                mascara,
                pedida_en: chrono::Local::now().timestamp(),
                estado: EstadoSolicitud::Pendiente,
            },
        );
        Ok(id)
    }

    /// Solicitudes pendientes de un archivo, ordenadas por id.
    pub fn pendientes_de(&self, archivo: &str) -> Vec<Solicitud> {
        let interior = match self.interior.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut pendientes: Vec<Solicitud> = interior
            .1
            .values()
            .filter(|s| s.estado == EstadoSolicitud::Pendiente && s.archivo == archivo)
            .cloned()
            .collect();
        pendientes.sort_by_key(|s| s.id);
        pendientes
    }

    /// Resuelve una solicitud pendiente de un archivo.
    ///
    /// # Parametros
    /// * `archivo`: archivo al que debe pertenecer la solicitud
    /// * `id`: id de la solicitud
    /// * `aprobar`: aprueba o deniega
    ///
    /// # Retorna
    /// - `Ok(Solicitud)` con el estado ya aplicado
    /// - `Err(NoEncontrada)` si el id no existe o es de otro archivo
    /// - `Err(YaRespondida)` si ya no esta pendiente
    pub fn responder(
        &self,
        archivo: &str,
        id: i32,
        aprobar: bool,
    ) -> Result<Solicitud, ErrorSolicitud> {
        let mut interior = match self.interior.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let solicitud = interior
            .1
            .get_mut(&id)
            .filter(|s| s.archivo == archivo)
            .ok_or(ErrorSolicitud::NoEncontrada)?;
        if solicitud.estado != EstadoSolicitud::Pendiente {
            return Err(ErrorSolicitud::YaRespondida);
        }
        solicitud.estado = if aprobar {
            EstadoSolicitud::Aprobada
        } else {
            EstadoSolicitud::Denegada
        };
        Ok(solicitud.clone())
    }

    /// Descarta las solicitudes de un archivo borrado.
    pub fn descartar_de(&self, archivo: &str) {
        let mut interior = match self.interior.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        interior.1.retain(|_, s| s.archivo != archivo);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test01_ids_monotonicos() {
        let manager = AccessRequestManager::new();
        let id1 = manager.crear("bob", "informe", 1).unwrap();
        let id2 = manager.crear("carol", "informe", 3).unwrap();
        assert!(id2 > id1);
    }

    #[test]
    fn test02_una_pendiente_por_par() {
        let manager = AccessRequestManager::new();
        let id = manager.crear("bob", "informe", 1).unwrap();
        assert_eq!(manager.crear("bob", "informe", 3), Err(id));
        // otro archivo u otro usuario si pueden
        assert!(manager.crear("bob", "otro", 1).is_ok());
        assert!(manager.crear("carol", "informe", 1).is_ok());
    }

    #[test]
    fn test03_responder_cambia_el_estado() {
        let manager = AccessRequestManager::new();
        let id = manager.crear("bob", "informe", 3).unwrap();

        let aprobada = manager.responder("informe", id, true).unwrap();
        assert_eq!(aprobada.estado, EstadoSolicitud::Aprobada);
        assert!(manager.pendientes_de("informe").is_empty());
        // responder dos veces falla
        assert_eq!(
            manager.responder("informe", id, false),
            Err(ErrorSolicitud::YaRespondida)
        );
        // tras responderse, el par puede volver a solicitar
        assert!(manager.crear("bob", "informe", 1).is_ok());
    }

    #[test]
    fn test04_responder_exige_el_archivo_correcto() {
        let manager = AccessRequestManager::new();
        let id = manager.crear("bob", "informe", 1).unwrap();
        assert_eq!(
            manager.responder("otro", id, true),
            Err(ErrorSolicitud::NoEncontrada)
        );
        assert_eq!(
            manager.responder("informe", 999, true),
            Err(ErrorSolicitud::NoEncontrada)
        );
    }

    #[test]
    fn test05_descartar_por_archivo() {
        let manager = AccessRequestManager::new();
        manager.crear("bob", "informe", 1).unwrap();
        manager.crear("carol", "informe", 1).unwrap();
        manager.descartar_de("informe");
        assert!(manager.pendientes_de("informe").is_empty());
    }
}
