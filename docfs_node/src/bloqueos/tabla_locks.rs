//! Este modulo contiene la tabla de locks exclusivos por
//! `(archivo, oracion)` que protege las sesiones de escritura
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Informacion del holder de un lock de oracion.
#[derive(Debug, Clone)]
pub struct InfoLock {
    pub holder: String,
    pub locked_at: i64,
}

/// Tabla en memoria de locks de oracion.
///
/// Cada sesion de escritura toma el lock de su `(archivo, oracion)` por
/// toda su vida; el lock vuelve a la tabla cuando el [`LockGuard`] se
/// suelta, incluso si el hilo de la sesion termina por una desconexion.
#[derive(Debug, Clone, Default)]
pub struct TablaLocks {
    locks: Arc<Mutex<HashMap<(String, usize), InfoLock>>>,
}

impl PartialEq for TablaLocks {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.locks, &other.locks)
    }
}

impl TablaLocks {
    pub fn new() -> TablaLocks {
        TablaLocks {
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Intenta tomar el lock exclusivo de una oracion.
    ///
    /// # Parametros
    /// * `archivo`: nombre del archivo
    /// * `oracion`: indice de la oracion
    /// * `usuario`: holder que pide el lock
    ///
    /// # Retorna
    /// - `Ok(LockGuard)` con el lock tomado
    /// - `Err(holder)` con el nombre del holder actual si ya esta tomado
    pub fn adquirir(
        &self,
        archivo: &str,
        oracion: usize,
        usuario: &str,
    ) -> Result<LockGuard, String> {
        let clave = (archivo.to_string(), oracion);
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(info) = locks.get(&clave) {
            return Err(info.holder.clone());
        }

        let ahora = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        locks.insert(
            clave.clone(),
            InfoLock {
                holder: usuario.to_string(),
                locked_at: ahora,
            },
        );

        Ok(LockGuard {
            tabla: self.clone(),
            clave,
        })
    }

    /// Holder actual de una oracion, si esta tomada.
    pub fn holder(&self, archivo: &str, oracion: usize) -> Option<String> {
        let locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks
            .get(&(archivo.to_string(), oracion))
            .map(|info| info.holder.clone())
    }

    fn liberar(&self, clave: &(String, usize)) {
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks.remove(clave);
    }
}

/// Guardian RAII de un lock de oracion.
///
/// Al soltarse (fin normal de la sesion o caida del hilo que la atendia)
/// devuelve el lock a la tabla.
#[derive(Debug, PartialEq)]
pub struct LockGuard {
    tabla: TablaLocks,
    clave: (String, usize),
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.tabla.liberar(&self.clave);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test01_lock_exclusivo_por_oracion() {
        let tabla = TablaLocks::new();
        let guard = tabla.adquirir("informe", 0, "alice").unwrap();

        assert_eq!(tabla.adquirir("informe", 0, "bob"), Err("alice".to_string()));
        // otra oracion del mismo archivo no conflictua
        let _otro = tabla.adquirir("informe", 1, "bob").unwrap();

        drop(guard);
        assert!(tabla.adquirir("informe", 0, "bob").is_ok());
    }

    #[test]
    fn test02_el_guard_libera_al_caer_el_hilo() {
        let tabla = TablaLocks::new();
        let tabla_hilo = tabla.clone();

        let handle = thread::spawn(move || {
            let _guard = tabla_hilo.adquirir("informe", 0, "alice").unwrap();
            panic!("conexion caida a mitad de la sesion");
        });
        assert!(handle.join().is_err());

        assert_eq!(tabla.holder("informe", 0), None);
        assert!(tabla.adquirir("informe", 0, "bob").is_ok());
    }

    #[test]
    fn test03_carrera_por_el_mismo_lock_gana_uno_solo() {
        use std::sync::Barrier;

        let tabla = TablaLocks::new();
        let largada = Arc::new(Barrier::new(8));
        let llegada = Arc::new(Barrier::new(8));

        let mut handles = Vec::new();
        for i in 0..8 {
            let tabla = tabla.clone();
            let largada = Arc::clone(&largada);
            let llegada = Arc::clone(&llegada);
            handles.push(thread::spawn(move || {
                largada.wait();
                let resultado = tabla.adquirir("informe", 0, &format!("user{i}"));
                // el ganador retiene el lock hasta que todos intentaron
                llegada.wait();
                resultado.is_ok()
            }));
        }

        let ganadores = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|gano| *gano)
            .count();
        assert_eq!(ganadores, 1);
    }
}
