//! Este modulo contiene la tabla de flags de undo por archivo, que impide
//! dos undo consecutivos sobre el mismo archivo
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Tabla en memoria con el flag "la ultima operacion fue un undo" de cada
/// archivo. El flag se enciende al deshacer y se limpia en cada escritura
/// confirmada, habilitando un nuevo undo.
#[derive(Debug, Clone, Default)]
pub struct TablaUndo {
    flags: Arc<Mutex<HashMap<String, bool>>>,
}

impl TablaUndo {
    pub fn new() -> TablaUndo {
        TablaUndo {
            flags: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Indica si la ultima operacion sobre el archivo fue un undo.
    pub fn ultimo_fue_undo(&self, archivo: &str) -> bool {
        let flags = match self.flags.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        flags.get(archivo).copied().unwrap_or(false)
    }

    /// Marca que el archivo acaba de ser deshecho.
    pub fn marcar_undo(&self, archivo: &str) {
        self.fijar(archivo, true);
    }

    /// Limpia el flag tras una escritura confirmada.
    pub fn habilitar_undo(&self, archivo: &str) {
        self.fijar(archivo, false);
    }

    /// Descarta el estado del archivo (por ejemplo al borrarlo).
    pub fn olvidar(&self, archivo: &str) {
        let mut flags = match self.flags.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        flags.remove(archivo);
    }

    fn fijar(&self, archivo: &str, valor: bool) {
        let mut flags = match self.flags.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        flags.insert(archivo.to_string(), valor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test01_flag_arranca_limpio() {
        let tabla = TablaUndo::new();
        assert!(!tabla.ultimo_fue_undo("informe"));
    }

    #[test]
    fn test02_undo_consecutivo_queda_marcado() {
        let tabla = TablaUndo::new();
        tabla.marcar_undo("informe");
        assert!(tabla.ultimo_fue_undo("informe"));
        // una escritura confirmada habilita un nuevo undo
        tabla.habilitar_undo("informe");
        assert!(!tabla.ultimo_fue_undo("informe"));
    }

    #[test]
    fn test03_olvidar_descarta_el_estado() {
        let tabla = TablaUndo::new();
        tabla.marcar_undo("informe");
        tabla.olvidar("informe");
        assert!(!tabla.ultimo_fue_undo("informe"));
    }
}
