//! Este modulo implementa el registro central de archivos del cluster,
//! un mapa por nombre guardado por un unico RwLock
use crate::registro::archivo::FichaArchivo;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registro central de fichas de archivo, indexado por nombre global.
///
/// Las secciones criticas son cortas y nunca hacen E/S; los handlers
/// trabajan sobre copias de las fichas y aplican mutaciones puntuales con
/// [`modificar`](Self::modificar), de modo que los chequeos de permisos y
/// los borrados quedan linealizables entre si.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    archivos: Arc<RwLock<HashMap<String, FichaArchivo>>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry {
            archivos: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Indica si existe un archivo con ese nombre.
    pub fn existe(&self, nombre: &str) -> bool {
        match self.archivos.read() {
            Ok(guard) => guard.contains_key(nombre),
            Err(poisoned) => poisoned.into_inner().contains_key(nombre),
        }
    }

    /// Da de alta una ficha nueva.
    ///
    /// # Retorna
    /// - `Err(())` si el nombre ya esta tomado (unicidad global)
    pub fn agregar(&self, ficha: FichaArchivo) -> Result<(), ()> {
        let mut archivos = match self.archivos.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if archivos.contains_key(&ficha.nombre) {
            return Err(());
        }
        archivos.insert(ficha.nombre.clone(), ficha);
        Ok(())
    }

    /// Quita una ficha del registro.
    ///
    /// # Retorna
    /// - La ficha quitada, si existia
    pub fn quitar(&self, nombre: &str) -> Option<FichaArchivo> {
        let mut archivos = match self.archivos.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        archivos.remove(nombre)
    }

    /// Copia de la ficha de un archivo.
    pub fn obtener(&self, nombre: &str) -> Option<FichaArchivo> {
        let archivos = match self.archivos.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        archivos.get(nombre).cloned()
    }

    /// Aplica una mutacion puntual sobre la ficha de un archivo.
    ///
    /// # Parametros
    /// * `nombre`: archivo objetivo
    /// * `mutacion`: clausura que recibe la ficha viva
    ///
    /// # Retorna
    /// - `Some(resultado de la clausura)` si el archivo existe
    pub fn modificar<R>(
        &self,
        nombre: &str,
        mutacion: impl FnOnce(&mut FichaArchivo) -> R,
    ) -> Option<R> {
        let mut archivos = match self.archivos.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        archivos.get_mut(nombre).map(mutacion)
    }

    /// Copia de todas las fichas, para listados y persistencia.
    pub fn listar(&self) -> Vec<FichaArchivo> {
        let archivos = match self.archivos.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut fichas: Vec<FichaArchivo> = archivos.values().cloned().collect();
        fichas.sort_by(|a, b| a.nombre.cmp(&b.nombre));
        fichas
    }

    /// Cantidad de archivos registrados.
    pub fn cantidad(&self) -> usize {
        let archivos = match self.archivos.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        archivos.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test01_unicidad_de_nombres() {
        let registry = Registry::new();
        registry
            .agregar(FichaArchivo::nueva("informe", "alice", "n1"))
            .unwrap();
        assert!(registry.agregar(FichaArchivo::nueva("informe", "bob", "n2")).is_err());
        assert_eq!(registry.cantidad(), 1);
        assert_eq!(registry.obtener("informe").unwrap().duenio, "alice");
    }

    #[test]
    fn test02_quitar_y_existe() {
        let registry = Registry::new();
        registry
            .agregar(FichaArchivo::nueva("informe", "alice", "n1"))
            .unwrap();
        assert!(registry.existe("informe"));
        let quitada = registry.quitar("informe").unwrap();
        assert_eq!(quitada.nombre, "informe");
        assert!(!registry.existe("informe"));
        assert!(registry.quitar("informe").is_none());
    }

    #[test]
    fn test03_modificar_puntual() {
        let registry = Registry::new();
        registry
            .agregar(FichaArchivo::nueva("informe", "alice", "n1"))
            .unwrap();
        let resultado = registry.modificar("informe", |ficha| {
            ficha.tamanio = 42;
            ficha.nodo = "n2".to_string();
            ficha.tamanio
        });
        assert_eq!(resultado, Some(42));
        let ficha = registry.obtener("informe").unwrap();
        assert_eq!(ficha.tamanio, 42);
        assert_eq!(ficha.nodo, "n2");
        assert!(registry.modificar("otro", |_| ()).is_none());
    }

    #[test]
    fn test04_listar_ordenado() {
        let registry = Registry::new();
        registry.agregar(FichaArchivo::nueva("b", "alice", "n1")).unwrap();
        registry.agregar(FichaArchivo::nueva("a", "alice", "n1")).unwrap();
        let nombres: Vec<String> = registry.listar().into_iter().map(|f| f.nombre).collect();
        assert_eq!(nombres, vec!["a".to_string(), "b".to_string()]);
    }
}
